use rand_core::*;
use rand_distr::{Distribution, Exp1, StandardNormal, StandardUniform};
use rand_pcg::Pcg32;

/// Source of every random draw made during a run.
///
/// The generator never touches an RNG directly, so a run can be replayed exactly by substituting
/// a [`FixedSampler`].
pub trait Sampler {
    /// A sample of U(0, 1)
    fn uniform(&mut self) -> f64;
    /// An index drawn uniformly in 0..len. `len` must be positive.
    fn choose(&mut self, len: usize) -> usize;
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64;
    fn exponential(&mut self, mean: f64) -> f64;
}

/// A sampler backed by an actual pseudo-random generator
#[derive(Debug, Clone)]
pub struct RngSampler<R: RngCore> {
    rng: R,
}

impl<R: RngCore> RngSampler<R> {
    pub fn new(rng: R) -> Self {
        RngSampler { rng }
    }
}

impl RngSampler<Pcg32> {
    /// Seeded from the OS unless a seed is given
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => Pcg32::seed_from_u64(s),
            None => Pcg32::from_os_rng(),
        };
        RngSampler { rng }
    }
}

impl<R: RngCore> Sampler for RngSampler<R> {
    fn uniform(&mut self) -> f64 {
        StandardUniform.sample(&mut self.rng)
    }

    fn choose(&mut self, len: usize) -> usize {
        (self.rng.next_u32() as usize) % len
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z: f64 = StandardNormal.sample(&mut self.rng);
        mean + std_dev * z
    }

    fn exponential(&mut self, mean: f64) -> f64 {
        let x: f64 = Exp1.sample(&mut self.rng);
        x * mean
    }
}

/// Replays fixed sequences of draws, cycling over each of them.
///
/// `choose` returns its script modulo `len`, and `normal`/`exponential` return their script as is,
/// ignoring the distribution parameters. An empty script yields 0.
#[derive(Debug, Clone, Default)]
pub struct FixedSampler {
    uniforms: Vec<f64>,
    choices: Vec<usize>,
    normals: Vec<f64>,
    exponentials: Vec<f64>,
    counters: [usize; 4],
}

fn next_in<T: Copy + Default>(script: &[T], counter: &mut usize) -> T {
    if script.is_empty() {
        return T::default();
    }
    let value = script[*counter % script.len()];
    *counter += 1;
    value
}

impl FixedSampler {
    pub fn new() -> Self {
        FixedSampler::default()
    }

    pub fn with_uniforms(mut self, uniforms: Vec<f64>) -> Self {
        self.uniforms = uniforms;
        self
    }

    pub fn with_choices(mut self, choices: Vec<usize>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_normals(mut self, normals: Vec<f64>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_exponentials(mut self, exponentials: Vec<f64>) -> Self {
        self.exponentials = exponentials;
        self
    }
}

impl Sampler for FixedSampler {
    fn uniform(&mut self) -> f64 {
        next_in(&self.uniforms, &mut self.counters[0])
    }

    fn choose(&mut self, len: usize) -> usize {
        next_in(&self.choices, &mut self.counters[1]) % len
    }

    fn normal(&mut self, _mean: f64, _std_dev: f64) -> f64 {
        next_in(&self.normals, &mut self.counters[2])
    }

    fn exponential(&mut self, _mean: f64) -> f64 {
        next_in(&self.exponentials, &mut self.counters[3])
    }
}
