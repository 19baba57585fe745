use indicatif::{HumanBytes, ProgressBar, ProgressState, ProgressStyle};
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Progress of a generation run toward its packet target
pub struct Progress {
    pub progress_bar: ProgressBar,
    bytes_counter: Arc<AtomicU64>,
}

impl Progress {
    /// A progress bar drawn on the terminal
    pub fn new(packets_target: u64) -> Self {
        let bytes_counter = Arc::new(AtomicU64::new(0));
        let progress_bar = ProgressBar::new(packets_target);
        let bc = Arc::clone(&bytes_counter);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} Generation [{throughput}] [{wide_bar}] {pos}/{len} packets",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "throughput",
                move |state: &ProgressState, w: &mut dyn Write| {
                    if !state.elapsed().is_zero() {
                        let throughput =
                            (bc.load(Ordering::Relaxed) as f64) / state.elapsed().as_secs_f64();
                        let _ = write!(w, "{}/s", HumanBytes(throughput as u64));
                    }
                },
            ),
        );
        Progress {
            progress_bar,
            bytes_counter,
        }
    }

    /// A progress tracker that draws nothing
    pub fn hidden() -> Self {
        Progress {
            progress_bar: ProgressBar::hidden(),
            bytes_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn increase(&self, packets: u64, bytes: u64) {
        self.bytes_counter.fetch_add(bytes, Ordering::Relaxed);
        self.progress_bar.inc(packets);
    }

    pub fn finish(&self) {
        self.progress_bar.finish();
    }
}
