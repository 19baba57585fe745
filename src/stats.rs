use std::time::Duration;

/// Per-packet statistics: inter-arrival time, length and data rate.
///
/// The three series always have the same length, one entry per recorded packet. The data rate is
/// only known when a packet starts a new wall-clock second: that packet carries the rate of the
/// second that just ended, every other packet carries `None`. The first non-empty second is a
/// warm-up second and is never reported.
#[derive(Debug, Clone)]
pub struct StatisticsCollector {
    previous_ts: Option<Duration>,
    current_second: Option<u64>,
    /// bytes seen during the current second
    accumulated: usize,
    warm_up: bool,
    interarrival: Vec<f64>,
    lengths: Vec<usize>,
    datarate: Vec<Option<f64>>,
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        StatisticsCollector {
            previous_ts: None,
            current_second: None,
            accumulated: 0,
            warm_up: true,
            interarrival: vec![],
            lengths: vec![],
            datarate: vec![],
        }
    }
}

/// The series collected over a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    /// in ms
    pub interarrival: Vec<f64>,
    /// in bytes, framing included
    pub lengths: Vec<usize>,
    /// in kbps
    pub datarate: Vec<Option<f64>>,
}

impl Statistics {
    pub fn len(&self) -> usize {
        self.interarrival.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interarrival.is_empty()
    }

    /// The reported data rates, sentinels removed
    pub fn datarate_values(&self) -> Vec<f64> {
        self.datarate.iter().flatten().copied().collect()
    }
}

impl StatisticsCollector {
    pub fn new() -> Self {
        StatisticsCollector::default()
    }

    /// Record a packet of `length` bytes emitted at `timestamp`
    pub fn record(&mut self, timestamp: Duration, length: usize) {
        let interarrival = match self.previous_ts {
            Some(previous) => timestamp.saturating_sub(previous).as_secs_f64() * 1000.,
            None => 0.,
        };
        self.interarrival.push(interarrival);
        self.lengths.push(length);

        let second = timestamp.as_secs();
        if self.current_second != Some(second) {
            // close the bucket of the previous second
            let rate = (self.accumulated as f64) * 8. / 1000.;
            self.datarate
                .push(if self.warm_up { None } else { Some(rate) });
            if self.accumulated > 0 {
                self.warm_up = false;
            }
            self.accumulated = 0;
            self.current_second = Some(second);
        } else {
            self.datarate.push(None);
        }
        self.accumulated += length;
        self.previous_ts = Some(timestamp);
    }

    pub fn len(&self) -> usize {
        self.interarrival.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interarrival.is_empty()
    }

    pub fn interarrival(&self) -> &[f64] {
        &self.interarrival
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn datarate(&self) -> &[Option<f64>] {
        &self.datarate
    }

    pub fn into_statistics(self) -> Statistics {
        Statistics {
            interarrival: self.interarrival,
            lengths: self.lengths,
            datarate: self.datarate,
        }
    }
}

/// A density histogram with equal-width bins
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` edges, or none when there is no data
    pub edges: Vec<f64>,
    /// the integral of the histogram is 1
    pub densities: Vec<f64>,
}

impl Histogram {
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.edges
            .windows(2)
            .zip(self.densities.iter())
            .map(|(e, d)| (e[0], e[1], *d))
    }
}

/// Bin the data over [min, max] into `bins` bins (the last bin includes its upper edge) and
/// normalize into a density. A constant sample is binned over [v - 0.5, v + 0.5].
pub fn histogram(data: &[f64], bins: usize) -> Histogram {
    let data: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if data.is_empty() || bins == 0 {
        return Histogram {
            edges: vec![],
            densities: vec![],
        };
    }
    let mut min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();

    let mut counts = vec![0usize; bins];
    for v in data.iter() {
        let index = (((v - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }
    let total = data.len() as f64;
    let densities = counts
        .into_iter()
        .map(|c| c as f64 / (total * width))
        .collect();
    Histogram { edges, densities }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_first_interarrival_is_zero() {
        let mut stats = StatisticsCollector::new();
        stats.record(ms(1_000_500), 100);
        stats.record(ms(1_000_750), 100);
        assert_eq!(stats.interarrival(), &[0., 250.]);
        assert_eq!(stats.lengths(), &[100, 100]);
    }

    #[test]
    fn test_warm_up_second_is_not_reported() {
        let mut stats = StatisticsCollector::new();
        // second 10: warm-up
        stats.record(ms(10_100), 100);
        stats.record(ms(10_900), 150);
        // second 11
        stats.record(ms(11_000), 500);
        stats.record(ms(11_500), 500);
        // second 13, after an empty second
        stats.record(ms(13_200), 60);
        assert_eq!(
            stats.datarate(),
            &[None, None, None, None, Some(8.)]
        );
        assert_eq!(stats.len(), 5);
        assert_eq!(stats.interarrival().len(), stats.datarate().len());
    }

    #[test]
    fn test_datarate_one_value_per_second() {
        let mut stats = StatisticsCollector::new();
        for i in 0..50 {
            // 10 packets per second, 125 bytes each: 10 kbps
            stats.record(ms(5_000 + i * 100), 125);
        }
        let values = stats.clone().into_statistics().datarate_values();
        // seconds 5 to 9: the first is warm-up, the last is never closed
        assert_eq!(values, vec![10., 10., 10.]);
        assert_eq!(stats.datarate().len(), 50);
    }

    #[test]
    fn test_histogram_density() {
        let h = histogram(&[0., 1., 1., 2., 3., 4.], 4);
        assert_eq!(h.edges, vec![0., 1., 2., 3., 4.]);
        // counts 1, 2, 1, 2 with a width of 1
        let total = 6.;
        assert_eq!(h.densities, vec![1. / total, 2. / total, 1. / total, 2. / total]);
        let area: f64 = h.bins().map(|(a, b, d)| (b - a) * d).sum();
        assert!((area - 1.).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_degenerate() {
        let h = histogram(&[5., 5., 5.], 10);
        assert_eq!(h.edges.first(), Some(&4.5));
        assert_eq!(h.edges.last(), Some(&5.5));
        assert_eq!(h.bins().count(), 10);
        assert!(histogram(&[], 10).edges.is_empty());
    }
}
