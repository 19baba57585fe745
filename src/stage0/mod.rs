/// Stage 0: the cycle counter.
///
/// Every cycle runs the application layer; every `buffer_frequency`-th cycle also drains the
/// transport buffer. Both decisions are taken from the same counter, which starts at 0 and never
/// stops.
#[derive(Debug, Clone)]
pub struct CycleScheduler {
    cycle: u64,
    buffer_frequency: u64,
}

impl CycleScheduler {
    /// `buffer_frequency` must be positive (checked by the configuration)
    pub fn new(buffer_frequency: u64) -> Self {
        CycleScheduler {
            cycle: 0,
            buffer_frequency,
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Whether something generated every `frequency` cycles is generated at the current cycle
    pub fn fires(&self, frequency: u64) -> bool {
        fires(self.cycle, frequency)
    }

    pub fn should_drain(&self) -> bool {
        self.fires(self.buffer_frequency)
    }

    pub fn advance(&mut self) {
        self.cycle += 1;
    }
}

pub fn fires(cycle: u64, frequency: u64) -> bool {
    cycle % frequency == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_cycles() {
        let mut scheduler = CycleScheduler::new(3);
        let mut drains = vec![];
        for _ in 0..10 {
            if scheduler.should_drain() {
                drains.push(scheduler.cycle());
            }
            scheduler.advance();
        }
        assert_eq!(drains, vec![0, 3, 6, 9]);
        assert_eq!(scheduler.cycle(), 10);
    }

    #[test]
    fn test_everything_fires_at_cycle_zero() {
        let scheduler = CycleScheduler::new(3);
        for frequency in [1, 2, 5, 7, 13, 1000] {
            assert!(scheduler.fires(frequency));
        }
        assert!(fires(26, 13));
        assert!(!fires(27, 13));
    }
}
