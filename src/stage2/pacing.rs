use crate::config::{Configuration, Pacing};
use crate::sampler::Sampler;
use crate::structs::Mode;

use std::time::Duration;

/// Decides the processing delay before each extraction of a drain event.
///
/// The first packet of a drain is never delayed, so the packets of one drain leave back-to-back
/// unless a delay is drawn. This gives the bimodal inter-arrival distribution observed on real
/// flight controllers.
#[derive(Debug, Clone)]
pub struct PacingModel {
    mode: Mode,
    pacing: Pacing,
}

impl PacingModel {
    pub fn new(config: &Configuration, mode: Mode) -> Self {
        PacingModel {
            mode,
            pacing: config.pacing.clone(),
        }
    }

    /// The delay to apply before the `index`-th extraction (0-based) of a drain event
    pub fn delay(&self, index: usize, sampler: &mut impl Sampler) -> Option<Duration> {
        if index == 0 {
            return None;
        }
        let p = &self.pacing;
        let secs = match self.mode {
            Mode::Downlink => {
                if sampler.uniform() < p.downlink_probability {
                    sampler.exponential(p.downlink_mean)
                } else {
                    0.0
                }
            }
            Mode::Uplink => {
                // the short and the long delays can both apply
                let mut secs = 0.0;
                if sampler.uniform() < p.uplink_short_probability {
                    secs += sampler.exponential(p.uplink_short_mean);
                }
                if sampler.uniform() < p.uplink_long_probability {
                    secs += sampler.exponential(p.uplink_long_mean);
                }
                secs
            }
        };
        if secs > 0.0 && secs.is_finite() {
            Some(Duration::from_secs_f64(secs))
        } else {
            None
        }
    }
}
