use crate::clock::Clock;
use crate::config::Configuration;
use crate::error::Result;
use crate::sampler::Sampler;
use crate::stage0::CycleScheduler;
use crate::stage1::ApplicationLayer;
use crate::stage2::pacing::PacingModel;
use crate::stage2::{Packetizer, TransportBuffer};
use crate::stage3::Framer;
use crate::stats::{Statistics, StatisticsCollector};
use crate::structs::*;
use crate::ui::Progress;

use std::time::Duration;

/// Everything produced by a run
#[derive(Debug, Clone)]
pub struct RunResults {
    pub mode: Mode,
    /// in emission order
    pub packets: Vec<Packet>,
    pub statistics: Statistics,
    pub cycles: u64,
    /// wall-clock time of the generation, as measured by the clock
    pub elapsed: Duration,
}

impl RunResults {
    /// Mean throughput over the run, in kbps
    pub fn mean_datarate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0. {
            let bytes: usize = self.statistics.lengths.iter().sum();
            (bytes as f64) * 8. / 1000. / secs
        } else {
            0.
        }
    }
}

/// Runs the pipeline cycle after cycle: application layer, then, on drain cycles, packetization
/// with pacing, framing, and statistics.
pub struct Generator<S: Sampler, C: Clock> {
    cycle_period: Duration,
    scheduler: CycleScheduler,
    application: ApplicationLayer,
    buffer: TransportBuffer,
    packetizer: Packetizer,
    pacing: PacingModel,
    framer: Framer,
    stats: StatisticsCollector,
    packets: Vec<Packet>,
    generated_bytes: usize,
    sampler: S,
    clock: C,
}

impl<S: Sampler, C: Clock> Generator<S, C> {
    /// The configuration is expected to be valid
    pub fn new(config: &Configuration, mode: Mode, sampler: S, clock: C) -> Self {
        Generator {
            cycle_period: config.cycle_period(),
            scheduler: CycleScheduler::new(config.buffer_frequency),
            application: ApplicationLayer::new(config, mode),
            buffer: TransportBuffer::new(),
            packetizer: Packetizer::new(mode, config.max_packet_length),
            pacing: PacingModel::new(config, mode),
            framer: Framer::new(config),
            stats: StatisticsCollector::new(),
            packets: vec![],
            generated_bytes: 0,
            sampler,
            clock,
        }
    }

    pub fn mode(&self) -> Mode {
        self.application.mode()
    }

    /// Index of the next cycle to run
    pub fn cycle(&self) -> u64 {
        self.scheduler.cycle()
    }

    pub fn buffer(&self) -> &TransportBuffer {
        &self.buffer
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn statistics(&self) -> &StatisticsCollector {
        &self.stats
    }

    /// Bytes produced by the application layer since the beginning of the run
    pub fn generated_bytes(&self) -> usize {
        self.generated_bytes
    }

    /// Run one cycle. Returns the number of packets emitted during this cycle.
    pub fn step(&mut self) -> Result<usize> {
        let cycle = self.scheduler.cycle();
        let runs = self
            .application
            .generate(cycle, &mut self.buffer, &mut self.sampler);
        self.generated_bytes += runs.iter().map(|r| r.len).sum::<usize>();

        let mut emitted = 0;
        if self.scheduler.should_drain() {
            emitted = self.drain()?;
            log::debug!("Cycle {cycle}: {emitted} packets emitted");
        }
        self.scheduler.advance();
        self.clock.sleep(self.cycle_period);
        Ok(emitted)
    }

    /// Empty the transport buffer into packets
    fn drain(&mut self) -> Result<usize> {
        let mut count = 0;
        for (index, segment) in self.packetizer.drain(&mut self.buffer).enumerate() {
            if let Some(delay) = self.pacing.delay(index, &mut self.sampler) {
                log::trace!("Processing delay of {delay:?}");
                self.clock.sleep(delay);
            }
            // the timestamp is read after the delay so it is the actual emission time
            let packet = self.framer.frame(&segment, self.clock.now())?;
            log::trace!(
                "Packet of {} bytes at {:?}",
                packet.len(),
                packet.timestamp
            );
            self.stats.record(packet.timestamp, packet.len());
            self.packets.push(packet);
            count += 1;
        }
        Ok(count)
    }

    /// Run cycles until at least `packets_target` packets have been emitted. The target is checked
    /// after each cycle, so at least one cycle always runs.
    ///
    /// There is no other stop condition: a configuration that never fills the buffer runs forever.
    pub fn run(mut self, packets_target: usize, progress: &Progress) -> Result<RunResults> {
        log::info!("Packet generation begins on {} channel", self.mode());
        let start = self.clock.now();
        loop {
            let emitted = self.step()?;
            if emitted > 0 {
                let bytes: usize = self.stats.lengths()[self.stats.len() - emitted..]
                    .iter()
                    .sum();
                progress.increase(emitted as u64, bytes as u64);
            }
            if self.stats.len() >= packets_target {
                break;
            }
        }
        progress.finish();
        let elapsed = self.clock.now().saturating_sub(start);
        let results = self.into_results(elapsed);
        log::info!(
            "Packet generation is completed: {} packets in {} cycles ({:.1}s, {:.2} kbps)",
            results.packets.len(),
            results.cycles,
            results.elapsed.as_secs_f64(),
            results.mean_datarate()
        );
        Ok(results)
    }

    fn into_results(self, elapsed: Duration) -> RunResults {
        RunResults {
            mode: self.mode(),
            packets: self.packets,
            statistics: self.stats.into_statistics(),
            cycles: self.scheduler.cycle(),
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::sampler::{FixedSampler, RngSampler};

    fn quiet_config() -> Configuration {
        let mut config = Configuration::default();
        config.cycle_period_ms = 0;
        config
    }

    #[test]
    fn test_step_drains_on_buffer_cycles() {
        let config = quiet_config();
        let mut generator = Generator::new(
            &config,
            Mode::Downlink,
            FixedSampler::new().with_uniforms(vec![0.99]),
            VirtualClock::default(),
        );
        // cycle 0: every parameter fires and the buffer is drained
        assert_eq!(generator.step().unwrap(), 4);
        assert!(generator.buffer().is_empty());
        // cycles 1 and 2 only fill the buffer
        assert_eq!(generator.step().unwrap(), 0);
        assert_eq!(generator.step().unwrap(), 0);
        assert!(!generator.buffer().is_empty());
        assert!(generator.step().unwrap() > 0);
        assert_eq!(generator.cycle(), 4);
    }

    #[test]
    fn test_cycle_period_moves_the_clock() {
        let mut config = quiet_config();
        config.cycle_period_ms = 100;
        let mut generator = Generator::new(
            &config,
            Mode::Downlink,
            FixedSampler::new().with_uniforms(vec![0.99]),
            VirtualClock::default(),
        );
        for _ in 0..4 {
            generator.step().unwrap();
        }
        // packets of cycle 3 are stamped after three periods
        let last = generator.packets().last().unwrap();
        assert_eq!(last.timestamp, Duration::from_millis(300));
    }

    #[test]
    fn test_run_reaches_target() {
        let config = quiet_config();
        let generator = Generator::new(
            &config,
            Mode::Uplink,
            RngSampler::from_seed(Some(1)),
            VirtualClock::starting_at(Duration::from_secs(1_600_000_000)),
        );
        let results = generator.run(200, &Progress::hidden()).unwrap();
        assert!(results.packets.len() >= 200);
        assert_eq!(results.statistics.len(), results.packets.len());
        assert_eq!(results.statistics.interarrival[0], 0.);
        assert!(results.cycles > 0);
    }

    #[test]
    fn test_run_always_runs_a_cycle() {
        let generator = Generator::new(
            &quiet_config(),
            Mode::Downlink,
            FixedSampler::new().with_uniforms(vec![0.99]),
            VirtualClock::default(),
        );
        assert_eq!(generator.mode(), Mode::Downlink);
        let results = generator.run(0, &Progress::hidden()).unwrap();
        // cycle 0 fires every downlink parameter and drains them
        assert_eq!(results.cycles, 1);
        assert_eq!(results.packets.len(), 4);
        assert_eq!(results.mode, Mode::Downlink);
    }
}
