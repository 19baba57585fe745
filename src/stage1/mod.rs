use crate::config::{Configuration, Downlink, ParameterConfig, Uplink};
use crate::sampler::Sampler;
use crate::stage0::fires;
use crate::stage2::TransportBuffer;
use crate::structs::*;

/// Stage 1: application layer.
///
/// At each cycle, the parameters whose frequency divides the cycle index produce a run of
/// tagged bytes that is appended to the transport buffer. The append order is fixed, since the
/// transport layer reads the buffer from its tail.
#[derive(Debug, Clone)]
pub struct ApplicationLayer {
    mode: Mode,
    downlink: Downlink,
    uplink: Uplink,
}

fn pick_length(lengths: &[usize], sampler: &mut impl Sampler) -> usize {
    lengths[sampler.choose(lengths.len())]
}

fn telemetry(parameter: Parameter, lengths: &[usize], sampler: &mut impl Sampler) -> TaggedRun {
    TaggedRun::new(parameter, pick_length(lengths, sampler))
}

impl ApplicationLayer {
    pub fn new(config: &Configuration, mode: Mode) -> Self {
        ApplicationLayer {
            mode,
            downlink: config.downlink.clone(),
            uplink: config.uplink.clone(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Generate the data of one cycle and append it to the buffer. Returns the appended runs, in
    /// append order.
    pub fn generate(
        &self,
        cycle: u64,
        buffer: &mut TransportBuffer,
        sampler: &mut impl Sampler,
    ) -> Vec<TaggedRun> {
        let runs = match self.mode {
            Mode::Downlink => self.generate_downlink(cycle, sampler),
            Mode::Uplink => self.generate_uplink(cycle, sampler),
        };
        for run in runs.iter() {
            debug_assert_eq!(run.parameter.mode(), self.mode);
            buffer.append(*run);
        }
        runs
    }

    fn generate_downlink(&self, cycle: u64, sampler: &mut impl Sampler) -> Vec<TaggedRun> {
        let d = &self.downlink;
        // later appends end up closer to the tail
        let order = [
            (Parameter::ThrottleYaw, &d.throttle_yaw),
            (Parameter::PitchRoll, &d.pitch_roll),
            (Parameter::LandTakeoff, &d.land_takeoff),
            (Parameter::ReturnHome, &d.return_home),
        ];
        let mut runs = Vec::with_capacity(order.len());
        for (parameter, ParameterConfig { frequency, lengths }) in order {
            if fires(cycle, *frequency) {
                runs.push(TaggedRun::new(parameter, pick_length(lengths, sampler)));
            }
        }
        runs
    }

    fn generate_uplink(&self, cycle: u64, sampler: &mut impl Sampler) -> Vec<TaggedRun> {
        let mut runs = vec![];
        let video = &self.uplink.video;
        if fires(cycle, video.frequency) {
            // truncated toward zero, negative sizes become empty frames
            let len = sampler.normal(video.mean, video.std_dev).max(0.0) as usize;
            if len > 0 {
                runs.push(TaggedRun::new(Parameter::Video, len));
            }
        }
        let u = &self.uplink;
        if fires(cycle, u.imu_rotor_frequency) {
            runs.push(telemetry(Parameter::RotorStatus, &u.rotor_status_lengths, sampler));
            runs.push(telemetry(Parameter::ImuStatus, &u.imu_status_lengths, sampler));
        }
        if fires(cycle, u.battery_camera_frequency) {
            runs.push(telemetry(Parameter::CameraStatus, &u.camera_status_lengths, sampler));
            runs.push(telemetry(Parameter::BatteryStatus, &u.battery_status_lengths, sampler));
        }
        runs
    }
}
