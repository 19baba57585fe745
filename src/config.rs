use serde::Deserialize;

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::structs::*;

/// Largest UDP payload that fits in one IPv4 datagram
pub const MAX_UDP_PAYLOAD: usize = 65507;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
/// The whole configuration of a run. It is built once, validated, and then only read.
pub struct Configuration {
    /// Number of cycles between two checks of the transport buffer
    pub buffer_frequency: u64,
    /// Wall-clock time spent per cycle, in milliseconds. 0 makes the cycles run back-to-back.
    pub cycle_period_ms: u64,
    /// Maximum payload of an uplink packet
    pub max_packet_length: usize,
    pub network: Network,
    pub downlink: Downlink,
    pub uplink: Uplink,
    pub pacing: Pacing,
    pub output: Output,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            buffer_frequency: 3,
            cycle_period_ms: 100,
            max_packet_length: 1486,
            network: Network::default(),
            downlink: Downlink::default(),
            uplink: Uplink::default(),
            pacing: Pacing::default(),
            output: Output::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
/// Addresses written in the IP and UDP headers
pub struct Network {
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub ttl: u8,
}

impl Default for Network {
    fn default() -> Self {
        Network {
            src_ip: Ipv4Addr::new(10, 0, 0, 201),
            dst_ip: Ipv4Addr::new(10, 0, 0, 208),
            src_port: 47813,
            dst_port: 47814,
            ttl: 64,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
/// How often a parameter is generated and how long its runs are
pub struct ParameterConfig {
    /// in cycles
    pub frequency: u64,
    /// candidate run lengths, picked uniformly
    pub lengths: Vec<usize>,
}

impl ParameterConfig {
    fn new(frequency: u64, lengths: &[usize]) -> Self {
        ParameterConfig {
            frequency,
            lengths: lengths.to_vec(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Downlink {
    pub land_takeoff: ParameterConfig,
    pub pitch_roll: ParameterConfig,
    pub return_home: ParameterConfig,
    pub throttle_yaw: ParameterConfig,
}

impl Default for Downlink {
    fn default() -> Self {
        let lengths = [1 << 5, 1 << 6, 1 << 7];
        Downlink {
            land_takeoff: ParameterConfig::new(7, &lengths),
            pitch_roll: ParameterConfig::new(2, &lengths),
            return_home: ParameterConfig::new(5, &lengths),
            throttle_yaw: ParameterConfig::new(1, &lengths),
        }
    }
}

impl Downlink {
    pub fn get(&self, parameter: Parameter) -> Option<&ParameterConfig> {
        match parameter {
            Parameter::LandTakeoff => Some(&self.land_takeoff),
            Parameter::PitchRoll => Some(&self.pitch_roll),
            Parameter::ReturnHome => Some(&self.return_home),
            Parameter::ThrottleYaw => Some(&self.throttle_yaw),
            _ => None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Uplink {
    pub video: Video,
    /// rotor and IMU status are always sent together
    pub imu_rotor_frequency: u64,
    /// camera and battery status are always sent together
    pub battery_camera_frequency: u64,
    pub battery_status_lengths: Vec<usize>,
    pub camera_status_lengths: Vec<usize>,
    pub imu_status_lengths: Vec<usize>,
    pub rotor_status_lengths: Vec<usize>,
}

impl Default for Uplink {
    fn default() -> Self {
        let lengths = vec![1 << 6, 1 << 7];
        Uplink {
            video: Video::default(),
            imu_rotor_frequency: 2,
            battery_camera_frequency: 6,
            battery_status_lengths: lengths.clone(),
            camera_status_lengths: lengths.clone(),
            imu_status_lengths: lengths.clone(),
            rotor_status_lengths: lengths,
        }
    }
}

impl Uplink {
    pub fn lengths(&self, parameter: Parameter) -> Option<&[usize]> {
        match parameter {
            Parameter::BatteryStatus => Some(&self.battery_status_lengths),
            Parameter::CameraStatus => Some(&self.camera_status_lengths),
            Parameter::ImuStatus => Some(&self.imu_status_lengths),
            Parameter::RotorStatus => Some(&self.rotor_status_lengths),
            _ => None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
/// Video frame sizes follow a normal distribution (measured on a DJI Spark)
pub struct Video {
    pub frequency: u64,
    pub mean: f64,
    pub std_dev: f64,
}

impl Default for Video {
    fn default() -> Self {
        Video {
            frequency: 1,
            mean: 6500.,
            std_dev: 1500.,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
/// Processing delays injected between two packets of the same drain. Means are in seconds.
pub struct Pacing {
    pub downlink_probability: f64,
    pub downlink_mean: f64,
    pub uplink_short_probability: f64,
    pub uplink_short_mean: f64,
    pub uplink_long_probability: f64,
    pub uplink_long_mean: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            downlink_probability: 0.05,
            downlink_mean: 0.15,
            uplink_short_probability: 0.2,
            uplink_short_mean: 0.03,
            uplink_long_probability: 0.03,
            uplink_long_mean: 0.3,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Output {
    pub directory: String,
    /// bins for data rate, inter-arrival and length, respectively
    pub downlink_bins: [usize; 3],
    pub uplink_bins: [usize; 3],
}

impl Default for Output {
    fn default() -> Self {
        Output {
            directory: "outputfiles".into(),
            downlink_bins: [15, 10, 10],
            uplink_bins: [15, 20, 10],
        }
    }
}

impl Output {
    pub fn bins(&self, mode: Mode) -> [usize; 3] {
        match mode {
            Mode::Downlink => self.downlink_bins,
            Mode::Uplink => self.uplink_bins,
        }
    }
}

fn check(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidConfig(message()))
    }
}

fn check_frequency(name: &str, frequency: u64) -> Result<()> {
    check(frequency > 0, || format!("{name} frequency must be positive"))
}

fn check_lengths(name: &str, lengths: &[usize]) -> Result<()> {
    check(!lengths.is_empty(), || {
        format!("{name} needs at least one candidate length")
    })?;
    check(lengths.iter().all(|l| *l <= MAX_UDP_PAYLOAD), || {
        format!("{name} lengths must not exceed {MAX_UDP_PAYLOAD} bytes")
    })
}

fn check_probability(name: &str, p: f64) -> Result<()> {
    check((0.0..=1.0).contains(&p), || {
        format!("{name} must be a probability, got {p}")
    })
}

fn check_mean(name: &str, mean: f64) -> Result<()> {
    check(mean.is_finite() && mean > 0.0, || {
        format!("{name} must be a positive number of seconds, got {mean}")
    })
}

impl Configuration {
    /// Check that every value can be used by the generator
    pub fn validate(&self) -> Result<()> {
        check_frequency("buffer", self.buffer_frequency)?;
        check(
            (1..=MAX_UDP_PAYLOAD).contains(&self.max_packet_length),
            || {
                format!(
                    "max_packet_length must be between 1 and {MAX_UDP_PAYLOAD}, got {}",
                    self.max_packet_length
                )
            },
        )?;

        for parameter in Mode::Downlink.parameters() {
            if let Some(p) = self.downlink.get(*parameter) {
                check_frequency(&parameter.to_string(), p.frequency)?;
                check_lengths(&parameter.to_string(), &p.lengths)?;
            }
        }

        let uplink = &self.uplink;
        check_frequency("video", uplink.video.frequency)?;
        check(
            uplink.video.mean.is_finite() && uplink.video.mean >= 0.0,
            || format!("video mean must be non-negative, got {}", uplink.video.mean),
        )?;
        check(
            uplink.video.std_dev.is_finite() && uplink.video.std_dev >= 0.0,
            || {
                format!(
                    "video std_dev must be non-negative, got {}",
                    uplink.video.std_dev
                )
            },
        )?;
        check_frequency("imu/rotor", uplink.imu_rotor_frequency)?;
        check_frequency("battery/camera", uplink.battery_camera_frequency)?;
        for parameter in Mode::Uplink.parameters() {
            if let Some(lengths) = uplink.lengths(*parameter) {
                check_lengths(&parameter.to_string(), lengths)?;
            }
        }

        let pacing = &self.pacing;
        check_probability("downlink_probability", pacing.downlink_probability)?;
        check_probability("uplink_short_probability", pacing.uplink_short_probability)?;
        check_probability("uplink_long_probability", pacing.uplink_long_probability)?;
        check_mean("downlink_mean", pacing.downlink_mean)?;
        check_mean("uplink_short_mean", pacing.uplink_short_mean)?;
        check_mean("uplink_long_mean", pacing.uplink_long_mean)?;

        check(
            self.output
                .downlink_bins
                .iter()
                .chain(self.output.uplink_bins.iter())
                .all(|b| *b > 0),
            || "histogram bin counts must be positive".to_string(),
        )?;
        Ok(())
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }
}

/// Import a configuration from a TOML string. Missing fields take their default value.
pub fn import_config(config_string: &str) -> Result<Configuration> {
    let config: Configuration = toml::from_str(config_string)?;
    config.validate()?;
    log::trace!("Configuration: {config:?}");
    Ok(config)
}

/// Load and validate a TOML configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<Configuration> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = import_config(&config_str)?;
    log::info!("Configuration loaded from {}", path.display());
    Ok(config)
}
