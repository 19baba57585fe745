use std::fmt::Display;
use std::time::Duration;

/// The channel being synthesized. Selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Ground station to UAV: flight commands
    Downlink,
    /// UAV to ground station: telemetry and video
    Uplink,
}

impl Mode {
    pub fn from_uplink_flag(uplink: bool) -> Self {
        if uplink {
            Mode::Uplink
        } else {
            Mode::Downlink
        }
    }

    /// Suffix used in the output file names
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Mode::Downlink => "_downlink",
            Mode::Uplink => "_uplink",
        }
    }

    pub fn parameters(&self) -> &'static [Parameter] {
        match self {
            Mode::Downlink => &[
                Parameter::LandTakeoff,
                Parameter::PitchRoll,
                Parameter::ReturnHome,
                Parameter::ThrottleYaw,
            ],
            Mode::Uplink => &[
                Parameter::BatteryStatus,
                Parameter::CameraStatus,
                Parameter::ImuStatus,
                Parameter::RotorStatus,
                Parameter::Video,
            ],
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Downlink => write!(f, "Downlink"),
            Mode::Uplink => write!(f, "Uplink"),
        }
    }
}

/// A signal type carried over the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    LandTakeoff,
    PitchRoll,
    ReturnHome,
    ThrottleYaw,
    BatteryStatus,
    CameraStatus,
    ImuStatus,
    RotorStatus,
    Video,
}

impl Parameter {
    /// The ASCII character written in the payload for this parameter
    pub fn tag(&self) -> u8 {
        match self {
            Parameter::LandTakeoff => b't',
            Parameter::PitchRoll => b'r',
            Parameter::ReturnHome => b'h',
            Parameter::ThrottleYaw => b'l',
            Parameter::BatteryStatus => b'b',
            Parameter::CameraStatus => b'm',
            Parameter::ImuStatus => b'i',
            Parameter::RotorStatus => b'o',
            Parameter::Video => b'v',
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Parameter::LandTakeoff
            | Parameter::PitchRoll
            | Parameter::ReturnHome
            | Parameter::ThrottleYaw => Mode::Downlink,
            _ => Mode::Uplink,
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Parameter::LandTakeoff => "land_takeoff",
            Parameter::PitchRoll => "pitch_roll",
            Parameter::ReturnHome => "return_home",
            Parameter::ThrottleYaw => "throttle_yaw",
            Parameter::BatteryStatus => "battery_status",
            Parameter::CameraStatus => "camera_status",
            Parameter::ImuStatus => "imu_status",
            Parameter::RotorStatus => "rotor_status",
            Parameter::Video => "video",
        };
        write!(f, "{name}")
    }
}

/// A contiguous sequence of bytes produced by the same parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedRun {
    pub parameter: Parameter,
    pub len: usize,
}

impl TaggedRun {
    pub fn new(parameter: Parameter, len: usize) -> Self {
        TaggedRun { parameter, len }
    }

    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend(std::iter::repeat(self.parameter.tag()).take(self.len));
    }
}

/// The payload of one future packet, as extracted from the transport buffer.
/// Runs are kept in buffer order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub runs: Vec<TaggedRun>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.len());
        for run in self.runs.iter() {
            run.write_bytes(&mut payload);
        }
        payload
    }
}

/// A framed IPv4/UDP datagram with its emission time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// time since the Unix epoch
    pub timestamp: Duration,
    /// the whole datagram, headers included
    pub data: Vec<u8>,
    pub payload_len: usize,
}

impl Packet {
    /// Length of the datagram, framing overhead included
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
