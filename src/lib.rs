//! Synthetic traffic generator for the control and telemetry links of a consumer UAV.
//! It reproduces the inter-arrival, length and data rate distributions of a real drone link by
//! simulating its application and transport layers, and is notably used by the binary uavgen.

/// Run configuration
pub mod config;
/// Errors of the generation
pub mod error;
/// Generation statistics and histograms
pub mod stats;

#[doc(hidden)]
/// Structures used throughout the library
pub mod structs;

#[doc(inline)]
pub use structs::*;

/// Random draws
pub mod sampler;
/// Time source
pub mod clock;

/// Cycle scheduling
pub mod stage0;

/// Application-layer data generation
pub mod stage1;

/// Transport buffer and packetization
pub mod stage2;

/// IPv4/UDP framing
pub mod stage3;

/// The generation loop
pub mod generator;

/// Export to pcap, csv and SVG figure
pub mod export;

/// Progress bar
pub mod ui;
