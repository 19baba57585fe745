use std::path::PathBuf;

use thiserror::Error;

/// Errors that can stop a generation run
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration is well-formed but its values cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot parse the configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Cannot access the configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error while writing the output files: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error while writing the pcap file: {0}")]
    Pcap(#[from] pcap_file::PcapError),

    #[error("Error while drawing the histograms: {0}")]
    Plot(String),

    /// A segment too large to be framed into a single IPv4 datagram.
    /// Only reachable with a configuration that lets the buffer grow unbounded between drains.
    #[error("A payload of {0} bytes does not fit in a single IPv4/UDP datagram")]
    OversizedDatagram(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
