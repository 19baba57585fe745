use clap::Parser;

fn parse_packets_count(s: &str) -> Result<usize, String> {
    s.trim()
        .parse::<usize>()
        .map_err(|_| "Your input for -n is not valid. Please provide an integer.".to_string())
}

#[derive(Debug, Parser, Clone)]
#[command(author, version, about, long_about = None)]
/// Generate synthetic downlink (commands) or uplink (telemetry and video) traffic of a UAV
pub struct Args {
    #[arg(
        short = 'n',
        long = "packets",
        default_value = "5000",
        value_parser = parse_packets_count,
        help = "Number of packets to generate. The last drain may add a few more."
    )]
    pub packets_count: usize,
    #[arg(
        short,
        long,
        default_value_t = false,
        help = "Generate the uplink channel instead of the downlink one"
    )]
    pub uplink: bool,
    #[arg(short, long, help = "Seed for random number generation")]
    pub seed: Option<u64>,
    #[arg(
        short,
        long,
        default_value = None,
        help = "Path to a TOML configuration file. Missing values take their default value."
    )]
    pub config: Option<String>,
    #[arg(
        short,
        long,
        default_value = None,
        help = "Output directory. Overrides the one of the configuration file."
    )]
    pub outdir: Option<String>,
}
