use crate::error::{Error, Result};
use crate::generator::RunResults;
use crate::stats::{histogram, Statistics};
use crate::structs::*;

use chrono::{DateTime, Local};
use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::DataLink;
use plotters::prelude::*;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const STATISTICS_HEADER: &str =
    "Packet Inter-arrival (ms), Packet Length (bytes), Data Rate (kbps)";
pub const HISTOGRAMS_HEADER: &str = "Histogram, Bin Start, Bin End, Density";

const FIGURE_SIZE: (u32, u32) = (1800, 600);
const BAR_COLOR: RGBColor = RGBColor(70, 130, 180);
const EDGE_COLOR: RGBColor = RGBColor(105, 105, 105);

/// Paths of the files written at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub pcap: PathBuf,
    pub statistics: PathBuf,
    pub histograms: PathBuf,
    pub figure: PathBuf,
}

fn stem_at(directory: &Path, mode: Mode, time: &DateTime<Local>) -> PathBuf {
    directory.join(format!(
        "{}{}",
        time.format("%Y%m%d_%H%M%S"),
        mode.file_suffix()
    ))
}

/// The common prefix of the output files: `<directory>/<YYYYmmdd_HHMMSS>_<downlink|uplink>`
pub fn output_stem(directory: &Path, mode: Mode) -> PathBuf {
    stem_at(directory, mode, &Local::now())
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file_out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    Ok(BufWriter::new(file_out))
}

/// Write the datagrams into a pcap file. There is no link layer, so the link type is RAW.
pub fn write_pcap(path: &Path, packets: &[Packet]) -> Result<()> {
    let header = PcapHeader {
        datalink: DataLink::RAW,
        ..Default::default()
    };
    let mut pcap_writer = PcapWriter::with_header(create(path)?, header)?;
    log::trace!("Saving into {}", path.display());
    for packet in packets.iter() {
        pcap_writer.write_packet(&PcapPacket::new(
            packet.timestamp,
            packet.len() as u32,
            &packet.data,
        ))?;
    }
    pcap_writer.into_writer().flush()?;
    Ok(())
}

/// One row per packet. The data rate field is left empty when the packet does not close a second.
pub fn write_statistics(path: &Path, statistics: &Statistics) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "{STATISTICS_HEADER}")?;
    let rows = statistics
        .interarrival
        .iter()
        .zip(statistics.lengths.iter())
        .zip(statistics.datarate.iter());
    for ((interarrival, length), datarate) in rows {
        match datarate {
            // floats always keep their decimal point
            Some(rate) => writeln!(out, "{interarrival:?}, {length}, {rate:?}")?,
            None => writeln!(out, "{interarrival:?}, {length}, ")?,
        }
    }
    out.flush()?;
    Ok(())
}

/// The three histogrammed series with their labels. Data rate sentinels are left out.
fn histogram_series(statistics: &Statistics) -> [(&'static str, Vec<f64>); 3] {
    let lengths: Vec<f64> = statistics.lengths.iter().map(|l| *l as f64).collect();
    [
        ("Data Rate (kbps)", statistics.datarate_values()),
        ("Packet Inter-arrival (ms)", statistics.interarrival.clone()),
        ("Packet Length (bytes)", lengths),
    ]
}

/// Density histograms of the data rate, the inter-arrival time and the length, with `bins` bins
/// respectively
pub fn write_histograms(path: &Path, statistics: &Statistics, bins: [usize; 3]) -> Result<()> {
    let series = histogram_series(statistics);
    let mut out = create(path)?;
    writeln!(out, "{HISTOGRAMS_HEADER}")?;
    for ((label, data), bins) in series.iter().zip(bins) {
        if data.is_empty() {
            log::warn!("No data for the histogram \"{label}\"");
        }
        for (start, end, density) in histogram(data, bins).bins() {
            writeln!(out, "{label}, {start}, {end}, {density}")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn plot_error(e: impl std::fmt::Display) -> Error {
    Error::Plot(e.to_string())
}

/// Draw the three density histograms side by side into an SVG figure
pub fn write_figure(
    path: &Path,
    statistics: &Statistics,
    bins: [usize; 3],
    title: &str,
) -> Result<()> {
    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let root = root
        .titled(title, ("sans-serif", 28))
        .map_err(plot_error)?;
    let panels = root.split_evenly((1, 3));

    for (panel, ((label, data), bins)) in panels
        .iter()
        .zip(histogram_series(statistics).iter().zip(bins))
    {
        let histogram = histogram(data, bins);
        let (x_min, x_max) = match (histogram.edges.first(), histogram.edges.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (0., 1.),
        };
        let y_max = histogram.densities.iter().copied().fold(0., f64::max) * 1.1;
        let y_max = if y_max.is_finite() && y_max > 0. {
            y_max
        } else {
            1.
        };

        let mut chart = ChartBuilder::on(panel)
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)
            .map_err(plot_error)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(*label)
            .y_desc("Density")
            .x_labels(5)
            .y_labels(5)
            .draw()
            .map_err(plot_error)?;
        // bars, then their edges
        for style in [BAR_COLOR.filled(), EDGE_COLOR.stroke_width(1)] {
            chart
                .draw_series(
                    histogram
                        .bins()
                        .map(|(start, end, d)| Rectangle::new([(start, 0.), (end, d)], style)),
                )
                .map_err(plot_error)?;
        }
    }
    root.present().map_err(plot_error)?;
    Ok(())
}

/// Write every output file of a run into `directory`, creating it if needed
pub fn save_output(
    results: &RunResults,
    directory: &Path,
    bins: [usize; 3],
) -> Result<OutputFiles> {
    fs::create_dir_all(directory)?;
    let stem = output_stem(directory, results.mode);
    let files = OutputFiles {
        pcap: with_suffix(&stem, ".pcap"),
        statistics: with_suffix(&stem, ".csv"),
        histograms: with_suffix(&stem, "_histograms.csv"),
        figure: with_suffix(&stem, ".svg"),
    };
    write_pcap(&files.pcap, &results.packets)?;
    write_statistics(&files.statistics, &results.statistics)?;
    write_histograms(&files.histograms, &results.statistics, bins)?;
    write_figure(
        &files.figure,
        &results.statistics,
        bins,
        &results.mode.to_string(),
    )?;
    Ok(files)
}
