use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ecgseg_lib::{
    annotations::AnnotationSet,
    config::{ScanConfig, StepMode},
    detectors::{
        af::{detect_af_episodes, detect_af_in_segment, AfDetection, AfDetectorConfig},
        ecg::estimate_heart_rate,
    },
    io::{table, text as text_io, wfdb as wfdb_io},
    scan::{scan_records, RecordInput},
    signal::TimeSeries,
};
use log::info;
use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "ecgseg",
    version,
    about = "Segment annotated ECG records into labelled windows and flag AF episodes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Jsonl,
    Csv,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StepArg {
    /// Non-overlapping tiles, one window width apart
    Window,
    /// One or more estimated cardiac cycles apart
    HeartCycle,
}

#[derive(Subcommand)]
enum Commands {
    /// Slide a window over one or more records and label every window
    Scan {
        /// WFDB header(s); annotations are read from the sibling .atr file
        #[arg(long)]
        wfdb_header: Vec<PathBuf>,
        #[arg(long, default_value_t = 0)]
        wfdb_lead: usize,
        /// Newline-delimited samples (used when no --wfdb-header is given)
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 360.0)]
        fs: f64,
        /// Annotation file: WFDB .atr, or CSV with sample,symbol[,aux] columns
        #[arg(long)]
        annotations: Option<PathBuf>,
        /// Whole-record label for --input records, e.g. "AF" or "non-AF"
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value = "input")]
        record_id: String,
        /// TOML scan configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        window_width_s: Option<f64>,
        #[arg(long)]
        step: Option<StepArg>,
        #[arg(long, default_value_t = 1)]
        beats_per_step: usize,
        #[arg(long, value_enum, default_value = "jsonl")]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Look for beats without a preceding P-wave in fixed-length segments
    AfDetect {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 360.0)]
        fs: f64,
        #[arg(long)]
        wfdb_header: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        wfdb_lead: usize,
        #[arg(long, default_value_t = 2.0)]
        segment_s: f64,
        /// Segment to inspect (0-based)
        #[arg(long, conflicts_with = "all")]
        segment_index: Option<usize>,
        /// Inspect every whole segment
        #[arg(long)]
        all: bool,
    },
    /// Estimate the whole-record heart rate
    HeartRate {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 360.0)]
        fs: f64,
        #[arg(long)]
        wfdb_header: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        wfdb_lead: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            wfdb_header,
            wfdb_lead,
            input,
            fs,
            annotations,
            label,
            record_id,
            config,
            window_width_s,
            step,
            beats_per_step,
            format,
            out,
        } => {
            let cfg = scan_config(config.as_deref(), window_width_s, step, beats_per_step)?;
            let records = if wfdb_header.is_empty() {
                let signal = TimeSeries::new(fs, read_samples(input.as_deref())?);
                let annotations = match annotations.as_deref() {
                    Some(path) => load_annotations(path)?,
                    None => AnnotationSet::empty(),
                };
                vec![wfdb_io::WfdbRecord {
                    id: record_id,
                    signal,
                    annotations,
                    label,
                }]
            } else {
                if annotations.is_some() && wfdb_header.len() > 1 {
                    bail!("--annotations can only be combined with a single --wfdb-header");
                }
                wfdb_header
                    .iter()
                    .map(|header| wfdb_io::WfdbRecord::load(header, wfdb_lead, annotations.as_deref()))
                    .collect::<Result<Vec<_>>>()?
            };
            cmd_scan(&records, &cfg, format, out.as_deref())?
        }
        Commands::AfDetect {
            input,
            fs,
            wfdb_header,
            wfdb_lead,
            segment_s,
            segment_index,
            all,
        } => {
            let ts = load_time_series(fs, input.as_deref(), wfdb_header.as_deref(), wfdb_lead)?;
            cmd_af_detect(&ts, segment_s, segment_index, all)?
        }
        Commands::HeartRate {
            input,
            fs,
            wfdb_header,
            wfdb_lead,
        } => {
            let ts = load_time_series(fs, input.as_deref(), wfdb_header.as_deref(), wfdb_lead)?;
            let hr = estimate_heart_rate(&ts);
            println!("{}", serde_json::to_string(&hr)?);
        }
    }
    Ok(())
}

fn scan_config(
    path: Option<&Path>,
    window_width_s: Option<f64>,
    step: Option<StepArg>,
    beats_per_step: usize,
) -> Result<ScanConfig> {
    let mut cfg = match path {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(width) = window_width_s {
        cfg.window_width_s = width;
    }
    match step {
        Some(StepArg::Window) => cfg.tiling_step = StepMode::Window,
        Some(StepArg::HeartCycle) => {
            cfg.tiling_step = StepMode::HeartCycle {
                beats: beats_per_step,
            }
        }
        None => {}
    }
    Ok(cfg)
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf)
        }
    }
}

fn load_annotations(path: &Path) -> Result<AnnotationSet> {
    let is_atr = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("atr"));
    if is_atr {
        wfdb_io::load_wfdb_annotations(path)
    } else {
        text_io::read_annotation_csv(path)
    }
}

fn load_time_series(
    fs: f64,
    input: Option<&Path>,
    wfdb_header: Option<&Path>,
    wfdb_lead: usize,
) -> Result<TimeSeries> {
    match wfdb_header {
        Some(header) => wfdb_io::load_wfdb_lead(header, wfdb_lead),
        None => Ok(TimeSeries::new(fs, read_samples(input)?)),
    }
}

fn cmd_scan(
    records: &[wfdb_io::WfdbRecord],
    cfg: &ScanConfig,
    format: OutputFormat,
    out: Option<&Path>,
) -> Result<()> {
    let inputs: Vec<RecordInput<'_>> = records.iter().map(wfdb_io::WfdbRecord::as_input).collect();
    let windows = scan_records(&inputs, cfg).context("scan rejected")?;
    info!(
        "{} windows from {} record(s)",
        windows.len(),
        records.len()
    );
    let writer: Box<dyn Write> = match out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    match format {
        OutputFormat::Jsonl => table::write_windows_jsonl(writer, &windows),
        OutputFormat::Csv => table::write_windows_csv(writer, &windows),
    }
}

fn cmd_af_detect(
    ts: &TimeSeries,
    segment_s: f64,
    segment_index: Option<usize>,
    all: bool,
) -> Result<()> {
    let cfg = AfDetectorConfig::default();
    let detections: Vec<AfDetection> = if all {
        detect_af_episodes(ts, segment_s, &cfg)?
    } else {
        let index = segment_index.unwrap_or(0);
        match detect_af_in_segment(ts, segment_s, index, &cfg)? {
            Some(detection) => vec![detection],
            None => bail!("segment {} is past the end of the signal", index),
        }
    };
    println!("{}", serde_json::to_string(&detections)?);
    Ok(())
}
