use crate::{
    annotations::AnnotationSet,
    classify::{AF_LABEL, NON_AF_LABEL},
    scan::RecordInput,
    signal::TimeSeries,
};
use anyhow::{bail, Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

const SKIP: u8 = 59;
const NUM: u8 = 60;
const CHN: u8 = 62;
const AUX: u8 = 63;

/// MIT annotation symbols indexed by annotation code.
const SYMBOLS: [&str; 42] = [
    " ", "N", "L", "R", "a", "V", "F", "J", "A", "S", "E", "j", "/", "Q", "~", "", "|", "", "s",
    "T", "*", "D", "\"", "=", "p", "B", "^", "t", "+", "u", "?", "!", "[", "]", "e", "n", "@",
    "x", "f", "(", ")", "r",
];

/// One decoded entry of a WFDB annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WfdbAnnotation {
    pub sample: usize,
    pub code: u8,
    /// Auxiliary text such as a rhythm note (`"(AFIB"`), empty when absent.
    pub aux: String,
}

impl WfdbAnnotation {
    pub fn symbol(&self) -> &'static str {
        SYMBOLS.get(self.code as usize).copied().unwrap_or("")
    }
}

/// Parse MIT annotation binary stream into samples, codes and aux notes.
pub fn parse_wfdb_annotations(buf: &[u8]) -> Vec<WfdbAnnotation> {
    let mut out: Vec<WfdbAnnotation> = Vec::new();
    let mut idx = 0;
    let mut sample: usize = 0;
    while idx + 2 <= buf.len() {
        let word = u16::from_le_bytes([buf[idx], buf[idx + 1]]);
        idx += 2;
        let code = (word >> 10) as u8;
        let value = (word & 0x03FF) as usize;
        if code == 0 && value == 0 {
            break;
        }
        match code {
            SKIP => {
                if idx + 4 > buf.len() {
                    break;
                }
                let high = u16::from_le_bytes([buf[idx], buf[idx + 1]]) as u32;
                let low = u16::from_le_bytes([buf[idx + 2], buf[idx + 3]]) as u32;
                idx += 4;
                sample = sample.wrapping_add(((high << 16) | low) as usize);
            }
            // NUM/SUB/CHN carry a field value, not a time step
            NUM..=CHN => {}
            AUX => {
                let end = (idx + value).min(buf.len());
                let text: String = String::from_utf8_lossy(&buf[idx..end])
                    .trim_end_matches('\0')
                    .to_string();
                if let Some(last) = out.last_mut() {
                    last.aux = text;
                }
                idx = end + (value % 2);
            }
            _ => {
                sample = sample.wrapping_add(value);
                out.push(WfdbAnnotation {
                    sample,
                    code,
                    aux: String::new(),
                });
            }
        }
    }
    out
}

/// Read a WFDB annotation file (e.g. `.atr`) with symbols and aux notes.
pub fn load_wfdb_annotations(path: &Path) -> Result<AnnotationSet> {
    let buf = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let decoded = parse_wfdb_annotations(&buf);
    let mut symbols = Vec::with_capacity(decoded.len());
    let mut samples = Vec::with_capacity(decoded.len());
    let mut aux = Vec::with_capacity(decoded.len());
    for ann in decoded {
        symbols.push(ann.symbol().to_string());
        samples.push(ann.sample);
        aux.push(ann.aux);
    }
    AnnotationSet::new(symbols, samples, aux)
        .with_context(|| format!("invalid annotations in {}", path.display()))
}

/// Fail on what `wfdb_rust::parse_wfdb` would otherwise panic on: an empty
/// header or a signal file that is not there.
fn check_signal_files(header_path: &Path, header_text: &str) -> Result<()> {
    let mut lines = header_text
        .lines()
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty());
    if lines.next().is_none() {
        bail!("{} has no record line", header_path.display());
    }
    let dir = header_path.parent().unwrap_or_else(|| Path::new(""));
    for line in lines {
        let Some(name) = line.split_whitespace().next() else {
            continue;
        };
        let file = Path::new(name);
        let file = if file.is_absolute() {
            file.to_path_buf()
        } else {
            dir.join(file)
        };
        if !file.is_file() {
            bail!(
                "signal file {} named in {} not found",
                file.display(),
                header_path.display()
            );
        }
    }
    Ok(())
}

/// Load the specified signal (lead) from a WFDB header/data pair into a TimeSeries.
pub fn load_wfdb_lead(header_path: &Path, lead: usize) -> Result<TimeSeries> {
    let header_text = fs::read_to_string(header_path)
        .with_context(|| format!("failed to read {}", header_path.display()))?;
    check_signal_files(header_path, &header_text)?;
    let (header, signals) = wfdb_rust::parse_wfdb(header_path);
    if lead >= signals.len() {
        anyhow::bail!(
            "WFDB record contains {} signals, but lead {} was requested",
            signals.len(),
            lead
        );
    }
    let spec = &header.signal_specs[lead];
    let gain = spec.adc_gain.unwrap_or(1.0) as f64;
    let baseline = spec.baseline.or(spec.adc_zero).unwrap_or(0) as f64;
    let fs = header
        .record
        .sampling_frequency
        .map(|f| f as f64)
        .with_context(|| format!("{} has no sampling frequency", header_path.display()))?;
    let data = signals[lead]
        .iter()
        .map(|&sample| (sample as f64 - baseline) / gain)
        .collect();
    Ok(TimeSeries { fs, data })
}

/// Map a header comment to a whole-record rhythm label.
pub fn record_label(comment: &str) -> Option<&'static str> {
    match comment.trim() {
        "non atrial fibrillation" => Some(NON_AF_LABEL),
        "atrial fibrillation" => Some(AF_LABEL),
        _ => None,
    }
}

/// Label from the first `#` comment line of a header's text.
pub fn parse_header_label(header_text: &str) -> Option<&'static str> {
    header_text
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix('#'))
        .and_then(record_label)
}

/// A record as delivered by the loader: the four scan inputs plus an id.
#[derive(Debug, Clone)]
pub struct WfdbRecord {
    pub id: String,
    pub signal: TimeSeries,
    pub annotations: AnnotationSet,
    pub label: Option<String>,
}

impl WfdbRecord {
    /// Load `lead` from `header_path` and annotations from `annotation_path`,
    /// defaulting to the `.atr` file next to the header.
    pub fn load(header_path: &Path, lead: usize, annotation_path: Option<&Path>) -> Result<Self> {
        let id = header_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let header_text = fs::read_to_string(header_path)
            .with_context(|| format!("failed to read {}", header_path.display()))?;
        let label = parse_header_label(&header_text).map(str::to_string);
        let signal = load_wfdb_lead(header_path, lead)?;
        let atr: PathBuf = match annotation_path {
            Some(path) => path.to_path_buf(),
            None => header_path.with_extension("atr"),
        };
        let annotations = load_wfdb_annotations(&atr)?;
        debug!(
            "loaded record {}: {} samples at {} Hz, {} annotations, label {:?}",
            id,
            signal.len(),
            signal.fs,
            annotations.len(),
            label
        );
        Ok(Self {
            id,
            signal,
            annotations,
            label,
        })
    }

    pub fn as_input(&self) -> RecordInput<'_> {
        RecordInput {
            record_id: &self.id,
            signal: &self.signal,
            annotations: &self.annotations,
            label: self.label.as_deref(),
        }
    }
}
