use crate::annotations::AnnotationSet;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

#[derive(Debug, Deserialize)]
struct AnnotationRow {
    sample: usize,
    symbol: String,
    #[serde(default)]
    aux: Option<String>,
}

/// Parse `sample,symbol[,aux]` rows (with header) into an [`AnnotationSet`].
pub fn parse_annotation_csv<R: Read>(reader: R) -> Result<AnnotationSet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut symbols = Vec::new();
    let mut samples = Vec::new();
    let mut aux = Vec::new();
    for (idx, row) in rdr.deserialize::<AnnotationRow>().enumerate() {
        let row = row.with_context(|| format!("annotation row {}", idx + 1))?;
        samples.push(row.sample);
        symbols.push(row.symbol);
        aux.push(row.aux.unwrap_or_default());
    }
    Ok(AnnotationSet::new(symbols, samples, aux)?)
}

/// Read beat annotations from a CSV file.
pub fn read_annotation_csv(path: &Path) -> Result<AnnotationSet> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_annotation_csv(file).with_context(|| format!("in {}", path.display()))
}
