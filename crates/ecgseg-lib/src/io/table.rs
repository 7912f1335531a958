use crate::scan::WindowRecord;
use anyhow::Result;
use csv::WriterBuilder;
use std::io::Write;

const CSV_HEADER: [&str; 11] = [
    "record_id",
    "left",
    "right",
    "label",
    "class",
    "pac_percent",
    "pvc_percent",
    "heart_rate_bpm",
    "symbols",
    "positions",
    "samples",
];

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write windows as CSV; list-valued columns are space separated.
pub fn write_windows_csv<W: Write>(out: W, windows: &[WindowRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for w in windows {
        writer.write_record(&[
            w.record_id.clone(),
            w.left.to_string(),
            w.right.to_string(),
            w.label.clone().unwrap_or_default(),
            w.class.to_string(),
            w.pac_percent.to_string(),
            w.pvc_percent.to_string(),
            w.heart_rate_bpm.to_string(),
            w.symbols.join(" "),
            join(&w.positions),
            join(&w.samples),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one JSON object per window.
pub fn write_windows_jsonl<W: Write>(mut out: W, windows: &[WindowRecord]) -> Result<()> {
    for w in windows {
        serde_json::to_writer(&mut out, w)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
