use assert_cmd::cargo::cargo_bin_cmd;
use ecgseg_lib::scan::WindowRecord;
use std::{error::Error, fs, path::Path};

fn write_flat_signal(path: &Path, samples: usize) -> Result<(), Box<dyn Error>> {
    fs::write(path, "0\n".repeat(samples))?;
    Ok(())
}

fn parse_jsonl(stdout: &[u8]) -> Result<Vec<WindowRecord>, Box<dyn Error>> {
    let text = String::from_utf8(stdout.to_vec())?;
    let mut out = Vec::new();
    for line in text.lines() {
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}

#[test]
fn scan_tiles_labelled_record() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let signal = dir.path().join("rec.txt");
    let annotations = dir.path().join("rec.csv");
    write_flat_signal(&signal, 1000)?;
    fs::write(
        &annotations,
        "sample,symbol\n50,N\n150,A\n250,N\n350,N\n",
    )?;

    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args(["scan", "--fs", "100", "--label", "non-AF", "--record-id", "r1"])
        .arg("--input")
        .arg(&signal)
        .arg("--annotations")
        .arg(&annotations);
    let output = cmd.assert().success().get_output().stdout.clone();
    let windows = parse_jsonl(&output)?;

    assert_eq!(windows.len(), 5);
    let lefts: Vec<usize> = windows.iter().map(|w| w.left).collect();
    assert_eq!(lefts, vec![0, 200, 400, 600, 800]);
    assert!(windows.iter().all(|w| w.samples.len() == 200));
    assert!(windows.iter().all(|w| w.record_id == "r1"));

    assert_eq!(windows[0].symbols, vec!["N", "A"]);
    assert_eq!(windows[0].positions, vec![50, 150]);
    assert_eq!(windows[0].pac_percent, 50.0);
    assert_eq!(windows[0].class.as_str(), "PAC");
    assert_eq!(windows[1].class.as_str(), "Pure_NSR");
    assert_eq!(windows[4].class.as_str(), "Pure_NSR");
    assert_eq!(windows[0].heart_rate_bpm, 0);
    Ok(())
}

#[test]
fn scan_walks_rhythm_intervals() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let signal = dir.path().join("rec.txt");
    let annotations = dir.path().join("rec.csv");
    write_flat_signal(&signal, 1000)?;
    fs::write(
        &annotations,
        "sample,symbol,aux\n0,+,(N\n120,N\n320,N\n400,+,(AFIB\n450,N\n650,N\n850,N\n",
    )?;

    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args(["scan", "--fs", "100"])
        .arg("--input")
        .arg(&signal)
        .arg("--annotations")
        .arg(&annotations);
    let output = cmd.assert().success().get_output().stdout.clone();
    let windows = parse_jsonl(&output)?;

    let summary: Vec<(usize, Option<&str>, &str)> = windows
        .iter()
        .map(|w| (w.left, w.label.as_deref(), w.class.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (400, Some("AF"), "AF"),
            (600, Some("AF"), "AF"),
            (800, Some("AF"), "AF"),
            (0, Some("non-AF"), "Pure_NSR"),
            (200, Some("non-AF"), "Pure_NSR"),
        ]
    );
    assert_eq!(windows[0].symbols, vec!["+", "N"]);
    Ok(())
}

#[test]
fn scan_writes_csv_with_config_file() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let signal = dir.path().join("rec.txt");
    let config = dir.path().join("scan.toml");
    let out = dir.path().join("windows.csv");
    write_flat_signal(&signal, 1000)?;
    fs::write(&config, "window_width_s = 5.0\n")?;

    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args(["scan", "--fs", "100", "--label", "AF", "--format", "csv"])
        .arg("--input")
        .arg(&signal)
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(&out);
    cmd.assert().success();

    let text = fs::read_to_string(&out)?;
    let mut lines = text.lines();
    let header = lines.next().ok_or("missing header")?;
    assert!(header.starts_with("record_id,left,right,label,class"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("input,0,500,AF,AF,"));
    assert!(rows[1].starts_with("input,500,1000,AF,AF,"));
    Ok(())
}

#[test]
fn window_width_flag_overrides_config() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let signal = dir.path().join("rec.txt");
    let config = dir.path().join("scan.toml");
    write_flat_signal(&signal, 1000)?;
    fs::write(&config, "window_width_s = 5.0\n")?;

    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args(["scan", "--fs", "100", "--window-width-s", "1"])
        .arg("--input")
        .arg(&signal)
        .arg("--config")
        .arg(&config);
    let output = cmd.assert().success().get_output().stdout.clone();
    assert_eq!(parse_jsonl(&output)?.len(), 10);
    Ok(())
}

#[test]
fn oversized_window_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let signal = dir.path().join("rec.txt");
    write_flat_signal(&signal, 100)?;

    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args(["scan", "--fs", "100", "--window-width-s", "2"])
        .arg("--input")
        .arg(&signal);
    cmd.assert().failure();
    Ok(())
}
