use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use lipsync_rs::Report;

/// Writes `report` as JSON, creating missing parent directories.
pub fn write_report(path: &Path, report: &Report, pretty: bool) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Cannot create report directory '{}': {err}", parent.display()))?;
    }

    let file = File::create(path)
        .map_err(|err| format!("Cannot create report '{}': {err}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let serialized = if pretty {
        serde_json::to_writer_pretty(&mut writer, report)
    } else {
        serde_json::to_writer(&mut writer, report)
    };
    serialized.map_err(|err| format!("Cannot serialize report '{}': {err}", path.display()))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|err| format!("Cannot finish report '{}': {err}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        words = report.words.len(),
        events = report.events.len(),
        "report written"
    );
    Ok(())
}
