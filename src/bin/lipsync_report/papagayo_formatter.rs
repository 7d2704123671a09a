use std::fs;
use std::path::Path;

use lipsync_rs::PapagayoDocument;

pub fn write_papagayo(path: &Path, document: &PapagayoDocument) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create Papagayo output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    document
        .write_to(path)
        .map_err(|err| format!("Failed to write Papagayo file '{}': {err}", path.display()))
}
