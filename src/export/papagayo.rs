use std::fmt;
use std::path::Path;

use crate::alignment::transcript::WordPhoneIndex;
use crate::error::LipSyncError;
use crate::types::Unit;

pub const HEADER: &str = "lipsync version 1";
pub const REST_SHAPE: &str = "rest";

/// Mouth shape for a phone of the French phone set; `rest` when unknown.
pub fn mouth_shape(phone: &str) -> &'static str {
    match phone {
        "aa" => "AI",
        "ai" | "an" | "ee" | "ei" | "ii" | "in" | "oe" | "un" | "uy" => "E",
        "au" | "eu" | "on" | "oo" | "uu" => "O",
        "ou" => "U",
        "bb" | "mm" | "pp" => "MBP",
        "ff" | "vv" => "FV",
        "ll" => "L",
        "ww" => "WQ",
        "ch" | "dd" | "gg" | "gn" | "jj" | "kk" | "nn" | "rr" | "ss" | "tt" | "yy" | "zz" => "etc",
        _ => REST_SHAPE,
    }
}

/// Papagayo project with a single voice, built from a corrected timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PapagayoDocument {
    pub audio_path: String,
    pub frame_rate: u32,
    pub last_frame: i64,
    pub words: Vec<PapagayoWord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PapagayoWord {
    pub spelling: String,
    pub start_frame: i64,
    pub end_frame: i64,
    /// `(frame, mouth shape)` per phone, ignored phones included.
    pub phones: Vec<(i64, &'static str)>,
}

impl PapagayoDocument {
    /// Ignored words are left out. An ignored phone keeps its slot and
    /// holds the end frame of the previous placed phone of its word, or the
    /// word start.
    pub fn from_timeline(
        audio_path: &str,
        frame_rate: u32,
        words: &[Unit],
        phones: &[Unit],
        index: &WordPhoneIndex,
    ) -> Result<Self, LipSyncError> {
        if index.word_count() != words.len() || index.phone_count() != phones.len() {
            return Err(LipSyncError::invalid_input(
                "papagayo export: offset table does not match the timeline",
            ));
        }
        let to_frame = |ms: i64| ms_to_frame(ms, frame_rate);

        let last_ms = phones.iter().rev().find_map(Unit::interval).map_or(0, |i| i.end_ms);
        let mut exported = Vec::new();
        for (w, word) in words.iter().enumerate() {
            let Some(word_interval) = word.interval() else {
                continue;
            };
            let mut held = to_frame(word_interval.start_ms);
            let shapes = phones[index.span(w)]
                .iter()
                .map(|phone| {
                    let frame = match phone.interval() {
                        Some(interval) => {
                            held = to_frame(interval.end_ms);
                            to_frame(interval.start_ms)
                        }
                        None => held,
                    };
                    (frame, mouth_shape(&phone.spelling))
                })
                .collect();
            exported.push(PapagayoWord {
                spelling: word.spelling.clone(),
                start_frame: to_frame(word_interval.start_ms),
                end_frame: to_frame(word_interval.end_ms),
                phones: shapes,
            });
        }

        tracing::debug!(
            words = exported.len(),
            last_frame = to_frame(last_ms),
            frame_rate,
            "papagayo: document built"
        );
        Ok(Self {
            audio_path: audio_path.to_string(),
            frame_rate,
            last_frame: to_frame(last_ms),
            words: exported,
        })
    }

    pub fn write_to(&self, path: &Path) -> Result<(), LipSyncError> {
        std::fs::write(path, self.to_string())
            .map_err(|e| LipSyncError::io("writing papagayo file", e))
    }
}

impl fmt::Display for PapagayoDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .words
            .iter()
            .map(|w| w.spelling.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        writeln!(f, "{HEADER}")?;
        writeln!(f, "{}", self.audio_path)?;
        writeln!(f, "{}", self.frame_rate)?;
        writeln!(f, "{}", self.last_frame)?;
        writeln!(f, "1")?;
        writeln!(f, "\tVoice 1")?;
        writeln!(f, "\t{text}")?;
        writeln!(f, "\t1")?;
        writeln!(f, "\t\t{text}")?;
        writeln!(f, "\t\t0")?;
        writeln!(f, "\t\t{}", self.last_frame)?;
        writeln!(f, "\t\t{}", self.words.len())?;

        for word in &self.words {
            writeln!(
                f,
                "\t\t\t{} {} {} {}",
                word.spelling,
                word.start_frame,
                word.end_frame,
                word.phones.len()
            )?;
            for (frame, shape) in &word.phones {
                writeln!(f, "\t\t\t\t{frame} {shape}")?;
            }
        }
        Ok(())
    }
}

fn ms_to_frame(ms: i64, frame_rate: u32) -> i64 {
    (ms as f64 / 1000.0 * frame_rate as f64).round() as i64
}
