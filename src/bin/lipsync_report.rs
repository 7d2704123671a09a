use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lipsync_rs::{
    CorrectionConfig, LexiconDictionary, LipSyncBuilder, LipSyncConfig, ProgressListener,
    RecordedAligner,
};
use tracing_subscriber::EnvFilter;

#[path = "lipsync_report/json_report_formatter.rs"]
mod json_report_formatter;
#[path = "lipsync_report/papagayo_formatter.rs"]
mod papagayo_formatter;

const GENERATOR: &str = concat!("lipsync_report ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Parser)]
#[command(name = "lipsync_report")]
#[command(about = "Correct a recorded recognition into a lip-sync timeline and report on it")]
struct Args {
    /// Audio file the recognition was made from.
    #[arg(long, env = "LIPSYNC_REPORT_AUDIO")]
    audio: PathBuf,
    /// Plain-text transcript of the audio.
    #[arg(long, env = "LIPSYNC_REPORT_TRANSCRIPT")]
    transcript: PathBuf,
    /// Recorded recognition: `{"words": [...], "phones": [...]}`.
    #[arg(long, env = "LIPSYNC_REPORT_RECOGNITION")]
    recognition: PathBuf,
    /// Pronunciation lexicon, one `word PH PH ...` entry per line.
    #[arg(long, env = "LIPSYNC_REPORT_LEXICON")]
    lexicon: PathBuf,
    /// JSON file overriding the correction parameters.
    #[arg(long, env = "LIPSYNC_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(
        long,
        env = "LIPSYNC_REPORT_FRAME_RATE",
        default_value_t = LipSyncConfig::DEFAULT_FRAME_RATE
    )]
    frame_rate: u32,
    #[arg(long, env = "LIPSYNC_REPORT_OUT")]
    out: Option<PathBuf>,
    /// Also write a Papagayo `.pgo` project here.
    #[arg(long, env = "LIPSYNC_REPORT_PAPAGAYO")]
    papagayo: Option<PathBuf>,
    #[arg(long, env = "LIPSYNC_REPORT_COMPACT", default_value_t = false)]
    compact: bool,
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}% ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );
        Self { bar }
    }
}

impl ProgressListener for BarProgress {
    fn on_start(&self) {
        self.bar.set_message("aligning...");
    }

    fn on_progress(&self, progress: f64) {
        self.bar.set_position(progress.clamp(0.0, 100.0).round() as u64);
    }

    fn on_stop(&self) {
        self.bar.finish_with_message("alignment complete");
    }
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("lipsync_report: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lipsync_rs=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let audio = resolve_path(&repo_root, &args.audio);
    let transcript_path = resolve_path(&repo_root, &args.transcript);
    let recognition_path = resolve_path(&repo_root, &args.recognition);
    let lexicon_path = resolve_path(&repo_root, &args.lexicon);
    let out_path = resolve_out_path(&repo_root, args.out.as_ref());
    for (path, what) in [
        (&transcript_path, "transcript"),
        (&recognition_path, "recognition"),
        (&lexicon_path, "lexicon"),
    ] {
        require_path_exists(path, what)?;
    }

    let correction = match args.config.as_ref() {
        Some(path) => CorrectionConfig::load(&resolve_path(&repo_root, path))
            .map_err(|err| err.to_string())?,
        None => CorrectionConfig::default(),
    };
    let config = LipSyncConfig {
        dictionary_path: lexicon_path.to_string_lossy().into_owned(),
        frame_rate: args.frame_rate,
        correction,
    };

    let transcript = fs::read_to_string(&transcript_path).map_err(|err| {
        format!(
            "Failed to read transcript '{}': {err}",
            transcript_path.display()
        )
    })?;
    let recording = RecordedAligner::load(&recognition_path).map_err(|err| err.to_string())?;
    let dictionary = LexiconDictionary::load(&lexicon_path).map_err(|err| err.to_string())?;

    let lipsync = LipSyncBuilder::new(config)
        .with_speech_aligner(Box::new(recording))
        .with_pronouncer(Box::new(dictionary))
        .build()
        .map_err(|err| err.to_string())?;

    let progress = BarProgress::new();
    let result = lipsync
        .sync(&audio, &transcript, &progress)
        .map_err(|err| err.to_string())?;

    let report = result
        .report(Utc::now().to_rfc3339(), GENERATOR)
        .map_err(|err| err.to_string())?;
    json_report_formatter::write_report(&out_path, &report, !args.compact)?;
    println!("{}", out_path.display());

    if let Some(papagayo) = args.papagayo.as_ref() {
        let papagayo_path = resolve_path(&repo_root, papagayo);
        let document = result.to_papagayo().map_err(|err| err.to_string())?;
        papagayo_formatter::write_papagayo(&papagayo_path, &document)?;
        println!("{}", papagayo_path.display());
    }

    println!(
        "words={} ignored_words={} ignored_phones={} corrections={}",
        result.words.len(),
        result.corrections.ignored_words,
        result.corrections.ignored_phones,
        result.events.len()
    );
    Ok(())
}

fn resolve_out_path(repo_root: &Path, out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return resolve_path(repo_root, path);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    repo_root
        .join("target")
        .join("lipsync_reports")
        .join(format!("lipsync-report-{run_id}.json"))
}

fn resolve_path(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

fn require_path_exists(path: &Path, what: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("Missing {what} file: {}", path.display()))
}
