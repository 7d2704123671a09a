pub mod alignment;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod types;

pub use alignment::correction::{run_corrections, CorrectionSummary};
pub use alignment::report::{compute_report, Meta, Report};
pub use alignment::statistics::AlignmentStatistics;
pub use alignment::timeline::AlignedTimeline;
pub use alignment::transcript::{Transcript, WordPhoneIndex};
pub use config::{CorrectionConfig, LipSyncConfig};
pub use error::LipSyncError;
pub use export::PapagayoDocument;
pub use pipeline::builder::LipSyncBuilder;
pub use pipeline::defaults::{LcsSequenceAligner, LexiconDictionary, RecordedAligner};
pub use pipeline::runtime::{LipSync, LipSyncResult};
pub use pipeline::traits::{
    NoProgress, ProgressListener, Pronouncer, SequenceAligner, SpeechAligner,
};
pub use types::{CorrectionEvent, CorrectionKind, Granularity, Interval, RecognizedUnit, Unit};
