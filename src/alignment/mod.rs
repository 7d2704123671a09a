pub mod correction;
pub mod lcs;
pub mod merge;
pub mod report;
pub mod statistics;
pub mod timeline;
pub mod tokenization;
pub mod transcript;
