pub mod papagayo;

pub use papagayo::{mouth_shape, PapagayoDocument};
