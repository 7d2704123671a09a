pub mod builder;
pub mod defaults;
pub mod progress;
pub mod runtime;
pub mod traits;
