//! Built-in heuristic rules.

mod null_deref;
mod secrets;

pub use null_deref::NullPointerDetectionRule;
pub use secrets::SecretsDetectionRule;
