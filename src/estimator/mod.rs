//! Expiry estimation pipeline.
//!
//! Turns an image reference into a bounded integer day-count:
//! fetch bytes → extract diagnostics → ask the remote vision model →
//! fall back to the deterministic heuristic when the model is disabled
//! or gives no usable answer.

pub mod diagnostics;
pub mod fetch;
pub mod heuristic;
pub mod orchestrator;
pub mod remote;
pub mod types;

pub use diagnostics::*;
pub use fetch::*;
pub use heuristic::*;
pub use orchestrator::*;
pub use remote::*;
pub use types::*;

use thiserror::Error;

/// Failure taxonomy for the estimation pipeline.
///
/// The remote adapter's "disabled" and "no parseable answer" outcomes are
/// not errors; they are `Ok(None)` and route to the heuristic. Everything
/// here aborts the request.
#[derive(Error, Debug)]
pub enum EstimationError {
    #[error("Provided bytes are not a decodable image")]
    InvalidImage,

    #[error("Image download failed with upstream status {status}")]
    DownloadFailed { status: u16 },

    #[error("Image URL unreachable or download timed out")]
    UnreachableHost,

    #[error("Remote inference failed: {0}")]
    RemoteInference(String),
}
