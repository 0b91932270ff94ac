#![forbid(unsafe_code)]

//! Harness: drive an [`ImeAdapter`](imesync_edit::ImeAdapter) from tests and
//! from the command line.
//!
//! - [`session::ImeSession`] wires the adapter to in-memory collaborators and
//!   logs every step.
//! - [`transcript`] writes those logs as JSONL and replays them.
//! - [`cli`] backs the `imesync-replay` binary.

pub mod cli;
pub mod error;
pub mod session;
pub mod transcript;

pub use cli::run_from_env;
pub use error::{HarnessError, Result, TranscriptError};
pub use session::ImeSession;
pub use transcript::{
    Divergence, ReplayReport, SessionStep, Transcript, TranscriptReader, TranscriptRecord,
    TranscriptWriter, replay,
};
