//! cli::commands
//!
//! Command handlers.
//!
//! Each handler calls into the engine and formats the result; no locking
//! logic lives here.

mod lock;
mod verify_cmd;

pub use lock::lock;
pub use verify_cmd::verify;
