//! Work-session state machine and hours computation.
//!
//! Everything here is synchronous and in-memory. Persistence and locking
//! live in `database` and `timeclock`.

pub mod aggregate;
pub mod error;
pub mod session;

pub use error::LedgerError;
pub use session::{Break, LocationSample, WorkSession};
