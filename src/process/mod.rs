//! Supervised subprocess execution.
//!
//! Every external tool Shipyard drives (CMake, make, native test binaries)
//! runs through a [`Session`]: its output pipes are drained concurrently,
//! its wait is bounded by an optional timeout, and teardown always kills,
//! joins and records in the same order.
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use shipyard::process::{ExecutionRequest, OutputMode, Session, StatusRecorder};
//!
//! let report = Session::new(
//!     ExecutionRequest::new("/path/to/unit_test")
//!         .timeout(Duration::from_secs(600))
//!         .output(OutputMode::files("results".as_ref(), "unit_test")),
//! )
//! .record_status(StatusRecorder::new("results", "unit_test"))
//! .run()?;
//! ```

pub mod drain;
pub mod error;
pub mod outcome;
pub mod request;
pub mod session;
pub mod status;
pub mod wait;

pub use drain::CapturedOutput;
pub use error::ExecError;
pub use outcome::ExecutionOutcome;
pub use request::{ExecutionRequest, OutputMode, StreamSink};
pub use session::{Session, SessionReport};
pub use status::{read_status, Status, StatusRecorder};
