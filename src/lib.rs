//! A small priority-threshold logger with console fallback, fan-out to other
//! loggers and simulated-time stamping, plus calendar and path helpers.
//!
//! ```no_run
//! use std::rc::Rc;
//! use priolog::Logger;
//!
//! let main = Rc::new(Logger::new(Some("run.log"), Some("~/logs"), 2)?);
//! let errors = Rc::new(Logger::new(Some("errors.log"), Some("~/logs"), 1)?);
//! main.register_fan_out(&errors);
//!
//! main.log(1, "reaches both files")?;
//! main.log(2, "only run.log")?;
//! # Ok::<(), priolog::LogError>(())
//! ```

pub mod config;
pub mod dates;
pub mod error;
pub mod lines;
pub mod logger;
pub mod logging;
pub mod paths;

pub use error::{LogError, PathError};
pub use lines::LineReader;
pub use logger::{DEFAULT_THRESHOLD, Logger};
pub use paths::Destination;
