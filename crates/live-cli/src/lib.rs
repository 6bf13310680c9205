//! Command-line host for the live session controller.
//!
//! Obtains a stream key (given on the command line or provisioned through
//! the HTTP API), starts a [`live_engine::Live`] session over RTMP and
//! reports its state until it ends or the user interrupts it.

mod args;
mod commands;
mod settings;

pub use args::{Args, ArgsError, USAGE};
pub use commands::{drive, run, ConsoleObserver, SessionOutcome, Signal};
pub use settings::Settings;
