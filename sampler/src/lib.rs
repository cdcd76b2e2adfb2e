//! Round-robin accelerometer sampling.
//!
//! One [`SamplingLoop`] serves one multiplexer: each tick it selects the next
//! channel, reads that sensor and appends one row to a CSV log. Bus faults
//! degrade the row instead of stopping the loop. Several loops can share one
//! physical bus through [`hal::SharedBus`].

mod config;
mod error;
mod record;
mod rotator;
mod runner;
mod sampler;
mod schedule;
mod storage;

pub use config::SamplerConfig;
pub use error::{SamplerError, SamplerResult};
pub use record::{CsvLog, LogRow, LogSink, FIELD_COUNT, HEADER};
pub use rotator::ChannelRotator;
pub use runner::{run_all, LoopCommand, LoopHandle};
pub use sampler::{IterationOutcome, IterationReport, SamplingLoop};
pub use schedule::Ticker;
pub use storage::{allocate_run_directory, DEFAULT_RUN_DIRECTORY_BASE};
