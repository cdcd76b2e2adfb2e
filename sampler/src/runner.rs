use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use driver::AccelerometerChip;
use hal::BusAdapter;
use log::{error, info};

use crate::error::{SamplerError, SamplerResult};
use crate::record::LogSink;
use crate::sampler::SamplingLoop;

// How often `run_all` checks for loops that have exited
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Command sent to a running loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    Stop,
}

/// A sampling loop running on its own thread
pub struct LoopHandle {
    name: String,
    to_worker_tx: mpsc::Sender<LoopCommand>,
    worker_thread: JoinHandle<SamplerResult<u64>>,
}

impl LoopHandle {
    /// Move `sampling` onto a new thread named after the loop and start it
    pub fn spawn<B, C, W>(mut sampling: SamplingLoop<B, C, W>) -> SamplerResult<Self>
    where
        B: BusAdapter + Send + 'static,
        C: AccelerometerChip + Send + 'static,
        W: LogSink + Send + 'static,
    {
        let name = sampling.name().to_string();
        let (to_worker_tx, to_worker_rx) = mpsc::channel();

        let worker_thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || sampling.run(&to_worker_rx))
            .map_err(|source| SamplerError::Spawn {
                name: name.clone(),
                source,
            })?;

        info!("[{}] loop thread started", name);
        Ok(Self {
            name,
            to_worker_tx,
            worker_thread,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the loop to stop after its current iteration
    pub fn stop(&self) {
        // the loop may already have exited on its own
        let _ = self.to_worker_tx.send(LoopCommand::Stop);
    }

    pub fn is_finished(&self) -> bool {
        self.worker_thread.is_finished()
    }

    /// Wait for the loop to exit. Returns its iteration count.
    pub fn join(self) -> SamplerResult<u64> {
        let result = match self.worker_thread.join() {
            Ok(result) => result,
            Err(_) => Err(SamplerError::LoopPanicked(self.name.clone())),
        };
        if let Err(err) = &result {
            error!("[{}] loop terminated: {}", self.name, err);
        }
        result
    }
}

/// Wait for every loop to exit. Returns iteration counts in handle order.
///
/// Loops are watched together, so whichever fails first is seen first. When
/// one ends with an error the others are stopped and joined, then that error
/// is returned.
pub fn run_all(handles: Vec<LoopHandle>) -> SamplerResult<Vec<u64>> {
    let mut slots: Vec<Option<LoopHandle>> = handles.into_iter().map(Some).collect();
    let mut counts = vec![0; slots.len()];
    let mut remaining = slots.len();

    while remaining > 0 {
        let finished = slots
            .iter()
            .position(|slot| matches!(slot, Some(handle) if handle.is_finished()));
        let Some(index) = finished else {
            thread::sleep(JOIN_POLL_INTERVAL);
            continue;
        };
        let Some(handle) = slots[index].take() else {
            continue;
        };
        remaining -= 1;

        match handle.join() {
            Ok(count) => counts[index] = count,
            Err(err) => {
                let others: Vec<LoopHandle> = slots.into_iter().flatten().collect();
                for other in &others {
                    other.stop();
                }
                for other in others {
                    // failures here are logged by join
                    let _ = other.join();
                }
                return Err(err);
            }
        }
    }

    Ok(counts)
}
