// Round-robin sampling loop
//
// One iteration: pick the current channel, select it, make sure its sensor is
// configured, read the three axes, release the channel, append one CSV row,
// move to the next channel. A bus failure anywhere in that sequence yields a
// zeroed row for the channel instead of an error.

use std::sync::mpsc::{Receiver, TryRecvError};

use driver::mux::CHANNEL_COUNT;
use driver::{AccelSample, AccelerometerChip, Channel, Mpu6050, MuxedSensor, Tca9548a};
use hal::{BusAdapter, BusError, SharedBus};
use log::{debug, info, warn};

use crate::config::SamplerConfig;
use crate::error::SamplerResult;
use crate::record::{CsvLog, LogRow, LogSink};
use crate::rotator::ChannelRotator;
use crate::runner::LoopCommand;
use crate::schedule::Ticker;

/// What happened to the sensor read in one iteration
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    /// The sensor answered; the row carries its values
    Sampled(AccelSample),
    /// The bus failed; the row carries zeros
    Degraded(BusError),
}

/// Result of one [`SamplingLoop::step`]
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub channel: Channel,
    pub outcome: IterationOutcome,
}

impl IterationReport {
    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, IterationOutcome::Degraded(_))
    }
}

/// Sampling loop for one multiplexer and its eight channels
pub struct SamplingLoop<B, C, W: LogSink> {
    name: String,
    bus: SharedBus<B>,
    sensor: MuxedSensor<C>,
    rotator: ChannelRotator,
    log: CsvLog<W>,
    // one slot per channel, or only slot 0 when a single startup
    // initialization covers every channel
    initialized: [bool; CHANNEL_COUNT],
    config: SamplerConfig,
    iterations: u64,
}

impl<B: BusAdapter, W: LogSink> SamplingLoop<B, Mpu6050, W> {
    /// Loop reading MPU-6050 sensors at `config.sensor_address`
    pub fn with_mpu6050(
        name: impl Into<String>,
        bus: SharedBus<B>,
        log: CsvLog<W>,
        config: SamplerConfig,
    ) -> SamplerResult<Self> {
        let chip = Mpu6050::new(config.sensor_address);
        Self::new(name, bus, chip, log, config)
    }
}

impl<B: BusAdapter, C: AccelerometerChip, W: LogSink> SamplingLoop<B, C, W> {
    pub fn new(
        name: impl Into<String>,
        bus: SharedBus<B>,
        chip: C,
        log: CsvLog<W>,
        config: SamplerConfig,
    ) -> SamplerResult<Self> {
        config.validate()?;
        let sensor = MuxedSensor::new(Tca9548a::new(config.multiplexer_address), chip);
        Ok(Self {
            name: name.into(),
            bus,
            sensor,
            rotator: ChannelRotator::new(),
            log,
            initialized: [false; CHANNEL_COUNT],
            config,
            iterations: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn rotator(&self) -> &ChannelRotator {
        &self.rotator
    }

    /// Resume rotation from a given state
    pub fn set_rotator(&mut self, rotator: ChannelRotator) {
        self.rotator = rotator;
    }

    /// Iterations completed so far
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn is_initialized(&self, channel: Channel) -> bool {
        self.initialized[self.init_slot(channel)]
    }

    pub fn log(&self) -> &CsvLog<W> {
        &self.log
    }

    pub fn into_log(self) -> CsvLog<W> {
        self.log
    }

    fn init_slot(&self, channel: Channel) -> usize {
        if self.config.initialize_per_channel {
            channel.index() as usize
        } else {
            0
        }
    }

    /// Write the log header and, in single-initialization mode, configure the
    /// sensors through the first channel.
    pub fn start(&mut self) -> SamplerResult<()> {
        self.log.write_header()?;
        info!(
            "[{}] sampling through multiplexer 0x{:02X}, {} at 0x{:02X}, log {}",
            self.name,
            self.config.multiplexer_address,
            self.sensor.chip().chip_name(),
            self.config.sensor_address,
            self.log.path().display()
        );

        if !self.config.initialize_per_channel {
            let result = {
                let mut bus = self.bus.lock();
                self.sensor.initialize(&mut *bus, Channel::FIRST)
            };
            match result {
                Ok(()) => {
                    self.initialized[0] = true;
                    info!("[{}] sensors initialized", self.name);
                }
                Err(err) => warn!(
                    "[{}] startup initialization failed, will retry: {}",
                    self.name, err
                ),
            }
        }
        Ok(())
    }

    /// Run one iteration. Only log I/O failures are returned as errors.
    pub fn step(&mut self) -> SamplerResult<IterationReport> {
        let channel = match self.rotator.current() {
            Some(channel) => channel,
            None => {
                warn!(
                    "[{}] invalid channel state 0x{:02X}, restarting at channel {}",
                    self.name,
                    self.rotator.raw_mask(),
                    Channel::FIRST
                );
                self.rotator = ChannelRotator::new();
                Channel::FIRST
            }
        };

        let slot = self.init_slot(channel);
        let needs_init = !self.initialized[slot];
        let mut initialized_now = false;

        // the lock spans the whole exchange so no other loop can change the
        // multiplexer selection between activation and the reads
        let result = {
            let mut bus = self.bus.lock();
            self.sensor.within_channel(&mut *bus, channel, |chip, bus| {
                if needs_init {
                    chip.initialize(bus)?;
                    initialized_now = true;
                }
                chip.read_acceleration(bus)
            })
        };

        if initialized_now {
            self.initialized[slot] = true;
            info!("[{}] initialized sensor on channel {}", self.name, channel);
        }

        let (row, outcome) = match result {
            Ok(sample) => {
                debug!(
                    "[{}] channel {}: {:?},{:?},{:?}",
                    self.name, channel, sample.x, sample.y, sample.z
                );
                (LogRow::reading(channel, &sample), IterationOutcome::Sampled(sample))
            }
            Err(err) => {
                if needs_init && !initialized_now {
                    warn!(
                        "[{}] initialization failed on channel {}: {}",
                        self.name, channel, err
                    );
                } else {
                    warn!("[{}] read failed on channel {}: {}", self.name, channel, err);
                }
                (LogRow::zeroed(channel), IterationOutcome::Degraded(err))
            }
        };

        self.log.append(&row)?;
        self.rotator.advance();
        self.iterations += 1;

        Ok(IterationReport { channel, outcome })
    }

    /// Run until a stop command arrives or the command channel closes.
    /// Returns the number of iterations completed.
    pub fn run(&mut self, commands: &Receiver<LoopCommand>) -> SamplerResult<u64> {
        self.start()?;
        let mut ticker = Ticker::new(self.config.period);

        loop {
            match commands.try_recv() {
                Ok(LoopCommand::Stop) => {
                    info!("[{}] stop requested", self.name);
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    info!("[{}] command channel closed", self.name);
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            self.step()?;
            ticker.wait();
        }

        info!(
            "[{}] stopped after {} iterations ({} rows)",
            self.name,
            self.iterations,
            self.log.rows()
        );
        Ok(self.iterations)
    }
}
