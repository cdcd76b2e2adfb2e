// Hardware wiring of the sampling rig
//
// One Linux I2C adapter, one multiplexer on it and the same accelerometer
// model behind every multiplexer channel.

use std::path::Path;

use anyhow::{Context, Result};
use hal::{BusAdapter, SharedBus};
use log::info;
use sampler::{CsvLog, LoopHandle, SamplerConfig, SamplingLoop};

/// I2C adapter the multiplexers hang off
pub const I2C_DEVICE: &str = "/dev/i2c-2";

/// One sampling loop is started per multiplexer address listed here
pub const MULTIPLEXER_ADDRESSES: [u8; 1] = [0x70];

#[cfg(target_os = "linux")]
pub fn open_bus() -> Result<SharedBus<hal::I2cBus<linux_embedded_hal::I2cdev>>> {
    let device = linux_embedded_hal::I2cdev::new(I2C_DEVICE)
        .with_context(|| format!("failed to open I2C adapter {}", I2C_DEVICE))?;
    info!("opened I2C adapter {}", I2C_DEVICE);
    Ok(SharedBus::new(hal::I2cBus::new(device)))
}

/// Build and start one loop per multiplexer, each logging into `run_dir`
pub fn start_loops<B>(bus: &SharedBus<B>, run_dir: &Path) -> Result<Vec<LoopHandle>>
where
    B: BusAdapter + Send + 'static,
{
    let mut handles = Vec::with_capacity(MULTIPLEXER_ADDRESSES.len());

    for address in MULTIPLEXER_ADDRESSES {
        let config = SamplerConfig::default().with_multiplexer_address(address);
        // more than one multiplexer: one file each so rows never interleave
        let config = if MULTIPLEXER_ADDRESSES.len() > 1 {
            let file_name = format!("mux{:02x}_{}", address, config.log_file_name);
            config.with_log_file_name(file_name)
        } else {
            config
        };
        handles.push(start_loop(bus, run_dir, config)?);
    }
    Ok(handles)
}

fn start_loop<B>(bus: &SharedBus<B>, run_dir: &Path, config: SamplerConfig) -> Result<LoopHandle>
where
    B: BusAdapter + Send + 'static,
{
    let name = format!("mux-0x{:02x}", config.multiplexer_address);
    let path = run_dir.join(&config.log_file_name);
    let log = CsvLog::create(&path)
        .with_context(|| format!("failed to create log {}", path.display()))?;
    let sampling = SamplingLoop::with_mpu6050(name.clone(), bus.clone(), log, config)
        .with_context(|| format!("invalid settings for loop {}", name))?;
    LoopHandle::spawn(sampling).with_context(|| format!("failed to start loop {}", name))
}
