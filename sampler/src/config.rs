use std::time::Duration;

use driver::imu::mpu6050::MPU6050_I2C_ADDR_PRIMARY;
use driver::mux::TCA9548A_I2C_ADDR_BASE;

use crate::error::{SamplerError, SamplerResult};

/// Settings for one sampling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
    /// I2C address of the multiplexer this loop drives
    pub multiplexer_address: u8,

    /// I2C address every sensor answers at once its channel is selected
    pub sensor_address: u8,

    /// Time between iterations
    pub period: Duration,

    /// Configure each channel's sensor the first time that channel is
    /// selected. When false, one initialization at startup is assumed to
    /// cover every channel.
    pub initialize_per_channel: bool,

    /// File name of the CSV log inside the run directory
    pub log_file_name: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            multiplexer_address: TCA9548A_I2C_ADDR_BASE,
            sensor_address: MPU6050_I2C_ADDR_PRIMARY,
            period: Duration::from_millis(100),
            initialize_per_channel: true,
            log_file_name: "accelerometer.csv".to_string(),
        }
    }
}

impl SamplerConfig {
    pub fn with_multiplexer_address(mut self, address: u8) -> Self {
        self.multiplexer_address = address;
        self
    }

    pub fn with_sensor_address(mut self, address: u8) -> Self {
        self.sensor_address = address;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_initialize_per_channel(mut self, enabled: bool) -> Self {
        self.initialize_per_channel = enabled;
        self
    }

    pub fn with_log_file_name(mut self, name: impl Into<String>) -> Self {
        self.log_file_name = name.into();
        self
    }

    /// Check the settings for values no loop could run with
    pub fn validate(&self) -> SamplerResult<()> {
        if self.period.is_zero() {
            return Err(SamplerError::Config("period must be non-zero".into()));
        }
        for (name, address) in [
            ("multiplexer_address", self.multiplexer_address),
            ("sensor_address", self.sensor_address),
        ] {
            if address > 0x7F {
                return Err(SamplerError::Config(format!(
                    "{} 0x{:02X} is not a 7-bit address",
                    name, address
                )));
            }
        }
        if self.multiplexer_address == self.sensor_address {
            return Err(SamplerError::Config(format!(
                "multiplexer and sensor cannot share address 0x{:02X}",
                self.sensor_address
            )));
        }
        if self.log_file_name.is_empty() {
            return Err(SamplerError::Config("log_file_name must not be empty".into()));
        }
        Ok(())
    }
}
