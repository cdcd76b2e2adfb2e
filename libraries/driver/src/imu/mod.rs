// Accelerometer driver module
//
// A chip driver knows its register map, how to bring the device out of reset
// and how to turn register contents into physical units. It knows nothing
// about multiplexing; see `crate::muxed` for channel routing.

use hal::{BusAdapter, BusResult, Vector3d};

pub mod mpu6050;

pub use self::mpu6050::{Mpu6050, Mpu6050Config};

/// Three-axis acceleration in g
pub type AccelSample = Vector3d;

/// Interface for accelerometer chip implementations
pub trait AccelerometerChip {
    /// Write the one-time register configuration.
    ///
    /// Must run once per physical device before its readings mean anything.
    fn initialize<B: BusAdapter>(&self, bus: &mut B) -> BusResult<()>;

    /// Read the signed 16-bit value stored at `high_register` and the
    /// register after it
    fn read_axis_raw<B: BusAdapter>(&self, bus: &mut B, high_register: u8) -> BusResult<i16>;

    /// Sensitivity of the configured full-scale range, in counts per g
    fn counts_per_g(&self) -> f64;

    /// Read one axis and convert it to g
    fn read_axis<B: BusAdapter>(&self, bus: &mut B, high_register: u8) -> BusResult<f64> {
        let raw = self.read_axis_raw(bus, high_register)?;
        Ok(raw as f64 / self.counts_per_g())
    }

    /// Read all three axes and convert them to g
    fn read_acceleration<B: BusAdapter>(&self, bus: &mut B) -> BusResult<AccelSample>;

    /// Get the name of the chip
    fn chip_name(&self) -> &'static str;
}
