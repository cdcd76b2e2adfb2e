// Chip drivers for the multiplexed accelerometer array.
//
// Every driver is stateless with respect to the bus: the bus handle is passed
// into each call, so one caller can hold the shared bus lock across several
// driver operations.

pub mod imu;
pub mod muxed;
pub mod mux;

pub use imu::{AccelSample, AccelerometerChip, Mpu6050, Mpu6050Config};
pub use mux::{Channel, Tca9548a};
pub use muxed::MuxedSensor;
