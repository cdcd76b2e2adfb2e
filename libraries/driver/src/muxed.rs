// Sensor routed through one multiplexer channel
//
// Every identical sensor answers at the same address, so the only way to
// reach a particular one is to select its channel first. `MuxedSensor` wraps
// a chip driver with the select/release bracketing.

use hal::{BusAdapter, BusResult};
use log::warn;

use crate::imu::{AccelSample, AccelerometerChip};
use crate::mux::{Channel, Tca9548a};

/// A chip driver reachable through a multiplexer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuxedSensor<C> {
    mux: Tca9548a,
    chip: C,
}

impl<C: AccelerometerChip> MuxedSensor<C> {
    /// Pair a multiplexer with the chip type wired behind its channels
    pub fn new(mux: Tca9548a, chip: C) -> Self {
        Self { mux, chip }
    }

    /// Multiplexer controller
    pub fn mux(&self) -> &Tca9548a {
        &self.mux
    }

    /// Chip driver
    pub fn chip(&self) -> &C {
        &self.chip
    }

    /// Run `f` with `channel` selected, then release the multiplexer.
    ///
    /// Release is attempted even when activation or `f` failed, so a failed
    /// exchange does not leave a channel connected. The first error wins.
    pub fn within_channel<B, R, F>(&self, bus: &mut B, channel: Channel, f: F) -> BusResult<R>
    where
        B: BusAdapter,
        F: FnOnce(&C, &mut B) -> BusResult<R>,
    {
        let result = self
            .mux
            .activate(bus, channel)
            .and_then(|_| f(&self.chip, bus));
        let released = self.mux.deactivate(bus);

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!(
                    "channel {} could not be released after a failed exchange: {}",
                    channel, release_err
                );
                Err(err)
            }
            (Ok(_), Err(release_err)) => Err(release_err),
        }
    }

    /// Configure the device behind `channel`
    pub fn initialize<B: BusAdapter>(&self, bus: &mut B, channel: Channel) -> BusResult<()> {
        self.within_channel(bus, channel, |chip, bus| chip.initialize(bus))
    }

    /// Read one axis of the device behind `channel`, selecting and releasing
    /// the channel around this single register pair
    pub fn read_axis<B: BusAdapter>(
        &self,
        bus: &mut B,
        channel: Channel,
        high_register: u8,
    ) -> BusResult<f64> {
        self.within_channel(bus, channel, |chip, bus| chip.read_axis(bus, high_register))
    }

    /// Read all three axes of the device behind `channel` under a single
    /// selection
    pub fn read_acceleration<B: BusAdapter>(
        &self,
        bus: &mut B,
        channel: Channel,
    ) -> BusResult<AccelSample> {
        self.within_channel(bus, channel, |chip, bus| chip.read_acceleration(bus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imu::mpu6050::{MPU6050_REG_ACCEL_XOUT_H, MPU6050_REG_ACCEL_ZOUT_H};
    use crate::imu::Mpu6050;
    use hal::mock::{MockBus, Transaction};

    fn sensor() -> MuxedSensor<Mpu6050> {
        MuxedSensor::new(Tca9548a::new(0x70), Mpu6050::new(0x68))
    }

    fn channel(index: u8) -> Channel {
        Channel::new(index).unwrap()
    }

    #[test]
    fn test_read_acceleration_selects_once() {
        let mut bus = MockBus::fully_populated(0x70, 0x68);
        bus.set_pair(3, 0x68, MPU6050_REG_ACCEL_XOUT_H, 0x20, 0x00);

        let sample = sensor().read_acceleration(&mut bus, channel(3)).unwrap();

        assert_eq!(sample.x, 2.0);
        assert_eq!(bus.selection_history(), vec![0b0000_1000, 0x00]);
        assert_eq!(bus.selected_mask(), 0x00, "bus must be released afterwards");
    }

    #[test]
    fn test_read_axis_selects_per_call() {
        let mut bus = MockBus::fully_populated(0x70, 0x68);
        bus.set_pair(1, 0x68, MPU6050_REG_ACCEL_ZOUT_H, 0xF0, 0x00);
        let sensor = sensor();

        let z = sensor
            .read_axis(&mut bus, channel(1), MPU6050_REG_ACCEL_ZOUT_H)
            .unwrap();
        assert_eq!(z, -1.0);

        let transactions = bus.transactions();
        assert_eq!(transactions.len(), 4);
        assert_eq!(transactions[0], Transaction::WriteByte { address: 0x70, value: 0b10 });
        assert_eq!(transactions[3], Transaction::WriteByte { address: 0x70, value: 0x00 });
    }

    #[test]
    fn test_release_after_failed_read() {
        let mut bus = MockBus::fully_populated(0x70, 0x68);
        bus.fail_next_reads(1);

        let result = sensor().read_acceleration(&mut bus, channel(0));

        assert_eq!(result, Err(hal::BusError::Timeout { address: 0x68 }));
        assert_eq!(bus.selected_mask(), 0x00);
        assert_eq!(bus.selection_history(), vec![0x01, 0x00]);
    }

    #[test]
    fn test_failed_activation_skips_chip() {
        let mut bus = MockBus::fully_populated(0x70, 0x68);
        bus.fail_next_mux_writes(1);

        let result = sensor().read_acceleration(&mut bus, channel(0));

        assert!(result.is_err());
        assert!(
            !bus
                .transactions()
                .iter()
                .any(|t| matches!(t, Transaction::ReadRegister { .. })),
            "no sensor access without an active channel"
        );
        assert_eq!(bus.selected_mask(), 0x00);
    }

    #[test]
    fn test_initialize_reaches_only_selected_device() {
        let mut bus = MockBus::fully_populated(0x70, 0x68);

        sensor().initialize(&mut bus, channel(6)).unwrap();

        assert_eq!(bus.register(6, 0x68, 0x1C), Some(0x10));
        assert_eq!(bus.register(6, 0x68, 0x6B), Some(0x01));
        assert_eq!(bus.register(0, 0x68, 0x6B), Some(0x00));
    }

    #[test]
    fn test_disconnected_channel_fails_without_affecting_others() {
        let mut bus = MockBus::fully_populated(0x70, 0x68);
        bus.disconnect(2);
        let sensor = sensor();

        assert!(sensor.read_acceleration(&mut bus, channel(2)).is_err());
        assert!(sensor.read_acceleration(&mut bus, channel(3)).is_ok());
    }
}
