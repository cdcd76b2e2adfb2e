/// `embedded-hal` I2C controller adapted to [`BusAdapter`]
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::bus::{BusAdapter, BusError, BusResult};

/// Wraps any blocking `embedded-hal` I2C controller, such as
/// `linux_embedded_hal::I2cdev`.
pub struct I2cBus<I> {
    i2c: I,
}

impl<I: I2c> I2cBus<I> {
    /// Wrap an I2C controller
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Consume the adapter and return the I2C controller
    pub fn release(self) -> I {
        self.i2c
    }
}

fn map_error<E: embedded_hal::i2c::Error>(address: u8, error: E) -> BusError {
    match error.kind() {
        ErrorKind::NoAcknowledge(_) => BusError::Nack { address },
        ErrorKind::ArbitrationLoss => BusError::ArbitrationLoss { address },
        ErrorKind::Bus => BusError::Transport {
            address,
            detail: "bus error".into(),
        },
        ErrorKind::Overrun => BusError::Transport {
            address,
            detail: "overrun".into(),
        },
        kind => BusError::Transport {
            address,
            detail: format!("{:?}", kind),
        },
    }
}

impl<I: I2c> BusAdapter for I2cBus<I> {
    fn write_byte(&mut self, address: u8, value: u8) -> BusResult<()> {
        self.i2c
            .write(address, &[value])
            .map_err(|e| map_error(address, e))
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> BusResult<()> {
        self.i2c
            .write(address, &[register, value])
            .map_err(|e| map_error(address, e))
    }

    fn read_register(&mut self, address: u8, register: u8) -> BusResult<u8> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(address, &[register], &mut buffer)
            .map_err(|e| map_error(address, e))?;
        Ok(buffer[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::NoAcknowledgeSource;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    #[test]
    fn test_write_byte_is_single_byte_write() {
        let expectations = [Transaction::write(0x70, vec![0b0000_0100])];
        let mut bus = I2cBus::new(I2cMock::new(&expectations));

        bus.write_byte(0x70, 0b0000_0100).unwrap();

        bus.release().done();
    }

    #[test]
    fn test_register_write_and_read() {
        let expectations = [
            Transaction::write(0x68, vec![0x6B, 0x01]),
            Transaction::write_read(0x68, vec![0x3B], vec![0x10]),
        ];
        let mut bus = I2cBus::new(I2cMock::new(&expectations));

        bus.write_register(0x68, 0x6B, 0x01).unwrap();
        let value = bus.read_register(0x68, 0x3B).unwrap();
        assert_eq!(value, 0x10);

        bus.release().done();
    }

    #[test]
    fn test_nack_is_mapped() {
        let expectations = [Transaction::write_read(0x68, vec![0x3B], vec![0x00])
            .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))];
        let mut bus = I2cBus::new(I2cMock::new(&expectations));

        let result = bus.read_register(0x68, 0x3B);
        assert_eq!(result, Err(BusError::Nack { address: 0x68 }));

        bus.release().done();
    }

    #[test]
    fn test_other_errors_are_transport() {
        let expectations =
            [Transaction::write(0x70, vec![0x00]).with_error(ErrorKind::Bus)];
        let mut bus = I2cBus::new(I2cMock::new(&expectations));

        let result = bus.write_byte(0x70, 0x00);
        assert!(
            matches!(result, Err(BusError::Transport { address: 0x70, .. })),
            "bus fault should map to Transport, got {:?}",
            result
        );

        bus.release().done();
    }
}
