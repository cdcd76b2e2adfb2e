/// Byte-level bus transport interface
use thiserror::Error;

/// Failure of a single bus transaction.
///
/// The sampling side does not distinguish between variants; they exist so
/// diagnostics can say what actually went wrong on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Device did not acknowledge its address or a data byte
    #[error("device 0x{address:02X} did not acknowledge")]
    Nack {
        /// 7-bit address of the device being accessed
        address: u8,
    },

    /// Transaction did not complete in time
    #[error("transaction with device 0x{address:02X} timed out")]
    Timeout {
        /// 7-bit address of the device being accessed
        address: u8,
    },

    /// Another controller won arbitration on the bus
    #[error("arbitration lost while addressing 0x{address:02X}")]
    ArbitrationLoss {
        /// 7-bit address of the device being accessed
        address: u8,
    },

    /// Any other transport failure reported by the platform
    #[error("bus error while addressing 0x{address:02X}: {detail}")]
    Transport {
        /// 7-bit address of the device being accessed
        address: u8,
        /// Platform-specific description
        detail: String,
    },
}

impl BusError {
    /// Address of the device the failed transaction targeted
    pub fn address(&self) -> u8 {
        match self {
            BusError::Nack { address }
            | BusError::Timeout { address }
            | BusError::ArbitrationLoss { address }
            | BusError::Transport { address, .. } => *address,
        }
    }
}

/// Result type for bus transactions
pub type BusResult<T> = Result<T, BusError>;

/// Thin, stateless transport over the shared bus.
///
/// Implementations perform exactly one transaction per call and never retry.
/// They are not internally synchronized; see [`crate::SharedBus`].
pub trait BusAdapter {
    /// Write a single byte to a device with no register pointer.
    ///
    /// This is how a multiplexer control register is written.
    fn write_byte(&mut self, address: u8, value: u8) -> BusResult<()>;

    /// Write `value` into `register` on the device at `address`
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> BusResult<()>;

    /// Read one byte from `register` on the device at `address`
    fn read_register(&mut self, address: u8, register: u8) -> BusResult<u8>;
}

impl<B: BusAdapter + ?Sized> BusAdapter for &mut B {
    fn write_byte(&mut self, address: u8, value: u8) -> BusResult<()> {
        (**self).write_byte(address, value)
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> BusResult<()> {
        (**self).write_register(address, register, value)
    }

    fn read_register(&mut self, address: u8, register: u8) -> BusResult<u8> {
        (**self).read_register(address, register)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_address() {
        assert_eq!(BusError::Nack { address: 0x68 }.address(), 0x68);
        assert_eq!(BusError::Timeout { address: 0x70 }.address(), 0x70);
        let err = BusError::Transport {
            address: 0x69,
            detail: "EIO".into(),
        };
        assert_eq!(err.address(), 0x69);
    }

    #[test]
    fn test_error_display() {
        let err = BusError::Nack { address: 0x68 };
        assert_eq!(err.to_string(), "device 0x68 did not acknowledge");
    }
}
