//! Hardware abstraction for the shared I2C bus.
//!
//! Everything above this crate talks to hardware through [`BusAdapter`]. The
//! physical bus is one process-wide resource, so callers receive it wrapped in
//! a [`SharedBus`] handle and hold its lock for every multi-step exchange.

mod bus;
mod i2c;
mod shared;
mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use bus::*;
pub use i2c::*;
pub use shared::*;
pub use types::*;
