// I2C multiplexer driver and downstream channel addressing
//
// The multiplexer has one control register written with a bare byte: bit i
// set connects downstream bus i. Writing 0x00 disconnects everything.

use core::fmt;

use hal::{BusAdapter, BusResult};

// TCA9548A I2C addresses (A2..A0 strapped low gives the base address)
pub const TCA9548A_I2C_ADDR_BASE: u8 = 0x70;
pub const TCA9548A_I2C_ADDR_LAST: u8 = 0x77;

// Control register value selecting no downstream bus
pub const TCA9548A_DISABLE_ALL: u8 = 0x00;

/// Number of downstream channels
pub const CHANNEL_COUNT: usize = 8;

/// Channel selection masks in rotation order
pub const CHANNEL_MASKS: [u8; CHANNEL_COUNT] = [
    0b0000_0001,
    0b0000_0010,
    0b0000_0100,
    0b0000_1000,
    0b0001_0000,
    0b0010_0000,
    0b0100_0000,
    0b1000_0000,
];

/// One downstream multiplexer channel, index 0..=7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    /// Every channel in fixed order
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel(0),
        Channel(1),
        Channel(2),
        Channel(3),
        Channel(4),
        Channel(5),
        Channel(6),
        Channel(7),
    ];

    /// First channel in rotation order
    pub const FIRST: Channel = Channel(0);

    /// Channel for `index`, if it is in range
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < CHANNEL_COUNT {
            Some(Channel(index))
        } else {
            None
        }
    }

    /// Position of this channel, 0..=7
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Control register value that selects only this channel
    pub const fn mask(self) -> u8 {
        1 << self.0
    }

    /// Channel selected by `mask`; `None` unless exactly one bit is set
    pub fn from_mask(mask: u8) -> Option<Self> {
        CHANNEL_MASKS
            .iter()
            .position(|&m| m == mask)
            .map(|index| Channel(index as u8))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// TCA9548A-style 1-to-8 I2C multiplexer
///
/// Holds no selection state; every call is one unconditional bus write. The
/// caller is responsible for pairing each `activate` with a `deactivate`
/// while holding the bus lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tca9548a {
    addr: u8,
}

impl Default for Tca9548a {
    fn default() -> Self {
        Self::new(TCA9548A_I2C_ADDR_BASE)
    }
}

impl Tca9548a {
    /// Create a controller for the multiplexer at `addr`
    pub const fn new(addr: u8) -> Self {
        Self { addr }
    }

    /// I2C address of the multiplexer
    pub const fn address(&self) -> u8 {
        self.addr
    }

    /// Write a raw selection mask to the control register
    pub fn select_mask<B: BusAdapter>(&self, bus: &mut B, mask: u8) -> BusResult<()> {
        bus.write_byte(self.addr, mask)
    }

    /// Connect `channel` to the shared bus
    pub fn activate<B: BusAdapter>(&self, bus: &mut B, channel: Channel) -> BusResult<()> {
        self.select_mask(bus, channel.mask())
    }

    /// Disconnect every downstream channel
    pub fn deactivate<B: BusAdapter>(&self, bus: &mut B) -> BusResult<()> {
        self.select_mask(bus, TCA9548A_DISABLE_ALL)
    }
}
