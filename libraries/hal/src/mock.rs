//! Scriptable in-memory bus for tests
//!
//! Models one multiplexer and the devices wired behind each of its eight
//! downstream channels. Sensor registers are only reachable while exactly one
//! channel is selected, which is what real hardware does when the shared
//! devices all answer at the same address.

use std::collections::{HashMap, HashSet};

use crate::bus::{BusAdapter, BusError, BusResult};

/// One recorded bus transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    /// Bare byte write (multiplexer selection)
    WriteByte { address: u8, value: u8 },
    /// Register write
    WriteRegister { address: u8, register: u8, value: u8 },
    /// Register read
    ReadRegister { address: u8, register: u8 },
}

/// Mock bus with one multiplexer and per-channel register files
#[derive(Debug)]
pub struct MockBus {
    mux_address: u8,
    selected: u8,
    devices: HashMap<(u8, u8), [u8; 256]>,
    disconnected: HashSet<u8>,
    transactions: Vec<Transaction>,
    failing_reads: u32,
    failing_mux_writes: u32,
}

impl MockBus {
    /// Create a bus with a multiplexer at `mux_address` and nothing behind it
    pub fn new(mux_address: u8) -> Self {
        Self {
            mux_address,
            selected: 0,
            devices: HashMap::new(),
            disconnected: HashSet::new(),
            transactions: Vec::new(),
            failing_reads: 0,
            failing_mux_writes: 0,
        }
    }

    /// Create a bus with a device at `address` behind every channel
    pub fn fully_populated(mux_address: u8, address: u8) -> Self {
        let mut bus = Self::new(mux_address);
        for channel in 0..8 {
            bus.attach(channel, address);
        }
        bus
    }

    /// Wire a device at `address` behind downstream `channel` (0..=7)
    pub fn attach(&mut self, channel: u8, address: u8) -> &mut Self {
        self.devices.insert((channel, address), [0u8; 256]);
        self
    }

    /// Preload a register on a device
    pub fn set_register(
        &mut self,
        channel: u8,
        address: u8,
        register: u8,
        value: u8,
    ) -> &mut Self {
        if let Some(file) = self.devices.get_mut(&(channel, address)) {
            file[register as usize] = value;
        }
        self
    }

    /// Preload a big-endian 16-bit quantity starting at `high_register`
    pub fn set_pair(
        &mut self,
        channel: u8,
        address: u8,
        high_register: u8,
        high: u8,
        low: u8,
    ) -> &mut Self {
        self.set_register(channel, address, high_register, high);
        self.set_register(channel, address, high_register.wrapping_add(1), low)
    }

    /// Current value of a device register, if that device exists
    pub fn register(&self, channel: u8, address: u8, register: u8) -> Option<u8> {
        self.devices
            .get(&(channel, address))
            .map(|file| file[register as usize])
    }

    /// Fail the next `count` sensor register reads with a timeout
    pub fn fail_next_reads(&mut self, count: u32) {
        self.failing_reads = count;
    }

    /// Fail the next `count` multiplexer writes with a NACK
    pub fn fail_next_mux_writes(&mut self, count: u32) {
        self.failing_mux_writes = count;
    }

    /// Make every device behind `channel` stop answering
    pub fn disconnect(&mut self, channel: u8) {
        self.disconnected.insert(channel);
    }

    /// Undo [`MockBus::disconnect`]
    pub fn reconnect(&mut self, channel: u8) {
        self.disconnected.remove(&channel);
    }

    /// Currently selected multiplexer mask
    pub fn selected_mask(&self) -> u8 {
        self.selected
    }

    /// All transactions seen so far
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Every value written to the multiplexer, in order
    pub fn selection_history(&self) -> Vec<u8> {
        self.transactions
            .iter()
            .filter_map(|t| match t {
                Transaction::WriteByte { address, value } if *address == self.mux_address => {
                    Some(*value)
                }
                _ => None,
            })
            .collect()
    }

    /// Forget recorded transactions
    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    /// Resolve the register file currently reachable at `address`
    fn reachable(&mut self, address: u8) -> BusResult<&mut [u8; 256]> {
        if self.selected.count_ones() != 1 {
            return Err(BusError::Nack { address });
        }
        let channel = self.selected.trailing_zeros() as u8;
        if self.disconnected.contains(&channel) {
            return Err(BusError::Nack { address });
        }
        self.devices
            .get_mut(&(channel, address))
            .ok_or(BusError::Nack { address })
    }
}

impl BusAdapter for MockBus {
    fn write_byte(&mut self, address: u8, value: u8) -> BusResult<()> {
        self.transactions.push(Transaction::WriteByte { address, value });
        if address != self.mux_address {
            return Err(BusError::Nack { address });
        }
        if self.failing_mux_writes > 0 {
            self.failing_mux_writes -= 1;
            return Err(BusError::Nack { address });
        }
        self.selected = value;
        Ok(())
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> BusResult<()> {
        self.transactions.push(Transaction::WriteRegister {
            address,
            register,
            value,
        });
        let file = self.reachable(address)?;
        file[register as usize] = value;
        Ok(())
    }

    fn read_register(&mut self, address: u8, register: u8) -> BusResult<u8> {
        self.transactions
            .push(Transaction::ReadRegister { address, register });
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(BusError::Timeout { address });
        }
        let file = self.reachable(address)?;
        Ok(file[register as usize])
    }
}
