use driver::mux::{Channel, CHANNEL_MASKS};

/// Round-robin position over the eight multiplexer channels.
///
/// The state is the selection mask itself, so a value that is not one of the
/// known masks is representable; `advance` treats it as corruption and starts
/// over from the first channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRotator {
    mask: u8,
}

impl Default for ChannelRotator {
    fn default() -> Self {
        Self::starting_at(Channel::FIRST)
    }
}

impl ChannelRotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(channel: Channel) -> Self {
        Self {
            mask: channel.mask(),
        }
    }

    /// Restore from a raw mask, which may not name a valid channel
    pub fn from_raw_mask(mask: u8) -> Self {
        Self { mask }
    }

    /// Channel currently selected, or `None` if the state is corrupted
    pub fn current(&self) -> Option<Channel> {
        Channel::from_mask(self.mask)
    }

    /// Channel currently selected, falling back to the first channel
    pub fn current_or_first(&self) -> Channel {
        self.current().unwrap_or(Channel::FIRST)
    }

    pub fn raw_mask(&self) -> u8 {
        self.mask
    }

    /// Move to the next channel, wrapping after the last one
    pub fn advance(&mut self) -> Channel {
        self.mask = match CHANNEL_MASKS.iter().position(|&m| m == self.mask) {
            Some(position) => CHANNEL_MASKS[(position + 1) % CHANNEL_MASKS.len()],
            None => CHANNEL_MASKS[0],
        };
        self.current_or_first()
    }
}
