//! Write command word
use bitfield_struct::bitfield;

use crate::{Channel, ChannelState, Gain};

/// 16 bit write command, clocked out MSB first.
///
/// | Bits  | Field                                   |
/// |-------|-----------------------------------------|
/// | 15    | ~A/B: 1 = channel B, 0 = channel A      |
/// | 14    | unused, always 0                        |
/// | 13    | ~GA: 1 = gain x1, 0 = gain x2           |
/// | 12    | ~SHDN: 1 = active, 0 = shutdown         |
/// | 11-0  | data, right aligned                     |
#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub struct Frame {
    /// Output code
    #[bits(12)]
    pub data: u16,
    /// Channel is active, cleared to shut it down
    pub active: bool,
    /// Gain of one, cleared for a gain of two
    pub gain_x1: bool,
    #[bits(1)]
    _unused: bool,
    /// Frame addresses channel B
    pub channel_b: bool,
}

impl Frame {
    /// Bytes in transmission order
    pub fn to_be_bytes(self) -> [u8; 2] {
        u16::from(self).to_be_bytes()
    }

    /// Channel this frame addresses
    pub fn channel(&self) -> Channel {
        if self.channel_b() {
            Channel::DacB
        } else {
            Channel::DacA
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Frame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Frame({=u16:#x})", u16::from(*self))
    }
}

/// Build the write command for `chan` from its current state.
///
/// The value is expected to be already validated against the chip's
/// resolution; bits above bit 11 are dropped.
pub fn encode(chan: Channel, state: &ChannelState) -> Frame {
    Frame::new()
        .with_channel_b(chan == Channel::DacB)
        .with_gain_x1(state.gain == Gain::X1)
        .with_active(state.enabled)
        .with_data(state.value & 0x0FFF)
}
