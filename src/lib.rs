//! Driver for Microchip MCP48x2 series of dual channel 12/10/8bit SPI DACs
//!
//! | Device  | Resolution | Channels |
//! |---------|------------|----------|
//! | MCP4802 | 8-bit      | 2        |
//! | MCP4812 | 10-bit     | 2        |
//! | MCP4822 | 12-bit     | 2        |
//!
//! Every write is a single 16-bit word: four configuration bits followed by
//! the data bits. The word is clocked in with ~CS low and latched into the
//! input register of the selected channel on the rising edge of ~CS.
//!
//! The driver talks to the chip through an [`SpiDevice`], which owns the
//! chip-select line. On a bus shared between several chips use one of the
//! `embedded-hal-bus` devices; on an exclusively owned bus [`FramedBus`]
//! pairs an [`SpiBus`] with a chip-select pin.
//!
//! ```ignore
//! let mut dac = Mcp48xx::new_mcp4822(FramedBus::new(spi, cs)?);
//! dac.set_gain_a();
//! dac.set_value_a(2048)?;
//! dac.shutdown_channel_b();
//! dac.update_dac()?;
//! ```
//!
//! [`SpiDevice`]: embedded_hal::spi::SpiDevice
//! [`SpiBus`]: embedded_hal::spi::SpiBus

#![deny(unsafe_code, missing_docs)]
#![no_std]

use embedded_hal::spi::{Mode, MODE_0};

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod device;
pub mod frame;
pub mod transport;

pub use frame::{encode, Frame};
pub use transport::{FramedBus, FramedBusError};

/// SPI mode supported by the device (mode 1,1 works as well)
pub const SPI_MODE: Mode = MODE_0;
/// Bus clock the driver is usually run at
pub const DEFAULT_FREQUENCY_HZ: u32 = 400_000;
/// Maximum SPI clock frequency
pub const MAX_FREQUENCY_HZ: u32 = 20_000_000;

/// Internal voltage reference in microvolts
const VREF_UV: u32 = 2_048_000;

/// MCP48xx DAC
pub struct Mcp48xx<DEV> {
    spi: DEV,
    model: Model,
    channels: [ChannelState; 2],
    sent: [Option<Frame>; 2],
}

/// Errors for this crate
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// SPI communication error
    Spi(E),
    /// The value does not fit the resolution of the configured chip
    Overflow {
        /// Rejected value
        value: u16,
        /// Exclusive upper bound for the configured chip
        max: u16,
    },
    /// The requested resolution does not belong to a supported chip
    Configuration(UnsupportedResolution),
}

/// A resolution that matches none of the MCP4802, MCP4812 or MCP4822
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnsupportedResolution(pub u8);

impl<E> From<UnsupportedResolution> for Error<E> {
    fn from(value: UnsupportedResolution) -> Self {
        Self::Configuration(value)
    }
}

/// Supported chips, which only differ in resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Model {
    /// 8-bit
    Mcp4802 = 8,
    /// 10-bit
    Mcp4812 = 10,
    /// 12-bit
    Mcp4822 = 12,
}

impl Model {
    /// Number of data bits
    pub const fn resolution(self) -> u8 {
        self as u8
    }
    /// Exclusive upper bound for channel values, `2^resolution`
    pub const fn max(self) -> u16 {
        1 << self.resolution()
    }
}

impl TryFrom<u8> for Model {
    type Error = UnsupportedResolution;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::Mcp4802),
            10 => Ok(Self::Mcp4812),
            12 => Ok(Self::Mcp4822),
            _ => Err(UnsupportedResolution(bits)),
        }
    }
}

/// Dac Channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    /// DAC Channel A
    DacA = 0,
    /// DAC Channel B
    DacB = 1,
}

impl Channel {
    /// Both channels in update order
    pub const ALL: [Channel; 2] = [Channel::DacA, Channel::DacB];
}

/// Output gain relative to the internal 2.048V reference
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Vout = Vref * D / 2^n, 0V to 2.048V
    X1,
    /// Vout = 2 * Vref * D / 2^n, 0V to 4.096V (limited by the supply)
    #[default]
    X2,
}

/// Configuration and output code of a single channel
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    /// Active mode when set, shutdown (500kOhm to ground) otherwise
    pub enabled: bool,
    /// Output gain
    pub gain: Gain,
    /// Output code, right aligned
    pub value: u16,
}

impl ChannelState {
    /// Nominal output voltage in microvolts for a chip with `resolution` bits.
    ///
    /// Returns 0 for a channel in shutdown.
    pub fn output_microvolts(&self, resolution: u8) -> u32 {
        if !self.enabled {
            return 0;
        }
        let factor = match self.gain {
            Gain::X1 => 1,
            Gain::X2 => 2,
        };
        ((VREF_UV as u64 * factor * self.value as u64) >> resolution) as u32
    }
}
