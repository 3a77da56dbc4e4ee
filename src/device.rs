use embedded_hal::spi::SpiDevice;

use crate::{encode, Channel, ChannelState, Error, Frame, Gain, Mcp48xx, Model};

impl<DEV, E> Mcp48xx<DEV>
where
    DEV: SpiDevice<Error = E>,
{
    /// Create a new MCP48xx DAC on an SPI device.
    ///
    /// Both channels start shut down with a gain of two and a code of zero;
    /// nothing is sent until the first value or update.
    pub fn new(model: Model, spi: DEV) -> Self {
        Self {
            spi,
            model,
            channels: [ChannelState::default(); 2],
            sent: [None; 2],
        }
    }
    /// Create a new 8 bit MCP4802
    pub fn new_mcp4802(spi: DEV) -> Self {
        Self::new(Model::Mcp4802, spi)
    }
    /// Create a new 10 bit MCP4812
    pub fn new_mcp4812(spi: DEV) -> Self {
        Self::new(Model::Mcp4812, spi)
    }
    /// Create a new 12 bit MCP4822
    pub fn new_mcp4822(spi: DEV) -> Self {
        Self::new(Model::Mcp4822, spi)
    }
    /// Create a DAC from a resolution in bits (8, 10 or 12).
    ///
    /// Prefer validating with [`Model::try_from`] before the bus is set up;
    /// on failure here the SPI device is dropped.
    pub fn with_resolution(bits: u8, spi: DEV) -> Result<Self, Error<E>> {
        let model = Model::try_from(bits)?;
        Ok(Self::new(model, spi))
    }
    /// Release the SPI device
    pub fn destroy(self) -> DEV {
        self.spi
    }

    /// Configured chip
    pub fn model(&self) -> Model {
        self.model
    }
    /// Current state of a channel, which might not have been sent yet
    pub fn state(&self, chan: Channel) -> &ChannelState {
        &self.channels[chan as usize]
    }
    /// Last frame written for a channel
    pub fn last_frame(&self, chan: Channel) -> Option<Frame> {
        self.sent[chan as usize]
    }

    /// Set the output code of a channel, power it up and send it.
    ///
    /// The code must be below `2^resolution`, otherwise
    /// [`Error::Overflow`] is returned and nothing changes.
    pub fn set_value(&mut self, chan: Channel, value: u16) -> Result<(), Error<E>> {
        let max = self.model.max();
        if value >= max {
            warn!("{} rejected value {} (max {})", chan, value, max);
            return Err(Error::Overflow { value, max });
        }
        let state = &mut self.channels[chan as usize];
        state.enabled = true;
        state.value = value;
        self.update(chan)
    }
    /// Select the gain of a channel. Takes effect on the next update.
    pub fn set_gain(&mut self, chan: Channel, gain: Gain) {
        self.channels[chan as usize].gain = gain;
    }
    /// Mark a channel active. Takes effect on the next update.
    pub fn enable(&mut self, chan: Channel) {
        self.channels[chan as usize].enabled = true;
    }
    /// Mark a channel shut down. Takes effect on the next update.
    pub fn disable(&mut self, chan: Channel) {
        self.channels[chan as usize].enabled = false;
    }
    /// Return both channels to the power on state, without sending it.
    pub fn reset(&mut self) {
        self.channels = [ChannelState::default(); 2];
    }

    /// Send the current state of a channel
    pub fn update(&mut self, chan: Channel) -> Result<(), Error<E>> {
        let frame = encode(chan, &self.channels[chan as usize]);
        self.spi_write(frame)?;
        self.sent[chan as usize] = Some(frame);
        Ok(())
    }
    /// Send channel A then channel B
    pub fn update_all(&mut self) -> Result<(), Error<E>> {
        for chan in Channel::ALL {
            self.update(chan)?;
        }
        Ok(())
    }

    /// Set the output code of channel A and send it
    pub fn set_value_a(&mut self, value: u16) -> Result<(), Error<E>> {
        self.set_value(Channel::DacA, value)
    }
    /// Set the output code of channel B and send it
    pub fn set_value_b(&mut self, value: u16) -> Result<(), Error<E>> {
        self.set_value(Channel::DacB, value)
    }
    /// Switch channel A to a gain of one
    pub fn set_gain_a(&mut self) {
        self.set_gain(Channel::DacA, Gain::X1)
    }
    /// Switch channel B to a gain of one
    pub fn set_gain_b(&mut self) {
        self.set_gain(Channel::DacB, Gain::X1)
    }
    /// Mark channel A shut down, see [`Self::update_dac`]
    pub fn shutdown_channel_a(&mut self) {
        self.disable(Channel::DacA)
    }
    /// Mark channel B shut down, see [`Self::update_dac`]
    pub fn shutdown_channel_b(&mut self) {
        self.disable(Channel::DacB)
    }
    /// Push the state of both channels to the chip
    pub fn update_dac(&mut self) -> Result<(), Error<E>> {
        self.update_all()
    }

    fn spi_write(&mut self, frame: Frame) -> Result<(), Error<E>> {
        trace!("write {}", frame);
        self.spi.write(&frame.to_be_bytes()).map_err(|e| {
            debug!("write of {} failed", frame);
            Error::Spi(e)
        })
    }
}
