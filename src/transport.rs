//! Chip-select framing for an exclusively owned bus
use core::fmt::Debug;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{self, ErrorKind, ErrorType, Operation, SpiBus, SpiDevice};

/// [`SpiDevice`] made of an [`SpiBus`] and an active low chip-select pin.
///
/// Every transaction drives ~CS low, runs the operations, flushes the bus and
/// drives ~CS high again. The release is attempted even when the bus fails,
/// so an aborted word is never left latched with the bus held.
///
/// No delay source is available: [`Operation::DelayNs`] only flushes the bus.
pub struct FramedBus<BUS, CS> {
    bus: BUS,
    cs: CS,
}

/// Errors of a [`FramedBus`] transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramedBusError<BUS, CS> {
    /// The bus failed
    Bus(BUS),
    /// The chip-select pin could not be driven
    ChipSelect(CS),
}

impl<BUS, CS> spi::Error for FramedBusError<BUS, CS>
where
    BUS: spi::Error,
    CS: Debug,
{
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Bus(e) => e.kind(),
            Self::ChipSelect(_) => ErrorKind::ChipSelectFault,
        }
    }
}

impl<BUS, CS> FramedBus<BUS, CS>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    /// Take ownership of the bus and the chip-select pin.
    ///
    /// The pin is driven high (deselected) before returning.
    pub fn new(bus: BUS, mut cs: CS) -> Result<Self, CS::Error> {
        cs.set_high()?;
        Ok(Self { bus, cs })
    }

    /// Release the bus and the chip-select pin
    pub fn destroy(self) -> (BUS, CS) {
        (self.bus, self.cs)
    }

    fn run(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), BUS::Error> {
        for op in operations {
            match op {
                Operation::Read(buf) => self.bus.read(buf)?,
                Operation::Write(buf) => self.bus.write(buf)?,
                Operation::Transfer(read, write) => self.bus.transfer(read, write)?,
                Operation::TransferInPlace(buf) => self.bus.transfer_in_place(buf)?,
                Operation::DelayNs(_) => self.bus.flush()?,
            }
        }
        self.bus.flush()
    }
}

impl<BUS, CS> ErrorType for FramedBus<BUS, CS>
where
    BUS: ErrorType,
    CS: OutputPin,
{
    type Error = FramedBusError<BUS::Error, CS::Error>;
}

impl<BUS, CS> SpiDevice for FramedBus<BUS, CS>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.cs.set_low().map_err(FramedBusError::ChipSelect)?;
        let result = self.run(operations);
        // Release before reporting, whatever happened on the bus.
        let released = self.cs.set_high();
        result.map_err(FramedBusError::Bus)?;
        released.map_err(FramedBusError::ChipSelect)
    }
}
