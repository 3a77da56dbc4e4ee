//! Chip-select sequencing of `FramedBus`, with a bus and pin that log into
//! one shared timeline and can be made to fail.
use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, ErrorKind, ErrorType, SpiBus};
use mcp48xx::{Channel, Error, FramedBus, FramedBusError, Mcp48xx};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    CsLow,
    CsHigh,
    Write(Vec<u8>),
    Flush,
}

type Timeline = Rc<RefCell<Vec<Event>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BusFault;

impl spi::Error for BusFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Overrun
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

struct Bus {
    log: Timeline,
    fail_writes: Rc<RefCell<bool>>,
}

impl ErrorType for Bus {
    type Error = BusFault;
}

impl SpiBus for Bus {
    fn read(&mut self, _words: &mut [u8]) -> Result<(), BusFault> {
        unimplemented!()
    }
    fn write(&mut self, words: &[u8]) -> Result<(), BusFault> {
        self.log.borrow_mut().push(Event::Write(words.to_vec()));
        if *self.fail_writes.borrow() {
            Err(BusFault)
        } else {
            Ok(())
        }
    }
    fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), BusFault> {
        unimplemented!()
    }
    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), BusFault> {
        unimplemented!()
    }
    fn flush(&mut self) -> Result<(), BusFault> {
        self.log.borrow_mut().push(Event::Flush);
        Ok(())
    }
}

struct Pin {
    log: Timeline,
    fail_low: Rc<RefCell<bool>>,
}

impl digital::ErrorType for Pin {
    type Error = PinFault;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        if *self.fail_low.borrow() {
            return Err(PinFault);
        }
        self.log.borrow_mut().push(Event::CsLow);
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), PinFault> {
        self.log.borrow_mut().push(Event::CsHigh);
        Ok(())
    }
}

struct Rig {
    log: Timeline,
    fail_writes: Rc<RefCell<bool>>,
    fail_low: Rc<RefCell<bool>>,
}

impl Rig {
    fn new() -> (Self, FramedBus<Bus, Pin>) {
        let rig = Rig {
            log: Timeline::default(),
            fail_writes: Rc::default(),
            fail_low: Rc::default(),
        };
        let bus = Bus {
            log: rig.log.clone(),
            fail_writes: rig.fail_writes.clone(),
        };
        let pin = Pin {
            log: rig.log.clone(),
            fail_low: rig.fail_low.clone(),
        };
        let framed = FramedBus::new(bus, pin).unwrap();
        (rig, framed)
    }

    fn take(&self) -> Vec<Event> {
        self.log.borrow_mut().drain(..).collect()
    }
}

#[test]
fn chip_select_released_on_construction() {
    let (rig, _framed) = Rig::new();
    assert_eq!(rig.take(), vec![Event::CsHigh]);
}

#[test]
fn frame_is_bracketed_by_chip_select() {
    let (rig, framed) = Rig::new();
    let mut dac = Mcp48xx::new_mcp4822(framed);
    rig.take();

    dac.set_value_a(4095).unwrap();
    assert_eq!(
        rig.take(),
        vec![
            Event::CsLow,
            Event::Write(vec![0x1F, 0xFF]),
            Event::Flush,
            Event::CsHigh,
        ]
    );
}

#[test]
fn update_dac_sends_a_then_b() {
    let (rig, framed) = Rig::new();
    let mut dac = Mcp48xx::new_mcp4812(framed);
    dac.set_gain_b();
    rig.take();

    dac.update_dac().unwrap();
    assert_eq!(
        rig.take(),
        vec![
            Event::CsLow,
            Event::Write(vec![0x00, 0x00]),
            Event::Flush,
            Event::CsHigh,
            Event::CsLow,
            Event::Write(vec![0xA0, 0x00]),
            Event::Flush,
            Event::CsHigh,
        ]
    );
}

#[test]
fn chip_select_released_when_write_fails() {
    let (rig, framed) = Rig::new();
    let mut dac = Mcp48xx::new_mcp4822(framed);
    rig.take();

    *rig.fail_writes.borrow_mut() = true;
    assert_eq!(
        dac.set_value_b(0x800),
        Err(Error::Spi(FramedBusError::Bus(BusFault)))
    );
    let events = rig.take();
    assert_eq!(
        events,
        vec![Event::CsLow, Event::Write(vec![0x98, 0x00]), Event::CsHigh]
    );
    assert_eq!(dac.last_frame(Channel::DacB), None);

    // The bus is usable again afterwards
    *rig.fail_writes.borrow_mut() = false;
    dac.update(Channel::DacB).unwrap();
    assert_eq!(
        rig.take(),
        vec![
            Event::CsLow,
            Event::Write(vec![0x98, 0x00]),
            Event::Flush,
            Event::CsHigh,
        ]
    );
    assert_eq!(dac.last_frame(Channel::DacB).map(u16::from), Some(0x9800));
}

#[test]
fn bus_untouched_when_chip_select_fails() {
    let (rig, framed) = Rig::new();
    let mut dac = Mcp48xx::new_mcp4802(framed);
    rig.take();

    *rig.fail_low.borrow_mut() = true;
    let err = dac.set_value_a(1).unwrap_err();
    assert_eq!(err, Error::Spi(FramedBusError::ChipSelect(PinFault)));
    if let Error::Spi(e) = err {
        assert_eq!(spi::Error::kind(&e), ErrorKind::ChipSelectFault);
    }
    assert!(rig.take().is_empty());
}

#[test]
fn destroy_returns_parts() {
    let (rig, framed) = Rig::new();
    let dac = Mcp48xx::new_mcp4822(framed);
    let (_bus, mut pin) = dac.destroy().destroy();
    rig.take();
    pin.set_low().unwrap();
    assert_eq!(rig.take(), vec![Event::CsLow]);
}
