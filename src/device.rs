///! Device pins and SPI framing

use embedded_hal:: {
    digital::v2::OutputPin,
    blocking::{ delay::*, spi::*, },
};

use crate::errors::*;


/// Register level access to the chip
pub trait Transport {
    /// Writes one 16 bit register.
    fn write_register(self: &mut Self, address: u8, value: u16) -> Result<(), Error>;

    /// Reads one 16 bit register back.
    fn read_register(self: &mut Self, address: u8) -> Result<u16, Error>;
}


/// Read / write flag in the address byte
const READ_BIT: u8 = 1 << 7;

/// Frame for one register access: R/W flag + 7 bit address, then the value MSB first
#[inline]
pub fn frame(address: u8, value: u16, read: bool) -> [u8; 3] {
    let rw = if read { READ_BIT } else { 0 };
    [
        (address & 0x7F) | rw,
        (value >> 8) as u8,
        (value & 0xFF) as u8,
    ]
}


/// LMX2592 device
pub struct Lmx2592<CE, CS, SPI, D> {
    spi: SPI,
    pin_ce: CE,
    pin_cs: CS,
    delay: D,
}


impl<CE, CS, SPI, D> Lmx2592<CE, CS, SPI, D>
where CE: OutputPin,
      CS: OutputPin,
      SPI: Write<u8> + Transfer<u8>,
      D: DelayUs<u16>,
{
    /// Creates the device (unconfigured, no output).
    ///
    /// `spi` - SPI device (`MOSI` => `SDI`, `MISO` => `MUXout`, `CLK` => `SCK`, mode 0)
    /// `pin_ce` - "chip enable" pin
    /// `pin_cs` - active low chip select
    /// `delay` - settling delays around chip select edges
    ///
    pub fn new(
        spi: SPI,
        pin_ce: CE,
        pin_cs: CS,
        delay: D,
    ) -> Self {
        Lmx2592 { spi, pin_ce, pin_cs, delay, }
    }

    /// Releases the bus, pins and delay
    pub fn free(self: Self) -> (SPI, CE, CS, D) {
        (self.spi, self.pin_ce, self.pin_cs, self.delay)
    }

    /// Powers up the device.
    /// Releases CS first so the first frame starts on a clean edge.
    #[inline(always)]
    pub fn enable(self: &mut Self) -> Result<(), Error> {
        self.pin_cs.set_high().map_err(|_| Error::Pin)?;
        self.pin_ce.set_high().map_err(|_| Error::Pin)
    }

    /// Powers down the device, register contents are lost.
    #[inline(always)]
    pub fn disable(self: &mut Self) -> Result<(), Error> {
        self.pin_ce.set_low().map_err(|_| Error::Pin)
    }

    #[inline(always)]
    fn select(self: &mut Self) -> Result<(), Error> {
        self.delay.delay_us(10);
        self.pin_cs.set_low().map_err(|_| Error::Pin)?;
        self.delay.delay_us(10);
        Ok(())
    }

    #[inline(always)]
    fn deselect(self: &mut Self) -> Result<(), Error> {
        self.delay.delay_us(10);
        self.pin_cs.set_high().map_err(|_| Error::Pin)?;
        self.delay.delay_us(10);
        Ok(())
    }
}


impl<CE, CS, SPI, D> Transport for Lmx2592<CE, CS, SPI, D>
where CE: OutputPin,
      CS: OutputPin,
      SPI: Write<u8> + Transfer<u8>,
      D: DelayUs<u16>,
{
    /// Data is clocked in MSB first and latched into the addressed
    /// register when CS goes high.
    ///
    /// Blocking implementation.
    fn write_register(self: &mut Self, address: u8, value: u16) -> Result<(), Error> {
        let data = frame(address, value, false);
        self.select()?;
        let res = self.spi.write(&data).map_err(|_| Error::Spi);
        // release CS even when the bus failed
        self.deselect()?;
        res
    }

    /// The chip shifts the register out on MUXout while the last two
    /// bytes are clocked, MSB first. MUXout must be in readback mode.
    fn read_register(self: &mut Self, address: u8) -> Result<u16, Error> {
        let mut data = frame(address, 0, true);
        self.select()?;
        let res = match self.spi.transfer(&mut data) {
            Ok([_, hi, lo, ..]) => Ok(u16::from_be_bytes([*hi, *lo])),
            // bus error or a short reply
            _ => Err(Error::Spi),
        };
        self.deselect()?;
        res
    }
}
