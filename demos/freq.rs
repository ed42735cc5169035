#![deny(unsafe_code)]
#![no_main]
#![no_std]

extern crate panic_halt; // panic handler

use cortex_m;
use cortex_m_rt::entry;
use stm32f4xx_hal as hal;

use cortex_m_semihosting::hprintln;

use crate::hal::{
    prelude::*,
    stm32,
    spi::Spi,
};

use embedded_hal::spi::MODE_0;

use lmx2592::{ config::*, device::*, errors::*, register::*, session::* };

/// ~1 ms at 168 MHz
const POLL_CYCLES: u32 = 168_000;

/// Lock poll budget, in polls
const LOCK_POLLS: u32 = 100;


/// Caller side lock wait: bounded retries of the single-shot status read
fn wait_for_lock<T: Transport>(sg: &mut Session<T>) -> Result<(), Error> {
    for _ in 0..LOCK_POLLS {
        match sg.poll_lock() {
            Ok(()) => return Ok(()),
            Err(nb::Error::WouldBlock) => cortex_m::asm::delay(POLL_CYCLES),
            Err(nb::Error::Other(e)) => return Err(e),
        }
    }
    Err(Error::LockTimeout)
}


#[entry]
fn main() -> ! {
    let dp = stm32::Peripherals::take().unwrap();
    let cp = cortex_m::peripheral::Peripherals::take().unwrap();

    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.use_hse(8.mhz()).sysclk(168.mhz()).pclk1(42.mhz()).pclk2(84.mhz()).freeze();

    let gpioa = dp.GPIOA.split();
    let mut led1 = gpioa.pa6.into_push_pull_output();

    let delay = hal::delay::Delay::new(cp.SYST, clocks);

    let gpiob = dp.GPIOB.split();
    let pin_ce = gpiob.pb10.into_push_pull_output();
    let pin_cs = gpiob.pb12.into_push_pull_output();

    let sck = gpiob.pb13.into_alternate_af5();
    let miso = gpiob.pb14.into_alternate_af5();
    let mosi = gpiob.pb15.into_alternate_af5();

    let spi = Spi::spi2(
        dp.SPI2,
        (sck, miso, mosi),
        MODE_0,
        stm32f4xx_hal::time::KiloHertz(500).into(),
        clocks,
    );

    let mut dev = Lmx2592::new(spi, pin_ce, pin_cs, delay);
    dev.enable().unwrap();
    cortex_m::asm::delay(10 * POLL_CYCLES);

    let mut sg = Session::new(dev);
    sg.start().unwrap();

    let f = 2_450_000_000;
    let p = sg.set_frequency(f).unwrap();
    hprintln!("{:?}", p).unwrap();

    sg.enable_output(Output::B, true).unwrap();
    sg.set_output_power(40).unwrap();

    match wait_for_lock(&mut sg) {
        Ok(()) => hprintln!("locked, f_out {:?}", sg.f_out_hz()).unwrap(),
        Err(e) => hprintln!("{:?}", e).unwrap(),
    }
    hprintln!("{:?}", sg.readback()).unwrap();

    let bank = sg.dump().unwrap();
    for &(address, _) in ACTIVE_REGISTERS.iter() {
        let w = bank.get(address);
        hprintln!("R{} {:#04x}{:04x} {:#018b}", address, address, w, w).unwrap();
    }

    loop {
        led1.set_high().unwrap();
        cortex_m::asm::delay(1000 * POLL_CYCLES);
        led1.set_low().unwrap();
        cortex_m::asm::delay(1000 * POLL_CYCLES);
    }
}
