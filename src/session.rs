//! Synthesizer session
//!
//! Owns the transport together with the logical configuration and walks
//! the chip through `Uninitialized -> Configured -> Calibrating ->
//! Locked | Unlocked`. Every change re-serializes the whole register bank
//! and commits the dirty registers from the highest address down to R0.

use log::{debug, info, warn};

use crate::{
    config::*, constants::*, device::*, errors::*, frequency::*, register::*,
};


/// Session state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Configured,
    Calibrating,
    Locked,
    Unlocked,
}


/// Lock detect as derived from the VCO tuning voltage (rb_LD_VTUNE)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LockDetect {
    /// Unlocked, tuning voltage low
    VtuneLow,
    Invalid,
    Locked,
    /// Unlocked, tuning voltage high
    VtuneHigh,
}

impl From<u16> for LockDetect {
    fn from(x: u16) -> Self {
        match x & 0b11 {
            0 => LockDetect::VtuneLow,
            1 => LockDetect::Invalid,
            2 => LockDetect::Locked,
            _ => LockDetect::VtuneHigh,
        }
    }
}

impl LockDetect {
    #[inline]
    pub fn is_locked(self) -> bool {
        self == LockDetect::Locked
    }
}


/// Calibration results read back from R68..R70
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Readback {
    /// VCO core selected by the last calibration
    pub vco_sel: u8,
    pub lock_detect: LockDetect,
    pub vco_capctrl: u8,
    pub vco_daciset: u16,
}

impl Readback {
    /// Decodes the readback registers, `words` holds R68, R69, R70
    pub fn decode(words: [u16; 3]) -> Self {
        let mut bank = RegisterBank::default();
        for (i, w) in words.iter().enumerate() {
            bank.set(REG_READBACK + i as u8, *w);
        }
        Readback {
            vco_sel: bank.field(Field::RbVcoSel) as u8,
            lock_detect: bank.field(Field::RbLdVtune).into(),
            vco_capctrl: bank.field(Field::RbVcoCapctrl) as u8,
            vco_daciset: bank.field(Field::RbVcoDaciset),
        }
    }
}


/// One synthesizer chip and its configuration
pub struct Session<T> {
    transport: T,
    config: LogicalConfig,
    state: State,
}

impl<T> Session<T>
where T: Transport,
{
    /// Wraps a transport, nothing is written until [`Session::start`].
    /// Until then every other operation except [`Session::soft_reset`]
    /// fails with [`Error::NotStarted`].
    pub fn new(transport: T) -> Self {
        Session {
            transport,
            config: LogicalConfig::default(),
            state: State::Uninitialized,
        }
    }

    /// Releases the transport
    pub fn free(self: Self) -> T {
        self.transport
    }

    pub fn state(self: &Self) -> State {
        self.state
    }

    pub fn config(self: &Self) -> &LogicalConfig {
        &self.config
    }

    /// Loads the power-on defaults, soft resets the chip and writes the
    /// full register set.
    pub fn start(self: &mut Self) -> Result<(), Error> {
        info!("lmx2592: start");
        self.config = LogicalConfig::default();
        self.soft_reset()?;
        self.config = self.config.set(Field::MuxoutHdrv, true);
        self.commit_all()?;
        self.state = State::Configured;
        Ok(())
    }

    /// Pulses RESET through R0
    pub fn soft_reset(self: &mut Self) -> Result<(), Error> {
        self.config = self.config
            .set(Field::Reset, true)
            .set(Field::FcalEn, false);
        self.commit_one(REG_CONTROL)?;
        self.config = self.config.set(Field::Reset, false);
        self.commit_one(REG_CONTROL)
    }

    /// Retunes to `f_hz` and starts a calibration.
    /// Out of range requests leave the configuration untouched.
    pub fn set_frequency(self: &mut Self, f_hz: u64) -> Result<FrequencyPlan, Error> {
        self.ensure_started()?;
        let p = plan(f_hz).map_err(|e| {
            warn!("lmx2592: {} Hz rejected: {:?}", f_hz, e);
            e
        })?;
        info!(
            "lmx2592: {} Hz, vco {} Hz, N {} + {}/{}, mash {:?}",
            f_hz, p.vco_hz, p.divider.n, p.divider.num, p.divider.den, p.mash_order
        );
        self.config = p.apply(self.config);
        self.commit_all()?;
        self.calibrate()?;
        Ok(p)
    }

    /// Frequency the current configuration produces, Hz
    pub fn f_out_hz(self: &Self) -> Option<u64> {
        f_out_hz(REF_HZ, &self.config)
    }

    /// Same output power code on both outputs, see [`OutputPower::from_code`]
    pub fn set_output_power(self: &mut Self, code: u8) -> Result<(), Error> {
        self.ensure_started()?;
        let p = OutputPower::from_code(code).map_err(|e| {
            warn!("lmx2592: power code {} rejected", code);
            e
        })?;
        self.config = self.config.with_output_power(p);
        self.commit_one(REG_OUTPUT_B)?;
        self.commit_one(REG_OUTPUT)
    }

    /// Powers one output up or down, only R46 is written
    pub fn enable_output(self: &mut Self, out: Output, enabled: bool) -> Result<(), Error> {
        self.ensure_started()?;
        self.config = self.config.with_output_enabled(out, enabled);
        self.commit_one(REG_OUTPUT)
    }

    /// Fires a VCO calibration. There is no acknowledgement, follow up
    /// with [`Session::poll_lock`].
    pub fn calibrate(self: &mut Self) -> Result<(), Error> {
        self.ensure_started()?;
        self.config = self.config.set(Field::FcalEn, true);
        self.commit_one(REG_CONTROL)?;
        self.state = State::Calibrating;
        Ok(())
    }

    /// Reads lock detect once.
    ///
    /// Switches MUXout to readback mode (and clears FCAL_EN so that the
    /// R0 write does not restart calibration) before reading R68.
    pub fn lock_detect(self: &mut Self) -> Result<LockDetect, Error> {
        self.ensure_started()?;
        self.readback_mode()?;
        let w = self.transport.read_register(REG_READBACK)?;
        let ld: LockDetect = Field::RbLdVtune.layout().extract(w).into();
        self.state = if ld.is_locked() { State::Locked } else { State::Unlocked };
        Ok(ld)
    }

    /// Non-blocking lock check.
    ///
    /// `WouldBlock` while the PLL is not locked. The retry loop and its
    /// time budget belong to the caller, who reports [`Error::LockTimeout`]
    /// when it gives up.
    pub fn poll_lock(self: &mut Self) -> nb::Result<(), Error> {
        match self.lock_detect() {
            Ok(LockDetect::Locked) => Ok(()),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    /// Reads the calibration results
    pub fn readback(self: &mut Self) -> Result<Readback, Error> {
        self.ensure_started()?;
        self.readback_mode()?;
        let mut words = [0u16; 3];
        for (i, w) in words.iter_mut().enumerate() {
            *w = self.transport.read_register(REG_READBACK + i as u8)?;
        }
        let rb = Readback::decode(words);
        self.state = if rb.lock_detect.is_locked() { State::Locked } else { State::Unlocked };
        Ok(rb)
    }

    /// Reads every active register back from the chip
    pub fn dump(self: &mut Self) -> Result<RegisterBank, Error> {
        self.ensure_started()?;
        self.readback_mode()?;
        let mut bank = RegisterBank::default();
        for &(address, _) in ACTIVE_REGISTERS.iter() {
            bank.set(address, self.transport.read_register(address)?);
        }
        Ok(bank)
    }

    /// Everything but `start` and `soft_reset` needs the chip reset and
    /// fully written first.
    fn ensure_started(self: &Self) -> Result<(), Error> {
        if self.state == State::Uninitialized {
            warn!("lmx2592: not started");
            return Err(Error::NotStarted);
        }
        Ok(())
    }

    fn readback_mode(self: &mut Self) -> Result<(), Error> {
        self.config = self.config
            .set(Field::MuxoutSel, false)
            .set(Field::FcalEn, false);
        self.commit_one(REG_CONTROL)
    }

    /// Writes all dirty registers, highest address first
    fn commit_all(self: &mut Self) -> Result<(), Error> {
        let (bank, dirty) = self.config.serialize();
        debug!("lmx2592: commit {} registers", dirty.len());
        for address in dirty.iter_descending() {
            self.write(address, bank.get(address))?;
        }
        Ok(())
    }

    /// Re-serializes and writes a single register
    fn commit_one(self: &mut Self, address: u8) -> Result<(), Error> {
        let (bank, dirty) = self.config.serialize();
        if !dirty.contains(address) {
            return Ok(());
        }
        self.write(address, bank.get(address))
    }

    #[inline]
    fn write(self: &mut Self, address: u8, w: u16) -> Result<(), Error> {
        debug!("lmx2592: R{} <- {:#06x}", address, w);
        self.transport.write_register(address, w)
    }
}
