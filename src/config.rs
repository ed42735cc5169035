///! Device configuration: power-on defaults and typed field values

use crate::{constants::*, errors::*, register::*};


/// Chip-recommended power-on values.
///
/// FCAL_EN is left at 0 so that loading the defaults never starts a
/// calibration by itself; the session triggers one explicitly.
impl Default for LogicalConfig {
    fn default() -> Self {
        LogicalConfig::zeroed()
            // R0
            .set(Field::Powerdown, 0u16)
            .set(Field::Reset, 0u16)
            .set(Field::MuxoutSel, 1u16)
            .set(Field::FcalEn, 0u16)
            .set(Field::AcalEn, 1u16)
            .set(Field::FcalLpfdAdj, 0u16)
            .set(Field::FcalHpfdAdj, 0u16)
            .set(Field::LdEn, 1u16)
            // R1
            .set(Field::CalClkDiv, 3u16)
            // R4
            .set(Field::AcalCmpDly, 25u16)
            // R8
            .set(Field::VcoCapctrlOvr, 0u16)
            .set(Field::VcoIdacOvr, 0u16)
            // R9
            .set(Field::RefEn, 1u16)
            .set(Field::Osc2x, 0u16)
            // R10..R12
            .set(Field::Mult, 1u16)
            .set(Field::PllR, 1u16)
            .set(Field::PllRPre, 1u16)
            // R13
            .set(Field::PfdCtl, 0u16)
            .set(Field::CpEn, 1u16)
            // R14
            .set(Field::CpIcoarse, 1u16)
            .set(Field::CpIup, 3u16)
            .set(Field::CpIdn, 3u16)
            // R19, R20, R22
            .set(Field::VcoIdac, 300u16)
            .set(Field::AcalVcoIdacStrt, 300u16)
            .set(Field::VcoCapctrl, 0u16)
            // R23
            .set(Field::VcoSelForce, 0u16)
            .set(Field::VcoSel, 1u16)
            .set(Field::FcalVcoSelStrt, 0u16)
            // R30
            .set(Field::Vco2xEn, 0u16)
            .set(Field::VtuneAdj, 0u16)
            .set(Field::MashDither, 0u16)
            // R31
            .set(Field::ChdivDistPd, 0u16)
            .set(Field::VcoDistaPd, 0u16)
            .set(Field::VcoDistbPd, 1u16)
            // R34..R36
            .set(Field::ChdivEn, 1u16)
            .set(Field::ChdivSeg1En, 0u16)
            .set(Field::ChdivSeg1, 1u16)
            .set(Field::ChdivSeg2En, 0u16)
            .set(Field::ChdivSeg3En, 0u16)
            .set(Field::ChdivSeg2, 1u16)
            .set(Field::ChdivSeg3, 1u16)
            .set(Field::ChdivSegSel, 1u16)
            .set(Field::ChdivDistaEn, 1u16)
            .set(Field::ChdivDistbEn, 0u16)
            // R37..R39
            .set(Field::PllNPre, NPrescaler::Div2)
            .set(Field::PllN, 27u16)
            .set(Field::PfdDly, 2u16)
            // R40..R45
            .set(Field::PllDenHi, 1000u16)
            .set(Field::PllDenLo, 1000u16)
            .set(Field::MashSeedHi, 0u16)
            .set(Field::MashSeedLo, 0u16)
            .set(Field::PllNumHi, 0u16)
            .set(Field::PllNumLo, 0u16)
            // R46..R48
            .set(Field::MashOrder, MashOrder::Third)
            .set(Field::OutaPd, 0u16)
            .set(Field::OutbPd, 1u16)
            .set(Field::OutaPow, 15u16)
            .set(Field::OutbPow, 0u16)
            .set(Field::OutaMux, OutputMux::ChannelDivider)
            .set(Field::OutbMux, OutputMux::ChannelDivider)
            // R59, R61
            .set(Field::MuxoutHdrv, 0u16)
            .set(Field::LdType, 1u16)
            // R64
            .set(Field::FjumpSize, 15u16)
            .set(Field::AjumpSize, 3u16)
            .set(Field::FcalFast, 0u16)
            .set(Field::AcalFast, 0u16)
    }
}


/// Order of the fractional Σ-Δ modulator (MASH).
/// Higher orders push more quantization noise out of band but
/// become unstable for small N.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MashOrder {
    /// Integer mode, never picked by the planner
    Integer,
    First,
    Second,
    Third,
}

impl From<MashOrder> for u16 {
    #[inline]
    fn from(m: MashOrder) -> u16 { m as u16 }
}


/// Feedback divider prescaler (PLL_N_PRE)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NPrescaler {
    Div2,
    /// Required with the VCO doubler
    Div4,
}

impl NPrescaler {
    #[inline]
    pub fn ratio(self) -> u64 {
        match self {
            NPrescaler::Div2 => 2,
            NPrescaler::Div4 => 4,
        }
    }
}

impl From<NPrescaler> for u16 {
    #[inline]
    fn from(p: NPrescaler) -> u16 { p as u16 }
}


/// RF output mux (OUTA_MUX / OUTB_MUX)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputMux {
    ChannelDivider,
    Vco,
}

impl From<OutputMux> for u16 {
    #[inline]
    fn from(m: OutputMux) -> u16 { m as u16 }
}


/// RF output port
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Output {
    /// RFoutA
    A,
    /// RFoutB
    B,
}

impl Output {
    /// Power-down bit of this output, lives in R46 for both ports
    #[inline]
    pub fn power_down_field(self) -> Field {
        match self {
            Output::A => Field::OutaPd,
            Output::B => Field::OutbPd,
        }
    }
}


/// Output power as written to OUTx_POW.
///
/// User codes 0..=31 go through unchanged, 32..=47 skip the chip's
/// unusable 32..=47 range and land on 48..=63.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OutputPower(u8);

impl OutputPower {
    pub fn from_code(code: u8) -> Result<Self, Error> {
        match code {
            0..=31 => Ok(OutputPower(code)),
            32..=OUT_POW_CODE_MAX => Ok(OutputPower(48 + (code - 32))),
            _ => Err(Error::InvalidPower),
        }
    }

    /// Physical OUTx_POW value
    #[inline]
    pub fn raw(self) -> u8 {
        self.0
    }
}

impl From<OutputPower> for u16 {
    #[inline]
    fn from(p: OutputPower) -> u16 { p.0 as u16 }
}


impl LogicalConfig {
    /// Same output power on both ports
    pub fn with_output_power(self: Self, p: OutputPower) -> Self {
        self.set(Field::OutaPow, p)
            .set(Field::OutbPow, p)
    }

    /// Powers an output up or down
    pub fn with_output_enabled(self: Self, out: Output, enabled: bool) -> Self {
        self.set(out.power_down_field(), !enabled)
    }
}
