///! Input reference config
///! OSCin / Doubler / Pre-R divider / Multiplier / R divider

use crate::{constants::*, register::*};


/// Input reference path up to the phase detector
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ReferencePath {
    /// OSCin frequency, Hz
    pub ref_hz: u64,
    /// True if the OSCin doubler is enabled
    pub osc_2x: bool,
    /// Pre-R divider value (PLL_R_PRE)
    pub pll_r_pre: u16,
    /// Multiplier (MULT)
    pub mult: u16,
    /// Post-R divider value (PLL_R)
    pub pll_r: u16,
}

impl ReferencePath {

    /// 48 MHz OSCin, ×5, ÷2: 120 MHz at the phase detector
    pub const FIXED: ReferencePath = ReferencePath {
        ref_hz: REF_HZ,
        osc_2x: false,
        pll_r_pre: 1,
        mult: REF_MULT,
        pll_r: REF_POST_R,
    };

    /// Phase Frequency Detector' frequency
    /// f PFD = OSCin × (1 + OSC_2X) / PLL_R_PRE × MULT / PLL_R
    pub fn f_pfd(self: &Self) -> u64 {
        self.ref_hz
            * (1 + self.osc_2x as u64)
            / (self.pll_r_pre.max(1) as u64)
            * (self.mult.max(1) as u64)
            / (self.pll_r.max(1) as u64)
    }

    /// Reference path as currently held in a configuration
    pub fn from_config(ref_hz: u64, cfg: &LogicalConfig) -> Self {
        ReferencePath {
            ref_hz,
            osc_2x: cfg.field(Field::Osc2x) != 0,
            pll_r_pre: cfg.field(Field::PllRPre),
            mult: cfg.field(Field::Mult),
            pll_r: cfg.field(Field::PllR),
        }
    }

    /// Writes the reference path fields, including the FCAL PFD range
    /// adjustment matching the resulting PFD frequency.
    pub fn apply(self: &Self, cfg: LogicalConfig) -> LogicalConfig {
        let f = self.f_pfd();
        let hpfd_adj: u16 =
            if f > 200_000_000 { 3 }
            else if f > 150_000_000 { 2 }
            else if f > 100_000_000 { 1 }
            else { 0 };

        cfg.set(Field::Osc2x, self.osc_2x)
           .set(Field::PllRPre, self.pll_r_pre)
           .set(Field::Mult, self.mult)
           .set(Field::PllR, self.pll_r)
           .set(Field::FcalHpfdAdj, hpfd_adj)
    }
}
