//! Frequency calculations

use core::convert::TryFrom;

use crate::{config::*, constants::*, errors::*, refin::*, register::*};


/// Channel divider tap selection (CHDIV_SEG1 / SEG2 / SEG3 / SEG_SEL codes)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChannelDivider {
    /// 0 = ÷2, 1 = ÷3
    pub seg1: u8,
    /// 0 = bypass, 1 = ÷2, 2 = ÷4, 4 = ÷6, 8 = ÷8
    pub seg2: u8,
    /// 0 = bypass, 1 = ÷2, 2 = ÷4, 4 = ÷6, 8 = ÷8
    pub seg3: u8,
    /// Output tap: 1 = after segment 1, 2 = after segment 2, 4 = after segment 3
    pub mux: u8,
}

impl ChannelDivider {

    /// Division ratio of the selected tap, None for codes the chip
    /// does not define.
    pub fn total_division(self: &Self) -> Option<u32> {
        let s1 = match self.seg1 {
            0 => 2,
            1 => 3,
            _ => return None,
        };
        let s2 = segment_ratio(self.seg2)?;
        let s3 = segment_ratio(self.seg3)?;
        match self.mux {
            1 => Some(s1),
            2 => Some(s1 * s2),
            4 => Some(s1 * s2 * s3),
            _ => None,
        }
    }

    /// Taps as currently held in a configuration
    pub fn from_config(cfg: &LogicalConfig) -> Self {
        ChannelDivider {
            seg1: cfg.field(Field::ChdivSeg1) as u8,
            seg2: cfg.field(Field::ChdivSeg2) as u8,
            seg3: cfg.field(Field::ChdivSeg3) as u8,
            mux: cfg.field(Field::ChdivSegSel) as u8,
        }
    }
}

#[inline]
fn segment_ratio(code: u8) -> Option<u32> {
    match code {
        0 => Some(1),
        1 => Some(2),
        2 => Some(4),
        4 => Some(6),
        8 => Some(8),
        _ => None,
    }
}


/// Output frequency band served by one channel divider setting
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChannelDividerRow {
    /// Lowest output frequency, MHz, inclusive
    pub min_mhz: u16,
    /// Highest output frequency, MHz, inclusive
    pub max_mhz: u16,
    pub taps: ChannelDivider,
    /// VCO / output ratio
    pub total: u16,
}

impl ChannelDividerRow {
    #[inline]
    pub fn contains(self: &Self, f_hz: u64) -> bool {
        (self.min_mhz as u64 * 1_000_000 ..= self.max_mhz as u64 * 1_000_000).contains(&f_hz)
    }
}

const fn row(min_mhz: u16, max_mhz: u16, seg1: u8, seg2: u8, seg3: u8, mux: u8, total: u16) -> ChannelDividerRow {
    ChannelDividerRow { min_mhz, max_mhz, taps: ChannelDivider { seg1, seg2, seg3, mux }, total }
}

/// Channel divider settings, lowest division first.
///
/// Band edges deviate from the datasheet's table on purpose (they were
/// tuned on hardware); keep them as they are.
pub const CHANNEL_DIVIDER_TABLE: [ChannelDividerRow; 15] = [
    row(1775, 3550, 0, 0, 0, 1, 2),   // ÷2
    row(1184, 2200, 1, 0, 0, 1, 3),   // ÷3
    row(888,  1184, 0, 1, 0, 2, 4),   // ÷2 ÷2
    row(592,  888,  1, 1, 0, 2, 6),   // ÷3 ÷2
    row(444,  592,  0, 2, 0, 2, 8),   // ÷2 ÷4
    row(296,  444,  0, 4, 0, 2, 12),  // ÷2 ÷6
    row(222,  296,  0, 8, 0, 2, 16),  // ÷2 ÷8
    row(148,  222,  1, 8, 0, 2, 24),  // ÷3 ÷8
    row(111,  148,  0, 8, 1, 4, 32),  // ÷2 ÷8 ÷2
    row(99,   111,  1, 4, 1, 4, 36),  // ÷3 ÷6 ÷2
    row(74,   99,   1, 8, 1, 4, 48),  // ÷3 ÷8 ÷2
    row(56,   74,   0, 8, 2, 4, 64),  // ÷2 ÷8 ÷4
    row(37,   56,   0, 8, 4, 4, 96),  // ÷2 ÷8 ÷6
    row(28,   37,   0, 8, 8, 4, 128), // ÷2 ÷8 ÷8
    row(20,   28,   1, 8, 8, 4, 192), // ÷3 ÷8 ÷8
];

/// First table row covering `f_hz`
pub fn channel_divider_for(f_hz: u64) -> Option<&'static ChannelDividerRow> {
    CHANNEL_DIVIDER_TABLE.iter().find(|r| r.contains(f_hz))
}


/// How the output is derived from the VCO
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputPath {
    /// VCO divided down by the channel divider
    ChannelDivider(ChannelDividerRow),
    /// VCO fundamental
    Vco,
    /// VCO doubled, N prescaler ÷4
    Doubler,
}

impl OutputPath {
    #[inline]
    pub fn prescaler(self: &Self) -> NPrescaler {
        match self {
            OutputPath::Doubler => NPrescaler::Div4,
            _ => NPrescaler::Div2,
        }
    }
}


/// Rational feedback divider N + NUM / DEN
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Divider {
    pub n: u16,
    pub num: u32,
    pub den: u32,
}

impl Divider {

    /// Splits `f_hz / step_hz` into an integer part and a 32 bit
    /// numerator over the full-range denominator, rounding the numerator
    /// to nearest.
    pub fn from_ratio(f_hz: u64, step_hz: u64) -> Result<Self, Error> {
        let n = f_hz / step_hz;
        if n > Field::PllN.layout().mask() as u64 {
            return Err(Error::OutOfRange);
        }
        let rem = f_hz % step_hz;
        let den = PLL_DEN as u64;
        // rem < step_hz keeps this strictly below den
        let num = (rem * den + step_hz / 2) / step_hz;
        Ok(Divider { n: n as u16, num: num as u32, den: PLL_DEN })
    }

    /// N + NUM / DEN
    pub fn value(self: &Self) -> f64 {
        self.n as f64 + (self.num as f64) / (self.den as f64)
    }

    /// Modulator order that stays stable at this N
    pub fn mash_order(self: &Self) -> MashOrder {
        if self.n < 16 {
            MashOrder::First
        } else if self.n < 18 {
            MashOrder::Second
        } else {
            MashOrder::Third
        }
    }

    /// PFD delay paired with [`Divider::mash_order`]
    pub fn pfd_delay(self: &Self) -> u8 {
        if self.n < 16 { 1 } else { 2 }
    }
}


/// Everything needed to put the chip on one output frequency
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrequencyPlan {
    /// Requested output frequency, Hz
    pub target_hz: u64,
    pub path: OutputPath,
    /// VCO fundamental frequency, Hz
    pub vco_hz: u64,
    pub divider: Divider,
    pub mash_order: MashOrder,
    pub pfd_delay: u8,
}

/// Plans the synthesizer for `target_hz`.
///
/// Pure: nothing is written anywhere, fold the result into a
/// configuration with [`FrequencyPlan::apply`].
pub fn plan(target_hz: u64) -> Result<FrequencyPlan, Error> {
    if !(OUT_MIN_HZ ..= OUT_MAX_HZ).contains(&target_hz) {
        return Err(Error::OutOfRange);
    }

    let pfd = ReferencePath::FIXED.f_pfd();

    let (path, vco_hz, divider) =
        if target_hz < VCO_MIN_HZ {
            let row = channel_divider_for(target_hz).ok_or(Error::OutOfRange)?;
            let vco_hz = row.total as u64 * target_hz;
            let step = NPrescaler::Div2.ratio() * pfd;
            (OutputPath::ChannelDivider(*row), vco_hz, Divider::from_ratio(vco_hz, step)?)
        } else if target_hz < VCO_MAX_HZ {
            let step = NPrescaler::Div2.ratio() * pfd;
            (OutputPath::Vco, target_hz, Divider::from_ratio(target_hz, step)?)
        } else {
            let step = NPrescaler::Div4.ratio() * pfd;
            (OutputPath::Doubler, target_hz / 2, Divider::from_ratio(target_hz, step)?)
        };

    Ok(FrequencyPlan {
        target_hz,
        path,
        vco_hz,
        divider,
        mash_order: divider.mash_order(),
        pfd_delay: divider.pfd_delay(),
    })
}

impl FrequencyPlan {

    /// Folds the plan into `cfg`. Every path field is written on every
    /// call so that no setting from a previous plan survives.
    pub fn apply(self: &Self, cfg: LogicalConfig) -> LogicalConfig {
        let vtune_adj: u16 = if self.vco_hz >= VCO_VTUNE_ADJ_HZ { 3 } else { 0 };

        let cfg = ReferencePath::FIXED.apply(cfg)
            .set(Field::PllNPre, self.path.prescaler())
            .set(Field::Vco2xEn, self.path == OutputPath::Doubler)
            .set(Field::VtuneAdj, vtune_adj);

        let cfg = match self.path {
            OutputPath::ChannelDivider(row) => cfg
                .set(Field::ChdivSeg1, row.taps.seg1)
                .set(Field::ChdivSeg2, row.taps.seg2)
                .set(Field::ChdivSeg3, row.taps.seg3)
                .set(Field::ChdivSegSel, row.taps.mux)
                // channel divider on
                .set(Field::ChdivEn, true)
                .set(Field::ChdivDistPd, false)
                .set(Field::ChdivSeg1En, true)
                .set(Field::ChdivSeg2En, true)
                .set(Field::ChdivSeg3En, true)
                .set(Field::ChdivDistaEn, true)
                .set(Field::ChdivDistbEn, true)
                // VCO distribution off
                .set(Field::VcoDistaPd, true)
                .set(Field::VcoDistbPd, true)
                .set(Field::OutaMux, OutputMux::ChannelDivider)
                .set(Field::OutbMux, OutputMux::ChannelDivider),
            OutputPath::Vco | OutputPath::Doubler => cfg
                // channel divider off
                .set(Field::ChdivEn, false)
                .set(Field::ChdivDistPd, true)
                .set(Field::ChdivSeg1En, false)
                .set(Field::ChdivSeg2En, false)
                .set(Field::ChdivSeg3En, false)
                .set(Field::ChdivDistaEn, false)
                .set(Field::ChdivDistbEn, false)
                // VCO distribution on
                .set(Field::VcoDistaPd, false)
                .set(Field::VcoDistbPd, false)
                .set(Field::OutaMux, OutputMux::Vco)
                .set(Field::OutbMux, OutputMux::Vco),
        };

        let d = self.divider;
        cfg.set(Field::PllN, d.n)
           .set(Field::PllDenHi, (d.den >> 16) as u16)
           .set(Field::PllDenLo, (d.den & 0xFFFF) as u16)
           .set(Field::PllNumHi, (d.num >> 16) as u16)
           .set(Field::PllNumLo, (d.num & 0xFFFF) as u16)
           .set(Field::MashOrder, self.mash_order)
           .set(Field::PfdDly, self.pfd_delay as u16)
    }
}


/// Calculate actual output frequency from current field values.
/// RF OUT = [N + (NUM/DEN)] × f PFD × prescaler / channel divider
///
/// Fields are read masked to their width, the same values the chip gets.
/// Returns None if the channel divider taps hold an undefined code or the
/// result does not fit in u64.
pub fn f_out_hz(ref_in_hz: u64, cfg: &LogicalConfig) -> Option<u64> {
    let pfd = ReferencePath::from_config(ref_in_hz, cfg).f_pfd() as u128;
    let prescaler =
        if cfg.field(Field::PllNPre) != 0 { NPrescaler::Div4 } else { NPrescaler::Div2 };
    let step = pfd * prescaler.ratio() as u128;

    let n = cfg.field(Field::PllN) as u128;
    let num = (cfg.field(Field::PllNumHi) as u128) << 16 | cfg.field(Field::PllNumLo) as u128;
    let den = (cfg.field(Field::PllDenHi) as u128) << 16 | cfg.field(Field::PllDenLo) as u128;

    // num * step reaches ~2^75 with a doubled, ×31 reference
    let mut f = n * step;
    if den != 0 {
        f += num * step / den;
    }

    if cfg.field(Field::ChdivEn) != 0 {
        let total = ChannelDivider::from_config(cfg).total_division()?;
        f /= total as u128;
    }
    u64::try_from(f).ok()
}
