//! Constants

/// Reference oscillator frequency on the board
pub const REF_HZ: u64 = 48_000_000;

/// Reference multiplier used by the planner
pub const REF_MULT: u16 = 5;

/// Post-multiplier R divider used by the planner
pub const REF_POST_R: u16 = 2;

/// Phase Frequency Detector frequency the planner runs at,
/// 48 MHz × 5 / 2 = 120 MHz
pub const PFD_HZ: u64 = REF_HZ * REF_MULT as u64 / REF_POST_R as u64;

/// Fundamental VCO mode (before dividers), min frequency
pub const VCO_MIN_HZ: u64 = 3_550_000_000;

/// Fundamental VCO mode (before dividers), max frequency
pub const VCO_MAX_HZ: u64 = 7_100_000_000;

/// Above this VCO frequency VTUNE_ADJ must be raised
pub const VCO_VTUNE_ADJ_HZ: u64 = 6_500_000_000;

/// Minimum allowed output frequency, bottom of the ÷192 channel divider row
pub const OUT_MIN_HZ: u64 = 20_000_000;

/// Maximum allowed output frequency, VCO doubler engaged
pub const OUT_MAX_HZ: u64 = 9_800_000_000;

/// Fractional denominator, always the full 32 bit range
pub const PLL_DEN: u32 = 0xFFFF_FFFF;

/// Largest user facing output power code.
/// Codes 32..=47 are remapped onto chip codes 48..=63.
pub const OUT_POW_CODE_MAX: u8 = 47;

/// Number of register slots, R0..=R70
pub const NUM_REGISTERS: usize = 71;

/// Register carrying the calibration trigger and readback mux select
pub const REG_CONTROL: u8 = 0;

/// Register carrying output power-down, OUTA power and MASH order
pub const REG_OUTPUT: u8 = 46;

/// Register carrying OUTB power
pub const REG_OUTPUT_B: u8 = 47;

/// First readback register, lock detect and selected VCO
pub const REG_READBACK: u8 = 68;
