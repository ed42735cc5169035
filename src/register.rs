//! LMX2592 registers
//!
//! Every writable bit field the driver touches is described once in the
//! [`Field`] table (register address, bit offset, width). A [`LogicalConfig`]
//! holds one value per field; [`serialize`] folds those values into the
//! 16 bit register bank on top of the chip-mandated base patterns.

use crate::constants::*;

/// Position of a bit field in the register bank
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Register address, R0..=R70
    pub address: u8,
    /// Offset of the least significant bit
    pub offset: u8,
    /// Number of bits in the bit field
    pub num_bits: u8,
}

/// Bit operations on 16bit words
impl Layout {
    #[inline]
    pub fn mask(self: &Self) -> u16 {
        !(0xFFFF_FFFFu32 << self.num_bits) as u16
    }

    /// Masked, shifted contribution of `v` to its register
    #[inline]
    pub fn place(self: &Self, v: u16) -> u16 {
        (v & self.mask()) << self.offset
    }

    /// Field value out of a full register word
    #[inline]
    pub fn extract(self: &Self, w: u16) -> u16 {
        (w >> self.offset) & self.mask()
    }
}


/// Generates the [`Field`] enum together with its layout table
macro_rules! gen_fields {
    ($( $(#[$meta:meta])* $n:ident => ($addr:tt, $off:tt, $nb:tt), )*) => {
        /// Named configuration bit fields
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        pub enum Field {
            $( $(#[$meta])* $n, )*
        }

        impl Field {
            /// All fields, in register order
            pub const ALL: &'static [Field] = &[ $( Field::$n, )* ];

            /// Number of fields
            pub const COUNT: usize = Field::ALL.len();

            /// Where the field lives
            #[inline]
            pub fn layout(self) -> Layout {
                match self {
                    $( Field::$n => Layout { address: $addr, offset: $off, num_bits: $nb }, )*
                }
            }
        }
    };
}

gen_fields! {
    // R0
    /// Powers the whole device down
    Powerdown => (0, 0, 1),
    /// Soft reset, self clearing on the chip side
    Reset => (0, 1, 1),
    /// MUXout pin: 0 = SPI readback, 1 = lock detect
    MuxoutSel => (0, 2, 1),
    /// Writing 1 starts a VCO frequency calibration
    FcalEn => (0, 3, 1),
    /// VCO amplitude calibration during FCAL
    AcalEn => (0, 4, 1),
    /// FCAL adjustment for low PFD frequencies
    FcalLpfdAdj => (0, 5, 2),
    /// FCAL adjustment for high PFD frequencies, 1 = 100 MHz to 150 MHz
    FcalHpfdAdj => (0, 7, 2),
    /// Lock detect enable
    LdEn => (0, 13, 1),

    // R1
    /// Calibration state machine clock divider
    CalClkDiv => (1, 0, 3),

    // R4
    AcalCmpDly => (4, 8, 8),

    // R8
    VcoCapctrlOvr => (8, 10, 1),
    VcoIdacOvr => (8, 13, 1),

    // R9
    /// Reference input path enable
    RefEn => (9, 9, 1),
    /// Reference doubler
    Osc2x => (9, 11, 1),

    // R10
    /// Reference multiplier
    Mult => (10, 7, 5),

    // R11
    /// R divider after the multiplier
    PllR => (11, 4, 8),

    // R12
    /// R divider before the multiplier
    PllRPre => (12, 0, 12),

    // R13
    PfdCtl => (13, 0, 2),
    /// Charge pump enable
    CpEn => (13, 14, 1),

    // R14
    CpIcoarse => (14, 0, 2),
    CpIup => (14, 2, 5),
    CpIdn => (14, 7, 5),

    // R19
    VcoIdac => (19, 3, 9),

    // R20
    AcalVcoIdacStrt => (20, 0, 9),

    // R22
    VcoCapctrl => (22, 0, 8),

    // R23
    VcoSelForce => (23, 10, 1),
    VcoSel => (23, 11, 3),
    FcalVcoSelStrt => (23, 14, 1),

    // R30
    /// VCO output doubler, used above 7.1 GHz
    Vco2xEn => (30, 0, 1),
    /// Tuning voltage adjust, 3 when the VCO runs at 6.5 GHz or above
    VtuneAdj => (30, 6, 2),
    MashDither => (30, 10, 1),

    // R31
    ChdivDistPd => (31, 7, 1),
    VcoDistaPd => (31, 9, 1),
    VcoDistbPd => (31, 10, 1),

    // R34
    /// Channel divider enable
    ChdivEn => (34, 5, 1),

    // R35
    ChdivSeg1En => (35, 1, 1),
    /// Segment 1: 0 = ÷2, 1 = ÷3
    ChdivSeg1 => (35, 2, 1),
    ChdivSeg2En => (35, 7, 1),
    ChdivSeg3En => (35, 8, 1),
    /// Segment 2: 0 = bypass, 1 = ÷2, 2 = ÷4, 4 = ÷6, 8 = ÷8
    ChdivSeg2 => (35, 9, 4),

    // R36
    /// Segment 3: 0 = bypass, 1 = ÷2, 2 = ÷4, 4 = ÷6, 8 = ÷8
    ChdivSeg3 => (36, 0, 4),
    /// Channel divider mux: 1 = after seg 1, 2 = after seg 2, 4 = after seg 3
    ChdivSegSel => (36, 4, 3),
    ChdivDistaEn => (36, 10, 1),
    ChdivDistbEn => (36, 11, 1),

    // R37
    /// N divider prescaler: 0 = ÷2, 1 = ÷4
    PllNPre => (37, 12, 1),

    // R38
    /// Integer part of the feedback divider
    PllN => (38, 1, 12),

    // R39
    PfdDly => (39, 8, 6),

    // R40..R45, 32 bit values split in halves
    PllDenHi => (40, 0, 16),
    PllDenLo => (41, 0, 16),
    MashSeedHi => (42, 0, 16),
    MashSeedLo => (43, 0, 16),
    PllNumHi => (44, 0, 16),
    PllNumLo => (45, 0, 16),

    // R46
    MashOrder => (46, 0, 3),
    /// RFoutA power-down
    OutaPd => (46, 6, 1),
    /// RFoutB power-down
    OutbPd => (46, 7, 1),
    OutaPow => (46, 8, 6),

    // R47
    OutbPow => (47, 0, 6),
    /// RFoutA mux: 0 = channel divider, 1 = VCO
    OutaMux => (47, 11, 2),

    // R48
    /// RFoutB mux: 0 = channel divider, 1 = VCO
    OutbMux => (48, 0, 2),

    // R59
    /// MUXout pin drive strength
    MuxoutHdrv => (59, 5, 1),

    // R61
    LdType => (61, 0, 1),

    // R64
    FjumpSize => (64, 0, 4),
    AjumpSize => (64, 5, 3),
    FcalFast => (64, 8, 1),
    AcalFast => (64, 9, 1),

    // R68..R70, read only
    /// VCO core picked by the last calibration
    RbVcoSel => (68, 5, 3),
    /// Lock detect derived from the tuning voltage, 2 = locked
    RbLdVtune => (68, 9, 2),
    RbVcoCapctrl => (69, 0, 8),
    RbVcoDaciset => (70, 0, 9),
}

impl Field {
    /// Read-only status fields, never serialized
    #[inline]
    pub fn is_readback(self) -> bool {
        self.layout().address >= REG_READBACK
    }
}


/// Registers written on every configuration pass together with their
/// base patterns (reserved bits and fixed power-on bits). Field values
/// are OR-ed on top.
pub const ACTIVE_REGISTERS: [(u8, u16); 43] = [
    (0,  0b0000_0010_0000_0000),
    (1,  0b0000_1000_0000_1000),
    (2,  0b0000_0101_0000_0000),
    (4,  0b0000_0000_0100_0011),
    (7,  0b0010_1000_1011_0010),
    (8,  0b0001_0000_1000_0100),
    (9,  0b0000_0001_0000_0010),
    (10, 0b0001_0000_0101_1000),
    (11, 0b0000_0000_0000_1000),
    (12, 0b0111_0000_0000_0000),
    (13, 0b0000_0000_0000_0000),
    (14, 0b0000_0000_0000_0000),
    (19, 0b0000_0000_0000_0101),
    (20, 0b0000_0000_0000_0000),
    (22, 0b0010_0011_0000_0000),
    (23, 0b1000_0000_0100_0010),
    (24, 0b0000_0101_0000_1001),
    (25, 0b0000_0000_0000_0000),
    (28, 0b0010_1001_0010_0100),
    (29, 0b0000_0000_1000_0100),
    (30, 0b0000_0000_0011_0100),
    (31, 0b0000_0000_0000_0001),
    (32, 0b0010_0001_0000_1010),
    (33, 0b0010_1010_0000_1010),
    (34, 0b1100_0011_1100_1010),
    (35, 0b0000_0000_0001_1001),
    (36, 0b0000_0000_0000_0000),
    (37, 0b0100_0000_0000_0000),
    (38, 0b0000_0000_0000_0000),
    (39, 0b1000_0000_0000_0100),
    (40, 0b0000_0000_0000_0000),
    (41, 0b0000_0000_0000_0000),
    (42, 0b0000_0000_0000_0000),
    (43, 0b0000_0000_0000_0000),
    (44, 0b0000_0000_0000_0000),
    (45, 0b0000_0000_0000_0000),
    (46, 0b0000_0000_0010_0000),
    (47, 0b0000_0000_1100_0000),
    (48, 0b0000_0011_1111_1100),
    (59, 0b0000_0000_0000_0000),
    (61, 0b0000_0000_0000_0000),
    (62, 0b0000_0000_0000_0000),
    (64, 0b0000_0000_0001_0000),
];


/// Logical configuration: one value per [`Field`].
///
/// Values are stored as given and masked to the field width only when
/// placed into a register, the way the chip itself ignores excess bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LogicalConfig {
    values: [u16; Field::COUNT],
}

impl LogicalConfig {
    /// All fields set to 0
    pub const fn zeroed() -> Self {
        LogicalConfig { values: [0; Field::COUNT] }
    }

    /// Get bit field value as stored
    #[inline]
    pub fn get(self: &Self, f: Field) -> u16 {
        self.values[f as usize]
    }

    /// Bit field value as the chip sees it, masked to the field width
    #[inline]
    pub fn field(self: &Self, f: Field) -> u16 {
        f.layout().mask() & self.values[f as usize]
    }

    /// Update bit field
    #[inline]
    pub fn set<V>(mut self: Self, f: Field, v: V) -> Self
    where V: Into<u16>,
    {
        self.values[f as usize] = v.into();
        self
    }

    /// Physical register bank for this configuration
    #[inline]
    pub fn serialize(self: &Self) -> (RegisterBank, DirtySet) {
        serialize(self)
    }
}


/// Physical register bank, R0..=R70
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterBank {
    words: [u16; NUM_REGISTERS],
}

impl Default for RegisterBank {
    fn default() -> Self {
        RegisterBank { words: [0; NUM_REGISTERS] }
    }
}

impl RegisterBank {
    /// Register values in device format, indexed by address.
    #[inline]
    pub fn words(self: &Self) -> &[u16; NUM_REGISTERS] {
        &self.words
    }

    /// Register value, 0 past R70
    #[inline]
    pub fn get(self: &Self, address: u8) -> u16 {
        self.words.get(address as usize).copied().unwrap_or(0)
    }

    /// Stores a register value, addresses past R70 are ignored
    #[inline]
    pub fn set(self: &mut Self, address: u8, w: u16) {
        if let Some(slot) = self.words.get_mut(address as usize) {
            *slot = w;
        }
    }

    /// Decode a single field out of the bank
    #[inline]
    pub fn field(self: &Self, f: Field) -> u16 {
        let l = f.layout();
        l.extract(self.get(l.address))
    }
}


/// Set of register addresses taking part in a configuration pass
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DirtySet(u128);

impl DirtySet {
    /// Set holding a single address
    #[inline]
    pub fn single(address: u8) -> Self {
        let mut s = DirtySet::default();
        s.insert(address);
        s
    }

    /// Adds `address`, addresses past R70 are ignored
    #[inline]
    pub fn insert(self: &mut Self, address: u8) {
        if (address as usize) < NUM_REGISTERS {
            self.0 |= 1u128 << address;
        }
    }

    #[inline]
    pub fn contains(self: &Self, address: u8) -> bool {
        (address as usize) < NUM_REGISTERS && (self.0 >> address) & 1 != 0
    }

    #[inline]
    pub fn len(self: &Self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self: &Self) -> bool {
        self.0 == 0
    }

    /// Addresses from the highest to the lowest, the order the chip
    /// must see them in so that R0 latches last.
    pub fn iter_descending(self: &Self) -> impl Iterator<Item = u8> {
        let bits = self.0;
        (0..NUM_REGISTERS as u8).rev().filter(move |a| (bits >> *a) & 1 != 0)
    }
}


/// Re-derives every active register from scratch.
///
/// Each active register starts from its base pattern, gets the masked,
/// shifted value of every field it carries and is marked dirty. Registers
/// outside [`ACTIVE_REGISTERS`] stay 0 and clean.
pub fn serialize(config: &LogicalConfig) -> (RegisterBank, DirtySet) {
    let mut bank = RegisterBank::default();
    let mut dirty = DirtySet::default();

    for &(address, base) in ACTIVE_REGISTERS.iter() {
        bank.set(address, base);
        dirty.insert(address);
    }

    for &f in Field::ALL.iter() {
        let l = f.layout();
        if dirty.contains(l.address) {
            let w = bank.get(l.address) | l.place(config.get(f));
            bank.set(l.address, w);
        }
    }

    (bank, dirty)
}
