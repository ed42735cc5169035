use lmx2592::{
    config::*, constants::*, device::*, errors::*, frequency::*, register::*, session::*,
};

/// Register file that remembers every access
struct FakeChip {
    regs: Vec<u16>,
    writes: Vec<(u8, u16)>,
    reads: Vec<u8>,
}

impl FakeChip {
    fn new() -> Self {
        FakeChip { regs: vec![0; 128], writes: Vec::new(), reads: Vec::new() }
    }
}

impl Transport for FakeChip {
    fn write_register(&mut self, address: u8, value: u16) -> Result<(), Error> {
        self.writes.push((address, value));
        self.regs[address as usize] = value;
        Ok(())
    }

    fn read_register(&mut self, address: u8) -> Result<u16, Error> {
        self.reads.push(address);
        Ok(self.regs[address as usize])
    }
}

fn started() -> Session<FakeChip> {
    let mut s = Session::new(FakeChip::new());
    s.start().unwrap();
    s
}

fn take_writes(s: Session<FakeChip>) -> (Vec<(u8, u16)>, Vec<u8>) {
    let chip = s.free();
    (chip.writes, chip.reads)
}

fn assert_descending(writes: &[(u8, u16)]) {
    for w in writes.windows(2) {
        assert!(w[0].0 > w[1].0, "R{} before R{}", w[0].0, w[1].0);
    }
}

#[test]
fn start_resets_then_commits_everything() {
    let s = started();
    assert_eq!(s.state(), State::Configured);
    assert_eq!(s.config().get(Field::MuxoutHdrv), 1);
    assert_eq!(s.config().get(Field::Reset), 0);

    let (writes, reads) = take_writes(s);
    assert!(reads.is_empty());
    assert_eq!(writes.len(), 2 + ACTIVE_REGISTERS.len());

    // soft reset pulse on R0
    assert_eq!(writes[0], (0, 0x2216));
    assert_eq!(writes[1], (0, 0x2214));

    let full = &writes[2..];
    assert_descending(full);
    assert_eq!(full.first().map(|w| w.0), Some(64));
    assert_eq!(full.last(), Some(&(0, 0x2214)));
    assert!(full.contains(&(59, 0x0020)));
}

#[test]
fn never_writes_inactive_registers() {
    let mut s = started();
    s.set_frequency(1_000_000_000).unwrap();
    s.set_output_power(10).unwrap();
    s.enable_output(Output::B, true).unwrap();
    let (writes, _) = take_writes(s);
    for (a, _) in writes {
        assert!(ACTIVE_REGISTERS.iter().any(|r| r.0 == a), "R{}", a);
    }
}

#[test]
fn set_frequency_commits_then_calibrates() {
    let s = started();
    let before = s.free().writes.len();

    let mut s = Session::new(FakeChip::new());
    s.start().unwrap();
    let p = s.set_frequency(1_100_000_000).unwrap();
    assert_eq!(s.state(), State::Calibrating);
    assert_eq!(p.divider.n, 18);
    assert_eq!(s.config().get(Field::PllN), 18);
    assert_eq!(s.config().get(Field::FcalEn), 1);

    let (writes, _) = take_writes(s);
    let tail = &writes[before..];
    assert_eq!(tail.len(), ACTIVE_REGISTERS.len() + 1);
    assert_descending(&tail[..ACTIVE_REGISTERS.len()]);

    // calibration trigger goes out last, on its own
    let (a, w) = *tail.last().unwrap();
    assert_eq!(a, 0);
    assert_ne!(w & (1 << 3), 0);
    // N lands in R38 bits 12:1
    assert!(tail.contains(&(38, 18 << 1)));
}

#[test]
fn rejected_frequency_changes_nothing() {
    let mut s = started();
    s.set_frequency(3_000_000_000).unwrap();
    let cfg = *s.config();
    let state = s.state();

    assert_eq!(s.set_frequency(OUT_MIN_HZ - 1), Err(Error::OutOfRange));
    assert_eq!(s.set_frequency(OUT_MAX_HZ + 1), Err(Error::OutOfRange));
    assert_eq!(*s.config(), cfg);
    assert_eq!(s.state(), state);

    let writes = s.free().writes;
    let last = writes.last().unwrap();
    assert_eq!(last.0, 0);
}

#[test]
fn rejected_frequency_sends_no_frames() {
    let s = started();
    let n = s.free().writes.len();

    let mut s = started();
    assert!(s.set_frequency(10).is_err());
    assert_eq!(s.free().writes.len(), n);
}

#[test]
fn retune_across_paths_clears_doubler() {
    let mut s = started();
    s.set_frequency(9_500_000_000).unwrap();
    let (bank, _) = s.config().serialize();
    assert_eq!(bank.field(Field::Vco2xEn), 1);
    assert_eq!(bank.field(Field::PllNPre), 1);

    s.set_frequency(30_000_000).unwrap();
    let (bank, _) = s.config().serialize();
    assert_eq!(bank.field(Field::Vco2xEn), 0);
    assert_eq!(bank.field(Field::PllNPre), 0);
    assert_eq!(bank.field(Field::ChdivEn), 1);
    assert_eq!(ChannelDivider::from_config(s.config()).total_division(), Some(128));
}

#[test]
fn programmed_frequency_reads_back() {
    let mut s = started();
    for &f in [25_000_000u64, 433_920_000, 2_400_000_000, 5_800_000_000, 9_000_000_000].iter() {
        s.set_frequency(f).unwrap();
        let got = s.f_out_hz().unwrap();
        let err = if got > f { got - f } else { f - got };
        assert!(err <= 2, "{} -> {}", f, got);
    }
}

#[test]
fn output_power_writes_r47_then_r46() {
    let s = started();
    let n = s.free().writes.len();

    let mut s = started();
    s.set_output_power(32).unwrap();
    assert_eq!(s.state(), State::Configured);
    let (writes, _) = take_writes(s);
    let tail = &writes[n..];
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].0, 47);
    assert_eq!(tail[1].0, 46);
    assert_eq!(tail[0].1 & 0x3F, 48);
    assert_eq!((tail[1].1 >> 8) & 0x3F, 48);
}

#[test]
fn invalid_power_rejected_without_writes() {
    let mut s = started();
    let cfg = *s.config();
    assert_eq!(s.set_output_power(48), Err(Error::InvalidPower));
    assert_eq!(*s.config(), cfg);
    let n = s.free().writes.len();
    assert_eq!(n, 2 + ACTIVE_REGISTERS.len());
}

#[test]
fn output_enable_uses_fast_path() {
    let mut s = started();
    s.set_frequency(2_000_000_000).unwrap();
    let n = s.free().writes.len();

    let mut s = started();
    s.set_frequency(2_000_000_000).unwrap();
    s.enable_output(Output::A, false).unwrap();
    s.enable_output(Output::B, true).unwrap();
    assert_eq!(s.state(), State::Calibrating);

    let (writes, _) = take_writes(s);
    let tail = &writes[n..];
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].0, 46);
    assert_ne!(tail[0].1 & (1 << 6), 0);
    assert_eq!(tail[1].0, 46);
    assert_ne!(tail[1].1 & (1 << 6), 0);
    assert_eq!(tail[1].1 & (1 << 7), 0);
}

#[test]
fn poll_lock_reads_r68() {
    let mut s = started();
    s.set_frequency(4_000_000_000).unwrap();
    assert_eq!(s.poll_lock(), Err(nb::Error::WouldBlock));
    assert_eq!(s.state(), State::Unlocked);
    let (_, reads) = take_writes(s);
    assert_eq!(reads, vec![68]);

    let mut chip = FakeChip::new();
    chip.regs[68] = 2 << 9;
    let mut s = Session::new(chip);
    s.start().unwrap();
    s.set_frequency(4_000_000_000).unwrap();
    assert_eq!(s.poll_lock(), Ok(()));
    assert_eq!(s.state(), State::Locked);

    let (writes, reads) = take_writes(s);
    assert_eq!(reads, vec![68]);
    // readback mode: MUXOUT_SEL and FCAL_EN both clear
    let (a, w) = *writes.last().unwrap();
    assert_eq!(a, 0);
    assert_eq!(w & (1 << 2), 0);
    assert_eq!(w & (1 << 3), 0);
}

#[test]
fn operations_before_start_are_rejected() {
    let mut chip = FakeChip::new();
    chip.regs[68] = 2 << 9;
    let mut s = Session::new(chip);

    assert_eq!(s.set_frequency(1_000_000_000), Err(Error::NotStarted));
    assert_eq!(s.set_output_power(10), Err(Error::NotStarted));
    assert_eq!(s.enable_output(Output::A, false), Err(Error::NotStarted));
    assert_eq!(s.calibrate(), Err(Error::NotStarted));
    assert_eq!(s.lock_detect(), Err(Error::NotStarted));
    assert_eq!(s.poll_lock(), Err(nb::Error::Other(Error::NotStarted)));
    assert_eq!(s.readback(), Err(Error::NotStarted));
    assert_eq!(s.dump(), Err(Error::NotStarted));
    assert_eq!(s.state(), State::Uninitialized);
    assert_eq!(*s.config(), LogicalConfig::default());

    let (writes, reads) = take_writes(s);
    assert!(writes.is_empty());
    assert!(reads.is_empty());
}

#[test]
fn lock_detect_other_codes_are_unlocked() {
    let mut chip = FakeChip::new();
    chip.regs[68] = 3 << 9;
    let mut s = Session::new(chip);
    s.start().unwrap();
    s.calibrate().unwrap();
    assert_eq!(s.state(), State::Calibrating);
    assert_eq!(s.lock_detect(), Ok(LockDetect::VtuneHigh));
    assert_eq!(s.state(), State::Unlocked);
}

#[test]
fn caller_driven_timeout() {
    let mut s = started();
    s.set_frequency(6_000_000_000).unwrap();

    let mut polls = 0;
    let res = loop {
        match s.poll_lock() {
            Ok(()) => break Ok(()),
            Err(nb::Error::WouldBlock) if polls < 5 => polls += 1,
            Err(nb::Error::WouldBlock) => break Err(Error::LockTimeout),
            Err(nb::Error::Other(e)) => break Err(e),
        }
    };
    assert_eq!(res, Err(Error::LockTimeout));
    assert_eq!(s.free().reads.len(), 6);
}

#[test]
fn readback_decodes_calibration() {
    let mut chip = FakeChip::new();
    chip.regs[68] = (4 << 5) | (2 << 9);
    chip.regs[69] = 0x33;
    chip.regs[70] = 0x155;
    let mut s = Session::new(chip);
    s.start().unwrap();

    let rb = s.readback().unwrap();
    assert_eq!(rb.vco_sel, 4);
    assert!(rb.lock_detect.is_locked());
    assert_eq!(rb.vco_capctrl, 0x33);
    assert_eq!(rb.vco_daciset, 0x155);
    assert_eq!(s.state(), State::Locked);
    assert_eq!(s.free().reads, vec![68, 69, 70]);
}

#[test]
fn dump_reads_active_registers() {
    let mut s = started();
    s.set_frequency(800_000_000).unwrap();
    let bank = s.dump().unwrap();
    let (expect, _) = s.config().serialize();
    for &(a, _) in ACTIVE_REGISTERS.iter() {
        assert_eq!(bank.get(a), expect.get(a), "R{}", a);
    }
    let (_, reads) = take_writes(s);
    assert_eq!(reads.len(), ACTIVE_REGISTERS.len());
    assert!(!reads.contains(&68));
}

#[test]
fn soft_reset_touches_only_r0() {
    let s = started();
    let n = s.free().writes.len();
    let mut s = started();
    s.soft_reset().unwrap();
    let (writes, _) = take_writes(s);
    let tail = &writes[n..];
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].0, 0);
    assert_ne!(tail[0].1 & 0b10, 0);
    assert_eq!(tail[1].0, 0);
    assert_eq!(tail[1].1 & 0b10, 0);
}
