//! Errors

/// Driver errors
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// Requested output frequency is outside of what the chip can produce
    OutOfRange,
    /// Requested output power code exceeds the chip's maximum
    InvalidPower,
    /// PLL did not report lock within the caller's time budget
    LockTimeout,
    /// Session used before a successful `start()`
    NotStarted,
    /// SPI bus error
    Spi,
    /// GPIO pin error
    Pin,
}
