#![cfg_attr(not(test), no_std)]

//! [LMX2592](https://www.ti.com/product/LMX2592) driver.
//!
//! [`frequency::plan`] turns an output frequency into divider settings,
//! [`register::serialize`] turns the logical configuration into the chip's
//! register bank and [`session::Session`] pushes it over SPI.

pub mod constants;
pub mod errors;
pub mod register;
pub mod config;
pub mod refin;
pub mod frequency;
pub mod device;
pub mod session;
