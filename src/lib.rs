#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the Eqiva Blue thermostat communication library.
//! Eqiva Blue 恒温器通信库的根。

pub mod config;
pub mod error;
pub mod message;

pub mod device;

#[cfg(test)]
mod testing;
