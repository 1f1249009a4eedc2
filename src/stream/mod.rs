//! Serial-style stream adapter over a single-client listener
//!
//! This module provides [`NetDebug`], the stream that application code
//! writes its debug output to, together with its configuration and the
//! UART compatibility shims.

pub mod adapter;
pub mod compat;
pub mod config;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use adapter::NetDebug;
pub use compat::{NarrowByte, SerialConfig};
pub use config::StreamConfig;
pub use strategy::AcceptStrategy;
