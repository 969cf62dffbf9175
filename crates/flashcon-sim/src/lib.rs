//! flashcon-sim - In-memory target for the flashcon console
//!
//! This crate emulates the pieces of an embedded target the console talks
//! to: a NOR flash part ([`SimFlash`]), RAM ([`SimMemory`]) and a UART fed
//! from a script ([`ScriptedPort`]). It is used by the host binary and by
//! tests, without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod flash;
mod memory;
mod port;

pub use flash::{Faults, FlashOp, SimConfig, SimFlash};
pub use memory::SimMemory;
pub use port::ScriptedPort;
