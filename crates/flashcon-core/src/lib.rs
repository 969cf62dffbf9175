//! flashcon-core - Serial debug console for target flash and RAM
//!
//! This crate implements the input pipeline and command engine of a small
//! interactive console that runs on an embedded target: a ring-buffer line
//! editor, a whitespace tokenizer, the command dispatcher and the handlers
//! for flash read/write/erase/dump and raw memory dumps. It is `no_std`
//! compatible; the UART, the flash driver and RAM access are supplied by the
//! caller through the [`terminal::Uart`], [`flash::FlashDriver`] and
//! [`memory::TargetMemory`] traits.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```ignore
//! use flashcon_core::console::Console;
//!
//! fn run<U: Uart, F: FlashDriver, M: TargetMemory>(uart: U, flash: F, ram: M) {
//!     let mut console = Console::new(uart, flash, ram);
//!     console.banner();
//!     loop {
//!         if console.poll().is_err() {
//!             break;
//!         }
//!     }
//! }
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod command;
pub mod console;
pub mod error;
pub mod flash;
pub mod hexdump;
pub mod line;
pub mod memory;
pub mod number;
pub mod terminal;

pub use error::{Error, ParseError, Result};
