//! flashcon - Serial debug console for target flash and RAM
//!
//! Serves the flashcon command console against a simulated target: an
//! in-memory NOR flash and RAM regions described on the command line or in
//! a TOML file. The console runs on stdin/stdout or on a serial device.
//!
//! # Commands
//!
//! - `flash read|write|erase|dump` - move data between flash and RAM
//! - `dump <addr> <len>` - hex dump of RAM
//! - `uart <speed>` - change the line speed
//!
//! Anything else prints the command summary.

mod cli;
mod config;
mod error;
mod port;

use clap::Parser;
use cli::Cli;
use config::{Settings, TargetFile};
use error::HostError;
use flashcon_core::console::Console;
use flashcon_core::terminal::Uart;
use flashcon_sim::{SimFlash, SimMemory};
use port::{SerialUart, StdioPort};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    run(&cli)?;
    Ok(())
}

/// Build the simulated target from the settings and serve the console
fn run(cli: &Cli) -> Result<(), HostError> {
    let file = cli.config.as_deref().map(TargetFile::load).transpose()?;
    let settings = Settings::resolve(cli, file)?;

    let flash = settings.build_flash()?;
    let memory = settings.build_memory();
    log::info!(
        "Simulated target: {} KiB flash ({} byte erase blocks), {} RAM region(s)",
        settings.flash.size / 1024,
        settings.flash.erase_block_size,
        memory.region_count()
    );

    let flash = match &settings.port {
        Some(device) => serve(SerialUart::open(device, settings.baud)?, flash, memory)?,
        None => serve(StdioPort::new(), flash, memory)?,
    };

    if let Some(path) = &settings.save_image {
        std::fs::write(path, flash.data())?;
        log::info!("Saved flash contents to {}", path.display());
    }

    Ok(())
}

/// Run the console until its input ends, handing back the flash
fn serve<U: Uart>(uart: U, flash: SimFlash, memory: SimMemory) -> Result<SimFlash, HostError> {
    let mut console = Console::new(uart, flash, memory);
    console.banner();

    match console.run() {
        flashcon_core::Error::EndOfInput => log::info!("Input closed, exiting"),
        e => return Err(HostError::Console(e)),
    }

    let (_, flash, _) = console.into_parts();
    Ok(flash)
}
