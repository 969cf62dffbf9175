//! Render the flashcon man page
//!
//! With no argument the page goes to stdout, ready for `man -l -`. Given a
//! directory, it is written there as `flashcon.1`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;

#[path = "../cli.rs"]
mod cli;

fn render(out: &mut dyn Write) -> io::Result<()> {
    clap_mangen::Man::new(cli::Cli::command()).render(out)
}

fn write_into(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.1", cli::Cli::command().get_name()));

    let mut page = Vec::new();
    render(&mut page)?;
    fs::write(&path, page)?;

    eprintln!("wrote {}", path.display());
    Ok(())
}

fn main() -> io::Result<()> {
    match std::env::args_os().nth(1) {
        Some(dir) => write_into(Path::new(&dir)),
        None => render(&mut io::stdout().lock()),
    }
}
