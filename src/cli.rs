//! Command-line driver.
//!
//! Reads one translation unit (a named file, or stdin when no file is
//! given), writes the generated assembly to stdout, and reports the first
//! error on stderr with exit status 1.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;

use crate::compile::compile;
use crate::error::{CompileError, ErrorKind};

#[derive(Parser)]
#[command(name = "minicc")]
#[command(about = "Compile a C subset to x86-64 System V assembly", version)]
pub struct Cli {
    /// Source file; reads standard input when omitted.
    pub input: Option<PathBuf>,
}

pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            CompileError::bare(ErrorKind::Io(format!("{}: {}", path.display(), e)))
                .display_with_source("")
        })?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).map_err(|e| {
                CompileError::bare(ErrorKind::Io(format!("<stdin>: {}", e)))
                    .display_with_source("")
            })?;
            buf
        }
    };

    match compile(&source) {
        Ok(asm) => {
            print!("{}", asm);
            Ok(())
        }
        Err(err) => Err(err.display_with_source(&source).into()),
    }
}
