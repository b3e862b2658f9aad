//! Input helpers shared by the write commands

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use notestore_core::error::{Result, StoreError};

/// Whether `input` names standard input
pub fn is_stdin(input: &str) -> bool {
    input == "-"
}

/// Read all of `input` (a file path, or `-` for stdin)
pub fn read_input(input: &str) -> Result<String> {
    let mut text = String::new();
    if is_stdin(input) {
        io::stdin().read_to_string(&mut text)?;
    } else {
        File::open(Path::new(input))
            .map_err(|e| StoreError::invalid_value("input file", format!("{}: {}", input, e)))?
            .read_to_string(&mut text)?;
    }
    Ok(text)
}

/// Line reader over `input` (a file path, or `-` for stdin)
pub fn open_lines(input: &str) -> Result<Box<dyn BufRead>> {
    if is_stdin(input) {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file = File::open(Path::new(input))
            .map_err(|e| StoreError::invalid_value("input file", format!("{}: {}", input, e)))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
