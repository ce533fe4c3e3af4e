//! Input reading for CLI commands.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read the text to analyze from a file, or from stdin when `input` is `-`.
pub fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        read_file(Path::new(input))
    }
}

pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file '{}'", path.display()))
}
