//! # commander-cli — Command-Line Front End
//!
//! Provides the `commander` binary:
//!
//! ```bash
//! commander check schema.yaml
//! commander bind schema.yaml Order payload.json
//! echo 'id=7&tags[]=a' | commander bind schema.yaml Order --form
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers here take parsed
//!   arguments and an output sink so they can be tested directly.
//! - Handlers return the process exit code; errors carry `anyhow` context.

pub mod bind;
pub mod check;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Read a whole input file, or standard input for `None` and `-`.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read(path)
            .with_context(|| format!("failed to read payload file: {}", path.display())),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read payload from stdin")?;
            Ok(buf)
        }
    }
}
