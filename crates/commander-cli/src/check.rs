//! # Check Subcommand
//!
//! Validates a schema description and builds it, reporting every
//! structure with its bindable fields.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use commander_schema::{load_schema, FieldKind};

/// Arguments for the `commander check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema description file (YAML or JSON).
    pub schema: PathBuf,

    /// Only print the summary line.
    #[arg(long, short)]
    pub quiet: bool,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, out: &mut impl Write) -> Result<u8> {
    let schema = load_schema(&args.schema)
        .with_context(|| format!("schema check failed: {}", args.schema.display()))?;

    if !args.quiet {
        for name in schema.structure_names() {
            let Some(plan) = schema.structure(name) else {
                continue;
            };
            match &plan.extends {
                Some(parent) => writeln!(out, "{name} extends {parent}")?,
                None => writeln!(out, "{name}")?,
            }
            for field in &plan.fields {
                let shape = match field.kind {
                    FieldKind::Scalar(_) => "",
                    FieldKind::List(_) => "[]",
                };
                writeln!(
                    out,
                    "  {} <- \"{}\": {}{}{}",
                    field.ident,
                    field.binding_name(),
                    if field.is_nullable() { "?" } else { "" },
                    field.kind.coercion().target_name(),
                    shape,
                )?;
            }
        }
    }

    writeln!(
        out,
        "OK: {} structure(s) in {}",
        schema.structure_count(),
        args.schema.display()
    )?;
    Ok(0)
}
