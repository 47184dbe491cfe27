//! # Bind Subcommand
//!
//! Binds a payload file (JSON, or URL-encoded form data with `--form`)
//! onto a structure from a schema description and prints the bound
//! instance tree.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use commander_bind::{BindOptions, Binder, DEFAULT_MAX_DEPTH};
use commander_core::Payload;
use commander_schema::load_schema;

/// Arguments for the `commander bind` subcommand.
#[derive(Args, Debug)]
pub struct BindArgs {
    /// Schema description file (YAML or JSON).
    pub schema: PathBuf,

    /// Structure to bind.
    #[arg(value_name = "TYPE")]
    pub type_name: String,

    /// Payload file. Reads standard input when omitted or `-`.
    pub payload: Option<PathBuf>,

    /// Decode the payload as URL-encoded form data instead of JSON.
    #[arg(long)]
    pub form: bool,

    /// Maximum structure nesting depth.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

/// Execute the bind subcommand.
pub fn run_bind(args: &BindArgs, out: &mut impl Write) -> Result<u8> {
    let input = crate::read_input(args.payload.as_deref())?;
    bind_bytes(args, &input, out)
}

/// Bind already-read payload bytes.
pub fn bind_bytes(args: &BindArgs, input: &[u8], out: &mut impl Write) -> Result<u8> {
    let schema = load_schema(&args.schema)
        .with_context(|| format!("failed to load schema: {}", args.schema.display()))?;
    let binder = Binder::with_options(
        Arc::new(schema),
        BindOptions {
            max_depth: args.max_depth,
        },
    );

    let payload = if args.form {
        Payload::from_urlencoded(input)
    } else {
        Payload::from_json_slice(input).context("failed to decode JSON payload")?
    };
    tracing::debug!(keys = payload.len(), form = args.form, "payload decoded");

    let instance = binder
        .fill(&args.type_name, &payload)
        .with_context(|| format!("failed to bind {}", args.type_name))?;

    writeln!(out, "{instance}")?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
structures:
  Address:
    fields:
      - ident: city
        declared: string
        bind: {}
  Order:
    fields:
      - ident: id
        declared: int
        bind: {}
      - ident: tags
        bind: { type: "string[]" }
      - ident: ship
        declared: Address
        nullable: true
        bind: { structure: true }
"#;

    fn args(dir: &tempfile::TempDir, form: bool) -> BindArgs {
        let schema = dir.path().join("schema.yaml");
        std::fs::write(&schema, SCHEMA).unwrap();
        BindArgs {
            schema,
            type_name: "Order".to_string(),
            payload: None,
            form,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[test]
    fn bind_json_prints_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let code = bind_bytes(
            &args(&dir, false),
            br#"{"id":"7","tags":["a","b"],"ship":null}"#,
            &mut out,
        )
        .unwrap();
        assert_eq!(code, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Order {\n  id: 7,\n  ship: null,\n  tags: [\n    \"a\",\n    \"b\",\n  ],\n}\n"
        );
    }

    #[test]
    fn bind_form_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        bind_bytes(&args(&dir, true), b"id=3&ship[city]=Oslo", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("id: 3,"), "{text}");
        assert!(text.contains("city: \"Oslo\","), "{text}");
        assert!(text.contains("tags: [],"), "{text}");
    }

    #[test]
    fn bind_failure_names_field() {
        let dir = tempfile::tempdir().unwrap();
        let err = bind_bytes(&args(&dir, false), br#"{"id": 1, "ship": {}}"#, &mut Vec::new())
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed to bind Order"), "{message}");
        assert!(message.contains("ship.city"), "{message}");
    }

    #[test]
    fn bind_empty_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = bind_bytes(&args(&dir, false), b"  ", &mut Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("request payload is empty"));
    }

    #[test]
    fn bind_reads_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("order.json");
        std::fs::write(&payload, r#"{"id": 5}"#).unwrap();
        let mut bind_args = args(&dir, false);
        bind_args.payload = Some(payload);
        let mut out = Vec::new();
        run_bind(&bind_args, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("id: 5,"));
    }
}
