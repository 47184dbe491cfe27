//! Integration test: run the `check` and `bind` handlers against the
//! description fixtures shipped with `commander-schema`.

use std::path::PathBuf;

use commander_bind::DEFAULT_MAX_DEPTH;
use commander_cli::bind::{bind_bytes, BindArgs};
use commander_cli::check::{run_check, CheckArgs};

fn fixture(name: &str) -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.join("commander-schema")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn bind_args(schema: &str, type_name: &str) -> BindArgs {
    BindArgs {
        schema: fixture(schema),
        type_name: type_name.to_string(),
        payload: None,
        form: false,
        max_depth: DEFAULT_MAX_DEPTH,
    }
}

#[test]
fn test_check_order_fixture() {
    let mut out = Vec::new();
    let code = run_check(
        &CheckArgs {
            schema: fixture("order.yaml"),
            quiet: false,
        },
        &mut out,
    )
    .unwrap();
    assert_eq!(code, 0);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Order extends Command\n"), "{text}");
    assert!(text.contains("  items <- \"items\": LineItem[]\n"), "{text}");
    assert!(text.contains("  ship <- \"ship\": ?Address\n"), "{text}");
    assert!(text.contains("  request_id <- \"requestId\": ?string\n"), "{text}");
    assert!(!text.contains("cache"), "{text}");
    let summary = format!("OK: 4 structure(s) in {}\n", fixture("order.yaml").display());
    assert!(text.ends_with(&summary), "{text}");
}

#[test]
fn test_check_rejects_cycle_fixture() {
    let err = run_check(
        &CheckArgs {
            schema: fixture("cycle.yaml"),
            quiet: true,
        },
        &mut Vec::new(),
    )
    .unwrap_err();
    let message = format!("{err:#}");
    assert!(
        message.contains("structure cycle: Company.owner -> Person.employer -> Company"),
        "{message}"
    );
}

#[test]
fn test_bind_order_fixture() {
    let mut out = Vec::new();
    bind_bytes(
        &bind_args("order.yaml", "Order"),
        br#"{"id": 7, "express": "1", "items": [{"sku": "A", "qty": "2"}], "requestId": "r-1"}"#,
        &mut out,
    )
    .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        concat!(
            "Order {\n",
            "  express: true,\n",
            "  id: 7,\n",
            "  items: [\n",
            "    LineItem {\n",
            "      qty: 2,\n",
            "      sku: \"A\",\n",
            "    },\n",
            "  ],\n",
            "  request_id: \"r-1\",\n",
            "  ship: null,\n",
            "  tags: [],\n",
            "}\n",
        )
    );
}

#[test]
fn test_bind_tree_fixture_depth_limit() {
    let mut args = bind_args("tree.json", "Node");
    args.max_depth = 1;
    let payload = br#"{"label": "root", "children": [{"label": "a", "children": [{"label": "b"}]}]}"#;
    let err = bind_bytes(&args, payload, &mut Vec::new()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("children[0].children[0]"), "{message}");
    assert!(message.contains("maximum nesting depth of 1"), "{message}");
}

#[test]
fn test_bind_unknown_type() {
    let err = bind_bytes(&bind_args("order.yaml", "Invoice"), b"{}", &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("type not found: \"Invoice\""));
}
