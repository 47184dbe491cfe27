//! # Payloads
//!
//! The decoded input tree handed to the binder: a mapping from string keys
//! to JSON-like values.
//!
//! Two decoders are provided for HTTP bodies:
//!
//! - JSON documents, whose root must be an object.
//! - URL-encoded form data, with bracket nesting:
//!
//! ```text
//! id=7&tags[]=a&tags[]=b&ship[city]=X
//!   => {"id": "7", "tags": ["a", "b"], "ship": {"city": "X"}}
//! ```
//!
//! Form values are always strings; the binder's coercion rules decide what
//! they become. Keys nested deeper than [`MAX_FORM_NESTING`] brackets are
//! kept as literal top-level keys. An append (`a[]`) that would need an
//! index past `usize::MAX` is dropped.

use serde_json::{Map, Value};

use crate::error::BindError;

/// Path reported for errors about the payload root.
pub const ROOT_PATH: &str = "(root)";

/// Maximum number of bracket segments in one form key.
pub const MAX_FORM_NESTING: usize = 64;

/// A decoded request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Wrap an already decoded mapping.
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Accept a decoded JSON value.
    ///
    /// # Errors
    ///
    /// `BindError::EmptyPayload` for `null`; `BindError::TypeMismatch` at
    /// the root for anything that is not an object.
    pub fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(BindError::EmptyPayload),
            other => Err(BindError::TypeMismatch {
                field: ROOT_PATH.to_string(),
                expected: "object",
                actual: kind_of(&other),
            }),
        }
    }

    /// Decode a JSON body.
    ///
    /// An empty, `null`, or undecodable body is treated as no payload at all.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, BindError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(BindError::EmptyPayload);
        }
        let value: Value = serde_json::from_slice(bytes).map_err(|e| {
            tracing::debug!(error = %e, "request body is not valid JSON");
            BindError::EmptyPayload
        })?;
        Self::from_value(value)
    }

    /// Decode a URL-encoded form body.
    pub fn from_urlencoded(bytes: &[u8]) -> Self {
        Self::from_form_pairs(form_urlencoded::parse(bytes))
    }

    /// Build a payload from decoded form pairs, nesting bracketed keys.
    pub fn from_form_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut root = Map::new();
        for (key, value) in pairs {
            insert_pair(&mut root, key.as_ref(), Value::String(value.into()));
        }
        Self(root)
    }

    /// Pick the payload of a request: form fields when there are any,
    /// otherwise the body decoded as JSON.
    pub fn from_request_body(form: Payload, body: &[u8]) -> Result<Self, BindError> {
        if !form.is_empty() {
            return Ok(form);
        }
        Self::from_json_slice(body)
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no top-level keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwrap the underlying mapping.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Short name of a JSON value's kind, used in diagnostics.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Split `a[b][]` into `("a", ["b", ""])`. Keys that are not well formed,
/// or nest deeper than [`MAX_FORM_NESTING`], are kept literally.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let open = match key.find('[') {
        Some(open) if open > 0 => open,
        _ => return (key, Vec::new()),
    };
    let (base, mut rest) = key.split_at(open);
    let mut segments = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        if segments.len() == MAX_FORM_NESTING {
            tracing::debug!(max = MAX_FORM_NESTING, "form key nests too deep; kept literally");
            return (key, Vec::new());
        }
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        return (key, Vec::new());
    }
    (base, segments)
}

fn insert_pair(root: &mut Map<String, Value>, key: &str, leaf: Value) {
    let (base, segments) = split_key(key);
    match root.get_mut(base) {
        Some(slot) => {
            let current = std::mem::take(slot);
            *slot = nest(current, &segments, leaf);
        }
        None => {
            root.insert(base.to_string(), nest(Value::Null, &segments, leaf));
        }
    }
}

fn nest(slot: Value, segments: &[&str], leaf: Value) -> Value {
    let Some((segment, rest)) = segments.split_first() else {
        return leaf;
    };

    if segment.is_empty() {
        return match slot {
            Value::Array(mut items) => {
                items.push(nest(Value::Null, rest, leaf));
                Value::Array(items)
            }
            Value::Object(mut map) => {
                match next_index(&map) {
                    Some(index) => {
                        map.insert(index.to_string(), nest(Value::Null, rest, leaf));
                    }
                    None => tracing::debug!("form list index overflow; value dropped"),
                }
                Value::Object(map)
            }
            _ => Value::Array(vec![nest(Value::Null, rest, leaf)]),
        };
    }

    let mut map = match slot {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    };
    match map.get_mut(*segment) {
        Some(child) => {
            let current = std::mem::take(child);
            *child = nest(current, rest, leaf);
        }
        None => {
            map.insert(segment.to_string(), nest(Value::Null, rest, leaf));
        }
    }
    Value::Object(map)
}

/// One past the largest integer key, as with appending to a sparse list.
/// `None` when that index is not representable.
fn next_index(map: &Map<String, Value>) -> Option<usize> {
    match map.keys().filter_map(|k| k.parse::<usize>().ok()).max() {
        Some(n) => n.checked_add(1),
        None => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_object_accepted() {
        let payload = Payload::from_json_slice(br#"{"id": 7}"#).unwrap();
        assert_eq!(payload.get("id"), Some(&json!(7)));
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_empty_json_object_is_a_payload() {
        let payload = Payload::from_json_slice(b"{}").unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_nothing_usable_is_empty_payload() {
        for body in [&b""[..], b"   \n", b"null", b"{not json"] {
            assert_eq!(
                Payload::from_json_slice(body),
                Err(BindError::EmptyPayload),
                "body: {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_non_object_root_is_type_mismatch() {
        let err = Payload::from_json_slice(b"[1, 2]").unwrap_err();
        assert_eq!(
            err,
            BindError::TypeMismatch {
                field: ROOT_PATH.into(),
                expected: "object",
                actual: "array",
            }
        );
    }

    #[test]
    fn test_form_flat_fields() {
        let payload = Payload::from_urlencoded(b"id=7&name=Hi%20there");
        assert_eq!(payload.get("id"), Some(&json!("7")));
        assert_eq!(payload.get("name"), Some(&json!("Hi there")));
    }

    #[test]
    fn test_form_list_and_nested_fields() {
        let payload =
            Payload::from_urlencoded(b"tags[]=a&tags[]=b&ship[city]=X&ship[lines][]=1");
        assert_eq!(payload.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(
            payload.get("ship"),
            Some(&json!({"city": "X", "lines": ["1"]}))
        );
    }

    #[test]
    fn test_form_list_of_structures() {
        let payload = Payload::from_form_pairs([
            ("items[0][sku]", "A"),
            ("items[0][qty]", "1"),
            ("items[1][sku]", "B"),
        ]);
        assert_eq!(
            payload.get("items"),
            Some(&json!({"0": {"sku": "A", "qty": "1"}, "1": {"sku": "B"}}))
        );
    }

    #[test]
    fn test_form_append_after_explicit_index() {
        let payload = Payload::from_form_pairs([("ids[4]", "x"), ("ids[]", "y")]);
        assert_eq!(payload.get("ids"), Some(&json!({"4": "x", "5": "y"})));
    }

    #[test]
    fn test_form_malformed_keys_kept_literally() {
        let payload = Payload::from_form_pairs([("a[b", "1"), ("[x]", "2"), ("c[d]e", "3")]);
        assert_eq!(payload.get("a[b"), Some(&json!("1")));
        assert_eq!(payload.get("[x]"), Some(&json!("2")));
        assert_eq!(payload.get("c[d]e"), Some(&json!("3")));
    }

    #[test]
    fn test_next_index() {
        let map = |v: Value| match v {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        assert_eq!(next_index(&Map::new()), Some(0));
        assert_eq!(next_index(&map(json!({"x": 1, "3": 2}))), Some(4));
        assert_eq!(next_index(&map(json!({(usize::MAX.to_string()): 1}))), None);
    }

    #[test]
    fn test_split_key_nesting_cap() {
        let at_cap = format!("a{}", "[x]".repeat(MAX_FORM_NESTING));
        assert_eq!(split_key(&at_cap).1.len(), MAX_FORM_NESTING);

        let over = format!("a{}", "[x]".repeat(MAX_FORM_NESTING + 1));
        assert_eq!(split_key(&over), (over.as_str(), Vec::new()));
    }

    #[test]
    fn test_form_later_scalar_overwrites() {
        let payload = Payload::from_form_pairs([("a", "1"), ("a", "2")]);
        assert_eq!(payload.get("a"), Some(&json!("2")));
    }

    #[test]
    fn test_request_body_prefers_form_fields() {
        let form = Payload::from_urlencoded(b"id=1");
        let payload = Payload::from_request_body(form, br#"{"id": 2}"#).unwrap();
        assert_eq!(payload.get("id"), Some(&json!("1")));
    }

    #[test]
    fn test_request_body_falls_back_to_json() {
        let payload = Payload::from_request_body(Payload::default(), br#"{"id": 2}"#).unwrap();
        assert_eq!(payload.get("id"), Some(&json!(2)));
        assert_eq!(
            Payload::from_request_body(Payload::default(), b""),
            Err(BindError::EmptyPayload)
        );
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of(&json!(1)), "integer");
        assert_eq!(kind_of(&json!(1.5)), "float");
        assert_eq!(kind_of(&json!("x")), "string");
        assert_eq!(kind_of(&json!({})), "object");
    }
}
