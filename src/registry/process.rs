//! Process-wide registry of JSON-shaped machines.
//!
//! The global registry stores machines whose bag is a JSON object, whose
//! payloads are `serde_json::Value` and whose labels are `String`, so any
//! caller can reach a machine by name without agreeing on types up front.
//! A fresh bag, and the bag `init_default` installs, is the empty object.

use super::Registry;
use crate::machine::Flop;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// State bag of a global machine.
pub type JsonBag = Map<String, Value>;

pub type JsonRegistry = Registry<JsonBag, String, Value>;

pub type JsonFlop = Flop<JsonBag, String, Value>;

static GLOBAL: OnceLock<JsonRegistry> = OnceLock::new();

/// The process-wide registry behind [`machine`].
pub fn global() -> &'static JsonRegistry {
    GLOBAL.get_or_init(Registry::new)
}

/// Get the global machine named `name`, creating it on first use.
///
/// # Example
///
/// ```rust
/// use flipflop::JsonBag;
/// use serde_json::{json, Value};
///
/// let door = flipflop::machine("doc-door");
/// door.derive(|s: &JsonBag| {
///     let open = s.get("open").and_then(Value::as_bool).unwrap_or(false);
///     if open { "open".to_string() } else { "closed".to_string() }
/// })
/// .bind("toggle", |s: &mut JsonBag, _: Value| {
///     let open = s.get("open").and_then(Value::as_bool).unwrap_or(false);
///     s.insert("open".to_string(), json!(!open));
/// })
/// .init_default()
/// .trigger("toggle", Value::Null);
///
/// assert_eq!(door.current_label().as_deref(), Some("open"));
/// assert!(flipflop::machine("doc-door").ptr_eq(&door));
/// ```
pub fn machine(name: &str) -> JsonFlop {
    global().machine(name)
}
