//! Directive option parsing.
//!
//! Options arrive as `:key: value` lines under the opening fence. They are
//! kept in insertion order as [`RawOptions`]; a handler turns them into its
//! own typed, immutable options value ([`OptionsValue`]) at parse time.

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;
use serde::ser::SerializeMap;

/// Ordered raw `:key: value` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOptions {
    entries: Vec<(String, String)>,
}

impl RawOptions {
    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    /// First value for `key`, exact match.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `class` with its `class_` alias.
    pub fn class(&self) -> Option<&str> {
        self.get("class").or_else(|| self.get("class_"))
    }

    /// Boolean flag. A key that is present with an empty value counts as
    /// true (`:collapsible:`); an absent key is false.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).map(coerce_bool).unwrap_or(false)
    }

    /// Lenient integer: `None` when absent or unparseable.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key)?.trim().parse().ok()
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stable `key=value` listing for structural cache keys.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self
            .entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        parts.sort();
        parts.join(",")
    }
}

impl Serialize for RawOptions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Boolean coercion for option values, case-insensitive.
///
/// `{"", "true", "yes", "1", "on"}` are true; everything else is false.
pub fn coerce_bool(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
        || value == "1"
}

/// A handler's typed options: immutable, thread-safe, downcastable.
pub trait OptionsValue: std::fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Stable textual form for structural cache keys.
    fn summary(&self) -> String;
}

/// Blanket summary via `Debug`; concrete options structs get this for free.
impl<T: std::fmt::Debug + Send + Sync + 'static> OptionsValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn summary(&self) -> String {
        format!("{self:?}")
    }
}

/// The shared `class` / `name` pair most styled directives accept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledOptions {
    pub class_: Option<String>,
    pub name: Option<String>,
}

impl StyledOptions {
    pub fn from_raw(raw: &RawOptions) -> Self {
        Self {
            class_: raw.class().map(str::to_string),
            name: raw.string("name"),
        }
    }
}

/// Helper for handlers with no options of their own.
pub fn styled(raw: &RawOptions) -> Arc<dyn OptionsValue> {
    Arc::new(StyledOptions::from_raw(raw))
}
