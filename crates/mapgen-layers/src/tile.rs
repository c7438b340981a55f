//! Finalized leaf payloads.

use std::collections::BTreeMap;

use serde_json::Value;

/// The immutable payload of a finalized quadtree leaf: a tile kind plus a
/// kind-specific field map.
///
/// Fields use JSON values because the downstream engine ingests tiles as
/// JSON; a `BTreeMap` keeps the dumped form deterministic.
#[derive(Clone, PartialEq, Debug)]
pub struct Tile {
    pub kind: String,
    pub fields: BTreeMap<String, Value>,
}

impl Tile {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), fields: BTreeMap::new() }
    }

    /// The tile written to leaves nothing claimed.
    pub fn empty() -> Self {
        Self::new("EmptyTile")
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Convenience accessor for integer fields like `density`.
    pub fn field_u64(&self, name: &str) -> Option<u64> {
        self.fields.get(name).and_then(Value::as_u64)
    }

    /// The engine's wire shape: `{"tile": {"type": <kind>, ...fields}}`.
    pub fn to_json(&self) -> Value {
        let mut inner = serde_json::Map::new();
        inner.insert("type".into(), Value::String(self.kind.clone()));
        for (k, v) in &self.fields {
            inner.insert(k.clone(), v.clone());
        }
        let mut outer = serde_json::Map::new();
        outer.insert("tile".into(), Value::Object(inner));
        Value::Object(outer)
    }
}
