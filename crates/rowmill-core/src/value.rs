//! Row and value model.
//!
//! Rows are opaque to the engine: operations read them only through
//! caller-supplied selector functions. A row is usually a `Value::Record`,
//! but scalar rows and `List` rows (e.g. `stack`-mode join output) are
//! first-class too.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::signature::KeySig;

/// A row as seen by the engine.
pub type Row = Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Record(Record),
}

/// A field→value mapping that remembers insertion order, so output shapes
/// follow input shapes. Field order never affects equality or signatures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Field union biased toward `over`: same-named fields are replaced in
    /// place, new fields append in `over`'s order.
    pub fn overlay(&self, over: &Record) -> Record {
        let mut out = self.clone();
        for (name, value) in over.iter() {
            out.insert(name.clone(), value.clone());
        }
        out
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Record {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Read one field; `Null` when absent or when the value is not a record.
    pub fn get(&self, name: &str) -> Value {
        match self.as_record().and_then(|r| r.get(name)) {
            Some(v) => v.clone(),
            None => Value::Null,
        }
    }

    /// Read a dotted field path, e.g. `"address.city"`.
    pub fn get_path(&self, path: &str) -> Value {
        let mut current = self.clone();
        for segment in path.split('.') {
            current = current.get(segment);
        }
        current
    }

    /// Read a pre-split field path. An empty path yields the value itself.
    pub fn get_at(&self, segments: &[String]) -> Value {
        let mut current = self.clone();
        for segment in segments {
            current = current.get(segment);
        }
        current
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Record(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> serde_json::Value {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Record(r) => serde_json::Value::Object(
                r.fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Convert a JSON value into rows: an array becomes one row per element,
/// anything else becomes a single row.
pub fn rows_from_json(v: serde_json::Value) -> Vec<Row> {
    match v {
        serde_json::Value::Array(items) => items.into_iter().map(Value::from).collect(),
        other => vec![Value::from(other)],
    }
}

/// Total ordering over values for sorting.
///
/// Nulls sort first; ints and floats compare numerically across variants;
/// NaN sorts after every other float; remaining mixed variants fall back to
/// a fixed type order.
pub fn value_cmp(a: &Value, b: &Value) -> Ordering {
    use Value::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Null, _) => Ordering::Less,
        (_, Null) => Ordering::Greater,
        (Bool(x), Bool(y)) => x.cmp(y),
        (Int(x), Int(y)) => x.cmp(y),
        (Int(x), Float(y)) => cmp_f64(*x as f64, *y),
        (Float(x), Int(y)) => cmp_f64(*x, *y as f64),
        (Float(x), Float(y)) => cmp_f64(*x, *y),
        (Str(x), Str(y)) => x.cmp(y),
        (List(x), List(y)) => {
            for (ex, ey) in x.iter().zip(y.iter()) {
                match value_cmp(ex, ey) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Record(_), Record(_)) => KeySig::of(a).as_str().cmp(KeySig::of(b).as_str()),
        _ => value_type_order(a).cmp(&value_type_order(b)),
    }
}

/// Equality by value, consistent with `value_cmp` (so `Int(2)` equals
/// `Float(2.0)`, and record field order is ignored).
pub fn value_eq(a: &Value, b: &Value) -> bool {
    value_cmp(a, b) == Ordering::Equal
}

fn cmp_f64(x: f64, y: f64) -> Ordering {
    if x.is_nan() && y.is_nan() {
        Ordering::Equal
    } else if x.is_nan() {
        Ordering::Greater
    } else if y.is_nan() {
        Ordering::Less
    } else {
        x.partial_cmp(&y).unwrap_or(Ordering::Equal)
    }
}

/// Fixed order for mixed-variant comparisons.
fn value_type_order(v: &Value) -> u8 {
    use Value::*;
    match v {
        Null => 0,
        Bool(_) => 1,
        Int(_) => 2,
        Float(_) => 3,
        Str(_) => 4,
        List(_) => 5,
        Record(_) => 6,
    }
}
