//! Canonical key signatures.
//!
//! A `KeySig` is the textual canonical form of a (possibly composite) key
//! value: two values are equal-by-key everywhere in the engine iff their
//! signatures are equal. Records render their fields in sorted name order,
//! so insertion history never affects equality. The flattening is allowed to
//! identify values deliberately (e.g. `Int(2)` and `Float(2.0)`), never
//! accidentally.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySig(String);

impl KeySig {
    pub fn of(value: &Value) -> KeySig {
        KeySig(canonical(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeySig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn canonical(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::List(items) => items
            .iter()
            .map(canonical)
            .collect::<Vec<_>>()
            .join(","),
        Value::Record(r) => {
            let mut names: Vec<&String> = r.keys().collect();
            names.sort();
            let mut out = String::from("[");
            for name in names {
                let rendered = r.get(name).map(canonical).unwrap_or_default();
                out.push('[');
                out.push_str(name);
                out.push(',');
                out.push_str(&rendered);
                out.push(']');
            }
            out.push(']');
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn rec(pairs: &[(&str, Value)]) -> Value {
        Value::Record(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<Record>(),
        )
    }

    #[test]
    fn field_order_does_not_affect_signature() {
        let a = rec(&[("x", Value::Int(1)), ("y", Value::Str("q".into()))]);
        let b = rec(&[("y", Value::Str("q".into())), ("x", Value::Int(1))]);
        assert_eq!(KeySig::of(&a), KeySig::of(&b));
    }

    #[test]
    fn nested_records_canonicalize_recursively() {
        let inner_a = rec(&[("m", Value::Int(2)), ("n", Value::Int(3))]);
        let inner_b = rec(&[("n", Value::Int(3)), ("m", Value::Int(2))]);
        let a = rec(&[("k", inner_a)]);
        let b = rec(&[("k", inner_b)]);
        assert_eq!(KeySig::of(&a), KeySig::of(&b));
    }

    #[test]
    fn different_values_differ() {
        let a = rec(&[("x", Value::Int(1))]);
        let b = rec(&[("x", Value::Int(2))]);
        assert_ne!(KeySig::of(&a), KeySig::of(&b));
    }

    #[test]
    fn int_and_equal_float_share_a_signature() {
        assert_eq!(KeySig::of(&Value::Int(2)), KeySig::of(&Value::Float(2.0)));
    }
}
