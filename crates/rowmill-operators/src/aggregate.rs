//! Reducers that fold a group of rows into one synthetic record.

use std::sync::Arc;

use rowmill_core::prelude::*;

pub type Reducer = Arc<dyn Fn(&[Row]) -> Value + Send + Sync>;

/// Named reducers applied per group; output fields appear in insertion
/// order.
#[derive(Clone, Default)]
pub struct Aggregations {
    entries: Vec<(String, Reducer)>,
}

impl Aggregations {
    pub fn new() -> Aggregations {
        Aggregations::default()
    }

    pub fn with(mut self, name: impl Into<String>, reducer: Reducer) -> Aggregations {
        self.entries.push((name.into(), reducer));
        self
    }

    pub fn with_fn(
        self,
        name: impl Into<String>,
        f: impl Fn(&[Row]) -> Value + Send + Sync + 'static,
    ) -> Aggregations {
        self.with(name, Arc::new(f))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One synthetic record summarizing `rows`.
    pub fn apply(&self, rows: &[Row]) -> Row {
        let mut record = Record::new();
        for (name, reducer) in &self.entries {
            record.insert(name.clone(), reducer(rows));
        }
        Value::Record(record)
    }
}

pub fn count() -> Reducer {
    Arc::new(|rows| Value::Int(rows.len() as i64))
}

/// Numeric sum over a field path; non-numeric values are ignored.
pub fn sum(path: &str) -> Reducer {
    let path = path.to_string();
    Arc::new(move |rows| {
        let mut int_total: i64 = 0;
        let mut float_total: f64 = 0.0;
        let mut saw_float = false;
        for row in rows {
            match row.get_path(&path) {
                Value::Int(i) => int_total += i,
                Value::Float(f) => {
                    saw_float = true;
                    float_total += f;
                }
                _ => {}
            }
        }
        if saw_float {
            Value::Float(float_total + int_total as f64)
        } else {
            Value::Int(int_total)
        }
    })
}

/// Mean over a field path; `Null` when no numeric values are present.
pub fn avg(path: &str) -> Reducer {
    let path = path.to_string();
    Arc::new(move |rows| {
        let mut total = 0.0;
        let mut n = 0usize;
        for row in rows {
            match row.get_path(&path) {
                Value::Int(i) => {
                    total += i as f64;
                    n += 1;
                }
                Value::Float(f) => {
                    total += f;
                    n += 1;
                }
                _ => {}
            }
        }
        if n == 0 {
            Value::Null
        } else {
            Value::Float(total / n as f64)
        }
    })
}

/// Smallest non-null value over a field path.
pub fn min(path: &str) -> Reducer {
    extremum(path, std::cmp::Ordering::Less)
}

/// Largest non-null value over a field path.
pub fn max(path: &str) -> Reducer {
    extremum(path, std::cmp::Ordering::Greater)
}

fn extremum(path: &str, keep: std::cmp::Ordering) -> Reducer {
    let path = path.to_string();
    Arc::new(move |rows| {
        let mut best: Option<Value> = None;
        for row in rows {
            let v = row.get_path(&path);
            if v.is_null() {
                continue;
            }
            best = match best {
                None => Some(v),
                Some(current) => {
                    if value_cmp(&v, &current) == keep {
                        Some(v)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.unwrap_or(Value::Null)
    })
}

/// First row's value at a field path.
pub fn first(path: &str) -> Reducer {
    let path = path.to_string();
    Arc::new(move |rows| match rows.first() {
        Some(row) => row.get_path(&path),
        None => Value::Null,
    })
}
