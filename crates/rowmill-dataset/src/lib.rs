#![forbid(unsafe_code)]
//! rowmill-dataset: group-level-tagged datasets and the recursive traversal
//! that lifts flat record operations to any nesting depth.
//!
//! Every record-level operation is written once, as a function from a flat
//! row sequence to a flat row sequence; `descend` applies it at the base
//! level of an arbitrarily nested dataset. `group` adds one nesting level,
//! `ungroup` removes one, everything else preserves the level.

use rowmill_core::prelude::*;
use rowmill_operators::{join, quick_sort, reconcile, Aggregations, BucketIndex, JoinSpec, MergeMode};

/// The recursive data union. The group level is tracked separately on
/// [`Dataset`] and redundantly checked against this shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// A single summarized row (group level 0).
    Unit(Row),
    /// A flat sequence of rows (group level 1).
    Flat(Vec<Row>),
    /// One extra level of grouping per wrap (group level ≥ 2).
    Nested(Vec<Data>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Data,
    group_level: usize,
}

impl Dataset {
    /// A flat, ungrouped dataset (group level 1).
    pub fn from_rows(rows: Vec<Row>) -> Dataset {
        Dataset {
            data: Data::Flat(rows),
            group_level: 1,
        }
    }

    pub fn from_json(v: serde_json::Value) -> Dataset {
        Dataset::from_rows(rows_from_json(v))
    }

    /// Build from parts, verifying that the nesting matches the level.
    pub fn new(data: Data, group_level: usize) -> Result<Dataset> {
        let ds = Dataset { data, group_level };
        ds.validate()?;
        Ok(ds)
    }

    pub fn group_level(&self) -> usize {
        self.group_level
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Redundant shape check: the level tag must agree with the nesting.
    pub fn validate(&self) -> Result<()> {
        check_shape(&self.data, self.group_level)
    }

    /// Apply a flat-sequence operation at the base level.
    fn lift(self, op: &dyn Fn(Vec<Row>) -> Result<Vec<Row>>) -> Result<Dataset> {
        let level = self.group_level;
        Ok(Dataset {
            data: descend(self.data, level, op)?,
            group_level: level,
        })
    }

    pub fn map(self, f: impl Fn(Row) -> Row) -> Result<Dataset> {
        self.lift(&|rows| Ok(rows.into_iter().map(&f).collect()))
    }

    pub fn filter(self, pred: impl Fn(&Row) -> bool) -> Result<Dataset> {
        self.lift(&|rows| Ok(rows.into_iter().filter(|r| pred(r)).collect()))
    }

    /// Sort base rows by a selector yielding one sort key or a key list.
    pub fn sort(self, order: impl Fn(&Row) -> Value) -> Result<Dataset> {
        self.lift(&|rows| Ok(quick_sort(rows, &order)))
    }

    /// Keep the first row per key signature, optionally ordering each
    /// bucket first so "first" is deterministic.
    pub fn distinct(
        self,
        key: Option<&dyn Fn(&Row) -> Value>,
        tiebreak: Option<&dyn Fn(&Row) -> Value>,
    ) -> Result<Dataset> {
        let identity = |row: &Row| row.clone();
        let key = key.unwrap_or(&identity);
        self.lift(&|rows| {
            let index = BucketIndex::build(rows, key, false);
            let mut out = Vec::new();
            for bucket in index.into_buckets() {
                let bucket = match tiebreak {
                    Some(order) => quick_sort(bucket, order),
                    None => bucket,
                };
                if let Some(first) = bucket.into_iter().next() {
                    out.push(first);
                }
            }
            Ok(out)
        })
    }

    /// Partition base rows into buckets; every bucket becomes one nested
    /// child. Group level rises by one.
    pub fn group(self, key: impl Fn(&Row) -> Value) -> Result<Dataset> {
        let level = self.group_level;
        if level == 0 {
            return Err(Error::Shape(
                "cannot group a single summarized record".into(),
            ));
        }
        let ds = Dataset {
            data: descend_group(self.data, level, &key)?,
            group_level: level + 1,
        };
        ds.validate()?;
        Ok(ds)
    }

    /// Remove one nesting level. At level 1 this collapses the dataset to a
    /// single record and requires exactly one row.
    pub fn ungroup(self, combiner: Option<&dyn Fn(Row) -> Row>) -> Result<Dataset> {
        match self.group_level {
            0 => Err(Error::Shape(
                "dataset is already a single summarized record".into(),
            )),
            1 => {
                let Data::Flat(rows) = self.data else {
                    return Err(Error::Shape(
                        "data nesting does not match group level 1".into(),
                    ));
                };
                let mut rows = rows.into_iter();
                let first = rows.next().ok_or_else(|| {
                    Error::Shape("cannot collapse an empty dataset to a single record".into())
                })?;
                if rows.next().is_some() {
                    return Err(Error::Shape(
                        "collapsing to a single record requires exactly one row in the dataset"
                            .into(),
                    ));
                }
                Ok(Dataset {
                    data: Data::Unit(first),
                    group_level: 0,
                })
            }
            level => {
                let identity = |row: Row| row;
                let combiner = combiner.unwrap_or(&identity);
                let ds = Dataset {
                    // stop one level above base records
                    data: descend_flatten(self.data, level - 1, combiner)?,
                    group_level: level - 1,
                };
                ds.validate()?;
                Ok(ds)
            }
        }
    }

    /// Collapse every group into one synthetic record, then remove the now
    /// redundant nesting level (a level-1 dataset reduces to a single
    /// record).
    pub fn reduce(self, aggregations: &Aggregations) -> Result<Dataset> {
        let level = self.group_level;
        let reduced = Dataset {
            data: descend(self.data, level, &|rows| Ok(vec![aggregations.apply(&rows)]))?,
            group_level: level,
        };
        if level >= 1 {
            reduced.ungroup(None)
        } else {
            Ok(reduced)
        }
    }

    /// Join base rows against a flat right side.
    pub fn join(self, right: &[Row], spec: &JoinSpec) -> Result<Dataset> {
        self.lift(&|rows| join(rows, right, spec))
    }

    /// Reconcile base rows against a source collection by identity key.
    pub fn reconcile(
        self,
        source: &[Row],
        target_key: &dyn Fn(&Row) -> Value,
        source_key: &dyn Fn(&Row) -> Value,
        mode: MergeMode,
    ) -> Result<Dataset> {
        self.lift(&|rows| Ok(reconcile(rows, source.to_vec(), target_key, source_key, mode)))
    }

    /// The underlying value: a single row at level 0, otherwise nested
    /// lists down to the base rows.
    pub fn into_value(self) -> Value {
        data_to_value(self.data)
    }

    /// Base rows of a level-1 dataset (or the sole record at level 0).
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self.data {
            Data::Unit(row) => Ok(vec![row]),
            Data::Flat(rows) => Ok(rows),
            Data::Nested(_) => Err(Error::Shape(format!(
                "dataset is still grouped at level {}; ungroup it before extracting rows",
                self.group_level
            ))),
        }
    }

    /// JSON snapshot carrying the data and its group level.
    pub fn to_json_string(&self) -> Result<String> {
        let value = serde_json::Value::from(data_to_value(self.data.clone()));
        let snapshot = serde_json::json!({
            "data": value,
            "groupLevel": self.group_level,
        });
        Ok(serde_json::to_string(&snapshot)?)
    }
}

fn check_shape(data: &Data, level: usize) -> Result<()> {
    match (data, level) {
        (Data::Unit(_), 0) => Ok(()),
        (Data::Flat(_), 1) => Ok(()),
        (Data::Nested(children), n) if n >= 2 => {
            for child in children {
                check_shape(child, n - 1)?;
            }
            Ok(())
        }
        (_, n) => Err(Error::Shape(format!(
            "data nesting does not match group level {n}"
        ))),
    }
}

/// Descend to the base level and apply `op` there.
///
/// A countdown of 0 treats the whole value as a single pseudo-record: `op`
/// sees a one-element sequence and must return exactly one row.
fn descend(
    data: Data,
    countdown: usize,
    op: &dyn Fn(Vec<Row>) -> Result<Vec<Row>>,
) -> Result<Data> {
    match countdown {
        0 => {
            let Data::Unit(row) = data else {
                return Err(Error::Shape(
                    "expected a single record at group level 0".into(),
                ));
            };
            let mut out = op(vec![row])?;
            if out.len() != 1 {
                return Err(Error::Shape(
                    "a level-0 operation must produce exactly one record".into(),
                ));
            }
            Ok(Data::Unit(out.remove(0)))
        }
        1 => {
            let Data::Flat(rows) = data else {
                return Err(Error::Shape(
                    "expected base records one level down".into(),
                ));
            };
            Ok(Data::Flat(op(rows)?))
        }
        _ => {
            let Data::Nested(children) = data else {
                return Err(Error::Shape(
                    "expected nested groups above the base level".into(),
                ));
            };
            let descended = children
                .into_iter()
                .map(|child| descend(child, countdown - 1, op))
                .collect::<Result<Vec<_>>>()?;
            Ok(Data::Nested(descended))
        }
    }
}

fn descend_group(
    data: Data,
    countdown: usize,
    key: &dyn Fn(&Row) -> Value,
) -> Result<Data> {
    if countdown == 1 {
        let Data::Flat(rows) = data else {
            return Err(Error::Shape(
                "expected base records one level down".into(),
            ));
        };
        let index = BucketIndex::build(rows, key, false);
        return Ok(Data::Nested(index.into_buckets().map(Data::Flat).collect()));
    }
    let Data::Nested(children) = data else {
        return Err(Error::Shape(
            "expected nested groups above the base level".into(),
        ));
    };
    let descended = children
        .into_iter()
        .map(|child| descend_group(child, countdown - 1, key))
        .collect::<Result<Vec<_>>>()?;
    Ok(Data::Nested(descended))
}

/// Flatten one nesting level at the node one step above base records.
fn descend_flatten(
    data: Data,
    countdown: usize,
    combiner: &dyn Fn(Row) -> Row,
) -> Result<Data> {
    let Data::Nested(children) = data else {
        return Err(Error::Shape(
            "expected nested groups above the base level".into(),
        ));
    };
    if countdown == 1 {
        let mut rows = Vec::new();
        for child in children {
            let Data::Flat(inner) = child else {
                return Err(Error::Shape(
                    "ungroup expected flat groups one level above base records".into(),
                ));
            };
            rows.extend(inner.into_iter().map(combiner));
        }
        return Ok(Data::Flat(rows));
    }
    let descended = children
        .into_iter()
        .map(|child| descend_flatten(child, countdown - 1, combiner))
        .collect::<Result<Vec<_>>>()?;
    Ok(Data::Nested(descended))
}

fn data_to_value(data: Data) -> Value {
    match data {
        Data::Unit(row) => row,
        Data::Flat(rows) => Value::List(rows),
        Data::Nested(children) => {
            Value::List(children.into_iter().map(data_to_value).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_raises_and_ungroup_restores_the_level() {
        let ds = Dataset::from_json(json!([
            {"grp": "a", "v": 1},
            {"grp": "b", "v": 2},
            {"grp": "a", "v": 3},
        ]));
        let grouped = ds.group(|r| r.get("grp")).unwrap();
        assert_eq!(grouped.group_level(), 2);
        let back = grouped.ungroup(None).unwrap();
        assert_eq!(back.group_level(), 1);
        assert_eq!(back.into_rows().unwrap().len(), 3);
    }

    #[test]
    fn level_zero_collapse_requires_exactly_one_row() {
        let ds = Dataset::from_json(json!([{"a": 1}, {"a": 2}]));
        let err = ds.ungroup(None).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn validate_rejects_mismatched_levels() {
        let ds = Dataset::new(Data::Flat(Vec::new()), 2);
        assert!(ds.is_err());
    }

    #[test]
    fn map_reaches_base_records_through_nesting() {
        let ds = Dataset::from_json(json!([
            {"grp": "a", "v": 1},
            {"grp": "a", "v": 2},
            {"grp": "b", "v": 3},
        ]));
        let doubled = ds
            .group(|r| r.get("grp"))
            .unwrap()
            .map(|row| {
                let mut rec = row.as_record().cloned().unwrap_or_default();
                if let Value::Int(v) = row.get("v") {
                    rec.insert("v", Value::Int(v * 2));
                }
                Value::Record(rec)
            })
            .unwrap()
            .ungroup(None)
            .unwrap();
        let rows = doubled.into_rows().unwrap();
        let doubled: Vec<Value> = rows.iter().map(|r| r.get("v")).collect();
        assert_eq!(
            doubled,
            vec![Value::Int(2), Value::Int(4), Value::Int(6)]
        );
    }
}
