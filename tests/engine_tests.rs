//! Engine-level properties: signatures, sort, distinct, grouping, reduce.

use rowmill::{
    aggregate, Aggregations, Dataset, Error, KeySig, Row, Value,
};
use serde_json::json;

fn rows(v: serde_json::Value) -> Vec<Row> {
    rowmill::rows_from_json(v)
}

fn field(rows: &[Row], name: &str) -> Vec<Value> {
    rows.iter().map(|r| r.get(name)).collect()
}

#[test]
fn signatures_ignore_field_insertion_order() {
    let a = Value::from(json!({"x": 1, "y": "q", "z": {"m": 2, "n": 3}}));
    let b = Value::from(json!({"z": {"n": 3, "m": 2}, "y": "q", "x": 1}));
    assert_eq!(KeySig::of(&a), KeySig::of(&b));
}

#[test]
fn signatures_distinguish_different_values() {
    let a = Value::from(json!({"x": 1}));
    let b = Value::from(json!({"x": "1x"}));
    assert_ne!(KeySig::of(&a), KeySig::of(&b));
}

#[test]
fn sort_orders_by_key_list_positionally() {
    let ds = Dataset::from_json(json!([
        {"a": 1, "b": 3},
        {"a": 1, "b": 2},
        {"a": 0, "b": 9},
    ]));
    let sorted = ds
        .sort(|r| Value::List(vec![r.get("a"), r.get("b")]))
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(
        field(&sorted, "b"),
        vec![Value::Int(9), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn sort_is_idempotent() {
    let ds = Dataset::from_json(json!([
        {"v": 5}, {"v": 1}, {"v": 3}, {"v": 3}, {"v": 2},
    ]));
    let once = ds.sort(|r| r.get("v")).unwrap().into_rows().unwrap();
    let twice = Dataset::from_rows(once.clone())
        .sort(|r| r.get("v"))
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(once, twice);
}

#[test]
fn distinct_is_idempotent() {
    let ds = Dataset::from_json(json!([
        {"k": 1, "v": "a"},
        {"k": 1, "v": "b"},
        {"k": 2, "v": "c"},
    ]));
    let key = |r: &Row| r.get("k");
    let once = ds.distinct(Some(&key), None).unwrap().into_rows().unwrap();
    let twice = Dataset::from_rows(once.clone())
        .distinct(Some(&key), None)
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(once.len(), 2);
    assert_eq!(once, twice);
}

#[test]
fn distinct_tiebreak_orders_each_bucket_before_picking() {
    let ds = Dataset::from_json(json!([
        {"k": 1, "v": 9},
        {"k": 1, "v": 2},
        {"k": 2, "v": 5},
    ]));
    let key = |r: &Row| r.get("k");
    let tiebreak = |r: &Row| r.get("v");
    let picked = ds
        .distinct(Some(&key), Some(&tiebreak))
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(field(&picked, "v"), vec![Value::Int(2), Value::Int(5)]);
}

#[test]
fn group_then_ungroup_restores_the_rows() {
    let original = rows(json!([
        {"grp": "a", "v": 1},
        {"grp": "b", "v": 2},
        {"grp": "a", "v": 3},
        {"grp": "c", "v": 4},
    ]));
    let ds = Dataset::from_rows(original.clone());
    let round_tripped = ds
        .group(|r| r.get("grp"))
        .unwrap()
        .ungroup(None)
        .unwrap();
    assert_eq!(round_tripped.group_level(), 1);
    let mut got = round_tripped.into_rows().unwrap();
    let mut expected = original;
    // set equality: grouping reorders rows by bucket
    let sig = |r: &Row| KeySig::of(r).as_str().to_string();
    got.sort_by_key(sig);
    expected.sort_by_key(sig);
    assert_eq!(got, expected);
}

#[test]
fn grouping_preserves_in_bucket_order() {
    let ds = Dataset::from_json(json!([
        {"grp": "a", "v": 1},
        {"grp": "b", "v": 2},
        {"grp": "a", "v": 3},
    ]));
    let flattened = ds
        .group(|r| r.get("grp"))
        .unwrap()
        .ungroup(None)
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(
        field(&flattened, "v"),
        vec![Value::Int(1), Value::Int(3), Value::Int(2)]
    );
}

#[test]
fn reduce_collapses_each_group_to_one_record() {
    let ds = Dataset::from_json(json!([
        {"grp": "a", "v": 1},
        {"grp": "a", "v": 3},
        {"grp": "b", "v": 10},
    ]));
    let aggs = Aggregations::new()
        .with("grp", aggregate::first("grp"))
        .with("total", aggregate::sum("v"))
        .with("n", aggregate::count());
    let reduced = ds
        .group(|r| r.get("grp"))
        .unwrap()
        .reduce(&aggs)
        .unwrap();
    assert_eq!(reduced.group_level(), 1);
    let rows = reduced.into_rows().unwrap();
    assert_eq!(field(&rows, "total"), vec![Value::Int(4), Value::Int(10)]);
    assert_eq!(field(&rows, "n"), vec![Value::Int(2), Value::Int(1)]);
}

#[test]
fn reduce_of_a_flat_dataset_yields_a_single_record() {
    let ds = Dataset::from_json(json!([{"v": 1}, {"v": 2}, {"v": 3}]));
    let aggs = Aggregations::new()
        .with("total", aggregate::sum("v"))
        .with("mean", aggregate::avg("v"));
    let reduced = ds.reduce(&aggs).unwrap();
    assert_eq!(reduced.group_level(), 0);
    let value = reduced.into_value();
    assert_eq!(value.get("total"), Value::Int(6));
    assert_eq!(value.get("mean"), Value::Float(2.0));
}

#[test]
fn min_max_skip_nulls() {
    let ds = Dataset::from_json(json!([{"v": 4}, {"x": 1}, {"v": 2}]));
    let aggs = Aggregations::new()
        .with("lo", aggregate::min("v"))
        .with("hi", aggregate::max("v"));
    let value = ds.reduce(&aggs).unwrap().into_value();
    assert_eq!(value.get("lo"), Value::Int(2));
    assert_eq!(value.get("hi"), Value::Int(4));
}

#[test]
fn collapsing_multiple_rows_to_a_single_record_is_a_shape_error() {
    let ds = Dataset::from_json(json!([{"a": 1}, {"a": 2}]));
    let err = ds.ungroup(None).unwrap_err();
    assert!(matches!(err, Error::Shape(_)));
}

#[test]
fn filter_descends_through_nested_groups() {
    let ds = Dataset::from_json(json!([
        {"grp": "a", "v": 1},
        {"grp": "a", "v": 2},
        {"grp": "b", "v": 3},
    ]));
    let kept = ds
        .group(|r| r.get("grp"))
        .unwrap()
        .filter(|r| matches!(r.get("v"), Value::Int(v) if v % 2 == 1))
        .unwrap()
        .ungroup(None)
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(field(&kept, "v"), vec![Value::Int(1), Value::Int(3)]);
}

#[test]
fn json_snapshot_carries_data_and_group_level() {
    let ds = Dataset::from_json(json!([{"a": 1}]));
    let snapshot = ds.to_json_string().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(parsed["groupLevel"], json!(1));
    assert_eq!(parsed["data"], json!([{"a": 1}]));
}
