//! Join engine: loop/hash equivalence, join types, mapper modes,
//! configuration errors.

use std::str::FromStr;

use rowmill::{
    compile, join, Algorithm, Error, JoinSpec, JoinType, KeySig, MapOut, Matcher, PairMap, Row,
    Value,
};
use serde_json::json;

fn rows(v: serde_json::Value) -> Vec<Row> {
    rowmill::rows_from_json(v)
}

fn left_rows() -> Vec<Row> {
    rows(json!([{"id": 1, "v": "a"}, {"id": 2, "v": "b"}]))
}

fn right_rows() -> Vec<Row> {
    rows(json!([{"id": 2, "w": "x"}, {"id": 3, "w": "y"}]))
}

fn sorted_sigs(rows: &[Row]) -> Vec<String> {
    let mut sigs: Vec<String> = rows.iter().map(|r| KeySig::of(r).as_str().to_string()).collect();
    sigs.sort();
    sigs
}

#[test]
fn inner_join_on_id_yields_the_matched_row() {
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id").unwrap());
    let out = join(left_rows(), &right_rows(), &spec).unwrap();
    assert_eq!(out, rows(json!([{"id": 2, "w": "x", "v": "b"}])));
}

#[test]
fn full_join_keeps_both_unmatched_sides() {
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id").unwrap())
        .with_join_type(JoinType::Full);
    let out = join(left_rows(), &right_rows(), &spec).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(
        sorted_sigs(&out),
        sorted_sigs(&rows(json!([
            {"id": 2, "v": "b", "w": "x"},
            {"id": 1, "v": "a"},
            {"id": 3, "w": "y"},
        ])))
    );
}

#[test]
fn loop_and_hash_agree_for_compilable_matchers() {
    let matcher = || Matcher::text("(l, r) => l.id == r.id").unwrap();
    for join_type in [JoinType::Inner, JoinType::Left, JoinType::Right, JoinType::Full] {
        let looped = join(
            left_rows(),
            &right_rows(),
            &JoinSpec::new(matcher())
                .with_join_type(join_type)
                .with_algorithm(Algorithm::Loop),
        )
        .unwrap();
        let hashed = join(
            left_rows(),
            &right_rows(),
            &JoinSpec::new(matcher())
                .with_join_type(join_type)
                .with_algorithm(Algorithm::Hash),
        )
        .unwrap();
        assert_eq!(sorted_sigs(&looped), sorted_sigs(&hashed), "{join_type}");
    }
}

#[test]
fn predicate_matchers_fall_back_to_the_loop_algorithm() {
    let spec = JoinSpec::new(Matcher::func(|l, r| l.get("id") == r.get("id")));
    assert!(compile(&spec.matcher).is_none());
    let out = join(left_rows(), &right_rows(), &spec).unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn forcing_hash_without_a_decomposable_matcher_is_an_error() {
    let spec = JoinSpec::new(Matcher::func(|l, r| l.get("id") == r.get("id")))
        .with_algorithm(Algorithm::Hash);
    let err = join(left_rows(), &right_rows(), &spec).unwrap_err();
    assert!(matches!(err, Error::Matcher(_)));
}

#[test]
fn explicit_keys_enable_hash_joins_for_predicate_matchers() {
    let spec = JoinSpec::new(Matcher::func(|l, r| l.get("id") == r.get("id")))
        .with_algorithm(Algorithm::Hash)
        .with_keys(
            std::sync::Arc::new(|r: &Row| r.get("id")),
            std::sync::Arc::new(|r: &Row| r.get("id")),
        );
    let out = join(left_rows(), &right_rows(), &spec).unwrap();
    assert_eq!(out, rows(json!([{"id": 2, "w": "x", "v": "b"}])));
}

#[test]
fn hash_join_revalidates_candidate_pairs_with_the_original_matcher() {
    // Same key signature on both sides, but the matcher itself never holds:
    // the join must not produce false positives from bucket collisions.
    let spec = JoinSpec::new(Matcher::func(|_, _| false)).with_keys(
        std::sync::Arc::new(|r: &Row| r.get("id")),
        std::sync::Arc::new(|r: &Row| r.get("id")),
    );
    let spec = spec.with_algorithm(Algorithm::Hash);
    let out = join(
        rows(json!([{"id": 1, "v": "a"}])),
        &rows(json!([{"id": 1, "w": "x"}])),
        &spec,
    )
    .unwrap();
    assert!(out.is_empty());
}

#[test]
fn mapper_mode_left_keeps_only_left_fields() {
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id").unwrap())
        .with_map(PairMap::parse("left null").unwrap());
    let out = join(left_rows(), &right_rows(), &spec).unwrap();
    assert_eq!(out, rows(json!([{"id": 2, "v": "b"}])));
}

#[test]
fn mapper_mode_thob_lets_the_right_side_win() {
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id").unwrap())
        .with_map(PairMap::parse("thob null").unwrap());
    let out = join(
        rows(json!([{"id": 1, "v": "left"}])),
        &rows(json!([{"id": 1, "v": "right"}])),
        &spec,
    )
    .unwrap();
    assert_eq!(out, rows(json!([{"id": 1, "v": "right"}])));
}

#[test]
fn mapper_mode_stack_keeps_the_pair_as_a_list() {
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id").unwrap())
        .with_map(PairMap::parse("stack null").unwrap());
    let out = join(
        rows(json!([{"id": 1, "v": "a"}])),
        &rows(json!([{"id": 1, "w": "x"}])),
        &spec,
    )
    .unwrap();
    assert_eq!(
        out,
        vec![Value::List(vec![
            Value::from(json!({"id": 1, "v": "a"})),
            Value::from(json!({"id": 1, "w": "x"})),
        ])]
    );
}

#[test]
fn two_letter_abbreviations_expand_to_keyword_pairs() {
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id").unwrap())
        .with_map(PairMap::parse("bn").unwrap())
        .with_join_type(JoinType::Full);
    let out = join(left_rows(), &right_rows(), &spec).unwrap();
    // matched row maps via `both`, unmatched singles are suppressed by `null`
    assert_eq!(out, rows(json!([{"id": 2, "w": "x", "v": "b"}])));
}

#[test]
fn function_mappers_can_emit_many_rows_per_pair() {
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id").unwrap()).with_map(
        PairMap::func(|l, r| match (l, r) {
            (Some(l), Some(r)) => MapOut::Many(vec![l.clone(), r.clone()]),
            _ => MapOut::None,
        }),
    );
    let out = join(left_rows(), &right_rows(), &spec).unwrap();
    assert_eq!(out.len(), 2);
}

#[test]
fn unknown_keywords_are_configuration_errors() {
    assert!(matches!(PairMap::parse("both sideways"), Err(Error::Config(_))));
    assert!(matches!(PairMap::parse("zz"), Err(Error::Config(_))));
    assert!(matches!(JoinType::from_str("outer"), Err(Error::Config(_))));
    assert!(matches!(Algorithm::from_str("nested"), Err(Error::Config(_))));
}

#[test]
fn text_matchers_reject_unsupported_shapes() {
    assert!(matches!(
        Matcher::text("(l, r) => l.id != r.id"),
        Err(Error::Matcher(_))
    ));
    assert!(matches!(
        Matcher::text("(l, r) => l.id == r.id || l.v == r.w"),
        Err(Error::Matcher(_))
    ));
    assert!(matches!(
        Matcher::text("(l, l) => l.id == l.id"),
        Err(Error::Config(_))
    ));
}

#[test]
fn multi_clause_text_matchers_join_on_every_field() {
    let left = rows(json!([
        {"id": 1, "grp": "a", "v": 1},
        {"id": 1, "grp": "b", "v": 2},
    ]));
    let right = rows(json!([
        {"id": 1, "grp": "b", "w": 9},
    ]));
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id && l.grp = r.grp").unwrap());
    let out = join(left, &right, &spec).unwrap();
    assert_eq!(out, rows(json!([{"id": 1, "grp": "b", "w": 9, "v": 2}])));
}

#[test]
fn hash_distinct_keeps_one_row_per_key_per_side() {
    let left = rows(json!([
        {"id": 1, "v": "first"},
        {"id": 1, "v": "second"},
    ]));
    let right = rows(json!([{"id": 1, "w": "x"}]));
    let spec = JoinSpec::new(Matcher::text("(l, r) => l.id == r.id").unwrap())
        .with_algorithm(Algorithm::HashDistinct);
    let out = join(left, &right, &spec).unwrap();
    assert_eq!(out, rows(json!([{"id": 1, "w": "x", "v": "first"}])));
}
