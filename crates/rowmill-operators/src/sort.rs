//! Selector-driven comparator sort.

use std::cmp::Ordering;

use rowmill_core::prelude::*;

/// Sort keys for one row: a `List` selector result is a positional key
/// list, anything else is a single key.
fn sort_keys(v: Value) -> Vec<Value> {
    match v {
        Value::List(keys) => keys,
        single => vec![single],
    }
}

/// Positional comparison of two key lists: the first differing index
/// decides; a missing trailing key sorts before any present key.
pub fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    let longest = a.len().max(b.len());
    for i in 0..longest {
        match (a.get(i), b.get(i)) {
            (None, None) => {}
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match value_cmp(x, y) {
                Ordering::Equal => {}
                other => return other,
            },
        }
    }
    Ordering::Equal
}

/// Recursive partition sort: pivot is the last element of the remaining
/// slice, two-way partition (strictly-less to the left). Not stable, and
/// quadratic on adversarial input, but correct for arbitrary comparator
/// results including ties.
pub fn quick_sort<F>(mut rows: Vec<Row>, order: &F) -> Vec<Row>
where
    F: Fn(&Row) -> Value + ?Sized,
{
    let Some(pivot) = rows.pop() else {
        return rows;
    };
    if rows.is_empty() {
        return vec![pivot];
    }

    let pivot_keys = sort_keys(order(&pivot));
    let mut less = Vec::new();
    let mut rest = Vec::new();
    for row in rows {
        if compare_keys(&sort_keys(order(&row)), &pivot_keys) == Ordering::Less {
            less.push(row);
        } else {
            rest.push(row);
        }
    }

    let mut out = quick_sort(less, order);
    out.push(pivot);
    out.extend(quick_sort(rest, order));
    out
}
