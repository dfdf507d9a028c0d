//! Textual matcher layer.
//!
//! Parses matcher source of the shape
//! `"(l, r) => l.id == r.id && l.grp = r.grp"` into a [`MatchExpr`].
//! Accepted: `=` or `==` per clause, `&&` or `&` between clauses, dotted
//! field paths rooted at either declared parameter (a bare parameter means
//! the whole row). Anything else (inequalities, disjunction, arithmetic,
//! calls) fails the parse.

use rowmill_core::prelude::*;

use crate::{FieldPath, MatchExpr};

pub(crate) fn parse(src: &str) -> Result<MatchExpr> {
    let (params, body) = src
        .split_once("=>")
        .ok_or_else(|| unparseable(src, "missing '=>'"))?;

    let (left_var, right_var) = parse_params(params)?;

    if body.contains('|') {
        return Err(unparseable(src, "disjunction is not supported"));
    }

    let mut terms = Vec::new();
    for clause in body.replace("&&", "&").split('&') {
        terms.push(parse_clause(clause, &left_var, &right_var, src)?);
    }
    if terms.len() == 1 {
        return Ok(terms.remove(0));
    }
    Ok(MatchExpr::All(terms))
}

/// Declared parameter identifiers, e.g. `"(l, r)"` or `"l, r"`. The two
/// names must be present, well-formed, and distinct; this is checked before
/// any data is processed.
fn parse_params(params: &str) -> Result<(String, String)> {
    let trimmed = params
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    let names: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if names.len() != 2 {
        return Err(Error::Config(format!(
            "matcher must declare exactly two parameters, got '{}'",
            params.trim()
        )));
    }
    for name in &names {
        if !is_identifier(name) {
            return Err(Error::Config(format!(
                "matcher parameter '{name}' is not a valid identifier"
            )));
        }
    }
    if names[0] == names[1] {
        return Err(Error::Config(format!(
            "matcher parameters must be distinct, got '{}' twice",
            names[0]
        )));
    }
    Ok((names[0].to_string(), names[1].to_string()))
}

fn parse_clause(
    clause: &str,
    left_var: &str,
    right_var: &str,
    src: &str,
) -> Result<MatchExpr> {
    let clause = clause.trim();
    if clause.contains("!=")
        || clause.contains('<')
        || clause.contains('>')
        || clause.contains('(')
    {
        return Err(unparseable(src, "only field equalities are supported"));
    }

    let (a, b) = match clause.split_once("==") {
        Some((a, b)) => (a, b),
        None => clause
            .split_once('=')
            .ok_or_else(|| unparseable(src, "clause has no equality"))?,
    };
    if b.contains('=') {
        return Err(unparseable(src, "clause has more than one equality"));
    }

    let first = parse_side(a, src)?;
    let second = parse_side(b, src)?;

    // Each clause references exactly one path per side, in either order.
    match (first, second) {
        ((root_a, path_a), (root_b, path_b))
            if root_a == left_var && root_b == right_var =>
        {
            Ok(MatchExpr::Eq(path_a, path_b))
        }
        ((root_a, path_a), (root_b, path_b))
            if root_a == right_var && root_b == left_var =>
        {
            Ok(MatchExpr::Eq(path_b, path_a))
        }
        ((root_a, _), (root_b, _)) => Err(unparseable(
            src,
            &format!("clause must reference both sides, found '{root_a}' and '{root_b}'"),
        )),
    }
}

/// One side of a clause: a dotted path whose first segment is a declared
/// parameter. Returns the root and the path relative to the row.
fn parse_side(side: &str, src: &str) -> Result<(String, FieldPath)> {
    let segments: Vec<&str> = side.trim().split('.').map(str::trim).collect();
    if segments.is_empty() || segments.iter().any(|s| !is_identifier(s)) {
        return Err(unparseable(src, &format!("'{}' is not a field path", side.trim())));
    }
    let root = segments[0].to_string();
    let path = FieldPath::new(segments[1..].iter().map(|s| s.to_string()).collect());
    Ok((root, path))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn unparseable(src: &str, why: &str) -> Error {
    Error::Matcher(format!(
        "matcher text '{}' could not be parsed into paired key selectors: {why}",
        src.trim()
    ))
}
