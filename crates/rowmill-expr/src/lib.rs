#![forbid(unsafe_code)]
//! rowmill-expr: equality matchers and the matcher→selector compiler.
//!
//! A matcher decides whether a left/right row pair should be joined. The
//! structured form (`MatchExpr`) is an explicit tree of field equalities
//! combined by conjunction, which the compiler can always decompose into
//! one key selector per side. Arbitrary predicates (`Matcher::func`) are
//! never decomposable and force the loop join. The textual form
//! (`Matcher::text`) is a best-effort convenience layer over the structured
//! form, not a general predicate parser.

mod text;

use std::fmt;
use std::sync::Arc;

use rowmill_core::prelude::*;

/// Arbitrary pairwise predicate.
pub type PredicateFn = Arc<dyn Fn(&Row, &Row) -> bool + Send + Sync>;

/// Single-row key selector; the selector's output is canonicalized into a
/// `KeySig` wherever equality-by-value is needed.
pub type KeyFn = Arc<dyn Fn(&Row) -> Value + Send + Sync>;

/// Dotted field path rooted at one side of a pair. An empty path denotes
/// the whole row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new(segments: Vec<String>) -> FieldPath {
        FieldPath(segments)
    }

    pub fn parse(path: &str) -> FieldPath {
        if path.is_empty() {
            return FieldPath(Vec::new());
        }
        FieldPath(path.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn resolve(&self, row: &Row) -> Value {
        row.get_at(&self.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Conjunction tree of field equalities between a left and a right row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchExpr {
    /// `left.path == right.path`
    Eq(FieldPath, FieldPath),
    /// Every child must hold.
    All(Vec<MatchExpr>),
}

impl MatchExpr {
    /// Equality of one dotted field path per side.
    pub fn eq(left: &str, right: &str) -> MatchExpr {
        MatchExpr::Eq(FieldPath::parse(left), FieldPath::parse(right))
    }

    /// Conjunction, flattening nested `All` nodes.
    pub fn and(self, other: MatchExpr) -> MatchExpr {
        let mut terms = match self {
            MatchExpr::All(terms) => terms,
            leaf => vec![leaf],
        };
        match other {
            MatchExpr::All(more) => terms.extend(more),
            leaf => terms.push(leaf),
        }
        MatchExpr::All(terms)
    }

    pub fn matches(&self, left: &Row, right: &Row) -> bool {
        match self {
            MatchExpr::Eq(lp, rp) => value_eq(&lp.resolve(left), &rp.resolve(right)),
            MatchExpr::All(terms) => terms.iter().all(|t| t.matches(left, right)),
        }
    }

    /// All `Eq` clauses in declaration order.
    fn clauses(&self, out: &mut Vec<(FieldPath, FieldPath)>) {
        match self {
            MatchExpr::Eq(lp, rp) => out.push((lp.clone(), rp.clone())),
            MatchExpr::All(terms) => {
                for t in terms {
                    t.clauses(out);
                }
            }
        }
    }
}

/// Engine-facing matcher: a decomposable equality tree or an arbitrary
/// predicate closure.
#[derive(Clone)]
pub enum Matcher {
    Expr(MatchExpr),
    Func(PredicateFn),
}

impl Matcher {
    pub fn expr(expr: MatchExpr) -> Matcher {
        Matcher::Expr(expr)
    }

    /// Best-effort textual layer: parses matcher source of the shape
    /// `"(l, r) => l.id == r.id && l.a = r.a"`. Any clause outside the
    /// conjunction-of-field-equalities shape is a construction-time error,
    /// since arbitrary predicate text cannot be evaluated later.
    pub fn text(src: &str) -> Result<Matcher> {
        Ok(Matcher::Expr(text::parse(src)?))
    }

    pub fn func(f: impl Fn(&Row, &Row) -> bool + Send + Sync + 'static) -> Matcher {
        Matcher::Func(Arc::new(f))
    }

    pub fn matches(&self, left: &Row, right: &Row) -> bool {
        match self {
            Matcher::Expr(e) => e.matches(left, right),
            Matcher::Func(f) => f(left, right),
        }
    }
}

/// Positionally aligned per-side key selectors: equal extracted tuples (by
/// `KeySig`) imply the original predicate may hold.
pub struct PairedSelectors {
    pub left: KeyFn,
    pub right: KeyFn,
}

/// Decompose a matcher into per-side key selectors, or `None` when the
/// matcher is an arbitrary predicate. Callers fall back to the loop
/// algorithm on `None`.
pub fn compile(matcher: &Matcher) -> Option<PairedSelectors> {
    match matcher {
        Matcher::Expr(expr) => {
            let mut clauses = Vec::new();
            expr.clauses(&mut clauses);
            let (lefts, rights): (Vec<FieldPath>, Vec<FieldPath>) = clauses.into_iter().unzip();
            Some(PairedSelectors {
                left: tuple_selector(lefts),
                right: tuple_selector(rights),
            })
        }
        Matcher::Func(_) => None,
    }
}

fn tuple_selector(paths: Vec<FieldPath>) -> KeyFn {
    Arc::new(move |row| Value::List(paths.iter().map(|p| p.resolve(row)).collect()))
}
