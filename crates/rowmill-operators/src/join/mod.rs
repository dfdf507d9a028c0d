//! Join vocabulary and dispatch.
//!
//! Two algorithms (loop and hash) share one mapper vocabulary and one
//! unmatched-emission rule driven by [`JoinType`]. The reconciliation merge
//! lives in [`reconcile`].

mod hash_join;
mod loop_join;
pub mod reconcile;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rowmill_core::prelude::*;
use rowmill_expr::{compile, KeyFn, Matcher};

/// Which unmatched sides survive the join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub(crate) fn keeps_left(self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    pub(crate) fn keeps_right(self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "inner"),
            JoinType::Left => write!(f, "left"),
            JoinType::Right => write!(f, "right"),
            JoinType::Full => write!(f, "full"),
        }
    }
}

impl FromStr for JoinType {
    type Err = Error;

    fn from_str(s: &str) -> Result<JoinType> {
        match s {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "full" => Ok(JoinType::Full),
            other => Err(Error::Config(format!(
                "join type '{other}' is not recognized; use one of: inner, left, right, full"
            ))),
        }
    }
}

/// Algorithm hint. `Auto` compiles the matcher when it can and falls back
/// to the loop algorithm; forcing `Hash` on a non-decomposable matcher is
/// an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    #[default]
    Auto,
    Loop,
    Hash,
    /// Hash join over distinct-mode bucket indexes: only the first row per
    /// key signature participates on each side.
    HashDistinct,
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Algorithm> {
        match s {
            "auto" => Ok(Algorithm::Auto),
            "loop" => Ok(Algorithm::Loop),
            "hash" => Ok(Algorithm::Hash),
            "hashDistinct" | "hash_distinct" => Ok(Algorithm::HashDistinct),
            other => Err(Error::Config(format!(
                "join algorithm '{other}' is not recognized; use one of: auto, loop, hash, hashDistinct"
            ))),
        }
    }
}

/// What one mapper mode does with a pair (or a lone side).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapMode {
    /// Right fields overlaid by left.
    Both,
    /// "This overrides both": left fields overlaid by right.
    Thob,
    Left,
    Right,
    /// Suppress the output row.
    Null,
    /// Keep the pair as a two-element list.
    Stack,
}

impl MapMode {
    fn parse_word(word: &str) -> Result<MapMode> {
        match word {
            "both" => Ok(MapMode::Both),
            "thob" => Ok(MapMode::Thob),
            "left" => Ok(MapMode::Left),
            "right" => Ok(MapMode::Right),
            "null" => Ok(MapMode::Null),
            "stack" => Ok(MapMode::Stack),
            other => Err(Error::Config(format!(
                "mapper keyword '{other}' must be one of: both, thob, left, right, null, stack"
            ))),
        }
    }

    fn parse_letter(letter: char) -> Result<MapMode> {
        match letter {
            'b' => Ok(MapMode::Both),
            't' => Ok(MapMode::Thob),
            'l' => Ok(MapMode::Left),
            'r' => Ok(MapMode::Right),
            'n' => Ok(MapMode::Null),
            's' => Ok(MapMode::Stack),
            other => Err(Error::Config(format!(
                "mapper abbreviation '{other}' must be one of: b, t, l, r, n, s"
            ))),
        }
    }
}

/// Mapper output: zero, one, or many rows per pair.
pub enum MapOut {
    None,
    One(Row),
    Many(Vec<Row>),
}

/// Produces output rows from a matched pair or a lone unmatched side.
#[derive(Clone)]
pub enum PairMap {
    Modes { matched: MapMode, unmatched: MapMode },
    Func(Arc<dyn Fn(Option<&Row>, Option<&Row>) -> MapOut + Send + Sync>),
}

impl Default for PairMap {
    fn default() -> Self {
        PairMap::Modes {
            matched: MapMode::Both,
            unmatched: MapMode::Both,
        }
    }
}

impl PairMap {
    /// Parse a keyword pair (`"both null"`) or a two-letter abbreviation
    /// (`"bn"`); the first word applies to matched pairs, the second to
    /// unmatched singles.
    pub fn parse(spec: &str) -> Result<PairMap> {
        let words: Vec<&str> = spec.split_whitespace().collect();
        let (matched, unmatched) = match words.as_slice() {
            [pair] if pair.chars().count() == 2 => {
                let mut letters = pair.chars();
                let m = MapMode::parse_letter(letters.next().unwrap_or(' '))?;
                let u = MapMode::parse_letter(letters.next().unwrap_or(' '))?;
                (m, u)
            }
            [m, u] => (MapMode::parse_word(m)?, MapMode::parse_word(u)?),
            _ => {
                return Err(Error::Config(format!(
                    "mapper spec '{spec}' must be two keywords or a two-letter abbreviation"
                )))
            }
        };
        Ok(PairMap::Modes { matched, unmatched })
    }

    pub fn func(
        f: impl Fn(Option<&Row>, Option<&Row>) -> MapOut + Send + Sync + 'static,
    ) -> PairMap {
        PairMap::Func(Arc::new(f))
    }

    pub fn map(&self, left: Option<&Row>, right: Option<&Row>) -> MapOut {
        match self {
            PairMap::Modes { matched, unmatched } => match (left, right) {
                (Some(l), Some(r)) => map_matched(*matched, l, r),
                _ => map_unmatched(*unmatched, left, right),
            },
            PairMap::Func(f) => f(left, right),
        }
    }
}

fn map_matched(mode: MapMode, left: &Row, right: &Row) -> MapOut {
    match mode {
        MapMode::Both => MapOut::One(overlay_rows(right, left)),
        MapMode::Thob => MapOut::One(overlay_rows(left, right)),
        MapMode::Left => MapOut::One(left.clone()),
        MapMode::Right => MapOut::One(right.clone()),
        MapMode::Null => MapOut::None,
        MapMode::Stack => MapOut::One(Value::List(vec![left.clone(), right.clone()])),
    }
}

fn map_unmatched(mode: MapMode, left: Option<&Row>, right: Option<&Row>) -> MapOut {
    let present = left.or(right);
    match mode {
        MapMode::Both | MapMode::Thob => match present {
            Some(row) => MapOut::One(row.clone()),
            None => MapOut::None,
        },
        MapMode::Left => match left {
            Some(row) => MapOut::One(row.clone()),
            None => MapOut::None,
        },
        MapMode::Right => match right {
            Some(row) => MapOut::One(row.clone()),
            None => MapOut::None,
        },
        MapMode::Null | MapMode::Stack => MapOut::None,
    }
}

/// Field union of two rows; non-record operands keep the base side.
fn overlay_rows(base: &Row, over: &Row) -> Row {
    match (base.as_record(), over.as_record()) {
        (Some(b), Some(o)) => Value::Record(b.overlay(o)),
        (Some(_), None) => base.clone(),
        (None, _) => over.clone(),
    }
}

pub(crate) fn emit(mapped: MapOut, out: &mut Vec<Row>) {
    match mapped {
        MapOut::None => {}
        MapOut::One(row) => out.push(row),
        MapOut::Many(rows) => out.extend(rows),
    }
}

/// Full configuration of one join call.
#[derive(Clone)]
pub struct JoinSpec {
    pub matcher: Matcher,
    pub pair_map: PairMap,
    pub join_type: JoinType,
    pub algorithm: Algorithm,
    /// Explicit per-side key selectors; these bypass matcher compilation
    /// for hash joins.
    pub keys: Option<(KeyFn, KeyFn)>,
}

impl JoinSpec {
    pub fn new(matcher: Matcher) -> JoinSpec {
        JoinSpec {
            matcher,
            pair_map: PairMap::default(),
            join_type: JoinType::Inner,
            algorithm: Algorithm::Auto,
            keys: None,
        }
    }

    pub fn with_map(mut self, pair_map: PairMap) -> JoinSpec {
        self.pair_map = pair_map;
        self
    }

    pub fn with_join_type(mut self, join_type: JoinType) -> JoinSpec {
        self.join_type = join_type;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> JoinSpec {
        self.algorithm = algorithm;
        self
    }

    pub fn with_keys(mut self, left: KeyFn, right: KeyFn) -> JoinSpec {
        self.keys = Some((left, right));
        self
    }
}

/// Join two flat row sequences per `spec`.
pub fn join(left: Vec<Row>, right: &[Row], spec: &JoinSpec) -> Result<Vec<Row>> {
    let selectors = || {
        spec.keys
            .clone()
            .or_else(|| compile(&spec.matcher).map(|p| (p.left, p.right)))
    };

    match spec.algorithm {
        Algorithm::Loop => {
            let mut out = Vec::new();
            loop_join::run(
                &left,
                right,
                &spec.matcher,
                &spec.pair_map,
                spec.join_type,
                &mut out,
            );
            Ok(out)
        }
        Algorithm::Hash | Algorithm::HashDistinct => match selectors() {
            Some((lkey, rkey)) => Ok(hash_join::run(
                left,
                right.to_vec(),
                &spec.matcher,
                &spec.pair_map,
                spec.join_type,
                &lkey,
                &rkey,
                spec.algorithm == Algorithm::HashDistinct,
            )),
            None => Err(Error::Matcher(
                "hash join was forced but the matcher could not be decomposed \
                 into paired key selectors"
                    .into(),
            )),
        },
        Algorithm::Auto => match selectors() {
            Some((lkey, rkey)) => {
                tracing::debug!(join_type = %spec.join_type, "hash join selected");
                Ok(hash_join::run(
                    left,
                    right.to_vec(),
                    &spec.matcher,
                    &spec.pair_map,
                    spec.join_type,
                    &lkey,
                    &rkey,
                    false,
                ))
            }
            None => {
                tracing::debug!(
                    join_type = %spec.join_type,
                    "matcher is not decomposable, using loop join"
                );
                let mut out = Vec::new();
                loop_join::run(
                    &left,
                    right,
                    &spec.matcher,
                    &spec.pair_map,
                    spec.join_type,
                    &mut out,
                );
                Ok(out)
            }
        },
    }
}
