//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Revalidate the group-level/nesting invariant after every pipeline step.
    pub strict_shapes: bool,

    /// Whether an `Auto` join hint attempts matcher compilation before
    /// falling back to the loop algorithm.
    pub prefer_hash_joins: bool,

    /// Row cap applied by the render layer before truncating output.
    pub render_max_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_shapes: true,
            prefer_hash_joins: true,
            render_max_rows: 40,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `ROWMILL_STRICT_SHAPES`: bool
    /// - `ROWMILL_PREFER_HASH_JOINS`: bool
    /// - `ROWMILL_RENDER_MAX_ROWS`: usize
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("ROWMILL_STRICT_SHAPES") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.strict_shapes = v;
            }
        }

        if let Ok(s) = std::env::var("ROWMILL_PREFER_HASH_JOINS") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.prefer_hash_joins = v;
            }
        }

        if let Ok(s) = std::env::var("ROWMILL_RENDER_MAX_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.render_max_rows = v;
            }
        }

        cfg
    }
}
