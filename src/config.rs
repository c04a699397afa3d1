/// Cells at this depth stop subdividing.
pub const DEFAULT_MAX_DEPTH: u32 = 32;

/// Runtime knobs of a tree. Fixed once the tree is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Depth (root = 0) at which a full cell spills into an unbounded overflow bucket instead of
    /// creating children. Keeps insertion finite when many points share the same coordinates.
    pub max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}
