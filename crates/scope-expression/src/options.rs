/// Default bound on expression nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options for `Parser`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Deepest tree the builder accepts before failing with a parse error.
    /// Unary operators, nested literals, call arguments and every `.x`,
    /// `[k]` or `(args)` link of a postfix chain each add one level.
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
