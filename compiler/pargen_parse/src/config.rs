//! Engine configuration.

/// Switches controlling optional engine behavior.
///
/// Every combination produces the same parse result for grammars
/// without upward jumps; the caches and the forward check only change
/// how much work is done to get there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Take upward jumps recorded by anchor entries.
    pub upwards_jumps: bool,
    /// Remember `(grammar, position)` pairs that failed.
    pub negative_cache: bool,
    /// Skip switch alternatives whose first-token set excludes the next
    /// token. Needs a table annotated by [`optimize`](crate::optimize).
    pub forward_optimization: bool,
    /// Variant used while no callback has selected one.
    pub default_variant: String,
    /// Initial value of the create-elements flag.
    pub create_elements: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            upwards_jumps: true,
            negative_cache: true,
            forward_optimization: true,
            default_variant: "default".to_string(),
            create_elements: true,
        }
    }
}
