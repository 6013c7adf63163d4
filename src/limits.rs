//! Processing limits to mitigate malicious or malformed input.

/// Maximum depth of the evaluator's call stack.
///
/// Mixin includes, function calls, and `@content` invocations all push a
/// frame; exceeding the limit aborts the compilation with a recursion-limit
/// error rather than overflowing the process stack.
pub const MAX_CALL_DEPTH: usize = 512;

/// Maximum nesting depth the parsers accept.
///
/// Applies to blocks, parenthesized expressions, and selector arguments of
/// pseudo-classes alike.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Above this many complex selectors in a single list, the post-extension
/// `trim` pass is skipped; it is quadratic in the list length.
pub const MAX_TRIM_SELECTORS: usize = 100;
