//! Small shared types.

use std::borrow::Borrow;
use std::fmt;

/// A Sass identifier, normalized for lookup.
///
/// Sass treats `-` and `_` as equivalent in identifiers and ignores case, so
/// `$Foo_bar` and `$foo-bar` name the same variable.  The original spelling
/// is not kept; diagnostics print the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: &str) -> Ident {
        Ident(
            name.chars()
                .map(|c| match c {
                    '_' => '-',
                    c => c.to_ascii_lowercase(),
                })
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Ident {
        Ident::new(s)
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Ident {
        Ident::new(&s)
    }
}

impl Borrow<str> for Ident {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_underscores() {
        assert_eq!(Ident::new("Foo_Bar"), Ident::new("foo-bar"));
        assert_eq!(Ident::new("a_b-c").as_str(), "a-b-c");
    }
}
