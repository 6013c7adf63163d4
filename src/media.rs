//! CSS media queries: the model, a small parser, and query merging.
//!
//! Nested `@media` rules bubble outward during cssize; the inner rule's
//! query must be merged with the outer one so the emitted query matches
//! exactly the contexts both matched.

use codemap::Span;

use crate::error::SassResult;
use crate::scanner::Scanner;

/// One comma-separated alternative of a media query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssMediaQuery {
    /// `not` or `only`.
    pub modifier: Option<String>,
    /// The media type (`screen`, `print`, `all`), if given.
    pub media_type: Option<String>,
    /// Feature expressions, kept as text: `(min-width: 100px)`.
    pub features: Vec<String>,
}

impl CssMediaQuery {
    /// Whether this query matches all contexts (plain `all` with nothing
    /// else).
    pub fn matches_all(&self) -> bool {
        self.modifier.is_none()
            && self
                .media_type
                .as_deref()
                .map_or(true, |t| t.eq_ignore_ascii_case("all"))
            && self.features.is_empty()
    }

    fn type_or_all(&self) -> String {
        self.media_type
            .as_deref()
            .unwrap_or("all")
            .to_ascii_lowercase()
    }

    /// Merges two queries into the query matching exactly the contexts both
    /// match, or `None` when they are mutually exclusive.
    pub fn merge(&self, other: &CssMediaQuery) -> Option<CssMediaQuery> {
        let m1 = self.modifier.as_deref().map(str::to_ascii_lowercase);
        let m2 = other.modifier.as_deref().map(str::to_ascii_lowercase);
        let t1 = self.type_or_all();
        let t2 = other.type_or_all();

        let mut features = self.features.clone();
        for f in &other.features {
            if !features.contains(f) {
                features.push(f.clone());
            }
        }

        // `not` queries only combine with a matching counterpart.
        if m1.as_deref() == Some("not") || m2.as_deref() == Some("not") {
            if m1 == m2 {
                if t1 != t2 {
                    return None;
                }
                // not A and not A with extra features narrows to either; the
                // union of features over-restricts, so only identical
                // feature lists merge.
                if self.features != other.features {
                    return None;
                }
                return Some(self.clone());
            }
            // One negated, one plain: the plain one must name a different
            // type for the intersection to be expressible.
            let (negated, plain) = if m1.as_deref() == Some("not") {
                (self, other)
            } else {
                (other, self)
            };
            if negated.type_or_all() == plain.type_or_all() {
                return None;
            }
            return Some(plain.clone());
        }

        // `all` is the identity for types.
        let (media_type, modifier) = if t1 == "all" {
            (other.media_type.clone(), m2)
        } else if t2 == "all" {
            (self.media_type.clone(), m1)
        } else if t1 == t2 {
            (self.media_type.clone(), m1.or(m2))
        } else {
            return None;
        };

        Some(CssMediaQuery {
            modifier,
            media_type,
            features,
        })
    }

    pub fn to_css_string(&self) -> String {
        let mut out = String::new();
        if let Some(modifier) = &self.modifier {
            out.push_str(modifier);
            out.push(' ');
        }
        if let Some(media_type) = &self.media_type {
            out.push_str(media_type);
            if !self.features.is_empty() {
                out.push_str(" and ");
            }
        }
        out.push_str(&self.features.join(" and "));
        out
    }
}

/// Merges two comma-separated query lists pairwise.
///
/// Returns `None` when no pair is compatible.
pub fn merge_query_lists(
    list1: &[CssMediaQuery],
    list2: &[CssMediaQuery],
) -> Option<Vec<CssMediaQuery>> {
    if list1.is_empty() {
        return Some(list2.to_vec());
    }
    if list2.is_empty() {
        return Some(list1.to_vec());
    }
    let mut result = Vec::new();
    for q1 in list1 {
        for q2 in list2 {
            if let Some(merged) = q1.merge(q2) {
                result.push(merged);
            }
        }
    }
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Parses a comma-separated media-query list from evaluated text.
pub fn parse_media_query_list(text: &str, span: Span) -> SassResult<Vec<CssMediaQuery>> {
    let mut scanner = Scanner::synthetic(text, span);
    let mut queries = Vec::new();
    loop {
        skip_whitespace(&mut scanner);
        queries.push(parse_media_query(&mut scanner)?);
        skip_whitespace(&mut scanner);
        if !scanner.scan_char(',') {
            break;
        }
    }
    if !scanner.is_done() {
        return Err(scanner.error("expected media query"));
    }
    Ok(queries)
}

fn parse_media_query(scanner: &mut Scanner<'_>) -> SassResult<CssMediaQuery> {
    let mut modifier = None;
    let mut media_type = None;
    let mut features = Vec::new();

    skip_whitespace(scanner);
    if scanner.peek() == Some('(') {
        // Feature-only query: `(min-width: 100px) and (...)`.
        features.push(parse_feature(scanner)?);
        loop {
            skip_whitespace(scanner);
            if scanner.scan_ignore_case("and") {
                skip_whitespace(scanner);
                features.push(parse_feature(scanner)?);
            } else {
                break;
            }
        }
        return Ok(CssMediaQuery {
            modifier,
            media_type,
            features,
        });
    }

    let ident = scan_identifier(scanner);
    if ident.is_empty() {
        return Err(scanner.error("expected media query"));
    }
    if ident.eq_ignore_ascii_case("not") || ident.eq_ignore_ascii_case("only") {
        modifier = Some(ident);
        skip_whitespace(scanner);
        let t = scan_identifier(scanner);
        if t.is_empty() {
            return Err(scanner.error("expected media type"));
        }
        media_type = Some(t);
    } else {
        media_type = Some(ident);
    }

    loop {
        skip_whitespace(scanner);
        if scanner.scan_ignore_case("and") {
            skip_whitespace(scanner);
            features.push(parse_feature(scanner)?);
        } else {
            break;
        }
    }
    Ok(CssMediaQuery {
        modifier,
        media_type,
        features,
    })
}

fn parse_feature(scanner: &mut Scanner<'_>) -> SassResult<String> {
    if scanner.peek() != Some('(') {
        return Err(scanner.error("expected \"(\""));
    }
    let mut depth = 0usize;
    let mut text = String::new();
    loop {
        match scanner.next_char() {
            None => return Err(scanner.error("expected \")\"")),
            Some('(') => {
                depth += 1;
                text.push('(');
            }
            Some(')') => {
                depth -= 1;
                text.push(')');
                if depth == 0 {
                    break;
                }
            }
            Some(c) => text.push(c),
        }
    }
    Ok(text)
}

fn scan_identifier(scanner: &mut Scanner<'_>) -> String {
    scanner
        .scan_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .to_string()
}

fn skip_whitespace(scanner: &mut Scanner<'_>) {
    scanner.scan_while(char::is_whitespace);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<CssMediaQuery> {
        let mut map = codemap::CodeMap::new();
        let file = map.add_file("<media>".to_string(), text.to_string());
        parse_media_query_list(file.source(), file.span).unwrap()
    }

    #[test]
    fn parses_types_and_modifiers() {
        let q = parse("print");
        assert_eq!(q[0].media_type.as_deref(), Some("print"));
        let q = parse("not screen");
        assert_eq!(q[0].modifier.as_deref(), Some("not"));
        assert_eq!(q[0].media_type.as_deref(), Some("screen"));
    }

    #[test]
    fn parses_features() {
        let q = parse("screen and (min-width: 100px) and (color)");
        assert_eq!(q[0].features.len(), 2);
        assert_eq!(q[0].features[0], "(min-width: 100px)");
    }

    #[test]
    fn parses_feature_only_queries() {
        let q = parse("(min-width: 100px)");
        assert_eq!(q[0].media_type, None);
        assert_eq!(q[0].features.len(), 1);
    }

    #[test]
    fn parses_lists() {
        let q = parse("screen, print and (color)");
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn merge_types() {
        let a = &parse("screen")[0];
        let b = &parse("print")[0];
        assert_eq!(a.merge(b), None);
        assert_eq!(a.merge(a), Some(a.clone()));
    }

    #[test]
    fn all_is_identity() {
        let all = &parse("all")[0];
        let screen = &parse("screen and (color)")[0];
        assert_eq!(all.merge(screen), Some(screen.clone()));
    }

    #[test]
    fn merge_concatenates_features() {
        let a = &parse("screen and (min-width: 100px)")[0];
        let b = &parse("screen and (max-width: 300px)")[0];
        let merged = a.merge(b).unwrap();
        assert_eq!(merged.features.len(), 2);
    }

    #[test]
    fn not_only_merges_with_equal() {
        let a = &parse("not screen")[0];
        let b = &parse("not screen")[0];
        assert!(a.merge(b).is_some());
        let c = &parse("not print")[0];
        assert_eq!(a.merge(c), None);
        // `not screen` with plain `print` keeps the plain side.
        let print = &parse("print")[0];
        assert_eq!(a.merge(print), Some(print.clone()));
    }

    #[test]
    fn serializes_back() {
        let q = &parse("only screen and (color)")[0];
        assert_eq!(q.to_css_string(), "only screen and (color)");
    }
}
