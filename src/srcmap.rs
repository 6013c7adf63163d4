//! Source-map generation.
//!
//! Turns the emitter's recorded mappings into a source map v3 document:
//! `mappings` is the standard semicolon-separated, VLQ-encoded relative
//! form; `sources` lists every consulted file, optionally as `file:` URLs,
//! optionally with embedded contents.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use url::Url;

use crate::emitter::Mapping;
use crate::source::Sources;

/// How the compiled CSS references its source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMapMode {
    /// No map, no footer.
    None,
    /// A map for the caller to write, referenced by URL in the footer.
    File { url: String },
    /// A footer linking to the map, which the caller embeds elsewhere.
    EmbedLink { url: String },
    /// The whole map embedded in the footer as a base64 data URI.
    EmbedJson,
}

#[derive(Serialize)]
struct SourceMapJson {
    version: u32,
    file: String,
    sources: Vec<String>,
    #[serde(rename = "sourcesContent", skip_serializing_if = "Option::is_none")]
    sources_content: Option<Vec<String>>,
    names: Vec<String>,
    mappings: String,
}

/// Renders the source-map JSON document.
pub fn build_source_map(
    mappings: &[Mapping],
    sources: &Sources,
    output_file: &str,
    embed_contents: bool,
    file_urls: bool,
) -> String {
    let files = sources.files();
    let source_names: Vec<String> = files
        .iter()
        .map(|f| {
            if file_urls {
                Url::from_file_path(f.name())
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| f.name().to_string())
            } else {
                f.name().to_string()
            }
        })
        .collect();
    let sources_content = if embed_contents {
        Some(files.iter().map(|f| f.source().to_string()).collect())
    } else {
        None
    };

    let map = SourceMapJson {
        version: 3,
        file: output_file.to_string(),
        sources: source_names,
        sources_content,
        names: Vec::new(),
        mappings: encode_mappings(mappings, sources),
    };
    serde_json::to_string(&map).expect("source map serialization cannot fail")
}

/// The `sourceMappingURL` footer comment, or `None` for [`SourceMapMode::None`].
pub fn footer(mode: &SourceMapMode, map_json: &str) -> Option<String> {
    match mode {
        SourceMapMode::None => None,
        SourceMapMode::File { url } | SourceMapMode::EmbedLink { url } => {
            Some(format!("\n/*# sourceMappingURL={} */", url))
        }
        SourceMapMode::EmbedJson => {
            let encoded = BASE64.encode(map_json.as_bytes());
            Some(format!(
                "\n/*# sourceMappingURL=data:application/json;base64,{} */",
                encoded
            ))
        }
    }
}

fn encode_mappings(mappings: &[Mapping], sources: &Sources) -> String {
    // Resolve spans up front and order by output position.
    let mut resolved: Vec<(usize, usize, usize, usize, usize)> = mappings
        .iter()
        .map(|m| {
            let loc = sources.look_up(m.span);
            let src_index = sources
                .files()
                .iter()
                .position(|f| std::ptr::eq(f.as_ref(), loc.file.as_ref()))
                .unwrap_or(0);
            (
                m.dst_line,
                m.dst_col,
                src_index,
                loc.begin.line,
                loc.begin.column,
            )
        })
        .collect();
    resolved.sort();
    resolved.dedup();

    let mut out = String::new();
    let mut current_line = 0usize;
    let mut prev_dst_col = 0i64;
    let mut prev_src = 0i64;
    let mut prev_src_line = 0i64;
    let mut prev_src_col = 0i64;
    let mut first_in_line = true;

    for (dst_line, dst_col, src, src_line, src_col) in resolved {
        while current_line < dst_line {
            out.push(';');
            current_line += 1;
            prev_dst_col = 0;
            first_in_line = true;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;

        encode_vlq(&mut out, dst_col as i64 - prev_dst_col);
        encode_vlq(&mut out, src as i64 - prev_src);
        encode_vlq(&mut out, src_line as i64 - prev_src_line);
        encode_vlq(&mut out, src_col as i64 - prev_src_col);

        prev_dst_col = dst_col as i64;
        prev_src = src as i64;
        prev_src_line = src_line as i64;
        prev_src_col = src_col as i64;
    }
    out
}

const VLQ_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(out: &mut String, value: i64) {
    // Sign goes in the low bit; the rest is emitted 5 bits at a time,
    // low-order first, with the high bit as a continuation flag.
    let mut vlq = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0x1f) as usize;
        vlq >>= 5;
        if vlq != 0 {
            digit |= 0x20;
        }
        out.push(VLQ_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlq_known_values() {
        let encode = |v: i64| {
            let mut s = String::new();
            encode_vlq(&mut s, v);
            s
        };
        assert_eq!(encode(0), "A");
        assert_eq!(encode(1), "C");
        assert_eq!(encode(-1), "D");
        assert_eq!(encode(16), "gB");
        assert_eq!(encode(123), "2H");
    }

    #[test]
    fn builds_v3_document() {
        let mut sources = Sources::new();
        let file = sources.add("in.scss".to_string(), "a { b: c; }".to_string());
        let mappings = vec![
            Mapping {
                span: file.span.subspan(0, 1),
                dst_line: 0,
                dst_col: 0,
            },
            Mapping {
                span: file.span.subspan(4, 8),
                dst_line: 1,
                dst_col: 2,
            },
        ];
        let json = build_source_map(&mappings, &sources, "out.css", true, false);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["version"], 3);
        assert_eq!(parsed["file"], "out.css");
        assert_eq!(parsed["sources"][0], "in.scss");
        assert_eq!(parsed["sourcesContent"][0], "a { b: c; }");
        assert_eq!(parsed["mappings"], "AAAA;EAAI");
    }

    #[test]
    fn footer_forms() {
        assert_eq!(footer(&SourceMapMode::None, "{}"), None);
        let file = footer(
            &SourceMapMode::File {
                url: "out.css.map".to_string(),
            },
            "{}",
        )
        .unwrap();
        assert_eq!(file, "\n/*# sourceMappingURL=out.css.map */");
        let embedded = footer(&SourceMapMode::EmbedJson, "{}").unwrap();
        assert!(embedded.contains("data:application/json;base64,e30="));
    }
}
