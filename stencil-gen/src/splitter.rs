//! Multi-output splitter.
//!
//! A multi-output template renders a sequence of `<file>` elements:
//!
//! ```text
//! <file path="src/lib.rs" trim="true">
//!     pub mod a;
//! </file>
//! <file path="README.md" dedent="yes"><![CDATA[
//!     # <Title>
//! ]]></file>
//! ```
//!
//! The rendered text is wrapped in a synthetic root element and read with
//! `quick-xml`. Each `file` becomes one [`MultiFileEntry`]; its body is text
//! (character data, CDATA and entity references). Processing per entry is
//! `dedent` first, then `trim` (alias `strip`).

use std::path::PathBuf;

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use stencil_core::MultiFileEntry;
use thiserror::Error;

const ROOT_TAG: &str = "stencil-multi-root";
const FILE_TAG: &[u8] = b"file";

/// Why a rendered multi-output document could not be split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("invalid markup: {0}")]
    Xml(String),

    #[error("<file> element #{index} has no `path` attribute")]
    MissingPath { index: usize },

    #[error("<file> element #{index} has an empty `path` attribute")]
    EmptyPath { index: usize },

    #[error("expected only <file> elements at the top level, found <{name}>")]
    UnexpectedElement { name: String },

    #[error("<{name}> inside <file> element #{index}; wrap markup in <![CDATA[ ... ]]>")]
    NestedElement { name: String, index: usize },

    #[error("text outside of a <file> element: {snippet:?}")]
    StrayText { snippet: String },

    #[error("document contains no <file> elements")]
    NoFileElements,

    #[error("unexpected end of document inside <file> element #{index}")]
    Unclosed { index: usize },
}

fn xml_err(e: impl std::fmt::Display) -> SplitError {
    SplitError::Xml(e.to_string())
}

/// `"true"` / `"yes"` in any case.
pub fn is_attr_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

/// Remove the leading indentation common to every non-blank line.
///
/// Only spaces and tabs count as indentation, and the common prefix must
/// match exactly (a tab never matches spaces). Blank lines lose at most the
/// common prefix. Surrounding whitespace is otherwise untouched.
pub fn dedent(text: &str) -> String {
    let indent_of = |line: &str| -> usize {
        line.len() - line.trim_start_matches([' ', '\t']).len()
    };

    let mut common: Option<&str> = None;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..indent_of(line)];
        common = Some(match common {
            None => indent,
            Some(prev) => {
                let shared = prev
                    .bytes()
                    .zip(indent.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                &prev[..shared]
            }
        });
    }

    let prefix = match common {
        Some(p) if !p.is_empty() => p,
        _ => return text.to_string(),
    };

    text.split('\n')
        .map(|line| match line.strip_prefix(prefix) {
            Some(rest) => rest,
            None => &line[indent_of(line).min(prefix.len())..],
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

struct PendingFile {
    index: usize,
    output_path: PathBuf,
    dedent: bool,
    trim: bool,
    body: String,
}

impl PendingFile {
    fn from_start(start: &BytesStart<'_>, index: usize) -> Result<Self, SplitError> {
        let mut path = None;
        let mut dedent = false;
        let mut trim = false;
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            let value = attr.unescape_value().map_err(xml_err)?;
            match attr.key.as_ref() {
                b"path" => path = Some(value.into_owned()),
                b"dedent" => dedent = is_attr_true(&value),
                b"trim" | b"strip" => trim = trim || is_attr_true(&value),
                _ => {}
            }
        }
        let path = path.ok_or(SplitError::MissingPath { index })?;
        if path.trim().is_empty() {
            return Err(SplitError::EmptyPath { index });
        }
        Ok(PendingFile {
            index,
            output_path: PathBuf::from(path),
            dedent,
            trim,
            body: String::new(),
        })
    }

    fn finish(self) -> MultiFileEntry {
        let mut content = self.body;
        if self.dedent {
            content = dedent(&content);
        }
        if self.trim {
            content = content.trim().to_string();
        }
        MultiFileEntry {
            output_path: self.output_path,
            content,
            dedent: self.dedent,
            trim: self.trim,
        }
    }
}

/// Resolve a general entity reference body (`amp`, `#10`, `#x41`).
fn resolve_entity(raw: &str) -> Result<String, SplitError> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.to_string());
    }
    if let Some(rest) = raw.strip_prefix('#') {
        let code = match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => rest.parse::<u32>(),
        }
        .map_err(|_| SplitError::Xml(format!("invalid character reference &{raw};")))?;
        return char::from_u32(code)
            .map(String::from)
            .ok_or_else(|| SplitError::Xml(format!("invalid character reference &{raw};")));
    }
    Err(SplitError::Xml(format!("unknown entity &{raw};")))
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn stray_snippet(text: &str) -> String {
    text.trim().chars().take(40).collect()
}

fn stray_text(text: &str) -> SplitError {
    SplitError::StrayText { snippet: stray_snippet(text) }
}

/// Split rendered multi-output text into its file entries, in document order.
///
/// Whitespace-only input yields no entries. Top-level text beside at least
/// one `<file>` element is ignored; text with no `<file>` at all is an error.
pub fn split(rendered: &str) -> Result<Vec<MultiFileEntry>, SplitError> {
    if rendered.trim().is_empty() {
        return Ok(Vec::new());
    }

    let wrapped = format!("<{ROOT_TAG}>{rendered}</{ROOT_TAG}>");
    let mut reader = Reader::from_str(&wrapped);

    let mut entries = Vec::new();
    let mut current: Option<PendingFile> = None;
    let mut in_root = false;
    let mut seen = 0usize;
    let mut stray: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match event {
            Event::Start(start) => {
                if !in_root {
                    in_root = true;
                    continue;
                }
                if let Some(file) = &current {
                    return Err(SplitError::NestedElement {
                        name: element_name(&start),
                        index: file.index,
                    });
                }
                if start.name().as_ref() != FILE_TAG {
                    return Err(SplitError::UnexpectedElement { name: element_name(&start) });
                }
                seen += 1;
                current = Some(PendingFile::from_start(&start, seen)?);
            }
            Event::Empty(start) => {
                if let Some(file) = &current {
                    return Err(SplitError::NestedElement {
                        name: element_name(&start),
                        index: file.index,
                    });
                }
                if start.name().as_ref() != FILE_TAG {
                    return Err(SplitError::UnexpectedElement { name: element_name(&start) });
                }
                seen += 1;
                entries.push(PendingFile::from_start(&start, seen)?.finish());
            }
            Event::End(_) => match current.take() {
                Some(file) => entries.push(file.finish()),
                None => in_root = false,
            },
            Event::Text(text) => {
                let text = text.decode().map_err(xml_err)?;
                match current.as_mut() {
                    Some(file) => file.body.push_str(&text),
                    None if !text.trim().is_empty() => {
                        stray.get_or_insert_with(|| text.into_owned());
                    }
                    None => {}
                }
            }
            Event::CData(cdata) => {
                let text = std::str::from_utf8(cdata.as_ref()).map_err(xml_err)?;
                match current.as_mut() {
                    Some(file) => file.body.push_str(text),
                    None if !text.trim().is_empty() => {
                        stray.get_or_insert_with(|| text.to_string());
                    }
                    None => {}
                }
            }
            Event::GeneralRef(reference) => {
                let raw = reference.decode().map_err(xml_err)?;
                let resolved = resolve_entity(&raw)?;
                match current.as_mut() {
                    Some(file) => file.body.push_str(&resolved),
                    None => {
                        stray.get_or_insert(resolved);
                    }
                }
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(file) = current {
        return Err(SplitError::Unclosed { index: file.index });
    }
    match (entries.is_empty(), stray) {
        (true, Some(text)) => return Err(stray_text(&text)),
        (true, None) => return Err(SplitError::NoFileElements),
        (false, Some(text)) => {
            tracing::warn!("ignoring text outside of <file> elements: {:?}", stray_snippet(&text));
        }
        (false, None) => {}
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("Yes", true)]
    #[case("yes", true)]
    #[case("1", false)]
    #[case("on", false)]
    #[case("false", false)]
    #[case("", false)]
    #[case(" true", false)]
    fn attribute_truthiness(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_attr_true(value), expected);
    }

    #[test]
    fn trim_without_dedent_keeps_inner_indentation() {
        let entries = split("<file path=\"out/a.txt\" trim=\"true\">  hello\n  world\n</file>").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].output_path, PathBuf::from("out/a.txt"));
        assert_eq!(entries[0].content, "hello\n  world");
        assert!(entries[0].trim);
        assert!(!entries[0].dedent);
    }

    #[test]
    fn dedent_then_strip() {
        let doc = "<file path=\"a\" dedent=\"yes\" strip=\"YES\">\n    fn main() {\n        run();\n    }\n</file>";
        let entries = split(doc).unwrap();
        assert_eq!(entries[0].content, "fn main() {\n    run();\n}");
    }

    #[test]
    fn dedent_alone_keeps_surrounding_newlines() {
        let entries = split("<file path=\"a\" dedent=\"true\">\n  x\n    y\n</file>").unwrap();
        assert_eq!(entries[0].content, "\nx\n  y\n");
    }

    #[test]
    fn body_is_verbatim_without_flags() {
        let entries = split("<file path=\"a\">  keep  </file>").unwrap();
        assert_eq!(entries[0].content, "  keep  ");
    }

    #[test]
    fn multiple_files_in_document_order() {
        let doc = "\n<file path=\"one.txt\">1</file>\n<!-- note -->\n<file path=\"two/two.txt\">2</file>\n";
        let entries = split(doc).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.output_path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("one.txt"), PathBuf::from("two/two.txt")]);
        assert_eq!(entries[1].content, "2");
    }

    #[test]
    fn entities_and_cdata_are_decoded() {
        let doc = "<file path=\"a\">a &lt; b &amp;&amp; c &#x41;&#10;<![CDATA[<raw> & stuff]]></file>";
        let entries = split(doc).unwrap();
        assert_eq!(entries[0].content, "a < b && c A\n<raw> & stuff");
    }

    #[test]
    fn self_closing_file_is_empty() {
        let entries = split("<file path=\"empty.txt\"/>").unwrap();
        assert_eq!(entries[0].content, "");
    }

    #[test]
    fn missing_path_is_malformed() {
        let err = split("<file path=\"ok\">x</file><file trim=\"true\">y</file>").unwrap_err();
        assert_eq!(err, SplitError::MissingPath { index: 2 });
    }

    #[test]
    fn empty_path_is_malformed() {
        let err = split("<file path=\"  \">x</file>").unwrap_err();
        assert_eq!(err, SplitError::EmptyPath { index: 1 });
    }

    #[test]
    fn plain_text_is_malformed() {
        let err = split("just some rendered text").unwrap_err();
        assert!(matches!(err, SplitError::StrayText { .. }), "got: {err}");
    }

    #[test]
    fn text_beside_file_elements_is_ignored() {
        let entries = split("generated by stencil\n<file path=\"a\">x</file>\ntrailer &amp; more").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "x");
    }

    #[test]
    fn other_top_level_element_is_malformed() {
        let err = split("<files><file path=\"a\">x</file></files>").unwrap_err();
        assert_eq!(err, SplitError::UnexpectedElement { name: "files".to_string() });
    }

    #[test]
    fn nested_markup_must_be_cdata() {
        let err = split("<file path=\"a.html\"><div>x</div></file>").unwrap_err();
        assert!(matches!(err, SplitError::NestedElement { index: 1, .. }), "got: {err}");
    }

    #[test]
    fn unbalanced_tags_are_malformed() {
        let err = split("<file path=\"a\">x").unwrap_err();
        assert!(
            matches!(err, SplitError::Xml(_) | SplitError::Unclosed { .. }),
            "got: {err}"
        );
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(split("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn comments_only_has_no_file_elements() {
        assert_eq!(split("<!-- nothing -->").unwrap_err(), SplitError::NoFileElements);
    }

    #[test]
    fn dedent_uses_common_prefix_only() {
        assert_eq!(dedent("    a\n  b\n      c"), "  a\nb\n    c");
        assert_eq!(dedent("\ta\n\t\tb"), "a\n\tb");
        assert_eq!(dedent("  a\n\n  b"), "a\n\nb");
        assert_eq!(dedent("  a\n \n  b"), "a\n\nb");
        assert_eq!(dedent("no indent\n  x"), "no indent\n  x");
        assert_eq!(dedent(""), "");
    }
}
