//! Line-oriented text documents.
//!
//! A [`Document`] is the unit both sides of a merge are loaded into. Lines are
//! stored without their terminators. Each line's own terminator is kept, as
//! is whether the text ended with one, so a parsed document renders back to
//! exactly the bytes it was parsed from, mixed endings included.

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Line terminator style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// The terminator as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Detect the style from the first terminator found in `text`.
    ///
    /// Text without any newline is treated as `Lf`.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(pos) if text[..pos].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }
}

/// An immutable, ordered sequence of lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    /// Terminator of each line, parallel to `lines`. The last entry only
    /// applies when `trailing_newline` is set.
    endings: Vec<LineEnding>,
    /// Style of the first terminator; used for lines with no source position.
    ending: LineEnding,
    trailing_newline: bool,
}

impl Document {
    /// Split `text` into lines, remembering every terminator.
    ///
    /// Only `\n` and `\r\n` end a line; a lone `\r` stays in the content.
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut endings = Vec::new();
        for piece in text.split_inclusive('\n') {
            let (line, ending) = match piece.strip_suffix('\n') {
                Some(rest) => match rest.strip_suffix('\r') {
                    Some(line) => (line, LineEnding::CrLf),
                    None => (rest, LineEnding::Lf),
                },
                None => (piece, LineEnding::Lf),
            };
            lines.push(line.to_owned());
            endings.push(ending);
        }
        Self {
            lines,
            endings,
            ending: LineEnding::detect(text),
            trailing_newline: text.ends_with('\n'),
        }
    }

    /// Load a document from raw bytes, rejecting anything that is not UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> DiffResult<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| DiffError::Binary { len: bytes.len() })?;
        Ok(Self::parse(text))
    }

    /// Build a document directly from lines (LF, no trailing terminator).
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        Self {
            endings: vec![LineEnding::Lf; lines.len()],
            lines,
            ending: LineEnding::Lf,
            trailing_newline: false,
        }
    }

    /// All lines, without terminators.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The line at a 0-based index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// The terminator of the line at a 0-based index.
    pub fn ending_at(&self, index: usize) -> Option<LineEnding> {
        self.endings.get(index).copied()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if the document has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Style of the first terminator in the source text.
    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Returns `true` if lines do not all share one terminator style.
    pub fn has_mixed_endings(&self) -> bool {
        let terminated = if self.trailing_newline {
            &self.endings[..]
        } else {
            &self.endings[..self.endings.len().saturating_sub(1)]
        };
        terminated.iter().any(|e| *e != self.ending)
    }

    /// Whether the source text ended with a line terminator.
    pub fn has_trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    /// Returns `true` if both documents hold the same lines, ignoring
    /// terminator style.
    pub fn same_lines(&self, other: &Document) -> bool {
        self.lines == other.lines
    }

    /// Render the document back to the exact text it was parsed from.
    pub fn to_text(&self) -> String {
        self.render_with_endings(self.lines.iter().zip(self.endings.iter().copied().map(Some)))
    }

    /// Join an arbitrary line sequence using this document's first
    /// terminator style and trailing-newline setting.
    ///
    /// An empty sequence renders as the empty string.
    pub fn render<I, S>(&self, lines: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.render_with_endings(lines.into_iter().map(|line| (line, None)))
    }

    /// Join lines that may carry their own terminator.
    ///
    /// A line without one gets the document's first terminator style. The
    /// final line is terminated only if the document's text was.
    pub fn render_with_endings<I, S>(&self, lines: I) -> String
    where
        I: IntoIterator<Item = (S, Option<LineEnding>)>,
        S: AsRef<str>,
    {
        let mut out = String::new();
        let mut pending: Option<&'static str> = None;
        for (line, ending) in lines {
            if let Some(sep) = pending {
                out.push_str(sep);
            }
            out.push_str(line.as_ref());
            pending = Some(ending.unwrap_or(self.ending).as_str());
        }
        if let (Some(sep), true) = (pending, self.trailing_newline) {
            out.push_str(sep);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_terminators() {
        let doc = Document::parse("a\nb\nc\n");
        assert_eq!(doc.lines(), ["a", "b", "c"]);
        assert!(doc.has_trailing_newline());
        assert_eq!(doc.ending(), LineEnding::Lf);
    }

    #[test]
    fn parse_detects_crlf() {
        let doc = Document::parse("a\r\nb\r\n");
        assert_eq!(doc.lines(), ["a", "b"]);
        assert_eq!(doc.ending(), LineEnding::CrLf);
    }

    #[test]
    fn empty_text_is_empty_document() {
        let doc = Document::parse("");
        assert!(doc.is_empty());
        assert_eq!(doc.to_text(), "");
    }

    #[test]
    fn round_trip_preserves_format() {
        for text in ["a\nb", "a\nb\n", "x\r\ny\r\n", "\n", "one", "a\n\nb\n"] {
            assert_eq!(Document::parse(text).to_text(), text, "text {text:?}");
        }
    }

    #[test]
    fn render_uses_document_format() {
        let doc = Document::parse("a\r\nb\r\n");
        assert_eq!(doc.render(["x", "y"]), "x\r\ny\r\n");
        assert_eq!(doc.render(Vec::<String>::new()), "");
    }

    #[test]
    fn binary_bytes_rejected() {
        let err = Document::from_bytes(&[0xFF, 0xFE, 0x00]).unwrap_err();
        assert!(matches!(err, DiffError::Binary { len: 3 }));
    }

    #[test]
    fn same_lines_ignores_terminators() {
        let a = Document::parse("a\nb\n");
        let b = Document::parse("a\r\nb");
        assert!(a.same_lines(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn mixed_endings_survive_parse_and_render() {
        for text in ["a\r\nb\nc\n", "a\nb\r\nc", "a\r\n\nb\r\n", "x\ry\n"] {
            let doc = Document::parse(text);
            assert_eq!(doc.to_text(), text, "text {text:?}");
        }
        let doc = Document::parse("a\r\nb\nc\n");
        assert_eq!(doc.lines(), ["a", "b", "c"]);
        assert_eq!(doc.ending(), LineEnding::CrLf);
        assert_eq!(doc.ending_at(1), Some(LineEnding::Lf));
        assert!(doc.has_mixed_endings());
        assert!(!Document::parse("a\r\nb").has_mixed_endings());
    }

    #[test]
    fn lone_carriage_return_stays_in_line() {
        let doc = Document::parse("a\rb\n");
        assert_eq!(doc.lines(), ["a\rb"]);
    }

    #[test]
    fn render_with_endings_falls_back_to_first_style() {
        let doc = Document::parse("a\r\nb\n");
        let text = doc.render_with_endings([("x", Some(LineEnding::Lf)), ("y", None), ("z", None)]);
        assert_eq!(text, "x\ny\r\nz\r\n");
    }
}
