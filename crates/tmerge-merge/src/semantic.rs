//! Semantic block indexer.
//!
//! A single top-to-bottom pass classifies lines with declaration-keyword
//! patterns and tracks nesting purely by indentation width. It is a
//! classification aid for the smart strategy, not a parser: it never fails,
//! and whatever it finds on unparseable input is what it returns.
//!
//! Declarations (functions, methods, classes) open a block that closes at the
//! line before the next declaration, before the first line indented strictly
//! less than the declaration, or at the end of the document. Comments,
//! docstrings and imports are recorded as informational spans and never
//! affect declaration nesting.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tmerge_diff::Document;

/// Structural category of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Function,
    Class,
    Method,
    CommentBlock,
    Docstring,
    ImportGroup,
}

impl BlockKind {
    /// Declaration kinds open indentation-scoped blocks.
    pub fn is_declaration(&self) -> bool {
        matches!(self, BlockKind::Function | BlockKind::Class | BlockKind::Method)
    }
}

/// A detected structural region, 1-based and inclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticBlock {
    pub start_line: usize,
    pub end_line: usize,
    pub kind: BlockKind,
    pub name: Option<String>,
}

impl SemanticBlock {
    /// Returns `true` if `line` (1-based) falls inside the block.
    pub fn contains(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

const MODIFIERS: &str = r"(?:(?:pub(?:\([^)]*\))?|async|export|static|public|private|protected|abstract|unsafe)\s+)*";

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{MODIFIERS}(?:class|struct|enum|trait|interface|impl)\s+([A-Za-z_][A-Za-z0-9_]*)"))
        .expect("class pattern is valid")
});
static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s+{MODIFIERS}(?:def|fn|function)\s+([A-Za-z_][A-Za-z0-9_]*)"))
        .expect("method pattern is valid")
});
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{MODIFIERS}(?:def|fn|function)\s+([A-Za-z_][A-Za-z0-9_]*)"))
        .expect("function pattern is valid")
});
static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?://|#(?:[^\[!]|$))").expect("comment pattern is valid"));
static DOCSTRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?:"""|''')"#).expect("docstring pattern is valid"));
static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:import\s|from\s+\S+\s+import\s|use\s)").expect("import pattern is valid")
});

/// A declaration block that has been opened but not closed yet.
struct OpenBlock {
    start_line: usize,
    kind: BlockKind,
    name: Option<String>,
}

impl OpenBlock {
    fn close(self, end_line: usize) -> SemanticBlock {
        SemanticBlock {
            start_line: self.start_line,
            end_line: end_line.max(self.start_line),
            kind: self.kind,
            name: self.name,
        }
    }
}

/// A contiguous run of comment or import lines.
struct Run {
    kind: BlockKind,
    start_line: usize,
    end_line: usize,
}

/// Scan `doc` and return its blocks ordered by start line.
pub fn index(doc: &Document) -> Vec<SemanticBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<OpenBlock> = None;
    let mut indent_stack: Vec<usize> = Vec::new();
    let mut run: Option<Run> = None;
    // (opening line, delimiter) of an unterminated docstring.
    let mut docstring: Option<(usize, &'static str)> = None;

    for (i, line) in doc.lines().iter().enumerate() {
        let line_no = i + 1;
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            flush_run(&mut run, &mut blocks);
            continue;
        }

        let indent = line.chars().count() - trimmed.chars().count();
        while indent_stack.last().is_some_and(|&top| indent < top) {
            if let Some(open) = current.take() {
                blocks.push(open.close(line_no - 1));
            }
            indent_stack.pop();
        }

        if let Some((start, delim)) = docstring {
            if trimmed.contains(delim) {
                blocks.push(span(BlockKind::Docstring, start, line_no));
                docstring = None;
            }
            continue;
        }

        let (kind, name) = match classify(line) {
            Some(found) => found,
            None => {
                flush_run(&mut run, &mut blocks);
                continue;
            }
        };

        if kind.is_declaration() {
            flush_run(&mut run, &mut blocks);
            if let Some(open) = current.take() {
                blocks.push(open.close(line_no - 1));
            }
            current = Some(OpenBlock {
                start_line: line_no,
                kind,
                name,
            });
            indent_stack.push(indent);
            continue;
        }

        match kind {
            BlockKind::Docstring => {
                flush_run(&mut run, &mut blocks);
                let delim = if trimmed.starts_with("'''") { "'''" } else { "\"\"\"" };
                if trimmed[3..].contains(delim) {
                    blocks.push(span(BlockKind::Docstring, line_no, line_no));
                } else {
                    docstring = Some((line_no, delim));
                }
            }
            _ => match run.as_mut() {
                Some(open) if open.kind == kind && open.end_line + 1 == line_no => open.end_line = line_no,
                _ => {
                    flush_run(&mut run, &mut blocks);
                    run = Some(Run {
                        kind,
                        start_line: line_no,
                        end_line: line_no,
                    });
                }
            },
        }
    }

    flush_run(&mut run, &mut blocks);
    if let Some((start, _)) = docstring {
        blocks.push(span(BlockKind::Docstring, start, doc.len()));
    }
    if let Some(open) = current.take() {
        blocks.push(open.close(doc.len()));
    }

    blocks.sort_by_key(|block| block.start_line);
    blocks
}

/// Match a line against the block-opening patterns, in priority order.
fn classify(line: &str) -> Option<(BlockKind, Option<String>)> {
    let declarations: [(&Lazy<Regex>, BlockKind); 3] = [
        (&CLASS_RE, BlockKind::Class),
        (&METHOD_RE, BlockKind::Method),
        (&FUNCTION_RE, BlockKind::Function),
    ];
    for (re, kind) in declarations {
        if let Some(caps) = re.captures(line) {
            return Some((kind, caps.get(1).map(|m| m.as_str().to_string())));
        }
    }
    if DOCSTRING_RE.is_match(line) {
        return Some((BlockKind::Docstring, None));
    }
    if IMPORT_RE.is_match(line) {
        return Some((BlockKind::ImportGroup, None));
    }
    if COMMENT_RE.is_match(line) {
        return Some((BlockKind::CommentBlock, None));
    }
    None
}

fn span(kind: BlockKind, start_line: usize, end_line: usize) -> SemanticBlock {
    SemanticBlock {
        start_line,
        end_line,
        kind,
        name: None,
    }
}

fn flush_run(run: &mut Option<Run>, blocks: &mut Vec<SemanticBlock>) {
    if let Some(done) = run.take() {
        blocks.push(span(done.kind, done.start_line, done.end_line));
    }
}

/// Named declaration blocks of one document, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct BlockMap {
    by_name: BTreeMap<String, Vec<SemanticBlock>>,
}

impl BlockMap {
    /// Collect the named declarations among `blocks`.
    pub fn from_blocks(blocks: &[SemanticBlock]) -> Self {
        let mut by_name: BTreeMap<String, Vec<SemanticBlock>> = BTreeMap::new();
        for block in blocks.iter().filter(|b| b.kind.is_declaration()) {
            if let Some(name) = &block.name {
                by_name.entry(name.clone()).or_default().push(block.clone());
            }
        }
        Self { by_name }
    }

    /// Index `doc` and collect its named declarations.
    pub fn index(doc: &Document) -> Self {
        Self::from_blocks(&index(doc))
    }

    /// All declaration names.
    pub fn names(&self) -> BTreeSet<&str> {
        self.by_name.keys().map(String::as_str).collect()
    }

    /// Blocks declared under `name`.
    pub fn get(&self, name: &str) -> &[SemanticBlock] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }
}

/// Name-level comparison of two documents' declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockComparison {
    pub common: BTreeSet<String>,
    pub local_only: BTreeSet<String>,
    pub new_only: BTreeSet<String>,
}

impl BlockComparison {
    /// Split declaration names into shared and one-sided sets.
    pub fn compare(local: &BlockMap, new: &BlockMap) -> Self {
        let local_names = local.names();
        let new_names = new.names();
        Self {
            common: local_names.intersection(&new_names).map(|s| s.to_string()).collect(),
            local_only: local_names.difference(&new_names).map(|s| s.to_string()).collect(),
            new_only: new_names.difference(&local_names).map(|s| s.to_string()).collect(),
        }
    }
}
