//! Property-based tests for the merge engine.
//!
//! Documents are drawn from a tiny line alphabet so that generated pairs
//! share plenty of lines and the differ produces interesting hunks.

use std::collections::HashMap;

use proptest::prelude::*;
use tmerge_diff::{diff_documents, format_hunk_header, parse_hunk_header, Document, Hunk};
use tmerge_merge::semantic::index;
use tmerge_merge::{
    conflict_regions, group, MergeEngine, MergeRecord, MergeStrategy, Origin, Resolution,
    ScriptedResolver, Segment,
};

/// Lines drawn from a small alphabet, blank lines included.
fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-d]{0,2}", 0..16)
}

/// Raw text over the same alphabet, each line ending in `\n` or `\r\n`,
/// the last one optionally unterminated.
fn text_strategy() -> impl Strategy<Value = String> {
    let lines = prop::collection::vec(("[a-d]{0,2}", any::<bool>()), 0..16);
    (lines, any::<bool>()).prop_map(|(lines, trailing)| {
        let count = lines.len();
        let mut text = String::new();
        for (i, (line, crlf)) in lines.into_iter().enumerate() {
            text.push_str(&line);
            if i + 1 < count || trailing {
                text.push_str(if crlf { "\r\n" } else { "\n" });
            }
        }
        text
    })
}

/// Source-like lines with varying indentation.
fn source_strategy() -> impl Strategy<Value = Vec<String>> {
    let bodies = vec![
        "def f():", "class C:", "fn g() {", "}", "x = 1", "# note", "import os", "\"\"\"", "",
    ];
    prop::collection::vec((0usize..3, prop::sample::select(bodies)), 0..24)
        .prop_map(|lines| {
            lines
                .into_iter()
                .map(|(depth, body)| {
                    if body.is_empty() {
                        String::new()
                    } else {
                        format!("{}{}", "    ".repeat(depth), body)
                    }
                })
                .collect()
        })
}

fn records_strategy() -> impl Strategy<Value = Vec<MergeRecord>> {
    let origin = prop_oneof![Just(Origin::Local), Just(Origin::New), Just(Origin::Both)];
    prop::collection::vec((origin, "[a-z]{1,3}"), 0..30)
        .prop_map(|items| items.into_iter().map(|(o, c)| MergeRecord::new(c, o)).collect())
}

fn counts<'a>(lines: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut map = HashMap::new();
    for line in lines {
        *map.entry(line).or_insert(0) += 1;
    }
    map
}

fn indent(line: &str) -> usize {
    line.chars().count() - line.trim_start().chars().count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Parsing then rendering gives back the exact bytes.
    #[test]
    fn documents_render_their_source(text in text_strategy()) {
        prop_assert_eq!(Document::parse(&text).to_text(), text);
    }

    /// Identical documents come back byte for byte under every strategy,
    /// with or without a resolver.
    #[test]
    fn identical_documents_are_unchanged(text in text_strategy()) {
        let engine = MergeEngine::default();
        let doc = Document::parse(&text);
        for strategy in MergeStrategy::ALL {
            let mut resolver = ScriptedResolver::default();
            let outcome = engine.merge_with_resolver(&doc, &doc.clone(), strategy, &mut resolver).unwrap();
            prop_assert!(outcome.is_unchanged());
            prop_assert_eq!(&outcome.text, &text);

            let outcome = engine.merge_text(&text, &text, strategy.as_str()).unwrap();
            prop_assert!(outcome.is_unchanged());
            prop_assert_eq!(&outcome.text, &text);
        }
    }

    /// PreferLocal reproduces the local text exactly.
    #[test]
    fn prefer_local_round_trips(local in text_strategy(), new in text_strategy()) {
        let outcome = MergeEngine::default().merge_text(&local, &new, "prefer-local").unwrap();
        prop_assert_eq!(outcome.text, local);
    }

    /// PreferNew reproduces the new text exactly once the lines differ;
    /// texts differing only in terminators count as no differences.
    #[test]
    fn prefer_new_round_trips(local in text_strategy(), new in text_strategy()) {
        let outcome = MergeEngine::default().merge_text(&local, &new, "prefer-new").unwrap();
        if outcome.is_unchanged() {
            prop_assert_eq!(outcome.text, local);
        } else {
            prop_assert_eq!(outcome.text, new);
        }
    }

    /// Smart keeps at least as many copies of every line as either side has.
    #[test]
    fn smart_never_drops_a_side(local in lines_strategy(), new in lines_strategy()) {
        let local_doc = Document::from_lines(local.clone());
        let new_doc = Document::from_lines(new.clone());
        let outcome = MergeEngine::default().merge(&local_doc, &new_doc, MergeStrategy::Smart).unwrap();
        if outcome.is_unchanged() {
            prop_assert_eq!(outcome.text, local_doc.to_text());
        } else {
            let merged_counts = counts(outcome.text.split('\n'));
            for side in [&local, &new] {
                for (line, n) in counts(side.iter().map(String::as_str)) {
                    prop_assert!(merged_counts.get(line).copied().unwrap_or(0) >= n, "lost {:?}", line);
                }
            }
        }
    }

    /// Interactive with KeepLocal everywhere equals PreferLocal.
    #[test]
    fn interactive_keep_local_matches_prefer_local(local in lines_strategy(), new in lines_strategy()) {
        let local = Document::from_lines(local);
        let new = Document::from_lines(new);
        let engine = MergeEngine::default();
        let mut resolver = ScriptedResolver::new(std::iter::repeat(Resolution::KeepLocal).take(64));
        let interactive = engine.merge_with_resolver(&local, &new, MergeStrategy::Interactive, &mut resolver).unwrap();
        let preferred = engine.merge(&local, &new, MergeStrategy::PreferLocal).unwrap();
        prop_assert_eq!(interactive.text, preferred.text);
    }

    /// Headers of real hunks survive format then parse.
    #[test]
    fn hunk_headers_round_trip(local in lines_strategy(), new in lines_strategy()) {
        let stream = diff_documents(&Document::from_lines(local), &Document::from_lines(new));
        for hunk in stream.iter() {
            prop_assert_eq!(
                parse_hunk_header(&format_hunk_header(hunk)),
                (hunk.local_start, hunk.local_count, hunk.new_start, hunk.new_count)
            );
        }
    }

    /// Arbitrary positions survive format then parse.
    #[test]
    fn arbitrary_headers_round_trip(a in 0usize..100_000, b in 0usize..500, c in 0usize..100_000, d in 0usize..500) {
        let hunk = Hunk { local_start: a, local_count: b, new_start: c, new_count: d, lines: Vec::new() };
        prop_assert_eq!(parse_hunk_header(&format_hunk_header(&hunk)), (a, b, c, d));
    }

    /// Blocks are well-formed and declarations never span a strict dedent.
    #[test]
    fn indexer_spans_respect_indentation(lines in source_strategy()) {
        let doc = Document::from_lines(lines);
        for block in index(&doc) {
            prop_assert!(block.start_line >= 1);
            prop_assert!(block.end_line >= block.start_line);
            prop_assert!(block.end_line <= doc.len());
            if block.kind.is_declaration() {
                let opening = indent(doc.lines()[block.start_line - 1].as_str());
                for n in block.start_line + 1..=block.end_line {
                    let line = doc.lines()[n - 1].as_str();
                    if !line.trim().is_empty() {
                        prop_assert!(indent(line) >= opening, "line {} escapes block {:?}", n, block);
                    }
                }
            }
        }
    }

    /// One region per maximal non-shared run; segments rebuild the input.
    #[test]
    fn grouper_counts_and_reconstructs(records in records_strategy()) {
        let runs = records
            .iter()
            .enumerate()
            .filter(|(i, r)| !r.is_shared() && (*i == 0 || records[i - 1].is_shared()))
            .count();
        prop_assert_eq!(conflict_regions(&records).len(), runs);

        let segments = group(&records);
        let rebuilt: Vec<MergeRecord> = segments.iter().flat_map(|s| s.records().to_vec()).collect();
        prop_assert_eq!(&rebuilt, &records);

        for pair in segments.windows(2) {
            let alternates = matches!(
                (&pair[0], &pair[1]),
                (Segment::Shared { .. }, Segment::Conflict(_)) | (Segment::Conflict(_), Segment::Shared { .. })
            );
            prop_assert!(alternates);
        }
    }
}

#[test]
fn replacement_scenario() {
    let engine = MergeEngine::default();
    let local = Document::from_lines(["A", "B", "C"]);
    let new = Document::from_lines(["A", "X", "C"]);

    let stream = engine.diff(&local, &new);
    assert_eq!(stream.len(), 1);

    assert_eq!(engine.merge(&local, &new, MergeStrategy::PreferLocal).unwrap().text, "A\nB\nC");
    assert_eq!(engine.merge(&local, &new, MergeStrategy::PreferNew).unwrap().text, "A\nX\nC");

    let mut resolver = ScriptedResolver::new([Resolution::KeepLocal]);
    engine
        .merge_with_resolver(&local, &new, MergeStrategy::Interactive, &mut resolver)
        .unwrap();
    assert_eq!(resolver.requests().len(), 1);
    assert_eq!(resolver.requests()[0].local, vec!["B"]);
    assert_eq!(resolver.requests()[0].new, vec!["X"]);
}

#[test]
fn empty_local_scenario() {
    let engine = MergeEngine::default();
    let local = Document::from_lines(Vec::<String>::new());
    let new = Document::from_lines(["A"]);

    let stream = engine.diff(&local, &new);
    assert_eq!(stream.len(), 1);
    assert_eq!(stream.deletions(), 0);
    assert_eq!(stream.additions(), 1);

    assert_eq!(engine.merge(&local, &new, MergeStrategy::PreferLocal).unwrap().text, "");
    assert_eq!(engine.merge(&local, &new, MergeStrategy::PreferNew).unwrap().text, "A");
}

#[test]
fn channel_resolver_drives_merge_from_another_thread() {
    let engine = MergeEngine::default();
    let local = Document::parse("one\ntwo\nthree\n");
    let new = Document::parse("one\n2\nthree\n");

    let (mut resolver, handle) = tmerge_merge::channel(None);
    let worker = std::thread::spawn(move || handle.serve(|_| Resolution::KeepBoth));
    let outcome = engine
        .merge_with_resolver(&local, &new, MergeStrategy::Interactive, &mut resolver)
        .unwrap();
    drop(resolver);
    worker.join().unwrap();

    assert_eq!(outcome.text, "one\ntwo\n2\nthree\n");
}
