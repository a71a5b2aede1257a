use std::collections::BTreeSet;

use serde::Serialize;
use tmerge_diff::{diff_with, Document, HunkStream, LineEnding};
use tracing::{debug, info};

use crate::builder::build_spliced;
use crate::config::MergeConfig;
use crate::conflict::{group, ConflictRegion, Segment};
use crate::error::{MergeError, Result};
use crate::record::{MergeRecord, Origin};
use crate::resolver::{ConflictRequest, ConflictResolver};
use crate::semantic::{BlockComparison, BlockMap, SemanticBlock};
use crate::strategy::MergeStrategy;

/// Labels used for the file header lines of rendered diffs.
pub const LOCAL_LABEL: &str = "local";
pub const NEW_LABEL: &str = "new";

// ---------------------------------------------------------------------------
// MergeOutcome
// ---------------------------------------------------------------------------

/// Whether a merge changed anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStatus {
    /// The documents were line-identical; the local text is returned as is.
    Unchanged,
    /// A merged document was produced.
    Merged,
}

/// The result of one merge call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// The full merged text.
    pub text: String,
    pub status: MergeStatus,
    /// The strategy that produced `text`.
    pub strategy: MergeStrategy,
    /// Number of hunks in the diff.
    pub hunks: usize,
    /// Number of conflict regions encountered.
    pub conflicts: usize,
}

impl MergeOutcome {
    /// Returns `true` if no merge took place.
    pub fn is_unchanged(&self) -> bool {
        self.status == MergeStatus::Unchanged
    }
}

// ---------------------------------------------------------------------------
// MergeEngine
// ---------------------------------------------------------------------------

/// Two-way text merge: diff, build records, apply a strategy.
///
/// The engine holds only configuration; every call works on the documents
/// it is given and returns a fresh string.
#[derive(Clone, Debug, Default)]
pub struct MergeEngine {
    config: MergeConfig,
}

impl MergeEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// The current configuration.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Line diff of `local` against `new` with the configured options.
    pub fn diff(&self, local: &Document, new: &Document) -> HunkStream {
        diff_with(local, new, &self.config.diff)
    }

    /// Diff-only mode: the unified diff as text, empty if nothing differs.
    pub fn render_diff(&self, local: &Document, new: &Document) -> String {
        self.diff(local, new).to_unified(LOCAL_LABEL, NEW_LABEL)
    }

    /// Merge raw text with a strategy selector string.
    ///
    /// The selector is validated before any diffing happens.
    pub fn merge_text(&self, local: &str, new: &str, selector: &str) -> Result<MergeOutcome> {
        let strategy: MergeStrategy = selector.parse()?;
        self.merge(&Document::parse(local), &Document::parse(new), strategy)
    }

    /// [`merge_text`](Self::merge_text) with a resolver, so the
    /// `interactive` selector can be used on raw text.
    pub fn merge_text_with_resolver(
        &self,
        local: &str,
        new: &str,
        selector: &str,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<MergeOutcome> {
        let strategy: MergeStrategy = selector.parse()?;
        self.merge_with_resolver(&Document::parse(local), &Document::parse(new), strategy, resolver)
    }

    /// Merge without a resolver.
    ///
    /// # Errors
    ///
    /// [`MergeError::ResolverRequired`] for [`MergeStrategy::Interactive`]
    /// when the documents differ. Identical documents are reported unchanged
    /// under every strategy.
    pub fn merge(&self, local: &Document, new: &Document, strategy: MergeStrategy) -> Result<MergeOutcome> {
        self.run(local, new, strategy, None)
    }

    /// Merge, consulting `resolver` for every conflict region when the
    /// strategy is interactive.
    ///
    /// Any resolver error aborts the merge; no partial text is returned.
    pub fn merge_with_resolver(
        &self,
        local: &Document,
        new: &Document,
        strategy: MergeStrategy,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<MergeOutcome> {
        self.run(local, new, strategy, Some(resolver))
    }

    /// Apply `strategy` to an already-built record sequence.
    ///
    /// Output is rendered into the local document, or into the new one for
    /// [`MergeStrategy::PreferNew`]. Lines taken from that document keep
    /// their own terminators; every other line gets its first terminator
    /// style.
    pub fn apply(
        &self,
        records: &[MergeRecord],
        strategy: MergeStrategy,
        local: &Document,
        new: &Document,
        resolver: Option<&mut dyn ConflictResolver>,
    ) -> Result<String> {
        let (kept, _) = self.resolve_records(records, strategy, local, new, resolver)?;
        Ok(render(&kept, strategy, local, new))
    }

    fn run(
        &self,
        local: &Document,
        new: &Document,
        strategy: MergeStrategy,
        resolver: Option<&mut dyn ConflictResolver>,
    ) -> Result<MergeOutcome> {
        let hunks = self.diff(local, new);
        if hunks.is_empty() {
            info!(%strategy, "no differences; local document returned unchanged");
            return Ok(MergeOutcome {
                text: local.to_text(),
                status: MergeStatus::Unchanged,
                strategy,
                hunks: 0,
                conflicts: 0,
            });
        }

        if local.has_mixed_endings() || new.has_mixed_endings() {
            debug!("mixed line endings; source terminators kept per line");
        }

        let records = build_spliced(&hunks, local);
        let (kept, conflicts) = self.resolve_records(&records, strategy, local, new, resolver)?;
        let text = render(&kept, strategy, local, new);

        info!(
            %strategy,
            hunks = hunks.len(),
            conflicts,
            lines = kept.len(),
            "merge complete"
        );
        Ok(MergeOutcome {
            text,
            status: MergeStatus::Merged,
            strategy,
            hunks: hunks.len(),
            conflicts,
        })
    }

    /// Produce the output records and the number of conflict regions seen.
    fn resolve_records(
        &self,
        records: &[MergeRecord],
        strategy: MergeStrategy,
        local: &Document,
        new: &Document,
        resolver: Option<&mut dyn ConflictResolver>,
    ) -> Result<(Vec<MergeRecord>, usize)> {
        match strategy {
            MergeStrategy::PreferLocal => Ok(keep_origins(records, Origin::Local)),
            MergeStrategy::PreferNew => Ok(keep_origins(records, Origin::New)),
            MergeStrategy::Smart => Ok(self.smart(records, local, new)),
            MergeStrategy::Interactive => {
                let resolver = resolver.ok_or(MergeError::ResolverRequired)?;
                interactive(records, resolver)
            }
        }
    }

    /// Union of both sides; with block replacement enabled, a region that
    /// rewrites one whole named declaration keeps only the new version.
    fn smart(&self, records: &[MergeRecord], local: &Document, new: &Document) -> (Vec<MergeRecord>, usize) {
        let blocks = self.config.smart.block_replacement.then(|| {
            let local_map = BlockMap::index(local);
            let new_map = BlockMap::index(new);
            let comparison = BlockComparison::compare(&local_map, &new_map);
            debug!(
                common = comparison.common.len(),
                local_only = comparison.local_only.len(),
                new_only = comparison.new_only.len(),
                "indexed semantic blocks"
            );
            (local_map, new_map, comparison)
        });

        let mut kept = Vec::with_capacity(records.len());
        let mut conflicts = 0usize;
        for segment in group(records) {
            match segment {
                Segment::Shared { records } => kept.extend(records),
                Segment::Conflict(region) => {
                    conflicts += 1;
                    // A pure insertion or deletion has nothing to replace.
                    let replaced = blocks
                        .as_ref()
                        .filter(|_| !region.is_one_sided())
                        .and_then(|(local_map, new_map, comparison)| {
                            replaced_block(&region, local, new, local_map, new_map, &comparison.common)
                        });
                    match replaced {
                        Some(name) => {
                            debug!(region = region.index, block = name, "wholesale block replacement; keeping new");
                            kept.extend(region.records_of(Origin::New).cloned());
                        }
                        None => kept.extend(region.records),
                    }
                }
            }
        }
        (kept, conflicts)
    }
}

/// Keep shared records and those from `side`, in order.
fn keep_origins(records: &[MergeRecord], side: Origin) -> (Vec<MergeRecord>, usize) {
    let conflicts = group(records)
        .iter()
        .filter(|s| matches!(s, Segment::Conflict(_)))
        .count();
    let kept = records
        .iter()
        .filter(|r| r.origin == Origin::Both || r.origin == side)
        .cloned()
        .collect();
    (kept, conflicts)
}

fn interactive(records: &[MergeRecord], resolver: &mut dyn ConflictResolver) -> Result<(Vec<MergeRecord>, usize)> {
    let mut kept = Vec::with_capacity(records.len());
    let mut conflicts = 0usize;
    for segment in group(records) {
        match segment {
            Segment::Shared { records } => kept.extend(records),
            Segment::Conflict(region) => {
                let request = ConflictRequest::from(&region);
                let resolution = resolver.resolve(&request)?;
                info!(
                    region = request.region,
                    local_lines = request.local.len(),
                    new_lines = request.new.len(),
                    choice = resolution.label(),
                    "conflict resolved"
                );
                kept.extend(resolution.records_for(&region));
                conflicts += 1;
            }
        }
    }
    Ok((kept, conflicts))
}

/// Join kept records in the format of the document they are rendered into.
///
/// A record positioned in that document keeps its source terminator, so
/// mixed-ending files survive PreferLocal and PreferNew byte for byte.
fn render(records: &[MergeRecord], strategy: MergeStrategy, local: &Document, new: &Document) -> String {
    let into_new = strategy == MergeStrategy::PreferNew;
    let host = if into_new { new } else { local };
    host.render_with_endings(records.iter().map(|record| {
        let line = if into_new { record.new_line } else { record.local_line };
        (record.content.as_str(), source_ending(host, line))
    }))
}

fn source_ending(doc: &Document, line: Option<usize>) -> Option<LineEnding> {
    line.and_then(|n| n.checked_sub(1)).and_then(|index| doc.ending_at(index))
}

/// The name of a declaration that `region` rewrites wholesale, if any.
///
/// The region's local lines must be exactly the non-blank lines of a named
/// block in `local`, and its new lines exactly those of the same-named block
/// in `new`. Records without positions never qualify.
fn replaced_block<'a>(
    region: &ConflictRegion,
    local: &Document,
    new: &Document,
    local_map: &BlockMap,
    new_map: &BlockMap,
    common: &'a BTreeSet<String>,
) -> Option<&'a str> {
    let local_lines = positions(region, Origin::Local)?;
    let new_lines = positions(region, Origin::New)?;
    if local_lines.is_empty() || new_lines.is_empty() {
        return None;
    }

    common
        .iter()
        .find(|name| {
            local_map.get(name).iter().any(|b| covers(b, local, &local_lines))
                && new_map.get(name).iter().any(|b| covers(b, new, &new_lines))
        })
        .map(String::as_str)
}

fn positions(region: &ConflictRegion, origin: Origin) -> Option<BTreeSet<usize>> {
    region
        .records
        .iter()
        .filter(|r| r.origin == origin)
        .map(|r| match origin {
            Origin::New => r.new_line,
            _ => r.local_line,
        })
        .collect()
}

fn covers(block: &SemanticBlock, doc: &Document, lines: &BTreeSet<usize>) -> bool {
    let expected: BTreeSet<usize> = (block.start_line..=block.end_line)
        .filter(|&n| doc.get(n - 1).is_some_and(|l| !l.trim().is_empty()))
        .collect();
    lines.iter().all(|n| block.contains(*n)) && expected.iter().all(|n| lines.contains(n))
}
