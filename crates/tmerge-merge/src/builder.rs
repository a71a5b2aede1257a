//! Merge block builder: hunk stream to tagged record sequence.
//!
//! [`build`] maps each hunk line to a record (`' '` → Both, `'-'` → Local,
//! `'+'` → New) and nothing else. [`build_spliced`] additionally splices the
//! unchanged regions the differ elided between hunks back in as Both-origin
//! records, which is what full-document strategies need.

use tmerge_diff::{DiffLine, Document, Hunk, HunkStream};
use tracing::{debug, warn};

use crate::record::{MergeRecord, Origin};

/// Flatten hunks into records, without re-expanding elided regions.
pub fn build(hunks: &HunkStream) -> Vec<MergeRecord> {
    let mut records = Vec::new();
    for hunk in hunks {
        push_hunk(&mut records, hunk);
    }
    records
}

/// Flatten hunks into records, splicing unchanged gaps from `local`.
///
/// Gaps are located from hunk headers. A hunk with an unusable header makes
/// the gaps on either side of it unlocatable; those are skipped.
pub fn build_spliced(hunks: &HunkStream, local: &Document) -> Vec<MergeRecord> {
    let mut records = Vec::new();
    // 0-based (local, new) positions just past the previous hunk.
    let mut cursor = Some((0usize, 0usize));
    let mut spliced = 0usize;

    for (index, hunk) in hunks.iter().enumerate() {
        let header = hunk.header();
        if !header.is_usable() {
            warn!(hunk = index, "hunk header unusable; skipping adjacent gap splices");
            push_hunk(&mut records, hunk);
            cursor = None;
            continue;
        }

        let (local_at, new_at) = (header.local_offset(), header.new_offset());
        match cursor {
            Some((local_from, new_from)) if local_at >= local_from => {
                spliced += splice(&mut records, local, local_from, local_at, new_from);
            }
            Some((local_from, _)) => {
                warn!(hunk = index, local_from, local_at, "hunk overlaps previous hunk; gap skipped");
            }
            None => {
                warn!(hunk = index, "previous hunk position unknown; gap skipped");
            }
        }

        push_hunk(&mut records, hunk);
        cursor = Some((local_at + header.local_count, new_at + header.new_count));
    }

    match cursor {
        Some((local_from, new_from)) => {
            spliced += splice(&mut records, local, local_from, local.len(), new_from);
        }
        None => warn!("last hunk position unknown; trailing gap skipped"),
    }

    debug!(hunks = hunks.len(), records = records.len(), spliced, "built merge records");
    records
}

/// Append `local[from..to]` as shared records. Returns the number appended.
fn splice(records: &mut Vec<MergeRecord>, local: &Document, from: usize, to: usize, new_from: usize) -> usize {
    let to = to.min(local.len());
    if from >= to {
        return 0;
    }
    for (i, line) in local.lines()[from..to].iter().enumerate() {
        records.push(MergeRecord::both(line.as_str()).at(Some(from + i + 1), Some(new_from + i + 1)));
    }
    to - from
}

fn push_hunk(records: &mut Vec<MergeRecord>, hunk: &Hunk) {
    let header = hunk.header();
    let positioned = header.is_usable();
    let mut local_line = header.local_offset() + 1;
    let mut new_line = header.new_offset() + 1;

    for line in &hunk.lines {
        let (origin, local_pos, new_pos) = match line {
            DiffLine::Context(_) => {
                let pos = (Origin::Both, Some(local_line), Some(new_line));
                local_line += 1;
                new_line += 1;
                pos
            }
            DiffLine::Removed(_) => {
                let pos = (Origin::Local, Some(local_line), None);
                local_line += 1;
                pos
            }
            DiffLine::Added(_) => {
                let pos = (Origin::New, None, Some(new_line));
                new_line += 1;
                pos
            }
        };
        let record = MergeRecord::new(line.text(), origin);
        records.push(if positioned {
            record.at(local_pos, new_pos)
        } else {
            record
        });
    }
}
