//! Conflict grouping.
//!
//! Splits a record sequence into alternating shared runs and conflict
//! regions. A conflict region is a maximal run of records none of which is
//! Both-origin; it is bounded by a shared record or the end of the sequence.

use serde::Serialize;

use crate::record::{MergeRecord, Origin};

/// A maximal run of non-shared records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConflictRegion {
    /// 0-based position among the conflict regions of the sequence.
    pub index: usize,
    /// The region's records in original order.
    pub records: Vec<MergeRecord>,
}

impl ConflictRegion {
    /// Local-origin lines, in original relative order.
    pub fn local_lines(&self) -> Vec<&str> {
        self.lines_of(Origin::Local)
    }

    /// New-origin lines, in original relative order.
    pub fn new_lines(&self) -> Vec<&str> {
        self.lines_of(Origin::New)
    }

    /// Records of one origin, in original relative order.
    pub fn records_of(&self, origin: Origin) -> impl Iterator<Item = &MergeRecord> + '_ {
        self.records.iter().filter(move |r| r.origin == origin)
    }

    /// Returns `true` if only one side contributes lines.
    pub fn is_one_sided(&self) -> bool {
        let has_local = self.records.iter().any(|r| r.origin == Origin::Local);
        let has_new = self.records.iter().any(|r| r.origin == Origin::New);
        has_local != has_new
    }

    fn lines_of(&self, origin: Origin) -> Vec<&str> {
        self.records_of(origin).map(|r| r.content.as_str()).collect()
    }
}

/// One piece of a grouped record sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    /// A maximal run of Both-origin records.
    Shared { records: Vec<MergeRecord> },
    /// A maximal run of non-Both records.
    Conflict(ConflictRegion),
}

impl Segment {
    /// The records covered by this segment.
    pub fn records(&self) -> &[MergeRecord] {
        match self {
            Segment::Shared { records } => records,
            Segment::Conflict(region) => &region.records,
        }
    }
}

/// Group `records` into alternating shared runs and conflict regions.
pub fn group(records: &[MergeRecord]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut regions = 0usize;

    for record in records {
        match (segments.last_mut(), record.is_shared()) {
            (Some(Segment::Shared { records }), true) => records.push(record.clone()),
            (Some(Segment::Conflict(region)), false) => region.records.push(record.clone()),
            (_, true) => segments.push(Segment::Shared {
                records: vec![record.clone()],
            }),
            (_, false) => {
                segments.push(Segment::Conflict(ConflictRegion {
                    index: regions,
                    records: vec![record.clone()],
                }));
                regions += 1;
            }
        }
    }

    segments
}

/// Only the conflict regions of `records`.
pub fn conflict_regions(records: &[MergeRecord]) -> Vec<ConflictRegion> {
    group(records)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Conflict(region) => Some(region),
            Segment::Shared { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence() -> Vec<MergeRecord> {
        vec![
            MergeRecord::both("A"),
            MergeRecord::local("B"),
            MergeRecord::new_only("X"),
            MergeRecord::local("B2"),
            MergeRecord::both("C"),
            MergeRecord::both("D"),
            MergeRecord::new_only("Y"),
        ]
    }

    #[test]
    fn groups_maximal_runs() {
        let segments = group(&sequence());
        assert_eq!(segments.len(), 4);
        assert!(matches!(segments[0], Segment::Shared { .. }));
        assert!(matches!(segments[1], Segment::Conflict(_)));
        assert_eq!(segments[2].records().len(), 2);
        assert!(matches!(segments[3], Segment::Conflict(_)));
    }

    #[test]
    fn region_splits_sides_preserving_order() {
        let regions = conflict_regions(&sequence());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].local_lines(), vec!["B", "B2"]);
        assert_eq!(regions[0].new_lines(), vec!["X"]);
        let locals: Vec<Option<usize>> = regions[0].records_of(Origin::Local).map(|r| r.local_line).collect();
        assert_eq!(locals.len(), 2);
        assert!(!regions[0].is_one_sided());
        assert_eq!(regions[1].index, 1);
        assert!(regions[1].is_one_sided());
    }

    #[test]
    fn concatenation_reconstructs_sequence() {
        let records = sequence();
        let rebuilt: Vec<MergeRecord> = group(&records)
            .iter()
            .flat_map(|s| s.records().to_vec())
            .collect();
        assert_eq!(rebuilt, records);
    }

    #[test]
    fn empty_and_all_shared() {
        assert!(group(&[]).is_empty());
        let shared = vec![MergeRecord::both("a"), MergeRecord::both("b")];
        assert_eq!(group(&shared).len(), 1);
        assert!(conflict_regions(&shared).is_empty());
    }
}
