//! Conflict resolution channel for the interactive strategy.
//!
//! The engine hands each conflict region to a [`ConflictResolver`] as a
//! [`ConflictRequest`] and blocks until a [`Resolution`] comes back. Exactly
//! one request is in flight at a time.
//!
//! Three resolvers ship with the crate:
//!
//! - closures `FnMut(&ConflictRequest) -> Result<Resolution>`
//! - [`ScriptedResolver`] replays a fixed list of answers
//! - [`channel`] pairs a [`ChannelResolver`] with a [`ResolutionHandle`]
//!   that can be driven from another thread, with an optional timeout

use std::collections::VecDeque;
use std::fmt;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict::ConflictRegion;
use crate::error::{MergeError, Result};
use crate::record::{MergeRecord, Origin};

/// Sentinel line terminating a freeform replacement by default.
pub const DEFAULT_END_SENTINEL: &str = "END";

/// One conflict region presented for a decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRequest {
    /// 0-based region index within the merge.
    pub region: usize,
    /// Local-origin lines of the region, in order.
    pub local: Vec<String>,
    /// New-origin lines of the region, in order.
    pub new: Vec<String>,
}

impl From<&ConflictRegion> for ConflictRequest {
    fn from(region: &ConflictRegion) -> Self {
        Self {
            region: region.index,
            local: region.local_lines().into_iter().map(str::to_owned).collect(),
            new: region.new_lines().into_iter().map(str::to_owned).collect(),
        }
    }
}

/// The four legal answers to a conflict request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", content = "lines", rename_all = "kebab-case")]
pub enum Resolution {
    /// Keep the local-origin lines.
    KeepLocal,
    /// Keep the new-origin lines.
    KeepNew,
    /// Keep local-origin lines followed by new-origin lines.
    KeepBoth,
    /// Replace the region with caller-supplied lines.
    Replace(Vec<String>),
}

impl Resolution {
    /// The records this answer contributes to the output for `region`.
    ///
    /// Kept records retain their document positions; replacement lines
    /// have none.
    pub fn records_for(&self, region: &ConflictRegion) -> Vec<MergeRecord> {
        match self {
            Resolution::KeepLocal => region.records_of(Origin::Local).cloned().collect(),
            Resolution::KeepNew => region.records_of(Origin::New).cloned().collect(),
            Resolution::KeepBoth => region
                .records_of(Origin::Local)
                .chain(region.records_of(Origin::New))
                .cloned()
                .collect(),
            Resolution::Replace(lines) => lines
                .iter()
                .map(|line| MergeRecord::new_only(line.as_str()))
                .collect(),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::KeepLocal => "keep-local",
            Resolution::KeepNew => "keep-new",
            Resolution::KeepBoth => "keep-both",
            Resolution::Replace(_) => "replace",
        }
    }
}

/// A menu answer, before any replacement text has been collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    KeepLocal,
    KeepNew,
    KeepBoth,
    Edit,
}

impl Choice {
    /// All choices in menu order.
    pub const ALL: [Choice; 4] = [Choice::KeepLocal, Choice::KeepNew, Choice::KeepBoth, Choice::Edit];

    /// Decode a menu answer (`1`-`4`), ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Choice::KeepLocal),
            "2" => Some(Choice::KeepNew),
            "3" => Some(Choice::KeepBoth),
            "4" => Some(Choice::Edit),
            _ => None,
        }
    }

    /// The menu number of this choice.
    pub fn number(&self) -> u8 {
        match self {
            Choice::KeepLocal => 1,
            Choice::KeepNew => 2,
            Choice::KeepBoth => 3,
            Choice::Edit => 4,
        }
    }

    /// Convert into a resolution; `Edit` takes the collected lines.
    pub fn into_resolution(self, replacement: Vec<String>) -> Resolution {
        match self {
            Choice::KeepLocal => Resolution::KeepLocal,
            Choice::KeepNew => Resolution::KeepNew,
            Choice::KeepBoth => Resolution::KeepBoth,
            Choice::Edit => Resolution::Replace(replacement),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Choice::KeepLocal => "Keep LOCAL version",
            Choice::KeepNew => "Keep NEW version",
            Choice::KeepBoth => "Keep BOTH versions (local then new)",
            Choice::Edit => "Edit manually",
        };
        write!(f, "{}. {}", self.number(), text)
    }
}

/// Read replacement lines until `sentinel` appears on a line by itself.
///
/// Returns `Ok(None)` if input ends before the sentinel.
pub fn read_replacement<R: BufRead>(reader: &mut R, sentinel: &str) -> std::io::Result<Option<Vec<String>>> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        let line = buf.trim_end_matches(['\n', '\r']);
        if line == sentinel {
            return Ok(Some(lines));
        }
        lines.push(line.to_string());
    }
}

/// Source of decisions for interactive merges.
pub trait ConflictResolver {
    /// Decide one conflict region. Blocks until a decision is available.
    ///
    /// An error aborts the whole merge.
    fn resolve(&mut self, request: &ConflictRequest) -> Result<Resolution>;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&ConflictRequest) -> Result<Resolution>,
{
    fn resolve(&mut self, request: &ConflictRequest) -> Result<Resolution> {
        self(request)
    }
}

/// Replays a fixed list of answers; running out counts as abandonment.
#[derive(Clone, Debug, Default)]
pub struct ScriptedResolver {
    answers: VecDeque<Resolution>,
    asked: Vec<ConflictRequest>,
}

impl ScriptedResolver {
    /// Answer requests with `answers`, in order.
    pub fn new(answers: impl IntoIterator<Item = Resolution>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Every request received so far.
    pub fn requests(&self) -> &[ConflictRequest] {
        &self.asked
    }
}

impl ConflictResolver for ScriptedResolver {
    fn resolve(&mut self, request: &ConflictRequest) -> Result<Resolution> {
        self.asked.push(request.clone());
        self.answers
            .pop_front()
            .ok_or(MergeError::ResolutionAbandoned { region: request.region })
    }
}

/// Create a connected resolver/handle pair.
///
/// With a `timeout`, each wait for an answer gives up after that long.
pub fn channel(timeout: Option<Duration>) -> (ChannelResolver, ResolutionHandle) {
    let (request_tx, request_rx) = mpsc::channel();
    let (response_tx, response_rx) = mpsc::channel();
    (
        ChannelResolver {
            requests: request_tx,
            responses: response_rx,
            timeout,
        },
        ResolutionHandle {
            requests: request_rx,
            responses: response_tx,
        },
    )
}

/// Engine side of a resolution channel.
#[derive(Debug)]
pub struct ChannelResolver {
    requests: Sender<ConflictRequest>,
    responses: Receiver<Resolution>,
    timeout: Option<Duration>,
}

impl ConflictResolver for ChannelResolver {
    fn resolve(&mut self, request: &ConflictRequest) -> Result<Resolution> {
        let region = request.region;
        self.requests
            .send(request.clone())
            .map_err(|_| MergeError::ResolutionAbandoned { region })?;
        debug!(region, timeout = ?self.timeout, "waiting for conflict resolution");

        match self.timeout {
            None => self
                .responses
                .recv()
                .map_err(|_| MergeError::ResolutionAbandoned { region }),
            Some(timeout) => self.responses.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => MergeError::ResolutionTimeout { region, timeout },
                RecvTimeoutError::Disconnected => MergeError::ResolutionAbandoned { region },
            }),
        }
    }
}

/// Decision-maker side of a resolution channel.
///
/// Dropping the handle abandons any pending and future requests.
#[derive(Debug)]
pub struct ResolutionHandle {
    requests: Receiver<ConflictRequest>,
    responses: Sender<Resolution>,
}

impl ResolutionHandle {
    /// Wait for the next request. `None` once the engine side is gone.
    pub fn next_request(&self) -> Option<ConflictRequest> {
        self.requests.recv().ok()
    }

    /// Send an answer. Returns `false` if the engine side is gone.
    pub fn respond(&self, resolution: Resolution) -> bool {
        self.responses.send(resolution).is_ok()
    }

    /// Answer every request with `decide` until the engine side closes.
    pub fn serve<F>(self, mut decide: F)
    where
        F: FnMut(&ConflictRequest) -> Resolution,
    {
        while let Some(request) = self.next_request() {
            if !self.respond(decide(&request)) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::thread;

    fn request() -> ConflictRequest {
        ConflictRequest {
            region: 0,
            local: vec!["B".into()],
            new: vec!["X".into(), "Y".into()],
        }
    }

    #[test]
    fn resolutions_select_records() {
        let region = ConflictRegion {
            index: 0,
            records: vec![
                MergeRecord::new_only("X").at(None, Some(2)),
                MergeRecord::local("B").at(Some(2), None),
                MergeRecord::new_only("Y").at(None, Some(3)),
            ],
        };
        let contents = |resolution: Resolution| -> Vec<String> {
            resolution.records_for(&region).into_iter().map(|r| r.content).collect()
        };
        assert_eq!(contents(Resolution::KeepLocal), vec!["B"]);
        assert_eq!(contents(Resolution::KeepNew), vec!["X", "Y"]);
        assert_eq!(contents(Resolution::KeepBoth), vec!["B", "X", "Y"]);
        assert_eq!(contents(Resolution::Replace(vec!["Z".into()])), vec!["Z"]);

        let kept = Resolution::KeepBoth.records_for(&region);
        assert_eq!(kept[0].local_line, Some(2));
        assert_eq!(kept[2].new_line, Some(3));
        assert!(Resolution::Replace(vec!["Z".into()]).records_for(&region)[0].new_line.is_none());
    }

    #[test]
    fn choices_parse_menu_numbers() {
        assert_eq!(Choice::parse(" 1\n"), Some(Choice::KeepLocal));
        assert_eq!(Choice::parse("4"), Some(Choice::Edit));
        assert_eq!(Choice::parse("5"), None);
        assert_eq!(Choice::parse("local"), None);
        for choice in Choice::ALL {
            assert_eq!(Choice::parse(&choice.number().to_string()), Some(choice));
        }
    }

    #[test]
    fn choice_display_matches_menu() {
        assert_eq!(Choice::KeepBoth.to_string(), "3. Keep BOTH versions (local then new)");
    }

    #[test]
    fn replacement_stops_at_sentinel() {
        let mut input = Cursor::new("first\r\nsecond\nEND\nignored\n");
        let lines = read_replacement(&mut input, "END").unwrap();
        assert_eq!(lines, Some(vec!["first".to_string(), "second".to_string()]));
    }

    #[test]
    fn replacement_without_sentinel_is_none() {
        let mut input = Cursor::new("first\n");
        assert_eq!(read_replacement(&mut input, "END").unwrap(), None);
    }

    #[test]
    fn sentinel_must_be_whole_line() {
        let mut input = Cursor::new("END of story\nEND\n");
        let lines = read_replacement(&mut input, "END").unwrap().unwrap();
        assert_eq!(lines, vec!["END of story"]);
    }

    #[test]
    fn scripted_resolver_exhaustion_abandons() {
        let mut resolver = ScriptedResolver::new([Resolution::KeepNew]);
        assert_eq!(resolver.resolve(&request()).unwrap(), Resolution::KeepNew);
        let err = resolver.resolve(&request()).unwrap_err();
        assert!(matches!(err, MergeError::ResolutionAbandoned { region: 0 }));
        assert_eq!(resolver.requests().len(), 2);
    }

    #[test]
    fn closure_is_a_resolver() {
        let mut calls = 0;
        let mut resolver = |_: &ConflictRequest| {
            calls += 1;
            Ok(Resolution::KeepBoth)
        };
        assert_eq!(resolver.resolve(&request()).unwrap(), Resolution::KeepBoth);
        assert_eq!(calls, 1);
    }

    #[test]
    fn channel_round_trip_across_threads() {
        let (mut resolver, handle) = channel(None);
        let worker = thread::spawn(move || handle.serve(|req| Resolution::Replace(req.new.clone())));
        let answer = resolver.resolve(&request()).unwrap();
        assert_eq!(answer, Resolution::Replace(vec!["X".into(), "Y".into()]));
        drop(resolver);
        worker.join().unwrap();
    }

    #[test]
    fn dropped_handle_abandons() {
        let (mut resolver, handle) = channel(None);
        drop(handle);
        let err = resolver.resolve(&request()).unwrap_err();
        assert!(matches!(err, MergeError::ResolutionAbandoned { .. }));
    }

    #[test]
    fn silent_handle_times_out() {
        let (mut resolver, _handle) = channel(Some(Duration::from_millis(20)));
        let err = resolver.resolve(&request()).unwrap_err();
        assert!(matches!(err, MergeError::ResolutionTimeout { region: 0, .. }));
        assert!(err.is_abandonment());
    }

    #[test]
    fn resolution_serializes_with_choice_tag() {
        let json = serde_json::to_string(&Resolution::Replace(vec!["a".into()])).unwrap();
        assert_eq!(json, r#"{"choice":"replace","lines":["a"]}"#);
        let json = serde_json::to_string(&Resolution::KeepLocal).unwrap();
        assert_eq!(json, r#"{"choice":"keep-local"}"#);
    }
}
