// src/model.rs

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A commit hash, shared between every snapshot that mentions it
pub type CommitHash = Arc<str>;

/// One edit inside a unified diff, 1-indexed like the `@@` header it came from.
///
/// A zero length marks the side that has no lines; the start on that side
/// is then only an anchor ("after line N").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_length: usize,
    pub new_start: usize,
    pub new_length: usize,
}

impl Hunk {
    pub fn new(old_start: usize, old_length: usize, new_start: usize, new_length: usize) -> Self {
        Hunk { old_start, old_length, new_start, new_length }
    }
}

/// The hunks one commit applied to one file, ascending and non-overlapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommit {
    pub hash: CommitHash,
    pub hunks: Vec<Hunk>,
}

impl FileCommit {
    pub fn new(hash: &str, hunks: Vec<Hunk>) -> Self {
        FileCommit { hash: Arc::from(hash), hunks }
    }
}

/// Every commit that touched a path, oldest first
pub type FileHistory = Vec<FileCommit>;

/// A line as numbered by the commit that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LineRef {
    #[serde(serialize_with = "serialize_hash")]
    pub commit: CommitHash,
    pub line: usize,
}

impl LineRef {
    pub fn new(commit: &str, line: usize) -> Self {
        LineRef { commit: Arc::from(commit), line }
    }
}

/// What happens next to a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Future {
    /// Never touched again up to the newest commit
    StillExists,
    /// Removed or replaced by a later commit, at that commit's old line number
    ModifiedBy(LineRef),
}

/// A value that can be carried into the middle of a run of lines.
pub trait Offset: Clone {
    /// The value describing the line `n` lines further down the run
    fn offset(&self, n: usize) -> Self;
}

impl Offset for LineRef {
    fn offset(&self, n: usize) -> Self {
        LineRef { commit: self.commit.clone(), line: self.line + n }
    }
}

impl Offset for Future {
    fn offset(&self, n: usize) -> Self {
        match self {
            Future::StillExists => Future::StillExists,
            Future::ModifiedBy(line) => Future::ModifiedBy(line.offset(n)),
        }
    }
}

/// A run of consecutive lines sharing one attribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run<T> {
    pub length: usize,
    pub value: T,
}

impl<T: Offset> Run<T> {
    pub fn new(length: usize, value: T) -> Self {
        Run { length, value }
    }

    /// Splits off the first `n` lines, returning `(head, tail)`.
    pub fn split(&self, n: usize) -> (Run<T>, Run<T>) {
        debug_assert!(n < self.length);
        (
            Run { length: n, value: self.value.clone() },
            Run { length: self.length - n, value: self.value.offset(n) },
        )
    }
}

/// A run of lines last introduced by one commit
pub type BlameSegment = Run<LineRef>;

/// The attribution of a whole file at one point in history
pub type BlameSegments = Vec<BlameSegment>;

/// A run of lines sharing the same next touch
pub type FutureSegment = Run<Future>;

pub type FutureSegments = Vec<FutureSegment>;

/// One entry per current line
pub type BlameVector = Vec<LineRef>;

/// Parallel to a `BlameVector`: what happens next to each line
pub type FutureVector = Vec<Future>;

impl BlameSegment {
    pub fn blame(length: usize, commit: &str, first_line: usize) -> Self {
        Run::new(length, LineRef::new(commit, first_line))
    }
}

impl fmt::Display for BlameSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {}}}", self.length, self.value.commit)
    }
}

/// Total number of lines described by a run list
pub fn line_count<T>(runs: &[Run<T>]) -> usize {
    runs.iter().map(|r| r.length).sum()
}

/// Expands runs into one value per line.
pub fn expand<T: Offset>(runs: &[Run<T>]) -> Vec<T> {
    let mut lines = Vec::with_capacity(line_count(runs));
    for run in runs {
        lines.extend((0..run.length).map(|n| run.value.offset(n)));
    }
    lines
}

/// Formats a segment list as `[{3 a1} {1 b2}]`.
pub fn format_segments(segments: &[BlameSegment]) -> String {
    let parts: Vec<String> = segments.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(" "))
}

/// Metadata shown next to a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub subject: String,
}

/// Everything read out of a repository's history, before indexing
#[derive(Debug, Default)]
pub struct ParsedLog {
    /// Commits in the order they were applied
    pub commits: Vec<CommitInfo>,
    /// Maps each path to the commits that touched it
    pub files: HashMap<String, FileHistory>,
}

impl ParsedLog {
    /// Appends a hunk to `path` for `commit`, opening a new `FileCommit` when needed.
    pub fn push_hunk(&mut self, commit: &CommitHash, path: &str, hunk: Hunk) {
        let history = self.file_entry(commit, path);
        if let Some(last) = history.last_mut() {
            last.hunks.push(hunk);
        }
    }

    /// Makes sure `path` has an entry for `commit` and returns the file's history.
    pub fn file_entry(&mut self, commit: &CommitHash, path: &str) -> &mut FileHistory {
        let history = self.files.entry(path.to_string()).or_default();
        if history.last().map_or(true, |c| c.hash != *commit) {
            history.push(FileCommit { hash: commit.clone(), hunks: Vec::new() });
        }
        history
    }

    /// Drops file entries whose commit carried no hunks.
    pub fn prune_empty(&mut self) {
        for history in self.files.values_mut() {
            history.retain(|c| !c.hunks.is_empty());
        }
        self.files.retain(|_, history| !history.is_empty());
    }
}

fn serialize_hash<S: serde::Serializer>(hash: &CommitHash, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(hash)
}
