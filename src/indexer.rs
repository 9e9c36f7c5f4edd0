// src/indexer.rs

//! The fold step: applies one commit's hunks to a file's attribution state.

use crate::error::StepError;
use crate::model::*;

/// Reads a run list front to back, splitting runs when a read ends inside one.
pub(crate) struct RunCursor<'a, T> {
    runs: &'a [Run<T>],
    next: usize,
    /// What is left of a run the previous read ended inside
    pending: Option<Run<T>>,
    position: usize,
    total: usize,
}

impl<'a, T: Offset> RunCursor<'a, T> {
    pub(crate) fn new(runs: &'a [Run<T>]) -> Self {
        RunCursor { runs, next: 0, pending: None, position: 0, total: line_count(runs) }
    }

    /// Lines consumed so far
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Moves the next `n` lines to `out`, keeping their attribution.
    pub(crate) fn copy(&mut self, n: usize, out: &mut Vec<Run<T>>) -> Result<(), StepError> {
        self.take(n, |run| out.push(run))
    }

    /// Consumes the next `n` lines without keeping them.
    pub(crate) fn skip(&mut self, n: usize) -> Result<(), StepError> {
        self.take(n, |_| {})
    }

    pub(crate) fn copy_rest(mut self, out: &mut Vec<Run<T>>) {
        out.extend(self.pending.take());
        out.extend(self.runs[self.next..].iter().cloned());
    }

    fn take(&mut self, n: usize, mut sink: impl FnMut(Run<T>)) -> Result<(), StepError> {
        let past_end = StepError::PastEnd { wanted: n, at: self.position + 1, available: self.total };
        if self.position + n > self.total {
            return Err(past_end);
        }
        let mut left = n;
        while left > 0 {
            let Some(run) = self.next_run() else {
                return Err(past_end);
            };
            if run.length <= left {
                left -= run.length;
                sink(run);
            } else {
                let (head, tail) = run.split(left);
                self.pending = Some(tail);
                left = 0;
                sink(head);
            }
        }
        self.position += n;
        Ok(())
    }

    fn next_run(&mut self) -> Option<Run<T>> {
        if let Some(run) = self.pending.take() {
            return Some(run);
        }
        let run = self.runs.get(self.next)?.clone();
        self.next += 1;
        Some(run)
    }
}

/// Number of unchanged lines between the cursors and the start of `hunk`.
///
/// The side with lines is the anchor: an insertion is placed by its new
/// position, a deletion by its old one.
pub(crate) fn gap(
    index: usize,
    hunk: &Hunk,
    old_cursor: usize,
    new_cursor: usize,
) -> Result<usize, StepError> {
    if hunk.old_length == 0 && hunk.new_length == 0 {
        return Err(StepError::EmptyHunk { index });
    }
    let (anchor, cursor) = if hunk.new_length > 0 {
        (hunk.new_start, new_cursor)
    } else {
        (hunk.old_start, old_cursor)
    };
    anchor
        .checked_sub(1)
        .and_then(|before| before.checked_sub(cursor))
        .ok_or(StepError::Backwards { index, anchor, cursor })
}

/// Applies `commit` to the attribution state `segments`, returning the new state.
///
/// Unchanged lines keep their attribution, deleted lines are dropped and
/// every hunk's new lines become one segment owned by `commit`.
pub fn step(segments: &[BlameSegment], commit: &FileCommit) -> Result<BlameSegments, StepError> {
    let mut input = RunCursor::new(segments);
    let mut output = Vec::with_capacity(segments.len() + 2 * commit.hunks.len());
    let mut new_cursor = 0;

    for (index, hunk) in commit.hunks.iter().enumerate() {
        let unchanged = gap(index, hunk, input.position(), new_cursor)?;
        input.copy(unchanged, &mut output)?;
        new_cursor += unchanged;

        input.skip(hunk.old_length)?;

        if hunk.new_length > 0 {
            let owner = LineRef { commit: commit.hash.clone(), line: hunk.new_start };
            output.push(Run::new(hunk.new_length, owner));
            new_cursor += hunk.new_length;
        }
    }
    input.copy_rest(&mut output);
    Ok(output)
}
