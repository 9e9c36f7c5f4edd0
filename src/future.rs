// src/future.rs

//! Forward pointers: for every line of every indexed state, the next commit
//! that removes or replaces it.
//!
//! This is the fold in `indexer` run backwards. Starting from the newest
//! state, where every line still exists, each commit is undone: lines it left
//! alone inherit whatever happens to them later, lines it added disappear,
//! and lines it removed are pointed at the commit itself.

use crate::error::{Error, Result, StepError};
use crate::indexer::{gap, RunCursor};
use crate::model::*;

/// Rebuilds the future state before `commit` from the future state after it.
///
/// Removed lines are numbered by their position in the file `commit` was
/// applied to, which is where they show up in that commit's diff.
pub fn unstep(after: &[FutureSegment], commit: &FileCommit) -> std::result::Result<FutureSegments, StepError> {
    let mut input = RunCursor::new(after);
    let mut output = Vec::with_capacity(after.len() + commit.hunks.len());
    let mut old_cursor = 0;

    for (index, hunk) in commit.hunks.iter().enumerate() {
        let unchanged = gap(index, hunk, old_cursor, input.position())?;
        input.copy(unchanged, &mut output)?;
        old_cursor += unchanged;

        if hunk.old_length > 0 {
            let touch = LineRef { commit: commit.hash.clone(), line: old_cursor + 1 };
            output.push(Run::new(hunk.old_length, Future::ModifiedBy(touch)));
            old_cursor += hunk.old_length;
        }

        input.skip(hunk.new_length)?;
    }
    input.copy_rest(&mut output);
    Ok(output)
}

/// Computes the future state for each entry of `snapshots`, which must be
/// the forward fold of `history`.
pub fn attribute(
    path: &str,
    history: &[FileCommit],
    snapshots: &[BlameSegments],
) -> Result<Vec<FutureSegments>> {
    let Some(newest) = snapshots.last() else {
        return Ok(Vec::new());
    };

    let mut futures = Vec::with_capacity(snapshots.len());
    let mut state: FutureSegments = match line_count(newest) {
        0 => Vec::new(),
        lines => vec![Run::new(lines, Future::StillExists)],
    };

    for i in (1..snapshots.len()).rev() {
        let commit = &history[i];
        let before = unstep(&state, commit)
            .and_then(|before| {
                let expected = line_count(&snapshots[i - 1]);
                let actual = line_count(&before);
                if expected == actual {
                    Ok(before)
                } else {
                    Err(StepError::Mismatch { expected, actual })
                }
            })
            .map_err(|source| Error::MalformedHistory {
                path: path.to_string(),
                commit: commit.hash.to_string(),
                source,
            })?;
        futures.push(std::mem::replace(&mut state, before));
    }
    futures.push(state);
    futures.reverse();
    Ok(futures)
}
