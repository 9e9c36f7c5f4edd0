// src/diff_view.rs

//! Lays out one commit's changes to one file as rows annotated with where
//! each line came from and where it goes next.
//!
//! Unchanged runs between hunks are shown in full up to [`MAX_UNELIDED`]
//! lines. Longer runs keep [`CONTEXT_LINES`] rows on either side and collapse
//! the middle into a single [`RowKind::Elided`] row.

use crate::error::StepError;
use crate::model::{Future, Hunk, LineRef};
use serde::Serialize;

/// Rows of context kept next to every edit
pub const CONTEXT_LINES: usize = 3;

/// Longest unchanged run that is shown without elision
pub const MAX_UNELIDED: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowKind {
    Context,
    Removed,
    Added,
    /// Stands in for `hidden` unchanged lines
    Elided { hidden: usize },
}

/// One display row.
///
/// Line numbers are 1-based, with 0 meaning the row has no line on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    #[serde(flatten)]
    pub kind: RowKind,
    /// Who introduced the old line; `None` when there is no old side
    pub previous: Option<LineRef>,
    /// What happens next to the new line; `None` when there is no new side
    pub next: Option<Future>,
    pub old_line: usize,
    pub new_line: usize,
    pub text: String,
}

/// Walks the old and new file side by side, one hunk at a time.
pub struct DiffViewBuilder<'a> {
    blame: &'a [LineRef],
    future: &'a [Future],
    old_lines: &'a [String],
    new_lines: &'a [String],
    /// Next old line (0-based)
    j: usize,
    /// Next new line (0-based)
    k: usize,
    rows: Vec<DiffRow>,
}

impl<'a> DiffViewBuilder<'a> {
    /// `blame` must describe `old_lines` and `future` must describe `new_lines`.
    pub fn new(
        blame: &'a [LineRef],
        future: &'a [Future],
        old_lines: &'a [String],
        new_lines: &'a [String],
    ) -> Result<Self, StepError> {
        if blame.len() != old_lines.len() {
            return Err(StepError::Mismatch { expected: blame.len(), actual: old_lines.len() });
        }
        if future.len() != new_lines.len() {
            return Err(StepError::Mismatch { expected: future.len(), actual: new_lines.len() });
        }
        Ok(DiffViewBuilder {
            blame,
            future,
            old_lines,
            new_lines,
            j: 0,
            k: 0,
            rows: Vec::with_capacity(old_lines.len().max(new_lines.len())),
        })
    }

    pub fn build(mut self, hunks: &[Hunk]) -> Result<Vec<DiffRow>, StepError> {
        for (index, hunk) in hunks.iter().enumerate() {
            if hunk.old_length > 0 {
                let distance = distance_to(index, hunk.old_start, self.j)?;
                self.context(distance)?;
                for _ in 0..hunk.old_length {
                    self.removed()?;
                }
            }
            if hunk.new_length > 0 {
                let distance = distance_to(index, hunk.new_start, self.k)?;
                self.context(distance)?;
                for _ in 0..hunk.new_length {
                    self.added()?;
                }
            }
        }

        let rest = self.old_lines.len() - self.j;
        self.context(rest)?;

        if self.k != self.new_lines.len() {
            return Err(StepError::Mismatch { expected: self.new_lines.len(), actual: self.k });
        }
        Ok(self.rows)
    }

    /// Emits an unchanged run of `distance` lines, eliding the middle of long ones.
    fn context(&mut self, distance: usize) -> Result<(), StepError> {
        let old_end = self.j + distance;
        if old_end > self.old_lines.len() {
            return Err(self.past_end(distance, self.j, self.old_lines.len()));
        }
        if self.k + distance > self.new_lines.len() {
            return Err(self.past_end(distance, self.k, self.new_lines.len()));
        }

        if distance <= MAX_UNELIDED {
            for _ in 0..distance {
                self.both();
            }
            return Ok(());
        }

        for _ in 0..CONTEXT_LINES {
            self.both();
        }
        let hidden = distance - 2 * CONTEXT_LINES;
        self.j += hidden;
        self.k += hidden;
        self.rows.push(DiffRow {
            kind: RowKind::Elided { hidden },
            previous: None,
            next: None,
            old_line: 0,
            new_line: 0,
            text: String::new(),
        });
        for _ in 0..CONTEXT_LINES {
            self.both();
        }
        Ok(())
    }

    /// Only called once `context` has checked both sides have room.
    fn both(&mut self) {
        self.rows.push(DiffRow {
            kind: RowKind::Context,
            previous: Some(self.blame[self.j].clone()),
            next: Some(self.future[self.k].clone()),
            old_line: self.j + 1,
            new_line: self.k + 1,
            text: self.old_lines[self.j].clone(),
        });
        self.j += 1;
        self.k += 1;
    }

    fn removed(&mut self) -> Result<(), StepError> {
        let (Some(owner), Some(text)) = (self.blame.get(self.j), self.old_lines.get(self.j)) else {
            return Err(self.past_end(1, self.j, self.old_lines.len()));
        };
        self.rows.push(DiffRow {
            kind: RowKind::Removed,
            previous: Some(owner.clone()),
            next: None,
            old_line: self.j + 1,
            new_line: 0,
            text: text.clone(),
        });
        self.j += 1;
        Ok(())
    }

    fn added(&mut self) -> Result<(), StepError> {
        let (Some(fate), Some(text)) = (self.future.get(self.k), self.new_lines.get(self.k)) else {
            return Err(self.past_end(1, self.k, self.new_lines.len()));
        };
        self.rows.push(DiffRow {
            kind: RowKind::Added,
            previous: None,
            next: Some(fate.clone()),
            old_line: 0,
            new_line: self.k + 1,
            text: text.clone(),
        });
        self.k += 1;
        Ok(())
    }

    fn past_end(&self, wanted: usize, cursor: usize, available: usize) -> StepError {
        StepError::PastEnd { wanted, at: cursor + 1, available }
    }
}

/// Unchanged lines between a cursor and a hunk starting at 1-based `start`.
fn distance_to(index: usize, start: usize, cursor: usize) -> Result<usize, StepError> {
    start
        .checked_sub(cursor + 1)
        .ok_or(StepError::Backwards { index, anchor: start, cursor })
}
