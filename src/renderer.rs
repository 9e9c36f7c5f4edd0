// src/renderer.rs

use crate::diff_view::{DiffRow, RowKind};
use crate::model::{Future, LineRef};
use crate::registry::BlameView;
use std::io::{self, Write};

/// Width of a displayed hash column
pub const HASH_WIDTH: usize = 16;

const STILL_EXISTS: &str = " (still exists) ";
const ELIDED: &str = "        .       ";

pub fn render_json<W: Write>(view: &BlameView, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, view)?;
    writeln!(out)
}

/// Plain text in columns: previous commit and line, next commit and line,
/// a `-`/`+` marker and the line itself.
pub fn render_text<W: Write>(view: &BlameView, out: &mut W) -> io::Result<()> {
    writeln!(out, "commit  {}", view.commit.hash)?;
    writeln!(out, "author  {}", view.commit.author)?;
    writeln!(out, "date    {}", view.commit.date)?;
    writeln!(out, "subject {}", view.commit.subject)?;
    writeln!(out, "file    {}", view.path)?;
    if let Some(previous) = &view.previous_commit {
        writeln!(out, "previous {}", previous)?;
    }
    if let Some(next) = &view.next_commit {
        writeln!(out, "next     {}", next)?;
    }
    writeln!(out)?;

    for row in &view.rows {
        render_row(row, out)?;
    }
    Ok(())
}

fn render_row<W: Write>(row: &DiffRow, out: &mut W) -> io::Result<()> {
    if let RowKind::Elided { .. } = row.kind {
        for _ in 0..3 {
            writeln!(out, "{} {:>5} {} {:>5}", ELIDED, "", ELIDED, "")?;
        }
        return Ok(());
    }

    let marker = match row.kind {
        RowKind::Removed => '-',
        RowKind::Added => '+',
        _ => ' ',
    };
    writeln!(
        out,
        "{} {} {} {} {}{}",
        previous_column(row.previous.as_ref()),
        line_number(row.old_line),
        next_column(row.next.as_ref()),
        line_number(row.new_line),
        marker,
        row.text
    )
}

fn previous_column(previous: Option<&LineRef>) -> String {
    match previous {
        Some(line) => short_hash(&line.commit),
        None => " ".repeat(HASH_WIDTH),
    }
}

fn next_column(next: Option<&Future>) -> String {
    match next {
        Some(Future::ModifiedBy(line)) => short_hash(&line.commit),
        Some(Future::StillExists) => STILL_EXISTS.to_string(),
        None => " ".repeat(HASH_WIDTH),
    }
}

fn short_hash(hash: &str) -> String {
    format!("{:<width$}", hash.chars().take(HASH_WIDTH).collect::<String>(), width = HASH_WIDTH)
}

fn line_number(n: usize) -> String {
    match n {
        0 => format!("{:>5}", ""),
        n => format!("{:>5}", n),
    }
}
