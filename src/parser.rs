// src/parser.rs

//! Reads the output of
//!
//! ```text
//! git log -U0 --no-prefix --no-renames --reverse --first-parent \
//!     --format='commit %H%nauthor %an <%ae>%ndate %ci%nsubject %s' <revision>
//! ```
//!
//! into per-file commit histories. Only hunk headers matter for indexing, but
//! every hunk body is still counted off line by line so that removed or added
//! text which happens to look like a header is never mistaken for one.

use crate::error::{Error, Result};
use crate::model::*;
use std::io::BufRead;
use std::sync::Arc;

/// Arguments for `git log` that produce text this parser understands.
pub const GIT_LOG_ARGS: &[&str] = &[
    "log",
    "-U0",
    "--no-prefix",
    "--no-renames",
    "--reverse",
    "--first-parent",
    "--format=commit %H%nauthor %an <%ae>%ndate %ci%nsubject %s",
];

/// Extended header lines git prints between `diff --git` and the hunks.
const IGNORED_HEADERS: &[&str] = &[
    "index ",
    "new file mode ",
    "deleted file mode ",
    "old mode ",
    "new mode ",
    "similarity index ",
    "dissimilarity index ",
    "rename from ",
    "rename to ",
    "copy from ",
    "copy to ",
    "Binary files ",
];

pub fn parse_log<R: BufRead>(reader: R) -> Result<ParsedLog> {
    let mut parser = LogParser::default();
    for line in reader.split(b'\n') {
        let line = line?;
        parser.feed(&String::from_utf8_lossy(&line))?;
    }
    parser.finish()
}

pub fn parse_log_str(text: &str) -> Result<ParsedLog> {
    parse_log(text.as_bytes())
}

#[derive(Default)]
struct LogParser {
    log: ParsedLog,
    line_number: usize,
    commit: Option<CommitHash>,
    /// Still reading the metadata lines after `commit`
    in_header: bool,
    old_path: Option<String>,
    path: Option<String>,
    /// Body lines the current hunk still owes us
    old_left: usize,
    new_left: usize,
}

impl LogParser {
    fn feed(&mut self, line: &str) -> Result<()> {
        self.line_number += 1;

        if self.old_left > 0 || self.new_left > 0 {
            return self.hunk_body(line);
        }

        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('\\') {
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("commit ") {
            return self.start_commit(rest);
        }

        if self.commit.is_none() {
            return Err(self.error(format!("expected a commit line, found {:?}", line)));
        }

        if self.in_header && self.metadata(line) {
            return Ok(());
        }

        if line.starts_with("diff --git ") {
            self.in_header = false;
            self.old_path = None;
            self.path = None;
            return Ok(());
        }
        if IGNORED_HEADERS.iter().any(|h| line.starts_with(h)) {
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix("--- ") {
            self.in_header = false;
            self.old_path = diff_path(rest);
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix("+++ ") {
            return self.start_file(rest);
        }
        if line.starts_with("@@ ") {
            return self.start_hunk(line);
        }

        Err(self.error(format!("unrecognized line {:?}", line)))
    }

    fn hunk_body(&mut self, line: &str) -> Result<()> {
        match line.as_bytes().first() {
            Some(b'-') if self.old_left > 0 => self.old_left -= 1,
            Some(b'+') if self.old_left == 0 && self.new_left > 0 => self.new_left -= 1,
            Some(b'\\') => {}
            _ => {
                return Err(self.error(format!(
                    "truncated hunk: expected {} removed and {} added lines, found {:?}",
                    self.old_left, self.new_left, line
                )))
            }
        }
        Ok(())
    }

    fn start_commit(&mut self, rest: &str) -> Result<()> {
        let Some(hash) = rest.split_whitespace().next() else {
            return Err(self.error("commit line without a hash".to_string()));
        };
        self.commit = Some(Arc::from(hash));
        self.in_header = true;
        self.old_path = None;
        self.path = None;
        self.log.commits.push(CommitInfo { hash: hash.to_string(), ..Default::default() });
        Ok(())
    }

    fn start_file(&mut self, rest: &str) -> Result<()> {
        self.in_header = false;
        let Some(path) = diff_path(rest).or_else(|| self.old_path.clone()) else {
            return Err(self.error("file header names /dev/null on both sides".to_string()));
        };
        if let Some(commit) = &self.commit {
            self.log.file_entry(commit, &path);
        }
        self.path = Some(path);
        Ok(())
    }

    fn start_hunk(&mut self, line: &str) -> Result<()> {
        let Some(hunk) = parse_hunk_header(line) else {
            return Err(self.error(format!("bad hunk header {:?}", line)));
        };
        let (Some(commit), Some(path)) = (&self.commit, &self.path) else {
            return Err(self.error("hunk outside of a file".to_string()));
        };
        self.log.push_hunk(commit, path, hunk);
        self.old_left = hunk.old_length;
        self.new_left = hunk.new_length;
        Ok(())
    }

    fn finish(self) -> Result<ParsedLog> {
        if self.old_left > 0 || self.new_left > 0 {
            return Err(self.error(format!(
                "truncated hunk: input ended {} removed and {} added lines short",
                self.old_left, self.new_left
            )));
        }
        Ok(self.log)
    }

    /// Stores an `author`/`date`/`subject` line, returning false for anything else.
    fn metadata(&mut self, line: &str) -> bool {
        let Some(info) = self.log.commits.last_mut() else {
            return false;
        };
        if let Some(author) = field(line, "author") {
            info.author = author.to_string();
        } else if let Some(date) = field(line, "date") {
            info.date = date.to_string();
        } else if let Some(subject) = field(line, "subject") {
            info.subject = subject.to_string();
        } else {
            return false;
        }
        true
    }

    fn error(&self, message: String) -> Error {
        Error::Parse { line: self.line_number, message }
    }
}

/// Value of a `key value` metadata line.
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ')
    }
}

/// Path from a `---`/`+++` line, or `None` for `/dev/null`.
fn diff_path(raw: &str) -> Option<String> {
    let raw = raw.trim_end_matches('\t');
    if raw == "/dev/null" {
        return None;
    }
    Some(unquote(raw))
}

/// Undoes git's C-style quoting of unusual path names.
fn unquote(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.bytes().peekable();
    while let Some(b) = chars.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match chars.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&o @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(o - b'0');
                            chars.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parses `@@ -old[,len] +new[,len] @@`. A missing length means one line.
pub fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let rest = line.strip_prefix("@@ -")?;
    let (ranges, _) = rest.split_once(" @@")?;
    let (old, new) = ranges.split_once(" +")?;
    let (old_start, old_length) = parse_range(old)?;
    let (new_start, new_length) = parse_range(new)?;
    Some(Hunk { old_start, old_length, new_start, new_length })
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, length)) => Some((start.parse().ok()?, length.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
