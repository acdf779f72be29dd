//! Reading and writing the `ffmetadata` text format

use super::{ChapterEntry, Timebase};
use crate::error::{ConcatError, Result};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

/// Parse chapters from ffmetadata text.
///
/// Lines that are not `KEY=VALUE` pairs are skipped, as are values that do
/// not parse. Keys outside `[CHAPTER]` sections are ignored.
pub fn parse(metadata: &str) -> Vec<ChapterEntry> {
    let mut chapters: Vec<ChapterEntry> = Vec::new();
    let mut in_chapter = false;

    for line in logical_lines(metadata) {
        let line = line.as_str();

        if let Some(name) = section_name(line) {
            in_chapter = name == "CHAPTER";
            if in_chapter {
                chapters.push(ChapterEntry::opened());
            }
            continue;
        }

        if !in_chapter || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        let Some(chapter) = chapters.last_mut() else {
            continue;
        };

        match key.to_uppercase().as_str() {
            "TIMEBASE" => {
                if let Some(timebase) = parse_timebase(&value) {
                    chapter.timebase = timebase;
                }
            }
            "START" => {
                if let Ok(start) = value.trim().parse() {
                    chapter.start = start;
                }
            }
            "END" => {
                if let Ok(end) = value.trim().parse() {
                    chapter.end = end;
                }
            }
            "TITLE" => chapter.title = value,
            _ => {}
        }
    }

    chapters
}

/// Read a side-car metadata file and parse its chapters
pub async fn read_chapters(path: &Path) -> Result<Vec<ChapterEntry>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConcatError::ChapterParse {
            path: path.to_path_buf(),
            source,
        })?;

    let chapters = parse(&content);
    debug!("Parsed {} chapters from {}", chapters.len(), path.display());
    Ok(chapters)
}

/// Render chapters as `[CHAPTER]` sections, in order
pub fn render_chapters<'a>(chapters: impl IntoIterator<Item = &'a ChapterEntry>) -> String {
    let mut out = String::new();
    for chapter in chapters {
        // writing into a String cannot fail
        let _ = writeln!(out, "[CHAPTER]");
        let _ = writeln!(
            out,
            "TIMEBASE={}/{}",
            chapter.timebase.numerator, chapter.timebase.denominator
        );
        let _ = writeln!(out, "START={}", chapter.start);
        let _ = writeln!(out, "END={}", chapter.end);
        let _ = writeln!(out, "TITLE={}", escape(&chapter.title));
    }
    out
}

/// Lines with a trailing escaped newline continue on the next line
fn logical_lines(metadata: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for raw_line in metadata.lines() {
        let raw_line = raw_line.trim_end_matches('\r');
        let line = match pending.take() {
            Some(mut joined) => {
                joined.push('\n');
                joined.push_str(raw_line);
                joined
            }
            None => raw_line.to_string(),
        };

        if ends_with_escape(&line) {
            pending = Some(line);
        } else {
            lines.push(line);
        }
    }

    lines.extend(pending);
    lines
}

fn ends_with_escape(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn section_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let name = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Split on the first unescaped `=`; both sides must be non-empty
fn split_key_value(line: &str) -> Option<(String, String)> {
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '=' if !escaped => {
                let key = &line[..index];
                let value = &line[index + 1..];
                if key.is_empty() || value.is_empty() {
                    return None;
                }
                return Some((unescape(key), unescape(value)));
            }
            _ => escaped = false,
        }
    }
    None
}

fn parse_timebase(value: &str) -> Option<Timebase> {
    let (numerator, denominator) = value.trim().split_once('/')?;
    let numerator: i32 = numerator.trim().parse().ok()?;
    let denominator: i32 = denominator.trim().parse().ok()?;
    if numerator == 0 || denominator == 0 {
        return None;
    }
    Some(Timebase::new(numerator, denominator))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
