//! Chapter tables of concatenated videos
//!
//! Chapters are read from ffmetadata side-car files, synthesized for files
//! that carry none, and shifted onto the output timeline as each file is
//! appended to a run.

pub mod ffmetadata;

pub use ffmetadata::{parse, read_chapters, render_chapters};

use serde::{Deserialize, Serialize};

/// Time unit of a chapter, in seconds per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timebase {
    pub numerator: i32,
    pub denominator: i32,
}

impl Timebase {
    /// Default timebase of ffmetadata chapters (nanoseconds)
    pub const NANOSECONDS: Timebase = Timebase::new(1, 1_000_000_000);
    pub const MICROSECONDS: Timebase = Timebase::new(1, 1_000_000);

    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert seconds into ticks of this timebase, truncating toward zero
    pub fn ticks(&self, seconds: f64) -> i64 {
        (seconds * f64::from(self.denominator) / f64::from(self.numerator)) as i64
    }
}

/// A single chapter; `start` and `end` are counted in `timebase` ticks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterEntry {
    pub timebase: Timebase,
    pub start: i64,
    pub end: i64,
    pub title: String,
}

impl ChapterEntry {
    /// An empty chapter as opened by a `[CHAPTER]` section header
    pub fn opened() -> Self {
        Self {
            timebase: Timebase::NANOSECONDS,
            start: 0,
            end: 0,
            title: String::new(),
        }
    }
}

/// A chapter spanning a whole file, title left for the caller
pub fn synthesize_default(file_duration: f64) -> ChapterEntry {
    let timebase = Timebase::MICROSECONDS;
    ChapterEntry {
        timebase,
        start: 0,
        end: timebase.ticks(file_duration),
        title: String::new(),
    }
}

/// Shift every chapter by `offset_seconds`, each in its own timebase
pub fn rebase(entries: &mut [ChapterEntry], offset_seconds: f64) {
    for entry in entries.iter_mut() {
        let offset = entry.timebase.ticks(offset_seconds);
        entry.start = entry.start.saturating_add(offset);
        entry.end = entry.end.saturating_add(offset);
    }
}
