//! Progress decoding for ffmpeg output

use chrono::NaiveTime;
use regex::Regex;
use std::sync::LazyLock;

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.(\d{2})").expect("time pattern is valid")
});

/// Milliseconds of output written so far, from the latest `time=` in stderr
pub fn decode_ffmpeg_progress(_stdout: &str, stderr: &str) -> Option<i64> {
    let captures = TIME_PATTERN.captures_iter(stderr).last()?;
    let field = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<i64>().ok());

    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    let centiseconds = field(4)?;

    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + centiseconds * 10)
}

/// Render milliseconds as `00h01m05s120ms`
pub fn format_time(millis: i64) -> String {
    let millis = millis.max(0);
    let secs = (millis / 1000) as u32;
    let nanos = ((millis % 1000) * 1_000_000) as u32;
    match NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos) {
        Some(time) => time.format("%Hh%Mm%Ss%3fms").to_string(),
        // a day or longer
        None => format!("{}s", millis / 1000),
    }
}

/// Render `current/total` progress
pub fn format_time_progress(current: i64, total: i64) -> String {
    format!("{}/{}", format_time(current), format_time(total))
}
