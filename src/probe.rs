use crate::error::{ConcatError, Result, StreamKind};
use crate::params::{ConcreteVideoInfo, Resolution};
use serde::Deserialize;
use std::path::Path;

/// Container and stream facts of one input file
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub duration: f64,
    pub video_info: ConcreteVideoInfo,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Arguments for `ffprobe` requesting stream and container info as JSON
pub fn probe_args(path: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-show_streams",
        "-show_format",
        "-of",
        "json",
        "-v",
        "quiet",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(path.to_string_lossy().to_string());
    args
}

/// Parse `ffprobe` JSON output into duration and concrete video parameters.
///
/// A file must carry both a video and an audio stream. When several streams
/// of one kind exist the last one wins.
pub fn parse_probe_output(json: &str) -> Result<ProbeResult> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| ConcatError::ProbeParse(e.to_string()))?;

    let duration_str = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .unwrap_or_default();
    let duration: f64 = duration_str
        .trim()
        .parse()
        .map_err(|_| ConcatError::ProbeParse(format!("failed to parse duration [{duration_str}]")))?;

    let mut video: Option<(String, Resolution, f64, bool)> = None;
    let mut audio_codec: Option<String> = None;

    for stream in &probe.streams {
        match stream.codec_type.as_deref() {
            Some("video") => {
                let true_rate = stream.r_frame_rate.as_deref().unwrap_or_default();
                let (num, den) = parse_fraction(true_rate)
                    .filter(|&(_, den)| den != 0)
                    .ok_or_else(|| ConcatError::RateParse(true_rate.to_string()))?;
                let avg_rate = stream.avg_frame_rate.as_deref().unwrap_or_default();
                let (avg_num, avg_den) =
                    parse_fraction(avg_rate).ok_or_else(|| ConcatError::RateParse(avg_rate.to_string()))?;

                let framerate = num as f64 / den as f64;
                // 0/0 averages yield NaN and count as variable
                let is_vfr = framerate != avg_num as f64 / avg_den as f64;
                let resolution = Resolution::new(stream.width.unwrap_or(0), stream.height.unwrap_or(0));
                let codec = stream.codec_name.clone().unwrap_or_default();
                video = Some((codec, resolution, framerate, is_vfr));
            }
            Some("audio") => {
                audio_codec = Some(stream.codec_name.clone().unwrap_or_default());
            }
            _ => {}
        }
    }

    let (video_codec, resolution, framerate, is_vfr) =
        video.ok_or(ConcatError::MissingStream(StreamKind::Video))?;
    let audio_codec = audio_codec.ok_or(ConcatError::MissingStream(StreamKind::Audio))?;

    Ok(ProbeResult {
        duration,
        video_info: ConcreteVideoInfo {
            resolution,
            framerate,
            audio_codec,
            video_codec,
            is_vfr,
            input_file_args: Vec::new(),
            encoding_args: Vec::new(),
        },
    })
}

/// Parse an `"N/D"` fraction into its two integers
pub fn parse_fraction(rate: &str) -> Option<(i64, i64)> {
    let (num, den) = rate.trim().split_once('/')?;
    Some((num.parse().ok()?, den.parse().ok()?))
}
