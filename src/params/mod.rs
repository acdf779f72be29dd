//! Video parameter values and output policy reconciliation
//!
//! Input files are probed into concrete `ConcreteVideoInfo` values. Those are
//! folded into a `VideoInfo` summary made of ranges and sets, and the user's
//! output policy (also a `VideoInfo`) is resolved against that summary.

pub mod reconcile;

pub use reconcile::{detect_batch_changes, detect_changes, resolve_output, summarize_inputs, StreamChanges};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel area, the only ordering key used for highest/lowest.
    /// Portrait and landscape frames of the same area compare equal.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A video parameter that is either observed data or an output policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoParameterValue<T> {
    /// A single concrete value
    Scalar(T),
    /// Observed extremes across all inputs
    Range { lowest: T, highest: T },
    /// Distinct observed values in first-seen order
    Set(Vec<T>),
    /// Output policy: use the highest observed value
    SameAsHighest(T),
    /// Output policy: use the lowest observed value
    SameAsLowest(T),
    /// Output policy: use the value all inputs share
    SameAsInput(T),
}

impl<T> VideoParameterValue<T> {
    pub fn as_scalar(&self) -> Option<&T> {
        match self {
            VideoParameterValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Scalars and policies may be used as output; ranges and sets may not
    pub fn is_output_policy(&self) -> bool {
        !matches!(self, VideoParameterValue::Range { .. } | VideoParameterValue::Set(_))
    }

    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            VideoParameterValue::SameAsHighest(_)
                | VideoParameterValue::SameAsLowest(_)
                | VideoParameterValue::SameAsInput(_)
        )
    }
}

impl<T: fmt::Display> fmt::Display for VideoParameterValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoParameterValue::Scalar(v) => write!(f, "{v}"),
            VideoParameterValue::Range { lowest, highest } => write!(f, "{lowest} .. {highest}"),
            VideoParameterValue::Set(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            VideoParameterValue::SameAsHighest(_) => write!(f, "same as highest"),
            VideoParameterValue::SameAsLowest(_) => write!(f, "same as lowest"),
            VideoParameterValue::SameAsInput(_) => write!(f, "same as input"),
        }
    }
}

/// Video parameters holding observed summaries or output policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub resolution: VideoParameterValue<Resolution>,
    pub framerate: VideoParameterValue<f64>,
    pub audio_codec: VideoParameterValue<String>,
    pub video_codec: VideoParameterValue<String>,
    #[serde(default)]
    pub is_vfr: bool,
    /// Extra arguments placed before `-i` of the concat invocation
    #[serde(default)]
    pub input_file_args: Vec<String>,
    /// Extra arguments placed before the output path of the concat invocation
    #[serde(default)]
    pub encoding_args: Vec<String>,
}

impl Default for VideoInfo {
    /// Default output preference: largest frame, fastest rate, shared codecs
    fn default() -> Self {
        Self {
            resolution: VideoParameterValue::SameAsHighest(Resolution::default()),
            framerate: VideoParameterValue::SameAsHighest(0.0),
            audio_codec: VideoParameterValue::SameAsInput(String::new()),
            video_codec: VideoParameterValue::SameAsInput(String::new()),
            is_vfr: false,
            input_file_args: Vec::new(),
            encoding_args: Vec::new(),
        }
    }
}

/// Video parameters with every field resolved to a single value.
///
/// Used both for what a probe observed in one file and for the
/// resolved output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteVideoInfo {
    pub resolution: Resolution,
    pub framerate: f64,
    pub audio_codec: String,
    pub video_codec: String,
    pub is_vfr: bool,
    pub input_file_args: Vec<String>,
    pub encoding_args: Vec<String>,
}

impl From<&ConcreteVideoInfo> for VideoInfo {
    fn from(info: &ConcreteVideoInfo) -> Self {
        Self {
            resolution: VideoParameterValue::Scalar(info.resolution),
            framerate: VideoParameterValue::Scalar(info.framerate),
            audio_codec: VideoParameterValue::Scalar(info.audio_codec.clone()),
            video_codec: VideoParameterValue::Scalar(info.video_codec.clone()),
            is_vfr: info.is_vfr,
            input_file_args: info.input_file_args.clone(),
            encoding_args: info.encoding_args.clone(),
        }
    }
}

impl fmt::Display for ConcreteVideoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {:.3}fps{}, video={}, audio={}",
            self.resolution,
            self.framerate,
            if self.is_vfr { " (vfr)" } else { "" },
            self.video_codec,
            self.audio_codec
        )
    }
}
