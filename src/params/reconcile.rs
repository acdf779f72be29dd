use super::{ConcreteVideoInfo, Resolution, VideoInfo, VideoParameterValue};
use crate::error::{ConcatError, Result};
use crate::pipeline::FileRecord;

/// Which streams differ between the resolved output and the inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamChanges {
    pub resolution_changed: bool,
    pub audio_changed: bool,
    pub video_changed: bool,
}

impl StreamChanges {
    fn merge(self, other: StreamChanges) -> Self {
        Self {
            resolution_changed: self.resolution_changed || other.resolution_changed,
            audio_changed: self.audio_changed || other.audio_changed,
            video_changed: self.video_changed || other.video_changed,
        }
    }
}

/// Fold per-file observations into a summary of ranges and sets.
///
/// An empty input yields empty sets for every field.
pub fn summarize_inputs(inputs: &[ConcreteVideoInfo]) -> VideoInfo {
    let mut resolution: Option<(Resolution, Resolution)> = None;
    let mut framerate: Option<(f64, f64)> = None;
    let mut audio_codecs: Vec<String> = Vec::new();
    let mut video_codecs: Vec<String> = Vec::new();
    let mut is_vfr = false;

    for info in inputs {
        resolution = Some(match resolution {
            None => (info.resolution, info.resolution),
            Some((lowest, highest)) => {
                // first-seen extremum wins on equal area
                if info.resolution.area() > highest.area() {
                    (lowest, info.resolution)
                } else if info.resolution.area() < lowest.area() {
                    (info.resolution, highest)
                } else {
                    (lowest, highest)
                }
            }
        });

        framerate = Some(match framerate {
            None => (info.framerate, info.framerate),
            Some((lowest, highest)) => {
                if info.framerate > highest {
                    (lowest, info.framerate)
                } else if info.framerate < lowest {
                    (info.framerate, highest)
                } else {
                    (lowest, highest)
                }
            }
        });

        if !audio_codecs.contains(&info.audio_codec) {
            audio_codecs.push(info.audio_codec.clone());
        }
        if !video_codecs.contains(&info.video_codec) {
            video_codecs.push(info.video_codec.clone());
        }
        is_vfr |= info.is_vfr;
    }

    VideoInfo {
        resolution: match resolution {
            Some((lowest, highest)) => VideoParameterValue::Range { lowest, highest },
            None => VideoParameterValue::Set(Vec::new()),
        },
        framerate: match framerate {
            Some((lowest, highest)) => VideoParameterValue::Range { lowest, highest },
            None => VideoParameterValue::Set(Vec::new()),
        },
        audio_codec: VideoParameterValue::Set(audio_codecs),
        video_codec: VideoParameterValue::Set(video_codecs),
        is_vfr,
        input_file_args: Vec::new(),
        encoding_args: Vec::new(),
    }
}

/// Resolve an output policy against an input summary.
///
/// Every field of the result is concrete. `Range` and `Set` are observations,
/// not policies, and are rejected.
pub fn resolve_output(policy: &VideoInfo, summary: &VideoInfo) -> Result<ConcreteVideoInfo> {
    Ok(ConcreteVideoInfo {
        resolution: resolve_field("resolution", &policy.resolution, &summary.resolution)?,
        framerate: resolve_field("framerate", &policy.framerate, &summary.framerate)?,
        audio_codec: resolve_field("audio_codec", &policy.audio_codec, &summary.audio_codec)?,
        video_codec: resolve_field("video_codec", &policy.video_codec, &summary.video_codec)?,
        is_vfr: policy.is_vfr,
        input_file_args: policy.input_file_args.clone(),
        encoding_args: policy.encoding_args.clone(),
    })
}

fn resolve_field<T: Clone + PartialEq>(
    name: &'static str,
    policy: &VideoParameterValue<T>,
    summary: &VideoParameterValue<T>,
) -> Result<T> {
    match policy {
        VideoParameterValue::Scalar(value) => Ok(value.clone()),
        VideoParameterValue::SameAsHighest(fallback) => Ok(match summary {
            VideoParameterValue::Range { highest, .. } => highest.clone(),
            _ => fallback.clone(),
        }),
        VideoParameterValue::SameAsLowest(fallback) => Ok(match summary {
            VideoParameterValue::Range { lowest, .. } => lowest.clone(),
            _ => fallback.clone(),
        }),
        VideoParameterValue::SameAsInput(fallback) => Ok(unanimous(summary).unwrap_or_else(|| fallback.clone())),
        VideoParameterValue::Range { .. } | VideoParameterValue::Set(_) => {
            Err(ConcatError::UnresolvedParameter(name))
        }
    }
}

/// The single value every input agreed on, if any
fn unanimous<T: Clone + PartialEq>(summary: &VideoParameterValue<T>) -> Option<T> {
    match summary {
        VideoParameterValue::Scalar(value) => Some(value.clone()),
        VideoParameterValue::Range { lowest, highest } if lowest == highest => Some(lowest.clone()),
        VideoParameterValue::Set(values) if values.len() == 1 => values.first().cloned(),
        _ => None,
    }
}

/// Compare one input file against the resolved output
pub fn detect_changes(output: &ConcreteVideoInfo, file: &FileRecord) -> StreamChanges {
    StreamChanges {
        resolution_changed: output.resolution != file.video_info.resolution,
        audio_changed: output.audio_codec != file.video_info.audio_codec,
        video_changed: output.video_codec != file.video_info.video_codec,
    }
}

/// A stream may be copied only if no file in the batch changes it
pub fn detect_batch_changes(output: &ConcreteVideoInfo, files: &[FileRecord]) -> StreamChanges {
    files
        .iter()
        .map(|file| detect_changes(output, file))
        .fold(StreamChanges::default(), StreamChanges::merge)
}
