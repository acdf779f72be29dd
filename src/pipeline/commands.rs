//! Argument lists for the ffmpeg invocations of a run

use super::FileRecord;
use crate::params::{ConcreteVideoInfo, StreamChanges};
use std::path::Path;

fn arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// `ffmpeg -i <src> -f ffmetadata <dst>`
pub fn metadata_extraction_args(source: &Path, destination: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        arg(source),
        "-f".to_string(),
        "ffmetadata".to_string(),
        arg(destination),
    ]
}

/// Concat demuxer list naming every file in order
pub fn concat_list(files: &[FileRecord]) -> String {
    files
        .iter()
        .map(|file| {
            let path = file.path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{path}'\n")
        })
        .collect()
}

/// Concatenate through the concat demuxer, copying every stream the
/// resolved output leaves unchanged
pub fn concat_args(
    concat_list: &Path,
    output: &ConcreteVideoInfo,
    changes: StreamChanges,
    destination: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-f".into(), "concat".into(), "-safe".into(), "0".into()];
    args.extend(output.input_file_args.iter().cloned());
    args.extend(["-i".to_string(), arg(concat_list)]);

    args.push("-c:a".into());
    args.push(if changes.audio_changed {
        output.audio_codec.clone()
    } else {
        "copy".into()
    });
    args.push("-c:v".into());
    args.push(if changes.video_changed {
        output.video_codec.clone()
    } else {
        "copy".into()
    });

    if changes.resolution_changed {
        args.push("-s".into());
        args.push(output.resolution.to_string());
    }

    args.extend(output.encoding_args.iter().cloned());
    args.push(arg(destination));
    args
}

/// Copy all streams of `media` while taking metadata and chapters from `metadata`
pub fn remux_args(media: &Path, metadata: &Path, destination: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        arg(media),
        "-i".to_string(),
        arg(metadata),
        "-map_metadata".to_string(),
        "1".to_string(),
        "-map_chapters".to_string(),
        "1".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-y".to_string(),
        arg(destination),
    ]
}
