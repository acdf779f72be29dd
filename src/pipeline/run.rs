use crate::chapters::{rebase, ChapterEntry};
use crate::error::{ConcatError, Result};
use crate::params::ConcreteVideoInfo;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// One probed input, with its chapters already on the output timeline
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Seconds
    pub duration: f64,
    pub video_info: ConcreteVideoInfo,
    pub chapters: Vec<ChapterEntry>,
}

impl FileRecord {
    pub fn new(path: PathBuf, duration: f64, video_info: ConcreteVideoInfo) -> Self {
        Self {
            path,
            duration,
            video_info,
            chapters: Vec::new(),
        }
    }

    pub fn with_chapters(mut self, chapters: Vec<ChapterEntry>) -> Self {
        self.chapters = chapters;
        self
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Working files of a run, all inside one temporary directory
#[derive(Debug)]
pub struct TempPaths {
    dir: TempDir,
    pub concat_list: PathBuf,
    pub concatenated: PathBuf,
    pub metadata: PathBuf,
}

impl TempPaths {
    /// Create the run directory from a `<dir>/<prefix>XXXXXX` template
    pub fn create(template: Option<&Path>) -> Result<Self> {
        let dir = match template {
            Some(template) => {
                let parent = match template.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                let name = file_name(template);
                let prefix = name.trim_end_matches('X');
                tempfile::Builder::new()
                    .prefix(prefix)
                    .tempdir_in(&parent)
                    .map_err(|e| ConcatError::filesystem(&parent, e))?
            }
            None => tempfile::Builder::new()
                .prefix("chapter-concat-")
                .tempdir()
                .map_err(|e| ConcatError::filesystem(std::env::temp_dir(), e))?,
        };

        debug!("Temporary directory: {}", dir.path().display());
        let root = dir.path().to_path_buf();
        Ok(Self {
            concat_list: root.join("concat.txt"),
            concatenated: root.join("concatenated"),
            metadata: root.join("metadata.ini"),
            dir,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Side-car file for the `index`-th input
    pub fn file_metadata(&self, index: usize) -> PathBuf {
        self.root().join(format!("metadata{index}.ini"))
    }

    /// Name the concatenated file so ffmpeg picks the output container
    pub fn set_container_extension(&mut self, extension: &str) {
        self.concatenated = self.root().join(format!("concatenated.{extension}"));
    }

    /// Remove the directory and everything in it
    pub fn cleanup(self) {
        let root = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove temporary directory {}: {}", root.display(), e);
        }
    }
}

/// Everything one run accumulates between its stages
#[derive(Debug)]
pub struct PipelineRun {
    pub inputs: Vec<PathBuf>,
    pub files: Vec<FileRecord>,
    /// Index into `inputs` of the file being processed
    pub current_index: usize,
    pub output_video_info: Option<ConcreteVideoInfo>,
    pub output_path: Option<PathBuf>,
    pub temp: TempPaths,
}

impl PipelineRun {
    pub fn new(inputs: Vec<PathBuf>, temp: TempPaths) -> Self {
        Self {
            inputs,
            files: Vec::new(),
            current_index: 0,
            output_video_info: None,
            output_path: None,
            temp,
        }
    }

    /// Offset of the next file on the output timeline
    pub fn offset(&self) -> f64 {
        self.files.iter().map(|file| file.duration).sum()
    }

    /// Shift the record's chapters onto the output timeline and append it
    pub fn register(&mut self, mut record: FileRecord) -> &FileRecord {
        let offset = self.offset();
        rebase(&mut record.chapters, offset);
        debug!(
            "Registered {} at offset {:.3}s with {} chapters",
            record.path.display(),
            offset,
            record.chapters.len()
        );
        self.files.push(record);
        self.current_index += 1;
        &self.files[self.files.len() - 1]
    }

    /// Total duration in milliseconds, each file truncated separately
    pub fn total_duration_ms(&self) -> i64 {
        self.files.iter().map(|file| (file.duration * 1000.0) as i64).sum()
    }

    pub fn chapters(&self) -> impl Iterator<Item = &ChapterEntry> {
        self.files.iter().flat_map(|file| file.chapters.iter())
    }

    pub fn chapter_titles(&self) -> Vec<String> {
        self.chapters().map(|chapter| chapter.title.clone()).collect()
    }

    /// Write titles back in file-then-chapter order
    pub fn apply_chapter_titles(&mut self, titles: Vec<String>) -> Result<()> {
        let expected = self.chapters().count();
        if titles.len() != expected {
            return Err(ConcatError::ChapterTitleMismatch {
                expected,
                actual: titles.len(),
            });
        }

        let chapters = self.files.iter_mut().flat_map(|file| file.chapters.iter_mut());
        for (chapter, title) in chapters.zip(titles) {
            chapter.title = title;
        }
        Ok(())
    }
}
