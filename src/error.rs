use std::path::PathBuf;

/// Result type for chapter-concat operations
pub type Result<T> = std::result::Result<T, ConcatError>;

/// Which logical stream a probe could not find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Video => write!(f, "video"),
            StreamKind::Audio => write!(f, "audio"),
        }
    }
}

/// Error types for the concatenation pipeline
#[derive(thiserror::Error, Debug)]
pub enum ConcatError {
    #[error("failed to parse ffprobe output: {0}")]
    ProbeParse(String),

    #[error("{0} stream was not found")]
    MissingStream(StreamKind),

    #[error("failed to parse frame rate [{0}]")]
    RateParse(String),

    #[error("failed to read chapter metadata {path}: {source}")]
    ChapterParse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolInvocation {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("filesystem error at {path}: {message}")]
    Filesystem { path: PathBuf, message: String },

    #[error("output parameter `{0}` is not a concrete value or policy")]
    UnresolvedParameter(&'static str),

    #[error("expected {expected} chapter titles, got {actual}")]
    ChapterTitleMismatch { expected: usize, actual: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConcatError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        ConcatError::Filesystem {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
