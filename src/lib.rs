/// Chapter Concat - Rust Implementation
///
/// Concatenates several video files into one output and merges their
/// chapter tables onto a single timeline. ffprobe and ffmpeg do the media
/// work; this library decides parameters, shifts chapters and drives the
/// tools through a staged pipeline.

pub mod chapters;
pub mod config;
pub mod confirm;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod probe;
pub mod process;
pub mod size;
pub mod state;

// Re-export main types for easy access
pub use crate::chapters::{ChapterEntry, Timebase};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::confirm::{AutoConfirm, Confirmation, Confirmer, OutputNameIssue, OverwriteDecision};
pub use crate::error::{ConcatError, Result, StreamKind};
pub use crate::params::{ConcreteVideoInfo, Resolution, VideoInfo, VideoParameterValue};
pub use crate::pipeline::{FileRecord, Orchestrator, PipelineEvent, RunOutcome};
pub use crate::probe::ProbeResult;
pub use crate::process::{ProcessRunner, ProgressUpdate, TokioProcessRunner, ToolInvocation, ToolOutput};
pub use crate::size::{format_size, SizeEstimate, SizeEstimator};
pub use crate::state::{PipelineStage, RunState};
