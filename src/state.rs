use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Stages of a concatenation run, in the order they are entered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Idle,

    /// Disk space estimate and confirmation
    PreflightSizeCheck,

    /// Output file name proposal and confirmation
    ChoosingOutputPath,

    /// ffprobe on the current file
    Probing,

    /// ffmetadata side-car extraction and chapter parsing
    ExtractingChapters,

    /// Whole-file chapter for files without chapters
    GeneratingChapterIfEmpty,

    /// Chapter title from the title plugin
    GeneratingChapterTitleViaPlugin,

    /// Chapter rebasing and append to the run
    Registered,

    ReconcilingOutputParameters,

    ConfirmingChapterTitles,

    Concatenating,

    ExtractingMergedMetadata,

    InjectingChapters,

    /// Temporary directory removal
    CleaningUp,

    Done,

    Aborted,
}

impl PipelineStage {
    /// Stages at which the user may cancel the run
    pub fn is_checkpoint(&self) -> bool {
        matches!(
            self,
            PipelineStage::PreflightSizeCheck
                | PipelineStage::ChoosingOutputPath
                | PipelineStage::ReconcilingOutputParameters
                | PipelineStage::ConfirmingChapterTitles
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Aborted)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::PreflightSizeCheck => "preflight size check",
            PipelineStage::ChoosingOutputPath => "choosing output path",
            PipelineStage::Probing => "probing",
            PipelineStage::ExtractingChapters => "extracting chapters",
            PipelineStage::GeneratingChapterIfEmpty => "generating chapter",
            PipelineStage::GeneratingChapterTitleViaPlugin => "generating chapter title",
            PipelineStage::Registered => "registered",
            PipelineStage::ReconcilingOutputParameters => "reconciling output parameters",
            PipelineStage::ConfirmingChapterTitles => "confirming chapter titles",
            PipelineStage::Concatenating => "concatenating",
            PipelineStage::ExtractingMergedMetadata => "extracting merged metadata",
            PipelineStage::InjectingChapters => "injecting chapters",
            PipelineStage::CleaningUp => "cleaning up",
            PipelineStage::Done => "done",
            PipelineStage::Aborted => "aborted",
        };
        write!(f, "{name}")
    }
}

/// Stage bookkeeping for one run
#[derive(Debug, Clone)]
pub struct RunState {
    current_stage: PipelineStage,
    completed_stages: Vec<PipelineStage>,
    /// Accumulated seconds per stage; per-file stages add up across files
    stage_times: HashMap<PipelineStage, f64>,
    entered_at: Instant,
    started_at: chrono::DateTime<chrono::Local>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            current_stage: PipelineStage::Idle,
            completed_stages: Vec::new(),
            stage_times: HashMap::new(),
            entered_at: Instant::now(),
            started_at: chrono::Local::now(),
        }
    }

    pub fn current_stage(&self) -> PipelineStage {
        self.current_stage
    }

    pub fn completed_stages(&self) -> &[PipelineStage] {
        &self.completed_stages
    }

    pub fn stage_time(&self, stage: PipelineStage) -> Option<f64> {
        self.stage_times.get(&stage).copied()
    }

    pub fn started_at(&self) -> chrono::DateTime<chrono::Local> {
        self.started_at
    }

    /// Close the current stage and enter `next`
    pub fn enter(&mut self, next: PipelineStage) {
        let elapsed = self.entered_at.elapsed().as_secs_f64();
        let previous = self.current_stage;
        if previous != PipelineStage::Idle {
            *self.stage_times.entry(previous).or_insert(0.0) += elapsed;
            if !self.completed_stages.contains(&previous) {
                self.completed_stages.push(previous);
            }
        }

        debug!("Stage {} -> {} ({:.2}s)", previous, next, elapsed);
        self.current_stage = next;
        self.entered_at = Instant::now();
    }

    /// Enter `Aborted` without counting the failed stage as completed
    pub fn abort(&mut self) {
        let elapsed = self.entered_at.elapsed().as_secs_f64();
        *self.stage_times.entry(self.current_stage).or_insert(0.0) += elapsed;
        self.current_stage = PipelineStage::Aborted;
        self.entered_at = Instant::now();
    }

    pub fn total_time(&self) -> f64 {
        self.stage_times.values().sum()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
