//! Checkpoints where the user may revise a proposal or cancel the run

use crate::params::VideoInfo;
use crate::size::SizeEstimate;
use std::path::Path;

/// A possibly revised value and whether the user accepted it
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation<T> {
    pub value: T,
    pub confirmed: bool,
}

impl<T> Confirmation<T> {
    pub fn accept(value: T) -> Self {
        Self {
            value,
            confirmed: true,
        }
    }

    pub fn decline(value: T) -> Self {
        Self {
            value,
            confirmed: false,
        }
    }
}

/// Why an output name is being asked for again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputNameIssue {
    EmptyName,
}

/// Answer to "the output file already exists"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteDecision {
    Overwrite,
    Retry,
    Abort,
}

/// Decisions the pipeline cannot make on its own.
///
/// Each method is a pure function of the proposal; returning
/// `confirmed == false` cancels the run without further side effects.
pub trait Confirmer: Send + Sync {
    fn confirm_size(&self, estimate: &SizeEstimate) -> bool;

    fn confirm_output_name(&self, proposal: &str, issue: Option<OutputNameIssue>) -> Confirmation<String>;

    fn confirm_overwrite(&self, path: &Path) -> OverwriteDecision;

    /// `proposal` is the preferred output policy, `input_summary` the observed ranges
    fn confirm_video_info(&self, proposal: &VideoInfo, input_summary: &VideoInfo) -> Confirmation<VideoInfo>;

    /// Titles are flattened in file-then-chapter order
    fn confirm_chapter_titles(&self, titles: &[String]) -> Confirmation<Vec<String>>;
}

/// Non-interactive confirmer that accepts every proposal
#[derive(Debug, Clone, Default)]
pub struct AutoConfirm {
    output_name: Option<String>,
    overwrite: bool,
}

impl AutoConfirm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `name` instead of the proposed output file name
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl Confirmer for AutoConfirm {
    fn confirm_size(&self, _estimate: &SizeEstimate) -> bool {
        true
    }

    fn confirm_output_name(&self, proposal: &str, issue: Option<OutputNameIssue>) -> Confirmation<String> {
        match (issue, &self.output_name) {
            // asking again would give the same answer
            (Some(_), _) => Confirmation::decline(proposal.to_string()),
            (None, Some(name)) => Confirmation::accept(name.clone()),
            (None, None) => Confirmation::accept(proposal.to_string()),
        }
    }

    fn confirm_overwrite(&self, _path: &Path) -> OverwriteDecision {
        if self.overwrite {
            OverwriteDecision::Overwrite
        } else {
            OverwriteDecision::Abort
        }
    }

    fn confirm_video_info(&self, proposal: &VideoInfo, _input_summary: &VideoInfo) -> Confirmation<VideoInfo> {
        Confirmation::accept(proposal.clone())
    }

    fn confirm_chapter_titles(&self, titles: &[String]) -> Confirmation<Vec<String>> {
        Confirmation::accept(titles.to_vec())
    }
}
