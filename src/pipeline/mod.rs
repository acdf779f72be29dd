//! Concatenation pipeline
//!
//! `Orchestrator::run` walks a run through its stages: size check, output
//! naming, per-file probing and chapter extraction, output parameter
//! reconciliation, title confirmation, concatenation and chapter injection.
//! Each stage awaits at most one external tool at a time. The temporary
//! directory is removed whichever way the run ends.

pub mod commands;
pub mod run;

pub use run::{FileRecord, PipelineRun, TempPaths};

use crate::chapters::{self, ChapterEntry};
use crate::config::Config;
use crate::confirm::{Confirmer, OutputNameIssue, OverwriteDecision};
use crate::error::{ConcatError, Result};
use crate::params::{detect_batch_changes, resolve_output, summarize_inputs};
use crate::probe::{parse_probe_output, probe_args};
use crate::process::{
    decode_ffmpeg_progress, format_time_progress, ProcessRunner, ProgressSpec, ToolInvocation, ToolOutput,
};
use crate::size::SizeEstimator;
use crate::state::{PipelineStage, RunState};
use run::file_name;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Observable milestones of a run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageEntered {
        stage: PipelineStage,
        /// Input being processed, for per-file stages
        file_index: Option<usize>,
    },
    FileRegistered {
        index: usize,
        path: PathBuf,
        duration: f64,
        chapters: usize,
    },
    Finished {
        output: PathBuf,
    },
    Cancelled {
        stage: PipelineStage,
    },
    Aborted {
        stage: PipelineStage,
        reason: String,
    },
}

/// How a run ended when no error occurred
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        output: PathBuf,
        chapters: Vec<ChapterEntry>,
    },
    /// The user declined at a confirmation checkpoint
    Cancelled { stage: PipelineStage },
}

/// Drives concatenation runs, one at a time
pub struct Orchestrator {
    config: Config,
    runner: Arc<dyn ProcessRunner>,
    confirmer: Arc<dyn Confirmer>,
    events: Option<mpsc::UnboundedSender<PipelineEvent>>,
    state: RunState,
}

impl Orchestrator {
    pub fn new(config: Config, runner: Arc<dyn ProcessRunner>, confirmer: Arc<dyn Confirmer>) -> Self {
        Self {
            config,
            runner,
            confirmer,
            events: None,
            state: RunState::new(),
        }
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Stage bookkeeping of the latest run
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Concatenate `inputs` in order into one file with a unified chapter table
    pub async fn run(&mut self, inputs: Vec<PathBuf>) -> Result<RunOutcome> {
        if inputs.is_empty() {
            return Err(ConcatError::Config("no input files given".to_string()));
        }

        self.state = RunState::new();
        info!("🚀 Starting concatenation of {} files", inputs.len());
        let inputs = absolute_inputs(inputs)?;

        let temp = TempPaths::create(self.config.preferences.temporary_directory_template.as_deref())?;
        let mut run = PipelineRun::new(inputs, temp);

        let result = self.drive(&mut run).await;
        let failed_stage = self.state.current_stage();

        self.enter(PipelineStage::CleaningUp, None);
        let PipelineRun { temp, .. } = run;
        temp.cleanup();

        match &result {
            Ok(RunOutcome::Completed { output, chapters }) => {
                self.enter(PipelineStage::Done, None);
                info!(
                    "✅ Wrote {} with {} chapters in {:.2}s",
                    output.display(),
                    chapters.len(),
                    self.state.total_time()
                );
                self.emit(PipelineEvent::Finished { output: output.clone() });
            }
            Ok(RunOutcome::Cancelled { stage }) => {
                self.state.abort();
                info!("🛑 Run cancelled at {}", stage);
                self.emit(PipelineEvent::Cancelled { stage: *stage });
            }
            Err(e) => {
                self.state.abort();
                error!("❌ Run aborted during {}: {}", failed_stage, e);
                self.emit(PipelineEvent::Aborted {
                    stage: failed_stage,
                    reason: e.to_string(),
                });
            }
        }

        result
    }

    async fn drive(&mut self, run: &mut PipelineRun) -> Result<RunOutcome> {
        self.enter(PipelineStage::PreflightSizeCheck, None);
        let estimate = SizeEstimator::new().estimate(&run.inputs, run.temp.root());
        info!("💽 {}", estimate.summary());
        if !self.confirmer.confirm_size(&estimate) {
            return Ok(self.cancelled());
        }

        self.enter(PipelineStage::ChoosingOutputPath, None);
        match self.choose_output_path(run).await? {
            Some(path) => run.output_path = Some(path),
            None => return Ok(self.cancelled()),
        }

        while run.current_index < run.inputs.len() {
            self.process_file(run).await?;
        }

        self.enter(PipelineStage::ReconcilingOutputParameters, None);
        if !self.reconcile_output_parameters(run)? {
            return Ok(self.cancelled());
        }

        self.enter(PipelineStage::ConfirmingChapterTitles, None);
        let titles = run.chapter_titles();
        let answer = self.confirmer.confirm_chapter_titles(&titles);
        if !answer.confirmed {
            return Ok(self.cancelled());
        }
        run.apply_chapter_titles(answer.value)?;

        self.enter(PipelineStage::Concatenating, None);
        self.concatenate(run).await?;

        self.enter(PipelineStage::ExtractingMergedMetadata, None);
        let ffmpeg = self.config.tools.ffmpeg.clone();
        let args = commands::metadata_extraction_args(&run.temp.concatenated, &run.temp.metadata);
        self.invoke_checked(ToolInvocation::new(ffmpeg, args).discard_stdout()).await?;

        self.enter(PipelineStage::InjectingChapters, None);
        let output = self.inject_chapters(run).await?;

        Ok(RunOutcome::Completed {
            output,
            chapters: run.chapters().cloned().collect(),
        })
    }

    fn cancelled(&self) -> RunOutcome {
        RunOutcome::Cancelled {
            stage: self.state.current_stage(),
        }
    }

    async fn choose_output_path(&self, run: &PipelineRun) -> Result<Option<PathBuf>> {
        let first = &run.inputs[0];
        let source_name = file_name(first);
        let directory = match first.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let proposal = match &self.config.plugins.savefile_name {
            Some(plugin) => {
                let args = vec![plugin.to_string_lossy().to_string(), source_name.clone()];
                let output = self
                    .invoke_checked(ToolInvocation::new(self.config.tools.python.clone(), args))
                    .await?;
                output.stdout.trim_end_matches(['\r', '\n']).to_string()
            }
            None => source_name.clone(),
        };

        let mut issue = None;
        loop {
            let answer = self.confirmer.confirm_output_name(&proposal, issue);
            if !answer.confirmed {
                return Ok(None);
            }
            if answer.value.is_empty() {
                issue = Some(OutputNameIssue::EmptyName);
                continue;
            }

            let path = directory.join(&answer.value);
            if answer.value == source_name || path.exists() {
                match self.confirmer.confirm_overwrite(&path) {
                    OverwriteDecision::Overwrite => {}
                    OverwriteDecision::Retry => {
                        issue = None;
                        continue;
                    }
                    OverwriteDecision::Abort => return Ok(None),
                }
            }

            info!("📂 Output: {}", path.display());
            return Ok(Some(path));
        }
    }

    /// Probe one input, gather its chapters and register it
    async fn process_file(&mut self, run: &mut PipelineRun) -> Result<()> {
        let index = run.current_index;
        let path = run.inputs[index].clone();
        info!("📹 Processing file {}/{}: {}", index + 1, run.inputs.len(), path.display());

        self.enter(PipelineStage::Probing, Some(index));
        let output = self
            .invoke_checked(ToolInvocation::new(self.config.tools.ffprobe.clone(), probe_args(&path)))
            .await?;
        let probe = parse_probe_output(&output.stdout)?;
        debug!("Probed {}: {:.3}s, {}", path.display(), probe.duration, probe.video_info);

        self.enter(PipelineStage::ExtractingChapters, Some(index));
        let side_car = run.temp.file_metadata(index);
        let args = commands::metadata_extraction_args(&path, &side_car);
        let extraction = ToolInvocation::new(self.config.tools.ffmpeg.clone(), args).discard_stdout();
        self.invoke_checked(extraction).await?;
        let mut file_chapters = chapters::read_chapters(&side_car).await?;

        if file_chapters.is_empty() {
            self.enter(PipelineStage::GeneratingChapterIfEmpty, Some(index));
            let mut chapter = chapters::synthesize_default(probe.duration);
            chapter.title = match self.config.plugins.chapter_title.clone() {
                Some(plugin) => {
                    self.enter(PipelineStage::GeneratingChapterTitleViaPlugin, Some(index));
                    self.chapter_title_from_plugin(&plugin, &path, probe.duration).await?
                }
                None => file_name(&path),
            };
            file_chapters.push(chapter);
        }

        self.enter(PipelineStage::Registered, Some(index));
        let record = FileRecord::new(path, probe.duration, probe.video_info).with_chapters(file_chapters);
        let registered = run.register(record);
        self.emit(PipelineEvent::FileRegistered {
            index,
            path: registered.path.clone(),
            duration: registered.duration,
            chapters: registered.chapters.len(),
        });
        Ok(())
    }

    async fn chapter_title_from_plugin(&self, plugin: &Path, path: &Path, duration: f64) -> Result<String> {
        let args = vec![
            plugin.to_string_lossy().to_string(),
            file_name(path),
            duration.to_string(),
        ];
        let output = self
            .invoke_checked(ToolInvocation::new(self.config.tools.python.clone(), args))
            .await?;
        Ok(output.stdout.replace(['\r', '\n'], ""))
    }

    /// Resolve the output parameters; `false` when the user declined
    fn reconcile_output_parameters(&self, run: &mut PipelineRun) -> Result<bool> {
        let observed: Vec<_> = run.files.iter().map(|file| file.video_info.clone()).collect();
        let summary = summarize_inputs(&observed);

        let answer = self
            .confirmer
            .confirm_video_info(&self.config.preferences.default_video_info, &summary);
        if !answer.confirmed {
            return Ok(false);
        }

        let output = resolve_output(&answer.value, &summary)?;
        info!("🎞️ Output parameters: {}", output);
        run.output_video_info = Some(output);
        Ok(true)
    }

    async fn concatenate(&self, run: &mut PipelineRun) -> Result<()> {
        let output_info = run
            .output_video_info
            .clone()
            .ok_or(ConcatError::UnresolvedParameter("output video info"))?;

        let extension = run
            .output_path
            .as_deref()
            .and_then(Path::extension)
            .or_else(|| run.inputs[0].extension())
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp4".to_string());
        run.temp.set_container_extension(&extension);

        tokio::fs::write(&run.temp.concat_list, commands::concat_list(&run.files))
            .await
            .map_err(|e| ConcatError::filesystem(&run.temp.concat_list, e))?;

        let changes = detect_batch_changes(&output_info, &run.files);
        if changes.resolution_changed || changes.audio_changed || changes.video_changed {
            info!(
                "🔄 Re-encoding (resolution: {}, audio: {}, video: {})",
                changes.resolution_changed, changes.audio_changed, changes.video_changed
            );
        }

        let args = commands::concat_args(&run.temp.concat_list, &output_info, changes, &run.temp.concatenated);
        let invocation = ToolInvocation::new(self.config.tools.ffmpeg.clone(), args)
            .discard_stdout()
            .with_progress(ProgressSpec {
                start: 0,
                end: run.total_duration_ms(),
                decode: decode_ffmpeg_progress,
                format: format_time_progress,
            });
        self.invoke_checked(invocation).await?;
        Ok(())
    }

    /// Append the unified chapter table to the merged metadata and remux
    async fn inject_chapters(&self, run: &PipelineRun) -> Result<PathBuf> {
        let output_path = run
            .output_path
            .clone()
            .ok_or_else(|| ConcatError::Config("no output path chosen".to_string()))?;

        let mut metadata = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&run.temp.metadata)
            .await
            .map_err(|e| ConcatError::filesystem(&run.temp.metadata, e))?;
        let rendered = format!("\n{}", chapters::render_chapters(run.chapters()));
        metadata
            .write_all(rendered.as_bytes())
            .await
            .map_err(|e| ConcatError::filesystem(&run.temp.metadata, e))?;
        metadata
            .flush()
            .await
            .map_err(|e| ConcatError::filesystem(&run.temp.metadata, e))?;
        drop(metadata);

        let args = commands::remux_args(&run.temp.concatenated, &run.temp.metadata, &output_path);
        let invocation = ToolInvocation::new(self.config.tools.ffmpeg.clone(), args).with_progress(ProgressSpec {
            start: 0,
            end: run.total_duration_ms(),
            decode: decode_ffmpeg_progress,
            format: format_time_progress,
        });
        self.invoke_checked(invocation).await?;
        Ok(output_path)
    }

    /// Run a tool and turn start failures and non-zero exits into errors
    async fn invoke_checked(&self, invocation: ToolInvocation) -> Result<ToolOutput> {
        debug!("Running: {}", invocation.command_line());
        let tool = invocation.program.clone();

        let output = self
            .runner
            .invoke(invocation)
            .await
            .map_err(|e| ConcatError::ToolInvocation {
                tool: tool.clone(),
                status: "failed to start".to_string(),
                stderr: e.to_string(),
            })?;

        if !output.success() {
            warn!("{} failed with {}", tool, output.status_description());
            return Err(ConcatError::ToolInvocation {
                tool,
                status: output.status_description(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(output)
    }

    fn enter(&mut self, stage: PipelineStage, file_index: Option<usize>) {
        self.state.enter(stage);
        self.emit(PipelineEvent::StageEntered { stage, file_index });
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(events) = &self.events {
            // a dropped receiver only means nobody is listening
            let _ = events.send(event);
        }
    }
}

/// Anchor relative inputs at the working directory.
///
/// The concat demuxer resolves relative list entries against the list
/// file, which lives in the run's temporary directory.
fn absolute_inputs(inputs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    inputs
        .into_iter()
        .map(|input| std::path::absolute(&input).map_err(|e| ConcatError::filesystem(&input, e)))
        .collect()
}

/// Last few lines of a tool's stderr
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}
