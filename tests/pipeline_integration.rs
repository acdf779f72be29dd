use async_trait::async_trait;
use chapter_concat::confirm::{Confirmation, Confirmer, OutputNameIssue, OverwriteDecision};
use chapter_concat::pipeline::{Orchestrator, PipelineEvent, RunOutcome};
use chapter_concat::process::{ProcessRunner, ToolInvocation, ToolOutput};
use chapter_concat::size::SizeEstimate;
use chapter_concat::state::PipelineStage;
use chapter_concat::{AutoConfirm, ConcatError, Config, ConfigBuilder, StreamKind, VideoInfo, VideoParameterValue};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Stands in for ffprobe/ffmpeg/python, writing the files they would write
#[derive(Default)]
struct ScriptedRunner {
    probes: HashMap<String, String>,
    side_cars: HashMap<String, String>,
    plugin_stdout: String,
    invocations: Mutex<Vec<ToolInvocation>>,
    /// Contents of the metadata file handed to the final remux
    injected_metadata: Mutex<Option<String>>,
}

impl ScriptedRunner {
    fn with_file(mut self, path: &Path, probe: String, side_car: &str) -> Self {
        let key = path.to_string_lossy().to_string();
        self.probes.insert(key.clone(), probe);
        self.side_cars.insert(key, side_car.to_string());
        self
    }

    fn with_plugin_stdout(mut self, stdout: &str) -> Self {
        self.plugin_stdout = stdout.to_string();
        self
    }

    fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    fn ffmpeg_calls(&self) -> Vec<Vec<String>> {
        self.invocations()
            .into_iter()
            .filter(|i| i.program == "ffmpeg")
            .map(|i| i.args)
            .collect()
    }
}

fn ok(stdout: impl Into<String>) -> ToolOutput {
    ToolOutput {
        stdout: stdout.into(),
        stderr: String::new(),
        exit_code: Some(0),
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn invoke(&self, invocation: ToolInvocation) -> std::io::Result<ToolOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let args = &invocation.args;
        let last = args.last().cloned().unwrap_or_default();

        match invocation.program.as_str() {
            "ffprobe" => Ok(match self.probes.get(&last) {
                Some(json) => ok(json.clone()),
                None => ToolOutput {
                    stdout: String::new(),
                    stderr: format!("{last}: No such file or directory"),
                    exit_code: Some(1),
                },
            }),
            "python" => Ok(ok(self.plugin_stdout.clone())),
            "ffmpeg" if args.contains(&"ffmetadata".to_string()) => {
                let source = &args[1];
                let content = self
                    .side_cars
                    .get(source)
                    .cloned()
                    .unwrap_or_else(|| ";FFMETADATA1\ntitle=merged\n".to_string());
                tokio::fs::write(&last, content).await?;
                Ok(ok(""))
            }
            "ffmpeg" if args.contains(&"-map_chapters".to_string()) => {
                let metadata = tokio::fs::read_to_string(&args[3]).await?;
                *self.injected_metadata.lock().unwrap() = Some(metadata);
                tokio::fs::write(&last, b"remuxed").await?;
                Ok(ok(""))
            }
            "ffmpeg" => {
                // the concat demuxer resolves relative entries against the list file
                let list_index = args.iter().position(|arg| arg == "-i").unwrap() + 1;
                let list = tokio::fs::read_to_string(&args[list_index]).await?;
                let missing = list_entries(&list)
                    .into_iter()
                    .find(|entry| !entry.is_absolute() || !entry.exists());
                if let Some(missing) = missing {
                    return Ok(ToolOutput {
                        stdout: String::new(),
                        stderr: format!("{}: No such file or directory", missing.display()),
                        exit_code: Some(1),
                    });
                }
                tokio::fs::write(&last, b"concatenated").await?;
                Ok(ok(""))
            }
            other => Err(std::io::Error::new(std::io::ErrorKind::NotFound, other.to_string())),
        }
    }
}

fn list_entries(list: &str) -> Vec<PathBuf> {
    list.lines()
        .filter_map(|line| line.strip_prefix("file '")?.strip_suffix('\''))
        .map(|entry| PathBuf::from(entry.replace(r"'\''", "'")))
        .collect()
}

fn probe_json(duration: f64, width: u32, height: u32, video_codec: &str, audio: Option<&str>) -> String {
    let mut streams = vec![format!(
        r#"{{"codec_type": "video", "codec_name": "{video_codec}", "width": {width}, "height": {height},
            "r_frame_rate": "30/1", "avg_frame_rate": "30/1"}}"#
    )];
    if let Some(audio) = audio {
        streams.push(format!(r#"{{"codec_type": "audio", "codec_name": "{audio}"}}"#));
    }
    format!(
        r#"{{"streams": [{}], "format": {{"duration": "{duration:.6}"}}}}"#,
        streams.join(",")
    )
}

fn side_car(start: i64, end: i64, title: &str) -> String {
    format!(";FFMETADATA1\ntitle=source\n\n[CHAPTER]\nTIMEBASE=1/1\nSTART={start}\nEND={end}\ntitle={title}\n")
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Workspace below the current directory, addressed by a relative path
    fn relative() -> (Self, PathBuf) {
        let cwd = std::env::current_dir().unwrap();
        let dir = tempfile::Builder::new()
            .prefix("relative-inputs-")
            .tempdir_in(&cwd)
            .unwrap();
        let relative = dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
        (Self { dir }, relative)
    }

    fn input(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, vec![0u8; 1024]).unwrap();
        path
    }

    fn config(&self) -> Config {
        let mut config = ConfigBuilder::new()
            .with_temporary_directory_template(self.dir.path().join("run-XXXXXX"))
            .build();
        config.tools.python = "python".to_string();
        config
    }

    fn leftover_run_dirs(&self) -> usize {
        std::fs::read_dir(self.dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("run-"))
            .count()
    }
}

/// Records what it was asked and declines parameter confirmation
#[derive(Default)]
struct RecordingConfirmer {
    decline_video_info: bool,
    titles: Option<Vec<String>>,
    seen_summary: Mutex<Option<VideoInfo>>,
}

impl Confirmer for RecordingConfirmer {
    fn confirm_size(&self, _estimate: &SizeEstimate) -> bool {
        true
    }

    fn confirm_output_name(&self, _proposal: &str, _issue: Option<OutputNameIssue>) -> Confirmation<String> {
        Confirmation::accept("joined.mp4".to_string())
    }

    fn confirm_overwrite(&self, _path: &Path) -> OverwriteDecision {
        OverwriteDecision::Abort
    }

    fn confirm_video_info(&self, proposal: &VideoInfo, summary: &VideoInfo) -> Confirmation<VideoInfo> {
        *self.seen_summary.lock().unwrap() = Some(summary.clone());
        if self.decline_video_info {
            Confirmation::decline(proposal.clone())
        } else {
            Confirmation::accept(proposal.clone())
        }
    }

    fn confirm_chapter_titles(&self, titles: &[String]) -> Confirmation<Vec<String>> {
        Confirmation::accept(self.titles.clone().unwrap_or_else(|| titles.to_vec()))
    }
}

/// Answers output-name questions from a script and records each question
#[derive(Default)]
struct NamingConfirmer {
    names: Mutex<VecDeque<String>>,
    decisions: Mutex<VecDeque<OverwriteDecision>>,
    name_questions: Mutex<Vec<(String, Option<OutputNameIssue>)>>,
    overwrite_questions: Mutex<Vec<PathBuf>>,
}

impl NamingConfirmer {
    fn new(names: &[&str], decisions: &[OverwriteDecision]) -> Self {
        Self {
            names: Mutex::new(names.iter().map(|name| name.to_string()).collect()),
            decisions: Mutex::new(decisions.iter().copied().collect()),
            ..Self::default()
        }
    }

    fn name_questions(&self) -> Vec<(String, Option<OutputNameIssue>)> {
        self.name_questions.lock().unwrap().clone()
    }

    fn overwrite_questions(&self) -> Vec<PathBuf> {
        self.overwrite_questions.lock().unwrap().clone()
    }
}

impl Confirmer for NamingConfirmer {
    fn confirm_size(&self, _estimate: &SizeEstimate) -> bool {
        true
    }

    fn confirm_output_name(&self, proposal: &str, issue: Option<OutputNameIssue>) -> Confirmation<String> {
        self.name_questions.lock().unwrap().push((proposal.to_string(), issue));
        let name = self.names.lock().unwrap().pop_front();
        Confirmation::accept(name.unwrap_or_else(|| proposal.to_string()))
    }

    fn confirm_overwrite(&self, path: &Path) -> OverwriteDecision {
        self.overwrite_questions.lock().unwrap().push(path.to_path_buf());
        self.decisions.lock().unwrap().pop_front().unwrap_or(OverwriteDecision::Abort)
    }

    fn confirm_video_info(&self, proposal: &VideoInfo, _summary: &VideoInfo) -> Confirmation<VideoInfo> {
        Confirmation::accept(proposal.clone())
    }

    fn confirm_chapter_titles(&self, titles: &[String]) -> Confirmation<Vec<String>> {
        Confirmation::accept(titles.to_vec())
    }
}

fn single_file_runner(path: &Path) -> ScriptedRunner {
    ScriptedRunner::default().with_file(
        path,
        probe_json(10.0, 1920, 1080, "h264", Some("aac")),
        &side_car(0, 10, "Intro"),
    )
}

#[tokio::test]
async fn test_two_files_produce_unified_chapter_table() {
    let workspace = Workspace::new();
    let first = workspace.input("part1.mp4");
    let second = workspace.input("part2.mp4");

    let runner = Arc::new(
        ScriptedRunner::default()
            .with_file(&first, probe_json(10.0, 1920, 1080, "h264", Some("aac")), &side_car(0, 10, "Intro"))
            .with_file(&second, probe_json(15.0, 1920, 1080, "h264", Some("aac")), &side_car(0, 15, "Guard")),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut orchestrator = Orchestrator::new(
        workspace.config(),
        runner.clone(),
        Arc::new(AutoConfirm::new().with_output_name("joined.mp4")),
    )
    .with_events(tx);

    let outcome = orchestrator.run(vec![first.clone(), second.clone()]).await.unwrap();

    let RunOutcome::Completed { output, chapters } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(output, workspace.dir.path().join("joined.mp4"));
    let spans: Vec<(i64, i64, &str)> = chapters
        .iter()
        .map(|c| (c.start, c.end, c.title.as_str()))
        .collect();
    assert_eq!(spans, vec![(0, 10, "Intro"), (10, 25, "Guard")]);

    let injected = runner.injected_metadata.lock().unwrap().clone().unwrap();
    assert!(injected.starts_with(";FFMETADATA1\ntitle=merged\n\n[CHAPTER]"));
    assert!(injected.contains("[CHAPTER]\nTIMEBASE=1/1\nSTART=10\nEND=25\nTITLE=Guard\n"));

    // identical inputs are stream-copied
    let ffmpeg = runner.ffmpeg_calls();
    let concat = ffmpeg.iter().find(|args| args.contains(&"concat".to_string())).unwrap();
    assert!(concat.join(" ").contains("-c:a copy -c:v copy"));
    assert!(!concat.contains(&"-s".to_string()));
    assert!(ffmpeg.last().unwrap().contains(&"-y".to_string()));

    assert_eq!(orchestrator.state().current_stage(), PipelineStage::Done);
    assert_eq!(workspace.leftover_run_dirs(), 0);

    let mut registered = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PipelineEvent::FileRegistered { index, duration, .. } = event {
            registered.push((index, duration));
        }
    }
    assert_eq!(registered, vec![(0, 10.0), (1, 15.0)]);
}

#[tokio::test]
async fn test_mixed_inputs_are_reencoded_and_scaled() {
    let workspace = Workspace::new();
    let first = workspace.input("small.mkv");
    let second = workspace.input("large.mkv");

    let runner = Arc::new(
        ScriptedRunner::default()
            .with_file(&first, probe_json(5.0, 1280, 720, "h264", Some("aac")), &side_car(0, 5, "A"))
            .with_file(&second, probe_json(5.0, 1920, 1080, "hevc", Some("aac")), &side_car(0, 5, "B")),
    );
    let mut config = workspace.config();
    config.preferences.default_video_info = VideoInfo {
        video_codec: VideoParameterValue::Scalar("libx264".to_string()),
        encoding_args: vec!["-crf".to_string(), "20".to_string()],
        ..VideoInfo::default()
    };
    let confirmer = Arc::new(RecordingConfirmer::default());
    let mut orchestrator = Orchestrator::new(config, runner.clone(), confirmer.clone());

    let outcome = orchestrator.run(vec![first, second]).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { .. }));

    let summary = confirmer.seen_summary.lock().unwrap().clone().unwrap();
    assert_eq!(
        summary.video_codec,
        VideoParameterValue::Set(vec!["h264".to_string(), "hevc".to_string()])
    );

    let ffmpeg = runner.ffmpeg_calls();
    let concat = ffmpeg.iter().find(|args| args.contains(&"concat".to_string())).unwrap();
    let joined = concat.join(" ");
    assert!(joined.contains("-c:a copy -c:v libx264 -s 1920x1080 -crf 20"));
    assert!(joined.ends_with("concatenated.mp4"));
}

#[tokio::test]
async fn test_declined_parameters_cancel_before_encoding() {
    let workspace = Workspace::new();
    let first = workspace.input("part1.mp4");

    let runner = Arc::new(ScriptedRunner::default().with_file(
        &first,
        probe_json(10.0, 1920, 1080, "h264", Some("aac")),
        &side_car(0, 10, "Intro"),
    ));
    let confirmer = Arc::new(RecordingConfirmer {
        decline_video_info: true,
        ..RecordingConfirmer::default()
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut orchestrator = Orchestrator::new(workspace.config(), runner.clone(), confirmer).with_events(tx);

    let outcome = orchestrator.run(vec![first]).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Cancelled {
            stage: PipelineStage::ReconcilingOutputParameters
        }
    );
    assert!(runner.ffmpeg_calls().iter().all(|args| !args.contains(&"concat".to_string())));
    assert!(!workspace.dir.path().join("joined.mp4").exists());
    assert_eq!(workspace.leftover_run_dirs(), 0);

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert_eq!(
        last,
        Some(PipelineEvent::Cancelled {
            stage: PipelineStage::ReconcilingOutputParameters
        })
    );
}

#[tokio::test]
async fn test_missing_audio_stream_aborts_and_cleans_up() {
    let workspace = Workspace::new();
    let first = workspace.input("silent.mp4");

    let runner = Arc::new(ScriptedRunner::default().with_file(
        &first,
        probe_json(10.0, 1920, 1080, "h264", None),
        &side_car(0, 10, "Intro"),
    ));
    let mut orchestrator = Orchestrator::new(workspace.config(), runner.clone(), Arc::new(AutoConfirm::new()));

    let err = orchestrator.run(vec![first]).await.unwrap_err();

    assert!(matches!(err, ConcatError::MissingStream(StreamKind::Audio)));
    assert_eq!(orchestrator.state().current_stage(), PipelineStage::Aborted);
    assert!(runner.ffmpeg_calls().is_empty());
    assert_eq!(workspace.leftover_run_dirs(), 0);
}

#[tokio::test]
async fn test_wrong_title_count_aborts() {
    let workspace = Workspace::new();
    let first = workspace.input("part1.mp4");

    let runner = Arc::new(ScriptedRunner::default().with_file(
        &first,
        probe_json(10.0, 1920, 1080, "h264", Some("aac")),
        &side_car(0, 10, "Intro"),
    ));
    let confirmer = Arc::new(RecordingConfirmer {
        titles: Some(vec!["One".to_string(), "Two".to_string()]),
        ..RecordingConfirmer::default()
    });
    let mut orchestrator = Orchestrator::new(workspace.config(), runner.clone(), confirmer);

    let err = orchestrator.run(vec![first]).await.unwrap_err();

    assert!(matches!(
        err,
        ConcatError::ChapterTitleMismatch {
            expected: 1,
            actual: 2
        }
    ));
    assert!(runner.ffmpeg_calls().iter().all(|args| !args.contains(&"concat".to_string())));
}

#[tokio::test]
async fn test_files_without_chapters_get_plugin_titles() {
    let workspace = Workspace::new();
    let first = workspace.input("lesson.mp4");
    let plugin = workspace.dir.path().join("title.py");
    std::fs::write(&plugin, "print('x')").unwrap();

    let runner = Arc::new(
        ScriptedRunner::default()
            .with_file(
                &first,
                probe_json(12.5, 1280, 720, "h264", Some("aac")),
                ";FFMETADATA1\ntitle=source\n",
            )
            .with_plugin_stdout("Closed Guard\nBasics\n"),
    );
    let mut config = workspace.config();
    config.plugins.chapter_title = Some(plugin.clone());
    let mut orchestrator = Orchestrator::new(config, runner.clone(), Arc::new(AutoConfirm::new().with_output_name("out.mp4")));

    let outcome = orchestrator.run(vec![first]).await.unwrap();

    let RunOutcome::Completed { chapters, .. } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].title, "Closed GuardBasics");
    assert_eq!((chapters[0].start, chapters[0].end), (0, 12_500_000));

    let plugin_call = runner
        .invocations()
        .into_iter()
        .find(|i| i.program == "python")
        .unwrap();
    assert_eq!(
        plugin_call.args,
        vec![plugin.to_string_lossy().to_string(), "lesson.mp4".to_string(), "12.5".to_string()]
    );
}

#[tokio::test]
async fn test_existing_output_requires_overwrite() {
    let workspace = Workspace::new();
    let first = workspace.input("part1.mp4");
    workspace.input("joined.mp4");

    let runner = Arc::new(ScriptedRunner::default());
    let mut orchestrator = Orchestrator::new(
        workspace.config(),
        runner.clone(),
        Arc::new(AutoConfirm::new().with_output_name("joined.mp4")),
    );

    let outcome = orchestrator.run(vec![first]).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Cancelled {
            stage: PipelineStage::ChoosingOutputPath
        }
    );
    assert!(runner.invocations().is_empty());
}

#[test]
fn test_blocking_run_from_sync_context() {
    let workspace = Workspace::new();
    let first = workspace.input("part1.mp4");
    let runner = Arc::new(ScriptedRunner::default().with_file(
        &first,
        probe_json(3.0, 640, 480, "h264", Some("aac")),
        &side_car(0, 3, "Only"),
    ));
    let mut orchestrator = Orchestrator::new(workspace.config(), runner, Arc::new(AutoConfirm::new().with_overwrite(true)));

    // default name equals the source, so the run overwrites it in place
    let outcome = tokio_test::block_on(orchestrator.run(vec![first.clone()])).unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            output: first.clone(),
            chapters: vec![chapter_concat::ChapterEntry {
                timebase: chapter_concat::Timebase::new(1, 1),
                start: 0,
                end: 3,
                title: "Only".to_string(),
            }],
        }
    );
    assert_eq!(std::fs::read(&first).unwrap(), b"remuxed");
}

#[tokio::test]
async fn test_relative_inputs_are_listed_absolute_for_concat() {
    let (workspace, relative_dir) = Workspace::relative();
    let absolute_dir = std::path::absolute(&relative_dir).unwrap();
    workspace.input("part1.mp4");
    workspace.input("it's part2.mp4");
    let first = relative_dir.join("part1.mp4");
    let second = relative_dir.join("it's part2.mp4");
    assert!(first.is_relative());

    let runner = Arc::new(
        ScriptedRunner::default()
            .with_file(
                &absolute_dir.join("part1.mp4"),
                probe_json(10.0, 1920, 1080, "h264", Some("aac")),
                &side_car(0, 10, "Intro"),
            )
            .with_file(
                &absolute_dir.join("it's part2.mp4"),
                probe_json(15.0, 1920, 1080, "h264", Some("aac")),
                &side_car(0, 15, "Guard"),
            ),
    );
    let mut orchestrator = Orchestrator::new(
        workspace.config(),
        runner.clone(),
        Arc::new(AutoConfirm::new().with_output_name("joined.mp4")),
    );

    let outcome = orchestrator.run(vec![first, second]).await.unwrap();

    let RunOutcome::Completed { output, chapters } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(output, absolute_dir.join("joined.mp4"));
    assert_eq!(chapters.len(), 2);
    assert_eq!(std::fs::read(&output).unwrap(), b"remuxed");

    let probed: Vec<String> = runner
        .invocations()
        .into_iter()
        .filter(|i| i.program == "ffprobe")
        .filter_map(|i| i.args.last().cloned())
        .collect();
    assert!(probed.iter().all(|path| Path::new(path).is_absolute()));
    assert_eq!(workspace.leftover_run_dirs(), 0);
}

#[tokio::test]
async fn test_empty_output_name_is_asked_again() {
    let workspace = Workspace::new();
    let first = workspace.input("part1.mp4");
    let runner = Arc::new(single_file_runner(&first));
    let confirmer = Arc::new(NamingConfirmer::new(&["", "joined.mp4"], &[]));
    let mut orchestrator = Orchestrator::new(workspace.config(), runner, confirmer.clone());

    let outcome = orchestrator.run(vec![first]).await.unwrap();

    let RunOutcome::Completed { output, .. } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(output, workspace.dir.path().join("joined.mp4"));
    assert_eq!(
        confirmer.name_questions(),
        vec![
            ("part1.mp4".to_string(), None),
            ("part1.mp4".to_string(), Some(OutputNameIssue::EmptyName)),
        ]
    );
    assert!(confirmer.overwrite_questions().is_empty());
}

#[tokio::test]
async fn test_retry_asks_for_name_again_before_overwriting() {
    let workspace = Workspace::new();
    let first = workspace.input("part1.mp4");
    let taken = workspace.input("taken.mp4");
    let runner = Arc::new(single_file_runner(&first));
    let confirmer = Arc::new(NamingConfirmer::new(
        &["taken.mp4", "taken.mp4"],
        &[OverwriteDecision::Retry, OverwriteDecision::Overwrite],
    ));
    let mut orchestrator = Orchestrator::new(workspace.config(), runner, confirmer.clone());

    let outcome = orchestrator.run(vec![first]).await.unwrap();

    let RunOutcome::Completed { output, .. } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(output, taken);
    assert_eq!(std::fs::read(&taken).unwrap(), b"remuxed");
    assert_eq!(confirmer.overwrite_questions(), vec![taken.clone(), taken]);
    // a retry clears the issue
    assert_eq!(
        confirmer.name_questions(),
        vec![("part1.mp4".to_string(), None), ("part1.mp4".to_string(), None)]
    );
}

#[tokio::test]
async fn test_savefile_plugin_proposes_trimmed_name() {
    let workspace = Workspace::new();
    let first = workspace.input("part1.mp4");
    let plugin = workspace.dir.path().join("name.py");
    std::fs::write(&plugin, "print('x')").unwrap();

    let runner = Arc::new(single_file_runner(&first).with_plugin_stdout("Guard Passing.mp4\r\n"));
    let mut config = workspace.config();
    config.plugins.savefile_name = Some(plugin.clone());
    let confirmer = Arc::new(NamingConfirmer::default());
    let mut orchestrator = Orchestrator::new(config, runner.clone(), confirmer.clone());

    let outcome = orchestrator.run(vec![first]).await.unwrap();

    let RunOutcome::Completed { output, .. } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(output, workspace.dir.path().join("Guard Passing.mp4"));
    assert_eq!(confirmer.name_questions(), vec![("Guard Passing.mp4".to_string(), None)]);

    let plugin_call = runner
        .invocations()
        .into_iter()
        .find(|i| i.program == "python")
        .unwrap();
    assert_eq!(
        plugin_call.args,
        vec![plugin.to_string_lossy().to_string(), "part1.mp4".to_string()]
    );
}
