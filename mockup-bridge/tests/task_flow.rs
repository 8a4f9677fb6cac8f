use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use mockup_bridge::tasks::{inspect_bundle_task_with_id, run_preset_task_with_id};
use mockup_bridge::{
    Attempt, Bridge, BridgeError, GroupRemover, Launcher, PlatformInvoker, ResultPoller,
    TaskOutput,
};
use mockup_core::config::LayoutConfig;
use mockup_core::{AutomationTask, CompositeRequest, InvocationResult, PrintDirection, TaskId};
use mockup_renderer::{PayloadSettings, ScriptRenderer};

const TEMPSET_REPORT: &str = r#"{
  "before": [{"name": "Default Actions", "presets": ["Vignette", "Frame"]}],
  "after": [
    {"name": "Default Actions", "presets": ["Vignette", "Frame"]},
    {"name": "TempSet", "presets": ["Action_A"]}
  ]
}"#;

/// Stands in for the host: writes the given files, then exits as told.
/// `delay` stalls before the writes, `linger` after them.
struct FakeHost {
    writes: Vec<(PathBuf, String)>,
    exit_code: i32,
    stderr: &'static str,
    delay: Option<Duration>,
    linger: Option<Duration>,
    payloads: Arc<Mutex<Vec<String>>>,
}

impl FakeHost {
    fn exiting(exit_code: i32, stderr: &'static str) -> Self {
        Self {
            writes: vec![],
            exit_code,
            stderr,
            delay: None,
            linger: None,
            payloads: Arc::default(),
        }
    }

    fn writing(mut self, path: &Path, content: &str) -> Self {
        self.writes.push((path.to_path_buf(), content.to_string()));
        self
    }
}

#[async_trait]
impl Launcher for FakeHost {
    fn name(&self) -> &str {
        "fake"
    }

    async fn launch(&self, payload: &Path) -> Result<Attempt, BridgeError> {
        self.payloads
            .lock()
            .unwrap()
            .push(std::fs::read_to_string(payload).unwrap());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        for (path, content) in &self.writes {
            std::fs::write(path, content).unwrap();
        }
        if let Some(linger) = self.linger {
            tokio::time::sleep(linger).await;
        }
        Ok(Attempt::Ran(InvocationResult {
            host: "fake".to_string(),
            exit_code: self.exit_code,
            stdout: String::new(),
            stderr: self.stderr.to_string(),
        }))
    }
}

#[derive(Default)]
struct SpyRemover {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl SpyRemover {
    fn groups(&self) -> BTreeSet<String> {
        self.calls.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl GroupRemover for SpyRemover {
    async fn remove_group(&self, _task: &AutomationTask, group: &str) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(group.to_string());
        if self.fail {
            return Err(BridgeError::InvocationFailure {
                host: "fake".into(),
                exit_code: Some(1),
                message: "set is in use".into(),
            });
        }
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    layout: LayoutConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let layout = LayoutConfig::under(dir.path());
        mockup_core::config::ensure_layout(&layout).unwrap();
        Self { _dir: dir, layout }
    }

    fn bridge(&self, host: FakeHost, remover: Arc<SpyRemover>) -> Bridge {
        self.bridge_with_deadline(host, remover, Duration::from_secs(30))
    }

    fn bridge_with_deadline(
        &self,
        host: FakeHost,
        remover: Arc<SpyRemover>,
        deadline: Duration,
    ) -> Bridge {
        let renderer = Arc::new(ScriptRenderer::new(PayloadSettings::default()).unwrap());
        let launcher: Box<dyn Launcher> = Box::new(host);
        let invoker = Arc::new(PlatformInvoker::new(vec![launcher]));
        Bridge::new(
            renderer,
            invoker,
            remover,
            ResultPoller::new(3, Duration::from_millis(10)),
            deadline,
            self.layout.clone(),
        )
    }

    fn request(&self) -> CompositeRequest {
        CompositeRequest {
            model_document: self.layout.uploads_dir.join("tee.psd"),
            shirt_image: self.layout.uploads_dir.join("art.png"),
            preset_bundle: Some(self.layout.uploads_dir.join("shirts.atn")),
            action_name: "Apply Shirt".into(),
            preset_group: "TempSet".into(),
            layer_name: "Shirt Print".into(),
            color: None,
            print_direction: PrintDirection::Front,
        }
    }
}

fn groups(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn failed_invocation_still_cleans_up_loaded_groups() {
    let fx = Fixture::new();
    let task = run_preset_task_with_id(&fx.layout, &fx.request(), TaskId::from("e2e1"));
    let host = FakeHost::exiting(1, "layer not found\n").writing(&task.report_path, TEMPSET_REPORT);
    let remover = Arc::new(SpyRemover::default());
    let bridge = fx.bridge(host, remover.clone());

    let err = bridge.run(task).await.unwrap_err();
    match err {
        BridgeError::InvocationFailure { message, .. } => assert_eq!(message, "layer not found"),
        other => panic!("expected invocation failure, got {other}"),
    }
    assert_eq!(remover.groups(), groups(&["TempSet"]));
}

#[tokio::test]
async fn inspect_returns_first_new_preset_and_removes_its_group() {
    let fx = Fixture::new();
    let task = inspect_bundle_task_with_id(
        &fx.layout,
        &fx.layout.uploads_dir.join("new.atn"),
        TaskId::from("e2e2"),
    );
    let host = FakeHost::exiting(0, "").writing(&task.report_path, TEMPSET_REPORT);
    let remover = Arc::new(SpyRemover::default());
    let bridge = fx.bridge(host, remover.clone());

    let output = bridge.run(task).await.expect("inspect succeeds");
    assert_eq!(output, TaskOutput::ActionName("Action_A".to_string()));
    assert_eq!(*remover.calls.lock().unwrap(), vec!["TempSet"]);
}

#[tokio::test]
async fn empty_report_is_an_empty_result() {
    let fx = Fixture::new();
    let task = inspect_bundle_task_with_id(
        &fx.layout,
        &fx.layout.uploads_dir.join("new.atn"),
        TaskId::from("e2e3"),
    );
    let host = FakeHost::exiting(0, "").writing(&task.report_path, "");
    let remover = Arc::new(SpyRemover::default());
    let bridge = fx.bridge(host, remover.clone());

    let err = bridge.run(task).await.unwrap_err();
    assert!(matches!(err, BridgeError::EmptyResult(ref m) if m == "no action name detected"));
    assert!(remover.groups().is_empty());
}

#[tokio::test]
async fn missing_artifact_times_out_and_cleanup_still_runs() {
    let fx = Fixture::new();
    let task = run_preset_task_with_id(&fx.layout, &fx.request(), TaskId::from("e2e4"));
    let artifact = task.artifact_path.clone();
    let host = FakeHost::exiting(0, "").writing(&task.report_path, TEMPSET_REPORT);
    let remover = Arc::new(SpyRemover::default());
    let bridge = fx.bridge(host, remover.clone());

    let err = bridge.run(task).await.unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { ref path, .. } if *path == artifact));
    assert_eq!(remover.groups(), groups(&["TempSet"]));
}

#[tokio::test]
async fn successful_run_returns_the_artifact() {
    let fx = Fixture::new();
    let task = run_preset_task_with_id(&fx.layout, &fx.request(), TaskId::from("e2e5"));
    let artifact = task.artifact_path.clone();
    let script = task.script_path.clone();
    let report = task.report_path.clone();
    let host = FakeHost::exiting(0, "")
        .writing(&task.report_path, TEMPSET_REPORT)
        .writing(&artifact, "jpeg");
    let payloads = host.payloads.clone();
    let remover = Arc::new(SpyRemover::default());
    let bridge = fx.bridge(host, remover.clone());

    let output = bridge.run(task).await.expect("run succeeds");
    assert_eq!(output, TaskOutput::Artifact(artifact.clone()));
    assert!(artifact.is_file());
    assert!(!script.exists(), "payload left behind");
    assert!(!report.exists(), "registry report left behind");

    let payloads = payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].contains(r#"app.doAction("Apply Shirt", "TempSet");"#));
    assert_eq!(remover.groups(), groups(&["TempSet"]));

    let log = std::fs::read_to_string(fx.layout.log_path()).unwrap();
    for state in ["prepared", "invoked", "polling", "succeeded"] {
        assert!(log.contains(&format!("state → {state}")), "missing {state} in:\n{log}");
    }
}

#[tokio::test]
async fn cleanup_failures_accumulate_without_changing_the_outcome() {
    let fx = Fixture::new();
    let remover = Arc::new(SpyRemover {
        fail: true,
        ..SpyRemover::default()
    });

    let tasks: Vec<_> = ["f1", "f2"]
        .into_iter()
        .map(|id| {
            inspect_bundle_task_with_id(
                &fx.layout,
                &fx.layout.uploads_dir.join("new.atn"),
                TaskId::from(id),
            )
        })
        .collect();
    let mut host = FakeHost::exiting(0, "");
    for task in &tasks {
        host = host.writing(&task.report_path, TEMPSET_REPORT);
    }
    let bridge = fx.bridge(host, remover.clone());

    for (n, task) in tasks.into_iter().enumerate() {
        assert_eq!(
            bridge.run(task).await.unwrap(),
            TaskOutput::ActionName("Action_A".to_string())
        );
        assert_eq!(bridge.cleanup_failures(), n as u64 + 1);
    }
    assert_eq!(remover.calls.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn overall_deadline_interrupts_a_hung_host() {
    let fx = Fixture::new();
    let task = inspect_bundle_task_with_id(
        &fx.layout,
        &fx.layout.uploads_dir.join("new.atn"),
        TaskId::from("e2e6"),
    );
    let mut host = FakeHost::exiting(0, "");
    host.delay = Some(Duration::from_secs(600));
    let remover = Arc::new(SpyRemover::default());
    let bridge = fx.bridge_with_deadline(host, remover.clone(), Duration::from_secs(5));

    let err = bridge.run(task).await.unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { waited, .. } if waited == Duration::from_secs(5)));
    assert!(remover.groups().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cleanup_survives_the_caller_dropping_the_task() {
    let fx = Fixture::new();
    let task = run_preset_task_with_id(&fx.layout, &fx.request(), TaskId::from("e2e7"));
    let report = task.report_path.clone();
    let mut host = FakeHost::exiting(0, "").writing(&task.report_path, TEMPSET_REPORT);
    host.linger = Some(Duration::from_secs(600));
    let remover = Arc::new(SpyRemover::default());
    let bridge = fx.bridge_with_deadline(host, remover.clone(), Duration::from_secs(20));

    let abandoned = tokio::time::timeout(Duration::from_secs(5), bridge.run(task)).await;
    assert!(abandoned.is_err(), "caller gave up first");
    assert!(remover.groups().is_empty());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(remover.groups(), groups(&["TempSet"]));
    assert!(!report.exists());

    let log = std::fs::read_to_string(fx.layout.log_path()).unwrap();
    assert!(log.contains("state → timed-out"), "detached task never finished:\n{log}");
}
