//! Run engine
//!
//! Drives each submitted pipeline through fetch, build and deploy on its own
//! tokio task. Every transition is written to the registry, which is the only
//! state shared with the control plane.

use crate::config::{Config, WorkspaceRetention};
use crate::service::fetcher::{GitFetcher, SourceFetcher};
use crate::service::process;
use crate::service::registry::RunRegistry;
use chief_core::domain::pipeline::{PipelineSpec, Step};
use chief_core::domain::run::{Phase, Run, RunError, RunId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Settings the engine needs from the daemon configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub workspace_root: PathBuf,
    pub retention: WorkspaceRetention,
    pub max_concurrent_runs: usize,
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            workspace_root: config.workspace_root.clone(),
            retention: config.retention,
            max_concurrent_runs: config.max_concurrent_runs,
        }
    }
}

/// Executes runs and tracks their tasks
pub struct RunEngine {
    driver: Driver,
    permits: Arc<Semaphore>,
    tasks: Mutex<HashMap<RunId, JoinHandle<()>>>,
}

impl RunEngine {
    pub fn new(
        registry: Arc<RunRegistry>,
        settings: EngineSettings,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_runs.max(1)));

        Self {
            driver: Driver {
                registry,
                settings,
                fetcher,
            },
            permits,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an engine that fetches with git as configured
    pub fn from_config(config: &Config, registry: Arc<RunRegistry>) -> Self {
        Self::new(
            registry,
            EngineSettings::from(config),
            Arc::new(GitFetcher::new(config.git_program.clone())),
        )
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.driver.registry
    }

    /// Directory a run executes in
    pub fn workspace_path(&self, id: RunId) -> PathBuf {
        self.driver.workspace_path(id)
    }

    /// Registers a pending run for `spec` and starts it in the background
    ///
    /// Returns as soon as the run is registered. The run waits for a free slot
    /// while more than `max_concurrent_runs` runs are executing.
    pub fn execute(&self, spec: PipelineSpec) -> RunId {
        let id = self.driver.registry.insert(Run::new(spec.clone()));
        info!("Run {} submitted for {}", id, spec.repository_url());

        let driver = self.driver.clone();
        let permits = Arc::clone(&self.permits);

        let handle = tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                driver.record(id, |run| {
                    run.fail(RunError::Io {
                        message: "engine is no longer accepting work".to_string(),
                    })
                });
                return;
            };

            driver.drive(id, &spec).await;
        });

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|_, task| !task.is_finished());
        tasks.insert(id, handle);

        id
    }

    /// Waits for a run to reach a terminal phase
    ///
    /// Returns `None` if the run is unknown.
    pub async fn await_run(&self, id: RunId) -> Option<Run> {
        self.driver.registry.wait_for_terminal(id).await
    }

    /// Number of run tasks that have not completed yet
    pub fn outstanding(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Waits for every outstanding run task to complete
    pub async fn drain(&self) {
        loop {
            let pending: Vec<(RunId, JoinHandle<()>)> = self
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain()
                .collect();

            if pending.is_empty() {
                return;
            }

            info!("Waiting for {} run(s) to finish", pending.len());

            for (id, task) in pending {
                if let Err(e) = task.await {
                    error!("Run task {} ended abnormally: {}", id, e);
                }
            }
        }
    }
}

/// The part of the engine moved into each run task
#[derive(Clone)]
struct Driver {
    registry: Arc<RunRegistry>,
    settings: EngineSettings,
    fetcher: Arc<dyn SourceFetcher>,
}

impl Driver {
    fn workspace_path(&self, id: RunId) -> PathBuf {
        self.settings.workspace_root.join(id.to_string())
    }

    async fn drive(&self, id: RunId, spec: &PipelineSpec) {
        let workspace = self.workspace_path(id);

        let result = self.run_phases(id, spec, &workspace).await;
        let succeeded = result.is_ok();

        self.cleanup(&workspace, succeeded).await;

        match result {
            Ok(()) => {
                self.record(id, |run| run.advance(Phase::Succeeded));
                info!("Run {} succeeded", id);
            }
            Err(e) => {
                warn!("Run {} failed: {}", id, e);
                self.record(id, |run| run.fail(e));
            }
        }
    }

    async fn run_phases(
        &self,
        id: RunId,
        spec: &PipelineSpec,
        workspace: &Path,
    ) -> Result<(), RunError> {
        let root = &self.settings.workspace_root;

        self.record(id, |run| run.advance(Phase::Fetching));

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| RunError::Io {
                message: format!("failed to create {}: {}", root.display(), e),
            })?;

        let fetch = self.fetcher.fetch_step(spec.repository_url(), workspace);
        self.run_step(id, Phase::Fetching, &fetch, root).await?;

        if !tokio::fs::try_exists(workspace).await.unwrap_or(false) {
            return Err(RunError::Io {
                message: format!("{} does not exist after fetching", workspace.display()),
            });
        }

        self.record(id, |run| run.advance(Phase::Building));
        for step in spec.build_steps() {
            self.run_step(id, Phase::Building, step, workspace).await?;
        }

        self.record(id, |run| run.advance(Phase::Deploying));
        for step in spec.deploy_steps() {
            self.run_step(id, Phase::Deploying, step, workspace).await?;
        }

        Ok(())
    }

    async fn run_step(
        &self,
        id: RunId,
        phase: Phase,
        step: &Step,
        cwd: &Path,
    ) -> Result<(), RunError> {
        let output = process::run_step(step, cwd)
            .await
            .map_err(|e| RunError::Launch {
                phase,
                step: step.to_string(),
                message: e.to_string(),
            })?;

        let entry = output.log_entry(step);
        self.record(id, |run| run.log.push(entry));

        if output.success {
            Ok(())
        } else {
            Err(RunError::Execution {
                phase,
                step: step.to_string(),
                exit_status: output.exit_status,
            })
        }
    }

    async fn cleanup(&self, workspace: &Path, succeeded: bool) {
        if !self.settings.retention.should_remove(succeeded) {
            debug!("Keeping workspace {}", workspace.display());
            return;
        }

        match tokio::fs::remove_dir_all(workspace).await {
            Ok(()) => debug!("Removed workspace {}", workspace.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove workspace {}: {}", workspace.display(), e),
        }
    }

    fn record<F>(&self, id: RunId, change: F)
    where
        F: FnOnce(&mut Run),
    {
        if let Err(e) = self.registry.update(id, change) {
            error!("Failed to record progress: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Creates the workspace directory instead of cloning
    struct MkdirFetcher;

    impl SourceFetcher for MkdirFetcher {
        fn fetch_step(&self, _repository_url: &str, workspace: &Path) -> Step {
            Step::new("mkdir", ["-p".to_string(), workspace.display().to_string()])
        }
    }

    /// Fetch step that succeeds without producing a workspace
    struct NoopFetcher;

    impl SourceFetcher for NoopFetcher {
        fn fetch_step(&self, _repository_url: &str, _workspace: &Path) -> Step {
            Step::new("true", Vec::<String>::new())
        }
    }

    fn engine_with(
        root: &TempDir,
        retention: WorkspaceRetention,
        max_concurrent_runs: usize,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> RunEngine {
        RunEngine::new(
            Arc::new(RunRegistry::new()),
            EngineSettings {
                workspace_root: root.path().join("workspaces"),
                retention,
                max_concurrent_runs,
            },
            fetcher,
        )
    }

    fn engine(root: &TempDir, retention: WorkspaceRetention) -> RunEngine {
        engine_with(root, retention, 4, Arc::new(MkdirFetcher))
    }

    fn spec(build: &[&str], deploy: &[&str]) -> PipelineSpec {
        PipelineSpec::new(
            "https://example.com/app.git",
            build.iter().filter_map(|l| Step::from_line(l)).collect(),
            deploy.iter().filter_map(|l| Step::from_line(l)).collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_pipeline_walks_every_phase() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::Remove);

        let id = engine.execute(spec(&[], &[]));
        let run = engine.await_run(id).await.unwrap();
        let workspace = engine.workspace_path(id);

        assert_eq!(run.phase, Phase::Succeeded);
        assert!(run.error.is_none());
        assert_eq!(
            run.log,
            vec![
                "phase Fetching".to_string(),
                format!("$ mkdir -p {}", workspace.display()),
                "phase Building".to_string(),
                "phase Deploying".to_string(),
                "phase Succeeded".to_string(),
            ]
        );
        assert!(run.started_at.is_some());
        assert!(run.finished_at.is_some());
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_steps_run_in_workspace_in_order() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::Keep);

        let id = engine.execute(spec(&["touch built.txt"], &["cp built.txt deployed.txt"]));
        let run = engine.await_run(id).await.unwrap();
        let workspace = engine.workspace_path(id);

        assert_eq!(run.phase, Phase::Succeeded);
        assert!(workspace.join("built.txt").exists());
        assert!(workspace.join("deployed.txt").exists());

        let build = run.log.iter().position(|e| e == "$ touch built.txt").unwrap();
        let deploying = run.log.iter().position(|e| e == "phase Deploying").unwrap();
        let deploy = run
            .log
            .iter()
            .position(|e| e == "$ cp built.txt deployed.txt")
            .unwrap();
        assert!(build < deploying && deploying < deploy);
    }

    #[tokio::test]
    async fn test_step_output_is_logged() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::Remove);

        let id = engine.execute(spec(&["echo compiling"], &[]));
        let run = engine.await_run(id).await.unwrap();

        assert!(run.log.contains(&"$ echo compiling\ncompiling".to_string()));
    }

    #[tokio::test]
    async fn test_failing_build_step_stops_the_run() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::Remove);

        let id = engine.execute(spec(&["true", "false", "touch never"], &["echo deploy"]));
        let run = engine.await_run(id).await.unwrap();

        assert_eq!(run.phase, Phase::Failed);
        assert_eq!(
            run.error,
            Some(RunError::Execution {
                phase: Phase::Building,
                step: "false".to_string(),
                exit_status: Some(1),
            })
        );
        assert!(!run.log.iter().any(|e| e == "phase Deploying"));
        assert!(!run.log.iter().any(|e| e.starts_with("$ touch")));
        assert_eq!(
            run.log[run.log.len() - 2],
            "Building step `false` failed with exit status 1"
        );
        assert_eq!(run.log.last().unwrap(), "phase Failed");
    }

    #[tokio::test]
    async fn test_unlaunchable_step_fails_the_run() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::Remove);

        let id = engine.execute(spec(&[], &["chief-no-such-deploy-tool --now"]));
        let run = engine.await_run(id).await.unwrap();

        assert_eq!(run.phase, Phase::Failed);
        assert!(matches!(
            run.error,
            Some(RunError::Launch { phase: Phase::Deploying, ref step, .. })
                if step == "chief-no-such-deploy-tool --now"
        ));
    }

    #[tokio::test]
    async fn test_fetch_without_workspace_fails() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine_with(&root, WorkspaceRetention::Remove, 4, Arc::new(NoopFetcher));

        let id = engine.execute(spec(&["true"], &[]));
        let run = engine.await_run(id).await.unwrap();

        assert_eq!(run.phase, Phase::Failed);
        assert!(matches!(run.error, Some(RunError::Io { .. })));
        assert!(!run.log.iter().any(|e| e == "phase Building"));
    }

    #[tokio::test]
    async fn test_keep_on_failure_retention() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::KeepOnFailure);

        let failed = engine.execute(spec(&["false"], &[]));
        let succeeded = engine.execute(spec(&["true"], &[]));

        assert_eq!(engine.await_run(failed).await.unwrap().phase, Phase::Failed);
        assert_eq!(
            engine.await_run(succeeded).await.unwrap().phase,
            Phase::Succeeded
        );
        assert!(engine.workspace_path(failed).exists());
        assert!(!engine.workspace_path(succeeded).exists());
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_tracked_independently() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::Remove);

        let ids: Vec<RunId> = (0..8).map(|_| engine.execute(spec(&["true"], &[]))).collect();
        engine.drain().await;

        let registry = engine.registry();
        assert_eq!(registry.counts(), (0, 8));
        for id in ids {
            let run = registry.get(id).unwrap();
            assert_eq!(run.id, id);
            assert_eq!(run.phase, Phase::Succeeded);
        }
        assert_eq!(engine.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_excess_runs_wait_for_a_slot() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine_with(&root, WorkspaceRetention::Remove, 1, Arc::new(MkdirFetcher));

        let first = engine.execute(spec(&["sleep 1"], &[]));
        let mut receiver = engine.registry().subscribe(first).unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            receiver.wait_for(|run| run.phase == Phase::Building),
        )
        .await
        .unwrap()
        .unwrap();

        let second = engine.execute(spec(&[], &[]));
        assert_eq!(engine.registry().get(second).unwrap().phase, Phase::Pending);

        engine.drain().await;
        assert_eq!(
            engine.registry().get(second).unwrap().phase,
            Phase::Succeeded
        );
    }

    #[tokio::test]
    async fn test_non_utf8_step_output_does_not_fail_the_run() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::Keep);

        let build = Step::new("sh", ["-c", "printf 'caf\\351\\n'; touch done; exit 0"]);
        let spec = PipelineSpec::new("https://example.com/app.git", vec![build], vec![]).unwrap();

        let id = engine.execute(spec);
        let run = engine.await_run(id).await.unwrap();

        assert_eq!(run.phase, Phase::Succeeded);
        assert!(run.error.is_none());
        assert!(engine.workspace_path(id).join("done").exists());
        assert!(run.log.iter().any(|e| e.ends_with("caf\u{FFFD}")));
    }

    #[tokio::test]
    async fn test_snapshots_stay_consistent_while_runs_execute() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine_with(&root, WorkspaceRetention::Remove, 3, Arc::new(MkdirFetcher));

        let pipelines = [
            spec(&["sleep 0.1", "true"], &["sleep 0.1"]),
            spec(&["sleep 0.1", "false"], &["true"]),
            spec(&["true"], &["sleep 0.1", "false"]),
            spec(&["sleep 0.2"], &["echo shipped"]),
            spec(&["chief-no-such-build-tool"], &[]),
            spec(&[], &["sleep 0.1"]),
        ];

        let watchers: Vec<_> = pipelines
            .into_iter()
            .map(|pipeline| {
                let id = engine.execute(pipeline);
                let mut receiver = engine.registry().subscribe(id).unwrap();

                tokio::spawn(async move {
                    let mut observed = 0;
                    loop {
                        let run = receiver.borrow_and_update().clone();
                        observed += 1;

                        let logged = run
                            .log
                            .iter()
                            .rev()
                            .find_map(|e| e.strip_prefix("phase "))
                            .unwrap_or("Pending");
                        assert_eq!(logged, run.phase.to_string(), "log: {:?}", run.log);
                        assert_eq!(run.error.is_some(), run.phase == Phase::Failed);

                        if run.phase.is_terminal() || receiver.changed().await.is_err() {
                            return (run.phase, observed);
                        }
                    }
                })
            })
            .collect();

        let mut failed = 0;
        for watcher in watchers {
            let (phase, observed) = tokio::time::timeout(Duration::from_secs(10), watcher)
                .await
                .unwrap()
                .unwrap();
            assert!(phase.is_terminal());
            assert!(observed > 1);
            if phase == Phase::Failed {
                failed += 1;
            }
        }

        assert_eq!(failed, 3);
        assert_eq!(engine.registry().counts(), (0, 6));
    }

    #[tokio::test]
    async fn test_await_unknown_run() {
        let root = tempfile::tempdir().unwrap();
        let engine = engine(&root, WorkspaceRetention::Remove);
        assert!(engine.await_run(RunId::new()).await.is_none());
    }
}
