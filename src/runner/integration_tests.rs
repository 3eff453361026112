#[cfg(test)]
mod integration_tests {
    use crate::catalog::SnippetEntry;
    use crate::cli::Selection;
    use crate::catalog::SnippetCatalog;
    use crate::config::{LaunchTemplate, RunnerConfig, SnippetProperties};
    use crate::errors::{RunnerError, SzError};
    use crate::runner::{
        prepare_repository, PreparationPlan, ProcessExecutor, RunCoordinator, RunPhase,
    };
    use crate::sdk::local::testing::TestRepository;
    use crate::sdk::local::LocalEnvironmentFactory;
    use crate::sdk::{ConfigDocument, SzEnvironment, SzRecordKey};
    use crate::traits::{ExecutionOutcome, ExecutionRequest, SnippetExecutor};
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn entry(group: &str, name: &str, path: &Path) -> SnippetEntry {
        SnippetEntry {
            group: group.to_string(),
            name: name.to_string(),
            qualified_name: format!("{group}.{name}"),
            path: path.to_path_buf(),
        }
    }

    fn plan(repo: &TestRepository, snippet: &str, properties: SnippetProperties) -> PreparationPlan {
        let env = repo.environment();
        PreparationPlan {
            snippet: snippet.to_string(),
            properties,
            resources_dir: repo.dir.path().to_path_buf(),
            default_config_id: env.config_manager().get_default_config_id().unwrap().unwrap(),
        }
    }

    fn active_sources(env: &dyn SzEnvironment) -> Vec<String> {
        let manager = env.config_manager();
        let id = manager.get_default_config_id().unwrap().unwrap();
        ConfigDocument::from_json(&manager.get_config(id).unwrap())
            .unwrap()
            .data_source_codes()
    }

    fn key(data_source: &str, record_id: &str) -> SzRecordKey {
        SzRecordKey::new(data_source, Some(record_id.to_string()))
    }

    #[test]
    fn test_declared_sources_become_default_config() {
        let repo = TestRepository::new();
        let properties = SnippetProperties::parse("source.0=CUSTOMERS\nsource.1=WATCHLIST\n").unwrap();
        let plan = plan(&repo, "loading.load_records", properties);

        let env = repo.environment();
        prepare_repository(&env, &plan).unwrap();

        assert_eq!(
            active_sources(&env),
            vec!["TEST", "SEARCH", "CUSTOMERS", "WATCHLIST"]
        );
        assert!(env
            .config_manager()
            .get_config_registry()
            .unwrap()
            .contains("loading.load_records"));
    }

    #[test]
    fn test_no_sources_restores_run_default() {
        let repo = TestRepository::new();
        let default_plan = plan(&repo, "information.get_version", SnippetProperties::default());

        repo.add_data_sources(&["WATCHLIST"]);
        let env = repo.environment();
        assert!(active_sources(&env).contains(&"WATCHLIST".to_string()));

        prepare_repository(&env, &default_plan).unwrap();
        assert_eq!(
            env.config_manager().get_default_config_id().unwrap(),
            Some(default_plan.default_config_id)
        );
        assert!(!active_sources(&env).contains(&"WATCHLIST".to_string()));
    }

    #[test]
    fn test_preparation_purges_previous_records() {
        let repo = TestRepository::new();
        let env = repo.environment();
        env.engine()
            .add_record(&key("TEST", "stale"), "{}", crate::sdk::SzFlags::NO_FLAGS)
            .unwrap();

        prepare_repository(&env, &plan(&repo, "deleting.delete_records", SnippetProperties::default()))
            .unwrap();

        assert!(matches!(
            env.engine().get_record(&key("TEST", "stale")),
            Err(SzError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_stops_at_malformed_line() {
        let repo = TestRepository::new();
        fs::write(
            repo.dir.path().join("records.jsonl"),
            concat!(
                "{\"RECORD_ID\":\"1\",\"NAME_FULL\":\"Joe Schmoe\"}\n",
                "{\"DATA_SOURCE\":\"SEARCH\",\"RECORD_ID\":\"2\"}\n",
                "\n",
                "# a comment\n",
                "{\"RECORD_ID\":\"3\"\n",
                "{\"RECORD_ID\":\"4\"}\n",
            ),
        )
        .unwrap();

        let properties = SnippetProperties::parse("load.0=records.jsonl").unwrap();
        let env = repo.environment();
        let result = prepare_repository(&env, &plan(&repo, "loading.load_records", properties));

        match result {
            Err(RunnerError::MalformedRecord { line_number, .. }) => assert_eq!(line_number, 5),
            other => panic!("unexpected: {other:?}"),
        }

        let engine = env.engine();
        engine.get_record(&key("TEST", "1")).unwrap();
        engine.get_record(&key("SEARCH", "2")).unwrap();
        assert!(matches!(
            engine.get_record(&key("TEST", "4")),
            Err(SzError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_load_file() {
        let repo = TestRepository::new();
        let properties = SnippetProperties::parse("load.0=absent.jsonl").unwrap();
        let env = repo.environment();

        match prepare_repository(&env, &plan(&repo, "loading.load_records", properties)) {
            Err(RunnerError::MissingLoadFile { key, snippet, .. }) => {
                assert_eq!(key, "load.0");
                assert_eq!(snippet, "loading.load_records");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_unregistered_source_in_load_file_is_fatal() {
        let repo = TestRepository::new();
        fs::write(
            repo.dir.path().join("records.jsonl"),
            "{\"DATA_SOURCE\":\"CUSTOMERS\",\"RECORD_ID\":\"1\"}\n",
        )
        .unwrap();
        let properties = SnippetProperties::parse("load.0=records.jsonl").unwrap();
        let env = repo.environment();

        match prepare_repository(&env, &plan(&repo, "loading.load_records", properties)) {
            Err(RunnerError::Engine { phase, source, .. }) => {
                assert_eq!(phase, RunPhase::Loading);
                assert!(matches!(source, SzError::BadInput(_)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    /// Records requests and replies with scripted outcomes.
    struct ScriptedExecutor {
        outcomes: Mutex<Vec<ExecutionOutcome>>,
        executed: Mutex<Vec<(String, Vec<String>, Option<Duration>)>>,
    }

    impl ScriptedExecutor {
        fn new(outcomes: Vec<ExecutionOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                executed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SnippetExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            request: ExecutionRequest<'_>,
            _cancel: CancellationToken,
        ) -> Result<ExecutionOutcome, RunnerError> {
            self.executed.lock().unwrap().push((
                request.entry.qualified_name.clone(),
                request.inputs.to_vec(),
                request.destroy_after,
            ));
            Ok(self.outcomes.lock().unwrap().remove(0))
        }
    }

    fn snippets_fixture(resources: &Path, names: &[(&str, &str)]) -> (TempDir, Selection) {
        let snippets = TempDir::new().unwrap();
        for (group, name) in names {
            let dir = snippets.path().join(group).join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("Cargo.toml"), format!("[package]\nname = \"{name}\"\n")).unwrap();
        }
        fs::create_dir_all(resources).unwrap();
        let catalog = SnippetCatalog::build(snippets.path());
        let selection = Selection::resolve(&catalog, &["all"]).unwrap();
        (snippets, selection)
    }

    fn coordinator(repo: &TestRepository, executor: Arc<dyn SnippetExecutor>) -> RunCoordinator {
        let default_config_id = repo
            .environment()
            .config_manager()
            .get_default_config_id()
            .unwrap()
            .unwrap();
        RunCoordinator::new(
            Arc::new(LocalEnvironmentFactory),
            executor,
            repo.settings.clone(),
            default_config_id,
            repo.dir.path().join("resources"),
            143,
        )
    }

    #[tokio::test]
    async fn test_coordinator_runs_in_order_with_properties() {
        let repo = TestRepository::new();
        let resources = repo.dir.path().join("resources");
        let (_snippets, selection) =
            snippets_fixture(&resources, &[("redo", "redo_continuous"), ("loading", "load_records")]);
        fs::write(
            resources.join("redo.redo_continuous.properties"),
            "destroyAfter=3000\ninput.0=yes\n",
        )
        .unwrap();

        let executor = Arc::new(ScriptedExecutor::new(vec![
            ExecutionOutcome { exit_code: 0, terminated: false },
            ExecutionOutcome { exit_code: 143, terminated: true },
        ]));
        let report = coordinator(&repo, executor.clone()).run(&selection).await.unwrap();

        assert!(!report.interrupted);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].snippet, "loading.load_records");
        assert!(report.results[1].terminated);

        let executed = executor.executed.lock().unwrap();
        assert_eq!(executed[0], ("loading.load_records".to_string(), vec![], None));
        assert_eq!(
            executed[1],
            (
                "redo.redo_continuous".to_string(),
                vec!["yes".to_string()],
                Some(Duration::from_millis(3000))
            )
        );
    }

    #[tokio::test]
    async fn test_unexpected_exit_code_aborts_run() {
        let repo = TestRepository::new();
        let resources = repo.dir.path().join("resources");
        let (_snippets, selection) = snippets_fixture(
            &resources,
            &[("a", "first"), ("b", "second"), ("c", "third")],
        );

        let executor = Arc::new(ScriptedExecutor::new(vec![
            ExecutionOutcome { exit_code: 0, terminated: false },
            ExecutionOutcome { exit_code: 1, terminated: false },
            ExecutionOutcome { exit_code: 0, terminated: false },
        ]));
        let result = coordinator(&repo, executor.clone()).run(&selection).await;

        match result {
            Err(RunnerError::UnexpectedExitCode { snippet, expected, actual }) => {
                assert_eq!(snippet, "b.second");
                assert_eq!((expected, actual), (0, 1));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(executor.executed.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_terminated_snippet_must_exit_with_sigterm_code() {
        let repo = TestRepository::new();
        let resources = repo.dir.path().join("resources");
        let (_snippets, selection) = snippets_fixture(&resources, &[("redo", "loop")]);

        let executor = Arc::new(ScriptedExecutor::new(vec![ExecutionOutcome {
            exit_code: 0,
            terminated: true,
        }]));
        let result = coordinator(&repo, executor).run(&selection).await;

        assert!(matches!(
            result,
            Err(RunnerError::UnexpectedExitCode { expected: 143, actual: 0, .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shipped_snippets_run_end_to_end() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let config = RunnerConfig::default();
        let snippets = config.snippets_dir(root).unwrap();
        let catalog = SnippetCatalog::build(&snippets);
        let selection = Selection::resolve(&catalog, &["all"]).unwrap();
        assert_eq!(
            selection.names(),
            vec![
                "loading.load_via_futures",
                "loading.load_via_queue",
                "redo.redo_continuous",
            ]
        );

        // loaders finish on their own; the redo loop runs until destroyed
        let launch = LaunchTemplate(
            ["sh", "-c", "case \"$1\" in redo.*) exec sleep 30;; esac", "sh", "{snippet}"]
                .iter()
                .map(|part| part.to_string())
                .collect(),
        );
        let executor = Arc::new(ProcessExecutor::new(
            launch,
            Duration::ZERO,
            Duration::from_millis(500),
        ));

        let repo = TestRepository::new();
        let default_config_id = repo
            .environment()
            .config_manager()
            .get_default_config_id()
            .unwrap()
            .unwrap();
        let coordinator = RunCoordinator::new(
            Arc::new(LocalEnvironmentFactory),
            executor,
            repo.settings.clone(),
            default_config_id,
            config.resources_dir(&snippets),
            143,
        );

        let report = coordinator.run(&selection).await.unwrap();
        let outcomes: Vec<(&str, i32, bool)> = report
            .results
            .iter()
            .map(|result| (result.snippet.as_str(), result.exit_code, result.terminated))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("loading.load_via_futures", 0, false),
                ("loading.load_via_queue", 0, false),
                ("redo.redo_continuous", 143, true),
            ]
        );
        assert!(report.results[2].execution >= Duration::from_millis(5000));

        let env = repo.environment();
        assert_eq!(
            active_sources(&env),
            vec!["TEST", "SEARCH", "CUSTOMERS"]
        );
        assert!(env.engine().get_record(&key("CUSTOMERS", "1001")).is_ok());
        assert_eq!(env.engine().count_redo_records().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_is_interrupted() {
        let repo = TestRepository::new();
        let resources = repo.dir.path().join("resources");
        let (_snippets, selection) = snippets_fixture(&resources, &[("a", "first")]);

        let executor = Arc::new(ScriptedExecutor::new(vec![]));
        let coordinator = coordinator(&repo, executor.clone());
        coordinator.cancellation().cancel();

        let report = coordinator.run(&selection).await.unwrap();
        assert!(report.interrupted);
        assert!(report.results.is_empty());
        assert!(executor.executed.lock().unwrap().is_empty());
    }

    fn shell(script: &str) -> ProcessExecutor {
        ProcessExecutor::new(
            LaunchTemplate(vec!["sh".to_string(), "-c".to_string(), script.to_string()]),
            Duration::from_millis(10),
            Duration::from_millis(500),
        )
    }

    fn request<'a>(
        entry: &'a SnippetEntry,
        inputs: &'a [String],
        destroy_after: Option<Duration>,
    ) -> ExecutionRequest<'a> {
        ExecutionRequest {
            entry,
            settings: "{}",
            inputs,
            destroy_after,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_exit_code_is_reported() {
        let dir = TempDir::new().unwrap();
        let entry = entry("misc", "exit_three", dir.path());

        let outcome = shell("exit 3")
            .execute(request(&entry, &[], None), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome { exit_code: 3, terminated: false });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_settings_are_passed_in_environment() {
        let dir = TempDir::new().unwrap();
        let entry = entry("misc", "settings", dir.path());

        let outcome = shell("test \"$SENZING_ENGINE_CONFIGURATION_JSON\" = '{}'")
            .execute(request(&entry, &[], None), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.exit_code, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_inputs_are_written_to_stdin() {
        let dir = TempDir::new().unwrap();
        let entry = entry("misc", "reader", dir.path());
        let inputs = vec!["one".to_string(), "two".to_string()];

        let outcome = shell("read a; read b; test \"$a$b\" = onetwo")
            .execute(request(&entry, &inputs, None), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.exit_code, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_destroy_after_terminates_with_sigterm() {
        let dir = TempDir::new().unwrap();
        let entry = entry("redo", "forever", dir.path());

        let outcome = shell("sleep 30")
            .execute(
                request(&entry, &[], Some(Duration::from_millis(200))),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome { exit_code: 143, terminated: true });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_racing_deadline_is_never_terminated_success() {
        let dir = TempDir::new().unwrap();
        let entry = entry("misc", "quick", dir.path());
        let executor = shell("exit 0");

        for attempt in 0..50u64 {
            let deadline = Duration::from_micros(500 + attempt * 40);
            let outcome = executor
                .execute(request(&entry, &[], Some(deadline)), CancellationToken::new())
                .await
                .unwrap();

            let expected = if outcome.terminated { 143 } else { 0 };
            assert_eq!(outcome.exit_code, expected, "attempt {attempt}: {outcome:?}");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ignored_sigterm_is_force_killed() {
        let dir = TempDir::new().unwrap();
        let entry = entry("redo", "stubborn", dir.path());

        let outcome = shell("trap '' TERM; sleep 30")
            .execute(
                request(&entry, &[], Some(Duration::from_millis(200))),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(outcome.terminated);
        assert_eq!(outcome.exit_code, 137);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_terminates_process() {
        let dir = TempDir::new().unwrap();
        let entry = entry("redo", "interrupted", dir.path());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let outcome = shell("sleep 30")
            .execute(request(&entry, &[], None), cancel)
            .await
            .unwrap();
        assert!(outcome.terminated);
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let dir = TempDir::new().unwrap();
        let entry = entry("misc", "missing", dir.path());
        let executor = ProcessExecutor::new(
            LaunchTemplate(vec!["/nonexistent/snippet-binary".to_string()]),
            Duration::ZERO,
            Duration::ZERO,
        );

        let result = executor
            .execute(request(&entry, &[], None), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(RunnerError::Launch { .. })));

        let empty = ProcessExecutor::new(LaunchTemplate(vec![]), Duration::ZERO, Duration::ZERO);
        assert!(matches!(
            empty
                .execute(request(&entry, &[], None), CancellationToken::new())
                .await,
            Err(RunnerError::EmptyLaunchCommand)
        ));
    }
}
