#![cfg(unix)]

mod common;

use common::FakeDocker;
use foundry_core::dataset::{Context, Dataset, Param, Services};
use foundry_core::events::EventBus;
use foundry_core::pipeline::{ItemPipeline, Pipeline, PipelineParams};
use foundry_core::sandbox::{DockerSandboxProvider, SandboxConfig};
use foundry_core::types::{CommandResult, UnitTestResult};
use foundry_core::unit_tests::{PytestReportParser, PytestRunner};
use foundry_core::RunUnitTests;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn services(fake: &FakeDocker, config: SandboxConfig) -> Services {
    let mut sandboxes = HashMap::new();
    sandboxes.insert("python".to_string(), config);
    Services {
        sandboxes: Arc::new(DockerSandboxProvider::new(sandboxes).with_docker_binary(fake.binary())),
        local_runner: Arc::new(PytestRunner::new()),
        report_parser: Arc::new(PytestReportParser),
    }
}

fn dataset() -> Dataset {
    Dataset::from_json(
        "solutions",
        r#"[
            { "id": "a", "test_file": "test_a.py" },
            { "id": 2, "test_file": "test_b.py" }
        ]"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_sandboxed_tests_publish_results_for_every_item() {
    let fake = FakeDocker::passing();
    let config = SandboxConfig::new("python:3.12").with_setup("echo installing");
    let context = Context::new(fake.dir.path(), services(&fake, config));

    let pipeline = ItemPipeline::new("unit_tests", dataset(), context)
        .with_action(RunUnitTests::new(Param::key("test_file")).sandbox("python"))
        .with_concurrency(2);

    let report = pipeline
        .run(&PipelineParams::new(), &EventBus::default(), CancellationToken::new())
        .await
        .unwrap();
    assert!(report.succeeded());
    assert_eq!(report.items, 2);

    for (item, file) in pipeline.dataset().items.iter().zip(["test_a.py", "test_b.py"]) {
        let test: UnitTestResult = item.get_as("test_result").unwrap().unwrap();
        assert_eq!(test.returncode, Some(0));
        assert_eq!(test.num_passed, 1);
        assert_eq!(test.num_failed, 0);
        assert_eq!(test.command, vec![format!("python -m pytest -v {}", file)]);

        let setup: CommandResult = item.get_as("setup_result").unwrap().unwrap();
        assert_eq!(setup.stdout, "installing");
        assert!(setup.success());
        assert_eq!(item.producer_of("test_result").as_deref(), Some("run_unit_tests"));
    }
    assert_eq!(fake.removed().len(), 2);
}

#[tokio::test]
async fn test_failing_setup_is_data_not_an_error() {
    let fake = FakeDocker::passing();
    let config = SandboxConfig::new("python:3.12").with_setup("exit 1");
    let context = Context::new(fake.dir.path(), services(&fake, config));

    let pipeline = ItemPipeline::new("unit_tests", dataset(), context)
        .with_action(RunUnitTests::new(Param::key("test_file")).sandbox("python"));

    let report = pipeline
        .run(&PipelineParams::new(), &EventBus::default(), CancellationToken::new())
        .await
        .unwrap();
    assert!(report.succeeded());

    let item = &pipeline.dataset().items[0];
    let test: UnitTestResult = item.get_as("test_result").unwrap().unwrap();
    assert!(!test.ran());
    assert_eq!(test.num_tests(), 0);
    let setup: CommandResult = item.get_as("setup_result").unwrap().unwrap();
    assert_eq!(setup.returncode, Some(1));
}

#[tokio::test]
async fn test_sandbox_name_from_params() {
    let fake = FakeDocker::passing();
    let context = Context::new(fake.dir.path(), services(&fake, SandboxConfig::new("python:3.12")));
    let pipeline = ItemPipeline::new("unit_tests", dataset(), context).with_action(
        RunUnitTests::new(Param::key("test_file"))
            .sandbox(Param::key("context.sandbox"))
            .property("solution_tests"),
    );

    let mut params = PipelineParams::new();
    params.insert("sandbox".into(), serde_json::json!("python"));
    pipeline
        .run(&params, &EventBus::default(), CancellationToken::new())
        .await
        .unwrap();

    let item = &pipeline.dataset().items[1];
    assert_eq!(item.id(), "2");
    assert!(item.get("solution_tests").is_some());
    // No setup commands means no setup phase
    assert!(item.get("setup_result").is_none());
}

#[tokio::test]
async fn test_unknown_sandbox_is_reported_per_item() {
    let fake = FakeDocker::passing();
    let context = Context::new(fake.dir.path(), services(&fake, SandboxConfig::new("python:3.12")));
    let pipeline = ItemPipeline::new("unit_tests", dataset(), context)
        .with_action(RunUnitTests::new(Param::key("test_file")).sandbox("ruby"));

    let report = pipeline
        .run(&PipelineParams::new(), &EventBus::default(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.message.contains("ruby")));
    assert!(fake.removed().is_empty());
}
