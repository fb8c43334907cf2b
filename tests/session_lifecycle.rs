//! Session lifecycle across the display, supervisor, pipeline and sandbox
//! runner: quitting mid-run must not return before every container started
//! by the run has been removed.

#![cfg(unix)]

mod common;

use common::SleepingDocker;
use dataset_foundry::config::DisplayConfig;
use dataset_foundry::dataset::{Context, Dataset, Param, Services};
use dataset_foundry::display::{Display, PlainDisplay};
use dataset_foundry::pipeline::{ItemPipeline, Pipeline, PipelineParams};
use dataset_foundry::sandbox::{DockerSandboxProvider, SandboxConfig};
use dataset_foundry::supervisor::SupervisorState;
use dataset_foundry::unit_tests::{PytestReportParser, PytestRunner};
use dataset_foundry::RunUnitTests;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn pipeline(docker: &SleepingDocker, items: usize) -> Arc<ItemPipeline> {
    let mut sandboxes = HashMap::new();
    sandboxes.insert("python".to_string(), SandboxConfig::new("python:3.12"));
    let services = Services {
        sandboxes: Arc::new(DockerSandboxProvider::new(sandboxes).with_docker_binary(docker.binary())),
        local_runner: Arc::new(PytestRunner::new()),
        report_parser: Arc::new(PytestReportParser),
    };

    let entries: Vec<_> = (0..items)
        .map(|i| serde_json::json!({ "id": i, "test_file": format!("test_{}.py", i) }))
        .collect();
    let dataset = Dataset::from_json("items", &serde_json::to_string(&entries).unwrap()).unwrap();

    Arc::new(
        ItemPipeline::new("unit_tests", dataset, Context::new(docker.dir.path(), services))
            .with_action(RunUnitTests::new(Param::key("test_file")).sandbox("python"))
            .with_concurrency(items),
    )
}

#[tokio::test]
async fn test_quit_waits_for_container_cleanup() {
    let docker = SleepingDocker::new();
    let pipeline = pipeline(&docker, 3);
    let display = PlainDisplay::new(DisplayConfig::default());
    let quit = display.quit_handle();

    let session = display.run_pipeline(pipeline.clone() as Arc<dyn Pipeline>, PipelineParams::new());
    let quit_when_running = async {
        while docker.started().len() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        quit.send(()).await.unwrap();
        quit.send(()).await.unwrap();
    };

    let (outcome, ()) = tokio::join!(session, quit_when_running);
    let outcome = outcome.unwrap();

    assert!(outcome.cancelled);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.final_state, SupervisorState::Exited);

    let mut started = docker.started();
    let mut removed = docker.removed();
    started.sort();
    removed.sort();
    assert_eq!(started, removed);

    // Cancelled items publish nothing
    for item in &pipeline.dataset().items {
        assert!(item.history().is_empty());
    }
}

#[tokio::test]
async fn test_display_runs_a_single_session() {
    let docker = SleepingDocker::new();
    let display = PlainDisplay::new(DisplayConfig::default());
    display.quit_handle().send(()).await.unwrap();

    display
        .run_pipeline(pipeline(&docker, 1) as Arc<dyn Pipeline>, PipelineParams::new())
        .await
        .unwrap();
    let second = display
        .run_pipeline(pipeline(&docker, 1) as Arc<dyn Pipeline>, PipelineParams::new())
        .await;
    assert!(second.is_err());
}
