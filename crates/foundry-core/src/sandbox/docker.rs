//! Docker-backed sandbox driver
//!
//! Each run gets its own named container. The container is force-removed on
//! every exit path before `run` returns; if the future is dropped mid-flight
//! the [`ContainerGuard`] removes it synchronously instead.

use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::markers::SETUP_START;
use super::{
    SandboxConfig, SandboxError, SandboxProvider, SandboxRequest, SandboxResult, SandboxRunner,
    TIMEOUT_EXIT_CODE,
};
use crate::error::{FoundryError, FoundryResult};

/// Build the shell script run inside the container.
///
/// With setup commands configured, they run in a `set -e` subshell between
/// the setup markers and the test command only runs when setup succeeded.
pub fn build_entrypoint(setup: &[String], command: &[String]) -> String {
    let command = command.join("\n");
    if setup.is_empty() {
        return command;
    }

    let mut script = String::new();
    script.push_str(&format!("echo '{}'\n", SETUP_START));
    script.push_str("(\nset -e\n");
    for line in setup {
        script.push_str(line);
        script.push('\n');
    }
    script.push_str(")\n");
    script.push_str("foundry_setup_code=$?\n");
    script.push_str("echo \"::setup:end:${foundry_setup_code}::\"\n");
    script.push_str(
        "if [ \"$foundry_setup_code\" -ne 0 ]; then exit \"$foundry_setup_code\"; fi\n",
    );
    script.push_str(&command);
    script
}

/// Removes a container when dropped unless disarmed
struct ContainerGuard {
    docker: String,
    name: String,
    armed: bool,
}

impl ContainerGuard {
    fn new(docker: &str, name: &str) -> Self {
        Self {
            docker: docker.to_string(),
            name: name.to_string(),
            armed: true,
        }
    }

    /// Remove the container and disarm the guard
    async fn release(mut self) {
        let removed = Command::new(&self.docker)
            .args(["rm", "-f", &self.name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match removed {
            Ok(_) => debug!(container = %self.name, "Removed sandbox container"),
            Err(e) => warn!(container = %self.name, "Failed to remove sandbox container: {}", e),
        }
        self.armed = false;
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(container = %self.name, "Sandbox run dropped; removing container");
            let _ = std::process::Command::new(&self.docker)
                .args(["rm", "-f", &self.name])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}

/// Runs commands in a fresh Docker container per request
pub struct DockerSandboxRunner {
    name: String,
    config: SandboxConfig,
    docker: String,
}

impl DockerSandboxRunner {
    pub fn new(name: impl Into<String>, config: SandboxConfig) -> Self {
        Self {
            name: name.into(),
            config,
            docker: "docker".to_string(),
        }
    }

    /// Use a different container CLI (e.g. `podman`)
    pub fn with_docker_binary(mut self, docker: impl Into<String>) -> Self {
        self.docker = docker.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn container_name(&self) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("foundry-{}-{}", self.name, &id[..12])
    }

    /// Arguments for `docker run`
    ///
    /// The workspace is made absolute first; docker reads a relative mount
    /// source as a volume name.
    fn run_args(
        &self,
        container: &str,
        request: &SandboxRequest,
    ) -> Result<Vec<String>, SandboxError> {
        let workspace = std::path::absolute(&request.workspace_dir).map_err(|e| {
            SandboxError::Internal(format!(
                "Invalid workspace directory '{}': {}",
                request.workspace_dir.display(),
                e
            ))
        })?;
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            container.to_string(),
            "-v".to_string(),
            format!("{}:{}", workspace.display(), self.config.workdir),
            "-w".to_string(),
            self.config.workdir.clone(),
            "-e".to_string(),
            format!("FOUNDRY_TARGET_FILE={}", request.target_file),
        ];

        if !self.config.network {
            args.push("--network".to_string());
            args.push("none".to_string());
        }

        let mut env: Vec<_> = self.config.env.iter().collect();
        env.sort();
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.push(self.config.image.clone());
        args.push("sh".to_string());
        args.push("-c".to_string());
        args.push(build_entrypoint(&self.config.setup, &request.command));
        Ok(args)
    }

    fn capture<R>(reader: R, stream: &'static str, container: String, stream_logs: bool) -> JoinHandle<String>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            let mut output = String::new();
            // Drain to EOF; undecodable bytes are replaced, never fatal.
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let decoded = String::from_utf8_lossy(&buf);
                        let line = decoded.strip_suffix('\n').unwrap_or(&decoded);
                        let line = line.strip_suffix('\r').unwrap_or(line);
                        if stream_logs {
                            info!(target: "foundry::sandbox", container = %container, stream, "{}", line);
                        }
                        output.push_str(line);
                        output.push('\n');
                    }
                    Err(e) => {
                        warn!(container = %container, stream, "Failed to read sandbox output: {}", e);
                        break;
                    }
                }
            }
            output
        })
    }
}

#[async_trait]
impl SandboxRunner for DockerSandboxRunner {
    async fn run(&self, request: SandboxRequest) -> Result<SandboxResult, SandboxError> {
        let container = self.container_name();
        let args = self.run_args(&container, &request)?;

        info!(
            sandbox = %self.name,
            container = %container,
            target = %request.target_file,
            "Starting sandbox container"
        );

        let mut child = Command::new(&self.docker)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::SpawnFailed(format!("{}: {}", self.docker, e)))?;

        let guard = ContainerGuard::new(&self.docker, &container);

        let stdout_task = child
            .stdout
            .take()
            .map(|out| Self::capture(out, "stdout", container.clone(), request.stream_logs));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| Self::capture(err, "stderr", container.clone(), request.stream_logs));

        enum Ended {
            Exited(i32),
            TimedOut,
            Cancelled,
            Failed(String),
        }

        let ended = tokio::select! {
            _ = request.cancel.cancelled() => Ended::Cancelled,
            waited = timeout(request.timeout, child.wait()) => match waited {
                Ok(Ok(status)) => Ended::Exited(exit_code_of(status)),
                Ok(Err(e)) => Ended::Failed(format!("Process wait failed: {}", e)),
                Err(_) => Ended::TimedOut,
            },
        };

        if !matches!(ended, Ended::Exited(_)) {
            let _ = child.kill().await;
        }
        guard.release().await;

        let stdout = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        let mut stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        match ended {
            Ended::Exited(exit_code) => {
                info!(container = %container, exit_code, "Sandbox container finished");
                Ok(SandboxResult::new(exit_code, stdout, stderr))
            }
            Ended::TimedOut => {
                warn!(container = %container, timeout = ?request.timeout, "Sandbox run timed out");
                stderr.push_str(&format!(
                    "Sandbox run timed out after {}s\n",
                    request.timeout.as_secs()
                ));
                Ok(SandboxResult::new(TIMEOUT_EXIT_CODE, stdout, stderr))
            }
            Ended::Cancelled => {
                info!(container = %container, "Sandbox run cancelled; container removed");
                Err(SandboxError::Cancelled)
            }
            Ended::Failed(message) => Err(SandboxError::Internal(message)),
        }
    }
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Resolves sandbox names against configured [`SandboxConfig`]s
#[derive(Debug, Clone, Default)]
pub struct DockerSandboxProvider {
    sandboxes: HashMap<String, SandboxConfig>,
    docker: Option<String>,
}

impl DockerSandboxProvider {
    pub fn new(sandboxes: HashMap<String, SandboxConfig>) -> Self {
        Self {
            sandboxes,
            docker: None,
        }
    }

    pub fn with_docker_binary(mut self, docker: impl Into<String>) -> Self {
        self.docker = Some(docker.into());
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.sandboxes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl SandboxProvider for DockerSandboxProvider {
    fn runner(&self, name: &str) -> FoundryResult<Arc<dyn SandboxRunner>> {
        let config = self.sandboxes.get(name).ok_or_else(|| {
            FoundryError::config_with_context(
                format!("Unknown sandbox '{}'", name),
                format!("Configured sandboxes: {}", self.names().join(", ")),
            )
        })?;

        let mut runner = DockerSandboxRunner::new(name, config.clone());
        if let Some(docker) = &self.docker {
            runner = runner.with_docker_binary(docker.clone());
        }
        Ok(Arc::new(runner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn request() -> SandboxRequest {
        SandboxRequest {
            target_file: "test_app.py".to_string(),
            workspace_dir: PathBuf::from("/tmp/work"),
            command: vec!["python -m pytest -v test_app.py".to_string()],
            timeout: Duration::from_secs(5),
            stream_logs: false,
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn test_entrypoint_without_setup_has_no_markers() {
        let script = build_entrypoint(&[], &["pytest -v x.py".to_string()]);
        assert_eq!(script, "pytest -v x.py");
    }

    #[test]
    fn test_entrypoint_wraps_setup_in_markers() {
        let script = build_entrypoint(
            &["pip install -e .".to_string()],
            &["pytest -v x.py".to_string()],
        );
        assert!(script.starts_with("echo '::setup:start::'\n"));
        assert!(script.contains("pip install -e .\n"));
        assert!(script.contains("echo \"::setup:end:${foundry_setup_code}::\""));
        assert!(script.ends_with("pytest -v x.py"));
    }

    #[test]
    fn test_run_args() {
        let runner = DockerSandboxRunner::new(
            "python",
            SandboxConfig::new("python:3.12").with_env("A", "1"),
        );
        let args = runner.run_args("foundry-python-abc", &request()).unwrap();
        assert_eq!(args[0], "run");
        assert!(args.contains(&"/tmp/work:/workspace".to_string()));
        assert!(args.contains(&"none".to_string()));
        assert!(args.contains(&"A=1".to_string()));
        assert!(args.contains(&"FOUNDRY_TARGET_FILE=test_app.py".to_string()));
        assert_eq!(args.last().unwrap(), "python -m pytest -v test_app.py");
    }

    #[test]
    fn test_run_args_mount_relative_workspace_as_absolute_path() {
        let runner = DockerSandboxRunner::new("python", SandboxConfig::new("python:3.12"));
        let mut request = request();
        request.workspace_dir = PathBuf::from(".");

        let args = runner.run_args("foundry-python-abc", &request).unwrap();
        let mount = &args[args.iter().position(|arg| arg == "-v").unwrap() + 1];
        let expected = std::env::current_dir().unwrap();
        let (source, target) = mount.rsplit_once(':').unwrap();
        assert!(Path::new(source).is_absolute());
        assert_eq!(
            Path::new(source).components().collect::<Vec<_>>(),
            expected.components().collect::<Vec<_>>()
        );
        assert_eq!(target, "/workspace");
    }

    #[test]
    fn test_provider_unknown_sandbox_is_config_error() {
        let provider = DockerSandboxProvider::new(HashMap::new());
        let err = provider.runner("missing").err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_provider_resolves_known_sandbox() {
        let mut sandboxes = HashMap::new();
        sandboxes.insert("python".to_string(), SandboxConfig::new("python:3.12"));
        let provider = DockerSandboxProvider::new(sandboxes);
        assert!(provider.runner("python").is_ok());
        assert_eq!(provider.names(), vec!["python"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let runner = DockerSandboxRunner::new("python", SandboxConfig::new("python:3.12"))
            .with_docker_binary("/nonexistent/foundry-docker");
        let err = runner.run(request()).await.unwrap_err();
        assert!(matches!(err, SandboxError::SpawnFailed(_)));
    }
}
