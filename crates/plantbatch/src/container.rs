//! Disposable local rendering server.
//!
//! [`ContainerGuard::launch`] starts a PlantUML server image with the
//! configured container tool, waits until it answers render requests and
//! hands out its base URL. The container is stopped when the guard is
//! dropped, on every exit path that unwinds normally. Paths that do not
//! unwind, such as a process killed by a signal, need a [`ContainerHandle`]
//! stopped by whoever handles the signal.
//!
//! # Example
//!
//! ```rust,no_run
//! use plantbatch::{config::AppConfig, container::ContainerGuard};
//!
//! let config = AppConfig::default();
//! let guard = ContainerGuard::launch(config.container(), config.probe())
//!     .expect("Failed to start rendering server");
//!
//! println!("Rendering with {}", guard.endpoint());
//! // The container is stopped here.
//! drop(guard);
//! ```

use std::{
    env,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use thiserror::Error;
use ureq::Agent;

use plantbatch_core::encoding;

use crate::{
    PlantbatchError,
    config::{ContainerConfig, ProbeConfig},
    transport::png_url,
};

/// Minimal diagram used to check that a server is accepting requests.
const PROBE_DIAGRAM: &str = "@startuml\n@enduml\n";

/// Failure to bring up a local rendering server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to launch `{image}` with {tool}: {message}")]
    Launch {
        tool: String,
        image: String,
        message: String,
    },

    #[error(
        "timed out after {}s waiting for rendering server at {endpoint}",
        timeout.as_secs_f32()
    )]
    Timeout { endpoint: String, timeout: Duration },
}

/// Failure to stop a container. Only ever logged.
#[derive(Debug, Error)]
pub enum TeardownError {
    #[error("failed to run `{tool} stop`: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool} stop {id}` exited with {status}")]
    Status {
        tool: String,
        id: String,
        status: std::process::ExitStatus,
    },
}

/// Identity of a started container, enough to stop it.
///
/// A handle can be cloned and stopped from another thread, for example by a
/// signal handler, while the owning [`ContainerGuard`] is still alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    tool: PathBuf,
    id: String,
}

impl ContainerHandle {
    /// Returns the container identifier reported by the container tool.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run `{tool} stop {id}` and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`TeardownError`] if the tool cannot be run or exits with a
    /// failure status.
    pub fn stop(&self) -> Result<(), TeardownError> {
        let tool = self.tool.display().to_string();
        let status = Command::new(&self.tool)
            .args(["stop", self.id.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| TeardownError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(TeardownError::Status {
                tool,
                id: self.id.clone(),
                status,
            })
        }
    }
}

/// A running rendering server container.
///
/// Dropping the guard stops the container. Teardown failures are logged and
/// never reported to the caller.
#[derive(Debug)]
pub struct ContainerGuard {
    handle: ContainerHandle,
    endpoint: String,
}

impl ContainerGuard {
    /// Launch a rendering server and wait until it is ready.
    ///
    /// Equivalent to [`ContainerGuard::start`] followed by
    /// [`ContainerGuard::wait_ready`].
    ///
    /// # Arguments
    ///
    /// * `container` - Container tool, image and ports
    /// * `probe` - Readiness polling settings
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`PlantbatchError::ToolNotFound`] if the container tool is not on
    ///   `PATH`; nothing is launched in that case
    /// - [`PlantbatchError::Startup`] if the container cannot be started or
    ///   does not become ready in time; a started container is stopped first
    pub fn launch(
        container: &ContainerConfig,
        probe: &ProbeConfig,
    ) -> Result<Self, PlantbatchError> {
        let guard = Self::start(container)?;
        guard.wait_ready(probe)?;
        Ok(guard)
    }

    /// Start the container without waiting for the server inside it.
    ///
    /// # Errors
    ///
    /// Returns [`PlantbatchError::ToolNotFound`] if the container tool is not
    /// on `PATH`, or [`PlantbatchError::Startup`] if `{tool} run` fails or
    /// reports no container id.
    pub fn start(container: &ContainerConfig) -> Result<Self, PlantbatchError> {
        let tool = env::var_os("PATH")
            .and_then(|path| find_in_path(container.tool(), &path))
            .ok_or_else(|| PlantbatchError::ToolNotFound {
                tool: container.tool().to_string(),
            })?;

        info!(
            image = container.image(),
            port = container.host_port();
            "Starting rendering server container"
        );

        let id = run_detached(&tool, container)?;
        debug!(id; "Container started");

        Ok(Self {
            handle: ContainerHandle { tool, id },
            endpoint: container.endpoint(),
        })
    }

    /// Block until the server in this container answers render requests.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Timeout`] if the server is not ready within
    /// the probe timeout. The container keeps running until the guard is
    /// dropped.
    pub fn wait_ready(&self, probe: &ProbeConfig) -> Result<(), StartupError> {
        wait_until_ready(&self.endpoint, probe)
    }

    /// Returns the base URL of the running server.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the container identifier reported by the container tool.
    pub fn id(&self) -> &str {
        self.handle.id()
    }

    /// Returns a handle that can stop this container from elsewhere.
    pub fn handle(&self) -> &ContainerHandle {
        &self.handle
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        info!(id = self.handle.id(); "Stopping rendering server container");
        if let Err(err) = self.handle.stop() {
            warn!(error:% = err; "Failed to stop container");
        }
    }
}

/// Poll `endpoint` until it answers a minimal render request.
///
/// An HTTP `200` or `400` response means the server is up; `400` is the
/// server rejecting the empty probe diagram, which still proves it is alive.
/// Connection failures and other statuses keep the loop polling.
///
/// # Errors
///
/// Returns [`StartupError::Timeout`] if the server is not ready within the
/// probe timeout.
pub fn wait_until_ready(endpoint: &str, probe: &ProbeConfig) -> Result<(), StartupError> {
    let url = png_url(endpoint, &encoding::encode(PROBE_DIAGRAM));
    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(probe.request_timeout()))
        .http_status_as_error(false)
        .build()
        .into();

    let started = Instant::now();
    while started.elapsed() < probe.timeout() {
        match agent.get(url.as_str()).call() {
            Ok(response) => {
                let status = response.status().as_u16();
                if matches!(status, 200 | 400) {
                    info!(endpoint, status; "Rendering server is up");
                    return Ok(());
                }
                debug!(status; "Rendering server not ready");
            }
            Err(err) => debug!(error:% = err; "Rendering server not reachable yet"),
        }
        thread::sleep(probe.interval());
    }

    Err(StartupError::Timeout {
        endpoint: endpoint.to_string(),
        timeout: probe.timeout(),
    })
}

/// Resolve `binary` against the directories of a `PATH`-style string.
///
/// Absolute and relative paths containing a separator are checked directly.
pub fn find_in_path(binary: &str, path_var: impl AsRef<std::ffi::OsStr>) -> Option<PathBuf> {
    if binary.is_empty() {
        return None;
    }

    let path = Path::new(binary);
    if path.components().count() > 1 || path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }

    env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(binary);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

fn run_detached(tool: &Path, container: &ContainerConfig) -> Result<String, StartupError> {
    let launch_error = |message: String| StartupError::Launch {
        tool: tool.display().to_string(),
        image: container.image().to_string(),
        message,
    };

    let publish = format!("{}:{}", container.host_port(), container.container_port());
    let output = Command::new(tool)
        .args(["run", "-d", "--rm", "-p", publish.as_str(), container.image()])
        .stdin(Stdio::null())
        .output()
        .map_err(|err| launch_error(err.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(launch_error(format!("{} ({})", output.status, stderr.trim())));
    }

    let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if id.is_empty() {
        return Err(launch_error("no container id was reported".to_string()));
    }

    Ok(id)
}
