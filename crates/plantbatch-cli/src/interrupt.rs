//! Container teardown on SIGINT and SIGTERM.
//!
//! A signal ends the process without unwinding, so a [`ContainerGuard`]
//! held by the main thread is never dropped. [`Interrupts`] keeps a handle
//! to the running container where a signal listener thread can stop it
//! before the process exits.

use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::{info, warn};

use plantbatch::container::{ContainerGuard, ContainerHandle};

/// Container teardown shared between the main thread and the signal listener.
#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    active: Arc<Mutex<Option<ContainerHandle>>>,
}

impl Interrupts {
    /// Listen for SIGINT and SIGTERM on a background thread.
    ///
    /// On a signal the listener stops the watched container, if any, and
    /// exits with status `128 + signal` (130 for Ctrl-C).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the signal handlers or the listener thread
    /// cannot be set up.
    pub fn install() -> io::Result<Self> {
        let interrupts = Self::default();
        listen(interrupts.clone())?;
        Ok(interrupts)
    }

    /// Stop `container` if a signal arrives before [`Interrupts::release`].
    pub fn watch(&self, container: &ContainerGuard) {
        *self.lock() = Some(container.handle().clone());
    }

    /// Stop watching `container` and drop it.
    ///
    /// The container is stopped while the slot is locked, so a signal that
    /// arrives meanwhile waits for the teardown instead of racing it.
    pub fn release(&self, container: ContainerGuard) {
        let mut active = self.lock();
        *active = None;
        drop(container);
    }

    /// Stop the watched container, if any. Returns whether one was stopped.
    pub fn stop_active(&self) -> bool {
        stop(&mut self.lock())
    }

    /// Stop the watched container and exit without releasing the slot.
    #[cfg_attr(not(unix), allow(dead_code))]
    fn stop_and_exit(&self, code: i32) -> ! {
        let mut active = self.lock();
        stop(&mut active);
        std::process::exit(code)
    }

    fn lock(&self) -> MutexGuard<'_, Option<ContainerHandle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn stop(active: &mut Option<ContainerHandle>) -> bool {
    let Some(handle) = active.take() else {
        return false;
    };
    info!(id = handle.id(); "Stopping rendering server container after interrupt");
    if let Err(err) = handle.stop() {
        warn!(error:% = err; "Failed to stop container");
    }
    true
}

#[cfg(unix)]
fn listen(interrupts: Interrupts) -> io::Result<()> {
    use std::thread;

    use signal_hook::{
        consts::{SIGINT, SIGTERM},
        iterator::Signals,
    };

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::Builder::new()
        .name("plantbatch-signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                warn!(signal; "Interrupted");
                interrupts.stop_and_exit(128 + signal);
            }
        })?;
    Ok(())
}

#[cfg(not(unix))]
fn listen(_interrupts: Interrupts) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_stop_without_container() {
        assert!(!Interrupts::default().stop_active());
    }

    #[cfg(unix)]
    mod with_container {
        use std::{fs, os::unix::fs::PermissionsExt, path::PathBuf};

        use plantbatch::config::ContainerConfig;
        use tempfile::{TempDir, tempdir};

        use super::*;

        /// Stand-in container tool that logs its arguments and reports `cid42`.
        fn fake_tool(dir: &TempDir) -> (String, PathBuf) {
            let log = dir.path().join("calls.log");
            let tool = dir.path().join("fake-docker");
            fs::write(
                &tool,
                format!(
                    "#!/bin/sh\necho \"$@\" >> '{}'\n[ \"$1\" = run ] && echo cid42\nexit 0\n",
                    log.display()
                ),
            )
            .unwrap();
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
            (tool.to_string_lossy().to_string(), log)
        }

        #[test]
        fn test_watched_container_is_stopped_once() {
            let dir = tempdir().unwrap();
            let (tool, log) = fake_tool(&dir);
            let guard = ContainerGuard::start(&ContainerConfig::new(tool, "img", 18081, 8080))
                .unwrap();

            let interrupts = Interrupts::default();
            interrupts.watch(&guard);

            assert!(interrupts.stop_active());
            assert!(!interrupts.stop_active());

            // The process would exit here; skip the guard's own teardown.
            std::mem::forget(guard);
            assert_eq!(
                fs::read_to_string(&log).unwrap(),
                "run -d --rm -p 18081:8080 img\nstop cid42\n"
            );
        }

        #[test]
        fn test_released_container_is_not_watched() {
            let dir = tempdir().unwrap();
            let (tool, log) = fake_tool(&dir);
            let guard = ContainerGuard::start(&ContainerConfig::new(tool, "img", 18082, 8080))
                .unwrap();

            let interrupts = Interrupts::default();
            interrupts.watch(&guard);
            interrupts.release(guard);

            assert!(!interrupts.stop_active());
            assert_eq!(
                fs::read_to_string(&log).unwrap(),
                "run -d --rm -p 18082:8080 img\nstop cid42\n"
            );
        }
    }
}
