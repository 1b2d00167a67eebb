//! Emulator process state machine

use super::window::{WindowHandle, WindowProbe};
use super::{LaunchCommand, LaunchError, LaunchReport, LaunchStatus, SupervisorSettings};
use chrono::{DateTime, Local};
use statum::{machine, state};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[state]
#[derive(Debug, Clone)]
pub enum LaunchState {
    Launching,        // command built, nothing started
    WaitingForWindow, // process alive, window not seen yet
    Styled,           // window found (or given up on) and styled
    Running,          // supervised until exit
    Exited,           // exit code collected
}

#[machine]
pub struct EmulatorProcess<S: LaunchState> {
    command: LaunchCommand,
    settings: SupervisorSettings,
    status: watch::Sender<LaunchStatus>,
    child: Option<Child>,
    pid: u32,
    started_at: DateTime<Local>,
    finished_at: Option<DateTime<Local>>,
    window: Option<WindowHandle>,
    exit_code: Option<i32>,
    cancelled: bool,
}

impl<S: LaunchState> EmulatorProcess<S> {
    pub fn command(&self) -> &LaunchCommand {
        &self.command
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn window(&self) -> Option<WindowHandle> {
        self.window
    }

    fn publish(&self, status: LaunchStatus) {
        debug!("Launch status: {:?}", status);
        self.status.send_replace(status);
    }
}

impl EmulatorProcess<Launching> {
    /// Prepares a launch and returns the status channel to observe it
    pub fn create(
        command: LaunchCommand,
        settings: SupervisorSettings,
    ) -> (Self, watch::Receiver<LaunchStatus>) {
        let (status, receiver) = watch::channel(LaunchStatus::Launching);
        let process = Self::new(
            command,
            settings,
            status,
            None,         // child
            0,            // pid
            Local::now(), // started_at
            None,         // finished_at
            None,         // window
            None,         // exit_code
            false,        // cancelled
        );
        (process, receiver)
    }

    pub fn spawn(mut self) -> Result<EmulatorProcess<WaitingForWindow>, LaunchError> {
        info!("Starting {}", self.command);

        let mut command = Command::new(&self.command.program);
        command.args(&self.command.args).kill_on_drop(true);
        if let Some(dir) = &self.command.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: self.command.program.display().to_string(),
            source,
        })?;

        self.pid = child.id().unwrap_or_default();
        self.child = Some(child);
        self.started_at = Local::now();
        info!("Emulator running with pid {}", self.pid);

        self.publish(LaunchStatus::WaitingForWindow { pid: self.pid });
        Ok(self.transition())
    }

    /// Walks the whole lifecycle and returns once the emulator has exited
    pub async fn run_to_exit(
        self,
        probe: &dyn WindowProbe,
        cancel: CancellationToken,
    ) -> Result<LaunchReport, LaunchError> {
        let waiting = self.spawn()?;
        let styled = waiting.wait_for_window(probe, &cancel).await;
        let exited = styled.run().supervise(cancel).await?;
        Ok(exited.report())
    }
}

impl EmulatorProcess<WaitingForWindow> {
    fn has_exited(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => true,
        }
    }

    /// Polls the probe until the window shows up, the process dies, the
    /// timeout passes or the launch is cancelled. Never fails: a missing
    /// window only costs the styling.
    pub async fn wait_for_window(
        mut self,
        probe: &dyn WindowProbe,
        cancel: &CancellationToken,
    ) -> EmulatorProcess<Styled> {
        let deadline = Instant::now() + self.settings.window_timeout();

        loop {
            if let Some(window) = probe.find_window(self.pid) {
                debug!("Found window {:?} for pid {}", window, self.pid);
                self.window = Some(window);
                break;
            }
            if self.has_exited() {
                warn!("Process {} exited before showing a window", self.pid);
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    "No window for pid {} after {}ms, supervising without styling",
                    self.pid, self.settings.window_timeout_ms
                );
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.poll_interval()) => {}
            }
        }

        if let Some(window) = self.window {
            if let Err(e) = probe.apply_style(window, self.settings.borderless) {
                warn!("Failed to style window {:?}: {}", window, e);
            }
        }

        self.publish(LaunchStatus::Styled {
            pid: self.pid,
            window: self.window,
        });
        self.transition()
    }
}

impl EmulatorProcess<Styled> {
    pub fn run(self) -> EmulatorProcess<Running> {
        info!("Supervising {} (pid {})", self.command.program.display(), self.pid);
        self.publish(LaunchStatus::Running { pid: self.pid });
        self.transition()
    }
}

enum Outcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
}

impl EmulatorProcess<Running> {
    /// Waits for the process to exit, killing it when `cancel` fires
    pub async fn supervise(
        mut self,
        cancel: CancellationToken,
    ) -> Result<EmulatorProcess<Exited>, LaunchError> {
        if let Some(mut child) = self.child.take() {
            let outcome = tokio::select! {
                status = child.wait() => Outcome::Exited(status),
                _ = cancel.cancelled() => Outcome::Cancelled,
            };

            let status = match outcome {
                Outcome::Exited(status) => status.map_err(LaunchError::Wait)?,
                Outcome::Cancelled => {
                    info!("Launch cancelled, stopping pid {}", self.pid);
                    self.cancelled = true;
                    if let Err(e) = child.start_kill() {
                        warn!("Failed to kill pid {}: {}", self.pid, e);
                    }
                    child.wait().await.map_err(LaunchError::Wait)?
                }
            };
            self.exit_code = status.code();
        }

        self.finished_at = Some(Local::now());
        info!(
            "Emulator pid {} exited with {:?}{}",
            self.pid,
            self.exit_code,
            if self.cancelled { " (cancelled)" } else { "" }
        );
        self.publish(LaunchStatus::Exited {
            code: self.exit_code,
            cancelled: self.cancelled,
        });
        Ok(self.transition())
    }
}

impl EmulatorProcess<Exited> {
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn report(&self) -> LaunchReport {
        LaunchReport {
            program: self.command.program.display().to_string(),
            started_at: self.started_at,
            finished_at: self.finished_at.unwrap_or(self.started_at),
            exit_code: self.exit_code,
            cancelled: self.cancelled,
        }
    }
}
