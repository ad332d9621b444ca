//! TensorBoard launch instructions
//!
//! The dashboard is an external process. In a terminal we only print the
//! command; in a notebook host we start it and embed it inline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Where the recorder is running, chosen by the caller
///
/// Serialized as a plain string (`"terminal"` / `"notebook"`) so it reads the
/// same from RON files and environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum HostContext {
    /// Plain process; print the command for the operator
    #[default]
    Terminal,
    /// Jupyter kernel speaking the evcxr rich-output protocol
    Notebook,
}

impl HostContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terminal => "terminal",
            Self::Notebook => "notebook",
        }
    }
}

impl From<HostContext> for String {
    fn from(host: HostContext) -> Self {
        host.as_str().to_string()
    }
}

impl TryFrom<String> for HostContext {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "terminal" => Ok(Self::Terminal),
            "notebook" => Ok(Self::Notebook),
            other => Err(format!(
                "unknown host context `{other}`, expected `terminal` or `notebook`"
            )),
        }
    }
}

/// `tensorboard --logdir {logdir} --port={port} --bind_all`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardCommand {
    pub logdir: PathBuf,
    pub port: u16,
    pub bind_all: bool,
}

impl DashboardCommand {
    pub const PROGRAM: &'static str = "tensorboard";

    pub fn new(logdir: &Path, port: u16) -> Self {
        Self {
            logdir: logdir.to_path_buf(),
            port,
            bind_all: true,
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--logdir".to_string(),
            self.logdir.display().to_string(),
            format!("--port={}", self.port),
        ];
        if self.bind_all {
            args.push("--bind_all".to_string());
        }
        args
    }

    /// Operator-facing instructions
    pub fn instructions(&self) -> String {
        format!("Run command below:\n{self}")
    }

    /// Start the dashboard in the background
    pub fn spawn(&self) -> Result<Child> {
        Command::new(Self::PROGRAM)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch `{self}`"))
    }

    /// Inline iframe pointing at the dashboard, in evcxr's content framing
    pub fn notebook_embed(&self) -> String {
        format!(
            "EVCXR_BEGIN_CONTENT text/html\n\
             <iframe src=\"http://localhost:{}/\" width=\"100%\" height=\"800\" frameborder=\"0\"></iframe>\n\
             EVCXR_END_CONTENT",
            self.port
        )
    }
}

impl fmt::Display for DashboardCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::PROGRAM)?;
        for arg in self.args() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Dashboard server started from a notebook host
///
/// Holds the child handle so repeated [`display`] calls reuse a running
/// server instead of starting another one on the same port.
#[derive(Debug, Default)]
pub struct DashboardProcess {
    child: Option<Child>,
}

impl DashboardProcess {
    /// Process id of the running server, if any
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Whether the server started earlier is still alive; reaps it if not
    pub fn is_running(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        let status = child.try_wait();
        match status {
            Ok(None) => true,
            Ok(Some(status)) => {
                log::debug!("dashboard (pid {}) exited with {status}", child.id());
                self.child = None;
                false
            }
            Err(e) => {
                log::warn!("Failed to poll dashboard (pid {}): {e}", child.id());
                self.child = None;
                false
            }
        }
    }

    /// Start the server with `launch` unless one is already running
    ///
    /// Returns whether a new process was started.
    pub fn ensure_running<F>(&mut self, launch: F) -> Result<bool>
    where
        F: FnOnce() -> Result<Child>,
    {
        if self.is_running() {
            return Ok(false);
        }
        let child = launch()?;
        log::info!("started dashboard (pid {})", child.id());
        self.child = Some(child);
        Ok(true)
    }
}

/// Show the dashboard for `logdir`, or tell the operator how to start it
pub fn display(command: &DashboardCommand, host: HostContext, process: &mut DashboardProcess) {
    match host {
        HostContext::Terminal => println!("{}", command.instructions()),
        HostContext::Notebook => match process.ensure_running(|| command.spawn()) {
            Ok(started) => {
                if !started {
                    log::debug!("dashboard already running on port {}", command.port);
                }
                println!("{}", command.notebook_embed());
            }
            Err(e) => {
                log::warn!("{e:#}");
                println!("{}", command.instructions());
            }
        },
    }
}
