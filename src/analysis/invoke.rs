//! Runs an external analyzer process for one file.

use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

use crate::registry::AnalyzerConfig;

/// Errors from running an analyzer process.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("analyzer for .{extension} has an empty command")]
    EmptyCommand { extension: String },
    #[error("failed to start analyzer `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("analyzer `{command}` exited with {}: {}", describe_status(.status), .stderr.trim())]
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("analyzer `{command}` wrote output that is not valid UTF-8")]
    InvalidOutput { command: String },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Something that can produce analyzer output for a file.
///
/// `ProcessInvoker` is the production implementation; tests substitute
/// canned output.
pub trait Invoker: Send + Sync {
    fn invoke(
        &self,
        config: &AnalyzerConfig,
        declarations: &Path,
        target: &Path,
    ) -> Result<String, InvokeError>;
}

/// Runs the configured command as a child process and waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessInvoker;

impl Invoker for ProcessInvoker {
    fn invoke(
        &self,
        config: &AnalyzerConfig,
        declarations: &Path,
        target: &Path,
    ) -> Result<String, InvokeError> {
        invoke(config, declarations, target)
    }
}

/// Run the analyzer for `target` and return its standard output.
///
/// The command line is split on whitespace and followed by the
/// declarations path and the target path. The process runs inside the
/// analyzer's directory. Any non-zero exit fails the call; its output is
/// discarded.
pub fn invoke(
    config: &AnalyzerConfig,
    declarations: &Path,
    target: &Path,
) -> Result<String, InvokeError> {
    let mut tokens = config.command_tokens();
    let program = tokens.next().ok_or_else(|| InvokeError::EmptyCommand {
        extension: config.extension.clone(),
    })?;

    debug!(
        command = %config.command,
        target = %target.display(),
        cwd = %config.working_directory.display(),
        "running analyzer"
    );

    let output = Command::new(program)
        .args(tokens)
        .arg(declarations)
        .arg(target)
        .current_dir(&config.working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| InvokeError::Spawn {
            command: config.command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(InvokeError::Failed {
            command: config.command.clone(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| InvokeError::InvalidOutput {
        command: config.command.clone(),
    })
}
