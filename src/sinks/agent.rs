//! # Agent-backed sink.
//!
//! [`AgentSink`] shells out to the CI agent once per annotation:
//!
//! ```text
//! buildkite-agent annotate --context <ctx> --style <style> [--append] <body>
//! ```
//!
//! Bodies too large for a single argument are piped through stdin instead,
//! which the agent accepts when no body argument is given.
//!
//! With `quiet` set, the command's output is captured and only surfaces
//! inside [`AnnotateError::Exit`] when the command fails.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::DEFAULT_AGENT;
use crate::error::AnnotateError;
use crate::sinks::{Annotation, Sink};

/// Largest body passed as a command-line argument.
const MAX_ARG_BODY: usize = 64 * 1024;

/// Runs `<program> annotate ...` for every annotation.
#[derive(Clone, Debug)]
pub struct AgentSink {
    program: PathBuf,
}

impl Default for AgentSink {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT)
    }
}

impl AgentSink {
    /// Creates a sink invoking the given agent program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, annotation: &Annotation, body_as_arg: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("annotate")
            .arg("--context")
            .arg(&*annotation.context)
            .arg("--style")
            .arg(annotation.style.as_str());
        if annotation.append {
            cmd.arg("--append");
        }
        if body_as_arg {
            cmd.arg(&annotation.body);
            cmd.stdin(Stdio::null());
        } else {
            cmd.stdin(Stdio::piped());
        }
        if annotation.quiet {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        cmd.kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> AnnotateError {
        AnnotateError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl Sink for AgentSink {
    async fn annotate(&self, annotation: &Annotation) -> Result<(), AnnotateError> {
        let body_as_arg = annotation.body.len() <= MAX_ARG_BODY;
        let mut child = self
            .command(annotation, body_as_arg)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if !body_as_arg {
            if let Some(mut stdin) = child.stdin.take() {
                // An agent that exits without reading is judged by its status.
                if let Err(e) = stdin.write_all(annotation.body.as_bytes()).await {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(self.spawn_error(e));
                    }
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if output.status.success() {
            return Ok(());
        }
        Err(AnnotateError::Exit {
            program: self.program.clone(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn name(&self) -> &str {
        "agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::AnnotationStyle;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn builds_annotate_invocation() {
        let sink = AgentSink::default();
        let a = Annotation::failure("test-failures", "<p>x</p>");
        let cmd = sink.command(&a, true);

        assert_eq!(cmd.as_std().get_program(), "buildkite-agent");
        assert_eq!(
            args(&cmd),
            [
                "annotate",
                "--context",
                "test-failures",
                "--style",
                "error",
                "--append",
                "<p>x</p>"
            ]
        );
    }

    #[test]
    fn replace_mode_and_stdin_body() {
        let sink = AgentSink::new("/opt/agent");
        let a = Annotation {
            style: AnnotationStyle::Warning,
            append: false,
            ..Annotation::failure("ctx", "body")
        };
        assert_eq!(
            args(&sink.command(&a, false)),
            ["annotate", "--context", "ctx", "--style", "warning"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_command_is_ok() {
        let sink = AgentSink::new("true");
        assert!(sink.annotate(&Annotation::failure("c", "b")).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_reports_exit() {
        let sink = AgentSink::new("false");
        let err = sink.annotate(&Annotation::failure("c", "b")).await.unwrap_err();
        assert!(matches!(err, AnnotateError::Exit { code: Some(1), .. }));
        assert_eq!(err.as_label(), "annotate_exit");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn large_body_goes_through_stdin() {
        let sink = AgentSink::new("true");
        let body = "x".repeat(MAX_ARG_BODY + 1);
        assert!(sink.annotate(&Annotation::failure("c", body)).await.is_ok());
    }

    #[tokio::test]
    async fn missing_program_reports_spawn() {
        let sink = AgentSink::new("/nonexistent/ci-annotator-agent");
        let err = sink.annotate(&Annotation::failure("c", "b")).await.unwrap_err();
        assert!(matches!(err, AnnotateError::Spawn { .. }));
    }
}
