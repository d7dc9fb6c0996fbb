//! # Failed-test record.
//!
//! Mirrors what a test runner knows at failure time: a short description,
//! the (possibly ANSI-colored) failure output, a command that re-runs just
//! this test, and the test's fully qualified name.
//!
//! ## Example
//! ```rust
//! use ci_annotator::FailureEvent;
//!
//! let ev = FailureEvent::new("parser rejects empty input")
//!     .with_message_line("\u{1b}[31mexpected Err, got Ok(())\u{1b}[0m")
//!     .with_rerun_command("cargo test parser::rejects_empty")
//!     .with_full_description("parser::tests::rejects_empty_input");
//!
//! assert_eq!(ev.description(), "parser rejects empty input");
//! assert_eq!(ev.colorized_message_lines().len(), 1);
//! ```

/// One failed test, as reported by the host.
///
/// Immutable once built; the builder methods consume `self`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureEvent {
    description: String,
    colorized_message_lines: Vec<String>,
    rerun_command: String,
    full_description: String,
}

impl FailureEvent {
    /// Creates a failure with the given human description and no other details.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Appends one line of failure output (may contain ANSI escapes).
    #[inline]
    pub fn with_message_line(mut self, line: impl Into<String>) -> Self {
        self.colorized_message_lines.push(line.into());
        self
    }

    /// Replaces the failure output with the given lines.
    #[inline]
    pub fn with_message_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colorized_message_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the command that re-runs only this test.
    #[inline]
    pub fn with_rerun_command(mut self, cmd: impl Into<String>) -> Self {
        self.rerun_command = cmd.into();
        self
    }

    /// Sets the fully qualified test name.
    #[inline]
    pub fn with_full_description(mut self, full: impl Into<String>) -> Self {
        self.full_description = full.into();
        self
    }

    /// Short human description (rendered as the annotation summary).
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Failure output, one entry per line, in report order.
    pub fn colorized_message_lines(&self) -> &[String] {
        &self.colorized_message_lines
    }

    /// Command that re-runs this test.
    pub fn rerun_command(&self) -> &str {
        &self.rerun_command
    }

    /// Fully qualified test name.
    pub fn full_description(&self) -> &str {
        &self.full_description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_message_lines_replaces_previous_lines() {
        let ev = FailureEvent::new("x")
            .with_message_line("first")
            .with_message_lines(["a", "b"]);
        assert_eq!(ev.colorized_message_lines(), ["a", "b"]);
    }

    #[test]
    fn new_leaves_details_empty() {
        let ev = FailureEvent::new("only a description");
        assert!(ev.colorized_message_lines().is_empty());
        assert_eq!(ev.rerun_command(), "");
        assert_eq!(ev.full_description(), "");
    }
}
