//! # Failure → annotation markup.
//!
//! Produces one self-contained, collapsible fragment per failure. Fragments
//! are appended to the same annotation, so each ends with blank-line padding.
//!
//! ## Layout
//! ```text
//! <details>
//! <summary>{description}</summary>
//! <pre class="term">{colorized output}</pre>
//! <pre class="term"><span class="term-fg31">{rerun}</span> <span class="term-fg36"># {full name}</span></pre>
//! <p>in <a href="{build url}#{job id}">Job #{job id}</a></p>
//! </details>
//! ```

use std::fmt;

use crate::core::CiContext;
use crate::failures::FailureEvent;
use crate::render::ansi::recolorize_escaped;
use crate::render::escape::{escape_text, quote_attr};

/// Markup produced for one failure, ready to hand to a sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedAnnotation(String);

impl RenderedAnnotation {
    /// Borrows the markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the annotation, returning the markup.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RenderedAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders `event` as an annotation fragment linking back to the job in `ci`.
///
/// Missing CI values render as empty strings; this never fails.
///
/// # Example
/// ```
/// use ci_annotator::{CiContext, FailureEvent};
/// use ci_annotator::render::render_failure;
///
/// let ci = CiContext::new("https://ci.example/builds/42", "7");
/// let html = render_failure(&FailureEvent::new("adds numbers"), &ci);
/// assert!(html.as_str().contains(r#"<a href="https://ci.example/builds/42#7">Job #7</a>"#));
/// ```
pub fn render_failure(event: &FailureEvent, ci: &CiContext) -> RenderedAnnotation {
    let output = recolorize_escaped(&event.colorized_message_lines().join("\n"));

    let mut html = String::with_capacity(256 + output.len());
    html.push_str("<details>\n");

    html.push_str("<summary>");
    html.push_str(&escape_text(event.description()));
    html.push_str("</summary>\n");

    html.push_str("<pre class=\"term\">");
    html.push_str(&output);
    html.push_str("</pre>\n");

    html.push_str("<pre class=\"term\"><span class=\"term-fg31\">");
    html.push_str(&escape_text(event.rerun_command()));
    html.push_str("</span> <span class=\"term-fg36\"># ");
    html.push_str(&escape_text(event.full_description()));
    html.push_str("</span></pre>\n");

    html.push_str("<p>in <a href=");
    html.push_str(&quote_attr(&ci.job_url()));
    html.push_str(">Job #");
    html.push_str(&escape_text(ci.job_id()));
    html.push_str("</a></p>\n");

    html.push_str("</details>\n\n\n");
    RenderedAnnotation(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> FailureEvent {
        FailureEvent::new("Calculator adds numbers")
            .with_message_lines([
                "Failure/Error: expect(sum).to eq(4)",
                "  \u{1b}[31mexpected: 4\u{1b}[0m",
                "  \u{1b}[32m     got: 5\u{1b}[0m",
            ])
            .with_rerun_command("cargo test calculator::adds")
            .with_full_description("calculator::tests::adds_numbers")
    }

    #[test]
    fn renders_full_fragment_in_order() {
        let ci = CiContext::new("https://ci.example/builds/42", "7");
        let html = render_failure(&failure(), &ci);

        let expected = concat!(
            "<details>\n",
            "<summary>Calculator adds numbers</summary>\n",
            "<pre class=\"term\">Failure/Error: expect(sum).to eq(4)\n",
            "  <span class=\"term-fg31\">expected: 4</span>\n",
            "  <span class=\"term-fg32\">     got: 5</span></pre>\n",
            "<pre class=\"term\"><span class=\"term-fg31\">cargo test calculator::adds</span>",
            " <span class=\"term-fg36\"># calculator::tests::adds_numbers</span></pre>\n",
            "<p>in <a href=\"https://ci.example/builds/42#7\">Job #7</a></p>\n",
            "</details>\n\n\n",
        );
        assert_eq!(html.as_str(), expected);
    }

    #[test]
    fn link_target_joins_url_and_job() {
        let ci = CiContext::new("https://ci.example/builds/42", "7");
        let html = render_failure(&FailureEvent::new("x"), &ci);
        assert!(html.as_str().contains("href=\"https://ci.example/builds/42#7\""));
    }

    #[test]
    fn description_is_escaped() {
        let ev = FailureEvent::new("renders <script>alert(1)</script> & more");
        let html = render_failure(&ev, &CiContext::default()).into_string();
        assert!(html.contains(
            "<summary>renders &lt;script&gt;alert(1)&lt;/script&gt; &amp; more</summary>"
        ));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn output_text_is_escaped_around_spans() {
        let ev = FailureEvent::new("x").with_message_line("\u{1b}[31m<nil>\u{1b}[0m");
        let html = render_failure(&ev, &CiContext::default()).into_string();
        assert!(html.contains(
            "<pre class=\"term\"><span class=\"term-fg31\">&lt;nil&gt;</span></pre>"
        ));
    }

    #[test]
    fn terminal_control_sequences_do_not_leak_into_output() {
        let ev = FailureEvent::new("x")
            .with_message_line("\u{1b}[>4;2m\u{1b}[31mred\u{1b}(B\u{1b}[m <tail>");
        let html = render_failure(&ev, &CiContext::default()).into_string();
        assert!(html.contains(
            "<pre class=\"term\"><span class=\"term-fg31\">red</span> &lt;tail&gt;</pre>"
        ));
        assert!(!html.contains('\u{1b}'));
    }

    #[test]
    fn attribute_context_escapes_quotes() {
        let ci = CiContext::new("https://ci.example/\"><b>", "1");
        let html = render_failure(&FailureEvent::new("x"), &ci).into_string();
        assert!(html.contains("href=\"https://ci.example/&quot;&gt;&lt;b&gt;#1\""));
    }

    #[test]
    fn missing_context_degrades_gracefully() {
        let html = render_failure(&failure(), &CiContext::default()).into_string();
        assert!(html.contains("<p>in <a href=\"#\">Job #</a></p>\n"));
        assert!(html.starts_with("<details>\n"));
        assert!(html.ends_with("</details>\n\n\n"));
    }
}
