//! # ANSI color codes → markup spans.
//!
//! Test output is usually colored for a terminal. The CI status page renders
//! markup instead, so every SGR color sequence is replaced with a
//! `<span class="term-fg{N}">` and all remaining control codes are dropped.
//!
//! ## Rules
//! - Spans never nest: a new color closes the open span before opening its own.
//! - `ESC[0m`, `ESC[m` and `ESC[39m` close the open span.
//! - An open span is closed at end of input.
//! - Unsupported SGR codes, every other CSI sequence (private markers,
//!   intermediates), two-byte escapes such as `ESC(B` or `ESC7` and stray
//!   `ESC` bytes are removed without affecting the open span.
//! - SGR parameters may be separated by `;` or `:` (`ESC[38:5:208m`).
//!
//! ```text
//! "\e[31mred\e[0m plain"   →  <span class="term-fg31">red</span> plain
//! "\e[1;32mok"             →  <span class="term-fg1 term-fg32">ok</span>
//! "\e[38;5;208mhi\e[0m"    →  <span class="term-fgx208">hi</span>
//! ```

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::render::escape::escape_text;

const ESC: char = '\u{1b}';

/// ECMA-48 escape: a CSI sequence (group 1: parameter bytes, group 2:
/// intermediate bytes, group 3: final byte), an `ESC <intermediates> <final>`
/// escape, or a bare `ESC`.
static ESCAPE_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b(?:\[([0-?]*)([ -/]*)([@-~])|[ -/]*[0-~])?")
        .expect("escape sequence pattern is valid")
});

/// Effect of one SGR sequence on the span state.
#[derive(Debug, PartialEq, Eq)]
enum Sgr {
    /// Close the open span, if any.
    Reset,
    /// Close the open span and open a new one with these classes.
    Color(Vec<String>),
    /// Nothing this translator supports.
    Ignore,
}

impl Sgr {
    fn parse(params: &str) -> Self {
        let mut codes = params.split([';', ':']).map(|p| {
            if p.is_empty() {
                Some(0)
            } else {
                p.parse::<u16>().ok()
            }
        });

        let mut classes = Vec::new();
        let mut reset = false;

        while let Some(code) = codes.next() {
            let Some(code) = code else {
                return Sgr::Ignore;
            };
            match code {
                0 | 39 => {
                    reset = true;
                    classes.clear();
                }
                1..=9 | 30..=37 | 90..=97 => classes.push(format!("term-fg{code}")),
                38 => match codes.next().flatten() {
                    Some(5) => {
                        if let Some(Some(n)) = codes.next() {
                            classes.push(format!("term-fgx{n}"));
                        }
                    }
                    Some(2) => {
                        // 24-bit color: r;g;b
                        codes.by_ref().take(3).for_each(drop);
                    }
                    _ => {}
                },
                48 => match codes.next().flatten() {
                    Some(5) => {
                        codes.next();
                    }
                    Some(2) => codes.by_ref().take(3).for_each(drop),
                    _ => {}
                },
                _ => {}
            }
        }

        if !classes.is_empty() {
            Sgr::Color(classes)
        } else if reset {
            Sgr::Reset
        } else {
            Sgr::Ignore
        }
    }
}

/// Translates ANSI color sequences in `input` into markup spans.
///
/// Text without any `ESC` byte is returned unchanged (borrowed).
///
/// # Example
/// ```
/// use ci_annotator::render::recolorize;
///
/// assert_eq!(
///     recolorize("\u{1b}[31mfailed\u{1b}[0m: 1 of 3"),
///     r#"<span class="term-fg31">failed</span>: 1 of 3"#,
/// );
/// assert_eq!(recolorize("no colors"), "no colors");
/// ```
pub fn recolorize(input: &str) -> Cow<'_, str> {
    if !input.contains(ESC) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(translate(input, |out, text| out.push_str(text)))
}

/// Like [`recolorize`], but escapes the text between sequences for a markup
/// text context. Escaping raw output first would hide `<`/`>` parameter bytes
/// from the sequence matcher.
pub(crate) fn recolorize_escaped(input: &str) -> String {
    translate(input, |out, text| out.push_str(&escape_text(text)))
}

fn translate(input: &str, mut push_text: impl FnMut(&mut String, &str)) -> String {
    let mut out = String::with_capacity(input.len() + 32);
    let mut open = false;
    let mut last = 0;

    for caps in ESCAPE_SEQUENCE.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        push_text(&mut out, &input[last..whole.start()]);
        last = whole.end();

        let params = caps.get(1).map_or("", |m| m.as_str());
        if !is_sgr(&caps) || !params.bytes().all(|b| matches!(b, b'0'..=b'9' | b';' | b':')) {
            continue;
        }

        match Sgr::parse(params) {
            Sgr::Reset => close(&mut out, &mut open),
            Sgr::Color(classes) => {
                close(&mut out, &mut open);
                out.push_str("<span class=\"");
                out.push_str(&classes.join(" "));
                out.push_str("\">");
                open = true;
            }
            Sgr::Ignore => {}
        }
    }

    push_text(&mut out, &input[last..]);
    close(&mut out, &mut open);
    out
}

/// `CSI ... m` with no intermediate bytes.
fn is_sgr(caps: &regex::Captures<'_>) -> bool {
    caps.get(3).is_some_and(|m| m.as_str() == "m") && caps.get(2).is_some_and(|m| m.is_empty())
}

fn close(out: &mut String, open: &mut bool) {
    if *open {
        out.push_str("</span>");
        *open = false;
    }
}
