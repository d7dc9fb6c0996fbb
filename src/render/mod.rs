//! Pure rendering: failures to annotation markup.
//!
//! - [`recolorize`] translates ANSI color sequences into markup spans
//! - [`render_failure`] builds the annotation fragment for one failure
//! - [`escape_text`] / [`quote_attr`] escape values for text and attribute contexts
//!
//! Nothing here performs I/O or keeps state.

mod ansi;
mod escape;
mod failure;

pub use ansi::recolorize;
pub use escape::{escape_text, quote_attr};
pub use failure::{RenderedAnnotation, render_failure};
