//! paperwatch-digest — Ranked, time-windowed digests over the record store.
//!
//! [`DigestBuilder`] selects the top records of a window and attaches their
//! current summaries; the renderers turn the resulting [`Digest`] into JSON,
//! fixed-width text or a self-contained HTML page without touching the store
//! again.
//!
//! [`Digest`]: paperwatch_common::Digest

pub mod builder;
pub mod export;
pub mod render;
pub mod wrap;

pub use builder::{DigestBuilder, DEFAULT_WINDOW_DAYS};
pub use export::{export, file_name, DigestError};
pub use render::{render, render_html, render_json, render_text, DigestFormat};
pub use wrap::wrap_text;
