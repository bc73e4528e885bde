//! Local pipeline stages around the remote parse call.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ service ──▶ render ──▶ write
//! (path)    (remote)    (md)       (json + md)
//! ```
//!
//! 1. [`input`]: validate a PDF path or list the PDFs in a directory
//! 2. [`crate::service`]: the only stage with network I/O
//! 3. [`render`]: assemble the markdown document from the page results,
//!    normalised by [`postprocess`]
//! 4. [`write`]: atomically persist the JSON and markdown artifacts

pub mod input;
pub mod postprocess;
pub mod render;
pub mod write;
