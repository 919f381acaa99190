//! The stage chain behind every save and load.
//!
//! This module provides:
//! - The `Sink` / `ByteStage` capability traits (`stage`)
//! - Gzip compression (`compression`)
//! - JSON encoding (`encoding`)
//! - `Pipeline`, which stacks them in order (`chain`)

pub mod chain;
pub mod compression;
pub mod encoding;
pub mod stage;

pub use chain::Pipeline;
pub use compression::Gzip;
pub use encoding::{Encoding, Json};
pub use stage::{BoxSink, BoxSource, ByteStage, Sink};
