//! automac: a desktop automation macro language.
//!
//! A script is plain UTF-8 text, one command per line, with `#` comments.
//! The [`script::Interpreter`] executes it sequentially against a desktop
//! reached only through the [`actions::ActionCapability`] trait, so the
//! engine itself never touches the OS; plug in a real input/OCR backend to
//! drive a live session, or [`actions::NullActions`] to dry-run.
//!
//! Execution is synchronous on the calling thread. Run it on a worker
//! thread and keep the [`script::StopHandle`] to cancel cooperatively from
//! outside, which is exactly what the `automac` binary does.

pub mod actions;
pub mod cli;
pub mod fuzzy;
pub mod manager;
pub mod script;
