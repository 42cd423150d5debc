//! The automation macro language.
//!
//! This module implements a line-oriented interpreter for automation
//! scripts, covering:
//!
//! - Variables and `$name` substitution
//! - Arithmetic/comparison expressions (`var`, `eval`, `if_eval`)
//! - Control flow: `if_*` … `else` … `endif`, `loop` … `endloop`, `break`,
//!   `exit`
//! - Screen-inspection conditions and device actions through
//!   [`ActionCapability`](crate::actions::ActionCapability)
//! - Sub-scripts (`script`) and recorded-macro replay (`playback`)
//! - Cooperative cancellation via [`StopHandle`]
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use automac::actions::NullActions;
//! use automac::script::{Interpreter, RunState};
//!
//! let mut interp = Interpreter::new(
//!     Arc::new(NullActions),
//!     Arc::new(|_line: &str| {}),
//!     Arc::new(|_status: &str| {}),
//!     Arc::new(|_message: &str| {}),
//! );
//! let state = interp.run("var x 6\neval y = $x * 7");
//! assert_eq!(state, RunState::FinishedNormally);
//! assert_eq!(interp.get_var("y").unwrap().as_int(), 42);
//! ```

pub mod block;
pub mod commands;
pub mod expr;
pub mod interp;
pub mod playback;
pub mod subst;
pub mod value;

// Re-exports for convenience.
pub use interp::{Interpreter, OutputSink, PopupSink, RunState, StatusSink, StopHandle};
pub use value::Value;
