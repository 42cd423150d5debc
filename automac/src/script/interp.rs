//! The script interpreter core.
//!
//! [`Interpreter::run`] owns the program counter, the loop-frame stack, and
//! the cancellation flag, and drives one script to a terminal [`RunState`].
//! Control-flow keywords (`if_*`, `else`, `loop`, `endloop`, `break`,
//! `endif`) are handled here; everything else goes through the handler
//! registry in [`commands`](super::commands).
//!
//! Termination is always an explicit value, never an unwind: handlers return
//! a `Signal`, sub-scripts return their terminal [`RunState`], and the run
//! loop folds both into its own state. Cancellation is cooperative, checked
//! at the top of every step and inside the `wait` poll loop.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::actions::ActionCapability;
use super::block::find_block_end;
use super::commands;
use super::expr::eval_str;
use super::subst::substitute;
use super::value::Value;

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Receives one line of progress/log text per call.
pub type OutputSink = Arc<dyn Fn(&str) + Send + Sync>;
/// Receives a short status summary ("Running", "Finished", ...).
pub type StatusSink = Arc<dyn Fn(&str) + Send + Sync>;
/// Receives user-facing popup messages raised by the `popup` command.
pub type PopupSink = Arc<dyn Fn(&str) + Send + Sync>;

// ── Run state ─────────────────────────────────────────────────────────────────

/// Terminal (or in-flight) status of one interpreter invocation.
///
/// Every state except `Running` is terminal; a finished interpreter is never
/// resumed, a new invocation starts fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Cancellation was requested from outside and honored at a checkpoint.
    StoppedByUser,
    /// The script (or one of its sub-scripts) executed `exit`.
    StoppedByExit,
    FinishedNormally,
    FinishedWithError,
}

impl RunState {
    /// Short human-readable summary for the status sink.
    pub fn status_text(&self) -> &'static str {
        match self {
            RunState::Running => "Running",
            RunState::FinishedNormally => "Finished",
            RunState::StoppedByUser | RunState::StoppedByExit => "Stopped",
            RunState::FinishedWithError => "Error",
        }
    }
}

// ── Control signals ───────────────────────────────────────────────────────────

/// Control-transfer result of a successfully executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    /// Proceed to the next line.
    Continue,
    /// `exit`: controlled termination, propagated through every enclosing
    /// interpreter.
    Exit,
    /// A sub-script observed a user cancellation; stop here as well.
    Stopped,
}

/// A command handler: parses its own arguments, performs its action, and
/// reports through the interpreter's sinks. An `Err` is a fatal runtime
/// fault and stops the run.
pub(crate) type Handler = fn(&mut Interpreter, &str) -> Result<Signal, String>;

// ── Loop frames ───────────────────────────────────────────────────────────────

/// One active `loop`: where its body starts and how many iterations remain.
///
/// The count is evaluated once, when the `loop` line is first executed;
/// re-entry jumps to `return_line` (the first body line) so the count
/// expression is never re-evaluated.
#[derive(Debug)]
struct LoopFrame {
    return_line: usize,
    remaining: i64,
}

// ── Stop handle ───────────────────────────────────────────────────────────────

/// Cross-thread cancellation handle.
///
/// The flag has one writer (the caller) and one reader (the interpreter,
/// at its checkpoints); cloning shares the same flag.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the running script to stop at its next cooperative checkpoint.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// One script execution context: variable scope, capability handle, sinks,
/// and the shared stop flag. Sub-scripts run in a child interpreter that
/// copies the variables and shares everything else.
pub struct Interpreter {
    pub(crate) vars: HashMap<String, Value>,
    pub(crate) caps: Arc<dyn ActionCapability>,
    pub(crate) output: OutputSink,
    pub(crate) status: StatusSink,
    pub(crate) popup: PopupSink,
    stop: Arc<AtomicBool>,
    handlers: HashMap<&'static str, Handler>,
    lib_dir: Option<PathBuf>,
}

impl Interpreter {
    pub fn new(
        caps: Arc<dyn ActionCapability>,
        output: OutputSink,
        status: StatusSink,
        popup: PopupSink,
    ) -> Self {
        Interpreter {
            vars: HashMap::new(),
            caps,
            output,
            status,
            popup,
            stop: Arc::new(AtomicBool::new(false)),
            handlers: commands::handler_table(),
            lib_dir: None,
        }
    }

    /// Directory used to resolve relative `script`/`playback` paths that do
    /// not exist as given.
    pub fn with_lib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lib_dir = Some(dir.into());
        self
    }

    /// Handle for requesting cancellation from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    // ── Variable scope ────────────────────────────────────────────────────────

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// The full variable scope (for embedding and tests).
    pub fn vars(&self) -> &HashMap<String, Value> {
        &self.vars
    }

    pub(crate) fn into_vars(self) -> HashMap<String, Value> {
        self.vars
    }

    // ── Reporting ─────────────────────────────────────────────────────────────

    pub(crate) fn report(&self, line: &str) {
        (self.output)(line);
    }

    // ── Expression evaluation ─────────────────────────────────────────────────

    /// Substitute `$name` references and evaluate the result.
    ///
    /// Empty expressions, unbound variables, and malformed syntax are all
    /// fatal; the error text carries the post-substitution expression.
    pub fn eval_expression(&self, raw: &str) -> Result<Value, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("expression cannot be empty".into());
        }
        let substituted = substitute(trimmed, &self.vars)?;
        eval_str(&substituted).map_err(|e| format!("error evaluating '{substituted}': {e}"))
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Execute a script to completion and return its terminal state.
    pub fn run(&mut self, script: &str) -> RunState {
        (self.status)(RunState::Running.status_text());
        let lines: Vec<&str> = script.lines().collect();
        let mut pc = 0usize;
        let mut loop_stack: Vec<LoopFrame> = Vec::new();
        let mut state = RunState::Running;

        while state == RunState::Running && pc < lines.len() {
            if self.stop_requested() {
                state = RunState::StoppedByUser;
                break;
            }

            let line_no = pc;
            let line = lines[pc].trim();
            pc += 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (command, args) = split_line(line);
            match self.step(&lines, &mut pc, &mut loop_stack, command, args, line_no) {
                Ok(Signal::Continue) => {}
                Ok(Signal::Exit) => {
                    self.report("Script execution terminated by 'exit' command.");
                    state = RunState::StoppedByExit;
                }
                Ok(Signal::Stopped) => state = RunState::StoppedByUser,
                Err(e) => {
                    self.report(&format!(
                        "ERROR on line {}: {}\n -> {e}",
                        line_no + 1,
                        lines[line_no].trim()
                    ));
                    state = RunState::FinishedWithError;
                }
            }
        }

        if state == RunState::Running {
            state = RunState::FinishedNormally;
        }
        (self.status)(state.status_text());
        state
    }

    /// Execute one already-split line. `pc` has been advanced past the line,
    /// so jumps computed here are relative to the next line.
    fn step(
        &mut self,
        lines: &[&str],
        pc: &mut usize,
        loop_stack: &mut Vec<LoopFrame>,
        command: &str,
        args: &str,
        line_no: usize,
    ) -> Result<Signal, String> {
        if command.starts_with("if_") {
            let met = commands::eval_condition(self, command, args)?;
            if !met {
                // Take the next clause: land just after the matching
                // `else` (run its body) or `endif`.
                *pc = find_block_end(lines, *pc, &["if_"], &["else", "endif"])?;
            }
            return Ok(Signal::Continue);
        }

        match command {
            // Reached only by falling out of a true branch; the false-branch
            // path skipped past this line already.
            "else" => {
                *pc = find_block_end(lines, *pc, &["if_"], &["endif"])?;
                Ok(Signal::Continue)
            }

            "loop" => {
                // Count fixed at first encounter: the frame stores only the
                // countdown, and re-entry jumps to the body, not back here.
                let count = self.eval_expression(args)?.as_int();
                loop_stack.push(LoopFrame {
                    return_line: *pc,
                    remaining: count,
                });
                Ok(Signal::Continue)
            }

            "endloop" => {
                match loop_stack.last_mut() {
                    Some(frame) => {
                        frame.remaining -= 1;
                        if frame.remaining > 0 {
                            *pc = frame.return_line;
                        } else {
                            loop_stack.pop();
                        }
                    }
                    None => {
                        self.report(&format!(
                            "Error: 'endloop' without 'loop' on line {}.",
                            line_no + 1
                        ));
                        tracing::warn!(line = line_no + 1, "endloop without loop");
                    }
                }
                Ok(Signal::Continue)
            }

            "break" => {
                match loop_stack.pop() {
                    Some(frame) => {
                        *pc = find_block_end(lines, frame.return_line, &["loop"], &["endloop"])?;
                    }
                    None => {
                        self.report("Error: 'break' outside of a loop.");
                        tracing::warn!(line = line_no + 1, "break outside loop");
                    }
                }
                Ok(Signal::Continue)
            }

            "endif" => Ok(Signal::Continue),

            _ => self.dispatch(command, args),
        }
    }

    /// Look up and invoke a registered handler. Unknown commands are the one
    /// error class that never stops the run.
    fn dispatch(&mut self, command: &str, args: &str) -> Result<Signal, String> {
        match self.handlers.get(command).copied() {
            Some(handler) => handler(self, args),
            None => {
                self.report(&format!("Unknown command: '{command}'"));
                tracing::warn!(command, "unknown command");
                Ok(Signal::Continue)
            }
        }
    }

    /// Feed one recorded playback event through the handler registry.
    /// Events naming no handler are skipped silently (control-flow keywords
    /// never appear in recordings).
    pub(crate) fn replay(&mut self, command: &str, args: &str) -> Result<Signal, String> {
        match self.handlers.get(command).copied() {
            Some(handler) => handler(self, args),
            None => {
                tracing::warn!(command, "ignoring unknown playback event");
                Ok(Signal::Continue)
            }
        }
    }

    // ── Sub-scripts ───────────────────────────────────────────────────────────

    /// Child interpreter for a `script` invocation: copied variables, shared
    /// capability handle, sinks, and stop flag.
    pub(crate) fn spawn_child(&self) -> Interpreter {
        Interpreter {
            vars: self.vars.clone(),
            caps: Arc::clone(&self.caps),
            output: Arc::clone(&self.output),
            status: Arc::clone(&self.status),
            popup: Arc::clone(&self.popup),
            stop: Arc::clone(&self.stop),
            handlers: commands::handler_table(),
            lib_dir: self.lib_dir.clone(),
        }
    }

    /// Resolve a `script`/`playback` path: absolute paths and paths that
    /// exist as given are used verbatim, anything else is tried under the
    /// library directory.
    pub(crate) fn resolve_script_path(&self, raw: &str) -> PathBuf {
        let path = PathBuf::from(raw);
        if path.is_absolute() || path.exists() {
            return path;
        }
        match &self.lib_dir {
            Some(dir) => dir.join(path),
            None => path,
        }
    }
}

/// Split a line into its command token and the remaining argument text.
fn split_line(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
