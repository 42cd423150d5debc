//! Command handlers and the dispatcher registry.
//!
//! Every non-control-flow command is a handler function registered by name
//! in `handler_table`, built once at interpreter construction. Each handler
//! parses its own arguments (whitespace- or quote-delimited, per command),
//! performs its external action or state mutation, and reports a
//! human-readable outcome through the output sink.
//!
//! Failure conventions: a target the capability layer could not find is
//! reported and skipped; a malformed argument or a capability error is
//! returned as `Err` and stops the run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::actions::{ActionError, Point, Rect};
use crate::fuzzy::partial_ratio;
use super::interp::{Handler, Interpreter, RunState, Signal};
use super::playback;
use super::subst::substitute;
use super::value::Value;

/// Match confidence used for `*_image` lookups.
const IMAGE_CONFIDENCE: f64 = 0.8;
/// Fuzzy-match threshold for `if_text_region` (strictly greater than).
const TEXT_MATCH_THRESHOLD: u32 = 80;
/// Granularity of the cancellation poll inside `wait`.
const WAIT_POLL: Duration = Duration::from_millis(100);
/// Upper bound on any script-supplied duration, in seconds.
const MAX_DURATION_SECS: f64 = 1.0e9;

/// Build the command-name → handler registry.
pub(crate) fn handler_table() -> HashMap<&'static str, Handler> {
    let entries: [(&'static str, Handler); 26] = [
        ("click_location", click_location),
        ("click_text", click_text),
        ("click_image", click_image),
        ("double_click_location", double_click_location),
        ("double_click_text", double_click_text),
        ("double_click_image", double_click_image),
        ("right_click_location", right_click_location),
        ("move_to", move_to),
        ("click_and_drag", click_and_drag),
        ("scroll", scroll),
        ("wait", wait),
        ("delay", wait),
        ("select_window", select_window),
        ("key", key),
        ("type", type_text),
        ("var", var),
        ("eval", eval),
        ("popup", popup),
        ("get_text_region", get_text_region),
        ("playback", playback_macro),
        ("script", sub_script),
        ("log", log),
        ("sound", sound),
        ("screenshot", screenshot),
        ("exit", exit),
        ("mouse_pos", mouse_pos),
    ];
    entries.into_iter().collect()
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"')
}

fn action_err(e: ActionError) -> String {
    e.to_string()
}

/// Parse exactly `n` whitespace-separated integers.
fn parse_ints(cmd: &str, s: &str, n: usize) -> Result<Vec<i32>, String> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() != n {
        return Err(format!("{cmd}: expected {n} integers, got '{}'", s.trim()));
    }
    parts
        .iter()
        .map(|p| {
            p.parse::<i32>()
                .map_err(|_| format!("{cmd}: '{p}' is not an integer"))
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `value.replace('.', '', 1).isdigit()`: an unsigned int or float literal.
fn is_numeric_literal(s: &str) -> bool {
    let stripped = s.trim().replacen('.', "", 1);
    !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_digit())
}

// ── Screen lookups ────────────────────────────────────────────────────────────

/// Locate a template image on screen; reports when nothing matches.
fn find_image(interp: &Interpreter, raw: &str) -> Result<Option<Point>, String> {
    let path = unquote(raw);
    let found = interp
        .caps
        .locate_image(Path::new(path), IMAGE_CONFIDENCE)
        .map_err(action_err)?;
    if found.is_none() {
        interp.report(&format!("Image '{}' not found.", file_name(Path::new(path))));
    }
    Ok(found)
}

/// Locate text on screen via the OCR capability; reports when nothing matches.
fn find_text(interp: &Interpreter, raw: &str) -> Result<Option<Point>, String> {
    let text = unquote(raw);
    let found = interp.caps.locate_text(text).map_err(action_err)?;
    if found.is_none() {
        interp.report(&format!("Text '{text}' not found."));
    }
    Ok(found)
}

// ── Mouse commands ────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum ClickKind {
    Single,
    Double,
    Right,
}

/// Shared tail of every click command: skip (with a report) when the target
/// was not found, otherwise click and report.
fn perform_click(
    interp: &mut Interpreter,
    kind: ClickKind,
    target: Option<Point>,
    action_name: &str,
) -> Result<Signal, String> {
    let Some(point) = target else {
        interp.report(&format!("Action '{action_name}' failed: target not found."));
        return Ok(Signal::Continue);
    };
    let clicked = match kind {
        ClickKind::Single => interp.caps.click_at(point),
        ClickKind::Double => interp.caps.double_click_at(point),
        ClickKind::Right => interp.caps.right_click_at(point),
    };
    clicked.map_err(action_err)?;
    interp.report(&format!("Performed {action_name} at {point}"));
    Ok(Signal::Continue)
}

fn point_arg(cmd: &str, args: &str) -> Result<Point, String> {
    let v = parse_ints(cmd, args, 2)?;
    Ok(Point::new(v[0], v[1]))
}

fn click_location(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let p = point_arg("click_location", args)?;
    perform_click(interp, ClickKind::Single, Some(p), "click_location")
}

fn click_text(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let target = find_text(interp, args)?;
    perform_click(interp, ClickKind::Single, target, "click_text")
}

fn click_image(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let target = find_image(interp, args)?;
    perform_click(interp, ClickKind::Single, target, "click_image")
}

fn double_click_location(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let p = point_arg("double_click_location", args)?;
    perform_click(interp, ClickKind::Double, Some(p), "double_click_location")
}

fn double_click_text(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let target = find_text(interp, args)?;
    perform_click(interp, ClickKind::Double, target, "double_click_text")
}

fn double_click_image(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let target = find_image(interp, args)?;
    perform_click(interp, ClickKind::Double, target, "double_click_image")
}

fn right_click_location(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let p = point_arg("right_click_location", args)?;
    perform_click(interp, ClickKind::Right, Some(p), "right_click_location")
}

fn move_to(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let p = point_arg("move_to", args)?;
    interp.caps.move_to(p).map_err(action_err)?;
    interp.report(&format!("Moved mouse to {p}"));
    Ok(Signal::Continue)
}

fn click_and_drag(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 5 {
        return Err(format!(
            "click_and_drag: expected 'x1 y1 x2 y2 duration', got '{}'",
            args.trim()
        ));
    }
    let coords = parse_ints("click_and_drag", &parts[..4].join(" "), 4)?;
    let seconds: f64 = parts[4]
        .parse()
        .map_err(|_| format!("click_and_drag: '{}' is not a duration", parts[4]))?;
    if !seconds.is_finite() || !(0.0..=MAX_DURATION_SECS).contains(&seconds) {
        return Err(format!("click_and_drag: invalid duration {seconds}"));
    }
    let from = Point::new(coords[0], coords[1]);
    let to = Point::new(coords[2], coords[3]);
    interp.caps.move_to(from).map_err(action_err)?;
    interp
        .caps
        .drag_to(from, to, Duration::from_secs_f64(seconds))
        .map_err(action_err)?;
    interp.report(&format!("Dragged from {from} to {to}"));
    Ok(Signal::Continue)
}

fn scroll(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let amount: i32 = args
        .trim()
        .parse()
        .map_err(|_| format!("scroll: '{}' is not an integer", args.trim()))?;
    interp.caps.scroll(amount).map_err(action_err)?;
    interp.report(&format!("Scrolled {amount} units"));
    Ok(Signal::Continue)
}

// ── Timing ────────────────────────────────────────────────────────────────────

/// Cooperative sleep: polls the stop flag every `WAIT_POLL` so a
/// cancellation request is honored within that bound.
fn wait(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let seconds = interp.eval_expression(args)?.as_float();
    if !seconds.is_finite() || seconds > MAX_DURATION_SECS {
        return Err(format!("wait: invalid duration {seconds}"));
    }
    let deadline = Instant::now() + Duration::from_secs_f64(seconds.max(0.0));
    loop {
        if interp.stop_requested() {
            // The run loop turns the flag into StoppedByUser at the next step.
            return Ok(Signal::Continue);
        }
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(WAIT_POLL));
    }
    interp.report(&format!("Waited for {seconds}s."));
    Ok(Signal::Continue)
}

// ── Window and keyboard ───────────────────────────────────────────────────────

fn select_window(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let title = unquote(args);
    if interp.caps.activate_window(title).map_err(action_err)? {
        interp.report(&format!("Activated window: {title}"));
    } else {
        interp.report(&format!("Window '{title}' not found."));
    }
    Ok(Signal::Continue)
}

fn key(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let name = args.trim();
    if name.is_empty() {
        return Err("key: requires a key name".into());
    }
    interp.caps.press_key(name).map_err(action_err)?;
    interp.report(&format!("Pressed key: {name}"));
    Ok(Signal::Continue)
}

fn type_text(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let text = unquote(args);
    interp.caps.type_text(text).map_err(action_err)?;
    interp.report(&format!("Typed: {text}"));
    Ok(Signal::Continue)
}

// ── Variables ─────────────────────────────────────────────────────────────────

/// `var name value`: a value containing `$` or shaped like a numeric literal
/// is evaluated; anything else is stored verbatim as a string (quotes
/// stripped).
fn var(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let (name, raw_value) = args
        .split_once(char::is_whitespace)
        .ok_or_else(|| "var: requires a name and a value".to_string())?;
    let name = name.trim();
    let raw_value = raw_value.trim();

    let value = if raw_value.contains('$') || is_numeric_literal(raw_value) {
        interp.eval_expression(raw_value)?
    } else {
        Value::Str(raw_value.trim_matches('"').to_owned())
    };
    interp.report(&format!("Set var {name} = {value}"));
    interp.vars.insert(name.to_owned(), value);
    Ok(Signal::Continue)
}

/// `eval name = expression`: stores the evaluator result.
fn eval(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let (name, expr) = args
        .split_once('=')
        .ok_or_else(|| "eval: requires 'name = expression'".to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err("eval: requires a variable name before '='".into());
    }
    let value = interp.eval_expression(expr)?;
    interp.vars.insert(name.to_owned(), value);
    Ok(Signal::Continue)
}

fn mouse_pos(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 2 {
        interp.report("Error: mouse_pos requires two variable names.");
        return Ok(Signal::Continue);
    }
    let pos = interp.caps.pointer_position().map_err(action_err)?;
    interp.vars.insert(parts[0].to_owned(), Value::Int(pos.x.into()));
    interp.vars.insert(parts[1].to_owned(), Value::Int(pos.y.into()));
    interp.report(&format!(
        "Stored mouse position {pos} in ${} and ${}",
        parts[0], parts[1]
    ));
    Ok(Signal::Continue)
}

fn get_text_region(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let (name, rest) = args
        .split_once(char::is_whitespace)
        .ok_or_else(|| "get_text_region: requires a variable name and a region".to_string())?;
    let v = parse_ints("get_text_region", rest, 4)?;
    let rect = Rect::new(v[0], v[1], v[2], v[3]);
    let text = interp
        .caps
        .read_text_in_region(rect)
        .map_err(action_err)?
        .trim()
        .to_owned();
    interp.report(&format!(
        "Got text '{text}' from region and stored in var {name}"
    ));
    interp.vars.insert(name.trim().to_owned(), Value::Str(text));
    Ok(Signal::Continue)
}

// ── Output ────────────────────────────────────────────────────────────────────

/// `log text`: writes `LOG: text` with `$name` references substituted.
fn log(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let expanded = substitute(unquote(args), &interp.vars)?;
    interp.report(&format!("LOG: {expanded}"));
    Ok(Signal::Continue)
}

fn popup(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let message = unquote(args);
    interp.report(&format!("Showing popup: {message}"));
    (interp.popup)(message);
    Ok(Signal::Continue)
}

// ── Media ─────────────────────────────────────────────────────────────────────

fn sound(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let path = Path::new(unquote(args));
    if !path.exists() {
        interp.report(&format!("Sound file not found: {}", path.display()));
        return Ok(Signal::Continue);
    }
    interp.caps.play_sound(path).map_err(action_err)?;
    interp.report(&format!("Played sound: {}", file_name(path)));
    Ok(Signal::Continue)
}

fn screenshot(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let region = match parts.len() {
        1 => None,
        5 => {
            let v = parse_ints("screenshot", &parts[1..].join(" "), 4)?;
            Some(Rect::new(v[0], v[1], v[2], v[3]))
        }
        _ => {
            return Err(format!(
                "screenshot: expected 'path [x1 y1 x2 y2]', got '{}'",
                args.trim()
            ))
        }
    };
    let path = Path::new(parts[0].trim_matches('"'));
    interp
        .caps
        .capture_screenshot(path, region)
        .map_err(action_err)?;
    interp.report(&format!("Screenshot saved to {}", path.display()));
    Ok(Signal::Continue)
}

// ── Termination ───────────────────────────────────────────────────────────────

fn exit(_interp: &mut Interpreter, _args: &str) -> Result<Signal, String> {
    Ok(Signal::Exit)
}

// ── Sub-scripts and playback ──────────────────────────────────────────────────

/// `script "path"`: run a nested interpreter synchronously. A child that
/// finishes normally merges its variables back; any other terminal state
/// propagates to the caller.
fn sub_script(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let path = interp.resolve_script_path(unquote(args));
    if !path.exists() {
        interp.report(&format!("Sub-script not found: {}", path.display()));
        return Ok(Signal::Continue);
    }
    let source = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            interp.report(&format!("Error in sub-script {}: {e}", path.display()));
            return Ok(Signal::Continue);
        }
    };
    let name = file_name(&path);
    interp.report(&format!("--- Starting sub-script: {name} ---"));

    let mut child = interp.spawn_child();
    match child.run(&source) {
        RunState::FinishedNormally => {
            interp.vars.extend(child.into_vars());
            interp.report(&format!("--- Finished sub-script: {name} ---"));
            Ok(Signal::Continue)
        }
        RunState::StoppedByExit => Ok(Signal::Exit),
        RunState::StoppedByUser => Ok(Signal::Stopped),
        RunState::FinishedWithError | RunState::Running => {
            Err(format!("sub-script '{name}' failed"))
        }
    }
}

/// `playback "path"`: replay a recorded event list through the handler
/// registry. No nested interpreter, flat commands only.
fn playback_macro(interp: &mut Interpreter, args: &str) -> Result<Signal, String> {
    let path = interp.resolve_script_path(unquote(args));
    if !path.exists() {
        interp.report(&format!("Macro file not found: {}", path.display()));
        return Ok(Signal::Continue);
    }
    let events = playback::load_events(&path)?;
    let name = file_name(&path);
    interp.report(&format!("--- Playing back macro: {name} ---"));
    for event in &events {
        if interp.stop_requested() {
            return Ok(Signal::Continue);
        }
        match interp.replay(&event.command, &event.args)? {
            Signal::Continue => {}
            other => return Ok(other),
        }
    }
    interp.report("--- Finished macro playback ---");
    Ok(Signal::Continue)
}

// ── Conditions ────────────────────────────────────────────────────────────────

/// Evaluate an `if_*` / `if_not_*` condition.
///
/// Unrecognized `if_` spellings and malformed `if_text_region` argument
/// lists read as false rather than stopping the run; expression faults and
/// capability errors are fatal as everywhere else.
pub(crate) fn eval_condition(
    interp: &mut Interpreter,
    command: &str,
    args: &str,
) -> Result<bool, String> {
    let inverted = command.starts_with("if_not_");
    let base = if inverted {
        command.replacen("if_not_", "if_", 1)
    } else {
        command.to_owned()
    };

    let result = match base.as_str() {
        "if_eval" => interp.eval_expression(args)?.as_bool(),
        "if_image_screen" => find_image(interp, args)?.is_some(),
        "if_text_screen" => find_text(interp, args)?.is_some(),
        "if_text_region" => text_region_matches(interp, args)?,
        "if_pixel_matches" => pixel_matches(interp, args)?,
        _ => false,
    };
    Ok(result != inverted)
}

fn text_region_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""([^"]+)"\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)"#).expect("valid regex")
    })
}

/// `if_text_region "text" x1 y1 x2 y2`: OCR the region and fuzzy-compare.
fn text_region_matches(interp: &mut Interpreter, args: &str) -> Result<bool, String> {
    let Some(caps) = text_region_re().captures(args.trim()) else {
        return Ok(false);
    };
    let text = caps[1].to_owned();
    let mut nums = [0i32; 4];
    for (slot, group) in nums.iter_mut().zip(2..6) {
        *slot = caps[group]
            .parse()
            .map_err(|_| format!("if_text_region: coordinate '{}' out of range", &caps[group]))?;
    }
    let rect = Rect::new(nums[0], nums[1], nums[2], nums[3]);
    let seen = interp.caps.read_text_in_region(rect).map_err(action_err)?;
    let is_match =
        partial_ratio(&text.to_lowercase(), &seen.to_lowercase()) > TEXT_MATCH_THRESHOLD;
    interp.report(&format!(
        "IF: Check for '{text}' in {rect}. Match: {is_match}"
    ));
    Ok(is_match)
}

/// `if_pixel_matches x y r g b [tolerance]`.
fn pixel_matches(interp: &mut Interpreter, args: &str) -> Result<bool, String> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if !(5..=6).contains(&parts.len()) {
        return Err(format!(
            "if_pixel_matches: expected 'x y r g b [tolerance]', got '{}'",
            args.trim()
        ));
    }
    let v = parse_ints("if_pixel_matches", &parts[..5].join(" "), 5)?;
    let tolerance: i32 = match parts.get(5) {
        Some(t) => t
            .parse()
            .map_err(|_| format!("if_pixel_matches: '{t}' is not an integer"))?,
        None => 0,
    };
    let (x, y, r, g, b) = (v[0], v[1], v[2], v[3], v[4]);
    let sample = interp
        .caps
        .sample_pixel(Point::new(x, y))
        .map_err(action_err)?;
    let is_match = (i32::from(sample.r) - r).abs() <= tolerance
        && (i32::from(sample.g) - g).abs() <= tolerance
        && (i32::from(sample.b) - b).abs() <= tolerance;
    interp.report(&format!(
        "IF: Pixel at ({x}, {y}) matches ({r}, {g}, {b}) with tolerance {tolerance}. Match: {is_match}"
    ));
    Ok(is_match)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
