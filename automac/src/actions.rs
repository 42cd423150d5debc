//! The action capability boundary.
//!
//! The interpreter never touches the OS directly; every mouse click, key
//! press, OCR lookup, and screenshot goes through [`ActionCapability`]. A
//! backend answers each request with a usable result or a "not found" value
//! (an `Option`/`bool`), which the interpreter reports and skips past.
//! Returning `Err` means the backend itself broke, and that stops the run.
//!
//! This crate ships only [`NullActions`], a backend that performs nothing;
//! real device backends (input injection, OCR, template matching) implement
//! the trait outside this crate.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

// ── Geometry ──────────────────────────────────────────────────────────────────

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A screen rectangle given by two corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Rect { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.x1,
            self.y1,
            self.width(),
            self.height()
        )
    }
}

/// An RGB pixel sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A failure inside a capability backend.
///
/// Distinct from "not found": a backend that looked and found nothing returns
/// `Ok(None)`; an `ActionError` means the lookup or action itself broke.
#[derive(Debug, Error)]
#[error("action backend error: {message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        ActionError {
            message: message.into(),
        }
    }
}

pub type ActionResult<T> = Result<T, ActionError>;

// ── Capability trait ──────────────────────────────────────────────────────────

/// The environment-provided set of desktop automation operations.
pub trait ActionCapability: Send + Sync {
    fn click_at(&self, point: Point) -> ActionResult<()>;
    fn double_click_at(&self, point: Point) -> ActionResult<()>;
    fn right_click_at(&self, point: Point) -> ActionResult<()>;
    fn move_to(&self, point: Point) -> ActionResult<()>;
    fn drag_to(&self, from: Point, to: Point, duration: Duration) -> ActionResult<()>;
    fn scroll(&self, amount: i32) -> ActionResult<()>;
    fn press_key(&self, name: &str) -> ActionResult<()>;
    fn type_text(&self, text: &str) -> ActionResult<()>;

    /// Bring the window with the given title to the foreground.
    /// Returns `false` when no such window exists.
    fn activate_window(&self, title: &str) -> ActionResult<bool>;

    /// Locate a template image on screen at the given match confidence.
    fn locate_image(&self, path: &Path, confidence: f64) -> ActionResult<Option<Point>>;

    /// Locate text on screen via OCR with fuzzy matching (roughly an 80%
    /// partial-ratio threshold).
    fn locate_text(&self, text: &str) -> ActionResult<Option<Point>>;

    /// OCR the given region and return whatever text was read.
    fn read_text_in_region(&self, rect: Rect) -> ActionResult<String>;

    fn sample_pixel(&self, point: Point) -> ActionResult<Rgb>;

    /// Start playing a sound file; must not block.
    fn play_sound(&self, path: &Path) -> ActionResult<()>;

    /// Capture the whole screen, or just `region`, to an image file.
    fn capture_screenshot(&self, path: &Path, region: Option<Rect>) -> ActionResult<()>;

    fn pointer_position(&self) -> ActionResult<Point>;
}

// ── Null backend ──────────────────────────────────────────────────────────────

/// A capability backend that performs nothing.
///
/// Every request is logged at debug level and answered with the neutral
/// result: lookups find nothing, the pointer sits at the origin. Useful for
/// dry-running scripts and as the binary's default backend.
#[derive(Debug, Default)]
pub struct NullActions;

impl ActionCapability for NullActions {
    fn click_at(&self, point: Point) -> ActionResult<()> {
        tracing::debug!(%point, "null backend: click");
        Ok(())
    }

    fn double_click_at(&self, point: Point) -> ActionResult<()> {
        tracing::debug!(%point, "null backend: double click");
        Ok(())
    }

    fn right_click_at(&self, point: Point) -> ActionResult<()> {
        tracing::debug!(%point, "null backend: right click");
        Ok(())
    }

    fn move_to(&self, point: Point) -> ActionResult<()> {
        tracing::debug!(%point, "null backend: move");
        Ok(())
    }

    fn drag_to(&self, from: Point, to: Point, duration: Duration) -> ActionResult<()> {
        tracing::debug!(%from, %to, ?duration, "null backend: drag");
        Ok(())
    }

    fn scroll(&self, amount: i32) -> ActionResult<()> {
        tracing::debug!(amount, "null backend: scroll");
        Ok(())
    }

    fn press_key(&self, name: &str) -> ActionResult<()> {
        tracing::debug!(name, "null backend: key press");
        Ok(())
    }

    fn type_text(&self, text: &str) -> ActionResult<()> {
        tracing::debug!(text, "null backend: type");
        Ok(())
    }

    fn activate_window(&self, title: &str) -> ActionResult<bool> {
        tracing::debug!(title, "null backend: activate window");
        Ok(false)
    }

    fn locate_image(&self, path: &Path, confidence: f64) -> ActionResult<Option<Point>> {
        tracing::debug!(path = %path.display(), confidence, "null backend: locate image");
        Ok(None)
    }

    fn locate_text(&self, text: &str) -> ActionResult<Option<Point>> {
        tracing::debug!(text, "null backend: locate text");
        Ok(None)
    }

    fn read_text_in_region(&self, rect: Rect) -> ActionResult<String> {
        tracing::debug!(%rect, "null backend: read region");
        Ok(String::new())
    }

    fn sample_pixel(&self, point: Point) -> ActionResult<Rgb> {
        tracing::debug!(%point, "null backend: sample pixel");
        Ok(Rgb { r: 0, g: 0, b: 0 })
    }

    fn play_sound(&self, path: &Path) -> ActionResult<()> {
        tracing::debug!(path = %path.display(), "null backend: play sound");
        Ok(())
    }

    fn capture_screenshot(&self, path: &Path, region: Option<Rect>) -> ActionResult<()> {
        tracing::debug!(path = %path.display(), ?region, "null backend: screenshot");
        Ok(())
    }

    fn pointer_position(&self) -> ActionResult<Point> {
        Ok(Point::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_dimensions() {
        let r = Rect::new(10, 20, 110, 70);
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 50);
    }

    #[test]
    fn point_display() {
        assert_eq!(Point::new(3, 4).to_string(), "(3, 4)");
    }

    #[test]
    fn null_backend_finds_nothing() {
        let caps = NullActions;
        assert_eq!(caps.locate_text("anything").unwrap(), None);
        assert!(!caps.activate_window("editor").unwrap());
        assert_eq!(caps.pointer_position().unwrap(), Point::default());
    }

    #[test]
    fn action_error_display() {
        let e = ActionError::new("ocr engine missing");
        assert_eq!(e.to_string(), "action backend error: ocr engine missing");
    }
}
