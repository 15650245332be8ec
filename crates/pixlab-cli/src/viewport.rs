//! Zoom state of the image view

use pixlab_core::Command;

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 5.0;
const ZOOM_IN_STEP: f64 = 1.2;
const ZOOM_OUT_STEP: f64 = 0.8;

/// Presentation-only zoom factor; never touches the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Viewport {
    zoom: f64,
}

impl Viewport {
    pub(crate) fn new() -> Self {
        Self { zoom: 1.0 }
    }

    #[inline]
    pub(crate) fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Zoom as a whole percentage
    pub(crate) fn percent(&self) -> u32 {
        // Bounded by MAX_ZOOM, so the cast cannot truncate
        (self.zoom * 100.0).round() as u32
    }

    pub(crate) fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_IN_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub(crate) fn zoom_out(&mut self) {
        self.zoom = (self.zoom * ZOOM_OUT_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub(crate) fn fit(&mut self) {
        self.zoom = 1.0;
    }

    /// Handle a zoom command; false for any other command
    pub(crate) fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::ZoomIn => self.zoom_in(),
            Command::ZoomOut => self.zoom_out(),
            Command::ZoomFit => self.fit(),
            Command::Undo | Command::Redo | Command::Open => return false,
        }
        true
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}
