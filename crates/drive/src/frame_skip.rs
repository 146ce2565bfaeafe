//! Short real-time window during which capacity and speed are not recomputed.

/// Next-due-time gate armed after throttle changes and location crossings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameSkip {
    window_seconds: f64,
    until: Option<f64>,
}

impl FrameSkip {
    pub fn new(window_seconds: f64) -> Self {
        Self {
            window_seconds: window_seconds.max(0.0),
            until: None,
        }
    }

    /// Open the window at `now`. Returns whether a new window was opened.
    ///
    /// An open window is never extended, and the tick on which a window
    /// expires does not open another one, so at least one tick recomputes
    /// between consecutive windows.
    pub fn arm(&mut self, now: f64) -> bool {
        match self.until {
            Some(until) if now < until => false,
            Some(_) => {
                self.until = None;
                false
            }
            None => {
                self.until = Some(now + self.window_seconds);
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.until = None;
    }

    /// Whether `now` still falls inside the window. Expired windows are cleared.
    pub fn is_active(&mut self, now: f64) -> bool {
        match self.until {
            Some(until) if now < until => true,
            Some(_) => {
                self.until = None;
                false
            }
            None => false,
        }
    }
}
