/// One decoded gaze measurement.
///
/// Values are passed through exactly as they arrived on the wire; NaN,
/// infinities and off-screen coordinates are not filtered.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    /// Capture time, in whatever epoch/units the producer uses.
    pub timestamp: f64,
    /// Raw gaze coordinate from the tracker.
    pub gaze_x: f32,
    pub gaze_y: f32,
    /// Gaze mapped to screen space, nominally [0, width] x [0, height].
    pub screen_x: f32,
    pub screen_y: f32,
}

impl GazeSample {
    pub fn new(timestamp: f64, gaze_x: f32, gaze_y: f32, screen_x: f32, screen_y: f32) -> Self {
        Self {
            timestamp,
            gaze_x,
            gaze_y,
            screen_x,
            screen_y,
        }
    }

    /// Screen-space point as `(x, y)`.
    pub fn screen_point(&self) -> (f32, f32) {
        (self.screen_x, self.screen_y)
    }
}

/// Lifecycle state of a [`GazeListener`](crate::GazeListener).
///
/// `Created -> Running -> Stopped`; `Stopped` is terminal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Created = 0,
    Running = 1,
    Stopped = 2,
}

impl ListenerState {
    pub(crate) fn from_u8(value: u8) -> ListenerState {
        match value {
            0 => ListenerState::Created,
            1 => ListenerState::Running,
            _ => ListenerState::Stopped,
        }
    }
}
