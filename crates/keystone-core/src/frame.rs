/// Frame timing snapshot handed to every `update()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Monotonic frame index, starting at 0.
    pub frame_index: u64,

    /// Clamped wall-clock delta for this frame, in seconds.
    pub dt: f32,

    /// Sum of all `dt` so far, including this frame.
    pub elapsed: f64,
}

impl Frame {
    #[inline]
    pub fn first(dt: f32) -> Self {
        Self {
            frame_index: 0,
            dt,
            elapsed: dt as f64,
        }
    }

    /// Frame that follows `self` after `dt` seconds.
    #[inline]
    pub fn next(&self, dt: f32) -> Self {
        Self {
            frame_index: self.frame_index.wrapping_add(1),
            dt,
            elapsed: self.elapsed + dt as f64,
        }
    }
}
