//! Animation frame selection.

/// Cyclic frame counter over an animated volume sequence.
///
/// The state is the current frame index. `advance` moves to the next frame
/// and wraps to 0 after the last one; it only changes state when there is
/// more than one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCycle {
    current: usize,
    count: usize,
}

impl FrameCycle {
    /// Creates a cycle over `count` frames starting at frame 0.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self { current: 0, count }
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether advancing can change the selected frame.
    #[must_use]
    pub fn is_animated(&self) -> bool {
        self.count > 1
    }

    /// Moves to the next frame, returning the new index.
    pub fn advance(&mut self) -> usize {
        if self.is_animated() {
            self.current = (self.current + 1) % self.count;
        }
        self.current
    }

    /// Returns to frame 0.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}
