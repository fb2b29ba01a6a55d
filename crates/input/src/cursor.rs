use glam::Vec2;

/// Relative mouse motion, measured as an offset from a reference point.
///
/// Two feeds are supported. Raw device deltas ([`RelativeCursor::moved_by`])
/// are preferred: once one arrives, absolute positions are ignored and the
/// real cursor no longer needs warping. Until then, absolute positions
/// ([`RelativeCursor::moved_to`]) are measured against the reference and
/// the caller warps the real cursor back after each take. If that warp
/// fails, [`RelativeCursor::anchor_to_last_seen`] moves the reference to
/// where the cursor actually is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeCursor {
    reference: Vec2,
    current: Vec2,
    last_seen: Vec2,
    raw: bool,
}

impl RelativeCursor {
    pub fn new(reference: Vec2) -> Self {
        Self {
            reference,
            current: reference,
            last_seen: reference,
            raw: false,
        }
    }

    pub fn reference(&self) -> Vec2 {
        self.reference
    }

    /// Whether the caller should warp the real cursor back to the reference.
    /// False once raw device motion is driving the offset.
    pub fn needs_warp(&self) -> bool {
        !self.raw
    }

    /// Move the reference point (window resized or recreated). Any motion
    /// not yet taken is discarded.
    pub fn recenter(&mut self, reference: Vec2) {
        self.reference = reference;
        self.current = reference;
        self.last_seen = reference;
    }

    /// Record the latest absolute cursor position.
    pub fn moved_to(&mut self, position: Vec2) {
        self.last_seen = position;
        if !self.raw {
            self.current = position;
        }
    }

    /// Accumulate a raw device delta. Switches to raw motion for good.
    pub fn moved_by(&mut self, delta: Vec2) {
        if !self.raw {
            self.raw = true;
            self.current = self.reference;
        }
        self.current += delta;
    }

    /// The real cursor could not be warped back: measure the next offsets
    /// from its last known position instead.
    pub fn anchor_to_last_seen(&mut self) {
        if !self.raw {
            self.reference = self.last_seen;
            self.current = self.last_seen;
        }
    }

    /// Offset since the last take; the tracked cursor snaps back to the
    /// reference.
    pub fn take_offset(&mut self) -> Vec2 {
        let offset = self.current - self.reference;
        self.current = self.reference;
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_relative_to_reference() {
        let mut cursor = RelativeCursor::new(Vec2::new(320.0, 240.0));
        cursor.moved_to(Vec2::new(330.0, 235.0));
        assert_eq!(cursor.take_offset(), Vec2::new(10.0, -5.0));
        assert_eq!(cursor.take_offset(), Vec2::ZERO);
    }

    #[test]
    fn only_latest_position_counts() {
        let mut cursor = RelativeCursor::new(Vec2::ZERO);
        cursor.moved_to(Vec2::new(4.0, 4.0));
        cursor.moved_to(Vec2::new(1.0, -2.0));
        assert_eq!(cursor.take_offset(), Vec2::new(1.0, -2.0));
    }

    #[test]
    fn recenter_drops_pending_motion() {
        let mut cursor = RelativeCursor::new(Vec2::ZERO);
        cursor.moved_to(Vec2::new(50.0, 50.0));
        cursor.recenter(Vec2::new(100.0, 100.0));
        assert_eq!(cursor.reference(), Vec2::new(100.0, 100.0));
        assert_eq!(cursor.take_offset(), Vec2::ZERO);
    }

    #[test]
    fn raw_motion_accumulates_and_ignores_positions() {
        let mut cursor = RelativeCursor::new(Vec2::new(320.0, 240.0));
        cursor.moved_by(Vec2::new(3.0, -1.0));
        cursor.moved_to(Vec2::new(0.0, 0.0));
        cursor.moved_by(Vec2::new(2.0, 4.0));
        assert!(!cursor.needs_warp());
        assert_eq!(cursor.take_offset(), Vec2::new(5.0, 3.0));
        assert_eq!(cursor.take_offset(), Vec2::ZERO);
    }

    #[test]
    fn raw_motion_drops_earlier_absolute_offset() {
        let mut cursor = RelativeCursor::new(Vec2::new(320.0, 240.0));
        cursor.moved_to(Vec2::new(300.0, 100.0));
        cursor.moved_by(Vec2::new(1.0, 0.0));
        assert_eq!(cursor.take_offset(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn failed_warp_measures_from_real_position() {
        // The cursor sits far from the reference and cannot be warped.
        let mut cursor = RelativeCursor::new(Vec2::new(320.0, 240.0));
        cursor.moved_to(Vec2::new(300.0, 100.0));
        cursor.take_offset();
        cursor.anchor_to_last_seen();
        assert_eq!(cursor.reference(), Vec2::new(300.0, 100.0));

        // One pixel of motion is one pixel of offset.
        cursor.moved_to(Vec2::new(301.0, 100.0));
        assert_eq!(cursor.take_offset(), Vec2::new(1.0, 0.0));
        cursor.anchor_to_last_seen();
        cursor.moved_to(Vec2::new(301.0, 99.0));
        assert_eq!(cursor.take_offset(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn anchoring_is_ignored_under_raw_motion() {
        let mut cursor = RelativeCursor::new(Vec2::new(10.0, 10.0));
        cursor.moved_by(Vec2::new(1.0, 1.0));
        cursor.moved_to(Vec2::new(50.0, 50.0));
        cursor.anchor_to_last_seen();
        assert_eq!(cursor.reference(), Vec2::new(10.0, 10.0));
        assert_eq!(cursor.take_offset(), Vec2::new(1.0, 1.0));
    }
}
