/// Zoom change per mouse wheel notch.
pub const ZOOM_STEP: f64 = 0.1;

/// Pan and zoom applied when the world surface is composited onto the
/// window. Written by the input handler, read by the world view.
///
/// Neither offset nor scale is bounded: scrolling down far enough yields a
/// zero or negative scale, which simply hides the world surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub offset_x: i32,
    pub offset_y: i32,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            offset_x: 250,
            offset_y: 250,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl ViewState {
    pub fn zoom_in(&mut self) {
        self.scale_x += ZOOM_STEP;
        self.scale_y += ZOOM_STEP;
    }

    pub fn zoom_out(&mut self) {
        self.scale_x -= ZOOM_STEP;
        self.scale_y -= ZOOM_STEP;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Size of `base` after zoom, truncated toward zero. Either component
    /// may be zero or negative.
    pub fn scaled_size(&self, base: (u32, u32)) -> (i32, i32) {
        (
            (base.0 as f64 * self.scale_x) as i32,
            (base.1 as f64 * self.scale_y) as i32,
        )
    }
}
