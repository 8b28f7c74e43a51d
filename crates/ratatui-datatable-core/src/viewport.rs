/// Scroll position of a viewport over a larger content area, in terminal cells.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewportState {
    pub x: u32,
    pub y: u32,
    pub viewport_w: u16,
    pub viewport_h: u16,
    pub content_w: u32,
    pub content_h: u32,
}

impl ViewportState {
    pub fn set_viewport(&mut self, w: u16, h: u16) {
        self.viewport_w = w;
        self.viewport_h = h;
        self.clamp();
    }

    pub fn set_content(&mut self, w: u32, h: u32) {
        self.content_w = w;
        self.content_h = h;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        self.y = self.y.min(self.max_y());
        self.x = self.x.min(self.max_x());
    }

    pub fn scroll_y_by(&mut self, delta: i32) {
        let next = self.y as i64 + delta as i64;
        self.y = next.clamp(0, self.max_y() as i64) as u32;
    }

    /// Scrolls the minimum amount so that `[top, top + height)` is inside the viewport.
    pub fn ensure_visible_y(&mut self, top: u32, height: u32) {
        let height = height.max(1);
        if top < self.y {
            self.y = top;
        } else {
            let bottom = top.saturating_add(height);
            let view_bottom = self.y.saturating_add(self.viewport_h as u32);
            if bottom > view_bottom {
                self.y = bottom.saturating_sub(self.viewport_h as u32).min(top);
            }
        }
        self.clamp();
    }

    pub fn percent_y(&self) -> Option<u8> {
        if self.content_h == 0 || self.viewport_h == 0 || self.content_h <= self.viewport_h as u32 {
            return None;
        }
        let visible_bottom = self.y.saturating_add(self.viewport_h as u32) as f64;
        let pct = (visible_bottom / self.content_h as f64 * 100.0).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }

    fn max_y(&self) -> u32 {
        self.content_h.saturating_sub(self.viewport_h as u32)
    }

    fn max_x(&self) -> u32 {
        self.content_w.saturating_sub(self.viewport_w as u32)
    }
}
