//! Follow-to-latest scrolling for the transcript pane.
//!
//! The view jumps to the newest item whenever the transcript grows or the
//! loading indicator appears or disappears. Between changes the user may
//! scroll freely. Heights are in wrapped rows, as measured by
//! [`crate::ui::transcript_height`].

#[derive(Debug, Clone, Default)]
pub struct ChatScroll {
    offset: u16,
    content_height: u16,
    viewport_height: u16,
    /// (message count, pending) at the last observation
    seen: Option<(usize, bool)>,
}

impl ChatScroll {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    /// Record the current layout and follow the tail if the transcript changed.
    ///
    /// Returns true when the view was moved to the latest item.
    pub fn observe(
        &mut self,
        message_count: usize,
        pending: bool,
        content_height: u16,
        viewport_height: u16,
    ) -> bool {
        self.content_height = content_height;
        self.viewport_height = viewport_height;

        let snapshot = (message_count, pending);
        let changed = self.seen != Some(snapshot);
        self.seen = Some(snapshot);

        if changed {
            self.scroll_to_bottom();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
        changed
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.offset = self.offset.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.offset = self.offset.saturating_add(rows).min(self.max_offset());
    }

    pub fn page(&self) -> u16 {
        (self.viewport_height / 2).max(1)
    }
}
