use std::sync::Arc;
use ratatui::layout::Rect;
use companion_core::{MessagingClient, Session, Submission};
use crate::scroll::ChatScroll;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation
    pub session: Session,
    pub input_cursor: usize, // cursor position in the session input, in chars

    // Transcript view
    pub scroll: ChatScroll,
    pub chat_area: Option<Rect>, // updated on every frame for mouse hit-testing

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Shown in the header
    pub backend_label: String,
}

impl App {
    pub fn new(client: Arc<dyn MessagingClient>, backend_label: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session: Session::new(client),
            input_cursor: 0,
            scroll: ChatScroll::default(),
            chat_area: None,
            animation_frame: 0,
            backend_label: backend_label.into(),
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else {
            self.animation_frame = 0;
        }
    }

    /// Send whatever is in the input box. Blank input or a request already
    /// in flight leaves everything as it was.
    pub fn submit_input(&mut self) -> Submission {
        let submission = self.session.submit();
        if submission == Submission::Sent {
            self.input_cursor = 0;
            self.animation_frame = 0;
        }
        submission
    }

    /// Lay out the transcript for a frame of `area` and follow the latest
    /// message if the transcript changed since the last frame.
    pub fn fit_to(&mut self, area: Rect) {
        let chat_area = ui::layout(area).chat;
        let inner_width = chat_area.width.saturating_sub(2);
        let inner_height = chat_area.height.saturating_sub(2);

        let content_height = ui::transcript_height(self, inner_width);

        self.chat_area = Some(chat_area);
        self.scroll.observe(
            self.session.messages().len(),
            self.session.is_pending(),
            content_height,
            inner_height,
        );
    }
}
