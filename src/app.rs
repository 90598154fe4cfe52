use ratatui::layout::Rect;

use crate::answer::AnswerClient;
use crate::session::{ChatSession, Message, SessionObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Checking,
    Online,
    Offline,
}

/// Keeps the transcript view pinned to the newest message.
///
/// The renderer reports the wrapped height of the transcript on every draw;
/// session changes re-attach the view so the next layout lands on the bottom.
#[derive(Debug, Default)]
pub struct ScrollFollower {
    total_lines: u16,
    height: u16,
    offset: u16,
    detached: bool,
}

impl ScrollFollower {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Record the rendered line count and visible height of the transcript
    /// pane (updated during render).
    pub fn set_layout(&mut self, total_lines: u16, height: u16) {
        self.total_lines = total_lines;
        self.height = height;

        if self.detached {
            self.offset = self.offset.min(self.max_offset());
            self.detached = self.offset < self.max_offset();
        } else {
            self.stick_to_bottom();
        }
    }

    pub fn max_offset(&self) -> u16 {
        self.total_lines.saturating_sub(self.height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.offset = self.offset.saturating_sub(lines);
        self.detached = self.offset < self.max_offset();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.offset = self.offset.saturating_add(lines).min(self.max_offset());
        self.detached = self.offset < self.max_offset();
    }

    fn stick_to_bottom(&mut self) {
        self.offset = self.max_offset();
        self.detached = false;
    }
}

impl SessionObserver for ScrollFollower {
    fn on_change(&mut self, _transcript: &[Message], _awaiting_reply: bool) {
        self.stick_to_bottom();
    }
}

pub struct App {
    pub should_quit: bool,
    pub session: ChatSession<ScrollFollower>,
    /// Cursor position in the input, in characters
    pub cursor: usize,
    pub client: AnswerClient,
    pub service_status: ServiceStatus,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transcript pane area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(client: AnswerClient) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::with_observer(ScrollFollower::default()),
            cursor: 0,
            client,
            service_status: ServiceStatus::Checking,
            animation_frame: 0,
            chat_area: None,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Typing is disabled while a reply is outstanding.
    pub fn input_locked(&self) -> bool {
        self.session.is_awaiting_reply()
    }

    pub fn can_send(&self) -> bool {
        !self.input_locked() && !self.session.pending_input().trim().is_empty()
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.session.observer_mut().scroll_up(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.session.observer_mut().scroll_down(lines);
    }

    pub fn scroll_page_up(&mut self) {
        let page = self.page_size();
        self.scroll_up(page);
    }

    pub fn scroll_page_down(&mut self) {
        let page = self.page_size();
        self.scroll_down(page);
    }

    fn page_size(&self) -> u16 {
        self.chat_area
            .map(|area| area.height.saturating_sub(2) / 2)
            .unwrap_or(10)
            .max(1)
    }
}
