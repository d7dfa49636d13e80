use ratatui::layout::Rect;
use crate::client::AnswerService;
use crate::controller::ConversationController;
use crate::conversation::SUGGESTION_TOPICS;
use crate::render::MarkdownRenderer;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Terminal-side state wrapped around the conversation controller.
///
/// Nothing here feeds back into the conversation except through the
/// controller's own operations.
pub struct App<S> {
    pub should_quit: bool,
    pub controller: ConversationController<S>,
    pub renderer: MarkdownRenderer,
    pub api_url: String,

    /// Cursor position in the pending input, in chars
    pub cursor: usize,

    // Chat scrolling
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16,
    pub chat_width: u16,
    pub total_chat_lines: u16,

    /// Suggestion last applied with Tab
    pub suggestion_idx: Option<usize>,
    pub animation_frame: u8,

    // Areas from the last draw, for mouse hit-testing
    pub suggestion_areas: Vec<Rect>,
    pub send_area: Option<Rect>,
    pub chat_area: Option<Rect>,
}

impl<S: AnswerService + 'static> App<S> {
    pub fn new(service: S, api_url: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            controller: ConversationController::new(service),
            renderer: MarkdownRenderer,
            api_url: api_url.into(),
            cursor: 0,
            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_width: 0,
            total_chat_lines: 0,
            suggestion_idx: None,
            animation_frame: 0,
            suggestion_areas: Vec::new(),
            send_area: None,
            chat_area: None,
        }
    }

    pub fn input(&self) -> &str {
        self.controller.state().pending_input()
    }

    /// Submit the pending input. The cursor resets only when the controller
    /// actually took the text.
    pub fn submit(&mut self) {
        if self.controller.submit(None) {
            self.cursor = 0;
            self.suggestion_idx = None;
            self.follow_bottom = true;
        }
    }

    pub fn apply_suggestion(&mut self, idx: usize) {
        if let Some(topic) = SUGGESTION_TOPICS.get(idx) {
            self.controller.apply_suggestion(topic);
            self.cursor = topic.chars().count();
            self.suggestion_idx = Some(idx);
        }
    }

    pub fn next_suggestion(&mut self) {
        let next = match self.suggestion_idx {
            Some(i) => (i + 1) % SUGGESTION_TOPICS.len(),
            None => 0,
        };
        self.apply_suggestion(next);
    }

    pub fn insert_char(&mut self, c: char) {
        let mut text = self.input().to_string();
        let byte_pos = char_to_byte_index(&text, self.cursor);
        text.insert(byte_pos, c);
        self.controller.update_input(text);
        self.cursor += 1;
    }

    /// Insert pasted text at the cursor; line endings become `\n` and never submit.
    pub fn insert_str(&mut self, pasted: &str) {
        let pasted = pasted.replace("\r\n", "\n").replace('\r', "\n");
        let mut text = self.input().to_string();
        let byte_pos = char_to_byte_index(&text, self.cursor);
        text.insert_str(byte_pos, &pasted);
        self.controller.update_input(text);
        self.cursor += pasted.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut text = self.input().to_string();
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&text, self.cursor);
        text.remove(byte_pos);
        self.controller.update_input(text);
    }

    pub fn delete(&mut self) {
        let mut text = self.input().to_string();
        if self.cursor < text.chars().count() {
            let byte_pos = char_to_byte_index(&text, self.cursor);
            text.remove(byte_pos);
            self.controller.update_input(text);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input().chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input().chars().count();
    }

    /// (row, column) of the cursor inside the multi-line input
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before: String = self.input().chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);
        (row, col)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        if self.chat_scroll >= max {
            self.follow_bottom = true;
        }
    }

    pub fn max_scroll(&self) -> u16 {
        self.total_chat_lines.saturating_sub(self.chat_height)
    }

    /// Called after layout; keeps the newest message in view unless the
    /// user scrolled away.
    pub fn update_chat_metrics(&mut self, total_lines: u16, height: u16, width: u16) {
        self.total_chat_lines = total_lines;
        self.chat_height = height;
        self.chat_width = width;
        if self.follow_bottom {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }

    /// Advance the typing indicator and fold in a finished request.
    pub async fn tick(&mut self) {
        let was_loading = self.controller.state().is_loading();
        self.controller.poll().await;

        if self.controller.state().is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else if was_loading {
            self.animation_frame = 0;
            self.follow_bottom = true;
        }
    }
}
