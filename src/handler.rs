use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::App;
use crate::client::AnswerService;
use crate::tui::AppEvent;

pub async fn handle_event<S: AnswerService + 'static>(app: &mut App<S>, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => app.insert_str(&text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick().await,
    }
}

/// Enter with no modifier sends; any modified Enter inserts a line break.
pub fn is_submit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter && key.modifiers == KeyModifiers::NONE
}

fn handle_key<S: AnswerService + 'static>(app: &mut App<S>, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if is_submit_key(&key) {
        app.submit();
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.insert_char('\n'),
        // Ctrl+J is how many terminals deliver Shift+Enter without enhancement flags
        KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.insert_char('\n')
        }
        KeyCode::Tab => {
            if app.controller.view().is_empty_welcome_view {
                app.next_suggestion();
            }
        }
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(2) / 2),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(2) / 2),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.insert_char(c)
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse<S: AnswerService + 'static>(app: &mut App<S>, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.send_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false) {
                app.submit();
                return;
            }
            let clicked = app
                .suggestion_areas
                .iter()
                .position(|r| point_in_rect(x, y, *r));
            if let Some(idx) = clicked {
                app.apply_suggestion(idx);
            }
        }
        MouseEventKind::ScrollDown if in_chat => app.scroll_down(3),
        MouseEventKind::ScrollUp if in_chat => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AskError, AskResponse};
    use crate::conversation::SUGGESTION_TOPICS;
    use crossterm::event::{KeyEventKind, KeyEventState};

    struct Echo;

    #[async_trait::async_trait]
    impl AnswerService for Echo {
        async fn ask(&self, query: &str, _k: usize) -> Result<AskResponse, AskError> {
            Ok(AskResponse::new(query, Vec::new()))
        }
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn click(column: u16, row: u16) -> AppEvent {
        AppEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    async fn type_text(app: &mut App<Echo>, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c), KeyModifiers::NONE)).await;
        }
    }

    #[tokio::test]
    async fn test_enter_submits_and_shift_enter_inserts_newline() {
        let mut app = App::new(Echo, "http://test");
        type_text(&mut app, "line one").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::SHIFT)).await;
        type_text(&mut app, "line two").await;

        assert_eq!(app.input(), "line one\nline two");
        assert!(app.controller.state().history().is_empty());

        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await;
        let history = app.controller.state().history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "line one\nline two");

        app.controller.wait_settled().await;
        assert_eq!(app.controller.state().history().len(), 2);
    }

    #[tokio::test]
    async fn test_alt_enter_does_not_submit() {
        let mut app = App::new(Echo, "http://test");
        type_text(&mut app, "q").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::ALT)).await;
        assert_eq!(app.input(), "q\n");
        assert!(app.controller.state().history().is_empty());
    }

    #[tokio::test]
    async fn test_tab_applies_suggestions_only_on_welcome() {
        let mut app = App::new(Echo, "http://test");
        handle_event(&mut app, key(KeyCode::Tab, KeyModifiers::NONE)).await;
        assert_eq!(app.input(), SUGGESTION_TOPICS[0]);

        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await;
        app.controller.wait_settled().await;

        handle_event(&mut app, key(KeyCode::Tab, KeyModifiers::NONE)).await;
        assert_eq!(app.input(), "");
    }

    #[tokio::test]
    async fn test_clicks_hit_suggestions_and_send() {
        let mut app = App::new(Echo, "http://test");
        app.suggestion_areas = vec![Rect::new(0, 5, 30, 1), Rect::new(0, 6, 30, 1)];
        app.send_area = Some(Rect::new(70, 20, 6, 1));

        handle_event(&mut app, click(10, 6)).await;
        assert_eq!(app.input(), SUGGESTION_TOPICS[1]);
        assert!(app.controller.state().history().is_empty());

        handle_event(&mut app, click(72, 20)).await;
        assert_eq!(app.controller.state().history().len(), 1);
        assert_eq!(app.controller.state().history()[0].content, SUGGESTION_TOPICS[1]);
    }

    #[tokio::test]
    async fn test_multi_line_paste_does_not_submit() {
        let mut app = App::new(Echo, "http://test");
        handle_event(&mut app, AppEvent::Paste("first line\r\nsecond line".to_string())).await;

        assert_eq!(app.input(), "first line\nsecond line");
        assert!(app.controller.state().history().is_empty());
        assert!(!app.controller.state().is_loading());

        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await;
        assert_eq!(app.controller.state().history()[0].content, "first line\nsecond line");
        app.controller.wait_settled().await;
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = App::new(Echo, "http://test");
        handle_event(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL)).await;
        assert!(app.should_quit);

        let mut app = App::new(Echo, "http://test");
        handle_event(&mut app, key(KeyCode::Esc, KeyModifiers::NONE)).await;
        assert!(app.should_quit);
        assert_eq!(app.input(), "");
    }
}
