use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use crate::app::App;
use crate::client::AnswerService;
use crate::conversation::{ConversationView, Message, Role, SUGGESTION_TOPICS};
use crate::render::AnswerRenderer;

const GREETING: &str = "Hello!";
const SUB_GREETING: &str = "What do you need help in?";
const DISCLAIMER: &str =
    "Agent may display inaccurate info, including about people, so double-check its responses.";
const PLACEHOLDER: &str = "Enter your question here";

/// Inner rows the input box may grow to before it scrolls
const MAX_INPUT_ROWS: u16 = 6;

pub fn render<S: AnswerService + 'static>(app: &mut App<S>, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.controller.view().is_empty_welcome_view {
        render_welcome(app, frame, body_area);
    } else {
        app.suggestion_areas.clear();
        render_chat(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header<S>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Ask ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.api_url.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer<S: AnswerService + 'static>(app: &App<S>, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" Shift+Enter ", key_style),
        Span::styled(" newline ", label_style),
    ];

    if app.controller.view().is_empty_welcome_view {
        hints.extend([
            Span::styled(" Tab ", key_style),
            Span::styled(" suggestion ", label_style),
        ]);
    } else {
        hints.extend([
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
        ]);
    }

    hints.extend([
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_welcome<S: AnswerService + 'static>(app: &mut App<S>, frame: &mut Frame, area: Rect) {
    let input_height = input_box_height(app.input());
    let suggestions = SUGGESTION_TOPICS.len() as u16;

    let [_, greeting_area, sub_area, _, suggestions_area, _, input_area, disclaimer_area, _] =
        Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(suggestions),
            Constraint::Length(1),
            Constraint::Length(input_height),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);

    let [_, column, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Max(80),
        Constraint::Fill(1),
    ])
    .areas(Rect::new(area.x, area.y, area.width, 1));

    let centered = |r: Rect| Rect::new(column.x, r.y, column.width, r.height);

    frame.render_widget(
        Paragraph::new(GREETING)
            .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        centered(greeting_area),
    );
    frame.render_widget(
        Paragraph::new(SUB_GREETING)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center),
        centered(sub_area),
    );

    let suggestions_area = centered(suggestions_area);
    app.suggestion_areas.clear();
    for (i, topic) in SUGGESTION_TOPICS.iter().enumerate() {
        let row = Rect::new(
            suggestions_area.x,
            suggestions_area.y + i as u16,
            suggestions_area.width,
            1,
        );
        if row.y >= suggestions_area.y + suggestions_area.height {
            break;
        }
        let selected = app.suggestion_idx == Some(i);
        let style = if selected {
            Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let marker = if selected { "> " } else { "  " };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(format!("{}{}", marker, topic), style))),
            row,
        );
        app.suggestion_areas.push(row);
    }

    render_input(app, frame, centered(input_area));

    frame.render_widget(
        Paragraph::new(DISCLAIMER)
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center),
        centered(disclaimer_area),
    );
}

fn render_chat<S: AnswerService + 'static>(app: &mut App<S>, frame: &mut Frame, area: Rect) {
    let input_height = input_box_height(app.input());
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_height),
    ])
    .areas(area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");
    let inner = chat_block.inner(chat_area);

    let lines = conversation_lines(
        &app.controller.view(),
        &app.renderer,
        app.animation_frame,
    );
    // Count rows with the same word wrapping the widget draws with
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let total = chat.line_count(inner.width.max(1)).min(u16::MAX as usize) as u16;
    app.chat_area = Some(chat_area);
    app.update_chat_metrics(total, inner.height, inner.width);

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    if app.max_scroll() > 0 {
        let mut scrollbar_state = ScrollbarState::new(app.max_scroll() as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            chat_area,
            &mut scrollbar_state,
        );
    }

    render_input(app, frame, input_area);
}

fn render_input<S: AnswerService + 'static>(app: &mut App<S>, frame: &mut Frame, area: Rect) {
    let loading = app.controller.view().is_awaiting_response;

    let [box_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(8),
    ])
    .areas(area);

    let border_color = if loading { Color::DarkGray } else { Color::Yellow };
    let title = if loading { " Waiting for answer… " } else { " Ask " };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);
    let inner = input_block.inner(box_area);

    let (row, col) = app.cursor_row_col();
    let row_offset = (row as u16).saturating_sub(inner.height.saturating_sub(1));
    let col_offset = if inner.width == 0 {
        0
    } else {
        (col as u16).saturating_sub(inner.width.saturating_sub(1))
    };

    let input = if app.input().is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let style = if loading {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Paragraph::new(app.input().to_string())
            .style(style)
            .scroll((row_offset, col_offset))
    };
    frame.render_widget(input.block(input_block), box_area);

    let send_style = if loading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };
    frame.render_widget(
        Paragraph::new(Span::styled("send", send_style))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(send_style)),
        send_area,
    );
    app.send_area = Some(send_area);

    if !loading && inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position((
            inner.x + (col as u16 - col_offset).min(inner.width - 1),
            inner.y + (row as u16 - row_offset).min(inner.height - 1),
        ));
    }
}

/// Box height for the current input: grows with its lines, bordered.
fn input_box_height(input: &str) -> u16 {
    let rows = input.split('\n').count().max(1) as u16;
    rows.min(MAX_INPUT_ROWS) + 2
}

/// Every line of the chat pane, oldest message first, followed by the
/// typing indicator while a request is in flight.
pub fn conversation_lines(
    view: &ConversationView<'_>,
    renderer: &dyn AnswerRenderer,
    animation_frame: u8,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for message in view.messages {
        lines.extend(message_lines(message, renderer));
        lines.push(Line::default());
    }

    if view.is_awaiting_response {
        lines.push(assistant_label());
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize % 3) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn assistant_label() -> Line<'static> {
    Line::from(Span::styled(
        "Agent:",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

fn message_lines(message: &Message, renderer: &dyn AnswerRenderer) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match message.role {
        Role::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            for line in message.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Role::Assistant if message.is_error => {
            lines.push(assistant_label());
            lines.push(Line::from(Span::styled(
                message.content.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        Role::Assistant => {
            lines.push(assistant_label());
            lines.extend(renderer.render(&message.content));
        }
    }

    if !message.sources.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "📖 Sources",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )));
        for source in &message.sources {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("Page {}", source.page),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
        }
    }

    lines
}
