use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Turns answer text into styled terminal lines.
pub trait AnswerRenderer {
    fn render(&self, content: &str) -> Vec<Line<'static>>;
}

/// Markdown (CommonMark + GFM tables) renderer.
///
/// Raw HTML is shown as literal text; nothing in the answer is interpreted
/// beyond markdown structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl AnswerRenderer for MarkdownRenderer {
    fn render(&self, content: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut out = LineBuilder::default();
        for event in Parser::new_ext(content, options) {
            out.push_event(event);
        }
        out.finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<Vec<Span<'static>>>>,
    current_row: Vec<Vec<Span<'static>>>,
    current_cell: Vec<Span<'static>>,
    header_rows: usize,
}

impl TableBuilder {
    fn end_cell(&mut self) {
        self.current_row.push(std::mem::take(&mut self.current_cell));
    }

    fn end_row(&mut self, header: bool) {
        if !self.current_row.is_empty() {
            self.rows.push(std::mem::take(&mut self.current_row));
            if header {
                self.header_rows = self.rows.len();
            }
        }
    }

    fn render(self) -> Vec<Line<'static>> {
        let columns = self.rows.iter().map(|row| row.len()).max().unwrap_or(0);
        if columns == 0 {
            return Vec::new();
        }

        let mut widths = vec![3usize; columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell_width(cell));
            }
        }

        let border = Style::default().fg(Color::DarkGray);
        let mut lines = vec![Line::from(Span::styled(rule(&widths, '┌', '┬', '┐'), border))];

        for (r, row) in self.rows.into_iter().enumerate() {
            let is_header = r < self.header_rows;
            let mut spans = vec![Span::styled("│", border)];
            let mut cells = row.into_iter();
            for width in &widths {
                let cell = cells.next().unwrap_or_default();
                let pad = width.saturating_sub(cell_width(&cell));
                spans.push(Span::raw(" "));
                for span in cell {
                    if is_header {
                        let style = span.style.add_modifier(Modifier::BOLD);
                        spans.push(Span::styled(span.content, style));
                    } else {
                        spans.push(span);
                    }
                }
                spans.push(Span::raw(" ".repeat(pad + 1)));
                spans.push(Span::styled("│", border));
            }
            lines.push(Line::from(spans));

            if is_header && r + 1 == self.header_rows {
                lines.push(Line::from(Span::styled(rule(&widths, '├', '┼', '┤'), border)));
            }
        }

        lines.push(Line::from(Span::styled(rule(&widths, '└', '┴', '┘'), border)));
        lines
    }
}

fn cell_width(cell: &[Span<'_>]) -> usize {
    cell.iter().map(|span| span.content.width()).sum()
}

fn rule(widths: &[usize], left: char, mid: char, right: char) -> String {
    let mut s = String::new();
    s.push(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            s.push(mid);
        }
        s.push_str(&"─".repeat(width + 2));
    }
    s.push(right);
    s
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<ListKind>,
    quote_depth: usize,
    code_block: bool,
    table: Option<TableBuilder>,
    in_table_head: bool,
    link_targets: Vec<String>,
}

impl Default for LineBuilder {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            styles: vec![Style::default()],
            lists: Vec::new(),
            quote_depth: 0,
            code_block: false,
            table: None,
            in_table_head: false,
            link_targets: Vec::new(),
        }
    }
}

impl LineBuilder {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, f: impl FnOnce(Style) -> Style) {
        let next = f(self.style());
        self.styles.push(next);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn push_span(&mut self, span: Span<'static>) {
        if let Some(table) = self.table.as_mut() {
            table.current_cell.push(span);
            return;
        }
        if self.spans.is_empty() && self.quote_depth > 0 {
            self.spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        self.spans.push(span);
    }

    fn push_text(&mut self, text: &str) {
        let style = self.style();
        self.push_span(Span::styled(detab(text), style));
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    /// Blank separator between blocks, never doubled and never leading.
    fn gap(&mut self) {
        self.flush();
        if self.lists.is_empty()
            && self.lines.last().map(|l| l.width() > 0).unwrap_or(false)
        {
            self.lines.push(Line::default());
        }
    }

    fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.code_block {
                    let style = Style::default().fg(Color::Green);
                    for line in text.lines() {
                        self.push_span(Span::styled(format!("  {}", detab(line)), style));
                        self.flush();
                    }
                } else {
                    self.push_text(&text);
                }
            }
            Event::Code(code) => {
                let style = Style::default().fg(Color::Green).bg(Color::Black);
                self.push_span(Span::styled(detab(&code), style));
            }
            Event::Html(html) => {
                let style = Style::default().fg(Color::DarkGray);
                for line in html.lines() {
                    self.push_span(Span::styled(line.to_string(), style));
                    self.flush();
                }
            }
            Event::InlineHtml(html) => {
                self.push_span(Span::styled(
                    html.to_string(),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.gap();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(24),
                    Style::default().fg(Color::DarkGray),
                )));
                self.lines.push(Line::default());
            }
            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { .. } => {
                self.gap();
                self.push_style(|s| s.fg(Color::Cyan).add_modifier(Modifier::BOLD));
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth += 1;
                self.push_style(|s| s.add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.gap();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(Line::from(Span::styled(
                            format!("  {}", lang),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                }
                self.code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.gap();
                } else {
                    self.flush();
                }
                self.lists.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{}{}. ", indent, n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{}• ", indent),
                };
                self.push_span(Span::styled(marker, Style::default().fg(Color::Yellow)));
            }
            Tag::Emphasis => self.push_style(|s| s.add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(|s| s.add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(|s| s.add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                self.link_targets.push(dest_url.to_string());
                self.push_style(|s| s.fg(Color::Blue).add_modifier(Modifier::UNDERLINED));
            }
            Tag::Table(_) => {
                self.gap();
                self.table = Some(TableBuilder::default());
            }
            Tag::TableHead => self.in_table_head = true,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.gap();
                } else {
                    self.flush();
                }
            }
            TagEnd::Heading(_) => {
                self.pop_style();
                self.gap();
            }
            TagEnd::BlockQuote => {
                self.pop_style();
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    self.gap();
                }
            }
            TagEnd::CodeBlock => {
                self.code_block = false;
                self.gap();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.gap();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_targets.pop() {
                    if !url.is_empty() {
                        self.push_span(Span::styled(
                            format!(" ({})", url),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.end_cell();
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.end_row(true);
                }
                self.in_table_head = false;
            }
            TagEnd::TableRow => {
                let header = self.in_table_head;
                if let Some(table) = self.table.as_mut() {
                    table.end_row(header);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.lines.extend(table.render());
                }
                self.gap();
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().map(|l| l.width() == 0).unwrap_or(false) {
            self.lines.pop();
        }
        self.lines
    }
}

fn detab(s: &str) -> String {
    s.replace('\t', "    ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_plain_paragraphs_separated_by_blank_line() {
        let lines = MarkdownRenderer.render("First paragraph.\n\nSecond one.");
        assert_eq!(plain(&lines), vec!["First paragraph.", "", "Second one."]);
    }

    #[test]
    fn test_strong_and_emphasis_are_styled() {
        let lines = MarkdownRenderer.render("Merge sort is **stable** and *recursive*.");
        assert_eq!(lines.len(), 1);
        let bold = lines[0].spans.iter().find(|s| s.content == "stable").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let italic = lines[0].spans.iter().find(|s| s.content == "recursive").unwrap();
        assert!(italic.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_lists_get_markers() {
        let lines = MarkdownRenderer.render("- divide\n- conquer\n\n1. split\n2. merge");
        let text = plain(&lines);
        assert!(text.contains(&"• divide".to_string()));
        assert!(text.contains(&"• conquer".to_string()));
        assert!(text.contains(&"1. split".to_string()));
        assert!(text.contains(&"2. merge".to_string()));
    }

    #[test]
    fn test_table_is_box_drawn() {
        let md = "| Algorithm | Worst case |\n|---|---|\n| Merge sort | O(n log n) |\n| Insertion sort | O(n^2) |";
        let lines = MarkdownRenderer.render(md);
        let text = plain(&lines);

        assert_eq!(text.len(), 6);
        assert!(text[0].starts_with('┌'));
        assert!(text[1].contains("Algorithm"));
        assert!(text[2].starts_with('├'));
        assert!(text[3].contains("Merge sort"));
        assert!(text[4].contains("Insertion sort"));
        assert!(text[5].starts_with('└'));

        // Every row is padded to the same display width
        let widths: Vec<usize> = lines.iter().map(|l| l.width()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn test_header_cells_are_bold() {
        let lines = MarkdownRenderer.render("| Name |\n|---|\n| heap |");
        let header = lines[1].spans.iter().find(|s| s.content == "Name").unwrap();
        assert!(header.style.add_modifier.contains(Modifier::BOLD));
        let body = lines[3].spans.iter().find(|s| s.content == "heap").unwrap();
        assert!(!body.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_html_is_shown_literally() {
        let lines = MarkdownRenderer.render("before <script>alert(1)</script> after");
        let text = plain(&lines).join("\n");
        assert!(text.contains("<script>"));
        assert!(text.contains("alert(1)"));
    }

    #[test]
    fn test_code_block_keeps_lines() {
        let lines = MarkdownRenderer.render("```python\ndef f(n):\n\treturn n\n```");
        let text = plain(&lines);
        assert_eq!(text, vec!["  python", "  def f(n):", "      return n"]);
    }

    #[test]
    fn test_link_shows_target() {
        let lines = MarkdownRenderer.render("See [CLRS](https://example.com).");
        assert_eq!(plain(&lines), vec!["See CLRS (https://example.com)."]);
    }

    #[test]
    fn test_empty_content_renders_nothing() {
        assert!(MarkdownRenderer.render("").is_empty());
        assert!(MarkdownRenderer.render("\n\n").is_empty());
    }

    #[test]
    fn test_renderer_is_stateless() {
        let renderer = MarkdownRenderer;
        let first = renderer.render("**a**");
        let _ = renderer.render("| x |\n|---|\n| y |");
        assert_eq!(renderer.render("**a**"), first);
    }
}
