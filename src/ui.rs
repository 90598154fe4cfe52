use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use crate::app::{App, ServiceStatus};
use crate::session::Sender;

const PLACEHOLDER: &str = "Ask about projects, skills, experience...";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
                if found_close {
                    current_text.push_str("**");
                }
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = match app.service_status {
        ServiceStatus::Checking => Span::styled("○ connecting", Style::default().fg(Color::Gray)),
        ServiceStatus::Online => Span::styled("● online", Style::default().fg(Color::Green)),
        ServiceStatus::Offline => Span::styled("● offline", Style::default().fg(Color::Red)),
    };

    let title = Line::from(vec![
        Span::styled(" Nova ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Your AI guide to Chetanya's profile ", Style::default().fg(Color::White)),
        status,
        Span::styled(
            format!(" {} ", app.client.endpoint()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let label_style = |color: Color| Style::default().fg(color).add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in app.session.transcript() {
        match msg.sender {
            Sender::User => {
                lines.push(Line::from(Span::styled("You:", label_style(Color::Cyan))));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Sender::Bot => {
                lines.push(Line::from(Span::styled("Nova:", label_style(Color::Yellow))));
                for line in msg.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.session.is_awaiting_reply() {
        lines.push(Line::from(Span::styled("Nova:", label_style(Color::Yellow))));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });

    // Measure with the same wrapping the pane draws with (inner size minus borders)
    let rendered_lines = chat.line_count(area.width.saturating_sub(2));
    let follower = app.session.observer_mut();
    follower.set_layout(
        u16::try_from(rendered_lines).unwrap_or(u16::MAX),
        area.height.saturating_sub(2),
    );
    let offset = follower.offset();
    let max_offset = follower.max_offset();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let chat = chat.block(block).scroll((offset, 0));

    frame.render_widget(chat, area);

    if max_offset > 0 {
        let mut scrollbar_state = ScrollbarState::new(max_offset as usize).position(offset as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let locked = app.input_locked();

    let (border_color, title) = if locked {
        (Color::DarkGray, " Waiting for reply ")
    } else {
        (Color::Yellow, " Ask ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let input_text = app.session.pending_input();

    if input_text.is_empty() {
        let placeholder = Paragraph::new(Span::styled(
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
        .block(input_block);
        frame.render_widget(placeholder, area);
    } else {
        // Calculate visible portion of input with horizontal scrolling
        // Inner width = total width - 2 (for borders)
        let inner_width = area.width.saturating_sub(2) as usize;
        let cursor_pos = app.cursor.min(input_text.chars().count());

        // Calculate scroll offset to keep cursor visible
        let scroll_offset = if inner_width == 0 {
            0
        } else if cursor_pos >= inner_width {
            cursor_pos - inner_width + 1
        } else {
            0
        };

        // Get the visible slice of the input
        let visible_text: String = input_text
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();

        let text_color = if locked { Color::DarkGray } else { Color::Cyan };
        let input = Paragraph::new(visible_text)
            .style(Style::default().fg(text_color))
            .block(input_block);
        frame.render_widget(input, area);
    }

    // Show cursor only while typing is allowed
    if !locked {
        let cursor_pos = app.cursor.min(input_text.chars().count());
        let inner_width = area.width.saturating_sub(2) as usize;
        let visible_cursor = if inner_width > 0 && cursor_pos >= inner_width {
            inner_width - 1
        } else {
            cursor_pos
        };
        frame.set_cursor_position((area.x + visible_cursor as u16 + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let (mode_text, mode_style) = if app.input_locked() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut hints = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", if app.can_send() { label_style } else { disabled_style }),
        Span::styled(" ↑/↓ PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
    ];

    if app.session.observer().is_detached() {
        hints.push(Span::styled(" (scrolled back) ", disabled_style));
    }

    hints.extend(vec![
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::AnswerClient;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn test_app() -> App {
        App::new(AnswerClient::new("http://127.0.0.1:5000/query".parse().unwrap()))
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("He used **Rust** daily");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "Rust");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("a **b");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a **b");
    }

    #[test]
    fn test_parse_markdown_single_star_is_literal() {
        let line = parse_markdown_line("5 * 3");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "5 * 3");
    }

    #[test]
    fn test_render_shows_greeting_and_placeholder() {
        let mut app = test_app();
        let screen = rendered(&mut app, 100, 20);
        assert!(screen.contains("Welcome to Nova!"));
        assert!(screen.contains(PLACEHOLDER));
        assert!(screen.contains("connecting"));
    }

    #[test]
    fn test_render_shows_thinking_while_awaiting() {
        let mut app = test_app();
        app.session.update_input("What are your skills?");
        app.session.begin_submit("What are your skills?");

        let screen = rendered(&mut app, 100, 20);
        assert!(screen.contains("Thinking."));
        assert!(screen.contains("Waiting for reply"));
        assert!(screen.contains("WAITING"));
    }

    #[test]
    fn test_word_wrapped_reply_is_scrolled_into_view() {
        let mut app = test_app();
        rendered(&mut app, 22, 16);

        let reply = (0..12)
            .map(|i| format!("word{i:02}abcdefghijk"))
            .chain(std::iter::once("LASTWORD".to_string()))
            .collect::<Vec<_>>()
            .join(" ");
        app.session.begin_submit("q");
        app.session.settle(Ok(Some(reply)));

        let screen = rendered(&mut app, 22, 16);
        assert!(screen.contains("LASTWORD"), "newest line not visible:\n{screen}");
        assert!(!screen.contains("Welcome"));
    }

    #[test]
    fn test_tall_multiline_reply_shows_its_end() {
        let mut app = test_app();
        rendered(&mut app, 40, 12);

        let reply = (1..=30)
            .map(|i| format!("line {i:02}"))
            .chain(std::iter::once("final line".to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        app.session.begin_submit("tell me everything");
        app.session.settle(Ok(Some(reply)));

        let screen = rendered(&mut app, 40, 12);
        assert!(screen.contains("final line"), "newest line not visible:\n{screen}");
        assert!(screen.contains("line 30"));
        assert!(!screen.contains("line 01"));
    }

    #[test]
    fn test_thinking_indicator_visible_after_long_history() {
        let mut app = test_app();
        for i in 0..8 {
            let question = format!("question number {i} about the projects he built");
            app.session.begin_submit(&question);
            app.session.settle(Ok(Some(format!("answer number {i} with several words to wrap"))));
        }
        app.session.begin_submit("one more");

        let screen = rendered(&mut app, 30, 14);
        assert!(screen.contains("Thinking."), "indicator not visible:\n{screen}");
    }

    #[test]
    fn test_render_records_chat_area() {
        let mut app = test_app();
        rendered(&mut app, 80, 24);
        // header (1) + input (3) + footer (1) leave 19 rows
        assert_eq!(app.chat_area, Some(Rect::new(0, 1, 80, 19)));
    }
}
