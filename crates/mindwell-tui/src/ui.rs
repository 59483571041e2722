use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, Sender};

/// Render `**bold**` runs in a model reply; everything else stays literal.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut parts = text.split("**").peekable();
    let mut bold = false;

    while let Some(part) = parts.next() {
        // An unmatched trailing ** is shown as typed
        if bold && parts.peek().is_none() {
            spans.push(Span::raw(format!("**{part}")));
            break;
        }
        if !part.is_empty() {
            if bold {
                spans.push(Span::styled(
                    part.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(part.to_string()));
            }
        }
        bold = !bold;
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.is_ready() {
        Span::styled(" ● AI ready ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" ● API key needed ", Style::default().fg(Color::Red))
    };

    let title = Line::from(vec![
        Span::styled(" MindWell AI ", Style::default().fg(Color::Cyan).bold()),
        status,
        Span::styled(app.model.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store inner size for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let text = if app.messages.is_empty() && !app.is_waiting() {
        Text::from(Span::styled(
            "Share what's on your mind... I'm here to listen",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &app.messages {
            match msg.sender {
                Sender::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(msg.content.as_str()));
                }
                Sender::Bot => {
                    lines.push(Line::from(Span::styled(
                        "MindWell:",
                        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                    )));
                    for line in msg.content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
                Sender::Notice => {
                    lines.push(Line::from(Span::styled(
                        "Notice:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(Span::styled(
                        msg.content.as_str(),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            lines.push(Line::default());
        }

        if app.is_waiting() {
            lines.push(Line::from(Span::styled(
                "MindWell:",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Typing{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let (title, border_color) = if !app.is_ready() {
        (" Configure your OpenAI API key to start chatting (Ctrl+K) ", Color::DarkGray)
    } else if app.is_waiting() {
        (" Waiting for a reply... ", Color::DarkGray)
    } else {
        (" Message ", Color::Yellow)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible (inner width = width - borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 || app.cursor < inner_width {
        0
    } else {
        app.cursor - inner_width + 1
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if app.is_ready() && !app.show_api_key_input {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.show_api_key_input {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" test & save ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(if app.is_ready() { " cancel " } else { " quit " }, label_style),
        ]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Ctrl+L ", key_style),
            Span::styled(" new chat ", label_style),
            Span::styled(" Ctrl+K ", key_style),
            Span::styled(" API key ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Centered box for the key overlay, clipped to the terminal.
fn popup_rect(area: Rect) -> Rect {
    let width = 64u16.min(area.width.saturating_sub(4));
    let height = 8u16.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height).intersection(area)
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" OpenAI API Key ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Rows inside the box; on a short terminal the lower ones collapse to nothing
    let row = |offset: u16, height: u16| {
        Rect::new(inner.x, inner.y.saturating_add(offset), inner.width, height).intersection(inner)
    };

    let instructions = Paragraph::new(
        "Paste your key. It is tested, then kept for this session only.",
    )
    .style(Style::default().fg(Color::Gray))
    .wrap(Wrap { trim: true });
    frame.render_widget(instructions, row(0, 2));

    let input_area = row(3, 1);

    // Mask the key, leaving the last four characters readable
    let char_count = app.api_key_input.chars().count();
    let display_text = if char_count <= 4 {
        "*".repeat(char_count)
    } else {
        let last_four: String = app.api_key_input.chars().skip(char_count - 4).collect();
        format!("{}...{}", "*".repeat((char_count - 4).min(20)), last_four)
    };
    frame.render_widget(
        Paragraph::new(display_text).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    if !input_area.is_empty() {
        let cursor_x = app.api_key_input_cursor.min(input_area.width as usize) as u16;
        frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
    }

    let status = match &app.api_status {
        Some(status) if app.is_probing() => Span::styled(
            format!("{}{}", status.message, ".".repeat(app.animation_frame as usize)),
            Style::default().fg(Color::Gray),
        ),
        Some(status) => Span::styled(
            status.message.clone(),
            Style::default().fg(if status.is_error { Color::Red } else { Color::Green }),
        ),
        None => Span::styled(
            format!("{} characters", char_count),
            Style::default().fg(Color::DarkGray),
        ),
    };
    frame.render_widget(
        Paragraph::new(Line::from(status)).wrap(Wrap { trim: true }),
        row(5, 1),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindwell_core::Config;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(line: &Line) -> Vec<(String, bool)> {
        line.spans
            .iter()
            .map(|s| (s.content.to_string(), s.style.add_modifier.contains(Modifier::BOLD)))
            .collect()
    }

    #[test]
    fn popup_fits_inside_small_terminals() {
        let tiny = Rect::new(0, 0, 30, 5);
        let popup = popup_rect(tiny);
        assert_eq!(popup.intersection(tiny), popup);
        assert!(popup.height <= 5);

        let roomy = Rect::new(0, 0, 120, 40);
        assert_eq!(popup_rect(roomy), Rect::new(28, 16, 64, 8));
    }

    #[test]
    fn key_overlay_renders_on_a_short_terminal() {
        let mut app = App::new(&Config::default());
        app.show_api_key_input = true;
        app.api_key_input = "sk-test-1234".to_string();
        app.api_key_input_cursor = app.api_key_input.chars().count();

        for height in [1, 3, 5, 7] {
            let mut terminal = Terminal::new(TestBackend::new(40, height)).unwrap();
            terminal.draw(|frame| render(&mut app, frame)).unwrap();
        }
    }

    #[test]
    fn bot_replies_render_with_bold_markup() {
        let mut app = App::new(&Config::default());
        app.show_api_key_input = false;
        app.push_message(Sender::User, "hi");
        app.push_message(Sender::Bot, "Try **slow breathing**.\nI'm here.");

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("Try slow breathing."));
        assert!(!screen.contains("**"));
    }

    #[test]
    fn bold_runs_are_styled() {
        let line = parse_markdown_line("try **box breathing** tonight");
        assert_eq!(
            rendered(&line),
            vec![
                ("try ".to_string(), false),
                ("box breathing".to_string(), true),
                (" tonight".to_string(), false),
            ]
        );
    }

    #[test]
    fn unclosed_marker_stays_literal() {
        let line = parse_markdown_line("call **988 now");
        assert_eq!(
            rendered(&line),
            vec![("call ".to_string(), false), ("**988 now".to_string(), false)]
        );
    }
}
