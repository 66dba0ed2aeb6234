use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use companion_core::{Message, Role};
use unicode_width::UnicodeWidthChar;
use crate::app::{App, InputMode};

const GREETING: &str = "Hello, I'm here to listen.";
const GREETING_DETAIL: &str =
    "Whether you're feeling overwhelmed, stressed, or just need someone to talk to, I'm here for you.";
const SAFETY_NOTICE: &str = "[!] Safety Alert: Professional support recommended.";
const DISCLAIMER: &str =
    "I'm an AI assistant. If you're in immediate danger, please contact local emergency services.";

/// Screen regions, top to bottom.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub header: Rect,
    pub chat: Rect,
    pub input: Rect,
    pub disclaimer: Rect,
    pub footer: Rect,
}

pub fn layout(area: Rect) -> AppLayout {
    let [header, chat, input, disclaimer, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    AppLayout { header, chat, input, disclaimer, footer }
}

/// Convert **bold** spans to styled text; everything else is literal.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    // An odd number of parts means every ** has a partner
    if parts.len() % 2 == 0 {
        return Line::from(text.to_string());
    }

    let spans: Vec<Span<'static>> = parts
        .into_iter()
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if i % 2 == 1 {
                Span::styled(part.to_string(), Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(part.to_string())
            }
        })
        .collect();

    Line::from(spans)
}

fn role_line(role: Role) -> Line<'static> {
    match role {
        Role::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Role::Agent => Line::from(Span::styled(
            "Companion:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

fn message_lines(msg: &Message, lines: &mut Vec<Line<'static>>) {
    lines.push(role_line(msg.role));

    match msg.role {
        Role::User => {
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Role::Agent => {
            for line in msg.content.lines() {
                lines.push(parse_markdown_line(line));
            }

            // The alert replaces the sentiment line rather than joining it
            if msg.is_safety_alert() {
                lines.push(Line::from(Span::styled(
                    SAFETY_NOTICE,
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
            } else if let Some(label) = msg.sentiment_label() {
                lines.push(Line::from(Span::styled(
                    format!("Detected: {}", label),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }

    lines.push(Line::default());
}

/// Everything the transcript pane shows, in display order.
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let messages = app.session.messages();
    let pending = app.session.is_pending();

    if messages.is_empty() && !pending {
        return vec![
            Line::default(),
            Line::from(Span::styled(GREETING, Style::default().fg(Color::White).bold()))
                .alignment(Alignment::Center),
            Line::default(),
            Line::from(Span::styled(GREETING_DETAIL, Style::default().fg(Color::DarkGray)))
                .alignment(Alignment::Center),
        ];
    }

    let mut lines = Vec::new();
    for msg in messages {
        message_lines(msg, &mut lines);
    }

    if pending {
        lines.push(role_line(Role::Agent));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Listening{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// The transcript wrapped the way the pane draws it, without the border.
fn transcript_paragraph(app: &App) -> Paragraph<'static> {
    Paragraph::new(Text::from(transcript_lines(app))).wrap(Wrap { trim: true })
}

/// Rows the transcript takes when word-wrapped to `width` columns.
pub fn transcript_height(app: &App, width: u16) -> u16 {
    let rows = transcript_paragraph(app).line_count(width);
    u16::try_from(rows).unwrap_or(u16::MAX)
}

pub fn render(app: &App, frame: &mut Frame) {
    let areas = layout(frame.area());

    render_header(app, frame, areas.header);
    render_transcript(app, frame, areas.chat);
    render_input(app, frame, areas.input);

    let disclaimer = Paragraph::new(Span::styled(DISCLAIMER, Style::default().fg(Color::DarkGray)))
        .alignment(Alignment::Center);
    frame.render_widget(disclaimer, areas.disclaimer);

    render_footer(app, frame, areas.footer);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" True Companion ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("AI Wellness Guide ", Style::default().fg(Color::Green)),
        Span::styled(
            format!("[{}] ", app.backend_label),
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

fn render_transcript(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let chat = transcript_paragraph(app)
        .block(block)
        .scroll((app.scroll.offset(), 0));

    frame.render_widget(chat, area);
}

/// The part of `input` that fits in `width` columns with the cursor (a char
/// index) in view, and the cursor's column within it.
fn visible_input(input: &str, cursor: usize, width: usize) -> (String, u16) {
    if width == 0 {
        return (String::new(), 0);
    }
    let chars: Vec<char> = input.chars().collect();
    let cursor = cursor.min(chars.len());
    let cols = |c: &char| c.width().unwrap_or(0);

    // Keep as much as fits before the cursor, leaving one cell for the cursor itself
    let mut start = cursor;
    let mut used = 1;
    while start > 0 && used + cols(&chars[start - 1]) <= width {
        used += cols(&chars[start - 1]);
        start -= 1;
    }

    let mut visible = String::new();
    let mut filled = 0;
    for c in &chars[start..] {
        if filled + cols(c) > width {
            break;
        }
        filled += cols(c);
        visible.push(*c);
    }

    let cursor_x: usize = chars[start..cursor].iter().map(cols).sum();
    (visible, u16::try_from(cursor_x).unwrap_or(u16::MAX))
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if app.session.is_pending() {
        " Message (waiting for reply) "
    } else {
        " Message "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let input = app.session.input();
    let (visible_text, cursor_x) = visible_input(input, app.input_cursor, inner_width);

    let paragraph = if input.is_empty() && !editing {
        Paragraph::new(Span::styled(
            "Type your message here...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(paragraph.block(block), area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" VIEW ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" TYPE ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(if app.session.is_pending() { " (waiting) " } else { " send " }, label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
            Span::styled(" Ctrl+C ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" top/latest ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
