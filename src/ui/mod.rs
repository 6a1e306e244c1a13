use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, CopyFeedback, Popup};
use crate::calculator::{self, Field, ResultStatus};
use crate::theme::Theme;

// Theme is read from disk once, on first draw
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

fn accent() -> Color { theme().accent }
fn danger() -> Color { theme().danger }
fn success() -> Color { theme().success }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn inactive() -> Color { theme().inactive }
fn header() -> Color { theme().header }

/// Widest the calculator card gets, in columns
const CARD_WIDTH: u16 = 56;

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Card
            Constraint::Length(1), // Footer
        ])
        .split(area);

    let card_area = centered_column(CARD_WIDTH, chunks[0]);
    draw_card(f, app, card_area);
    draw_footer(f, chunks[1]);

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_card(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", calculator::TITLE),
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Length input
            Constraint::Length(1), // Length error
            Constraint::Length(3), // Width input
            Constraint::Length(1), // Width error
            Constraint::Length(3), // Thickness input
            Constraint::Length(2), // Thickness helper + error
            Constraint::Length(3), // Result
            Constraint::Length(2), // Disclaimer
            Constraint::Length(1), // Buttons
            Constraint::Length(1), // Copy feedback
            Constraint::Min(0),
        ])
        .split(area);

    let input_rows = [(rows[0], rows[1]), (rows[2], rows[3]), (rows[4], rows[5])];
    for (field, (input_area, note_area)) in Field::ALL.into_iter().zip(input_rows) {
        draw_input(f, app, field, input_area, note_area);
    }
    draw_result(f, app, rows[6]);

    let disclaimer = Paragraph::new(calculator::MSG_DISCLAIMER)
        .style(Style::default().fg(text_dim()))
        .wrap(Wrap { trim: true });
    f.render_widget(disclaimer, rows[7]);

    draw_buttons(f, app, rows[8]);
    draw_copy_feedback(f, app, rows[9]);
}

fn draw_input(f: &mut Frame, app: &App, field: Field, input_area: Rect, note_area: Rect) {
    let is_focused = app.focus == field;
    let error = app.calculator.error_text(field);

    let border_color = if error.is_some() {
        danger()
    } else if is_focused {
        accent()
    } else {
        inactive()
    };
    let title_style = if is_focused {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(text())
    };

    let raw = app.calculator.raw(field);
    let content = if raw.is_empty() && !is_focused {
        Line::from(Span::styled(field.placeholder(), Style::default().fg(text_dim())))
    } else {
        let cursor = if is_focused { "_" } else { "" };
        Line::from(vec![
            Span::styled(raw, Style::default().fg(text())),
            Span::styled(cursor, Style::default().fg(accent())),
        ])
    };

    let input = Paragraph::new(content).block(
        Block::default()
            .title(Span::styled(format!(" {} ", field.label()), title_style))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    f.render_widget(input, input_area);

    let mut notes = Vec::new();
    if let Some(helper) = field.helper() {
        notes.push(Line::from(Span::styled(helper, Style::default().fg(text_dim()))));
    }
    if let Some(error) = error {
        notes.push(Line::from(Span::styled(error, Style::default().fg(danger()))));
    }
    f.render_widget(Paragraph::new(notes), note_area);
}

fn draw_result(f: &mut Frame, app: &App, area: Rect) {
    let (color, modifier) = match app.calculator.status() {
        ResultStatus::Volume(_) => (success(), Modifier::BOLD),
        _ => (text_dim(), Modifier::empty()),
    };

    let result = Paragraph::new(Line::from(Span::styled(
        app.calculator.status_text(),
        Style::default().fg(color).add_modifier(modifier),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    );
    f.render_widget(result, area);
}

fn draw_buttons(f: &mut Frame, app: &App, area: Rect) {
    let copy_style = if app.calculator.can_copy() {
        Style::default().fg(success()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let buttons = Paragraph::new(Line::from(vec![
        Span::styled("[ ", Style::default().fg(text_dim())),
        Span::styled("r", Style::default().fg(accent())),
        Span::styled(" 초기화", Style::default().fg(text())),
        Span::styled(" ]   [ ", Style::default().fg(text_dim())),
        Span::styled("Enter", copy_style),
        Span::styled(" 복사", copy_style),
        Span::styled(" ]", Style::default().fg(text_dim())),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(buttons, area);
}

fn draw_copy_feedback(f: &mut Frame, app: &App, area: Rect) {
    let Some(feedback) = app.copy_feedback else {
        return;
    };

    let color = match feedback {
        CopyFeedback::Copied => success(),
        CopyFeedback::Failed => danger(),
    };
    let line = Paragraph::new(Span::styled(feedback.message(), Style::default().fg(color)))
        .alignment(Alignment::Center);
    f.render_widget(line, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints = [
        ("Tab/↑↓", "이동"),
        ("Enter", "복사"),
        ("r", "초기화"),
        ("Ctrl+U", "지우기"),
        ("h", "도움말"),
        ("q", "종료"),
    ];

    // Responsive: fewer hints on narrow terminals
    let max_hints = if area.width < 50 { 3 } else if area.width < 70 { 4 } else { hints.len() };

    let spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, popup_area);

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), Style::default().fg(accent())),
            Span::raw(desc),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("═══ 입력 ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        key("Tab ↓", "다음 칸"),
        key("S-Tab ↑", "이전 칸"),
        key("0-9 .", "숫자 입력"),
        key("Backspace", "한 글자 지우기"),
        key("Ctrl+U", "현재 칸 비우기"),
        Line::from(""),
        Line::from(Span::styled("═══ 동작 ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        key("Enter c", "결과 복사"),
        key("r", "초기화"),
        key("q Esc", "종료"),
        Line::from(""),
        Line::from(Span::styled("═══ 시작 옵션 ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled("  rubecalc --query 'length=10&width=5&thickness=20'", Style::default().fg(text_dim()))),
        Line::from(Span::styled("  rubecalc --thickness 0.2 --unit m --print", Style::default().fg(text_dim()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  h", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" 닫기", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 도움말 ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

/// A column of at most `width` cells, centred horizontally in `r`
fn centered_column(width: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    Rect {
        x: r.x + (r.width - width) / 2,
        width,
        ..r
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
