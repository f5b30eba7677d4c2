//! Rendering: the crystal ball and its surroundings.
//!
//! Stateless draw functions over the application state; no input handling
//! and no timing decisions here beyond reading the animation frame.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use unseen_types::{OraclePhase, Theme};

use crate::App;

const ORB: [&str; 11] = [
    r"       .  *  .       ",
    r"    *    .    *      ",
    r"    .###########.    ",
    r"   #################   ",
    r"  ###################  ",
    r"  ###################  ",
    r"  ###################  ",
    r"   #################   ",
    r"    '###########'    ",
    r"       =======       ",
    r"     /=========\     ",
];

/// Gazing pulse palette, cycled by the frame counter.
const PULSE: [Color; 4] = [
    Color::Magenta,
    Color::LightMagenta,
    Color::White,
    Color::LightMagenta,
];

fn theme_color(theme: Theme) -> Color {
    match theme {
        Theme::Occult => Color::Magenta,
        Theme::Conspiracy => Color::Red,
        Theme::Paranormal => Color::Cyan,
        Theme::Mysticism => Color::Yellow,
    }
}

/// Animated ellipsis for the waiting states.
fn trailing_dots(frame: usize) -> &'static str {
    match (frame / 10) % 4 {
        0 => "",
        1 => ".",
        2 => "..",
        _ => "...",
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let [header, ball, content, footer] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(13),
        Constraint::Min(8),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, header);
    draw_ball(frame, ball, app);
    draw_content(frame, content, app);
    draw_footer(frame, footer);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "T H E   U N S E E N",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "forbidden knowledge awaits",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, area);
}

fn orb_style(app: &App) -> Style {
    match app.oracle().phase() {
        OraclePhase::Idle | OraclePhase::Error => Style::default().fg(Color::DarkGray),
        OraclePhase::Gazing => {
            Style::default().fg(PULSE[(app.frame() / 5) % PULSE.len()])
        }
        OraclePhase::Revealed => {
            let color = app
                .oracle()
                .insight()
                .map_or(Color::White, |insight| theme_color(insight.theme));
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        }
    }
}

fn draw_ball(frame: &mut Frame, area: Rect, app: &App) {
    let style = orb_style(app);
    let mut lines: Vec<Line> = ORB
        .iter()
        .map(|row| Line::from(Span::styled(*row, style)))
        .collect();

    let status = match app.oracle().phase() {
        OraclePhase::Idle => "the glass is dark".to_string(),
        OraclePhase::Gazing => format!("the mists are moving{}", trailing_dots(app.frame())),
        OraclePhase::Revealed => "it has spoken".to_string(),
        OraclePhase::Error => "the glass clouds over".to_string(),
    };
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        status,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_content(frame: &mut Frame, area: Rect, app: &App) {
    let oracle = app.oracle();
    let Some(insight) = oracle.insight() else {
        if oracle.phase() == OraclePhase::Idle {
            let hint = Paragraph::new(Line::from(Span::styled(
                "press enter to gaze into the ball",
                Style::default().fg(Color::DarkGray),
            )))
            .alignment(Alignment::Center);
            frame.render_widget(hint, area);
        }
        return;
    };

    let accent = theme_color(insight.theme);
    let mut lines = vec![
        Line::from(Span::styled(
            insight.phrase.clone(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("[ {} ]", insight.theme),
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
    ];

    if oracle.explanation_visible() {
        lines.push(Line::from(Span::styled(
            insight.explanation.clone(),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            insight.source_url.clone(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::UNDERLINED),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("the meaning coalesces{}", trailing_dots(app.frame())),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let content = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(content, centered(area, 60));
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let hints = Paragraph::new(Line::from(Span::styled(
        "enter gaze \u{b7} r reset \u{b7} q quit",
        Style::default().fg(Color::DarkGray),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(hints, area);
}

/// Clamp a content column to `width` cells, centered in `area`.
fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    let x = area.x + (area.width - width) / 2;
    Rect::new(x, area.y, width, area.height)
}
