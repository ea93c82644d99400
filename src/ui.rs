use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use snag::session::FailureReason;
use snag::stage::StageMode;
use snag::util::fmt_clock;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn chunks(area: Rect) -> [Rect; 4] {
    let split = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(6),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);
    [split[0], split[1], split[2], split[3]]
}

/// The rect candidate rows are drawn in; the mouse handler in main.rs maps
/// click coordinates back to candidates through this same layout.
pub fn passage_area(area: Rect) -> Rect {
    chunks(area)[1]
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Playing => render_playing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let [header_area, passage, explanation_area, footer] = chunks(area);

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let focus_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let stage = app.session.stage();
    let state = app.session.state();
    let (found, total) = app.session.progress();

    let hearts = "♥ ".repeat(state.lives as usize);
    let header = Line::from(vec![
        Span::styled(format!("{} · {} · level {}", stage.stage_id, stage.mode, stage.level), dim_style),
        Span::raw("   "),
        Span::styled(hearts.trim_end().to_string(), red_bold_style),
        Span::raw("   "),
        Span::styled(fmt_clock(app.timer.remaining_secs()), bold_style),
        Span::raw("   "),
        Span::styled(format!("score {}", state.score), bold_style),
        Span::raw("   "),
        Span::styled(format!("found {found}/{total}"), dim_style),
    ]);
    Paragraph::new(header).render(header_area, buf);

    let avail = passage.width.saturating_sub(4) as usize;
    let lines: Vec<Line> = stage
        .candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let prefix = match stage.mode {
                // Alternate speakers in a transcript
                StageMode::Chat => {
                    if i % 2 == 0 {
                        "› "
                    } else {
                        "  › "
                    }
                }
                StageMode::Article | StageMode::Text => "· ",
            };

            let mut text = c.text.clone();
            if text.width() > avail {
                text = text.chars().take(avail).collect();
            }

            let style = if app.session.is_resolved(c.id) {
                green_bold_style
            } else if state.selected_candidate == Some(c.id) && !state.show_explanation {
                // The last wrong pick stays marked until the next event
                red_bold_style
            } else if i == app.focus && !state.show_explanation {
                focus_style
            } else {
                dim_style
            };
            Line::from(vec![Span::raw(prefix), Span::styled(text, style)])
        })
        .collect();
    Paragraph::new(lines).render(passage, buf);

    if state.show_explanation {
        if let Some(candidate) = state
            .selected_candidate
            .and_then(|id| stage.candidate(id))
        {
            let magenta_style = Style::default().fg(Color::Magenta);
            let explanation = Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("✓ {}", candidate.text),
                    green_bold_style,
                )),
                Line::from(Span::styled(
                    candidate.explanation.clone(),
                    magenta_style.add_modifier(Modifier::ITALIC),
                )),
            ])
            .wrap(Wrap { trim: true });
            explanation.render(explanation_area, buf);
        }
    }

    let hint = if state.show_explanation {
        "enter to continue"
    } else {
        "↑/↓ focus · enter select · esc quit"
    };
    Paragraph::new(Span::styled(hint, dim_style))
        .alignment(Alignment::Center)
        .render(footer, buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let yellow_bold_style = Style::default().patch(bold_style).fg(Color::Yellow);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let Some(result) = app.session.result() else {
        return;
    };
    let (found, total) = app.session.progress();

    let mut lines: Vec<Line> = Vec::new();

    if result.is_success() {
        lines.push(Line::from(Span::styled("STAGE CLEAR", green_bold_style)));
        if result.lives_remaining == app.session.config().default_lives {
            lines.push(Line::from(Span::styled("flawless!", yellow_bold_style)));
        }
    } else {
        lines.push(Line::from(Span::styled("GAME OVER", red_bold_style)));
        let reason = match result.failure_reason {
            Some(FailureReason::NoLives) => "out of lives",
            Some(FailureReason::TimeUp) => "time's up",
            None => "",
        };
        lines.push(Line::from(Span::styled(reason, italic_style)));
    }

    lines.push(Line::default());

    let mut score_spans = vec![Span::styled(
        format!("score {}", result.final_score),
        bold_style,
    )];
    match app.best_score {
        Some(best) if result.final_score > best => {
            score_spans.push(Span::styled("  new best!", yellow_bold_style));
        }
        Some(best) => {
            score_spans.push(Span::styled(format!("  best {best}"), dim_style));
        }
        None => {}
    }
    lines.push(Line::from(score_spans));

    lines.push(Line::from(Span::styled(
        format!(
            "found {found}/{total} · lives {} · time left {}",
            result.lives_remaining,
            fmt_clock(result.time_remaining_secs)
        ),
        dim_style,
    )));

    if let Some(last) = &app.last_played {
        lines.push(Line::from(Span::styled(
            format!("previous attempt {last}"),
            dim_style,
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(r)etry · (n)ew stage · (t)weet · (esc)ape",
        italic_style,
    )));

    let content_height = lines.len() as u16;
    let vertical_pad = area.height.saturating_sub(content_height) / 2;
    let centered = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(vertical_pad),
                Constraint::Length(content_height),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(centered[1], buf);
}
