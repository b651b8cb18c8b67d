use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use reflex::{
    scoring::ResponseLabel,
    util::{format_clock, format_reaction},
    variant::MOLE_CELLS,
    GameVariant, Phase, Snapshot,
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const MOLE_COLUMNS: u8 = 3;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.engine.snapshot();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(2),
                    Constraint::Length(2),
                    Constraint::Min(5),
                    Constraint::Length(2),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(area);

        status_line(self, &snapshot).render(chunks[0], buf);

        if snapshot.game_over {
            results(self, &snapshot).render(chunks[2], buf);
        } else {
            rule_line(&snapshot).render(chunks[1], buf);
            stimulus(&snapshot).render(chunks[2], buf);
            controls(&snapshot).render(chunks[3], buf);
        }

        help_line(&snapshot).render(chunks[4], buf);
    }
}

fn response_style(label: ResponseLabel) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match label {
        ResponseLabel::Correct => bold.fg(Color::Green),
        ResponseLabel::Wrong => bold.fg(Color::Red),
        ResponseLabel::Miss => bold.fg(Color::Yellow),
        ResponseLabel::Ready | ResponseLabel::Go => bold,
    }
}

fn status_line<'a>(app: &App, snapshot: &Snapshot) -> Paragraph<'a> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled(format!("{} ", snapshot.variant), bold),
        Span::styled(format!("lv {}   ", app.engine.level()), dim),
        Span::styled(format_clock(snapshot.time_remaining), bold.fg(Color::Blue)),
        Span::raw(format!("   score {}", snapshot.score)),
        Span::raw(format!(
            "   reaction {} ms   ",
            format_reaction(snapshot.last_reaction_ms)
        )),
        Span::styled(
            snapshot.last_response.to_string(),
            response_style(snapshot.last_response),
        ),
    ]);

    Paragraph::new(line).alignment(Alignment::Center)
}

fn rule_line<'a>(snapshot: &Snapshot) -> Paragraph<'a> {
    let variant = snapshot.variant;
    if !variant.uses_rule_grid() {
        return Paragraph::new("");
    }

    let italic = Style::default().add_modifier(Modifier::ITALIC);
    let magenta = Style::default().fg(Color::Magenta);
    let line = Line::from(vec![
        Span::styled("rule 1 ", italic),
        Span::styled(variant.rule1_label(snapshot.round.rule1), magenta),
        Span::styled("    rule 2 ", italic),
        Span::styled(variant.rule2_label(snapshot.round.rule2), magenta),
    ]);

    Paragraph::new(line).alignment(Alignment::Center)
}

fn stimulus<'a>(snapshot: &Snapshot) -> Paragraph<'a> {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    if snapshot.variant == GameVariant::WhackAMole {
        return mole_board(snapshot);
    }

    let text = match snapshot.phase {
        Phase::Idle => Span::styled("press s to start", bold.add_modifier(Modifier::DIM)),
        Phase::Armed => Span::styled(snapshot.round.stimulus.to_string(), bold),
        Phase::Revealed | Phase::Scored => Span::styled("+", bold),
        Phase::GameOver => Span::raw(""),
    };

    Paragraph::new(vec![Line::from(""), Line::from(text)])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn mole_board<'a>(snapshot: &Snapshot) -> Paragraph<'a> {
    let hole = Style::default().add_modifier(Modifier::DIM);
    let mole = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let feedback = response_style(snapshot.last_response);

    let lines = (0..MOLE_CELLS)
        .chunks(MOLE_COLUMNS as usize)
        .into_iter()
        .map(|row| {
            let spans = row
                .map(|cell| {
                    if snapshot.round.active_cell == Some(cell) {
                        Span::styled(format!(" [{}] ", cell + 1), mole)
                    } else {
                        Span::styled(format!("  {}  ", cell + 1), hole)
                    }
                })
                .collect::<Vec<Span>>();
            Line::from(spans)
        })
        .chain(std::iter::once(Line::from(if snapshot.round.feedback {
            Span::styled(snapshot.last_response.to_string(), feedback)
        } else {
            Span::raw("")
        })))
        .collect::<Vec<Line>>();

    Paragraph::new(lines).alignment(Alignment::Center)
}

fn controls<'a>(snapshot: &Snapshot) -> Paragraph<'a> {
    if !snapshot.round.revealed {
        return Paragraph::new("");
    }

    let labels = snapshot.variant.choice_labels();
    let width = labels.iter().map(|label| label.width()).max().unwrap_or(0);
    let text = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| format!("[{}] {:<width$}", idx + 1, label, width = width))
        .join("   ");

    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
}

fn results<'a>(app: &App, snapshot: &Snapshot) -> Paragraph<'a> {
    let summary = app.engine.summary();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut lines = vec![
        Line::from(Span::styled("time's up", bold)),
        Line::from(""),
        Line::from(format!("score {}", snapshot.score)),
        Line::from(format!(
            "{} correct / {} wrong / {} missed ({}% acc)",
            summary.correct, summary.wrong, summary.missed, summary.accuracy
        )),
        Line::from(format!(
            "mean reaction {} ms, sd {} ms",
            summary
                .mean_reaction_ms
                .map_or_else(|| "--".to_string(), |ms| format!("{ms:.0}")),
            summary
                .reaction_std_dev_ms
                .map_or_else(|| "--".to_string(), |ms| format!("{ms:.0}")),
        )),
    ];

    if let Some(finished_at) = app.finished_at {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("finished {}", finished_at.format("%H:%M:%S")),
            dim,
        )));
    }

    Paragraph::new(lines).alignment(Alignment::Center)
}

fn help_line<'a>(snapshot: &Snapshot) -> Paragraph<'a> {
    let keys = match snapshot.phase {
        Phase::Idle | Phase::GameOver => "(s)tart / (esc)ape",
        _ if snapshot.variant == GameVariant::WhackAMole => "(1-9) whack / (r)eset / (esc)ape",
        _ => "(1-n) answer / (r)eset / (esc)ape",
    };

    Paragraph::new(Span::styled(
        keys,
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Right)
}
