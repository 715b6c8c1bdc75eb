pub mod charting;
pub mod history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use typeamp::{
    config::TestMode,
    session::{CharStatus, FinishReason, GameStatus},
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            AppState::History => history::render_history(
                &self.history_rows,
                area.inner(ratatui::layout::Margin::new(HORIZONTAL_MARGIN, VERTICAL_MARGIN)),
                buf,
            ),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.controller.session();

    if session.status() == GameStatus::Paused {
        Paragraph::new(Span::styled(
            "PAUSED - focus the terminal to continue",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
        return;
    }

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = session.target_text().width();
    let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    let filler = area.height.saturating_sub(prompt_occupied_lines + 3) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(filler),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let typed: Vec<char> = session.user_input().chars().collect();
    let spans: Vec<Span> = session
        .character_states()
        .iter()
        .enumerate()
        .map(|(idx, state)| match state.status {
            CharStatus::Correct => Span::styled(
                state.char.to_string(),
                bold().fg(Color::Green),
            ),
            CharStatus::Incorrect => Span::styled(
                match typed.get(idx).copied().unwrap_or(state.char) {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                bold().fg(Color::Red),
            ),
            CharStatus::Current => Span::styled(
                state.char.to_string(),
                dim_bold().add_modifier(Modifier::UNDERLINED),
            ),
            CharStatus::Default => Span::styled(state.char.to_string(), dim_bold()),
        })
        .collect();

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(progress_label(app), dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    if let Some(err) = app.controller.text_error() {
        Paragraph::new(Span::styled(
            format!("could not load text ({err}), using a fallback"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }
}

/// Countdown in time mode, finished words in words mode, nothing for quotes
fn progress_label(app: &App) -> String {
    let config = app.controller.config();
    match config.mode {
        TestMode::Time => app
            .seconds_remaining()
            .map(|secs| format!("{secs:.1}"))
            .unwrap_or_default(),
        TestMode::Words => {
            let progress = app.controller.session().word_progress();
            format!(
                "{}/{}",
                progress.words_completed, progress.target_word_count
            )
        }
        TestMode::Quote => String::new(),
    }
}

fn finish_label(reason: Option<FinishReason>) -> &'static str {
    match reason {
        Some(FinishReason::DifficultyFailed) => "failed: mistake not allowed at this difficulty",
        Some(FinishReason::WordCountReached) => "all words typed",
        Some(FinishReason::TextExhausted) => "text complete",
        Some(FinishReason::External) => "time is up",
        None => "",
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.controller.session();
    let stats = session.stats();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let test_secs = app.countdown.as_ref().map(|c| c.total().as_secs_f64());
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(session.wpm_trace(), test_secs);
    let tuples: Vec<(f64, f64)> = session.wpm_trace().iter().map(|&p| p.into()).collect();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(overall_duration), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(highest_wpm), bold()),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {}/{} chars   {:.1}s",
            stats.wpm,
            stats.accuracy,
            stats.correct_chars,
            stats.total_chars,
            stats.elapsed_ms as f64 / 1000.0
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let reason_style = match session.finish_reason() {
        Some(FinishReason::DifficultyFailed) => bold().fg(Color::Red),
        _ => Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    };
    Paragraph::new(Span::styled(finish_label(session.finish_reason()), reason_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    if let Some(source) = app.controller.quote_source() {
        Paragraph::new(Span::styled(
            format!("- {source}"),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    if let Some(err) = app.controller.persistence_error() {
        Paragraph::new(Span::styled(
            format!("result not saved: {err}"),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (h)istory / (tab) restart / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}
