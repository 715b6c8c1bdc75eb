use std::time::Duration;

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Row, Table, Widget},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use typeamp::history::TestResult;

/// "2 minutes ago" style age of a result
pub fn relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = (now - timestamp).to_std().unwrap_or(Duration::ZERO);
    HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
}

/// The length column: seconds for time tests, words for word tests,
/// otherwise where the text came from
pub fn length_label(result: &TestResult) -> String {
    match (result.duration, result.word_count) {
        (Some(secs), _) => format!("{secs}s"),
        (None, Some(words)) => format!("{words} words"),
        (None, None) => result.text_source.clone(),
    }
}

pub fn render_history(results: &[TestResult], area: Rect, buf: &mut Buffer) {
    let now = Utc::now();
    let header = Row::new(["when", "mode", "length", "wpm", "acc", "difficulty"])
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

    let rows = results.iter().map(|r| {
        Row::new([
            relative_age(r.timestamp, now),
            r.mode.to_string(),
            length_label(r),
            r.wpm.to_string(),
            format!("{}%", r.accuracy),
            r.difficulty.to_string(),
        ])
    });

    let widths = [
        Constraint::Length(20),
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(10),
    ];

    Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" recent results / (b)ack (r)etry (n)ew "),
        )
        .render(area, buf);
}
