use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::Theme;
use crate::session::SessionResult;

const BANNER: &str = "TEST COMPLETE";
const CONTINUE_HINT: &str = "press any key to continue";

/// Large centered number shown before the test starts
pub struct CountdownView {
    remaining: u64,
    theme: Theme,
}

impl CountdownView {
    pub fn new(remaining: u64, theme: Theme) -> Self {
        Self { remaining, theme }
    }
}

impl Widget for CountdownView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let middle = Rect {
            y: area.y + area.height / 2,
            height: 1,
            ..area
        };
        Paragraph::new(Span::styled(
            self.remaining.to_string(),
            self.theme.highlight(),
        ))
        .alignment(Alignment::Center)
        .render(middle, buf);
    }
}

/// Final results of a finished session plus its speed chart
pub struct SummaryView<'a> {
    result: &'a SessionResult,
    chart: Option<&'a str>,
    theme: Theme,
}

impl<'a> SummaryView<'a> {
    pub fn new(result: &'a SessionResult, chart: Option<&'a str>, theme: Theme) -> Self {
        Self {
            result,
            chart,
            theme,
        }
    }

    fn detail_lines(&self) -> Vec<Line<'static>> {
        let r = self.result;
        let mut lines = vec![
            Line::from(format!("Time:       {:.1}s", r.duration.as_secs_f64())),
            Line::from(format!(
                "Characters: {}/{} correct, {} incorrect",
                r.correct_chars,
                r.total_typed,
                r.incorrect_chars()
            )),
            Line::from(format!("Mode:       {}", r.mode)),
        ];
        if let Some(source) = &r.metadata.source {
            lines.push(Line::from(format!("Source:     {source}")));
        }
        lines
    }
}

impl Widget for SummaryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let details = self.detail_lines();
        let chart_lines: Vec<Line> = self
            .chart
            .map(|chart| chart.lines().map(Line::raw).collect())
            .unwrap_or_default();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(2)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(1), // banner
                Constraint::Length(1),
                Constraint::Length(1), // headline numbers
                Constraint::Length(1),
                Constraint::Length(details.len() as u16),
                Constraint::Length(1),
                Constraint::Min(0), // chart
                Constraint::Length(1), // hint
            ])
            .split(area);

        Paragraph::new(Span::styled(BANNER, self.theme.correct())).render(chunks[0], buf);

        let r = self.result;
        let headline = Line::from(vec![
            Span::styled(format!("WPM: {:.1}", r.wpm), self.theme.correct()),
            Span::raw("  |  "),
            Span::styled(format!("Raw: {:.1}", r.raw_wpm), self.theme.accent()),
            Span::raw("  |  "),
            Span::styled(
                format!("Accuracy: {:.1}%", r.accuracy),
                self.theme.highlight(),
            ),
        ]);
        Paragraph::new(headline).render(chunks[2], buf);
        Paragraph::new(details).render(chunks[4], buf);

        if !chart_lines.is_empty() {
            Paragraph::new(chart_lines).render(chunks[6], buf);
        }

        Paragraph::new(Span::styled(CONTINUE_HINT, self.theme.dim())).render(chunks[7], buf);
    }
}
