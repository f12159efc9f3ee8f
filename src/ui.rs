pub mod charting;
pub mod summary;

use std::io;
use std::time::Duration;

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Terminal,
};

use crate::runtime::Presenter;
use crate::session::{CharVerdict, Phase, SessionResult, SessionSnapshot};
use crate::target::Mode;

pub use summary::{CountdownView, SummaryView};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const EXIT_HINT: &str = "esc to quit";
/// Live WPM is hidden until this much time has passed
const STATUS_WPM_DELAY: Duration = Duration::from_millis(500);

/// Display settings shared by every screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub no_color: bool,
    /// Prompt wrap column; 0 uses the full width
    pub wrap: u16,
}

/// Styles for each role, with a monochrome fallback
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    no_color: bool,
}

impl Theme {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }

    fn bold(&self) -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    fn colored(&self, base: Style, color: Color) -> Style {
        if self.no_color {
            base
        } else {
            base.fg(color)
        }
    }

    pub fn correct(&self) -> Style {
        self.colored(self.bold(), Color::Green)
    }

    pub fn incorrect(&self) -> Style {
        if self.no_color {
            self.bold().add_modifier(Modifier::REVERSED)
        } else {
            self.bold().fg(Color::Red)
        }
    }

    pub fn pending(&self) -> Style {
        self.colored(Style::default(), Color::DarkGray)
            .add_modifier(Modifier::DIM)
    }

    pub fn cursor(&self) -> Style {
        self.pending().add_modifier(Modifier::UNDERLINED)
    }

    pub fn dim(&self) -> Style {
        Style::default().add_modifier(Modifier::DIM)
    }

    pub fn accent(&self) -> Style {
        self.colored(self.bold(), Color::Cyan)
    }

    pub fn highlight(&self) -> Style {
        self.colored(self.bold(), Color::Yellow)
    }
}

fn header_info(snapshot: &SessionSnapshot) -> String {
    match snapshot.mode {
        Mode::Timer => {
            let remaining = snapshot.remaining().unwrap_or_default();
            format!("{}s remaining", remaining.as_secs_f64().ceil() as u64)
        }
        Mode::Words => format!("{} words", snapshot.metadata.word_count),
        Mode::Quote => match &snapshot.metadata.source {
            Some(source) => format!("quote by {source}"),
            None => "quote".to_string(),
        },
    }
}

fn status_text(snapshot: &SessionSnapshot) -> String {
    if snapshot.phase == Phase::NotStarted {
        return "start typing".to_string();
    }

    let mut parts = Vec::with_capacity(3);
    if snapshot.elapsed >= STATUS_WPM_DELAY {
        parts.push(format!("{:.0} wpm", snapshot.live_wpm));
    }
    parts.push(format!("{:.1}s", snapshot.elapsed.as_secs_f64()));
    if snapshot.mode != Mode::Timer {
        parts.push(format!("{:.0}%", snapshot.progress()));
    }
    parts.join("   ")
}

/// One styled span per target character
fn prompt_spans(snapshot: &SessionSnapshot, theme: &Theme) -> Vec<Span<'static>> {
    let cursor = snapshot.cursor();
    snapshot
        .target
        .iter()
        .zip(&snapshot.verdicts)
        .enumerate()
        .map(|(idx, (&expected, verdict))| match verdict {
            CharVerdict::Correct => Span::styled(expected.to_string(), theme.correct()),
            CharVerdict::Incorrect => {
                let shown = if expected == ' ' { '·' } else { expected };
                Span::styled(shown.to_string(), theme.incorrect())
            }
            CharVerdict::Unattempted if idx == cursor && !snapshot.phase.is_terminal() => {
                Span::styled(expected.to_string(), theme.cursor())
            }
            CharVerdict::Unattempted => Span::styled(expected.to_string(), theme.pending()),
        })
        .collect()
}

/// Rows the wrapped prompt occupies at `width`, breaking at word boundaries
fn prompt_height(prompt: &Paragraph, width: u16) -> u16 {
    let rows = prompt.line_count(width.max(1)).max(1);
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// The live typing screen
pub struct TypingView<'a> {
    snapshot: &'a SessionSnapshot,
    theme: Theme,
    wrap: u16,
}

impl<'a> TypingView<'a> {
    pub fn new(snapshot: &'a SessionSnapshot, options: ViewOptions) -> Self {
        Self {
            snapshot,
            theme: Theme::new(options.no_color),
            wrap: options.wrap,
        }
    }
}

impl Widget for TypingView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = area.inner(ratatui::layout::Margin::new(
            HORIZONTAL_MARGIN,
            VERTICAL_MARGIN,
        ));
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let prompt_width = match self.wrap {
            0 => inner.width,
            wrap => wrap.min(inner.width),
        };
        let prompt = Paragraph::new(Line::from(prompt_spans(self.snapshot, &self.theme)))
            .wrap(Wrap { trim: false });
        let prompt_lines = prompt_height(&prompt, prompt_width);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1),
                Constraint::Length(prompt_lines),
                Constraint::Length(1),
                Constraint::Length(1), // status
                Constraint::Min(0),
            ])
            .split(inner);

        let header = Line::from(vec![
            Span::styled(
                self.snapshot.mode.to_string().to_uppercase(),
                self.theme.accent(),
            ),
            Span::raw(" | "),
            Span::raw(header_info(self.snapshot)),
        ]);
        Paragraph::new(header).render(chunks[0], buf);
        Paragraph::new(Span::styled(EXIT_HINT, self.theme.dim()))
            .alignment(Alignment::Right)
            .render(chunks[0], buf);

        let prompt_area = Rect {
            width: prompt_width,
            ..chunks[2]
        };
        prompt.render(prompt_area, buf);

        let status_style = if self.snapshot.phase == Phase::Running {
            self.theme.correct()
        } else {
            self.theme.dim()
        };
        Paragraph::new(Span::styled(status_text(self.snapshot), status_style))
            .render(chunks[4], buf);
    }
}

/// Draws sessions onto a terminal. Terminal setup and teardown stay with the caller.
pub struct TerminalPresenter<'t, B: Backend> {
    terminal: &'t mut Terminal<B>,
    options: ViewOptions,
}

impl<'t, B: Backend> TerminalPresenter<'t, B> {
    pub fn new(terminal: &'t mut Terminal<B>, options: ViewOptions) -> Self {
        Self { terminal, options }
    }

    pub fn width(&self) -> io::Result<u16> {
        Ok(self.terminal.size()?.width)
    }

    pub fn countdown_frame(&mut self, remaining: u64) -> io::Result<()> {
        let theme = Theme::new(self.options.no_color);
        self.terminal
            .draw(|f| f.render_widget(CountdownView::new(remaining, theme), f.area()))?;
        Ok(())
    }

    pub fn summary(&mut self, result: &SessionResult, chart: Option<&str>) -> io::Result<()> {
        let theme = Theme::new(self.options.no_color);
        self.terminal
            .draw(|f| f.render_widget(SummaryView::new(result, chart, theme), f.area()))?;
        Ok(())
    }
}

impl<B: Backend> Presenter for TerminalPresenter<'_, B> {
    fn present(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        let options = self.options;
        self.terminal
            .draw(|f| f.render_widget(TypingView::new(snapshot, options), f.area()))?;
        Ok(())
    }
}

/// Row-by-row text of a buffer, for assertions
#[cfg(test)]
pub(crate) fn buffer_lines(buf: &Buffer) -> Vec<String> {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buf[(x, y)].symbol())
                .collect::<String>()
        })
        .collect()
}
