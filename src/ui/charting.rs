//! Fixed-size ASCII charts for speed samples.
//!
//! Everything here is a pure function of its inputs: samples in, text out.

use itertools::{Itertools, MinMaxResult};

use crate::metrics::Sample;

pub const POINT_GLYPH: char = '█';
pub const SECONDARY_GLYPH: char = '░';
pub const CONNECTOR_GLYPH: char = '·';
const EMPTY: char = ' ';

const MIN_WIDTH: usize = 20;
const MIN_HEIGHT: usize = 5;
/// Columns reserved for the value labels and the vertical rule
const AXIS_WIDTH: usize = 6;
const MIN_PLOT_WIDTH: usize = 10;

const SPARK_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub time_ms: u64,
    pub value: f64,
}

impl DataPoint {
    pub fn new(time_ms: u64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub width: usize,
    pub height: usize,
    pub show_axis: bool,
    pub title: Option<String>,
    pub value_unit: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 60,
            height: 10,
            show_axis: true,
            title: None,
            value_unit: "WPM".to_string(),
        }
    }
}

impl ChartOptions {
    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    fn plot_width(&self) -> usize {
        (self.width.max(MIN_WIDTH) - AXIS_WIDTH).max(MIN_PLOT_WIDTH)
    }

    fn plot_height(&self) -> usize {
        self.height.max(MIN_HEIGHT)
    }
}

/// Split samples into (net WPM, raw WPM) series
pub fn series_from_samples(samples: &[Sample]) -> (Vec<DataPoint>, Vec<DataPoint>) {
    samples
        .iter()
        .map(|s| {
            (
                DataPoint::new(s.elapsed_ms, s.wpm),
                DataPoint::new(s.elapsed_ms, s.raw_wpm),
            )
        })
        .unzip()
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

fn map_to_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if in_max - in_min == 0.0 {
        return out_min;
    }
    (value - in_min) / (in_max - in_min) * (out_max - out_min) + out_min
}

/// Value bounds with 10% padding on each side; a flat series still gets a range of 1
fn padded_bounds<'a>(points: impl Iterator<Item = &'a DataPoint>) -> (f64, f64) {
    let (min, max) = match points.map(|p| p.value).minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => (0.0, 100.0),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let range = (max - min).max(1.0);
    ((min - range * 0.1).max(0.0), max + range * 0.1)
}

/// Maps (time, value) into grid coordinates. Row 0 is the top (max value).
#[derive(Debug, Clone, Copy)]
struct Scale {
    min_val: f64,
    max_val: f64,
    max_time: f64,
    width: usize,
    height: usize,
}

impl Scale {
    fn position(&self, p: &DataPoint) -> (f64, f64) {
        let x = map_to_range(
            p.time_ms as f64,
            0.0,
            self.max_time,
            0.0,
            (self.width - 1) as f64,
        );
        let y = map_to_range(
            p.value,
            self.min_val,
            self.max_val,
            (self.height - 1) as f64,
            0.0,
        );
        (x, y)
    }

    fn cell(&self, x: f64, y: f64) -> (usize, usize) {
        let col = (x.round().max(0.0) as usize).min(self.width - 1);
        let row = (y.round().max(0.0) as usize).min(self.height - 1);
        (col, row)
    }

    fn value_at_row(&self, row: usize) -> f64 {
        map_to_range(
            row as f64,
            0.0,
            (self.height - 1) as f64,
            self.max_val,
            self.min_val,
        )
    }
}

struct Grid {
    rows: Vec<Vec<char>>,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            rows: vec![vec![EMPTY; width]; height],
        }
    }

    fn get(&self, col: usize, row: usize) -> char {
        self.rows[row][col]
    }

    fn set(&mut self, col: usize, row: usize, glyph: char) {
        self.rows[row][col] = glyph;
    }

    fn set_if_empty(&mut self, col: usize, row: usize, glyph: char) {
        if self.get(col, row) == EMPTY {
            self.set(col, row, glyph);
        }
    }

    fn plot(&mut self, points: &[DataPoint], scale: &Scale, glyph: char, overwrite: bool) {
        for p in points {
            let (x, y) = scale.position(p);
            let (col, row) = scale.cell(x, y);
            if overwrite {
                self.set(col, row, glyph);
            } else {
                self.set_if_empty(col, row, glyph);
            }
        }
    }

    /// Join consecutive points with connector glyphs, interpolating at
    /// max(|dx|, |dy|) steps. Only blank cells are written.
    fn connect(&mut self, points: &[DataPoint], scale: &Scale) {
        for (a, b) in points.iter().tuple_windows() {
            let (x1, y1) = scale.position(a);
            let (x2, y2) = scale.position(b);
            let steps = (x2 - x1).abs().max((y2 - y1).abs()) as usize;
            if steps == 0 {
                continue;
            }
            for s in 0..=steps {
                let t = s as f64 / steps as f64;
                let (col, row) = scale.cell(x1 + t * (x2 - x1), y1 + t * (y2 - y1));
                self.set_if_empty(col, row, CONNECTOR_GLYPH);
            }
        }
    }
}

fn last_time(points: &[DataPoint]) -> u64 {
    points.last().map_or(0, |p| p.time_ms)
}

/// Render one series as an ASCII chart
pub fn render_chart(points: &[DataPoint], opts: &ChartOptions) -> String {
    if points.is_empty() {
        return "No data".to_string();
    }

    let (min_val, max_val) = padded_bounds(points.iter());
    let max_time = last_time(points);
    let scale = Scale {
        min_val,
        max_val,
        max_time: max_time.max(1) as f64,
        width: opts.plot_width(),
        height: opts.plot_height(),
    };

    let mut grid = Grid::new(scale.width, scale.height);
    grid.plot(points, &scale, POINT_GLYPH, true);
    grid.connect(points, &scale);

    let mut out = String::new();
    if let Some(title) = &opts.title {
        out.push_str(title);
        out.push('\n');
    }
    write_body(&mut out, &grid, &scale, max_time, opts);
    out
}

/// Render a primary series over a secondary one (e.g. net over raw WPM).
/// Where both land on the same cell the primary glyph wins.
pub fn render_dual_chart(
    primary: &[DataPoint],
    secondary: &[DataPoint],
    opts: &ChartOptions,
) -> String {
    if primary.is_empty() && secondary.is_empty() {
        return "No data".to_string();
    }

    let (min_val, max_val) = padded_bounds(primary.iter().chain(secondary));
    let max_time = last_time(primary).max(last_time(secondary));
    let scale = Scale {
        min_val,
        max_val,
        max_time: max_time.max(1) as f64,
        width: opts.plot_width(),
        height: opts.plot_height(),
    };

    let mut grid = Grid::new(scale.width, scale.height);
    grid.plot(secondary, &scale, SECONDARY_GLYPH, false);
    grid.plot(primary, &scale, POINT_GLYPH, true);
    grid.connect(primary, &scale);
    grid.connect(secondary, &scale);

    let mut out = String::new();
    if let Some(title) = &opts.title {
        out.push_str(title);
        out.push('\n');
    }
    out.push_str(&format!(
        "{}{POINT_GLYPH} {unit}  {SECONDARY_GLYPH} Raw {unit}\n",
        " ".repeat(AXIS_WIDTH),
        unit = opts.value_unit
    ));
    write_body(&mut out, &grid, &scale, max_time, opts);
    out
}

/// Convenience: dual chart of net and raw WPM straight from samples
pub fn render_samples(samples: &[Sample], opts: &ChartOptions) -> String {
    let (wpm, raw) = series_from_samples(samples);
    render_dual_chart(&wpm, &raw, opts)
}

fn write_body(out: &mut String, grid: &Grid, scale: &Scale, max_time: u64, opts: &ChartOptions) {
    let mid_row = scale.height / 2;
    for (row, cells) in grid.rows.iter().enumerate() {
        if opts.show_axis {
            if row == 0 || row == mid_row || row == scale.height - 1 {
                out.push_str(&format!("{:5.0}│", scale.value_at_row(row)));
            } else {
                out.push_str("     │");
            }
        }
        out.extend(cells.iter());
        out.push('\n');
    }

    if !opts.show_axis {
        return;
    }

    out.push_str("     └");
    out.push_str(&"─".repeat(scale.width));
    out.push('\n');
    out.push_str(&time_labels(max_time, scale.width));
    out.push('\n');
}

/// Start, midpoint and end labels laid out under the plot area.
/// The midpoint label is dropped when it would touch a neighbour.
fn time_labels(max_time_ms: u64, width: usize) -> String {
    let total_secs = max_time_ms as f64 / 1000.0;
    let start = "0s".to_string();
    let mid = format!("{}s", format_label(total_secs / 2.0));
    let end = format!("{}s", format_label(total_secs));

    let mut line = vec![EMPTY; AXIS_WIDTH + width];
    let put = |line: &mut Vec<char>, at: usize, label: &str| {
        for (i, c) in label.chars().enumerate() {
            if let Some(cell) = line.get_mut(at + i) {
                *cell = c;
            }
        }
    };

    let start_at = AXIS_WIDTH;
    let end_at = (AXIS_WIDTH + width).saturating_sub(end.len()).max(start_at + start.len() + 1);
    put(&mut line, start_at, &start);
    put(&mut line, end_at, &end);

    let mid_at = (AXIS_WIDTH + width / 2).saturating_sub(mid.len() / 2);
    if mid_at > start_at + start.len() && mid_at + mid.len() < end_at {
        put(&mut line, mid_at, &mid);
    }

    line.into_iter().collect::<String>().trim_end().to_string()
}

/// One-line trend of the values using eight block heights
pub fn sparkline(points: &[DataPoint], width: usize) -> String {
    if points.is_empty() || width == 0 {
        return String::new();
    }

    let (min, max) = match points.iter().map(|p| p.value).minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => return String::new(),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let range = (max - min).max(1.0);
    let step = (points.len() as f64 / width as f64).max(1.0);

    (0..width)
        .map(|i| (i as f64 * step) as usize)
        .take_while(|&idx| idx < points.len())
        .map(|idx| {
            let normalized = (points[idx].value - min) / range;
            let level = (normalized * (SPARK_GLYPHS.len() - 1) as f64) as usize;
            SPARK_GLYPHS[level.min(SPARK_GLYPHS.len() - 1)]
        })
        .collect()
}
