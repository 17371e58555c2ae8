//! Explicit drawing context for P–v diagrams.
//!
//! A [`Figure`] collects line series, axis limits, scales, labels and a
//! title, then renders everything with `plotters` on [`Figure::save`].
//! The output format follows the file extension: `.svg` goes through the
//! SVG backend, anything else through the bitmap backend (PNG, JPEG, …).
//!
//! Points that are not finite, or not positive on a logarithmic axis, break
//! a line into separate segments. Segments leaving the visible window are
//! clipped to it.

use std::path::Path;
use std::sync::OnceLock;

use log::{debug, warn};
use plotters::coord::Shift;
use plotters::coord::ranged1d::{AsRangedCoord, ValueFormatter};
use plotters::prelude::*;
use plotters::style::FontStyle;

use crate::error::*;

/// matplotlib's default colour cycle (`tab10`).
pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const FONT_FAMILY: &str = "sans-serif";

/// Axis scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

impl Scale {
    fn admits(self, value: f64) -> bool {
        value.is_finite() && (self == Scale::Linear || value > 0.0)
    }

    fn forward(self, value: f64) -> f64 {
        match self {
            Scale::Linear => value,
            Scale::Log => value.log10(),
        }
    }

    fn inverse(self, value: f64) -> f64 {
        match self {
            Scale::Linear => value,
            Scale::Log => 10f64.powf(value),
        }
    }
}

/// One polyline of the figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    /// Stroke width in pixels.
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    series: Vec<Series>,
    xlim: Option<(f64, f64)>,
    ylim: Option<(f64, f64)>,
    xscale: Scale,
    yscale: Scale,
    legend: bool,
    xlabel: String,
    ylabel: String,
    title: String,
    size: (u32, u32),
    next_color: usize,
}

impl Default for Figure {
    fn default() -> Self {
        Self::new()
    }
}

impl Figure {
    /// Blank 800×600 figure.
    pub fn new() -> Self {
        Self::with_size(800, 600)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            series: Vec::new(),
            xlim: None,
            ylim: None,
            xscale: Scale::Linear,
            yscale: Scale::Linear,
            legend: false,
            xlabel: String::new(),
            ylabel: String::new(),
            title: String::new(),
            size: (width, height),
            next_color: 0,
        }
    }

    // ── Building ─────────────────────────────────────────────────────

    /// Add a line in the next colour of the cycle.
    pub fn plot(&mut self, points: Vec<(f64, f64)>, label: Option<String>) {
        let color = TAB10[self.next_color % TAB10.len()];
        self.next_color += 1;
        self.plot_styled(points, label, color, 2);
    }

    /// Add a line with an explicit colour and width.
    pub fn plot_styled(
        &mut self,
        points: Vec<(f64, f64)>,
        label: Option<String>,
        color: RGBColor,
        width: u32,
    ) {
        self.series.push(Series { label, points, color, width });
    }

    pub fn set_xlim(&mut self, low: f64, high: f64) {
        self.xlim = Some((low, high));
    }

    pub fn set_ylim(&mut self, low: f64, high: f64) {
        self.ylim = Some((low, high));
    }

    pub fn set_xscale(&mut self, scale: Scale) {
        self.xscale = scale;
    }

    pub fn set_yscale(&mut self, scale: Scale) {
        self.yscale = scale;
    }

    pub fn set_legend(&mut self, legend: bool) {
        self.legend = legend;
    }

    pub fn set_xlabel(&mut self, label: impl Into<String>) {
        self.xlabel = label.into();
    }

    pub fn set_ylabel(&mut self, label: impl Into<String>) {
        self.ylabel = label.into();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Reset to a blank figure of the same size.
    pub fn clear(&mut self) {
        *self = Self::with_size(self.size.0, self.size.1);
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn xlim(&self) -> Option<(f64, f64)> {
        self.xlim
    }

    pub fn ylim(&self) -> Option<(f64, f64)> {
        self.ylim
    }

    pub fn xscale(&self) -> Scale {
        self.xscale
    }

    pub fn yscale(&self) -> Scale {
        self.yscale
    }

    pub fn has_legend(&self) -> bool {
        self.legend
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn xlabel(&self) -> &str {
        &self.xlabel
    }

    pub fn ylabel(&self) -> &str {
        &self.ylabel
    }

    /// True for a freshly created or cleared figure.
    pub fn is_blank(&self) -> bool {
        *self == Self::with_size(self.size.0, self.size.1)
    }

    // ── Geometry ─────────────────────────────────────────────────────

    /// Horizontal window: the explicit limits, or the data extent.
    pub fn x_range(&self) -> (f64, f64) {
        self.xlim.unwrap_or_else(|| {
            let xs = self.admitted_points().map(|(x, _)| x);
            autoscale(xs, self.xscale)
        })
    }

    /// Vertical window: the explicit limits, or the extent of the data
    /// lying inside the horizontal window.
    pub fn y_range(&self) -> (f64, f64) {
        self.ylim.unwrap_or_else(|| {
            let (x0, x1) = self.x_range();
            let ys = self
                .admitted_points()
                .filter(|&(x, _)| x >= x0.min(x1) && x <= x0.max(x1))
                .map(|(_, y)| y);
            autoscale(ys, self.yscale)
        })
    }

    fn admitted_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .filter(|&(x, y)| self.xscale.admits(x) && self.yscale.admits(y))
    }

    /// Drawable pieces of `series` once masked and clipped to the window.
    pub fn visible_segments(&self, series: &Series) -> Vec<Vec<(f64, f64)>> {
        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();
        let window = Window {
            x: (self.xscale.forward(x0.min(x1)), self.xscale.forward(x0.max(x1))),
            y: (self.yscale.forward(y0.min(y1)), self.yscale.forward(y0.max(y1))),
        };

        let mut segments = Vec::new();
        let mut run: Vec<(f64, f64)> = Vec::new();
        let mut run_open = false;

        for pair in series.points.windows(2) {
            let (p, q) = (pair[0], pair[1]);
            let admitted = |(x, y): (f64, f64)| self.xscale.admits(x) && self.yscale.admits(y);
            if !admitted(p) || !admitted(q) {
                flush(&mut segments, &mut run);
                run_open = false;
                continue;
            }

            let a = (self.xscale.forward(p.0), self.yscale.forward(p.1));
            let b = (self.xscale.forward(q.0), self.yscale.forward(q.1));
            let Some((t0, t1)) = window.clip(a, b) else {
                flush(&mut segments, &mut run);
                run_open = false;
                continue;
            };

            let at = |t: f64| -> (f64, f64) {
                if t == 0.0 {
                    p
                } else if t == 1.0 {
                    q
                } else {
                    (
                        self.xscale.inverse(a.0 + t * (b.0 - a.0)),
                        self.yscale.inverse(a.1 + t * (b.1 - a.1)),
                    )
                }
            };

            if !(run_open && t0 == 0.0) {
                flush(&mut segments, &mut run);
                run.push(at(t0));
            }
            run.push(at(t1));
            run_open = t1 == 1.0;
        }
        flush(&mut segments, &mut run);
        segments
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Render the figure to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        debug!("rendering {} series to {}", self.series.len(), path.display());

        if is_svg {
            let root = SVGBackend::new(path, self.size).into_drawing_area();
            self.render(&root)
        } else {
            let root = BitMapBackend::new(path, self.size).into_drawing_area();
            self.render(&root)
        }
    }

    fn render<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE).map_err(plot_err)?;

        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();
        match (self.xscale, self.yscale) {
            (Scale::Linear, Scale::Linear) => self.draw_chart(root, x0..x1, y0..y1)?,
            (Scale::Log, Scale::Linear) => self.draw_chart(root, (x0..x1).log_scale(), y0..y1)?,
            (Scale::Linear, Scale::Log) => self.draw_chart(root, x0..x1, (y0..y1).log_scale())?,
            (Scale::Log, Scale::Log) => {
                self.draw_chart(root, (x0..x1).log_scale(), (y0..y1).log_scale())?
            }
        }

        root.present().map_err(plot_err)
    }

    fn draw_chart<DB, X, Y>(&self, root: &DrawingArea<DB, Shift>, x_coord: X, y_coord: Y) -> Result<()>
    where
        DB: DrawingBackend,
        X: AsRangedCoord<Value = f64>,
        Y: AsRangedCoord<Value = f64>,
        X::CoordDescType: ValueFormatter<f64>,
        Y::CoordDescType: ValueFormatter<f64>,
    {
        let text = font_available();

        let mut builder = ChartBuilder::on(root);
        builder
            .margin(15)
            .x_label_area_size(if text { 50 } else { 10 })
            .y_label_area_size(if text { 80 } else { 10 });
        if text && !self.title.is_empty() {
            builder.caption(&self.title, (FONT_FAMILY, 24).into_font());
        }
        let mut chart = builder.build_cartesian_2d(x_coord, y_coord).map_err(plot_err)?;

        let x_ticks = tick_formatter(self.x_range());
        let y_ticks = tick_formatter(self.y_range());
        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh();
        if text {
            mesh.x_desc(&self.xlabel)
                .y_desc(&self.ylabel)
                .x_label_formatter(&x_ticks)
                .y_label_formatter(&y_ticks)
                .label_style((FONT_FAMILY, 14).into_font());
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw().map_err(plot_err)?;

        for series in &self.series {
            let style = series.color.stroke_width(series.width);
            for segment in self.visible_segments(series) {
                chart.draw_series(LineSeries::new(segment, style)).map_err(plot_err)?;
            }
            if let (true, Some(label)) = (self.legend && text, &series.label) {
                chart
                    .draw_series(LineSeries::new(std::iter::empty::<(f64, f64)>(), style))
                    .map_err(plot_err)?
                    .label(label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
        }

        if self.legend && text {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font((FONT_FAMILY, 14).into_font())
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(plot_err)?;
        }
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn plot_err<E: std::fmt::Display>(err: E) -> AndrewsError {
    AndrewsError::Plot(err.to_string())
}

fn flush(segments: &mut Vec<Vec<(f64, f64)>>, run: &mut Vec<(f64, f64)>) {
    if run.len() >= 2 {
        segments.push(std::mem::take(run));
    } else {
        run.clear();
    }
}

/// Whether ticks of an axis spanning `range` are written in scientific
/// notation. One notation is used for every tick of an axis.
pub fn scientific_ticks(range: (f64, f64)) -> bool {
    [range.0, range.1].iter().any(|bound| {
        let magnitude = bound.abs();
        magnitude != 0.0 && !(1e-2..1e4).contains(&magnitude)
    })
}

/// Tick text with at most four significant decimals, trailing zeros
/// dropped: `0.0025`, `2.5e-3`, `1e6`.
pub fn tick_label(value: f64, scientific: bool) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if scientific {
        let formatted = format!("{value:.3e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{exponent}", trim_zeros(mantissa)),
            None => formatted,
        }
    } else {
        trim_zeros(&format!("{value:.4}")).to_string()
    }
}

fn tick_formatter(range: (f64, f64)) -> impl Fn(&f64) -> String {
    let scientific = scientific_ticks(range);
    move |value: &f64| tick_label(*value, scientific)
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Data extent with a small margin (multiplicative on a log axis).
fn autoscale(values: impl Iterator<Item = f64>, scale: Scale) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return match scale {
            Scale::Linear => (0.0, 1.0),
            Scale::Log => (1.0, 10.0),
        };
    }
    match scale {
        Scale::Linear if lo == hi => (lo - 0.5, hi + 0.5),
        Scale::Linear => {
            let pad = 0.05 * (hi - lo);
            (lo - pad, hi + pad)
        }
        Scale::Log if lo == hi => (lo / 2.0, hi * 2.0),
        Scale::Log => {
            let pad = 0.05 * (hi / lo).log10();
            (lo / 10f64.powf(pad), hi * 10f64.powf(pad))
        }
    }
}

/// Clip rectangle in transformed (linear or log10) coordinates.
struct Window {
    x: (f64, f64),
    y: (f64, f64),
}

impl Window {
    /// Liang–Barsky: parameter interval `[t0, t1]` of segment `a → b`
    /// inside the window, or `None`.
    fn clip(&self, a: (f64, f64), b: (f64, f64)) -> Option<(f64, f64)> {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let checks = [
            (-dx, a.0 - self.x.0),
            (dx, self.x.1 - a.0),
            (-dy, a.1 - self.y.0),
            (dy, self.y.1 - a.1),
        ];
        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in checks {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

// ── Fonts ───────────────────────────────────────────────────────────

/// Register a sans-serif font with plotters, once.
///
/// `ANDREWS_FONT` is tried first, then the usual system locations.
/// Returns `false` when no font could be loaded; charts are then drawn
/// without any text.
pub fn font_available() -> bool {
    static FONT: OnceLock<bool> = OnceLock::new();
    *FONT.get_or_init(|| {
        let mut candidates: Vec<String> = Vec::new();
        if let Ok(path) = std::env::var("ANDREWS_FONT") {
            candidates.push(path);
        }
        candidates.extend(standard_font_paths().iter().map(|p| p.to_string()));

        for path in &candidates {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
                Ok(()) => {
                    debug!("using font {path}");
                    return true;
                }
                Err(_) => warn!("{path} is not a usable font"),
            }
        }
        warn!("no font found (set ANDREWS_FONT to a .ttf file); charts will have no text");
        false
    })
}

fn standard_font_paths() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    let paths: &[&str] = &[
        r"C:\Windows\Fonts\arial.ttf",
        r"C:\Windows\Fonts\segoeui.ttf",
        r"C:\Windows\Fonts\calibri.ttf",
    ];
    #[cfg(target_os = "macos")]
    let paths: &[&str] = &[
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Geneva.ttf",
    ];
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let paths: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    ];
    paths
}
