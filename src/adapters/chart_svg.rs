//! Three-panel SVG indicator chart.
//!
//! Panel 1: close and SMA-20. Panel 2: RSI-14 with 70/30 guides.
//! Panel 3: MACD line, signal line and histogram bars.

use crate::domain::error::TickerError;
use crate::domain::indicator::IndicatorColumn;
use crate::domain::ohlcv::validate_ticker;
use crate::domain::report::TickerReport;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const CHART_WIDTH: f64 = 1000.0;
const PANEL_HEIGHT: f64 = 220.0;
const PANEL_GAP: f64 = 30.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 30.0;

const CLOSE_COLOR: &str = "#2563eb";
const SMA_COLOR: &str = "#f59e0b";
const RSI_COLOR: &str = "#7c3aed";
const MACD_COLOR: &str = "#2563eb";
const SIGNAL_COLOR: &str = "#dc2626";
const HIST_UP_COLOR: &str = "#16a34a";
const HIST_DOWN_COLOR: &str = "#dc2626";

/// Vertical placement and value range of one panel.
struct Panel {
    top: f64,
    min: f64,
    max: f64,
}

impl Panel {
    fn new(index: usize, min: f64, max: f64) -> Self {
        let (min, max) = if max > min {
            (min, max)
        } else {
            (min - 1.0, max + 1.0)
        };
        Self {
            top: MARGIN_TOP + index as f64 * (PANEL_HEIGHT + PANEL_GAP),
            min,
            max,
        }
    }

    fn y(&self, v: f64) -> f64 {
        self.top + PANEL_HEIGHT - (v - self.min) / (self.max - self.min) * PANEL_HEIGHT
    }

    fn bottom(&self) -> f64 {
        self.top + PANEL_HEIGHT
    }
}

/// Escape text for use inside an SVG element or attribute.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn x_scale(i: usize, len: usize) -> f64 {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    MARGIN_LEFT + (i as f64 / (len.saturating_sub(1)).max(1) as f64) * plot_width
}

fn value_range<'a>(columns: impl IntoIterator<Item = &'a [Option<f64>]>) -> Option<(f64, f64)> {
    columns
        .into_iter()
        .flatten()
        .flatten()
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Path data for a series; each undefined cell starts a new segment.
fn path_data(values: &[Option<f64>], panel: &Panel) -> String {
    let mut data = String::new();
    let mut pen_down = false;
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                if !data.is_empty() {
                    data.push(' ');
                }
                data.push_str(&format!(
                    "{} {:.1} {:.1}",
                    cmd,
                    x_scale(i, values.len()),
                    panel.y(*v)
                ));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    data
}

fn push_series(svg: &mut String, values: &[Option<f64>], panel: &Panel, color: &str, label: &str) {
    let data = path_data(values, panel);
    if data.is_empty() {
        return;
    }
    svg.push_str(&format!(
        "  <path class=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
        label, data, color
    ));
}

fn push_hline(svg: &mut String, y: f64, dashed: bool) {
    let dash = if dashed { " stroke-dasharray=\"4 4\"" } else { "" };
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#999\" stroke-width=\"1\"{}/>\n",
        MARGIN_LEFT,
        y,
        CHART_WIDTH - MARGIN_RIGHT,
        y,
        dash
    ));
}

fn push_frame(svg: &mut String, panel: &Panel, title: &str) {
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{:.1}\" font-size=\"12\" fill=\"#333\">{}</text>\n",
        MARGIN_LEFT,
        panel.top - 6.0,
        title
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        panel.top,
        MARGIN_LEFT,
        panel.bottom()
    ));
    for v in [panel.max, panel.min] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
            MARGIN_LEFT - 5.0,
            panel.y(v) + 4.0,
            v
        ));
    }
}

fn push_histogram(svg: &mut String, values: &[Option<f64>], panel: &Panel) {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let bar_width = (plot_width / values.len().max(1) as f64 * 0.8).max(0.5);
    let zero = panel.y(0.0);
    for (i, value) in values.iter().enumerate() {
        let Some(v) = value else { continue };
        let y = panel.y(*v);
        let color = if *v >= 0.0 { HIST_UP_COLOR } else { HIST_DOWN_COLOR };
        svg.push_str(&format!(
            "  <rect class=\"macd_hist\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>\n",
            x_scale(i, values.len()) - bar_width / 2.0,
            y.min(zero),
            bar_width,
            (y - zero).abs(),
            color
        ));
    }
}

/// Render the report as a standalone SVG document.
pub fn render_chart(report: &TickerReport) -> String {
    let closes: Vec<Option<f64>> = report.closes().into_iter().map(Some).collect();
    let sma = report.column(IndicatorColumn::Sma20);
    let rsi = report.column(IndicatorColumn::Rsi14);
    let macd = report.column(IndicatorColumn::Macd);
    let signal = report.column(IndicatorColumn::MacdSignal);
    let hist = report.column(IndicatorColumn::MacdHist);

    let height = MARGIN_TOP + 3.0 * PANEL_HEIGHT + 2.0 * PANEL_GAP + MARGIN_BOTTOM;
    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, height, CHART_WIDTH, height
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"20\" font-size=\"14\" font-weight=\"bold\" fill=\"#111\">{} indicators</text>\n",
        MARGIN_LEFT,
        escape_xml(&report.ticker)
    ));

    let (lo, hi) = value_range([closes.as_slice(), sma.as_slice()]).unwrap_or((0.0, 1.0));
    let price = Panel::new(0, lo, hi);
    push_frame(&mut svg, &price, "Close / SMA 20");
    push_series(&mut svg, &closes, &price, CLOSE_COLOR, "close");
    push_series(&mut svg, &sma, &price, SMA_COLOR, "sma_20");

    let momentum = Panel::new(1, 0.0, 100.0);
    push_frame(&mut svg, &momentum, "RSI 14");
    push_hline(&mut svg, momentum.y(70.0), true);
    push_hline(&mut svg, momentum.y(30.0), true);
    push_series(&mut svg, &rsi, &momentum, RSI_COLOR, "rsi_14");

    let (lo, hi) = value_range([macd.as_slice(), signal.as_slice(), hist.as_slice()])
        .map(|(lo, hi)| (lo.min(0.0), hi.max(0.0)))
        .unwrap_or((-1.0, 1.0));
    let trend = Panel::new(2, lo, hi);
    push_frame(&mut svg, &trend, "MACD 12/26/9");
    push_hline(&mut svg, trend.y(0.0), false);
    push_histogram(&mut svg, &hist, &trend);
    push_series(&mut svg, &macd, &trend, MACD_COLOR, "macd");
    push_series(&mut svg, &signal, &trend, SIGNAL_COLOR, "macd_signal");

    if let (Some(first), Some(last)) = (report.rows.first(), report.rows.last()) {
        let y = height - 8.0;
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"start\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT, y, first.date
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            CHART_WIDTH - MARGIN_RIGHT,
            y,
            last.date
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Writes `<TICKER>_indicators.svg` into the output directory.
pub struct SvgChartAdapter {
    output_dir: PathBuf,
}

impl SvgChartAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

impl ReportPort for SvgChartAdapter {
    fn name(&self) -> &'static str {
        "svg-chart"
    }

    fn write(&self, report: &TickerReport) -> Result<PathBuf, TickerError> {
        let stem = validate_ticker(&report.ticker)?;
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}_indicators.svg", stem));
        fs::write(&path, render_chart(report))?;
        debug!(ticker = %report.ticker, path = %path.display(), "chart written");
        Ok(path)
    }
}
