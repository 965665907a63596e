use crate::aggregate::display_date;
use crate::models::{ChartData, ChartSeries, WritingRow};
use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

pub const PALETTE: [&str; 8] = [
    "#3366CC", "#DC3912", "#FF9900", "#109618", "#990099", "#3B3EAC", "#0099C6", "#DD4477",
];

pub fn pick_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Groups rows into one series per book title, aligned on the distinct days
/// present in `rows`. Labels follow calendar order; books keep first-seen
/// order. Rows sharing a (day, book) pair are summed.
pub fn build_series(rows: &[WritingRow]) -> ChartData {
    let dates: Vec<NaiveDate> = rows
        .iter()
        .map(|row| row.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut series: Vec<ChartSeries> = Vec::new();
    for row in rows {
        let Ok(slot) = dates.binary_search(&row.date) else {
            continue;
        };
        let index = match series.iter().position(|entry| entry.name == row.book_title) {
            Some(index) => index,
            None => {
                series.push(ChartSeries {
                    name: row.book_title.clone(),
                    values: vec![0; dates.len()],
                    color: pick_color(series.len()).to_string(),
                });
                series.len() - 1
            }
        };
        let value = &mut series[index].values[slot];
        *value = value.saturating_add(row.words);
    }

    ChartData {
        labels: dates.into_iter().map(display_date).collect(),
        series,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    SurfaceUnavailable(String),
    Draw(String),
    Released,
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceUnavailable(reason) => write!(f, "chart surface unavailable: {reason}"),
            Self::Draw(reason) => write!(f, "chart drawing failed: {reason}"),
            Self::Released => write!(f, "chart surface already released"),
        }
    }
}

impl std::error::Error for ChartError {}

/// Something a line chart can be drawn onto.
pub trait ChartSurface {
    fn draw(&mut self, data: &ChartData) -> Result<(), ChartError>;
    fn release(&mut self);
}

/// Owns a surface and the data last drawn on it. Every update replaces the
/// whole dataset. The surface is released on [`LineChart::teardown`] or drop.
pub struct LineChart<S: ChartSurface> {
    surface: Option<S>,
    data: ChartData,
}

impl<S: ChartSurface> LineChart<S> {
    pub fn mount(mut surface: S, rows: &[WritingRow]) -> Result<Self, ChartError> {
        let data = build_series(rows);
        surface.draw(&data)?;
        Ok(Self {
            surface: Some(surface),
            data,
        })
    }

    pub fn update(&mut self, rows: &[WritingRow]) -> Result<(), ChartError> {
        let surface = self.surface.as_mut().ok_or(ChartError::Released)?;
        self.data = build_series(rows);
        surface.draw(&self.data)
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.release();
            debug!("chart surface released");
        }
    }
}

impl<S: ChartSurface> Drop for LineChart<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

const FONT: &str = "sans-serif";
const MARGIN: u32 = 12;
const LABEL_AREA: u32 = 40;
const LINE_WIDTH: u32 = 2;
const POINT_RADIUS: u32 = 3;

/// Renders charts into a standalone SVG document.
#[derive(Debug, Default)]
pub struct SvgSurface {
    width: u32,
    height: u32,
    document: Option<String>,
    released: bool,
}

impl SvgSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            document: None,
            released: false,
        }
    }

    pub fn svg(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl ChartSurface for SvgSurface {
    fn draw(&mut self, data: &ChartData) -> Result<(), ChartError> {
        if self.released {
            return Err(ChartError::Released);
        }
        if self.width == 0 || self.height == 0 {
            return Err(ChartError::SurfaceUnavailable(format!(
                "invalid dimensions {}x{}",
                self.width, self.height
            )));
        }
        self.document = Some(render_svg(data, (self.width, self.height))?);
        Ok(())
    }

    fn release(&mut self) {
        self.document = None;
        self.released = true;
    }
}

fn draw_err<E: fmt::Display>(err: E) -> ChartError {
    ChartError::Draw(err.to_string())
}

fn render_svg(data: &ChartData, size: (u32, u32)) -> Result<String, ChartError> {
    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        if data.labels.is_empty() || data.series.is_empty() {
            let center = ((size.0 / 2) as i32, (size.1 / 2) as i32);
            let style = TextStyle::from((FONT, 16).into_font())
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            root.draw(&Text::new("No data yet", center, style))
                .map_err(draw_err)?;
        } else {
            draw_lines(&root, data)?;
        }

        root.present().map_err(draw_err)?;
    }
    Ok(out)
}

fn draw_lines(root: &DrawingArea<SVGBackend<'_>, Shift>, data: &ChartData) -> Result<(), ChartError> {
    let points = data.labels.len();
    let max = data
        .series
        .iter()
        .flat_map(|series| series.values.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1);
    let y_top = max.saturating_add(max / 10).max(max.saturating_add(1));

    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .x_label_area_size(LABEL_AREA)
        .y_label_area_size(LABEL_AREA + 10)
        .build_cartesian_2d(0usize..points.saturating_sub(1).max(1), 0u64..y_top)
        .map_err(draw_err)?;

    let x_label_formatter = |index: &usize| data.labels.get(*index).cloned().unwrap_or_default();
    chart
        .configure_mesh()
        .x_labels(points.max(2))
        .y_labels(5)
        .x_label_formatter(&x_label_formatter)
        .x_desc("Date")
        .y_desc("Words")
        .label_style((FONT, 11))
        .draw()
        .map_err(draw_err)?;

    for series in &data.series {
        let color = parse_hex(&series.color);
        let line = series.values.iter().enumerate().map(|(index, value)| (index, *value));
        chart
            .draw_series(LineSeries::new(line, color.stroke_width(LINE_WIDTH)))
            .map_err(draw_err)?
            .label(series.name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(LINE_WIDTH))
            });
        chart
            .draw_series(
                series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(index, value)| Circle::new((index, *value), POINT_RADIUS, color.filled())),
            )
            .map_err(draw_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, 11))
        .draw()
        .map_err(draw_err)?;

    Ok(())
}

/// Palette entries are `#rrggbb`; anything else draws black.
fn parse_hex(color: &str) -> RGBColor {
    let channel = |range: std::ops::Range<usize>| {
        color
            .get(range)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .unwrap_or(0)
    };
    if color.len() != 7 || !color.starts_with('#') {
        return BLACK;
    }
    RGBColor(channel(1..3), channel(3..5), channel(5..7))
}
