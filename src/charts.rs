//! Chart rendering
//!
//! Each dataset has a fixed battery of PNG charts written to the plots
//! directory. Rendering is best effort: a chart that fails is logged and left
//! out of the returned references, and the run carries on.
//!
//! Text needs a TrueType font. The first usable font (configured path, then a
//! few well-known system locations) is registered once per process.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ChartStyle;
use crate::error::PlotError;
use crate::features::{group_by_month, group_by_weekday};
use crate::merge::SleepActivityRecord;
use crate::table::Dated;
use crate::types::{Dataset, DerivedActivity, DerivedActivityStage, DerivedSleep};

const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const HISTOGRAM_BINS: usize = 20;

static FONT: OnceLock<Result<PathBuf, String>> = OnceLock::new();

/// Register the TrueType file at `path` under [`FONT_FAMILY`]
fn register_font_file(path: &Path) -> Result<(), PlotError> {
    let bytes = fs::read(path).map_err(|e| PlotError::Font(format!("{}: {}", path.display(), e)))?;
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| PlotError::Font(format!("{} is not a usable TrueType font", path.display())))
}

/// Register the chart font. The first call decides for the whole process.
fn ensure_font(style: &ChartStyle) -> Result<(), PlotError> {
    let registered = FONT.get_or_init(|| {
        let candidates = style
            .font_path
            .iter()
            .cloned()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
        for path in candidates {
            match register_font_file(&path) {
                Ok(()) => {
                    debug!("Registered chart font {}", path.display());
                    return Ok(path);
                }
                Err(e) => debug!("{}", e),
            }
        }
        Err("no TrueType font found; set charts.font_path".to_string())
    });

    registered
        .as_ref()
        .map(|_| ())
        .map_err(|e| PlotError::Font(e.clone()))
}

/// Font the charts are drawn with, registering it if needed
pub fn chart_font(style: &ChartStyle) -> Result<PathBuf, PlotError> {
    ensure_font(style)?;
    match FONT.get() {
        Some(Ok(path)) => Ok(path.clone()),
        Some(Err(e)) => Err(PlotError::Font(e.clone())),
        None => Err(PlotError::Font("font not registered".to_string())),
    }
}

/// A rendered chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotReference {
    pub dataset: Dataset,
    pub name: String,
    pub path: PathBuf,
}

impl PlotReference {
    /// File name line followed by a Markdown image link
    pub fn markdown(&self) -> String {
        let file_name = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.png", self.name));
        format!("{}\n![image]({})", file_name, self.path.display())
    }
}

/// Axis range covering `values` with a small margin; `None` without finite values
fn axis_range(values: &[f64]) -> Option<Range<f64>> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()?;
    let (lo, hi) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo == hi {
        return Some(lo - 1.0..hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    Some(lo - pad..hi + pad)
}

/// Equal-width bins over the finite values: (start, bin width, counts)
fn histogram_bins(values: &[f64], bins: usize) -> Option<(f64, f64, Vec<u32>)> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let lo = finite.iter().copied().reduce(f64::min)?;
    let hi = finite.iter().copied().reduce(f64::max)?;
    let bins = bins.max(1);
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

    let mut counts = vec![0u32; bins];
    for v in finite {
        let index = (((v - lo) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }
    Some((lo, width, counts))
}

fn number_label(value: &f64) -> String {
    if value.abs() >= 100.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn is_finite_point(point: &&(f64, f64)) -> bool {
    point.0.is_finite() && point.1.is_finite()
}

fn scatter(
    path: &Path,
    style: &ChartStyle,
    title: &str,
    axes: (&str, &str),
    series: &[(&str, Vec<(f64, f64)>)],
    x_label: &dyn Fn(&f64) -> String,
) -> Result<(), PlotError> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = series
        .iter()
        .flat_map(|(_, points)| points.iter().filter(is_finite_point))
        .copied()
        .unzip();
    let x_range = axis_range(&xs).ok_or(PlotError::NoData)?;
    let y_range = axis_range(&ys).ok_or(PlotError::NoData)?;

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, style.title_font_size as f64))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(axes.0)
        .y_desc(axes.1)
        .label_style((FONT_FAMILY, style.label_font_size as f64))
        .axis_desc_style((FONT_FAMILY, style.label_font_size as f64))
        .x_label_formatter(x_label)
        .y_label_formatter(&number_label)
        .draw()?;

    for (i, (label, points)) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(
                points
                    .iter()
                    .filter(is_finite_point)
                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
            )?
            .label(*label)
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .label_font((FONT_FAMILY, style.label_font_size as f64))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn boxplot(
    path: &Path,
    style: &ChartStyle,
    title: &str,
    axes: (&str, &str),
    groups: &[(&'static str, Vec<f64>)],
) -> Result<(), PlotError> {
    // Every category stays on the axis; empty ones get no box
    let names: Vec<&str> = groups.iter().map(|(name, _)| *name).collect();
    let boxes: Vec<(usize, Vec<f32>)> = groups
        .iter()
        .enumerate()
        .map(|(i, (_, values))| {
            let finite: Vec<f32> = values
                .iter()
                .filter(|v| v.is_finite())
                .map(|v| *v as f32)
                .collect();
            (i, finite)
        })
        .filter(|(_, values)| !values.is_empty())
        .collect();

    let all: Vec<f64> = boxes
        .iter()
        .flat_map(|(_, values)| values.iter().map(|v| *v as f64))
        .collect();
    let y_range = axis_range(&all).ok_or(PlotError::NoData)?;

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, style.title_font_size as f64))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(
            names[..].into_segmented(),
            y_range.start as f32..y_range.end as f32,
        )?;

    chart
        .configure_mesh()
        .x_desc(axes.0)
        .y_desc(axes.1)
        .x_labels(names.len() + 1)
        .label_style((FONT_FAMILY, style.label_font_size as f64))
        .axis_desc_style((FONT_FAMILY, style.label_font_size as f64))
        .x_label_formatter(&|v| match v {
            SegmentValue::Exact(name) | SegmentValue::CenterOf(name) => name.to_string(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    let color = Palette99::pick(0).to_rgba();
    chart.draw_series(boxes.iter().map(|(i, values)| {
        Boxplot::new_vertical(SegmentValue::CenterOf(&names[*i]), &Quartiles::new(values))
            .width(30)
            .whisker_width(0.5)
            .style(color)
    }))?;

    root.present()?;
    Ok(())
}

fn histogram(
    path: &Path,
    style: &ChartStyle,
    title: &str,
    axes: (&str, &str),
    values: &[f64],
) -> Result<(), PlotError> {
    let (start, width, counts) = histogram_bins(values, HISTOGRAM_BINS).ok_or(PlotError::NoData)?;
    let max_count = counts.iter().copied().max().unwrap_or(1).max(1) as f64;
    let end = start + width * counts.len() as f64;

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, style.title_font_size as f64))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(start..end, 0.0..max_count * 1.1)?;

    chart
        .configure_mesh()
        .x_desc(axes.0)
        .y_desc(axes.1)
        .label_style((FONT_FAMILY, style.label_font_size as f64))
        .axis_desc_style((FONT_FAMILY, style.label_font_size as f64))
        .x_label_formatter(&number_label)
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = start + i as f64 * width;
        Rectangle::new([(x0, 0.0), (x0 + width, count as f64)], BLUE.mix(0.6).filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Days since the earliest date of `rows`, for date x axes
fn day_offsets<T: Dated>(rows: &[T]) -> Option<(NaiveDate, Vec<f64>)> {
    let first = rows.iter().map(Dated::date).min()?;
    let offsets = rows
        .iter()
        .map(|r| (r.date() - first).num_days() as f64)
        .collect();
    Some((first, offsets))
}

/// Renders the chart battery of each dataset into one directory
pub struct ChartRenderer<'a> {
    directory: &'a Path,
    style: &'a ChartStyle,
    ready: bool,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(directory: &'a Path, style: &'a ChartStyle) -> Self {
        let ready = style.enabled
            && match ensure_font(style) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Charts skipped: {}", e);
                    false
                }
            };
        Self {
            directory,
            style,
            ready,
        }
    }

    /// Whether charts will be drawn at all
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn attempt(
        &self,
        dataset: Dataset,
        name: &str,
        draw: impl FnOnce(&Path, &ChartStyle) -> Result<(), PlotError>,
    ) -> Option<PlotReference> {
        let path = self.directory.join(format!("{name}.png"));
        match draw(&path, self.style) {
            Ok(()) => {
                debug!("Rendered {}", path.display());
                Some(PlotReference {
                    dataset,
                    name: name.to_string(),
                    path,
                })
            }
            Err(e) => {
                warn!("Chart {} not rendered: {}", name, e);
                None
            }
        }
    }

    fn finish(&self, dataset: Dataset, plots: Vec<Option<PlotReference>>) -> Vec<PlotReference> {
        let plots: Vec<PlotReference> = plots.into_iter().flatten().collect();
        info!("Rendered {} {} charts", plots.len(), dataset);
        plots
    }

    pub fn sleep(&self, rows: &[DerivedSleep]) -> Vec<PlotReference> {
        if !self.ready {
            return Vec::new();
        }
        let Some((first, days)) = day_offsets(rows) else {
            return Vec::new();
        };
        let date_label = move |x: &f64| (first + Duration::days(x.round() as i64)).to_string();
        let hours = |pick: fn(&DerivedSleep) -> f64| -> Vec<(f64, f64)> {
            days.iter().copied().zip(rows.iter().map(pick)).collect()
        };
        let d = Dataset::Sleep;

        let plots = vec![
            self.attempt(d, "sleep_hours_scatterplot", |p, s| {
                let series = [("Total sleep", hours(|r| r.total_sleep_time_hours))];
                scatter(p, s, "Sleep hours", ("Date", "Hours"), &series, &date_label)
            }),
            self.attempt(d, "sleep_hours_per_start_weekday_boxplot", |p, s| {
                let groups = group_by_weekday(rows, |r| r.start_calendar.weekday, |r| r.total_sleep_time_hours);
                boxplot(p, s, "Sleep hours per start weekday", ("Weekday", "Hours"), &groups)
            }),
            self.attempt(d, "sleep_hours_per_stop_weekday_boxplot", |p, s| {
                let groups = group_by_weekday(rows, |r| r.stop_calendar.weekday, |r| r.total_sleep_time_hours);
                boxplot(p, s, "Sleep hours per stop weekday", ("Weekday", "Hours"), &groups)
            }),
            self.attempt(d, "sleep_hours_per_start_month_boxplot", |p, s| {
                let groups = group_by_month(rows, |r| r.start_calendar.month, |r| r.total_sleep_time_hours);
                boxplot(p, s, "Sleep hours per start month", ("Month", "Hours"), &groups)
            }),
            self.attempt(d, "sleep_start_time_per_weekday_boxplot", |p, s| {
                let groups = group_by_weekday(rows, |r| r.start_calendar.weekday, |r| r.start_time_real);
                boxplot(p, s, "Sleep start time per weekday", ("Weekday", "Hour of day"), &groups)
            }),
            self.attempt(d, "sleep_stop_time_per_weekday_boxplot", |p, s| {
                let groups = group_by_weekday(rows, |r| r.stop_calendar.weekday, |r| r.stop_time_real);
                boxplot(p, s, "Sleep stop time per weekday", ("Weekday", "Hour of day"), &groups)
            }),
            self.attempt(d, "sleep_start_and_stop_time_scatterplot", |p, s| {
                let series = [
                    ("Start", hours(|r| r.start_time_real)),
                    ("Stop", hours(|r| r.stop_time_real)),
                ];
                scatter(p, s, "Sleep start and stop time", ("Date", "Hour of day"), &series, &date_label)
            }),
        ];
        self.finish(d, plots)
    }

    pub fn activity(&self, rows: &[DerivedActivity]) -> Vec<PlotReference> {
        if !self.ready {
            return Vec::new();
        }
        let steps = |r: &DerivedActivity| r.raw.steps as f64;
        let distance = |r: &DerivedActivity| r.raw.distance;
        let d = Dataset::Activity;

        let plots = vec![
            self.attempt(d, "activity_steps_distance_scatterplot", |p, s| {
                let points: Vec<(f64, f64)> = rows.iter().map(|r| (steps(r), distance(r))).collect();
                let series = [("Days", points)];
                scatter(p, s, "Steps and distance", ("Steps", "Distance, (meters)"), &series, &number_label)
            }),
            self.attempt(d, "activity_steps_per_weekday_boxplot", |p, s| {
                let groups = group_by_weekday(rows, |r| r.calendar.weekday, steps);
                boxplot(p, s, "Steps per weekday", ("Weekday", "Steps"), &groups)
            }),
            self.attempt(d, "activity_steps_per_month_boxplot", |p, s| {
                let groups = group_by_month(rows, |r| r.calendar.month, steps);
                boxplot(p, s, "Steps per month", ("Month", "Steps"), &groups)
            }),
            self.attempt(d, "activity_distance_per_weekday_boxplot", |p, s| {
                let groups = group_by_weekday(rows, |r| r.calendar.weekday, distance);
                boxplot(p, s, "Distance per weekday", ("Weekday", "Distance, (meters)"), &groups)
            }),
            self.attempt(d, "activity_distance_per_month_boxplot", |p, s| {
                let groups = group_by_month(rows, |r| r.calendar.month, distance);
                boxplot(p, s, "Distance per month", ("Month", "Distance, (meters)"), &groups)
            }),
        ];
        self.finish(d, plots)
    }

    pub fn sleep_activity(&self, rows: &[SleepActivityRecord]) -> Vec<PlotReference> {
        if !self.ready {
            return Vec::new();
        }
        let d = Dataset::SleepActivity;
        let plots = vec![self.attempt(d, "sleep_activity_steps_sleep_scatterplot", |p, s| {
            let points: Vec<(f64, f64)> = rows
                .iter()
                .map(|r| (r.steps as f64, r.total_sleep_time_hours))
                .collect();
            let series = [("Days", points)];
            scatter(p, s, "Steps and sleep hours", ("Steps", "Sleep hours"), &series, &number_label)
        })];
        self.finish(d, plots)
    }

    pub fn activity_stage(&self, rows: &[DerivedActivityStage]) -> Vec<PlotReference> {
        if !self.ready {
            return Vec::new();
        }
        let d = Dataset::ActivityStage;
        let plots = vec![
            self.attempt(d, "activity_stage_histplot_km_h", |p, s| {
                let speeds: Vec<f64> = rows.iter().map(|r| r.kilometers_per_hour).collect();
                histogram(p, s, "Activity stage speed", ("km/h", "Stages"), &speeds)
            }),
            self.attempt(d, "activity_stage_start_hour_and_steps_scatterplot", |p, s| {
                let points: Vec<(f64, f64)> = rows
                    .iter()
                    .map(|r| (r.start_hour, r.raw.steps as f64))
                    .collect();
                let series = [("Stages", points)];
                scatter(p, s, "Stage start hour and steps", ("Start hour", "Steps"), &series, &number_label)
            }),
        ];
        self.finish(d, plots)
    }
}
