use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::util::format_timestamp;

fn label_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(Option::<Label>::deserialize(deserializer)?.map(|label| match label {
        Label::Text(text) => text,
        Label::Integer(number) => number.to_string(),
        Label::Float(number) => number.to_string(),
    }))
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IntervalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "label_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<String>,
    pub starting_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(
        default,
        alias = "summarytweet",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SeriesRecord {
    #[serde(
        default,
        deserialize_with = "label_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<String>,
    pub times: Vec<IntervalRecord>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TimelineEntry {
    Series(SeriesRecord),
    Interval(IntervalRecord),
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TimelineData {
    #[serde(alias = "timeline_start_ts")]
    pub beginning: f64,
    #[serde(alias = "timeline_end_ts")]
    pub ending: f64,
    #[serde(default, alias = "timeline_data")]
    pub series: Vec<TimelineEntry>,
}

impl TimelineData {
    pub fn axis(&self) -> TimeAxis {
        TimeAxis::new(self.beginning, self.ending)
    }

    pub fn clusters(&self) -> Vec<TimelineCluster> {
        clusters_from_entries(&self.series)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineCluster {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub point: bool,
    pub series: usize,
    pub summary: Option<String>,
}

impl TimelineCluster {
    pub fn interval(id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            start,
            end: end.max(start),
            point: false,
            series: 0,
            summary: None,
        }
    }

    pub fn point(id: impl Into<String>, at: f64) -> Self {
        Self {
            id: id.into(),
            start: at,
            end: at,
            point: true,
            series: 0,
            summary: None,
        }
    }
}

fn cluster_from_record(record: &IntervalRecord, fallback_id: String, series: usize) -> TimelineCluster {
    let start = record.starting_time;
    let point = record.ending_time.is_none() || record.display.as_deref() == Some("circle");
    let end = if point {
        start
    } else {
        record.ending_time.unwrap_or(start).max(start)
    };

    TimelineCluster {
        id: record.id.clone().unwrap_or(fallback_id),
        start,
        end,
        point,
        series,
        summary: record.summary.clone(),
    }
}

pub fn clusters_from_entries(entries: &[TimelineEntry]) -> Vec<TimelineCluster> {
    let mut clusters = Vec::new();
    for (series, entry) in entries.iter().enumerate() {
        match entry {
            TimelineEntry::Series(record) => {
                let label = record
                    .label
                    .clone()
                    .unwrap_or_else(|| series.to_string());
                for (ordinal, time) in record.times.iter().enumerate() {
                    clusters.push(cluster_from_record(
                        time,
                        format!("{label}/{ordinal}"),
                        series,
                    ));
                }
            }
            TimelineEntry::Interval(record) => {
                let label = record
                    .label
                    .clone()
                    .unwrap_or_else(|| series.to_string());
                clusters.push(cluster_from_record(record, format!("{label}/0"), series));
            }
        }
    }
    clusters
}

/// Half-open axis `[beginning, ending)` in epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimeAxis {
    pub beginning: f64,
    pub ending: f64,
}

impl TimeAxis {
    pub fn new(beginning: f64, ending: f64) -> Self {
        Self { beginning, ending }
    }

    pub fn is_empty(&self) -> bool {
        !(self.ending > self.beginning)
    }

    pub fn span(&self) -> f64 {
        (self.ending - self.beginning).max(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Margin {
    pub top: f32,
    pub left: f32,
    pub right: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct TimelineConfig {
    pub width: f32,
    pub item_height: f32,
    pub item_margin: f32,
    pub margin: Margin,
    pub point_item_span: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            item_height: 15.0,
            item_margin: 5.0,
            margin: Margin {
                top: 30.0,
                left: 30.0,
                right: 30.0,
            },
            point_item_span: 15.0,
        }
    }
}

impl TimelineConfig {
    fn range(&self) -> (f32, f32) {
        let left = self.margin.left;
        (left, (self.width - self.margin.right).max(left))
    }

    fn scale(&self, axis: TimeAxis) -> TimeScale {
        let (left, right) = self.range();
        let pixels_per_ms = if axis.is_empty() {
            0.0
        } else {
            f64::from(right - left) / axis.span()
        };
        TimeScale {
            axis,
            left,
            pixels_per_ms,
        }
    }

    pub fn lane_top(&self, lane: usize) -> f32 {
        self.margin.top + lane as f32 * (self.item_height + self.item_margin)
    }
}

#[derive(Clone, Copy)]
struct TimeScale {
    axis: TimeAxis,
    left: f32,
    pixels_per_ms: f64,
}

impl TimeScale {
    fn x(&self, time: f64) -> f32 {
        self.left + ((time - self.axis.beginning) * self.pixels_per_ms) as f32
    }

    fn pixels_to_ms(&self, pixels: f32) -> f64 {
        if self.pixels_per_ms > 0.0 {
            f64::from(pixels) / self.pixels_per_ms
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScreenExtent {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl ScreenExtent {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedCluster {
    pub id: String,
    pub lane: usize,
    pub extent: ScreenExtent,
    pub series: usize,
    pub point: bool,
    pub start: f64,
    pub end: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TimelineLayout {
    pub lanes: usize,
    pub clusters: Vec<PlacedCluster>,
    pub omitted: usize,
}

impl TimelineLayout {
    pub fn cluster_at(&self, x: f32, y: f32) -> Option<&PlacedCluster> {
        self.clusters
            .iter()
            .find(|cluster| cluster.extent.contains(x, y))
    }

    pub fn height(&self, config: &TimelineConfig) -> f32 {
        config.lane_top(self.lanes) + config.margin.top
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisTick {
    pub time: f64,
    pub x: f32,
    pub label: String,
}

/// Assigns lanes greedily in ascending start order (ties keep input order)
/// and computes each cluster's clipped extent on screen. Clusters entirely
/// outside the axis are left out.
pub fn layout(clusters: &[TimelineCluster], axis: TimeAxis, config: &TimelineConfig) -> TimelineLayout {
    let mut result = TimelineLayout::default();
    if axis.is_empty() {
        result.omitted = clusters.len();
        if !clusters.is_empty() {
            debug!(omitted = result.omitted, "timeline axis is empty");
        }
        return result;
    }

    let scale = config.scale(axis);
    let half_point_ms = scale.pixels_to_ms(config.point_item_span) / 2.0;

    let mut order = clusters
        .iter()
        .enumerate()
        .filter(|(_, cluster)| {
            let inside = if cluster.point || cluster.start == cluster.end {
                cluster.start >= axis.beginning && cluster.start < axis.ending
            } else {
                cluster.start < axis.ending && cluster.end > axis.beginning
            };
            inside && cluster.start.is_finite() && cluster.end.is_finite()
        })
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    result.omitted = clusters.len() - order.len();
    order.sort_by(|&a, &b| clusters[a].start.total_cmp(&clusters[b].start));

    // Time at which each lane becomes free again.
    let mut lane_ends: Vec<f64> = Vec::new();
    for index in order {
        let cluster = &clusters[index];
        let (start, end) = (
            lane_start(cluster, half_point_ms),
            lane_end(cluster, half_point_ms),
        );
        let lane = match lane_ends.iter().position(|&free_at| free_at <= start) {
            Some(lane) => {
                lane_ends[lane] = end;
                lane
            }
            None => {
                lane_ends.push(end);
                lane_ends.len() - 1
            }
        };

        let clipped_start = cluster.start.max(axis.beginning);
        let clipped_end = cluster.end.min(axis.ending);
        let y0 = config.lane_top(lane);
        let extent = if cluster.point {
            let x = scale.x(clipped_start);
            let radius = config.item_height / 2.0;
            ScreenExtent {
                x0: x - radius,
                y0,
                x1: x + radius,
                y1: y0 + config.item_height,
            }
        } else {
            ScreenExtent {
                x0: scale.x(clipped_start),
                y0,
                x1: scale.x(clipped_end),
                y1: y0 + config.item_height,
            }
        };

        result.clusters.push(PlacedCluster {
            id: cluster.id.clone(),
            lane,
            extent,
            series: cluster.series,
            point: cluster.point,
            start: clipped_start,
            end: clipped_end.max(clipped_start),
            summary: cluster.summary.clone(),
        });
    }
    result.lanes = lane_ends.len();

    if result.omitted > 0 {
        debug!(omitted = result.omitted, "clusters outside the timeline axis");
    }
    result
}

fn lane_start(cluster: &TimelineCluster, half_point_ms: f64) -> f64 {
    if cluster.point {
        cluster.start - half_point_ms
    } else {
        cluster.start
    }
}

fn lane_end(cluster: &TimelineCluster, half_point_ms: f64) -> f64 {
    if cluster.point {
        cluster.start + half_point_ms
    } else {
        cluster.end
    }
}

pub fn ticks(axis: TimeAxis, config: &TimelineConfig, every_ms: f64) -> Vec<AxisTick> {
    if axis.is_empty() || !(every_ms > 0.0) {
        return Vec::new();
    }

    let scale = config.scale(axis);
    let mut time = (axis.beginning / every_ms).ceil() * every_ms;
    let mut ticks = Vec::new();
    while time <= axis.ending {
        ticks.push(AxisTick {
            time,
            x: scale.x(time),
            label: format_timestamp(time),
        });
        time += every_ms;
    }
    ticks
}
