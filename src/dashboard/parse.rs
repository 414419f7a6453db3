use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{Dashboard, Peak};
use crate::simulation::GraphData;
use crate::timeline::TimelineData;
use crate::treemap::HierarchyNode;

#[derive(Deserialize)]
struct RawPeakData {
    treemap: HierarchyNode,
}

#[derive(Deserialize)]
struct RawPeakObject {
    #[serde(alias = "name")]
    keyword: String,
    treemap: HierarchyNode,
}

pub(super) fn parse_dashboard(raw: &str) -> Result<Dashboard> {
    let parsed: Value = serde_json::from_str(raw).context("invalid dashboard JSON")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("dashboard JSON must be an object"))?;

    // A bare `{nodes, edges}` document is a graph-only dashboard.
    if object.contains_key("nodes") {
        let graph = GraphData::deserialize(&parsed).context("invalid graph in dashboard")?;
        return Ok(Dashboard {
            graph: Some(graph),
            ..Dashboard::default()
        });
    }

    let graph = match object.get("graph") {
        Some(Value::Null) | None => None,
        Some(value) => Some(GraphData::deserialize(value).context("invalid graph in dashboard")?),
    };

    let peaks = match object.get("peaks") {
        Some(Value::Null) | None => Vec::new(),
        Some(value) => parse_peaks(value)?,
    };

    let timeline = match object.get("timeline") {
        Some(Value::Null) | None => None,
        Some(value) => {
            Some(TimelineData::deserialize(value).context("invalid timeline in dashboard")?)
        }
    };

    if graph.is_none() && peaks.is_empty() && timeline.is_none() {
        return Err(anyhow!(
            "dashboard JSON has none of `graph`, `peaks` or `timeline`"
        ));
    }

    Ok(Dashboard {
        graph,
        peaks,
        timeline,
    })
}

/// Accepts `[[keyword, {treemap, ..}], ..]`, `[{keyword, treemap}, ..]` or a
/// `{keyword: {treemap, ..}}` map. Entries that do not parse are skipped.
fn parse_peaks(value: &Value) -> Result<Vec<Peak>> {
    let mut peaks = Vec::new();

    match value {
        Value::Array(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                match parse_peak_entry(entry) {
                    Some(peak) => peaks.push(peak),
                    None => warn!(index, "skipping malformed peak entry"),
                }
            }
        }
        Value::Object(map) => {
            for (keyword, data) in map {
                match RawPeakData::deserialize(data) {
                    Ok(raw) => peaks.push(Peak {
                        keyword: keyword.clone(),
                        treemap: raw.treemap,
                    }),
                    Err(error) => warn!(%keyword, %error, "skipping malformed peak entry"),
                }
            }
        }
        _ => return Err(anyhow!("`peaks` must be an array or an object")),
    }

    Ok(peaks)
}

fn parse_peak_entry(entry: &Value) -> Option<Peak> {
    if let Value::Array(pair) = entry
        && let [keyword, data] = pair.as_slice()
    {
        let keyword = keyword.as_str()?.to_string();
        let raw = RawPeakData::deserialize(data).ok()?;
        return Some(Peak {
            keyword,
            treemap: raw.treemap,
        });
    }

    RawPeakObject::deserialize(entry).ok().map(|raw| Peak {
        keyword: raw.keyword,
        treemap: raw.treemap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_dashboard() {
        let dashboard = parse_dashboard(
            r#"{
                "graph": {
                    "nodes": [{"id": "kweker"}, {"id": "veiling"}],
                    "edges": [{"source": "kweker", "target": "veiling", "value": "retweet"}]
                },
                "peaks": [
                    ["tomaat", {"threshold": [], "treemap": {"name": "tomaat", "children": [
                        {"name": "rood", "size": 4, "summary": "Een kleur."}
                    ]}}]
                ],
                "timeline": {"beginning": 0, "ending": 100, "series": [
                    {"label": 0, "times": [{"starting_time": 10, "display": "circle"}]}
                ]}
            }"#,
        )
        .unwrap();

        assert_eq!(dashboard.graph.as_ref().map(|g| g.nodes.len()), Some(2));
        assert_eq!(dashboard.peaks.len(), 1);
        assert_eq!(dashboard.peaks[0].keyword, "tomaat");
        assert_eq!(dashboard.peaks[0].treemap.children.len(), 1);
        assert_eq!(dashboard.timeline.as_ref().map(|t| t.clusters().len()), Some(1));
    }

    #[test]
    fn bare_graph_is_accepted() {
        let dashboard =
            parse_dashboard(r#"{"nodes": [{"id": "a"}], "edges": []}"#).unwrap();
        assert!(dashboard.graph.is_some());
        assert!(dashboard.peaks.is_empty());
        assert!(dashboard.timeline.is_none());
    }

    #[test]
    fn peaks_accept_objects_and_maps_and_skip_junk() {
        let dashboard = parse_dashboard(
            r#"{"peaks": [
                {"keyword": "sla", "treemap": {"name": "sla", "size": 1}},
                ["kapot"],
                42
            ]}"#,
        )
        .unwrap();
        assert_eq!(dashboard.peaks.len(), 1);
        assert_eq!(dashboard.peaks[0].keyword, "sla");

        let dashboard =
            parse_dashboard(r#"{"peaks": {"ui": {"treemap": {"name": "ui", "size": 2}}}}"#)
                .unwrap();
        assert_eq!(dashboard.peaks[0].keyword, "ui");
    }

    #[test]
    fn rejects_documents_without_sections() {
        assert!(parse_dashboard("[]").is_err());
        assert!(parse_dashboard("{}").is_err());
        assert!(parse_dashboard("{not json").is_err());
        assert!(parse_dashboard(r#"{"peaks": "tomaat"}"#).is_err());
    }
}
