//! Market-value history endpoint payloads.

use crate::cells::parse_date;
use scoutline_core::MarketValuePoint;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Graph {
    #[serde(default)]
    list: Vec<GraphPoint>,
}

#[derive(Debug, Deserialize)]
struct GraphPoint {
    y: f64,
    #[serde(default)]
    datum_mw: Option<String>,
    #[serde(default)]
    verein: Option<String>,
}

/// Parse `{"list": [{"y": 1000000, "datum_mw": "Jul 1, 2019", "verein": "Molde FK"}]}`.
#[must_use]
pub fn parse_market_value_history(body: &[u8]) -> Option<Vec<MarketValuePoint>> {
    let graph: Graph = serde_json::from_slice(body).ok()?;
    Some(
        graph
            .list
            .into_iter()
            .filter(|point| point.y.is_finite() && point.y >= 0.0)
            .map(|point| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let value = point.y.round() as u64;
                MarketValuePoint {
                    date: point.datum_mw.as_deref().and_then(parse_date),
                    value,
                    club_name: point.verein.filter(|name| !name.trim().is_empty()),
                }
            })
            .collect(),
    )
}
