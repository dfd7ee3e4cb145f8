use serde::Serialize;

use crate::config::constants::*;
use crate::core::query_facade::{NearestBell, ViewSnapshot};
use crate::data::poi::Coordinate;
use crate::models::bell::{Bell, Purpose};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub fill_color: &'static str,
    pub size_px: u32,
}

pub fn marker_style(purpose: Option<&Purpose>) -> MarkerStyle {
    let fill_color = match purpose {
        Some(Purpose::CrimePrevention) => COLOR_CRIME_PREVENTION,
        Some(Purpose::VulnerableProtection) => COLOR_VULNERABLE_PROTECTION,
        _ => COLOR_OTHER,
    };
    MarkerStyle { fill_color, size_px: MARKER_SIZE_PX }
}

pub fn highlight_marker_style() -> MarkerStyle {
    MarkerStyle {
        fill_color: COLOR_CRIME_PREVENTION,
        size_px: HIGHLIGHT_MARKER_SIZE_PX,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub bell_id: usize,
    pub position: Coordinate,
    pub style: MarkerStyle,
}

/// Where the user is, or the place they searched for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusMarker {
    pub position: Coordinate,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadiusCircle {
    pub center: Coordinate,
    pub radius_m: f64,
    pub color: &'static str,
}

/// Label/value rows shown in a popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoCard {
    pub title: String,
    pub rows: Vec<(&'static str, String)>,
}

impl InfoCard {
    pub fn render_text(&self) -> String {
        let mut out = self.title.clone();
        for (label, value) in &self.rows {
            out.push_str(&format!("\n  {}: {}", label, value));
        }
        out
    }
}

fn or_missing(value: Option<&str>) -> String {
    value.unwrap_or(MISSING_VALUE_TEXT).to_string()
}

pub fn bell_card(bell: &Bell) -> InfoCard {
    InfoCard {
        title: or_missing(bell.location_name.as_deref()),
        rows: vec![
            ("Purpose", or_missing(bell.purpose_str())),
            ("Site type", or_missing(bell.site_type.as_deref())),
            ("Address", or_missing(bell.display_address())),
            ("Managed by", or_missing(bell.authority.as_deref())),
            ("Phone", or_missing(bell.authority_phone.as_deref())),
        ],
    }
}

pub fn nearest_card(nearest: &NearestBell) -> InfoCard {
    let bell = &nearest.bell;
    InfoCard {
        title: format!("Nearest bell: {}", or_missing(bell.location_name.as_deref())),
        rows: vec![
            ("Distance", nearest.distance_text.clone()),
            ("Purpose", or_missing(bell.purpose_str())),
            ("Address", or_missing(bell.display_address())),
            ("Managed by", or_missing(bell.authority.as_deref())),
            ("Phone", or_missing(bell.authority_phone.as_deref())),
        ],
    }
}

pub fn radius_summary(radius_km: f64, count: usize) -> String {
    format!("{}km radius: {} bells", radius_km, count)
}

/// Everything a map widget needs to draw one view.
#[derive(Debug, Clone, Serialize)]
pub struct MapScene {
    pub markers: Vec<Marker>,
    pub highlight: Option<Marker>,
    pub focus: Option<FocusMarker>,
    pub circle: RadiusCircle,
    pub summary: String,
}

pub fn build_scene(view: &ViewSnapshot<'_>) -> MapScene {
    let markers = view
        .visible
        .iter()
        .filter_map(|bell| {
            bell.coordinate.map(|position| Marker {
                bell_id: bell.id,
                position,
                style: marker_style(bell.purpose.as_ref()),
            })
        })
        .collect();

    let highlight = view
        .nearest
        .as_ref()
        .filter(|n| view.highlighted == Some(n.bell.id))
        .and_then(|n| {
            n.bell.coordinate.map(|position| Marker {
                bell_id: n.bell.id,
                position,
                style: highlight_marker_style(),
            })
        });

    MapScene {
        markers,
        highlight,
        focus: view.focus.map(|position| FocusMarker { position, color: COLOR_USER_LOCATION }),
        circle: RadiusCircle {
            center: view.center,
            radius_m: view.radius_km * 1000.0,
            color: COLOR_RADIUS_CIRCLE,
        },
        summary: radius_summary(view.radius_km, view.visible.len()),
    }
}
