use std::fs::File;
use std::io::Read;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::proximity_index::SpatialQuery;
use crate::core::query_facade::format_distance;
use crate::data::bells_loader::DataFormatError;
use crate::data::poi::Coordinate;
use crate::utils::logging::{self, OperationCategory, QueryType};

#[derive(Debug, Clone, Copy, Deserialize)]
struct QueryPoint {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub query_lat: f64,
    pub query_lng: f64,
    pub bell_id: Option<usize>,
    pub bell_name: Option<String>,
    pub distance_km: Option<f64>,
    pub distance: Option<String>,
}

/// Read query points from a CSV with `lat` and `lng` columns.
pub fn read_query_points(path: impl AsRef<Path>) -> Result<Vec<Coordinate>, DataFormatError> {
    read_query_points_from(File::open(path)?)
}

pub fn read_query_points_from<R: Read>(reader: R) -> Result<Vec<Coordinate>, DataFormatError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.deserialize::<QueryPoint>()
        .map(|row| row.map(|p| Coordinate::new(p.lat, p.lng)).map_err(DataFormatError::from))
        .collect()
}

/// Nearest bell for every query point, computed in parallel over the shared
/// read-only index. Output order matches input order.
pub fn batch_nearest(index: &dyn SpatialQuery, points: &[Coordinate], show_progress: bool) -> Vec<BatchResult> {
    let _timing = logging::start_timing("batch_nearest",
        OperationCategory::Query { subcategory: QueryType::Batch });

    let progress = if show_progress {
        let bar = ProgressBar::new(points.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<BatchResult> = points
        .par_iter()
        .map(|point| {
            let found = index.nearest(point.lat, point.lng);
            progress.inc(1);
            BatchResult {
                query_lat: point.lat,
                query_lng: point.lng,
                bell_id: found.map(|(bell, _)| bell.id),
                bell_name: found.and_then(|(bell, _)| bell.location_name.clone()),
                distance_km: found.map(|(_, d)| d),
                distance: found.map(|(_, d)| format_distance(d)),
            }
        })
        .collect();

    progress.finish_and_clear();
    let matched = results.iter().filter(|r| r.bell_id.is_some()).count();
    info!(points = points.len(), matched, "Batch nearest complete");
    results
}
