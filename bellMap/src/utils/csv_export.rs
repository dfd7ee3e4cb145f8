use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::data::bells_loader::DataFormatError;
use crate::data::poi::Coordinate;
use crate::models::bell::Bell;
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// One exported bell, flattened for spreadsheet use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub id: usize,
    pub name: String,
    pub purpose: String,
    pub address: String,
    pub authority: String,
    pub phone: String,
    pub lat: f64,
    pub lng: f64,
    /// Distance from the query center, if there was one
    pub distance_km: Option<f64>,
}

impl ExportRow {
    pub fn from_bell(bell: &Bell, origin: Option<&Coordinate>) -> Option<Self> {
        let coord = bell.coordinate?;
        Some(Self {
            id: bell.id,
            name: bell.location_name.clone().unwrap_or_default(),
            purpose: bell.purpose_str().unwrap_or_default().to_string(),
            address: bell.display_address().unwrap_or_default().to_string(),
            authority: bell.authority.clone().unwrap_or_default(),
            phone: bell.authority_phone.clone().unwrap_or_default(),
            lat: coord.lat,
            lng: coord.lng,
            distance_km: origin.map(|o| (o.distance_to(&coord) * 1000.0).round() / 1000.0),
        })
    }
}

pub fn rows_for<'a, I>(bells: I, origin: Option<&Coordinate>) -> Vec<ExportRow>
where
    I: IntoIterator<Item = &'a Bell>,
{
    bells
        .into_iter()
        .filter_map(|bell| ExportRow::from_bell(bell, origin))
        .collect()
}

/// `<dir>/bells_<timestamp>.csv`, creating `dir` if needed.
pub fn timestamped_path(dir: impl AsRef<Path>) -> Result<PathBuf, DataFormatError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    Ok(dir.join(format!("bells_{}.csv", timestamp)))
}

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), DataFormatError> {
    let _timing = logging::start_timing("write_csv",
        OperationCategory::FileIO { subcategory: FileIOType::Export });

    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Wrote CSV export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::bells_loader::load_bells_str;

    #[test]
    fn exports_only_located_bells() {
        let bells = load_bells_str(
            r#"[
                {"WGS84위도": 37.5, "WGS84경도": 127.0, "설치위치": "A", "설치목적": "방범용", "소재지도로명주소": "테헤란로 1"},
                {"WGS84위도": "", "WGS84경도": "", "설치위치": "B"}
            ]"#,
        )
        .unwrap();
        let origin = Coordinate::new(37.5, 127.0);
        let rows = rows_for(&bells, Some(&origin));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "A");
        assert_eq!(rows[0].distance_km, Some(0.0));

        let dir = tempfile::tempdir().unwrap();
        let path = timestamped_path(dir.path().join("out")).unwrap();
        write_csv(&path, &rows).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("id,name,purpose,address,authority,phone,lat,lng,distance_km"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("0,A,방범용,테헤란로 1,,,37.5,127"), "got {}", row);
        assert!(lines.next().is_none());
    }
}
