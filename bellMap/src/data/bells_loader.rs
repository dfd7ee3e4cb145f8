use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::constants::*;
use crate::data::poi::Coordinate;
use crate::models::bell::{Bell, Purpose};

#[derive(Debug)]
pub enum DataFormatError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    NotACollection(String),
    RecordNotObject(usize),
}

impl From<std::io::Error> for DataFormatError {
    fn from(err: std::io::Error) -> Self {
        DataFormatError::IoError(err)
    }
}

impl From<serde_json::Error> for DataFormatError {
    fn from(err: serde_json::Error) -> Self {
        DataFormatError::JsonError(err)
    }
}

impl From<csv::Error> for DataFormatError {
    fn from(err: csv::Error) -> Self {
        DataFormatError::CsvError(err)
    }
}

impl std::fmt::Display for DataFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormatError::IoError(e) => write!(f, "IO error: {}", e),
            DataFormatError::JsonError(e) => write!(f, "JSON error: {}", e),
            DataFormatError::CsvError(e) => write!(f, "CSV error: {}", e),
            DataFormatError::NotACollection(kind) => {
                write!(f, "Dataset is not a collection of records (found {})", kind)
            }
            DataFormatError::RecordNotObject(index) => {
                write!(f, "Record {} is not an object", index)
            }
        }
    }
}

impl std::error::Error for DataFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataFormatError::IoError(e) => Some(e),
            DataFormatError::JsonError(e) => Some(e),
            DataFormatError::CsvError(e) => Some(e),
            _ => None,
        }
    }
}

/// Load a dataset file, choosing the format from the extension.
pub fn load_bells(path: impl AsRef<Path>) -> Result<Vec<Bell>, DataFormatError> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let bells = if is_csv {
        load_bells_csv(path)?
    } else {
        let reader = BufReader::new(File::open(path)?);
        load_bells_json(reader)?
    };

    let invalid = bells.iter().filter(|b| b.invalid_location()).count();
    info!(
        path = %path.display(),
        total = bells.len(),
        valid = bells.len() - invalid,
        invalid,
        "Loaded emergency bell dataset"
    );
    Ok(bells)
}

pub fn load_bells_json<R: Read>(reader: R) -> Result<Vec<Bell>, DataFormatError> {
    let value: Value = serde_json::from_reader(reader)?;
    parse_records(&value)
}

pub fn load_bells_str(json: &str) -> Result<Vec<Bell>, DataFormatError> {
    let value: Value = serde_json::from_str(json)?;
    parse_records(&value)
}

/// Convert parsed JSON into bells.
///
/// Accepts either a bare array of records or an object carrying the array
/// under `data`. Any element that is not an object fails the whole load.
pub fn parse_records(value: &Value) -> Result<Vec<Bell>, DataFormatError> {
    let records = match value {
        Value::Array(records) => records,
        Value::Object(envelope) => match envelope.get("data") {
            Some(Value::Array(records)) => records,
            _ => return Err(DataFormatError::NotACollection("object without a data array".into())),
        },
        other => return Err(DataFormatError::NotACollection(json_kind(other).into())),
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(fields) => Ok(bell_from_fields(index, |key| text_field(fields, key))),
            _ => Err(DataFormatError::RecordNotObject(index)),
        })
        .collect()
}

/// Load the spreadsheet export of the dataset. Column headers use the same
/// field names as the JSON records.
pub fn load_bells_csv(path: impl AsRef<Path>) -> Result<Vec<Bell>, DataFormatError> {
    let file = File::open(path)?;
    read_bells_csv(file)
}

pub fn read_bells_csv<R: Read>(reader: R) -> Result<Vec<Bell>, DataFormatError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut bells = Vec::new();
    for (index, result) in rdr.deserialize::<HashMap<String, String>>().enumerate() {
        let row = result?;
        bells.push(bell_from_fields(index, |key| {
            row.get(key).filter(|v| !v.trim().is_empty()).cloned()
        }));
    }
    Ok(bells)
}

fn bell_from_fields<F>(index: usize, field: F) -> Bell
where
    F: Fn(&str) -> Option<String>,
{
    let lat = field(FIELD_LAT).as_deref().and_then(parse_coordinate);
    let lng = field(FIELD_LNG).as_deref().and_then(parse_coordinate);
    let coordinate = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        _ => None,
    };

    let mut bell = Bell::new(index, coordinate);
    bell.purpose = field(FIELD_PURPOSE).as_deref().map(Purpose::parse);
    bell.location_name = field(FIELD_LOCATION_NAME);
    bell.site_type = field(FIELD_SITE_TYPE);
    bell.road_address = field(FIELD_ROAD_ADDRESS);
    bell.lot_address = field(FIELD_LOT_ADDRESS);
    bell.authority = field(FIELD_AUTHORITY);
    bell.authority_phone = field(FIELD_AUTHORITY_PHONE);

    if bell.invalid_location() {
        debug!(
            id = index,
            name = bell.location_name.as_deref().unwrap_or(""),
            "Bell has no usable location"
        );
    }
    bell
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a field as text, verbatim. Numbers are rendered; blank strings and
/// null count as missing.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"WGS84위도": 37.50, "WGS84경도": 127.00, "설치목적": "방범용", "설치위치": "A"},
        {"WGS84위도": "37.51", "WGS84경도": "127.01", "설치목적": "약자보호", "관리기관명": "서울특별시 강남구"},
        {"WGS84위도": "", "WGS84경도": "", "설치목적": "방범용"},
        {"WGS84위도": null, "WGS84경도": 127.0},
        {"WGS84위도": "abc", "WGS84경도": "127.0"},
        {"설치목적": "기타"}
    ]"#;

    #[test]
    fn parses_numbers_and_numeric_strings() {
        let bells = load_bells_str(SAMPLE).unwrap();
        assert_eq!(bells.len(), 6);
        assert_eq!(bells[0].coordinate, Some(Coordinate::new(37.50, 127.00)));
        assert_eq!(bells[1].coordinate, Some(Coordinate::new(37.51, 127.01)));
        assert_eq!(bells[1].authority.as_deref(), Some("서울특별시 강남구"));
    }

    #[test]
    fn bad_coordinates_are_flagged_not_dropped() {
        let bells = load_bells_str(SAMPLE).unwrap();
        let invalid: Vec<usize> = bells.iter().filter(|b| b.invalid_location()).map(|b| b.id).collect();
        assert_eq!(invalid, vec![2, 3, 4, 5]);
    }

    #[test]
    fn ids_follow_dataset_order() {
        let bells = load_bells_str(SAMPLE).unwrap();
        for (i, bell) in bells.iter().enumerate() {
            assert_eq!(bell.id, i);
        }
    }

    #[test]
    fn accepts_data_envelope() {
        let bells = load_bells_str(r#"{"success": true, "count": 1, "data": [{"WGS84위도": 1, "WGS84경도": 2}]}"#).unwrap();
        assert_eq!(bells.len(), 1);
        assert!(!bells[0].invalid_location());
    }

    #[test]
    fn rejects_non_collections() {
        assert!(matches!(load_bells_str("42"), Err(DataFormatError::NotACollection(_))));
        assert!(matches!(load_bells_str(r#"{"rows": []}"#), Err(DataFormatError::NotACollection(_))));
        assert!(matches!(load_bells_str("[{}, 3]"), Err(DataFormatError::RecordNotObject(1))));
        assert!(matches!(load_bells_str("not json"), Err(DataFormatError::JsonError(_))));
    }

    #[test]
    fn coordinates_must_be_whole_numbers() {
        let bells = load_bells_str(
            r#"[
                {"WGS84위도": " 37.5 ", "WGS84경도": "127.0"},
                {"WGS84위도": "37.5abc", "WGS84경도": "127.0"},
                {"WGS84위도": "37.5", "WGS84경도": "127.0km"},
                {"WGS84위도": "NaN", "WGS84경도": "127.0"}
            ]"#,
        )
        .unwrap();
        assert_eq!(bells[0].coordinate, Some(Coordinate::new(37.5, 127.0)));
        assert!(bells[1].invalid_location());
        assert!(bells[2].invalid_location());
        assert!(bells[3].invalid_location());
    }

    #[test]
    fn text_fields_pass_through_unchanged() {
        let bells = load_bells_str(
            r#"[{"WGS84위도": 37.5, "WGS84경도": 127.0, "설치위치": "  역삼역 2번 출구 ", "관리기관명": "   ", "관리기관전화번호": 21234567}]"#,
        )
        .unwrap();
        assert_eq!(bells[0].location_name.as_deref(), Some("  역삼역 2번 출구 "));
        assert_eq!(bells[0].authority, None);
        assert_eq!(bells[0].authority_phone.as_deref(), Some("21234567"));

        let bells = read_bells_csv("설치위치,관리기관명,WGS84위도,WGS84경도\n 공원 입구 ,  ,37.5,127.0\n".as_bytes()).unwrap();
        assert_eq!(bells[0].location_name.as_deref(), Some(" 공원 입구 "));
        assert_eq!(bells[0].authority, None);
        assert_eq!(bells[0].coordinate, Some(Coordinate::new(37.5, 127.0)));
    }

    #[test]
    fn reads_csv_export() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "설치위치,설치목적,WGS84위도,WGS84경도,소재지지번주소").unwrap();
        writeln!(file, "역삼역 앞,방범용,37.5006,127.0364,역삼동 1").unwrap();
        writeln!(file, "빈 좌표,약자보호,,,").unwrap();
        file.flush().unwrap();

        let bells = load_bells(file.path()).unwrap();
        assert_eq!(bells.len(), 2);
        assert_eq!(bells[0].location_name.as_deref(), Some("역삼역 앞"));
        assert_eq!(bells[0].display_address(), Some("역삼동 1"));
        assert!(bells[1].invalid_location());
        assert_eq!(bells[1].purpose, Some(Purpose::VulnerableProtection));
    }
}
