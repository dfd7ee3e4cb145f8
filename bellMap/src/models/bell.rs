use serde::Serialize;
use crate::config::constants::{PURPOSE_CRIME_PREVENTION, PURPOSE_VULNERABLE_PROTECTION};
use crate::data::poi::{Coordinate, POI};

/// Installation purpose of a bell, as tagged in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Purpose {
    CrimePrevention,
    VulnerableProtection,
    Other(String),
}

impl Purpose {
    pub fn parse(raw: &str) -> Self {
        match raw {
            PURPOSE_CRIME_PREVENTION => Purpose::CrimePrevention,
            PURPOSE_VULNERABLE_PROTECTION => Purpose::VulnerableProtection,
            other => Purpose::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Purpose::CrimePrevention => PURPOSE_CRIME_PREVENTION,
            Purpose::VulnerableProtection => PURPOSE_VULNERABLE_PROTECTION,
            Purpose::Other(s) => s,
        }
    }
}

impl From<Purpose> for String {
    fn from(purpose: Purpose) -> Self {
        purpose.as_str().to_string()
    }
}

/// One emergency call-button record.
///
/// `coordinate` is `None` when the source record had a missing or unparseable
/// position. Such bells count towards statistics but never show up in
/// spatial queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bell {
    pub id: usize,
    pub coordinate: Option<Coordinate>,
    pub purpose: Option<Purpose>,
    pub location_name: Option<String>,
    pub site_type: Option<String>,
    pub road_address: Option<String>,
    pub lot_address: Option<String>,
    pub authority: Option<String>,
    pub authority_phone: Option<String>,
}

impl Bell {
    pub fn new(id: usize, coordinate: Option<Coordinate>) -> Self {
        Self {
            id,
            coordinate: coordinate.filter(Coordinate::is_valid),
            purpose: None,
            location_name: None,
            site_type: None,
            road_address: None,
            lot_address: None,
            authority: None,
            authority_phone: None,
        }
    }

    pub fn with_purpose(mut self, purpose: &str) -> Self {
        self.purpose = Some(Purpose::parse(purpose));
        self
    }

    pub fn invalid_location(&self) -> bool {
        self.coordinate.is_none()
    }

    pub fn purpose_str(&self) -> Option<&str> {
        self.purpose.as_ref().map(Purpose::as_str)
    }

    /// Road address when present, lot-number address otherwise.
    pub fn display_address(&self) -> Option<&str> {
        self.road_address.as_deref().or(self.lot_address.as_deref())
    }
}

impl POI for Bell {
    fn get_coordinate(&self) -> Option<&Coordinate> {
        self.coordinate.as_ref()
    }
}
