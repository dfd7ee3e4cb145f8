use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::bells_loader::DataFormatError;
use crate::data::poi::Coordinate;
use crate::services::place_search::{PlaceHit, PlaceSearch, SearchKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl GazetteerEntry {
    fn to_hit(&self, kind: SearchKind) -> PlaceHit {
        PlaceHit {
            name: self.name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            coordinate: Coordinate::new(self.lat, self.lng),
            kind,
        }
    }
}

/// Offline place list used in place of a hosted search service.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
}

impl Gazetteer {
    pub fn new(entries: Vec<GazetteerEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|e| Coordinate::new(e.lat, e.lng).is_valid())
            .collect();
        Self { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataFormatError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let entries: Vec<GazetteerEntry> = serde_json::from_reader(reader)?;
        let gazetteer = Self::new(entries);
        info!(path = %path.display(), places = gazetteer.len(), "Loaded gazetteer");
        Ok(gazetteer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact match wins, otherwise the first entry containing the query.
    fn best_match<F>(&self, query: &str, field: F) -> Option<&GazetteerEntry>
    where
        F: Fn(&GazetteerEntry) -> Option<&str>,
    {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let lowered = |e: &GazetteerEntry| field(e).map(str::to_lowercase);
        self.entries
            .iter()
            .find(|e| lowered(e).as_deref() == Some(needle.as_str()))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| lowered(e).map_or(false, |v| v.contains(&needle)))
            })
    }
}

impl PlaceSearch for Gazetteer {
    fn keyword_search(&self, query: &str) -> Option<PlaceHit> {
        self.best_match(query, |e| Some(e.name.as_str()))
            .map(|e| e.to_hit(SearchKind::Keyword))
    }

    fn address_search(&self, query: &str) -> Option<PlaceHit> {
        self.best_match(query, |e| e.address.as_deref())
            .map(|e| e.to_hit(SearchKind::Address))
    }
}
