use serde::Serialize;
use tracing::{debug, info};

use crate::data::poi::Coordinate;
use crate::utils::logging::{self, OperationCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchKind {
    Keyword,
    Address,
}

/// Best match returned by a search provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceHit {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub coordinate: Coordinate,
    pub kind: SearchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    EmptyQuery,
    NotFound(String),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::EmptyQuery => write!(f, "Search query is empty"),
            SearchError::NotFound(q) => {
                write!(f, "No results for \"{}\". Try a different keyword.", q)
            }
        }
    }
}

impl std::error::Error for SearchError {}

/// Place lookup service: a keyword search over place names (stations,
/// schools, buildings) and a geocoding search over addresses.
pub trait PlaceSearch {
    fn keyword_search(&self, query: &str) -> Option<PlaceHit>;
    fn address_search(&self, query: &str) -> Option<PlaceHit>;
}

/// Keyword search first, then address search.
pub fn search_place(provider: &dyn PlaceSearch, query: &str) -> Result<PlaceHit, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let _timing = logging::start_timing("search_place", OperationCategory::Search);

    if let Some(hit) = provider.keyword_search(query) {
        info!(query, name = %hit.name, "Place found by keyword");
        return Ok(hit);
    }
    debug!(query, "Keyword search missed, trying address search");

    match provider.address_search(query) {
        Some(hit) => {
            info!(query, name = %hit.name, "Place found by address");
            Ok(hit)
        }
        None => Err(SearchError::NotFound(query.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Scripted {
        keyword: Option<PlaceHit>,
        address: Option<PlaceHit>,
        calls: RefCell<Vec<&'static str>>,
    }

    impl PlaceSearch for Scripted {
        fn keyword_search(&self, _query: &str) -> Option<PlaceHit> {
            self.calls.borrow_mut().push("keyword");
            self.keyword.clone()
        }

        fn address_search(&self, _query: &str) -> Option<PlaceHit> {
            self.calls.borrow_mut().push("address");
            self.address.clone()
        }
    }

    fn hit(name: &str, kind: SearchKind) -> PlaceHit {
        PlaceHit {
            name: name.to_string(),
            address: None,
            phone: None,
            coordinate: Coordinate::new(37.5, 127.0),
            kind,
        }
    }

    #[test]
    fn keyword_hit_skips_address_search() {
        let provider = Scripted { keyword: Some(hit("강남역", SearchKind::Keyword)), ..Default::default() };
        let found = search_place(&provider, "강남역").unwrap();
        assert_eq!(found.kind, SearchKind::Keyword);
        assert_eq!(*provider.calls.borrow(), vec!["keyword"]);
    }

    #[test]
    fn falls_back_to_address() {
        let provider = Scripted { address: Some(hit("테헤란로 152", SearchKind::Address)), ..Default::default() };
        let found = search_place(&provider, "테헤란로 152").unwrap();
        assert_eq!(found.kind, SearchKind::Address);
        assert_eq!(*provider.calls.borrow(), vec!["keyword", "address"]);
    }

    #[test]
    fn reports_not_found() {
        let provider = Scripted::default();
        assert_eq!(search_place(&provider, " 없는곳 "), Err(SearchError::NotFound("없는곳".into())));
    }

    #[test]
    fn blank_query_never_reaches_provider() {
        let provider = Scripted::default();
        assert_eq!(search_place(&provider, "   "), Err(SearchError::EmptyQuery));
        assert!(provider.calls.borrow().is_empty());
    }
}
