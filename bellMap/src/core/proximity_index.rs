use std::fmt;
use std::str::FromStr;

use crate::data::poi::{Coordinate, POI};
use crate::models::bell::{Bell, Purpose};

/// Category restriction for radius queries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Purpose),
}

impl CategoryFilter {
    pub fn matches(&self, bell: &Bell) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(purpose) => bell.purpose.as_ref() == Some(purpose),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(Purpose::parse(s)))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Only(purpose) => write!(f, "{}", purpose.as_str()),
        }
    }
}

/// The two questions the map asks about the dataset.
///
/// Only bells with a valid location take part. `nearest` breaks ties in
/// favour of the bell that comes first in dataset order, and
/// `within_radius` returns bells in dataset order.
pub trait SpatialQuery: Send + Sync {
    /// Every loaded bell, including those without a location.
    fn bells(&self) -> &[Bell];

    fn nearest(&self, lat: f64, lng: f64) -> Option<(&Bell, f64)>;

    fn within_radius(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        filter: &CategoryFilter,
    ) -> Vec<&Bell>;

    fn valid_count(&self) -> usize {
        self.bells().iter().filter(|b| !b.invalid_location()).count()
    }
}

/// Linear scan over the dataset. Fine for municipal-scale datasets of a few
/// thousand points.
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    bells: Vec<Bell>,
}

impl LinearIndex {
    pub fn new(bells: Vec<Bell>) -> Self {
        Self { bells }
    }
}

impl SpatialQuery for LinearIndex {
    fn bells(&self) -> &[Bell] {
        &self.bells
    }

    fn nearest(&self, lat: f64, lng: f64) -> Option<(&Bell, f64)> {
        scan_nearest(&self.bells, lat, lng)
    }

    fn within_radius(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        filter: &CategoryFilter,
    ) -> Vec<&Bell> {
        scan_within(&self.bells, lat, lng, radius_km, filter)
    }
}

fn located(bells: &[Bell]) -> impl Iterator<Item = (&Bell, &Coordinate)> {
    bells
        .iter()
        .filter_map(|bell| bell.get_coordinate().map(|coord| (bell, coord)))
}

pub(crate) fn scan_nearest(bells: &[Bell], lat: f64, lng: f64) -> Option<(&Bell, f64)> {
    let origin = Coordinate::new(lat, lng);
    let mut best: Option<(&Bell, f64)> = None;

    for (bell, coord) in located(bells) {
        let distance = origin.distance_to(coord);
        // Strict comparison keeps the first bell on ties.
        if best.map_or(distance.is_finite(), |(_, d)| distance < d) {
            best = Some((bell, distance));
        }
    }
    best
}

pub(crate) fn scan_within<'a>(
    bells: &'a [Bell],
    lat: f64,
    lng: f64,
    radius_km: f64,
    filter: &CategoryFilter,
) -> Vec<&'a Bell> {
    let center = Coordinate::new(lat, lng);
    located(bells)
        .filter(|(bell, _)| filter.matches(bell))
        .filter(|(_, coord)| center.distance_to(coord) <= radius_km)
        .map(|(bell, _)| bell)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::bells_loader::load_bells_str;

    pub(crate) const EXAMPLE: &str = r#"[
        {"WGS84위도": 37.50, "WGS84경도": 127.00, "설치목적": "A"},
        {"WGS84위도": 37.51, "WGS84경도": 127.01, "설치목적": "B"},
        {"WGS84위도": "", "WGS84경도": "", "설치목적": "A"}
    ]"#;

    fn ids(bells: &[&Bell]) -> Vec<usize> {
        bells.iter().map(|b| b.id).collect()
    }

    fn example_index() -> LinearIndex {
        LinearIndex::new(load_bells_str(EXAMPLE).unwrap())
    }

    #[test]
    fn nearest_on_top_of_a_bell_is_zero() {
        let index = example_index();
        let (bell, distance) = index.nearest(37.50, 127.00).unwrap();
        assert_eq!(bell.id, 0);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn radius_examples() {
        let index = example_index();
        assert_eq!(ids(&index.within_radius(37.50, 127.00, 2.0, &CategoryFilter::All)), vec![0, 1]);
        assert_eq!(ids(&index.within_radius(37.50, 127.00, 0.05, &CategoryFilter::All)), vec![0]);
    }

    #[test]
    fn filter_restricts_to_category() {
        let index = example_index();
        let only_b: CategoryFilter = "B".parse().unwrap();
        assert_eq!(ids(&index.within_radius(37.50, 127.00, 2.0, &only_b)), vec![1]);
        let only_a: CategoryFilter = "A".parse().unwrap();
        assert_eq!(ids(&index.within_radius(37.50, 127.00, 2.0, &only_a)), vec![0]);
    }

    #[test]
    fn ties_go_to_first_in_dataset_order() {
        let bells = load_bells_str(
            r#"[
                {"WGS84위도": 37.51, "WGS84경도": 127.00},
                {"WGS84위도": 37.48, "WGS84경도": 127.00},
                {"WGS84위도": 37.51, "WGS84경도": 127.00}
            ]"#,
        )
        .unwrap();
        let index = LinearIndex::new(bells);
        let (bell, _) = index.nearest(37.50, 127.00).unwrap();
        assert_eq!(bell.id, 0);
    }

    #[test]
    fn empty_or_all_invalid_dataset_has_no_nearest() {
        assert!(LinearIndex::default().nearest(0.0, 0.0).is_none());
        let index = LinearIndex::new(load_bells_str(r#"[{"WGS84위도": "", "WGS84경도": ""}]"#).unwrap());
        assert!(index.nearest(37.5, 127.0).is_none());
        assert_eq!(index.valid_count(), 0);
        assert_eq!(index.bells().len(), 1);
    }

    #[test]
    fn invalid_bells_never_returned() {
        let index = example_index();
        for radius in [0.0, 1.0, 100.0, 20_000.0] {
            assert!(index
                .within_radius(37.50, 127.00, radius, &CategoryFilter::All)
                .iter()
                .all(|b| b.id != 2));
        }
        assert_ne!(index.nearest(0.0, 0.0).map(|(b, _)| b.id), Some(2));
    }

    #[test]
    fn radius_is_monotonic() {
        let index = example_index();
        let mut previous = 0;
        for radius in [0.0, 0.01, 0.5, 1.4, 1.5, 10.0] {
            let count = index.within_radius(37.50, 127.00, radius, &CategoryFilter::All).len();
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("ALL".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "방범용".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Purpose::CrimePrevention)
        );
        assert_eq!(CategoryFilter::Only(Purpose::VulnerableProtection).to_string(), "약자보호");
    }
}
