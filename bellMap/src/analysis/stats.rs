use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::constants::STATS_OTHER_KEY;
use crate::models::bell::Bell;

/// Aggregate counts over the whole dataset, including bells without a
/// usable location.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub generated_at: DateTime<Local>,
    pub total_count: usize,
    pub valid_location_count: usize,
    pub invalid_location_count: usize,
    pub authority_stats: BTreeMap<String, usize>,
    pub purpose_stats: BTreeMap<String, usize>,
    pub site_type_stats: BTreeMap<String, usize>,
}

impl DatasetStats {
    pub fn collect(bells: &[Bell]) -> Self {
        let mut authority_stats = BTreeMap::new();
        let mut purpose_stats = BTreeMap::new();
        let mut site_type_stats = BTreeMap::new();
        let mut invalid_location_count = 0;

        for bell in bells {
            if bell.invalid_location() {
                invalid_location_count += 1;
            }
            bump(&mut authority_stats, bell.authority.as_deref());
            bump(&mut purpose_stats, bell.purpose_str());
            bump(&mut site_type_stats, bell.site_type.as_deref());
        }

        Self {
            generated_at: Local::now(),
            total_count: bells.len(),
            valid_location_count: bells.len() - invalid_location_count,
            invalid_location_count,
            authority_stats,
            purpose_stats,
            site_type_stats,
        }
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, key: Option<&str>) {
    let key = key.unwrap_or(STATS_OTHER_KEY);
    *counts.entry(key.to_string()).or_insert(0) += 1;
}
