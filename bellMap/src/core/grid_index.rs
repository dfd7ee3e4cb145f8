use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;
use std::fmt;

use crate::config::constants::{DEFAULT_GRID_CELL_DEG, EARTH_RADIUS_KM};
use crate::core::proximity_index::{scan_nearest, scan_within, CategoryFilter, SpatialQuery};
use crate::data::poi::{Coordinate, POI};
use crate::models::bell::Bell;

type CellKey = (i64, i64);

/// Extent of the occupied cells, plus what the nearest search needs to bound
/// distances outside a ring of cells.
#[derive(Clone, Debug)]
struct Extent {
    min_i: i64,
    max_i: i64,
    min_j: i64,
    max_j: i64,
    min_lng: f64,
    max_lng: f64,
    max_abs_lat: f64,
}

/// Bells bucketed into fixed lat/lng cells.
///
/// Returns exactly what [`LinearIndex`](crate::LinearIndex) returns, in the
/// same order and with the same tie-break; it only visits fewer bells. Queries
/// whose search area wraps the antimeridian or covers a pole fall back to a
/// full scan.
#[derive(Clone)]
pub struct GridIndex {
    bells: Vec<Bell>,
    cell_deg: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    extent: Option<Extent>,
}

// Manual Debug implementation, the cell map is too noisy to print
impl fmt::Debug for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridIndex")
            .field("bells", &self.bells.len())
            .field("cell_deg", &self.cell_deg)
            .field("cells", &self.cells.len())
            .field("extent", &self.extent)
            .finish()
    }
}

impl GridIndex {
    pub fn new(bells: Vec<Bell>) -> Self {
        Self::with_cell_size(bells, DEFAULT_GRID_CELL_DEG)
    }

    pub fn with_cell_size(bells: Vec<Bell>, cell_deg: f64) -> Self {
        let cell_deg = if cell_deg.is_finite() && cell_deg > 0.0 {
            cell_deg
        } else {
            DEFAULT_GRID_CELL_DEG
        };

        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        let mut extent: Option<Extent> = None;

        for (pos, bell) in bells.iter().enumerate() {
            let Some(coord) = bell.get_coordinate() else { continue };
            let (i, j) = cell_of(cell_deg, coord.lat, coord.lng);
            cells.entry((i, j)).or_default().push(pos);

            let e = extent.get_or_insert(Extent {
                min_i: i,
                max_i: i,
                min_j: j,
                max_j: j,
                min_lng: coord.lng,
                max_lng: coord.lng,
                max_abs_lat: coord.lat.abs(),
            });
            e.min_i = e.min_i.min(i);
            e.max_i = e.max_i.max(i);
            e.min_j = e.min_j.min(j);
            e.max_j = e.max_j.max(j);
            e.min_lng = e.min_lng.min(coord.lng);
            e.max_lng = e.max_lng.max(coord.lng);
            e.max_abs_lat = e.max_abs_lat.max(coord.lat.abs());
        }

        Self { bells, cell_deg, cells, extent }
    }

    pub fn cell_deg(&self) -> f64 {
        self.cell_deg
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn distance_from(&self, origin: &Coordinate, pos: usize) -> Option<f64> {
        self.bells[pos].get_coordinate().map(|c| origin.distance_to(c))
    }

    /// Lower bound on the distance from a query point to any bell outside
    /// the block of cells within `k` rings of the query cell.
    fn ring_lower_bound_km(&self, k: i64, min_cos: f64) -> f64 {
        let half_gap = ((k as f64) * self.cell_deg).to_radians() / 2.0;
        2.0 * EARTH_RADIUS_KM * (min_cos * half_gap.min(FRAC_PI_2).sin()).asin()
    }
}

fn cell_of(cell_deg: f64, lat: f64, lng: f64) -> CellKey {
    ((lat / cell_deg).floor() as i64, (lng / cell_deg).floor() as i64)
}

/// Cells at Chebyshev distance exactly `k` from `(ci, cj)`.
fn ring(ci: i64, cj: i64, k: i64) -> Vec<CellKey> {
    if k == 0 {
        return vec![(ci, cj)];
    }
    let mut keys = Vec::with_capacity((8 * k) as usize);
    for d in -k..=k {
        keys.push((ci + d, cj - k));
        keys.push((ci + d, cj + k));
    }
    for d in (-k + 1)..k {
        keys.push((ci - k, cj + d));
        keys.push((ci + k, cj + d));
    }
    keys
}

impl SpatialQuery for GridIndex {
    fn bells(&self) -> &[Bell] {
        &self.bells
    }

    fn nearest(&self, lat: f64, lng: f64) -> Option<(&Bell, f64)> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        let extent = self.extent.as_ref()?;

        // Longitude gaps in cell space only bound real distances when no
        // bell sits across the antimeridian from the query.
        if (lng - extent.min_lng).abs() > 180.0 || (extent.max_lng - lng).abs() > 180.0 {
            return scan_nearest(&self.bells, lat, lng);
        }

        let origin = Coordinate::new(lat, lng);
        let (ci, cj) = cell_of(self.cell_deg, lat, lng);
        let k_max = [
            (ci - extent.min_i).abs(),
            (ci - extent.max_i).abs(),
            (cj - extent.min_j).abs(),
            (cj - extent.max_j).abs(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        let min_cos = lat.abs().max(extent.max_abs_lat).to_radians().cos().max(0.0);

        let mut best: Option<(usize, f64)> = None;
        for k in 0..=k_max {
            // Sparse data far from the query: walking rings costs more than a scan.
            if 8 * k > self.cells.len() as i64 {
                return scan_nearest(&self.bells, lat, lng);
            }

            for key in ring(ci, cj, k) {
                let Some(positions) = self.cells.get(&key) else { continue };
                for &pos in positions {
                    let Some(distance) = self.distance_from(&origin, pos) else { continue };
                    let better = match best {
                        None => distance.is_finite(),
                        Some((best_pos, best_d)) => {
                            distance < best_d || (distance == best_d && pos < best_pos)
                        }
                    };
                    if better {
                        best = Some((pos, distance));
                    }
                }
            }

            if let Some((_, best_d)) = best {
                if best_d < self.ring_lower_bound_km(k, min_cos) {
                    break;
                }
            }
        }

        best.map(|(pos, d)| (&self.bells[pos], d))
    }

    fn within_radius(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        filter: &CategoryFilter,
    ) -> Vec<&Bell> {
        if !lat.is_finite() || !lng.is_finite() || !(radius_km >= 0.0) {
            return Vec::new();
        }
        let Some(extent) = self.extent.as_ref() else { return Vec::new() };

        let r = radius_km / EARTH_RADIUS_KM;
        let lat_r = lat.to_radians();
        if lat_r + r >= FRAC_PI_2 || lat_r - r <= -FRAC_PI_2 {
            return scan_within(&self.bells, lat, lng, radius_km, filter);
        }

        // Bounding box of the spherical cap, padded by a cell for rounding.
        let d_lat = r.to_degrees() + self.cell_deg;
        let d_lng = (r.sin() / lat_r.cos()).min(1.0).asin().to_degrees() + self.cell_deg;
        if lng - d_lng < -180.0 || lng + d_lng > 180.0 {
            return scan_within(&self.bells, lat, lng, radius_km, filter);
        }

        let (i_lo, j_lo) = cell_of(self.cell_deg, lat - d_lat, lng - d_lng);
        let (i_hi, j_hi) = cell_of(self.cell_deg, lat + d_lat, lng + d_lng);
        let (i_lo, i_hi) = (i_lo.max(extent.min_i), i_hi.min(extent.max_i));
        let (j_lo, j_hi) = (j_lo.max(extent.min_j), j_hi.min(extent.max_j));
        if i_lo > i_hi || j_lo > j_hi {
            return Vec::new();
        }

        let span = (i_hi - i_lo + 1).saturating_mul(j_hi - j_lo + 1);
        let mut candidates: Vec<usize> = if span > self.cells.len() as i64 {
            self.cells
                .iter()
                .filter(|((i, j), _)| (i_lo..=i_hi).contains(i) && (j_lo..=j_hi).contains(j))
                .flat_map(|(_, positions)| positions.iter().copied())
                .collect()
        } else {
            (i_lo..=i_hi)
                .flat_map(|i| (j_lo..=j_hi).map(move |j| (i, j)))
                .filter_map(|key| self.cells.get(&key))
                .flat_map(|positions| positions.iter().copied())
                .collect()
        };
        candidates.sort_unstable();

        let center = Coordinate::new(lat, lng);
        candidates
            .into_iter()
            .map(|pos| &self.bells[pos])
            .filter(|bell| filter.matches(bell))
            .filter(|bell| {
                bell.get_coordinate()
                    .map_or(false, |c| center.distance_to(c) <= radius_km)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::proximity_index::tests::EXAMPLE;
    use crate::core::proximity_index::LinearIndex;
    use crate::data::bells_loader::load_bells_str;

    /// Deterministic scatter of bells around Seoul, with a few invalid ones.
    fn scatter(n: usize) -> Vec<Bell> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        (0..n)
            .map(|id| {
                let coord = if id % 17 == 0 {
                    None
                } else {
                    Some(Coordinate::new(37.40 + next() * 0.3, 126.80 + next() * 0.4))
                };
                let purpose = if id % 3 == 0 { "방범용" } else { "약자보호" };
                Bell::new(id, coord).with_purpose(purpose)
            })
            .collect()
    }

    fn ids(bells: &[&Bell]) -> Vec<usize> {
        bells.iter().map(|b| b.id).collect()
    }

    #[test]
    fn matches_example_results() {
        let index = GridIndex::new(load_bells_str(EXAMPLE).unwrap());
        let (bell, d) = index.nearest(37.50, 127.00).unwrap();
        assert_eq!((bell.id, d), (0, 0.0));
        assert_eq!(ids(&index.within_radius(37.50, 127.00, 2.0, &CategoryFilter::All)), vec![0, 1]);
        assert_eq!(ids(&index.within_radius(37.50, 127.00, 0.05, &CategoryFilter::All)), vec![0]);
    }

    #[test]
    fn agrees_with_linear_scan() {
        let bells = scatter(600);
        let linear = LinearIndex::new(bells.clone());
        let queries = [
            (37.5665, 126.9780),
            (37.40, 126.80),
            (37.75, 127.25),
            (37.20, 126.50),
            (38.50, 128.00),
            (37.55, 127.05),
        ];

        for cell in [0.005, 0.01, 0.05, 0.5] {
            let grid = GridIndex::with_cell_size(bells.clone(), cell);
            for &(lat, lng) in queries.iter() {
                let expected = linear.nearest(lat, lng).map(|(b, d)| (b.id, d));
                let actual = grid.nearest(lat, lng).map(|(b, d)| (b.id, d));
                assert_eq!(actual, expected, "nearest at ({}, {}) cell {}", lat, lng, cell);

                for radius in [0.0, 0.3, 1.0, 2.0, 5.0, 50.0] {
                    for filter in [CategoryFilter::All, "방범용".parse().unwrap()] {
                        assert_eq!(
                            ids(&grid.within_radius(lat, lng, radius, &filter)),
                            ids(&linear.within_radius(lat, lng, radius, &filter)),
                            "radius {} at ({}, {}) cell {}",
                            radius,
                            lat,
                            lng,
                            cell
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn duplicate_positions_keep_dataset_order() {
        let bells = vec![
            Bell::new(0, Some(Coordinate::new(37.52, 127.02))),
            Bell::new(1, Some(Coordinate::new(37.51, 127.01))),
            Bell::new(2, Some(Coordinate::new(37.51, 127.01))),
        ];
        let grid = GridIndex::with_cell_size(bells, 0.001);
        assert_eq!(grid.nearest(37.51, 127.01).map(|(b, _)| b.id), Some(1));
    }

    #[test]
    fn antimeridian_falls_back_to_scan() {
        let bells = vec![
            Bell::new(0, Some(Coordinate::new(0.0, 179.9))),
            Bell::new(1, Some(Coordinate::new(0.0, 170.0))),
        ];
        let grid = GridIndex::with_cell_size(bells, 1.0);
        assert_eq!(grid.nearest(0.0, -179.9).map(|(b, _)| b.id), Some(0));
        assert_eq!(ids(&grid.within_radius(0.0, -179.9, 50.0, &CategoryFilter::All)), vec![0]);
    }

    #[test]
    fn empty_grid() {
        let grid = GridIndex::new(Vec::new());
        assert!(grid.nearest(37.5, 127.0).is_none());
        assert!(grid.within_radius(37.5, 127.0, 10.0, &CategoryFilter::All).is_empty());
        assert_eq!(grid.occupied_cells(), 0);
    }

    #[test]
    fn bad_cell_size_uses_default() {
        let grid = GridIndex::with_cell_size(Vec::new(), -1.0);
        assert_eq!(grid.cell_deg(), DEFAULT_GRID_CELL_DEG);
    }
}
