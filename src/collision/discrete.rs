use glam::Vec2;
use log::{error, warn};

use super::grid::SpatialGrid;
use crate::core::body::Body;
use crate::core::types::Bounds;
use crate::error::{Error, Result};
use crate::utils::allocator::Arena;

/// Separation magnitudes below this are treated as coincident centers.
const GEOM_EPSILON: f32 = 1e-6;

/// Counters from one resolution pass, merged across partitions and frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassStats {
    pub pairs_checked: u64,
    pub overlaps_resolved: u64,
}

impl PassStats {
    pub fn merge(&mut self, other: PassStats) {
        self.pairs_checked += other.pairs_checked;
        self.overlaps_resolved += other.overlaps_resolved;
    }
}

/// Normalized separation axis between two centers.
///
/// Signals [`Error::DegenerateGeometry`] instead of dividing by a
/// near-zero magnitude; callers substitute an arbitrary axis.
pub(crate) fn separation_axis(delta: Vec2, dist: f32) -> Result<Vec2> {
    if dist <= GEOM_EPSILON {
        return Err(Error::DegenerateGeometry { dist });
    }
    Ok(delta / dist)
}

/// Mass-weighted elastic velocity exchange along the line of centers,
/// scaled by the restitution factor. `axis_a_to_b` is `posA - posB` and
/// `dist` its magnitude, taken before any positional correction.
pub(crate) fn apply_impulse(a: &mut Body, b: &mut Body, axis: Vec2, dist: f32, elasticity: f32) {
    let factor_a = 2.0 * b.mass / (a.mass + b.mass);
    let factor_b = 2.0 * a.mass / (a.mass + b.mass);
    let relative = a.velocity - b.velocity;
    let projection = relative.dot(axis) / (dist * dist);

    a.velocity -= factor_a * projection * axis * elasticity;
    b.velocity += factor_b * projection * axis * elasticity;
}

/// Iterative discrete collision resolution.
///
/// Each pass projects overlapping pairs apart (an even 50/50 split along
/// the collision axis — cheap, not physically exact) and exchanges
/// momentum; the whole-grid pass repeats `iterations` times per frame so
/// stacked contacts relax toward a non-overlapping state.
#[derive(Debug, Clone)]
pub struct DiscreteSolver {
    pub iterations: u32,
    pub elasticity: f32,
}

impl DiscreteSolver {
    pub fn new(iterations: u32, elasticity: f32) -> Self {
        Self {
            iterations,
            elasticity,
        }
    }

    /// Clears the grid and re-registers every body from its current
    /// position — the rebuild-per-frame strategy the discrete mode assumes.
    ///
    /// Out-of-range positions are clamped back into bounds and retried
    /// (recoverable drift); an overflowing cell is logged and skipped, as
    /// the cap is validated against geometry at startup.
    pub fn rebuild(
        &self,
        grid: &mut SpatialGrid,
        bodies: &mut Arena<Body>,
        bounds: &Bounds,
    ) {
        grid.clear();
        let ids: Vec<_> = bodies.ids().collect();
        for id in ids {
            let Some(body) = bodies.get_mut(id) else { continue };
            match grid.insert(id, body.position) {
                Ok(()) => {}
                Err(Error::OutOfBounds { x, y }) => {
                    warn!("body {id:?} drifted out of grid at ({x}, {y}); clamping");
                    body.enforce_bounds(bounds, self.elasticity);
                    if let Err(e) = grid.insert(id, body.position) {
                        error!("insert after clamp failed for {id:?}: {e}");
                    }
                }
                Err(e) => error!("grid insert failed for {id:?}: {e}"),
            }
        }
    }

    /// One sweep over the interior anchor cells whose column lies in
    /// `cols`, resolving every ordered pair in each 3x3 neighborhood.
    pub fn sweep_columns(
        &self,
        grid: &SpatialGrid,
        bodies: &mut Arena<Body>,
        bounds: &Bounds,
        cols: std::ops::Range<usize>,
    ) -> PassStats {
        let mut stats = PassStats::default();
        grid.for_each_pair_in_columns(cols, |anchor, neighbor| {
            for &a in anchor.members() {
                for &b in neighbor.members() {
                    let Some((body_a, body_b)) = bodies.get2_mut(a, b) else {
                        continue;
                    };
                    stats.pairs_checked += 1;
                    if self.resolve_pair(body_a, body_b, bounds) {
                        stats.overlaps_resolved += 1;
                    }
                }
            }
        });
        stats
    }

    /// Projection + impulse for a single pair; returns whether the pair
    /// overlapped.
    pub fn resolve_pair(&self, a: &mut Body, b: &mut Body, bounds: &Bounds) -> bool {
        let delta = a.position - b.position;
        let dist = delta.length();
        let min_dist = a.radius + b.radius;
        if dist >= min_dist {
            return false;
        }

        let (normal, dist) = match separation_axis(delta, dist) {
            Ok(normal) => (normal, dist),
            Err(e) => {
                // Coincident centers: push apart along an arbitrary axis.
                warn!("{e}; substituting unit separation axis");
                (Vec2::X, GEOM_EPSILON)
            }
        };

        // Impulse uses the pre-projection separation.
        apply_impulse(a, b, normal * dist, dist, self.elasticity);

        let correction = 0.5 * (min_dist - dist) * normal;
        a.position += correction;
        b.position -= correction;

        // The projection may have pushed either body past the simulation
        // edge; re-enforce immediately.
        a.enforce_bounds(bounds, self.elasticity);
        b.enforce_bounds(bounds, self.elasticity);
        true
    }
}
