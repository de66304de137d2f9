use std::collections::HashMap;
use std::ops::Range;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::collision::discrete::{DiscreteSolver, PassStats};
use crate::collision::grid::SpatialGrid;
use crate::core::body::{Body, BodyId};
use crate::core::types::Bounds;
use crate::utils::allocator::Arena;

/// Width of the column gap left between concurrently swept partitions.
///
/// Sweeping an anchor column writes to bodies one column to either side,
/// so two skipped columns guarantee adjacent partitions' write sets are
/// disjoint. The skipped seam columns are swept sequentially after the join.
const SEAM_WIDTH: usize = 2;

/// Fork-join dispatcher for the discrete collision sweep.
///
/// The grid's interior columns are split into contiguous ranges, one per
/// partition. Each worker sweeps its range minus the trailing seam on a
/// private clone of the bodies it can touch and the results are written
/// back after the join; the seams are then swept on the caller's thread.
/// Every `dispatch` call is a full barrier — the frame never proceeds while
/// partition work is in flight, and a panicking worker propagates and
/// aborts the frame.
#[derive(Debug, Clone)]
pub struct ParallelDispatcher {
    pub partitions: usize,
}

impl ParallelDispatcher {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    /// Runs one full discrete sweep over the interior columns, fanning the
    /// partition ranges out across the rayon pool. Blocks until the sweep
    /// (parallel ranges plus sequential seams) has completed.
    pub fn dispatch(
        &self,
        solver: &DiscreteSolver,
        grid: &SpatialGrid,
        bodies: &mut Arena<Body>,
        bounds: &Bounds,
    ) -> PassStats {
        let interior = grid.interior_cols();
        if self.partitions == 1 || interior.len() <= SEAM_WIDTH {
            return solver.sweep_columns(grid, bodies, bounds, interior);
        }

        let ranges = partition_ranges(interior, self.partitions);
        let mut jobs = Vec::new();
        let mut seams: Vec<Range<usize>> = Vec::new();

        for (i, range) in ranges.iter().enumerate() {
            let last = i == ranges.len() - 1;
            // The last partition has no right neighbor and keeps its tail.
            let swept_end = if last {
                range.end
            } else {
                range.end.saturating_sub(SEAM_WIDTH)
            };
            if swept_end <= range.start {
                seams.push(range.clone());
                continue;
            }
            jobs.push(PartitionJob::collect(
                grid,
                bodies,
                range.start..swept_end,
            ));
            if !last {
                seams.push(swept_end..range.end);
            }
        }

        let stats = Mutex::new(PassStats::default());
        jobs.par_iter_mut().for_each(|job| {
            let partial = job.sweep(solver, grid, bounds);
            stats.lock().merge(partial);
        });
        let mut stats = stats.into_inner();

        // Disjoint write sets make the write-back order immaterial.
        for job in jobs {
            job.write_back(bodies);
        }

        for seam in seams {
            stats.merge(solver.sweep_columns(grid, bodies, bounds, seam));
        }
        stats
    }
}

/// Splits `interior` into `partitions` contiguous ranges covering it
/// exactly, the wider ones first when the split is uneven.
fn partition_ranges(interior: Range<usize>, partitions: usize) -> Vec<Range<usize>> {
    let span = interior.len();
    let count = partitions.min(span).max(1);
    let base = span / count;
    let extra = span % count;

    let mut ranges = Vec::with_capacity(count);
    let mut start = interior.start;
    for i in 0..count {
        let len = base + usize::from(i < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// One worker's share of a sweep: the anchor columns plus private clones
/// of every body in the touched band (anchors ± one column).
struct PartitionJob {
    cols: Range<usize>,
    ids: Vec<BodyId>,
    bodies: Vec<Body>,
    slot_of: HashMap<BodyId, usize>,
}

impl PartitionJob {
    fn collect(grid: &SpatialGrid, bodies: &Arena<Body>, cols: Range<usize>) -> Self {
        let band = cols.start.saturating_sub(1)..(cols.end + 1).min(grid.cols());
        let mut ids = Vec::new();
        let mut clones = Vec::new();
        let mut slot_of = HashMap::new();
        for col in band {
            for row in 0..grid.rows() {
                for &id in grid.cell(col, row).members() {
                    if let Some(body) = bodies.get(id) {
                        slot_of.insert(id, ids.len());
                        ids.push(id);
                        clones.push(body.clone());
                    }
                }
            }
        }
        Self {
            cols,
            ids,
            bodies: clones,
            slot_of,
        }
    }

    fn sweep(&mut self, solver: &DiscreteSolver, grid: &SpatialGrid, bounds: &Bounds) -> PassStats {
        let mut stats = PassStats::default();
        let Self {
            cols,
            bodies,
            slot_of,
            ..
        } = self;
        grid.for_each_pair_in_columns(cols.clone(), |anchor, neighbor| {
            for &a in anchor.members() {
                for &b in neighbor.members() {
                    let (Some(&slot_a), Some(&slot_b)) = (slot_of.get(&a), slot_of.get(&b))
                    else {
                        continue;
                    };
                    let Some((body_a, body_b)) = pair_mut(bodies, slot_a, slot_b) else {
                        continue;
                    };
                    stats.pairs_checked += 1;
                    if solver.resolve_pair(body_a, body_b, bounds) {
                        stats.overlaps_resolved += 1;
                    }
                }
            }
        });
        stats
    }

    fn write_back(self, bodies: &mut Arena<Body>) {
        for (id, body) in self.ids.into_iter().zip(self.bodies) {
            if let Some(slot) = bodies.get_mut(id) {
                *slot = body;
            }
        }
    }
}

/// Mutable references to two distinct slots of a slice.
fn pair_mut<T>(slice: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a >= slice.len() || b >= slice.len() {
        return None;
    }
    if a < b {
        let (left, right) = slice.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = slice.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}
