use std::cmp::Reverse;
use std::collections::BinaryHeap;

use glam::Vec2;
use log::{error, warn};

use super::discrete::{apply_impulse, separation_axis};
use super::event::{CollisionEvent, EventKind, Side};
use super::grid::SpatialGrid;
use crate::core::body::{Body, BodyId};
use crate::core::types::Bounds;
use crate::utils::allocator::Arena;

/// Candidate events closer than this to a body's current clock are dropped;
/// the clock must strictly advance for the processing loop to terminate.
const TIME_EPSILON: f32 = 1e-6;

/// Relative speeds below this cannot produce a contact root.
const SPEED_EPSILON: f32 = 1e-9;

/// Per-frame counters for the event loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventStats {
    pub processed: u64,
    pub stale_discarded: u64,
}

impl EventStats {
    pub fn merge(&mut self, other: EventStats) {
        self.processed += other.processed;
        self.stale_discarded += other.stale_discarded;
    }
}

/// Event-driven continuous collision resolution.
///
/// Within one frame every body carries a local clock (`Body::local_time`).
/// The solver derives each body's earliest upcoming event — a cell-edge
/// crossing, a wall contact, or a body-body time of impact — and processes
/// the global queue in time order, rescheduling the participants after each
/// handled event. Strictly more accurate than the discrete mode for fast
/// bodies (no tunneling), at a higher per-frame cost. Inherently
/// sequential: event ordering and invalidation do not parallelize.
#[derive(Debug)]
pub struct ContinuousSolver {
    pub elasticity: f32,
    heap: BinaryHeap<Reverse<CollisionEvent>>,
}

impl ContinuousSolver {
    pub fn new(elasticity: f32) -> Self {
        Self {
            elasticity,
            heap: BinaryHeap::new(),
        }
    }

    /// Runs the event loop for one frame of length `dt`.
    ///
    /// Bodies must already be registered in the grid; membership is kept
    /// current as bodies cross cell edges mid-step.
    pub fn resolve(
        &mut self,
        grid: &mut SpatialGrid,
        bodies: &mut Arena<Body>,
        bounds: &Bounds,
        dt: f32,
    ) -> EventStats {
        let mut stats = EventStats::default();
        self.heap.clear();

        for id in bodies.ids() {
            self.schedule(id, grid, bodies, bounds, dt);
        }

        // Terminates because every handled event advances its subject's
        // clock by at least TIME_EPSILON and clocks are bounded by dt; the
        // valve catches scheduling bugs rather than legal states.
        let event_valve = 10_000 + 100 * bodies.len() as u64;

        while let Some(Reverse(event)) = self.heap.pop() {
            if stats.processed >= event_valve {
                error!("event valve tripped after {} events; aborting frame resolution", stats.processed);
                break;
            }

            let subject_clock = match bodies.get(event.body) {
                Some(body) => body.local_time,
                None => continue,
            };
            let other_clock = match event.kind {
                EventKind::BodyContact(other) => bodies.get(other).map(|b| b.local_time),
                _ => None,
            };
            if !event.is_fresh(subject_clock, other_clock) {
                stats.stale_discarded += 1;
                // A discard caused by the partner leaves the subject with no
                // queued event; re-derive from the changed world so the
                // subject stays live.
                if event.stamp.into_inner() == subject_clock && subject_clock < dt {
                    self.schedule(event.body, grid, bodies, bounds, dt);
                }
                continue;
            }

            stats.processed += 1;
            let t = event.time_f32();
            match event.kind {
                EventKind::CellCrossing(_) => self.cross_cell(event.body, t, grid, bodies, bounds),
                EventKind::WallContact(side) => {
                    self.hit_wall(event.body, side, t, grid, bodies, bounds)
                }
                EventKind::BodyContact(other) => {
                    self.contact(event.body, other, t, grid, bodies);
                    if bodies.get(other).is_some_and(|b| b.local_time < dt) {
                        self.schedule(other, grid, bodies, bounds, dt);
                    }
                }
            }
            if bodies.get(event.body).is_some_and(|b| b.local_time < dt) {
                self.schedule(event.body, grid, bodies, bounds, dt);
            }
        }

        self.drain(grid, bodies, bounds, dt);
        stats
    }

    /// Advances the subject to the crossing point and moves its membership
    /// to the destination cell.
    fn cross_cell(
        &mut self,
        id: BodyId,
        t: f32,
        grid: &mut SpatialGrid,
        bodies: &mut Arena<Body>,
        bounds: &Bounds,
    ) {
        let Some(body) = bodies.get_mut(id) else { return };
        let old_position = body.position;
        body.advance(t - body.local_time);
        body.local_time = t;
        grid.remove(id, old_position);
        if grid.insert(id, body.position).is_err() {
            // Numerical drift pushed the crossing point off-grid; clamp and
            // re-seat so the frame keeps a consistent index.
            warn!("cell crossing left the grid at {:?}; clamping", body.position);
            body.enforce_bounds(bounds, self.elasticity);
            if let Err(e) = grid.insert(id, body.position) {
                error!("re-seat after clamp failed for {id:?}: {e}");
            }
        }
    }

    /// Advances the subject to the boundary, snaps it onto the contact
    /// line, and reflects the normal velocity component.
    fn hit_wall(
        &mut self,
        id: BodyId,
        side: Side,
        t: f32,
        grid: &mut SpatialGrid,
        bodies: &mut Arena<Body>,
        bounds: &Bounds,
    ) {
        let Some(body) = bodies.get_mut(id) else { return };
        let old_position = body.position;
        body.advance(t - body.local_time);
        body.local_time = t;

        let min = bounds.min_for(body.radius);
        let max = bounds.max_for(body.radius);
        match side {
            Side::Left => body.position.x = min.x,
            Side::Right => body.position.x = max.x,
            Side::Up => body.position.y = min.y,
            Side::Down => body.position.y = max.y,
        }
        if side.is_horizontal() {
            body.velocity.x *= -self.elasticity;
        } else {
            body.velocity.y *= -self.elasticity;
        }
        reseat_if_moved(grid, id, old_position, body.position);
    }

    /// Advances both participants to the contact time and exchanges
    /// momentum along the line of centers.
    fn contact(
        &mut self,
        id: BodyId,
        other: BodyId,
        t: f32,
        grid: &mut SpatialGrid,
        bodies: &mut Arena<Body>,
    ) {
        let (old_a, old_b);
        {
            let Some((a, b)) = bodies.get2_mut(id, other) else { return };
            old_a = a.position;
            old_b = b.position;
            a.advance(t - a.local_time);
            b.advance(t - b.local_time);
            a.local_time = t;
            b.local_time = t;

            let delta = a.position - b.position;
            let dist = delta.length();
            match separation_axis(delta, dist) {
                Ok(_) => apply_impulse(a, b, delta, dist, self.elasticity),
                Err(e) => {
                    warn!("{e} at contact time {t}; substituting unit axis");
                    let span = a.radius + b.radius;
                    apply_impulse(a, b, Vec2::X * span, span, self.elasticity);
                }
            }
        }
        if let Some(body) = bodies.get(id) {
            reseat_if_moved(grid, id, old_a, body.position);
        }
        if let Some(body) = bodies.get(other) {
            reseat_if_moved(grid, other, old_b, body.position);
        }
    }

    /// Derives the body's earliest upcoming event and enqueues it if it
    /// lands inside the frame.
    fn schedule(
        &mut self,
        id: BodyId,
        grid: &SpatialGrid,
        bodies: &Arena<Body>,
        bounds: &Bounds,
        dt: f32,
    ) {
        let Some(body) = bodies.get(id) else { return };
        let Some((col, row)) = grid.cell_of(body.position) else {
            warn!("body {id:?} has no grid cell; skipping scheduling");
            return;
        };

        let clock = body.local_time;
        let position = body.position;
        let velocity = body.velocity;
        let free_flight = dt - clock;
        let end_position = position + velocity * free_flight;

        let mut earliest = dt;
        let mut kind: Option<EventKind> = None;
        let mut other_stamp: Option<f32> = None;

        let mut consider = |t: f32, candidate: EventKind, stamp: Option<f32>| {
            if t > clock + TIME_EPSILON && t < earliest {
                earliest = t;
                kind = Some(candidate);
                other_stamp = stamp;
            }
        };

        // Cell-edge crossings, solved linearly per axis.
        let (cell_min, cell_max) = grid.cell_bounds(col, row);
        if end_position.x < cell_min.x {
            consider(
                clock + (cell_min.x - position.x) / velocity.x,
                EventKind::CellCrossing(Side::Left),
                None,
            );
        }
        if end_position.x > cell_max.x {
            consider(
                clock + (cell_max.x - position.x) / velocity.x,
                EventKind::CellCrossing(Side::Right),
                None,
            );
        }
        if end_position.y < cell_min.y {
            consider(
                clock + (cell_min.y - position.y) / velocity.y,
                EventKind::CellCrossing(Side::Up),
                None,
            );
        }
        if end_position.y > cell_max.y {
            consider(
                clock + (cell_max.y - position.y) / velocity.y,
                EventKind::CellCrossing(Side::Down),
                None,
            );
        }

        // Wall contacts against the radius-adjusted edges.
        let wall_min = bounds.min_for(body.radius);
        let wall_max = bounds.max_for(body.radius);
        if end_position.x < wall_min.x {
            consider(
                clock + (wall_min.x - position.x) / velocity.x,
                EventKind::WallContact(Side::Left),
                None,
            );
        }
        if end_position.x > wall_max.x {
            consider(
                clock + (wall_max.x - position.x) / velocity.x,
                EventKind::WallContact(Side::Right),
                None,
            );
        }
        if end_position.y < wall_min.y {
            consider(
                clock + (wall_min.y - position.y) / velocity.y,
                EventKind::WallContact(Side::Up),
                None,
            );
        }
        if end_position.y > wall_max.y {
            consider(
                clock + (wall_max.y - position.y) / velocity.y,
                EventKind::WallContact(Side::Down),
                None,
            );
        }

        // Body-body times of impact over the 3x3 neighborhood.
        for other_id in grid.neighborhood_members(col, row) {
            if other_id == id {
                continue;
            }
            let Some(other) = bodies.get(other_id) else { continue };
            // Clocks differ between bodies; extrapolate the neighbor to the
            // subject's clock so both positions refer to the same instant.
            let other_position = other.position + other.velocity * (clock - other.local_time);
            if let Some(t_rel) = circle_toi(
                position - other_position,
                velocity - other.velocity,
                body.radius + other.radius,
            ) {
                consider(
                    clock + t_rel,
                    EventKind::BodyContact(other_id),
                    Some(other.local_time),
                );
            }
        }

        if let Some(kind) = kind {
            match CollisionEvent::new(earliest, id, kind, clock, other_stamp) {
                Some(event) => self.heap.push(Reverse(event)),
                None => warn!("non-finite event time for {id:?}; dropped"),
            }
        }
    }

    /// Advances every body that still has frame time left by its remaining
    /// free flight, re-seats memberships the flight invalidated, and resets
    /// all clocks for the next frame.
    fn drain(
        &mut self,
        grid: &mut SpatialGrid,
        bodies: &mut Arena<Body>,
        bounds: &Bounds,
        dt: f32,
    ) {
        let ids: Vec<_> = bodies.ids().collect();
        for id in ids {
            let Some(body) = bodies.get_mut(id) else { continue };
            if body.local_time < dt {
                let old_position = body.position;
                body.advance(dt - body.local_time);

                // Positional safety clamp for numerical drift; genuine wall
                // hits were handled as events.
                let min = bounds.min_for(body.radius);
                let max = bounds.max_for(body.radius);
                let clamped = body.position.clamp(min, max);
                if clamped != body.position {
                    warn!("drain clamped body {id:?} from {:?}", body.position);
                    body.position = clamped;
                }

                if grid.cell_of(old_position) != grid.cell_of(body.position) {
                    let new_position = body.position;
                    grid.remove(id, old_position);
                    if let Err(e) = grid.insert(id, new_position) {
                        error!("drain re-seat failed for {id:?}: {e}");
                    }
                }
            }
            body.local_time = 0.0;
        }
    }
}

/// Moves a membership when an advancement carried the body across a cell
/// edge without its own crossing event (bodies sitting exactly on an edge,
/// impulse displacement, boundary snapping).
fn reseat_if_moved(grid: &mut SpatialGrid, id: BodyId, old_position: Vec2, new_position: Vec2) {
    if grid.cell_of(old_position) == grid.cell_of(new_position) {
        return;
    }
    grid.remove(id, old_position);
    if let Err(e) = grid.insert(id, new_position) {
        error!("re-seat failed for {id:?}: {e}");
    }
}

/// Smallest non-negative time at which two uniformly moving circles touch.
///
/// Solves `|dp + t dv|^2 = r^2`; returns `None` when the circles are not
/// approaching, the discriminant is negative, or the relative motion is too
/// slow to produce a root.
pub(crate) fn circle_toi(dp: Vec2, dv: Vec2, r: f32) -> Option<f32> {
    let speed_sq = dv.length_squared();
    if speed_sq < SPEED_EPSILON {
        return None;
    }
    let approach = dp.dot(dv);
    if approach >= 0.0 {
        return None;
    }
    let b = approach / speed_sq;
    let discriminant = b * b - (dp.length_squared() - r * r) / speed_sq;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_on_toi_matches_closed_form() {
        // Gap of 3.6 closing at 2.0 units/s.
        let t = circle_toi(Vec2::new(-4.0, 0.0), Vec2::new(2.0, 0.0), 0.4).unwrap();
        assert!((t - 1.8).abs() < 1e-5);
    }

    #[test]
    fn receding_circles_never_collide() {
        assert!(circle_toi(Vec2::new(-4.0, 0.0), Vec2::new(-2.0, 0.0), 0.4).is_none());
    }

    #[test]
    fn passing_circles_miss() {
        // Parallel tracks separated by more than the radius sum.
        assert!(circle_toi(Vec2::new(-10.0, 3.0), Vec2::new(5.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn zero_relative_motion_yields_no_root() {
        assert!(circle_toi(Vec2::new(-4.0, 0.0), Vec2::ZERO, 0.4).is_none());
    }

    use crate::core::body::Body;
    use crate::core::types::{Bounds, Rgba};
    use crate::utils::allocator::Arena;

    fn fixture(
        discs: &[(f32, f32, f32, f32)],
    ) -> (SpatialGrid, Arena<Body>, Bounds, ContinuousSolver) {
        let mut grid = SpatialGrid::new(200.0, 200.0, 16.0, 16);
        let mut bodies = Arena::new();
        for &(x, y, vx, vy) in discs {
            let body = Body::new(Vec2::new(x, y), 4.0, Vec2::new(vx, vy), 2.0, Rgba::WHITE);
            let id = bodies.insert(body);
            grid.insert(id, Vec2::new(x, y)).unwrap();
        }
        let bounds = Bounds::new(200, 200, 4.0);
        (grid, bodies, bounds, ContinuousSolver::new(1.0))
    }

    #[test]
    fn free_flight_advances_to_frame_end_and_resets_clocks() {
        let (mut grid, mut bodies, bounds, mut solver) = fixture(&[(50.0, 50.0, 30.0, 0.0)]);
        solver.resolve(&mut grid, &mut bodies, &bounds, 0.5);

        let body = bodies.iter().next().unwrap();
        assert!((body.position.x - 65.0).abs() < 1e-4);
        assert_eq!(body.local_time, 0.0);
    }

    #[test]
    fn head_on_contact_swaps_velocities_at_the_contact_point() {
        let (mut grid, mut bodies, bounds, mut solver) =
            fixture(&[(50.0, 50.0, 60.0, 0.0), (70.0, 50.0, -60.0, 0.0)]);
        let stats = solver.resolve(&mut grid, &mut bodies, &bounds, 0.5);

        assert!(stats.processed >= 1);
        let all: Vec<_> = bodies.iter().collect();
        // Contact at t = 0.1 (gap 12, closing 120), swap, then 0.4 s apart.
        assert!((all[0].velocity.x + 60.0).abs() < 1e-3);
        assert!((all[1].velocity.x - 60.0).abs() < 1e-3);
        assert!((all[0].position.x - 32.0).abs() < 0.1);
        assert!((all[1].position.x - 88.0).abs() < 0.1);
        assert!(all.iter().all(|b| b.local_time == 0.0));
    }

    #[test]
    fn wall_contact_reflects_with_elasticity() {
        let (mut grid, mut bodies, bounds, mut solver) = fixture(&[(20.0, 50.0, -60.0, 0.0)]);
        solver.resolve(&mut grid, &mut bodies, &bounds, 0.5);

        let body = bodies.iter().next().unwrap();
        // Wall at x = 8 reached after 0.2 s; full rebound covers 0.3 s.
        assert!((body.velocity.x - 60.0).abs() < 1e-3);
        assert!((body.position.x - 26.0).abs() < 0.1);
    }

    #[test]
    fn grid_membership_follows_cell_crossings() {
        let (mut grid, mut bodies, bounds, mut solver) = fixture(&[(10.0, 50.0, 80.0, 0.0)]);
        let id = bodies.ids().next().unwrap();
        solver.resolve(&mut grid, &mut bodies, &bounds, 0.5);

        let body = bodies.get(id).unwrap();
        let (col, row) = grid.cell_of(body.position).unwrap();
        assert!(grid.cell(col, row).members().contains(&id));
        // Crossed out of its starting cell.
        assert_ne!(grid.cell_of(Vec2::new(10.0, 50.0)).unwrap(), (col, row));
        assert_eq!(grid.cell(1, row).count(), 0);
    }

    #[test]
    fn superseded_contacts_are_discarded_as_stale() {
        // C overtakes B before the scheduled A-B contact, invalidating it.
        let (mut grid, mut bodies, bounds, mut solver) = fixture(&[
            (50.0, 50.0, 10.0, 0.0),
            (80.0, 50.0, -10.0, 0.0),
            (100.0, 50.0, -100.0, 0.0),
        ]);
        let stats = solver.resolve(&mut grid, &mut bodies, &bounds, 2.0);

        assert!(stats.stale_discarded >= 1, "stats: {stats:?}");
        assert!(stats.processed >= 2);
        for body in bodies.iter() {
            assert!(body.position.is_finite());
            assert!(bounds.contains(body.position, body.radius));
            assert_eq!(body.local_time, 0.0);
        }
    }
}
