use ordered_float::NotNan;
use std::cmp::Ordering;

use crate::core::body::BodyId;

/// Axis-aligned direction of a cell crossing or wall contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
    Up,
    Down,
}

impl Side {
    /// Whether the side lies on the X axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// What a scheduled event does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The subject's center crosses one edge of its current cell.
    CellCrossing(Side),
    /// The subject reaches a simulation boundary (radius-adjusted edge).
    WallContact(Side),
    /// First contact between the subject and another body.
    BodyContact(BodyId),
}

impl EventKind {
    fn order_key(&self) -> (u8, u32) {
        match *self {
            EventKind::CellCrossing(side) => (0, side as u32),
            EventKind::WallContact(side) => (1, side as u32),
            EventKind::BodyContact(other) => (2, other.0),
        }
    }
}

/// A scheduled collision event, ordered by occurrence time ascending.
///
/// `stamp` snapshots the subject's frame-local clock at scheduling time
/// (and `other_stamp` the partner's, for contacts). The event is valid only
/// while those snapshots still match the bodies' clocks: any earlier event
/// that advances a participant supersedes it, and the stale copy left in
/// the heap must be discarded, not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub time: NotNan<f32>,
    pub body: BodyId,
    pub kind: EventKind,
    pub stamp: NotNan<f32>,
    pub other_stamp: Option<NotNan<f32>>,
}

impl CollisionEvent {
    /// Builds an event, rejecting NaN times (they would poison the heap
    /// ordering).
    pub fn new(
        time: f32,
        body: BodyId,
        kind: EventKind,
        stamp: f32,
        other_stamp: Option<f32>,
    ) -> Option<Self> {
        let other_stamp = match other_stamp {
            Some(s) => Some(NotNan::new(s).ok()?),
            None => None,
        };
        Some(Self {
            time: NotNan::new(time).ok()?,
            body,
            kind,
            stamp: NotNan::new(stamp).ok()?,
            other_stamp,
        })
    }

    pub fn time_f32(&self) -> f32 {
        self.time.into_inner()
    }

    /// Checks the staleness rule against the participants' current clocks.
    pub fn is_fresh(&self, subject_clock: f32, other_clock: Option<f32>) -> bool {
        if self.stamp.into_inner() != subject_clock {
            return false;
        }
        match (self.other_stamp, other_clock) {
            (Some(stamp), Some(clock)) => stamp.into_inner() == clock,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

impl Ord for CollisionEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.body.cmp(&other.body))
            .then_with(|| self.kind.order_key().cmp(&other.kind.order_key()))
    }
}

impl PartialOrd for CollisionEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
