use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the simulation core.
///
/// Stale continuous-mode events are not represented here: discarding them is
/// a normal control-flow path, counted in [`crate::world::SimStats`].
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected configuration, raised before any frame runs.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A body position mapped outside the spatial grid on insert.
    ///
    /// Bodies are boundary-clamped before insertion, so this indicates a
    /// logic or configuration fault rather than a routine condition.
    #[error("position ({x}, {y}) is outside the collision grid")]
    OutOfBounds { x: f32, y: f32 },

    /// A cell's bounded membership capacity was exceeded.
    #[error("cell ({col}, {row}) exceeded its occupancy cap of {cap}")]
    CellOverflow { col: usize, row: usize, cap: usize },

    /// Coincident centers or a near-zero separation magnitude.
    ///
    /// Callers recover by substituting an epsilon separation axis.
    #[error("degenerate geometry: separation {dist} below tolerance")]
    DegenerateGeometry { dist: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_cell() {
        let e = Error::CellOverflow {
            col: 3,
            row: 7,
            cap: 16,
        };
        let msg = format!("{e}");
        assert!(msg.contains("(3, 7)"));
        assert!(msg.contains("16"));
    }
}
