use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Simulation extents plus the border margin bodies may not cross.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Bounds {
    pub fn new(width: u16, height: u16, margin: f32) -> Self {
        Self {
            width: f32::from(width),
            height: f32::from(height),
            margin,
        }
    }

    /// Lowest legal center coordinate for a disc of `radius`, both axes.
    pub fn min_for(&self, radius: f32) -> Vec2 {
        Vec2::splat(radius + self.margin)
    }

    /// Highest legal center coordinate for a disc of `radius`.
    pub fn max_for(&self, radius: f32) -> Vec2 {
        Vec2::new(
            self.width - radius - self.margin,
            self.height - radius - self.margin,
        )
    }

    /// Whether a disc center sits inside the legal band on both axes.
    pub fn contains(&self, position: Vec2, radius: f32) -> bool {
        let min = self.min_for(radius);
        let max = self.max_for(radius);
        position.x >= min.x && position.x <= max.x && position.y >= min.y && position.y <= max.y
    }
}

/// Packed render color. The simulation core only ever assigns it; drawing
/// happens in the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    /// Fully saturated hue wheel color, `hue` in degrees.
    ///
    /// Standard HSV conversion with s = v = 1; the wheel repeats every 360
    /// degrees so a monotonically increasing spawn counter cycles smoothly.
    pub fn from_hue(hue: u32) -> Self {
        let h = (hue % 360) as f32 / 60.0;
        let x = 1.0 - (h % 2.0 - 1.0).abs();
        let ramp = (255.0 * x) as u8;
        let (r, g, b) = match h as u32 {
            0 => (255, ramp, 0),
            1 => (ramp, 255, 0),
            2 => (0, 255, ramp),
            3 => (0, ramp, 255),
            4 => (ramp, 0, 255),
            _ => (255, 0, ramp),
        };
        Self { r, g, b, a: 255 }
    }
}
