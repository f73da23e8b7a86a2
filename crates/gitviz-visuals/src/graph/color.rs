use bevy::color::{Color, Hsva, Srgba};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fmt;

use crate::error::{Error, Result};
use crate::util::ids::stable_unit;

/// Hue/saturation/brightness, every channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsb {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Hsb {
    pub const fn new(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }

    /// Accepts `hsb(h,s,b)` directly; anything else goes through bevy's color math.
    pub fn parse(fill: &str) -> Result<Self> {
        let trimmed = fill.trim();
        if let Some(body) = trimmed
            .strip_prefix("hsb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<f32> = body
                .split(',')
                .map(|p| p.trim().parse::<f32>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| Error::InvalidColor(fill.to_string()))?;
            let [hue, saturation, brightness] = parts[..] else {
                return Err(Error::InvalidColor(fill.to_string()));
            };
            return Ok(Self::new(hue, saturation, brightness));
        }

        let srgba = Srgba::hex(trimmed).map_err(|_| Error::InvalidColor(fill.to_string()))?;
        Ok(Self::from_hsva(Hsva::from(srgba)))
    }

    /// Hue for a branch that never got an explicit fill.
    pub fn fallback_for(id: &str) -> Self {
        Self::new(stable_unit(id), 0.7, 1.0)
    }

    pub fn from_hsva(hsva: Hsva) -> Self {
        Self::new(
            (hsva.hue / 360.0).rem_euclid(1.0),
            hsva.saturation,
            hsva.value,
        )
    }

    pub fn to_color(self) -> Color {
        Color::hsv(self.hue * 360.0, self.saturation, self.brightness)
    }

    pub fn to_hex(self) -> String {
        self.to_color().to_srgba().to_hex()
    }
}

impl fmt::Display for Hsb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsb({},{},{})", self.hue, self.saturation, self.brightness)
    }
}

/// Circular mean of hues plus arithmetic means of saturation and brightness.
/// Returns `None` for an empty stack.
pub fn blend_hues(colors: &[Hsb]) -> Option<Hsb> {
    match colors {
        [] => None,
        [only] => Some(*only),
        _ => {
            let mut x = 0.0f32;
            let mut y = 0.0f32;
            let mut sat = 0.0f32;
            let mut bright = 0.0f32;
            for (i, c) in colors.iter().enumerate() {
                let angle = c.hue * TAU;
                x += angle.cos();
                y += angle.sin();
                // running mean: identical inputs come back unchanged
                let n = (i + 1) as f32;
                sat += (c.saturation - sat) / n;
                bright += (c.brightness - bright) / n;
            }
            let mut hue = y.atan2(x) / TAU;
            if hue < 0.0 {
                hue += 1.0;
            }
            if hue >= 1.0 {
                hue = 0.0;
            }
            Some(Hsb::new(hue, sat, bright))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hsb_strings() {
        let c = Hsb::parse("hsb(0.25, 0.7, 1)").expect("hsb");
        assert_eq!(c, Hsb::new(0.25, 0.7, 1.0));
        assert!(Hsb::parse("hsb(0.25,0.7)").is_err());
        assert!(Hsb::parse("hsb(a,b,c)").is_err());
    }

    #[test]
    fn converts_hex_through_hsva() {
        let red = Hsb::parse("#ff0000").expect("hex");
        assert!(red.hue.abs() < 1e-4);
        assert!((red.saturation - 1.0).abs() < 1e-4);
        assert!((red.brightness - 1.0).abs() < 1e-4);

        let blue = Hsb::parse("#0000ff").expect("hex");
        assert!((blue.hue - 2.0 / 3.0).abs() < 1e-3);

        assert!(matches!(Hsb::parse("nope"), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn single_color_blend_is_identity() {
        let c = Hsb::new(0.83, 0.42, 0.9);
        assert_eq!(blend_hues(&[c]), Some(c));
        assert_eq!(blend_hues(&[]), None);
    }

    #[test]
    fn identical_colors_blend_to_themselves() {
        let c = Hsb::new(0.3, 0.7, 0.9);
        let out = blend_hues(&[c, c, c]).expect("blend");
        assert!((out.hue - 0.3).abs() < 1e-5);
        assert_eq!(out.saturation, 0.7);
        assert_eq!(out.brightness, 0.9);
    }

    #[test]
    fn opposite_hues_cancel_but_keep_exact_means() {
        let colors = [Hsb::new(0.0, 0.5, 1.0), Hsb::new(0.5, 1.0, 0.5)];
        let (x, y) = colors.iter().fold((0.0f32, 0.0f32), |(x, y), c| {
            (x + (c.hue * TAU).cos(), y + (c.hue * TAU).sin())
        });
        assert!(x.hypot(y) / (colors.len() as f32) < 1e-5);
        let out = blend_hues(&colors).expect("blend");
        assert!((0.0..1.0).contains(&out.hue));
        assert_eq!(out.saturation, 0.75);
        assert_eq!(out.brightness, 0.75);
    }

    #[test]
    fn blend_wraps_around_zero() {
        let out = blend_hues(&[Hsb::new(0.95, 1.0, 1.0), Hsb::new(0.05, 1.0, 1.0)])
            .expect("blend");
        assert!(out.hue < 1e-4 || out.hue > 1.0 - 1e-4);
    }

    #[test]
    fn fallback_is_stable_per_id() {
        assert_eq!(Hsb::fallback_for("topic"), Hsb::fallback_for("topic"));
        assert_eq!(Hsb::fallback_for("topic").saturation, 0.7);
    }

    #[test]
    fn hex_output_matches_primary() {
        assert_eq!(Hsb::new(0.0, 1.0, 1.0).to_hex().to_ascii_uppercase(), "#FF0000");
    }
}
