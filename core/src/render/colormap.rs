use plotters::style::RGBColor;

/// Piecewise-linear colormap over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    stops: Vec<(f64, RGBColor)>,
}

impl Colormap {
    /// Violet through blue, green and yellow to red.
    pub fn rainbow() -> Self {
        Self {
            stops: vec![
                (0.0, RGBColor(128, 0, 255)),
                (0.2, RGBColor(0, 0, 255)),
                (0.4, RGBColor(0, 200, 255)),
                (0.55, RGBColor(0, 220, 60)),
                (0.75, RGBColor(255, 230, 0)),
                (0.9, RGBColor(255, 120, 0)),
                (1.0, RGBColor(220, 0, 0)),
            ],
        }
    }

    /// Colour at `fraction`, clamped to the ends of the map.
    pub fn at(&self, fraction: f64) -> RGBColor {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        for pair in self.stops.windows(2) {
            let ((lo, from), (hi, to)) = (pair[0], pair[1]);
            if fraction <= hi {
                let t = if hi > lo { (fraction - lo) / (hi - lo) } else { 0.0 };
                return RGBColor(
                    lerp(from.0, to.0, t),
                    lerp(from.1, to.1, t),
                    lerp(from.2, to.2, t),
                );
            }
        }
        self.stops.last().map(|(_, c)| *c).unwrap_or(RGBColor(0, 0, 0))
    }

    /// Colour for `value` scaled into `[vmin, vmax]`.
    pub fn scaled(&self, value: f64, (vmin, vmax): (f64, f64)) -> RGBColor {
        self.at((value - vmin) / (vmax - vmin))
    }
}

fn lerp(from: u8, to: u8, t: f64) -> u8 {
    (f64::from(from) + (f64::from(to) - f64::from(from)) * t).round() as u8
}
