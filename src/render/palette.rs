use plotters::style::RGBColor;

pub const WHITESMOKE: RGBColor = RGBColor(245, 245, 245);
pub const PURPLE: RGBColor = RGBColor(128, 0, 128);
pub const VIOLETRED: RGBColor = RGBColor(199, 21, 133);
pub const DARKORANGE: RGBColor = RGBColor(255, 140, 0);

/// Linear two-color scale over a fixed value range.
#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    pub low: RGBColor,
    pub high: RGBColor,
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub fn new(low: RGBColor, high: RGBColor, min: f64, max: f64) -> Self {
        Self { low, high, min, max }
    }

    /// Position of `value` inside the range, clamped to [0, 1].
    pub fn fraction(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> RGBColor {
        lerp(self.low, self.high, self.fraction(value))
    }
}

pub fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let ch = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round().clamp(0.0, 255.0) as u8;
    RGBColor(ch(a.0, b.0), ch(a.1, b.1), ch(a.2, b.2))
}

/// Fixed scale for ligand-target regulatory potential.
pub fn ligand_target_scale(max: f64) -> ColorScale {
    ColorScale::new(WHITESMOKE, PURPLE, 0.0, max)
}

/// Fixed scale for ligand-receptor interaction potential.
pub fn ligand_receptor_scale(max: f64) -> ColorScale {
    ColorScale::new(WHITESMOKE, VIOLETRED, 0.0, max)
}

/// Fixed scale for Pearson activity scores.
pub fn activity_scale(min: f64, max: f64) -> ColorScale {
    ColorScale::new(WHITESMOKE, DARKORANGE, min, max)
}

const CATEGORY_COLORS: [RGBColor; 10] = [
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
    RGBColor(255, 127, 0),
    RGBColor(166, 86, 40),
    RGBColor(247, 129, 191),
    RGBColor(0, 139, 139),
    RGBColor(205, 173, 0),
    RGBColor(106, 90, 205),
];

pub const UNASSIGNED_COLOR: RGBColor = RGBColor(160, 160, 160);

/// Stable color for the `index`-th category.
pub fn category_color(index: usize) -> RGBColor {
    CATEGORY_COLORS[index % CATEGORY_COLORS.len()]
}
