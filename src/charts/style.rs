//! Chart Style Module
//! Figure dimensions and colors, passed to the renderer explicitly instead
//! of living in process-wide mutable state.

use plotters::style::RGBColor;

pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const KDE_RED: RGBColor = RGBColor(220, 53, 69);

/// Categorical palette for pie slices and stacked bars.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(255, 87, 34),   // Deep Orange
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// Rendering configuration handed to every chart method.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
            font_family: "sans-serif".to_string(),
        }
    }
}

impl ChartStyle {
    pub fn color(&self, index: usize) -> RGBColor {
        PALETTE[index % PALETTE.len()]
    }

    /// Yellow-orange-red ramp for heatmap cells, `t` in [0, 1].
    pub fn heat_color(t: f64) -> RGBColor {
        const STOPS: [(u8, u8, u8); 4] = [
            (255, 255, 178),
            (254, 204, 92),
            (253, 141, 60),
            (189, 0, 38),
        ];

        let t = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f64;
        let low = t.floor() as usize;
        let high = (low + 1).min(STOPS.len() - 1);
        let frac = t - low as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        RGBColor(
            lerp(STOPS[low].0, STOPS[high].0),
            lerp(STOPS[low].1, STOPS[high].1),
            lerp(STOPS[low].2, STOPS[high].2),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_ramp_hits_its_endpoints() {
        assert_eq!(ChartStyle::heat_color(0.0), RGBColor(255, 255, 178));
        assert_eq!(ChartStyle::heat_color(1.0), RGBColor(189, 0, 38));
        // Out-of-range input clamps instead of panicking
        assert_eq!(ChartStyle::heat_color(2.0), RGBColor(189, 0, 38));
    }

    #[test]
    fn palette_wraps_around() {
        let style = ChartStyle::default();
        assert_eq!(style.color(0), style.color(PALETTE.len()));
    }
}
