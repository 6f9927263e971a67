use plotters::style::RGBColor;

/// Look shared by every figure a [`Renderer`](super::renderer::Renderer)
/// draws. Built once at startup and handed to the renderer.
#[derive(Debug, Clone)]
pub struct PlotTheme {
    /// Canvas outside the axes.
    pub figure_background: RGBColor,
    /// Plotting area inside the axes.
    pub background: RGBColor,
    pub grid: RGBColor,
    pub text: RGBColor,
    /// Colours handed out to groups and curves, in order.
    pub palette: Vec<RGBColor>,
    pub font: String,
    /// Base font size in points; converted to pixels with the output DPI.
    pub font_pt: f64,
    pub marker_pt: f64,
    pub line_pt: f64,
    pub width_in: f64,
    pub height_in: f64,
    /// Blank border kept around the tight bounding box, in inches.
    pub pad_in: f64,
}

impl PlotTheme {
    /// Grey plotting area with white grid lines and the muted "deep" palette.
    pub fn darkgrid() -> Self {
        Self {
            figure_background: RGBColor(255, 255, 255),
            background: RGBColor(234, 234, 242),
            grid: RGBColor(255, 255, 255),
            text: RGBColor(38, 38, 38),
            palette: vec![
                RGBColor(76, 114, 176),
                RGBColor(221, 132, 82),
                RGBColor(85, 168, 104),
                RGBColor(196, 78, 82),
                RGBColor(129, 114, 179),
                RGBColor(147, 120, 96),
                RGBColor(218, 139, 195),
                RGBColor(140, 140, 140),
                RGBColor(204, 185, 116),
                RGBColor(100, 181, 205),
            ],
            font: "sans-serif".to_string(),
            font_pt: 11.0,
            marker_pt: 2.5,
            line_pt: 1.5,
            width_in: 6.4,
            height_in: 4.8,
            pad_in: 0.1,
        }
    }

    /// Palette colour `i`, cycling when there are more groups than colours.
    pub fn color(&self, i: usize) -> RGBColor {
        self.palette[i % self.palette.len()]
    }

    /// Single-letter colour codes (`b`, `g`, `r`, ...) mapped onto the palette.
    pub fn color_code(&self, code: char) -> RGBColor {
        match code {
            'b' => self.color(0),
            'g' => self.color(2),
            'r' => self.color(3),
            'm' => self.color(4),
            'y' => self.color(8),
            'c' => self.color(9),
            'k' => RGBColor(0, 0, 0),
            _ => self.text,
        }
    }

    /// Points to pixels at `dpi`.
    pub fn px(&self, pt: f64, dpi: f64) -> f64 {
        pt * dpi / 72.0
    }

    /// Outer margin in pixels at `dpi`.
    pub fn pad_px(&self, dpi: f64) -> u32 {
        (self.pad_in * dpi).round() as u32
    }

    /// Canvas size in pixels at `dpi`.
    pub fn canvas_size(&self, dpi: f64) -> (u32, u32) {
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }
}

impl Default for PlotTheme {
    fn default() -> Self {
        Self::darkgrid()
    }
}
