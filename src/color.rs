use bevy_color::{ColorToComponents, LinearRgba, Srgba};

/// sRGB colour as authored (hex strings, 8-bit tuples), converted to linear
/// space on the way to the GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(Srgba);

impl Color {
    pub fn from_hex(hex: &str) -> anyhow::Result<Self> {
        Srgba::hex(hex)
            .map(Self)
            .map_err(|e| anyhow::anyhow!("invalid colour `{}`: {:?}", hex, e))
    }

    /// Like [`Color::from_hex`] but falls back to grey for bad input.
    pub fn from_hex_or_grey(hex: &str) -> Self {
        Self::from_hex(hex).unwrap_or_else(|e| {
            log::warn!("{e}");
            Self::from((100, 116, 139))
        })
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.0.alpha = alpha;
        self
    }

    pub fn into_linear_rgba(self) -> [f32; 4] {
        LinearRgba::from(self.0).to_f32_array()
    }

    pub fn into_linear_wgpu_color(self) -> wgpu::Color {
        let [r, g, b, a] = self.into_linear_rgba();
        wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: a as f64 }
    }

    pub fn into_glyphon(self) -> glyphon::Color {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        glyphon::Color::rgba(to_u8(self.0.red), to_u8(self.0.green), to_u8(self.0.blue), to_u8(self.0.alpha))
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self(Srgba::rgb_u8(r, g, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips_to_glyphon_bytes() {
        let color = Color::from_hex("#6366F1").unwrap();
        assert_eq!(color.into_glyphon(), glyphon::Color::rgba(0x63, 0x66, 0xF1, 0xFF));
    }

    #[test]
    fn white_is_white_in_linear_space() {
        let [r, g, b, a] = Color::from((255, 255, 255)).into_linear_rgba();
        for c in [r, g, b, a] {
            assert!((c - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn bad_hex_falls_back() {
        assert!(Color::from_hex("#zzzzzz").is_err());
        assert_eq!(Color::from_hex_or_grey("nope"), Color::from((100, 116, 139)));
    }

    #[test]
    fn alpha_is_kept_linear() {
        let [_, _, _, a] = Color::from((10, 20, 30)).with_alpha(0.25).into_linear_rgba();
        assert!((a - 0.25).abs() < 1e-6);
    }
}
