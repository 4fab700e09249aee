use glam::Vec2;

use super::radar::LabelAnchor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Start,
    Middle,
    End,
}

impl From<LabelAnchor> for TextAlign {
    fn from(anchor: LabelAnchor) -> Self {
        match anchor {
            LabelAnchor::Start => TextAlign::Start,
            LabelAnchor::End => TextAlign::End,
        }
    }
}

/// Whether `position` is in world units (moves with the camera) or screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSpace {
    World,
    Screen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub content: String,
    pub position: Vec2,
    pub font_size: f32,
    pub align: TextAlign,
    pub space: LabelSpace,
    pub color: [u8; 3],
}

impl TextLabel {
    pub fn world(content: impl Into<String>, position: Vec2, font_size: f32, align: TextAlign) -> Self {
        Self { content: content.into(), position, font_size, align, space: LabelSpace::World, color: [226, 232, 240] }
    }

    pub fn screen(content: impl Into<String>, position: Vec2, font_size: f32) -> Self {
        Self {
            content: content.into(),
            position,
            font_size,
            align: TextAlign::Start,
            space: LabelSpace::Screen,
            color: [226, 232, 240],
        }
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    /// Left edge of a line `width` pixels wide anchored at screen x `anchor_x`.
    pub fn left_edge(&self, anchor_x: f32, width: f32) -> f32 {
        match self.align {
            TextAlign::Start => anchor_x,
            TextAlign::Middle => anchor_x - width / 2.0,
            TextAlign::End => anchor_x - width,
        }
    }

    /// Top edge for a baseline at screen y `baseline_y`, approximating the ascent from the font size.
    pub fn top_edge(&self, baseline_y: f32) -> f32 {
        baseline_y - self.font_size * 0.8
    }
}
