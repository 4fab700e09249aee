// src/camera.rs
// 画布放大、移动. World space is the layout space of the views: pixels, y axis pointing down.
use glam::{Mat4, Vec2, Vec3, Vec4};
use glam::Vec4Swizzles;
use bytemuck::{Pod, Zeroable};

// 将发送到 GPU 的相机 Uniform 数据结构
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub needs_srgb_output_conversion: u32, // 0 for false, 1 for true
    pub _padding: [u32; 3], // 填充到 16 字节边界，使 CameraUniform 总大小为 80 字节
}

#[derive(Debug)]
pub struct Camera {
    pub position: Vec2,      // 视口中心对应的世界坐标
    pub zoom: f32,           // 每个世界单位对应的屏幕像素数
    pub viewport_size: Vec2, // 视口的像素尺寸

    is_panning: bool,
    last_mouse_pos_screen: Option<Vec2>,
}

impl Camera {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport_size: Vec2::new(viewport_width as f32, viewport_height as f32),
            is_panning: false,
            last_mouse_pos_screen: None,
        }
    }

    /// 在窗口大小改变时调用
    pub fn update_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport_size = Vec2::new(width as f32, height as f32);
        }
    }

    /// Centres `min..max` in the viewport with `margin` pixels to spare on each side.
    pub fn fit(&mut self, min: Vec2, max: Vec2, margin: f32) {
        let size = (max - min).max(Vec2::splat(1.0));
        let available = (self.viewport_size - Vec2::splat(2.0 * margin)).max(Vec2::splat(1.0));
        self.zoom = (available.x / size.x).min(available.y / size.y).clamp(0.05, 20.0);
        self.position = (min + max) * 0.5;
    }

    /// 将屏幕坐标 (像素，左上角为原点) 转换为世界坐标
    pub fn screen_to_world(&self, screen_coords: Vec2) -> Vec2 {
        if self.viewport_size.x == 0.0 || self.viewport_size.y == 0.0 {
            return Vec2::ZERO;
        }

        let ndc_x = (screen_coords.x / self.viewport_size.x) * 2.0 - 1.0;
        let ndc_y = 1.0 - (screen_coords.y / self.viewport_size.y) * 2.0;

        let view_proj_inv = self.build_view_projection_matrix().inverse();
        let world_coords_vec4 = view_proj_inv * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);

        world_coords_vec4.xy() / world_coords_vec4.w
    }

    /// 将世界坐标点转换为屏幕像素坐标, 原点在左上角
    pub fn world_to_screen(&self, world_coords: Vec2) -> Vec2 {
        if self.viewport_size.x == 0.0 || self.viewport_size.y == 0.0 {
            return Vec2::ZERO;
        }
        let clip_pos_vec4 = self.build_view_projection_matrix() * Vec4::new(world_coords.x, world_coords.y, 0.0, 1.0);
        let ndc_pos = clip_pos_vec4.xy() / clip_pos_vec4.w;
        let screen_x = (ndc_pos.x * 0.5 + 0.5) * self.viewport_size.x;
        let screen_y = (1.0 - (ndc_pos.y * 0.5 + 0.5)) * self.viewport_size.y;
        Vec2::new(screen_x, screen_y)
    }

    pub fn start_panning(&mut self, screen_pos: Vec2) {
        self.is_panning = true;
        self.last_mouse_pos_screen = Some(screen_pos);
    }

    pub fn pan(&mut self, current_screen_pos: Vec2) {
        if self.is_panning {
            if let Some(last_pos) = self.last_mouse_pos_screen {
                // 世界与屏幕的 y 轴同向, 两个方向都直接按缩放换算
                let screen_delta = current_screen_pos - last_pos;
                self.position -= screen_delta / self.zoom;
            }
            self.last_mouse_pos_screen = Some(current_screen_pos);
        }
    }

    pub fn end_panning(&mut self) {
        self.is_panning = false;
        self.last_mouse_pos_screen = None;
    }

    /// 根据一个因子进行缩放，并保持 `world_focus` 点在屏幕上不动
    pub fn zoom_by(&mut self, factor: f32, world_focus: Vec2) {
        let old_zoom = self.zoom;
        self.zoom = (self.zoom * factor).clamp(0.05, 20.0);

        let offset = self.position - world_focus;
        self.position = world_focus + offset / (self.zoom / old_zoom);
    }

    /// 构建视图投影矩阵
    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let half_world_width = self.viewport_size.x * 0.5 / self.zoom;
        let half_world_height = self.viewport_size.y * 0.5 / self.zoom;

        // bottom/top are swapped so world y grows downwards on screen
        let proj_matrix = Mat4::orthographic_rh(
            -half_world_width,
            half_world_width,
            half_world_height,
            -half_world_height,
            -100.0,
            100.0,
        );

        let view_matrix = Mat4::from_translation(Vec3::new(-self.position.x, -self.position.y, 0.0));

        proj_matrix * view_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn centre_of_view_maps_to_centre_of_screen() {
        let mut camera = Camera::new(800, 600);
        camera.position = Vec2::new(400.0, 275.0);
        assert!(approx(camera.world_to_screen(Vec2::new(400.0, 275.0)), Vec2::new(400.0, 300.0)));
        // y grows downwards in both spaces
        assert!(approx(camera.world_to_screen(Vec2::new(400.0, 285.0)), Vec2::new(400.0, 310.0)));
    }

    #[test]
    fn screen_world_round_trip() {
        let mut camera = Camera::new(1024, 768);
        camera.position = Vec2::new(230.0, 230.0);
        camera.zoom = 1.5;
        let world = Vec2::new(100.0, 400.0);
        assert!(approx(camera.screen_to_world(camera.world_to_screen(world)), world));
    }

    #[test]
    fn fit_scales_to_smaller_axis() {
        let mut camera = Camera::new(1000, 600);
        camera.fit(Vec2::ZERO, Vec2::new(460.0, 460.0), 40.0);
        assert!((camera.zoom - 520.0 / 460.0).abs() < 1e-4);
        assert!(approx(camera.position, Vec2::new(230.0, 230.0)));
    }

    #[test]
    fn zoom_keeps_focus_fixed() {
        let mut camera = Camera::new(800, 600);
        let focus = Vec2::new(120.0, -40.0);
        let before = camera.world_to_screen(focus);
        camera.zoom_by(1.1, focus);
        assert!(approx(camera.world_to_screen(focus), before));
    }

    #[test]
    fn dragging_moves_world_with_cursor() {
        let mut camera = Camera::new(800, 600);
        let grabbed = camera.screen_to_world(Vec2::new(100.0, 100.0));
        camera.start_panning(Vec2::new(100.0, 100.0));
        camera.pan(Vec2::new(150.0, 80.0));
        camera.end_panning();
        assert!(approx(camera.world_to_screen(grabbed), Vec2::new(150.0, 80.0)));
    }
}
