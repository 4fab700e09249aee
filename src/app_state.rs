use std::sync::Arc;
use winit::window::Window;
use instant::Instant;
use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::camera::{Camera, CameraUniform};
use crate::color::Color;
use crate::draw_list::{self, DrawList};
use crate::models::{Vertex2D, CircleInstance, ShapeVertex};
use crate::scene::{Scene, ViewKind};
use crate::scene::text_label::{LabelSpace, TextLabel};


const SHAPES_WGSL: &str = include_str!("./shaders/shapes.wgsl");
const CIRCLES_WGSL: &str = include_str!("./shaders/circles.wgsl");
const VIEW_MARGIN: f32 = 48.0;

pub struct State {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub is_surface_configured: bool,

    // Glyphon related fields
    pub glyphon_font_system: glyphon::FontSystem,
    pub glyphon_viewport: glyphon::Viewport,
    pub glyphon_swash_cache: glyphon::SwashCache,
    pub glyphon_atlas: glyphon::TextAtlas,
    pub glyphon_renderer: glyphon::TextRenderer,
    pub glyphon_buffers: Vec<glyphon::Buffer>,

    pub camera: Camera,
    pub camera_buffer: wgpu::Buffer,
    pub camera_bind_group: wgpu::BindGroup,
    pub camera_uniform: CameraUniform,
    pub camera_needs_update: bool,

    pub line_render_pipeline: wgpu::RenderPipeline,
    pub fill_render_pipeline: wgpu::RenderPipeline,
    pub circle_render_pipeline: wgpu::RenderPipeline,

    pub draw_list: DrawList,
    pub circle_instance_buffer: wgpu::Buffer,
    pub quad_vertex_buffer: wgpu::Buffer,
    pub quad_index_buffer: wgpu::Buffer,
    pub line_vertex_buffer: wgpu::Buffer,
    pub fill_vertex_buffer: wgpu::Buffer,
    pub scene_dirty: bool,

    pub scene: Scene,

    pub mouse_current_pos_screen: Vec2,
    pub mouse_press_pos_screen: Option<Vec2>,
    pub is_mouse_left_pressed: bool,

    pub last_frame_instant: instant::Instant,
    pub frame_count_in_second: u32,
    pub current_fps: u32,
}

fn vertex_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, contents: &[T]) -> wgpu::Buffer {
    // wgpu rejects zero-sized vertex buffers, keep at least one element around
    let bytes: &[u8] = bytemuck::cast_slice(contents);
    let min = [0u8; 64];
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: if bytes.is_empty() { &min } else { bytes },
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

fn shape_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[ShapeVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

impl State {
    // Takes Arc<Window> for surface setup, doesn't store it.
    pub async fn new(window_arc: Arc<Window>) -> anyhow::Result<State> {
        let size = window_arc.inner_size();

        let gpu = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        // Surface itself is !Send on WASM due to HtmlCanvasElement
        let surface = gpu
            .create_surface(window_arc)
            .map_err(|e| anyhow::anyhow!("failed to create surface: {e}"))?;

        let adapter = gpu
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow::anyhow!("no suitable GPU adapter: {e}"))?;
        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| anyhow::anyhow!("failed to request GPU device: {e}"))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            anyhow::bail!("surface reports no supported formats");
        };
        let texture_format = surface_caps.formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or_else(|| {
                log::warn!("No sRGB surface format found, falling back to {:?}", first_format);
                first_format
            });

        // 确定是否需要着色器进行 sRGB 输出转换
        let needs_shader_srgb_output_conversion = !texture_format.is_srgb();

        log::info!(
            "Using {} ({:?}, Target Format: {:?}), Needs Shader sRGB Output Conversion: {}",
            adapter_info.name,
            adapter_info.backend,
            texture_format,
            needs_shader_srgb_output_conversion
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: texture_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // --- Glyphon Initialization ---
        let glyphon_font_system = glyphon::FontSystem::new();
        let glyphon_swash_cache = glyphon::SwashCache::new();
        let glyphon_cache = glyphon::Cache::new(&device);
        let glyphon_viewport = glyphon::Viewport::new(&device, &glyphon_cache);
        let mut glyphon_atlas = glyphon::TextAtlas::new(&device, &queue, &glyphon_cache, texture_format);
        let glyphon_renderer = glyphon::TextRenderer::new(&mut glyphon_atlas, &device, wgpu::MultisampleState::default(), None);

        let camera = Camera::new(size.width, size.height);
        let camera_uniform = CameraUniform {
            view_proj: camera.build_view_projection_matrix().to_cols_array_2d(),
            needs_srgb_output_conversion: needs_shader_srgb_output_conversion as u32,
            _padding: [0; 3],
        };

        let camera_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }
        );

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }
            ],
            label: Some("Camera Bind Group Layout"),
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }
            ],
            label: Some("Camera Bind Group"),
        });

        // --- 着色器模块 ---
        let shapes_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shapes Shader"),
            source: wgpu::ShaderSource::Wgsl(SHAPES_WGSL.into()),
        });

        let circles_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Circles Shader"),
            source: wgpu::ShaderSource::Wgsl(CIRCLES_WGSL.into()),
        });

        // --- 渲染管线布局 ---
        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let line_render_pipeline = shape_pipeline(
            &device,
            "Line Render Pipeline",
            &render_pipeline_layout,
            &shapes_shader_module,
            texture_format,
            wgpu::PrimitiveTopology::LineList,
        );
        let fill_render_pipeline = shape_pipeline(
            &device,
            "Fill Render Pipeline",
            &render_pipeline_layout,
            &shapes_shader_module,
            texture_format,
            wgpu::PrimitiveTopology::TriangleList,
        );

        // --- 圆形渲染管线 ---
        let circle_render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Circle Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &circles_shader_module,
                entry_point: Some("vs_main"),
                buffers: &[
                    Vertex2D::layout(),
                    CircleInstance::layout(),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &circles_shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // the y-down projection flips winding
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let scene = Scene::default();
        let draw_list = draw_list::skill_tree_draw_list(&scene.skill_graph);

        let circle_instance_buffer = vertex_buffer(&device, "Circle Instance Buffer", &draw_list.circles);
        let line_vertex_buffer = vertex_buffer(&device, "Line Vertex Buffer", &draw_list.lines);
        let fill_vertex_buffer = vertex_buffer(&device, "Fill Vertex Buffer", &draw_list.fills);

        let quad_vertex_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Quad Vertex Buffer"),
                contents: bytemuck::cast_slice(Vertex2D::QUAD_VERTICES.as_slice()),
                usage: wgpu::BufferUsages::VERTEX,
            }
        );

        let quad_index_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Quad Index Buffer"),
                contents: bytemuck::cast_slice(Vertex2D::QUAD_INDICES.as_slice()),
                usage: wgpu::BufferUsages::INDEX,
            }
        );

        let mut state = Self {
            surface, device, queue, config, is_surface_configured: false,
            glyphon_font_system, glyphon_swash_cache, glyphon_viewport,
            glyphon_atlas, glyphon_renderer, glyphon_buffers: Vec::new(),
            camera, camera_buffer, camera_bind_group, camera_uniform, camera_needs_update: true,
            line_render_pipeline, fill_render_pipeline, circle_render_pipeline,
            draw_list, circle_instance_buffer, quad_vertex_buffer, quad_index_buffer,
            line_vertex_buffer, fill_vertex_buffer, scene_dirty: false,
            scene,
            mouse_current_pos_screen: Vec2::ZERO, mouse_press_pos_screen: None, is_mouse_left_pressed: false,
            last_frame_instant: Instant::now(), frame_count_in_second: 0, current_fps: 0,
        };
        state.fit_camera_to_view();
        Ok(state)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            log::info!("Resize {}, {}", width, height);
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);

            self.camera.update_viewport(width, height);
            if !self.is_surface_configured {
                self.fit_camera_to_view();
            }
            self.camera_needs_update = true;
            self.is_surface_configured = true;
        }
    }

    pub fn fit_camera_to_view(&mut self) {
        let (min, max) = match self.scene.active_view {
            ViewKind::SkillTree => draw_list::SKILL_TREE_BOUNDS,
            ViewKind::Radar => draw_list::RADAR_BOUNDS,
        };
        self.camera.fit(min, max, VIEW_MARGIN);
        self.camera_needs_update = true;
    }

    pub fn show_view(&mut self, view: ViewKind) {
        if self.scene.show_view(view) {
            self.fit_camera_to_view();
            self.scene_dirty = true;
        }
    }

    pub fn skill_at_screen(&self, screen_pos: Vec2) -> Option<String> {
        self.scene
            .skill_at(self.camera.screen_to_world(screen_pos))
            .map(str::to_owned)
    }

    pub fn update_hover(&mut self) {
        if self.scene.active_view != ViewKind::SkillTree {
            return;
        }
        let hovered = self.skill_at_screen(self.mouse_current_pos_screen);
        if hovered != self.scene.hovered_skill {
            self.scene.hovered_skill = hovered;
            self.scene_dirty = true;
        }
    }

    /// Left click without dragging: masters the skill under the cursor.
    pub fn click(&mut self, screen_pos: Vec2) {
        if self.scene.active_view != ViewKind::SkillTree {
            return;
        }
        if let Some(id) = self.skill_at_screen(screen_pos) {
            if self.scene.skill_graph.master_skill(&id) {
                self.scene_dirty = true;
            } else {
                log::debug!("`{}` is {}, click ignored.", id, self.scene.skill_graph.status(&id).as_str());
            }
        }
    }

    /// Advances animations and uploads changed data. Returns whether another
    /// frame should be requested.
    pub fn update(&mut self) -> bool {
        let animating = self.scene.tick();
        if animating {
            self.scene_dirty = true;
        }

        if self.scene_dirty {
            self.draw_list = match self.scene.active_view {
                ViewKind::SkillTree => draw_list::skill_tree_draw_list(&self.scene.skill_graph),
                ViewKind::Radar => draw_list::radar_draw_list(&self.scene.radar),
            };
            self.update_gpu_buffers();
            self.scene_dirty = false;
        }

        if self.camera_needs_update {
            self.camera_uniform.view_proj = self.camera.build_view_projection_matrix().to_cols_array_2d();
            self.queue.write_buffer(
                &self.camera_buffer,
                0,
                bytemuck::cast_slice(&[self.camera_uniform]),
            );
            self.camera_needs_update = false;
        }
        animating
    }

    fn update_gpu_buffers(&mut self) {
        fn upload<T: bytemuck::Pod>(device: &wgpu::Device, queue: &wgpu::Queue, buffer: &mut wgpu::Buffer, label: &str, data: &[T]) {
            let bytes: &[u8] = bytemuck::cast_slice(data);
            if bytes.is_empty() {
                return;
            }
            if buffer.size() < bytes.len() as u64 {
                *buffer = vertex_buffer(device, label, data);
            } else {
                queue.write_buffer(buffer, 0, bytes);
            }
        }

        upload(&self.device, &self.queue, &mut self.circle_instance_buffer, "Circle Instance Buffer (Resized)", &self.draw_list.circles);
        upload(&self.device, &self.queue, &mut self.line_vertex_buffer, "Line Vertex Buffer (Resized)", &self.draw_list.lines);
        upload(&self.device, &self.queue, &mut self.fill_vertex_buffer, "Fill Vertex Buffer (Resized)", &self.draw_list.fills);
    }

    fn screen_labels(&self) -> Vec<TextLabel> {
        let viewport = self.camera.viewport_size;
        let mut labels: Vec<TextLabel> = self.draw_list.labels.clone();
        match self.scene.active_view {
            ViewKind::SkillTree => labels.extend(draw_list::skill_tree_hud(
                &self.scene.skill_graph,
                self.scene.hovered_skill.as_deref(),
                viewport,
            )),
            ViewKind::Radar => labels.extend(draw_list::radar_hud(&self.scene.job_search, viewport)),
        }
        labels
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        let width = self.config.width;
        let height = self.config.height;
        self.glyphon_viewport.update(&self.queue, glyphon::Resolution { width, height });

        // --- FPS Calculation ---
        self.frame_count_in_second += 1;
        let now = Instant::now();
        let elapsed = (now - self.last_frame_instant).as_secs_f32();
        if elapsed >= 1.0 {
            self.current_fps = self.frame_count_in_second;
            self.frame_count_in_second = 0;
            self.last_frame_instant = now;
        }

        // --- Prepare Glyphon Text Areas ---
        let labels = self.screen_labels();
        while self.glyphon_buffers.len() < labels.len() {
            self.glyphon_buffers.push(glyphon::Buffer::new(&mut self.glyphon_font_system, glyphon::Metrics::new(14.0, 18.0)));
        }

        let mut placements = Vec::with_capacity(labels.len());
        for (label, glyphon_buffer) in labels.iter().zip(self.glyphon_buffers.iter_mut()) {
            let (anchor, scale) = match label.space {
                LabelSpace::World => (self.camera.world_to_screen(label.position), self.camera.zoom),
                LabelSpace::Screen => (label.position, 1.0),
            };
            let font_size = (label.font_size * scale).max(1.0);

            glyphon_buffer.set_metrics(&mut self.glyphon_font_system, glyphon::Metrics::new(font_size, font_size * 1.25));
            glyphon_buffer.set_size(&mut self.glyphon_font_system, Some(width as f32), Some(font_size * 2.0));
            glyphon_buffer.set_text(
                &mut self.glyphon_font_system,
                &label.content,
                &glyphon::Attrs::new().family(glyphon::Family::SansSerif),
                glyphon::Shaping::Advanced,
            );
            glyphon_buffer.shape_until_scroll(&mut self.glyphon_font_system, false);

            let line_width = glyphon_buffer.layout_runs().map(|run| run.line_w).fold(0.0, f32::max);
            let scaled = TextLabel { font_size, ..label.clone() };
            placements.push((scaled.left_edge(anchor.x, line_width), scaled.top_edge(anchor.y), label.color));
        }

        let text_areas = self
            .glyphon_buffers
            .iter()
            .zip(placements.iter())
            .map(|(buffer, &(left, top, [r, g, b]))| glyphon::TextArea {
                buffer,
                left,
                top,
                scale: 1.0,
                bounds: glyphon::TextBounds::default(),
                default_color: Color::from((r, g, b)).into_glyphon(),
                custom_glyphs: &[],
            });

        if let Err(e) = self.glyphon_renderer.prepare(
            &self.device,
            &self.queue,
            &mut self.glyphon_font_system,
            &mut self.glyphon_atlas,
            &self.glyphon_viewport,
            text_areas,
            &mut self.glyphon_swash_cache,
        ) {
            log::error!("Failed to prepare text: {:?}", e);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let clear = match self.scene.active_view {
            ViewKind::SkillTree => Color::from((15, 23, 42)),
            ViewKind::Radar => Color::from((30, 41, 59)),
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.into_linear_wgpu_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            if !self.draw_list.lines.is_empty() {
                render_pass.set_pipeline(&self.line_render_pipeline);
                render_pass.set_vertex_buffer(0, self.line_vertex_buffer.slice(..));
                render_pass.draw(0..self.draw_list.lines.len() as u32, 0..1);
            }

            if !self.draw_list.fills.is_empty() {
                render_pass.set_pipeline(&self.fill_render_pipeline);
                render_pass.set_vertex_buffer(0, self.fill_vertex_buffer.slice(..));
                render_pass.draw(0..self.draw_list.fills.len() as u32, 0..1);
            }

            if !self.draw_list.circles.is_empty() {
                render_pass.set_pipeline(&self.circle_render_pipeline);
                render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.circle_instance_buffer.slice(..));
                render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(
                    0..Vertex2D::QUAD_INDICES.len() as u32,
                    0,
                    0..self.draw_list.circles.len() as u32,
                );
            }

            // --- Draw Glyphon Text ---
            if let Err(e) = self.glyphon_renderer.render(&self.glyphon_atlas, &self.glyphon_viewport, &mut render_pass) {
                log::error!("Failed to render text: {:?}", e);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.glyphon_atlas.trim();

        Ok(())
    }
}
