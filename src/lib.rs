use std::sync::{Arc, Mutex};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};
use glam::Vec2;

#[cfg(target_arch = "wasm32")]
use winit::event_loop::EventLoopProxy;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use once_cell::sync::OnceCell;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::future_to_promise;
#[cfg(target_arch = "wasm32")]
use js_sys::Promise;

pub mod models;
mod camera;
mod app_state;
pub mod animation;
pub mod color;
pub mod draw_list;
pub mod scene;
pub mod ui_events;

use ui_events::UserCommand;
use app_state::State;
use scene::ViewKind;
#[cfg(target_arch = "wasm32")]
use scene::skill_catalog::SkillCatalog;

/// Cursor travel, in pixels, below which a press and release counts as a click.
const CLICK_SLOP: f32 = 4.0;
const SALARY_KEY_STEP: u32 = 10_000;

#[cfg(target_arch = "wasm32")]
static WASM_API_INSTANCE: OnceCell<WasmApi> = OnceCell::new();

#[cfg(target_arch = "wasm32")]
static WASM_READY_FLUME_CHANNEL: OnceCell<(flume::Sender<()>, flume::Receiver<()>)> = OnceCell::new();


struct App {
    window: Option<Arc<Window>>,
    state: Arc<Mutex<Option<State>>>, // filled asynchronously on wasm32
    #[cfg(target_arch = "wasm32")]
    proxy: Option<EventLoopProxy<UserCommand>>,
}

impl App {
    fn new(#[cfg(target_arch = "wasm32")] event_loop: &EventLoop<UserCommand>) -> Self {
        #[cfg(target_arch = "wasm32")]
        let app_proxy = event_loop.create_proxy();

        #[cfg(target_arch = "wasm32")]
        {
            let wasm_api_instance = WasmApi { proxy: app_proxy.clone() };
            if WASM_API_INSTANCE.set(wasm_api_instance).is_err() {
                log::warn!("WASM_API_INSTANCE was already set. This should only happen once.");
            }
        }

        Self {
            window: None,
            state: Arc::new(Mutex::new(None)),
            #[cfg(target_arch = "wasm32")]
            proxy: Some(app_proxy),
        }
    }
}

impl ApplicationHandler<UserCommand> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("Constellation Skill Tree");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let current_size = window.inner_size();
            match pollster::block_on(State::new(window.clone())) {
                Ok(mut state) => {
                    state.resize(current_size.width, current_size.height);
                    if let Ok(mut guard) = self.state.lock() {
                        guard.replace(state);
                    }
                    log::info!("State created.");
                    window.request_redraw();
                }
                Err(e) => {
                    log::error!("Failed to create State: {e:?}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let state_arc_for_spawn = self.state.clone();
            let window_for_state_new = window.clone();
            let Some(proxy_for_init_notification) = self.proxy.clone() else {
                log::error!("App proxy not set, cannot notify initialisation.");
                return;
            };

            wasm_bindgen_futures::spawn_local(async move {
                match State::new(window_for_state_new.clone()).await {
                    Ok(mut state_instance) => {
                        log::info!("WASM State created in async task.");
                        let initial_size = window_for_state_new.inner_size();
                        state_instance.resize(initial_size.width, initial_size.height);

                        if let Ok(mut app_state_guard) = state_arc_for_spawn.lock() {
                            app_state_guard.replace(state_instance);
                        }
                        log::info!("WASM State assigned to App. Sending initialization notification.");
                        if proxy_for_init_notification.send_event(UserCommand::StateInitialized).is_err() {
                            log::error!("Failed to send StateInitialized event.");
                        }
                    },
                    Err(e) => log::error!("Failed to create State in WASM: {:?}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserCommand) {
        match event {
            UserCommand::StateInitialized => {
                log::info!("WASM State initialized and ready.");
                #[cfg(target_arch = "wasm32")]
                if let Some((sender, _)) = WASM_READY_FLUME_CHANNEL.get() {
                    if let Err(e) = sender.send(()) {
                        log::error!("Failed to send WASM ready signal: {:?}", e);
                    }
                }
                if let Some(w_handle) = self.window.as_ref() {
                    w_handle.request_redraw();
                }
            }
            _ => {
                let Ok(mut guard) = self.state.lock() else {
                    log::error!("State mutex poisoned, dropping {:?}", event);
                    return;
                };
                if let Some(state) = guard.as_mut() {
                    state.process_command(event);
                    if let Some(w_handle) = self.window.as_ref() {
                        w_handle.request_redraw();
                    }
                } else {
                    log::warn!("Received a command before state was initialized (via proxy). Ignoring: {:?}", event);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Ok(mut guard) = self.state.lock() else {
            log::error!("State mutex poisoned, exiting.");
            event_loop.exit();
            return;
        };
        let Some(state) = guard.as_mut() else {
            log::warn!("Window event received before State was initialized, ignoring.");
            return;
        };
        let Some(window_handle) = self.window.as_ref() else {
            return;
        };

        let mut needs_redraw = false;

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.resize(size.width, size.height);
                needs_redraw = true;
            }
            WindowEvent::RedrawRequested => {
                // the radar sweep keeps requesting frames while it runs
                if state.update() {
                    needs_redraw = true;
                }
                match state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => state.resize(state.config.width, state.config.height),
                    Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                    Err(e) => log::error!("{:?}", e),
                }
            }
            WindowEvent::MouseInput { state: mouse_button_state, button, .. } => {
                match (button, mouse_button_state.is_pressed()) {
                    (MouseButton::Left, true) => {
                        state.is_mouse_left_pressed = true;
                        state.mouse_press_pos_screen = Some(state.mouse_current_pos_screen);
                        state.camera.start_panning(state.mouse_current_pos_screen);
                    }
                    (MouseButton::Left, false) => {
                        state.is_mouse_left_pressed = false;
                        state.camera.end_panning();
                        if let Some(pressed_at) = state.mouse_press_pos_screen.take() {
                            if pressed_at.distance(state.mouse_current_pos_screen) < CLICK_SLOP {
                                state.click(state.mouse_current_pos_screen);
                                needs_redraw = true;
                            }
                        }
                    }
                    _ => {}
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                state.mouse_current_pos_screen = Vec2::new(position.x as f32, position.y as f32);
                if state.is_mouse_left_pressed {
                    state.camera.pan(state.mouse_current_pos_screen);
                    state.camera_needs_update = true;
                    needs_redraw = true;
                } else {
                    state.update_hover();
                    needs_redraw = state.scene_dirty;
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let y_scroll_delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y * 10.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };

                if y_scroll_delta != 0.0 {
                    let zoom_factor = if y_scroll_delta > 0.0 { 1.1 } else { 1.0 / 1.1 };
                    let mouse_world_pos = state.camera.screen_to_world(state.mouse_current_pos_screen);
                    state.camera.zoom_by(zoom_factor, mouse_world_pos);
                    state.camera_needs_update = true;
                    needs_redraw = true;
                }
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if key_state.is_pressed() && !repeat {
                    let mut changed = false;
                    let pan_speed = 10.0 / state.camera.zoom;
                    let zoom_factor = 1.1;
                    let screen_center = state.camera.viewport_size * 0.5;
                    let center_world = state.camera.screen_to_world(screen_center);

                    match code {
                        // world y points down
                        KeyCode::KeyW | KeyCode::ArrowUp => { state.camera.position.y -= pan_speed; changed = true; },
                        KeyCode::KeyS | KeyCode::ArrowDown => { state.camera.position.y += pan_speed; changed = true; },
                        KeyCode::KeyA | KeyCode::ArrowLeft => { state.camera.position.x -= pan_speed; changed = true; },
                        KeyCode::KeyD | KeyCode::ArrowRight => { state.camera.position.x += pan_speed; changed = true; },
                        KeyCode::KeyQ => { state.camera.zoom_by(zoom_factor, center_world); changed = true; },
                        KeyCode::KeyE => { state.camera.zoom_by(1.0 / zoom_factor, center_world); changed = true; },
                        KeyCode::KeyR => { log::info!("FPS: {}", state.current_fps) },
                        KeyCode::Digit1 => state.show_view(ViewKind::SkillTree),
                        KeyCode::Digit2 => state.show_view(ViewKind::Radar),
                        KeyCode::Tab => {
                            let next = state.scene.active_view.toggled();
                            state.show_view(next);
                        }
                        KeyCode::BracketLeft => {
                            let salary = state.scene.job_search.salary().saturating_sub(SALARY_KEY_STEP);
                            state.process_command(UserCommand::SetSalary(salary));
                        }
                        KeyCode::BracketRight => {
                            let salary = state.scene.job_search.salary() + SALARY_KEY_STEP;
                            state.process_command(UserCommand::SetSalary(salary));
                        }
                        _ => {}
                    }

                    if changed {
                        state.camera_needs_update = true;
                    }
                    needs_redraw = changed || state.scene_dirty || state.camera_needs_update;
                }
            },
            _ => {}
        }

        if needs_redraw {
            window_handle.request_redraw();
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            console_error_panic_hook::set_once();
            console_log::init_with_level(log::Level::Info)
                .map_err(|e| anyhow::anyhow!("failed to initialise console logger: {e}"))?;
            log::info!("Starting Constellation application.");
            let (sender, receiver) = flume::unbounded();
            if WASM_READY_FLUME_CHANNEL.set((sender, receiver)).is_err() {
                log::warn!("WASM ready channel was already initialised.");
            }
        } else {
            env_logger::init();
        }
    }

    let event_loop = EventLoop::with_user_event().build()?;
    let mut app = App::new(
        #[cfg(target_arch = "wasm32")]
        &event_loop,
    );
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run().map_err(|e| JsValue::from_str(&format!("{e:?}")))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
#[derive(Clone, Debug)]
pub struct WasmApi {
    proxy: EventLoopProxy<UserCommand>,
}

#[cfg(target_arch = "wasm32")]
impl WasmApi {
    fn send(&self, command: UserCommand) -> Result<(), JsValue> {
        self.proxy
            .send_event(command)
            .map_err(|_| JsValue::from_str("Failed to send command to event loop."))
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl WasmApi {
    #[wasm_bindgen(js_name = setSkillCatalog)]
    pub fn set_skill_catalog(&self, catalog_json: &str) -> Result<(), JsValue> {
        let catalog = SkillCatalog::from_json(catalog_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid skill catalog: {e:#}")))?;
        log::info!("Received SetSkillCatalog command from JS.");
        self.send(UserCommand::SetSkillCatalog(catalog))
    }

    #[wasm_bindgen(js_name = masterSkill)]
    pub fn master_skill(&self, id: &str) -> Result<(), JsValue> {
        self.send(UserCommand::MasterSkill(id.to_owned()))
    }

    #[wasm_bindgen(js_name = showView)]
    pub fn show_view(&self, name: &str) -> Result<(), JsValue> {
        let view = ViewKind::parse(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown view `{name}`, expected \"skills\" or \"radar\".")))?;
        self.send(UserCommand::ShowView(view))
    }

    #[wasm_bindgen(js_name = addSkill)]
    pub fn add_skill(&self, skill: &str) -> Result<(), JsValue> {
        self.send(UserCommand::AddSkill(skill.to_owned()))
    }

    #[wasm_bindgen(js_name = toggleFilter)]
    pub fn toggle_filter(&self, name: &str) -> Result<(), JsValue> {
        self.send(UserCommand::ToggleFilter(name.to_owned()))
    }

    #[wasm_bindgen(js_name = setSalary)]
    pub fn set_salary(&self, value: u32) -> Result<(), JsValue> {
        self.send(UserCommand::SetSalary(value))
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = getWasmApi)]
pub fn get_wasm_api() -> Result<WasmApi, JsValue> {
    WASM_API_INSTANCE.get()
        .cloned()
        .ok_or_else(|| JsValue::from_str("WasmApi is not initialized. Call run_web() first."))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = getWasmReadyPromise)]
pub fn get_wasm_ready_promise() -> Result<Promise, JsValue> {
    let (_, receiver) = WASM_READY_FLUME_CHANNEL.get()
        .ok_or_else(|| JsValue::from_str("WASM ready channel not initialized. Call run_web() first."))?;
    let receiver = receiver.clone();

    // 将 Rust Future 转换为 JS Promise
    let ready_promise = future_to_promise(async move {
        receiver
            .recv_async()
            .await
            .map_err(|e| JsValue::from_str(&format!("WASM ready channel closed: {e}")))?;
        Ok(JsValue::NULL)
    });

    Ok(ready_promise)
}
