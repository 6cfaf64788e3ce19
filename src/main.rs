//! Birthday Quest entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use birthday_quest::audio::AudioManager;
    use birthday_quest::renderer::RenderState;
    use birthday_quest::sim::clock::{LoopSlot, LoopToken};
    use birthday_quest::sim::input::{InputState, Key};
    use birthday_quest::sim::state::GameEvent;
    use birthday_quest::{Hub, LevelId, Progress, Screen, Settings, Tuning};

    /// Everything the page keeps alive between frames
    struct Game {
        hub: Hub,
        settings: Settings,
        audio: AudioManager,
        render_state: Option<RenderState>,
        input: InputState,
        frame_loop: LoopSlot,
        /// CSS pixels to viewport pixels
        pointer_scale: Vec2,
        shown_screen: Option<Screen>,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let audio = AudioManager::new(settings.effective_volume());
            Self {
                hub: Hub::new(Tuning::default(), Progress::load(), seed),
                settings,
                audio,
                render_state: None,
                input: InputState::new(),
                frame_loop: LoopSlot::new(),
                pointer_scale: Vec2::ONE,
                shown_screen: None,
            }
        }

        fn set_canvas_size(&mut self, client_w: f32, client_h: f32) {
            let viewport = self.hub.tuning().engine.viewport();
            self.pointer_scale = viewport / Vec2::new(client_w.max(1.0), client_h.max(1.0));
        }

        fn pointer_pos(&self, event: &MouseEvent) -> Vec2 {
            Vec2::new(event.offset_x() as f32, event.offset_y() as f32) * self.pointer_scale
        }

        /// Run one simulation tick and forward cues to the speakers
        fn update(&mut self, time: f64) {
            let events = self.hub.frame(time / 1000.0, &self.input);
            self.hub.apply_shortcuts(&self.input);
            self.input.clear_edges();
            for event in events {
                if let GameEvent::Sound(cue) = event {
                    self.audio.play(cue);
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            let Some(session) = self.hub.session() else {
                return;
            };
            let scene = session.scene();
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&scene, &self.settings) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let Some(session) = self.hub.session() else {
                return;
            };
            let hud = session.scene().hud;
            set_text(document, "hud-lives", &self.hub.lives().to_string());
            set_text(document, "hud-score", &format!("{:.1} / {}", hud.score, hud.target));
            set_text(document, "hud-caption", &hud.caption);
            let time = hud.time_left.map(|t| format!("{:.0}s", t.max(0.0).ceil()));
            set_text(document, "hud-time", time.as_deref().unwrap_or(""));
        }

        /// Show the overlay matching the hub screen after it changes
        fn sync_screen(&mut self, document: &Document) {
            let screen = self.hub.screen();
            if self.shown_screen == Some(screen) {
                return;
            }
            self.shown_screen = Some(screen);
            set_visible(document, "hub", screen == Screen::Hub);
            set_visible(document, "hud", matches!(screen, Screen::Level(_)));
            set_visible(document, "reward", screen == Screen::Reward);

            match screen {
                Screen::Hub => {
                    let progress = self.hub.progress();
                    for id in LevelId::ALL {
                        let btn = format!("level-btn-{}", id.number());
                        set_visible(document, &btn, progress.is_available(id));
                    }
                    set_text(document, "hub-progress", &format!("{}%", progress.percentage()));
                }
                Screen::Reward => {
                    if let Some(reward) = self.hub.current_reward() {
                        set_text(document, "reward-title", &reward.title);
                        set_text(document, "reward-content", &reward.content);
                    }
                }
                Screen::Level(_) => {}
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let class = if visible { "" } else { "hidden" };
            let _ = el.set_attribute("class", class);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialised".into());
        }

        log::info!("Birthday Quest starting...");

        let Some(window) = web_sys::window() else {
            log::error!("no window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("no document");
            return;
        };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("no canvas element");
            return;
        };

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        game.borrow_mut()
            .set_canvas_size(client_w as f32, client_h as f32);
        log::info!("Game initialized with seed: {}", seed);

        // Rendering is best effort: the DOM HUD still works without a GPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        match RenderState::new(surface, &adapter, width, height).await {
                            Ok(state) => game.borrow_mut().render_state = Some(state),
                            Err(e) => log::warn!("Failed to create device: {}", e),
                        }
                    }
                    Err(e) => log::warn!("Failed to get adapter: {}", e),
                }
            }
            Err(e) => log::warn!("Failed to create surface: {}", e),
        }

        game.borrow_mut().sync_screen(&document);

        setup_input_handlers(&canvas, game.clone());
        setup_menu_buttons(&document, game.clone());
        setup_auto_pause(&document, game);

        log::info!("Birthday Quest running!");
    }

    /// Start (or restart) the frame loop for the running level. Any previous
    /// loop's token stops being current, so at most one loop ticks.
    fn start_loop(game: Rc<RefCell<Game>>) {
        let token = {
            let mut g = game.borrow_mut();
            let token = g.frame_loop.start();
            let now = web_sys::window()
                .and_then(|w| w.performance())
                .map(|p| p.now() / 1000.0)
                .unwrap_or(0.0);
            if let Some(session) = g.hub.session_mut() {
                session.start_clock(now);
            }
            token
        };
        request_animation_frame(game, token);
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, token: LoopToken) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, token, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, token: LoopToken, time: f64) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        {
            let mut g = game.borrow_mut();
            if !g.frame_loop.is_current(token) {
                return;
            }

            g.update(time);
            g.render();
            g.update_hud(&document);
            g.sync_screen(&document);

            if !matches!(g.hub.screen(), Screen::Level(_)) {
                g.frame_loop.cancel();
                g.input.reset();
                return;
            }
        }

        request_animation_frame(game, token);
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let Some(key) = Key::from_code(&event.code()) else {
                    return;
                };
                if matches!(key, Key::Space | Key::ArrowUp | Key::ArrowDown) {
                    event.prevent_default();
                }
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.input.key_down(key);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = Key::from_code(&event.code()) {
                    game.borrow_mut().input.key_up(key);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer (puzzle drag)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let pos = g.pointer_pos(&event);
                g.audio.resume();
                g.input.pointer_press(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let pos = g.pointer_pos(&event);
                g.input.pointer_move(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let pos = g.pointer_pos(&event);
                g.input.pointer_release(pos);
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(MouseEvent) + 'static) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(MouseEvent)>::new(handler);
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_menu_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for id in LevelId::ALL {
            let game = game.clone();
            on_click(document, &format!("level-btn-{}", id.number()), move |_| {
                let started = game.borrow_mut().hub.start_level(id);
                match started {
                    Ok(()) => start_loop(game.clone()),
                    Err(e) => log::warn!("{}", e),
                }
            });
        }

        {
            let game = game.clone();
            on_click(document, "close-reward-btn", move |_| {
                let mut g = game.borrow_mut();
                g.hub.close_reward();
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    g.sync_screen(&document);
                }
            });
        }
        {
            let game = game.clone();
            on_click(document, "reset-btn", move |_| {
                let mut g = game.borrow_mut();
                g.frame_loop.cancel();
                g.hub.reset_game();
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    g.sync_screen(&document);
                }
            });
        }
        on_click(document, "mute-btn", move |_| {
            let mut g = game.borrow_mut();
            g.settings.toggle_mute();
            g.settings.save();
            let volume = g.settings.effective_volume();
            g.audio.set_volume(volume);
            log::info!("Muted: {}", g.settings.muted);
        });
    }

    /// Stop ticking while the tab is hidden and resume with a fresh clock
    fn setup_auto_pause(document: &Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
            let in_level = matches!(game.borrow().hub.screen(), Screen::Level(_));
            if hidden {
                let mut g = game.borrow_mut();
                g.frame_loop.cancel();
                g.input.reset();
                log::info!("Paused (tab hidden)");
            } else if in_level {
                log::info!("Resumed");
                start_loop(game.clone());
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Birthday Quest (native) starting...");
    log::info!("Native mode runs a headless demo - use `trunk serve` for the web version");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| birthday_quest::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning file {}: {}", path, e);
                birthday_quest::Tuning::default()
            }
        },
        None => birthday_quest::Tuning::default(),
    };

    demo::run(tuning);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run of the first level with a scripted player
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use birthday_quest::sim::input::{InputState, Key};
    use birthday_quest::sim::state::GameEvent;
    use birthday_quest::{Hub, LevelId, Progress, Screen, Tuning};

    const DT: f32 = 1.0 / 60.0;
    const MAX_SECONDS: f32 = 120.0;

    pub fn run(tuning: Tuning) {
        let mut hub = Hub::new(tuning, Progress::load(), 42);
        if let Err(e) = hub.start_level(LevelId::Platformer) {
            log::error!("{}", e);
            return;
        }

        let mut input = InputState::new();
        input.key_down(Key::ArrowRight);
        let mut elapsed = 0.0;
        let mut sounds = 0usize;
        while elapsed < MAX_SECONDS && matches!(hub.screen(), Screen::Level(_)) {
            // Hop every half second
            if (elapsed % 0.5) < DT {
                input.key_down(Key::Space);
            } else {
                input.key_up(Key::Space);
            }
            for event in hub.step(DT, &input) {
                match event {
                    GameEvent::Sound(_) => sounds += 1,
                    GameEvent::LifeLost { lives_left } => log::info!("ouch, {} lives left", lives_left),
                    GameEvent::GameOver => log::info!("game over at {:.1}s", elapsed),
                    _ => {}
                }
            }
            input.clear_edges();
            elapsed += DT;

            let game_over = hub
                .session()
                .is_some_and(|s| s.is_settled());
            if game_over {
                break;
            }
        }

        if let Some(session) = hub.session() {
            let hud = session.scene().hud;
            log::info!(
                "demo ended after {:.1}s: {} of {} hearts, {} lives, {} sound cues",
                elapsed,
                hud.score,
                hud.target,
                hub.lives(),
                sounds
            );
        } else {
            log::info!(
                "demo ended after {:.1}s on {:?}, progress {}%",
                elapsed,
                hub.screen(),
                hub.progress().percentage()
            );
        }
    }
}
