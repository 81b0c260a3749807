//! Dot Galaxy entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent, WheelEvent};

    use dot_galaxy::Settings;
    use dot_galaxy::persistence::{FetchStore, fetch_galaxy};
    use dot_galaxy::platform::{now_seconds, session_seed};
    use dot_galaxy::renderer::HostFrame;
    use dot_galaxy::session::Session;
    use dot_galaxy::sim::{DotSeed, GalaxyState, InputEvent, Key, SessionEvent, key_for_code};
    use glam::{Vec2, Vec3};

    const GALAXY_URL: &str = "/api/galaxy";

    // Drawing happens in page script; we only hand over flat arrays
    #[wasm_bindgen(inline_js = "
        export function render_frame(positions, colors, sizes, brightness, edges, mutual,
                                     trails, view_proj, edge_alpha, mutual_alpha, overlay) {
            if (typeof window.galaxyRender === 'function') {
                window.galaxyRender({
                    positions, colors, sizes, brightness, edges, mutual, trails,
                    viewProj: view_proj, edgeAlpha: edge_alpha, mutualAlpha: mutual_alpha,
                    overlay: JSON.parse(overlay),
                });
            }
        }

        export function emit_event(json) {
            if (typeof window.galaxyEvent === 'function') {
                window.galaxyEvent(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        #[allow(clippy::too_many_arguments)]
        fn render_frame(
            positions: &[f32],
            colors: &[f32],
            sizes: &[f32],
            brightness: &[f32],
            edges: &[f32],
            mutual: &[f32],
            trails: &[f32],
            view_proj: &[f32],
            edge_alpha: f32,
            mutual_alpha: f32,
            overlay: &str,
        );
        fn emit_event(json: &str);
    }

    /// App instance holding the session and canvas
    struct App {
        session: Session<FetchStore>,
        canvas: HtmlCanvasElement,
    }

    impl App {
        fn handle(&mut self, event: InputEvent) {
            self.session.handle(event, now_seconds());
        }

        /// Pointer position relative to the canvas, in CSS pixels
        fn touch_points(&self, event: &TouchEvent) -> Vec<Vec2> {
            let rect = self.canvas.get_bounding_client_rect();
            let touches = event.touches();
            (0..touches.length())
                .filter_map(|i| touches.get(i))
                .map(|t| {
                    Vec2::new(
                        t.client_x() as f32 - rect.left() as f32,
                        t.client_y() as f32 - rect.top() as f32,
                    )
                })
                .collect()
        }

        fn resize(&mut self) {
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            let w = self.canvas.client_width();
            let h = self.canvas.client_height();
            self.canvas.set_width((w as f64 * dpr) as u32);
            self.canvas.set_height((h as f64 * dpr) as u32);
            self.handle(InputEvent::Resize {
                width: w as f32,
                height: h as f32,
            });
        }

        /// Step and snapshot the frame, along with the events it raised
        fn frame(&mut self) -> (HostFrame, Vec<SessionEvent>) {
            let frame = HostFrame::capture(self.session.frame(now_seconds()));
            (frame, self.session.drain_events())
        }
    }

    thread_local! {
        static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
    }

    fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
        APP.with(|slot| slot.borrow().as_ref().map(|app| f(&mut app.borrow_mut())))
    }

    /// Create a dot from a JSON `DotSeed`; returns its index
    #[wasm_bindgen]
    pub fn create_dot(seed_json: &str) -> Result<u32, JsValue> {
        let seed: DotSeed =
            serde_json::from_str(seed_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        with_app(|app| app.session.create_dot(seed) as u32)
            .ok_or_else(|| JsValue::from_str("galaxy not running"))
    }

    #[wasm_bindgen]
    pub fn fly_to_my_dot() -> bool {
        with_app(|app| app.session.state.fly_to_my_dot(now_seconds())).unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn toggle_color_mode() -> bool {
        with_app(|app| app.session.state.toggle_color_mode()).unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn reset_galaxy() {
        with_app(|app| app.handle(InputEvent::Key(Key::Reset)));
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Dot Galaxy starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let settings = Settings::load();
        let seed = session_seed();
        let mut state = match fetch_galaxy(GALAXY_URL).await {
            Ok(dots) if !dots.is_empty() => {
                let mut state = GalaxyState::new(settings, seed);
                state.initialize(dots.into_iter().map(DotSeed::from).collect());
                state
            }
            other => {
                if let Err(e) = other {
                    log::warn!("Galaxy fetch failed, generating dots: {}", e);
                }
                GalaxyState::generated(settings, seed)
            }
        };

        // ?ref=<name> points the camera at whoever shared the link
        let referral = window
            .location()
            .search()
            .ok()
            .and_then(|s| web_sys::UrlSearchParams::new_with_str(&s).ok())
            .and_then(|params| params.get("ref"));
        if let Some(name) = referral {
            match state.highlight(&name) {
                Some(i) => log::info!("Highlighting referral {} ({})", name, i),
                None => log::info!("Referral {} not found", name),
            }
        }

        log::info!(
            "Galaxy initialized with seed {} ({} dots)",
            seed,
            state.dots.len()
        );

        let app = Rc::new(RefCell::new(App {
            session: Session::new(state, FetchStore::default()),
            canvas: canvas.clone(),
        }));
        app.borrow_mut().resize();
        APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        setup_pointer_handlers(&canvas, app.clone());
        setup_touch_handlers(&canvas, app.clone());
        setup_window_handlers(app.clone());

        request_animation_frame(app);

        log::info!("Dot Galaxy running!");
    }

    fn mouse_point(event: &MouseEvent) -> Vec2 {
        Vec2::new(event.offset_x() as f32, event.offset_y() as f32)
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let mouse: [(&str, fn(&MouseEvent) -> InputEvent); 4] = [
            ("mousedown", |e: &MouseEvent| InputEvent::PointerDown(mouse_point(e))),
            ("mousemove", |e: &MouseEvent| InputEvent::PointerMove(mouse_point(e))),
            ("click", |e: &MouseEvent| InputEvent::Click(mouse_point(e))),
            ("dblclick", |e: &MouseEvent| InputEvent::DoubleClick(mouse_point(e))),
        ];
        for (name, to_input) in mouse {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                app.borrow_mut().handle(to_input(&event));
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Releases outside the canvas still end the drag
        {
            let app = app.clone();
            let window = web_sys::window().expect("no window");
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().handle(InputEvent::PointerUp);
            });
            let _ = window.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: WheelEvent| {
                event.prevent_default();
                app.borrow_mut()
                    .handle(InputEvent::Wheel(event.delta_y() as f32));
            });
            let _ = canvas.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_touch_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Touch start
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                let points = a.touch_points(&event);
                a.handle(InputEvent::TouchStart(points));
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                let points = a.touch_points(&event);
                a.handle(InputEvent::TouchMove(points));
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                app.borrow_mut().handle(InputEvent::TouchEnd);
            });
            let _ =
                canvas.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Focused form field or contenteditable element
    fn is_editable_target(event: &web_sys::KeyboardEvent) -> bool {
        let Some(target) = event.target() else {
            return false;
        };
        let Some(el) = target.dyn_ref::<HtmlElement>() else {
            return false;
        };
        matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT") || el.is_content_editable()
    }

    fn setup_window_handlers(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");

        // Keyboard
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let Some(key) = key_for_code(&event.code(), is_editable_target(&event)) else {
                    return;
                };
                event.prevent_default();
                app.borrow_mut().handle(InputEvent::Key(key));
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Shake
        {
            let app = app.clone();
            let closure =
                Closure::<dyn FnMut(_)>::new(move |event: web_sys::DeviceMotionEvent| {
                    let Some(acc) = event.acceleration_including_gravity() else {
                        return;
                    };
                    let v = Vec3::new(
                        acc.x().unwrap_or(0.0) as f32,
                        acc.y().unwrap_or(0.0) as f32,
                        acc.z().unwrap_or(0.0) as f32,
                    );
                    app.borrow_mut().handle(InputEvent::Motion(v));
                });
            let _ = window
                .add_event_listener_with_callback("devicemotion", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().resize();
            });
            let _ =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            frame_loop(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>) {
        let (frame, events) = app.borrow_mut().frame();
        // No borrow is held while the page draws or handles events
        render_frame(
            &frame.positions,
            &frame.colors,
            &frame.sizes,
            &frame.brightness,
            &frame.edges,
            &frame.mutual,
            &frame.trails,
            &frame.view_proj,
            frame.edge_alpha,
            frame.mutual_alpha,
            &frame.overlay,
        );
        for event in events {
            match serde_json::to_string(&event) {
                Ok(json) => emit_event(&json),
                Err(e) => log::warn!("Could not encode event: {}", e),
            }
        }
        request_animation_frame(app);
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
    log::info!("Dot Galaxy (native) starting...");
    log::info!("Native mode runs a headless session - use `trunk serve` for the web version");

    println!("\nRunning headless galaxy...");
    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scatter, create a dot, orbit it, and report what the host would draw
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use dot_galaxy::persistence::MemoryStore;
    use dot_galaxy::sim::{DotSeed, GalaxyState, InputEvent, Key};
    use dot_galaxy::{Session, Settings, platform};

    let seed = platform::session_seed();
    let state = GalaxyState::generated(Settings::default(), seed);
    let mut session = Session::new(state, MemoryStore::with_owner("native"));

    const DT: f64 = 1.0 / 60.0;
    let mut now = 0.0;
    let mut run = |session: &mut Session<MemoryStore>, frames: u32| {
        for _ in 0..frames {
            now += DT;
            session.frame(now);
        }
        now
    };

    session.handle(
        InputEvent::Resize {
            width: 1280.0,
            height: 720.0,
        },
        0.0,
    );
    session.handle(InputEvent::Key(Key::Scatter), 0.0);
    run(&mut session, 120);

    let index = session.create_dot(DotSeed {
        name: "Native Tester".to_string(),
        color: "#ff6b6b".to_string(),
        line: "hello from the terminal".to_string(),
        ..Default::default()
    });
    let t = run(&mut session, 60);
    session.state.fly_to_my_dot(t);
    run(&mut session, 240);

    let frame = session.buffers();
    let dot = &session.state.dots[index];
    println!("✓ {} dots, camera {:?}", frame.positions.len(), session.state.camera.mode());
    println!(
        "✓ {} regular / {} mutual edges, {} trail vertices, {} labels",
        frame.edges.regular_count(),
        frame.edges.mutual_count(),
        frame.trails.len(),
        frame.labels.len()
    );
    println!(
        "✓ created {:?} at {:.1} from its home (slug {:?}, claimed {})",
        dot.name,
        dot.pos.distance(dot.home),
        dot.slug,
        dot.claimed
    );
    for event in session.drain_events() {
        log::debug!("event: {:?}", event);
    }
}
