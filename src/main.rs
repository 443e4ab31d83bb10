//! Tap Blitz entry point
//!
//! Browser build: wires the canvas, DOM HUD, and input events to the core.
//! Native build: runs a short headless demo round against the manual
//! scheduler and dumps a state snapshot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlImageElement,
        MouseEvent, TouchEvent,
    };

    use tap_blitz::assets::SpritePool;
    use tap_blitz::audio::{AudioManager, SoundCue};
    use tap_blitz::game::{GameLoop, GameOutput};
    use tap_blitz::platform::BrowserScheduler;
    use tap_blitz::schedule::Scheduler;
    use tap_blitz::sim::{PointerKind, PointerSample, Target, Viewport};

    /// DOM-facing side of the game: canvas renderer, HUD fields, sound cues
    struct Page {
        ctx: CanvasRenderingContext2d,
        canvas: HtmlCanvasElement,
        sprites: SpritePool<HtmlImageElement>,
        explosion: HtmlImageElement,
        audio: AudioManager,
        score_el: Element,
        time_el: Element,
        start_button: Element,
    }

    impl GameOutput for Page {
        fn render(&self, targets: &[Target]) {
            let w = f64::from(self.canvas.width());
            let h = f64::from(self.canvas.height());
            self.ctx.clear_rect(0.0, 0.0, w, h);
            for target in targets {
                let image = if target.exploding {
                    &self.explosion
                } else {
                    self.sprites.get(target.sprite)
                };
                let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    image,
                    f64::from(target.pos.x),
                    f64::from(target.pos.y),
                    f64::from(target.size),
                    f64::from(target.size),
                );
            }
        }

        fn score_changed(&self, score: u32) {
            self.score_el.set_text_content(Some(&score.to_string()));
        }

        fn time_changed(&self, seconds_left: u32) {
            self.time_el.set_text_content(Some(&seconds_left.to_string()));
        }

        fn target_hit(&self) {
            self.audio.play(SoundCue::Explosion);
        }

        fn game_over(&self, final_score: u32) {
            self.audio.play(SoundCue::GameOver);
            if let Some(window) = web_sys::window() {
                let _ = window.alert_with_message(&format!("Game Over! Your score: {final_score}"));
            }
            let _ = self.start_button.set_attribute("class", "");
        }
    }

    fn element(document: &Document, id: &str) -> Element {
        document
            .get_element_by_id(id)
            .unwrap_or_else(|| panic!("missing #{id}"))
    }

    fn load_image(src: &str) -> HtmlImageElement {
        let image = HtmlImageElement::new().expect("image element");
        image.set_src(src);
        image
    }

    /// Canvas fills its container width and 70% of the window height
    fn size_canvas(canvas: &HtmlCanvasElement, window: &web_sys::Window) {
        let width = canvas.offset_width().max(1) as u32;
        let height = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .map(|h| (h * 0.7) as u32)
            .unwrap_or(300)
            .max(1);
        canvas.set_width(width);
        canvas.set_height(height);
    }

    /// Current on-screen layout of the canvas, for pointer mapping
    fn viewport_of(canvas: &HtmlCanvasElement) -> Viewport {
        let rect = canvas.get_bounding_client_rect();
        Viewport {
            canvas: Vec2::new(canvas.width() as f32, canvas.height() as f32),
            offset: Vec2::new(rect.left() as f32, rect.top() as f32),
            display: Vec2::new(rect.width() as f32, rect.height() as f32),
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Tap Blitz starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = element(&document, "game-canvas")
            .dyn_into()
            .expect("not a canvas");
        size_canvas(&canvas, &window);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        // One underlying image backs all five sprite slots
        let page = Rc::new(Page {
            ctx,
            canvas: canvas.clone(),
            sprites: SpritePool::resolve(|_| load_image("images/target.png")),
            explosion: load_image("images/explosion.png"),
            audio: AudioManager::new(),
            score_el: element(&document, "score-value"),
            time_el: element(&document, "time-value"),
            start_button: element(&document, "start-button"),
        });

        let scheduler = Rc::new(BrowserScheduler::new(window.clone()));
        let seed = js_sys::Date::now() as u64;
        let game = GameLoop::new(
            canvas.width() as f32,
            canvas.height() as f32,
            seed,
            scheduler as Rc<dyn Scheduler>,
            page.clone() as Rc<dyn GameOutput>,
        )
        .expect("canvas has no area");

        log::info!("Initialized with seed {seed}");

        setup_start_button(&page.start_button, game.clone());
        setup_pointer_handlers(&canvas, game.clone());
        setup_resize_handler(&window, &canvas, game);

        log::info!("Tap Blitz ready");
    }

    fn setup_start_button(button: &Element, game: GameLoop) {
        let button_clone = button.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let _ = button_clone.set_attribute("class", "hidden");
            game.start();
        });
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, game: GameLoop) {
        // Mouse
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let sample = PointerSample {
                    client: Vec2::new(event.client_x() as f32, event.client_y() as f32),
                    kind: PointerKind::Mouse,
                };
                game.on_pointer_down(sample, &viewport_of(&canvas_clone));
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch - first touch point only
        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let sample = PointerSample {
                        client: Vec2::new(touch.client_x() as f32, touch.client_y() as f32),
                        kind: PointerKind::Touch,
                    };
                    game.on_pointer_down(sample, &viewport_of(&canvas_clone));
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(window: &web_sys::Window, canvas: &HtmlCanvasElement, game: GameLoop) {
        let window_clone = window.clone();
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            size_canvas(&canvas, &window_clone);
            if let Err(e) = game.resize(canvas.width() as f32, canvas.height() as f32) {
                log::warn!("resize rejected: {e}");
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{SystemTime, UNIX_EPOCH};

    use glam::Vec2;
    use tap_blitz::consts::COUNTDOWN_MS;
    use tap_blitz::game::{GameLoop, GameOutput};
    use tap_blitz::schedule::{ManualScheduler, Scheduler};
    use tap_blitz::sim::{PointerKind, PointerSample, Target, Viewport};

    /// Text HUD for the headless demo
    #[derive(Default)]
    struct ConsoleOutput {
        frames: Cell<u64>,
    }

    impl GameOutput for ConsoleOutput {
        fn render(&self, _targets: &[Target]) {
            self.frames.set(self.frames.get() + 1);
        }
        fn score_changed(&self, score: u32) {
            log::info!("score: {score}");
        }
        fn time_changed(&self, seconds_left: u32) {
            log::debug!("time left: {seconds_left}");
        }
        fn game_over(&self, final_score: u32) {
            println!("Game over! Final score: {final_score}");
        }
    }

    env_logger::init();
    log::info!("Tap Blitz (headless demo) starting...");

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let scheduler = Rc::new(ManualScheduler::new());
    let output = Rc::new(ConsoleOutput::default());
    let game = GameLoop::new(
        400.0,
        300.0,
        seed,
        scheduler.clone() as Rc<dyn Scheduler>,
        output.clone() as Rc<dyn GameOutput>,
    )
    .expect("demo bounds are valid");

    game.start();
    let viewport = Viewport::unscaled(400.0, 300.0);

    // 30 virtual seconds at 60 fps, tapping the first target once a second
    for second in 0..30u32 {
        let aim = {
            let session = game.session();
            session
                .targets
                .first()
                .map(|t| t.pos + Vec2::splat(t.size / 2.0))
        };
        if let Some(point) = aim {
            game.on_pointer_down(
                PointerSample {
                    client: point,
                    kind: PointerKind::Mouse,
                },
                &viewport,
            );
        }

        if second == 29 {
            // Snapshot the last full second before the round ends
            let snapshot = serde_json::to_string_pretty(&game.session().targets)
                .unwrap_or_else(|e| format!("snapshot failed: {e}"));
            log::info!("final-second targets:\n{snapshot}");
        }

        for _ in 0..60 {
            scheduler.run_frame();
        }
        scheduler.advance(COUNTDOWN_MS);
    }

    println!("frames rendered: {}", output.frames.get());
}
