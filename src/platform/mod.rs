//! Browser timer backend
//!
//! Implements the `Scheduler` capability on top of `setInterval`,
//! `setTimeout`, and `requestAnimationFrame`. Closures are handed to the
//! browser and forgotten; the game loop runs for the page's lifetime.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;

use crate::schedule::{Scheduler, TimerHandle};

pub struct BrowserScheduler {
    window: web_sys::Window,
}

impl BrowserScheduler {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule_repeating(&self, interval_ms: u32, cb: Rc<dyn Fn()>) -> TimerHandle {
        let closure = Closure::<dyn FnMut()>::new(move || cb());
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                interval_ms as i32,
            )
            .unwrap_or_else(|_| {
                log::error!("setInterval failed");
                -1
            });
        closure.forget();
        TimerHandle(id)
    }

    fn cancel_repeating(&self, handle: TimerHandle) {
        self.window.clear_interval_with_handle(handle.0);
    }

    fn schedule_timeout(&self, delay_ms: u32, cb: Box<dyn FnOnce()>) {
        let closure = Closure::once(cb);
        if self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay_ms as i32,
            )
            .is_err()
        {
            log::error!("setTimeout failed");
        }
        closure.forget();
    }

    fn schedule_next_frame(&self, cb: Box<dyn FnOnce()>) {
        let closure = Closure::once(move |_time: f64| cb());
        if self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::error!("requestAnimationFrame failed");
        }
        closure.forget();
    }
}
