//! Game loop orchestration
//!
//! `GameLoop` owns the session and drives the three callback sources: the
//! per-frame chain, the independent 1-second countdown, and the 200 ms
//! explosion cleanups. All three interleave on one logical thread with
//! run-to-completion semantics, so state lives in a single `Rc<RefCell<_>>`
//! and no callback holds the borrow across another callback.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::consts::*;
use crate::schedule::{Scheduler, TimerHandle};
use crate::sim::{
    self, GamePhase, GameSession, PointerSample, SpawnError, Target, TargetId, Viewport,
};

/// Everything the core pushes out to the host page.
///
/// `render` gets the live target list once per frame and must not mutate
/// game state or call back into the loop.
pub trait GameOutput {
    fn render(&self, targets: &[Target]);
    /// Score display update; called whenever the score changes
    fn score_changed(&self, score: u32);
    /// Timer display update; called at start and on every countdown tick
    fn time_changed(&self, seconds_left: u32);
    /// Sound cue, once per hit target
    fn target_hit(&self) {}
    /// Final score notification on entering `Ended`
    fn game_over(&self, final_score: u32);
}

struct LoopState {
    session: GameSession,
    countdown: Option<TimerHandle>,
    /// Bumped on every `start`; a frame chain carrying a stale value stops
    /// itself instead of double-scheduling into the new run.
    run_id: u64,
}

/// Orchestrates one session at a time: `Idle -> Running -> Ended`, with
/// `start` re-entering `Running` from `Ended` via a full reset.
#[derive(Clone)]
pub struct GameLoop {
    state: Rc<RefCell<LoopState>>,
    scheduler: Rc<dyn Scheduler>,
    output: Rc<dyn GameOutput>,
}

impl GameLoop {
    pub fn new(
        width: f32,
        height: f32,
        seed: u64,
        scheduler: Rc<dyn Scheduler>,
        output: Rc<dyn GameOutput>,
    ) -> Result<Self, SpawnError> {
        Ok(Self {
            state: Rc::new(RefCell::new(LoopState {
                session: GameSession::new(width, height, seed)?,
                countdown: None,
                run_id: 0,
            })),
            scheduler,
            output,
        })
    }

    /// Begin a fresh round: reset score and timer, repopulate targets, start
    /// the frame chain and the countdown. Also serves as restart from `Ended`.
    pub fn start(&self) {
        let (stale_countdown, run_id) = {
            let mut st = self.state.borrow_mut();
            st.run_id += 1;
            st.session.begin();
            (st.countdown.take(), st.run_id)
        };
        if let Some(handle) = stale_countdown {
            self.scheduler.cancel_repeating(handle);
        }
        log::info!("round started ({GAME_SECONDS}s, {TARGET_COUNT} targets)");

        self.output.score_changed(0);
        self.output.time_changed(GAME_SECONDS);

        let handle = self
            .scheduler
            .schedule_repeating(COUNTDOWN_MS, self.countdown_callback());
        self.state.borrow_mut().countdown = Some(handle);

        schedule_frame(
            Rc::clone(&self.state),
            Rc::clone(&self.scheduler),
            Rc::clone(&self.output),
            run_id,
        );
    }

    /// Resolve one discrete pointer-down event. Ignored unless `Running`.
    ///
    /// Every target whose box contains the transformed point is hit: +1
    /// score each, explosion pose on, and a deferred removal/replacement
    /// keyed by target identity.
    pub fn on_pointer_down(&self, sample: PointerSample, viewport: &Viewport) {
        let point = viewport.to_canvas(sample.client);
        let (hits, score) = {
            let mut st = self.state.borrow_mut();
            if !st.session.is_running() {
                return;
            }
            let hits = sim::hits_at(&st.session.targets, point);
            for id in &hits {
                st.session.score += 1;
                if let Some(target) = st.session.targets.iter_mut().find(|t| t.id == *id) {
                    target.exploding = true;
                }
            }
            (hits, st.session.score)
        };
        if hits.is_empty() {
            return;
        }
        log::debug!(
            "{:?} down at ({:.0}, {:.0}): {} hit(s)",
            sample.kind,
            point.x,
            point.y,
            hits.len()
        );

        self.output.score_changed(score);
        for id in hits {
            self.output.target_hit();
            self.schedule_explosion_cleanup(id);
        }
    }

    /// Adopt new canvas dimensions; live targets are clamped into range.
    pub fn resize(&self, width: f32, height: f32) -> Result<(), SpawnError> {
        self.state.borrow_mut().session.resize(width, height)
    }

    pub fn phase(&self) -> GamePhase {
        self.state.borrow().session.phase
    }

    /// Read access to the session (for HUD bootstrap and diagnostics)
    pub fn session(&self) -> Ref<'_, GameSession> {
        Ref::map(self.state.borrow(), |st| &st.session)
    }

    /// Countdown tick: decrement the timer and end the round at zero. The
    /// repeating timer cancels itself on the transition so it cannot fire
    /// into a terminated session.
    fn countdown_callback(&self) -> Rc<dyn Fn()> {
        let state = Rc::clone(&self.state);
        let scheduler = Rc::clone(&self.scheduler);
        let output = Rc::clone(&self.output);
        Rc::new(move || {
            let outcome = {
                let mut st = state.borrow_mut();
                if !st.session.is_running() {
                    return;
                }
                st.session.time_left = st.session.time_left.saturating_sub(1);
                if st.session.time_left == 0 {
                    let score = st.session.score;
                    st.session.finish();
                    (0, Some((st.countdown.take(), score)))
                } else {
                    (st.session.time_left, None)
                }
            };
            output.time_changed(outcome.0);
            if let Some((handle, final_score)) = outcome.1 {
                if let Some(handle) = handle {
                    scheduler.cancel_repeating(handle);
                }
                log::info!("time up, final score {final_score}");
                output.game_over(final_score);
            }
        })
    }

    /// After the explosion display window, remove the hit target by identity
    /// and append one replacement. Safe no-op if the target is already gone
    /// (double hit) or the session has ended meanwhile.
    fn schedule_explosion_cleanup(&self, id: TargetId) {
        let state = Rc::clone(&self.state);
        self.scheduler.schedule_timeout(
            EXPLOSION_MS,
            Box::new(move || {
                let mut st = state.borrow_mut();
                if st.session.remove_target(id) && st.session.is_running() {
                    st.session.spawn_replacement();
                }
            }),
        );
    }
}

/// One link of the cooperative frame chain: simulate, render, top up,
/// reschedule. The chain stops by not rescheduling once the session is no
/// longer running or a newer run has started.
fn schedule_frame(
    state: Rc<RefCell<LoopState>>,
    scheduler: Rc<dyn Scheduler>,
    output: Rc<dyn GameOutput>,
    run_id: u64,
) {
    let next_scheduler = Rc::clone(&scheduler);
    scheduler.schedule_next_frame(Box::new(move || {
        {
            let mut st = state.borrow_mut();
            if st.run_id != run_id || !st.session.is_running() {
                return;
            }
            sim::tick(&mut st.session);
            output.render(&st.session.targets);
            st.session.top_up();
        }
        schedule_frame(state, next_scheduler, output, run_id);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;
    use crate::sim::PointerKind;
    use glam::Vec2;

    #[derive(Debug, PartialEq)]
    enum Event {
        Render(usize),
        Score(u32),
        Time(u32),
        Hit,
        GameOver(u32),
    }

    #[derive(Default)]
    struct RecordingOutput {
        events: RefCell<Vec<Event>>,
    }

    impl RecordingOutput {
        fn has(&self, event: Event) -> bool {
            self.events.borrow().contains(&event)
        }

        fn renders(&self) -> usize {
            self.events
                .borrow()
                .iter()
                .filter(|e| matches!(e, Event::Render(_)))
                .count()
        }
    }

    impl GameOutput for RecordingOutput {
        fn render(&self, targets: &[Target]) {
            self.events.borrow_mut().push(Event::Render(targets.len()));
        }
        fn score_changed(&self, score: u32) {
            self.events.borrow_mut().push(Event::Score(score));
        }
        fn time_changed(&self, seconds_left: u32) {
            self.events.borrow_mut().push(Event::Time(seconds_left));
        }
        fn target_hit(&self) {
            self.events.borrow_mut().push(Event::Hit);
        }
        fn game_over(&self, final_score: u32) {
            self.events.borrow_mut().push(Event::GameOver(final_score));
        }
    }

    fn fixture() -> (Rc<ManualScheduler>, Rc<RecordingOutput>, GameLoop) {
        let scheduler = Rc::new(ManualScheduler::new());
        let output = Rc::new(RecordingOutput::default());
        let game = GameLoop::new(
            400.0,
            300.0,
            7,
            scheduler.clone() as Rc<dyn Scheduler>,
            output.clone() as Rc<dyn GameOutput>,
        )
        .unwrap();
        (scheduler, output, game)
    }

    /// Park target `index` at a known spot and move the rest out of the way.
    fn pin_target(game: &GameLoop, index: usize, pos: Vec2, size: f32) -> TargetId {
        let mut st = game.state.borrow_mut();
        for (i, target) in st.session.targets.iter_mut().enumerate() {
            target.vel = Vec2::ZERO;
            if i == index {
                target.pos = pos;
                target.size = size;
            } else {
                target.pos = Vec2::new(300.0, 250.0);
                target.size = 30.0;
            }
        }
        st.session.targets[index].id
    }

    fn tap(game: &GameLoop, x: f32, y: f32) {
        let viewport = Viewport::unscaled(400.0, 300.0);
        game.on_pointer_down(
            PointerSample {
                client: Vec2::new(x, y),
                kind: PointerKind::Mouse,
            },
            &viewport,
        );
    }

    #[test]
    fn start_populates_and_schedules() {
        let (scheduler, output, game) = fixture();
        assert_eq!(game.phase(), GamePhase::Idle);

        game.start();

        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.session().targets.len(), TARGET_COUNT);
        assert!(output.has(Event::Score(0)));
        assert!(output.has(Event::Time(GAME_SECONDS)));
        assert_eq!(scheduler.pending_frames(), 1);
    }

    #[test]
    fn frame_chain_renders_and_reschedules() {
        let (scheduler, output, game) = fixture();
        game.start();

        for _ in 0..3 {
            scheduler.run_frame();
        }

        assert_eq!(output.renders(), 3);
        assert!(output.has(Event::Render(TARGET_COUNT)));
        assert_eq!(scheduler.pending_frames(), 1);
    }

    #[test]
    fn countdown_reaches_ended_and_stops_frames() {
        let (scheduler, output, game) = fixture();
        game.start();

        scheduler.advance(1_000);
        assert_eq!(game.session().time_left, GAME_SECONDS - 1);
        assert!(output.has(Event::Time(GAME_SECONDS - 1)));

        scheduler.advance(29_000);
        assert_eq!(game.phase(), GamePhase::Ended);
        assert!(output.has(Event::GameOver(0)));

        // The pending frame observes Ended and declines to reschedule
        let renders_before = output.renders();
        scheduler.run_frame();
        scheduler.run_frame();
        assert_eq!(output.renders(), renders_before);
        assert_eq!(scheduler.pending_frames(), 0);

        // And the countdown is cancelled, not just ignored
        scheduler.advance(10_000);
        assert_eq!(game.session().time_left, 0);
    }

    #[test]
    fn hit_scores_explodes_and_replaces_after_delay() {
        let (scheduler, output, game) = fixture();
        game.start();
        let id = pin_target(&game, 2, Vec2::new(50.0, 50.0), 40.0);

        tap(&game, 60.0, 60.0);

        assert_eq!(game.session().score, 1);
        assert!(output.has(Event::Score(1)));
        assert!(output.has(Event::Hit));
        {
            let session = game.session();
            let target = session.targets.iter().find(|t| t.id == id).unwrap();
            assert!(target.exploding);
        }

        // Still present (and still 5) through the explosion window
        scheduler.advance(EXPLOSION_MS - 1);
        assert!(game.session().targets.iter().any(|t| t.id == id));
        assert_eq!(game.session().targets.len(), TARGET_COUNT);

        // Removed and replaced once the window closes, net count unchanged
        scheduler.advance(1);
        assert!(!game.session().targets.iter().any(|t| t.id == id));
        assert_eq!(game.session().targets.len(), TARGET_COUNT);
        assert_eq!(game.session().score, 1);
    }

    #[test]
    fn overlapping_targets_both_score_on_one_tap() {
        let (scheduler, output, game) = fixture();
        game.start();
        pin_target(&game, 0, Vec2::new(100.0, 100.0), 40.0);
        {
            let mut st = game.state.borrow_mut();
            st.session.targets[1].pos = Vec2::new(120.0, 120.0);
            st.session.targets[1].size = 40.0;
        }

        tap(&game, 125.0, 125.0);

        assert_eq!(game.session().score, 2);
        assert_eq!(
            output
                .events
                .borrow()
                .iter()
                .filter(|e| matches!(e, Event::Hit))
                .count(),
            2
        );

        scheduler.advance(EXPLOSION_MS);
        assert_eq!(game.session().targets.len(), TARGET_COUNT);
    }

    #[test]
    fn double_hit_on_one_target_scores_twice_but_replaces_once() {
        let (scheduler, _output, game) = fixture();
        game.start();
        let id = pin_target(&game, 0, Vec2::new(50.0, 50.0), 40.0);

        tap(&game, 60.0, 60.0);
        scheduler.advance(50);
        tap(&game, 60.0, 60.0);

        assert_eq!(game.session().score, 2);

        // Both deferred removals fire; the second finds the id gone
        scheduler.advance(EXPLOSION_MS);
        assert!(!game.session().targets.iter().any(|t| t.id == id));
        assert_eq!(game.session().targets.len(), TARGET_COUNT);
    }

    #[test]
    fn pointer_events_ignored_unless_running() {
        let (scheduler, output, game) = fixture();

        tap(&game, 200.0, 150.0);
        assert!(output.events.borrow().is_empty());

        game.start();
        scheduler.advance(30_000);
        assert_eq!(game.phase(), GamePhase::Ended);

        let events_after_end = output.events.borrow().len();
        tap(&game, 200.0, 150.0);
        assert_eq!(output.events.borrow().len(), events_after_end);
    }

    #[test]
    fn cleanup_after_end_is_a_safe_noop() {
        let (scheduler, output, game) = fixture();
        game.start();
        scheduler.advance(29_900);
        pin_target(&game, 0, Vec2::new(50.0, 50.0), 40.0);

        tap(&game, 60.0, 60.0);
        assert_eq!(game.session().score, 1);

        // The countdown (due at 30s) fires before the cleanup (due at 30.1s)
        scheduler.advance(1_000);
        assert_eq!(game.phase(), GamePhase::Ended);
        assert!(output.has(Event::GameOver(1)));
        assert!(game.session().targets.is_empty());
    }

    #[test]
    fn restart_from_ended_runs_a_single_frame_chain() {
        let (scheduler, output, game) = fixture();
        game.start();
        scheduler.advance(30_000);
        assert_eq!(game.phase(), GamePhase::Ended);

        game.start();
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.session().score, 0);
        assert_eq!(game.session().time_left, GAME_SECONDS);
        assert_eq!(game.session().targets.len(), TARGET_COUNT);

        // Stale chain from the first run dies; exactly one chain survives
        scheduler.run_frame();
        assert_eq!(scheduler.pending_frames(), 1);
        let renders = output.renders();
        scheduler.run_frame();
        assert_eq!(output.renders(), renders + 1);
    }

    #[test]
    fn immediate_restart_does_not_double_schedule() {
        let (scheduler, _output, game) = fixture();
        game.start();
        game.start();
        assert_eq!(scheduler.pending_frames(), 2);

        // Both queued callbacks run; only the current run's reschedules
        scheduler.run_frame();
        assert_eq!(scheduler.pending_frames(), 1);
    }

    /// The worked example: 400x300 canvas, start, one countdown tick, a tap
    /// on target[2], then the 200 ms replacement.
    #[test]
    fn example_scenario() {
        let (scheduler, output, game) = fixture();
        game.start();
        assert_eq!(game.session().targets.len(), 5);
        assert_eq!(game.session().score, 0);
        assert_eq!(game.session().time_left, 30);

        scheduler.advance(1_000);
        assert_eq!(game.session().time_left, 29);

        let id = pin_target(&game, 2, Vec2::new(150.0, 100.0), 40.0);
        tap(&game, 170.0, 120.0);
        assert_eq!(game.session().score, 1);
        assert!(
            game.session()
                .targets
                .iter()
                .find(|t| t.id == id)
                .unwrap()
                .exploding
        );

        scheduler.advance(200);
        assert!(!game.session().targets.iter().any(|t| t.id == id));
        assert_eq!(game.session().targets.len(), 5);
        assert_eq!(game.session().score, 1);
        assert!(output.has(Event::Score(1)));
    }
}
