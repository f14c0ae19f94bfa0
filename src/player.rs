use std::time::Instant;

use crate::error::{ChalklineError, ChalklineResult};
use crate::interp::apply_step;
use crate::scene::SceneModel;
use crate::script::AnimationStep;

/// Playback lifecycle: `Idle -> Playing -> (Idle | Completed)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    Completed,
}

/// Notifications emitted by [`Player::start`] and [`Player::poll`]. Hosts
/// re-render on `Render`; `Completed` arrives exactly once per run (never
/// after `stop()`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Render,
    Completed,
}

/// Drives timed, sequential replay of a step script over an owned scene
/// model.
///
/// Time is injected: the controller arms a single deadline per step and the
/// host calls [`Player::poll`] when its timer fires, or whenever it likes
/// (polling early is a no-op, polling late catches up). This keeps the engine
/// free of any UI framework's scheduler and lets tests run a whole playback
/// without sleeping. At most one deadline is ever armed; `stop()` and
/// completion clear it, so a stale host timer firing afterwards cannot
/// mutate anything.
#[derive(Debug, Default)]
pub struct Player {
    steps: Vec<AnimationStep>,
    model: SceneModel,
    current_step: usize,
    phase: Phase,
    deadline: Option<Instant>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Index of the active step. Meaningful only once a run has started;
    /// after completion it stays on the last step.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn steps(&self) -> &[AnimationStep] {
        &self.steps
    }

    pub fn model(&self) -> &SceneModel {
        &self.model
    }

    /// When the next step is due, if a run is in flight. Hosts arm their
    /// one-shot timer off this.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Begin a fresh run. Valid from `Idle` or `Completed`; any state from a
    /// prior run is discarded. An empty step list is rejected so a run can
    /// never complete without having shown anything; callers substitute
    /// [`crate::script::fallback_steps`] upstream.
    pub fn start(
        &mut self,
        steps: Vec<AnimationStep>,
        now: Instant,
    ) -> ChalklineResult<Vec<PlaybackEvent>> {
        if steps.is_empty() {
            return Err(ChalklineError::validation(
                "cannot start playback with an empty step list",
            ));
        }
        if self.phase == Phase::Playing {
            return Err(ChalklineError::playback(
                "playback already in progress; stop() it first",
            ));
        }

        tracing::debug!(steps = steps.len(), "starting playback run");
        self.steps = steps;
        self.model = SceneModel::new();
        self.current_step = 0;
        self.phase = Phase::Playing;

        apply_step(&mut self.model, &self.steps[0]);
        self.deadline = Some(now + self.steps[0].dwell());
        Ok(vec![PlaybackEvent::Render])
    }

    /// Advance past every deadline that has elapsed by `now`. Returns one
    /// `Render` per state change plus a final `Completed` when the last
    /// step's dwell has passed. Outside `Playing` this does nothing.
    pub fn poll(&mut self, now: Instant) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        if self.phase != Phase::Playing {
            return events;
        }

        while let Some(due) = self.deadline {
            if now < due {
                break;
            }

            if self.current_step + 1 < self.steps.len() {
                self.current_step += 1;
                apply_step(&mut self.model, &self.steps[self.current_step]);
                // Re-arm from the previous deadline, not from `now`, so the
                // scheduled delay of a run is exactly the sum of dwells.
                self.deadline = Some(due + self.steps[self.current_step].dwell());
                events.push(PlaybackEvent::Render);
            } else {
                self.deadline = None;
                self.phase = Phase::Completed;
                tracing::debug!(steps = self.steps.len(), "playback run completed");
                events.push(PlaybackEvent::Completed);
            }
        }

        events
    }

    /// Cancel the pending step timer and return to `Idle`, leaving the model
    /// and step index visible for inspection. A stopped run cannot resume;
    /// the only continuation is `start()`, which resets from scratch. No-op
    /// outside `Playing`.
    pub fn stop(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }
        tracing::debug!(step = self.current_step, "stopping playback run");
        self.deadline = None;
        self.phase = Phase::Idle;
    }

    /// Run a whole playback on the current thread in real time, sleeping out
    /// each step's dwell and invoking `sink(model, current_step)` on every
    /// render notification. Returns once the run completes.
    pub fn run_blocking(
        &mut self,
        steps: Vec<AnimationStep>,
        mut sink: impl FnMut(&SceneModel, usize),
    ) -> ChalklineResult<()> {
        for event in self.start(steps, Instant::now())? {
            if event == PlaybackEvent::Render {
                sink(&self.model, self.current_step);
            }
        }

        while let Some(due) = self.deadline {
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
            for event in self.poll(Instant::now()) {
                match event {
                    PlaybackEvent::Render => sink(&self.model, self.current_step),
                    PlaybackEvent::Completed => return Ok(()),
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn three_step_script() -> Vec<AnimationStep> {
        vec![
            AnimationStep::create("A").at(100.0, 100.0).secs(1.0),
            AnimationStep::create("B").at(200.0, 100.0).secs(1.0),
            AnimationStep::connect("A", "B").secs(1.0),
        ]
    }

    #[test]
    fn empty_step_list_is_rejected() {
        let mut player = Player::new();
        let err = player.start(Vec::new(), Instant::now());
        assert!(err.is_err());
        assert_eq!(player.phase(), Phase::Idle);
        assert!(player.model().is_empty());
        assert!(player.next_deadline().is_none());
    }

    #[test]
    fn start_applies_first_step_and_arms_timer() {
        let t0 = Instant::now();
        let mut player = Player::new();
        let events = player.start(three_step_script(), t0).unwrap();

        assert_eq!(events, vec![PlaybackEvent::Render]);
        assert_eq!(player.phase(), Phase::Playing);
        assert_eq!(player.current_step(), 0);
        assert_eq!(player.model().len(), 1);
        assert_eq!(player.next_deadline(), Some(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn start_while_playing_is_rejected() {
        let t0 = Instant::now();
        let mut player = Player::new();
        player.start(three_step_script(), t0).unwrap();
        assert!(player.start(three_step_script(), t0).is_err());
        // The in-flight run is untouched.
        assert_eq!(player.phase(), Phase::Playing);
        assert_eq!(player.current_step(), 0);
    }

    #[test]
    fn early_poll_is_a_noop() {
        let t0 = Instant::now();
        let mut player = Player::new();
        player.start(three_step_script(), t0).unwrap();
        assert!(player.poll(t0 + Duration::from_millis(500)).is_empty());
        assert_eq!(player.current_step(), 0);
    }

    #[test]
    fn completes_exactly_once_with_final_index() {
        let t0 = Instant::now();
        let mut player = Player::new();
        player.start(three_step_script(), t0).unwrap();

        assert_eq!(
            player.poll(t0 + Duration::from_millis(1100)),
            vec![PlaybackEvent::Render]
        );
        assert_eq!(
            player.poll(t0 + Duration::from_millis(2100)),
            vec![PlaybackEvent::Render]
        );

        let events = player.poll(t0 + Duration::from_millis(3100));
        assert_eq!(events, vec![PlaybackEvent::Completed]);
        assert_eq!(player.phase(), Phase::Completed);
        assert!(!player.is_playing());
        // The index ends on the last step, never one past it.
        assert_eq!(player.current_step(), 2);
        assert!(player.next_deadline().is_none());

        // Later polls never re-complete.
        assert!(player.poll(t0 + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn late_poll_catches_up_in_one_call() {
        let t0 = Instant::now();
        let mut player = Player::new();
        player.start(three_step_script(), t0).unwrap();

        let events = player.poll(t0 + Duration::from_secs(60));
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Render,
                PlaybackEvent::Render,
                PlaybackEvent::Completed,
            ]
        );
        assert_eq!(player.current_step(), 2);
        assert_eq!(player.model().get("A").unwrap().connections, vec!["B"]);
    }

    #[test]
    fn stop_cancels_timer_and_freezes_state() {
        let t0 = Instant::now();
        let mut player = Player::new();
        player.start(three_step_script(), t0).unwrap();
        player.poll(t0 + Duration::from_millis(1100));
        assert_eq!(player.current_step(), 1);

        player.stop();
        assert_eq!(player.phase(), Phase::Idle);
        assert!(player.next_deadline().is_none());

        // A stale timer firing long after stop() mutates nothing.
        let frozen = player.model().clone();
        assert!(player.poll(t0 + Duration::from_secs(60)).is_empty());
        assert_eq!(player.model(), &frozen);
        assert_eq!(player.current_step(), 1);
    }

    #[test]
    fn stop_outside_playing_is_a_noop() {
        let mut player = Player::new();
        player.stop();
        assert_eq!(player.phase(), Phase::Idle);
    }

    #[test]
    fn restart_after_completion_resets_the_model() {
        let t0 = Instant::now();
        let mut player = Player::new();
        player.start(three_step_script(), t0).unwrap();
        player.poll(t0 + Duration::from_secs(60));
        assert_eq!(player.phase(), Phase::Completed);

        let t1 = t0 + Duration::from_secs(120);
        player
            .start(vec![AnimationStep::create("C").secs(1.0)], t1)
            .unwrap();
        assert_eq!(player.phase(), Phase::Playing);
        assert_eq!(player.current_step(), 0);
        // Nothing from the prior run leaks into the fresh model.
        assert_eq!(player.model().len(), 1);
        assert!(player.model().contains("C"));
    }

    #[test]
    fn scheduled_delay_is_the_sum_of_dwells() {
        let t0 = Instant::now();
        let mut player = Player::new();
        player.start(three_step_script(), t0).unwrap();

        let mut last_deadline = player.next_deadline().unwrap();
        assert_eq!(last_deadline - t0, Duration::from_secs(1));

        player.poll(last_deadline);
        last_deadline = player.next_deadline().unwrap();
        assert_eq!(last_deadline - t0, Duration::from_secs(2));

        player.poll(last_deadline);
        last_deadline = player.next_deadline().unwrap();
        assert_eq!(last_deadline - t0, Duration::from_secs(3));
    }

    #[test]
    fn run_blocking_renders_every_step_and_returns_on_completion() {
        let steps = vec![
            AnimationStep::create("A").secs(0.001),
            AnimationStep::create("B").secs(0.001),
        ];
        let mut player = Player::new();
        let mut seen = Vec::new();
        player
            .run_blocking(steps, |model, index| seen.push((model.len(), index)))
            .unwrap();

        assert_eq!(seen, vec![(1, 0), (2, 1)]);
        assert_eq!(player.phase(), Phase::Completed);
    }
}
