//! Multi sprite playback.
//!
//! ┌──────────────────────── One Playback Run ──────────────────────────┐
//! │  snapshot queues + poses                                           │
//! │      │                                                             │
//! │      ▼                                                             │
//! │  step i : every sprite with a command at i advances (store order)  │
//! │      │                                                             │
//! │      ▼                                                             │
//! │  collision check over all pairs ── first hit ──► swap ORIGINAL     │
//! │      │                              (latched)    queues, i = 0     │
//! │      ▼                                                             │
//! │  sleep(step delay) ──► i + 1 ──► ... until i == max length         │
//! └────────────────────────────────────────────────────────────────────┘
use crate::config::{MaxLengthPolicy, PlaybackConfig};
use crate::engine::{collides, Timer};
use crate::sprite::{apply_command, Bubble, Command, SpriteContext, SpriteId, SpritePatch};
use crate::store::{QueueStore, Shared, SpriteStore};
use anyhow::{bail, Result};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;

/// Cooperative stop, only looked at between steps
#[derive(Debug, Default, Clone)]
pub struct StopSignal(Rc<Cell<bool>>);

impl StopSignal {
    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }

    fn reset(&self) {
        self.0.set(false);
    }
}

/// At most one run per stage, shared by everything that can start one
#[derive(Debug, Default, Clone)]
pub struct PlaybackLock(Rc<Cell<bool>>);

impl PlaybackLock {
    pub fn is_running(&self) -> bool {
        self.0.get()
    }

    /// `None` while another run holds the lock
    pub fn try_acquire(&self) -> Option<PlaybackGuard> {
        if self.0.replace(true) {
            return None;
        }
        Some(PlaybackGuard(self.0.clone()))
    }
}

/// Releases the lock on drop, also when the run future is dropped midway
#[derive(Debug)]
pub struct PlaybackGuard(Rc<Cell<bool>>);

impl Drop for PlaybackGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackReport {
    /// Queue index steps executed, restarted steps included
    pub steps: usize,
    /// The pair whose queues were exchanged, at most one per run
    pub swapped: Option<(SpriteId, SpriteId)>,
    pub stopped: bool,
}

/// Show `bubble` for `millis`, then clear it if it is still ours
/// - returns whether the clear happened
pub async fn hold_bubble(
    sprites: &Shared<SpriteStore>,
    timer: &dyn Timer,
    id: SpriteId,
    bubble: Bubble,
    millis: u32,
) -> bool {
    let ticket = sprites.borrow_mut().show_bubble(id, bubble);
    let Some(ticket) = ticket else {
        return false;
    };
    timer.sleep(millis).await;
    sprites.borrow_mut().clear_bubble(ticket)
}

/// Working copy of one sprite for the duration of a run
struct Slot {
    id: SpriteId,
    context: SpriteContext,
    original: Vec<Command>,
    current: Vec<Command>,
}

pub struct Sequencer {
    sprites: Shared<SpriteStore>,
    queues: Shared<QueueStore>,
    timer: Rc<dyn Timer>,
    config: PlaybackConfig,
    stop: StopSignal,
}

impl Sequencer {
    pub fn new(
        sprites: Shared<SpriteStore>,
        queues: Shared<QueueStore>,
        timer: Rc<dyn Timer>,
        config: PlaybackConfig,
    ) -> Self {
        Sequencer {
            sprites,
            queues,
            timer,
            config,
            stop: StopSignal::default(),
        }
    }

    /// Share a stop flag that outlives this sequencer
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Handle for stopping the run from outside
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Play every sprite on the stage
    pub async fn play(&self) -> PlaybackReport {
        let ids = self.sprites.borrow().ids();
        self.play_sprites(&ids).await
    }

    /// Play every sprite unless `lock` says a run is already going
    /// - a refused call leaves the stop signal and both stores untouched
    pub async fn play_exclusive(&self, lock: &PlaybackLock) -> Result<PlaybackReport> {
        let Some(_guard) = lock.try_acquire() else {
            bail!("[playback.rs::play_exclusive] playback already running");
        };
        Ok(self.play().await)
    }

    /// Play the given sprites, ids the store does not know are skipped
    pub async fn play_sprites(&self, ids: &[SpriteId]) -> PlaybackReport {
        self.stop.reset();
        let mut slots = self.snapshot(ids);
        let mut report = PlaybackReport::default();
        let mut max_length = longest(&slots, 0..slots.len());
        log::info!(
            "playback start : {} sprites, {} steps",
            slots.len(),
            max_length
        );

        let mut step = 0;
        while step < max_length {
            if self.stop.is_stopped() {
                log::info!("playback stopped before step {}", step);
                report.stopped = true;
                break;
            }

            for slot in slots.iter_mut() {
                let Some(command) = slot.current.get(step).cloned() else {
                    continue;
                };
                self.run_command(slot, &command).await;
            }
            report.steps += 1;

            // every sprite has advanced, only now look at positions
            let collision = match report.swapped {
                None => self.first_collision(&slots),
                Some(_) => None,
            };
            step = match collision {
                Some((a, b)) => {
                    report.swapped = Some(self.swap(&mut slots, a, b));
                    max_length = match self.config.max_length {
                        MaxLengthPolicy::AllSprites => longest(&slots, 0..slots.len()),
                        MaxLengthPolicy::SwappedPair => longest(&slots, [a, b]),
                    };
                    0
                }
                None => step + 1,
            };

            self.timer.sleep(self.config.step_delay_ms).await;
        }

        log::info!(
            "playback done : {} steps, swapped {:?}",
            report.steps,
            report.swapped
        );
        report
    }

    fn snapshot(&self, ids: &[SpriteId]) -> Vec<Slot> {
        let sprites = self.sprites.borrow();
        let queues = self.queues.borrow();
        ids.iter()
            .filter_map(|&id| {
                let Some(sprite) = sprites.get(id) else {
                    log::warn!("{} is not on the stage, skipping", id);
                    return None;
                };
                // owned copy, later swaps never reach back into it
                let original = queues.get(id).to_vec();
                Some(Slot {
                    id,
                    context: sprite.context.clone(),
                    current: original.clone(),
                    original,
                })
            })
            .collect()
    }

    async fn run_command(&self, slot: &mut Slot, command: &Command) {
        match command {
            // one queue slot, `count` timed applications, no collision checks
            Command::Repeat { count, action } => {
                for _ in 0..*count {
                    let patch = apply_command(&slot.context, action);
                    self.commit(slot, &patch);
                    self.timer.sleep(self.config.repeat_delay_ms).await;
                }
            }
            Command::Say { value, duration } | Command::Think { value, duration } => {
                let patch = apply_command(&slot.context, command);
                slot.context = slot.context.clone().apply(&patch);
                let Some(Some(bubble)) = patch.bubble else {
                    return;
                };
                log::debug!("{} shows {:?} '{}'", slot.id, bubble.kind, value);
                let millis = self.config.bubble_millis(*duration);
                if hold_bubble(&self.sprites, self.timer.as_ref(), slot.id, bubble, millis).await {
                    slot.context.bubble = None;
                }
            }
            _ => {
                let patch = apply_command(&slot.context, command);
                self.commit(slot, &patch);
            }
        }
    }

    /// Working copy first, then the observable store
    fn commit(&self, slot: &mut Slot, patch: &SpritePatch) {
        slot.context = slot.context.clone().apply(patch);
        if self.sprites.borrow_mut().update(slot.id, patch).is_none() {
            log::debug!("{} vanished from the store mid run", slot.id);
        }
    }

    fn first_collision(&self, slots: &[Slot]) -> Option<(usize, usize)> {
        (0..slots.len())
            .flat_map(|a| (a + 1..slots.len()).map(move |b| (a, b)))
            .find(|&(a, b)| {
                collides(
                    slots[a].context.position,
                    slots[b].context.position,
                    self.config.footprint,
                )
            })
    }

    /// Cross assign the pre run queues, never the working ones
    fn swap(&self, slots: &mut [Slot], a: usize, b: usize) -> (SpriteId, SpriteId) {
        let (id_a, id_b) = (slots[a].id, slots[b].id);
        log::info!("{} collided with {}, swapping queues", id_a, id_b);
        slots[a].current = slots[b].original.clone();
        slots[b].current = slots[a].original.clone();

        let mut queues = self.queues.borrow_mut();
        queues.replace(id_a, slots[a].current.clone());
        queues.replace(id_b, slots[b].current.clone());
        (id_a, id_b)
    }
}

fn longest(slots: &[Slot], among: impl IntoIterator<Item = usize>) -> usize {
    among
        .into_iter()
        .map(|index| slots[index].current.len())
        .max()
        .unwrap_or(0)
}
