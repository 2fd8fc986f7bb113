//! # Autoplay Driver
//!
//! [`WalkthroughPlayer`] wraps a [`WalkthroughController`] and owns the one
//! background task in the crate: a `tokio::time::interval` loop that calls
//! [`WalkthroughController::tick`] while autoplay is on.
//!
//! ## Lifecycle
//!
//! ```text
//! toggle_play() on   → spawn ticker (first tick after one full interval)
//! toggle_play() off  → abort ticker
//! drop(player)       → abort ticker
//! ```
//!
//! Manual navigation is not locked out while playing. A click and a tick
//! that land together both go through the same mutex; whichever runs second
//! wins.
//!
//! Every visible change is published as a [`WalkthroughEvent`] on a
//! broadcast channel. Sends with no subscribers are dropped silently.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::controller::{WalkthroughController, WalkthroughState};
use super::steps::Step;

/// Channel capacity for walkthrough events. A listener that falls further
/// behind than this just sees a `Lagged` error and resyncs from `state()`.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalkthroughEvent {
    StepChanged { index: usize },
    PlaybackChanged { playing: bool },
}

pub struct WalkthroughPlayer {
    controller: Arc<Mutex<WalkthroughController>>,
    interval: Duration,
    events: broadcast::Sender<WalkthroughEvent>,
    ticker: Option<JoinHandle<()>>,
}

impl WalkthroughPlayer {
    pub fn new(controller: WalkthroughController, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            controller: Arc::new(Mutex::new(controller)),
            interval,
            events,
            ticker: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalkthroughEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> WalkthroughState {
        self.controller.lock().state()
    }

    pub fn active_step(&self) -> Step {
        self.controller.lock().active_step().clone()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.controller.lock().steps().to_vec()
    }

    pub fn is_playing(&self) -> bool {
        self.controller.lock().is_playing()
    }

    pub fn set_active(&self, index: usize) -> bool {
        let (changed, index) = {
            let mut controller = self.controller.lock();
            (controller.set_active(index), controller.active_index())
        };
        self.publish_step(changed, index);
        changed
    }

    pub fn next(&self) -> bool {
        let (changed, index) = {
            let mut controller = self.controller.lock();
            (controller.next(), controller.active_index())
        };
        self.publish_step(changed, index);
        changed
    }

    pub fn prev(&self) -> bool {
        let (changed, index) = {
            let mut controller = self.controller.lock();
            (controller.prev(), controller.active_index())
        };
        self.publish_step(changed, index);
        changed
    }

    /// Flip autoplay, starting or stopping the ticker. Must be called from
    /// inside a tokio runtime. Returns the new value.
    pub fn toggle_play(&mut self) -> bool {
        let playing = self.controller.lock().toggle_play();
        if playing {
            self.start_ticker();
        } else {
            self.stop_ticker();
        }
        let _ = self.events.send(WalkthroughEvent::PlaybackChanged { playing });
        info!(playing, "walkthrough autoplay toggled");
        playing
    }

    /// Stop autoplay if it is running.
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.toggle_play();
        }
    }

    /// `index` must be read under the same lock as the move, or a tick
    /// landing in between gets published twice.
    fn publish_step(&self, changed: bool, index: usize) {
        if changed {
            let _ = self.events.send(WalkthroughEvent::StepChanged { index });
        }
    }

    fn start_ticker(&mut self) {
        self.stop_ticker();

        let controller = Arc::clone(&self.controller);
        let events = self.events.clone();
        let period = self.interval;

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let moved = controller.lock().tick();
                match moved {
                    Some(index) => {
                        debug!(index, "autoplay advanced");
                        let _ = events.send(WalkthroughEvent::StepChanged { index });
                    }
                    None => break,
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for WalkthroughPlayer {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
