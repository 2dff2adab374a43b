//! A simple native host loop
//! feeding an engine with timestamps from a monotonic clock.

use crate::registry::DynEngine;
use backdrop_core::{EngineError, Surface, Tick};
use std::time::Duration;
use web_time::Instant;

/// How long to sleep when no frame is due yet.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Counts of tick outcomes over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames produced and presented.
    pub presented: usize,
    /// Frames produced but rejected by the surface.
    pub dropped: usize,
    /// Ticks that came too early for a frame.
    pub skipped: usize,
}

impl FrameStats {
    fn record(&mut self, tick: Tick) {
        match tick {
            Tick::Presented => self.presented += 1,
            Tick::Dropped => self.dropped += 1,
            Tick::Skipped => self.skipped += 1,
            Tick::Inactive => {}
        }
    }
}

/// Drives an initialized engine in real time.
///
/// Time is measured in milliseconds from when the player was created.
pub struct Player<S: Surface> {
    engine: Box<dyn DynEngine<S>>,
    epoch: Instant,
}

impl<S: Surface> Player<S> {
    /// Wrap an engine.
    pub fn new(engine: Box<dyn DynEngine<S>>) -> Self {
        Self {
            engine,
            epoch: Instant::now(),
        }
    }

    /// Milliseconds since the player was created.
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Start the engine at the current time.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let now = self.now();
        self.engine.start(now)
    }

    /// Tick the engine once at the current time.
    pub fn frame(&mut self) -> Result<Tick, EngineError> {
        let now = self.now();
        self.engine.tick(now)
    }

    /// Tick repeatedly for `duration`, sleeping briefly between frames.
    ///
    /// Returns early if the engine stops running.
    pub fn run_for(&mut self, duration: Duration) -> Result<FrameStats, EngineError> {
        let mut stats = FrameStats::default();
        let end = Instant::now() + duration;
        while Instant::now() < end {
            let tick = self.frame()?;
            stats.record(tick);
            match tick {
                Tick::Inactive => break,
                Tick::Skipped => std::thread::sleep(IDLE_SLEEP),
                Tick::Presented | Tick::Dropped => {}
            }
        }
        log::debug!(
            "{}: ran for {duration:?}, {} frames presented, {} dropped",
            self.engine.kind(),
            stats.presented,
            stats.dropped
        );
        Ok(stats)
    }

    /// The engine being driven.
    pub fn engine(&self) -> &dyn DynEngine<S> {
        &*self.engine
    }

    /// The engine being driven, mutably.
    pub fn engine_mut(&mut self) -> &mut dyn DynEngine<S> {
        &mut *self.engine
    }

    /// Give back the engine.
    pub fn into_engine(self) -> Box<dyn DynEngine<S>> {
        self.engine
    }
}
