use std::{cell::RefCell, rc::Rc, time::Duration};

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use super::window::{MAX_ZOOM, MIN_ZOOM, VisibleWindow, VisibleWindowCache};
use crate::config::EngineConfig;
use crate::telemetry::ProcessedLapData;

pub const MIN_SPEED: f64 = -5.;
pub const MAX_SPEED: f64 = 5.;

/// Snapshot of the playback state machine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Fractional sample index into the reference lap. Floor it before indexing.
    pub position: f64,
    pub is_playing: bool,
    pub speed: f64,
    pub zoom_level: u8,
}

/// What playback needs to know about the lap that defines the x axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceLap {
    pub total_points: usize,
    /// Lap duration when the lap metadata knows it
    pub lap_time_s: Option<f64>,
}

impl ReferenceLap {
    pub fn new(total_points: usize, lap_time_s: Option<f64>) -> Self {
        Self {
            total_points,
            lap_time_s,
        }
    }

    pub fn from_lap(lap: &ProcessedLapData, lap_time_s: Option<f64>) -> Self {
        Self::new(lap.total_points(), lap_time_s)
    }
}

/// Samples advanced per tick at speed 1.
///
/// With a known lap time this plays the lap in real time; otherwise it falls back
/// to `nominal`.
pub fn samples_per_tick(reference: &ReferenceLap, tick_interval: Duration, nominal: f64) -> f64 {
    match reference
        .lap_time_s
        .filter(|lap_time| lap_time.is_finite() && *lap_time > 0.)
    {
        Some(lap_time) if reference.total_points > 0 && !tick_interval.is_zero() => {
            let samples_per_second = reference.total_points as f64 / lap_time;
            let frames_per_second = 1. / tick_interval.as_secs_f64();
            samples_per_second / frames_per_second
        }
        _ => nominal,
    }
}

/// Moves `position` by `advancement`, looping at both ends of the lap.
///
/// Running past the last sample restarts at 0; running backwards past 0 restarts
/// at the last sample.
pub fn next_position(position: f64, advancement: f64, total_points: usize) -> f64 {
    if total_points == 0 {
        return 0.;
    }
    let last_index = (total_points - 1) as f64;
    let next = position + advancement;
    if next > last_index {
        0.
    } else if next < 0. {
        last_index
    } else {
        next
    }
}

/// The synchronous half of playback: state, transitions and the tick itself.
///
/// Every ticker gets an epoch when it starts. Stopping or restarting moves the
/// epoch on, so a tick from a cancelled ticker never mutates the position.
/// The deadline of the next tick survives a restart, so a replacement ticker
/// keeps the phase of the one it replaces.
#[derive(Debug)]
pub struct PlaybackEngine {
    state: PlaybackState,
    reference: Option<ReferenceLap>,
    tick_interval: Duration,
    nominal_samples_per_tick: f64,
    windows: VisibleWindowCache,
    tick_epoch: u64,
    next_tick_at: Option<Instant>,
}

impl PlaybackEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let config = config.clone().sanitized();
        Self {
            state: PlaybackState {
                position: 0.,
                is_playing: false,
                speed: config.default_speed,
                zoom_level: config.default_zoom,
            },
            reference: None,
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            nominal_samples_per_tick: config.nominal_samples_per_tick,
            windows: VisibleWindowCache::new(config.min_visible_points),
            tick_epoch: 0,
            next_tick_at: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn reference(&self) -> Option<ReferenceLap> {
        self.reference
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Replaces the reference lap. Clearing it stops playback; a position past
    /// the end of the new lap goes back to the start.
    pub fn set_reference(&mut self, reference: Option<ReferenceLap>) {
        match reference {
            Some(lap) if lap.total_points > 0 => {
                if self.state.position >= lap.total_points as f64 {
                    self.state.position = 0.;
                }
                self.reference = Some(lap);
            }
            _ => {
                self.stop();
                self.state.position = 0.;
                self.reference = None;
            }
        }
        self.windows.invalidate();
    }

    /// Returns `true` when playback went from stopped to playing.
    pub fn start(&mut self) -> bool {
        if self.state.is_playing || self.reference.is_none() {
            return false;
        }
        debug!("Playback started at position {}", self.state.position);
        self.state.is_playing = true;
        true
    }

    pub fn stop(&mut self) {
        if self.state.is_playing {
            debug!("Playback stopped at position {}", self.state.position);
        }
        self.state.is_playing = false;
        self.tick_epoch += 1;
        self.next_tick_at = None;
    }

    pub fn reset(&mut self) {
        self.stop();
        self.state.position = 0.;
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.state.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
    }

    pub fn set_zoom(&mut self, zoom_level: u8) {
        self.state.zoom_level = zoom_level.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Jumps to `position`, clamped to the reference lap.
    pub fn seek(&mut self, position: f64) {
        let last_index = match self.reference {
            Some(lap) => (lap.total_points - 1) as f64,
            None => 0.,
        };
        self.state.position = if position.is_nan() {
            0.
        } else {
            position.clamp(0., last_index)
        };
    }

    /// Position change per tick at the current speed.
    pub fn advancement(&self) -> f64 {
        match self.reference {
            Some(lap) => {
                samples_per_tick(&lap, self.tick_interval, self.nominal_samples_per_tick)
                    * self.state.speed
            }
            None => 0.,
        }
    }

    /// Retires all running tickers and returns the epoch for a new one.
    pub fn begin_ticking(&mut self) -> u64 {
        self.tick_epoch += 1;
        self.tick_epoch
    }

    /// When the next tick is due. A pending deadline is kept; otherwise the
    /// next tick is one interval from `now`.
    pub fn next_tick_at(&mut self, now: Instant) -> Instant {
        let at = match self.next_tick_at {
            Some(at) if at >= now => at,
            _ => now + self.tick_interval,
        };
        self.next_tick_at = Some(at);
        at
    }

    /// Advances one tick. Returns `false` when the ticker with `epoch` must quit.
    pub fn tick(&mut self, epoch: u64) -> bool {
        if epoch != self.tick_epoch || !self.state.is_playing {
            return false;
        }
        let Some(lap) = self.reference else {
            self.stop();
            return false;
        };
        self.state.position = next_position(self.state.position, self.advancement(), lap.total_points);
        true
    }

    pub fn visible_window(&mut self) -> Option<VisibleWindow> {
        let lap = self.reference?;
        self.windows
            .window(lap.total_points, self.state.position, self.state.zoom_level)
    }
}

async fn run_ticker(
    engine: Rc<RefCell<PlaybackEngine>>,
    epoch: u64,
    start: Instant,
    period: Duration,
) {
    let mut ticks = time::interval_at(start, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        let deadline = ticks.tick().await;
        let mut playback = engine.borrow_mut();
        if !playback.tick(epoch) {
            break;
        }
        playback.next_tick_at = Some(deadline + period);
    }
}

/// Timer driven playback over a reference lap.
///
/// Runs on the current thread: the ticker is a local task, so the controller must
/// be driven from inside a `tokio::task::LocalSet`. At most one ticker is alive at
/// any time; speed and zoom changes while playing replace it at the new rate
/// without moving the next tick.
pub struct PlaybackController {
    engine: Rc<RefCell<PlaybackEngine>>,
    ticker: Option<JoinHandle<()>>,
}

impl PlaybackController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            engine: Rc::new(RefCell::new(PlaybackEngine::new(config))),
            ticker: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.engine.borrow().state()
    }

    pub fn reference(&self) -> Option<ReferenceLap> {
        self.engine.borrow().reference()
    }

    pub fn visible_window(&self) -> Option<VisibleWindow> {
        self.engine.borrow_mut().visible_window()
    }

    pub fn set_reference(&mut self, reference: Option<ReferenceLap>) {
        self.engine.borrow_mut().set_reference(reference);
        if !self.state().is_playing {
            self.cancel_ticker();
        }
    }

    /// Starts playing. Does nothing without a reference lap or when already playing.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `LocalSet`.
    pub fn start_playback(&mut self) {
        let started = self.engine.borrow_mut().start();
        if started {
            self.restart_ticker();
        }
    }

    pub fn stop_playback(&mut self) {
        self.engine.borrow_mut().stop();
        self.cancel_ticker();
    }

    pub fn reset_playback(&mut self) {
        self.engine.borrow_mut().reset();
        self.cancel_ticker();
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.engine.borrow_mut().set_speed(speed);
        if self.state().is_playing {
            self.restart_ticker();
        }
    }

    pub fn set_zoom(&mut self, zoom_level: u8) {
        self.engine.borrow_mut().set_zoom(zoom_level);
        if self.state().is_playing {
            self.restart_ticker();
        }
    }

    pub fn seek(&mut self, position: f64) {
        self.engine.borrow_mut().seek(position);
    }

    /// Whether a ticker task is currently scheduled.
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    fn restart_ticker(&mut self) {
        self.cancel_ticker();
        let (epoch, start, period) = {
            let mut engine = self.engine.borrow_mut();
            let start = engine.next_tick_at(Instant::now());
            (engine.begin_ticking(), start, engine.tick_interval())
        };
        debug!("Starting playback ticker {} every {:?}", epoch, period);
        self.ticker = Some(tokio::task::spawn_local(run_ticker(
            Rc::clone(&self.engine),
            epoch,
            start,
            period,
        )));
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
