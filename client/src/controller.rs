//! Local entity controller: turns held keys into collision-checked moves and
//! streams the resulting position to the server.

use crate::input::{Direction, HeldKeys};
use crate::world::SharedWorld;
use log::debug;
use shared::{is_blocked, Canvas, ClientId, PositionRecord, Vec2, ENTITY_RADIUS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Destination for outbound position records. Submitting never blocks and
/// never reports failure back to the controller.
pub trait PositionSink {
    fn submit(&mut self, record: &PositionRecord);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Moving(HeldKeys),
}

pub struct Controller<S> {
    id: ClientId,
    world: Arc<SharedWorld>,
    sink: S,
    speed: f32,
    state: ControllerState,
}

impl<S: PositionSink> Controller<S> {
    pub fn new(id: ClientId, world: Arc<SharedWorld>, sink: S, speed: f32) -> Self {
        Self {
            id,
            world,
            sink,
            speed,
            state: ControllerState::Idle,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Sends the current position without moving
    pub fn announce(&mut self) {
        let record = PositionRecord::new(self.id.clone(), self.world.local_position());
        self.sink.submit(&record);
    }

    /// One polling step. Every held direction is tried in turn against the
    /// position left by the previous one; a single record carrying the final
    /// position is sent whenever any direction was held.
    pub fn tick(&mut self) -> ControllerState {
        let held = self.world.keys().snapshot();
        if held.is_empty() {
            self.state = ControllerState::Idle;
            return self.state;
        }
        self.state = ControllerState::Moving(held);

        let canvas = self.world.canvas();
        let start = self.world.local_position();
        let position = self.world.with_walls(|walls| {
            held.iter().fold(start, |position, direction| {
                if !within_extent(direction, position, canvas) {
                    return position;
                }
                let candidate = position + direction.step() * self.speed;
                if is_blocked(candidate, walls, canvas) {
                    debug!("Move {:?} to {:?} blocked", direction, candidate);
                    position
                } else {
                    candidate
                }
            })
        });

        if position != start {
            self.world.set_local_position(position);
        }
        self.sink
            .submit(&PositionRecord::new(self.id.clone(), position));

        self.state
    }
}

/// Guard applied before proposing a move: the entity may not start a step
/// from beyond the top/left edge, nor push its drawn extent past the
/// bottom/right edge.
fn within_extent(direction: Direction, position: Vec2, canvas: Canvas) -> bool {
    let extent = ENTITY_RADIUS * 2.0;
    match direction {
        Direction::Up => position.y >= 0.0,
        Direction::Left => position.x >= 0.0,
        Direction::Down => position.y + extent < canvas.height,
        Direction::Right => position.x + extent < canvas.width,
    }
}

/// Drives the controller at a fixed cadence until shutdown is signalled
pub async fn run_controller<S: PositionSink>(
    mut controller: Controller<S>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Controller<S> {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                controller.tick();
            }
        }
    }

    debug!("Controller stopped");
    controller
}
