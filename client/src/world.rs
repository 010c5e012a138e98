//! State shared between the render loop, the controller task and the receive task

use crate::input::KeyState;
use shared::{Canvas, Vec2, Wall};
use std::sync::{Mutex, PoisonError, RwLock};

/// Positions received since the last render frame.
///
/// Appended to by the receive task; the render loop takes the whole batch
/// each frame, so a remote update is visible for exactly one frame.
#[derive(Debug, Default)]
pub struct RemoteBuffer {
    positions: Mutex<Vec<Vec2>>,
}

impl RemoteBuffer {
    pub fn push(&self, position: Vec2) {
        self.positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(position);
    }

    /// Snapshot and clear under a single lock acquisition
    pub fn drain(&self) -> Vec<Vec2> {
        std::mem::take(&mut *self.positions.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the client's tasks share, passed around behind one `Arc`
#[derive(Debug)]
pub struct SharedWorld {
    canvas: Canvas,
    local: Mutex<Vec2>,
    remote: RemoteBuffer,
    walls: RwLock<Vec<Wall>>,
    keys: KeyState,
}

impl SharedWorld {
    /// The local entity starts at the canvas centre
    pub fn new(canvas: Canvas) -> Self {
        Self::with_spawn(canvas, canvas.center())
    }

    pub fn with_spawn(canvas: Canvas, spawn: Vec2) -> Self {
        Self {
            canvas,
            local: Mutex::new(spawn),
            remote: RemoteBuffer::default(),
            walls: RwLock::new(Vec::new()),
            keys: KeyState::default(),
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn local_position(&self) -> Vec2 {
        *self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_local_position(&self, position: Vec2) {
        *self.local.lock().unwrap_or_else(PoisonError::into_inner) = position;
    }

    pub fn remote(&self) -> &RemoteBuffer {
        &self.remote
    }

    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    /// Runs `f` with read access to the walls; the lock is held for the whole call
    pub fn with_walls<R>(&self, f: impl FnOnce(&[Wall]) -> R) -> R {
        let walls = self.walls.read().unwrap_or_else(PoisonError::into_inner);
        f(&walls)
    }

    pub fn add_wall(&self, wall: Wall) {
        self.walls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(wall);
    }

    pub fn remove_last_wall(&self) -> Option<Wall> {
        self.walls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }

    pub fn clear_walls(&self) {
        self.walls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn wall_count(&self) -> usize {
        self.with_walls(|walls| walls.len())
    }
}
