//! Directional input handed from the render thread to the controller task

use shared::{Vec2, Wall};
use std::sync::atomic::{AtomicU8, Ordering};

/// One of the four movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Evaluation order within a controller tick
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    /// Unit step in canvas space (y grows downwards)
    pub fn step(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    fn bit(self) -> u8 {
        match self {
            Direction::Up => 0b0001,
            Direction::Left => 0b0010,
            Direction::Down => 0b0100,
            Direction::Right => 0b1000,
        }
    }
}

/// The set of directions held during one sample. Directions are independent,
/// so opposite keys may both be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeldKeys(u8);

impl HeldKeys {
    pub const NONE: HeldKeys = HeldKeys(0);

    pub fn with(self, direction: Direction) -> Self {
        HeldKeys(self.0 | direction.bit())
    }

    pub fn contains(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

impl FromIterator<Direction> for HeldKeys {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter().fold(HeldKeys::NONE, HeldKeys::with)
    }
}

/// Latest key sample, published by the render thread and read by the controller.
#[derive(Debug, Default)]
pub struct KeyState {
    bits: AtomicU8,
}

impl KeyState {
    pub fn publish(&self, held: HeldKeys) {
        self.bits.store(held.0, Ordering::Release);
    }

    pub fn snapshot(&self) -> HeldKeys {
        HeldKeys(self.bits.load(Ordering::Acquire))
    }
}

/// Two-click wall drawing gesture: the first click anchors, the second completes the wall
#[derive(Debug, Default)]
pub struct WallDraft {
    anchor: Option<Vec2>,
}

impl WallDraft {
    pub fn click(&mut self, point: Vec2) -> Option<Wall> {
        match self.anchor.take() {
            Some(start) => Some(Wall::segment(start, point)),
            None => {
                self.anchor = Some(point);
                None
            }
        }
    }

    pub fn anchor(&self) -> Option<Vec2> {
        self.anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_keys_are_independent() {
        let held: HeldKeys = [Direction::Up, Direction::Down].into_iter().collect();

        assert!(held.contains(Direction::Up));
        assert!(held.contains(Direction::Down));
        assert!(!held.contains(Direction::Left));
        assert_eq!(held.iter().collect::<Vec<_>>(), vec![Direction::Up, Direction::Down]);
        assert!(HeldKeys::NONE.is_empty());
    }

    #[test]
    fn test_key_state_publish_snapshot() {
        let keys = KeyState::default();
        assert!(keys.snapshot().is_empty());

        let held = HeldKeys::NONE.with(Direction::Right);
        keys.publish(held);
        assert_eq!(keys.snapshot(), held);
    }

    #[test]
    fn test_wall_draft_needs_two_clicks() {
        let mut draft = WallDraft::default();

        assert!(draft.click(Vec2::new(1.0, 2.0)).is_none());
        assert_eq!(draft.anchor(), Some(Vec2::new(1.0, 2.0)));

        let wall = draft.click(Vec2::new(3.0, 4.0)).unwrap();
        assert_eq!(wall.points(), &[Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]);
        assert!(draft.anchor().is_none());
    }
}
