use crate::action::{Action, Key, MoveDirection};
use cabinview_common::MovementMode;
use glam::Vec2;

/// Which movement directions are active this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveFlags {
    pub front: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MoveFlags {
    pub fn set(&mut self, dir: MoveDirection, on: bool) {
        match dir {
            MoveDirection::Front => self.front = on,
            MoveDirection::Back => self.back = on,
            MoveDirection::Left => self.left = on,
            MoveDirection::Right => self.right = on,
            MoveDirection::Up => self.up = on,
            MoveDirection::Down => self.down = on,
        }
    }

    pub fn any(&self) -> bool {
        self.front || self.back || self.left || self.right || self.up || self.down
    }

    fn union(self, other: MoveFlags) -> MoveFlags {
        MoveFlags {
            front: self.front || other.front,
            back: self.back || other.back,
            left: self.left || other.left,
            right: self.right || other.right,
            up: self.up || other.up,
            down: self.down || other.down,
        }
    }
}

/// Keyboard event phase as reported by the window backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    /// OS key-repeat while the key stays down.
    Repeated,
    Released,
}

/// Everything the render driver needs from input for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub moves: MoveFlags,
    pub sprint: bool,
    /// Accumulated mouse motion in pixels, x right and y down.
    pub mouse_delta: Vec2,
    /// Discrete actions in the order they were pressed.
    pub actions: Vec<Action>,
}

impl FrameInput {
    pub fn has(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }
}

/// Input accumulated between frames.
///
/// Window callbacks feed events in; the render loop calls
/// [`InputState::take_frame`] once per frame to consume them.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    mode: MovementMode,
    held: MoveFlags,
    latched: MoveFlags,
    sprint: bool,
    mouse_delta: Vec2,
    pending: Vec<Action>,
}

impl InputState {
    pub fn new(mode: MovementMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn key_event(&mut self, key: Key, state: KeyState) {
        let action = key.action();
        if !action.is_continuous() {
            if state == KeyState::Pressed {
                tracing::debug!(?action, "input action");
                self.pending.push(action);
            }
            return;
        }
        let down = state != KeyState::Released;
        match action {
            Action::Move(dir) => {
                self.held.set(dir, down);
                if down {
                    self.latched.set(dir, true);
                }
            }
            Action::Sprint => self.sprint = down,
            _ => {}
        }
    }

    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    /// Drop held keys, e.g. when the window loses focus and release events
    /// will never arrive.
    pub fn clear_held(&mut self) {
        self.held = MoveFlags::default();
        self.sprint = false;
    }

    /// Consume this frame's input, clearing latched flags and mouse motion.
    pub fn take_frame(&mut self) -> FrameInput {
        let moves = match self.mode {
            MovementMode::OneShot => self.latched,
            MovementMode::Held => self.latched.union(self.held),
        };
        self.latched = MoveFlags::default();
        FrameInput {
            moves,
            sprint: self.sprint,
            mouse_delta: std::mem::take(&mut self.mouse_delta),
            actions: std::mem::take(&mut self.pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_flags_clear_after_frame() {
        let mut input = InputState::new(MovementMode::OneShot);
        input.key_event(Key::W, KeyState::Pressed);
        assert!(input.take_frame().moves.front);
        // Key is still down but no new event arrived.
        assert!(!input.take_frame().moves.front);
        input.key_event(Key::W, KeyState::Repeated);
        assert!(input.take_frame().moves.front);
    }

    #[test]
    fn held_flags_persist_until_release() {
        let mut input = InputState::new(MovementMode::Held);
        input.key_event(Key::D, KeyState::Pressed);
        assert!(input.take_frame().moves.right);
        assert!(input.take_frame().moves.right);
        input.key_event(Key::D, KeyState::Released);
        assert!(!input.take_frame().moves.right);
    }

    #[test]
    fn tap_within_one_frame_still_moves() {
        let mut input = InputState::new(MovementMode::Held);
        input.key_event(Key::A, KeyState::Pressed);
        input.key_event(Key::A, KeyState::Released);
        let frame = input.take_frame();
        assert!(frame.moves.left);
        assert!(!input.take_frame().moves.any());
    }

    #[test]
    fn mouse_deltas_accumulate_and_reset() {
        let mut input = InputState::default();
        input.mouse_motion(3.0, -1.0);
        input.mouse_motion(2.0, 4.0);
        assert_eq!(input.take_frame().mouse_delta, Vec2::new(5.0, 3.0));
        assert_eq!(input.take_frame().mouse_delta, Vec2::ZERO);
    }

    #[test]
    fn discrete_actions_fire_once_per_press() {
        let mut input = InputState::default();
        input.key_event(Key::P, KeyState::Pressed);
        input.key_event(Key::P, KeyState::Repeated);
        input.key_event(Key::Q, KeyState::Pressed);
        let frame = input.take_frame();
        assert_eq!(frame.actions, vec![Action::ToggleWireframe, Action::Quit]);
        assert!(frame.has(Action::Quit));
        assert!(input.take_frame().actions.is_empty());
    }

    #[test]
    fn sprint_tracks_key_state() {
        let mut input = InputState::default();
        input.key_event(Key::LeftCtrl, KeyState::Pressed);
        assert!(input.take_frame().sprint);
        input.key_event(Key::LeftCtrl, KeyState::Released);
        assert!(!input.take_frame().sprint);
    }

    #[test]
    fn space_and_shift_fly_up_and_down() {
        let mut input = InputState::new(MovementMode::Held);
        input.key_event(Key::Space, KeyState::Pressed);
        let frame = input.take_frame();
        assert!(frame.moves.up && !frame.moves.down);
        input.key_event(Key::Space, KeyState::Released);
        input.key_event(Key::LeftShift, KeyState::Pressed);
        let frame = input.take_frame();
        assert!(frame.moves.down && !frame.moves.up);
        assert!(frame.actions.is_empty());
    }

    #[test]
    fn clear_held_drops_stuck_keys() {
        let mut input = InputState::new(MovementMode::Held);
        input.key_event(Key::S, KeyState::Pressed);
        input.take_frame();
        input.clear_held();
        assert!(!input.take_frame().moves.back);
    }
}
