/// Direction of a camera translation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Front,
    Back,
    Left,
    Right,
    Up,
    Down,
}

/// A high-level action produced by the keyboard.
///
/// The render driver consumes actions, never raw key codes, so the window
/// backend can change without touching camera logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Translate the camera.
    Move(MoveDirection),
    /// Multiply camera speed while held.
    Sprint,
    /// Request shutdown.
    Quit,
    /// Switch between filled and wireframe polygons.
    ToggleWireframe,
    /// Switch between free and ground-locked camera.
    ToggleCameraMode,
    /// Show or hide the on-screen HUD.
    ToggleHud,
    /// Release the cursor grab.
    ReleaseCursor,
}

impl Action {
    /// Continuous actions are tracked while held; the rest fire once per press.
    pub fn is_continuous(self) -> bool {
        matches!(self, Action::Move(_) | Action::Sprint)
    }
}

/// Backend-independent key identifiers for the keys the viewer binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    P,
    C,
    F1,
    Escape,
    LeftCtrl,
    Space,
    LeftShift,
}

impl Key {
    /// The action bound to this key.
    pub fn action(self) -> Action {
        match self {
            Key::W => Action::Move(MoveDirection::Front),
            Key::S => Action::Move(MoveDirection::Back),
            Key::A => Action::Move(MoveDirection::Left),
            Key::D => Action::Move(MoveDirection::Right),
            Key::Q => Action::Quit,
            Key::P => Action::ToggleWireframe,
            Key::C => Action::ToggleCameraMode,
            Key::F1 => Action::ToggleHud,
            Key::Escape => Action::ReleaseCursor,
            Key::LeftCtrl => Action::Sprint,
            Key::Space => Action::Move(MoveDirection::Up),
            Key::LeftShift => Action::Move(MoveDirection::Down),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_maps_to_moves() {
        assert_eq!(Key::W.action(), Action::Move(MoveDirection::Front));
        assert_eq!(Key::A.action(), Action::Move(MoveDirection::Left));
        assert_eq!(Key::S.action(), Action::Move(MoveDirection::Back));
        assert_eq!(Key::D.action(), Action::Move(MoveDirection::Right));
        assert_eq!(Key::Space.action(), Action::Move(MoveDirection::Up));
        assert_eq!(Key::LeftShift.action(), Action::Move(MoveDirection::Down));
    }

    #[test]
    fn control_keys() {
        assert_eq!(Key::Q.action(), Action::Quit);
        assert_eq!(Key::P.action(), Action::ToggleWireframe);
        assert!(!Action::Quit.is_continuous());
        assert!(Action::Sprint.is_continuous());
    }
}
