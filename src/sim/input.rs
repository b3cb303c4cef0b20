//! Abstract player input
//!
//! The core never polls devices. It asks an [`InputSource`] for a normalized
//! movement vector and for the state of a few abstract actions. The bevy
//! integration and the headless runner feed it an [`InputFrame`]; the headless
//! runner builds those frames from a [`ScriptedInput`] timeline.

use bevy::math::Vec2;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    Dodge,
    Attack,
    Skill1,
    Skill2,
    Ultimate,
    /// Reload (Tech) or meditate (Magic)
    Reload,
}

/// Read-only view of the current input state.
pub trait InputSource {
    /// Movement direction, already normalized (or zero)
    fn movement(&self) -> Vec2;
    /// Action is held this frame
    fn is_pressed(&self, action: InputAction) -> bool;
    /// Action went down this frame
    fn just_pressed(&self, action: InputAction) -> bool;
    /// Action went up this frame
    fn just_released(&self, action: InputAction) -> bool;
}

type ActionSet = SmallVec<[InputAction; 6]>;

/// One frame of input.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    pub movement: Vec2,
    pub pressed: ActionSet,
    pub just_pressed: ActionSet,
    pub just_released: ActionSet,
}

impl InputFrame {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Frame with movement toward `direction` (normalized here).
    pub fn moving(direction: Vec2) -> Self {
        Self {
            movement: direction.normalize_or_zero(),
            ..Default::default()
        }
    }

    /// Frame in which `action` goes down.
    pub fn pressing(action: InputAction) -> Self {
        let mut frame = Self::default();
        frame.press(action);
        frame
    }

    pub fn press(&mut self, action: InputAction) {
        if !self.pressed.contains(&action) {
            self.pressed.push(action);
        }
        if !self.just_pressed.contains(&action) {
            self.just_pressed.push(action);
        }
    }

    /// Held without an edge this frame.
    pub fn hold(&mut self, action: InputAction) {
        if !self.pressed.contains(&action) {
            self.pressed.push(action);
        }
    }

    pub fn release(&mut self, action: InputAction) {
        self.pressed.retain(|a| *a != action);
        if !self.just_released.contains(&action) {
            self.just_released.push(action);
        }
    }
}

impl InputSource for InputFrame {
    fn movement(&self) -> Vec2 {
        self.movement
    }

    fn is_pressed(&self, action: InputAction) -> bool {
        self.pressed.contains(&action)
    }

    fn just_pressed(&self, action: InputAction) -> bool {
        self.just_pressed.contains(&action)
    }

    fn just_released(&self, action: InputAction) -> bool {
        self.just_released.contains(&action)
    }
}

/// One entry of an input timeline.
///
/// ```json
/// { "at": 0.5, "movement": [1.0, 0.0] }
/// { "at": 1.0, "tap": "Dodge" }
/// { "at": 2.0, "press": "Reload" }
/// { "at": 4.0, "release": "Reload" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputCommand {
    /// Simulation time in seconds at which the command takes effect
    pub at: f32,
    #[serde(default)]
    pub movement: Option<[f32; 2]>,
    #[serde(default)]
    pub press: Option<InputAction>,
    #[serde(default)]
    pub release: Option<InputAction>,
    /// Press for exactly one frame
    #[serde(default)]
    pub tap: Option<InputAction>,
}

/// Replays a sorted list of [`InputCommand`]s as a sequence of frames.
#[derive(Resource, Debug, Clone, Default)]
pub struct ScriptedInput {
    commands: Vec<InputCommand>,
    cursor: usize,
    movement: Vec2,
    held: ActionSet,
    pending_release: ActionSet,
}

impl ScriptedInput {
    pub fn new(mut commands: Vec<InputCommand>) -> Self {
        commands.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            commands,
            ..Default::default()
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.commands.len()
    }

    /// Build the frame for simulation time `now`, consuming every command with `at <= now`.
    pub fn frame_at(&mut self, now: f32) -> InputFrame {
        let mut frame = InputFrame::default();

        for action in self.pending_release.drain(..) {
            frame.just_released.push(action);
        }

        while let Some(command) = self.commands.get(self.cursor) {
            if command.at > now {
                break;
            }
            if let Some([x, y]) = command.movement {
                self.movement = Vec2::new(x, y).normalize_or_zero();
            }
            if let Some(action) = command.press {
                if !self.held.contains(&action) {
                    self.held.push(action);
                }
                frame.just_pressed.push(action);
            }
            if let Some(action) = command.release {
                self.held.retain(|a| *a != action);
                frame.just_released.push(action);
            }
            if let Some(action) = command.tap {
                frame.just_pressed.push(action);
                frame.pressed.push(action);
                self.pending_release.push(action);
            }
            self.cursor += 1;
        }

        frame.movement = self.movement;
        for action in &self.held {
            if !frame.pressed.contains(action) {
                frame.pressed.push(*action);
            }
        }
        frame
    }
}
