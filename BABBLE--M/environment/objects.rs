use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Point in the 2D play area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance.
    #[must_use]
    pub fn distance_sq(self, other: Self) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    /// Point halfway between the origin and `self`.
    #[must_use]
    pub fn halfway_from_origin(self) -> Self {
        Self::new(self.x / 2.0, self.y / 2.0)
    }
}

/// Whether the stick is in the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolGrip {
    /// Lying in the play area.
    #[default]
    Free,
    /// Grasped by its handle.
    Held,
}

/// Stick with a handle and a working end `length` away along its orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Handle position.
    pub position: Point,
    /// Orientation in units of pi, in `[-1, 1)`.
    pub angle: f64,
    /// Grip state.
    pub grip: ToolGrip,
    length: f64,
}

impl Tool {
    /// Creates a free tool.
    #[must_use]
    pub const fn new(position: Point, angle: f64, length: f64) -> Self {
        Self {
            position,
            angle,
            grip: ToolGrip::Free,
            length,
        }
    }

    /// Handle position.
    #[must_use]
    pub const fn handle(&self) -> Point {
        self.position
    }

    /// Working-end position.
    #[must_use]
    pub fn working_end(&self) -> Point {
        let a = PI * self.angle;
        Point::new(
            self.position.x + a.cos() * self.length,
            self.position.y + a.sin() * self.length,
        )
    }

    /// True while grasped.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.grip == ToolGrip::Held
    }
}

/// Attachment of the toy within a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToyState {
    /// Resting in the play area.
    #[default]
    Free,
    /// Carried by the hand.
    HeldByHand,
    /// Carried by the tool's working end.
    HeldByTool,
}

/// Object the agent can reach, directly or with the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toy {
    /// Position.
    pub position: Point,
    /// Attachment state.
    pub state: ToyState,
}

impl Toy {
    /// Creates a free toy.
    #[must_use]
    pub const fn new(position: Point) -> Self {
        Self {
            position,
            state: ToyState::Free,
        }
    }
}

/// Simulated parent who names objects and hands them over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caregiver {
    /// Position.
    pub position: Point,
}

impl Caregiver {
    /// Creates a caregiver.
    #[must_use]
    pub const fn new(position: Point) -> Self {
        Self { position }
    }

    /// Moves the toy a fraction `factor` of the way towards the point halfway
    /// between the agent and the caregiver.
    pub fn bring_closer(&self, toy: &mut Toy, factor: f64) {
        let target = self.position.halfway_from_origin();
        toy.position.x += factor * (target.x - toy.position.x);
        toy.position.y += factor * (target.y - toy.position.y);
    }
}
