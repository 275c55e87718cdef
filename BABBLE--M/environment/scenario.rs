use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::objects::Point;

/// Area from which an object position is drawn between trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Uniform pick among the three rings.
    AnyRing,
    /// Disk of radius 1, within the hand's reach.
    Near,
    /// Annulus between radius 1 and 1.5, reachable with the tool.
    Middle,
    /// Annulus between radius 1.5 and 2, out of reach.
    Far,
    /// Uniform over the `[-2, 2]` square.
    Square,
}

/// Draws positions for toys and the caregiver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioGenerator;

impl ScenarioGenerator {
    /// Samples a point in `region`.
    pub fn sample<R: Rng + ?Sized>(self, region: Region, rng: &mut R) -> Point {
        match region {
            Region::AnyRing => {
                let ring = match rng.gen_range(0..3) {
                    0 => Region::Near,
                    1 => Region::Middle,
                    _ => Region::Far,
                };
                self.sample(ring, rng)
            }
            Region::Near => polar(rng, 0.0, 1.0),
            Region::Middle => polar(rng, 1.0, 0.5),
            Region::Far => polar(rng, 1.5, 0.5),
            Region::Square => Point::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0)),
        }
    }

    /// Position for a re-placed toy.
    pub fn toy<R: Rng + ?Sized>(self, rng: &mut R) -> Point {
        self.sample(Region::AnyRing, rng)
    }

    /// Position for the caregiver.
    pub fn caregiver<R: Rng + ?Sized>(self, rng: &mut R) -> Point {
        self.sample(Region::Square, rng)
    }

    /// Handle position and angle for a re-placed tool.
    pub fn tool<R: Rng + ?Sized>(self, rng: &mut R) -> (Point, f64) {
        (self.sample(Region::Near, rng), rng.gen::<f64>())
    }
}

fn polar<R: Rng + ?Sized>(rng: &mut R, inner: f64, width: f64) -> Point {
    let alpha = 2.0 * PI * rng.gen::<f64>();
    let radius = inner + width * rng.gen::<f64>();
    Point::new(radius * alpha.cos(), radius * alpha.sin())
}
