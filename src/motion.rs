//! Scripted per-frame motion.
//!
//! Motions mutate a node's pose once per frame, before the frame is drawn.

use glam::Vec3;
use serde::Deserialize;

use crate::scene::SceneNode;

/// A pose update applied once per frame.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Motion {
    /// Constant angular velocity, radians per frame about x, y and z.
    Spin { rate: Vec3 },
    /// Ground vehicle driving along its heading.
    Drive(Crawler),
}

impl Motion {
    pub fn step(&mut self, node: &mut SceneNode) {
        match self {
            Motion::Spin { rate } => node.rotate_by(*rate),
            Motion::Drive(crawler) => crawler.step(node),
        }
    }
}

/// Heading-and-throttle driving on the x/z plane.
///
/// Speed eases toward `target_velocity` by at most `acceleration` per frame; the
/// heading (y rotation) turns by `steering` per frame. Heading 0 drives toward -z.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Crawler {
    pub velocity: f32,
    pub target_velocity: f32,
    pub steering: f32,
    pub acceleration: f32,
}

impl Default for Crawler {
    fn default() -> Self {
        Self {
            velocity: 0.0,
            target_velocity: 0.0,
            steering: 0.0,
            acceleration: 0.001,
        }
    }
}

impl Crawler {
    pub fn new(target_velocity: f32, steering: f32) -> Self {
        Self {
            target_velocity,
            steering,
            ..Default::default()
        }
    }

    pub fn step(&mut self, node: &mut SceneNode) {
        let delta = self.target_velocity - self.velocity;
        self.velocity += delta.clamp(-self.acceleration, self.acceleration);

        node.rotate_by(Vec3::new(0.0, self.steering, 0.0));
        let heading = node.rotation().y;
        node.position.x += heading.sin() * self.velocity;
        node.position.z -= heading.cos() * self.velocity;
    }
}
