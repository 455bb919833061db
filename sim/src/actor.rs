//! Scripted street actors (vehicles, pedestrians) and their motion.
//!
//! Each actor has a true pixel position, a velocity in px/s, a box size and
//! a `MotionSpec` describing how it moves. The simulator steps actors
//! forward in time.

use serde::{Deserialize, Serialize};

/// Describes actor motion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MotionSpec {
    /// Does not move.
    Stationary,
    /// Constant velocity from the initial state.
    ConstantVelocity,
    /// Head toward each `(t, x, y)` waypoint in turn at `speed` px/s, then stop.
    Waypoints { waypoints: Vec<[f64; 3]>, speed: f64 },
    /// Switch velocity at given times: `(t_start, [vx, vy])`, sorted by time.
    Segmented { segments: Vec<(f64, [f64; 2])> },
}

/// A simulated road user with ground-truth state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    /// Unique actor ID
    pub id: u64,
    /// Detector label the actor shows up as ("car", "person", ...)
    pub label: String,
    /// True centre [x, y] in pixels
    pub position: [f64; 2],
    /// Velocity [vx, vy] in px/s
    pub velocity: [f64; 2],
    /// Box width and height in pixels
    pub size: [f64; 2],
    pub motion: MotionSpec,
    /// Optional: actor appears after this time
    pub appear_at: Option<f64>,
    /// Optional: actor leaves at this time
    pub disappear_at: Option<f64>,
}

impl Actor {
    pub fn new(id: u64, label: &str, position: [f64; 2], size: [f64; 2], motion: MotionSpec) -> Self {
        Self {
            id,
            label: label.to_string(),
            position,
            velocity: [0.0, 0.0],
            size,
            motion,
            appear_at: None,
            disappear_at: None,
        }
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.velocity = [vx, vy];
        self
    }

    pub fn active_between(mut self, appear_at: Option<f64>, disappear_at: Option<f64>) -> Self {
        self.appear_at = appear_at;
        self.disappear_at = disappear_at;
        self
    }

    /// Propagate the true position by `dt` seconds at simulation time `t`.
    pub fn step(&mut self, t: f64, dt: f64) {
        match &self.motion {
            MotionSpec::Stationary => {
                self.velocity = [0.0, 0.0];
            }
            MotionSpec::ConstantVelocity => {}
            MotionSpec::Waypoints { waypoints, speed } => {
                let next = waypoints.iter().find(|wp| wp[0] >= t);
                self.velocity = match next {
                    Some(wp) => {
                        let dx = wp[1] - self.position[0];
                        let dy = wp[2] - self.position[1];
                        let dist = (dx * dx + dy * dy).sqrt();
                        if dist > 1.0 {
                            [speed * dx / dist, speed * dy / dist]
                        } else {
                            [0.0, 0.0]
                        }
                    }
                    None => [0.0, 0.0],
                };
            }
            MotionSpec::Segmented { segments } => {
                if let Some((_, v)) = segments.iter().filter(|(t_start, _)| *t_start <= t).last() {
                    self.velocity = *v;
                }
            }
        }
        self.position[0] += self.velocity[0] * dt;
        self.position[1] += self.velocity[1] * dt;
    }

    /// True if the actor is on screen at time `t`.
    pub fn is_active(&self, t: f64) -> bool {
        if let Some(appear) = self.appear_at {
            if t < appear {
                return false;
            }
        }
        if let Some(disappear) = self.disappear_at {
            if t >= disappear {
                return false;
            }
        }
        true
    }

    /// True box [x1, y1, x2, y2].
    pub fn bbox(&self) -> [f64; 4] {
        let [cx, cy] = self.position;
        let [w, h] = self.size;
        [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segmented_actor_parks() {
        let mut car = Actor::new(
            0,
            "car",
            [0.0, 100.0],
            [80.0, 40.0],
            MotionSpec::Segmented {
                segments: vec![(0.0, [50.0, 0.0]), (2.0, [0.0, 0.0])],
            },
        );
        let dt = 0.5;
        for k in 0..8 {
            car.step(k as f64 * dt, dt);
        }
        // four 0.5s steps at 50 px/s before t = 2.0, then stopped
        assert_eq!(car.position, [100.0, 100.0]);
    }

    #[test]
    fn waypoint_actor_stops_on_arrival() {
        let mut p = Actor::new(
            1,
            "person",
            [0.0, 0.0],
            [20.0, 50.0],
            MotionSpec::Waypoints {
                waypoints: vec![[100.0, 30.0, 40.0]],
                speed: 10.0,
            },
        );
        for k in 0..100 {
            p.step(k as f64 * 0.1, 0.1);
        }
        let [x, y] = p.position;
        assert!(((x - 30.0).powi(2) + (y - 40.0).powi(2)).sqrt() <= 1.0);
    }

    #[test]
    fn activity_window() {
        let a = Actor::new(0, "car", [0.0, 0.0], [1.0, 1.0], MotionSpec::Stationary)
            .active_between(Some(1.0), Some(3.0));
        assert!(!a.is_active(0.5));
        assert!(a.is_active(1.0));
        assert!(!a.is_active(3.0));
    }
}
