//! Closed-form 1-D motion profiles.
//!
//! All motion in the scroll core is piecewise constant acceleration,
//! solved analytically and evaluated at a play time in seconds. The
//! scalar space is the scroll axis; callers map it onto node positions
//! through a direction normal.

/// A single constant-acceleration segment starting to rest or exit.
#[derive(Clone, Copy, Debug)]
struct Segment {
    duration: f32,
    start: f32,
    velocity: f32,
    acceleration: f32,
}

impl Segment {
    fn position(&self, t: f32) -> f32 {
        self.start + self.velocity * t + 0.5 * self.acceleration * t * t
    }

    fn velocity_at(&self, t: f32) -> f32 {
        self.velocity + self.acceleration * t
    }

    fn end(&self) -> f32 {
        self.position(self.duration)
    }
}

/// Constant-deceleration motion: either run to rest, or run to a fixed
/// target and report the exit velocity there.
#[derive(Clone, Copy, Debug)]
pub struct AcceleratedMotion {
    segment: Segment,
}

impl AcceleratedMotion {
    /// Decelerates from `v0` to rest at rate `a` (a magnitude, > 0).
    pub fn decelerate(from: f32, v0: f32, a: f32) -> Self {
        let duration = if a > 0.0 { v0.abs() / a } else { 0.0 };
        Self {
            segment: Segment {
                duration,
                start: from,
                velocity: v0,
                acceleration: -v0.signum() * a,
            },
        }
    }

    /// Travels from `from` to `to` with initial speed `|v0|` and
    /// constant deceleration `a`, ending at `to` with the residual
    /// velocity. If the motion would come to rest short of `to`, it
    /// ends at the natural rest point instead.
    pub fn accelerate_to(from: f32, to: f32, v0: f32, a: f32) -> Self {
        let distance = to - from;
        if distance == 0.0 || a <= 0.0 {
            return Self {
                segment: Segment {
                    duration: 0.0,
                    start: from,
                    velocity: 0.0,
                    acceleration: 0.0,
                },
            };
        }

        let dir = distance.signum();
        let speed = v0.abs();
        let exit_sq = speed * speed - 2.0 * a * distance.abs();
        let duration = if exit_sq > 0.0 {
            (speed - exit_sq.sqrt()) / a
        } else {
            speed / a
        };
        Self {
            segment: Segment {
                duration,
                start: from,
                velocity: dir * speed,
                acceleration: -dir * a,
            },
        }
    }

    pub fn duration(&self) -> f32 {
        self.segment.duration
    }

    pub fn position(&self, t: f32) -> f32 {
        self.segment.position(t.clamp(0.0, self.segment.duration))
    }

    pub fn velocity(&self, t: f32) -> f32 {
        self.segment
            .velocity_at(t.clamp(0.0, self.segment.duration))
    }

    pub fn final_position(&self) -> f32 {
        self.segment.end()
    }

    pub fn exit_velocity(&self) -> f32 {
        self.segment.velocity_at(self.segment.duration)
    }

    pub fn total_path(&self) -> f32 {
        self.final_position() - self.segment.start
    }

    pub fn is_finished(&self, t: f32) -> bool {
        t >= self.segment.duration
    }
}

/// Return-to-boundary motion with overshoot.
///
/// An outward leg (initial velocity pointing past the boundary) is
/// braked at `a_cap`; the return leg runs a symmetric bang-bang
/// profile at `a_spring`, arriving at the boundary at rest. The final
/// position is exactly the boundary.
#[derive(Clone, Debug)]
pub struct BounceMotion {
    segments: Vec<Segment>,
    boundary: f32,
    duration: f32,
}

impl BounceMotion {
    pub fn new(from: f32, boundary: f32, velocity: f32, a_spring: f32, a_cap: f32) -> Self {
        let mut segments = Vec::new();
        let to_boundary = boundary - from;
        let outward =
            velocity != 0.0 && (to_boundary == 0.0 || velocity.signum() != to_boundary.signum());

        let (mut pos, mut speed_toward) = (from, velocity.abs());
        if outward {
            // Brake the escaping velocity; the cap bounds the overshoot.
            let t = velocity.abs() / a_cap;
            let seg = Segment {
                duration: t,
                start: from,
                velocity,
                acceleration: -velocity.signum() * a_cap,
            };
            pos = seg.end();
            speed_toward = 0.0;
            segments.push(seg);
        }

        let distance = boundary - pos;
        if distance != 0.0 {
            let dir = distance.signum();
            let d = distance.abs();
            let u = speed_toward;
            let stop_distance = if a_spring > 0.0 {
                u * u / (2.0 * a_spring)
            } else {
                0.0
            };

            if u > 0.0 && stop_distance >= d {
                // Already fast enough; brake exactly into the boundary.
                segments.push(Segment {
                    duration: 2.0 * d / u,
                    start: pos,
                    velocity: dir * u,
                    acceleration: -dir * u * u / (2.0 * d),
                });
            } else if a_spring > 0.0 {
                // Accelerate half the remaining way, brake the rest.
                let peak = ((u * u + 2.0 * a_spring * d) / 2.0).sqrt();
                let t_accel = (peak - u) / a_spring;
                let accel_seg = Segment {
                    duration: t_accel,
                    start: pos,
                    velocity: dir * u,
                    acceleration: dir * a_spring,
                };
                let mid = accel_seg.end();
                segments.push(accel_seg);
                segments.push(Segment {
                    duration: peak / a_spring,
                    start: mid,
                    velocity: dir * peak,
                    acceleration: -dir * a_spring,
                });
            }
        }

        let duration = segments.iter().map(|s| s.duration).sum();
        Self {
            segments,
            boundary,
            duration,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn position(&self, t: f32) -> f32 {
        let mut remaining = t;
        for seg in &self.segments {
            if remaining <= seg.duration {
                return seg.position(remaining.max(0.0));
            }
            remaining -= seg.duration;
        }
        self.boundary
    }

    pub fn velocity(&self, t: f32) -> f32 {
        let mut remaining = t;
        for seg in &self.segments {
            if remaining <= seg.duration {
                return seg.velocity_at(remaining.max(0.0));
            }
            remaining -= seg.duration;
        }
        0.0
    }

    pub fn is_finished(&self, t: f32) -> bool {
        t >= self.duration
    }
}

/// Either profile, as launched on a node.
#[derive(Clone, Debug)]
pub enum MotionProfile {
    Accelerated(AcceleratedMotion),
    Bounce(BounceMotion),
}

impl MotionProfile {
    pub fn duration(&self) -> f32 {
        match self {
            MotionProfile::Accelerated(m) => m.duration(),
            MotionProfile::Bounce(m) => m.duration(),
        }
    }

    pub fn position(&self, t: f32) -> f32 {
        match self {
            MotionProfile::Accelerated(m) => m.position(t),
            MotionProfile::Bounce(m) => m.position(t),
        }
    }

    pub fn velocity(&self, t: f32) -> f32 {
        match self {
            MotionProfile::Accelerated(m) => m.velocity(t),
            MotionProfile::Bounce(m) => m.velocity(t),
        }
    }

    pub fn start_position(&self) -> f32 {
        self.position(0.0)
    }

    pub fn is_finished(&self, t: f32) -> bool {
        match self {
            MotionProfile::Accelerated(m) => m.is_finished(t),
            MotionProfile::Bounce(m) => m.is_finished(t),
        }
    }
}
