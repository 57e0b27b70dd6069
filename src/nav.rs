//! Orbital navigation state machine.
//!
//! Converts the active orbit assignment into velocity and facing commands in
//! two phases: a radial approach that only corrects distance to the origin,
//! then an angular slew along the sphere toward the assigned direction. With
//! no assignment the controller holds still.
//!
//! Every tick returns the motion-state notification to forward to the host,
//! if the state changed. Mutation and network I/O stay separated: this
//! module never sends anything itself.

use defensematrix_shared::tuning::{MAX_VELOCITY, RADIUS_THRESHOLD};
use defensematrix_shared::{Engine, MotionState, OrbitPosition, Sensors, Vec3};
use tracing::debug;

/// The two phases of an active orbit approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Correcting distance to the origin along the drone's own bearing.
    MovingToRadius,
    /// On the sphere; slewing toward the assigned direction.
    MovingOnRadius,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NavState {
    /// Safe default before any assignment arrives: no motion, no rotation.
    Holding,
    Orbiting { target: OrbitPosition, phase: Phase },
}

/// Per-drone navigation controller.
#[derive(Debug)]
pub struct NavController {
    state: NavState,
    motion: MotionState,
}

impl NavController {
    pub fn new() -> Self {
        Self {
            state: NavState::Holding,
            motion: MotionState::Idle,
        }
    }

    /// The motion state last reported (or due to be reported) to the host.
    pub fn motion_state(&self) -> MotionState {
        self.motion
    }

    /// Current phase, if an assignment is active.
    pub fn phase(&self) -> Option<Phase> {
        match self.state {
            NavState::Holding => None,
            NavState::Orbiting { phase, .. } => Some(phase),
        }
    }

    pub fn target(&self) -> Option<&OrbitPosition> {
        match &self.state {
            NavState::Holding => None,
            NavState::Orbiting { target, .. } => Some(target),
        }
    }

    /// Replace the active assignment wholesale and restart the approach.
    /// Returns the `Running` notification for the host.
    pub fn assign(&mut self, target: OrbitPosition) -> MotionState {
        debug!(%target, "new orbit assignment");
        self.state = NavState::Orbiting {
            target,
            phase: Phase::MovingToRadius,
        };
        self.motion = MotionState::Running;
        MotionState::Running
    }

    /// Advance one step: command the engine and report a motion-state
    /// transition when one fires.
    pub fn tick(&mut self, sensors: &impl Sensors, engine: &mut impl Engine) -> Option<MotionState> {
        let (target, phase) = match self.state {
            NavState::Holding => return None,
            NavState::Orbiting { target, phase } => (target, phase),
        };

        // Facing is independent of the translational phase.
        engine.set_rotation(target.direction, 0.0);

        match phase {
            Phase::MovingToRadius => self.move_to_radius(&target, sensors, engine),
            Phase::MovingOnRadius => self.move_on_radius(&target, sensors, engine),
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if let NavState::Orbiting { phase: p, .. } = &mut self.state {
            if *p != phase {
                debug!(?phase, "orbit phase transition");
                *p = phase;
            }
        }
    }

    fn move_to_radius(
        &mut self,
        target: &OrbitPosition,
        sensors: &impl Sensors,
        engine: &mut impl Engine,
    ) -> Option<MotionState> {
        let position = sensors.position();
        let distance = position.distance(target.origin);

        if (f64::from(target.radius) - distance).abs() > RADIUS_THRESHOLD {
            // Only the radius gets corrected here: aim for the sphere point
            // along our own bearing from the origin, not the assigned one.
            let radial = (position - target.origin).normalized();
            let goal = target.to_point_with_direction(radial);
            let velocity = (goal - position).clamp_length(MAX_VELOCITY);
            engine.set_velocity(velocity);
        } else {
            self.set_phase(Phase::MovingOnRadius);
        }
        None
    }

    fn move_on_radius(
        &mut self,
        target: &OrbitPosition,
        sensors: &impl Sensors,
        engine: &mut impl Engine,
    ) -> Option<MotionState> {
        let position = sensors.position();
        let distance = position.distance(target.origin);
        let radius = f64::from(target.radius);

        if (radius - distance).abs() >= RADIUS_THRESHOLD {
            // Drifted off the sphere; go correct the radius first.
            self.set_phase(Phase::MovingToRadius);
            return None;
        }

        let drone_dir = (position - target.origin).normalized();
        let target_dir = target.direction;

        let angle = signed_angle(
            drone_dir,
            target_dir,
            plane_normal(drone_dir, target_dir, Vec3::ZERO),
        );
        let arc_distance = angle.abs() * radius;

        // Tangent in the slew plane, pointing from our bearing toward the
        // assigned one.
        let tangent = plane_normal(
            plane_normal(Vec3::ZERO, drone_dir, target_dir),
            drone_dir,
            Vec3::ZERO,
        );
        let tangential = (tangent * arc_distance).clamp_length(MAX_VELOCITY);
        let speed = tangential.length();

        let mut velocity = tangential;
        if radius > 0.0 {
            // Outward centripetal correction keeps the slew on the sphere.
            velocity = velocity + drone_dir * (speed * speed / radius);
        }
        engine.set_velocity(velocity);

        if arc_distance < RADIUS_THRESHOLD && self.motion != MotionState::Completed {
            self.motion = MotionState::Completed;
            return Some(MotionState::Completed);
        }
        None
    }
}

impl Default for NavController {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit normal of the plane through three points.
fn plane_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalized()
}

/// Angle between two vectors, signed by the winding around `normal`.
fn signed_angle(a: Vec3, b: Vec3, normal: Vec3) -> f64 {
    let denom = a.length() * b.length();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    let angle = (a.dot(b) / denom).clamp(-1.0, 1.0).acos();
    angle * normal.dot(a.cross(b)).signum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use defensematrix_shared::Mat3;

    struct FixedSensors {
        position: Vec3,
    }

    impl Sensors for FixedSensors {
        fn position(&self) -> Vec3 {
            self.position
        }
        fn velocity(&self) -> Vec3 {
            Vec3::ZERO
        }
        fn mass(&self) -> f64 {
            1000.0
        }
        fn world_orientation(&self) -> Mat3 {
            Mat3::identity()
        }
    }

    #[derive(Default)]
    struct RecordingEngine {
        velocity: Option<Vec3>,
        forward: Option<Vec3>,
    }

    impl Engine for RecordingEngine {
        fn set_velocity(&mut self, target: Vec3) {
            self.velocity = Some(target);
        }
        fn set_rotation(&mut self, forward: Vec3, _roll: f64) {
            self.forward = Some(forward);
        }
    }

    fn inner_orbit() -> OrbitPosition {
        OrbitPosition {
            origin: Vec3::ZERO,
            direction: Vec3::new(1.0, 0.0, 0.0),
            radius: 100,
        }
    }

    #[test]
    fn test_holding_commands_nothing() {
        let mut nav = NavController::new();
        let mut engine = RecordingEngine::default();
        let sensors = FixedSensors {
            position: Vec3::new(200.0, 0.0, 0.0),
        };

        assert_eq!(nav.tick(&sensors, &mut engine), None);
        assert!(engine.velocity.is_none());
        assert!(engine.forward.is_none());
        assert_eq!(nav.phase(), None);
    }

    #[test]
    fn test_assign_reports_running_and_starts_radial_phase() {
        let mut nav = NavController::new();
        let note = nav.assign(inner_orbit());
        assert_eq!(note, MotionState::Running);
        assert_eq!(nav.motion_state(), MotionState::Running);
        assert_eq!(nav.phase(), Some(Phase::MovingToRadius));
    }

    #[test]
    fn test_radial_phase_moves_toward_sphere() {
        let mut nav = NavController::new();
        nav.assign(inner_orbit());

        let mut engine = RecordingEngine::default();
        // well outside the sphere, off the assigned axis
        let sensors = FixedSensors {
            position: Vec3::new(0.0, 200.0, 0.0),
        };

        assert_eq!(nav.tick(&sensors, &mut engine), None);
        assert_eq!(nav.phase(), Some(Phase::MovingToRadius));

        let v = engine.velocity.expect("no velocity commanded");
        assert!(v.length() <= MAX_VELOCITY + 1e-9);
        // moving inward, along our own bearing, not toward the assigned point
        assert!(v.dot(Vec3::new(0.0, -1.0, 0.0)) > 0.0);
        assert_eq!(v.x, 0.0);

        // facing is the assigned direction regardless of phase
        assert_eq!(engine.forward, Some(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_reaching_radius_switches_to_slew() {
        let mut nav = NavController::new();
        nav.assign(inner_orbit());

        let mut engine = RecordingEngine::default();
        let sensors = FixedSensors {
            position: Vec3::new(0.0, 100.0, 0.0),
        };

        assert_eq!(nav.tick(&sensors, &mut engine), None);
        assert_eq!(nav.phase(), Some(Phase::MovingOnRadius));
        // the transition tick itself commands no translation
        assert!(engine.velocity.is_none());
    }

    #[test]
    fn test_slew_commands_tangential_velocity() {
        let mut nav = NavController::new();
        nav.assign(inner_orbit());

        // 90 degrees away from the assigned +x direction, on the sphere
        let sensors = FixedSensors {
            position: Vec3::new(0.0, 100.0, 0.0),
        };
        let mut engine = RecordingEngine::default();
        nav.tick(&sensors, &mut engine); // ToRadius -> OnRadius
        assert_eq!(nav.tick(&sensors, &mut engine), None);

        let v = engine.velocity.expect("no velocity commanded");
        assert!(v.length() > 0.0);
        // tangential component points toward +x (the target bearing)
        assert!(v.x > 0.0);
        // arc distance (pi/2 * 100) far exceeds the clamp
        assert!(v.length() <= MAX_VELOCITY * 1.2);
    }

    #[test]
    fn test_arrival_signals_completed_once() {
        let mut nav = NavController::new();
        nav.assign(inner_orbit());

        // on the sphere, angularly within threshold of +x
        let sensors = FixedSensors {
            position: Vec3::new(100.0, 3.0, 0.0),
        };
        let mut engine = RecordingEngine::default();
        nav.tick(&sensors, &mut engine); // ToRadius -> OnRadius

        assert_eq!(nav.tick(&sensors, &mut engine), Some(MotionState::Completed));
        assert_eq!(nav.motion_state(), MotionState::Completed);
        // holding position keeps ticking but does not re-notify
        assert_eq!(nav.tick(&sensors, &mut engine), None);
        assert_eq!(nav.tick(&sensors, &mut engine), None);
    }

    #[test]
    fn test_radius_drift_falls_back_to_radial_phase() {
        let mut nav = NavController::new();
        nav.assign(inner_orbit());

        let on_sphere = FixedSensors {
            position: Vec3::new(0.0, 100.0, 0.0),
        };
        let mut engine = RecordingEngine::default();
        nav.tick(&on_sphere, &mut engine);
        assert_eq!(nav.phase(), Some(Phase::MovingOnRadius));

        let drifted = FixedSensors {
            position: Vec3::new(0.0, 150.0, 0.0),
        };
        assert_eq!(nav.tick(&drifted, &mut engine), None);
        assert_eq!(nav.phase(), Some(Phase::MovingToRadius));
    }

    #[test]
    fn test_reassignment_restarts_running() {
        let mut nav = NavController::new();
        nav.assign(inner_orbit());

        let sensors = FixedSensors {
            position: Vec3::new(100.0, 0.0, 0.0),
        };
        let mut engine = RecordingEngine::default();
        nav.tick(&sensors, &mut engine);
        nav.tick(&sensors, &mut engine);
        assert_eq!(nav.motion_state(), MotionState::Completed);

        let outer = OrbitPosition {
            radius: 120,
            ..inner_orbit()
        };
        assert_eq!(nav.assign(outer), MotionState::Running);
        assert_eq!(nav.phase(), Some(Phase::MovingToRadius));
    }

    #[test]
    fn test_signed_angle_resolves_winding() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = Vec3::new(0.0, 0.0, 1.0);

        let quarter = std::f64::consts::FRAC_PI_2;
        assert!((signed_angle(x, y, z) - quarter).abs() < 1e-12);
        assert!((signed_angle(x, y, -z) + quarter).abs() < 1e-12);
        assert_eq!(signed_angle(x, Vec3::ZERO, z), 0.0);
    }
}
