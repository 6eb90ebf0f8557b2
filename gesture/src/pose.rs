//! Pose primitives for tracked input sources.
//!
//! Positions are meters (x, y, z).  Rotations are unit quaternions stored as
//! (x, y, z, w), the same layout hand-tracking joints use.  Local Euler
//! angles are degrees in `[0, 360)`, composed yaw (Y) · pitch (X) · roll (Z).

// ── Pose ───────────────────────────────────────────────────

/// Identity rotation quaternion (x, y, z, w).
pub const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Position plus local-space rotation of a tracked source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in meters (x, y, z).
    pub position: [f32; 3],
    /// Local rotation quaternion (x, y, z, w).
    pub rotation: [f32; 4],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: IDENTITY_ROTATION,
        }
    }
}

impl Pose {
    pub fn new(position: [f32; 3], rotation: [f32; 4]) -> Self {
        Self { position, rotation }
    }

    /// Build a pose from a position and local Euler angles in degrees.
    pub fn from_euler_deg(position: [f32; 3], euler_deg: [f32; 3]) -> Self {
        Self {
            position,
            rotation: quat_from_euler_deg(euler_deg),
        }
    }

    /// Local Euler angles in degrees, each in `[0, 360)`.
    pub fn euler_deg(&self) -> [f32; 3] {
        quat_to_euler_deg(self.rotation)
    }

    /// Straight-line distance between the two positions.
    pub fn distance_to(&self, other: &Pose) -> f32 {
        position_distance(&self.position, &other.position)
    }

    /// Smallest rotation angle (degrees) taking `self` to `other`.
    pub fn angle_to_deg(&self, other: &Pose) -> f32 {
        let a = normalize(self.rotation);
        let b = normalize(other.rotation);
        let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3])
            .abs()
            .min(1.0);
        (2.0 * dot.acos()).to_degrees()
    }
}

// ── Angles ─────────────────────────────────────────────────

/// Shortest signed difference from `current` to `target`, in degrees.
///
/// Result lies in `(-180, 180]`, so 350° → 10° is +20°, not -340°.
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

// ── Quaternion helpers ─────────────────────────────────────

/// Hamilton product `a * b` of two (x, y, z, w) quaternions.
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

/// Quaternion for local Euler angles (degrees), applied as Y · X · Z.
pub fn quat_from_euler_deg(euler_deg: [f32; 3]) -> [f32; 4] {
    let half = |deg: f32| deg.to_radians() * 0.5;
    let (sx, cx) = half(euler_deg[0]).sin_cos();
    let (sy, cy) = half(euler_deg[1]).sin_cos();
    let (sz, cz) = half(euler_deg[2]).sin_cos();

    let qx = [sx, 0.0, 0.0, cx];
    let qy = [0.0, sy, 0.0, cy];
    let qz = [0.0, 0.0, sz, cz];
    quat_mul(quat_mul(qy, qx), qz)
}

/// Local Euler angles (degrees, `[0, 360)`) of a Y · X · Z quaternion.
pub fn quat_to_euler_deg(q: [f32; 4]) -> [f32; 3] {
    let [x, y, z, w] = normalize(q);

    let sin_pitch = (2.0 * (w * x - y * z)).clamp(-1.0, 1.0);
    let pitch = sin_pitch.asin();
    let yaw = (2.0 * (x * z + w * y)).atan2(1.0 - 2.0 * (x * x + y * y));
    let roll = (2.0 * (x * y + w * z)).atan2(1.0 - 2.0 * (x * x + z * z));

    [
        wrap_degrees(pitch.to_degrees()),
        wrap_degrees(yaw.to_degrees()),
        wrap_degrees(roll.to_degrees()),
    ]
}

/// Normalize a quaternion; degenerate input collapses to identity.
pub fn normalize(q: [f32; 4]) -> [f32; 4] {
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if len < 1e-6 {
        return IDENTITY_ROTATION;
    }
    [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
}

/// Euclidean distance between two 3D points.
pub fn position_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() < eps, "expected {} ≈ {} (eps {})", a, b, eps);
    }

    #[test]
    fn test_delta_angle_wraps_shortest_way() {
        assert_close(delta_angle(350.0, 10.0), 20.0, 1e-4);
        assert_close(delta_angle(10.0, 350.0), -20.0, 1e-4);
        assert_close(delta_angle(0.0, 0.5), 0.5, 1e-6);
        assert_close(delta_angle(0.0, 180.0), 180.0, 1e-6);
        assert_close(delta_angle(90.0, 90.0), 0.0, 1e-6);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_close(wrap_degrees(-90.0), 270.0, 1e-4);
        assert_close(wrap_degrees(720.5), 0.5, 1e-3);
        assert!(wrap_degrees(-1e-7) < 360.0);
    }

    #[test]
    fn test_identity_pose() {
        let pose = Pose::default();
        assert_eq!(pose.rotation, IDENTITY_ROTATION);
        assert_eq!(pose.euler_deg(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_single_axis_euler_round_trip() {
        let pose = Pose::from_euler_deg([0.0; 3], [0.5, 0.0, 0.0]);
        let e = pose.euler_deg();
        assert_close(e[0], 0.5, 1e-3);
        assert_close(delta_angle(0.0, e[1]), 0.0, 1e-3);
        assert_close(delta_angle(0.0, e[2]), 0.0, 1e-3);
    }

    #[test]
    fn test_compound_euler_keeps_components() {
        let pose = Pose::from_euler_deg([0.0; 3], [10.0, 20.0, 30.0]);
        let e = pose.euler_deg();
        assert_close(e[0], 10.0, 1e-2);
        assert_close(e[1], 20.0, 1e-2);
        assert_close(e[2], 30.0, 1e-2);
    }

    #[test]
    fn test_negative_euler_wraps() {
        let pose = Pose::from_euler_deg([0.0; 3], [0.0, -45.0, 0.0]);
        let e = pose.euler_deg();
        assert_close(e[1], 315.0, 1e-2);
    }

    #[test]
    fn test_angle_between_poses() {
        let a = Pose::default();
        let b = Pose::from_euler_deg([0.0; 3], [0.0, 90.0, 0.0]);
        assert_close(a.angle_to_deg(&b), 90.0, 1e-2);
        assert_close(b.angle_to_deg(&b), 0.0, 1e-1);
    }

    #[test]
    fn test_distance() {
        let a = Pose::new([0.0, 0.0, 0.0], IDENTITY_ROTATION);
        let b = Pose::new([0.3, 0.4, 0.0], IDENTITY_ROTATION);
        assert_close(a.distance_to(&b), 0.5, 1e-6);
    }

    #[test]
    fn test_normalize_degenerate() {
        assert_eq!(normalize([0.0, 0.0, 0.0, 0.0]), IDENTITY_ROTATION);
        let n = normalize([0.0, 0.0, 0.0, 2.0]);
        assert_close(n[3], 1.0, 1e-6);
    }
}
