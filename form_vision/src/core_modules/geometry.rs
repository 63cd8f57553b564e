// THEORY:
// The `geometry` module is the most fundamental layer of the form engine. It holds
// the handful of planar measurements every higher layer is built from: how far
// apart two joints are, how bent a joint is, and how far the torso leans away from
// horizontal.
//
// Key principles:
// 1.  **Pure functions**: Nothing here holds state or knows about frames, windows
//     or activities. Inputs are points, outputs are scalars.
// 2.  **Total over the input domain**: Degenerate geometry (two joints reported at
//     the same spot) never produces NaN. A joint whose rays collapse is reported as
//     fully extended (180 degrees).

pub mod geometry {
    use serde::{Deserialize, Serialize};

    pub type Degrees = f64;
    pub type Pixels = f64;

    /// Rays shorter than this are considered collapsed.
    const DEGENERATE_RAY_LENGTH: f64 = 1e-6;

    /// Angle reported for a joint whose rays collapse.
    pub const DEGENERATE_JOINT_ANGLE: Degrees = 180.0;

    /// A position in the frame's coordinate space.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    pub struct Point {
        pub x: f64,
        pub y: f64,
    }

    impl Point {
        pub const fn new(x: f64, y: f64) -> Self {
            Self { x, y }
        }

        pub fn midpoint(&self, other: &Point) -> Point {
            Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
        }

        fn minus(&self, other: &Point) -> (f64, f64) {
            (self.x - other.x, self.y - other.y)
        }
    }

    /// Euclidean distance between two points.
    pub fn distance(a: &Point, b: &Point) -> Pixels {
        let (dx, dy) = a.minus(b);
        dx.hypot(dy)
    }

    /// Angle at vertex `b` between the rays b→a and b→c, in degrees within [0, 180].
    ///
    /// Returns [`DEGENERATE_JOINT_ANGLE`] when either ray is shorter than 1e-6.
    pub fn angle_at(a: &Point, b: &Point, c: &Point) -> Degrees {
        let ba = a.minus(b);
        let bc = c.minus(b);
        let len_ba = ba.0.hypot(ba.1);
        let len_bc = bc.0.hypot(bc.1);
        if len_ba < DEGENERATE_RAY_LENGTH || len_bc < DEGENERATE_RAY_LENGTH {
            return DEGENERATE_JOINT_ANGLE;
        }

        let cos_angle = ((ba.0 * bc.0 + ba.1 * bc.1) / (len_ba * len_bc)).clamp(-1.0, 1.0);
        cos_angle.acos().to_degrees()
    }

    /// Inclination of the shoulder→hip vector away from horizontal, folded into [0, 90].
    ///
    /// A vertical (upright) torso reads 90, a horizontal (plank) torso reads 0,
    /// independent of which way the body faces.
    pub fn torso_angle(shoulder_mid: &Point, hip_mid: &Point) -> Degrees {
        let (dx, dy) = hip_mid.minus(shoulder_mid);
        let angle = dy.atan2(dx).to_degrees().abs();
        angle.min(180.0 - angle)
    }
}
