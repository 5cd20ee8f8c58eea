//! Camera pose helpers.

use nalgebra::{Matrix4, Vector3};

/// Distance of the camera from the world origin, taken from the
/// translation column of its 4x4 pose.
pub fn pose_distance(transform: &Matrix4<f32>) -> f32 {
    Vector3::new(transform[(0, 3)], transform[(1, 3)], transform[(2, 3)]).norm()
}
