//! Specimen pose: ZYZ Euler angles plus an in-plane offset.

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::parameters::Parameterized;

/// Orientation and in-plane shift of the specimen.
///
/// Angles are in degrees and compose as `Rz(phi) * Ry(theta) * Rz(psi)`.
/// Offsets are in Å and shift the projection along x (columns) and y (rows).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub view_phi: f64,
    pub view_theta: f64,
    pub view_psi: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Pose {
    pub fn new(view_phi: f64, view_theta: f64, view_psi: f64) -> Self {
        Self {
            view_phi,
            view_theta,
            view_psi,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset_x: f64, offset_y: f64) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub fn rotation(&self) -> Rotation3<f64> {
        let z = Vector3::z_axis();
        let y = Vector3::y_axis();
        Rotation3::from_axis_angle(&z, self.view_phi.to_radians())
            * Rotation3::from_axis_angle(&y, self.view_theta.to_radians())
            * Rotation3::from_axis_angle(&z, self.view_psi.to_radians())
    }

    /// Rotate a point about the origin, then shift it in-plane.
    pub fn transform(&self, position: [f64; 3]) -> [f64; 3] {
        let rotated = self.rotation() * Vector3::from(position);
        [
            rotated.x + self.offset_x,
            rotated.y + self.offset_y,
            rotated.z,
        ]
    }

    /// Transform many points, building the rotation once.
    pub fn transform_all(&self, positions: &[[f64; 3]]) -> Vec<[f64; 3]> {
        let rotation = self.rotation();
        positions
            .iter()
            .map(|p| {
                let r = rotation * Vector3::from(*p);
                [r.x + self.offset_x, r.y + self.offset_y, r.z]
            })
            .collect()
    }
}

impl Parameterized for Pose {
    fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        match name {
            "view_phi" => self.view_phi = value,
            "view_theta" => self.view_theta = value,
            "view_psi" => self.view_psi = value,
            "offset_x" => self.offset_x = value,
            "offset_y" => self.offset_y = value,
            _ => return false,
        }
        true
    }
}
