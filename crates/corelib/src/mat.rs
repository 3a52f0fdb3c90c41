//! Column-major 4x4 / 3x3 matrix math.
//! Flat storage, element (row, col) lives at index `col*4 + row`
//! (`col*3 + row` for [`Mat3`]) — the layout GPU APIs consume directly.

use std::ops::Mul;

/// 4x4 homogeneous transform, column-major.
///
/// Affine constructors keep the last row `[0, 0, 0, 1]`; only
/// [`Mat4::perspective_rh`] produces a general projective matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    e: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        e: [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    #[inline]
    pub const fn from_cols_array(e: [f32; 16]) -> Self {
        Self { e }
    }

    #[inline]
    pub const fn to_cols_array(self) -> [f32; 16] {
        self.e
    }

    /// Columns as four `[f32; 4]`, ready for a GPU uniform.
    #[inline]
    pub fn to_cols_array_2d(self) -> [[f32; 4]; 4] {
        let e = self.e;
        [
            [e[0], e[1], e[2], e[3]],
            [e[4], e[5], e[6], e[7]],
            [e[8], e[9], e[10], e[11]],
            [e[12], e[13], e[14], e[15]],
        ]
    }

    /// Identity with the translation in the fourth column.
    #[inline]
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.e[12] = x;
        m.e[13] = y;
        m.e[14] = z;
        m
    }

    /// Right-hand rotation about the Y axis.
    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.e[0] = c;
        m.e[2] = -s;
        m.e[8] = s;
        m.e[10] = c;
        m
    }

    /// Right-handed symmetric perspective projection, clip `w = -z_eye`,
    /// NDC z in [-1, 1].
    ///
    /// Caller contract: `0 < fov_y < pi` (the cotangent blows up at the
    /// bounds), `aspect > 0`, `z_near != z_far`.
    pub fn perspective_rh(fov_y: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        debug_assert!(fov_y > 0.0 && fov_y < std::f32::consts::PI);
        let (sin_half, cos_half) = (fov_y * 0.5).sin_cos();
        let f = cos_half / sin_half;
        let mut e = [0.0_f32; 16];
        e[0] = f / aspect;
        e[5] = f;
        e[10] = (z_far + z_near) / (z_near - z_far);
        e[11] = -1.0;
        e[14] = (2.0 * z_far * z_near) / (z_near - z_far);
        Self { e }
    }

    /// Transform a column vector.
    pub fn mul_vec4(&self, v: [f32; 4]) -> [f32; 4] {
        let e = &self.e;
        [
            e[0] * v[0] + e[4] * v[1] + e[8] * v[2] + e[12] * v[3],
            e[1] * v[0] + e[5] * v[1] + e[9] * v[2] + e[13] * v[3],
            e[2] * v[0] + e[6] * v[1] + e[10] * v[2] + e[14] * v[3],
            e[3] * v[0] + e[7] * v[1] + e[11] * v[2] + e[15] * v[3],
        ]
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    /// Standard product for column vectors: `a * b` applies `b` first.
    /// Not commutative — composition order is the caller's problem.
    fn mul(self, rhs: Mat4) -> Mat4 {
        let a = &self.e;
        let b = &rhs.e;
        let mut e = [0.0_f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += a[k * 4 + row] * b[col * 4 + k];
                }
                e[col * 4 + row] = acc;
            }
        }
        Mat4 { e }
    }
}

/// 3x3 linear transform, column-major. Orthonormal for pure rotations.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3 {
    e: [f32; 9],
}

impl Mat3 {
    pub const IDENTITY: Self = Self {
        e: [
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 1.0,
        ],
    };

    #[inline]
    pub const fn to_cols_array(self) -> [f32; 9] {
        self.e
    }

    /// Linear part of the Y rotation. Doubles as the normal matrix: the
    /// rotation is orthonormal, so the usual inverse-transpose collapses
    /// to the rotation itself.
    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.e[0] = c;
        m.e[2] = -s;
        m.e[6] = s;
        m.e[8] = c;
        m
    }

    pub fn transpose(self) -> Self {
        let e = self.e;
        Self {
            e: [
                e[0], e[3], e[6],
                e[1], e[4], e[7],
                e[2], e[5], e[8],
            ],
        }
    }
}

impl Mul for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Mat3 {
        let a = &self.e;
        let b = &rhs.e;
        let mut e = [0.0_f32; 9];
        for col in 0..3 {
            for row in 0..3 {
                let mut acc = 0.0;
                for k in 0..3 {
                    acc += a[k * 3 + row] * b[col * 3 + k];
                }
                e[col * 3 + row] = acc;
            }
        }
        Mat3 { e }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat4_close(a: Mat4, b: Mat4, eps: f32) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() <= eps)
    }

    fn mat3_close(a: Mat3, b: Mat3, eps: f32) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() <= eps)
    }

    #[test]
    fn identity_is_multiplicative_neutral() {
        let m = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0)
            * Mat4::from_translation(1.0, -2.0, 3.0)
            * Mat4::from_rotation_y(0.7);
        assert!(mat4_close(Mat4::IDENTITY * m, m, 1e-6));
        assert!(mat4_close(m * Mat4::IDENTITY, m, 1e-6));
    }

    #[test]
    fn multiply_is_associative() {
        let a = Mat4::perspective_rh(1.2, 1.777, 0.1, 50.0);
        let b = Mat4::from_translation(0.0, 0.0, -6.0);
        let c = Mat4::from_rotation_y(2.0);
        assert!(mat4_close((a * b) * c, a * (b * c), 1e-4));
    }

    #[test]
    fn multiply_order_matters() {
        let t = Mat4::from_translation(0.0, 0.0, -6.0);
        let r = Mat4::from_rotation_y(1.0);
        // T*R keeps the translation column intact; R*T rotates it.
        let tr = (t * r).to_cols_array();
        let rt = (r * t).to_cols_array();
        assert!((tr[12] - 0.0).abs() < 1e-6 && (tr[14] + 6.0).abs() < 1e-6);
        assert!((rt[12] + 6.0 * 1.0_f32.sin()).abs() < 1e-5);
    }

    #[test]
    fn rotation_zero_is_identity() {
        assert_eq!(Mat4::from_rotation_y(0.0), Mat4::IDENTITY);
        assert_eq!(Mat3::from_rotation_y(0.0), Mat3::IDENTITY);
    }

    #[test]
    fn rotation_cancels_with_inverse_angle() {
        for &theta in &[0.3, 1.0, 2.0, 3.5, -1.2] {
            let m = Mat4::from_rotation_y(theta) * Mat4::from_rotation_y(-theta);
            assert!(mat4_close(m, Mat4::IDENTITY, 1e-6), "theta={theta}");
        }
    }

    #[test]
    fn rotation_embeds_in_xz_block() {
        let m = Mat4::from_rotation_y(0.5).to_cols_array();
        let (s, c) = 0.5_f32.sin_cos();
        assert_eq!(m[0], c);
        assert_eq!(m[8], s);
        assert_eq!(m[2], -s);
        assert_eq!(m[10], c);
        // Y axis untouched, affine last row intact.
        assert_eq!(m[5], 1.0);
        assert_eq!([m[3], m[7], m[11], m[15]], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn translation_occupies_fourth_column() {
        let m = Mat4::from_translation(1.0, 2.0, 3.0).to_cols_array();
        assert_eq!((m[12], m[13], m[14]), (1.0, 2.0, 3.0));
        assert_eq!(m[15], 1.0);
    }

    #[test]
    fn normal_matrix_is_orthonormal() {
        for &theta in &[0.0, 0.7, 1.5708, 2.5, 3.1416, 4.2, 5.9] {
            let n = Mat3::from_rotation_y(theta);
            assert!(
                mat3_close(n.transpose() * n, Mat3::IDENTITY, 1e-6),
                "theta={theta}"
            );
        }
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let p = Mat4::perspective_rh(60.0_f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);

        let near = p.mul_vec4([0.0, 0.0, -0.1, 1.0]);
        assert!((near[2] / near[3] + 1.0).abs() < 1e-5);

        let far = p.mul_vec4([0.0, 0.0, -100.0, 1.0]);
        assert!((far[2] / far[3] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn perspective_w_is_negated_eye_z() {
        let p = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);
        let clip = p.mul_vec4([0.3, -0.2, -6.0, 1.0]);
        assert!((clip[3] - 6.0).abs() < 1e-6);
    }
}
