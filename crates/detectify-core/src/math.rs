use nalgebra::{Matrix3, Point2, Vector2, Vector3};

pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Pt2 = Point2<Real>;
pub type Mat3 = Matrix3<Real>;

/// Homogeneous denominators at or below this magnitude are treated as points at infinity.
pub const HOMOGENEOUS_EPS: Real = 1e-12;

pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 1.0)
}

/// Perspective division; `None` when `w` underflows or the result is not finite.
pub fn from_homogeneous(v: &Vec3) -> Option<Pt2> {
    if v.z.abs() <= HOMOGENEOUS_EPS {
        return None;
    }
    let p = Pt2::new(v.x / v.z, v.y / v.z);
    (p.x.is_finite() && p.y.is_finite()).then_some(p)
}

/// Map `p` through the projective transform `h`.
pub fn project_point(h: &Mat3, p: &Pt2) -> Option<Pt2> {
    from_homogeneous(&(h * to_homogeneous(p)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_divides_by_w() {
        let h = Mat3::new(2.0, 0.0, 1.0, 0.0, 2.0, -1.0, 0.0, 0.0, 2.0);
        let p = project_point(&h, &Pt2::new(3.0, 4.0)).unwrap();
        assert!((p.x - 3.5).abs() < 1e-12);
        assert!((p.y - 3.5).abs() < 1e-12);
    }

    #[test]
    fn projection_to_infinity_is_none() {
        let h = Mat3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0);
        assert!(project_point(&h, &Pt2::new(1.0, 5.0)).is_none());
    }
}
