//! Joint-angle calculations
//!
//! All angles are in degrees. Degenerate inputs (zero-length rays, missing
//! joints) yield `None`; consumers treat that as "no reading this frame".

use crate::point::Point2;

/// Angle at vertex `b` between rays `b -> a` and `b -> c`, in degrees [0, 180].
///
/// Returns `None` when either ray has zero length.
pub fn joint_angle(a: Point2, b: Point2, c: Point2) -> Option<f64> {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);

    let mag_ba = bax.hypot(bay);
    let mag_bc = bcx.hypot(bcy);
    if mag_ba == 0.0 || mag_bc == 0.0 {
        return None;
    }

    let cos_angle = ((bax * bcx + bay * bcy) / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

/// Mean of whichever side angles are defined.
///
/// Tolerates one-sided occlusion: a single valid side is returned as-is,
/// and `None` only when both sides are missing.
pub fn fuse_sides(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (Some(l), Some(r)) => Some((l + r) / 2.0),
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

/// Inclination of the `lower -> upper` segment from vertical, in degrees [0, 90].
///
/// Returns `None` for a zero-length segment.
pub fn inclination_from_vertical(lower: Point2, upper: Point2) -> Option<f64> {
    let dx = upper.x - lower.x;
    let dy = upper.y - lower.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(dx.abs().atan2(dy.abs()).to_degrees())
}

/// Absolute angle of the `a -> b` segment from horizontal, in degrees [0, 90].
pub fn segment_angle_from_horizontal(a: Point2, b: Point2) -> f64 {
    let raw = (b.y - a.y).atan2(b.x - a.x).to_degrees().abs();
    if raw > 90.0 {
        180.0 - raw
    } else {
        raw
    }
}

/// Signed angle of the shoulder-to-hip vector from the downward vertical,
/// in degrees (-180, 180]. An upright person reads near 0; a person lying
/// flat reads near +-90.
pub fn posture_angle(shoulder: Point2, hip: Point2) -> f64 {
    (hip.x - shoulder.x).atan2(hip.y - shoulder.y).to_degrees()
}
