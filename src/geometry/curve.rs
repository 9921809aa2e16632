use bevy::math::Vec3;
use bevy_math::cubic_splines::{CubicCardinalSpline, CubicCurve, CubicGenerator, CyclicCubicGenerator};

use crate::core::ar_error::ArError;
use crate::core::config::Waypoints;

/// Catmull-Rom curve through every waypoint, in order.
///
/// Open curves have one segment per consecutive waypoint pair, so waypoint `k`
/// sits at parameter `k`. Closed curves add a segment back to the first point.
pub fn waypoint_curve(waypoints: &Waypoints, closed: bool) -> Result<CubicCurve<Vec3>, ArError> {
    let spline = CubicCardinalSpline::new_catmull_rom(waypoints.0.clone());
    let curve = if closed {
        spline.to_curve_cyclic()
    } else {
        spline.to_curve()
    };
    curve.map_err(|e| ArError::Curve(e.to_string()))
}

/// Parameter span of the curve, i.e. the number of segments.
pub fn curve_span(curve: &CubicCurve<Vec3>) -> f32 {
    curve.segments().len() as f32
}
