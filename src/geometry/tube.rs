use std::f32::consts::TAU;

use bevy::math::{Quat, Vec3};
use bevy_math::cubic_splines::CubicCurve;

use crate::core::config::TubeSettings;
use crate::geometry::curve::curve_span;
use crate::geometry::TubeBuffers;

struct Frame {
    center: Vec3,
    normal: Vec3,
    binormal: Vec3,
}

// Parallel-transported frames at evenly spaced curve parameters.
fn sweep_frames(curve: &CubicCurve<Vec3>, tubular_segments: usize) -> Vec<Frame> {
    let span = curve_span(curve);
    let mut frames: Vec<Frame> = Vec::with_capacity(tubular_segments + 1);
    let mut previous_tangent: Option<Vec3> = None;

    for i in 0..=tubular_segments {
        let t = span * i as f32 / tubular_segments as f32;
        let center = curve.position(t);
        let tangent = curve
            .velocity(t)
            .try_normalize()
            .or(previous_tangent)
            .unwrap_or(Vec3::NEG_Z);

        let normal = match (previous_tangent, frames.last()) {
            (Some(prev), Some(frame)) => (Quat::from_rotation_arc(prev, tangent) * frame.normal)
                .try_normalize()
                .unwrap_or_else(|| tangent.any_orthonormal_vector()),
            _ => tangent.any_orthonormal_pair().0,
        };
        let binormal = tangent.cross(normal).normalize_or_zero();

        frames.push(Frame { center, normal, binormal });
        previous_tangent = Some(tangent);
    }

    frames
}

/// Tessellates a tube of constant radius around `curve`.
///
/// Produces `tubular_segments + 1` rings of `radial_segments + 1` vertices; the
/// seam vertex is duplicated so UVs wrap cleanly. Ends are left open.
pub fn generate_tube(curve: &CubicCurve<Vec3>, settings: &TubeSettings) -> TubeBuffers {
    let tubular = settings.tubular_segments.max(1) as usize;
    let radial = settings.radial_segments.max(3) as usize;
    let radius = settings.radius;

    let mut buffers = TubeBuffers::with_capacity((tubular + 1) * (radial + 1), tubular * radial * 6);

    for (i, frame) in sweep_frames(curve, tubular).iter().enumerate() {
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let (sin, cos) = (v.sin(), -v.cos());
            let direction = (frame.normal * cos + frame.binormal * sin).normalize_or_zero();

            buffers.positions.push((frame.center + direction * radius).to_array());
            buffers.normals.push(direction.to_array());
            buffers
                .uvs
                .push([i as f32 / tubular as f32, j as f32 / radial as f32]);
        }
    }

    let stride = (radial + 1) as u32;
    for j in 1..=tubular as u32 {
        for i in 1..=radial as u32 {
            let a = stride * (j - 1) + (i - 1);
            let b = stride * j + (i - 1);
            let c = stride * j + i;
            let d = stride * (j - 1) + i;
            buffers.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    buffers
}
