//! Untransform engine
//! Removes the virtual radial deformation from parsed moves: drops every
//! position back onto the true geometry, clips travel moves that would
//! pass above the part, and rescales extrusion so the deposited bead
//! matches the corrected path.

use crate::moves::{Move, MoveKind, PathPoint};
use crate::state::{DeformerState, RotationError};

/// Guard against extreme rescale factors when a corrected segment
/// collapses toward zero length.
const MAX_EXTRUSION_SCALE: f64 = 10.0;

/// Correct every move in place. Step order matters: clipping compares
/// corrected heights, and both extrusion passes read corrected positions.
pub fn untransform(state: &DeformerState, moves: &mut [Move]) -> Result<(), RotationError> {
    undeform_positions(state, moves)?;
    clip_travel_moves(moves);
    rescale_by_length_change(moves);
    rescale_by_tilt(state, moves)?;
    Ok(())
}

/// The virtual deformation lifted every point by tan(tilt) * radius;
/// subtract that from Z to recover the true geometry.
fn undeform_positions(state: &DeformerState, moves: &mut [Move]) -> Result<(), RotationError> {
    for m in moves {
        let point = m.point_mut().coords_mut();
        let radius = point.xy_norm();
        point.z -= state.tilt(radius)?.tan() * radius;
    }
    Ok(())
}

/// A travel move above the highest feed move would arc over the part
/// (and over the origin). Mark it suppressed; its coordinates stay
/// readable for the extrusion pass below.
fn clip_travel_moves(moves: &mut [Move]) {
    let mut max_z = 0.0_f64;
    for m in moves.iter() {
        if m.kind() == MoveKind::Feed {
            max_z = max_z.max(m.point().coords().z);
        }
    }

    for m in moves {
        let coords = m.point().coords();
        if m.kind() == MoveKind::Rapid && coords.z > max_z {
            *m.point_mut() = PathPoint::Suppressed(coords);
        }
    }
}

/// Untransforming changes segment lengths, so the commanded extrusion no
/// longer matches the distance actually travelled. Scale it by the
/// length ratio, capped at MAX_EXTRUSION_SCALE.
fn rescale_by_length_change(moves: &mut [Move]) {
    let mut prev = crate::moves::Vec3::default();
    for m in moves {
        let coords = m.point().coords();
        let length = m.length();
        if length != 0.0 {
            if let Some(e) = m.extrusion_mut() {
                let scale = coords.sub(prev).norm() / length;
                *e *= scale.min(MAX_EXTRUSION_SCALE);
            }
        }
        prev = coords;
    }
}

/// A tilted nozzle lays a foreshortened bead, so extrusion shrinks by
/// cos(tilt) at the corrected radius.
fn rescale_by_tilt(state: &DeformerState, moves: &mut [Move]) -> Result<(), RotationError> {
    for m in moves {
        let radius = m.point().coords().xy_norm();
        let tilt = state.tilt(radius)?;
        if let Some(e) = m.extrusion_mut() {
            *e *= tilt.cos();
        }
    }
    Ok(())
}
