//! Polar/tilt G-code emitter
//! Re-expresses corrected Cartesian moves in the four-axis machine frame:
//! C rotation angle, X radius, Z height, B nozzle tilt. Output runs in
//! inverse-time feed mode (G93) except for moves that have no
//! well-defined inverse-time feed, which are bracketed back into G94.
//!
//! Printing on a different four-axis machine means changing this module
//! and nothing else.

use crate::moves::Move;
use crate::state::{DeformerState, RotationError};

/// Distance from the tilt pivot to the nozzle tip, mm.
const NOZZLE_OFFSET: f64 = 43.0;

/// Feed used for moves that have no inverse-time feed; only ever
/// emitted under G94.
const FALLBACK_FEED: &str = "F50000";

/// Machine start pose, matching the parser's start position.
const START_HEIGHT: f64 = 20.0;

/// Serialize corrected moves as four-axis G-code lines.
pub fn emit(state: &DeformerState, moves: &[Move]) -> Result<Vec<String>, RotationError> {
    let mut lines = Vec::new();

    lines.push("G94 ; mm/min feed".to_string());
    lines.push("G28 ; home".to_string());
    lines.push("M83 ; relative extrusion".to_string());
    lines.push("G1 E10 ; prime extruder".to_string());
    lines.push("G94 ; mm/min feed".to_string());
    lines.push("G90 ; absolute positioning".to_string());
    lines.push(format!(
        "G0 C{:.5} X{:.5} Z{:.5} B{:.5}",
        0.0,
        0.0,
        START_HEIGHT,
        -state.tilt(0.0)?.to_degrees()
    ));
    lines.push("G93 ; inverse time feed".to_string());

    let mut prev_theta = 0.0_f64;
    let mut theta_accum = 0.0_f64;

    for m in moves {
        let point = m.point();
        if point.is_suppressed() {
            continue;
        }
        let position = point.coords();
        if position.z < 0.0 {
            continue;
        }

        let mut r = position.xy_norm();
        let theta = position.y.atan2(position.x);
        let mut z = position.z;

        let tilt = state.tilt(r)?;

        // The nozzle tip swings on an arc around the tilt pivot
        r += tilt.sin() * NOZZLE_OFFSET;
        z += (tilt.cos() - 1.0) * NOZZLE_OFFSET;

        // Unwrap across the +/- pi seam so C never jumps a full turn
        let mut delta_theta = theta - prev_theta;
        if delta_theta > std::f64::consts::PI {
            delta_theta -= 2.0 * std::f64::consts::PI;
        }
        if delta_theta < -std::f64::consts::PI {
            delta_theta += 2.0 * std::f64::consts::PI;
        }
        theta_accum += delta_theta;

        let mut line = format!(
            "{} C{:.5} X{:.5} Z{:.5} B{:.5}",
            m.kind().word(),
            theta_accum.to_degrees(),
            r,
            z,
            -tilt.to_degrees()
        );

        if let Some(e) = m.extrusion() {
            line.push_str(&format!(" E{:.4}", e));
        }

        match m.inverse_time_feed() {
            Some(itf) => {
                line.push_str(&format!(" F{:.4}", itf));
                lines.push(line);
            }
            None => {
                // This move has no inverse-time duration; run it under
                // G94 and drop straight back into G93
                line.push(' ');
                line.push_str(FALLBACK_FEED);
                lines.push("G94".to_string());
                lines.push(line);
                lines.push("G93".to_string());
            }
        }

        prev_theta = theta;
    }

    Ok(lines)
}

/// Number of fixed preamble lines before the first motion line.
#[cfg(test)]
pub const PREAMBLE_LINES: usize = 8;
