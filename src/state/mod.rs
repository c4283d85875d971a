//! Deformer state: the rotation profile and alignment offsets that
//! describe how the part was virtually warped before slicing.
//!
//! The state is built once by the caller and passed explicitly into every
//! pipeline stage; nothing in the pipeline mutates it.

use serde::Deserialize;
use thiserror::Error;

use crate::moves::Vec3;

#[derive(Error, Debug)]
pub enum RotationError {
    #[error("rotation profile is not finite at radius {radius}")]
    NonFinite { radius: f64 },
}

/// Rotation profile plus the fixed offsets applied to every parsed
/// position. The profile maps radial distance (mm) to nozzle tilt
/// (radians) and must be finite over every radius the print reaches.
pub struct DeformerState {
    rotation: Box<dyn Fn(f64) -> f64>,
    pub offsets: Vec3,
}

impl DeformerState {
    pub fn new(rotation: impl Fn(f64) -> f64 + 'static, offsets: Vec3) -> Self {
        Self {
            rotation: Box::new(rotation),
            offsets,
        }
    }

    /// Evaluate the tilt angle at a radius. A NaN/infinite profile value
    /// is fatal for the whole run; there is no per-move recovery.
    pub fn tilt(&self, radius: f64) -> Result<f64, RotationError> {
        let angle = (self.rotation)(radius);
        if angle.is_finite() {
            Ok(angle)
        } else {
            Err(RotationError::NonFinite { radius })
        }
    }
}

impl std::fmt::Debug for DeformerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeformerState")
            .field("offsets", &self.offsets)
            .finish_non_exhaustive()
    }
}

/// On-disk profile description: offsets plus sampled tilt angles,
/// interpolated linearly between samples and clamped past the ends.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    pub offsets: [f64; 3],
    pub samples: Vec<ProfileSample>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProfileSample {
    pub radius: f64,
    pub angle_degrees: f64,
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile needs at least one sample")]
    Empty,

    #[error("profile samples must be sorted by radius (sample {index} is out of order)")]
    Unsorted { index: usize },

    #[error("profile sample {index} is not finite")]
    NonFinite { index: usize },
}

impl ProfileConfig {
    pub fn into_state(self) -> Result<DeformerState, ProfileError> {
        if self.samples.is_empty() {
            return Err(ProfileError::Empty);
        }
        for (index, s) in self.samples.iter().enumerate() {
            if !s.radius.is_finite() || !s.angle_degrees.is_finite() {
                return Err(ProfileError::NonFinite { index });
            }
            if index > 0 && s.radius < self.samples[index - 1].radius {
                return Err(ProfileError::Unsorted { index });
            }
        }

        let samples: Vec<(f64, f64)> = self
            .samples
            .iter()
            .map(|s| (s.radius, s.angle_degrees.to_radians()))
            .collect();
        let offsets = Vec3::new(self.offsets[0], self.offsets[1], self.offsets[2]);

        Ok(DeformerState::new(
            move |radius| interpolate(&samples, radius),
            offsets,
        ))
    }
}

fn interpolate(samples: &[(f64, f64)], radius: f64) -> f64 {
    let first = samples[0];
    let last = samples[samples.len() - 1];
    if radius <= first.0 {
        return first.1;
    }
    if radius >= last.0 {
        return last.1;
    }

    for pair in samples.windows(2) {
        let (r0, a0) = pair[0];
        let (r1, a1) = pair[1];
        if radius <= r1 {
            if r1 == r0 {
                return a1;
            }
            let t = (radius - r0) / (r1 - r0);
            return a0 + (a1 - a0) * t;
        }
    }

    last.1
}
