//! Pipeline facade
//! Runs parse -> untransform -> emit as one batch transform. Either the
//! whole corrected command sequence comes back, or an error does --
//! there is no partial output.

use thiserror::Error;

use crate::state::{DeformerState, RotationError};
use crate::{emit, parser, untransform};

#[derive(Error, Debug)]
pub enum UndeformError {
    #[error("missing deformer state, did you forget to call Undeformer::set_state?")]
    MissingState,

    #[error(transparent)]
    Rotation(#[from] RotationError),
}

/// Owns the optional deformer state and runs the transform. The state
/// must be supplied before `undeform` is called; running without one is
/// a configuration error, not an empty result.
#[derive(Debug, Default)]
pub struct Undeformer {
    state: Option<DeformerState>,
}

impl Undeformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: DeformerState) -> Self {
        Self { state: Some(state) }
    }

    pub fn set_state(&mut self, state: DeformerState) {
        self.state = Some(state);
    }

    /// Transform slicer G-code into four-axis polar/tilt G-code.
    pub fn undeform<'a, I>(&self, gcode: I) -> Result<Vec<String>, UndeformError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let state = self.state.as_ref().ok_or(UndeformError::MissingState)?;

        let mut moves = parser::parse_moves(state, gcode);
        untransform::untransform(state, &mut moves)?;
        let lines = emit::emit(state, &moves)?;

        Ok(lines)
    }
}
