/// Typed move model for the undeform pipeline
/// One `Move` is the atomic unit every later stage operates on.

/// 3D point/vector, always millimetres, always f64. The unwrap and
/// comparison logic downstream is sensitive to precision drift, so the
/// whole pipeline sticks to doubles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(self, factor: f64) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Horizontal distance from the vertical machine axis.
    pub fn xy_norm(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Position state of a move. Travel moves that would pass above the part
/// get tagged `Suppressed` instead of having their coordinates poisoned
/// with NaN; the coordinates are kept because extrusion rescaling still
/// measures from a suppressed move as "previous position".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathPoint {
    Active(Vec3),
    Suppressed(Vec3),
}

impl PathPoint {
    pub fn coords(&self) -> Vec3 {
        match *self {
            PathPoint::Active(p) | PathPoint::Suppressed(p) => p,
        }
    }

    pub fn coords_mut(&mut self) -> &mut Vec3 {
        match self {
            PathPoint::Active(p) | PathPoint::Suppressed(p) => p,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, PathPoint::Suppressed(_))
    }
}

/// Originating command kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveKind {
    Rapid,
    Feed,
}

impl MoveKind {
    pub fn word(self) -> &'static str {
        match self {
            MoveKind::Rapid => "G0",
            MoveKind::Feed => "G1",
        }
    }
}

/// Rapid repositioning move. Never feed-rate-limited, never segmented.
#[derive(Debug, Clone, PartialEq)]
pub struct FastMove {
    pub point: PathPoint,
    pub extrusion: Option<f64>,
}

/// One segment of a linear feed move. `start`/`end`/`unsegmented_length`
/// describe the parent move this segment was split from, before the
/// state offsets were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SlowMove {
    pub point: PathPoint,
    pub extrusion: Option<f64>,
    /// 1/min to complete this segment; `None` flags a zero-duration move
    /// that must not be executed under inverse-time feed semantics.
    pub inverse_time_feed: Option<f64>,
    pub length: f64,
    pub start: Vec3,
    pub end: Vec3,
    pub unsegmented_length: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Move {
    Fast(FastMove),
    Slow(SlowMove),
}

impl Move {
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::Fast(_) => MoveKind::Rapid,
            Move::Slow(_) => MoveKind::Feed,
        }
    }

    pub fn point(&self) -> &PathPoint {
        match self {
            Move::Fast(m) => &m.point,
            Move::Slow(m) => &m.point,
        }
    }

    pub fn point_mut(&mut self) -> &mut PathPoint {
        match self {
            Move::Fast(m) => &mut m.point,
            Move::Slow(m) => &mut m.point,
        }
    }

    pub fn extrusion(&self) -> Option<f64> {
        match self {
            Move::Fast(m) => m.extrusion,
            Move::Slow(m) => m.extrusion,
        }
    }

    pub fn extrusion_mut(&mut self) -> &mut Option<f64> {
        match self {
            Move::Fast(m) => &mut m.extrusion,
            Move::Slow(m) => &mut m.extrusion,
        }
    }

    pub fn inverse_time_feed(&self) -> Option<f64> {
        match self {
            Move::Fast(_) => None,
            Move::Slow(m) => m.inverse_time_feed,
        }
    }

    /// Segment length; zero for rapids so they never take part in
    /// length-based extrusion rescaling.
    pub fn length(&self) -> f64 {
        match self {
            Move::Fast(_) => 0.0,
            Move::Slow(m) => m.length,
        }
    }
}
