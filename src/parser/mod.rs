//! Line parser and move segmenter
//! Turns raw slicer G-code into the typed move sequence, splitting feed
//! moves into bounded-length segments so that rapids cannot dive through
//! the part after untransformation and feed moves stay smooth.

use crate::lexer;
use crate::moves::{FastMove, Move, MoveKind, PathPoint, SlowMove, Vec3};
use crate::state::DeformerState;

/// Longest allowed feed segment, mm.
const MAX_SEGMENT: f64 = 1.0;

/// Slicer output starts the virtual toolhead here.
const START_POSITION: Vec3 = Vec3 {
    x: 0.0,
    y: 0.0,
    z: 20.0,
};

/// Parse raw G-code lines into moves. Never fails: lines that do not
/// lex, or that carry no G0/G1 word, are skipped (feed-rate words on
/// such lines still update the running feed).
pub fn parse_moves<'a, I>(state: &DeformerState, lines: I) -> Vec<Move>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut pos = START_POSITION;
    let mut feed = 0.0_f64;
    let mut moves = Vec::new();

    for line in lines {
        let words = match lexer::lex_line(line) {
            Ok(words) => words,
            Err(_) => continue,
        };

        let mut kind: Option<MoveKind> = None;
        let mut target = pos;
        let mut extrusion: Option<f64> = None;

        for w in &words {
            match w.letter {
                'G' if w.value == 0.0 => kind = Some(MoveKind::Rapid),
                'G' if w.value == 1.0 => kind = Some(MoveKind::Feed),
                'X' => target.x = w.value,
                'Y' => target.y = w.value,
                'Z' => target.z = w.value,
                'E' => extrusion = Some(w.value),
                'F' => feed = w.value,
                _ => {}
            }
        }

        let kind = match kind {
            Some(kind) => kind,
            // No motion word: state updates only, axis words do not move us
            None => continue,
        };

        let delta = target.sub(pos);
        let distance = delta.norm();

        if kind == MoveKind::Feed && distance > 0.0 {
            let segments = (distance / MAX_SEGMENT).ceil() as usize;
            let seg_length = distance / segments as f64;

            // Inverse time feed: 1 / (min/mm * mm) = 1/min. Zero feed
            // would be a zero-duration move; leave the feed undefined
            // instead of dividing by it.
            let inverse_time_feed = if feed > 0.0 {
                Some(feed / seg_length)
            } else {
                None
            };

            for i in 0..segments {
                let fraction = (i + 1) as f64 / segments as f64;
                let seg_end = pos.add(delta.scale(fraction)).add(state.offsets);
                moves.push(Move::Slow(SlowMove {
                    point: PathPoint::Active(seg_end),
                    extrusion: extrusion.map(|e| e / segments as f64),
                    inverse_time_feed,
                    length: seg_length,
                    start: pos,
                    end: target,
                    unsegmented_length: distance,
                }));
            }
        } else {
            moves.push(Move::Fast(FastMove {
                point: PathPoint::Active(target.add(state.offsets)),
                extrusion,
            }));
        }

        pos = target;
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flat_state() -> DeformerState {
        DeformerState::new(|_| 0.0, Vec3::default())
    }

    #[test]
    fn test_feed_move_is_segmented() {
        let state = flat_state();
        let moves = parse_moves(&state, ["G0 Z5", "G1 X7.5 Y0 Z5 F600 E3"]);

        // One rapid plus ceil(7.5) = 8 segments
        assert_eq!(moves.len(), 9);

        let slow: Vec<&SlowMove> = moves
            .iter()
            .filter_map(|m| match m {
                Move::Slow(s) => Some(s),
                Move::Fast(_) => None,
            })
            .collect();
        assert_eq!(slow.len(), 8);

        let total: f64 = slow.iter().map(|s| s.length).sum();
        assert!((total - 7.5).abs() < 1e-9);
        for s in &slow {
            assert!(s.length <= MAX_SEGMENT + 1e-12);
            assert_eq!(s.unsegmented_length, 7.5);
            assert_eq!(s.inverse_time_feed, Some(600.0 / s.length));
            // Extrusion prorated equally
            assert!((s.extrusion.unwrap() - 3.0 / 8.0).abs() < 1e-12);
        }
        assert_eq!(slow.last().unwrap().point.coords(), Vec3::new(7.5, 0.0, 5.0));
    }

    #[test]
    fn test_rapid_is_a_single_move() {
        let state = flat_state();
        let moves = parse_moves(&state, ["G0 X30 Y40"]);

        assert_eq!(moves.len(), 1);
        match &moves[0] {
            Move::Fast(m) => {
                assert_eq!(m.point.coords(), Vec3::new(30.0, 40.0, 20.0));
                assert_eq!(m.extrusion, None);
            }
            Move::Slow(_) => panic!("expected a rapid"),
        }
    }

    #[test]
    fn test_unspecified_axes_keep_running_position() {
        let state = flat_state();
        let moves = parse_moves(&state, ["G0 X5 Y5 Z1", "G0 Y9"]);

        assert_eq!(moves[1].point().coords(), Vec3::new(5.0, 9.0, 1.0));
    }

    #[test]
    fn test_feed_word_alone_updates_state_without_a_move() {
        let state = flat_state();
        let moves = parse_moves(&state, ["F1200", "G1 X2 Y0 Z20"]);

        assert_eq!(moves.len(), 2);
        for m in &moves {
            assert_eq!(m.inverse_time_feed(), Some(1200.0 / m.length()));
        }
    }

    #[test]
    fn test_zero_feed_rate_leaves_inverse_time_feed_absent() {
        let state = flat_state();
        let moves = parse_moves(&state, ["G1 X3 Y0 Z20 E1"]);

        assert_eq!(moves.len(), 3);
        for m in &moves {
            assert_eq!(m.inverse_time_feed(), None);
        }
    }

    #[test]
    fn test_zero_length_feed_move_becomes_fast() {
        let state = flat_state();
        // E-only retraction at the current position
        let moves = parse_moves(&state, ["G1 F1800 E-2"]);

        assert_eq!(moves.len(), 1);
        match &moves[0] {
            Move::Fast(m) => assert_eq!(m.extrusion, Some(-2.0)),
            Move::Slow(_) => panic!("zero-length feed move must not be segmented"),
        }
    }

    #[test]
    fn test_unsupported_lines_are_skipped() {
        let state = flat_state();
        let moves = parse_moves(
            &state,
            ["M117 printing...", "; comment", "G28", "G1 X1 Y0 Z20 F600"],
        );

        assert_eq!(moves.len(), 1);
    }

    #[test]
    fn test_offsets_are_applied_to_every_position() {
        let state = DeformerState::new(|_| 0.0, Vec3::new(1.0, 2.0, 3.0));
        let moves = parse_moves(&state, ["G0 X10", "G1 X10 Y0.5 Z20 F600"]);

        assert_eq!(moves[0].point().coords(), Vec3::new(11.0, 2.0, 23.0));
        // Segment endpoints carry the offset, parent start/end do not
        match &moves[1] {
            Move::Slow(s) => {
                assert_eq!(s.point.coords(), Vec3::new(11.0, 2.5, 23.0));
                assert_eq!(s.start, Vec3::new(10.0, 0.0, 20.0));
                assert_eq!(s.end, Vec3::new(10.0, 0.5, 20.0));
            }
            Move::Fast(_) => panic!("expected a feed segment"),
        }
    }
}
