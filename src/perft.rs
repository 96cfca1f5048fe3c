use std::{collections::TryReserveError, io::Write, time::Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::get_config,
    move_gen::{generation::generate_legal, move_list::MoveList},
    position::Position,
    r#move::Move,
};

/// Represents errors that can occur during perft (performance test) operations.
#[derive(Error, Debug)]
pub enum PerftError {
    #[error("Perft depth {depth} exceeds the limit of {limit}")]
    DepthLimitExceeded { depth: u32, limit: u32 },

    #[error("Unable to allocate the search stack for depth {depth}: {source}")]
    Allocation {
        depth: u32,
        #[source]
        source: TryReserveError,
    },

    #[error("Unable to write the perft report: {0}")]
    Io(#[from] std::io::Error),
}

/// One frame of the search stack: the legal moves of the position at this ply, the next one to visit and the move
/// that led here.
#[derive(Debug, Clone, Default)]
struct Plie {
    moves: MoveList,
    child_i: usize,
    generator: Option<Move>,
}

impl Plie {
    fn is_exhausted(&self) -> bool {
        self.child_i == self.moves.len()
    }
}

/// An explicit stack of frames walking the game tree depth first without recursion.
///
/// The frames are allocated once, one per ply, and reused as the walk goes up and down. The working position is made
/// and unmade in place and is back to its original state when the walk completes.
struct SearchStack<'a> {
    position: &'a mut Position,
    plies: Vec<Plie>,
}

impl<'a> SearchStack<'a> {
    /// Allocates one frame per ply. `depth` must be at least 1.
    fn new(position: &'a mut Position, depth: u32) -> Result<Self, PerftError> {
        debug_assert!(depth > 0);

        let mut plies = Vec::new();
        plies
            .try_reserve_exact(depth as usize)
            .map_err(|source| PerftError::Allocation { depth, source })?;
        plies.resize_with(depth as usize, Plie::default);

        Ok(Self { position, plies })
    }

    /// Fills the frame at `ply` with the legal moves of the working position.
    fn enter(&mut self, ply: usize, generator: Option<Move>) {
        let frame = &mut self.plies[ply];
        frame.generator = generator;
        frame.child_i = 0;
        frame.moves.clear();
        generate_legal(self.position, &mut frame.moves);
    }

    /// Walks the tree and counts the positions found on the last frame's ply.
    ///
    /// The walk descends into the next unvisited move of the current frame, counts the moves of the last frame as
    /// leaves without visiting them, and climbs back up by unmaking the frame's generator once its moves are exhausted.
    ///
    /// # Returns
    /// The number of leaf positions, one per legal move of every position on the ply before the last.
    fn run(&mut self) -> u64 {
        let last = self.plies.len() - 1;
        let mut nodes = 0;
        let mut ply = 0;
        self.enter(0, None);

        loop {
            let frame = &mut self.plies[ply];

            // Children of the last frame are leaves and are counted without being visited.
            if ply == last {
                nodes += (frame.moves.len() - frame.child_i) as u64;
                frame.child_i = frame.moves.len();
            }

            if frame.is_exhausted() {
                if let Some(mv) = frame.generator {
                    self.position.unmake(mv);
                }
                if ply == 0 {
                    break;
                }
                ply -= 1;
                continue;
            }

            let mv = frame.moves[frame.child_i];
            frame.child_i += 1;
            self.position.make(mv);
            ply += 1;
            self.enter(ply, Some(mv));
        }

        nodes
    }
}

fn check_depth(depth: u32) -> Result<(), PerftError> {
    let limit = get_config().perft_max_depth;
    if depth > limit {
        warn!(depth, limit, "perft depth limit exceeded");
        return Err(PerftError::DepthLimitExceeded { depth, limit });
    }
    Ok(())
}

/// Counts the positions reachable from `position` in exactly `depth` plies of legal play.
///
/// The position is used as the working position of the walk and is restored before returning. Depth 0 counts the
/// position itself.
///
/// # Parameters
/// * `position` - The position to count from, made and unmade in place
/// * `depth` - The number of plies to play, at most the configured `perft_max_depth`
///
/// # Returns
/// The number of positions reachable in exactly `depth` plies.
///
/// # Errors
/// Fails when `depth` exceeds the configured `perft_max_depth`, or when the search stack cannot be allocated.
pub fn perft(position: &mut Position, depth: u32) -> Result<u64, PerftError> {
    check_depth(depth)?;
    if depth == 0 {
        return Ok(1);
    }

    let start = Instant::now();
    let nodes = SearchStack::new(position, depth)?.run();
    debug!(depth, nodes, elapsed_ms = start.elapsed().as_millis() as u64, "perft");

    Ok(nodes)
}

/// Runs a perft and writes the count below every root move to `sink`.
///
/// Each root move is written as `<move>: <count>` in coordinate notation, followed by a blank line and `Nodes searched:
/// <total>`. A depth above the configured limit writes `<depth limit exceeded>` and counts 0.
///
/// # Parameters
/// * `sink` - Where the report is written
/// * `position` - The position to count from, restored before returning
/// * `depth` - The number of plies to play
///
/// # Returns
/// The total number of positions, or 0 when the depth limit is exceeded.
///
/// # Errors
/// Fails when writing to `sink` fails or when the search stack of a root move cannot be allocated.
pub fn divide<W: Write>(sink: &mut W, position: &mut Position, depth: u32) -> Result<u64, PerftError> {
    if let Err(PerftError::DepthLimitExceeded { .. }) = check_depth(depth) {
        writeln!(sink, "<depth limit exceeded>")?;
        return Ok(0);
    }

    let total = if depth == 0 {
        1
    } else {
        let mut moves = MoveList::default();
        generate_legal(position, &mut moves);

        let mut total = 0;
        for mv in moves.iter() {
            position.make(mv);
            let nodes = perft(position, depth - 1);
            position.unmake(mv);

            let nodes = nodes?;
            writeln!(sink, "{}: {}", mv.to_coordinate_string(), nodes)?;
            total += nodes;
        }
        total
    };

    writeln!(sink)?;
    writeln!(sink, "Nodes searched: {}", total)?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coordinates::Square, piece::Piece, r#move::CastlingRights};

    #[test]
    fn test_perft_initial_position() {
        let mut position = Position::new();
        let expected = [1, 20, 400, 8902, 197281];

        for (depth, nodes) in expected.into_iter().enumerate() {
            assert_eq!(perft(&mut position, depth as u32).unwrap(), nodes);
            assert_eq!(position, Position::new());
        }
    }

    #[test]
    fn test_perft_with_castling_and_promotions() {
        // Kings, rooks and pawns about to promote on both sides.
        let mut position = Position::EMPTY;
        for (piece, square) in [
            (Piece::WHITE_KING, Square::E1),
            (Piece::WHITE_ROOK, Square::A1),
            (Piece::WHITE_ROOK, Square::H1),
            (Piece::WHITE_PAWN, Square::B7),
            (Piece::BLACK_KING, Square::E8),
            (Piece::BLACK_ROOK, Square::H8),
            (Piece::BLACK_PAWN, Square::G2),
        ] {
            position.put_piece(piece, square);
        }
        position.set_castling_rights(CastlingRights::all() - CastlingRights::BLACK_QUEENSIDE);
        let original = position.clone();

        let nodes = perft(&mut position, 3).unwrap();
        assert!(nodes > 0);
        assert_eq!(position, original);
    }

    #[test]
    fn test_perft_depth_limit() {
        let mut position = Position::new();
        let limit = get_config().perft_max_depth;

        let result = perft(&mut position, limit + 1);
        assert!(matches!(result, Err(PerftError::DepthLimitExceeded { depth, .. }) if depth == limit + 1));
    }

    #[test]
    fn test_divide_output() {
        let mut position = Position::new();
        let mut output = Vec::new();

        let total = divide(&mut output, &mut position, 2).unwrap();
        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(total, 400);
        assert_eq!(lines.len(), 22);
        assert!(lines.contains(&"e2e4: 20"));
        assert!(lines.contains(&"g1f3: 20"));
        assert_eq!(lines[20], "");
        assert_eq!(lines[21], "Nodes searched: 400");
        assert_eq!(position, Position::new());
    }

    #[test]
    fn test_divide_depth_limit() {
        let mut position = Position::new();
        let mut output = Vec::new();
        let limit = get_config().perft_max_depth;

        assert_eq!(divide(&mut output, &mut position, limit + 1).unwrap(), 0);
        assert_eq!(String::from_utf8(output).unwrap(), "<depth limit exceeded>\n");
    }

    #[test]
    fn test_divide_depth_zero() {
        let mut position = Position::new();
        let mut output = Vec::new();

        assert_eq!(divide(&mut output, &mut position, 0).unwrap(), 1);
        assert_eq!(String::from_utf8(output).unwrap(), "\nNodes searched: 1\n");
    }
}
