use thiserror::Error;

use crate::{
    coordinates::{CoordinatesError, File, Rank, Square},
    move_gen::{generation::generate_legal, move_list::MoveList},
    piece::{PieceError, PieceType},
    position::Position,
    r#move::{CastlingSide, Move},
};

/// Represents errors that can occur when parsing chess move notation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotationError {
    /// Error when the source square coordinates in the notation are invalid.
    #[error("Invalid from square: {0}")]
    InvalidFromSquare(CoordinatesError),

    /// Error when the destination square coordinates in the notation are invalid.
    #[error("Invalid to square: {0}")]
    InvalidToSquare(CoordinatesError),

    /// Error when the promotion piece notation is invalid.
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(PieceError),

    /// Error when the overall notation format is incorrect.
    #[error("Invalid notation: {0}")]
    InvalidNotation(String),

    /// Error when there is no piece present at the specified source square.
    #[error("There is not a piece at the from square: {0}")]
    NoPieceAtFromSquare(Square),

    /// Error when the move is well formed but not legal in the position.
    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

/// Parses a chess move in coordinate notation against a position.
///
/// Coordinate notation represents moves as the source square followed by the destination square, optionally followed by
/// a promotion piece (e.g., "e2e4", "e7e8q"). Castling may also be written "0-0" and "0-0-0", or with the letter O; it
/// is resolved to the king move of the side to move. The captured piece, en passant and castling are read from the
/// position. The move is not checked for legality, see `find_legal_move`.
///
/// # Errors
/// * `InvalidFromSquare` - If the source square notation is invalid
/// * `InvalidToSquare` - If the destination square notation is invalid
/// * `InvalidPromotion` - If the promotion piece notation is invalid
/// * `NoPieceAtFromSquare` - If there is no piece at the source square
/// * `InvalidNotation` - If the notation format is incorrect
pub fn parse_coordinate_notation(position: &Position, notation: &str) -> Result<Move, NotationError> {
    let home_rank = Rank::R1.relative_to_color(position.side_to_move());
    let king = Square::new(File::E, home_rank);
    for side in CastlingSide::ALL {
        let (digits, letters) = match side {
            CastlingSide::Kingside => ("0-0", "O-O"),
            CastlingSide::Queenside => ("0-0-0", "O-O-O"),
        };
        if notation == digits || notation == letters {
            return Ok(Move::new_castling(king, Square::new(side.king_target_file(), home_rank), side));
        }
    }

    if !notation.is_ascii() || !(4..=5).contains(&notation.len()) {
        return Err(NotationError::InvalidNotation(notation.to_string()));
    }

    let from = Square::try_from(&notation[0..2]).map_err(NotationError::InvalidFromSquare)?;
    let to = Square::try_from(&notation[2..4]).map_err(NotationError::InvalidToSquare)?;
    let promotion = notation[4..]
        .chars()
        .next()
        .map(PieceType::try_from)
        .transpose()
        .map_err(NotationError::InvalidPromotion)?;

    if matches!(promotion, Some(PieceType::Pawn | PieceType::King)) {
        return Err(NotationError::InvalidNotation(notation.to_string()));
    }

    let piece = position.piece_at(from).ok_or(NotationError::NoPieceAtFromSquare(from))?;
    let capture = position.piece_at(to).map(|captured| captured.piece_type());

    if let Some(promotion) = promotion {
        return Ok(Move::new_promotion(from, to, capture, promotion));
    }

    if let Some(capture) = capture {
        return Ok(Move::new_capture(from, to, capture));
    }

    // A pawn moving diagonally to an empty square must be capturing en passant.
    if piece.piece_type() == PieceType::Pawn && from.file() != to.file() {
        return Ok(Move::new_en_passant(from, to));
    }

    // A king moving from file e to g or c on its home rank must be castling.
    if piece.piece_type() == PieceType::King && from == king && to.rank() == home_rank {
        if let Some(side) = CastlingSide::ALL.into_iter().find(|side| side.king_target_file() == to.file()) {
            return Ok(Move::new_castling(from, to, side));
        }
    }

    Ok(Move::new(from, to))
}

/// Parses a move and returns the matching legal move of the position.
///
/// # Errors
/// Returns the parsing errors of `parse_coordinate_notation`, or `IllegalMove` when no legal move matches.
pub fn find_legal_move(position: &mut Position, notation: &str) -> Result<Move, NotationError> {
    let parsed = parse_coordinate_notation(position, notation)?;

    let mut moves = MoveList::default();
    generate_legal(position, &mut moves);

    let found = moves.iter().find(|mv| *mv == parsed);
    found.ok_or_else(|| NotationError::IllegalMove(notation.to_string()))
}
