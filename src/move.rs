use std::fmt::Display;

use bitflags::bitflags;

use crate::{
    coordinates::{File, Square},
    piece::{Color, PieceType},
};

/// The two directions a king can castle in.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum CastlingSide {
    Kingside = 0,
    Queenside = 1,
}

impl CastlingSide {
    pub const COUNT: usize = 2;

    pub const ALL: [CastlingSide; CastlingSide::COUNT] = [CastlingSide::Kingside, CastlingSide::Queenside];

    /// File the king lands on.
    pub fn king_target_file(self) -> File {
        match self {
            CastlingSide::Kingside => File::G,
            CastlingSide::Queenside => File::C,
        }
    }

    /// File the rook starts from.
    pub fn rook_source_file(self) -> File {
        match self {
            CastlingSide::Kingside => File::H,
            CastlingSide::Queenside => File::A,
        }
    }

    /// File the rook lands on.
    pub fn rook_target_file(self) -> File {
        match self {
            CastlingSide::Kingside => File::F,
            CastlingSide::Queenside => File::D,
        }
    }
}

impl From<CastlingSide> for usize {
    fn from(side: CastlingSide) -> Self {
        side as usize
    }
}

bitflags! {
    /// The four independent castling rights.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CastlingRights: u8 {
        const WHITE_KINGSIDE = 0b0001;
        const BLACK_KINGSIDE = 0b0010;
        const WHITE_QUEENSIDE = 0b0100;
        const BLACK_QUEENSIDE = 0b1000;
    }
}

impl CastlingRights {
    /// Returns the single right for a color and side.
    pub fn new(color: Color, side: CastlingSide) -> CastlingRights {
        match (color, side) {
            (Color::White, CastlingSide::Kingside) => CastlingRights::WHITE_KINGSIDE,
            (Color::Black, CastlingSide::Kingside) => CastlingRights::BLACK_KINGSIDE,
            (Color::White, CastlingSide::Queenside) => CastlingRights::WHITE_QUEENSIDE,
            (Color::Black, CastlingSide::Queenside) => CastlingRights::BLACK_QUEENSIDE,
        }
    }

    /// Returns both rights of a color.
    pub fn for_color(color: Color) -> CastlingRights {
        CastlingRights::new(color, CastlingSide::Kingside) | CastlingRights::new(color, CastlingSide::Queenside)
    }
}

/// A move from one square to another.
///
/// A move is a small value that never owns board state. The `capture` and `en_passant` fields are bookkeeping filled in
/// when the move is produced against a position. Equality only looks at the source square, the target square and the
/// promotion, so a parsed move compares equal to the generated move it names.
#[derive(Debug, Clone, Copy)]
pub struct Move {
    from_square: Square,
    to_square: Square,
    promotion: Option<PieceType>,
    capture: Option<PieceType>,
    castling: Option<CastlingSide>,
    en_passant: bool,
}

impl Move {
    /// Placeholder used to fill move buffers. It is never produced by the generator.
    pub const NULL: Move = Move {
        from_square: Square::A1,
        to_square: Square::A1,
        promotion: None,
        capture: None,
        castling: None,
        en_passant: false,
    };

    /// Creates a quiet move.
    pub fn new(from_square: Square, to_square: Square) -> Self {
        Self { from_square, to_square, ..Move::NULL }
    }

    /// Creates a move that captures `capture` on the target square.
    pub fn new_capture(from_square: Square, to_square: Square, capture: PieceType) -> Self {
        Self { from_square, to_square, capture: Some(capture), ..Move::NULL }
    }

    /// Creates a pawn promotion, capturing or not.
    pub fn new_promotion(
        from_square: Square,
        to_square: Square,
        capture: Option<PieceType>,
        promotion: PieceType,
    ) -> Self {
        debug_assert!(!matches!(promotion, PieceType::Pawn | PieceType::King));
        Self { from_square, to_square, capture, promotion: Some(promotion), ..Move::NULL }
    }

    /// Creates an en passant capture. The captured pawn is not on the target square.
    pub fn new_en_passant(from_square: Square, to_square: Square) -> Self {
        Self { from_square, to_square, capture: Some(PieceType::Pawn), en_passant: true, ..Move::NULL }
    }

    /// Creates a castling move, expressed as the king's two-file step.
    pub fn new_castling(from_square: Square, to_square: Square, side: CastlingSide) -> Self {
        Self { from_square, to_square, castling: Some(side), ..Move::NULL }
    }

    /// Returns the source square of the move.
    pub fn from_square(&self) -> Square {
        self.from_square
    }

    /// Returns the destination square of the move.
    pub fn to_square(&self) -> Square {
        self.to_square
    }

    /// Returns the piece type a pawn promotes to, if any.
    pub fn promotion(&self) -> Option<PieceType> {
        self.promotion
    }

    /// Returns the type of the captured piece, if any.
    pub fn capture(&self) -> Option<PieceType> {
        self.capture
    }

    /// Returns the castling side if this is a castling move.
    pub fn castling(&self) -> Option<CastlingSide> {
        self.castling
    }

    /// Returns whether this is an en passant capture.
    pub fn is_en_passant(&self) -> bool {
        self.en_passant
    }

    /// Returns the move in pure coordinate notation, castling included (e.g. "e1g1").
    pub fn to_coordinate_string(&self) -> String {
        match self.promotion {
            Some(promotion) => format!("{}{}{}", self.from_square, self.to_square, promotion.to_lowercase_char()),
            None => format!("{}{}", self.from_square, self.to_square),
        }
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.from_square == other.from_square
            && self.to_square == other.to_square
            && self.promotion == other.promotion
    }
}

impl Eq for Move {}

impl std::hash::Hash for Move {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.from_square.hash(state);
        self.to_square.hash(state);
        self.promotion.hash(state);
    }
}

impl Display for Move {
    /// Castling moves are written `0-0` and `0-0-0`, everything else in coordinate notation.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.castling {
            Some(CastlingSide::Kingside) => write!(f, "0-0"),
            Some(CastlingSide::Queenside) => write!(f, "0-0-0"),
            None => write!(f, "{}", self.to_coordinate_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_new_capture_move() {
        let mv = Move::new_capture(Square::E4, Square::D5, PieceType::Pawn);
        assert_eq!(mv.from_square(), Square::E4);
        assert_eq!(mv.to_square(), Square::D5);
        assert_eq!(mv.capture(), Some(PieceType::Pawn));
        assert!(!mv.is_en_passant());
        assert_eq!(mv.castling(), None);
    }

    #[test]
    fn test_new_en_passant_move() {
        let mv = Move::new_en_passant(Square::D5, Square::E6);
        assert!(mv.is_en_passant());
        assert_eq!(mv.capture(), Some(PieceType::Pawn));
    }

    #[test]
    fn test_display() {
        assert_eq!(Move::new(Square::E2, Square::E4).to_string(), "e2e4");
        assert_eq!(Move::new_promotion(Square::A7, Square::A8, None, PieceType::Queen).to_string(), "a7a8q");
        assert_eq!(
            Move::new_promotion(Square::B7, Square::A8, Some(PieceType::Rook), PieceType::Knight).to_string(),
            "b7a8n"
        );
        assert_eq!(Move::new_castling(Square::E1, Square::G1, CastlingSide::Kingside).to_string(), "0-0");
        assert_eq!(Move::new_castling(Square::E8, Square::C8, CastlingSide::Queenside).to_string(), "0-0-0");
        assert_eq!(Move::new_castling(Square::E8, Square::C8, CastlingSide::Queenside).to_coordinate_string(), "e8c8");
    }

    #[test]
    fn test_equality_ignores_bookkeeping() {
        let quiet = Move::new(Square::E4, Square::D5);
        let capture = Move::new_capture(Square::E4, Square::D5, PieceType::Knight);
        assert_eq!(quiet, capture);
    }

    #[test]
    fn test_equality_includes_promotion() {
        let queen = Move::new_promotion(Square::A7, Square::A8, None, PieceType::Queen);
        let knight = Move::new_promotion(Square::A7, Square::A8, None, PieceType::Knight);
        let plain = Move::new(Square::A7, Square::A8);
        assert_ne!(queen, knight);
        assert_ne!(queen, plain);

        let set: HashSet<Move> = [queen, knight, plain, queen].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_castling_rights() {
        assert_eq!(CastlingRights::new(Color::Black, CastlingSide::Queenside), CastlingRights::BLACK_QUEENSIDE);
        assert_eq!(
            CastlingRights::for_color(Color::White),
            CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE
        );
        assert_eq!(CastlingRights::all().bits(), 0b1111);
    }
}
