use std::fmt::Display;

use once_cell::sync::Lazy;

use crate::{
    bitboard::Bitboard,
    coordinates::{File, Rank, Square},
    piece::{Color, Piece, PieceType},
    r#move::{CastlingRights, CastlingSide, Move},
};

/// Castling rights lost when a piece leaves or lands on each square.
static CASTLING_RIGHTS_MASK: Lazy<[CastlingRights; Square::COUNT]> = Lazy::new(|| {
    let mut mask = [CastlingRights::empty(); Square::COUNT];
    for color in Color::ALL {
        let rank = Rank::R1.relative_to_color(color);
        mask[usize::from(Square::new(File::E, rank))] = CastlingRights::for_color(color);
        for side in CastlingSide::ALL {
            mask[usize::from(Square::new(side.rook_source_file(), rank))] = CastlingRights::new(color, side);
        }
    }
    mask
});

//======================================================================================================================
// Game State implementation
//======================================================================================================================

/// The irreversible part of a position, saved by `apply` so that `undo` can restore it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GameState {
    capture: Option<PieceType>,
    castling_rights: CastlingRights,
    en_passant_square: Option<Square>,
    reversible_moves: u16,
}

//======================================================================================================================
// Position implementation
//======================================================================================================================

/// A chess position.
///
/// The board is stored as one bitboard per piece type and one per color. A square holds a piece when it is a member
/// of exactly one type plane and exactly one color plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    bb_type: [Bitboard; PieceType::COUNT],
    bb_color: [Bitboard; Color::COUNT],
    side_to_move: Color,
    en_passant_square: Option<Square>,
    castling_rights: CastlingRights,
    reversible_moves: u16,
    ply_count: u16,
    history: Vec<GameState>,
}

impl Position {
    /// A board with no pieces, white to move and no castling rights.
    pub const EMPTY: Position = Position {
        bb_type: [Bitboard::EMPTY; PieceType::COUNT],
        bb_color: [Bitboard::EMPTY; Color::COUNT],
        side_to_move: Color::White,
        en_passant_square: None,
        castling_rights: CastlingRights::empty(),
        reversible_moves: 0,
        ply_count: 0,
        history: Vec::new(),
    };

    /// Creates the standard initial position.
    pub fn new() -> Self {
        const BACK_RANK: [PieceType; File::COUNT] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut position = Position::EMPTY;
        for color in Color::ALL {
            let back_rank = Rank::R1.relative_to_color(color);
            let pawn_rank = Rank::R2.relative_to_color(color);
            for (file, piece_type) in File::ALL.into_iter().zip(BACK_RANK) {
                position.put_piece(Piece::new(color, piece_type), Square::new(file, back_rank));
                position.put_piece(Piece::new(color, PieceType::Pawn), Square::new(file, pawn_rank));
            }
        }
        position.castling_rights = CastlingRights::all();
        position
    }

    /// Returns every occupied square.
    pub fn occupied(&self) -> Bitboard {
        self.bb_color[usize::from(Color::White)] | self.bb_color[usize::from(Color::Black)]
    }

    /// Returns the squares occupied by one color.
    pub fn occupied_by(&self, color: Color) -> Bitboard {
        self.bb_color[usize::from(color)]
    }

    /// Returns the squares occupied by one piece type, both colors.
    pub fn pieces(&self, piece_type: PieceType) -> Bitboard {
        self.bb_type[usize::from(piece_type)]
    }

    /// Returns the squares occupied by one piece type of one color.
    pub fn pieces_of(&self, color: Color, piece_type: PieceType) -> Bitboard {
        self.bb_type[usize::from(piece_type)] & self.bb_color[usize::from(color)]
    }

    /// Returns the piece on a square, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let color = if self.bb_color[usize::from(Color::White)].get(square) {
            Color::White
        } else if self.bb_color[usize::from(Color::Black)].get(square) {
            Color::Black
        } else {
            return None;
        };

        PieceType::ALL
            .into_iter()
            .find(|piece_type| self.bb_type[usize::from(*piece_type)].get(square))
            .map(|piece_type| Piece::new(color, piece_type))
    }

    /// Returns the color of the side to move.
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Sets the side to move.
    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    /// Hands the move to the other side. Kept apart from `apply` so that the legality filter can look at the position
    /// from either side.
    pub fn flip_side_to_move(&mut self) {
        self.side_to_move = !self.side_to_move;
    }

    /// Returns the square a pawn may capture en passant on.
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    pub fn set_en_passant_square(&mut self, square: Option<Square>) {
        self.en_passant_square = square;
    }

    /// Returns the remaining castling rights.
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn set_castling_rights(&mut self, rights: CastlingRights) {
        self.castling_rights = rights;
    }

    /// Returns the number of plies since the last capture or pawn move.
    pub fn reversible_moves(&self) -> u16 {
        self.reversible_moves
    }

    pub fn set_reversible_moves(&mut self, count: u16) {
        self.reversible_moves = count;
    }

    /// Returns the number of plies applied since the position was set up.
    pub fn ply_count(&self) -> u16 {
        self.ply_count
    }

    /// Places a piece on an empty square.
    ///
    /// # Panics
    /// Panics if the square is already occupied.
    pub fn put_piece(&mut self, piece: Piece, square: Square) {
        assert!(!self.occupied().get(square), "Square {} is already occupied.", square);

        self.bb_type[usize::from(piece.piece_type())] |= square;
        self.bb_color[usize::from(piece.color())] |= square;
    }

    /// Removes and returns the piece on a square.
    ///
    /// # Panics
    /// Panics if the square is empty.
    pub fn remove_piece(&mut self, square: Square) -> Piece {
        let piece = self
            .piece_at(square)
            .unwrap_or_else(|| panic!("It is not possible to remove a piece from the empty square {}.", square));

        self.bb_type[usize::from(piece.piece_type())] ^= square;
        self.bb_color[usize::from(piece.color())] ^= square;
        piece
    }

    fn move_piece(&mut self, piece: Piece, from: Square, to: Square) {
        debug_assert_eq!(self.piece_at(from), Some(piece));
        debug_assert_eq!(self.piece_at(to), None);

        let bb = from | to;
        self.bb_type[usize::from(piece.piece_type())] ^= bb;
        self.bb_color[usize::from(piece.color())] ^= bb;
    }

    /// Returns the square of the pawn taken by an en passant capture: beside the source, on the target's file.
    fn en_passant_victim(mv: Move) -> Square {
        Square::new(mv.to_square().file(), mv.from_square().rank())
    }

    fn castling_rook_squares(side: CastlingSide, rank: Rank) -> (Square, Square) {
        (Square::new(side.rook_source_file(), rank), Square::new(side.rook_target_file(), rank))
    }

    /// Applies a move to the board without handing the move to the other side.
    ///
    /// The mover is the color of the piece on the source square. Everything `undo` needs to take the move back,
    /// including the captured piece, is pushed on an internal history.
    ///
    /// # Panics
    /// Panics if the source square is empty.
    pub fn apply(&mut self, mv: Move) {
        let from = mv.from_square();
        let to = mv.to_square();
        let piece = self
            .piece_at(from)
            .unwrap_or_else(|| panic!("Tried to apply {} with no piece on {}.", mv, from));
        let color = piece.color();

        let capture = if mv.is_en_passant() {
            let victim = self.remove_piece(Position::en_passant_victim(mv));
            debug_assert_eq!(victim, Piece::new(!color, PieceType::Pawn));
            Some(PieceType::Pawn)
        } else if self.occupied().get(to) {
            let victim = self.remove_piece(to);
            debug_assert_ne!(victim.color(), color);
            Some(victim.piece_type())
        } else {
            None
        };

        self.history.push(GameState {
            capture,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
            reversible_moves: self.reversible_moves,
        });

        match mv.promotion() {
            Some(promotion) => {
                self.remove_piece(from);
                self.put_piece(Piece::new(color, promotion), to);
            }
            None => self.move_piece(piece, from, to),
        }

        if let Some(side) = mv.castling() {
            let (rook_from, rook_to) = Position::castling_rook_squares(side, from.rank());
            self.move_piece(Piece::new(color, PieceType::Rook), rook_from, rook_to);
        }

        let is_pawn = piece.piece_type() == PieceType::Pawn;
        self.en_passant_square = match (is_pawn, from.up(2 * color.forward())) {
            (true, Ok(double_push)) if double_push == to => from.up(color.forward()).ok(),
            _ => None,
        };

        if is_pawn || capture.is_some() {
            self.reversible_moves = 0;
        } else {
            self.reversible_moves += 1;
        }

        self.castling_rights &= !(CASTLING_RIGHTS_MASK[usize::from(from)] | CASTLING_RIGHTS_MASK[usize::from(to)]);
        self.ply_count += 1;
    }

    /// Takes back a move previously applied with `apply`.
    ///
    /// # Panics
    /// Panics if no move was applied, or if the target square is empty.
    pub fn undo(&mut self, mv: Move) {
        let state = self.history.pop().expect("Tried to undo a move that was never applied.");
        let from = mv.from_square();
        let to = mv.to_square();
        let piece = self.remove_piece(to);
        let color = piece.color();

        if let Some(side) = mv.castling() {
            let (rook_from, rook_to) = Position::castling_rook_squares(side, from.rank());
            self.move_piece(Piece::new(color, PieceType::Rook), rook_to, rook_from);
        }

        let original = match mv.promotion() {
            Some(_) => Piece::new(color, PieceType::Pawn),
            None => piece,
        };
        self.put_piece(original, from);

        if let Some(capture) = state.capture {
            let square = if mv.is_en_passant() { Position::en_passant_victim(mv) } else { to };
            self.put_piece(Piece::new(!color, capture), square);
        }

        self.castling_rights = state.castling_rights;
        self.en_passant_square = state.en_passant_square;
        self.reversible_moves = state.reversible_moves;
        self.ply_count -= 1;
    }

    /// Applies a move and hands the turn to the opponent.
    pub fn make(&mut self, mv: Move) {
        self.apply(mv);
        self.flip_side_to_move();
    }

    /// Exact inverse of `make`.
    pub fn unmake(&mut self, mv: Move) {
        self.flip_side_to_move();
        self.undo(mv);
    }

    /// Returns a compact string representation of the board.
    ///
    /// ```text
    /// 8  r n b q k b n r
    /// 7  p p p p p p p p
    /// 6  . . . . . . . .
    /// 5  . . . . . . . .
    /// 4  . . . . . . . .
    /// 3  . . . . . . . .
    /// 2  P P P P P P P P
    /// 1  R N B Q K B N R
    ///    a b c d e f g h
    /// ```
    pub fn to_compact_string(&self) -> String {
        let mut board = String::with_capacity(171);
        for rank in Rank::ALL.iter().rev() {
            board.push_str(&format!("{}  ", rank));
            for file in File::ALL {
                match self.piece_at(Square::new(file, *rank)) {
                    Some(piece) => board.push(piece.into()),
                    None => board.push('.'),
                }
                board.push(if file == File::H { '\n' } else { ' ' });
            }
        }
        board.push_str("   a b c d e f g h");

        board
    }
}

/// The default position is the empty board, `Position::EMPTY`, ready to be filled with `put_piece`. Use
/// `Position::new()` for the initial layout.
impl Default for Position {
    fn default() -> Self {
        Position::EMPTY
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.to_compact_string())?;
        writeln!(f)?;
        write!(f, "{} to move, castling {:?}, en passant ", self.side_to_move, self.castling_rights)?;
        match self.en_passant_square {
            Some(square) => write!(f, "{}", square),
            None => write!(f, "-"),
        }
    }
}
