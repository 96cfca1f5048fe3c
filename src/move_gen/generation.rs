use crate::{
    bitboard::Bitboard,
    coordinates::{File, Rank, Square},
    piece::{Color, PieceType},
    position::Position,
    r#move::{CastlingRights, CastlingSide, Move},
};

use super::{
    attacks::{attack_tables, pawn_attacks},
    move_list::MoveList,
};

/// Walks a generated pawn target back to its source, `delta` squares earlier in index order.
fn source_square(to: Square, delta: i8) -> Square {
    Square::from(u8::from(to).wrapping_add_signed(-delta))
}

fn push_pawn_move(from: Square, to: Square, capture: Option<PieceType>, last_rank: Bitboard, list: &mut MoveList) {
    if last_rank.get(to) {
        for promotion in PieceType::PROMOTIONS {
            list.push(Move::new_promotion(from, to, capture, promotion));
        }
    } else {
        match capture {
            Some(capture) => list.push(Move::new_capture(from, to, capture)),
            None => list.push(Move::new(from, to)),
        }
    }
}

/// Generates pawn moves of `color`.
///
/// Pushes land on empty squares of `push_targets`. Captures land on `capture_targets`, or on the en passant square.
fn generate_pawn_moves(
    position: &Position,
    color: Color,
    push_targets: Bitboard,
    capture_targets: Bitboard,
    en_passant: Option<Square>,
    list: &mut MoveList,
) {
    let pawns = position.pieces_of(color, PieceType::Pawn);
    let empty = !position.occupied();
    let last_rank = Bitboard::from(Rank::R8.relative_to_color(color));
    let double_push_rank = Bitboard::from(Rank::R3.relative_to_color(color));
    let not_file_a = !Bitboard::from(File::A);
    let not_file_h = !Bitboard::from(File::H);

    let (single, double, east, west, forward, east_delta, west_delta) = match color {
        Color::White => {
            let single = (pawns << 8) & empty;
            let double = ((single & double_push_rank) << 8) & empty;
            (single, double, (pawns & not_file_h) << 9, (pawns & not_file_a) << 7, 8, 9, 7)
        }
        Color::Black => {
            let single = (pawns >> 8) & empty;
            let double = ((single & double_push_rank) >> 8) & empty;
            (single, double, (pawns & not_file_h) >> 7, (pawns & not_file_a) >> 9, -8, -7, -9)
        }
    };

    for to in single & push_targets {
        push_pawn_move(source_square(to, forward), to, None, last_rank, list);
    }

    for to in double & push_targets {
        list.push(Move::new(source_square(to, 2 * forward), to));
    }

    let en_passant_bb = en_passant.map_or(Bitboard::EMPTY, Bitboard::from);
    for (targets, delta) in [(east, east_delta), (west, west_delta)] {
        for to in targets & (capture_targets | en_passant_bb) {
            let from = source_square(to, delta);
            if Some(to) == en_passant && !position.occupied().get(to) {
                list.push(Move::new_en_passant(from, to));
            } else {
                let capture = position.piece_at(to).map(|piece| piece.piece_type());
                push_pawn_move(from, to, capture, last_rank, list);
            }
        }
    }
}

/// Generates the moves of every knight, bishop, rook, queen and king of `color` landing on `targets`.
fn generate_piece_moves(position: &Position, color: Color, targets: Bitboard, list: &mut MoveList) {
    let tables = attack_tables();
    let occupied = position.occupied();

    for piece_type in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen, PieceType::King] {
        for from in position.pieces_of(color, piece_type) {
            let attacks = match piece_type {
                PieceType::Knight => tables.knight(from),
                PieceType::Bishop => tables.bishop(from, occupied),
                PieceType::Rook => tables.rook(from, occupied),
                PieceType::Queen => tables.queen(from, occupied),
                _ => tables.king(from),
            };

            for to in attacks & targets {
                match position.piece_at(to) {
                    Some(capture) => list.push(Move::new_capture(from, to, capture.piece_type())),
                    None => list.push(Move::new(from, to)),
                }
            }
        }
    }
}

/// Squares that must be empty between king and rook.
fn castling_path(side: CastlingSide, rank: Rank) -> Bitboard {
    let files = match side {
        CastlingSide::Kingside => File::F | File::G,
        CastlingSide::Queenside => (File::B | File::C) | Bitboard::from(File::D),
    };
    files & Bitboard::from(rank)
}

fn generate_castlings(position: &Position, color: Color, list: &mut MoveList) {
    let rank = Rank::R1.relative_to_color(color);
    let king = Square::new(File::E, rank);

    if !position.pieces_of(color, PieceType::King).get(king) {
        return;
    }

    for side in CastlingSide::ALL {
        if !position.castling_rights().contains(CastlingRights::new(color, side)) {
            continue;
        }

        let rook = Square::new(side.rook_source_file(), rank);
        if !position.pieces_of(color, PieceType::Rook).get(rook) {
            continue;
        }

        if (castling_path(side, rank) & position.occupied()).has_any() {
            continue;
        }

        // The king may not castle out of check nor through an attacked square. The square it lands on is left to
        // the legality filter.
        let transit = Square::new(side.rook_target_file(), rank);
        if is_attacked(position, king | transit, !color) {
            continue;
        }

        list.push(Move::new_castling(king, Square::new(side.king_target_file(), rank), side));
    }
}

/// Generates all pseudo-legal moves for the side to move.
pub fn generate_pseudolegal(position: &Position, list: &mut MoveList) {
    let color = position.side_to_move();
    let targets = !position.occupied_by(color);

    generate_pawn_moves(
        position,
        color,
        Bitboard::ALL,
        position.occupied_by(!color),
        position.en_passant_square(),
        list,
    );
    generate_piece_moves(position, color, targets, list);
    generate_castlings(position, color, list);
}

/// Generates the moves of `attacker` that land on a square of `victims`, whether occupied or not.
///
/// Pawn pushes, en passant and castling can never capture a piece standing on their target and are left out.
pub fn attacks_against(position: &Position, victims: Bitboard, attacker: Color, list: &mut MoveList) {
    generate_pawn_moves(position, attacker, Bitboard::EMPTY, victims, None, list);
    generate_piece_moves(position, attacker, victims, list);
}

/// Returns whether any piece of `attacker` attacks a square of `victims`.
///
/// This answers the same question as `attacks_against` without building the moves.
pub fn is_attacked(position: &Position, victims: Bitboard, attacker: Color) -> bool {
    let tables = attack_tables();
    let occupied = position.occupied();

    if (pawn_attacks(attacker, position.pieces_of(attacker, PieceType::Pawn)) & victims).has_any() {
        return true;
    }

    let knights = position.pieces_of(attacker, PieceType::Knight);
    let kings = position.pieces_of(attacker, PieceType::King);
    let queens = position.pieces_of(attacker, PieceType::Queen);
    let rooks = position.pieces_of(attacker, PieceType::Rook) | queens;
    let bishops = position.pieces_of(attacker, PieceType::Bishop) | queens;

    knights.into_iter().any(|from| (tables.knight(from) & victims).has_any())
        || kings.into_iter().any(|from| (tables.king(from) & victims).has_any())
        || rooks.into_iter().any(|from| (tables.rook(from, occupied) & victims).has_any())
        || bishops.into_iter().any(|from| (tables.bishop(from, occupied) & victims).has_any())
}

/// Generates all legal moves for the side to move.
///
/// Every pseudo-legal move is made on the position and dropped if it leaves the mover's king attacked. The position is
/// restored before returning. The order of the moves is not preserved.
pub fn generate_legal(position: &mut Position, list: &mut MoveList) {
    generate_pseudolegal(position, list);

    let color = position.side_to_move();
    let mut index = 0;
    while index < list.len() {
        let mv = list[index];

        position.make(mv);
        let illegal = is_attacked(position, position.pieces_of(color, PieceType::King), !color);
        position.unmake(mv);

        if illegal {
            list.swap_remove(index);
        } else {
            index += 1;
        }
    }
}

/// Returns whether the king of the side to move is attacked.
pub fn is_in_check(position: &Position) -> bool {
    let color = position.side_to_move();
    is_attacked(position, position.pieces_of(color, PieceType::King), !color)
}

fn has_legal_move(position: &mut Position) -> bool {
    let mut list = MoveList::default();
    generate_legal(position, &mut list);
    !list.is_empty()
}

/// Returns whether the side to move has no legal move and is not in check.
pub fn is_stalemate(position: &mut Position) -> bool {
    !is_in_check(position) && !has_legal_move(position)
}

/// Returns whether the side to move has no legal move and is in check.
pub fn is_checkmate(position: &mut Position) -> bool {
    is_in_check(position) && !has_legal_move(position)
}
