use std::{sync::OnceLock, time::Instant};

use tracing::info;

use crate::{
    bitboard::Bitboard,
    config::get_config,
    coordinates::{File, Square},
    piece::Color,
};

use super::magic::{MagicError, MagicSettings, MagicTable, SliderFamily};

/// Walks one ray per step from `square`. Each ray stops on, and includes, the first occupied square.
fn cast_rays(occupied: Bitboard, square: Square, steps: &[(i8, i8); 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;

    for (files, ranks) in steps {
        let mut to = square;
        while let Ok(sq) = to.offset(*files, *ranks) {
            to = sq;
            attacks |= to;
            if occupied.get(to) {
                break;
            }
        }
    }

    attacks
}

/// Returns a bitboard with all squares attacked by a rook on a given square, by ray casting. Too slow for move
/// generation; used to build and check the magic tables.
pub fn rook_rays(occupied: Bitboard, square: Square) -> Bitboard {
    cast_rays(occupied, square, &[(0, 1), (0, -1), (-1, 0), (1, 0)])
}

/// Returns a bitboard with all squares attacked by a bishop on a given square, by ray casting.
pub fn bishop_rays(occupied: Bitboard, square: Square) -> Bitboard {
    cast_rays(occupied, square, &[(1, 1), (-1, 1), (1, -1), (-1, -1)])
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [(-1, 2), (1, 2), (-1, -2), (1, -2), (-2, 1), (-2, -1), (2, 1), (2, -1)];

const KING_OFFSETS: [(i8, i8); 8] = [(0, 1), (0, -1), (-1, 0), (1, 0), (-1, 1), (1, 1), (-1, -1), (1, -1)];

/// Builds a per-square table from fixed jumps, dropping the ones that leave the board.
fn offset_table(offsets: &[(i8, i8); 8]) -> [Bitboard; Square::COUNT] {
    std::array::from_fn(|index| {
        let square = Square::from(index as u8);
        offsets
            .iter()
            .filter_map(|(files, ranks)| square.offset(*files, *ranks).ok())
            .fold(Bitboard::EMPTY, |attacks, to| attacks | to)
    })
}

/// Returns the squares attacked by every pawn of `pawns`, for pawns of the given color.
pub fn pawn_attacks(color: Color, pawns: Bitboard) -> Bitboard {
    let east = pawns & !Bitboard::from(File::H);
    let west = pawns & !Bitboard::from(File::A);
    match color {
        Color::White => (east << 9) | (west << 7),
        Color::Black => (east >> 7) | (west >> 9),
    }
}

/// Every precomputed attack table, built once per process.
#[derive(Debug)]
pub struct AttackTables {
    knight: [Bitboard; Square::COUNT],
    king: [Bitboard; Square::COUNT],
    rook: MagicTable,
    bishop: MagicTable,
}

impl AttackTables {
    /// Fills the jump tables and searches the magics of both slider families.
    pub fn new(settings: &MagicSettings) -> Result<Self, MagicError> {
        let start = Instant::now();

        let tables = AttackTables {
            knight: offset_table(&KNIGHT_OFFSETS),
            king: offset_table(&KING_OFFSETS),
            rook: MagicTable::new(SliderFamily::Rook, settings)?,
            bishop: MagicTable::new(SliderFamily::Bishop, settings)?,
        };

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            rook_slots = tables.rook.len(),
            bishop_slots = tables.bishop.len(),
            "attack tables built"
        );
        Ok(tables)
    }

    pub fn knight(&self, square: Square) -> Bitboard {
        self.knight[usize::from(square)]
    }

    pub fn king(&self, square: Square) -> Bitboard {
        self.king[usize::from(square)]
    }

    pub fn rook(&self, square: Square, occupied: Bitboard) -> Bitboard {
        self.rook.attacks(square, occupied)
    }

    pub fn bishop(&self, square: Square, occupied: Bitboard) -> Bitboard {
        self.bishop.attacks(square, occupied)
    }

    pub fn queen(&self, square: Square, occupied: Bitboard) -> Bitboard {
        self.rook(square, occupied) | self.bishop(square, occupied)
    }

    /// Returns the magic table of one slider family.
    pub fn magic_table(&self, family: SliderFamily) -> &MagicTable {
        match family {
            SliderFamily::Rook => &self.rook,
            SliderFamily::Bishop => &self.bishop,
        }
    }
}

static ATTACK_TABLES: OnceLock<AttackTables> = OnceLock::new();

/// Builds the attack tables with explicit search settings. Later calls return the tables built first.
pub fn initialize(settings: &MagicSettings) -> Result<&'static AttackTables, MagicError> {
    if let Some(tables) = ATTACK_TABLES.get() {
        return Ok(tables);
    }

    let tables = AttackTables::new(settings)?;
    Ok(ATTACK_TABLES.get_or_init(|| tables))
}

/// Returns the attack tables, building them from the configuration on first use.
///
/// # Panics
/// Panics if the magic search gives up. Call `initialize` first to handle that case.
pub fn attack_tables() -> &'static AttackTables {
    ATTACK_TABLES.get_or_init(|| {
        AttackTables::new(&get_config().magic_settings())
            .unwrap_or_else(|error| panic!("Unable to build the attack tables: {}", error))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rook_rays_without_obstructions() {
        let expected = Square::E1
            | Square::E2
            | Square::E3
            | Square::E5
            | Square::E6
            | Square::E7
            | Square::E8
            | Square::A4
            | Square::B4
            | Square::C4
            | Square::D4
            | Square::F4
            | Square::G4
            | Square::H4;
        assert_eq!(rook_rays(Bitboard::from(Square::E4), Square::E4), expected);
    }

    #[test]
    fn test_rook_rays_stop_on_first_blocker() {
        let occupied = Square::E4 | Square::B4 | Square::G4 | Square::E2 | Square::E7;
        let expected = Square::E2
            | Square::E3
            | Square::E5
            | Square::E6
            | Square::E7
            | Square::B4
            | Square::C4
            | Square::D4
            | Square::F4
            | Square::G4;
        assert_eq!(rook_rays(occupied, Square::E4), expected);
    }

    #[test]
    fn test_bishop_rays_in_corner() {
        let expected = Square::B2 | Square::C3 | Square::D4 | Square::E5 | Square::F6 | Square::G7 | Square::H8;
        assert_eq!(bishop_rays(Bitboard::EMPTY, Square::A1), expected);
    }

    #[test]
    fn test_bishop_rays_next_to_blockers() {
        let occupied = Square::D3 | Square::F3 | Square::D5 | Square::F5;
        assert_eq!(bishop_rays(occupied, Square::E4), occupied);
    }

    #[test]
    fn test_knight_table() {
        let knight = offset_table(&KNIGHT_OFFSETS);
        assert_eq!(knight[usize::from(Square::A1)], Square::B3 | Square::C2);
        assert_eq!(knight[usize::from(Square::E4)].popcnt(), 8);
        assert_eq!(knight[usize::from(Square::H8)], Square::G6 | Square::F7);
    }

    #[test]
    fn test_king_table() {
        let king = offset_table(&KING_OFFSETS);
        assert_eq!(king[usize::from(Square::A1)], Square::A2 | Square::B1 | Square::B2);
        assert_eq!(king[usize::from(Square::E4)].popcnt(), 8);
        assert_eq!(king[usize::from(Square::H4)].popcnt(), 5);
    }

    #[test]
    fn test_pawn_attacks() {
        assert_eq!(pawn_attacks(Color::White, Square::E4.into()), Square::D5 | Square::F5);
        assert_eq!(pawn_attacks(Color::White, Square::A2.into()), Square::B3.into());
        assert_eq!(pawn_attacks(Color::Black, Square::H7.into()), Square::G6.into());
        assert_eq!(pawn_attacks(Color::Black, Square::E4.into()), Square::D3 | Square::F3);
    }

    #[test]
    fn test_attack_tables_match_ray_casting() {
        let tables = attack_tables();
        let occupied = Square::C3 | Square::E6 | Square::F2 | Square::B7 | Square::G4 | Square::D1;

        for square in Square::ALL {
            assert_eq!(tables.rook(square, occupied), rook_rays(occupied, square));
            assert_eq!(tables.bishop(square, occupied), bishop_rays(occupied, square));
            assert_eq!(
                tables.queen(square, Bitboard::EMPTY),
                rook_rays(Bitboard::EMPTY, square) | bishop_rays(Bitboard::EMPTY, square)
            );
        }
    }

    #[test]
    fn test_every_rook_subset_is_stored() {
        let table = attack_tables().magic_table(SliderFamily::Rook);
        for square in Square::ALL {
            for subset in table.magic(square).premask.subsets() {
                assert_eq!(table.attacks(square, subset), rook_rays(subset, square));
            }
        }
    }

    #[test]
    fn test_initialize_returns_existing_tables() {
        let first = attack_tables();
        let second = initialize(&MagicSettings::default()).unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
