//! Magic bitboards for the sliding pieces.
//!
//! For every square and slider family a multiplier is searched such that `((occupied & premask) * multiplier) >>
//! rshift` sends every occupancy subset of the premask to a slot holding its attack set. Two subsets may share a slot
//! only when their attack sets are equal. See <https://www.chessprogramming.org/Magic_Bitboards>.

use std::fmt::{Display, Write};

use rand::{rngs::StdRng, RngCore, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::{
    bitboard::Bitboard,
    coordinates::{File, Rank, Square},
};

use super::attacks::{bishop_rays, rook_rays};

/// Errors raised while building magic tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MagicError {
    #[error("No {family} magic found for {square} after {attempts} attempts")]
    SearchExhausted { square: Square, family: SliderFamily, attempts: u64 },

    #[error("The {family} multiplier {multiplier:#018x} for {square} has a destructive collision")]
    DestructiveCollision { square: Square, family: SliderFamily, multiplier: u64 },
}

/// Parameters of the magic multiplier search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicSettings {
    /// Seed of the random number generator drawing candidate multipliers.
    pub seed: u64,
    /// Number of candidates tried per square before giving up.
    pub max_attempts: u64,
}

impl Default for MagicSettings {
    fn default() -> Self {
        Self { seed: 0xd895643f, max_attempts: 1 << 32 }
    }
}

/// The two families of sliding pieces. Queens combine both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderFamily {
    Rook,
    Bishop,
}

impl SliderFamily {
    pub const ALL: [SliderFamily; 2] = [SliderFamily::Rook, SliderFamily::Bishop];

    /// Returns the squares whose occupancy can change the attacks from `square`. The last square of each ray never
    /// matters, neither does the origin.
    pub fn premask(self, square: Square) -> Bitboard {
        match self {
            SliderFamily::Rook => {
                let edge_files = File::A | File::H;
                let edge_ranks = Rank::R1 | Rank::R8;
                let rank = Bitboard::from(square.rank()) & !edge_files;
                let file = Bitboard::from(square.file()) & !edge_ranks;
                (rank ^ file) & !Bitboard::from(square)
            }
            SliderFamily::Bishop => {
                let border = Bitboard::new(0xff818181818181ff);
                bishop_rays(Bitboard::EMPTY, square) & !border
            }
        }
    }

    /// Returns the attacks from `square` computed by walking the rays.
    pub fn ray_attacks(self, occupied: Bitboard, square: Square) -> Bitboard {
        match self {
            SliderFamily::Rook => rook_rays(occupied, square),
            SliderFamily::Bishop => bishop_rays(occupied, square),
        }
    }
}

impl Display for SliderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SliderFamily::Rook => write!(f, "rook"),
            SliderFamily::Bishop => write!(f, "bishop"),
        }
    }
}

/// The hashing parameters of one square for one slider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Magic {
    pub premask: Bitboard,
    pub multiplier: u64,
    pub rshift: u32,
    /// Attacks on an empty board. Every stored attack set is a subset of it.
    pub postmask: Bitboard,
    /// Lowest populated slot.
    pub start: usize,
    /// Highest populated slot.
    pub end: usize,
    /// Position of slot 0 in the flattened attack table.
    pub offset: usize,
}

impl Magic {
    /// Returns the slot of an occupancy, relative to the start of this square's slice.
    #[inline]
    pub fn index(&self, occupied: Bitboard) -> usize {
        ((occupied & self.premask).value().wrapping_mul(self.multiplier) >> self.rshift) as usize
    }

    /// Number of slots addressed by this magic.
    pub fn size(&self) -> usize {
        1 << (64 - self.rshift)
    }
}

/// Scratch state used to fill the slots of one square. Slots are stamped with the attempt that last wrote them so the
/// table never has to be cleared between attempts.
struct SquareSearch {
    square: Square,
    family: SliderFamily,
    premask: Bitboard,
    rshift: u32,
    subsets: Vec<(Bitboard, Bitboard)>,
    slots: Vec<Bitboard>,
    stamps: Vec<u64>,
}

impl SquareSearch {
    fn new(square: Square, family: SliderFamily) -> Self {
        let premask = family.premask(square);
        let size = 1usize << premask.popcnt();
        let subsets = premask.subsets().map(|subset| (subset, family.ray_attacks(subset, square))).collect();

        Self {
            square,
            family,
            premask,
            rshift: 64 - premask.popcnt(),
            subsets,
            slots: vec![Bitboard::EMPTY; size],
            stamps: vec![0; size],
        }
    }

    /// Tries to place every subset with `multiplier`. Returns false on the first destructive collision.
    fn fill(&mut self, multiplier: u64, stamp: u64) -> bool {
        for (subset, attacks) in &self.subsets {
            let index = (subset.value().wrapping_mul(multiplier) >> self.rshift) as usize;
            if self.stamps[index] != stamp {
                self.stamps[index] = stamp;
                self.slots[index] = *attacks;
            } else if self.slots[index] != *attacks {
                return false;
            }
        }
        true
    }

    /// Builds the final magic and its slots once `multiplier` was accepted with `stamp`.
    fn finish(self, multiplier: u64, stamp: u64) -> (Magic, Vec<Bitboard>) {
        let mut slots = self.slots;
        for (slot, slot_stamp) in slots.iter_mut().zip(&self.stamps) {
            if *slot_stamp != stamp {
                *slot = Bitboard::EMPTY;
            }
        }

        // Slider attacks are never empty, so an empty slot is an unused one.
        let start = slots.iter().position(|slot| slot.has_any()).unwrap_or(0);
        let end = slots.iter().rposition(|slot| slot.has_any()).unwrap_or(0);

        let magic = Magic {
            premask: self.premask,
            multiplier,
            rshift: self.rshift,
            postmask: self.family.ray_attacks(Bitboard::EMPTY, self.square),
            start,
            end,
            offset: 0,
        };
        (magic, slots)
    }
}

/// Searches a multiplier for one square.
///
/// Candidates are sparse random numbers: the AND of three draws. A candidate that does not spread the premask over
/// the top byte of the product is skipped without filling the table. Returns the magic, with an offset of 0, and the
/// slots it addresses.
pub fn find_magic(
    square: Square,
    family: SliderFamily,
    rng: &mut StdRng,
    max_attempts: u64,
) -> Result<(Magic, Vec<Bitboard>), MagicError> {
    let mut search = SquareSearch::new(square, family);

    for attempt in 1..=max_attempts {
        let multiplier = rng.next_u64() & rng.next_u64() & rng.next_u64();
        if (search.premask.value().wrapping_mul(multiplier) & 0xff00_0000_0000_0000).count_ones() < 6 {
            continue;
        }

        if search.fill(multiplier, attempt) {
            debug!(%square, %family, attempts = attempt, "magic found");
            return Ok(search.finish(multiplier, attempt));
        }
    }

    Err(MagicError::SearchExhausted { square, family, attempts: max_attempts })
}

/// Frozen magics for all squares of one slider family, with the flattened attack table they address.
#[derive(Debug, Clone)]
pub struct MagicTable {
    family: SliderFamily,
    magics: Vec<Magic>,
    attacks: Vec<Bitboard>,
}

impl MagicTable {
    /// Searches the magics of every square.
    pub fn new(family: SliderFamily, settings: &MagicSettings) -> Result<Self, MagicError> {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let mut table = MagicTable { family, magics: Vec::with_capacity(Square::COUNT), attacks: Vec::new() };

        for square in Square::ALL {
            let (magic, slots) = find_magic(square, family, &mut rng, settings.max_attempts)?;
            table.push(magic, slots);
        }

        Ok(table)
    }

    /// Rebuilds a table from previously discovered multipliers, checking each one.
    pub fn from_multipliers(family: SliderFamily, multipliers: &[u64; Square::COUNT]) -> Result<Self, MagicError> {
        let mut table = MagicTable { family, magics: Vec::with_capacity(Square::COUNT), attacks: Vec::new() };

        for (square, multiplier) in Square::ALL.into_iter().zip(multipliers.iter().copied()) {
            let mut search = SquareSearch::new(square, family);
            if !search.fill(multiplier, 1) {
                return Err(MagicError::DestructiveCollision { square, family, multiplier });
            }
            let (magic, slots) = search.finish(multiplier, 1);
            table.push(magic, slots);
        }

        Ok(table)
    }

    fn push(&mut self, mut magic: Magic, slots: Vec<Bitboard>) {
        magic.offset = self.attacks.len();
        self.attacks.extend(slots);
        self.magics.push(magic);
    }

    pub fn family(&self) -> SliderFamily {
        self.family
    }

    /// Returns the magic of a square.
    pub fn magic(&self, square: Square) -> &Magic {
        &self.magics[usize::from(square)]
    }

    /// Returns the number of slots of the flattened attack table.
    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }

    /// Returns the attacks from `square` given the full board occupancy.
    #[inline]
    pub fn attacks(&self, square: Square, occupied: Bitboard) -> Bitboard {
        let magic = &self.magics[usize::from(square)];
        let attacks = self.attacks[magic.offset + magic.index(occupied)];
        debug_assert!((attacks & !magic.postmask).is_empty());
        attacks
    }

    /// Renders the multipliers as a Rust constant that `from_multipliers` accepts.
    pub fn to_rust_source(&self) -> String {
        let name = match self.family {
            SliderFamily::Rook => "ROOK_MAGICS",
            SliderFamily::Bishop => "BISHOP_MAGICS",
        };

        let mut source = String::new();
        let _ = writeln!(source, "pub const {}: [u64; {}] = [", name, Square::COUNT);
        for (square, magic) in Square::ALL.into_iter().zip(&self.magics) {
            let _ = writeln!(
                source,
                "    {:#018x}, // {} premask {:#018x} shift {} slots {}..={}",
                magic.multiplier,
                square,
                magic.premask.value(),
                magic.rshift,
                magic.start,
                magic.end
            );
        }
        source.push_str("];\n");
        source
    }

    /// Returns the multipliers of every square.
    pub fn multipliers(&self) -> [u64; Square::COUNT] {
        std::array::from_fn(|index| self.magics[index].multiplier)
    }

    /// Renders the table as Rust source once its multipliers were checked to rebuild the same slots.
    ///
    /// # Errors
    /// Returns `DestructiveCollision` if a multiplier no longer fits its square, or if the rebuilt table differs.
    pub fn freeze(&self) -> Result<String, MagicError> {
        let rebuilt = MagicTable::from_multipliers(self.family(), &self.multipliers())?;

        if let Some(square) = Square::ALL.into_iter().find(|square| rebuilt.magic(*square) != self.magic(*square)) {
            return Err(MagicError::DestructiveCollision {
                square,
                family: self.family,
                multiplier: self.magic(square).multiplier,
            });
        }

        Ok(rebuilt.to_rust_source())
    }
}
