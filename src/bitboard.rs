use std::fmt::Display;

use crate::coordinates::{File, Rank, Square};

/// A bitboard is a 64-bit integer that represents a set of squares. Bit `i` is set when `Square` `i` is a member of
/// the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(u64);

impl Bitboard {
    /// Represents an empty bitboard.
    pub const EMPTY: Bitboard = Bitboard(0);

    /// Represents a filled bitboard.
    pub const ALL: Bitboard = Bitboard(u64::MAX);

    /// Creates a bitboard from its raw value.
    pub const fn new(value: u64) -> Bitboard {
        Bitboard(value)
    }

    /// Returns the raw value of the bitboard.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the value of a single square on the bitboard.
    pub fn get(self, square: Square) -> bool {
        self.0 & (1u64 << u8::from(square)) != 0
    }

    /// Returns the least significant bit of the bitboard.
    pub fn lsb(self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }

        Some((self.0.trailing_zeros() as u8).into())
    }

    /// Returns the number of set bits in the bitboard.
    pub fn popcnt(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns whether the bitboard is empty.
    pub fn is_empty(self) -> bool {
        self == Bitboard::EMPTY
    }

    /// Returns whether at least one bit is set.
    pub fn has_any(self) -> bool {
        self != Bitboard::EMPTY
    }

    /// Returns the subset of `mask` that follows `self` in increasing numeric order (Carry-Rippler). Wraps back to the
    /// empty set after the full mask.
    pub fn next_subset(self, mask: Bitboard) -> Bitboard {
        Bitboard(self.0.wrapping_sub(mask.0) & mask.0)
    }

    /// Returns an iterator over every subset of the bits of this bitboard, the empty set first.
    pub fn subsets(self) -> SubsetIterator {
        SubsetIterator { mask: self, next: Some(Bitboard::EMPTY) }
    }
}

impl From<Square> for Bitboard {
    fn from(square: Square) -> Self {
        Bitboard(1u64 << u8::from(square))
    }
}

impl From<File> for Bitboard {
    fn from(file: File) -> Self {
        Bitboard(0x0101010101010101 << u8::from(file))
    }
}

impl From<Rank> for Bitboard {
    fn from(rank: Rank) -> Self {
        Bitboard(0xff << (8 * u8::from(rank)))
    }
}

impl std::ops::BitAnd for Bitboard {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 & rhs.0)
    }
}

impl std::ops::BitAnd<Square> for Bitboard {
    type Output = Self;
    fn bitand(self, rhs: Square) -> Self::Output {
        self & Bitboard::from(rhs)
    }
}

impl std::ops::BitOr for Bitboard {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 | rhs.0)
    }
}

impl std::ops::BitOr<Square> for Bitboard {
    type Output = Self;
    fn bitor(self, rhs: Square) -> Self::Output {
        self | Bitboard::from(rhs)
    }
}

impl std::ops::BitOr<Square> for Square {
    type Output = Bitboard;
    fn bitor(self, rhs: Square) -> Self::Output {
        Bitboard::from(self) | Bitboard::from(rhs)
    }
}

impl std::ops::BitOr<File> for File {
    type Output = Bitboard;
    fn bitor(self, rhs: File) -> Self::Output {
        Bitboard::from(self) | Bitboard::from(rhs)
    }
}

impl std::ops::BitOr<Rank> for Rank {
    type Output = Bitboard;
    fn bitor(self, rhs: Rank) -> Self::Output {
        Bitboard::from(self) | Bitboard::from(rhs)
    }
}

impl std::ops::BitXor for Bitboard {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 ^ rhs.0)
    }
}

impl std::ops::BitXor<Square> for Bitboard {
    type Output = Self;
    fn bitxor(self, rhs: Square) -> Self::Output {
        self ^ Bitboard::from(rhs)
    }
}

impl std::ops::Not for Bitboard {
    type Output = Self;
    fn not(self) -> Self::Output {
        Bitboard(!self.0)
    }
}

impl std::ops::BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl std::ops::BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitOrAssign<Square> for Bitboard {
    fn bitor_assign(&mut self, rhs: Square) {
        *self |= Bitboard::from(rhs);
    }
}

impl std::ops::BitXorAssign for Bitboard {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl std::ops::BitXorAssign<Square> for Bitboard {
    fn bitxor_assign(&mut self, rhs: Square) {
        *self ^= Bitboard::from(rhs);
    }
}

impl std::ops::Shl<u32> for Bitboard {
    type Output = Self;
    fn shl(self, rhs: u32) -> Self::Output {
        Bitboard(self.0 << rhs)
    }
}

impl std::ops::Shr<u32> for Bitboard {
    type Output = Self;
    fn shr(self, rhs: u32) -> Self::Output {
        Bitboard(self.0 >> rhs)
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIterator;

    fn into_iter(self) -> Self::IntoIter {
        BitboardIterator(self.0)
    }
}

/// An iterator over the set bits in a bitboard.
pub struct BitboardIterator(u64);

impl Iterator for BitboardIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        let square = Bitboard(self.0).lsb()?;
        self.0 &= self.0 - 1;
        Some(square)
    }
}

/// Enumerates all `2^popcnt(mask)` subsets of a mask in increasing order, starting with the empty set. See
/// <https://www.chessprogramming.org/Traversing_Subsets_of_a_Set>.
pub struct SubsetIterator {
    mask: Bitboard,
    next: Option<Bitboard>,
}

impl Iterator for SubsetIterator {
    type Item = Bitboard;

    fn next(&mut self) -> Option<Self::Item> {
        let subset = self.next?;
        let following = subset.next_subset(self.mask);
        self.next = if following.is_empty() { None } else { Some(following) };
        Some(subset)
    }
}

impl Display for Bitboard {
    /// Draws the bitboard as an 8x8 grid, rank 8 on top.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in Rank::ALL.iter().rev() {
            for file in File::ALL {
                let c = if self.get(Square::new(file, *rank)) { 'x' } else { '.' };
                write!(f, "{}", c)?;
                if file != File::H {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
