use std::ops::Index;

use crate::r#move::Move;

/// Upper bound on the number of moves generated for one position.
pub const MAX_MOVES: usize = 276;

/// Structure to store a list of chess moves without heap allocation.
///
/// The list is a fixed array of `MAX_MOVES` moves and a counter of the valid ones. Pushing past the capacity is a
/// programming error and panics.
#[derive(Debug, Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    count: usize,
}

impl Default for MoveList {
    fn default() -> Self {
        Self { moves: [Move::NULL; MAX_MOVES], count: 0 }
    }
}

impl MoveList {
    /// Adds a move to the list.
    ///
    /// Places the move at the current count position and increments the counter.
    ///
    /// # Parameters
    /// * `mv` - The chess move to add to the list
    ///
    /// # Panics
    /// Panics if the list already holds `MAX_MOVES` moves.
    pub fn push(&mut self, mv: Move) {
        assert!(self.count < MAX_MOVES, "The move list is full.");

        self.moves[self.count] = mv;
        self.count += 1;
    }

    /// Removes the move at `index` by moving the last move in its place.
    ///
    /// The order of the list is not preserved. The legality filter relies on this to drop rejected moves in constant
    /// time.
    ///
    /// # Parameters
    /// * `index` - Position of the move to remove, below `len()`
    pub fn swap_remove(&mut self, index: usize) {
        debug_assert!(index < self.count);
        self.moves[index] = self.moves[self.count - 1];
        self.count -= 1;
    }

    /// Removes every move.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Returns `true` if the list holds no move.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of moves currently in the list.
    ///
    /// # Returns
    /// The count of valid moves, at most `MAX_MOVES`.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns whether the list holds a move equal to `mv`.
    ///
    /// # Parameters
    /// * `mv` - The move to look for, compared with `Move`'s equality (source, target and promotion)
    ///
    /// # Returns
    /// `true` if a matching move is in the list.
    pub fn contains(&self, mv: Move) -> bool {
        self.iter().any(|candidate| candidate == mv)
    }

    /// Returns an iterator over the valid moves in the list.
    ///
    /// # Returns
    /// An iterator yielding copies of the moves, in list order.
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.moves.iter().take(self.count).copied()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, index: usize) -> &Self::Output {
        assert!(index < self.count, "Index {} out of a move list of {} moves.", index, self.count);
        &self.moves[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::Square;

    #[test]
    fn test_push_and_index() {
        let mut list = MoveList::default();
        assert!(list.is_empty());

        list.push(Move::new(Square::E2, Square::E4));
        list.push(Move::new(Square::G1, Square::F3));

        assert_eq!(list.len(), 2);
        assert_eq!(list[1], Move::new(Square::G1, Square::F3));
        assert!(list.contains(Move::new(Square::E2, Square::E4)));
        assert!(!list.contains(Move::new(Square::E2, Square::E3)));
    }

    #[test]
    fn test_swap_remove_moves_last_in_place() {
        let mut list = MoveList::default();
        list.push(Move::new(Square::A2, Square::A3));
        list.push(Move::new(Square::B2, Square::B3));
        list.push(Move::new(Square::C2, Square::C3));

        list.swap_remove(0);

        let moves: Vec<Move> = list.iter().collect();
        assert_eq!(moves, vec![Move::new(Square::C2, Square::C3), Move::new(Square::B2, Square::B3)]);
    }

    #[test]
    fn test_clear() {
        let mut list = MoveList::default();
        list.push(Move::new(Square::A2, Square::A3));
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
    }

    #[test]
    fn test_capacity() {
        let mut list = MoveList::default();
        for _ in 0..MAX_MOVES {
            list.push(Move::new(Square::A1, Square::A2));
        }
        assert_eq!(list.len(), MAX_MOVES);
    }

    #[test]
    #[should_panic]
    fn test_push_past_capacity_panics() {
        let mut list = MoveList::default();
        for _ in 0..=MAX_MOVES {
            list.push(Move::new(Square::A1, Square::A2));
        }
    }

    #[test]
    #[should_panic]
    fn test_index_past_count_panics() {
        let list = MoveList::default();
        let _ = list[0];
    }
}
