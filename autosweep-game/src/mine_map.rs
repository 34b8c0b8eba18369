//! Ground-truth mine placement.

use rand::Rng;
use rand::seq::index;

use crate::grid::{Coord, Grid};

/// Where the mines actually are. Never shown to the solving side.
pub type MineMap = Grid<bool>;

/// Place exactly `num_mines` mines uniformly at random without replacement.
///
/// # Panics
///
/// Panics if `num_mines` exceeds the number of cells.
#[must_use]
pub fn generate(width: usize, height: usize, num_mines: u32, rng: &mut impl Rng) -> MineMap {
    let cells = width * height;
    assert!(
        num_mines as usize <= cells,
        "mine map of size {width} x {height} can hold at most {cells} mines, requested {num_mines}"
    );
    let mut map = Grid::filled(width, height, false);
    for idx in index::sample(rng, cells, num_mines as usize) {
        *map.get_mut(Coord::new(idx % width, idx / width)) = true;
    }
    map
}

/// Number of mines in the up-to-8 cells around `at`.
#[must_use]
pub fn neighbor_mine_count(map: &MineMap, at: Coord) -> u8 {
    let count = map.neighbors(at).into_iter().filter(|nb| *map.get(*nb)).count();
    u8::try_from(count).expect("a cell has at most 8 neighbors")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn mine_count(map: &MineMap) -> usize {
        map.iter().filter(|(_, mine)| **mine).count()
    }

    #[test]
    fn places_exactly_the_requested_mines() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for mines in [0, 3, 9] {
            let map = generate(3, 3, mines, &mut rng);
            assert_eq!(mine_count(&map), mines as usize);
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate(8, 8, 10, &mut ChaCha20Rng::seed_from_u64(42));
        let b = generate(8, 8, 10, &mut ChaCha20Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "can hold at most")]
    fn rejects_overfull_maps() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let _ = generate(4, 3, 13, &mut rng);
    }

    #[test]
    fn counts_neighboring_mines() {
        let mut map: MineMap = Grid::filled(3, 3, false);
        *map.get_mut(Coord::new(0, 0)) = true;
        *map.get_mut(Coord::new(0, 1)) = true;
        *map.get_mut(Coord::new(1, 1)) = true;
        assert_eq!(neighbor_mine_count(&map, Coord::new(1, 0)), 3);
        assert_eq!(neighbor_mine_count(&map, Coord::new(2, 2)), 1);
        assert_eq!(neighbor_mine_count(&map, Coord::new(2, 0)), 1);
    }
}
