//! Board occupancy and spawning
//!
//! Owns the cell matrix, the frontier rings that grow the playfield over a
//! session, the weighted kind selection with its unlock ladder, and the
//! neighbor search that places paired tiles. All randomness comes from the
//! caller-supplied RNG so sessions replay deterministically under a fixed
//! seed.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{FOLLOWER_ALPHA_FLOOR, FOLLOWER_FADE_STEP};
use crate::grid::{GridIndex, HexDirection};
use crate::tile::{MenuAction, SpawnKind, Tile, TileKind, TileOutcome};

/// Cumulative weight table over the unlockable kind prefix, indexed by tier.
const KIND_WEIGHTS: [u32; 5] = [15, 17, 19, 21, 23];

/// Successful taps of each kind required before the next tier unlocks.
/// Negative entries never count down to zero, capping the ladder.
const UNLOCK_NEEDED: [i32; 5] = [15, 4, 4, 4, -1];

/// The seven relative cells forming the initial board core.
const CORE_CELLS: [GridIndex; 7] = [
    GridIndex::new(0, 0),
    GridIndex::new(0, 1),
    GridIndex::new(-1, 0),
    GridIndex::new(1, 0),
    GridIndex::new(1, 1),
    GridIndex::new(0, -1),
    GridIndex::new(1, -1),
];

/// Concentric frontier rings, revealed innermost first.
fn frontier_rings() -> [Vec<GridIndex>; 3] {
    [
        vec![GridIndex::new(0, 2), GridIndex::new(0, -2)],
        vec![
            GridIndex::new(-1, 1),
            GridIndex::new(-1, -1),
            GridIndex::new(2, 1),
            GridIndex::new(2, -1),
        ],
        vec![
            GridIndex::new(-2, 0),
            GridIndex::new(2, 0),
            GridIndex::new(-1, 2),
            GridIndex::new(-1, -2),
            GridIndex::new(1, 2),
            GridIndex::new(1, -2),
        ],
    ]
}

/// Placement map plus spawn bookkeeping for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Authoritative placement map, keyed by storage index. A BTreeMap keeps
    /// tick order stable for deterministic replays.
    occupied: BTreeMap<GridIndex, Tile>,
    /// Unoccupied cells eligible for a spawn (relative indices).
    available: Vec<GridIndex>,
    /// Every cell ever unlocked; superset of `available`.
    open: Vec<GridIndex>,
    /// Cells not yet unlocked, grouped into rings.
    frontier: [Vec<GridIndex>; 3],
    current_ring: usize,
    /// Remaining successful taps before the next tier unlocks, per kind.
    unlock_needed: [i32; 5],
    unlocked_tier: usize,
    /// Shared fade level applied to follower tiles, stepped down each time a
    /// pair resolves. Board state, not per-tile state.
    follower_alpha: f32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        let mut board = Self {
            occupied: BTreeMap::new(),
            available: Vec::new(),
            open: Vec::new(),
            frontier: frontier_rings(),
            current_ring: 0,
            unlock_needed: UNLOCK_NEEDED,
            unlocked_tier: 0,
            follower_alpha: 1.0,
        };
        board.reset_layers();
        board
    }

    /// Reset the board to its initial shape: the 7-cell core open, three
    /// frontier rings waiting, no tiles, follower fade back to opaque.
    pub fn reset_layers(&mut self) {
        self.occupied.clear();
        self.available = CORE_CELLS.to_vec();
        self.open = self.available.clone();
        self.frontier = frontier_rings();
        self.current_ring = 0;
        self.follower_alpha = 1.0;
    }

    /// The 7 storage cells of the starting core, for the initial map shape.
    pub fn core_cells() -> [GridIndex; 7] {
        CORE_CELLS.map(GridIndex::to_storage)
    }

    /// Every unlocked cell in storage coordinates, for end-of-round teardown.
    pub fn open_cells(&self) -> Vec<GridIndex> {
        self.open.iter().map(|c| c.to_storage()).collect()
    }

    /// Cells currently eligible for a spawn (relative indices).
    pub fn available_cells(&self) -> &[GridIndex] {
        &self.available
    }

    /// Current fade level for follower tiles.
    pub fn follower_alpha(&self) -> f32 {
        self.follower_alpha
    }

    /// Step the follower fade down one notch after a resolved pair.
    pub fn fade_followers(&mut self) {
        self.follower_alpha -= FOLLOWER_FADE_STEP;
        if self.follower_alpha < 0.0 {
            self.follower_alpha = FOLLOWER_ALPHA_FLOOR;
        }
    }

    /// Tier of the unlock ladder reached so far.
    pub fn unlocked_tier(&self) -> usize {
        self.unlocked_tier
    }

    /// Count a successful tap toward unlocking the next kind tier.
    ///
    /// One-way: a counter landing exactly on zero widens the selectable
    /// prefix permanently.
    pub fn progress_unlock(&mut self, kind: SpawnKind) {
        let idx = kind as usize;
        self.unlock_needed[idx] -= 1;
        if self.unlock_needed[idx] == 0 && self.unlocked_tier < KIND_WEIGHTS.len() - 1 {
            self.unlocked_tier += 1;
            log::info!("tile tier {} unlocked", self.unlocked_tier);
        }
    }

    /// Weighted random pick over the unlocked prefix of the kind list.
    pub fn pick_kind<R: Rng>(&self, rng: &mut R) -> SpawnKind {
        let tier = self.unlocked_tier.min(KIND_WEIGHTS.len() - 1);
        let draw = rng.random_range(0..KIND_WEIGHTS[tier]);
        let pick = KIND_WEIGHTS
            .iter()
            .position(|&bound| draw < bound)
            .unwrap_or(KIND_WEIGHTS.len() - 1);
        SpawnKind::ALL[pick]
    }

    /// All free neighbors of a relative cell, in stable direction order.
    pub fn free_neighbors(&self, cell: GridIndex) -> Vec<(HexDirection, GridIndex)> {
        HexDirection::SEARCH_ORDER
            .iter()
            .filter_map(|&dir| {
                let neighbor = cell + dir.offset(cell.row);
                self.available.contains(&neighbor).then_some((dir, neighbor))
            })
            .collect()
    }

    /// Place one or two new tiles of the given kind.
    ///
    /// Non-paired kinds take one uniformly random available cell. A paired
    /// leader additionally needs a free neighbor for its follower; if its
    /// candidate cell has none, a SingleTap is spawned instead. Returns the
    /// storage cells actually placed; empty when the board is full.
    pub fn spawn<R: Rng>(
        &mut self,
        kind: SpawnKind,
        difficulty: f32,
        rng: &mut R,
    ) -> Vec<GridIndex> {
        if self.available.is_empty() {
            return Vec::new();
        }

        if kind == SpawnKind::PairedLeader {
            let slot = rng.random_range(0..self.available.len());
            let leader_rel = self.available[slot];
            let neighbors = self.free_neighbors(leader_rel);
            if neighbors.is_empty() {
                // No room for the follower anywhere around the candidate.
                return self.spawn(SpawnKind::SingleTap, difficulty, rng);
            }
            let (facing, follower_rel) = neighbors[rng.random_range(0..neighbors.len())];

            let leader_cell = leader_rel.to_storage();
            let follower_cell = follower_rel.to_storage();
            self.available.remove(slot);
            self.available.retain(|&c| c != follower_rel);
            self.occupied.insert(
                leader_cell,
                Tile::new(
                    TileKind::PairedLeader {
                        follower: follower_cell,
                        facing,
                    },
                    difficulty,
                    leader_cell,
                ),
            );
            self.occupied.insert(
                follower_cell,
                Tile::new(
                    TileKind::PairedFollower {
                        leader: leader_cell,
                    },
                    difficulty,
                    follower_cell,
                ),
            );
            return vec![leader_cell, follower_cell];
        }

        let slot = rng.random_range(0..self.available.len());
        let rel = self.available.remove(slot);
        let cell = rel.to_storage();
        let kind = match kind {
            SpawnKind::SingleTap => TileKind::SingleTap,
            SpawnKind::AvoidTap => TileKind::AvoidTap,
            SpawnKind::Special => TileKind::Special,
            SpawnKind::MultiTap => TileKind::multi_tap(difficulty),
            SpawnKind::PairedLeader => unreachable!("handled above"),
        };
        self.occupied.insert(cell, Tile::new(kind, difficulty, cell));
        vec![cell]
    }

    /// Place the main-menu tiles through the regular placement path.
    pub fn menu_tiles(&mut self) -> Vec<GridIndex> {
        let placements = [
            (MenuAction::Play, GridIndex::new(0, 0)),
            (MenuAction::Ranking, GridIndex::new(0, -1)),
            (MenuAction::About, GridIndex::new(1, -1)),
        ];
        placements
            .into_iter()
            .map(|(action, rel)| {
                let cell = rel.to_storage();
                self.available.retain(|&c| c != rel);
                self.occupied
                    .insert(cell, Tile::new(TileKind::Menu(action), 0.0, cell));
                cell
            })
            .collect()
    }

    /// Pop a uniformly random cell from the active frontier ring and open it.
    ///
    /// Emptying a ring advances to the next; `None` once every ring is
    /// exhausted, after which the map never grows again this session.
    pub fn unlock_next_cell<R: Rng>(&mut self, rng: &mut R) -> Option<GridIndex> {
        let ring = self.frontier.get_mut(self.current_ring)?;
        let slot = rng.random_range(0..ring.len());
        let rel = ring.remove(slot);
        if ring.is_empty() {
            self.current_ring += 1;
        }
        self.available.push(rel);
        self.open.push(rel);
        Some(rel.to_storage())
    }

    /// Tick every live tile, collecting the expiry outcomes that fired.
    pub fn tick(&mut self, elapsed: f32) -> Vec<(GridIndex, TileOutcome)> {
        self.occupied
            .iter_mut()
            .filter_map(|(&cell, tile)| tile.tick(elapsed).map(|outcome| (cell, outcome)))
            .collect()
    }

    /// Remove the tile at a storage cell, returning its spot to the
    /// available pool. Removing an empty cell is a no-op and never
    /// double-inserts availability.
    pub fn remove(&mut self, cell: GridIndex) -> bool {
        if self.occupied.remove(&cell).is_some() {
            self.available.push(cell.to_relative());
            true
        } else {
            false
        }
    }

    /// Whether a storage cell has ever been unlocked.
    pub fn is_open(&self, cell: GridIndex) -> bool {
        self.open.contains(&cell.to_relative())
    }

    /// Tile at a storage cell, if any.
    pub fn tile(&self, cell: GridIndex) -> Option<&Tile> {
        self.occupied.get(&cell)
    }

    pub fn tile_mut(&mut self, cell: GridIndex) -> Option<&mut Tile> {
        self.occupied.get_mut(&cell)
    }

    /// All live tiles in cell order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.occupied.values()
    }

    pub fn tile_count(&self) -> usize {
        self.occupied.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    fn assert_invariants(board: &Board) {
        // Placement stays injective by construction (map keys), and the
        // available pool never aliases an occupied cell.
        for rel in &board.available {
            assert!(
                !board.occupied.contains_key(&rel.to_storage()),
                "available cell {rel:?} is occupied"
            );
        }
        for rel in &board.available {
            assert_eq!(
                board.available.iter().filter(|&&c| c == *rel).count(),
                1,
                "available pool holds {rel:?} twice"
            );
        }
    }

    #[test]
    fn test_reset_shape() {
        let board = Board::new();
        assert_eq!(board.available.len(), 7);
        assert_eq!(board.open.len(), 7);
        assert_eq!(board.frontier[0].len(), 2);
        assert_eq!(board.frontier[1].len(), 4);
        assert_eq!(board.frontier[2].len(), 6);
        assert_eq!(board.follower_alpha(), 1.0);
        assert_eq!(board.tile_count(), 0);
    }

    #[test]
    fn test_spawn_single_takes_one_core_cell() {
        let mut board = Board::new();
        let placed = board.spawn(SpawnKind::SingleTap, 0.0, &mut rng());

        assert_eq!(placed.len(), 1);
        assert_eq!(board.available.len(), 6);
        let tile = board.tile(placed[0]).unwrap();
        assert_eq!(tile.lifetime, 3.0);
        assert_eq!(tile.points, 1);
        assert!(CORE_CELLS.contains(&placed[0].to_relative()));
        assert_invariants(&board);
    }

    #[test]
    fn test_spawn_on_full_board_is_empty() {
        let mut board = Board::new();
        board.available.clear();
        assert!(board.spawn(SpawnKind::SingleTap, 0.0, &mut rng()).is_empty());
        assert_eq!(board.tile_count(), 0);
    }

    #[test]
    fn test_pair_spawn_links_both_halves() {
        let mut board = Board::new();
        // Exactly one adjacent pair of free cells.
        board.available = vec![GridIndex::new(0, 0), GridIndex::new(1, 0)];

        let placed = board.spawn(SpawnKind::PairedLeader, 0.0, &mut rng());

        assert_eq!(placed.len(), 2);
        assert!(board.available.is_empty());
        let leader = board.tile(placed[0]).unwrap();
        let follower = board.tile(placed[1]).unwrap();
        match leader.kind {
            TileKind::PairedLeader { follower: cell, .. } => assert_eq!(cell, follower.cell),
            other => panic!("expected a paired leader, got {other:?}"),
        }
        assert_eq!(
            follower.kind,
            TileKind::PairedFollower {
                leader: leader.cell
            }
        );
        assert_invariants(&board);
    }

    #[test]
    fn test_pair_spawn_falls_back_to_single() {
        let mut board = Board::new();
        // One isolated cell: the candidate leader has no free neighbor.
        board.available = vec![GridIndex::new(0, 0)];

        let placed = board.spawn(SpawnKind::PairedLeader, 0.0, &mut rng());

        assert_eq!(placed.len(), 1);
        assert!(board.available.is_empty());
        assert_eq!(board.tile(placed[0]).unwrap().kind, TileKind::SingleTap);
    }

    #[test]
    fn test_free_neighbors_order_and_parity() {
        let mut board = Board::new();
        board.available = vec![
            GridIndex::new(-1, 0),
            GridIndex::new(1, 0),
            GridIndex::new(0, 1),
        ];

        let neighbors = board.free_neighbors(GridIndex::new(0, 0));
        let dirs: Vec<HexDirection> = neighbors.iter().map(|&(d, _)| d).collect();
        assert_eq!(
            dirs,
            vec![HexDirection::Left, HexDirection::Right, HexDirection::TopLeft]
        );
        assert_eq!(neighbors[2].1, GridIndex::new(0, 1));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut board = Board::new();
        let placed = board.spawn(SpawnKind::SingleTap, 0.0, &mut rng());
        let cell = placed[0];

        assert!(board.remove(cell));
        assert_eq!(board.available.len(), 7);
        // A second remove must not duplicate the availability entry.
        assert!(!board.remove(cell));
        assert_eq!(board.available.len(), 7);
        assert_invariants(&board);
    }

    #[test]
    fn test_unlock_walks_rings_then_dries_up() {
        let mut board = Board::new();
        let mut rng = rng();
        let mut unlocked = Vec::new();
        while let Some(cell) = board.unlock_next_cell(&mut rng) {
            unlocked.push(cell);
        }
        assert_eq!(unlocked.len(), 12);
        assert_eq!(board.available.len(), 7 + 12);
        assert_eq!(board.open.len(), 7 + 12);
        // Exhausted for the rest of the session.
        assert_eq!(board.unlock_next_cell(&mut rng), None);
        assert_invariants(&board);
    }

    #[test]
    fn test_unlock_reveals_inner_ring_first() {
        let mut board = Board::new();
        let mut rng = rng();
        let first = board.unlock_next_cell(&mut rng).unwrap().to_relative();
        let second = board.unlock_next_cell(&mut rng).unwrap().to_relative();
        let ring0 = [GridIndex::new(0, 2), GridIndex::new(0, -2)];
        assert!(ring0.contains(&first));
        assert!(ring0.contains(&second));
        assert_ne!(first, second);
    }

    #[test]
    fn test_pick_kind_is_deterministic_under_fixed_seed() {
        let board = Board::new();
        let picks_a: Vec<SpawnKind> = {
            let mut r = Pcg32::seed_from_u64(42);
            (0..32).map(|_| board.pick_kind(&mut r)).collect()
        };
        let picks_b: Vec<SpawnKind> = {
            let mut r = Pcg32::seed_from_u64(42);
            (0..32).map(|_| board.pick_kind(&mut r)).collect()
        };
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_pick_kind_respects_tier_prefix() {
        let mut board = Board::new();
        let mut r = rng();
        // Tier 0 only ever yields the baseline kind.
        for _ in 0..64 {
            assert_eq!(board.pick_kind(&mut r), SpawnKind::SingleTap);
        }

        board.unlocked_tier = 4;
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..512 {
            seen.insert(board.pick_kind(&mut r) as usize);
        }
        assert_eq!(seen.len(), 5, "all kinds reachable at the top tier");
    }

    #[test]
    fn test_pick_kind_survives_out_of_range_tier() {
        let mut board = Board::new();
        board.unlocked_tier = 99;
        // Must clamp rather than scan past the table.
        let _ = board.pick_kind(&mut rng());
    }

    #[test]
    fn test_unlock_ladder_steps_on_exact_zero() {
        let mut board = Board::new();
        for _ in 0..14 {
            board.progress_unlock(SpawnKind::SingleTap);
        }
        assert_eq!(board.unlocked_tier(), 0);
        board.progress_unlock(SpawnKind::SingleTap);
        assert_eq!(board.unlocked_tier(), 1);
        // Counting past zero never re-triggers.
        board.progress_unlock(SpawnKind::SingleTap);
        assert_eq!(board.unlocked_tier(), 1);

        // The leader's counter starts negative and never unlocks anything.
        for _ in 0..32 {
            board.progress_unlock(SpawnKind::PairedLeader);
        }
        assert_eq!(board.unlocked_tier(), 1);
    }

    #[test]
    fn test_tick_reports_each_expiry_once() {
        let mut board = Board::new();
        let placed = board.spawn(SpawnKind::SingleTap, 0.0, &mut rng());

        assert!(board.tick(1.0).is_empty());
        let fired = board.tick(2.5);
        assert_eq!(fired, vec![(placed[0], TileOutcome::Failure)]);
        assert!(board.tick(1.0).is_empty());
    }

    #[test]
    fn test_fade_steps_down_to_floor() {
        let mut board = Board::new();
        board.fade_followers();
        assert!((board.follower_alpha() - 0.85).abs() < 1e-6);
        for _ in 0..20 {
            board.fade_followers();
        }
        assert_eq!(board.follower_alpha(), 0.01);
    }

    #[test]
    fn test_menu_tiles_use_regular_placement() {
        let mut board = Board::new();
        let cells = board.menu_tiles();
        assert_eq!(cells.len(), 3);
        assert_eq!(board.available.len(), 4);
        assert_eq!(
            board.tile(GridIndex::new(3, 5)).unwrap().kind,
            TileKind::Menu(MenuAction::Play)
        );
        assert_invariants(&board);
    }

    proptest! {
        // Random spawn/remove/unlock/tick interleavings never break the
        // occupancy bookkeeping.
        #[test]
        fn prop_occupancy_stays_consistent(seed: u64, ops in prop::collection::vec(0u8..4, 1..128)) {
            let mut board = Board::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            for op in ops {
                match op {
                    0 => {
                        let kind = board.pick_kind(&mut rng);
                        board.spawn(kind, 1.0, &mut rng);
                    }
                    1 => {
                        if board.tile_count() > 0 {
                            let idx = rng.random_range(0..board.tile_count());
                            let cell = *board.occupied.keys().nth(idx).unwrap();
                            board.remove(cell);
                        }
                    }
                    2 => {
                        board.unlock_next_cell(&mut rng);
                    }
                    _ => {
                        board.tick(0.5);
                    }
                }
                assert_invariants(&board);
                // Occupied and available partition the open cells exactly.
                prop_assert_eq!(board.tile_count() + board.available.len(), board.open.len());
            }
        }
    }
}
