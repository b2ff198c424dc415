//! Play-session control
//!
//! Owns score, combo, health and the phase state machine, routes taps to the
//! board, reacts to tile outcomes and drives the difficulty curve. The host
//! calls [`GameSession::tick`] once per rendered frame with elapsed seconds
//! and drains [`GameEvent`]s afterwards; taps arrive already mapped to a
//! storage cell. Everything runs synchronously on the caller's thread.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::consts::{
    HEALTH_DRAIN_RAMP, HEALTH_DRAIN_START, HEALTH_MAX, MISS_PENALTY, SCORE_THRESHOLDS,
    SPAWN_INTERVAL, UNLOCK_INTERVAL,
};
use crate::grid::GridIndex;
use crate::stats::{Leaderboard, MemoryStats, NullLeaderboard, StatsStore};
use crate::tile::{MenuAction, TapOutcome, TileKind, TileOutcome};

/// Current phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Main menu; only the menu tiles respond to taps.
    Menu,
    /// Active gameplay.
    Playing,
    /// Simulation frozen, awaiting resume or navigation.
    Paused,
    /// Run ended; awaiting navigation.
    GameOver,
    /// One-frame setup phase between menu/pause and play.
    Restarting,
}

/// Side effects surfaced to the host for rendering, audio and haptics.
///
/// The session never waits on these; it pushes them and moves on.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A tile appeared; map its cell with [`crate::cell_to_pixel`].
    TileSpawned { cell: GridIndex, kind: TileKind },
    TileRemoved { cell: GridIndex },
    /// A multi-tap absorbed a tap and wants its counter pulsed.
    TilePulsed { cell: GridIndex, taps_left: u32 },
    /// A frontier cell opened up.
    CellUnlocked { cell: GridIndex },
    /// Good hit: play the success feedback.
    Success { cell: GridIndex, gained: u32 },
    /// Bad hit or expiry: play the failure feedback.
    Failure { cell: GridIndex },
    /// Tap landed on an open but empty cell.
    Miss,
    /// A menu tile fired.
    Menu(MenuAction),
    PhaseChanged(GamePhase),
    /// Terminal summary, emitted once per run after stats are recorded.
    GameOver {
        score: u32,
        max_combo: u32,
        best_score: bool,
        best_combo: bool,
    },
}

/// One play session: board, RNG, score/health state and collaborators.
pub struct GameSession {
    board: Board,
    rng: Pcg32,
    phase: GamePhase,

    score: u32,
    combo: u32,
    max_combo: u32,
    health: f32,

    difficulty_base: usize,
    difficulty_scaler: f32,
    difficulty_level: f32,
    max_tiles: u32,
    live_tiles: u32,

    /// Continuous drain rate; ramps up over the session.
    health_drain: f32,
    spawn_clock: f32,
    unlock_clock: f32,

    /// Tiles tapped this run, flushed to the stats store at game over.
    taps: u32,

    stats: Box<dyn StatsStore>,
    leaderboard: Box<dyn Leaderboard>,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Build a session with explicit collaborators and enter the menu.
    pub fn new(seed: u64, stats: Box<dyn StatsStore>, leaderboard: Box<dyn Leaderboard>) -> Self {
        let mut session = Self {
            board: Board::new(),
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            score: 0,
            combo: 1,
            max_combo: 1,
            health: HEALTH_MAX,
            difficulty_base: 0,
            difficulty_scaler: 0.0,
            difficulty_level: 1.0,
            max_tiles: 1,
            live_tiles: 0,
            health_drain: HEALTH_DRAIN_START,
            spawn_clock: 0.0,
            unlock_clock: 0.0,
            taps: 0,
            stats,
            leaderboard,
            events: Vec::new(),
        };
        session.enter_menu();
        session
    }

    /// Session with an in-memory stats store and no leaderboard.
    pub fn with_defaults(seed: u64) -> Self {
        Self::new(seed, Box::new(MemoryStats::new()), Box::new(NullLeaderboard))
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn difficulty_level(&self) -> f32 {
        self.difficulty_level
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn stats(&self) -> &dyn StatsStore {
        &*self.stats
    }

    /// Take everything that happened since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Explicit phase transition. Runs the entry setup of the new phase
    /// synchronously before returning.
    pub fn set_phase(&mut self, phase: GamePhase) {
        log::info!("phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.events.push(GameEvent::PhaseChanged(phase));
        match phase {
            GamePhase::Menu => self.enter_menu(),
            GamePhase::Restarting => self.enter_restart(),
            GamePhase::GameOver => self.enter_game_over(),
            // Playing and Paused need no setup beyond the gate in tick().
            GamePhase::Playing | GamePhase::Paused => {}
        }
    }

    /// Pause, from play only.
    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.set_phase(GamePhase::Paused);
        }
    }

    /// Resume a paused session.
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.set_phase(GamePhase::Playing);
        }
    }

    /// Start a fresh run from the menu, pause screen or game-over screen.
    pub fn restart(&mut self) {
        if matches!(
            self.phase,
            GamePhase::Menu | GamePhase::Paused | GamePhase::GameOver
        ) {
            self.set_phase(GamePhase::Restarting);
        }
    }

    /// Back to the menu from the pause or game-over screen.
    pub fn to_menu(&mut self) {
        if matches!(self.phase, GamePhase::Paused | GamePhase::GameOver) {
            self.set_phase(GamePhase::Menu);
        }
    }

    /// Advance the session by one frame.
    pub fn tick(&mut self, elapsed: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }

        for (cell, outcome) in self.board.tick(elapsed) {
            match outcome {
                TileOutcome::Success => self.on_success(cell),
                TileOutcome::Failure => self.on_failure(cell),
            }
        }

        // Continuous drain; the rate itself accelerates over the session,
        // independent of difficulty.
        self.health_drain += HEALTH_DRAIN_RAMP * elapsed;
        self.set_health(self.health - self.health_drain * self.difficulty_level * elapsed);
        if self.health <= 0.0 {
            self.set_phase(GamePhase::GameOver);
            return;
        }

        self.spawn_clock += elapsed;
        while self.spawn_clock >= SPAWN_INTERVAL {
            self.spawn_clock -= SPAWN_INTERVAL;
            self.try_spawn();
        }

        self.unlock_clock += elapsed;
        while self.unlock_clock >= UNLOCK_INTERVAL {
            self.unlock_clock -= UNLOCK_INTERVAL;
            if let Some(cell) = self.board.unlock_next_cell(&mut self.rng) {
                log::debug!("unlocked cell {cell:?}");
                self.events.push(GameEvent::CellUnlocked { cell });
            }
        }
    }

    /// Route a tap already mapped to a storage cell.
    pub fn tap(&mut self, cell: GridIndex) {
        match self.phase {
            GamePhase::Playing | GamePhase::Restarting => self.tap_board(cell),
            GamePhase::Menu => self.tap_menu(cell),
            // Pause/game-over screens are fixed UI; navigation goes through
            // pause()/resume()/restart()/to_menu().
            GamePhase::Paused | GamePhase::GameOver => {}
        }
    }

    fn tap_board(&mut self, cell: GridIndex) {
        let Some(tile) = self.board.tile_mut(cell) else {
            // Only unlocked cells register a miss; taps outside the map are
            // swallowed.
            if self.board.is_open(cell) {
                self.on_miss();
            }
            return;
        };
        self.taps += 1;
        match tile.tap() {
            TapOutcome::Ignored | TapOutcome::Menu(_) => {}
            TapOutcome::Pulse { taps_left } => {
                self.events.push(GameEvent::TilePulsed { cell, taps_left });
            }
            TapOutcome::Resolved(TileOutcome::Success) => self.on_success(cell),
            TapOutcome::Resolved(TileOutcome::Failure) => self.on_failure(cell),
        }
    }

    fn tap_menu(&mut self, cell: GridIndex) {
        let Some(tile) = self.board.tile_mut(cell) else {
            return;
        };
        if let TapOutcome::Menu(action) = tile.tap() {
            self.events.push(GameEvent::Menu(action));
            if action == MenuAction::Play {
                self.set_phase(GamePhase::Restarting);
            }
        }
    }

    /// A tile resolved well: score it, heal, extend the combo, replace it.
    fn on_success(&mut self, cell: GridIndex) {
        let Some(tile) = self.board.tile(cell) else {
            return;
        };
        let kind = tile.kind;
        let points = tile.points;
        let restore = tile.restore;

        // A follower's own success is silent: it resolves the pair and fades
        // the shared alpha, while the leader's notify path carries the
        // score/combo effects.
        if let TileKind::PairedFollower { leader } = kind {
            self.remove_tile(cell);
            self.live_tiles = self.live_tiles.saturating_sub(1);
            self.board.fade_followers();
            if let Some(TileOutcome::Success) =
                self.board.tile_mut(leader).and_then(|t| t.notify())
            {
                self.on_success(leader);
            }
            return;
        }

        if let Some(spawn_kind) = kind.spawn_kind() {
            self.board.progress_unlock(spawn_kind);
        }

        let multiplier =
            (self.combo - 1) as f32 / 10.0 + self.difficulty_level.log10().max(0.0);
        let gained = 10 * (points as f32 * (1.0 + multiplier)).round() as u32;
        self.score += gained;
        self.set_health(self.health + restore);
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.live_tiles = self.live_tiles.saturating_sub(1);

        self.difficulty_scaler += 1.0;
        self.reconsider_difficulty();

        self.events.push(GameEvent::Success { cell, gained });
        self.try_spawn();
        self.remove_tile(cell);
    }

    /// A tile resolved badly: take the penalty, reset the combo, replace it.
    fn on_failure(&mut self, cell: GridIndex) {
        let Some(tile) = self.board.tile(cell) else {
            return;
        };
        let penalty = tile.penalty;

        // A failed leader drags its follower down with it.
        if let TileKind::PairedLeader { follower, .. } = tile.kind {
            self.remove_tile(follower);
            self.live_tiles = self.live_tiles.saturating_sub(1);
        }

        self.set_health(self.health - penalty);
        self.combo = 1;
        self.live_tiles = self.live_tiles.saturating_sub(1);

        self.difficulty_scaler -= 3.0;
        self.reconsider_difficulty();

        self.events.push(GameEvent::Failure { cell });
        self.try_spawn();
        self.remove_tile(cell);
    }

    /// Tap on an open but empty cell. Feedback only; no tile is involved.
    fn on_miss(&mut self) {
        self.set_health(self.health - MISS_PENALTY);
        self.combo = 1;
        self.difficulty_scaler -= 3.0;
        self.events.push(GameEvent::Miss);
    }

    /// Step the difficulty base while the score clears its thresholds.
    /// Every second step also raises the concurrency cap and fills it.
    fn reconsider_difficulty(&mut self) {
        while self.difficulty_base < SCORE_THRESHOLDS.len()
            && self.score > SCORE_THRESHOLDS[self.difficulty_base]
        {
            self.difficulty_base += 1;
            log::info!("difficulty base {}", self.difficulty_base);
            if self.difficulty_base % 2 == 0 {
                self.max_tiles += 1;
                self.try_spawn();
            }
        }

        let adapter = 1.0 + self.difficulty_scaler / 100.0;
        self.difficulty_level = (self.difficulty_base as f32 / 2.0 + adapter).max(0.5);
    }

    /// Spawn a weighted-random tile if below the concurrency cap.
    fn try_spawn(&mut self) {
        if self.live_tiles >= self.max_tiles {
            return;
        }
        let kind = self.board.pick_kind(&mut self.rng);
        let placed = self
            .board
            .spawn(kind, self.difficulty_level, &mut self.rng);
        self.live_tiles += placed.len() as u32;
        for cell in placed {
            if let Some(tile) = self.board.tile(cell) {
                self.events.push(GameEvent::TileSpawned {
                    cell,
                    kind: tile.kind,
                });
            }
        }
    }

    fn remove_tile(&mut self, cell: GridIndex) {
        if self.board.remove(cell) {
            self.events.push(GameEvent::TileRemoved { cell });
        }
    }

    /// Health is capped, never floored; the game-over check reads the raw
    /// post-drain value.
    fn set_health(&mut self, value: f32) {
        self.health = value.min(HEALTH_MAX);
    }

    fn enter_menu(&mut self) {
        self.board.reset_layers();
        for cell in self.board.menu_tiles() {
            if let Some(tile) = self.board.tile(cell) {
                self.events.push(GameEvent::TileSpawned {
                    cell,
                    kind: tile.kind,
                });
            }
        }
    }

    /// Reset every session variable, seed the first tile, and go play.
    fn enter_restart(&mut self) {
        self.board.reset_layers();
        self.score = 0;
        self.combo = 1;
        self.max_combo = 1;
        self.health = HEALTH_MAX;
        self.difficulty_base = 0;
        self.difficulty_scaler = 0.0;
        self.max_tiles = 1;
        self.live_tiles = 0;
        self.health_drain = HEALTH_DRAIN_START;
        self.spawn_clock = 0.0;
        self.unlock_clock = 0.0;
        self.taps = 0;
        self.reconsider_difficulty();

        self.try_spawn();
        self.set_phase(GamePhase::Playing);
    }

    /// Record stats, submit new bests, and emit the terminal summary.
    fn enter_game_over(&mut self) {
        let best_score = self.stats.update_best_score(self.score);
        let best_combo = self.stats.update_best_combo(self.max_combo);
        if best_score {
            self.leaderboard.submit_score(self.score);
        }
        if best_combo {
            self.leaderboard.submit_combo(self.max_combo);
        }
        self.stats.add_taps(self.taps as i64);

        log::info!(
            "game over: score {} combo {} taps {}",
            self.score,
            self.max_combo,
            self.taps
        );
        self.events.push(GameEvent::GameOver {
            score: self.score,
            max_combo: self.max_combo,
            best_score,
            best_combo,
        });
    }
}
