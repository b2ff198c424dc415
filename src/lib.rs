//! Hexpop - a hexagonal tile-tap arcade game core
//!
//! Core modules:
//! - `grid`: integer hex-grid coordinates and screen mapping
//! - `tile`: timed, tappable tile entities
//! - `board`: cell occupancy, frontier growth and weighted spawning
//! - `session`: score/combo/health state machine driving one play session
//! - `stats`: persistence and leaderboard collaborator interfaces
//!
//! The crate is an embedded, single-threaded game core. This module must be
//! pure and deterministic:
//! - Frame-driven: the host delivers elapsed seconds once per rendered frame
//! - Seeded RNG only
//! - Stable iteration order (by grid cell)
//! - No rendering or platform dependencies
//!
//! The host drives [`GameSession::tick`] and [`GameSession::tap`] and drains
//! [`GameEvent`]s for rendering, audio and haptics.

pub mod board;
pub mod grid;
pub mod session;
pub mod stats;
pub mod tile;

pub use board::Board;
pub use grid::{CENTER_OFFSET, GridIndex, HexDirection, cell_to_pixel};
pub use session::{GameEvent, GamePhase, GameSession};
pub use stats::{Leaderboard, MemoryStats, NullLeaderboard, StatsStore};
pub use tile::{MenuAction, SpawnKind, TapOutcome, Tile, TileKind, TileOutcome, TileState};

/// Game configuration constants
pub mod consts {
    /// Grid extents in storage space (inclusive upper bounds).
    pub const GRID_COLUMNS: i32 = 7;
    pub const GRID_ROWS: i32 = 10;

    /// Seconds between automatic spawn attempts while playing.
    pub const SPAWN_INTERVAL: f32 = 2.0;
    /// Seconds between frontier-cell unlocks while playing.
    pub const UNLOCK_INTERVAL: f32 = 10.0;

    /// Health ceiling; health is clamped to this after every change.
    pub const HEALTH_MAX: f32 = 100.0;
    /// Continuous drain rate at session start (health per second).
    pub const HEALTH_DRAIN_START: f32 = 8.0;
    /// Drain acceleration (health per second, per second of play).
    pub const HEALTH_DRAIN_RAMP: f32 = 0.02;
    /// Flat health cost of tapping an open but empty cell.
    pub const MISS_PENALTY: f32 = 5.0;

    /// Score thresholds that step up the difficulty base.
    pub const SCORE_THRESHOLDS: [u32; 5] = [1500, 4500, 8000, 12000, 20000];

    /// Fade applied to follower tiles each time a pair resolves.
    pub const FOLLOWER_FADE_STEP: f32 = 0.15;
    /// Fade floor so followers never become fully invisible.
    pub const FOLLOWER_ALPHA_FLOOR: f32 = 0.01;
}
