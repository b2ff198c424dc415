//! Tile entities
//!
//! A tile is a single timed, tappable unit occupying one grid cell. Kind
//! dispatch is a closed enum: each kind overrides pieces of the tap and
//! expiry contracts through pattern matching instead of subclassing, and
//! kind-specific payload (tap counters, pair links) lives on the variant.
//!
//! Paired tiles reference each other by grid index only; the board map is
//! the single owner of both halves and resolves the link on demand.

use serde::{Deserialize, Serialize};

use crate::grid::{GridIndex, HexDirection};

/// Lifecycle state of a tile.
///
/// `Inactive` is reserved; nothing transitions into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileState {
    Inactive,
    Standby,
    Pressed,
}

/// Named action fired by a menu tile instead of a success/failure outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuAction {
    Play,
    Settings,
    Ranking,
    About,
}

/// Tile kind plus kind-specific payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// One tap resolves it. The baseline tile.
    SingleTap,
    /// Success is surviving to expiry; tapping it is the failure.
    AvoidTap,
    /// Same contract as SingleTap but faster and worth more.
    Special,
    /// Needs several taps before it resolves.
    MultiTap { taps_left: u32 },
    /// Tapping the leader is a failure; it succeeds when its follower is
    /// tapped, via [`Tile::notify`]. `facing` points at the follower.
    PairedLeader {
        follower: GridIndex,
        facing: HexDirection,
    },
    /// The tappable half of a pair. Its own timer never fires an outcome.
    PairedFollower { leader: GridIndex },
    /// Inert menu entry point, placed through the same spawn mechanism.
    Menu(MenuAction),
}

impl TileKind {
    /// MultiTap kind for the given difficulty; harder sessions demand more taps.
    pub fn multi_tap(difficulty: f32) -> Self {
        Self::MultiTap {
            taps_left: ((1.3 * difficulty).round() as u32).max(3),
        }
    }

    /// The spawnable discriminator of this kind, if it participates in the
    /// unlock ladder. Followers and menu tiles do not.
    pub fn spawn_kind(self) -> Option<SpawnKind> {
        match self {
            TileKind::SingleTap => Some(SpawnKind::SingleTap),
            TileKind::AvoidTap => Some(SpawnKind::AvoidTap),
            TileKind::Special => Some(SpawnKind::Special),
            TileKind::MultiTap { .. } => Some(SpawnKind::MultiTap),
            TileKind::PairedLeader { .. } => Some(SpawnKind::PairedLeader),
            TileKind::PairedFollower { .. } | TileKind::Menu(_) => None,
        }
    }
}

/// Payload-free discriminator over the spawnable gameplay kinds.
///
/// Declaration order is the unlock order: the weighted picker only ever
/// draws from a prefix of this list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    SingleTap = 0,
    AvoidTap = 1,
    Special = 2,
    MultiTap = 3,
    PairedLeader = 4,
}

impl SpawnKind {
    pub const ALL: [SpawnKind; 5] = [
        SpawnKind::SingleTap,
        SpawnKind::AvoidTap,
        SpawnKind::Special,
        SpawnKind::MultiTap,
        SpawnKind::PairedLeader,
    ];
}

/// Game-rule outcome of a resolved tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    Success,
    Failure,
}

/// What a tap on a tile resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Tile was not in standby; nothing happened.
    Ignored,
    /// The tap settled the tile one way or the other.
    Resolved(TileOutcome),
    /// A multi-tap absorbed the tap and wants a visual pulse.
    Pulse { taps_left: u32 },
    /// A menu tile fired its action.
    Menu(MenuAction),
}

/// A timed, tappable unit occupying one board cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub state: TileState,
    /// Full timer duration, fixed at spawn.
    pub lifetime: f32,
    /// Seconds until the timer fires; counts down every tick.
    pub time_left: f32,
    /// Base score value.
    pub points: u32,
    /// Health restored on success.
    pub restore: f32,
    /// Health lost on failure.
    pub penalty: f32,
    /// Storage index this tile occupies; set at spawn, fixed until removal.
    pub cell: GridIndex,
}

impl Tile {
    /// Build a tile of the given kind, scaling its timer to the difficulty.
    pub fn new(kind: TileKind, difficulty: f32, cell: GridIndex) -> Self {
        let lifetime = match kind {
            // Baseline curve, shared by followers and the inert menu tiles.
            TileKind::SingleTap | TileKind::PairedFollower { .. } | TileKind::Menu(_) => {
                (3.0 - 0.5 * difficulty).max(0.8)
            }
            TileKind::AvoidTap => (1.5 - 0.1 * difficulty).max(0.6),
            TileKind::Special => (1.1 - 0.1 * difficulty).max(0.6),
            // These need more time at higher difficulty, not less.
            TileKind::MultiTap { .. } | TileKind::PairedLeader { .. } => {
                (1.0 + 0.4 * difficulty).max(2.0)
            }
        };
        let points = match kind {
            TileKind::SingleTap | TileKind::Menu(_) => 1,
            TileKind::AvoidTap | TileKind::MultiTap { .. } => 5,
            TileKind::Special
            | TileKind::PairedLeader { .. }
            | TileKind::PairedFollower { .. } => 10,
        };
        Self {
            kind,
            state: TileState::Standby,
            lifetime,
            time_left: lifetime,
            points,
            restore: (8.0 * difficulty).max(5.0),
            penalty: 7.0,
            cell,
        }
    }

    /// Fraction of the lifetime already elapsed, for the render layer.
    pub fn progress(&self) -> f32 {
        1.0 - self.time_left / self.lifetime
    }

    /// Handle a tap. No-op unless the tile is in standby.
    pub fn tap(&mut self) -> TapOutcome {
        if self.state != TileState::Standby {
            return TapOutcome::Ignored;
        }
        match &mut self.kind {
            TileKind::SingleTap | TileKind::Special => {
                self.state = TileState::Pressed;
                TapOutcome::Resolved(TileOutcome::Success)
            }
            TileKind::AvoidTap => {
                self.state = TileState::Pressed;
                TapOutcome::Resolved(TileOutcome::Failure)
            }
            TileKind::MultiTap { taps_left } => {
                if *taps_left > 1 {
                    *taps_left -= 1;
                    TapOutcome::Pulse {
                        taps_left: *taps_left,
                    }
                } else {
                    self.state = TileState::Pressed;
                    TapOutcome::Resolved(TileOutcome::Success)
                }
            }
            // The leader stays in standby on a wrong tap; the failure pass
            // removes it before a second tap can land.
            TileKind::PairedLeader { .. } => TapOutcome::Resolved(TileOutcome::Failure),
            TileKind::PairedFollower { .. } => {
                self.state = TileState::Pressed;
                TapOutcome::Resolved(TileOutcome::Success)
            }
            TileKind::Menu(action) => {
                let action = *action;
                if action == MenuAction::Play {
                    self.state = TileState::Pressed;
                }
                TapOutcome::Menu(action)
            }
        }
    }

    /// Success path for a leader whose follower was tapped.
    pub fn notify(&mut self) -> Option<TileOutcome> {
        if self.state == TileState::Standby && matches!(self.kind, TileKind::PairedLeader { .. }) {
            self.state = TileState::Pressed;
            Some(TileOutcome::Success)
        } else {
            None
        }
    }

    /// Advance the lifetime timer.
    ///
    /// Returns the expiry outcome on the tick the timer crosses zero; the
    /// tile leaves standby at that point, so the outcome fires exactly once.
    pub fn tick(&mut self, elapsed: f32) -> Option<TileOutcome> {
        if self.state != TileState::Standby {
            return None;
        }
        self.time_left -= elapsed;
        if self.time_left > 0.0 {
            return None;
        }
        match self.kind {
            // Only the leader's timer matters for a pair; the follower keeps
            // counting for its fade animation but never fires.
            TileKind::PairedFollower { .. } => None,
            TileKind::AvoidTap => {
                self.state = TileState::Pressed;
                Some(TileOutcome::Success)
            }
            _ => {
                self.state = TileState::Pressed;
                Some(TileOutcome::Failure)
            }
        }
    }
}
