//! Treasure Island - turn engine for a hex-grid treasure hunt
//!
//! This crate provides the core game logic, including:
//! - Axial hex coordinates and the island grid with its areas and structures
//! - Spatial reasoning (adjacency, line of sight, shortest routes, amulet spawns)
//! - Path cards and treasure trails that narrow down where a treasure lies
//! - A per-player turn state machine fed through action queues
//! - The round orchestrator with its treasure distribution protocol
//!
//! # Architecture
//!
//! [`GameController`] owns the [`GameState`] and runs on its own thread. Players
//! (humans or [`Bot`]s) talk to it only through [`PlayerHandle`]s: they push
//! [`PlayerAction`]s and read immutable [`PlayerState`] snapshots.
//!
//! # Modules
//!
//! - [`hex`]: Axial coordinates and edge directions
//! - [`grid`]: Tiles, edges, structures and the map layout
//! - [`spatial`]: Areas, predicates, path finding and statue rays
//! - [`cards`]: Path cards, treasure cards and the treasure deck
//! - [`trail`]: The four treasure trails
//! - [`controller`]: Action queues and the turn state machine
//! - [`game`]: Round orchestration and treasure distribution

pub mod actions;
pub mod bot;
pub mod cards;
pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod grid;
pub mod hex;
pub mod objective;
pub mod player;
pub mod snapshot;
pub mod spatial;
pub mod state;
pub mod trail;

// Re-export commonly used types
pub use actions::{ActionKind, AmuletAction, GameEvent, PlayerAction};
pub use bot::Bot;
pub use cards::{
    CardId, CardType, FilterType, GoldCard, PathCard, PathCardKind, TreasureCard, TreasureDeck,
};
pub use config::{AreaPolicy, GameConfig};
pub use controller::PlayerHandle;
pub use error::{GameError, GridError, IllegalAction, TurnError};
pub use game::{GameController, GameObservers, StopHandle};
pub use grid::{Area, AreaId, Edge, HexGrid, MapLayout, Structure, StructureKind, Tile, TileType};
pub use hex::{EdgeDirection, TilePosition};
pub use objective::PlayerObjective;
pub use player::{Player, PlayerColor, PlayerId};
pub use snapshot::PlayerState;
pub use state::GameState;
pub use trail::{TrailColor, TreasureTrail, TreasureTrails};
