//! The game model shared by the turn engine and the orchestrator.
//!
//! `GameState` owns the island, the players, the four treasure trails and the
//! treasure deck. It knows nothing about objectives or queues; those live in
//! the controller.

use crate::cards::{CardId, PathCard, TreasureCard, TreasureDeck};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::grid::HexGrid;
use crate::hex::TilePosition;
use crate::player::{Player, PlayerId};
use crate::trail::{TrailColor, TreasureTrail, TreasureTrails};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};

/// The complete model of one running game
#[derive(Debug, Clone)]
pub struct GameState {
    grid: HexGrid,
    players: Vec<Player>,
    trails: TreasureTrails,
    deck: TreasureDeck,
    winner: Option<PlayerId>,
    /// Id handed to the next created path card
    next_card_id: u32,
    rng: StdRng,
    max_players: usize,
    grid_replaced: bool,
    /// Set once the round loop started
    grid_locked: bool,
}

impl GameState {
    /// Create an empty game on `grid` with a freshly shuffled deck
    pub fn new(grid: HexGrid, config: &GameConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let deck = TreasureDeck::new(config, &mut rng);

        Self {
            grid,
            players: Vec::new(),
            trails: TreasureTrails::new(),
            deck,
            winner: None,
            next_card_id: 0,
            rng,
            max_players: config.max_players,
            grid_replaced: false,
            grid_locked: false,
        }
    }

    /// Replace the treasure deck, e.g. with a prepared stack
    pub fn with_deck(mut self, deck: TreasureDeck) -> Self {
        self.deck = deck;
        self
    }

    /// Seat a new player, returning their id
    pub fn add_player(&mut self, name: impl Into<String>, is_bot: bool) -> Result<PlayerId, GameError> {
        let count = self.players.len();
        if count >= self.max_players {
            return Err(GameError::TooManyPlayers {
                count: count + 1,
                max: self.max_players,
            });
        }
        let id = count as PlayerId;
        self.players.push(Player::new(id, name.into(), is_bot));
        Ok(id)
    }

    /// Swap the island. Allowed once, and only before the round loop starts.
    pub fn replace_grid(&mut self, grid: HexGrid) -> Result<(), GameError> {
        if self.grid_locked || self.grid_replaced {
            return Err(GameError::GridLocked);
        }
        self.grid = grid;
        self.grid_replaced = true;
        self.trails.invalidate_all();
        Ok(())
    }

    pub(crate) fn lock_grid(&mut self) {
        self.grid_locked = true;
    }

    // ==================== Accessors ====================

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut HexGrid {
        &mut self.grid
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(id as usize)
            .ok_or(GameError::UnknownPlayer(id))
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::UnknownPlayer(id))
    }

    pub fn trails(&self) -> &TreasureTrails {
        &self.trails
    }

    pub fn trail(&self, color: TrailColor) -> &TreasureTrail {
        self.trails.get(color)
    }

    pub fn deck(&self) -> &TreasureDeck {
        &self.deck
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub(crate) fn set_winner(&mut self, winner: PlayerId) {
        self.winner = Some(winner);
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // ==================== Treasure Trails ====================

    /// Candidate tiles of a trail
    pub fn evaluate_treasure_trail(&self, color: TrailColor) -> &BTreeSet<TilePosition> {
        self.trails.get(color).evaluate(&self.grid)
    }

    pub fn can_add_card_to_treasure_trail(&self, color: TrailColor, card: &PathCard) -> bool {
        self.trails.get(color).can_add(&self.grid, card)
    }

    /// Append a card, handing it back if it is not admissible
    pub(crate) fn add_card_to_treasure_trail(
        &mut self,
        color: TrailColor,
        card: PathCard,
    ) -> Result<(), PathCard> {
        self.trails.get_mut(color).add(&self.grid, card)
    }

    pub(crate) fn clear_treasure_trail(&mut self, color: TrailColor) {
        self.trails.get_mut(color).clear();
    }

    /// Whether some trail could still lose a candidate
    pub fn has_removable_tile(&self) -> bool {
        TrailColor::ALL.iter().any(|color| {
            let trail = self.trails.get(*color);
            trail.is_empty() || trail.evaluate(&self.grid).len() > 1
        })
    }

    // ==================== Cards ====================

    /// Id the next created path card will get
    pub(crate) fn peek_card_id(&self) -> CardId {
        CardId(self.next_card_id)
    }

    pub(crate) fn allocate_card_id(&mut self) -> CardId {
        let id = CardId(self.next_card_id);
        self.next_card_id += 1;
        id
    }

    pub(crate) fn draw_treasure_card(&mut self) -> TreasureCard {
        self.deck.draw(&mut self.rng)
    }

    /// Give a player a freshly generated path card
    pub(crate) fn draw_path_card(&mut self, player: PlayerId) -> Result<CardId, GameError> {
        // Validate before consuming an id
        self.player(player)?;
        let id = self.allocate_card_id();
        let card = PathCard::random(id, player, &mut self.rng);
        self.player_mut(player)?.add_card(card);
        Ok(id)
    }

    pub(crate) fn draw_path_cards(&mut self, player: PlayerId, amount: usize) -> Result<(), GameError> {
        for _ in 0..amount {
            self.draw_path_card(player)?;
        }
        Ok(())
    }

    /// Draw until the hand holds `size` cards
    pub(crate) fn top_up_hand(&mut self, player: PlayerId, size: usize) -> Result<(), GameError> {
        let missing = size.saturating_sub(self.player(player)?.hand_size());
        self.draw_path_cards(player, missing)
    }

    // ==================== Queries ====================

    /// Tiles the player could drive to from their current position
    pub fn drivable_tiles(&self, player: PlayerId) -> Result<BTreeSet<TilePosition>, GameError> {
        Ok(self
            .player(player)?
            .position
            .map(|position| self.grid.drivable_from(&position))
            .unwrap_or_default())
    }

    /// Cards in the player's hand that are admissible per trail. Trails no
    /// card fits are left out.
    pub fn valid_path_cards(
        &self,
        player: PlayerId,
    ) -> Result<BTreeMap<TrailColor, Vec<CardId>>, GameError> {
        let hand = &self.player(player)?.path_cards;
        let mut valid = BTreeMap::new();
        for color in TrailColor::ALL {
            let cards: Vec<CardId> = hand
                .values()
                .filter(|card| self.can_add_card_to_treasure_trail(color, card))
                .map(|card| card.id)
                .collect();
            if !cards.is_empty() {
                valid.insert(color, cards);
            }
        }
        Ok(valid)
    }

    /// Trails resolved to exactly the tile the player stands on
    pub fn collectable_treasures(&self, player: PlayerId) -> Result<BTreeSet<TrailColor>, GameError> {
        let Some(position) = self.player(player)?.position else {
            return Ok(BTreeSet::new());
        };
        Ok(TrailColor::ALL
            .into_iter()
            .filter(|color| self.trails.get(*color).treasure(&self.grid) == Some(position))
            .collect())
    }

    /// Player with the most gold, the earliest seat on ties
    pub fn leading_player(&self) -> Option<PlayerId> {
        let mut leader: Option<&Player> = None;
        for player in &self.players {
            if leader.map_or(true, |l| player.total_gold() > l.total_gold()) {
                leader = Some(player);
            }
        }
        leader.map(|player| player.id)
    }
}
