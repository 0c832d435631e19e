//! Build worlds from ASCII maps
//!
//! Terrain uses the feature table symbols. A few extra symbols mark things
//! that sit on a floor cell:
//!
//! | symbol | meaning |
//! |---|---|
//! | `@` | the player |
//! | `;` | glyph of warding |
//! | `^` | explosive rune (known to the player) |
//! | `$` | gold |
//! | `!` | a potion |
//! | `\|` | a weapon |
//!
//! Any other symbol must be registered with [`WorldBuilder::race`] and
//! places a hostile monster of that race.

use hashbrown::HashMap;

use super::{AiConfig, EngineError, World};
use crate::dungeon::{CellInfo, FeatureId, FeatureTable, Floor, Pos};
use crate::monster::{Bestiary, Monster, MonsterRace, RaceId};
use crate::object::{Item, ItemKind};
use crate::player::Player;

#[derive(Debug, Clone, Default)]
pub struct WorldBuilder {
    rows: Vec<String>,
    races: Vec<(char, MonsterRace)>,
    player: Player,
    config: AiConfig,
    features: Option<FeatureTable>,
    seed: u64,
    arena: bool,
    no_melee: bool,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, rows: &[&str]) -> Self {
        self.rows = rows.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Register a monster symbol
    pub fn race(mut self, symbol: char, race: MonsterRace) -> Self {
        self.races.push((symbol, race));
        self
    }

    /// Player template; its position is taken from the `@` on the map
    pub fn player(mut self, player: Player) -> Self {
        self.player = player;
        self
    }

    pub fn config(mut self, config: AiConfig) -> Self {
        self.config = config;
        self
    }

    pub fn features(mut self, features: FeatureTable) -> Self {
        self.features = Some(features);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn arena(mut self, arena: bool) -> Self {
        self.arena = arena;
        self
    }

    pub fn no_melee(mut self, no_melee: bool) -> Self {
        self.no_melee = no_melee;
        self
    }

    pub fn build(self) -> Result<World, EngineError> {
        self.config.validate()?;

        let height = self.rows.len() as i32;
        let width = self.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        if height == 0 || width == 0 {
            return Err(EngineError::InvalidConfig("empty map".to_string()));
        }

        let features = self.features.unwrap_or_default();
        let mut floor = Floor::with_features(features, height, width, FeatureId::PERMANENT_WALL);

        let mut bestiary = Bestiary::new();
        let mut symbols: HashMap<char, RaceId> = HashMap::new();
        for (symbol, race) in self.races {
            let id = bestiary.insert(race);
            symbols.insert(symbol, id);
        }

        let mut player_pos = None;
        let mut monsters = Vec::new();

        for (y, row) in self.rows.iter().enumerate() {
            for (x, symbol) in row.chars().enumerate() {
                let pos = Pos::new(y as i32, x as i32);
                if let Some(feat) = floor.features().by_symbol(symbol) {
                    floor.set_feature(pos, feat)?;
                    continue;
                }

                floor.set_feature(pos, FeatureId::FLOOR)?;
                let cell = floor
                    .cell_mut(pos)
                    .ok_or(EngineError::OutOfBounds(pos))?;
                match symbol {
                    '@' => player_pos = Some(pos),
                    ';' => cell.info |= CellInfo::GLYPH,
                    '^' => cell.info |= CellInfo::EXPLOSIVE_RUNE | CellInfo::MARK,
                    '$' => cell.items.push(Item::new(ItemKind::Gold, "gold")),
                    '!' => cell.items.push(Item::new(ItemKind::Potion, "potion")),
                    '|' => cell.items.push(Item::new(ItemKind::Weapon, "dagger")),
                    ' ' => {}
                    other => match symbols.get(&other) {
                        Some(&race) => monsters.push((race, pos)),
                        None => {
                            return Err(EngineError::InvalidConfig(format!(
                                "unknown map symbol '{other}' at {pos}"
                            )));
                        }
                    },
                }
            }
        }

        let mut player = self.player;
        player.pos = player_pos
            .ok_or_else(|| EngineError::InvalidConfig("map has no player '@'".to_string()))?;

        let mut world = World::new(floor, player, bestiary, self.seed);
        world.config = self.config;
        world.arena = self.arena;
        world.no_melee = self.no_melee;

        for (race_id, pos) in monsters {
            let race = world.bestiary.get_or_err(race_id)?;
            let mut monster = Monster::new(race_id, pos, race.max_hp);
            monster.speed = race.speed;
            world.spawn_monster(monster)?;
        }
        world.update_all_visibility();
        Ok(world)
    }
}
