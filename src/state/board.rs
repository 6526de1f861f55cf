//! Board geometry and resource enumeration shared by the encoder, the action
//! indexer and the value network.

/// Number of tradable resource kinds.
pub const NUM_RESOURCES: usize = 5;

/// Number of building types: none, settlement, city.
pub const NUM_BUILDING_TYPES: usize = 3;

/// Cap applied when normalising a player's resource count.
pub const MAX_RESOURCES_PER_TYPE: i64 = 19;

/// Cap applied when normalising victory points.
pub const MAX_VICTORY_POINTS: i64 = 10;

/// Number token carried by the desert (treated as "no token").
pub const DESERT_TOKEN: i64 = 7;

/// Fixed board dimensions. Every size the encoder and the indexer agree on is
/// derived from these four numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub hexes: usize,
    pub edges: usize,
    pub vertices: usize,
    pub players: usize,
}

impl BoardConfig {
    /// The standard two-player board.
    pub const STANDARD: BoardConfig = BoardConfig {
        hexes: 19,
        edges: 72,
        vertices: 54,
        players: 2,
    };

    /// One-hot over the five resources plus desert, then the scaled token.
    pub const fn features_per_hex(&self) -> usize {
        NUM_RESOURCES + 1 + 1
    }

    /// Unowned plus one slot per player.
    pub const fn owner_slots(&self) -> usize {
        self.players + 1
    }

    pub const fn features_per_building(&self) -> usize {
        self.owner_slots() + NUM_BUILDING_TYPES
    }

    pub const fn features_per_player(&self) -> usize {
        NUM_RESOURCES + 1
    }

    pub const fn hex_section_size(&self) -> usize {
        self.hexes * self.features_per_hex()
    }

    pub const fn road_section_size(&self) -> usize {
        self.edges * self.owner_slots()
    }

    pub const fn building_section_size(&self) -> usize {
        self.vertices * self.features_per_building()
    }

    pub const fn player_section_size(&self) -> usize {
        self.players * self.features_per_player()
    }

    /// Current player index and scaled dice result.
    pub const fn global_section_size(&self) -> usize {
        2
    }

    /// Total length of an encoded state vector.
    pub const fn vector_len(&self) -> usize {
        self.hex_section_size()
            + self.road_section_size()
            + self.building_section_size()
            + self.player_section_size()
            + self.global_section_size()
    }

    /// Number of ordered (give, receive) bank trade pairs.
    pub const fn bank_trade_count(&self) -> usize {
        NUM_RESOURCES * (NUM_RESOURCES - 1)
    }

    /// Total size of the indexed action space.
    pub const fn action_space_size(&self) -> usize {
        self.edges + 2 * self.vertices + self.bank_trade_count() + 1
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Encoded state length for the standard board.
pub const VECTOR_LEN: usize = BoardConfig::STANDARD.vector_len();

/// Action space size for the standard board.
pub const ACTION_SPACE_SIZE: usize = BoardConfig::STANDARD.action_space_size();

/// Tradable resources in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Lumber,
    Brick,
    Wool,
    Grain,
    Ore,
}

impl Resource {
    pub const ALL: [Resource; NUM_RESOURCES] = [
        Resource::Lumber,
        Resource::Brick,
        Resource::Wool,
        Resource::Grain,
        Resource::Ore,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical wire name.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Lumber => "LUMBER",
            Resource::Brick => "BRICK",
            Resource::Wool => "WOOL",
            Resource::Grain => "GRAIN",
            Resource::Ore => "ORE",
        }
    }

    /// Parses a wire name. The game client has used two vocabularies over
    /// time, both are accepted.
    pub fn from_name(name: &str) -> Option<Resource> {
        match name {
            "LUMBER" | "WOOD" => Some(Resource::Lumber),
            "BRICK" => Some(Resource::Brick),
            "WOOL" | "SHEEP" => Some(Resource::Wool),
            "GRAIN" | "WHEAT" => Some(Resource::Grain),
            "ORE" | "STONE" => Some(Resource::Ore),
            _ => None,
        }
    }

    /// All wire names that denote this resource.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Resource::Lumber => &["LUMBER", "WOOD"],
            Resource::Brick => &["BRICK"],
            Resource::Wool => &["WOOL", "SHEEP"],
            Resource::Grain => &["GRAIN", "WHEAT"],
            Resource::Ore => &["ORE", "STONE"],
        }
    }
}

/// What a hex produces. The desert is its own slot in the hex one-hot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexTerrain {
    Producing(Resource),
    Desert,
}

impl HexTerrain {
    /// Slot within the six-wide terrain one-hot.
    pub fn slot(self) -> usize {
        match self {
            HexTerrain::Producing(resource) => resource.index(),
            HexTerrain::Desert => NUM_RESOURCES,
        }
    }

    /// Unknown or missing names fall back to the desert.
    pub fn from_name(name: Option<&str>) -> HexTerrain {
        match name {
            Some("DESERT") | None => HexTerrain::Desert,
            Some(other) => Resource::from_name(other)
                .map(HexTerrain::Producing)
                .unwrap_or(HexTerrain::Desert),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingType {
    None,
    Settlement,
    City,
}

impl BuildingType {
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Unknown or missing names fall back to `None`.
    pub fn from_name(name: Option<&str>) -> BuildingType {
        match name {
            Some("SETTLEMENT") => BuildingType::Settlement,
            Some("CITY") => BuildingType::City,
            _ => BuildingType::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sizes() {
        let board = BoardConfig::STANDARD;
        assert_eq!(board.hex_section_size(), 133);
        assert_eq!(board.road_section_size(), 216);
        assert_eq!(board.building_section_size(), 324);
        assert_eq!(board.player_section_size(), 12);
        assert_eq!(VECTOR_LEN, 687);
        assert_eq!(ACTION_SPACE_SIZE, 201);
    }

    #[test]
    fn test_resource_aliases() {
        assert_eq!(Resource::from_name("WOOD"), Some(Resource::Lumber));
        assert_eq!(Resource::from_name("SHEEP"), Some(Resource::Wool));
        assert_eq!(Resource::from_name("STONE"), Some(Resource::Ore));
        assert_eq!(Resource::from_name("DESERT"), None);
        for resource in Resource::ALL {
            assert_eq!(Resource::from_name(resource.name()), Some(resource));
        }
    }

    #[test]
    fn test_hex_terrain_fallback() {
        assert_eq!(HexTerrain::from_name(None), HexTerrain::Desert);
        assert_eq!(HexTerrain::from_name(Some("LAVA")), HexTerrain::Desert);
        assert_eq!(HexTerrain::from_name(Some("DESERT")).slot(), 5);
        assert_eq!(HexTerrain::from_name(Some("ORE")).slot(), 4);
    }
}
