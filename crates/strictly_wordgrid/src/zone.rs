//! Static multiplier zones.
//!
//! Zones are fixed at startup from a category → coordinate table and never
//! change during a game. A coordinate belongs to zero or one zone; if the
//! tables ever overlap, the category listed first wins.

use crate::types::Coord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, instrument};

/// Score multiplier attached to a board cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
pub enum SpecialZone {
    /// Word score ×3.
    #[strum(serialize = "TW")]
    TripleWord,
    /// Word score ×2.
    #[strum(serialize = "DW")]
    DoubleWord,
    /// Letter score ×3.
    #[strum(serialize = "TL")]
    TripleLetter,
    /// Letter score ×2.
    #[strum(serialize = "DL")]
    DoubleLetter,
}

impl SpecialZone {
    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::TripleWord => "Triple Word",
            Self::DoubleWord => "Double Word",
            Self::TripleLetter => "Triple Letter",
            Self::DoubleLetter => "Double Letter",
        }
    }
}

const TRIPLE_WORD: &[(usize, usize)] = &[
    (0, 0), (0, 5), (0, 10), (0, 15),
    (5, 0), (5, 15),
    (10, 0), (10, 15),
    (15, 0), (15, 5), (15, 10), (15, 15),
    (5, 5), (5, 10), (10, 5), (10, 10),
];

const DOUBLE_WORD: &[(usize, usize)] = &[
    (1, 1), (2, 2), (3, 3), (4, 4),
    (16, 16), (17, 17), (18, 18), (19, 19),
    (1, 18), (2, 17), (3, 16), (4, 15),
    (19, 1), (18, 2), (17, 3), (16, 4),
];

const TRIPLE_LETTER: &[(usize, usize)] = &[
    (1, 5), (1, 15), (5, 1), (5, 19),
    (5, 9), (9, 5), (9, 15),
    (15, 1), (15, 19),
    (15, 9), (19, 5), (19, 15),
];

const DOUBLE_LETTER: &[(usize, usize)] = &[
    (3, 0), (3, 8), (3, 11), (3, 19),
    (8, 3), (8, 8), (8, 11), (8, 16),
    (11, 3), (11, 8), (11, 11), (11, 16),
    (16, 0), (16, 8), (16, 11), (16, 19),
];

static STANDARD: LazyLock<ZoneTable> = LazyLock::new(|| {
    ZoneTable::from_categories([
        (SpecialZone::TripleWord, TRIPLE_WORD),
        (SpecialZone::DoubleWord, DOUBLE_WORD),
        (SpecialZone::TripleLetter, TRIPLE_LETTER),
        (SpecialZone::DoubleLetter, DOUBLE_LETTER),
    ])
});

/// Lookup table from coordinate to zone.
#[derive(Debug, Clone, Default)]
pub struct ZoneTable {
    zones: HashMap<Coord, SpecialZone>,
}

impl ZoneTable {
    /// Builds a table from category → coordinate lists, in priority order.
    #[instrument(skip(categories))]
    pub fn from_categories<'a>(
        categories: impl IntoIterator<Item = (SpecialZone, &'a [(usize, usize)])>,
    ) -> Self {
        let mut zones = HashMap::new();
        for (zone, coords) in categories {
            for &(row, col) in coords {
                // First category to claim a cell keeps it.
                zones.entry(Coord::new(row, col)).or_insert(zone);
            }
        }
        debug!(cells = zones.len(), "Built zone table");
        Self { zones }
    }

    /// The reference 20x20 layout.
    pub fn standard() -> &'static ZoneTable {
        &STANDARD
    }

    /// Returns the zone at a coordinate, if any.
    pub fn zone_at(&self, coord: Coord) -> Option<SpecialZone> {
        self.zones.get(&coord).copied()
    }

    /// Number of cells carrying a zone.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns `true` if no cell carries a zone.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
