//! Guideline rule engine: a fixed, ordered list of pure predicates over
//! a fully annotated [`Layout`], producing a flat list of failures.
//!
//! Rules are independent; every rule runs against the full layout and
//! the order only decides the order of failures in the output.

use floorplan_model::{Layout, Point};
use serde::{Deserialize, Serialize};

/// Guideline identifiers. The discriminants are catalog codes and MUST
/// be kept in lockstep with the external `guidelines` table at all
/// times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Guideline {
    RoomsHaveDoor = 1,
    LayoutHasRoom = 2,
    RoomsHaveDimension = 3,
    DimensionsInRange = 4,
    AreaInRange = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuidelineCategory {
    Structural,
    Exterior,
    Zoning,
}

/// Display data the surrounding application shows next to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidelineInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub category: GuidelineCategory,
}

impl Guideline {
    pub fn code(&self) -> u32 {
        *self as u32
    }

    pub fn info(&self) -> GuidelineInfo {
        match self {
            Guideline::RoomsHaveDoor => GuidelineInfo {
                title: "Rooms are accessible",
                description: "Every room must contain at least one door or sliding door.",
                category: GuidelineCategory::Structural,
            },
            Guideline::LayoutHasRoom => GuidelineInfo {
                title: "Layout has rooms",
                description: "A floor plan must contain at least one enclosed room.",
                category: GuidelineCategory::Structural,
            },
            Guideline::RoomsHaveDimension => GuidelineInfo {
                title: "Rooms are dimensioned",
                description: "Every room must carry a width-by-height dimension callout.",
                category: GuidelineCategory::Zoning,
            },
            Guideline::DimensionsInRange => GuidelineInfo {
                title: "Room sides are plausible",
                description: "Each side of a dimensioned room must fall within the admissible range.",
                category: GuidelineCategory::Zoning,
            },
            Guideline::AreaInRange => GuidelineInfo {
                title: "Room area is plausible",
                description: "A dimensioned room's floor area must stay below the configured maximum.",
                category: GuidelineCategory::Zoning,
            },
        }
    }
}

/// One guideline violation, optionally localized for UI highlighting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub guideline: Guideline,
    pub location: Option<Point>,
}

/// Empty verdict means the guideline is satisfied for the whole layout.
pub type Verdict = Vec<Failure>;

pub type Rule = fn(&Layout, &RuleConfig) -> Verdict;

#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Admissible per-side range in feet, open bounds
    pub side_range: (f64, f64),
    /// Upper area bound, open. The constant is the catalog's 110 m²
    /// figure applied to feet-denominated sides, inherited as-is; make
    /// any unit fix a deliberate catalog change.
    pub max_area: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            side_range: (2.0, 200.0),
            max_area: 110.0,
        }
    }
}

fn rule_at_least_one_room(layout: &Layout, _config: &RuleConfig) -> Verdict {
    if layout.rooms().is_empty() {
        vec![Failure {
            guideline: Guideline::LayoutHasRoom,
            location: None,
        }]
    } else {
        Vec::new()
    }
}

fn rule_every_room_door(layout: &Layout, _config: &RuleConfig) -> Verdict {
    layout
        .rooms()
        .iter()
        .filter(|room| !room.symbols().iter().any(|s| s.category().counts_as_door()))
        .map(|room| Failure {
            guideline: Guideline::RoomsHaveDoor,
            location: Some(room.polygon().centroid()),
        })
        .collect()
}

fn rule_every_room_dimension(layout: &Layout, _config: &RuleConfig) -> Verdict {
    layout
        .rooms()
        .iter()
        .filter(|room| room.first_dimension().is_none())
        .map(|room| Failure {
            guideline: Guideline::RoomsHaveDimension,
            location: Some(room.polygon().centroid()),
        })
        .collect()
}

// Rules 4 and 5 stay silent for rooms without any dimension; that gap
// is rule 3's to report, once.

fn rule_dimensions_in_range(layout: &Layout, config: &RuleConfig) -> Verdict {
    let (lo, hi) = config.side_range;
    layout
        .rooms()
        .iter()
        .filter_map(|room| room.first_dimension().map(|dim| (room, dim)))
        .filter(|(_, dim)| {
            let side_ok = |side: f64| side > lo && side < hi;
            !side_ok(dim.width) || !side_ok(dim.height)
        })
        .map(|(room, _)| Failure {
            guideline: Guideline::DimensionsInRange,
            location: Some(room.polygon().centroid()),
        })
        .collect()
}

fn rule_area_in_range(layout: &Layout, config: &RuleConfig) -> Verdict {
    layout
        .rooms()
        .iter()
        .filter_map(|room| room.first_dimension().map(|dim| (room, dim)))
        .filter(|(_, dim)| {
            let area = dim.width * dim.height;
            !(area > 0.0 && area < config.max_area)
        })
        .map(|(room, _)| Failure {
            guideline: Guideline::AreaInRange,
            location: Some(room.polygon().centroid()),
        })
        .collect()
}

/// The canonical rule list; output failures follow this order.
const RULES: &[Rule] = &[
    rule_at_least_one_room,
    rule_every_room_door,
    rule_every_room_dimension,
    rule_dimensions_in_range,
    rule_area_in_range,
];

pub struct RuleEngine {
    config: RuleConfig,
}

impl RuleEngine {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(RuleConfig::default())
    }

    /// Run every rule against the layout and concatenate the verdicts.
    /// No early exit: rules are independent.
    pub fn validate(&self, layout: &Layout) -> Vec<Failure> {
        let mut all_failures = Vec::new();
        for rule in RULES {
            all_failures.extend(rule(layout, &self.config));
        }
        all_failures
    }
}
