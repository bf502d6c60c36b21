//! Speaker and floor-plan definitions.
//!
//! Floor plans are loaded once at configuration time and never change afterwards. The deck
//! is the ordered sequence of floor plans the operator pages through.

use serde::Deserialize;

use crate::surface::geometry::Point;

/// Speaker model family, used by the host to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum SpeakerType {
    #[default]
    A,
    B,
    C,
    D,
}

impl SpeakerType {
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// One speaker at a measured position in the hall (meters, origin bottom-left).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type", default)]
    pub kind: SpeakerType,
}

impl Speaker {
    pub fn new(id: impl Into<String>, x: f64, y: f64, kind: SpeakerType) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            kind,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A named speaker sub-array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FloorPlan {
    pub label: String,
    pub speakers: Vec<Speaker>,
}

impl FloorPlan {
    pub fn new(label: impl Into<String>, speakers: Vec<Speaker>) -> Self {
        Self {
            label: label.into(),
            speakers,
        }
    }

    pub fn speaker(&self, id: &str) -> Option<&Speaker> {
        self.speakers.iter().find(|sp| sp.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.speaker(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.speakers.iter().map(|sp| sp.id.as_str())
    }
}

/// The measured Nexo rig of the main hall.
pub fn default_floor_plans() -> Vec<FloorPlan> {
    let nexo = [
        ("nexo1", 1.8, 19.4),
        ("nexo2", 13.3, 19.4),
        ("nexo3", 15.1, 14.0),
        ("nexo4", 15.1, 5.4),
        ("nexo5", 12.8, 0.0),
        ("nexo6", 2.3, 0.0),
        ("nexo7", 0.0, 5.4),
        ("nexo8", 0.0, 14.0),
    ];

    vec![FloorPlan::new(
        "Nexo",
        nexo.iter()
            .map(|&(id, x, y)| Speaker::new(id, x, y, SpeakerType::A))
            .collect(),
    )]
}
