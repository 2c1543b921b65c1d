use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RoomCategory {
    Double,
    Twin,
    Familiale,
    DoubleLargeBed,
    SuiteRoyale,
}

impl RoomCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomCategory::Double => "double",
            RoomCategory::Twin => "twin",
            RoomCategory::Familiale => "familiale",
            RoomCategory::DoubleLargeBed => "double_large_bed",
            RoomCategory::SuiteRoyale => "suite_royale",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "double" => Some(RoomCategory::Double),
            "twin" => Some(RoomCategory::Twin),
            "familiale" => Some(RoomCategory::Familiale),
            "double_large_bed" => Some(RoomCategory::DoubleLargeBed),
            "suite_royale" => Some(RoomCategory::SuiteRoyale),
            _ => None,
        }
    }
}

/// Per-night occupancy state of a room. Days without a stored entry are Available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Occupied => "occupied",
            AvailabilityStatus::Reserved => "reserved",
            AvailabilityStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "occupied" => AvailabilityStatus::Occupied,
            "reserved" => AvailabilityStatus::Reserved,
            "maintenance" => AvailabilityStatus::Maintenance,
            _ => AvailabilityStatus::Available,
        }
    }
}

/// Catalog entry managed by the back-office. Prices are whole currency units per night.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub category: RoomCategory,
    pub price_per_night: i64,
    pub capacity: u32,
    pub description: Option<String>,
}

/// A room as offered for one specific date range: catalog data plus the
/// availability status computed for that range. Snapshotted into the
/// reservation at booking time, so later catalog edits don't rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomOption {
    pub room_id: String,
    pub name: String,
    pub category: RoomCategory,
    pub price_per_night: i64,
    pub capacity: u32,
    pub status: AvailabilityStatus,
}

impl RoomOption {
    pub fn from_room(room: &Room, status: AvailabilityStatus) -> Self {
        Self {
            room_id: room.id.clone(),
            name: room.name.clone(),
            category: room.category,
            price_per_night: room.price_per_night,
            capacity: room.capacity,
            status,
        }
    }
}
