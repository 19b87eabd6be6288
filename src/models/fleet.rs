use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::GameError;
use crate::models::position::Position;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShipKind {
    Carrier,
    Battleship,
    Destroyer,
    Submarine,
    PatrolBoat,
}

impl ShipKind {
    pub const ALL: [ShipKind; 5] = [
        ShipKind::Carrier,
        ShipKind::Battleship,
        ShipKind::Destroyer,
        ShipKind::Submarine,
        ShipKind::PatrolBoat,
    ];

    pub fn length(self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Destroyer => 3,
            ShipKind::Submarine => 3,
            ShipKind::PatrolBoat => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShipKind::Carrier => "carrier",
            ShipKind::Battleship => "battleship",
            ShipKind::Destroyer => "destroyer",
            ShipKind::Submarine => "submarine",
            ShipKind::PatrolBoat => "patrol_boat",
        }
    }

    pub fn from_name(name: &str) -> Option<ShipKind> {
        ShipKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

// Number of cells covered by a complete fleet. Hitting that many distinct
// cells wins the match.
pub const FLEET_CELLS: usize = 17;

/// Ship placement of one player. Empty until the player submits it; stored
/// positions are sorted per ship.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Fleet(BTreeMap<ShipKind, Vec<Position>>);

impl Fleet {
    /// Validates a submitted fleet mapping. Any rule violation gives a single
    /// `InvalidArguments` carrying the submission.
    pub fn validate(submission: &Value) -> Result<Fleet, GameError> {
        Fleet::build(submission).ok_or_else(|| GameError::InvalidArguments(submission.to_string()))
    }

    fn build(submission: &Value) -> Option<Fleet> {
        // exactly the five kinds, no extras
        let entries = submission.as_object()?;
        if entries.len() != ShipKind::ALL.len() {
            return None;
        }

        let mut ships = BTreeMap::new();
        for (name, cells) in entries {
            let kind = ShipKind::from_name(name)?;
            let cells = cells.as_array()?;
            if cells.len() != kind.length() {
                return None;
            }
            let mut positions = cells
                .iter()
                .map(Position::from_value)
                .collect::<Option<Vec<Position>>>()?;
            positions.sort();
            if !is_straight_line(&positions) {
                return None;
            }
            ships.insert(kind, positions);
        }
        if ships.len() != ShipKind::ALL.len() {
            return None;
        }

        // no cell shared between two ships
        let mut occupied = HashSet::new();
        let overlapping = ships.values().flatten().any(|pos| !occupied.insert(*pos));
        if overlapping {
            return None;
        }

        Some(Fleet(ships))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.cells().any(|cell| cell == position)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Position> {
        self.0.values().flatten()
    }
}

// Sorted cells form one horizontal or vertical run without gaps. Adjacency
// alone would let an L-shaped ship through, hence the shared column/row check.
fn is_straight_line(sorted: &[Position]) -> bool {
    let contiguous = sorted.windows(2).all(|pair| pair[0].manhattan_distance(&pair[1]) == 1);
    let same_col = sorted.iter().all(|pos| pos.col() == sorted[0].col());
    let same_row = sorted.iter().all(|pos| pos.row() == sorted[0].row());
    contiguous && (same_col || same_row)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn valid_fleet() -> Value {
        json!({
            "carrier": [[1, 1], [1, 2], [1, 3], [1, 4], [1, 5]],
            "battleship": [[3, 1], [3, 2], [3, 3], [3, 4]],
            "destroyer": [[5, 1], [5, 2], [5, 3]],
            "submarine": [[7, 1], [7, 2], [7, 3]],
            "patrol_boat": [[9, 1], [9, 2]],
        })
    }

    fn assert_rejected(submission: Value) {
        let err = Fleet::validate(&submission).unwrap_err();
        assert!(matches!(err, GameError::InvalidArguments(_)), "{:?}", err);
    }

    #[test]
    fn accepts_valid_fleet() {
        let fleet = Fleet::validate(&valid_fleet()).unwrap();
        assert_eq!(fleet.cells().count(), FLEET_CELLS);
        assert!(fleet.contains(&Position::new(9, 2).unwrap()));
        assert!(!fleet.contains(&Position::new(1, 9).unwrap()));
    }

    #[test]
    fn ship_lengths_add_up_to_fleet_cells() {
        let total: usize = ShipKind::ALL.iter().map(|kind| kind.length()).sum();
        assert_eq!(total, FLEET_CELLS);
    }

    #[test]
    fn accepts_unsorted_horizontal_ship() {
        let mut submission = valid_fleet();
        submission["carrier"] = json!([[6, 10], [4, 10], [2, 10], [3, 10], [5, 10]]);
        let fleet = Fleet::validate(&submission).unwrap();
        let stored = serde_json::to_value(&fleet).unwrap();
        assert_eq!(stored["carrier"][0], json!([2, 10]));
    }

    #[test]
    fn rejects_missing_patrol_boat() {
        let mut submission = valid_fleet();
        submission.as_object_mut().unwrap().remove("patrol_boat");
        assert_rejected(submission);
    }

    #[test]
    fn rejects_unknown_ship() {
        let mut submission = valid_fleet();
        submission.as_object_mut().unwrap().remove("patrol_boat");
        submission["canoe"] = json!([[9, 1], [9, 2]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_extra_ship() {
        let mut submission = valid_fleet();
        submission["canoe"] = json!([[10, 9], [10, 10]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_wrong_length() {
        let mut submission = valid_fleet();
        submission["destroyer"] = json!([[5, 1], [5, 2]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_out_of_bounds() {
        let mut submission = valid_fleet();
        submission["patrol_boat"] = json!([[10, 10], [11, 10]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_non_integer_coordinates() {
        let mut submission = valid_fleet();
        submission["patrol_boat"] = json!([[9, 1], [9, "2"]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_gap() {
        let mut submission = valid_fleet();
        submission["submarine"] = json!([[7, 1], [7, 2], [7, 4]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_diagonal() {
        let mut submission = valid_fleet();
        submission["submarine"] = json!([[7, 1], [8, 2], [9, 3]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_bent_ship() {
        let mut submission = valid_fleet();
        submission["destroyer"] = json!([[5, 1], [5, 2], [6, 2]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_repeated_cell_within_ship() {
        let mut submission = valid_fleet();
        submission["patrol_boat"] = json!([[9, 1], [9, 1]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_overlap_between_ships() {
        let mut submission = valid_fleet();
        submission["patrol_boat"] = json!([[1, 5], [1, 6]]);
        assert_rejected(submission);
    }

    #[test]
    fn rejects_non_mapping() {
        assert_rejected(json!([[1, 1], [1, 2]]));
        assert_rejected(json!(null));
    }

    #[test]
    fn empty_fleet_serializes_as_empty_mapping() {
        let fleet = Fleet::default();
        assert_eq!(serde_json::to_string(&fleet).unwrap(), "{}");
        let back: Fleet = serde_json::from_str("{}").unwrap();
        assert!(back.is_empty());
    }
}
