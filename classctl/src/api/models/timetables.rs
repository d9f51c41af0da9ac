//! API request/response models for the timetable grid.
//!
//! The grid read model is [`TimetableMatrix`]: day -> slot id -> occupied
//! cell. It is rebuilt from entry rows on every fetch; writes never patch it
//! client-side, so what a client renders after re-fetching is exactly what
//! the database holds.

use crate::db::models::classroom::{EntryDBResponse, MatrixCellDBResponse, TimeSlotDBResponse, TimetableDBResponse};
use crate::types::{ClassId, Day, EntryId, SlotId, SubjectId, TeacherId, TimetableId};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TimeSlotRequest {
    #[schema(value_type = String, format = "time")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, format = "time")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub is_break: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeSlotResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SlotId,
    #[schema(value_type = String, format = "time")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, format = "time")]
    pub end_time: NaiveTime,
    pub is_break: bool,
}

impl From<TimeSlotDBResponse> for TimeSlotResponse {
    fn from(db: TimeSlotDBResponse) -> Self {
        Self {
            id: db.id,
            start_time: db.start_time,
            end_time: db.end_time,
            is_break: db.is_break,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TimetableCreate {
    #[schema(value_type = String, format = "uuid")]
    pub school_class: ClassId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimetableResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TimetableId,
    #[schema(value_type = String, format = "uuid")]
    pub school_class: ClassId,
    pub class_label: String,
    pub academic_year: String,
}

impl From<TimetableDBResponse> for TimetableResponse {
    fn from(db: TimetableDBResponse) -> Self {
        Self {
            id: db.id,
            school_class: db.class_id,
            class_label: format!("{}-{}", db.class_name, db.class_division),
            academic_year: db.academic_year,
        }
    }
}

/// Entry create/update payload, keyed the way the grid editor sends it:
/// (timetable, day, slot) addresses the cell, (subject, teacher) fills it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EntryRequest {
    #[schema(value_type = String, format = "uuid")]
    pub timetable: TimetableId,
    pub day: Day,
    #[schema(value_type = String, format = "uuid")]
    pub slot: SlotId,
    #[schema(value_type = String, format = "uuid")]
    pub subject: SubjectId,
    #[schema(value_type = String, format = "uuid")]
    pub teacher: TeacherId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: EntryId,
    #[schema(value_type = String, format = "uuid")]
    pub timetable: TimetableId,
    pub day: Day,
    #[schema(value_type = String, format = "uuid")]
    pub slot: SlotId,
    #[schema(value_type = String, format = "uuid")]
    pub subject: SubjectId,
    #[schema(value_type = String, format = "uuid")]
    pub teacher: TeacherId,
}

impl From<EntryDBResponse> for EntryResponse {
    fn from(db: EntryDBResponse) -> Self {
        Self {
            id: db.id,
            timetable: db.timetable_id,
            day: db.day,
            slot: db.slot_id,
            subject: db.subject_id,
            teacher: db.teacher_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClearTimetableRequest {
    #[schema(value_type = String, format = "uuid")]
    pub timetable_id: TimetableId,
}

/// One occupied cell of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatrixCell {
    #[schema(value_type = String, format = "uuid")]
    pub id: EntryId,
    #[schema(value_type = String, format = "uuid")]
    pub subject_id: SubjectId,
    pub subject: String,
    #[schema(value_type = String, format = "uuid")]
    pub teacher_id: TeacherId,
    pub teacher: Option<String>,
}

/// The derived grid read model: day -> slot id -> cell. Days without
/// entries are present with empty maps so clients can iterate uniformly;
/// absent slot keys mean an empty (or break) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(value_type = Object)]
pub struct TimetableMatrix(
    pub BTreeMap<Day, BTreeMap<SlotId, MatrixCell>>,
);

impl TimetableMatrix {
    /// Assemble the matrix from occupied-cell rows.
    pub fn from_cells(cells: Vec<MatrixCellDBResponse>) -> Self {
        let mut matrix: BTreeMap<Day, BTreeMap<SlotId, MatrixCell>> = Day::ALL.iter().map(|d| (*d, BTreeMap::new())).collect();

        for cell in cells {
            matrix.entry(cell.day).or_default().insert(
                cell.slot_id,
                MatrixCell {
                    id: cell.entry_id,
                    subject_id: cell.subject_id,
                    subject: cell.subject_name,
                    teacher_id: cell.teacher_id,
                    teacher: cell.teacher_name,
                },
            );
        }

        Self(matrix)
    }

    pub fn cell(&self, day: Day, slot: SlotId) -> Option<&MatrixCell> {
        self.0.get(&day).and_then(|row| row.get(&slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn cell_row(day: Day, slot_id: SlotId, subject: &str) -> MatrixCellDBResponse {
        MatrixCellDBResponse {
            entry_id: Uuid::new_v4(),
            day,
            slot_id,
            subject_id: Uuid::new_v4(),
            subject_name: subject.to_string(),
            teacher_id: Uuid::new_v4(),
            teacher_name: Some("T. Teacher".to_string()),
        }
    }

    #[test]
    fn test_empty_matrix_has_all_days() {
        let matrix = TimetableMatrix::from_cells(vec![]);
        assert_eq!(matrix.0.len(), 6);
        for day in Day::ALL {
            assert!(matrix.0.get(&day).unwrap().is_empty());
        }
    }

    #[test]
    fn test_cells_land_in_their_day_and_slot() {
        let slot_a = Uuid::new_v4();
        let slot_b = Uuid::new_v4();

        let matrix = TimetableMatrix::from_cells(vec![
            cell_row(Day::Mon, slot_a, "Maths"),
            cell_row(Day::Mon, slot_b, "Physics"),
            cell_row(Day::Fri, slot_a, "History"),
        ]);

        assert_eq!(matrix.cell(Day::Mon, slot_a).unwrap().subject, "Maths");
        assert_eq!(matrix.cell(Day::Mon, slot_b).unwrap().subject, "Physics");
        assert_eq!(matrix.cell(Day::Fri, slot_a).unwrap().subject, "History");
        // Unoccupied cells are absent, not placeholders
        assert!(matrix.cell(Day::Tue, slot_a).is_none());
    }

    #[test]
    fn test_matrix_reflects_exactly_the_given_rows() {
        // The read model carries no state of its own: rebuilding from the
        // same rows yields the same matrix
        let slot = Uuid::new_v4();
        let row = cell_row(Day::Wed, slot, "Chemistry");

        let first = TimetableMatrix::from_cells(vec![row.clone()]);
        let second = TimetableMatrix::from_cells(vec![row]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_matrix_serializes_with_day_keys() {
        let slot = Uuid::new_v4();
        let matrix = TimetableMatrix::from_cells(vec![cell_row(Day::Mon, slot, "Maths")]);

        let json = serde_json::to_value(&matrix).unwrap();
        assert!(json.get("mon").is_some());
        assert!(json["mon"].get(slot.to_string()).is_some());
        assert_eq!(json["mon"][slot.to_string()]["subject"], "Maths");
    }
}
