use serde::{Deserialize, Serialize};

pub const DAYS: [&str; 5] = ["monday", "tuesday", "wednesday", "thursday", "friday"];

pub const TIME_POINTS: [&str; 14] = [
    "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "12:30", "13:00", "13:30", "14:00",
    "14:30", "15:00", "15:30", "16:00",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: String,
    pub status: bool,
    #[serde(default)]
    pub course_id: Option<String>,
}

impl TimeSlot {
    fn free(time: &str) -> Self {
        Self {
            time: time.to_string(),
            status: false,
            course_id: None,
        }
    }

    pub fn occupy(&mut self, course_id: &str) {
        self.status = true;
        self.course_id = Some(course_id.to_string());
    }

    pub fn clear(&mut self) {
        self.status = false;
        self.course_id = None;
    }

    pub fn is_owned_by(&self, course_id: &str) -> bool {
        self.status && self.course_id.as_deref() == Some(course_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlots {
    pub day: String,
    pub time_slots: Vec<TimeSlot>,
}

impl DaySlots {
    pub fn slot(&self, time: &str) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|s| s.time == time)
    }

    pub fn slot_mut(&mut self, time: &str) -> Option<&mut TimeSlot> {
        self.time_slots.iter_mut().find(|s| s.time == time)
    }
}

/// Weekly availability calendar embedded in a location, a class and a
/// teacher profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotGrid {
    pub days: Vec<DaySlots>,
}

impl SlotGrid {
    /// Canonical empty grid: every weekday, every time point, unoccupied.
    pub fn new() -> Self {
        let days = DAYS
            .iter()
            .map(|d| DaySlots {
                day: d.to_string(),
                time_slots: TIME_POINTS.iter().map(|t| TimeSlot::free(t)).collect(),
            })
            .collect();
        Self { days }
    }

    pub fn day(&self, day: &str) -> Option<&DaySlots> {
        self.days.iter().find(|d| d.day == day)
    }

    pub fn day_mut(&mut self, day: &str) -> Option<&mut DaySlots> {
        self.days.iter_mut().find(|d| d.day == day)
    }

    pub fn slot(&self, day: &str, time: &str) -> Option<&TimeSlot> {
        self.day(day).and_then(|d| d.slot(time))
    }

    pub fn slot_mut(&mut self, day: &str, time: &str) -> Option<&mut TimeSlot> {
        self.day_mut(day).and_then(|d| d.slot_mut(time))
    }

    pub fn owner(&self, day: &str, time: &str) -> Option<&str> {
        self.slot(day, time).and_then(|s| s.course_id.as_deref())
    }

    pub fn occupied_count(&self) -> usize {
        self.days
            .iter()
            .map(|d| d.time_slots.iter().filter(|s| s.status).count())
            .sum()
    }

    /// A cell carries an owner exactly when it is occupied.
    pub fn is_consistent(&self) -> bool {
        self.days
            .iter()
            .flat_map(|d| d.time_slots.iter())
            .all(|s| s.status == s.course_id.is_some())
    }
}
