use serde::{Deserialize, Serialize};

/// One activity of a habit with its ordered achievement levels (e.g. Bronze, Silver, Gold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub levels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    #[serde(default)]
    pub completed_days: u32,
    #[serde(default)]
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub activities: Vec<Activity>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub stats: HabitStats,
}

/// Body for creating or replacing a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitInput {
    pub name: String,
    pub activities: Vec<Activity>,
}

/// Identifies one logged completion: a level of an activity on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingKey {
    pub habit_id: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub activity_index: u32,
    pub level_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEntry {
    #[serde(alias = "habit_id")]
    pub habit_id: String,
    pub date: String,
    #[serde(alias = "activity_index")]
    pub activity_index: u32,
    #[serde(alias = "level_index")]
    pub level_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TrackingEntry {
    pub fn key(&self) -> TrackingKey {
        TrackingKey {
            habit_id: self.habit_id.clone(),
            date: self.date.clone(),
            activity_index: self.activity_index,
            level_index: self.level_index,
        }
    }
}
