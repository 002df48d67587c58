use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    FatLoss,
    MuscleGain,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    None,
    Home,
    Gym,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    /// Exercise difficulties a user of this level may be given.
    pub fn allows(self, difficulty: &str) -> bool {
        [Level::Beginner, Level::Intermediate, Level::Advanced]
            .into_iter()
            .filter(|l| *l <= self)
            .any(|l| l.as_str() == difficulty)
    }
}

impl Equipment {
    pub fn as_str(self) -> &'static str {
        match self {
            Equipment::None => "none",
            Equipment::Home => "home",
            Equipment::Gym => "gym",
        }
    }

    /// Home includes body-weight exercises; gym includes both.
    pub fn allows(self, equipment: &str) -> bool {
        [Equipment::None, Equipment::Home, Equipment::Gym]
            .into_iter()
            .filter(|e| *e <= self)
            .any(|e| e.as_str() == equipment)
    }
}

/// User fitness profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileData {
    pub goal: Goal,
    pub level: Level,
    /// 3-6 in practice; other values fall back to the 3-day split.
    pub days_per_week: u32,
    pub session_minutes: u32,
    pub equipment: Equipment,
    #[serde(default)]
    pub constraints: Option<String>,
    /// `monday`..`sunday` → `{"available": bool, ...}`
    #[serde(default)]
    pub availability: Option<HashMap<String, Value>>,
}

/// Exercise row from the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub muscle_group: String,
    pub equipment: String,
    pub difficulty: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionItem {
    pub exercise: String,
    pub sets: u32,
    pub reps: String,
    pub rest_sec: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
    pub date: String,
    pub title: String,
    pub sessions: Vec<SessionItem>,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub week_start: String,
    pub days: Vec<PlanDay>,
    pub principles: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSummary {
    pub date: String,
    pub title: String,
    /// done, skipped or pending
    pub status: String,
    #[serde(default)]
    pub fatigue_rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousPlan {
    pub week_start: String,
    #[serde(default)]
    pub principles: Option<Vec<String>>,
    pub days: Vec<LogSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsStatistics {
    pub completed_days: u32,
    pub total_days: u32,
    /// Percentage, 0-100.
    pub completion_rate: u32,
    #[serde(default)]
    pub average_fatigue: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePlanRequest {
    pub user_id: i64,
    /// YYYY-MM-DD
    pub week_start: String,
    pub profile: ProfileData,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustPlanRequest {
    pub user_id: i64,
    pub week_start: String,
    pub profile: ProfileData,
    pub exercises: Vec<Exercise>,
    pub previous_plan: PreviousPlan,
    pub logs_summary: LogsStatistics,
}
