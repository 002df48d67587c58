//! Rule-based weekly workout plan generation.
//!
//! Split by training days:
//! - 3 days: Full Body A, Full Body B, Full Body C
//! - 4 days: Upper A, Lower A, Upper B, Lower B
//! - 5 days: Push, Pull, Legs, Upper, Lower
//! - 6 days: Push, Pull, Legs, Push, Pull, Legs
//!
//! All randomness comes from a seeded `StdRng`, so the same request always
//! yields the same plan.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

use super::model::{Equipment, Exercise, Goal, Level, LogsStatistics, PlanDay, PlanResponse, ProfileData, SessionItem};

/// Minutes budgeted per exercise when capping a session.
const MINUTES_PER_EXERCISE: u32 = 6;
const MIN_SETS: i32 = 2;
const MAX_SETS: i32 = 5;
const MIN_SESSION_MINUTES: u32 = 20;
const MAX_SESSION_MINUTES: u32 = 90;

const DAY_NAMES: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

struct GoalTemplate {
    sets: (u32, u32),
    reps: &'static [&'static str],
    rest_sec: u32,
    per_group: i32,
}

fn goal_template(goal: Goal) -> GoalTemplate {
    match goal {
        Goal::FatLoss => GoalTemplate {
            sets: (3, 4),
            reps: &["12-15", "15-20", "12-15"],
            rest_sec: 45,
            per_group: 2,
        },
        Goal::MuscleGain => GoalTemplate {
            sets: (3, 4),
            reps: &["8-10", "10-12", "6-8"],
            rest_sec: 90,
            per_group: 3,
        },
        Goal::Maintenance => GoalTemplate {
            sets: (2, 3),
            reps: &["10-12", "12-15"],
            rest_sec: 60,
            per_group: 2,
        },
    }
}

/// (sets, exercises per muscle group) offsets.
fn level_modifier(level: Level) -> (i32, i32) {
    match level {
        Level::Beginner => (-1, -1),
        Level::Intermediate => (0, 0),
        Level::Advanced => (1, 1),
    }
}

pub fn split_for(days_per_week: u32) -> &'static [&'static str] {
    match days_per_week {
        4 => &["Upper A", "Lower A", "Upper B", "Lower B"],
        5 => &["Push", "Pull", "Legs", "Upper", "Lower"],
        6 => &["Push", "Pull", "Legs", "Push", "Pull", "Legs"],
        _ => &["Full Body A", "Full Body B", "Full Body C"],
    }
}

pub fn muscles_for(split: &str) -> &'static [&'static str] {
    match split {
        "Full Body A" => &["chest", "back", "legs", "core"],
        "Full Body B" => &["shoulders", "back", "legs", "biceps", "triceps"],
        "Full Body C" => &["chest", "shoulders", "legs", "core"],
        "Upper A" => &["chest", "back", "shoulders"],
        "Upper B" => &["back", "biceps", "triceps", "shoulders"],
        "Upper" => &["chest", "back", "shoulders", "biceps", "triceps"],
        "Lower A" | "Lower B" | "Lower" | "Legs" => &["legs", "core"],
        "Push" => &["chest", "shoulders", "triceps"],
        "Pull" => &["back", "biceps"],
        _ => &["chest", "back", "legs"],
    }
}

fn default_day_offsets(days_per_week: u32) -> &'static [i64] {
    match days_per_week {
        4 => &[0, 1, 3, 4],
        5 => &[0, 1, 2, 4, 5],
        6 => &[0, 1, 2, 3, 4, 5],
        _ => &[0, 2, 4],
    }
}

/// Deterministic seed: the first 32 bits of SHA-256(`"{user_id}-{week_start}"`),
/// with `-adjusted` appended for adjusted plans.
pub fn seed_for(user_id: i64, week_start: &str, adjusted: bool) -> u64 {
    let key = if adjusted {
        format!("{}-{}-adjusted", user_id, week_start)
    } else {
        format!("{}-{}", user_id, week_start)
    };
    let digest = Sha256::digest(key.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as u64
}

/// Training dates for the week. Uses the user's available days when there
/// are enough of them, otherwise a fixed spread across the week.
pub fn workout_days(
    week_start: NaiveDate,
    days_per_week: u32,
    availability: Option<&HashMap<String, Value>>,
) -> Vec<NaiveDate> {
    let available: Vec<i64> = availability
        .map(|days| {
            DAY_NAMES
                .iter()
                .enumerate()
                .filter(|(_, name)| {
                    days.get(**name)
                        .and_then(|info| info.get("available"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false)
                })
                .map(|(i, _)| i as i64)
                .collect()
        })
        .unwrap_or_default();

    let offsets: Vec<i64> = if !available.is_empty() && available.len() >= days_per_week as usize {
        available.into_iter().take(days_per_week as usize).collect()
    } else {
        default_day_offsets(days_per_week).to_vec()
    };

    offsets
        .into_iter()
        .map(|offset| week_start + Duration::days(offset))
        .collect()
}

pub fn filter_exercises<'a>(exercises: &'a [Exercise], equipment: Equipment, level: Level) -> Vec<&'a Exercise> {
    exercises
        .iter()
        .filter(|ex| equipment.allows(&ex.equipment) && level.allows(&ex.difficulty))
        .collect()
}

fn generate_day(
    date: NaiveDate,
    split: &str,
    exercises: &[&Exercise],
    goal: Goal,
    level: Level,
    session_minutes: u32,
    rng: &mut StdRng,
) -> PlanDay {
    let template = goal_template(goal);
    let (sets_mod, exercises_mod) = level_modifier(level);
    let per_group = (template.per_group + exercises_mod).max(0) as usize;

    let mut sessions = Vec::new();
    let mut used: HashSet<&str> = HashSet::new();

    for muscle in muscles_for(split) {
        let mut candidates: Vec<&Exercise> = exercises
            .iter()
            .copied()
            .filter(|ex| ex.muscle_group == *muscle && !used.contains(ex.name.as_str()))
            .collect();
        candidates.shuffle(rng);

        for ex in candidates.into_iter().take(per_group) {
            used.insert(ex.name.as_str());

            let sets = (rng.gen_range(template.sets.0..=template.sets.1) as i32 + sets_mod)
                .clamp(MIN_SETS, MAX_SETS) as u32;
            let reps = template.reps.choose(rng).copied().unwrap_or("10-12");

            sessions.push(SessionItem {
                exercise: ex.name.clone(),
                sets,
                reps: reps.to_string(),
                rest_sec: template.rest_sec,
                notes: Some(ex.description.clone().unwrap_or_default()),
            });
        }
    }

    sessions.truncate((session_minutes / MINUTES_PER_EXERCISE) as usize);
    let estimated_minutes = sessions.len() as u32 * MINUTES_PER_EXERCISE;

    PlanDay {
        date: date.format("%Y-%m-%d").to_string(),
        title: split.to_string(),
        sessions,
        estimated_minutes,
    }
}

pub fn generate_plan(profile: &ProfileData, exercises: &[Exercise], week_start: NaiveDate, seed: u64) -> PlanResponse {
    let mut rng = StdRng::seed_from_u64(seed);

    let available = filter_exercises(exercises, profile.equipment, profile.level);
    let split = split_for(profile.days_per_week);
    let dates = workout_days(week_start, profile.days_per_week, profile.availability.as_ref());

    let days = dates
        .into_iter()
        .zip(split.iter())
        .map(|(date, title)| {
            generate_day(
                date,
                title,
                &available,
                profile.goal,
                profile.level,
                profile.session_minutes,
                &mut rng,
            )
        })
        .collect();

    PlanResponse {
        week_start: week_start.format("%Y-%m-%d").to_string(),
        days,
        principles: principles(profile.goal, profile.level, profile.days_per_week),
        notes: notes(profile.goal, profile.equipment),
    }
}

/// Profile after applying last week's completion and fatigue signals.
pub fn adjust_profile(profile: &ProfileData, logs: &LogsStatistics) -> ProfileData {
    let mut adjusted = profile.clone();

    if logs.completion_rate < 50 && adjusted.days_per_week > 3 {
        adjusted.days_per_week -= 1;
    }

    match logs.average_fatigue {
        Some(f) if f >= 4.0 => {
            adjusted.session_minutes = adjusted
                .session_minutes
                .saturating_sub(10)
                .max(MIN_SESSION_MINUTES);
        }
        Some(f) if f > 0.0 && f <= 2.0 && logs.completion_rate >= 80 => {
            adjusted.session_minutes = (adjusted.session_minutes + 10).min(MAX_SESSION_MINUTES);
        }
        _ => {}
    }

    adjusted
}

pub fn generate_adjusted_plan(
    profile: &ProfileData,
    exercises: &[Exercise],
    week_start: NaiveDate,
    logs: &LogsStatistics,
    seed: u64,
) -> PlanResponse {
    let adjusted = adjust_profile(profile, logs);
    let mut plan = generate_plan(&adjusted, exercises, week_start, seed);

    let mut notes = adjustment_notes(logs, profile, &adjusted);
    notes.append(&mut plan.notes);
    plan.notes = notes;

    plan
}

fn principles(goal: Goal, level: Level, days_per_week: u32) -> Vec<String> {
    let mut out: Vec<&str> = match goal {
        Goal::FatLoss => vec![
            "Tập trung vào số lần lặp cao (12-15) để tối đa hóa đốt calo",
            "Giữ thời gian nghỉ ngắn (45-60 giây) để duy trì nhịp tim cao",
            "Cân nhắc thêm 10-15 phút cardio sau khi tập tạ",
        ],
        Goal::MuscleGain => vec![
            "Tăng tải dần: cố gắng tăng tạ hoặc số lần lặp mỗi tuần",
            "Tập trung vào động tác có kiểm soát với form chuẩn",
            "Nghỉ 90-120 giây giữa các hiệp để phục hồi tối ưu",
        ],
        Goal::Maintenance => vec![
            "Duy trì khối lượng tập luyện ổn định từ tuần này sang tuần khác",
            "Tập trung vào các bài tập compound để hiệu quả hơn",
            "Cân bằng cường độ với thời gian phục hồi",
        ],
    };

    match level {
        Level::Beginner => out.push("Tập trung học form đúng trước khi tăng tạ"),
        Level::Advanced => out.push("Cân nhắc áp dụng kỹ thuật nâng cao như drop sets hoặc supersets"),
        Level::Intermediate => {}
    }

    if days_per_week >= 5 {
        out.push("Với tần suất tập cao, ưu tiên giấc ngủ và dinh dưỡng để phục hồi");
    }

    out.into_iter().map(String::from).collect()
}

fn notes(goal: Goal, equipment: Equipment) -> Vec<String> {
    let mut out = vec![
        "Khởi động 5-10 phút trước mỗi buổi tập",
        "Uống đủ nước trong suốt buổi tập",
        "Lắng nghe cơ thể và nghỉ ngơi nếu cảm thấy quá mệt",
    ];

    out.push(match equipment {
        Equipment::None => "Tập trung vào thời gian căng cơ để tối đa hóa hiệu quả bài tập tự trọng",
        Equipment::Home => "Sử dụng tăng tải dần với tạ và dây kháng lực có sẵn",
        Equipment::Gym => "Tận dụng đa dạng thiết bị phòng gym để cô lập các nhóm cơ",
    });

    match goal {
        Goal::FatLoss => out.push("Duy trì thâm hụt calo nhẹ để đạt kết quả giảm mỡ tối ưu"),
        Goal::MuscleGain => out.push("Đảm bảo nạp đủ protein (1.6-2.2g mỗi kg trọng lượng cơ thể)"),
        Goal::Maintenance => {}
    }

    out.into_iter().map(String::from).collect()
}

fn format_fatigue(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn adjustment_notes(logs: &LogsStatistics, original: &ProfileData, adjusted: &ProfileData) -> Vec<String> {
    let mut out = Vec::new();
    let rate = logs.completion_rate;

    if rate < 50 {
        out.push(format!(
            "Dựa trên tỷ lệ hoàn thành {}% tuần trước, chúng tôi đã giảm số ngày tập để dễ tuân thủ hơn",
            rate
        ));
    } else if rate >= 80 {
        out.push(format!("Tuyệt vời! Bạn đã hoàn thành {}% bài tập tuần trước!", rate));
    }

    if let Some(fatigue) = logs.average_fatigue.filter(|f| *f > 0.0) {
        if fatigue >= 4.0 {
            out.push(format!(
                "Mức độ mệt mỏi trung bình của bạn cao ({}/5). Các buổi tập tuần này sẽ ngắn hơn để phục hồi tốt hơn",
                format_fatigue(fatigue)
            ));
        } else if fatigue <= 2.0 {
            out.push(format!(
                "Mức độ mệt mỏi của bạn thấp ({}/5). Cân nhắc tăng cường độ tuần này",
                format_fatigue(fatigue)
            ));
        }
    }

    if adjusted.session_minutes != original.session_minutes {
        out.push(format!(
            "Thời lượng buổi tập được điều chỉnh thành {} phút",
            adjusted.session_minutes
        ));
    }

    if adjusted.days_per_week != original.days_per_week {
        out.push(format!(
            "Số ngày tập được điều chỉnh thành {} ngày/tuần",
            adjusted.days_per_week
        ));
    }

    out
}
