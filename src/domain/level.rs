use serde::Serialize;

use super::leaderboard::round2;

struct LevelBand {
    name: &'static str,
    color: &'static str,
    min_points: i64,
    max_points: Option<i64>,
}

const LEVELS: &[LevelBand] = &[
    LevelBand { name: "Novice", color: "#6B7280", min_points: 0, max_points: Some(99) },
    LevelBand { name: "Explorer", color: "#10B981", min_points: 100, max_points: Some(249) },
    LevelBand { name: "Contributor", color: "#3B82F6", min_points: 250, max_points: Some(499) },
    LevelBand { name: "Champion", color: "#8B5CF6", min_points: 500, max_points: Some(999) },
    LevelBand { name: "Master", color: "#F59E0B", min_points: 1000, max_points: Some(1999) },
    LevelBand { name: "Legend", color: "#EF4444", min_points: 2000, max_points: None },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLevel {
    pub level_name: &'static str,
    pub level_color: &'static str,
    pub current_points: i64,
    pub min_points: i64,
    pub max_points: Option<i64>,
    pub progress_percentage: f64,
    pub next_level_points: Option<i64>,
}

impl UserLevel {
    pub fn for_points(points: i64) -> Self {
        let band = LEVELS
            .iter()
            .rev()
            .find(|band| points >= band.min_points)
            .unwrap_or(&LEVELS[0]);

        let (progress, next) = match band.max_points {
            Some(max) => {
                let span = (max - band.min_points + 1) as f64;
                let into = (points.max(band.min_points) - band.min_points) as f64;
                (round2((into / span * 100.0).min(100.0)), Some(max + 1))
            }
            None => (0.0, None),
        };

        Self {
            level_name: band.name,
            level_color: band.color,
            current_points: points,
            min_points: band.min_points,
            max_points: band.max_points,
            progress_percentage: progress,
            next_level_points: next,
        }
    }
}
