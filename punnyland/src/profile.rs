//! Listener profile
//!
//! Stored as `user_data.json` in the profile directory. A missing or corrupt
//! file yields a fresh profile; saving always goes through an atomic write.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use punnyland_common::config::PROFILE_FILE_NAME;
use punnyland_common::fsutil::write_atomic;
use punnyland_common::{CornLevel, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// History entries kept on disk
pub const HISTORY_LIMIT: usize = 50;

/// (jokes heard, title, description)
pub const ACHIEVEMENTS: &[(u64, &str, &str)] = &[
    (1, "First Steps", "Heard your first dad joke!"),
    (5, "Getting Started", "5 jokes down, infinity to go!"),
    (15, "Pun Enthusiast", "You're really getting into the groove!"),
    (30, "Joke Collector", "Building quite the dad joke collection!"),
    (50, "Corn Connoisseur", "You know quality corn when you hear it!"),
    (100, "Pun Master", "You've mastered the art of dad jokes!"),
    (200, "Dad Joke Royalty", "Bow down to the joke royalty!"),
];

/// Profile times are naive local times; an RFC 3339 offset is accepted and
/// converted to local time
mod local_time {
    use chrono::{DateTime, Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<NaiveDateTime>()
            .or_else(|_| {
                DateTime::parse_from_rfc3339(&raw).map(|t| t.with_timezone(&Local).naive_local())
            })
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub joke: String,
    pub corniness: CornLevel,
    #[serde(deserialize_with = "local_time::deserialize")]
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub joke: String,
    pub corniness: CornLevel,
    #[serde(deserialize_with = "local_time::deserialize")]
    pub added_date: NaiveDateTime,
}

/// Persisted profile fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileData {
    pub name: Option<String>,
    pub corniness_level: CornLevel,
    pub total_jokes_heard: u64,
    pub favorite_jokes: Vec<FavoriteEntry>,
    pub joke_history: Vec<HistoryEntry>,
    pub daily_joke_date: Option<NaiveDate>,
    pub setup_completed: bool,
    pub achievements: Vec<String>,
    pub groan_counter: u64,
    #[serde(deserialize_with = "local_time::deserialize")]
    pub created_date: NaiveDateTime,
    /// Keys this version does not use, written back unchanged
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            name: None,
            corniness_level: CornLevel::default(),
            total_jokes_heard: 0,
            favorite_jokes: Vec::new(),
            joke_history: Vec::new(),
            daily_joke_date: None,
            setup_completed: false,
            achievements: Vec::new(),
            groan_counter: 0,
            created_date: Local::now().naive_local(),
            extra: BTreeMap::new(),
        }
    }
}

/// Summary shown by `stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub name: Option<String>,
    pub corniness_level: CornLevel,
    pub total_jokes: u64,
    pub favorites: usize,
    pub groans: u64,
    pub achievements: Vec<String>,
    pub member_since: NaiveDate,
}

/// Profile bound to its file
#[derive(Debug, Clone)]
pub struct UserProfile {
    path: PathBuf,
    pub data: ProfileData,
}

impl UserProfile {
    /// Load the profile from `dir`, falling back to defaults
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(PROFILE_FILE_NAME);
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Ignoring unreadable profile {}: {}", path.display(), e);
                    ProfileData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProfileData::default(),
            Err(e) => {
                warn!("Could not read profile {}: {}", path.display(), e);
                ProfileData::default()
            }
        };
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!("Saved profile to {}", self.path.display());
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn level(&self) -> CornLevel {
        self.data.corniness_level
    }

    pub fn complete_setup(&mut self, name: &str, level: CornLevel) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("name must not be empty".to_string()));
        }
        self.data.name = Some(name.to_string());
        self.data.corniness_level = level;
        self.data.setup_completed = true;
        Ok(())
    }

    /// Set the preferred level from a raw number (1-5)
    pub fn set_level(&mut self, value: u8) -> Result<CornLevel> {
        let level = CornLevel::from_value(value).ok_or_else(|| {
            Error::InvalidInput(format!("corniness level must be 1-5, got {}", value))
        })?;
        self.data.corniness_level = level;
        Ok(level)
    }

    /// Record a heard joke; returns achievements unlocked by it
    pub fn record_joke(&mut self, joke: &str, level: CornLevel) -> Vec<&'static str> {
        self.data.joke_history.push(HistoryEntry {
            joke: joke.to_string(),
            corniness: level,
            timestamp: Local::now().naive_local(),
        });
        let overflow = self.data.joke_history.len().saturating_sub(HISTORY_LIMIT);
        self.data.joke_history.drain(..overflow);
        self.data.total_jokes_heard += 1;
        self.check_achievements()
    }

    fn check_achievements(&mut self) -> Vec<&'static str> {
        let heard = self.data.total_jokes_heard;
        let mut unlocked = Vec::new();
        for (threshold, title, _) in ACHIEVEMENTS {
            if heard >= *threshold && !self.data.achievements.iter().any(|a| a == title) {
                self.data.achievements.push(title.to_string());
                unlocked.push(*title);
            }
        }
        unlocked
    }

    /// Texts of the last `count` jokes heard, oldest first
    pub fn recent_jokes(&self, count: usize) -> Vec<String> {
        let history = &self.data.joke_history;
        history[history.len().saturating_sub(count)..]
            .iter()
            .map(|e| e.joke.clone())
            .collect()
    }

    pub fn last_heard(&self) -> Option<&HistoryEntry> {
        self.data.joke_history.last()
    }

    /// Add a favorite; false when it is already saved
    pub fn add_favorite(&mut self, joke: &str, level: CornLevel) -> bool {
        if self.data.favorite_jokes.iter().any(|f| f.joke == joke) {
            return false;
        }
        self.data.favorite_jokes.push(FavoriteEntry {
            joke: joke.to_string(),
            corniness: level,
            added_date: Local::now().naive_local(),
        });
        true
    }

    /// Remove the favorite at a 1-based position
    pub fn remove_favorite(&mut self, position: usize) -> Result<FavoriteEntry> {
        if position == 0 || position > self.data.favorite_jokes.len() {
            return Err(Error::InvalidInput(format!(
                "no favorite number {} (you have {})",
                position,
                self.data.favorite_jokes.len()
            )));
        }
        Ok(self.data.favorite_jokes.remove(position - 1))
    }

    pub fn favorites(&self) -> &[FavoriteEntry] {
        &self.data.favorite_jokes
    }

    pub fn groan(&mut self) -> u64 {
        self.data.groan_counter += 1;
        self.data.groan_counter
    }

    pub fn is_daily_eligible_on(&self, today: NaiveDate) -> bool {
        self.data.daily_joke_date != Some(today)
    }

    pub fn mark_daily_seen_on(&mut self, today: NaiveDate) {
        self.data.daily_joke_date = Some(today);
    }

    /// Render favorites as a plain-text document
    pub fn favorites_text(&self, exported_at: DateTime<Local>) -> String {
        let mut out = String::new();
        out.push_str("My Punnyland Favorite Dad Jokes\n");
        out.push_str(&"=".repeat(50));
        out.push_str("\n\n");
        if self.data.favorite_jokes.is_empty() {
            out.push_str("No favorite jokes yet! Start collecting some corn!\n");
        }
        for (i, fav) in self.data.favorite_jokes.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, fav.joke));
            out.push_str(&format!(
                "   Corniness Level: {} ({})\n",
                fav.corniness,
                fav.corniness.display_name()
            ));
            out.push_str(&format!("   Added: {}\n\n", fav.added_date.format("%Y-%m-%d")));
        }
        out.push_str(&format!(
            "\nExported on {}\n",
            exported_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out
    }

    /// Export favorites to `path`, or to a timestamped file in the current directory
    pub fn export_favorites(&self, path: Option<&Path>) -> Result<PathBuf> {
        let now = Local::now();
        let target = path.map(Path::to_path_buf).unwrap_or_else(|| {
            PathBuf::from(format!(
                "punnyland_favorites_{}.txt",
                now.format("%Y%m%d_%H%M%S")
            ))
        });
        write_atomic(&target, self.favorites_text(now).as_bytes())?;
        Ok(target)
    }

    pub fn stats(&self) -> ProfileStats {
        ProfileStats {
            name: self.data.name.clone(),
            corniness_level: self.data.corniness_level,
            total_jokes: self.data.total_jokes_heard,
            favorites: self.data.favorite_jokes.len(),
            groans: self.data.groan_counter,
            achievements: self.data.achievements.clone(),
            member_since: self.data.created_date.date(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fresh() -> (TempDir, UserProfile) {
        let dir = TempDir::new().unwrap();
        let profile = UserProfile::load(dir.path());
        (dir, profile)
    }

    #[test]
    fn test_defaults() {
        let (_dir, profile) = fresh();
        assert_eq!(profile.level(), CornLevel::EyeRoll);
        assert_eq!(profile.name(), None);
        assert!(!profile.data.setup_completed);
        assert!(profile.recent_jokes(10).is_empty());
    }

    #[test]
    fn test_history_capped() {
        let (_dir, mut profile) = fresh();
        for i in 0..60 {
            profile.record_joke(&format!("joke {}", i), CornLevel::DadApproved);
        }
        assert_eq!(profile.data.joke_history.len(), HISTORY_LIMIT);
        assert_eq!(profile.data.total_jokes_heard, 60);
        assert_eq!(profile.data.joke_history[0].joke, "joke 10");
        assert_eq!(profile.recent_jokes(2), vec!["joke 58", "joke 59"]);
    }

    #[test]
    fn test_achievements_unlock_once() {
        let (_dir, mut profile) = fresh();
        assert_eq!(profile.record_joke("a", CornLevel::MildChuckle), vec!["First Steps"]);
        for _ in 0..3 {
            assert!(profile.record_joke("b", CornLevel::MildChuckle).is_empty());
        }
        assert_eq!(profile.record_joke("c", CornLevel::MildChuckle), vec!["Getting Started"]);
        assert_eq!(profile.data.achievements, vec!["First Steps", "Getting Started"]);
    }

    #[test]
    fn test_favorites_no_duplicates() {
        let (_dir, mut profile) = fresh();
        assert!(profile.add_favorite("A joke", CornLevel::GroanZone));
        assert!(!profile.add_favorite("A joke", CornLevel::GroanZone));
        assert_eq!(profile.favorites().len(), 1);
        assert!(profile.remove_favorite(2).is_err());
        assert!(profile.remove_favorite(0).is_err());
        assert_eq!(profile.remove_favorite(1).unwrap().joke, "A joke");
        assert!(profile.favorites().is_empty());
    }

    #[test]
    fn test_set_level_bounds() {
        let (_dir, mut profile) = fresh();
        assert_eq!(profile.set_level(5).unwrap(), CornLevel::UltraCorn);
        assert!(matches!(profile.set_level(0), Err(Error::InvalidInput(_))));
        assert!(profile.set_level(6).is_err());
        assert_eq!(profile.level(), CornLevel::UltraCorn);
    }

    #[test]
    fn test_daily_eligibility() {
        let (_dir, mut profile) = fresh();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let tomorrow = today.succ_opt().unwrap();
        assert!(profile.is_daily_eligible_on(today));
        profile.mark_daily_seen_on(today);
        assert!(!profile.is_daily_eligible_on(today));
        assert!(profile.is_daily_eligible_on(tomorrow));
    }

    #[test]
    fn test_setup_rejects_blank_name() {
        let (_dir, mut profile) = fresh();
        assert!(profile.complete_setup("  ", CornLevel::DadApproved).is_err());
        profile.complete_setup("  Pat ", CornLevel::DadApproved).unwrap();
        assert_eq!(profile.name(), Some("Pat"));
        assert!(profile.data.setup_completed);
    }

    #[test]
    fn test_favorites_text() {
        let (_dir, mut profile) = fresh();
        let empty = profile.favorites_text(Local::now());
        assert!(empty.contains("No favorite jokes yet"));
        profile.add_favorite("Why did the bicycle fall over? It was two-tired!", CornLevel::EyeRoll);
        let text = profile.favorites_text(Local::now());
        assert!(text.contains("1. Why did the bicycle fall over? It was two-tired!"));
        assert!(text.contains("Corniness Level: 3 (Eye Roll Guaranteed)"));
    }
}
