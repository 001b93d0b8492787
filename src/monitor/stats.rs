//! Session statistics and the in-memory session log
//!
//! Completed monitoring runs land here as [`SessionRecord`]s; the
//! dashboard endpoints query them with filter/search/sort semantics.
//! Records are not persisted - the log starts from demo data produced by a
//! pluggable [`SessionSource`] so real history can replace it without
//! touching the handlers.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::gaze::{AlertLevel, GazeDirection};

/// Kind of monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Driving,
    Productivity,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Driving => write!(f, "driving"),
            SessionKind::Productivity => write!(f, "productivity"),
        }
    }
}

/// Completed-session record backing the dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub kind: SessionKind,
    pub date: DateTime<Utc>,
    pub duration_secs: u64,
    pub average_score: u32,
    pub alerts: u32,
}

/// Live snapshot of the active monitoring session
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub active: bool,
    pub kind: Option<SessionKind>,
    pub elapsed_secs: u64,
    pub direction: GazeDirection,
    /// Human-readable direction label
    pub direction_label: String,
    pub eyes_closed_count: u32,
    pub phone_check_count: u32,
    pub alert_level: AlertLevel,
    pub score: u32,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            active: false,
            kind: None,
            elapsed_secs: 0,
            direction: GazeDirection::Unknown,
            direction_label: GazeDirection::Unknown.to_string(),
            eyes_closed_count: 0,
            phone_check_count: 0,
            alert_level: AlertLevel::Normal,
            score: 100,
        }
    }
}

/// Kind filter for session queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    Driving,
    Productivity,
}

impl KindFilter {
    fn matches(&self, kind: SessionKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Driving => kind == SessionKind::Driving,
            KindFilter::Productivity => kind == SessionKind::Productivity,
        }
    }
}

/// Sort key for session queries (always descending)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSort {
    #[default]
    Date,
    Duration,
    Score,
}

/// Session list query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub kind: KindFilter,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SessionSort,
}

/// Aggregates for the dashboard header
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub total_sessions: usize,
    /// Average score across sessions, one decimal
    pub average_score: f64,
    pub total_duration_secs: u64,
}

/// Source of session records
///
/// Implemented by the demo generator below; a real history backend can be
/// substituted without touching the web handlers.
pub trait SessionSource: Send + Sync {
    fn sessions(&self) -> Vec<SessionRecord>;
}

/// Deterministic demo data generator
pub struct DemoSessionSource {
    count: usize,
    seed: u64,
}

impl DemoSessionSource {
    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, seed }
    }
}

impl Default for DemoSessionSource {
    fn default() -> Self {
        Self::new(8, 42)
    }
}

impl SessionSource for DemoSessionSource {
    fn sessions(&self) -> Vec<SessionRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let now = Utc::now();

        (0..self.count)
            .map(|i| {
                let kind = if rng.gen_bool(0.5) {
                    SessionKind::Driving
                } else {
                    SessionKind::Productivity
                };
                SessionRecord {
                    id: format!("demo-{}", i + 1),
                    kind,
                    date: now - ChronoDuration::hours(rng.gen_range(1..24 * 14)),
                    duration_secs: rng.gen_range(15 * 60..3 * 3600),
                    average_score: rng.gen_range(60..=100),
                    alerts: rng.gen_range(0..6),
                }
            })
            .collect()
    }
}

/// In-memory session log
pub struct SessionLog {
    records: RwLock<Vec<SessionRecord>>,
}

impl SessionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Create a log seeded from a source
    pub fn with_source(source: &dyn SessionSource) -> Self {
        Self {
            records: RwLock::new(source.sessions()),
        }
    }

    /// Append a completed session
    pub fn record(&self, record: SessionRecord) {
        self.records.write().push(record);
    }

    /// Query the log
    pub fn list(&self, query: &SessionQuery) -> Vec<SessionRecord> {
        let records = self.records.read();

        let mut result: Vec<SessionRecord> = records
            .iter()
            .filter(|r| query.kind.matches(r.kind))
            .filter(|r| match &query.search {
                Some(needle) if !needle.trim().is_empty() => {
                    let needle = needle.to_lowercase();
                    r.kind.to_string().contains(&needle)
                        || r.date
                            .format("%a %b %e %H:%M")
                            .to_string()
                            .to_lowercase()
                            .contains(&needle)
                }
                _ => true,
            })
            .cloned()
            .collect();

        match query.sort {
            SessionSort::Date => result.sort_by(|a, b| b.date.cmp(&a.date)),
            SessionSort::Duration => result.sort_by(|a, b| b.duration_secs.cmp(&a.duration_secs)),
            SessionSort::Score => result.sort_by(|a, b| b.average_score.cmp(&a.average_score)),
        }

        result
    }

    /// Aggregates across the whole log
    pub fn summary(&self) -> SessionSummary {
        let records = self.records.read();

        let total_sessions = records.len();
        let total_duration_secs = records.iter().map(|r| r.duration_secs).sum();
        let average_score = if total_sessions == 0 {
            0.0
        } else {
            let sum: u64 = records.iter().map(|r| r.average_score as u64).sum();
            (sum as f64 / total_sessions as f64 * 10.0).round() / 10.0
        };

        SessionSummary {
            total_sessions,
            average_score,
            total_duration_secs,
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, kind: SessionKind, hours_ago: i64, duration: u64, score: u32) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            kind,
            date: Utc::now() - ChronoDuration::hours(hours_ago),
            duration_secs: duration,
            average_score: score,
            alerts: 0,
        }
    }

    fn sample_log() -> SessionLog {
        let log = SessionLog::new();
        log.record(record("a", SessionKind::Driving, 10, 3600, 85));
        log.record(record("b", SessionKind::Productivity, 5, 7200, 92));
        log.record(record("c", SessionKind::Driving, 1, 1800, 70));
        log
    }

    #[test]
    fn test_list_sorts_by_date_descending_by_default() {
        let log = sample_log();
        let ids: Vec<String> = log
            .list(&SessionQuery::default())
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_list_filters_by_kind() {
        let log = sample_log();
        let query = SessionQuery {
            kind: KindFilter::Driving,
            ..Default::default()
        };
        let result = log.list(&query);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.kind == SessionKind::Driving));
    }

    #[test]
    fn test_list_sorts_by_duration_and_score() {
        let log = sample_log();

        let by_duration = log.list(&SessionQuery {
            sort: SessionSort::Duration,
            ..Default::default()
        });
        assert_eq!(by_duration[0].id, "b");

        let by_score = log.list(&SessionQuery {
            sort: SessionSort::Score,
            ..Default::default()
        });
        assert_eq!(by_score[0].id, "b");
        assert_eq!(by_score[2].id, "c");
    }

    #[test]
    fn test_search_matches_kind_text() {
        let log = sample_log();
        let query = SessionQuery {
            search: Some("productiv".to_string()),
            ..Default::default()
        };
        let result = log.list(&query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "b");
    }

    #[test]
    fn test_summary() {
        let log = sample_log();
        let summary = log.summary();
        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.total_duration_secs, 3600 + 7200 + 1800);
        // (85 + 92 + 70) / 3 = 82.33 -> 82.3
        assert_eq!(summary.average_score, 82.3);
    }

    #[test]
    fn test_summary_of_empty_log() {
        let log = SessionLog::new();
        let summary = log.summary();
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.average_score, 0.0);
    }

    #[test]
    fn test_demo_source_is_deterministic() {
        let a = DemoSessionSource::new(5, 7).sessions();
        let b = DemoSessionSource::new(5, 7).sessions();
        assert_eq!(a.len(), 5);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.duration_secs, y.duration_secs);
            assert_eq!(x.average_score, y.average_score);
        }
    }
}
