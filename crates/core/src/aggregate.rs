//! Score aggregation over student marks.
//!
//! Everything here is a pure function over borrowed data. Averages over empty
//! input come back as [`Aggregate::NotAvailable`] rather than a numeric zero.

use std::fmt;

use indexmap::IndexMap;

use crate::model::{HistoricalMarks, StudentRecord, SubjectMarks, SubjectScore};

/// Number of most recent historical scores used per subject for the projection.
pub const PREDICTION_WINDOW: usize = 3;

//
// ─── AGGREGATE VALUE ───────────────────────────────────────────────────────────
//

/// Result of an averaging operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    Value(f64),
    /// There was nothing to average. Displays as `N/A`.
    NotAvailable,
}

impl Aggregate {
    /// Arithmetic mean of the values, or `NotAvailable` when there are none.
    pub fn mean(values: impl IntoIterator<Item = f64>) -> Self {
        let (sum, count) = values
            .into_iter()
            .fold((0.0_f64, 0_u32), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            Self::NotAvailable
        } else {
            Self::Value(sum / f64::from(count))
        }
    }

    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotAvailable => None,
        }
    }

    #[must_use]
    pub fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.1}"),
            Self::NotAvailable => f.write_str("N/A"),
        }
    }
}

//
// ─── PER-STUDENT AGGREGATES ────────────────────────────────────────────────────
//

/// Mean of all current subject scores.
#[must_use]
pub fn overall_average(marks: &SubjectMarks) -> Aggregate {
    Aggregate::mean(marks.scores())
}

/// Which end of the score range to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Lowest,
    Highest,
}

impl Extreme {
    fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Self::Lowest => candidate < best,
            Self::Highest => candidate > best,
        }
    }
}

/// The lowest or highest scoring subject.
///
/// Entries are scanned in insertion order and replaced only on a strict
/// improvement, so ties go to the subject inserted first.
#[must_use]
pub fn extreme_subject(marks: &SubjectMarks, direction: Extreme) -> Option<SubjectScore> {
    let mut best: Option<(&str, f64)> = None;
    for (subject, score) in marks.iter() {
        match best {
            Some((_, current)) if !direction.improves(score, current) => {}
            _ => best = Some((subject, score)),
        }
    }
    best.map(|(subject, score)| SubjectScore::new(subject, score))
}

/// Up to `n` subjects ordered from the chosen extreme inward.
///
/// Ordering is stable: equal scores keep insertion order.
#[must_use]
pub fn ranked_subjects(marks: &SubjectMarks, direction: Extreme, n: usize) -> Vec<SubjectScore> {
    let mut entries: Vec<SubjectScore> = marks
        .iter()
        .map(|(subject, score)| SubjectScore::new(subject, score))
        .collect();
    match direction {
        Extreme::Lowest => entries.sort_by(|a, b| a.score.total_cmp(&b.score)),
        Extreme::Highest => entries.sort_by(|a, b| b.score.total_cmp(&a.score)),
    }
    entries.truncate(n);
    entries
}

/// Projected score from recent history.
///
/// Each subject contributes the mean of its last [`PREDICTION_WINDOW`] scores
/// (fewer if the history is shorter); subjects with no history are skipped.
/// The projection is the mean of those per-subject values.
#[must_use]
pub fn predictive_score(historical: &HistoricalMarks) -> Aggregate {
    let per_subject = historical.iter().filter_map(|(_, scores)| {
        let start = scores.len().saturating_sub(PREDICTION_WINDOW);
        Aggregate::mean(scores[start..].iter().copied()).value()
    });
    Aggregate::mean(per_subject)
}

/// Mean across subjects for each test position, oldest first.
///
/// Position `i` averages the subjects that have an `i`-th score.
#[must_use]
pub fn historical_overall_averages(historical: &HistoricalMarks) -> Vec<Aggregate> {
    let tests = historical
        .iter()
        .map(|(_, scores)| scores.len())
        .max()
        .unwrap_or(0);
    (0..tests)
        .map(|i| Aggregate::mean(historical.iter().filter_map(|(_, scores)| scores.get(i).copied())))
        .collect()
}

/// Average of attendance and overall average, used as a rough standing figure.
#[must_use]
pub fn standing(record: &StudentRecord) -> Aggregate {
    match overall_average(record.marks()) {
        Aggregate::Value(avg) => Aggregate::Value((record.attendance_rate() + avg) / 2.0),
        Aggregate::NotAvailable => Aggregate::NotAvailable,
    }
}

//
// ─── BANDS ─────────────────────────────────────────────────────────────────────
//

/// Label for a single subject mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkBand {
    Strong,
    Average,
    Weak,
}

impl MarkBand {
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score > 75.0 {
            Self::Strong
        } else if score < 60.0 {
            Self::Weak
        } else {
            Self::Average
        }
    }
}

/// Bucket of a student's overall average in the class distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerformanceBand {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl PerformanceBand {
    pub const ALL: [PerformanceBand; 4] = [
        PerformanceBand::Excellent,
        PerformanceBand::Good,
        PerformanceBand::Average,
        PerformanceBand::NeedsImprovement,
    ];

    #[must_use]
    pub fn classify(average: f64) -> Self {
        if average >= 90.0 {
            Self::Excellent
        } else if average >= 75.0 {
            Self::Good
        } else if average >= 60.0 {
            Self::Average
        } else {
            Self::NeedsImprovement
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent (90+)",
            Self::Good => "Good (75-89)",
            Self::Average => "Average (60-74)",
            Self::NeedsImprovement => "Needs Improvement (<60)",
        }
    }
}

//
// ─── ALERTS ────────────────────────────────────────────────────────────────────
//

/// Limits below which a student is flagged on the teacher dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    pub attendance: f64,
    pub average: f64,
    pub subject: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            attendance: 80.0,
            average: 60.0,
            subject: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudentAlert {
    LowAttendance { rate: f64 },
    LowAverage { average: f64 },
    Struggling { subject: String, score: f64 },
}

impl fmt::Display for StudentAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowAttendance { rate } => write!(f, "Low Attendance ({rate:.0}%)"),
            Self::LowAverage { average } => write!(f, "Low Average ({average:.1}%)"),
            Self::Struggling { subject, score } => {
                write!(f, "Struggling in {subject} ({score:.0}%)")
            }
        }
    }
}

/// Flags raised for a student, in attendance, average, subject order.
#[must_use]
pub fn student_alerts(record: &StudentRecord, thresholds: &AlertThresholds) -> Vec<StudentAlert> {
    let mut alerts = Vec::new();
    if record.attendance_rate() < thresholds.attendance {
        alerts.push(StudentAlert::LowAttendance {
            rate: record.attendance_rate(),
        });
    }
    if let Aggregate::Value(average) = overall_average(record.marks()) {
        if average < thresholds.average {
            alerts.push(StudentAlert::LowAverage { average });
        }
    }
    if let Some(lowest) = extreme_subject(record.marks(), Extreme::Lowest) {
        if lowest.score < thresholds.subject {
            alerts.push(StudentAlert::Struggling {
                subject: lowest.subject,
                score: lowest.score,
            });
        }
    }
    alerts
}

//
// ─── CLASS AGGREGATES ──────────────────────────────────────────────────────────
//

/// Mean score per subject across students, subjects in first-seen order.
#[must_use]
pub fn class_subject_averages(students: &[StudentRecord]) -> Vec<SubjectScore> {
    let mut totals: IndexMap<&str, (f64, u32)> = IndexMap::new();
    for (subject, score) in students.iter().flat_map(|s| s.marks().iter()) {
        let (sum, count) = totals.entry(subject).or_insert((0.0, 0));
        *sum += score;
        *count += 1;
    }
    totals
        .into_iter()
        .map(|(subject, (sum, count))| SubjectScore::new(subject, sum / f64::from(count)))
        .collect()
}

/// Student with the highest overall average; the earliest wins ties.
///
/// Students without marks only win when nobody has marks.
#[must_use]
pub fn topper(students: &[StudentRecord]) -> Option<&StudentRecord> {
    let mut best: Option<(&StudentRecord, Option<f64>)> = None;
    for student in students {
        let avg = overall_average(student.marks()).value();
        let better = match (&best, avg) {
            (None, _) => true,
            (Some((_, None)), Some(_)) => true,
            (Some((_, Some(current))), Some(candidate)) => candidate > *current,
            _ => false,
        };
        if better {
            best = Some((student, avg));
        }
    }
    best.map(|(student, _)| student)
}
