use std::sync::Arc;

use classroom_core::aggregate::{
    self, Aggregate, AlertThresholds, Extreme, MarkBand, PerformanceBand, StudentAlert,
};
use classroom_core::model::{ParentId, StudentId, StudentRecord, SubjectScore};
use storage::StudentRepository;

use crate::error::ReportError;

const HIGHLIGHT_COUNT: usize = 2;

//
// ─── STUDENT ───────────────────────────────────────────────────────────────────
//

/// One subject row of a student report.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectLine {
    pub subject: String,
    pub score: f64,
    pub band: MarkBand,
}

/// Everything the student, parent and teacher detail screens show for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentOverview {
    pub id: StudentId,
    pub name: String,
    pub class: String,
    pub attendance_rate: f64,
    pub average: Aggregate,
    pub predicted: Aggregate,
    pub standing: Aggregate,
    /// `None` when the student has no marks.
    pub band: Option<PerformanceBand>,
    pub lowest: Option<SubjectScore>,
    pub highest: Option<SubjectScore>,
    pub strengths: Vec<SubjectScore>,
    /// Empty unless there are more subjects than strengths shown.
    pub weaknesses: Vec<SubjectScore>,
    pub subjects: Vec<SubjectLine>,
    /// Mean across subjects per past test, oldest first.
    pub trend: Vec<Aggregate>,
    pub alerts: Vec<StudentAlert>,
}

impl StudentOverview {
    #[must_use]
    pub fn from_record(record: &StudentRecord, thresholds: &AlertThresholds) -> Self {
        let marks = record.marks();
        let average = aggregate::overall_average(marks);
        Self {
            id: record.id().clone(),
            name: record.name().to_owned(),
            class: record.class().to_owned(),
            attendance_rate: record.attendance_rate(),
            average,
            predicted: aggregate::predictive_score(record.historical_marks()),
            standing: aggregate::standing(record),
            band: average.value().map(PerformanceBand::classify),
            lowest: aggregate::extreme_subject(marks, Extreme::Lowest),
            highest: aggregate::extreme_subject(marks, Extreme::Highest),
            strengths: aggregate::ranked_subjects(marks, Extreme::Highest, HIGHLIGHT_COUNT),
            weaknesses: if marks.len() > HIGHLIGHT_COUNT {
                aggregate::ranked_subjects(marks, Extreme::Lowest, HIGHLIGHT_COUNT)
            } else {
                Vec::new()
            },
            subjects: marks
                .iter()
                .map(|(subject, score)| SubjectLine {
                    subject: subject.to_owned(),
                    score,
                    band: MarkBand::classify(score),
                })
                .collect(),
            trend: aggregate::historical_overall_averages(record.historical_marks()),
            alerts: aggregate::student_alerts(record, thresholds),
        }
    }

    #[must_use]
    pub fn needs_attention(&self) -> bool {
        !self.alerts.is_empty()
    }
}

//
// ─── CLASS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedStudent {
    pub id: StudentId,
    pub name: String,
    pub alerts: Vec<StudentAlert>,
}

/// Teacher dashboard figures for a list of students.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassOverview {
    pub student_count: usize,
    pub subject_averages: Vec<SubjectScore>,
    /// Student count per band, in `PerformanceBand::ALL` order.
    pub distribution: Vec<(PerformanceBand, usize)>,
    pub topper: Option<(StudentId, String)>,
    pub flagged: Vec<FlaggedStudent>,
}

impl ClassOverview {
    #[must_use]
    pub fn from_students(students: &[StudentRecord], thresholds: &AlertThresholds) -> Self {
        let bands: Vec<PerformanceBand> = students
            .iter()
            .filter_map(|s| aggregate::overall_average(s.marks()).value())
            .map(PerformanceBand::classify)
            .collect();
        let distribution = PerformanceBand::ALL
            .iter()
            .map(|band| (*band, bands.iter().filter(|b| *b == band).count()))
            .collect();

        let flagged = students
            .iter()
            .filter_map(|s| {
                let alerts = aggregate::student_alerts(s, thresholds);
                (!alerts.is_empty()).then(|| FlaggedStudent {
                    id: s.id().clone(),
                    name: s.name().to_owned(),
                    alerts,
                })
            })
            .collect();

        Self {
            student_count: students.len(),
            subject_averages: aggregate::class_subject_averages(students),
            distribution,
            topper: aggregate::topper(students).map(|s| (s.id().clone(), s.name().to_owned())),
            flagged,
        }
    }
}

//
// ─── FAMILY ────────────────────────────────────────────────────────────────────
//

/// A child's mark next to the class topper's mark for the same subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectGap {
    pub subject: String,
    pub child: f64,
    /// `None` when the topper has no mark in this subject.
    pub topper: Option<f64>,
}

/// What a parent sees: each linked child, plus the class topper for comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyOverview {
    pub children: Vec<StudentOverview>,
    pub topper: Option<StudentOverview>,
}

impl FamilyOverview {
    #[must_use]
    pub fn child(&self, id: &StudentId) -> Option<&StudentOverview> {
        self.children.iter().find(|c| &c.id == id)
    }

    /// Per-subject comparison of `child` with the topper, in the child's subject order.
    #[must_use]
    pub fn compare_with_topper(&self, child: &StudentOverview) -> Vec<SubjectGap> {
        child
            .subjects
            .iter()
            .map(|line| SubjectGap {
                subject: line.subject.clone(),
                child: line.score,
                topper: self.topper.as_ref().and_then(|t| {
                    t.subjects
                        .iter()
                        .find(|s| s.subject == line.subject)
                        .map(|s| s.score)
                }),
            })
            .collect()
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Builds reports from the student repository.
#[derive(Clone)]
pub struct ReportService {
    students: Arc<dyn StudentRepository>,
    thresholds: AlertThresholds,
}

impl ReportService {
    #[must_use]
    pub fn new(students: Arc<dyn StudentRepository>) -> Self {
        Self {
            students,
            thresholds: AlertThresholds::default(),
        }
    }

    /// # Errors
    ///
    /// Returns `ReportError::Storage` if the student cannot be fetched.
    pub async fn student_overview(&self, id: &StudentId) -> Result<StudentOverview, ReportError> {
        let record = self.students.fetch_student(id).await.map_err(|err| {
            tracing::warn!(student = %id, error = %err, "student fetch failed");
            err
        })?;
        Ok(StudentOverview::from_record(&record, &self.thresholds))
    }

    /// # Errors
    ///
    /// Returns `ReportError::Storage` if the student list cannot be fetched.
    pub async fn class_overview(&self) -> Result<ClassOverview, ReportError> {
        let students = self.students.list_students().await.map_err(|err| {
            tracing::warn!(error = %err, "student list fetch failed");
            err
        })?;
        Ok(ClassOverview::from_students(&students, &self.thresholds))
    }

    /// Children linked to `parent` and the topper of the whole student list.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` for an unknown parent or if students cannot be listed.
    pub async fn family_overview(&self, parent: &ParentId) -> Result<FamilyOverview, ReportError> {
        let children = self.students.children_of(parent).await.map_err(|err| {
            tracing::warn!(parent = %parent, error = %err, "children fetch failed");
            err
        })?;
        let everyone = self.students.list_students().await?;
        Ok(FamilyOverview {
            children: children
                .iter()
                .map(|c| StudentOverview::from_record(c, &self.thresholds))
                .collect(),
            topper: aggregate::topper(&everyone)
                .map(|t| StudentOverview::from_record(t, &self.thresholds)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{HistoricalMarks, SubjectMarks};

    fn student(id: &str, attendance: f64, marks: &[(&str, f64)]) -> StudentRecord {
        StudentRecord::new(
            StudentId::new(id).unwrap(),
            format!("Student {id}"),
            "10A",
            attendance,
            SubjectMarks::from_pairs(marks.iter().copied()).unwrap(),
            HistoricalMarks::from_pairs([
                ("Math", vec![70.0, 80.0, 90.0]),
                ("Science", vec![60.0, 60.0]),
            ])
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn student_overview_collects_figures() {
        let record = student(
            "S1",
            90.0,
            &[("Math", 85.0), ("Science", 72.0), ("English", 90.0)],
        );
        let overview = StudentOverview::from_record(&record, &AlertThresholds::default());

        assert_eq!(overview.average.to_string(), "82.3");
        assert_eq!(overview.predicted, Aggregate::Value(70.0));
        assert_eq!(overview.band, Some(PerformanceBand::Good));
        assert_eq!(overview.lowest.as_ref().unwrap().subject, "Science");
        assert_eq!(overview.highest.as_ref().unwrap().subject, "English");
        let strengths: Vec<_> = overview.strengths.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(strengths, ["English", "Math"]);
        let weaknesses: Vec<_> = overview.weaknesses.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(weaknesses, ["Science", "Math"]);
        assert_eq!(overview.subjects[0].band, MarkBand::Strong);
        assert_eq!(overview.subjects[1].band, MarkBand::Average);
        assert_eq!(overview.trend.len(), 3);
        assert!(!overview.needs_attention());
    }

    #[test]
    fn few_subjects_show_no_weaknesses() {
        let record = student("S3", 90.0, &[("Math", 40.0), ("Science", 95.0)]);
        let overview = StudentOverview::from_record(&record, &AlertThresholds::default());
        assert_eq!(overview.strengths.len(), 2);
        assert!(overview.weaknesses.is_empty());
        assert_eq!(overview.lowest.unwrap().subject, "Math");
    }

    #[test]
    fn student_without_marks_has_no_band() {
        let record = student("S2", 95.0, &[]);
        let overview = StudentOverview::from_record(&record, &AlertThresholds::default());
        assert_eq!(overview.average, Aggregate::NotAvailable);
        assert_eq!(overview.standing, Aggregate::NotAvailable);
        assert!(overview.band.is_none());
        assert!(overview.lowest.is_none());
        assert!(overview.strengths.is_empty());
    }

    #[test]
    fn class_overview_counts_bands_and_flags() {
        let students = vec![
            student("S1", 95.0, &[("Math", 95.0), ("Science", 92.0)]),
            student("S2", 70.0, &[("Math", 40.0), ("Science", 65.0)]),
            student("S3", 88.0, &[("Math", 80.0), ("Science", 76.0)]),
        ];
        let overview = ClassOverview::from_students(&students, &AlertThresholds::default());

        assert_eq!(overview.student_count, 3);
        assert_eq!(
            overview.distribution,
            vec![
                (PerformanceBand::Excellent, 1),
                (PerformanceBand::Good, 1),
                (PerformanceBand::Average, 0),
                (PerformanceBand::NeedsImprovement, 1),
            ]
        );
        assert_eq!(overview.topper.as_ref().map(|(id, _)| id.as_str()), Some("S1"));
        assert_eq!(overview.flagged.len(), 1);
        assert_eq!(overview.flagged[0].id.as_str(), "S2");
        assert_eq!(overview.flagged[0].alerts.len(), 3);

        let math = &overview.subject_averages[0];
        assert_eq!(math.subject, "Math");
        assert!((math.score - 71.666_666).abs() < 1e-3);
    }

    #[test]
    fn topper_comparison_follows_child_subjects() {
        let child = student("S2", 80.0, &[("Math", 60.0), ("Art", 70.0)]);
        let topper = student("S1", 95.0, &[("Math", 95.0), ("Science", 92.0)]);
        let thresholds = AlertThresholds::default();
        let family = FamilyOverview {
            children: vec![StudentOverview::from_record(&child, &thresholds)],
            topper: Some(StudentOverview::from_record(&topper, &thresholds)),
        };
        let child = family.child(&StudentId::new("S2").unwrap()).unwrap();
        let gaps = family.compare_with_topper(child);
        assert_eq!(
            gaps,
            vec![
                SubjectGap {
                    subject: "Math".into(),
                    child: 60.0,
                    topper: Some(95.0)
                },
                SubjectGap {
                    subject: "Art".into(),
                    child: 70.0,
                    topper: None
                },
            ]
        );
        assert!(family.child(&StudentId::new("S9").unwrap()).is_none());
    }

    #[test]
    fn empty_class_has_no_topper() {
        let overview = ClassOverview::from_students(&[], &AlertThresholds::default());
        assert!(overview.topper.is_none());
        assert!(overview.subject_averages.is_empty());
        assert!(overview.distribution.iter().all(|(_, n)| *n == 0));
    }
}
