//! Plain-text views of quiz results and reports.

use std::io::{self, Write};

use classroom_core::aggregate::{self, MarkBand, PerformanceBand};
use classroom_core::model::{AccuracyBand, Complaint, Doubt, QuizAttemptRecord, QuizSummary};
use services::{ClassOverview, FamilyOverview, StudentOverview, SubjectGap};

fn list_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<&str> = items.collect();
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// `m:ss`, as shown on the quiz analysis screen.
pub fn clock_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn print_summary(out: &mut impl Write, summary: &QuizSummary) -> io::Result<()> {
    writeln!(out, "\n== {} quiz results ==", summary.subject())?;
    writeln!(out, "Score:    {} / {}", summary.score(), summary.total())?;
    writeln!(out, "Accuracy: {:.1}%", summary.accuracy_percent())?;
    writeln!(out, "Time:     {}", clock_time(summary.elapsed_seconds()))?;
    writeln!(out, "Strong topics: {}", list_or_none(summary.strong_topics()))?;
    writeln!(out, "Weak topics:   {}", list_or_none(summary.weak_topics()))?;
    for answer in summary.answers() {
        let mark = if answer.is_correct { "+" } else { "-" };
        writeln!(out, "{mark} {}", answer.question)?;
        writeln!(out, "    Your answer: {}", answer.chosen_option)?;
        if !answer.is_correct {
            writeln!(out, "    Correct answer: {}", answer.correct_option)?;
        }
    }
    Ok(())
}

fn band_label(band: MarkBand) -> &'static str {
    match band {
        MarkBand::Strong => "Strong",
        MarkBand::Average => "Average",
        MarkBand::Weak => "Weak",
    }
}

pub fn print_student(out: &mut impl Write, student: &StudentOverview) -> io::Result<()> {
    writeln!(out, "{} ({}) - class {}", student.name, student.id, student.class)?;
    writeln!(out, "Attendance:      {}%", student.attendance_rate)?;
    writeln!(out, "Overall average: {}", student.average)?;
    writeln!(out, "Predicted score: {}", student.predicted)?;
    writeln!(out, "Standing:        {}", student.standing)?;
    if let Some(band) = student.band {
        writeln!(out, "Performance:     {}", band.label())?;
    }
    if let (Some(high), Some(low)) = (&student.highest, &student.lowest) {
        writeln!(out, "Highest: {} ({})", high.subject, high.score)?;
        writeln!(out, "Lowest:  {} ({})", low.subject, low.score)?;
    }
    writeln!(
        out,
        "Strengths:  {}",
        list_or_none(student.strengths.iter().map(|s| s.subject.as_str()))
    )?;
    writeln!(
        out,
        "Weaknesses: {}",
        list_or_none(student.weaknesses.iter().map(|s| s.subject.as_str()))
    )?;
    for line in &student.subjects {
        writeln!(out, "  {:<12} {:>5}  {}", line.subject, line.score, band_label(line.band))?;
    }
    if !student.trend.is_empty() {
        let trend: Vec<String> = student.trend.iter().map(ToString::to_string).collect();
        writeln!(out, "Test averages: {}", trend.join(" -> "))?;
    }
    for alert in &student.alerts {
        writeln!(out, "! {alert}")?;
    }
    Ok(())
}

pub fn print_class(out: &mut impl Write, class: &ClassOverview) -> io::Result<()> {
    writeln!(out, "Students: {}", class.student_count)?;
    if let Some((id, name)) = &class.topper {
        writeln!(out, "Topper:   {name} ({id})")?;
    }
    writeln!(out, "Subject averages:")?;
    for subject in &class.subject_averages {
        writeln!(out, "  {:<12} {:.1}", subject.subject, subject.score)?;
    }
    writeln!(out, "Performance distribution:")?;
    for (band, count) in &class.distribution {
        writeln!(out, "  {:<24} {count}", PerformanceBand::label(*band))?;
    }
    if class.flagged.is_empty() {
        writeln!(out, "No students need attention.")?;
    } else {
        writeln!(out, "Needs attention:")?;
        for student in &class.flagged {
            let alerts: Vec<String> = student.alerts.iter().map(ToString::to_string).collect();
            writeln!(out, "  {} ({}): {}", student.name, student.id, alerts.join("; "))?;
        }
    }
    Ok(())
}

pub fn print_history(out: &mut impl Write, history: &[QuizAttemptRecord]) -> io::Result<()> {
    if history.is_empty() {
        return writeln!(out, "No past quiz attempts found.");
    }
    for attempt in history {
        let band = match attempt.accuracy_band() {
            AccuracyBand::High => "high",
            AccuracyBand::Medium => "medium",
            AccuracyBand::Low => "low",
        };
        writeln!(
            out,
            "{}  {:<10} Score: {}/{}  Accuracy: {:.1}% ({band})  Time: {}",
            attempt.attempted_at.format("%Y-%m-%d"),
            attempt.subject,
            attempt.score,
            attempt.total_questions,
            attempt.accuracy,
            clock_time(attempt.time_taken_seconds),
        )?;
    }
    Ok(())
}

//
// ─── MESSAGES ──────────────────────────────────────────────────────────────────
//

pub fn print_doubts(out: &mut impl Write, doubts: &[Doubt]) -> io::Result<()> {
    if doubts.is_empty() {
        return writeln!(out, "No doubts.");
    }
    for doubt in doubts {
        let status = if doubt.resolved { "resolved" } else { "pending" };
        writeln!(
            out,
            "#{} [{status}] {} ({}): {}",
            doubt.id, doubt.student_name, doubt.student_id, doubt.question
        )?;
        if let Some(answer) = &doubt.answer {
            writeln!(out, "    Answer: {answer}")?;
        }
    }
    Ok(())
}

pub fn print_complaints(out: &mut impl Write, complaints: &[Complaint]) -> io::Result<()> {
    if complaints.is_empty() {
        return writeln!(out, "No complaints.");
    }
    for complaint in complaints {
        writeln!(
            out,
            "{}  From {} about {}: {}",
            complaint.created_at.format("%Y-%m-%d %H:%M"),
            complaint.teacher_name,
            complaint.student_name,
            complaint.remark
        )?;
        if let Some(report) = &complaint.report {
            writeln!(
                out,
                "    At the time: attendance {}%, average {}",
                report.attendance_rate(),
                aggregate::overall_average(report.marks())
            )?;
        }
    }
    Ok(())
}

//
// ─── FAMILY ────────────────────────────────────────────────────────────────────
//

pub fn print_family(out: &mut impl Write, family: &FamilyOverview) -> io::Result<()> {
    if family.children.is_empty() {
        return writeln!(out, "No children linked to this account.");
    }
    for child in &family.children {
        writeln!(
            out,
            "{} ({}) - class {}  average {}  attendance {}%",
            child.name, child.id, child.class, child.average, child.attendance_rate
        )?;
    }
    if let Some(topper) = &family.topper {
        writeln!(out, "Class topper: {} ({})", topper.name, topper.average)?;
    }
    Ok(())
}

pub fn print_gaps(out: &mut impl Write, gaps: &[SubjectGap]) -> io::Result<()> {
    writeln!(out, "Compared with the class topper:")?;
    for gap in gaps {
        match gap.topper {
            Some(topper) => writeln!(
                out,
                "  {:<12} {:>5} vs {:>5}",
                gap.subject, gap.child, topper
            )?,
            None => writeln!(out, "  {:<12} {:>5} vs     -", gap.subject, gap.child)?,
        }
    }
    Ok(())
}
