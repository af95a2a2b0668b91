//! Prompt text sent to the AI proxy.

use std::fmt::Write;

use classroom_core::model::{AnswerResult, SubjectScore};
use services::StudentOverview;

pub fn explanation(result: &AnswerResult) -> String {
    format!(
        "The student was asked: \"{question}\". They incorrectly answered \"{wrong}\". \
         The correct answer is \"{right}\". Briefly and simply explain why \"{right}\" is correct. \
         Do not be conversational, just provide the explanation.",
        question = result.question,
        wrong = result.chosen_option,
        right = result.correct_option,
    )
}

/// Students below these figures are listed in the support prompt.
pub const SUPPORT_AVERAGE: f64 = 70.0;
pub const SUPPORT_ATTENDANCE: f64 = 85.0;

pub fn needs_support(student: &StudentOverview) -> bool {
    student.attendance_rate < SUPPORT_ATTENDANCE
        || student.average.value().is_some_and(|avg| avg < SUPPORT_AVERAGE)
}

pub fn class_suggestions(students: &[&StudentOverview]) -> String {
    let mut prompt = String::from(
        "As an AI assistant for a teacher, generate concise, actionable feedback for students \
         who need support. Focus on specific subjects or attendance issues. Provide suggestions \
         as a bulleted list using markdown. No conversational filler, just the list.\nStudents:\n",
    );
    for student in students {
        let lowest = student
            .lowest
            .as_ref()
            .map_or("N/A", |s| s.subject.as_str());
        let _ = writeln!(
            prompt,
            "- Name: {}, Avg Score: {}, Attendance: {}%, Lowest Subject: {lowest}.",
            student.name, student.average, student.attendance_rate
        );
    }
    prompt
}

pub fn parent_note(student: &StudentOverview) -> String {
    let subject = |s: &Option<SubjectScore>| {
        s.as_ref().map_or_else(|| "N/A".to_string(), |s| s.subject.clone())
    };
    format!(
        "As an AI, write a concise, encouraging message from a teacher to a parent about {name}'s \
         performance. Mention their average of {avg}%, strongest subject ({high}), and weakest \
         subject ({low}). Suggest collaborating. Limit to 3-4 sentences.",
        name = student.name,
        avg = student.average,
        high = subject(&student.highest),
        low = subject(&student.lowest),
    )
}

/// Tutor reply grounded in the student's marks and attendance.
pub fn tutor(student: &StudentOverview, question: &str) -> String {
    let marks: Vec<String> = student
        .subjects
        .iter()
        .map(|line| format!("{}: {}", line.subject, line.score))
        .collect();
    format!(
        "You are a friendly AI tutor. Based on the student's data and their question, provide a \
         helpful, concise response (3-5 sentences). Be encouraging.\n\n\
         Data: Student: {name}, Marks: {{{marks}}}, Attendance: {attendance}%.\n\
         Question: {question}",
        name = student.name,
        marks = marks.join(", "),
        attendance = student.attendance_rate,
        question = question.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::aggregate::AlertThresholds;
    use classroom_core::model::{
        HistoricalMarks, QuestionId, StudentId, StudentRecord, SubjectMarks,
    };

    fn overview(attendance: f64, marks: &[(&str, f64)]) -> StudentOverview {
        let record = StudentRecord::new(
            StudentId::new("S1").unwrap(),
            "Ana",
            "10A",
            attendance,
            SubjectMarks::from_pairs(marks.iter().copied()).unwrap(),
            HistoricalMarks::new(),
        )
        .unwrap();
        StudentOverview::from_record(&record, &AlertThresholds::default())
    }

    #[test]
    fn explanation_names_both_answers() {
        let result = AnswerResult {
            question_id: QuestionId::new(1),
            question: "2 + 2".into(),
            subject: "Math".into(),
            topic: "Arithmetic".into(),
            options: vec!["4".into(), "5".into()],
            chosen_option: "5".into(),
            correct_option: "4".into(),
            is_correct: false,
        };
        let prompt = explanation(&result);
        assert!(prompt.contains("incorrectly answered \"5\""));
        assert!(prompt.contains("why \"4\" is correct"));
    }

    #[test]
    fn support_uses_average_or_attendance() {
        assert!(needs_support(&overview(95.0, &[("Math", 65.0)])));
        assert!(needs_support(&overview(80.0, &[("Math", 95.0)])));
        assert!(!needs_support(&overview(95.0, &[("Math", 95.0)])));
        assert!(!needs_support(&overview(95.0, &[])));
    }

    #[test]
    fn tutor_prompt_carries_marks_and_question() {
        let student = overview(88.0, &[("Math", 72.0), ("Art", 90.0)]);
        let prompt = tutor(&student, "  How do I get better at fractions? ");
        assert!(prompt.contains("Marks: {Math: 72, Art: 90}, Attendance: 88%."));
        assert!(prompt.ends_with("Question: How do I get better at fractions?"));
    }

    #[test]
    fn class_prompt_lists_each_student() {
        let a = overview(80.0, &[("Math", 60.0), ("Science", 40.0)]);
        let prompt = class_suggestions(&[&a]);
        assert!(prompt.ends_with(
            "- Name: Ana, Avg Score: 50.0, Attendance: 80%, Lowest Subject: Science.\n"
        ));
    }
}
