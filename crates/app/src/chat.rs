use std::io::{BufRead, Write};

use services::{AiProxyClient, StudentOverview};

use crate::prompts;

const APOLOGY: &str = "Sorry, I couldn't get a response right now.";

fn is_exit(line: &str) -> bool {
    matches!(line, "quit" | "exit")
}

/// Answer the student's questions one line at a time until `quit` or end of input.
pub async fn run_chat<R: BufRead, W: Write>(
    student: &StudentOverview,
    input: &mut R,
    out: &mut W,
    ai: &AiProxyClient,
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(
        out,
        "Hi {}! Ask me anything about your studies. Type quit to leave.",
        student.name
    )?;
    loop {
        write!(out, "You: ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(());
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if is_exit(message) {
            return Ok(());
        }
        match ai.generate(&prompts::tutor(student, message)).await {
            Ok(reply) => writeln!(out, "Tutor: {}", reply.replace("**", ""))?,
            Err(err) => {
                tracing::warn!(error = %err, "tutor reply failed");
                writeln!(out, "Tutor: {APOLOGY}")?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::aggregate::AlertThresholds;
    use classroom_core::model::{HistoricalMarks, StudentId, StudentRecord, SubjectMarks};
    use std::io::Cursor;

    fn student() -> StudentOverview {
        let record = StudentRecord::new(
            StudentId::new("S001").unwrap(),
            "Ana Ruiz",
            "10A",
            92.0,
            SubjectMarks::from_pairs([("Math", 85.0)]).unwrap(),
            HistoricalMarks::new(),
        )
        .unwrap();
        StudentOverview::from_record(&record, &AlertThresholds::default())
    }

    async fn chat(script: &str) -> String {
        let mut out = Vec::new();
        run_chat(
            &student(),
            &mut Cursor::new(script.to_owned()),
            &mut out,
            &AiProxyClient::new(None),
        )
        .await
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn unavailable_tutor_apologises() {
        let text = chat("How do I revise for algebra?\n").await;
        assert!(text.starts_with("Hi Ana Ruiz!"));
        assert_eq!(text.matches(APOLOGY).count(), 1);
    }

    #[tokio::test]
    async fn blank_lines_are_skipped_and_quit_stops() {
        let text = chat("\n   \nquit\nnever asked\n").await;
        assert!(!text.contains("Tutor:"));
        assert_eq!(text.matches("You: ").count(), 3);
    }

    #[tokio::test]
    async fn end_of_input_ends_the_chat() {
        let text = chat("").await;
        assert!(text.ends_with("You: \n"));
    }
}
