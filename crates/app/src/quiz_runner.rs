use std::io::{self, BufRead, Write};

use services::{AiProxyClient, QuizSession};

use crate::prompts;

/// Drive `session` from line input until every drawn question is answered.
///
/// Options are picked by number or by their text. Wrong answers get an AI
/// explanation when the proxy is configured.
pub async fn run_quiz<R: BufRead, W: Write>(
    session: &mut QuizSession,
    input: &mut R,
    out: &mut W,
    ai: &AiProxyClient,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = session.drawn().len();
    while let Some(drawn) = session.current_question() {
        let options = drawn.options().to_vec();
        writeln!(
            out,
            "\nQuestion {}/{} [{}]",
            session.current_index() + 1,
            total,
            drawn.question().topic()
        )?;
        writeln!(out, "{}", drawn.question().text())?;
        for (i, option) in options.iter().enumerate() {
            writeln!(out, "  {}. {option}", i + 1)?;
        }

        let choice = loop {
            write!(out, "Your answer (1-{}): ", options.len())?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input ended before the quiz finished",
                )
                .into());
            }
            match pick_option(&options, &line) {
                Some(option) => break option,
                None => writeln!(out, "Pick a number between 1 and {}.", options.len())?,
            }
        };

        session.select_option(&choice)?;
        let result = session.submit_answer()?.clone();
        if result.is_correct {
            writeln!(out, "Correct!")?;
        } else {
            writeln!(
                out,
                "Incorrect. The correct answer is {}.",
                result.correct_option
            )?;
            if ai.enabled() {
                match ai.generate(&prompts::explanation(&result)).await {
                    Ok(text) => writeln!(out, "Why: {text}")?,
                    Err(err) => tracing::warn!(error = %err, "no explanation available"),
                }
            }
        }
        session.advance()?;
    }
    Ok(())
}

fn pick_option(options: &[String], line: &str) -> Option<String> {
    let line = line.trim();
    if let Ok(n) = line.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| options.get(i)).cloned();
    }
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(line))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{Question, QuestionId};
    use classroom_core::time::fixed_now;
    use services::QuizState;
    use std::io::Cursor;

    fn session() -> QuizSession {
        let bank = vec![
            Question::new(
                QuestionId::new(1),
                "Science",
                "Cells",
                "Powerhouse of the cell?",
                vec!["Mitochondria".into(), "Nucleus".into()],
                "Mitochondria",
            )
            .unwrap(),
        ];
        let mut session = QuizSession::new();
        session
            .start(&bank, "Science", 1, fixed_now(), &mut rand::rng())
            .unwrap();
        session
    }

    #[test]
    fn options_pick_by_number_or_text() {
        let options = vec!["180".to_string(), "Ninety".to_string()];
        assert_eq!(pick_option(&options, "1\n").as_deref(), Some("180"));
        assert_eq!(pick_option(&options, " ninety ").as_deref(), Some("Ninety"));
        assert_eq!(pick_option(&options, "0"), None);
        assert_eq!(pick_option(&options, "3"), None);
        assert_eq!(pick_option(&options, "maybe"), None);
    }

    #[tokio::test]
    async fn invalid_input_is_asked_again() {
        let mut session = session();
        let mut input = Cursor::new("7\nmitochondria\n");
        let mut out = Vec::new();
        run_quiz(&mut session, &mut input, &mut out, &AiProxyClient::new(None))
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Question 1/1 [Cells]"));
        assert!(text.contains("Pick a number between 1 and 2."));
        assert!(text.contains("Correct!"));
        assert_eq!(session.state(), QuizState::Finished);
    }

    #[tokio::test]
    async fn wrong_answer_shows_the_key() {
        let mut session = session();
        let mut input = Cursor::new("Nucleus\n");
        let mut out = Vec::new();
        run_quiz(&mut session, &mut input, &mut out, &AiProxyClient::new(None))
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Incorrect. The correct answer is Mitochondria."));
        assert!(!session.last_result().unwrap().is_correct);
    }

    #[tokio::test]
    async fn running_out_of_input_is_an_error() {
        let mut session = session();
        let mut out = Vec::new();
        let err = run_quiz(
            &mut session,
            &mut Cursor::new(""),
            &mut out,
            &AiProxyClient::new(None),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("input ended"));
        assert_eq!(session.state(), QuizState::InProgress);
    }
}
