use rand::Rng;
use rand::seq::SliceRandom;

use classroom_core::model::Question;

use crate::error::QuizError;

/// A question picked for an attempt, with the option order it is shown in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnQuestion {
    question: Question,
    options: Vec<String>,
}

impl DrawnQuestion {
    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Options in display order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

/// Selection result for a quiz build.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizPlan {
    pub subject: String,
    pub pool: Vec<Question>,
    pub drawn: Vec<DrawnQuestion>,
}

/// Draws the questions for one attempt from the full bank.
pub struct QuizBuilder<'a> {
    bank: &'a [Question],
    subject: &'a str,
    requested: usize,
}

impl<'a> QuizBuilder<'a> {
    #[must_use]
    pub fn new(bank: &'a [Question], subject: &'a str) -> Self {
        Self {
            bank,
            subject,
            requested: usize::MAX,
        }
    }

    /// Cap the number of questions drawn. Smaller pools yield fewer.
    #[must_use]
    pub fn with_count(mut self, requested: usize) -> Self {
        self.requested = requested;
        self
    }

    /// Filter the bank to the subject and sample without replacement.
    ///
    /// Question order and each question's option order are shuffled independently.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestionsAvailable` if no question matches the subject.
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Result<QuizPlan, QuizError> {
        let pool: Vec<Question> = self
            .bank
            .iter()
            .filter(|q| q.subject() == self.subject)
            .cloned()
            .collect();
        if pool.is_empty() {
            return Err(QuizError::NoQuestionsAvailable {
                subject: self.subject.to_owned(),
            });
        }

        let mut order: Vec<usize> = (0..pool.len()).collect();
        order.shuffle(rng);
        order.truncate(self.requested.min(pool.len()));

        let drawn = order
            .into_iter()
            .map(|idx| {
                let question = pool[idx].clone();
                let mut options = question.options().to_vec();
                options.shuffle(rng);
                DrawnQuestion { question, options }
            })
            .collect();

        Ok(QuizPlan {
            subject: self.subject.to_owned(),
            pool,
            drawn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::QuestionId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn question(id: u64, subject: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            subject,
            "Topic",
            format!("Question {id}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            "a",
        )
        .unwrap()
    }

    fn bank() -> Vec<Question> {
        vec![
            question(1, "Math"),
            question(2, "Science"),
            question(3, "Math"),
            question(4, "Math"),
            question(5, "Math"),
        ]
    }

    #[test]
    fn draws_without_replacement_from_the_subject_pool() {
        let bank = bank();
        let plan = QuizBuilder::new(&bank, "Math")
            .with_count(3)
            .build(&mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(plan.pool.len(), 4);
        assert_eq!(plan.drawn.len(), 3);
        let ids: HashSet<_> = plan.drawn.iter().map(|d| d.question().id()).collect();
        assert_eq!(ids.len(), 3);
        assert!(plan.drawn.iter().all(|d| d.question().subject() == "Math"));
    }

    #[test]
    fn request_larger_than_pool_draws_whole_pool() {
        let bank = bank();
        let plan = QuizBuilder::new(&bank, "Science")
            .with_count(3)
            .build(&mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(plan.drawn.len(), 1);
    }

    #[test]
    fn shuffled_options_are_a_permutation() {
        let bank = bank();
        let plan = QuizBuilder::new(&bank, "Math")
            .build(&mut StdRng::seed_from_u64(7))
            .unwrap();
        for drawn in &plan.drawn {
            let mut shown = drawn.options().to_vec();
            shown.sort();
            assert_eq!(shown, ["a", "b", "c", "d"]);
        }
    }

    #[test]
    fn same_seed_gives_same_plan() {
        let bank = bank();
        let a = QuizBuilder::new(&bank, "Math")
            .build(&mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = QuizBuilder::new(&bank, "Math")
            .build(&mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_question_order_is_reachable() {
        let bank = vec![question(1, "Math"), question(2, "Math"), question(3, "Math")];
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = HashSet::new();
        for _ in 0..300 {
            let plan = QuizBuilder::new(&bank, "Math").build(&mut rng).unwrap();
            let order: Vec<u64> = plan.drawn.iter().map(|d| d.question().id().value()).collect();
            seen.insert(order);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn every_option_order_is_reachable() {
        let bank = vec![
            Question::new(
                QuestionId::new(1),
                "Math",
                "Topic",
                "Pick one",
                vec!["a".into(), "b".into(), "c".into()],
                "a",
            )
            .unwrap(),
        ];
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        for _ in 0..300 {
            let plan = QuizBuilder::new(&bank, "Math").build(&mut rng).unwrap();
            seen.insert(plan.drawn[0].options().to_vec());
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn unknown_subject_has_no_questions() {
        let bank = bank();
        let err = QuizBuilder::new(&bank, "History")
            .build(&mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(
            err,
            QuizError::NoQuestionsAvailable {
                subject: "History".into()
            }
        );
    }
}
