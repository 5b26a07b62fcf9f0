use std::collections::HashMap;

use schema::{AnswerSelection, Assessment};
use tracing::{debug, warn};

use crate::score::ScoreReport;

/// One user's in-progress traversal of an assessment's questions.
///
/// The machine holds no timer of its own: an external driver calls [`tick`]
/// once per second while the session is active. Every transition out of
/// `Active` stops the countdown, because `tick` becomes a no-op in any other
/// state.
///
/// [`tick`]: AssessmentSession::tick
#[derive(Debug)]
pub struct AssessmentSession {
    assessment: Assessment,
    state: SessionState,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Active {
        question_index: usize,
        answers: HashMap<String, String>,
        seconds_left: u64,
    },
    Submitting {
        answers: Vec<AnswerSelection>,
    },
    Completed {
        report: ScoreReport,
    },
    Failed {
        message: String,
    },
    Abandoned,
}

/// Outcome of one timer tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    /// Countdown is stopped; nothing to do.
    Idle,
    Running {
        seconds_left: u64,
    },
    /// Time ran out. The session moved to `Submitting` and the driver must
    /// send `answers` to the server, complete or partial.
    Expired {
        answers: Vec<AnswerSelection>,
    },
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SubmitRefusal {
    #[error("{count} questions are unanswered")]
    Unanswered { count: usize },
    #[error("submission is only allowed from the last question")]
    NotLastQuestion,
    #[error("session is not active")]
    NotActive,
}

impl AssessmentSession {
    /// Enters `Active` on the first question with a fresh answer set and the
    /// full time budget.
    pub fn start(assessment: Assessment) -> Self {
        let seconds_left = assessment.time_limit.max(0) as u64 * 60;
        AssessmentSession {
            assessment,
            state: SessionState::Active {
                question_index: 0,
                answers: HashMap::new(),
                seconds_left,
            },
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    /// Advances the countdown by one second. At the 1 -> 0 transition the
    /// session auto-submits exactly once, bypassing the unanswered check.
    pub fn tick(&mut self) -> Tick {
        let SessionState::Active { seconds_left, .. } = &mut self.state else {
            return Tick::Idle;
        };

        *seconds_left = seconds_left.saturating_sub(1);
        if *seconds_left > 0 {
            return Tick::Running {
                seconds_left: *seconds_left,
            };
        }

        debug!(assessment = self.assessment.id, "time expired, auto-submitting");
        let answers = self.collected_answers();
        self.state = SessionState::Submitting {
            answers: answers.clone(),
        };
        Tick::Expired { answers }
    }

    /// Records (or overwrites) the answer for a question. Does not advance
    /// the question index.
    pub fn answer(&mut self, question_id: &str, option_id: &str) {
        let valid = self
            .assessment
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .is_some_and(|q| q.options.iter().any(|o| o.id == option_id));
        if !valid {
            warn!(question = %question_id, option = %option_id, "ignoring unknown answer");
            return;
        }

        let SessionState::Active { answers, .. } = &mut self.state else {
            warn!("answer ignored: session is not active");
            return;
        };
        answers.insert(question_id.to_string(), option_id.to_string());
    }

    /// Moves to the next question, clamped to the last index. Requires the
    /// current question to have a recorded answer.
    pub fn next(&mut self) {
        let last_index = self.assessment.questions.len().saturating_sub(1);
        let SessionState::Active {
            question_index,
            answers,
            ..
        } = &mut self.state
        else {
            return;
        };

        let current_answered = self
            .assessment
            .questions
            .get(*question_index)
            .is_some_and(|q| answers.contains_key(&q.id));
        if current_answered && *question_index < last_index {
            *question_index += 1;
        }
    }

    /// Moves to the previous question, clamped to index 0.
    pub fn previous(&mut self) {
        if let SessionState::Active { question_index, .. } = &mut self.state {
            *question_index = question_index.saturating_sub(1);
        }
    }

    /// Manual submission, allowed only from the last question with every
    /// question answered. On refusal the session stays `Active`.
    pub fn submit(&mut self) -> Result<Vec<AnswerSelection>, SubmitRefusal> {
        let last_index = self.assessment.questions.len().saturating_sub(1);
        let SessionState::Active {
            question_index,
            answers,
            ..
        } = &self.state
        else {
            return Err(SubmitRefusal::NotActive);
        };

        if *question_index != last_index {
            return Err(SubmitRefusal::NotLastQuestion);
        }
        let unanswered = self
            .assessment
            .questions
            .iter()
            .filter(|q| !answers.contains_key(&q.id))
            .count();
        if unanswered > 0 {
            return Err(SubmitRefusal::Unanswered { count: unanswered });
        }

        let answers = self.collected_answers();
        self.state = SessionState::Submitting {
            answers: answers.clone(),
        };
        Ok(answers)
    }

    /// Delivers the server's score report. Ignored unless the session is
    /// `Submitting`; in particular a late result cannot apply after
    /// [`abandon`](AssessmentSession::abandon).
    pub fn complete(&mut self, report: ScoreReport) {
        match self.state {
            SessionState::Submitting { .. } => {
                self.state = SessionState::Completed { report };
            }
            _ => debug!("discarding score report: session is not submitting"),
        }
    }

    /// Delivers a submission failure. The message is shown to the caller,
    /// who may start a fresh submission; there is no automatic retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        match self.state {
            SessionState::Submitting { .. } => {
                self.state = SessionState::Failed {
                    message: message.into(),
                };
            }
            _ => debug!("discarding submission failure: session is not submitting"),
        }
    }

    /// Leaves the session. Stops the countdown and makes any in-flight
    /// submission result undeliverable.
    pub fn abandon(&mut self) {
        match self.state {
            SessionState::Completed { .. } | SessionState::Failed { .. } => {}
            _ => self.state = SessionState::Abandoned,
        }
    }

    pub fn unanswered_count(&self) -> usize {
        match &self.state {
            SessionState::Active { answers, .. } => self
                .assessment
                .questions
                .iter()
                .filter(|q| !answers.contains_key(&q.id))
                .count(),
            _ => 0,
        }
    }

    /// Remaining time as MM:SS.
    pub fn remaining_display(&self) -> String {
        let seconds = match &self.state {
            SessionState::Active { seconds_left, .. } => *seconds_left,
            _ => 0,
        };
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }

    /// How far through the question list the user is, as a percentage.
    pub fn progress_percent(&self) -> f64 {
        let total = self.assessment.questions.len();
        if total == 0 {
            return 0.0;
        }
        match &self.state {
            SessionState::Active { question_index, .. } => {
                ((question_index + 1) as f64 / total as f64) * 100.0
            }
            _ => 100.0,
        }
    }

    /// Answers in assessment question order.
    fn collected_answers(&self) -> Vec<AnswerSelection> {
        let SessionState::Active { answers, .. } = &self.state else {
            return Vec::new();
        };
        self.assessment
            .questions
            .iter()
            .filter_map(|q| {
                answers.get(&q.id).map(|option_id| AnswerSelection {
                    question_id: q.id.clone(),
                    option_id: option_id.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{Question, QuestionOption};

    fn assessment(question_count: usize, time_limit: i64) -> Assessment {
        let questions = (1..=question_count)
            .map(|n| Question {
                id: format!("q{n}"),
                question_text: format!("question {n}"),
                category: None,
                options: vec![
                    QuestionOption {
                        id: format!("q{n}_a"),
                        text: "a".to_string(),
                        correct: false,
                    },
                    QuestionOption {
                        id: format!("q{n}_b"),
                        text: "b".to_string(),
                        correct: true,
                    },
                ],
            })
            .collect();
        Assessment {
            id: 1,
            course_id: 1,
            title: "Session Test".to_string(),
            description: String::new(),
            time_limit,
            passing_score: 70,
            questions,
            created_at: chrono::Utc::now(),
        }
    }

    fn index(session: &AssessmentSession) -> usize {
        match session.state() {
            SessionState::Active { question_index, .. } => *question_index,
            state => panic!("expected active state, got {state:?}"),
        }
    }

    #[test]
    fn starts_on_first_question_with_full_time_budget() {
        let session = AssessmentSession::start(assessment(3, 30));
        match session.state() {
            SessionState::Active {
                question_index,
                answers,
                seconds_left,
            } => {
                assert_eq!(*question_index, 0);
                assert!(answers.is_empty());
                assert_eq!(*seconds_left, 30 * 60);
            }
            state => panic!("expected active state, got {state:?}"),
        }
        assert_eq!(session.remaining_display(), "30:00");
    }

    #[test]
    fn answer_overwrites_without_advancing() {
        let mut session = AssessmentSession::start(assessment(3, 30));
        session.answer("q1", "q1_a");
        session.answer("q1", "q1_b");
        assert_eq!(index(&session), 0);
        match session.state() {
            SessionState::Active { answers, .. } => {
                assert_eq!(answers.get("q1").map(String::as_str), Some("q1_b"));
                assert_eq!(answers.len(), 1);
            }
            state => panic!("expected active state, got {state:?}"),
        }
    }

    #[test]
    fn next_requires_an_answer_and_clamps_at_last_index() {
        let mut session = AssessmentSession::start(assessment(2, 30));

        session.next();
        assert_eq!(index(&session), 0, "next without an answer is a no-op");

        session.answer("q1", "q1_a");
        session.next();
        assert_eq!(index(&session), 1);

        session.answer("q2", "q2_a");
        session.next();
        assert_eq!(index(&session), 1, "next past the last question is a no-op");
    }

    #[test]
    fn previous_clamps_at_zero() {
        let mut session = AssessmentSession::start(assessment(2, 30));
        session.previous();
        assert_eq!(index(&session), 0);
    }

    #[test]
    fn manual_submit_refuses_while_questions_are_unanswered() {
        let mut session = AssessmentSession::start(assessment(3, 30));
        session.answer("q1", "q1_a");
        session.next();
        session.answer("q2", "q2_b");
        session.next();

        let refusal = session.submit().unwrap_err();
        assert_eq!(refusal, SubmitRefusal::Unanswered { count: 1 });
        assert!(
            matches!(session.state(), SessionState::Active { .. }),
            "refused submission keeps the session active"
        );
        assert_eq!(session.unanswered_count(), 1);
    }

    #[test]
    fn manual_submit_requires_last_question() {
        let mut session = AssessmentSession::start(assessment(2, 30));
        session.answer("q1", "q1_a");
        session.answer("q2", "q2_a");
        assert_eq!(session.submit().unwrap_err(), SubmitRefusal::NotLastQuestion);
    }

    #[test]
    fn manual_submit_yields_answers_in_question_order() {
        let mut session = AssessmentSession::start(assessment(2, 30));
        session.answer("q2", "q2_b");
        session.answer("q1", "q1_a");
        session.next();

        let answers = session.submit().unwrap();
        let ids: Vec<&str> = answers.iter().map(|a| a.question_id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2"]);
        assert!(matches!(session.state(), SessionState::Submitting { .. }));
    }

    #[test]
    fn timer_expiry_submits_partial_answers_exactly_once() {
        let mut session = AssessmentSession::start(assessment(3, 30));
        session.answer("q1", "q1_a");

        // Burn down to the final second.
        for _ in 0..(30 * 60 - 1) {
            assert!(matches!(session.tick(), Tick::Running { .. }));
        }

        match session.tick() {
            Tick::Expired { answers } => {
                assert_eq!(answers.len(), 1, "partial answer set is submitted as-is");
            }
            tick => panic!("expected expiry, got {tick:?}"),
        }
        assert!(matches!(session.state(), SessionState::Submitting { .. }));

        // The countdown is cancelled; no second submission fires.
        assert_eq!(session.tick(), Tick::Idle);
    }

    #[test]
    fn completion_and_failure_resolve_a_submission() {
        let mut session = AssessmentSession::start(assessment(1, 30));
        session.answer("q1", "q1_b");
        let answers = session.submit().unwrap();
        assert_eq!(answers.len(), 1);

        session.fail("network unreachable");
        match session.state() {
            SessionState::Failed { message } => assert_eq!(message, "network unreachable"),
            state => panic!("expected failed state, got {state:?}"),
        }
    }

    #[test]
    fn late_results_cannot_apply_after_abandonment() {
        let mut session = AssessmentSession::start(assessment(1, 30));
        session.answer("q1", "q1_b");
        session.submit().unwrap();
        session.abandon();

        session.complete(crate::score::score_submission(
            session.assessment(),
            &[AnswerSelection {
                question_id: "q1".to_string(),
                option_id: "q1_b".to_string(),
            }],
        ));
        assert_eq!(*session.state(), SessionState::Abandoned);
        assert_eq!(session.tick(), Tick::Idle);
    }

    #[test]
    fn abandonment_stops_the_countdown() {
        let mut session = AssessmentSession::start(assessment(2, 30));
        session.abandon();
        assert_eq!(session.tick(), Tick::Idle);
        assert_eq!(*session.state(), SessionState::Abandoned);
    }

    #[test]
    fn progress_and_time_formatting() {
        let mut session = AssessmentSession::start(assessment(4, 1));
        assert_eq!(session.progress_percent(), 25.0);
        assert_eq!(session.remaining_display(), "01:00");
        session.tick();
        assert_eq!(session.remaining_display(), "00:59");
    }
}
