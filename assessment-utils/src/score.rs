use std::collections::HashMap;

use schema::{AnswerSelection, Assessment, Question};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Score breakdown returned to the client and used to build the persisted
/// result record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: i64,
    #[serde(rename = "totalQuestions")]
    pub total_questions: usize,
    #[serde(rename = "correctAnswers")]
    pub correct_answers: usize,
    pub passing: bool,
    #[serde(rename = "passingScore")]
    pub passing_score: i64,
    #[serde(rename = "categoryPerformance")]
    pub category_performance: Vec<CategoryPerformance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub score: i64,
    #[serde(rename = "correctAnswers")]
    pub correct_answers: usize,
    #[serde(rename = "totalQuestions")]
    pub total_questions: usize,
}

const DEFAULT_CATEGORY: &str = "General";

/// Calculates the submission score, and compares score >= passing_score.
///
/// The denominator is always the assessment's full question count, so a
/// partial (timed-out) answer set is scored rather than rejected; unanswered
/// questions simply count as incorrect. Selections naming unknown question
/// or option ids are skipped.
pub fn score_submission(assessment: &Assessment, answers: &[AnswerSelection]) -> ScoreReport {
    let selected = selected_by_question(assessment, answers);

    let total_questions = assessment.questions.len();
    let correct_answers = assessment
        .questions
        .iter()
        .filter(|q| is_correct(q, selected.get(q.id.as_str()).copied()))
        .count();

    let score = percent(correct_answers, total_questions);
    let passing = score >= assessment.passing_score;

    ScoreReport {
        score,
        total_questions,
        correct_answers,
        passing,
        passing_score: assessment.passing_score,
        category_performance: category_performance(assessment, &selected),
    }
}

/// Partitions questions by their category label and reports the same
/// correct/total ratio per partition, ordered by first appearance.
fn category_performance(
    assessment: &Assessment,
    selected: &HashMap<&str, &str>,
) -> Vec<CategoryPerformance> {
    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, (usize, usize)> = HashMap::new();

    for question in &assessment.questions {
        let category = question.category.as_deref().unwrap_or(DEFAULT_CATEGORY);
        let (correct, total) = tallies.entry(category).or_insert_with(|| {
            order.push(category);
            (0, 0)
        });
        *total += 1;
        if is_correct(question, selected.get(question.id.as_str()).copied()) {
            *correct += 1;
        }
    }

    order
        .into_iter()
        .map(|category| {
            let (correct_answers, total_questions) = tallies[category];
            CategoryPerformance {
                category: category.to_string(),
                score: percent(correct_answers, total_questions),
                correct_answers,
                total_questions,
            }
        })
        .collect()
}

/// Last selection per question wins; selections that reference no question
/// in the assessment are dropped.
fn selected_by_question<'a>(
    assessment: &'a Assessment,
    answers: &'a [AnswerSelection],
) -> HashMap<&'a str, &'a str> {
    let mut selected = HashMap::new();
    for answer in answers {
        let known = assessment
            .questions
            .iter()
            .any(|q| q.id == answer.question_id);
        if !known {
            warn!(
                question = %answer.question_id,
                assessment = assessment.id,
                "submitted answer references unknown question"
            );
            continue;
        }
        selected.insert(answer.question_id.as_str(), answer.option_id.as_str());
    }
    selected
}

fn is_correct(question: &Question, selected_option: Option<&str>) -> bool {
    let Some(option_id) = selected_option else {
        return false;
    };
    let Some(option) = question.options.iter().find(|o| o.id == option_id) else {
        warn!(
            question = %question.id,
            option = %option_id,
            "submitted answer references unknown option"
        );
        return false;
    };
    option.correct
}

fn percent(correct: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::QuestionOption;

    fn option(id: &str, correct: bool) -> QuestionOption {
        QuestionOption {
            id: id.to_string(),
            text: format!("option {id}"),
            correct,
        }
    }

    fn question(id: &str, category: Option<&str>) -> Question {
        Question {
            id: id.to_string(),
            question_text: format!("question {id}"),
            category: category.map(str::to_string),
            options: vec![
                option(&format!("{id}_a"), false),
                option(&format!("{id}_b"), true),
                option(&format!("{id}_c"), false),
            ],
        }
    }

    fn assessment(questions: Vec<Question>, passing_score: i64) -> Assessment {
        Assessment {
            id: 1,
            course_id: 1,
            title: "Test Assessment".to_string(),
            description: "ten questions".to_string(),
            time_limit: 30,
            passing_score,
            questions,
            created_at: chrono::Utc::now(),
        }
    }

    fn pick(question_id: &str, option_id: &str) -> AnswerSelection {
        AnswerSelection {
            question_id: question_id.to_string(),
            option_id: option_id.to_string(),
        }
    }

    #[test]
    fn eight_of_ten_correct_passes_at_seventy() {
        let questions: Vec<Question> =
            (1..=10).map(|n| question(&format!("q{n}"), None)).collect();
        let assessment = assessment(questions, 70);

        // Eight right answers, two wrong ones.
        let answers: Vec<AnswerSelection> = (1..=10)
            .map(|n| {
                let suffix = if n <= 8 { "b" } else { "a" };
                pick(&format!("q{n}"), &format!("q{n}_{suffix}"))
            })
            .collect();

        let report = score_submission(&assessment, &answers);
        assert_eq!(report.score, 80);
        assert_eq!(report.total_questions, 10);
        assert_eq!(report.correct_answers, 8);
        assert!(report.passing);
        assert_eq!(report.passing_score, 70);
    }

    #[test]
    fn partial_submission_is_scored_not_rejected() {
        let questions: Vec<Question> =
            (1..=10).map(|n| question(&format!("q{n}"), None)).collect();
        let assessment = assessment(questions, 70);

        // Only seven questions answered when time ran out, all correct.
        let answers: Vec<AnswerSelection> = (1..=7)
            .map(|n| pick(&format!("q{n}"), &format!("q{n}_b")))
            .collect();

        let report = score_submission(&assessment, &answers);
        assert_eq!(report.total_questions, 10);
        assert_eq!(report.correct_answers, 7);
        assert_eq!(report.score, 70);
        assert!(report.passing);
    }

    #[test]
    fn last_selection_for_a_question_wins() {
        let assessment = assessment(vec![question("q1", None)], 50);
        let answers = vec![pick("q1", "q1_b"), pick("q1", "q1_a")];

        let report = score_submission(&assessment, &answers);
        assert_eq!(report.correct_answers, 0);
        assert!(!report.passing);
    }

    #[test]
    fn unknown_question_and_option_ids_are_skipped() {
        let assessment = assessment(vec![question("q1", None)], 100);
        let answers = vec![pick("q9", "q9_b"), pick("q1", "nope"), pick("q1", "q1_b")];

        let report = score_submission(&assessment, &answers);
        assert_eq!(report.total_questions, 1);
        assert_eq!(report.correct_answers, 1);
        assert_eq!(report.score, 100);
    }

    #[test]
    fn score_rounds_to_nearest_percent() {
        let questions: Vec<Question> =
            (1..=3).map(|n| question(&format!("q{n}"), None)).collect();
        let assessment = assessment(questions, 60);
        let answers = vec![pick("q1", "q1_b"), pick("q2", "q2_b")];

        let report = score_submission(&assessment, &answers);
        // 2/3 = 66.66..% rounds to 67
        assert_eq!(report.score, 67);
        assert!(report.passing);
    }

    #[test]
    fn passing_is_inclusive_of_the_threshold() {
        let questions: Vec<Question> =
            (1..=10).map(|n| question(&format!("q{n}"), None)).collect();
        let assessment = assessment(questions, 70);
        let answers: Vec<AnswerSelection> = (1..=7)
            .map(|n| pick(&format!("q{n}"), &format!("q{n}_b")))
            .collect();

        let report = score_submission(&assessment, &answers);
        assert_eq!(report.score, 70);
        assert!(report.passing);
    }

    #[test]
    fn empty_assessment_scores_zero() {
        let assessment = assessment(vec![], 70);
        let report = score_submission(&assessment, &[]);
        assert_eq!(report.score, 0);
        assert_eq!(report.total_questions, 0);
        assert!(!report.passing);
        assert!(report.category_performance.is_empty());
    }

    #[test]
    fn categories_are_partitioned_in_first_appearance_order() {
        let questions = vec![
            question("q1", Some("HTML & CSS")),
            question("q2", Some("JavaScript")),
            question("q3", Some("HTML & CSS")),
            question("q4", None),
        ];
        let assessment = assessment(questions, 50);
        let answers = vec![
            pick("q1", "q1_b"),
            pick("q2", "q2_a"),
            pick("q3", "q3_b"),
            pick("q4", "q4_b"),
        ];

        let report = score_submission(&assessment, &answers);
        let categories: Vec<&str> = report
            .category_performance
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(categories, vec!["HTML & CSS", "JavaScript", "General"]);

        let html = &report.category_performance[0];
        assert_eq!(html.total_questions, 2);
        assert_eq!(html.correct_answers, 2);
        assert_eq!(html.score, 100);

        let js = &report.category_performance[1];
        assert_eq!(js.total_questions, 1);
        assert_eq!(js.correct_answers, 0);
        assert_eq!(js.score, 0);
    }
}
