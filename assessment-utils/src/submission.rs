use schema::AnswerSelection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The submission has no session auth; absent a `userId` the record is
/// attributed to the demo user.
pub const DEFAULT_USER_ID: i64 = 1;

/// A validated submit-assessment payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "assessmentId")]
    pub assessment_id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub answers: Vec<AnswerSelection>,
}

/// One field-level problem with a request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validates the shape of a raw submit-assessment body.
///
/// All issues are collected rather than failing on the first, so a 400
/// response can report every bad field at once.
pub fn parse_submission(body: &Value) -> Result<Submission, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let Some(object) = body.as_object() else {
        return Err(vec![ValidationIssue::new("", "expected a JSON object")]);
    };

    let assessment_id = match object.get("assessmentId") {
        Some(value) => match value.as_i64() {
            Some(id) => Some(id),
            None => {
                issues.push(ValidationIssue::new("assessmentId", "expected a number"));
                None
            }
        },
        None => {
            issues.push(ValidationIssue::new("assessmentId", "required"));
            None
        }
    };

    let user_id = match object.get("userId") {
        Some(value) => match value.as_i64() {
            Some(id) => id,
            None => {
                issues.push(ValidationIssue::new("userId", "expected a number"));
                DEFAULT_USER_ID
            }
        },
        None => DEFAULT_USER_ID,
    };

    let answers = match object.get("answers") {
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| parse_answer(i, entry, &mut issues))
            .collect(),
        Some(_) => {
            issues.push(ValidationIssue::new("answers", "expected an array"));
            Vec::new()
        }
        None => {
            issues.push(ValidationIssue::new("answers", "required"));
            Vec::new()
        }
    };

    if !issues.is_empty() {
        return Err(issues);
    }

    Ok(Submission {
        assessment_id: assessment_id.expect("present when no issues were collected"),
        user_id,
        answers,
    })
}

fn parse_answer(
    index: usize,
    entry: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<AnswerSelection> {
    let Some(object) = entry.as_object() else {
        issues.push(ValidationIssue::new(
            format!("answers[{index}]"),
            "expected an object",
        ));
        return None;
    };

    let mut string_field = |name: &str| match object.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("answers[{index}].{name}"),
                "expected a string",
            ));
            None
        }
        None => {
            issues.push(ValidationIssue::new(
                format!("answers[{index}].{name}"),
                "required",
            ));
            None
        }
    };

    let question_id = string_field("questionId");
    let option_id = string_field("optionId");
    Some(AnswerSelection {
        question_id: question_id?,
        option_id: option_id?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_a_well_formed_payload() {
        let body = json!({
            "assessmentId": 3,
            "answers": [
                { "questionId": "q1", "optionId": "q1_b" },
                { "questionId": "q2", "optionId": "q2_c" }
            ]
        });

        let submission = parse_submission(&body).unwrap();
        assert_eq!(submission.assessment_id, 3);
        assert_eq!(submission.user_id, DEFAULT_USER_ID);
        assert_eq!(submission.answers.len(), 2);
        assert_eq!(submission.answers[0].question_id, "q1");
    }

    #[test]
    fn explicit_user_id_is_honored() {
        let body = json!({ "assessmentId": 1, "userId": 42, "answers": [] });
        let submission = parse_submission(&body).unwrap();
        assert_eq!(submission.user_id, 42);
    }

    #[test]
    fn rejects_non_array_answers() {
        let body = json!({ "assessmentId": 1, "answers": "not-an-array" });
        let issues = parse_submission(&body).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "answers");
        assert_eq!(issues[0].message, "expected an array");
    }

    #[test]
    fn collects_every_issue() {
        let body = json!({
            "assessmentId": "one",
            "answers": [
                { "questionId": "q1" },
                { "questionId": 7, "optionId": "q2_a" }
            ]
        });

        let issues = parse_submission(&body).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["assessmentId", "answers[0].optionId", "answers[1].questionId"]
        );
    }

    #[test]
    fn missing_fields_are_reported() {
        let body = json!({});
        let issues = parse_submission(&body).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["assessmentId", "answers"]);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let issues = parse_submission(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(issues[0].message, "expected a JSON object");
    }
}
