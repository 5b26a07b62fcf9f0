//! Shape validation for the auth and enrollment request bodies, producing
//! the same structured field errors as the submission validator.

use assessment_utils::submission::ValidationIssue;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnrollPayload {
    pub user_id: i64,
    pub course_id: i64,
}

pub fn parse_register(body: &Value) -> Result<RegisterPayload, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let Some(object) = body.as_object() else {
        return Err(vec![ValidationIssue::new("", "expected a JSON object")]);
    };

    let username = string_field(object, "username", 3, &mut issues);
    let email = string_field(object, "email", 1, &mut issues);
    let password = string_field(object, "password", 6, &mut issues);

    if let Some(email) = &email {
        // Same lightweight shape check the original registration performed.
        let well_formed = email.contains('@') && email.rsplit('@').next().is_some_and(|d| d.contains('.'));
        if !well_formed {
            issues.push(ValidationIssue::new("email", "expected a valid email address"));
        }
    }

    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(RegisterPayload {
        username: username.expect("present when no issues were collected"),
        email: email.expect("present when no issues were collected"),
        password: password.expect("present when no issues were collected"),
    })
}

pub fn parse_login(body: &Value) -> Result<LoginPayload, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let Some(object) = body.as_object() else {
        return Err(vec![ValidationIssue::new("", "expected a JSON object")]);
    };

    let username = string_field(object, "username", 3, &mut issues);
    let password = string_field(object, "password", 6, &mut issues);

    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(LoginPayload {
        username: username.expect("present when no issues were collected"),
        password: password.expect("present when no issues were collected"),
    })
}

pub fn parse_enroll(body: &Value) -> Result<EnrollPayload, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let Some(object) = body.as_object() else {
        return Err(vec![ValidationIssue::new("", "expected a JSON object")]);
    };

    let user_id = number_field(object, "userId", &mut issues);
    let course_id = number_field(object, "courseId", &mut issues);

    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(EnrollPayload {
        user_id: user_id.expect("present when no issues were collected"),
        course_id: course_id.expect("present when no issues were collected"),
    })
}

fn string_field(
    object: &serde_json::Map<String, Value>,
    name: &str,
    min_len: usize,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match object.get(name) {
        Some(Value::String(s)) if s.len() >= min_len => Some(s.clone()),
        Some(Value::String(_)) => {
            issues.push(ValidationIssue::new(
                name,
                format!("expected at least {min_len} characters"),
            ));
            None
        }
        Some(_) => {
            issues.push(ValidationIssue::new(name, "expected a string"));
            None
        }
        None => {
            issues.push(ValidationIssue::new(name, "required"));
            None
        }
    }
}

fn number_field(
    object: &serde_json::Map<String, Value>,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<i64> {
    match object.get(name) {
        Some(value) => match value.as_i64() {
            Some(n) => Some(n),
            None => {
                issues.push(ValidationIssue::new(name, "expected a number"));
                None
            }
        },
        None => {
            issues.push(ValidationIssue::new(name, "required"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_accepts_a_valid_body() {
        let body = json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret1"
        });
        let payload = parse_register(&body).unwrap();
        assert_eq!(payload.username, "alice");
    }

    #[test]
    fn register_reports_all_problems() {
        let body = json!({ "username": "al", "email": "not-an-email", "password": 7 });
        let issues = parse_register(&body).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["username", "password", "email"]);
    }

    #[test]
    fn login_requires_minimum_lengths() {
        let body = json!({ "username": "bob", "password": "short" });
        let issues = parse_login(&body).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "password");
    }

    #[test]
    fn enroll_requires_numeric_ids() {
        let body = json!({ "userId": "1", "courseId": 2 });
        let issues = parse_enroll(&body).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "userId");
    }
}
