use assessment_utils::score::score_submission;
use assessment_utils::submission::parse_submission;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use schema::{InsertAssessmentResult, InsertEnrollment, InsertUser, UserPublic};
use serde_json::{Value, json};
use tracing::info;

use crate::config::AppState;
use crate::error::Error;
use crate::validation::{parse_enroll, parse_login, parse_register};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status/ping", get(get_status_ping))
        .route("/api/register", post(post_register))
        .route("/api/login", post(post_login))
        .route("/api/courses", get(get_courses))
        .route("/api/courses/{id}", get(get_course))
        .route("/api/assessments/{course_id}", get(get_assessment_by_course))
        .route("/api/submit-assessment", post(post_submit_assessment))
        .route("/api/enroll", post(post_enroll))
        .route("/api/users/{user_id}/enrollments", get(get_user_enrollments))
        .route("/api/users/{user_id}/results", get(get_user_results))
        .with_state(state)
}

pub async fn get_status_ping() -> impl IntoResponse {
    info!("Status");
    StatusCode::OK
}

pub async fn post_register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, Error> {
    let payload = parse_register(&body).map_err(Error::Validation)?;

    if state
        .storage
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(Error::BadRequest("Username already exists".to_string()));
    }
    if state
        .storage
        .get_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(Error::BadRequest("Email already exists".to_string()));
    }

    let hashed_password = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)?;
    let user = state
        .storage
        .create_user(InsertUser {
            username: payload.username,
            email: payload.email,
            password: hashed_password,
        })
        .await?;
    info!(user = user.id, "registered user");

    Ok((StatusCode::CREATED, Json(UserPublic::from(user))))
}

pub async fn post_login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, Error> {
    let payload = parse_login(&body).map_err(Error::Validation)?;

    // The same response for a missing user and a wrong password, so a caller
    // cannot probe which usernames exist.
    let invalid = || Error::Unauthorized("Invalid username or password".to_string());

    let user = state
        .storage
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_else(invalid)?;
    if !bcrypt::verify(&payload.password, &user.password)? {
        return Err(invalid());
    }

    Ok(Json(json!({
        "user": UserPublic::from(user),
        "message": "Login successful"
    })))
}

pub async fn get_courses(State(state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let courses = state.storage.all_courses().await?;
    Ok(Json(courses))
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let course = state
        .storage
        .get_course(id)
        .await?
        .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;
    Ok(Json(course))
}

pub async fn get_assessment_by_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let assessment = state
        .storage
        .get_assessment_by_course(course_id)
        .await?
        .ok_or_else(|| Error::NotFound("Assessment not found for this course".to_string()))?;
    Ok(Json(assessment))
}

/// Scores a submitted answer set and persists one result record. Partial
/// answer sets (timed-out sessions) are accepted; completeness is only
/// enforced client-side on the manual submit path.
pub async fn post_submit_assessment(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, Error> {
    let submission = parse_submission(&body).map_err(Error::Validation)?;

    let assessment = state
        .storage
        .get_assessment(submission.assessment_id)
        .await?
        .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))?;

    let report = score_submission(&assessment, &submission.answers);

    // Every submission creates a fresh record; prior attempts are kept.
    let result = state
        .storage
        .submit_result(InsertAssessmentResult {
            user_id: submission.user_id,
            assessment_id: assessment.id,
            score: report.score,
            passed: report.passing,
            answers: submission.answers,
        })
        .await?;
    info!(
        result = result.id,
        assessment = assessment.id,
        score = report.score,
        passing = report.passing,
        "assessment submitted"
    );

    Ok(Json(report))
}

pub async fn post_enroll(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, Error> {
    let payload = parse_enroll(&body).map_err(Error::Validation)?;

    state
        .storage
        .get_user(payload.user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    state
        .storage
        .get_course(payload.course_id)
        .await?
        .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;

    let enrollments = state.storage.enrollments_for_user(payload.user_id).await?;
    if enrollments.iter().any(|e| e.course_id == payload.course_id) {
        return Err(Error::BadRequest(
            "User is already enrolled in this course".to_string(),
        ));
    }

    let enrollment = state
        .storage
        .enroll(InsertEnrollment {
            user_id: payload.user_id,
            course_id: payload.course_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "enrollment": enrollment,
            "message": "Successfully enrolled in the course"
        })),
    ))
}

pub async fn get_user_enrollments(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let enrollments = state.storage.enrollments_for_user(user_id).await?;
    Ok(Json(enrollments))
}

pub async fn get_user_results(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let results = state.storage.results_for_user(user_id).await?;
    Ok(Json(results))
}
