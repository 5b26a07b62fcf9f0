//! Marketplace Entity Types
//!
//! Shared record definitions for the marketplace service and the assessment
//! logic crate. Ids are sequential integers assigned by the storage layer.
//! Serde renames match the camelCase wire format of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never returned over the wire. See [`UserPublic`].
    pub password: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsertUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A `User` with the password hash stripped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        UserPublic {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    pub instructor: Instructor,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "learningPoints")]
    pub learning_points: Vec<String>,
    pub content: Vec<CourseSection>,
    #[serde(rename = "totalSections")]
    pub total_sections: i64,
    #[serde(rename = "totalLectures")]
    pub total_lectures: i64,
    #[serde(rename = "totalDuration")]
    pub total_duration: String,
    pub features: CourseFeatures,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsertCourse {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    pub instructor: Instructor,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "learningPoints")]
    pub learning_points: Vec<String>,
    pub content: Vec<CourseSection>,
    #[serde(rename = "totalSections")]
    pub total_sections: i64,
    #[serde(rename = "totalLectures")]
    pub total_lectures: i64,
    #[serde(rename = "totalDuration")]
    pub total_duration: String,
    pub features: CourseFeatures,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instructor {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub rating: f64,
    pub reviews: i64,
    pub students: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseSection {
    #[serde(rename = "sectionTitle")]
    pub section_title: String,
    pub lectures: i64,
    pub duration: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseFeatures {
    #[serde(rename = "videoHours")]
    pub video_hours: String,
    pub articles: i64,
    pub exercises: i64,
    #[serde(rename = "hasDownloads")]
    pub has_downloads: bool,
    #[serde(rename = "hasCertificate")]
    pub has_certificate: bool,
    #[serde(rename = "hasLifetimeAccess")]
    pub has_lifetime_access: bool,
}

/// A timed multiple-choice quiz tied to one course. Immutable after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    #[serde(rename = "courseId")]
    pub course_id: i64,
    pub title: String,
    pub description: String,
    /// Time budget in minutes.
    #[serde(rename = "timeLimit")]
    pub time_limit: i64,
    /// Minimum percentage (0-100) required to pass.
    #[serde(rename = "passingScore")]
    pub passing_score: i64,
    pub questions: Vec<Question>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsertAssessment {
    #[serde(rename = "courseId")]
    pub course_id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "timeLimit")]
    pub time_limit: i64,
    #[serde(rename = "passingScore")]
    pub passing_score: i64,
    pub questions: Vec<Question>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    /// Unique within its assessment.
    pub id: String,
    #[serde(rename = "questionText")]
    pub question_text: String,
    /// Topic label for the per-category score breakdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub options: Vec<QuestionOption>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Unique within its question.
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// One submitted answer: the option a user picked for a question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSelection {
    #[serde(rename = "questionId")]
    pub question_id: String,
    #[serde(rename = "optionId")]
    pub option_id: String,
}

/// The persisted, immutable record of one completed (or timed-out)
/// submission. Repeat submissions create new records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "assessmentId")]
    pub assessment_id: i64,
    pub score: i64,
    pub passed: bool,
    pub answers: Vec<AnswerSelection>,
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsertAssessmentResult {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "assessmentId")]
    pub assessment_id: i64,
    pub score: i64,
    pub passed: bool,
    pub answers: Vec<AnswerSelection>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "courseId")]
    pub course_id: i64,
    #[serde(rename = "enrolledAt")]
    pub enrolled_at: DateTime<Utc>,
    pub completed: bool,
    pub progress: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsertEnrollment {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "courseId")]
    pub course_id: i64,
}
