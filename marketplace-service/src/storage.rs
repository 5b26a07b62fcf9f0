use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use schema::{
    Assessment, AssessmentResult, Course, Enrollment, InsertAssessment, InsertAssessmentResult,
    InsertCourse, InsertEnrollment, InsertUser, User,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Uniform create/read operations over the marketplace entities, regardless
/// of backing store. Absence is `Ok(None)`, never an error.
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn get_user(&self, id: i64) -> Result<Option<User>, Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;
    async fn create_user(&self, user: InsertUser) -> Result<User, Error>;

    // Course operations
    async fn all_courses(&self) -> Result<Vec<Course>, Error>;
    async fn get_course(&self, id: i64) -> Result<Option<Course>, Error>;
    async fn create_course(&self, course: InsertCourse) -> Result<Course, Error>;

    // Assessment operations
    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, Error>;
    async fn get_assessment_by_course(&self, course_id: i64) -> Result<Option<Assessment>, Error>;
    async fn create_assessment(&self, assessment: InsertAssessment) -> Result<Assessment, Error>;

    // Assessment result operations
    async fn submit_result(
        &self,
        result: InsertAssessmentResult,
    ) -> Result<AssessmentResult, Error>;
    async fn results_for_user(&self, user_id: i64) -> Result<Vec<AssessmentResult>, Error>;

    // Enrollment operations
    async fn enroll(&self, enrollment: InsertEnrollment) -> Result<Enrollment, Error>;
    async fn enrollments_for_user(&self, user_id: i64) -> Result<Vec<Enrollment>, Error>;
    async fn update_enrollment_progress(
        &self,
        id: i64,
        progress: i64,
    ) -> Result<Option<Enrollment>, Error>;
}

const USER_COLLECTION: &str = "User";
const COURSE_COLLECTION: &str = "Course";
const ASSESSMENT_COLLECTION: &str = "Assessment";
const RESULT_COLLECTION: &str = "AssessmentResult";
const ENROLLMENT_COLLECTION: &str = "Enrollment";

/// Document-store backend.
pub struct MongoStorage {
    client: Client,
}

impl MongoStorage {
    /// Connects and pings the default database from the URI.
    pub async fn connect(uri: &str) -> mongodb::error::Result<Self> {
        let mut client_options = ClientOptions::parse(uri).await?;
        client_options.app_name = Some(env!("CARGO_CRATE_NAME").to_string());

        let client = Client::with_options(client_options)?;
        client
            .default_database()
            .expect("database needs to be defined in the URI")
            .run_command(doc! {"ping": 1})
            .await?;

        Ok(MongoStorage { client })
    }

    fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync + Serialize + DeserializeOwned,
    {
        self.client
            .default_database()
            .expect("database needs to be defined in the URI")
            .collection::<T>(name)
    }

    /// Ids are sequential per collection: one more than the current count.
    async fn next_id<T>(&self, name: &str) -> Result<i64, Error>
    where
        T: Send + Sync + Serialize + DeserializeOwned,
    {
        let count = self.collection::<T>(name).count_documents(doc! {}).await?;
        Ok(count as i64 + 1)
    }
}

#[async_trait]
impl Storage for MongoStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>, Error> {
        let user = self
            .collection::<User>(USER_COLLECTION)
            .find_one(doc! { "id": id })
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let user = self
            .collection::<User>(USER_COLLECTION)
            .find_one(doc! { "username": username })
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = self
            .collection::<User>(USER_COLLECTION)
            .find_one(doc! { "email": email })
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: InsertUser) -> Result<User, Error> {
        let user = User {
            id: self.next_id::<User>(USER_COLLECTION).await?,
            username: user.username,
            email: user.email,
            password: user.password,
            created_at: Utc::now(),
        };
        self.collection::<User>(USER_COLLECTION)
            .insert_one(&user)
            .await?;
        Ok(user)
    }

    async fn all_courses(&self) -> Result<Vec<Course>, Error> {
        let courses = self
            .collection::<Course>(COURSE_COLLECTION)
            .find(doc! {})
            .await?
            .try_collect()
            .await?;
        Ok(courses)
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>, Error> {
        let course = self
            .collection::<Course>(COURSE_COLLECTION)
            .find_one(doc! { "id": id })
            .await?;
        Ok(course)
    }

    async fn create_course(&self, course: InsertCourse) -> Result<Course, Error> {
        let course = Course {
            id: self.next_id::<Course>(COURSE_COLLECTION).await?,
            title: course.title,
            description: course.description,
            category: course.category,
            price: course.price,
            rating: course.rating,
            instructor: course.instructor,
            image_url: course.image_url,
            learning_points: course.learning_points,
            content: course.content,
            total_sections: course.total_sections,
            total_lectures: course.total_lectures,
            total_duration: course.total_duration,
            features: course.features,
            created_at: Utc::now(),
        };
        self.collection::<Course>(COURSE_COLLECTION)
            .insert_one(&course)
            .await?;
        Ok(course)
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, Error> {
        let assessment = self
            .collection::<Assessment>(ASSESSMENT_COLLECTION)
            .find_one(doc! { "id": id })
            .await?;
        Ok(assessment)
    }

    async fn get_assessment_by_course(&self, course_id: i64) -> Result<Option<Assessment>, Error> {
        let assessment = self
            .collection::<Assessment>(ASSESSMENT_COLLECTION)
            .find_one(doc! { "courseId": course_id })
            .await?;
        Ok(assessment)
    }

    async fn create_assessment(&self, assessment: InsertAssessment) -> Result<Assessment, Error> {
        let assessment = Assessment {
            id: self.next_id::<Assessment>(ASSESSMENT_COLLECTION).await?,
            course_id: assessment.course_id,
            title: assessment.title,
            description: assessment.description,
            time_limit: assessment.time_limit,
            passing_score: assessment.passing_score,
            questions: assessment.questions,
            created_at: Utc::now(),
        };
        self.collection::<Assessment>(ASSESSMENT_COLLECTION)
            .insert_one(&assessment)
            .await?;
        Ok(assessment)
    }

    async fn submit_result(
        &self,
        result: InsertAssessmentResult,
    ) -> Result<AssessmentResult, Error> {
        let result = AssessmentResult {
            id: self.next_id::<AssessmentResult>(RESULT_COLLECTION).await?,
            user_id: result.user_id,
            assessment_id: result.assessment_id,
            score: result.score,
            passed: result.passed,
            answers: result.answers,
            completed_at: Utc::now(),
        };
        self.collection::<AssessmentResult>(RESULT_COLLECTION)
            .insert_one(&result)
            .await?;
        Ok(result)
    }

    async fn results_for_user(&self, user_id: i64) -> Result<Vec<AssessmentResult>, Error> {
        let results = self
            .collection::<AssessmentResult>(RESULT_COLLECTION)
            .find(doc! { "userId": user_id })
            .await?
            .try_collect()
            .await?;
        Ok(results)
    }

    async fn enroll(&self, enrollment: InsertEnrollment) -> Result<Enrollment, Error> {
        let enrollment = Enrollment {
            id: self.next_id::<Enrollment>(ENROLLMENT_COLLECTION).await?,
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            enrolled_at: Utc::now(),
            completed: false,
            progress: 0,
        };
        self.collection::<Enrollment>(ENROLLMENT_COLLECTION)
            .insert_one(&enrollment)
            .await?;
        Ok(enrollment)
    }

    async fn enrollments_for_user(&self, user_id: i64) -> Result<Vec<Enrollment>, Error> {
        let enrollments = self
            .collection::<Enrollment>(ENROLLMENT_COLLECTION)
            .find(doc! { "userId": user_id })
            .await?
            .try_collect()
            .await?;
        Ok(enrollments)
    }

    async fn update_enrollment_progress(
        &self,
        id: i64,
        progress: i64,
    ) -> Result<Option<Enrollment>, Error> {
        let collection = self.collection::<Enrollment>(ENROLLMENT_COLLECTION);
        collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "progress": progress, "completed": progress == 100 } },
            )
            .await?;
        let enrollment = collection.find_one(doc! { "id": id }).await?;
        Ok(enrollment)
    }
}

/// Process-lifetime fallback backend. Each instance owns its own maps and
/// counters, so tests can construct isolated stores.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: HashMap<i64, User>,
    courses: HashMap<i64, Course>,
    assessments: HashMap<i64, Assessment>,
    results: HashMap<i64, AssessmentResult>,
    enrollments: HashMap<i64, Enrollment>,
    user_id_counter: i64,
    course_id_counter: i64,
    assessment_id_counter: i64,
    result_id_counter: i64,
    enrollment_id_counter: i64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().expect("memory storage lock poisoned")
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>, Error> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let inner = self.lock();
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let inner = self.lock();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: InsertUser) -> Result<User, Error> {
        let mut inner = self.lock();
        inner.user_id_counter += 1;
        let user = User {
            id: inner.user_id_counter,
            username: user.username,
            email: user.email,
            password: user.password,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn all_courses(&self) -> Result<Vec<Course>, Error> {
        Ok(self.lock().courses.values().cloned().collect())
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>, Error> {
        Ok(self.lock().courses.get(&id).cloned())
    }

    async fn create_course(&self, course: InsertCourse) -> Result<Course, Error> {
        let mut inner = self.lock();
        inner.course_id_counter += 1;
        let course = Course {
            id: inner.course_id_counter,
            title: course.title,
            description: course.description,
            category: course.category,
            price: course.price,
            rating: course.rating,
            instructor: course.instructor,
            image_url: course.image_url,
            learning_points: course.learning_points,
            content: course.content,
            total_sections: course.total_sections,
            total_lectures: course.total_lectures,
            total_duration: course.total_duration,
            features: course.features,
            created_at: Utc::now(),
        };
        inner.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, Error> {
        Ok(self.lock().assessments.get(&id).cloned())
    }

    async fn get_assessment_by_course(&self, course_id: i64) -> Result<Option<Assessment>, Error> {
        let inner = self.lock();
        Ok(inner
            .assessments
            .values()
            .find(|a| a.course_id == course_id)
            .cloned())
    }

    async fn create_assessment(&self, assessment: InsertAssessment) -> Result<Assessment, Error> {
        let mut inner = self.lock();
        inner.assessment_id_counter += 1;
        let assessment = Assessment {
            id: inner.assessment_id_counter,
            course_id: assessment.course_id,
            title: assessment.title,
            description: assessment.description,
            time_limit: assessment.time_limit,
            passing_score: assessment.passing_score,
            questions: assessment.questions,
            created_at: Utc::now(),
        };
        inner.assessments.insert(assessment.id, assessment.clone());
        Ok(assessment)
    }

    async fn submit_result(
        &self,
        result: InsertAssessmentResult,
    ) -> Result<AssessmentResult, Error> {
        let mut inner = self.lock();
        inner.result_id_counter += 1;
        let result = AssessmentResult {
            id: inner.result_id_counter,
            user_id: result.user_id,
            assessment_id: result.assessment_id,
            score: result.score,
            passed: result.passed,
            answers: result.answers,
            completed_at: Utc::now(),
        };
        inner.results.insert(result.id, result.clone());
        Ok(result)
    }

    async fn results_for_user(&self, user_id: i64) -> Result<Vec<AssessmentResult>, Error> {
        let inner = self.lock();
        Ok(inner
            .results
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn enroll(&self, enrollment: InsertEnrollment) -> Result<Enrollment, Error> {
        let mut inner = self.lock();
        inner.enrollment_id_counter += 1;
        let enrollment = Enrollment {
            id: inner.enrollment_id_counter,
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            enrolled_at: Utc::now(),
            completed: false,
            progress: 0,
        };
        inner.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    async fn enrollments_for_user(&self, user_id: i64) -> Result<Vec<Enrollment>, Error> {
        let inner = self.lock();
        Ok(inner
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_enrollment_progress(
        &self,
        id: i64,
        progress: i64,
    ) -> Result<Option<Enrollment>, Error> {
        let mut inner = self.lock();
        let Some(enrollment) = inner.enrollments.get_mut(&id) else {
            return Ok(None);
        };
        enrollment.progress = progress;
        enrollment.completed = progress == 100;
        Ok(Some(enrollment.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_user(name: &str) -> InsertUser {
        InsertUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn memory_ids_are_sequential_per_entity() {
        let storage = MemoryStorage::new();
        let first = storage.create_user(insert_user("alice")).await.unwrap();
        let second = storage.create_user(insert_user("bob")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let enrollment = storage
            .enroll(InsertEnrollment {
                user_id: first.id,
                course_id: 1,
            })
            .await
            .unwrap();
        assert_eq!(enrollment.id, 1, "counters are independent per entity");
    }

    #[tokio::test]
    async fn absence_is_none_not_an_error() {
        let storage = MemoryStorage::new();
        assert!(storage.get_user(99).await.unwrap().is_none());
        assert!(storage.get_course(99).await.unwrap().is_none());
        assert!(storage.get_assessment_by_course(99).await.unwrap().is_none());
        assert!(
            storage
                .update_enrollment_progress(99, 50)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn instances_are_isolated() {
        let a = MemoryStorage::new();
        let b = MemoryStorage::new();
        a.create_user(insert_user("alice")).await.unwrap();
        assert!(b.get_user_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn full_progress_marks_enrollment_completed() {
        let storage = MemoryStorage::new();
        let enrollment = storage
            .enroll(InsertEnrollment {
                user_id: 1,
                course_id: 1,
            })
            .await
            .unwrap();
        assert!(!enrollment.completed);

        let updated = storage
            .update_enrollment_progress(enrollment.id, 100)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.progress, 100);

        let partial = storage
            .update_enrollment_progress(enrollment.id, 40)
            .await
            .unwrap()
            .unwrap();
        assert!(!partial.completed);
    }
}
