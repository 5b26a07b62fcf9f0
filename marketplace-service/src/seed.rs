use anyhow::Context;
use schema::{
    CourseFeatures, CourseSection, InsertAssessment, InsertCourse, Instructor, Question,
    QuestionOption,
};
use tracing::info;

use crate::storage::Storage;

/// Seeds the demo catalog when the course collection is empty, and one
/// assessment per seeded course when none exists yet. Safe to run on every
/// startup.
#[tracing::instrument(skip_all, err(Debug))]
pub async fn ensure_seed_data(storage: &dyn Storage) -> anyhow::Result<()> {
    let courses = storage
        .all_courses()
        .await
        .context("unable to list courses")?;
    if courses.is_empty() {
        info!("Initializing courses...");
        for course in demo_courses() {
            storage
                .create_course(course)
                .await
                .context("unable to seed course")?;
        }
        info!("Courses initialized successfully.");
    }

    for assessment in demo_assessments() {
        let existing = storage
            .get_assessment_by_course(assessment.course_id)
            .await
            .context("unable to look up assessment for course")?;
        if existing.is_none() {
            storage
                .create_assessment(assessment)
                .await
                .context("unable to seed assessment")?;
        }
    }
    info!("Assessments initialized successfully.");

    Ok(())
}

fn demo_courses() -> Vec<InsertCourse> {
    vec![
        InsertCourse {
            title: "Web Development Masterclass".to_string(),
            description: "Master HTML, CSS, JavaScript, React and Node.js in this comprehensive course.".to_string(),
            category: "Programming".to_string(),
            price: 89.99,
            rating: 4.8,
            instructor: Instructor {
                name: "John Doe".to_string(),
                title: "Senior Web Developer & Instructor".to_string(),
                bio: "Web developer with 15+ years of experience specializing in frontend technologies.".to_string(),
                rating: 4.9,
                reviews: 1284,
                students: 12756,
            },
            image_url: "https://images.unsplash.com/photo-1498050108023-c5249f4df085".to_string(),
            learning_points: vec![
                "HTML5 semantic elements and structure".to_string(),
                "CSS layouts, Flexbox and Grid".to_string(),
                "JavaScript fundamentals and ES6+".to_string(),
                "React components and state management".to_string(),
                "Node.js and Express API development".to_string(),
            ],
            content: vec![
                CourseSection {
                    section_title: "Section 1: Introduction to Web Development".to_string(),
                    lectures: 4,
                    duration: "45 min".to_string(),
                },
                CourseSection {
                    section_title: "Section 2: HTML5 Fundamentals".to_string(),
                    lectures: 8,
                    duration: "1h 20min".to_string(),
                },
                CourseSection {
                    section_title: "Section 3: CSS Styling and Layout".to_string(),
                    lectures: 10,
                    duration: "2h 15min".to_string(),
                },
            ],
            total_sections: 18,
            total_lectures: 74,
            total_duration: "24h 45m".to_string(),
            features: CourseFeatures {
                video_hours: "24 hours".to_string(),
                articles: 15,
                exercises: 25,
                has_downloads: true,
                has_certificate: true,
                has_lifetime_access: true,
            },
        },
        InsertCourse {
            title: "Business Management Fundamentals".to_string(),
            description: "Learn essential business management skills and strategies for the modern workplace.".to_string(),
            category: "Business".to_string(),
            price: 74.99,
            rating: 4.6,
            instructor: Instructor {
                name: "Sarah Johnson".to_string(),
                title: "Business Consultant & MBA Professor".to_string(),
                bio: "Business strategist with 10+ years of consulting experience with Fortune 500 companies.".to_string(),
                rating: 4.8,
                reviews: 932,
                students: 8450,
            },
            image_url: "https://images.unsplash.com/photo-1522202176988-66273c2fd55f".to_string(),
            learning_points: vec![
                "Business strategy development".to_string(),
                "Team management and leadership skills".to_string(),
                "Financial planning and analysis".to_string(),
                "Project management methodologies".to_string(),
            ],
            content: vec![
                CourseSection {
                    section_title: "Section 1: Introduction to Business Management".to_string(),
                    lectures: 5,
                    duration: "1h 10min".to_string(),
                },
                CourseSection {
                    section_title: "Section 2: Leadership and Team Building".to_string(),
                    lectures: 7,
                    duration: "1h 45min".to_string(),
                },
            ],
            total_sections: 12,
            total_lectures: 48,
            total_duration: "15h 30m".to_string(),
            features: CourseFeatures {
                video_hours: "15 hours".to_string(),
                articles: 10,
                exercises: 18,
                has_downloads: true,
                has_certificate: true,
                has_lifetime_access: true,
            },
        },
    ]
}

fn demo_assessments() -> Vec<InsertAssessment> {
    vec![InsertAssessment {
        course_id: 1,
        title: "Web Development Masterclass Assessment".to_string(),
        description: "This assessment contains 10 multiple-choice questions to test your understanding of web development concepts.".to_string(),
        time_limit: 30,
        passing_score: 70,
        questions: vec![
            question(
                "q1",
                "Which of the following is NOT a valid way to declare a variable in JavaScript?",
                "JavaScript Fundamentals",
                &[
                    ("q1_a", "var myVariable = 5;", false),
                    ("q1_b", "let myVariable = 5;", false),
                    ("q1_c", "const myVariable = 5;", false),
                    ("q1_d", "variable myVariable = 5;", true),
                ],
            ),
            question(
                "q2",
                "What does CSS stand for?",
                "HTML & CSS",
                &[
                    ("q2_a", "Computer Style Sheets", false),
                    ("q2_b", "Creative Style Sheets", false),
                    ("q2_c", "Cascading Style Sheets", true),
                    ("q2_d", "Colorful Style Sheets", false),
                ],
            ),
            question(
                "q3",
                "Which HTML element is used to define a paragraph?",
                "HTML & CSS",
                &[
                    ("q3_a", "<paragraph>", false),
                    ("q3_b", "<p>", true),
                    ("q3_c", "<para>", false),
                    ("q3_d", "<pg>", false),
                ],
            ),
            question(
                "q4",
                "Which property is used to change the background color in CSS?",
                "HTML & CSS",
                &[
                    ("q4_a", "bgcolor", false),
                    ("q4_b", "background-color", true),
                    ("q4_c", "color-background", false),
                    ("q4_d", "background", false),
                ],
            ),
            question(
                "q5",
                "What is the correct way to create a function in JavaScript?",
                "JavaScript Fundamentals",
                &[
                    ("q5_a", "function = myFunction() {}", false),
                    ("q5_b", "function:myFunction() {}", false),
                    ("q5_c", "function myFunction() {}", true),
                    ("q5_d", "create function myFunction() {}", false),
                ],
            ),
            question(
                "q6",
                "Which CSS property is used to control the text size?",
                "HTML & CSS",
                &[
                    ("q6_a", "font-size", true),
                    ("q6_b", "text-size", false),
                    ("q6_c", "text-style", false),
                    ("q6_d", "font-style", false),
                ],
            ),
            question(
                "q7",
                "What does HTML stand for?",
                "HTML & CSS",
                &[
                    ("q7_a", "Hypertext Markup Language", true),
                    ("q7_b", "Hypertext Markdown Language", false),
                    ("q7_c", "Hyperloop Machine Language", false),
                    ("q7_d", "Home Tool Markup Language", false),
                ],
            ),
            question(
                "q8",
                "Which hook is used to manage state in a React function component?",
                "React Framework",
                &[
                    ("q8_a", "useEffect", false),
                    ("q8_b", "useState", true),
                    ("q8_c", "useContext", false),
                    ("q8_d", "useReducer", false),
                ],
            ),
            question(
                "q9",
                "Which HTTP method is conventionally used to create a resource in a REST API?",
                "Backend Development",
                &[
                    ("q9_a", "GET", false),
                    ("q9_b", "PUT", false),
                    ("q9_c", "POST", true),
                    ("q9_d", "DELETE", false),
                ],
            ),
            question(
                "q10",
                "Which of these is a NoSQL document database?",
                "Backend Development",
                &[
                    ("q10_a", "PostgreSQL", false),
                    ("q10_b", "MongoDB", true),
                    ("q10_c", "MySQL", false),
                    ("q10_d", "SQLite", false),
                ],
            ),
        ],
    }]
}

fn question(id: &str, text: &str, category: &str, options: &[(&str, &str, bool)]) -> Question {
    Question {
        id: id.to_string(),
        question_text: text.to_string(),
        category: Some(category.to_string()),
        options: options
            .iter()
            .map(|(id, text, correct)| QuestionOption {
                id: id.to_string(),
                text: text.to_string(),
                correct: *correct,
            })
            .collect(),
    }
}
