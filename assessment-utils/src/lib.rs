//! Assessment Utility Functions
//!
//! ## Current API
//!
//! - Score a submitted answer set against an assessment
//! - Drive a timed question-by-question session
//! - Validate submission payload shape
//!
pub mod score;
pub mod session;
pub mod submission;
