/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `assignments`: Batch course-assignment endpoint

pub mod assignments;
pub mod health;
