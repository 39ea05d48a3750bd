pub mod cache_steps;
pub mod field_group_steps;
pub mod submission_steps;
