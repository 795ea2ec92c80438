//! SQLite schema for the team skills database
//!
//! The tracker application owns these tables; the query service only reads
//! them. The schema is kept here so an empty database can be bootstrapped.

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create the complete schema
///
/// Includes:
/// - Schema version tracking table
/// - users, skill_categories, skills
/// - user_skills (one rating per user and skill)
/// - Lookup indexes for the join columns
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Tables every query relies on
pub const REQUIRED_TABLES: &[&str] = &["users", "skill_categories", "skills", "user_skills"];
