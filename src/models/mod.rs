//! Database models and DTOs for all domain entities.

pub mod bank;
pub mod category;
pub mod extraction;
pub mod pattern;
pub mod transaction;
pub mod user;
