//! Business logic services.

pub mod auth;
pub mod batch;
pub mod category;
pub mod extraction;
pub mod normalize;
pub mod pattern;
pub mod transaction;
