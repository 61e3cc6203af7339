//! Data model for theses and weekly reviews.

pub mod review;
pub mod thesis;
