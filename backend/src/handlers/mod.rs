// src/handlers/mod.rs

pub mod admin;
pub mod analytics;
pub mod certifications;
pub mod favorites;
pub mod questions;
pub mod responses;
