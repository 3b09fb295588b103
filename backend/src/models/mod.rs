// src/models/mod.rs

pub mod certification;
pub mod favorite;
pub mod question;
pub mod response;
pub mod section;
pub mod test;
