// src/models/mod.rs

pub mod detection;
pub mod evaluation;
pub mod question;
