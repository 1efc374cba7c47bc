// src/handlers/mod.rs

pub mod evaluation;
pub mod system;
