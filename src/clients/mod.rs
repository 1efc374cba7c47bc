// src/clients/mod.rs

pub mod recognition;
pub mod results_api;
