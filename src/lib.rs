// src/lib.rs
//! Stateless job-posting extraction service: normalizes a request body, asks a
//! hosted language model for structured fields and validates what comes back.

pub mod cli;
pub mod core;
pub mod extraction;
pub mod normalizer;
pub mod utils;
pub mod web;

pub use web::{build_rocket, start_web_server};
