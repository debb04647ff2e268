// src/lib.rs

//! NOTAM map engine: filter, cluster and render aviation notices.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod services;
pub mod storage;
