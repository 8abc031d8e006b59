// src/models/mod.rs

pub mod draft;
pub mod mode;
pub mod question;
pub mod session;
pub mod usage;
