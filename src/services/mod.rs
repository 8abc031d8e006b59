// src/services/mod.rs

pub mod acquisition;
pub mod entitlement;
pub mod fallback;
pub mod game;
pub mod plans;
pub mod provider;
pub mod quiz_session;
pub mod results;
pub mod sessions;
