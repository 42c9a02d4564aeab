//! Shared test support: scripted transport and fixture builders.

pub mod utils;
