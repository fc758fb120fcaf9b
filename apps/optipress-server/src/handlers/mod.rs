//! Request handlers

pub mod optimization;
