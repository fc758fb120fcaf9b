//! Request and response bodies

pub mod optimization;
