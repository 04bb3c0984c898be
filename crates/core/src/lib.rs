//! Core library: scanning, stability gating, change detection, invocation and the poll loop.

pub mod config;
pub mod detector;
pub mod invoker;
pub mod models;
pub mod pipeline;
pub mod relocate;
pub mod scanner;
pub mod stability;
