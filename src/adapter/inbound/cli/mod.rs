//! CLI module graph.

pub mod banner;
pub mod command;
pub mod diagnostic;
pub mod observer;
pub mod output;
pub mod run;
