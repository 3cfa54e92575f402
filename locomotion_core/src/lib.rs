//! Ambient core for the locomotion engine: logging, timers, the event
//! channel, the shared per-player context, orientation, and configuration.
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod events;
pub mod logging;
pub mod orientation;
pub mod timers;
