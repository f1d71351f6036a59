//! Library exports for the song link resolver
//!
//! This module exposes internal components for testing and potential library usage.

pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod model;
pub mod renderer;
pub mod route;
pub mod service;
pub mod state;
pub mod store;
