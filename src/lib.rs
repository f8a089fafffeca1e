//! Inkpress - a blog platform with a JSON API and a server-rendered front-end
//!
//! This library provides the core functionality for both Inkpress binaries.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod web;
