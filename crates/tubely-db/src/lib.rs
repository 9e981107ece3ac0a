//! Tubely Database Layer
//!
//! SQLite connection setup, embedded migrations and the video record repository.

pub mod db;

pub use db::{connect, VideoRepository};
