//! Charagen - Layered pixel-art character generator
//!
//! This library provides functionality to:
//! - Draw one part per layer from weighted catalogs, plus a hair hue
//! - Composite the layers into a sprite with a synthesized outline
//! - Score and grade each draw by rarity
//! - Present, export and count generated characters

pub mod assets;
pub mod catalog;
pub mod cli;
pub mod color;
pub mod composition;
pub mod config;
pub mod generator;
pub mod outline;
pub mod output;
pub mod rarity;
pub mod select;
pub mod stats;
