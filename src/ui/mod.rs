//! # UI Module
//!
//! Styling shared by the sidebar and the stats panel.

pub mod styles;
