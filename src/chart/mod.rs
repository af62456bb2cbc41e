//! Chart layer
//!
//! Turns labels and datasets into kind specific chart configurations and keeps
//! track of the chart drawn on each target of a surface.

pub mod config;
pub mod echarts;
pub mod factory;
pub mod registry;
pub mod spec;
