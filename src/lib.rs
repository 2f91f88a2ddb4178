#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod frame;
pub mod geometry;
pub mod import_data;
pub mod map_renderer;
pub mod pipeline;
pub mod speed_filter;
