mod graph_context;
mod log;

pub use graph_context::*;
pub use log::*;
