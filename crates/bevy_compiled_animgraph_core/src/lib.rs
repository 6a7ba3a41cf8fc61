pub mod animation_clip;
pub mod animation_node;
pub mod compilation;
pub mod context;
pub mod definition;
pub mod edge_data;
pub mod errors;
pub mod ids;
pub mod instance;
pub mod instantiation;
pub mod pose;
pub mod recording;
pub mod resources;
pub mod settings;
pub mod sync_track;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
