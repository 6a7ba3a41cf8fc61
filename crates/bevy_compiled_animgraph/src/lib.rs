//! # Bevy Compiled Animation Graph
//!
//! Runtime for animation graphs that are authored as a node graph, compiled into a flat array of
//! node definitions, and instantiated once per animated character.
//!
//! ## Pipeline
//!
//! 1. **Authoring.** Build a [`ToolsGraph`](core::compilation::ToolsGraph) out of tools nodes
//!    such as [`AnimationClipToolsNode`](builtin_nodes::clip_node::AnimationClipToolsNode) or
//!    [`SpeedScaleToolsNode`](builtin_nodes::speed_node::SpeedScaleToolsNode) and connect their
//!    input pins.
//! 2. **Compilation.** [`compile_graph`](core::compilation::compile_graph) walks the graph from
//!    the root, compiling each tools node at most once. Definitions land in post-order, so every
//!    node only references definitions with a lower index.
//! 3. **Instantiation.** [`GraphInstance::new`](core::instance::GraphInstance::new) turns every
//!    definition into a runtime node and resolves references into handles. Nodes that are
//!    referenced from several places are shared.
//! 4. **Playback.** Attach a [`GraphInstancePlayer`](plugin::GraphInstancePlayer) to an entity.
//!    The [`CompiledAnimationGraphPlugin`](plugin::CompiledAnimationGraphPlugin) advances it every
//!    frame.
//!
//! ## Runtime model
//!
//! Pose nodes have an explicit lifecycle: they are initialized at a sync track position,
//! updated (freely or synchronized to a sync track range), and shut down. Value nodes are
//! evaluated lazily while pose nodes update. Every update reports the range of sampled events it
//! produced, and the whole instance state can be recorded and restored.

pub use bevy_compiled_animgraph_builtin_nodes as builtin_nodes;
pub use bevy_compiled_animgraph_core as core;

pub mod plugin;

pub mod prelude {
    pub use super::builtin_nodes::{
        cached_value_node::*, clip_node::*, const_value_node::*, ragdoll::*, speed_node::*,
        state_conditions::*, velocity_speed_node::*,
    };
    pub use super::core::{
        animation_clip::AnimationClip,
        compilation::{CompilationSettings, ToolsGraph, compile_graph},
        definition::CompiledGraph,
        edge_data::{GraphValue, GraphValueType, events::SampledEvent},
        instance::GraphInstance,
        resources::{GraphDataSet, RagdollDefinition},
        settings::GraphRuntimeSettings,
        sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
    };
    pub use super::plugin::{CompiledAnimationGraphPlugin, GraphInstancePlayer};
}
