mod arena;
mod passthrough;

pub use arena::*;
pub use passthrough::*;

use std::{any::Any, fmt, marker::PhantomData, sync::Arc};

use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::{
    animation_clip::AnimationClip,
    context::GraphContext,
    edge_data::{GraphValue, GraphValueType, events::SampledEventRange},
    errors::RecordingError,
    ids::NodeIndex,
    pose::Pose,
    recording::{GraphStateReader, GraphStateRecorder},
    sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
};

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Reference-counted activation. A node shared by several parents is initialized by the first
/// one and shut down by the last one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeActivation {
    initialization_count: u32,
}

impl NodeActivation {
    pub fn is_initialized(&self) -> bool {
        self.initialization_count > 0
    }

    /// Returns true if this call performed the actual initialization.
    pub fn acquire(&mut self) -> bool {
        self.initialization_count += 1;
        self.initialization_count == 1
    }

    pub fn count(&self) -> u32 {
        self.initialization_count
    }

    /// Used when restoring recorded state.
    pub(crate) fn set_count(&mut self, initialization_count: u32) {
        self.initialization_count = initialization_count;
    }

    /// Returns true if this call released the last activation.
    pub fn release(&mut self) -> bool {
        assert!(
            self.initialization_count > 0,
            "shutdown called on a node that is not initialized"
        );
        self.initialization_count -= 1;
        self.initialization_count == 0
    }
}

/// Identity and activation state every runtime node carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeBase {
    pub node_index: NodeIndex,
    pub activation: NodeActivation,
}

impl NodeBase {
    pub fn new(node_index: NodeIndex) -> Self {
        Self {
            node_index,
            activation: NodeActivation::default(),
        }
    }
}

/// Operations shared by every runtime node.
pub trait GraphNode: AsAny + Send + Sync {
    fn node_base(&self) -> &NodeBase;
    fn node_base_mut(&mut self) -> &mut NodeBase;

    fn node_index(&self) -> NodeIndex {
        self.node_base().node_index
    }

    fn activation(&self) -> &NodeActivation {
        &self.node_base().activation
    }

    fn activation_mut(&mut self) -> &mut NodeActivation {
        &mut self.node_base_mut().activation
    }

    fn is_initialized(&self) -> bool {
        self.activation().is_initialized()
    }

    #[allow(unused_variables)]
    fn record_graph_state(&self, recorder: &mut GraphStateRecorder) -> Result<(), RecordingError> {
        Ok(())
    }

    /// Must read back exactly what [`GraphNode::record_graph_state`] wrote, in the same order.
    #[allow(unused_variables)]
    fn restore_graph_state(
        &mut self,
        reader: &mut GraphStateReader,
    ) -> Result<(), RecordingError> {
        Ok(())
    }
}

/// Playback position of a pose node. Only meaningful while the node is initialized.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseNodeTiming {
    /// Normalized
    pub previous_time: f32,
    /// Normalized
    pub current_time: f32,
    /// Seconds
    pub duration: f32,
    pub loop_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseNodeResult {
    pub pose: Option<Pose>,
    pub sampled_event_range: SampledEventRange,
}

impl PoseNodeResult {
    /// Result of a node with nothing to show for this frame.
    pub fn empty(ctx: &GraphContext) -> Self {
        Self {
            pose: None,
            sampled_event_range: SampledEventRange::empty_at(
                ctx.sampled_events.num_sampled_events(),
            ),
        }
    }
}

pub trait PoseNode: GraphNode {
    fn initialize_internal(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime);

    #[allow(unused_variables)]
    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {}

    /// Free-running update driven by `ctx.delta_time`.
    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult;

    /// Update locked to an externally supplied sync track range.
    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult;

    fn timing(&self) -> PoseNodeTiming;

    /// Rebuilds whatever the node mirrors or derives from its children (timing, validity, sync
    /// track) after a state restore. Runs children first, with a zero delta time; nodes must not
    /// advance anything here.
    #[allow(unused_variables)]
    fn refresh_from_children(&mut self, ctx: &mut GraphContext) {}

    fn is_valid(&self) -> bool {
        true
    }

    fn sync_track(&self) -> Arc<SyncTrack> {
        SyncTrack::default_track()
    }

    /// Whether this node plays a single animation clip directly.
    fn is_clip_reference(&self) -> bool {
        false
    }

    fn animation_clip(&self) -> Option<&Arc<AnimationClip>> {
        None
    }
}

pub trait ValueNode: GraphNode {
    fn value_type(&self) -> GraphValueType;

    #[allow(unused_variables)]
    fn initialize_internal(&mut self, ctx: &mut GraphContext) {}

    #[allow(unused_variables)]
    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {}

    fn get_value(&mut self, ctx: &mut GraphContext) -> GraphValue;
}

/// An instantiated node, as stored in the instance's arena.
pub enum RuntimeNode {
    Pose(Box<dyn PoseNode>),
    Value(Box<dyn ValueNode>),
}

impl RuntimeNode {
    pub fn pose(node: impl PoseNode + 'static) -> Self {
        Self::Pose(Box::new(node))
    }

    pub fn value(node: impl ValueNode + 'static) -> Self {
        Self::Value(Box::new(node))
    }

    pub fn as_graph_node(&self) -> &dyn GraphNode {
        match self {
            RuntimeNode::Pose(node) => node.as_ref(),
            RuntimeNode::Value(node) => node.as_ref(),
        }
    }

    pub fn as_graph_node_mut(&mut self) -> &mut dyn GraphNode {
        match self {
            RuntimeNode::Pose(node) => node.as_mut(),
            RuntimeNode::Value(node) => node.as_mut(),
        }
    }

    pub fn output_type(&self) -> GraphValueType {
        match self {
            RuntimeNode::Pose(_) => GraphValueType::Pose,
            RuntimeNode::Value(node) => node.value_type(),
        }
    }
}

impl fmt::Debug for RuntimeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeNode")
            .field("index", &self.as_graph_node().node_index())
            .field("output_type", &self.output_type())
            .finish()
    }
}

// --- Typed handles
// ----------------------------------------------------------------------------------------

/// Non-owning handle to a pose node inside the instance arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoseNodePtr {
    index: NodeIndex,
}

impl PoseNodePtr {
    pub(crate) fn new(index: NodeIndex) -> Self {
        Self { index }
    }

    pub fn index(self) -> NodeIndex {
        self.index
    }
}

/// Non-owning handle to a value node producing a `T`.
pub struct ValueNodePtr<T> {
    index: NodeIndex,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ValueNodePtr<T> {
    pub(crate) fn new(index: NodeIndex) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> NodeIndex {
        self.index
    }
}

impl<T> Clone for ValueNodePtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ValueNodePtr<T> {}

impl<T> PartialEq for ValueNodePtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> fmt::Debug for ValueNodePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueNodePtr").field(&self.index).finish()
    }
}
