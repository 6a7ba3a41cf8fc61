use std::{
    fmt,
    ops::{Deref, DerefMut},
};

use crate::{
    animation_node::{
        NodeArena, PoseNode, PoseNodePtr, PoseNodeResult, PoseNodeTiming, RuntimeNode,
        ValueNodePtr,
    },
    context::GraphLogSink,
    edge_data::{GraphValue, GraphValueKind, events::SampledEventsBuffer},
    ids::NodeIndex,
    sync_track::{SyncTrackTime, SyncTrackTimeRange},
};

/// Whether the subtree being updated currently contributes to the output, or is only being
/// kept alive (e.g. the source of a finishing transition).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BranchState {
    #[default]
    Active,
    Inactive,
}

/// Mutable state shared by all nodes during one traversal of the graph.
///
/// `delta_time` follows a borrow-mutate-restore discipline: a node may rescale it for its
/// subtree but must hand the caller's value back. Use [`GraphContext::scoped_delta_time`]
/// rather than writing it directly.
pub struct GraphContext<'a> {
    /// Seconds
    pub delta_time: f32,
    pub update_id: u64,
    pub branch_state: BranchState,
    pub sampled_events: &'a mut SampledEventsBuffer,
    nodes: &'a mut NodeArena,
    log: &'a mut dyn GraphLogSink,
}

impl<'a> GraphContext<'a> {
    pub fn new(
        delta_time: f32,
        update_id: u64,
        nodes: &'a mut NodeArena,
        sampled_events: &'a mut SampledEventsBuffer,
        log: &'a mut dyn GraphLogSink,
    ) -> Self {
        Self {
            delta_time,
            update_id,
            branch_state: BranchState::Active,
            sampled_events,
            nodes,
            log,
        }
    }

    /// Saves the current delta time and restores it when the returned scope is dropped.
    pub fn scoped_delta_time(&mut self) -> DeltaTimeScope<'_, 'a> {
        DeltaTimeScope {
            original: self.delta_time,
            ctx: self,
        }
    }

    pub fn log_warning(&mut self, node_index: NodeIndex, message: fmt::Arguments) {
        self.log.log_warning(node_index, self.update_id, message);
    }

    // --- Pose nodes
    // ----------------------------------------------------------------------------------------

    pub fn initialize_pose(&mut self, ptr: PoseNodePtr, initial_time: SyncTrackTime) {
        let mut node = self.nodes.take_pose(ptr);
        if node.activation_mut().acquire() {
            node.initialize_internal(self, initial_time);
        }
        self.nodes.put_back(ptr.index(), RuntimeNode::Pose(node));
    }

    pub fn shutdown_pose(&mut self, ptr: PoseNodePtr) {
        let mut node = self.nodes.take_pose(ptr);
        if node.activation_mut().release() {
            node.shutdown_internal(self);
        }
        self.nodes.put_back(ptr.index(), RuntimeNode::Pose(node));
    }

    pub fn update_pose(&mut self, ptr: PoseNodePtr) -> PoseNodeResult {
        let mut node = self.nodes.take_pose(ptr);
        assert_initialized(node.as_ref(), ptr);
        let result = node.update(self);
        self.nodes.put_back(ptr.index(), RuntimeNode::Pose(node));
        result
    }

    pub fn update_pose_synchronized(
        &mut self,
        ptr: PoseNodePtr,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        let mut node = self.nodes.take_pose(ptr);
        assert_initialized(node.as_ref(), ptr);
        let result = node.update_synchronized(self, update_range);
        self.nodes.put_back(ptr.index(), RuntimeNode::Pose(node));
        result
    }

    /// Lets every initialized pose node rebuild the state it derives from its children. Slot
    /// order visits children before their parents.
    pub(crate) fn refresh_pose_nodes(&mut self) {
        for slot in 0..self.nodes.len() {
            let Some(index) = NodeIndex::from_usize(slot) else {
                break;
            };
            let is_active_pose = matches!(
                self.nodes.get(index),
                Some(RuntimeNode::Pose(node)) if node.is_initialized()
            );
            if !is_active_pose {
                continue;
            }

            let ptr = PoseNodePtr::new(index);
            let mut node = self.nodes.take_pose(ptr);
            node.refresh_from_children(self);
            self.nodes.put_back(index, RuntimeNode::Pose(node));
        }
    }

    /// Read access to another pose node, e.g. to query its timing or clip.
    pub fn pose_node(&self, ptr: PoseNodePtr) -> &dyn PoseNode {
        self.nodes.pose(ptr)
    }

    pub fn pose_timing(&self, ptr: PoseNodePtr) -> PoseNodeTiming {
        self.nodes.pose(ptr).timing()
    }

    // --- Value nodes
    // ----------------------------------------------------------------------------------------

    pub fn initialize_value<T>(&mut self, ptr: ValueNodePtr<T>) {
        let mut node = self.nodes.take_value(ptr.index());
        if node.activation_mut().acquire() {
            node.initialize_internal(self);
        }
        self.nodes.put_back(ptr.index(), RuntimeNode::Value(node));
    }

    pub fn shutdown_value<T>(&mut self, ptr: ValueNodePtr<T>) {
        let mut node = self.nodes.take_value(ptr.index());
        if node.activation_mut().release() {
            node.shutdown_internal(self);
        }
        self.nodes.put_back(ptr.index(), RuntimeNode::Value(node));
    }

    pub fn get_value<T: GraphValueKind>(&mut self, ptr: ValueNodePtr<T>) -> T {
        match T::from_value(self.get_graph_value(ptr)) {
            Ok(value) => value,
            Err(err) => panic!("value node {} produced the wrong type: {err}", ptr.index()),
        }
    }

    /// Untyped read, for nodes that forward values of any type.
    pub fn get_graph_value<T>(&mut self, ptr: ValueNodePtr<T>) -> GraphValue {
        let mut node = self.nodes.take_value(ptr.index());
        assert!(
            node.is_initialized(),
            "value node {} read before being initialized",
            ptr.index()
        );
        let value = node.get_value(self);
        self.nodes.put_back(ptr.index(), RuntimeNode::Value(node));
        value
    }

    pub fn is_value_initialized<T>(&self, ptr: ValueNodePtr<T>) -> bool {
        self.nodes.value(ptr.index()).is_initialized()
    }
}

fn assert_initialized(node: &dyn PoseNode, ptr: PoseNodePtr) {
    assert!(
        node.is_initialized(),
        "pose node {} updated before being initialized",
        ptr.index()
    );
}

/// Restores the delta time it was created with when dropped, on every exit path.
pub struct DeltaTimeScope<'c, 'a> {
    ctx: &'c mut GraphContext<'a>,
    original: f32,
}

impl DeltaTimeScope<'_, '_> {
    pub fn original_delta_time(&self) -> f32 {
        self.original
    }
}

impl<'a> Deref for DeltaTimeScope<'_, 'a> {
    type Target = GraphContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for DeltaTimeScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for DeltaTimeScope<'_, '_> {
    fn drop(&mut self) {
        self.ctx.delta_time = self.original;
    }
}
