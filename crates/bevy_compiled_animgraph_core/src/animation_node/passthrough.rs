use std::sync::Arc;

use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::{
    animation_node::{PoseNodePtr, PoseNodeResult, PoseNodeTiming},
    context::GraphContext,
    errors::GraphResult,
    ids::NodeIndex,
    instantiation::InstantiationContext,
    sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
};

/// Definition part shared by every node with a single pose child it forwards.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PassthroughDefinition {
    pub child_node_index: NodeIndex,
}

/// Runtime part embedded by nodes with a single pose child. Mirrors the child's timing,
/// validity and sync track after every call into it.
#[derive(Debug, Clone)]
pub struct PassthroughNode {
    child: PoseNodePtr,
    timing: PoseNodeTiming,
    sync_track: Arc<SyncTrack>,
    is_valid: bool,
}

impl PassthroughNode {
    pub fn instantiate(
        definition: &PassthroughDefinition,
        ctx: &InstantiationContext,
    ) -> GraphResult<Self> {
        Ok(Self::new(ctx.pose_node_ptr(definition.child_node_index)?))
    }

    pub fn new(child: PoseNodePtr) -> Self {
        Self {
            child,
            timing: PoseNodeTiming::default(),
            sync_track: SyncTrack::default_track(),
            is_valid: false,
        }
    }

    pub fn child(&self) -> PoseNodePtr {
        self.child
    }

    pub fn initialize(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime) {
        ctx.initialize_pose(self.child, initial_time);
        self.mirror_child(ctx);
    }

    pub fn shutdown(&mut self, ctx: &mut GraphContext) {
        ctx.shutdown_pose(self.child);
        self.is_valid = false;
    }

    pub fn update_child(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        let result = ctx.update_pose(self.child);
        self.mirror_child(ctx);
        result
    }

    pub fn update_child_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        let result = ctx.update_pose_synchronized(self.child, update_range);
        self.mirror_child(ctx);
        result
    }

    /// Re-reads the child's timing, validity and sync track without updating it.
    pub fn refresh(&mut self, ctx: &GraphContext) {
        self.mirror_child(ctx);
    }

    fn mirror_child(&mut self, ctx: &GraphContext) {
        let child = ctx.pose_node(self.child);
        self.timing = child.timing();
        self.sync_track = child.sync_track();
        self.is_valid = child.is_valid();
    }

    pub fn timing(&self) -> PoseNodeTiming {
        self.timing
    }

    /// For nodes that re-time their child and report a different duration.
    pub fn timing_mut(&mut self) -> &mut PoseNodeTiming {
        &mut self.timing
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn sync_track(&self) -> Arc<SyncTrack> {
        self.sync_track.clone()
    }
}
