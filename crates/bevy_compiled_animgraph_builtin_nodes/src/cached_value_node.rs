use std::any::Any;

use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use bevy_compiled_animgraph_core::{
    animation_node::{GraphNode, NodeBase, RuntimeNode, ValueNode, ValueNodePtr},
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase},
    context::{BranchState, GraphContext},
    definition::NodeDefinition,
    edge_data::{GraphValue, GraphValueType},
    errors::{CompilationError, GraphResult, RecordingError},
    ids::NodeIndex,
    instantiation::InstantiationContext,
    recording::{GraphStateReader, GraphStateRecorder},
};
use serde::{Deserialize, Serialize};

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[reflect(Default)]
pub enum CachedValueMode {
    /// Read the input once, when the node becomes active
    #[default]
    OnEntry,
    /// Follow the input while the branch is active, keep the last value once it is not
    OnExit,
}

#[derive(Debug, Clone)]
pub struct CachedValueToolsNode {
    pub base: ToolsNodeBase,
    pub value_type: GraphValueType,
    pub mode: CachedValueMode,
}

impl CachedValueToolsNode {
    pub const IN_VALUE: usize = 0;

    pub fn new(value_type: GraphValueType, mode: CachedValueMode) -> Self {
        Self {
            base: ToolsNodeBase::new(format!("Cached {}", value_type.name()))
                .with_input("Value", value_type),
            value_type,
            mode,
        }
    }
}

impl ToolsNode for CachedValueToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        match self.value_type {
            GraphValueType::Bool => "Cached Bool",
            GraphValueType::Id => "Cached ID",
            GraphValueType::Int => "Cached Int",
            GraphValueType::Float => "Cached Float",
            GraphValueType::Vector => "Cached Vector",
            GraphValueType::Target => "Cached Target",
            GraphValueType::Pose => "Cached Value",
        }
    }

    fn category(&self) -> &'static str {
        "Values"
    }

    fn output_type(&self) -> GraphValueType {
        self.value_type
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            if self.value_type.is_pose() {
                return Err(CompilationError::InvalidParameter {
                    field: "value_type",
                    reason: "poses cannot be cached".into(),
                });
            }

            Ok(CachedValueDefinition {
                node_index: NodeIndex::INVALID,
                input_node_index: ctx.compile_required_input(Self::IN_VALUE)?,
                value_type: self.value_type,
                mode: self.mode,
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct CachedValueDefinition {
    pub node_index: NodeIndex,
    pub input_node_index: NodeIndex,
    pub value_type: GraphValueType,
    pub mode: CachedValueMode,
}

impl NodeDefinition for CachedValueDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "CachedValue"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![self.input_node_index]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::value(CachedValueNode {
            base: NodeBase::new(self.node_index),
            input: ctx.dynamic_value_node_ptr(self.input_node_index, self.value_type)?,
            value_type: self.value_type,
            mode: self.mode,
            cached: None,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct CachedValueNode {
    base: NodeBase,
    input: ValueNodePtr<GraphValue>,
    value_type: GraphValueType,
    mode: CachedValueMode,
    cached: Option<GraphValue>,
}

impl CachedValueNode {
    pub fn cached(&self) -> Option<&GraphValue> {
        self.cached.as_ref()
    }
}

impl GraphNode for CachedValueNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn record_graph_state(&self, recorder: &mut GraphStateRecorder) -> Result<(), RecordingError> {
        recorder.write(&self.cached)
    }

    fn restore_graph_state(&mut self, reader: &mut GraphStateReader) -> Result<(), RecordingError> {
        self.cached = reader.read()?;
        Ok(())
    }
}

impl ValueNode for CachedValueNode {
    fn value_type(&self) -> GraphValueType {
        self.value_type
    }

    fn initialize_internal(&mut self, ctx: &mut GraphContext) {
        ctx.initialize_value(self.input);
        self.cached = match self.mode {
            CachedValueMode::OnEntry => Some(ctx.get_graph_value(self.input)),
            CachedValueMode::OnExit => None,
        };
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        ctx.shutdown_value(self.input);
        self.cached = None;
    }

    fn get_value(&mut self, ctx: &mut GraphContext) -> GraphValue {
        let track_input = self.mode == CachedValueMode::OnExit
            && ctx.branch_state == BranchState::Active;

        match &self.cached {
            Some(value) if !track_input => value.clone(),
            _ => {
                let value = ctx.get_graph_value(self.input);
                self.cached = Some(value.clone());
                value
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy_compiled_animgraph_core::{
        animation_clip::AnimationClip, instance::GraphInstance, sync_track::SyncTrackTime,
    };

    use super::*;
    use crate::{
        clip_node::AnimationClipToolsNode,
        const_value_node::ConstValueToolsNode,
        speed_node::SpeedScaleToolsNode,
        test_utils::{ClockToolsNode, ProbeToolsNode, TestGraph},
    };

    const CACHED: NodeIndex = NodeIndex(2);

    /// clip (0), clock (1), cached clock (2) driving a speed scale (3), under a probe (4) that
    /// deactivates the branch from update 3 on.
    fn cached_clock(mode: CachedValueMode) -> GraphInstance {
        let mut test = TestGraph::new().with_clip("clips/idle", AnimationClip::new(1.));
        let clip = test.add(AnimationClipToolsNode::new("clips/idle"));
        let clock = test.add(ClockToolsNode::new());
        let cached = test.add(CachedValueToolsNode::new(GraphValueType::Float, mode));
        let speed = test.add(SpeedScaleToolsNode::new(0.));
        let probe = test.add(ProbeToolsNode::new().inactive_from(3));
        test.connect(clock, cached, CachedValueToolsNode::IN_VALUE);
        test.connect(clip, speed, SpeedScaleToolsNode::IN_CHILD);
        test.connect(cached, speed, SpeedScaleToolsNode::IN_SCALE);
        test.connect(speed, probe, ProbeToolsNode::IN_CHILD);

        let mut instance = test.instantiate(probe);
        instance.initialize(SyncTrackTime::default());
        instance
    }

    fn cached(instance: &GraphInstance) -> Option<GraphValue> {
        instance
            .node_as::<CachedValueNode>(CACHED)
            .unwrap()
            .cached()
            .cloned()
    }

    #[test]
    fn on_entry_reads_once() {
        let mut instance = cached_clock(CachedValueMode::OnEntry);
        assert_eq!(cached(&instance), Some(GraphValue::Float(0.)));

        for _ in 0..4 {
            instance.update(0.1);
        }
        assert_eq!(cached(&instance), Some(GraphValue::Float(0.)));
    }

    #[test]
    fn on_exit_freezes_when_branch_goes_inactive() {
        let mut instance = cached_clock(CachedValueMode::OnExit);
        assert_eq!(cached(&instance), None);

        instance.update(0.1);
        assert_eq!(cached(&instance), Some(GraphValue::Float(1.)));
        instance.update(0.1);
        assert_eq!(cached(&instance), Some(GraphValue::Float(2.)));

        instance.update(0.1);
        instance.update(0.1);
        assert_eq!(cached(&instance), Some(GraphValue::Float(2.)));
    }

    #[test]
    fn shutdown_clears_the_cache() {
        let mut instance = cached_clock(CachedValueMode::OnEntry);
        instance.shutdown();
        assert_eq!(cached(&instance), None);
        assert_eq!(instance.is_node_initialized(CACHED), Some(false));
    }

    #[test]
    fn cached_value_is_recorded() {
        let mut instance = cached_clock(CachedValueMode::OnExit);
        instance.update(0.1);
        let recording = instance.record_state().unwrap();

        instance.update(0.1);
        assert_eq!(cached(&instance), Some(GraphValue::Float(2.)));
        instance.restore_state(&recording).unwrap();
        assert_eq!(cached(&instance), Some(GraphValue::Float(1.)));
    }

    #[test]
    fn input_type_must_match() {
        let mut test = TestGraph::new();
        let value = test.add(ConstValueToolsNode::new(true));
        let cached = test.add(CachedValueToolsNode::new(
            GraphValueType::Float,
            CachedValueMode::OnExit,
        ));
        assert!(
            test.graph
                .connect(value, cached, CachedValueToolsNode::IN_VALUE)
                .is_err()
        );
    }

    #[test]
    fn poses_cannot_be_cached() {
        let mut test = TestGraph::new();
        let cached = test.add(CachedValueToolsNode::new(
            GraphValueType::Pose,
            CachedValueMode::OnEntry,
        ));
        let failure = test.compile(cached).unwrap_err();
        assert!(failure.errors().next().is_some());
    }
}
