use std::{collections::VecDeque, sync::Arc};

use bevy::log::warn;

use crate::{
    animation_node::{NodeArena, PoseNodePtr, PoseNodeResult, PoseNodeTiming, RuntimeNode},
    context::{GraphContext, GraphLogSink, RuntimeLogEntry},
    definition::CompiledGraph,
    edge_data::events::{SampledEvent, SampledEventRange, SampledEventsBuffer},
    errors::{GraphError, GraphResult, RecordingError},
    ids::NodeIndex,
    instantiation::InstantiationContext,
    recording::{GraphStateRecorder, GraphStateRecording},
    resources::{GraphDataSet, GraphResource},
    settings::GraphRuntimeSettings,
    sync_track::{SyncTrackTime, SyncTrackTimeRange},
};

/// A live copy of a compiled graph. Owns every runtime node it instantiated and drops them as a
/// unit; the compiled graph itself is shared.
pub struct GraphInstance {
    graph: Arc<CompiledGraph>,
    nodes: NodeArena,
    root: PoseNodePtr,
    sampled_events: SampledEventsBuffer,
    log: Box<dyn GraphLogSink>,
    update_id: u64,
    initialized: bool,
}

impl GraphInstance {
    /// Instantiates every definition in slot order, resolving references into handles.
    pub fn new(
        graph: Arc<CompiledGraph>,
        data: &GraphDataSet,
        settings: &GraphRuntimeSettings,
    ) -> GraphResult<Self> {
        graph.definitions.validate()?;

        let resources: Vec<Option<GraphResource>> = graph
            .resources
            .iter()
            .map(|id| {
                let resource = data.get(id).cloned();
                if resource.is_none() {
                    warn!("Animation graph resource '{id}' is missing from the data set");
                }
                resource
            })
            .collect();

        let mut nodes = NodeArena::with_capacity(graph.num_nodes());
        for definition in graph.definitions.iter() {
            let index = definition.node_index();
            let node = {
                let ctx = InstantiationContext::new(&graph.definitions, &nodes, &resources, index);
                definition.instantiate_node(&ctx)?
            };

            let claimed = node.as_graph_node().node_index();
            if claimed != index {
                return Err(GraphError::MisplacedDefinition {
                    slot: index,
                    claimed,
                });
            }
            nodes.insert(index, node)?;
        }

        let root = match nodes.get(graph.root_node_index) {
            Some(RuntimeNode::Pose(_)) => PoseNodePtr::new(graph.root_node_index),
            _ => return Err(GraphError::MissingRootNode(graph.root_node_index)),
        };

        Ok(Self {
            graph,
            nodes,
            root,
            sampled_events: SampledEventsBuffer::default(),
            log: settings.make_log_sink(),
            update_id: 0,
            initialized: false,
        })
    }

    fn context(&mut self, delta_time: f32) -> GraphContext<'_> {
        GraphContext::new(
            delta_time,
            self.update_id,
            &mut self.nodes,
            &mut self.sampled_events,
            self.log.as_mut(),
        )
    }

    pub fn initialize(&mut self, initial_time: SyncTrackTime) {
        assert!(!self.initialized, "graph instance initialized twice");
        let root = self.root;
        self.context(0.).initialize_pose(root, initial_time);
        self.initialized = true;
    }

    pub fn shutdown(&mut self) {
        assert!(self.initialized, "graph instance shut down while not initialized");
        let root = self.root;
        self.context(0.).shutdown_pose(root);
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Advances the whole graph by `delta_time` seconds. Events sampled in previous frames are
    /// discarded first.
    pub fn update(&mut self, delta_time: f32) -> PoseNodeResult {
        assert!(self.initialized, "graph instance updated before initialize");
        self.begin_frame();
        let root = self.root;
        self.context(delta_time).update_pose(root)
    }

    pub fn update_synchronized(
        &mut self,
        delta_time: f32,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        assert!(self.initialized, "graph instance updated before initialize");
        self.begin_frame();
        let root = self.root;
        self.context(delta_time)
            .update_pose_synchronized(root, update_range)
    }

    fn begin_frame(&mut self) {
        self.update_id += 1;
        self.sampled_events.reset();
    }

    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    pub fn sampled_events(&self) -> &[SampledEvent] {
        self.sampled_events.events()
    }

    pub fn events_in(&self, range: SampledEventRange) -> &[SampledEvent] {
        self.sampled_events.events_in(range)
    }

    pub fn graph(&self) -> &Arc<CompiledGraph> {
        &self.graph
    }

    pub fn root(&self) -> PoseNodePtr {
        self.root
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_timing(&self) -> PoseNodeTiming {
        self.nodes.pose(self.root).timing()
    }

    pub fn pose_timing(&self, index: NodeIndex) -> Option<PoseNodeTiming> {
        match self.nodes.get(index)? {
            RuntimeNode::Pose(node) => Some(node.timing()),
            RuntimeNode::Value(_) => None,
        }
    }

    pub fn is_node_valid(&self, index: NodeIndex) -> Option<bool> {
        match self.nodes.get(index)? {
            RuntimeNode::Pose(node) => Some(node.is_valid()),
            RuntimeNode::Value(_) => None,
        }
    }

    pub fn is_node_initialized(&self, index: NodeIndex) -> Option<bool> {
        Some(self.nodes.graph_node(index)?.is_initialized())
    }

    /// Concrete runtime node at `index`, for inspection.
    pub fn node_as<T: 'static>(&self, index: NodeIndex) -> Option<&T> {
        self.nodes
            .graph_node(index)?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn log_entries(&self) -> &VecDeque<RuntimeLogEntry> {
        self.log.entries()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    // --- State recording
    // ----------------------------------------------------------------------------------------

    /// Snapshot of every node's activation and the state of active nodes, in slot order.
    pub fn record_state(&self) -> Result<GraphStateRecording, RecordingError> {
        if !self.initialized {
            return Err(RecordingError::NotInitialized);
        }

        let mut recorder = GraphStateRecorder::new();
        recorder.write(&self.nodes.len())?;
        recorder.write(&self.update_id)?;

        for node in self.nodes.iter() {
            let Some(node) = node.map(RuntimeNode::as_graph_node) else {
                recorder.write(&0_u32)?;
                continue;
            };
            recorder.write(&node.activation().count())?;
            if node.is_initialized() {
                node.record_graph_state(&mut recorder)?;
            }
        }

        Ok(recorder.finish())
    }

    /// Puts every node back into the state captured by [`GraphInstance::record_state`].
    pub fn restore_state(&mut self, recording: &GraphStateRecording) -> Result<(), RecordingError> {
        if !self.initialized {
            return Err(RecordingError::NotInitialized);
        }

        let mut reader = recording.reader();
        let num_nodes: usize = reader.read()?;
        if num_nodes != self.nodes.len() {
            return Err(RecordingError::NodeCountMismatch {
                expected: self.nodes.len(),
                found: num_nodes,
            });
        }
        self.update_id = reader.read()?;

        for node in self.nodes.iter_mut() {
            let activation_count: u32 = reader.read()?;
            let Some(node) = node.map(RuntimeNode::as_graph_node_mut) else {
                continue;
            };
            node.activation_mut().set_count(activation_count);
            if activation_count > 0 {
                node.restore_graph_state(&mut reader)?;
            }
        }

        self.context(0.).refresh_pose_nodes();
        Ok(())
    }
}
