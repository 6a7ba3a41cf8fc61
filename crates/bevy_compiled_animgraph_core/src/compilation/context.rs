use std::fmt;

use bevy::{
    log::{error, warn},
    platform::collections::{HashMap, HashSet},
};

use crate::{
    compilation::{CompilationSettings, ToolsGraph, ToolsNode, VariationData, VariationHierarchy},
    definition::{DefinitionArray, NodeDefinition},
    errors::CompilationError,
    ids::{NodeIndex, ResourceId, ResourceSlot, ToolsNodeId, VariationId},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompilationLogSeverity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompilationLogEntry {
    pub node_id: ToolsNodeId,
    pub node_name: String,
    pub severity: CompilationLogSeverity,
    pub message: String,
}

impl CompilationLogEntry {
    pub fn is_error(&self) -> bool {
        self.severity == CompilationLogSeverity::Error
    }
}

/// Where the conditions of a transition are being compiled: the state being left and how long
/// the transition takes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConduitScope {
    pub source_state_node_index: NodeIndex,
    /// Seconds
    pub transition_duration: f32,
}

/// State of one compilation pass over a [`ToolsGraph`].
///
/// Nodes are compiled depth first: a node compiles its inputs, then commits its own
/// definition, so definitions always land after everything they reference. Each authored node
/// is compiled at most once per pass, no matter how many parents reach it.
pub struct GraphCompilationContext<'g> {
    graph: &'g ToolsGraph,
    settings: CompilationSettings,
    definitions: DefinitionArray,
    compiled: HashMap<ToolsNodeId, NodeIndex>,
    failed: HashSet<ToolsNodeId>,
    /// Nodes whose compilation is running, innermost last
    in_progress: Vec<ToolsNodeId>,
    resources: Vec<ResourceId>,
    resource_slots: HashMap<ResourceId, ResourceSlot>,
    conduits: Vec<ConduitScope>,
    log: Vec<CompilationLogEntry>,
}

impl<'g> GraphCompilationContext<'g> {
    pub fn new(graph: &'g ToolsGraph, settings: CompilationSettings) -> Self {
        Self {
            graph,
            settings,
            definitions: DefinitionArray::default(),
            compiled: HashMap::default(),
            failed: HashSet::default(),
            in_progress: Vec::new(),
            resources: Vec::new(),
            resource_slots: HashMap::default(),
            conduits: Vec::new(),
            log: Vec::new(),
        }
    }

    pub fn graph(&self) -> &'g ToolsGraph {
        self.graph
    }

    /// Memoizing entry point for [`ToolsNode::compile`].
    ///
    /// If `node` was already compiled in this pass its slot is returned and `build` is not
    /// run. Otherwise `build` compiles the node's inputs and returns the finished definition,
    /// which is committed at the next free slot. Failures are logged against `node` and yield
    /// [`NodeIndex::INVALID`]; nothing is committed for them.
    pub fn get_definition<D: NodeDefinition>(
        &mut self,
        node: &dyn ToolsNode,
        build: impl FnOnce(&mut Self) -> Result<D, CompilationError>,
    ) -> NodeIndex {
        let id = node.id();
        if let Some(index) = self.compiled.get(&id) {
            return *index;
        }
        if self.failed.contains(&id) {
            return NodeIndex::INVALID;
        }
        if self.in_progress.contains(&id) {
            self.log_error(node, CompilationError::CyclicDependency);
            return NodeIndex::INVALID;
        }

        self.in_progress.push(id);
        let result = build(self);
        self.in_progress.pop();

        match result.and_then(|definition| self.definitions.push(Box::new(definition))) {
            Ok(index) => {
                self.compiled.insert(id, index);
                index
            }
            Err(err) => {
                self.failed.insert(id);
                self.log_error(node, err);
                NodeIndex::INVALID
            }
        }
    }

    /// Compiles `root` as the top of a graph. Returns the existing slot if it was already
    /// compiled as part of something else.
    pub fn compile_node(&mut self, id: ToolsNodeId) -> NodeIndex {
        match self.graph.node(id) {
            Some(node) => node.compile(self),
            None => {
                error!("Tried to compile unknown node {id}");
                NodeIndex::INVALID
            }
        }
    }

    // --- Inputs of the node being compiled
    // ----------------------------------------------------------------------------------------

    fn current_node(&self) -> Option<&'g dyn ToolsNode> {
        self.graph.node(*self.in_progress.last()?)
    }

    pub fn num_input_pins(&self) -> usize {
        self.current_node()
            .map_or(0, |node| node.base().num_input_pins())
    }

    pub fn connected_input_node(&self, pin: usize) -> Option<&'g dyn ToolsNode> {
        let current = self.in_progress.last()?;
        self.graph.connected_input_node(*current, pin)
    }

    fn pin_name(&self, pin: usize) -> String {
        self.current_node()
            .map_or_else(|| format!("#{pin}"), |node| node.base().pin_name(pin).to_string())
    }

    /// Compiles whatever is connected to `pin`. The pin must be connected and its source must
    /// compile.
    pub fn compile_required_input(&mut self, pin: usize) -> Result<NodeIndex, CompilationError> {
        let source = self
            .connected_input_node(pin)
            .ok_or_else(|| CompilationError::DisconnectedInputPin {
                pin: self.pin_name(pin),
            })?;

        let index = source.compile(self);
        if index.is_valid() {
            Ok(index)
        } else {
            Err(CompilationError::InputCompilationFailed {
                pin: self.pin_name(pin),
            })
        }
    }

    /// Compiles whatever is connected to `pin`, if anything. A disconnected pin yields
    /// [`NodeIndex::INVALID`]; a connected source that fails to compile is still an error.
    pub fn compile_optional_input(&mut self, pin: usize) -> Result<NodeIndex, CompilationError> {
        if self.connected_input_node(pin).is_some() {
            self.compile_required_input(pin)
        } else {
            Ok(NodeIndex::INVALID)
        }
    }

    pub fn is_input_connected(&self, pin: usize) -> bool {
        self.connected_input_node(pin).is_some()
    }

    // --- Resources and variations
    // ----------------------------------------------------------------------------------------

    /// Slot of `resource` in the compiled graph. Registering the same id twice returns the same
    /// slot.
    pub fn register_resource(
        &mut self,
        resource: &ResourceId,
    ) -> Result<ResourceSlot, CompilationError> {
        if !resource.is_valid() {
            return Err(CompilationError::InvalidIdentifier("resource id"));
        }
        if let Some(slot) = self.resource_slots.get(resource) {
            return Ok(*slot);
        }

        let slot = i16::try_from(self.resources.len())
            .map(ResourceSlot)
            .map_err(|_| CompilationError::TooManyResources)?;
        self.resources.push(resource.clone());
        self.resource_slots.insert(resource.clone(), slot);
        Ok(slot)
    }

    pub fn variation_id(&self) -> &VariationId {
        &self.settings.variation_id
    }

    pub fn variation_hierarchy(&self) -> &VariationHierarchy {
        &self.settings.variation_hierarchy
    }

    pub fn resolve_variation_data<'d, T>(
        &self,
        data: &'d VariationData<T>,
    ) -> Result<&'d T, CompilationError> {
        data.resolve(self.variation_hierarchy(), self.variation_id())
            .ok_or_else(|| CompilationError::MissingVariationData(self.variation_id().clone()))
    }

    // --- Conduits
    // ----------------------------------------------------------------------------------------

    pub fn begin_conduit_compilation(
        &mut self,
        source_state_node_index: NodeIndex,
        transition_duration: f32,
    ) {
        self.conduits.push(ConduitScope {
            source_state_node_index,
            transition_duration,
        });
    }

    pub fn end_conduit_compilation(&mut self) {
        let ended = self.conduits.pop();
        debug_assert!(ended.is_some(), "unbalanced conduit compilation");
    }

    pub fn conduit(&self) -> Result<ConduitScope, CompilationError> {
        self.conduits
            .last()
            .copied()
            .ok_or(CompilationError::MissingConduit)
    }

    // --- Log
    // ----------------------------------------------------------------------------------------

    pub fn log_error(&mut self, node: &dyn ToolsNode, message: impl fmt::Display) {
        let message = message.to_string();
        error!("Compiling {} ({}): {message}", node.name(), node.type_name());
        self.push_log(node, CompilationLogSeverity::Error, message);
    }

    pub fn log_warning(&mut self, node: &dyn ToolsNode, message: impl fmt::Display) {
        let message = message.to_string();
        warn!("Compiling {} ({}): {message}", node.name(), node.type_name());
        self.push_log(node, CompilationLogSeverity::Warning, message);
    }

    fn push_log(&mut self, node: &dyn ToolsNode, severity: CompilationLogSeverity, message: String) {
        self.log.push(CompilationLogEntry {
            node_id: node.id(),
            node_name: node.name().to_string(),
            severity,
            message,
        });
    }

    pub fn log(&self) -> &[CompilationLogEntry] {
        &self.log
    }

    pub fn has_errors(&self) -> bool {
        self.log.iter().any(CompilationLogEntry::is_error)
    }

    pub fn definitions(&self) -> &DefinitionArray {
        &self.definitions
    }

    /// Index already assigned to `id` in this pass, if any.
    pub fn compiled_index(&self, id: ToolsNodeId) -> Option<NodeIndex> {
        self.compiled.get(&id).copied()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        DefinitionArray,
        Vec<ResourceId>,
        VariationId,
        Vec<CompilationLogEntry>,
    ) {
        (
            self.definitions,
            self.resources,
            self.settings.variation_id,
            self.log,
        )
    }
}
