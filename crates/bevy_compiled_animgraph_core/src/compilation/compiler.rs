use crate::{
    compilation::{CompilationLogEntry, CompilationSettings, GraphCompilationContext, ToolsGraph},
    definition::CompiledGraph,
    errors::CompilationFailure,
    ids::{NodeIndex, ToolsNodeId},
};

/// Drives a compilation pass: compile one or more roots, then [`GraphCompiler::finish`].
pub struct GraphCompiler<'g> {
    ctx: GraphCompilationContext<'g>,
}

impl<'g> GraphCompiler<'g> {
    pub fn new(graph: &'g ToolsGraph, settings: CompilationSettings) -> Self {
        Self {
            ctx: GraphCompilationContext::new(graph, settings),
        }
    }

    pub fn compile(&mut self, root: ToolsNodeId) -> NodeIndex {
        self.ctx.compile_node(root)
    }

    pub fn context(&self) -> &GraphCompilationContext<'g> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut GraphCompilationContext<'g> {
        &mut self.ctx
    }

    pub fn log(&self) -> &[CompilationLogEntry] {
        self.ctx.log()
    }

    /// Packs the definitions compiled so far into a graph rooted at `root_node_index`.
    ///
    /// Fails if anything logged an error during the pass or if the root is not a compiled pose
    /// node.
    pub fn finish(self, root_node_index: NodeIndex) -> Result<CompiledGraph, CompilationFailure> {
        let root_is_pose = self.ctx.definitions().get(root_node_index).is_some()
            && self
                .ctx
                .graph()
                .nodes()
                .find(|node| self.ctx.compiled_index(node.id()) == Some(root_node_index))
                .is_some_and(|node| node.output_type().is_pose());
        let has_errors = self.ctx.has_errors();

        let (definitions, resources, variation_id, log) = self.ctx.into_parts();
        if has_errors || !root_is_pose {
            return Err(CompilationFailure { log });
        }

        debug_assert!(definitions.validate().is_ok());

        Ok(CompiledGraph {
            definitions,
            resources,
            root_node_index,
            variation_id,
        })
    }
}

/// Compiles the graph rooted at `root` in a single pass.
pub fn compile_graph(
    graph: &ToolsGraph,
    root: ToolsNodeId,
    settings: CompilationSettings,
) -> Result<CompiledGraph, CompilationFailure> {
    let mut compiler = GraphCompiler::new(graph, settings);
    let root_node_index = compiler.compile(root);
    compiler.finish(root_node_index)
}
