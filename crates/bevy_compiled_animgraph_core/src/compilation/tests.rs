use crate::{
    compilation::{
        CompilationSettings, GraphCompilationContext, GraphCompiler, ToolsGraph, compile_graph,
    },
    errors::{CompilationError, GraphValidationError},
    ids::{NodeIndex, ResourceId, ResourceSlot},
    test_utils::{FloatTools, LeafTools, PairDefinition, PairTools},
};

#[test]
fn shared_node_is_compiled_once() {
    let mut graph = ToolsGraph::new();
    let leaf = graph.add_node(LeafTools::new(1.));
    let inner = graph.add_node(PairTools::new());
    let outer = graph.add_node(PairTools::new());
    graph.connect(leaf, inner, PairTools::IN_FIRST).unwrap();
    graph.connect(leaf, inner, PairTools::IN_SECOND).unwrap();
    graph.connect(leaf, outer, PairTools::IN_FIRST).unwrap();
    graph.connect(inner, outer, PairTools::IN_SECOND).unwrap();

    let mut compiler = GraphCompiler::new(&graph, CompilationSettings::default());
    let first = compiler.compile(outer);
    let second = compiler.compile(outer);
    assert_eq!(first, second);

    let compiled = compiler.finish(first).unwrap();
    assert_eq!(compiled.num_nodes(), 3);

    let outer_definition = compiled
        .definitions
        .get_as::<PairDefinition>(compiled.root_node_index)
        .unwrap();
    let inner_definition = compiled
        .definitions
        .get_as::<PairDefinition>(outer_definition.second_node_index)
        .unwrap();
    assert_eq!(outer_definition.first_node_index, NodeIndex(0));
    assert_eq!(inner_definition.first_node_index, NodeIndex(0));
    assert_eq!(inner_definition.second_node_index, NodeIndex(0));
    assert_eq!(outer_definition.weight_node_index, NodeIndex::INVALID);
}

#[test]
fn children_precede_parents() {
    let mut graph = ToolsGraph::new();
    let weight = graph.add_node(FloatTools::new(0.5));
    let a = graph.add_node(LeafTools::new(1.));
    let b = graph.add_node(LeafTools::new(2.));
    let pair = graph.add_node(PairTools::new());
    graph.connect(a, pair, PairTools::IN_FIRST).unwrap();
    graph.connect(b, pair, PairTools::IN_SECOND).unwrap();
    graph.connect(weight, pair, PairTools::IN_WEIGHT).unwrap();

    let compiled = compile_graph(&graph, pair, CompilationSettings::default()).unwrap();
    assert!(compiled.definitions.validate().is_ok());
    assert_eq!(compiled.root_node_index, NodeIndex(3));

    for definition in compiled.definitions.iter() {
        for referenced in definition.referenced_indices() {
            if referenced.is_valid() {
                assert!(referenced < definition.node_index());
            }
        }
    }
}

#[test]
fn disconnected_required_pin_fails_the_whole_chain() {
    let mut graph = ToolsGraph::new();
    let leaf = graph.add_node(LeafTools::new(1.));
    let broken = graph.add_node(PairTools::new());
    let root = graph.add_node(PairTools::new());
    graph.connect(leaf, broken, PairTools::IN_FIRST).unwrap();
    graph.connect(leaf, root, PairTools::IN_FIRST).unwrap();
    graph.connect(broken, root, PairTools::IN_SECOND).unwrap();

    let mut compiler = GraphCompiler::new(&graph, CompilationSettings::default());
    assert_eq!(compiler.compile(root), NodeIndex::INVALID);

    // Only the leaf made it into the array
    assert_eq!(compiler.context().definitions().len(), 1);

    let failure = compiler.finish(NodeIndex::INVALID).unwrap_err();
    let errors: Vec<_> = failure.errors().collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].node_id, broken);
    assert_eq!(
        errors[0].message,
        CompilationError::DisconnectedInputPin {
            pin: "Second".into()
        }
        .to_string()
    );
    assert_eq!(errors[1].node_id, root);
}

#[test]
fn failing_leaf_is_logged_once() {
    let mut graph = ToolsGraph::new();
    let leaf = graph.add_node(LeafTools::new(-1.));
    let root = graph.add_node(PairTools::new());
    graph.connect(leaf, root, PairTools::IN_FIRST).unwrap();
    graph.connect(leaf, root, PairTools::IN_SECOND).unwrap();

    let failure = compile_graph(&graph, root, CompilationSettings::default()).unwrap_err();
    let leaf_errors = failure
        .errors()
        .filter(|entry| entry.node_id == leaf)
        .count();
    assert_eq!(leaf_errors, 1);
}

#[test]
fn value_root_is_rejected() {
    let mut graph = ToolsGraph::new();
    let value = graph.add_node(FloatTools::new(1.));
    assert!(compile_graph(&graph, value, CompilationSettings::default()).is_err());
}

#[test]
fn connect_validates_types_and_cycles() {
    let mut graph = ToolsGraph::new();
    let leaf = graph.add_node(LeafTools::new(1.));
    let value = graph.add_node(FloatTools::new(1.));
    let a = graph.add_node(PairTools::new());
    let b = graph.add_node(PairTools::new());

    assert!(matches!(
        graph.connect(value, a, PairTools::IN_FIRST),
        Err(GraphValidationError::InconsistentPinTypes { .. })
    ));
    assert!(matches!(
        graph.connect(leaf, a, 7),
        Err(GraphValidationError::PinOutOfRange { pin: 7, .. })
    ));

    graph.connect(a, b, PairTools::IN_FIRST).unwrap();
    assert!(matches!(
        graph.connect(b, a, PairTools::IN_FIRST),
        Err(GraphValidationError::WouldCreateCycle { .. })
    ));
    assert!(matches!(
        graph.connect(a, a, PairTools::IN_SECOND),
        Err(GraphValidationError::WouldCreateCycle { .. })
    ));
}

#[test]
fn resources_are_deduplicated() {
    let graph = ToolsGraph::new();
    let mut ctx = GraphCompilationContext::new(&graph, CompilationSettings::default());

    let walk = ctx.register_resource(&ResourceId::from("clips/walk")).unwrap();
    let run = ctx.register_resource(&ResourceId::from("clips/run")).unwrap();
    let walk_again = ctx.register_resource(&ResourceId::from("clips/walk")).unwrap();

    assert_eq!(walk, ResourceSlot(0));
    assert_eq!(run, ResourceSlot(1));
    assert_eq!(walk_again, walk);
    assert_eq!(
        ctx.register_resource(&ResourceId::default()),
        Err(CompilationError::InvalidIdentifier("resource id"))
    );
}

#[test]
fn conduit_scopes_nest() {
    let graph = ToolsGraph::new();
    let mut ctx = GraphCompilationContext::new(&graph, CompilationSettings::default());
    assert_eq!(ctx.conduit(), Err(CompilationError::MissingConduit));

    ctx.begin_conduit_compilation(NodeIndex(2), 0.3);
    ctx.begin_conduit_compilation(NodeIndex(5), 0.1);
    assert_eq!(ctx.conduit().unwrap().source_state_node_index, NodeIndex(5));
    ctx.end_conduit_compilation();
    assert_eq!(ctx.conduit().unwrap().transition_duration, 0.3);
    ctx.end_conduit_compilation();
    assert!(ctx.conduit().is_err());
}
