use std::sync::Arc;

use bevy::platform::collections::HashMap;

use crate::{
    animation_clip::AnimationClip,
    ids::{ResourceId, StringId},
};

/// Ragdoll asset as far as the graph is concerned: which physics profiles it offers. The
/// bodies, joints and the simulation live outside the graph.
#[derive(Clone, Debug, Default)]
pub struct RagdollDefinition {
    pub profiles: Vec<StringId>,
}

impl RagdollDefinition {
    pub fn has_profile(&self, profile: &StringId) -> bool {
        self.profiles.contains(profile)
    }
}

#[derive(Clone, Debug)]
pub enum GraphResource {
    AnimationClip(Arc<AnimationClip>),
    RagdollDefinition(Arc<RagdollDefinition>),
}

impl GraphResource {
    pub fn type_name(&self) -> &'static str {
        match self {
            GraphResource::AnimationClip(_) => "AnimationClip",
            GraphResource::RagdollDefinition(_) => "RagdollDefinition",
        }
    }
}

/// Loaded resources a compiled graph is instantiated against, keyed by the ids the compiler
/// registered.
#[derive(Clone, Debug, Default)]
pub struct GraphDataSet {
    resources: HashMap<ResourceId, GraphResource>,
}

impl GraphDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, id: impl Into<String>, clip: AnimationClip) -> Self {
        self.insert(
            ResourceId::new(id),
            GraphResource::AnimationClip(Arc::new(clip)),
        );
        self
    }

    pub fn with_ragdoll(mut self, id: impl Into<String>, ragdoll: RagdollDefinition) -> Self {
        self.insert(
            ResourceId::new(id),
            GraphResource::RagdollDefinition(Arc::new(ragdoll)),
        );
        self
    }

    pub fn insert(&mut self, id: ResourceId, resource: GraphResource) {
        self.resources.insert(id, resource);
    }

    pub fn get(&self, id: &ResourceId) -> Option<&GraphResource> {
        self.resources.get(id)
    }
}
