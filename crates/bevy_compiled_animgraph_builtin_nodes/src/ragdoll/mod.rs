//! Nodes that hand a pose over to a ragdoll. The physics simulation itself runs outside the
//! graph; these nodes only decide which pose, profile and impulse it receives.

mod powered_ragdoll;
mod simulated_ragdoll;

pub use powered_ragdoll::*;
pub use simulated_ragdoll::*;

use bevy::math::Vec3;
use bevy_compiled_animgraph_core::{
    compilation::{GraphCompilationContext, VariationData},
    errors::CompilationError,
    ids::{ResourceId, ResourceSlot},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RagdollImpulse {
    /// Character space
    pub origin: Vec3,
    pub force: Vec3,
}

/// Resolves the ragdoll definition for the variation being compiled and registers it.
fn compile_ragdoll_resource(
    ctx: &mut GraphCompilationContext,
    ragdoll: &VariationData<ResourceId>,
) -> Result<ResourceSlot, CompilationError> {
    let ragdoll = ctx.resolve_variation_data(ragdoll)?.clone();
    if !ragdoll.is_valid() {
        return Err(CompilationError::InvalidIdentifier("ragdoll definition"));
    }
    ctx.register_resource(&ragdoll)
}
