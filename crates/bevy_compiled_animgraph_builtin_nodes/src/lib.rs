//! Node catalogue for the compiled animation graph: the authored (`*ToolsNode`) side, the
//! compiled definitions and the runtime nodes they instantiate.

pub mod cached_value_node;
pub mod clip_node;
pub mod const_value_node;
pub mod ragdoll;
pub mod speed_node;
pub mod state_conditions;
pub mod velocity_speed_node;

#[cfg(test)]
pub(crate) mod test_utils;
