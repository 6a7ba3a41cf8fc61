use std::fmt;

use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use bevy_compiled_animgraph_proc_macros::UuidWrapper;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slot of a node definition inside a [`DefinitionArray`](crate::definition::DefinitionArray).
///
/// Compiled graphs reference other nodes exclusively through these indices, runtime nodes
/// resolve them into typed handles at instantiation time.
#[derive(
    Reflect, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[reflect(Default)]
pub struct NodeIndex(pub i16);

impl NodeIndex {
    pub const INVALID: Self = Self(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    pub fn as_usize(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    pub fn from_usize(index: usize) -> Option<Self> {
        i16::try_from(index).ok().map(Self)
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#invalid")
        }
    }
}

/// Identity of an authored (tools) node. Compilation memoizes on this.
#[derive(UuidWrapper, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolsNodeId(#[uuid] Uuid);

/// Interned-style string identifier used for events, profiles and variations.
#[derive(
    Reflect, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[reflect(Default)]
#[serde(transparent)]
pub struct StringId(pub String);

impl StringId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Empty ids are the "unset" value authors leave behind.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StringId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path-like identifier of an external resource (animation clip, ragdoll definition).
#[derive(
    Reflect, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[reflect(Default)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Slot of a registered resource inside a [`CompiledGraph`](crate::definition::CompiledGraph).
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceSlot(pub i16);

impl ResourceSlot {
    pub const INVALID: Self = Self(-1);

    pub fn as_usize(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl Default for ResourceSlot {
    fn default() -> Self {
        Self::INVALID
    }
}

pub type VariationId = StringId;

pub const DEFAULT_VARIATION: &str = "Default";
