pub mod events;

use bevy::{
    math::{Quat, Vec3},
    reflect::{Reflect, std_traits::ReflectDefault},
};
use bevy_compiled_animgraph_proc_macros::ValueWrapper;
use serde::{Deserialize, Serialize};

use crate::{errors::GraphError, ids::StringId};

/// Type carried by a pin, and equivalently the role of the node driving it.
#[derive(Reflect, Default, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[reflect(Default)]
pub enum GraphValueType {
    #[default]
    Pose,
    Bool,
    Id,
    Int,
    Float,
    Vector,
    Target,
}

impl GraphValueType {
    pub fn is_pose(self) -> bool {
        matches!(self, GraphValueType::Pose)
    }

    pub fn name(self) -> &'static str {
        match self {
            GraphValueType::Pose => "Pose",
            GraphValueType::Bool => "Bool",
            GraphValueType::Id => "ID",
            GraphValueType::Int => "Int",
            GraphValueType::Float => "Float",
            GraphValueType::Vector => "Vector",
            GraphValueType::Target => "Target",
        }
    }
}

/// Something an IK or ragdoll node can aim at: either a bone (with an offset) or a
/// character-space transform.
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct Target {
    pub bone_id: Option<StringId>,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            bone_id: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Target {
    pub fn bone(bone_id: impl Into<StringId>) -> Self {
        Self {
            bone_id: Some(bone_id.into()),
            ..Default::default()
        }
    }

    pub fn is_bone_target(&self) -> bool {
        self.bone_id.is_some()
    }
}

/// Value produced by a value node.
#[derive(Serialize, Deserialize, Reflect, Clone, Debug, PartialEq, ValueWrapper)]
#[unwrap_error(error(crate::errors::GraphError), variant(MismatchedDataType))]
pub enum GraphValue {
    #[trivial_copy]
    Bool(bool),
    Id(StringId),
    #[trivial_copy]
    Int(i32),
    #[trivial_copy]
    Float(f32),
    #[trivial_copy]
    Vector(Vec3),
    Target(Target),
}

impl GraphValue {
    pub fn value_type(&self) -> GraphValueType {
        match self {
            GraphValue::Bool(_) => GraphValueType::Bool,
            GraphValue::Id(_) => GraphValueType::Id,
            GraphValue::Int(_) => GraphValueType::Int,
            GraphValue::Float(_) => GraphValueType::Float,
            GraphValue::Vector(_) => GraphValueType::Vector,
            GraphValue::Target(_) => GraphValueType::Target,
        }
    }

    /// Zero value of a value type. Pose is not a value, so it has none.
    pub fn default_for(value_type: GraphValueType) -> Option<Self> {
        match value_type {
            GraphValueType::Pose => None,
            GraphValueType::Bool => Some(GraphValue::Bool(false)),
            GraphValueType::Id => Some(GraphValue::Id(StringId::default())),
            GraphValueType::Int => Some(GraphValue::Int(0)),
            GraphValueType::Float => Some(GraphValue::Float(0.)),
            GraphValueType::Vector => Some(GraphValue::Vector(Vec3::ZERO)),
            GraphValueType::Target => Some(GraphValue::Target(Target::default())),
        }
    }
}

/// Rust types that can travel on a value pin. Used to type-check value node handles.
pub trait GraphValueKind: Sized + Send + Sync + 'static {
    const VALUE_TYPE: GraphValueType;

    fn from_value(value: GraphValue) -> Result<Self, GraphError>;
}

impl GraphValueKind for bool {
    const VALUE_TYPE: GraphValueType = GraphValueType::Bool;

    fn from_value(value: GraphValue) -> Result<Self, GraphError> {
        value.as_bool()
    }
}

impl GraphValueKind for StringId {
    const VALUE_TYPE: GraphValueType = GraphValueType::Id;

    fn from_value(value: GraphValue) -> Result<Self, GraphError> {
        value.into_id()
    }
}

impl GraphValueKind for i32 {
    const VALUE_TYPE: GraphValueType = GraphValueType::Int;

    fn from_value(value: GraphValue) -> Result<Self, GraphError> {
        value.as_int()
    }
}

impl GraphValueKind for f32 {
    const VALUE_TYPE: GraphValueType = GraphValueType::Float;

    fn from_value(value: GraphValue) -> Result<Self, GraphError> {
        value.as_float()
    }
}

impl GraphValueKind for Vec3 {
    const VALUE_TYPE: GraphValueType = GraphValueType::Vector;

    fn from_value(value: GraphValue) -> Result<Self, GraphError> {
        value.as_vector()
    }
}

impl GraphValueKind for Target {
    const VALUE_TYPE: GraphValueType = GraphValueType::Target;

    fn from_value(value: GraphValue) -> Result<Self, GraphError> {
        value.into_target()
    }
}
