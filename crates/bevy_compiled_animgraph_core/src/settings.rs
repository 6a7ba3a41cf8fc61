use bevy::{
    prelude::Resource,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use serde::{Deserialize, Serialize};

use crate::context::{DevelopmentLog, GraphLogSink, NoopLog};

/// Runtime configuration shared by every graph instance.
#[derive(Resource, Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
#[serde(default)]
pub struct GraphRuntimeSettings {
    /// Keep runtime warnings around for inspection. Off, warnings are dropped without being
    /// formatted.
    pub development_tools: bool,
    /// Per instance
    pub max_log_entries: usize,
}

impl Default for GraphRuntimeSettings {
    fn default() -> Self {
        Self {
            development_tools: cfg!(debug_assertions),
            max_log_entries: 256,
        }
    }
}

impl GraphRuntimeSettings {
    pub fn development() -> Self {
        Self {
            development_tools: true,
            ..Default::default()
        }
    }

    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::de::from_str(source)
    }

    pub fn make_log_sink(&self) -> Box<dyn GraphLogSink> {
        if self.development_tools {
            Box::new(DevelopmentLog::new(self.max_log_entries))
        } else {
            Box::new(NoopLog)
        }
    }
}
