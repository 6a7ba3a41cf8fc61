use std::sync::Arc;

use bevy::{
    app::{App, Plugin, Update},
    ecs::{
        component::Component,
        schedule::{IntoScheduleConfigs, SystemSet},
        system::{Query, Res},
    },
    log::warn,
    time::Time,
};

use crate::{
    builtin_nodes::{
        cached_value_node::{CachedValueDefinition, CachedValueMode},
        clip_node::AnimationClipDefinition,
        const_value_node::ConstValueDefinition,
        ragdoll::{PoweredRagdollDefinition, SimulatedRagdollDefinition},
        speed_node::SpeedScaleDefinition,
        state_conditions::{
            StateCompletedConditionDefinition, TimeComparisonOperator, TimeComparisonType,
            TimeConditionDefinition,
        },
        velocity_speed_node::VelocityBasedSpeedScaleDefinition,
    },
    core::{
        animation_node::{PassthroughDefinition, PoseNodeTiming},
        definition::CompiledGraph,
        edge_data::{
            GraphValue, GraphValueType,
            events::{SampledEvent, SampledEventRange},
        },
        errors::GraphResult,
        ids::{NodeIndex, StringId},
        instance::GraphInstance,
        pose::{BoneTransform, Pose},
        resources::GraphDataSet,
        settings::GraphRuntimeSettings,
        sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
    },
};

/// Adds compiled animation graph playback to an app
#[derive(Default)]
pub struct CompiledAnimationGraphPlugin {
    /// Inserted as a resource unless the app already has one
    pub settings: GraphRuntimeSettings,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, SystemSet)]
pub struct CompiledAnimationGraphSet;

impl Plugin for CompiledAnimationGraphPlugin {
    fn build(&self, app: &mut App) {
        self.register_types(app);

        if !app.world().contains_resource::<GraphRuntimeSettings>() {
            app.insert_resource(self.settings.clone());
        }

        app.add_systems(
            Update,
            tick_graph_instance_players.in_set(CompiledAnimationGraphSet),
        );
    }
}

impl CompiledAnimationGraphPlugin {
    pub fn with_settings(settings: GraphRuntimeSettings) -> Self {
        Self { settings }
    }

    fn register_types(&self, app: &mut App) {
        app //
            .register_type::<GraphRuntimeSettings>()
            .register_type::<NodeIndex>()
            .register_type::<StringId>()
            .register_type::<Pose>()
            .register_type::<BoneTransform>()
            .register_type::<GraphValue>()
            .register_type::<GraphValueType>()
            .register_type::<SampledEvent>()
            .register_type::<SampledEventRange>()
            .register_type::<SyncTrack>()
            .register_type::<SyncTrackTime>()
            .register_type::<SyncTrackTimeRange>()
            .register_type::<PoseNodeTiming>();

        app //
            .register_type::<PassthroughDefinition>()
            .register_type::<AnimationClipDefinition>()
            .register_type::<ConstValueDefinition>()
            .register_type::<CachedValueDefinition>()
            .register_type::<CachedValueMode>()
            .register_type::<SpeedScaleDefinition>()
            .register_type::<VelocityBasedSpeedScaleDefinition>()
            .register_type::<StateCompletedConditionDefinition>()
            .register_type::<TimeConditionDefinition>()
            .register_type::<TimeComparisonType>()
            .register_type::<TimeComparisonOperator>()
            .register_type::<PoweredRagdollDefinition>()
            .register_type::<SimulatedRagdollDefinition>();
    }
}

/// Plays a graph instance on an entity. The instance is initialized on the first tick after it
/// was attached and advanced by the frame delta on every tick after that.
#[derive(Component)]
pub struct GraphInstancePlayer {
    instance: GraphInstance,
    initial_time: SyncTrackTime,
    paused: bool,
    speed: f32,
    pose: Option<Pose>,
    events: Vec<SampledEvent>,
}

impl GraphInstancePlayer {
    pub fn new(instance: GraphInstance) -> Self {
        Self {
            instance,
            initial_time: SyncTrackTime::default(),
            paused: false,
            speed: 1.,
            pose: None,
            events: Vec::new(),
        }
    }

    /// Instantiates `graph` against `data` and wraps the result.
    pub fn from_graph(
        graph: Arc<CompiledGraph>,
        data: &GraphDataSet,
        settings: &GraphRuntimeSettings,
    ) -> GraphResult<Self> {
        Ok(Self::new(GraphInstance::new(graph, data, settings)?))
    }

    pub fn with_initial_time(mut self, initial_time: SyncTrackTime) -> Self {
        self.initial_time = initial_time;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.set_speed(speed);
        self
    }

    pub fn instance(&self) -> &GraphInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut GraphInstance {
        &mut self.instance
    }

    pub fn pause(&mut self) -> &mut Self {
        self.paused = true;
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        self.paused = false;
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Playback rate applied on top of the frame delta. Negative rates are not supported and are
    /// clamped to zero.
    pub fn set_speed(&mut self, speed: f32) -> &mut Self {
        if speed < 0. {
            warn!("Graph instance players cannot play backwards, clamping speed {speed} to 0");
        }
        self.speed = speed.max(0.);
        self
    }

    /// Pose produced by the latest tick
    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    /// Events sampled by the latest tick
    pub fn events(&self) -> &[SampledEvent] {
        &self.events
    }

    /// Initializes the instance if needed, then advances it. Paused players only initialize.
    pub fn tick(&mut self, delta_time: f32) {
        if !self.instance.is_initialized() {
            self.instance.initialize(self.initial_time);
        }
        if self.paused {
            return;
        }

        let result = self.instance.update(delta_time * self.speed);
        self.events.clear();
        self.events
            .extend_from_slice(self.instance.events_in(result.sampled_event_range));
        self.pose = result.pose;
    }
}

pub fn tick_graph_instance_players(time: Res<Time>, mut players: Query<&mut GraphInstancePlayer>) {
    let delta_time = time.delta_secs();
    for mut player in &mut players {
        player.tick(delta_time);
    }
}
