//! Work-assignment engine for the Emberhold headless prototype.
//!
//! Decides which agents may perform which work categories (a tag-driven
//! capability layer over each agent's intrinsic role) and selects task
//! targets per tick from a per-map, distance-bucketed candidate cache
//! refreshed on a configurable interval.

mod agents;
mod capability;
mod orchestrator;
mod refresh;
mod systems;
mod tags;
mod target_cache;
mod work_config;

use bevy::prelude::*;

pub use agents::{
    AgentDef, AgentId, AgentRegistry, AgentRole, AgentState, DefId, DesignationFlags,
    IncapacityFlags, InteractionMode, MapId, TargetId, TargetRef, WorkCategory,
};
pub use capability::{can_attempt, is_draftable, shows_work_tab};
pub use orchestrator::{
    should_skip, try_assign, try_assign_any, CandidateSource, ReservationService, TaskFactory,
    TaskHandle, WorkGiver, WorkGiverSet, WorldServices,
};
pub use refresh::{bucket_index, rebuild_entry};
pub use systems::{advance_tick, assign_work, AssignmentTelemetry, SimulationTick};
pub use tags::{CapabilityFlags, EffectiveCapabilities, TagVocabulary, WorkTag};
pub use target_cache::{CacheEntry, CacheKey, TargetCache};
pub use work_config::{
    load_work_catalog_from_env, WorkCatalog, WorkCatalogError, WorkCatalogHandle,
    WorkCategoryConfig, BUILTIN_WORK_CATALOG, SUPPORTED_WORK_CATALOG_VERSION,
};

/// Construct a Bevy [`App`] wired with the assignment pipeline and the
/// builtin work catalog. Callers register definitions and spawn agents on
/// the [`AgentRegistry`] resource before stepping.
pub fn build_headless_app(services: WorldServices) -> App {
    let mut app = App::new();

    let catalog = work_config::load_work_catalog_from_env();
    let givers = WorkGiverSet::from_catalog(&catalog);

    app.insert_resource(SimulationTick::default())
        .insert_resource(AgentRegistry::default())
        .insert_resource(TagVocabulary::default())
        .insert_resource(TargetCache::default())
        .insert_resource(AssignmentTelemetry::default())
        .insert_resource(WorkCatalogHandle::new(catalog))
        .insert_resource(givers)
        .insert_resource(services)
        .add_plugins(MinimalPlugins)
        .add_systems(Update, (systems::assign_work, systems::advance_tick).chain());

    app
}

/// Execute a single simulation tick: one assignment pass over every agent,
/// then the tick increment.
pub fn run_tick(app: &mut App) {
    app.update();
}
