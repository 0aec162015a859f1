use bevy::prelude::{Res, ResMut, Resource};
use tracing::debug;

use crate::agents::AgentRegistry;
use crate::orchestrator::{should_skip, try_assign_any, WorkGiverSet, WorldServices};
use crate::tags::TagVocabulary;
use crate::target_cache::TargetCache;

/// Total simulation ticks elapsed.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

/// Per-tick assignment counters, plus session totals. Observability only;
/// nothing in the engine reads these back.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct AssignmentTelemetry {
    pub tick: u64,
    pub considered: u64,
    pub skipped: u64,
    pub assigned: u64,
    pub refreshes_this_tick: u64,
    pub assigned_total: u64,
}

/// Run the assignment decision for every live agent. Agents are processed
/// in registry order, each to completion, so all agents sharing a map
/// observe the same cache entries within the tick.
pub fn assign_work(
    tick: Res<SimulationTick>,
    registry: Res<AgentRegistry>,
    mut vocabulary: ResMut<TagVocabulary>,
    givers: Res<WorkGiverSet>,
    mut cache: ResMut<TargetCache>,
    mut services: ResMut<WorldServices>,
    mut telemetry: ResMut<AssignmentTelemetry>,
) {
    let now = tick.0;
    let refreshes_before = cache.refresh_count();
    telemetry.tick = now;
    telemetry.considered = 0;
    telemetry.skipped = 0;
    telemetry.assigned = 0;

    let WorldServices {
        candidates,
        reservations,
        tasks,
    } = &mut *services;

    for agent in registry.agents() {
        telemetry.considered += 1;
        if should_skip(agent) {
            telemetry.skipped += 1;
            continue;
        }
        let Some(def) = registry.def(&agent.def) else {
            // Missing definition metadata is treated as "skip quietly";
            // incomplete configuration must not abort the tick loop.
            telemetry.skipped += 1;
            continue;
        };
        let caps = vocabulary.resolve(def);
        let handle = try_assign_any(
            now,
            def,
            agent,
            &caps,
            &givers,
            &mut cache,
            candidates.as_ref(),
            reservations.as_ref(),
            tasks.as_mut(),
        );
        if handle.is_some() {
            telemetry.assigned += 1;
            telemetry.assigned_total += 1;
        }
    }

    telemetry.refreshes_this_tick = cache.refresh_count() - refreshes_before;
    debug!(
        target: "work_engine::assign",
        tick = now,
        considered = telemetry.considered,
        skipped = telemetry.skipped,
        assigned = telemetry.assigned,
        refreshes = telemetry.refreshes_this_tick,
        "assign.tick_complete"
    );
}

/// Advance the tick counter after assignment has run.
pub fn advance_tick(mut tick: ResMut<SimulationTick>) {
    tick.0 += 1;
}
