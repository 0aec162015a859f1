use bevy::prelude::Resource;
use tracing::debug;

use crate::agents::{
    AgentDef, AgentId, AgentState, InteractionMode, MapId, TargetId, TargetRef, WorkCategory,
};
use crate::capability::can_attempt;
use crate::refresh::rebuild_entry;
use crate::tags::EffectiveCapabilities;
use crate::target_cache::{CacheKey, TargetCache};
use crate::work_config::{WorkCatalog, WorkCategoryConfig};

/// Authoritative enumeration of candidate targets on a map. An unknown map
/// yields an empty population, never an error.
pub trait CandidateSource: Send + Sync + 'static {
    fn enumerate(&self, map: MapId) -> Vec<TargetRef>;
}

/// Agent-relative reservation and reachability check. These depend on the
/// specific requesting agent and cannot be precomputed at refresh time.
pub trait ReservationService: Send + Sync + 'static {
    fn can_reserve_and_reach(&self, agent: &AgentState, target: &TargetRef) -> bool;
}

/// Materializes a task once a target has been selected. Returning `None`
/// means the target went invalid between validation and creation; the
/// orchestrator treats that as "no task this tick".
pub trait TaskFactory: Send + Sync + 'static {
    fn create(&mut self, category: WorkCategory, agent: AgentId, target: TargetId)
        -> Option<TaskHandle>;
}

/// Opaque handle to a created task. Execution is entirely external.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    pub category: WorkCategory,
    pub agent: AgentId,
    pub target: TargetId,
}

/// Boxed collaborators the engine calls into, bundled as one resource.
#[derive(Resource)]
pub struct WorldServices {
    pub candidates: Box<dyn CandidateSource>,
    pub reservations: Box<dyn ReservationService>,
    pub tasks: Box<dyn TaskFactory>,
}

impl WorldServices {
    pub fn new(
        candidates: impl CandidateSource,
        reservations: impl ReservationService,
        tasks: impl TaskFactory,
    ) -> Self {
        Self {
            candidates: Box::new(candidates),
            reservations: Box::new(reservations),
            tasks: Box::new(tasks),
        }
    }
}

/// Coarse, agent-independent eligibility applied at cache refresh.
pub type TargetFilter = fn(WorkCategory, &TargetRef) -> bool;

/// Fine-grained, agent-relative validation applied per candidate.
pub type TargetValidator = fn(WorkCategory, &AgentState, &TargetRef) -> bool;

fn default_filter(category: WorkCategory, target: &TargetRef) -> bool {
    target.alive && target.designated_for(category)
}

fn default_validator(category: WorkCategory, _agent: &AgentState, target: &TargetRef) -> bool {
    match category {
        WorkCategory::Hunting => target.mode == InteractionMode::Hunt,
        WorkCategory::Warden => target.mode == InteractionMode::Arrest,
        WorkCategory::Medical => target.mode == InteractionMode::Treat,
        _ => true,
    }
}

/// One work category's instantiation of the assignment state machine:
/// catalog configuration plus the two category-specific predicates.
#[derive(Debug, Clone)]
pub struct WorkGiver {
    pub category: WorkCategory,
    pub config: WorkCategoryConfig,
    filter: TargetFilter,
    validator: TargetValidator,
}

impl WorkGiver {
    pub fn new(category: WorkCategory, config: WorkCategoryConfig) -> Self {
        Self {
            category,
            config,
            filter: default_filter,
            validator: default_validator,
        }
    }

    pub fn with_filter(mut self, filter: TargetFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_validator(mut self, validator: TargetValidator) -> Self {
        self.validator = validator;
        self
    }

    fn passes_filter(&self, target: &TargetRef) -> bool {
        (self.filter)(self.category, target)
    }

    fn passes_validation(&self, agent: &AgentState, target: &TargetRef) -> bool {
        (self.validator)(self.category, agent, target)
    }
}

/// Every configured work giver, scanned in descending base priority with a
/// stable tie-break on category order.
#[derive(Resource, Debug, Clone, Default)]
pub struct WorkGiverSet {
    givers: Vec<WorkGiver>,
}

impl WorkGiverSet {
    pub fn from_catalog(catalog: &WorkCatalog) -> Self {
        let mut givers: Vec<WorkGiver> = catalog
            .categories()
            .map(|(category, config)| WorkGiver::new(category, config.clone()))
            .collect();
        givers.sort_by(|a, b| {
            b.config
                .base_priority
                .total_cmp(&a.config.base_priority)
                .then(a.category.cmp(&b.category))
        });
        Self { givers }
    }

    pub fn giver(&self, category: WorkCategory) -> Option<&WorkGiver> {
        self.givers.iter().find(|giver| giver.category == category)
    }

    pub fn giver_mut(&mut self, category: WorkCategory) -> Option<&mut WorkGiver> {
        self.givers
            .iter_mut()
            .find(|giver| giver.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkGiver> {
        self.givers.iter()
    }

    pub fn len(&self) -> usize {
        self.givers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.givers.is_empty()
    }
}

/// Cheap per-agent rejection run before any cache work. Pure and
/// side-effect-free so it can run for every agent every tick.
pub fn should_skip(agent: &AgentState) -> bool {
    agent.dead || agent.downed || agent.drafted
}

/// The per-agent, per-tick decision procedure for one category:
/// skip-check, staleness-triggered refresh, bucket-ordered validation,
/// then task materialization. Every failure is local and resolves to
/// `None`; nothing here aborts the enclosing tick loop.
#[allow(clippy::too_many_arguments)]
pub fn try_assign(
    now: u64,
    def: &AgentDef,
    agent: &AgentState,
    caps: &EffectiveCapabilities,
    giver: &WorkGiver,
    cache: &mut TargetCache,
    candidates: &dyn CandidateSource,
    reservations: &dyn ReservationService,
    tasks: &mut dyn TaskFactory,
) -> Option<TaskHandle> {
    if should_skip(agent) || !can_attempt(def, caps, giver.category) {
        return None;
    }

    let key = CacheKey::new(agent.map, giver.category);
    let entry = match cache.get(key) {
        Some(entry) if !entry.is_stale(now, giver.config.refresh_interval_ticks) => entry,
        _ => {
            let population = candidates.enumerate(agent.map);
            let entry = rebuild_entry(
                now,
                agent.position,
                &giver.config.distance_thresholds_sq,
                population,
                |target| giver.passes_filter(target),
            );
            cache.insert(key, entry)
        }
    };

    for target in entry.iter() {
        if !giver.passes_validation(agent, target) {
            continue;
        }
        if !reservations.can_reserve_and_reach(agent, target) {
            continue;
        }
        let handle = tasks.create(giver.category, agent.id, target.id);
        debug!(
            target: "work_engine::assign",
            agent = %agent.id,
            category = %giver.category,
            candidate = ?target.id,
            created = handle.is_some(),
            label = %giver.config.debug_label,
            "assign.selected"
        );
        // A factory refusal means the target went invalid after validation;
        // that is "no task this tick", not a reason to keep scanning.
        return handle;
    }
    None
}

/// Scan every permitted category in priority order and return the first
/// task materialized, if any.
#[allow(clippy::too_many_arguments)]
pub fn try_assign_any(
    now: u64,
    def: &AgentDef,
    agent: &AgentState,
    caps: &EffectiveCapabilities,
    givers: &WorkGiverSet,
    cache: &mut TargetCache,
    candidates: &dyn CandidateSource,
    reservations: &dyn ReservationService,
    tasks: &mut dyn TaskFactory,
) -> Option<TaskHandle> {
    if should_skip(agent) {
        return None;
    }
    for giver in givers.iter() {
        let handle = try_assign(
            now,
            def,
            agent,
            caps,
            giver,
            cache,
            candidates,
            reservations,
            tasks,
        );
        if handle.is_some() {
            return handle;
        }
    }
    None
}
