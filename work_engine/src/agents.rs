use std::collections::HashMap;
use std::fmt;

use bevy::math::Vec2;
use bevy::prelude::Resource;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Identifier for a loaded map instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub u32);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map#{}", self.0)
    }
}

/// Identifier for a live agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Identifier for a candidate target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

/// Identifier for an agent definition. Definitions are static data loaded
/// once per session; agents reference them by id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefId(pub String);

impl DefId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of work categories agents can be assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkCategory {
    Hauling,
    Construction,
    Growing,
    Medical,
    Hunting,
    Warden,
    Research,
    Cleaning,
}

impl WorkCategory {
    pub const ALL: [WorkCategory; 8] = [
        WorkCategory::Hauling,
        WorkCategory::Construction,
        WorkCategory::Growing,
        WorkCategory::Medical,
        WorkCategory::Hunting,
        WorkCategory::Warden,
        WorkCategory::Research,
        WorkCategory::Cleaning,
    ];

    pub fn index(self) -> usize {
        match self {
            WorkCategory::Hauling => 0,
            WorkCategory::Construction => 1,
            WorkCategory::Growing => 2,
            WorkCategory::Medical => 3,
            WorkCategory::Hunting => 4,
            WorkCategory::Warden => 5,
            WorkCategory::Research => 6,
            WorkCategory::Cleaning => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkCategory::Hauling => "hauling",
            WorkCategory::Construction => "construction",
            WorkCategory::Growing => "growing",
            WorkCategory::Medical => "medical",
            WorkCategory::Hunting => "hunting",
            WorkCategory::Warden => "warden",
            WorkCategory::Research => "research",
            WorkCategory::Cleaning => "cleaning",
        }
    }

    pub fn parse(name: &str) -> Option<WorkCategory> {
        WorkCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == name)
    }

    /// Capacities an agent must not have lost to perform this category.
    pub fn required_capacities(self) -> IncapacityFlags {
        match self {
            WorkCategory::Hauling | WorkCategory::Cleaning => IncapacityFlags::MANUAL,
            WorkCategory::Construction | WorkCategory::Growing => IncapacityFlags::MANUAL,
            WorkCategory::Medical => IncapacityFlags::CARING,
            WorkCategory::Hunting | WorkCategory::Warden => IncapacityFlags::VIOLENT,
            WorkCategory::Research => IncapacityFlags::SKILLED,
        }
    }
}

impl fmt::Display for WorkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Hard incapacities baked into an agent definition. An incapacity can
    /// never be overridden by a tag grant.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct IncapacityFlags: u8 {
        const VIOLENT = 1 << 0;
        const MANUAL = 1 << 1;
        const SKILLED = 1 << 2;
        const CARING = 1 << 3;
    }
}

/// Intrinsic behavioral role of an agent definition. A role carries the
/// default set of work categories its agents perform when no tag says
/// otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Colonist,
    Animal,
    Drone,
}

impl AgentRole {
    pub fn default_enables(self, category: WorkCategory) -> bool {
        match self {
            AgentRole::Colonist => true,
            AgentRole::Animal => matches!(category, WorkCategory::Hauling),
            AgentRole::Drone => matches!(
                category,
                WorkCategory::Hauling | WorkCategory::Construction | WorkCategory::Cleaning
            ),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::Colonist => "colonist",
            AgentRole::Animal => "animal",
            AgentRole::Drone => "drone",
        }
    }

    pub fn parse(name: &str) -> Option<AgentRole> {
        match name {
            "colonist" => Some(AgentRole::Colonist),
            "animal" => Some(AgentRole::Animal),
            "drone" => Some(AgentRole::Drone),
            _ => None,
        }
    }
}

/// Static definition shared by every agent spawned from it. Tags are
/// read-only configuration; they are never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDef {
    pub id: DefId,
    pub role: AgentRole,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub incapacities: IncapacityFlags,
}

impl AgentDef {
    pub fn new(id: impl Into<String>, role: AgentRole) -> Self {
        Self {
            id: DefId::new(id),
            role,
            tags: Vec::new(),
            incapacities: IncapacityFlags::empty(),
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_incapacities(mut self, incapacities: IncapacityFlags) -> Self {
        self.incapacities = incapacities;
        self
    }
}

/// Per-agent runtime state sampled each tick by the orchestrator.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub id: AgentId,
    pub def: DefId,
    pub map: MapId,
    pub position: Vec2,
    pub dead: bool,
    pub downed: bool,
    pub drafted: bool,
}

impl AgentState {
    pub fn new(id: AgentId, def: DefId, map: MapId, position: Vec2) -> Self {
        Self {
            id,
            def,
            map,
            position,
            dead: false,
            downed: false,
            drafted: false,
        }
    }
}

/// How a target has been marked for interaction by the player or the
/// simulation. Validation rejects candidates whose mode does not match the
/// requested work category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    None,
    Hunt,
    Slaughter,
    Arrest,
    Treat,
}

bitflags! {
    /// One designation bit per work category; a set bit means the target has
    /// been explicitly flagged for that category.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DesignationFlags: u16 {
        const HAULING = 1 << 0;
        const CONSTRUCTION = 1 << 1;
        const GROWING = 1 << 2;
        const MEDICAL = 1 << 3;
        const HUNTING = 1 << 4;
        const WARDEN = 1 << 5;
        const RESEARCH = 1 << 6;
        const CLEANING = 1 << 7;
    }
}

impl DesignationFlags {
    pub fn for_category(category: WorkCategory) -> DesignationFlags {
        DesignationFlags::from_bits_truncate(1 << category.index())
    }
}

/// Immutable snapshot of a candidate target taken at cache-refresh time.
/// Consumers must still validate the live target before committing to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRef {
    pub id: TargetId,
    pub position: Vec2,
    pub alive: bool,
    pub designations: DesignationFlags,
    pub mode: InteractionMode,
}

impl TargetRef {
    pub fn new(id: TargetId, position: Vec2) -> Self {
        Self {
            id,
            position,
            alive: true,
            designations: DesignationFlags::empty(),
            mode: InteractionMode::None,
        }
    }

    pub fn with_designation(mut self, category: WorkCategory) -> Self {
        self.designations |= DesignationFlags::for_category(category);
        self
    }

    pub fn with_mode(mut self, mode: InteractionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn designated_for(&self, category: WorkCategory) -> bool {
        self.designations
            .contains(DesignationFlags::for_category(category))
    }
}

/// Registry of agent definitions and live agents known to the simulation.
#[derive(Resource, Debug, Clone, Default)]
pub struct AgentRegistry {
    defs: HashMap<DefId, AgentDef>,
    agents: Vec<AgentState>,
}

impl AgentRegistry {
    pub fn register_def(&mut self, def: AgentDef) {
        self.defs.insert(def.id.clone(), def);
    }

    pub fn def(&self, id: &DefId) -> Option<&AgentDef> {
        self.defs.get(id)
    }

    pub fn spawn(&mut self, agent: AgentState) {
        self.agents.push(agent);
    }

    pub fn find(&self, id: AgentId) -> Option<&AgentState> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn find_mut(&mut self, id: AgentId) -> Option<&mut AgentState> {
        self.agents.iter_mut().find(|agent| agent.id == id)
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn clear(&mut self) {
        self.defs.clear();
        self.agents.clear();
    }
}
