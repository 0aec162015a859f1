use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::Resource;
use bitflags::bitflags;
use tracing::debug;

use crate::agents::{AgentDef, AgentRole, DefId, WorkCategory};

/// Closed vocabulary of capability-override tags. Strings only exist at the
/// configuration boundary; everything past [`WorkTag::parse`] operates on the
/// variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkTag {
    /// Permit one category regardless of the role default.
    AllowWork(WorkCategory),
    /// Forbid one category regardless of the role default.
    BlockWork(WorkCategory),
    /// Default every category to permitted unless a specific tag says
    /// otherwise.
    AllowAllWork,
    /// Default every category to forbidden unless a specific tag says
    /// otherwise.
    BlockAllWork,
    /// Replace the intrinsic role consulted for category defaults.
    ForceRole(AgentRole),
    /// Make the agent draftable even if its role is not.
    ForceDraftable,
    /// Show the work priorities UI for the agent even if its role hides it.
    ShowWorkTab,
}

pub const ALLOW_WORK_PREFIX: &str = "AllowWork_";
pub const BLOCK_WORK_PREFIX: &str = "BlockWork_";
pub const FORCE_ROLE_PREFIX: &str = "ForceRole_";

impl WorkTag {
    /// Parse one raw tag string. Unknown strings resolve to `None`, the
    /// no-op sentinel; they must never poison the rest of the set.
    pub fn parse(raw: &str) -> Option<WorkTag> {
        match raw {
            "AllowAllWork" => return Some(WorkTag::AllowAllWork),
            "BlockAllWork" => return Some(WorkTag::BlockAllWork),
            "ForceDraftable" => return Some(WorkTag::ForceDraftable),
            "ShowWorkTab" => return Some(WorkTag::ShowWorkTab),
            _ => {}
        }
        if let Some(name) = raw.strip_prefix(ALLOW_WORK_PREFIX) {
            return WorkCategory::parse(name).map(WorkTag::AllowWork);
        }
        if let Some(name) = raw.strip_prefix(BLOCK_WORK_PREFIX) {
            return WorkCategory::parse(name).map(WorkTag::BlockWork);
        }
        if let Some(name) = raw.strip_prefix(FORCE_ROLE_PREFIX) {
            return AgentRole::parse(name).map(WorkTag::ForceRole);
        }
        None
    }
}

bitflags! {
    /// Behavior-injection flags produced by tag resolution.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct CapabilityFlags: u8 {
        const DRAFTABLE = 1 << 0;
        const WORK_TAB = 1 << 1;
    }
}

/// Resolved outcome of applying an agent definition's raw tag list.
///
/// Precedence when answering "may this agent attempt category C":
/// per-category override, then the global override, then the default set of
/// the forced role (if any), then the intrinsic role. Hard incapacities are
/// checked separately and beat everything here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveCapabilities {
    overrides: [Option<bool>; WorkCategory::ALL.len()],
    global_default: Option<bool>,
    forced_role: Option<AgentRole>,
    flags: CapabilityFlags,
}

impl EffectiveCapabilities {
    /// Resolve a raw tag set. Pure and deterministic: the same input always
    /// yields the same capability set, which is what makes per-definition
    /// memoization sound.
    pub fn from_raw_tags<'a>(raw: impl IntoIterator<Item = &'a str>) -> Self {
        let mut resolved = EffectiveCapabilities::default();
        for tag in raw {
            let Some(parsed) = WorkTag::parse(tag) else {
                debug!(target: "work_engine::tags", tag, "tag.unknown_ignored");
                continue;
            };
            resolved.apply(parsed);
        }
        resolved
    }

    fn apply(&mut self, tag: WorkTag) {
        match tag {
            WorkTag::AllowWork(category) => self.overrides[category.index()] = Some(true),
            WorkTag::BlockWork(category) => self.overrides[category.index()] = Some(false),
            WorkTag::AllowAllWork => self.global_default = Some(true),
            WorkTag::BlockAllWork => self.global_default = Some(false),
            WorkTag::ForceRole(role) => self.forced_role = Some(role),
            WorkTag::ForceDraftable => self.flags |= CapabilityFlags::DRAFTABLE,
            WorkTag::ShowWorkTab => self.flags |= CapabilityFlags::WORK_TAB,
        }
    }

    /// The per-category override if one exists, applying most-specific-wins
    /// between the prefixed and global tags. `None` means "fall back to the
    /// role default".
    pub fn category_override(&self, category: WorkCategory) -> Option<bool> {
        self.overrides[category.index()].or(self.global_default)
    }

    pub fn forced_role(&self) -> Option<AgentRole> {
        self.forced_role
    }

    pub fn flags(&self) -> CapabilityFlags {
        self.flags
    }
}

/// Memoizes tag resolution per agent definition. Definitions are few and
/// static, so entries never need invalidation inside a session; the memo is
/// only dropped wholesale when the vocabulary itself reloads.
#[derive(Resource, Debug, Default)]
pub struct TagVocabulary {
    resolved: HashMap<DefId, Arc<EffectiveCapabilities>>,
}

impl TagVocabulary {
    pub fn resolve(&mut self, def: &AgentDef) -> Arc<EffectiveCapabilities> {
        if let Some(cached) = self.resolved.get(&def.id) {
            return Arc::clone(cached);
        }
        let capabilities = Arc::new(EffectiveCapabilities::from_raw_tags(
            def.tags.iter().map(String::as_str),
        ));
        self.resolved.insert(def.id.clone(), Arc::clone(&capabilities));
        capabilities
    }

    /// Drop every memoized resolution. Invoked on vocabulary or locale
    /// reload, when raw tag strings may map differently.
    pub fn reset_vocabulary(&mut self) {
        self.resolved.clear();
    }

    pub fn cached_definitions(&self) -> usize {
        self.resolved.len()
    }
}
