use crate::agents::{AgentDef, WorkCategory};
use crate::tags::{CapabilityFlags, EffectiveCapabilities};

/// Answer "may this agent attempt this work category at all".
///
/// A hard incapacity on the definition always wins: tags can grant a
/// category the role would not allow, but they cannot restore a capacity
/// the definition has lost. Below that, per-category tags beat the global
/// tag, the global tag beats role defaults, and a forced role replaces
/// only the default set consulted when every tag misses.
pub fn can_attempt(def: &AgentDef, caps: &EffectiveCapabilities, category: WorkCategory) -> bool {
    if def.incapacities.intersects(category.required_capacities()) {
        return false;
    }
    if let Some(permitted) = caps.category_override(category) {
        return permitted;
    }
    let role = caps.forced_role().unwrap_or(def.role);
    role.default_enables(category)
}

/// Whether the agent can be drafted, either intrinsically or via tag.
pub fn is_draftable(def: &AgentDef, caps: &EffectiveCapabilities) -> bool {
    matches!(def.role, crate::agents::AgentRole::Colonist)
        || caps.flags().contains(CapabilityFlags::DRAFTABLE)
}

/// Whether the work priorities UI should be shown for the agent.
pub fn shows_work_tab(def: &AgentDef, caps: &EffectiveCapabilities) -> bool {
    matches!(def.role, crate::agents::AgentRole::Colonist)
        || caps.flags().contains(CapabilityFlags::WORK_TAB)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentRole, IncapacityFlags};

    fn resolve(def: &AgentDef) -> EffectiveCapabilities {
        EffectiveCapabilities::from_raw_tags(def.tags.iter().map(String::as_str))
    }

    #[test]
    fn hard_incapacity_beats_any_grant_tag() {
        let def = AgentDef::new("pacifist", AgentRole::Colonist)
            .with_tags(["AllowAllWork", "AllowWork_hunting"])
            .with_incapacities(IncapacityFlags::VIOLENT);
        let caps = resolve(&def);
        assert!(!can_attempt(&def, &caps, WorkCategory::Hunting));
        assert!(!can_attempt(&def, &caps, WorkCategory::Warden));
        // Non-violent categories are untouched by the incapacity.
        assert!(can_attempt(&def, &caps, WorkCategory::Hauling));
    }

    #[test]
    fn no_tags_falls_back_to_intrinsic_role_default() {
        let def = AgentDef::new("mule", AgentRole::Animal);
        let caps = resolve(&def);
        for category in WorkCategory::ALL {
            assert_eq!(
                can_attempt(&def, &caps, category),
                AgentRole::Animal.default_enables(category)
            );
        }
    }

    #[test]
    fn forced_role_changes_only_the_default_set() {
        // Forced animal role narrows the defaults, but the explicit allow
        // tag still applies on top of it.
        let def = AgentDef::new("beast_scholar", AgentRole::Colonist)
            .with_tags(["ForceRole_animal", "AllowWork_research"]);
        let caps = resolve(&def);
        assert!(can_attempt(&def, &caps, WorkCategory::Research));
        assert!(can_attempt(&def, &caps, WorkCategory::Hauling));
        assert!(!can_attempt(&def, &caps, WorkCategory::Construction));
    }

    #[test]
    fn forced_role_does_not_bypass_explicit_blocks() {
        let def = AgentDef::new("muzzled", AgentRole::Animal)
            .with_tags(["ForceRole_colonist", "BlockWork_hunting"]);
        let caps = resolve(&def);
        assert!(!can_attempt(&def, &caps, WorkCategory::Hunting));
        assert!(can_attempt(&def, &caps, WorkCategory::Construction));
    }

    #[test]
    fn tag_grants_draft_and_work_tab_to_non_colonists() {
        let plain = AgentDef::new("plain_animal", AgentRole::Animal);
        let caps = resolve(&plain);
        assert!(!is_draftable(&plain, &caps));
        assert!(!shows_work_tab(&plain, &caps));

        let tagged = AgentDef::new("war_beast", AgentRole::Animal)
            .with_tags(["ForceDraftable", "ShowWorkTab"]);
        let caps = resolve(&tagged);
        assert!(is_draftable(&tagged, &caps));
        assert!(shows_work_tab(&tagged, &caps));
    }
}
