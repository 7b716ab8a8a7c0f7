// sysdeps-core/src/model/profile.rs
use std::path::Path;

use sysdeps_common::model::{FileCondition, ProfileDecision, PropertyCondition, RawModel, RawProfile};
use tracing::debug;

use super::interpolate::PropertyScope;

/// Inputs to activation for one descriptor.
pub struct ActivationInputs<'a> {
    /// Overrides first, then inherited and own base properties.
    pub properties: PropertyScope<'a>,
    /// Profile ids requested for the run; `!id` forces a profile off.
    pub requested: &'a [String],
    pub basedir: &'a Path,
}

enum Verdict {
    Requested,
    Suppressed,
    ByDefault,
    Conditions(bool, String),
    Unconditional,
}

/// Evaluates every profile of `raw`, returning the active ones in declaration
/// order together with a decision record for each profile.
pub fn select<'r>(raw: &'r RawModel, inputs: &ActivationInputs<'_>) -> (Vec<&'r RawProfile>, Vec<ProfileDecision>) {
    let declared_in = raw
        .gav()
        .map(|g| g.to_string())
        .unwrap_or_else(|| raw.path.display().to_string());
    let verdicts: Vec<Verdict> = raw.profiles.iter().map(|p| evaluate(p, inputs)).collect();

    // Default profiles only apply when nothing else in the same descriptor activates.
    let other_active = verdicts
        .iter()
        .any(|v| matches!(v, Verdict::Requested | Verdict::Unconditional | Verdict::Conditions(true, _)));

    let mut active = Vec::new();
    let mut decisions = Vec::new();
    for (profile, verdict) in raw.profiles.iter().zip(verdicts) {
        let (is_active, reason) = match verdict {
            Verdict::Requested => (true, "requested".to_string()),
            Verdict::Suppressed => (false, "deactivated by request".to_string()),
            Verdict::ByDefault if other_active => {
                (false, "activeByDefault overridden by another active profile".to_string())
            }
            Verdict::ByDefault => (true, "activeByDefault".to_string()),
            Verdict::Conditions(result, reason) => (result, reason),
            Verdict::Unconditional => (true, "no activation conditions".to_string()),
        };
        debug!(
            "Profile {} in {}: {} ({})",
            profile.id,
            declared_in,
            if is_active { "active" } else { "inactive" },
            reason
        );
        if is_active {
            active.push(profile);
        }
        decisions.push(ProfileDecision {
            declared_in: declared_in.clone(),
            id: profile.id.clone(),
            active: is_active,
            reason,
        });
    }
    (active, decisions)
}

fn evaluate(profile: &RawProfile, inputs: &ActivationInputs<'_>) -> Verdict {
    if inputs.requested.iter().any(|r| r.strip_prefix('!') == Some(profile.id.as_str())) {
        return Verdict::Suppressed;
    }
    if inputs.requested.iter().any(|r| *r == profile.id) {
        return Verdict::Requested;
    }
    let Some(activation) = &profile.activation else {
        return Verdict::Unconditional;
    };

    let mut checks = Vec::new();
    if let Some(property) = &activation.property {
        checks.push(property_holds(property, inputs));
    }
    if let Some(file) = &activation.file {
        checks.push(file_holds(file, inputs));
    }
    for unsupported in &activation.unsupported {
        checks.push((false, format!("{unsupported} activation is not evaluated offline")));
    }

    if checks.is_empty() {
        return if activation.active_by_default {
            Verdict::ByDefault
        } else {
            Verdict::Unconditional
        };
    }
    if checks.iter().all(|(ok, _)| *ok) {
        let reason = checks.into_iter().map(|(_, r)| r).collect::<Vec<_>>().join(", ");
        return Verdict::Conditions(true, reason);
    }
    if activation.active_by_default {
        return Verdict::ByDefault;
    }
    let reason = checks
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, r)| r)
        .collect::<Vec<_>>()
        .join(", ");
    Verdict::Conditions(false, reason)
}

fn property_holds(condition: &PropertyCondition, inputs: &ActivationInputs<'_>) -> (bool, String) {
    let (name, negated) = match condition.name.strip_prefix('!') {
        Some(name) => (name, true),
        None => (condition.name.as_str(), false),
    };
    let actual = inputs.properties.lookup(name);

    match (&condition.value, negated) {
        (None, false) => (actual.is_some(), format!("property {name} is set")),
        (None, true) => (actual.is_none(), format!("property {name} is not set")),
        (Some(expected), _) => match expected.strip_prefix('!') {
            Some(unwanted) => (
                actual.is_some_and(|v| v != unwanted),
                format!("property {name} != {unwanted}"),
            ),
            None => (actual == Some(expected.as_str()), format!("property {name} = {expected}")),
        },
    }
}

fn file_holds(condition: &FileCondition, inputs: &ActivationInputs<'_>) -> (bool, String) {
    let (pattern, want_exists) = match condition {
        FileCondition::Exists(p) => (p, true),
        FileCondition::Missing(p) => (p, false),
    };
    let expanded = inputs.properties.interpolate_lossy(pattern);
    let path = inputs.basedir.join(&expanded);
    let exists = path.exists();
    let verb = if want_exists { "exists" } else { "is missing" };
    (exists == want_exists, format!("file {expanded} {verb}"))
}
