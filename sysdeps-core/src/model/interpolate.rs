// sysdeps-core/src/model/interpolate.rs
//! `${name}` substitution in bounded passes.
use std::collections::BTreeMap;
use std::path::Path;

use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::ParentRef;

const DEFAULT_ENCODING: &str = "UTF-8";

pub fn has_placeholder(text: &str) -> bool {
    text.contains("${")
}

/// Where placeholder values come from, in lookup order.
#[derive(Debug, Clone, Copy)]
pub struct PropertyScope<'a> {
    pub overrides: &'a BTreeMap<String, String>,
    pub properties: &'a BTreeMap<String, String>,
    pub builtins: &'a BTreeMap<String, String>,
    pub env: &'a BTreeMap<String, String>,
    pub max_passes: usize,
}

impl<'a> PropertyScope<'a> {
    pub fn lookup(&self, name: &str) -> Option<&'a str> {
        self.overrides
            .get(name)
            .or_else(|| self.properties.get(name))
            .or_else(|| self.builtins.get(name))
            .or_else(|| name.strip_prefix("env.").and_then(|var| self.env.get(var)))
            .map(String::as_str)
    }

    pub fn interpolate(&self, text: &str) -> Result<String> {
        interpolate(text, |name| self.lookup(name), self.max_passes)
    }

    /// Like [`interpolate`](Self::interpolate), keeping the input on failure.
    pub fn interpolate_lossy(&self, text: &str) -> String {
        self.interpolate(text).unwrap_or_else(|_| text.to_string())
    }
}

/// Repeats substitution until a pass resolves nothing. A pass that still
/// resolves something after `max_passes` means the expression does not settle.
pub fn interpolate<'v, F>(text: &str, lookup: F, max_passes: usize) -> Result<String>
where
    F: Fn(&str) -> Option<&'v str>,
{
    let mut current = text.to_string();
    for _ in 0..max_passes {
        match substitute(&current, &lookup) {
            Some(next) => current = next,
            None => return Ok(current),
        }
    }
    match substitute(&current, &lookup) {
        None => Ok(current),
        Some(_) => Err(SysdepsError::InterpolationDepth {
            expression: text.to_string(),
            passes: max_passes,
        }),
    }
}

/// One pass. `None` when no placeholder could be resolved.
fn substitute<'v, F>(text: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<&'v str>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut resolved = false;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let name = &rest[start + 2..start + 2 + len];
        out.push_str(&rest[..start]);
        match lookup(name.trim()) {
            Some(value) => {
                out.push_str(value);
                resolved = true;
            }
            None => out.push_str(&rest[start..start + 3 + len]),
        }
        rest = &rest[start + 3 + len..];
    }
    out.push_str(rest);

    resolved.then_some(out)
}

/// Properties every descriptor defines implicitly.
pub fn builtins(
    group: &str,
    artifact: &str,
    version: &str,
    packaging: &str,
    parent: Option<&ParentRef>,
    basedir: Option<&Path>,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for prefix in ["project.", "pom.", ""] {
        map.insert(format!("{prefix}groupId"), group.to_string());
        map.insert(format!("{prefix}artifactId"), artifact.to_string());
        map.insert(format!("{prefix}version"), version.to_string());
        map.insert(format!("{prefix}packaging"), packaging.to_string());
    }
    if let Some(parent) = parent {
        for prefix in ["project.parent.", "parent."] {
            map.insert(format!("{prefix}groupId"), parent.group.clone());
            map.insert(format!("{prefix}artifactId"), parent.artifact.clone());
            map.insert(format!("{prefix}version"), parent.version.clone());
        }
    }
    if let Some(dir) = basedir {
        let dir = dir.display().to_string();
        map.insert("project.basedir".to_string(), dir.clone());
        map.insert("basedir".to_string(), dir);
    }
    map.insert("project.build.sourceEncoding".to_string(), DEFAULT_ENCODING.to_string());
    map.insert("project.reporting.outputEncoding".to_string(), DEFAULT_ENCODING.to_string());
    map
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run(text: &str, properties: &BTreeMap<String, String>) -> Result<String> {
        let empty = BTreeMap::new();
        PropertyScope {
            overrides: &empty,
            properties,
            builtins: &empty,
            env: &empty,
            max_passes: 10,
        }
        .interpolate(text)
    }

    #[test]
    fn chains_resolve() {
        let properties = props(&[("a", "${b}"), ("b", "1")]);
        assert_eq!(run("${a}", &properties).unwrap(), "1");
        assert_eq!(run("v${a}-${b}.x", &properties).unwrap(), "v1-1.x");
    }

    #[test]
    fn self_reference_fails() {
        let properties = props(&[("a", "${a}")]);
        let err = run("${a}", &properties).unwrap_err();
        assert!(matches!(err, SysdepsError::InterpolationDepth { passes: 10, .. }));
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let properties = props(&[("b", "1")]);
        assert_eq!(run("${missing}-${b}", &properties).unwrap(), "${missing}-1");
        assert_eq!(run("${unterminated", &properties).unwrap(), "${unterminated");
    }

    #[test]
    fn lookup_order_prefers_overrides_then_properties_then_builtins() {
        let overrides = props(&[("v", "override")]);
        let properties = props(&[("v", "model"), ("project.version", "shadow")]);
        let builtins = builtins("g", "a", "1.0", "jar", None, None);
        let env = props(&[("HOME", "/home/u")]);
        let scope = PropertyScope {
            overrides: &overrides,
            properties: &properties,
            builtins: &builtins,
            env: &env,
            max_passes: 10,
        };

        assert_eq!(scope.interpolate("${v}").unwrap(), "override");
        assert_eq!(scope.interpolate("${project.version}").unwrap(), "shadow");
        assert_eq!(scope.interpolate("${pom.artifactId}").unwrap(), "a");
        assert_eq!(scope.interpolate("${project.build.sourceEncoding}").unwrap(), "UTF-8");
        assert_eq!(scope.interpolate("${env.HOME}").unwrap(), "/home/u");
    }
}
