// sysdeps-core/src/descriptor/parser.rs
//! POM parsing. Element lookup ignores namespaces; declaration order is kept.
use std::fs;
use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};
use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::{
    Activation, FileCondition, GroupArtifact, ParentRef, PropertyCondition, RawDependency,
    RawModel, RawProfile,
};
use tracing::debug;

/// Group, artifact, version and packaging as written, plus what the parent adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityFields {
    pub group: Option<String>,
    pub artifact: String,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: Vec<(String, String)>,
}

pub fn load(path: &Path) -> Result<RawModel> {
    let text = fs::read_to_string(path)?;
    parse(path, &text)
}

pub fn parse(path: &Path, text: &str) -> Result<RawModel> {
    let doc = open(path, text)?;
    let project = doc.root_element();
    let identity = identity_of(path, project)?;
    let mut warnings = Vec::new();

    let dependencies = dependency_list(child(project, "dependencies"), &mut warnings);
    let management = dependency_list(
        child(project, "dependencyManagement").and_then(|dm| child(dm, "dependencies")),
        &mut warnings,
    );
    let profiles: Vec<RawProfile> = child(project, "profiles")
        .map(|profiles| {
            elements(profiles, "profile")
                .enumerate()
                .map(|(i, p)| profile(p, i, &mut warnings))
                .collect()
        })
        .unwrap_or_default();

    debug!(
        "Parsed {}: {} dependencies, {} managed, {} profiles",
        path.display(),
        dependencies.len(),
        management.len(),
        profiles.len()
    );

    Ok(RawModel {
        path: path.to_path_buf(),
        group: identity.group,
        artifact: identity.artifact,
        version: identity.version,
        packaging: identity.packaging,
        parent: identity.parent,
        properties: identity.properties,
        dependencies,
        management,
        profiles,
        warnings,
    })
}

/// Cheap parse used while indexing: skips dependencies and profiles.
pub fn parse_identity(path: &Path, text: &str) -> Result<IdentityFields> {
    let doc = open(path, text)?;
    identity_of(path, doc.root_element())
}

fn open<'i>(path: &Path, text: &'i str) -> Result<Document<'i>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options).map_err(|e| SysdepsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let root = doc.root_element().tag_name().name();
    if root != "project" {
        return Err(SysdepsError::Parse {
            path: path.to_path_buf(),
            message: format!("expected <project> root element, found <{root}>"),
        });
    }
    Ok(doc)
}

fn identity_of(path: &Path, project: Node<'_, '_>) -> Result<IdentityFields> {
    let artifact = text_of(project, "artifactId").ok_or_else(|| SysdepsError::MissingField {
        path: path.to_path_buf(),
        field: "artifactId",
    })?;
    let parent = child(project, "parent")
        .map(|p| parent_ref(path, p))
        .transpose()?;
    let group = text_of(project, "groupId");
    if group.is_none() && parent.is_none() {
        return Err(SysdepsError::MissingField {
            path: path.to_path_buf(),
            field: "groupId",
        });
    }

    Ok(IdentityFields {
        group,
        artifact,
        version: text_of(project, "version"),
        packaging: text_of(project, "packaging"),
        parent,
        properties: child(project, "properties").map(properties).unwrap_or_default(),
    })
}

fn parent_ref(path: &Path, node: Node<'_, '_>) -> Result<ParentRef> {
    let field = |name: &'static str| {
        text_of(node, name).ok_or_else(|| SysdepsError::MissingField {
            path: path.to_path_buf(),
            field: name,
        })
    };
    Ok(ParentRef {
        group: field("groupId")?,
        artifact: field("artifactId")?,
        version: field("version")?,
        relative_path: child(node, "relativePath").map(|n| n.text().unwrap_or("").trim().to_string()),
    })
}

fn properties(node: Node<'_, '_>) -> Vec<(String, String)> {
    node.children()
        .filter(Node::is_element)
        .map(|p| {
            (
                p.tag_name().name().to_string(),
                p.text().unwrap_or("").trim().to_string(),
            )
        })
        .collect()
}

fn dependency_list(node: Option<Node<'_, '_>>, warnings: &mut Vec<String>) -> Vec<RawDependency> {
    let Some(node) = node else {
        return Vec::new();
    };
    elements(node, "dependency")
        .filter_map(|dep| {
            let group = text_of(dep, "groupId");
            let artifact = text_of(dep, "artifactId");
            match (group, artifact) {
                (Some(group), Some(artifact)) => Some(RawDependency {
                    group,
                    artifact,
                    version: text_of(dep, "version"),
                    kind: text_of(dep, "type"),
                    classifier: text_of(dep, "classifier"),
                    scope: text_of(dep, "scope"),
                    optional: text_of(dep, "optional"),
                    exclusions: child(dep, "exclusions").map(exclusions).unwrap_or_default(),
                }),
                (group, artifact) => {
                    warnings.push(format!(
                        "skipped dependency without groupId/artifactId ({}:{})",
                        group.as_deref().unwrap_or("?"),
                        artifact.as_deref().unwrap_or("?")
                    ));
                    None
                }
            }
        })
        .collect()
}

fn exclusions(node: Node<'_, '_>) -> Vec<GroupArtifact> {
    elements(node, "exclusion")
        .map(|e| {
            GroupArtifact::new(
                text_of(e, "groupId").unwrap_or_else(|| "*".to_string()),
                text_of(e, "artifactId").unwrap_or_else(|| "*".to_string()),
            )
        })
        .collect()
}

fn profile(node: Node<'_, '_>, index: usize, warnings: &mut Vec<String>) -> RawProfile {
    RawProfile {
        id: text_of(node, "id").unwrap_or_else(|| format!("profile-{index}")),
        activation: child(node, "activation").map(activation),
        properties: child(node, "properties").map(properties).unwrap_or_default(),
        dependencies: dependency_list(child(node, "dependencies"), warnings),
        management: dependency_list(
            child(node, "dependencyManagement").and_then(|dm| child(dm, "dependencies")),
            warnings,
        ),
    }
}

fn activation(node: Node<'_, '_>) -> Activation {
    let mut activation = Activation {
        active_by_default: text_of(node, "activeByDefault").is_some_and(|v| v == "true"),
        ..Activation::default()
    };
    for condition in node.children().filter(Node::is_element) {
        match condition.tag_name().name() {
            "activeByDefault" => {}
            "property" => {
                activation.property = text_of(condition, "name").map(|name| PropertyCondition {
                    name,
                    value: text_of(condition, "value"),
                })
            }
            "file" => {
                activation.file = text_of(condition, "exists")
                    .map(FileCondition::Exists)
                    .or_else(|| text_of(condition, "missing").map(FileCondition::Missing))
            }
            other => activation.unsupported.push(other.to_string()),
        }
    }
    activation
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn elements<'a, 'i: 'a>(node: Node<'a, 'i>, name: &'a str) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn text_of(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    fn path() -> PathBuf {
        PathBuf::from("/poms/lib.pom")
    }

    #[test]
    fn parses_namespaced_descriptor_in_order() {
        let xml = r#"<?xml version="1.0"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <parent>
    <groupId>org.x</groupId>
    <artifactId>parent</artifactId>
    <version>1.0</version>
  </parent>
  <artifactId>lib</artifactId>
  <version>${revision}</version>
  <properties>
    <revision>2.0</revision>
    <dep.version>3.0</dep.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>org.x</groupId>
      <artifactId>b</artifactId>
      <version>${dep.version}</version>
      <exclusions>
        <exclusion><groupId>org.y</groupId><artifactId>*</artifactId></exclusion>
      </exclusions>
    </dependency>
    <dependency>
      <groupId>org.x</groupId>
      <artifactId>a</artifactId>
      <scope>test</scope>
      <optional>true</optional>
    </dependency>
    <dependency><artifactId>broken</artifactId></dependency>
  </dependencies>
</project>"#;

        let model = parse(&path(), xml).unwrap();
        assert_eq!(model.group(), Some("org.x"));
        assert_eq!(model.version.as_deref(), Some("${revision}"));
        assert_eq!(
            model.properties,
            vec![
                ("revision".to_string(), "2.0".to_string()),
                ("dep.version".to_string(), "3.0".to_string())
            ]
        );
        let names: Vec<_> = model.dependencies.iter().map(|d| d.artifact.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(model.dependencies[0].exclusions, vec![GroupArtifact::new("org.y", "*")]);
        assert_eq!(model.dependencies[1].optional.as_deref(), Some("true"));
        assert_eq!(model.warnings.len(), 1);
    }

    #[test]
    fn parses_profiles_and_management() {
        let xml = r#"<project>
  <groupId>g</groupId><artifactId>a</artifactId><version>1</version>
  <dependencyManagement><dependencies>
    <dependency><groupId>g</groupId><artifactId>bom</artifactId><version>1</version><type>pom</type><scope>import</scope></dependency>
  </dependencies></dependencyManagement>
  <profiles>
    <profile>
      <id>linux</id>
      <activation>
        <property><name>!skip</name></property>
        <file><missing>${basedir}/marker</missing></file>
        <os><family>unix</family></os>
      </activation>
      <properties><native>so</native></properties>
    </profile>
    <profile><activation><activeByDefault>true</activeByDefault></activation></profile>
  </profiles>
</project>"#;

        let model = parse(&path(), xml).unwrap();
        assert_eq!(model.management[0].scope.as_deref(), Some("import"));
        assert_eq!(model.profiles.len(), 2);

        let linux = model.profiles[0].activation.clone().unwrap();
        assert_eq!(linux.property.unwrap().name, "!skip");
        assert_eq!(linux.file, Some(FileCondition::Missing("${basedir}/marker".into())));
        assert_eq!(linux.unsupported, vec!["os".to_string()]);

        assert_eq!(model.profiles[1].id, "profile-1");
        assert!(model.profiles[1].activation.as_ref().unwrap().active_by_default);
    }

    #[test]
    fn missing_fields_are_reported() {
        let err = parse(&path(), "<project><groupId>g</groupId></project>").unwrap_err();
        assert!(matches!(err, SysdepsError::MissingField { field: "artifactId", .. }));

        let err = parse(&path(), "<project><artifactId>a</artifactId></project>").unwrap_err();
        assert!(matches!(err, SysdepsError::MissingField { field: "groupId", .. }));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = parse(&path(), "<project><artifactId>a</project>").unwrap_err();
        assert!(matches!(err, SysdepsError::Parse { .. }));

        let err = parse(&path(), "<settings/>").unwrap_err();
        assert!(matches!(err, SysdepsError::Parse { .. }));
    }
}
