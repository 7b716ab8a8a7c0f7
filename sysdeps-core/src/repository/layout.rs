// sysdeps-core/src/repository/layout.rs
//! File naming conventions: repository layout paths, artifact extensions and
//! native library names.
use std::path::{Component, Path};

use sysdeps_common::model::{Coordinate, Gav};
use tracing::trace;

const ARTIFACT_EXTENSIONS: &[&str] = &["jar", "war", "ear", "aar", "zip", "rar", "nbm"];

pub fn is_descriptor(file_name: &str) -> bool {
    file_name == "pom.xml" || file_name.ends_with(".pom")
}

pub fn is_artifact_extension(ext: &str) -> bool {
    ARTIFACT_EXTENSIONS.contains(&ext)
}

/// File extension used for a dependency `type`.
pub fn extension_for_type(kind: &str) -> &str {
    match kind {
        "" | "jar" | "bundle" | "test-jar" | "maven-plugin" | "ejb" | "ejb-client" | "java-source"
        | "javadoc" => "jar",
        other => other,
    }
}

/// Classifier implied by a dependency `type` when none is declared.
pub fn classifier_for_type(kind: &str) -> Option<&'static str> {
    match kind {
        "test-jar" => Some("tests"),
        "java-source" => Some("sources"),
        "javadoc" => Some("javadoc"),
        "ejb-client" => Some("client"),
        _ => None,
    }
}

/// Infers a coordinate from a `group/path/artifact/version/file` location
/// relative to a scan root. The file must be named
/// `artifact-version[-classifier].ext`.
pub fn coordinate_from_layout(root: &Path, path: &Path) -> Option<Coordinate> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;
    if parts.len() < 4 {
        return None;
    }

    let (file_name, dirs) = parts.split_last()?;
    let (version, dirs) = dirs.split_last()?;
    let (artifact, group_parts) = dirs.split_last()?;
    let (stem, ext) = file_name.rsplit_once('.')?;

    let prefix = format!("{artifact}-{version}");
    let rest = stem.strip_prefix(prefix.as_str())?;
    let classifier = match rest {
        "" => None,
        other => Some(other.strip_prefix('-')?.to_string()).filter(|c| !c.is_empty()),
    };
    if classifier.is_none() && !rest.is_empty() {
        return None;
    }

    let mut coordinate = Coordinate::new(group_parts.join("."), *artifact, *version).with_type(ext);
    coordinate.classifier = classifier;
    trace!("Layout path {} -> {}", relative.display(), coordinate);
    Some(coordinate)
}

/// `libfoo.so.1.2`, `libfoo.dylib`, `foo.dll`, `libfoo.jnilib` -> `foo`.
pub fn native_library_name(file_name: &str) -> Option<String> {
    let lower = file_name.to_ascii_lowercase();
    let base = if let Some(i) = lower.rfind(".so") {
        let suffix = &lower[i + 3..];
        let versioned = suffix.is_empty()
            || (suffix.starts_with('.') && suffix[1..].split('.').all(|p| p.chars().all(|c| c.is_ascii_digit())));
        if !versioned {
            return None;
        }
        &lower[..i]
    } else {
        lower
            .strip_suffix(".dylib")
            .or_else(|| lower.strip_suffix(".jnilib"))
            .or_else(|| lower.strip_suffix(".dll"))?
    };
    let name = base.strip_prefix("lib").filter(|n| !n.is_empty()).unwrap_or(base);
    (!name.is_empty()).then(|| name.to_string())
}

/// Native library names an artifact id may be shipped under.
pub fn native_names_for(artifact: &str) -> Vec<String> {
    let lower = artifact.to_ascii_lowercase();
    let mut names = vec![lower.clone()];
    for suffix in ["-natives", "-native", "-jni"] {
        if let Some(stripped) = lower.strip_suffix(suffix) {
            if !stripped.is_empty() && !names.iter().any(|n| n == stripped) {
                names.push(stripped.to_string());
            }
        }
    }
    names
}

/// Jar names used by flat system directories, most specific first.
pub fn loose_file_names(gav: &Gav, classifier: Option<&str>, ext: &str) -> Vec<String> {
    let suffix = classifier.map(|c| format!("-{c}")).unwrap_or_default();
    let mut stems = vec![
        format!("{}-{}{}", gav.artifact, gav.version, suffix),
        format!("{}{}", gav.artifact, suffix),
    ];

    // `org.apache.commons:io` is commonly installed as `commons-io.jar`.
    let group_parts: Vec<&str> = gav.group.split('.').collect();
    if let Some(last) = group_parts.last() {
        stems.push(format!("{last}-{}{suffix}", gav.artifact));
    }
    if group_parts.len() > 1 {
        stems.push(format!("{}-{}{suffix}", group_parts[1], gav.artifact));
    }

    let mut names: Vec<String> = Vec::new();
    for stem in stems {
        let name = format!("{stem}.{ext}");
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn layout_paths_yield_coordinates() {
        let root = PathBuf::from("/repo");
        let plain = coordinate_from_layout(&root, &root.join("org/x/lib/2.0/lib-2.0.jar")).unwrap();
        assert_eq!(plain.to_string(), "org.x:lib:2.0");

        let classified =
            coordinate_from_layout(&root, &root.join("org/x/lib/2.0/lib-2.0-linux.jar")).unwrap();
        assert_eq!(classified.classifier.as_deref(), Some("linux"));

        assert_eq!(coordinate_from_layout(&root, &root.join("lib/2.0/lib-2.0.jar")), None);
        assert_eq!(coordinate_from_layout(&root, &root.join("org/x/lib/2.0/other.jar")), None);
        assert_eq!(coordinate_from_layout(&root, &root.join("org/x/lib/2.0/lib-2.0x.jar")), None);
    }

    #[rstest]
    #[case("libfoo.so", Some("foo"))]
    #[case("libfoo.so.1.2", Some("foo"))]
    #[case("libFoo.dylib", Some("foo"))]
    #[case("foo.dll", Some("foo"))]
    #[case("libfoo.jnilib", Some("foo"))]
    #[case("lib.so", Some("lib"))]
    #[case("libfoo.soup", None)]
    #[case("foo.jar", None)]
    fn native_names(#[case] file: &str, #[case] expected: Option<&str>) {
        assert_eq!(native_library_name(file).as_deref(), expected);
    }

    #[test]
    fn native_candidates_strip_suffixes() {
        assert_eq!(native_names_for("netty-JNI"), vec!["netty-jni", "netty"]);
        assert_eq!(native_names_for("lz4"), vec!["lz4"]);
    }

    #[test]
    fn loose_names_cover_group_variants() {
        let gav = Gav::new("org.apache.commons", "io", "2.11");
        assert_eq!(
            loose_file_names(&gav, None, "jar"),
            vec![
                "io-2.11.jar".to_string(),
                "io.jar".to_string(),
                "commons-io.jar".to_string(),
                "apache-io.jar".to_string(),
            ]
        );
    }
}
