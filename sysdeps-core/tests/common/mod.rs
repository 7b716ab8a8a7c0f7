// sysdeps-core/tests/common/mod.rs
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sysdeps_core::{scan, ResolutionContext, ResolveOptions, RepositoryIndex, RootRequest, ScanOptions};
use tempfile::TempDir;

pub const GROUP: &str = "org.example";

/// A throw-away system repository: descriptors, flat jars and native libraries.
pub struct Repo {
    dir: TempDir,
}

impl Repo {
    pub fn new() -> Self {
        let repo = Self {
            dir: TempDir::new().unwrap(),
        };
        for dir in [repo.metadata(), repo.jars(), repo.natives()] {
            fs::create_dir_all(dir).unwrap();
        }
        repo
    }

    pub fn metadata(&self) -> PathBuf {
        self.dir.path().join("maven-poms")
    }

    pub fn jars(&self) -> PathBuf {
        self.dir.path().join("java")
    }

    pub fn natives(&self) -> PathBuf {
        self.dir.path().join("lib")
    }

    fn layout_dir(&self, artifact: &str, version: &str) -> PathBuf {
        self.metadata()
            .join(GROUP.replace('.', "/"))
            .join(artifact)
            .join(version)
    }

    /// Writes `<artifact>-<version>.pom` in repository layout; `body` goes
    /// after the identity elements.
    pub fn pom(&self, artifact: &str, version: &str, body: &str) -> PathBuf {
        let text = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{GROUP}</groupId>
  <artifactId>{artifact}</artifactId>
  <version>{version}</version>
  {body}
</project>
"#
        );
        self.write(&self.layout_dir(artifact, version).join(format!("{artifact}-{version}.pom")), &text)
    }

    /// A descriptor whose identity comes entirely from `text`.
    pub fn raw_pom(&self, relative: &str, text: &str) -> PathBuf {
        self.write(&self.metadata().join(relative), text)
    }

    /// Jar next to its descriptor.
    pub fn jar(&self, artifact: &str, version: &str) -> PathBuf {
        self.write(
            &self.layout_dir(artifact, version).join(format!("{artifact}-{version}.jar")),
            "PK",
        )
    }

    /// Descriptor with the given dependencies plus its jar.
    pub fn module(&self, artifact: &str, version: &str, dependencies: &[String]) {
        self.pom(artifact, version, &dependencies_block(dependencies));
        self.jar(artifact, version);
    }

    pub fn loose_jar(&self, file_name: &str) -> PathBuf {
        self.write(&self.jars().join(file_name), "PK")
    }

    pub fn native(&self, file_name: &str) -> PathBuf {
        self.write(&self.natives().join(file_name), "\x7fELF")
    }

    fn write(&self, path: &Path, text: &str) -> PathBuf {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
        path.to_path_buf()
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            roots: vec![self.metadata(), self.jars(), self.natives()],
            max_depth: 10,
            workers: 2,
            interpolation_passes: 10,
        }
    }

    pub fn index(&self) -> Arc<RepositoryIndex> {
        Arc::new(scan(&self.scan_options()))
    }

    pub fn context(&self) -> ResolutionContext {
        self.context_with(options())
    }

    pub fn context_with(&self, options: ResolveOptions) -> ResolutionContext {
        ResolutionContext::new(options, self.index())
    }
}

pub fn options() -> ResolveOptions {
    ResolveOptions {
        workers: 4,
        ..ResolveOptions::default()
    }
}

pub fn root(artifact_version: &str) -> RootRequest {
    format!("{GROUP}:{artifact_version}").parse().unwrap()
}

/// `<dependency>` element; `extra` is appended inside it.
pub fn dep(artifact: &str, version: Option<&str>, extra: &str) -> String {
    let version = version
        .map(|v| format!("<version>{v}</version>"))
        .unwrap_or_default();
    format!(
        "<dependency><groupId>{GROUP}</groupId><artifactId>{artifact}</artifactId>{version}{extra}</dependency>"
    )
}

pub fn dependencies_block(dependencies: &[String]) -> String {
    if dependencies.is_empty() {
        return String::new();
    }
    format!("<dependencies>{}</dependencies>", dependencies.concat())
}

pub fn management_block(entries: &[String]) -> String {
    format!(
        "<dependencyManagement><dependencies>{}</dependencies></dependencyManagement>",
        entries.concat()
    )
}

pub fn parent_block(artifact: &str, version: &str) -> String {
    format!("<parent><groupId>{GROUP}</groupId><artifactId>{artifact}</artifactId><version>{version}</version></parent>")
}
