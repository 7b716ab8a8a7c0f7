// sysdeps-core/tests/scan.rs
mod common;

use common::{Repo, GROUP};
use pretty_assertions::assert_eq;
use sysdeps_common::model::{Gav, GroupArtifact};
use sysdeps_core::scan;

#[test]
fn duplicate_descriptors_resolve_to_the_last_path() {
    let repo = Repo::new();
    let pom = |dir: &str| {
        repo.raw_pom(
            &format!("{dir}/lib.pom"),
            &format!(
                "<project><groupId>{GROUP}</groupId><artifactId>lib</artifactId><version>1</version></project>"
            ),
        )
    };
    pom("a-vendor");
    let last = pom("z-vendor");
    pom("m-vendor");

    for workers in [1, 4] {
        let mut options = repo.scan_options();
        options.workers = workers;
        let index = scan(&options);
        let entry = index.descriptor(&Gav::new(GROUP, "lib", "1")).unwrap();
        assert_eq!(entry.path, last);
    }
}

#[test]
fn identity_placeholders_are_expanded_from_own_properties() {
    let repo = Repo::new();
    repo.raw_pom(
        "tools/tools.pom",
        &format!(
            r#"<project>
                 <properties><tools.version>4.2</tools.version></properties>
                 <groupId>{GROUP}</groupId>
                 <artifactId>tools</artifactId>
                 <version>${{tools.version}}</version>
               </project>"#
        ),
    );
    repo.raw_pom(
        "broken/broken.pom",
        &format!("<project><groupId>{GROUP}</groupId><artifactId>broken</artifactId><version>${{nowhere}}</version></project>"),
    );
    repo.raw_pom("junk/junk.pom", "this is not xml");

    let index = repo.index();
    assert!(index.descriptor(&Gav::new(GROUP, "tools", "4.2")).is_some());
    assert_eq!(index.descriptor_count(), 1);
    assert_eq!(index.warnings().len(), 2);
    assert!(index.warnings().iter().any(|w| w.contains("broken.pom")));
}

#[test]
fn jars_natives_and_versions_are_indexed() {
    let repo = Repo::new();
    repo.module("core", "1.0", &[]);
    repo.module("core", "1.2", &[]);
    repo.loose_jar("commons-lang3.jar");
    repo.native("libjffi.so");
    repo.native("README");

    let index = repo.index();
    let ga = GroupArtifact::new(GROUP, "core");
    let mut versions: Vec<&str> = index.versions(&ga).collect();
    versions.sort();
    assert_eq!(versions, vec!["1.0", "1.2"]);
    assert_eq!(index.highest_version(&ga), Some("1.2"));
    assert!(index
        .artifact(&Gav::new(GROUP, "core", "1.2"), "jar", None)
        .is_some());
    assert!(index.loose_file("commons-lang3.jar").is_some());
    assert!(index.native_library("jffi").is_some());
    assert_eq!(index.native_count(), 1);
}

#[test]
fn missing_roots_and_zero_depth_yield_an_empty_index() {
    let repo = Repo::new();
    repo.module("core", "1.0", &[]);

    let mut options = repo.scan_options();
    options.max_depth = 0;
    assert_eq!(scan(&options).descriptor_count(), 0);

    options.max_depth = 10;
    options.roots = vec![repo.metadata().join("does-not-exist")];
    let index = scan(&options);
    assert_eq!(index.descriptor_count(), 0);
    assert!(index.warnings().is_empty());
}
