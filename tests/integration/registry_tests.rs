use skillz::SkillzError;
use skillz::registry::{SkillRegistry, SkipReason};
use skillz::test_utils::{SkillFixture, SkillSpec};

#[test]
fn echo_skill_is_registered_by_slug() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Echo", "Test skill"));

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    let skill = registry.get("echo").unwrap();

    assert_eq!(skill.metadata().name, "Echo");
    assert_eq!(skill.metadata().description, "Test skill");
    assert!(skill.metadata().license.is_none());
    assert!(!skill.is_archive());
    assert_eq!(registry.report().registered, vec!["echo"]);
}

#[test]
fn unrecognized_header_keys_land_in_extra() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("PDF", "x").manifest(
        "---\nname: PDF Tools\ndescription: Work with PDFs\nlicense: MIT\nallowed-tools: [Read, Bash]\nversion: 2\ntags: [docs]\n---\n# PDF\n",
    ));

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    let skill = registry.get("pdf-tools").unwrap();
    let metadata = skill.metadata();

    assert_eq!(metadata.license.as_deref(), Some("MIT"));
    assert_eq!(metadata.allowed_tools, vec!["Read", "Bash"]);
    let mut keys: Vec<&str> = metadata.extra.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["tags", "version"]);
    assert_eq!(skill.body(), "# PDF\n");
}

#[test]
fn first_discovered_wins_on_slug_collision() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Echo", "first").dir_name("a-echo"));
    fixture.write_dir(&SkillSpec::new("echo!", "second").dir_name("b-echo"));

    let registry = SkillRegistry::load(fixture.root()).unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("echo").unwrap().metadata().description, "first");
    let skipped = &registry.report().skipped;
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].path.ends_with("b-echo"));
    assert_eq!(
        skipped[0].reason,
        SkipReason::DuplicateSlug {
            slug: "echo".to_string()
        }
    );
}

#[test]
fn directory_beats_archive_only_by_path_order() {
    let fixture = SkillFixture::new();
    fixture.write_archive(&SkillSpec::new("Echo", "from archive").dir_name("a"), None);
    fixture.write_dir(&SkillSpec::new("Echo", "from directory").dir_name("b"));

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    let skill = registry.get("echo").unwrap();

    assert!(skill.is_archive());
    assert_eq!(skill.metadata().description, "from archive");
}

#[test]
fn invalid_manifests_are_skipped_not_fatal() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Good", "fine"));
    fixture.write_dir(
        &SkillSpec::new("Bad", "x").manifest("---\nname: Bad\n---\nno description\n"),
    );
    fixture.write_dir(&SkillSpec::new("NoHeader", "x").manifest("# just markdown\n"));

    let registry = SkillRegistry::load(fixture.root()).unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.find("good").is_some());
    assert_eq!(registry.report().skipped.len(), 2);
    assert!(registry
        .report()
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::InvalidManifest { .. })));
}

#[test]
fn non_skill_entries_are_ignored() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Echo", "Test skill"));
    std::fs::create_dir_all(fixture.root().join("empty-dir/nested")).unwrap();
    fixture.write_raw("README.md", "not a skill");

    let registry = SkillRegistry::load(fixture.root()).unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.report().skipped.is_empty());
}

#[test]
fn missing_root_is_a_discovery_error() {
    let fixture = SkillFixture::new();
    let err = SkillRegistry::load(fixture.root().join("nope")).unwrap_err();
    assert!(matches!(err, SkillzError::Discovery(_)));

    let file = fixture.write_raw("file.txt", "x");
    let err = SkillRegistry::load(file).unwrap_err();
    assert!(matches!(err, SkillzError::Discovery(_)));
}

#[test]
fn unknown_slug_lookup_fails() {
    let fixture = SkillFixture::new();
    let registry = SkillRegistry::load(fixture.root()).unwrap();
    assert!(registry.is_empty());
    let err = registry.get("ghost").unwrap_err();
    assert!(matches!(err, SkillzError::SkillNotFound(_)));
}

#[test]
fn resources_exclude_manifest_and_are_sorted() {
    let fixture = SkillFixture::new();
    fixture.write_dir(
        &SkillSpec::new("Echo", "Test skill")
            .file("z.txt", "z")
            .file("docs/a.md", "a")
            .file(".DS_Store", "junk")
            .file("__MACOSX/x", "junk"),
    );

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    let skill = registry.get("echo").unwrap();

    assert_eq!(skill.resources(), ["docs/a.md", "z.txt"]);
    assert_eq!(
        skill.summary().resource_uris,
        [
            "resource://skillz/echo/docs/a.md",
            "resource://skillz/echo/z.txt"
        ]
    );
}
