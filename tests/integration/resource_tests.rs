use skillz::encoding::Encoding;
use skillz::registry::SkillRegistry;
use skillz::resource::{ResourceMiss, build_uri, entries, read_resource, resolve_uri};
use skillz::test_utils::{SkillFixture, SkillSpec};

fn registry_with_resources() -> (SkillFixture, SkillRegistry) {
    let fixture = SkillFixture::new();
    fixture.write_dir(
        &SkillSpec::new("Docs Helper", "Reference material")
            .file("notes.txt", "plain notes\n")
            .file("my docs/read me.md", "# Spaced\n")
            .file("données/résumé.txt", "unicode\n"),
    );
    fixture.write_archive(
        &SkillSpec::new("Packed", "Archive material").file("data/config.json", "{}"),
        Some("packed"),
    );
    let registry = SkillRegistry::load(fixture.root()).unwrap();
    (fixture, registry)
}

#[test]
fn listing_uses_encoded_uris_and_guessed_mime() {
    let (_fixture, registry) = registry_with_resources();
    let listed = entries(registry.get("docs-helper").unwrap());

    let uris: Vec<&str> = listed.iter().map(|e| e.uri.as_str()).collect();
    assert_eq!(
        uris,
        [
            "resource://skillz/docs-helper/donn%C3%A9es/r%C3%A9sum%C3%A9.txt",
            "resource://skillz/docs-helper/my%20docs/read%20me.md",
            "resource://skillz/docs-helper/notes.txt",
        ]
    );
    assert_eq!(listed[2].name, "docs-helper/notes.txt");
    assert_eq!(listed[2].mime_type.as_deref(), Some("text/plain"));
}

#[test]
fn every_listed_uri_reads_back() {
    let (_fixture, registry) = registry_with_resources();
    for skill in registry.skills() {
        for entry in entries(skill) {
            let content = read_resource(&registry, &entry.uri).unwrap();
            assert_eq!(content.uri, entry.uri);
            assert_eq!(content.payload.encoding, Encoding::Text);
        }
    }
}

#[test]
fn spaced_and_unicode_paths_round_trip() {
    let (_fixture, registry) = registry_with_resources();
    let uri = build_uri("docs-helper", "my docs/read me.md");

    let address = resolve_uri(&uri).unwrap();
    assert_eq!(address.slug, "docs-helper");
    assert_eq!(address.path, "my docs/read me.md");

    let content = read_resource(&registry, &uri).unwrap();
    assert_eq!(content.payload.content, "# Spaced\n");
}

#[test]
fn archive_resources_read_through_wrapper() {
    let (_fixture, registry) = registry_with_resources();
    let content = read_resource(&registry, "resource://skillz/packed/data/config.json").unwrap();
    assert_eq!(content.payload.content, "{}");
    assert_eq!(content.mime_type.as_deref(), Some("application/json"));
}

#[test]
fn misses_have_distinct_codes() {
    let (_fixture, registry) = registry_with_resources();
    let cases = [
        ("file:///etc/passwd", "unsupported_prefix"),
        ("resource://skillz/", "invalid_format"),
        ("resource://skillz/ghost/notes.txt", "skill_not_found"),
        ("resource://skillz/docs-helper/missing.txt", "resource_not_found"),
        ("resource://skillz/docs-helper/SKILL.md", "resource_not_found"),
        ("resource://skillz/docs-helper/../../etc/passwd", "path_traversal"),
        ("resource://skillz/docs-helper/%2E%2E/%2E%2E/secret", "path_traversal"),
    ];
    for (uri, code) in cases {
        let miss = read_resource(&registry, uri).unwrap_err();
        assert_eq!(miss.code(), code, "{uri}");
    }
}

#[test]
fn traversal_is_rejected_for_archive_skills_too() {
    let (_fixture, registry) = registry_with_resources();
    let miss = read_resource(&registry, "resource://skillz/packed/data/../../../x").unwrap_err();
    assert_eq!(miss, ResourceMiss::PathTraversal);
}

#[test]
fn miss_payload_is_textual() {
    let miss = ResourceMiss::ResourceNotFound("gone.txt".to_string());
    let payload = miss.to_payload("resource://skillz/docs-helper/gone.txt");

    assert_eq!(payload.name, "docs-helper/gone.txt");
    assert_eq!(payload.mime_type, "text/plain");
    assert_eq!(payload.content, "Error: resource not found: gone.txt");
    assert_eq!(payload.error, "resource_not_found");
}

#[cfg(unix)]
#[test]
fn symlink_out_of_bundle_is_not_served() {
    let fixture = SkillFixture::new();
    let outside = fixture.temp_dir.path().join("secret.txt");
    std::fs::write(&outside, "secret").unwrap();
    let dir = fixture.write_dir(
        &SkillSpec::new("Linky", "links").script("peek.sh", "#!/bin/sh
cat leak.txt
"),
    );
    std::os::unix::fs::symlink(&outside, dir.join("leak.txt")).unwrap();

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    let skill = registry.get("linky").unwrap();
    assert_eq!(skill.resources(), ["peek.sh"]);
    assert!(entries(skill).iter().all(|entry| !entry.uri.ends_with("leak.txt")));

    let result = read_resource(&registry, "resource://skillz/linky/leak.txt");
    assert!(matches!(result, Err(ResourceMiss::ResourceNotFound(_))));

    let run = skillz::sandbox::run_script(
        skill,
        "peek.sh",
        &skillz::sandbox::RunRequest::new(),
        std::time::Duration::from_secs(10),
    )
    .unwrap();
    assert_ne!(run.exit_code, Some(0));
    assert!(!run.stdout.content.contains("secret"));
}
