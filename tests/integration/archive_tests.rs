use skillz::bundle::{ArchiveBundle, BundleSource};
use skillz::encoding::Encoding;
use skillz::registry::{SkillRegistry, SkipReason};
use skillz::resource::read_resource;
use skillz::test_utils::{SkillFixture, SkillSpec, write_zip};

fn spec() -> SkillSpec {
    SkillSpec::new("Zipped", "Archive skill")
        .body("Use the helper.\n")
        .file("scripts/helper.py", "print('hi')\n")
        .file("docs/guide.md", "# Guide\n")
}

#[test]
fn wrapped_and_flat_archives_expose_same_paths() {
    let flat_fixture = SkillFixture::new();
    let flat = flat_fixture.write_archive(&spec(), None);
    let wrapped_fixture = SkillFixture::new();
    let wrapped = wrapped_fixture.write_archive(&spec(), Some("zipped-skill"));

    let flat = ArchiveBundle::open(&flat).unwrap().unwrap();
    let wrapped = ArchiveBundle::open(&wrapped).unwrap().unwrap();

    assert_eq!(flat.prefix(), None);
    assert_eq!(wrapped.prefix(), Some("zipped-skill/"));
    assert_eq!(flat.entries().unwrap(), wrapped.entries().unwrap());
    assert_eq!(
        flat.read("SKILL.md").unwrap(),
        wrapped.read("SKILL.md").unwrap()
    );
}

#[test]
fn archive_skill_registers_with_resources() {
    let fixture = SkillFixture::new();
    fixture.write_archive(&spec(), Some("zipped-skill"));

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    let skill = registry.get("zipped").unwrap();

    assert!(skill.is_archive());
    assert_eq!(skill.resources(), ["docs/guide.md", "scripts/helper.py"]);
    assert_eq!(skill.body(), "Use the helper.\n");
}

#[test]
fn metadata_junk_is_excluded() {
    let fixture = SkillFixture::new();
    let path = fixture.root().join("junk.zip");
    write_zip(
        &path,
        &[
            ("junk/SKILL.md".into(), b"---\nname: Junk\ndescription: d\n---\n".to_vec(), 0o644),
            ("junk/notes.txt".into(), b"keep".to_vec(), 0o644),
            ("junk/.DS_Store".into(), b"x".to_vec(), 0o644),
            ("__MACOSX/junk/._notes.txt".into(), b"x".to_vec(), 0o644),
        ],
    );

    let bundle = ArchiveBundle::open(&path).unwrap().unwrap();
    assert_eq!(bundle.prefix(), Some("junk/"));
    assert_eq!(bundle.entries().unwrap(), ["SKILL.md", "notes.txt"]);

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    assert_eq!(registry.get("junk").unwrap().resources(), ["notes.txt"]);
}

#[test]
fn mixed_top_level_keeps_full_paths() {
    let fixture = SkillFixture::new();
    let path = fixture.root().join("mixed.zip");
    write_zip(
        &path,
        &[
            ("SKILL.md".into(), b"---\nname: Mixed\ndescription: d\n---\n".to_vec(), 0o644),
            ("data/a.txt".into(), b"a".to_vec(), 0o644),
        ],
    );

    let bundle = ArchiveBundle::open(&path).unwrap().unwrap();
    assert_eq!(bundle.prefix(), None);
    assert_eq!(bundle.entries().unwrap(), ["SKILL.md", "data/a.txt"]);
}

#[test]
fn binary_resource_round_trips_as_base64() {
    let fixture = SkillFixture::new();
    fixture.write_archive(&spec().file("data.bin", [0xFF_u8, 0xFE, 0x00, 0x01]), None);

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    let content = read_resource(&registry, "resource://skillz/zipped/data.bin").unwrap();

    assert_eq!(content.payload.encoding, Encoding::Base64);
    assert_eq!(content.payload.decode().unwrap(), [0xFF_u8, 0xFE, 0x00, 0x01]);
}

#[test]
fn corrupt_archive_is_skipped_with_warning() {
    let fixture = SkillFixture::new();
    fixture.write_raw("broken.zip", "this is not a zip file");
    fixture.write_dir(&SkillSpec::new("Echo", "Test skill"));

    let registry = SkillRegistry::load(fixture.root()).unwrap();

    assert_eq!(registry.len(), 1);
    let skipped = &registry.report().skipped;
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].path.ends_with("broken.zip"));
    assert!(matches!(skipped[0].reason, SkipReason::UnreadableArchive { .. }));
}

#[test]
fn archive_without_manifest_is_ignored() {
    let fixture = SkillFixture::new();
    let path = fixture.root().join("plain.zip");
    write_zip(&path, &[("readme.txt".into(), b"hi".to_vec(), 0o644)]);

    assert!(ArchiveBundle::open(&path).unwrap().is_none());
    let registry = SkillRegistry::load(fixture.root()).unwrap();
    assert!(registry.is_empty());
    assert!(registry.report().skipped.is_empty());
}

#[test]
fn skill_extension_is_an_archive() {
    let fixture = SkillFixture::new();
    let path = fixture.root().join("packed.SKILL");
    write_zip(
        &path,
        &[("SKILL.md".into(), b"---\nname: Packed\ndescription: d\n---\n".to_vec(), 0o644)],
    );

    let registry = SkillRegistry::load(fixture.root()).unwrap();
    assert!(registry.get("packed").unwrap().is_archive());
}

#[test]
fn traversal_entries_are_dropped() {
    let fixture = SkillFixture::new();
    let path = fixture.root().join("evil.zip");
    write_zip(
        &path,
        &[
            ("SKILL.md".into(), b"---\nname: Evil\ndescription: d\n---\n".to_vec(), 0o644),
            ("../outside.txt".into(), b"x".to_vec(), 0o644),
            ("ok.txt".into(), b"y".to_vec(), 0o644),
        ],
    );

    let bundle = ArchiveBundle::open(&path).unwrap().unwrap();
    assert_eq!(bundle.entries().unwrap(), ["SKILL.md", "ok.txt"]);
    assert!(bundle.read("../outside.txt").is_err());
}
