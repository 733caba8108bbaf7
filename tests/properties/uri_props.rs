use proptest::prelude::*;

use skillz::SkillzError;
use skillz::bundle::{ArchiveBundle, BundleSource, DirectoryBundle};
use skillz::registry::slugify;
use skillz::resource::{ResourceMiss, build_uri, resolve_uri};
use skillz::test_utils::{SkillFixture, SkillSpec};

fn arb_segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.%+#?éü日本-]{1,12}".prop_filter("dot segments are not names", |s| s != "." && s != "..")
}

fn arb_path() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_segment(), 1..5).prop_map(|segments| segments.join("/"))
}

proptest! {
    #[test]
    fn build_then_resolve_round_trips(name in "[A-Za-z][A-Za-z0-9 ]{0,20}", path in arb_path()) {
        let slug = slugify(&name);
        let address = resolve_uri(&build_uri(&slug, &path)).unwrap();
        prop_assert_eq!(address.slug, slug);
        prop_assert_eq!(address.path, path);
    }

    #[test]
    fn escaping_uris_are_traversal(
        depth in 0usize..3,
        extra in 1usize..3,
        tail in "[a-z0-9]{1,8}(/[a-z0-9]{1,8}){0,2}",
    ) {
        let mut segments: Vec<String> = (0..depth).map(|i| format!("d{i}")).collect();
        segments.extend(std::iter::repeat_n("..".to_string(), depth + extra));
        segments.push(tail);
        let uri = format!("resource://skillz/demo/{}", segments.join("/"));
        prop_assert_eq!(resolve_uri(&uri).unwrap_err(), ResourceMiss::PathTraversal);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn bundles_refuse_escaping_reads(depth in 1usize..4, name in "[a-z]{1,8}") {
        let fixture = SkillFixture::new();
        let spec = SkillSpec::new("Demo", "d").file("inner/file.txt", "x");
        let dir = fixture.write_dir(&spec);
        let archive_path = fixture.write_archive(&spec.dir_name("demo-archive"), None);
        std::fs::write(fixture.temp_dir.path().join(&name), "outside").unwrap();

        let rel = format!("{}{name}", "../".repeat(depth));
        let directory = DirectoryBundle::open(&dir).unwrap();
        let archive = ArchiveBundle::open(&archive_path).unwrap().unwrap();

        prop_assert!(matches!(
            directory.read(&rel),
            Err(SkillzError::Resource(ResourceMiss::PathTraversal))
        ));
        prop_assert!(matches!(
            archive.read(&rel),
            Err(SkillzError::Resource(ResourceMiss::PathTraversal))
        ));
        prop_assert!(directory.read("inner/file.txt").is_ok());
        prop_assert!(archive.read("inner/file.txt").is_ok());
    }
}
