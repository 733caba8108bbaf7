use std::collections::BTreeMap;

use proptest::prelude::*;

use skillz::manifest::parse_str;

fn arb_extra() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("x_[a-z0-9_]{0,10}", "[a-z][a-z0-9 ]{0,15}", 0..6)
}

proptest! {
    #[test]
    fn unrecognized_keys_land_in_extra(
        name in "Skill [a-z0-9]{1,10}",
        description in "[a-z]{1,12} helper",
        extra in arb_extra(),
    ) {
        let mut doc = format!("---\nname: {name}\ndescription: {description}\n");
        for (key, value) in &extra {
            doc.push_str(&format!("{key}: \"{value}\"\n"));
        }
        doc.push_str("---\n# Body\n");

        let manifest = parse_str(&doc, "prop").unwrap();
        prop_assert_eq!(&manifest.metadata.name, &name);
        prop_assert_eq!(&manifest.metadata.description, &description);
        prop_assert_eq!(manifest.metadata.extra.len(), extra.len());
        for (key, value) in &extra {
            prop_assert_eq!(manifest.metadata.extra[key].as_str(), Some(value.as_str()));
        }
        prop_assert_eq!(manifest.body, "# Body\n");
    }

    #[test]
    fn body_survives_verbatim(body in "[a-zA-Z0-9 #*\\-\n]{0,80}") {
        let doc = format!("---\nname: Demo\ndescription: d\n---\n{body}");
        let manifest = parse_str(&doc, "prop").unwrap();
        prop_assert_eq!(manifest.body, body.trim_start());
    }
}
