use indoc::indoc;
use yaml_anchor_codec::{parse, AnnotatedValue, Error, Mapping};

fn keys(value: &AnnotatedValue) -> Vec<&str> {
    value
        .as_mapping()
        .expect("mapping")
        .entries
        .keys()
        .map(String::as_str)
        .collect()
}

#[test]
fn explicit_keys_override_merged_ones() {
    let yaml = indoc! {"
        base: &u
          role: guest
          level: 1
        admin:
          <<: *u
          role: admin
          level: 10
    "};
    let v = parse(yaml).unwrap();
    let admin = v.get("admin").unwrap();

    let expected: AnnotatedValue = Mapping::from_iter([
        ("role", AnnotatedValue::from("admin")),
        ("level", AnnotatedValue::from(10)),
    ])
    .with_reference_of("u")
    .into();
    assert_eq!(admin, &expected);
}

#[test]
fn merge_key_position_does_not_matter() {
    let yaml = indoc! {"
        base: &u {role: guest, level: 1}
        late:
          role: admin
          <<: *u
    "};
    let v = parse(yaml).unwrap();
    let late = v.get("late").unwrap();
    assert_eq!(late.get("role").unwrap().as_str(), Some("admin"));
    assert_eq!(late.get("level").unwrap().as_i128(), Some(1));
    assert_eq!(late.reference_of(), Some("u"));
}

#[test]
fn merged_entries_come_first_in_order() {
    let yaml = indoc! {"
        base: &b {x: 1, y: 2}
        m:
          z: 3
          <<: *b
          x: 9
    "};
    let v = parse(yaml).unwrap();
    assert_eq!(keys(v.get("m").unwrap()), ["x", "y", "z"]);
    assert_eq!(v.get("m").unwrap().get("x").unwrap().as_i128(), Some(9));
}

#[test]
fn sequence_of_aliases_earlier_wins() {
    let yaml = indoc! {"
        first: &first {a: 1, shared: first}
        second: &second {b: 2, shared: second}
        both:
          <<: [*first, *second]
    "};
    let v = parse(yaml).unwrap();
    let both = v.get("both").unwrap();
    assert_eq!(both.get("a").unwrap().as_i128(), Some(1));
    assert_eq!(both.get("b").unwrap().as_i128(), Some(2));
    assert_eq!(both.get("shared").unwrap().as_str(), Some("first"));
    assert_eq!(both.reference_of(), Some("first"));
}

#[test]
fn inline_mapping_merge_has_no_reference() {
    let v = parse("m:\n  <<: {a: 1}\n  b: 2\n").unwrap();
    let m = v.get("m").unwrap();
    assert_eq!(m.reference_of(), None);
    assert_eq!(m.get("a").unwrap().as_i128(), Some(1));
    assert_eq!(m.get("b").unwrap().as_i128(), Some(2));
}

#[test]
fn merge_node_can_host_its_own_anchor() {
    let yaml = indoc! {"
        base: &b {x: 1}
        derived: &d
          <<: *b
          y: 2
        again: *d
    "};
    let v = parse(yaml).unwrap();
    let derived = v.get("derived").unwrap();
    assert_eq!(derived.anchor(), Some("d"));
    assert_eq!(derived.reference_of(), Some("b"));

    let again = v.get("again").unwrap();
    assert_eq!(again.anchor(), None);
    assert_eq!(again.reference_of(), Some("d"));
    assert_eq!(again.get("x").unwrap().as_i128(), Some(1));
    assert_eq!(again.get("y").unwrap().as_i128(), Some(2));
}

#[test]
fn merged_copy_drops_anchors() {
    let yaml = indoc! {"
        base: &b
          nested: &n {k: v}
        m:
          <<: *b
    "};
    let v = parse(yaml).unwrap();
    let m = v.get("m").unwrap();
    assert_eq!(m.anchor(), None);
    assert_eq!(m.get("nested").unwrap().anchor(), None);
}

#[test]
fn quoted_merge_key_is_a_plain_key() {
    let v = parse("base: &b {x: 1}\nm:\n  \"<<\": *b\n").unwrap();
    let m = v.get("m").unwrap();
    assert_eq!(m.reference_of(), None);
    let inner = m.get("<<").unwrap();
    assert_eq!(inner.reference_of(), Some("b"));
}

#[test]
fn merge_of_scalar_is_rejected() {
    let err = parse("m:\n  <<: 5\n").unwrap_err();
    assert!(matches!(err, Error::InvalidMerge { .. }), "{err:?}");

    let err = parse("s: &s [1]\nm:\n  <<: *s\n").unwrap_err();
    assert!(matches!(err, Error::InvalidMerge { .. }), "{err:?}");

    let err = parse("m:\n  <<: [{a: 1}]\n").unwrap_err();
    assert!(matches!(err, Error::InvalidMerge { .. }), "{err:?}");
}

#[test]
fn merge_of_unknown_anchor_is_undefined() {
    let err = parse("m:\n  <<: *nobody\n").unwrap_err();
    assert!(
        matches!(&err, Error::UndefinedAnchor { name, .. } if name == "nobody"),
        "{err:?}"
    );
}
