use indoc::indoc;
use serde_json::json;
use yaml_anchor_codec::{generate, generate_with_options, AnnotatedValue, Mapping, Sequence};

const HEADER: &str = "# Generated YAML from JSON with anchors and references\n\n";

fn annotated(json: serde_json::Value) -> AnnotatedValue {
    serde_json::from_value(json).expect("annotated JSON")
}

fn body(value: &AnnotatedValue) -> String {
    let text = generate(value);
    text.strip_prefix(HEADER)
        .unwrap_or_else(|| panic!("missing header in {text:?}"))
        .to_string()
}

#[test]
fn empty_mapping_is_header_only() {
    assert_eq!(generate(&AnnotatedValue::Mapping(Mapping::new())), HEADER);
}

#[test]
fn scalars_are_formatted() {
    let v = annotated(json!({
        "nothing": null,
        "yes": true,
        "count": 1.2e3,
        "half": 0.5,
        "neg": -3,
        "plain": "hello",
    }));
    assert_eq!(
        body(&v),
        indoc! {"
            nothing: null
            yes: true
            count: 1200
            half: 0.5
            neg: -3
            plain: hello
        "}
    );
}

#[test]
fn ambiguous_strings_are_quoted() {
    let v = annotated(json!({
        "digits": "123",
        "colon": "key: value",
        "word": "hello",
        "bool_word": "true",
        "yaml11": "Off",
        "null_word": "NULL",
        "empty": "",
        "newline": "a\nb",
        "indicator": "*star",
        "comment": "a #b",
        "float_like": ".5",
    }));
    assert_eq!(
        body(&v),
        indoc! {r#"
            digits: "123"
            colon: "key: value"
            word: hello
            bool_word: "true"
            yaml11: "Off"
            null_word: "NULL"
            empty: ""
            newline: "a\nb"
            indicator: "*star"
            comment: "a #b"
            float_like: ".5"
        "#}
    );
}

#[test]
fn awkward_keys_are_quoted() {
    let v = annotated(json!({
        "<<": 1,
        "a: b": 2,
        "": 3,
        "plain key": 4,
    }));
    assert_eq!(
        body(&v),
        indoc! {r#"
            "<<": 1
            "a: b": 2
            "": 3
            plain key: 4
        "#}
    );
}

#[test]
fn pure_alias_and_merge_node() {
    let v = annotated(json!({
        "base": {"x": 1, "anchor": "u"},
        "alias": {"referenceOf": "u"},
        "merged": {"extra": 1, "referenceOf": "u"},
    }));
    assert_eq!(
        body(&v),
        indoc! {"
            base: &u
              x: 1
            alias: *u
            merged:
              <<: *u
              extra: 1
        "}
    );
}

#[test]
fn siblings_equal_to_the_anchor_are_pruned() {
    let v = annotated(json!({
        "base": {"role": "guest", "level": 1, "tags": ["a"], "anchor": "u"},
        "same": {"role": "guest", "level": 1, "tags": ["a"], "referenceOf": "u"},
        "changed": {"role": "admin", "level": 1, "tags": ["a", "b"], "referenceOf": "u"},
    }));
    assert_eq!(
        body(&v),
        indoc! {"
            base: &u
              role: guest
              level: 1
              tags:
                - a
            same: *u
            changed:
              <<: *u
              role: admin
              tags:
                - a
                - b
        "}
    );
}

#[test]
fn pruning_can_be_disabled() {
    let v = annotated(json!({
        "base": {"role": "guest", "anchor": "u"},
        "same": {"role": "guest", "referenceOf": "u"},
    }));
    let text = generate_with_options(
        &v,
        yaml_anchor_codec::generate_options! {
            prune_inherited: false,
        },
    );
    assert!(text.ends_with("same:\n  <<: *u\n  role: guest\n"), "{text}");
}

#[test]
fn without_a_definition_every_sibling_is_an_override() {
    let v = annotated(json!({
        "only": {"role": "guest", "referenceOf": "elsewhere"},
    }));
    assert_eq!(body(&v), "only:\n  <<: *elsewhere\n  role: guest\n");
}

#[test]
fn sequence_items_absorb_indentation() {
    let v = annotated(json!({
        "defaults": {"user": {"role": "guest", "anchor": "default-user"}},
        "list": [
            {"name": "x", "v": 1},
            [1, [2, 3]],
            "s",
            {"username": "charlie", "role": "guest", "referenceOf": "default-user"},
            {"role": "guest", "referenceOf": "default-user"},
        ],
    }));
    assert_eq!(
        body(&v),
        indoc! {"
            defaults:
              user: &default-user
                role: guest
            list:
              - name: x
                v: 1
              - - 1
                - - 2
                  - 3
              - s
              - <<: *default-user
                username: charlie
              - *default-user
        "}
    );
}

#[test]
fn anchored_items_in_sequences() {
    let list = Sequence::new(vec![
        Mapping::from_iter([("k", 1)]).with_anchor("a").into(),
        Mapping::new().with_reference_of("a").into(),
        Sequence::new(vec![AnnotatedValue::from(1)]).with_anchor("s").into(),
        Sequence {
            items: vec![AnnotatedValue::from(1)],
            anchor: None,
            reference_of: Some("s".into()),
        }
        .into(),
    ]);
    assert_eq!(
        body(&AnnotatedValue::Sequence(list)),
        indoc! {"
            - &a
              k: 1
            - *a
            - &s
              - 1
            - *s
        "}
    );
}

#[test]
fn anchored_merge_node() {
    let v = annotated(json!({
        "base": {"x": 1, "anchor": "b"},
        "derived": {"x": 1, "y": 2, "anchor": "d", "referenceOf": "b"},
    }));
    assert_eq!(
        body(&v),
        indoc! {"
            base: &b
              x: 1
            derived: &d
              <<: *b
              y: 2
        "}
    );
}

#[test]
fn empty_collections() {
    let v = annotated(json!({
        "map": {},
        "seq": [],
        "items": [{}, []],
    }));
    assert_eq!(
        body(&v),
        indoc! {"
            map:
            seq:
            items:
              -
              -
        "}
    );
}

#[test]
fn root_scalars_and_sequences() {
    assert_eq!(body(&AnnotatedValue::from("text")), "text\n");
    assert_eq!(body(&AnnotatedValue::Sequence(Sequence::new(Vec::new()))), "[]\n");
    assert_eq!(
        body(&AnnotatedValue::from(vec![AnnotatedValue::from(1), AnnotatedValue::from(true)])),
        "- 1\n- true\n"
    );
}

#[test]
fn non_finite_numbers() {
    let v = AnnotatedValue::from(vec![
        AnnotatedValue::from(f64::INFINITY),
        AnnotatedValue::from(f64::NEG_INFINITY),
        AnnotatedValue::from(f64::NAN),
    ]);
    assert_eq!(body(&v), "- .inf\n- -.inf\n- .nan\n");
}

#[test]
fn root_anchor_is_written_first() {
    let map = annotated(json!({"a": 1, "anchor": "root"}));
    assert_eq!(body(&map), "&root\na: 1\n");

    let list = Sequence::new(vec![AnnotatedValue::from(1)]).with_anchor("items");
    assert_eq!(body(&list.into()), "&items\n- 1\n");

    assert_eq!(body(&Mapping::new().with_anchor("e").into()), "&e {}\n");
    assert_eq!(body(&Sequence::new(Vec::new()).with_anchor("e").into()), "&e []\n");
}

#[test]
fn override_defining_an_anchor_is_never_pruned() {
    let v = annotated(json!({
        "base": {"x": {"k": 1}, "anchor": "b"},
        "d": {"x": {"k": 1, "anchor": "xx"}, "referenceOf": "b"},
        "e": {"k": 1, "referenceOf": "xx"},
    }));
    assert_eq!(
        body(&v),
        indoc! {"
            base: &b
              x:
                k: 1
            d:
              <<: *b
              x: &xx
                k: 1
            e: *xx
        "}
    );
}

#[test]
fn edited_copies_are_written_in_full() {
    let mut v = annotated(json!({
        "base": {"x": 1, "y": 2, "anchor": "b"},
        "shrunk": {"x": 1, "referenceOf": "b"},
    }));
    let list = Sequence::new(vec![AnnotatedValue::from(1), AnnotatedValue::from(2)]).with_anchor("l");
    let grown = Sequence {
        items: vec![AnnotatedValue::from(1), AnnotatedValue::from(2), AnnotatedValue::from(3)],
        anchor: None,
        reference_of: Some("l".into()),
    };
    let same = Sequence {
        items: vec![AnnotatedValue::from(1), AnnotatedValue::from(2)],
        anchor: None,
        reference_of: Some("l".into()),
    };
    let root = v.as_mapping_mut().expect("mapping root");
    root.insert("list", list);
    root.insert("grown", grown);
    root.insert("same", same);

    assert_eq!(
        body(&v),
        indoc! {"
            base: &b
              x: 1
              y: 2
            shrunk:
              x: 1
            list: &l
              - 1
              - 2
            grown:
              - 1
              - 2
              - 3
            same: *l
        "}
    );
}

#[test]
fn nesting_past_the_limit_is_written_as_null() {
    let mut value = AnnotatedValue::from(1);
    for _ in 0..5 {
        value = Mapping::from_iter([("n", value)]).into();
    }
    let list: AnnotatedValue = vec![AnnotatedValue::from(vec![AnnotatedValue::from(vec![])])].into();

    let options = yaml_anchor_codec::generate_options! { max_depth: 3 };
    let text = generate_with_options(&value, options);
    assert!(text.ends_with("\n\nn:\n  n:\n    n: null\n"), "{text}");

    let text = generate_with_options(&list, yaml_anchor_codec::generate_options! { max_depth: 2 });
    assert!(text.ends_with("\n\n- - null\n"), "{text}");
}
