use rdn::{parse, parse_cst, parse_cst_with_options, CstKind, CstNode, ParseOptions, Value};

fn literals<'a>(node: &'a CstNode, out: &mut Vec<&'a CstNode>) {
    match &node.kind {
        CstKind::Literal(_) => out.push(node),
        CstKind::Array(items) | CstKind::Tuple(items) => {
            for item in items {
                literals(item, out);
            }
        }
        CstKind::Set { items, .. } => {
            for item in items {
                literals(item, out);
            }
        }
        CstKind::Object(members) | CstKind::Map { entries: members, .. } => {
            for (key, value) in members {
                literals(key, out);
                literals(value, out);
            }
        }
    }
}

#[test]
fn test_literals_keep_source_spelling() {
    let src = r#"[1.50, 1e3, -0, "A", @2024-01-15, x"ff", /a/g, 10n]"#;
    let cst = parse_cst(src).unwrap();

    let mut found = Vec::new();
    literals(&cst, &mut found);
    let raws: Vec<&str> = found.iter().map(|n| n.raw.as_deref().unwrap()).collect();
    assert_eq!(
        raws,
        ["1.50", "1e3", "-0", r#""A""#, "@2024-01-15", r#"x"ff""#, "/a/g", "10n"]
    );

    for node in found {
        assert_eq!(node.text(src), node.raw.as_deref());
    }
}

#[test]
fn test_spans_cover_containers() {
    let src = r#"  { "k" => ( 1 , 2 ) }  "#;
    let cst = parse_cst(src).unwrap();
    assert_eq!(cst.text(src), Some(r#"{ "k" => ( 1 , 2 ) }"#));

    match &cst.kind {
        CstKind::Map { entries, explicit } => {
            assert!(!explicit);
            let (key, value) = &entries[0];
            assert_eq!(key.text(src), Some(r#""k""#));
            assert_eq!(value.text(src), Some("( 1 , 2 )"));
            assert!(value.raw.is_none());
        }
        other => panic!("expected map, got {:?}", other),
    }
}

#[test]
fn test_explicit_keywords_are_recorded() {
    let cst = parse_cst(r#"[Map{}, Set{1}, {1 => 2}, {1}]"#).unwrap();
    let items = match &cst.kind {
        CstKind::Array(items) => items,
        other => panic!("expected array, got {:?}", other),
    };
    assert!(matches!(items[0].kind, CstKind::Map { explicit: true, .. }));
    assert!(matches!(items[1].kind, CstKind::Set { explicit: true, .. }));
    assert!(matches!(items[2].kind, CstKind::Map { explicit: false, .. }));
    assert!(matches!(items[3].kind, CstKind::Set { explicit: false, .. }));
    assert_eq!((items[0].start, items[0].end), (1, 6));
}

#[test]
fn test_to_value_matches_parse() {
    let src = r#"{"a": [1, (2, 3)], "b": Map{@12:00:00 => Set{b"AA=="}}, "c": NaN}"#;
    assert_eq!(parse_cst(src).unwrap().to_value(), parse(src).unwrap());
}

#[test]
fn test_cst_fails_where_parse_fails() {
    for bad in ["", "[1,]", "{1: 2}", "01", r#"b"A""#, "@P", "[1] 2"] {
        let cst_err = parse_cst(bad).unwrap_err();
        let value_err = parse(bad).unwrap_err();
        assert_eq!(cst_err.offset(), value_err.offset(), "{:?}", bad);
    }

    let options = ParseOptions::new().with_max_depth(1);
    assert!(parse_cst_with_options("[[1]]", &options).unwrap_err().is_limit());
}

#[test]
fn test_unicode_spans_are_byte_offsets() {
    let src = r#"["é", 1]"#;
    let cst = parse_cst(src).unwrap();
    if let CstKind::Array(items) = &cst.kind {
        assert_eq!((items[0].start, items[0].end), (1, 5));
        assert_eq!(items[0].kind, CstKind::Literal(Value::from("é")));
        assert_eq!((items[1].start, items[1].end), (7, 8));
    } else {
        panic!("expected array");
    }
}
