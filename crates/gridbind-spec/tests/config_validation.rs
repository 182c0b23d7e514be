use gridbind_spec::{BindConfig, IndexSelector, keys, parse_column_list, parse_marker};

#[test]
fn full_config_parses_end_to_end() {
    let config = BindConfig::from_yaml_str(
        r#"
columns: "code,*title,-,start,level"
skip.rows: "3"
header.rows: "1-2"
footer.row: "10"
sheet.index: "!0"
sheet.name.fill.to: "code"
rule.date.start: "%Y/%m/%d"
rule.map.level:
  H: "High,Critical"
  L: "Low"
"#,
    )
    .expect("yaml parses");
    assert!(config.validate().is_ok());

    let columns = parse_column_list(config.text(keys::COLUMNS).unwrap());
    assert_eq!(columns.len(), 5);
    assert_eq!(columns[2], None);
    let title = columns[1].as_ref().unwrap();
    assert_eq!(title.field, "title");
    assert!(title.required);

    let headers = IndexSelector::parse(
        config.first_text(&[keys::HEADER_ROWS, keys::HEADER_ROW]).unwrap(),
        1,
    );
    assert!(headers.is_enabled(0));
    assert!(headers.is_enabled(1));
    assert_eq!(headers.max(), Some(1));

    let sheets = IndexSelector::parse(config.text(keys::SHEET_INDEX).unwrap(), 0);
    assert!(!sheets.is_enabled(0));
    assert!(sheets.is_enabled(4));
}

#[test]
fn validation_collects_every_issue_at_once() {
    let config = BindConfig::from_yaml_str(
        r#"
columns: "a,b"
skip.rows: "many"
rule.regex.a: "[0-9]+"
rule.date.b:
  not: "a format string"
"#,
    )
    .expect("yaml parses");

    let err = config.validate().expect_err("three problems");
    let paths: Vec<&str> = err.issues().iter().map(|i| i.path.as_str()).collect();
    assert_eq!(paths, vec!["rule.date.b", "rule.regex.a", "skip.rows"]);
}

#[test]
fn marker_and_column_grammars_agree() {
    // The same marker grammar serves config tokens and header text.
    assert_eq!(parse_marker("* Amount"), Some(("Amount".to_string(), true)));
    let columns = parse_column_list("amount(*)");
    assert!(columns[0].as_ref().unwrap().required);
}
