use pleadings_lib::render::rules::{twips, FormattingRules, PageNumberPlacement};

#[test]
fn defaults_describe_a_letter_size_pleading() {
    let rules = FormattingRules::default();
    rules.validate().expect("defaults are valid");
    assert_eq!(rules.font_family, "Times New Roman");
    assert_eq!(rules.page_width_pt(), 612.0);
    assert_eq!(rules.page_height_pt(), 792.0);
    assert_eq!(rules.text_width_pt(), 468.0);
    assert_eq!(rules.line_height_pt(), 24.0);
    assert_eq!(rules.half_points(), 24);
    assert!(rules.line_numbers.enabled);
    assert!(rules.line_numbers.restart_each_page);
    assert_eq!(rules.page_number, PageNumberPlacement::Center);
    assert!(rules.header_skips_first_page());
}

#[test]
fn jurisdiction_file_overrides_only_what_it_names() {
    let rules = FormattingRules::from_json_str(
        r#"{
            "fontFamily": "Courier New",
            "pageHeightIn": 14,
            "margins": { "leftIn": 1.5 },
            "pageNumber": "right",
            "header": { "text": "STATE v. ROE", "skipFirstPage": false }
        }"#,
    )
    .expect("rules");
    assert_eq!(rules.font_family, "Courier New");
    assert_eq!(twips(rules.page_height_in), 20160);
    assert_eq!(rules.margins.left_in, 1.5);
    assert_eq!(rules.margins.right_in, 1.0);
    assert_eq!(rules.font_size_pt, 12.0);
    assert_eq!(rules.page_number, PageNumberPlacement::Right);
    assert_eq!(rules.header_text("ignored").as_deref(), Some("STATE v. ROE"));
    assert!(!rules.header_skips_first_page());
}

#[test]
fn header_falls_back_to_title_and_can_be_disabled() {
    let rules = FormattingRules::default();
    assert_eq!(rules.header_text("Motion").as_deref(), Some("Motion"));
    assert_eq!(rules.header_text("   "), None);

    let none = FormattingRules::from_json_str(r#"{"header": null}"#).expect("rules");
    assert_eq!(none.header_text("Motion"), None);
    assert!(!none.header_skips_first_page());
}

#[test]
fn invalid_rules_are_config_errors() {
    for raw in [
        r#"{"fontFamily": "  "}"#,
        r#"{"fontSizePt": 0}"#,
        r#"{"lineSpacing": -1}"#,
        r#"{"margins": {"topIn": -0.5}}"#,
        r#"{"margins": {"leftIn": 4.5, "rightIn": 4.5}}"#,
        r#"{"pageNumber": "bottom"}"#,
        r#"not json"#,
    ] {
        let err = FormattingRules::from_json_str(raw).expect_err(raw);
        assert_eq!(err.code(), "CONFIG_ERROR", "{raw}");
    }
}

#[test]
fn rules_round_trip_through_camel_case_json() {
    let rules = FormattingRules::default();
    let json = serde_json::to_value(&rules).expect("serialize");
    assert_eq!(json["fontSizePt"], 12.0);
    assert_eq!(json["lineNumbers"]["restartEachPage"], true);
    assert_eq!(json["pageNumber"], "center");
    let back = FormattingRules::from_json_str(&json.to_string()).expect("parse");
    assert_eq!(back, rules);
}
