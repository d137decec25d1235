#[cfg(test)]
mod tests {
    use crate::analysis::Analysis;
    use crate::parser::{ParseOptions, Parser};
    use crate::symbol::SymbolKind;
    use crate::token::Severity;

    fn parse(src: &str) -> Analysis {
        Parser::new(src, &ParseOptions::default()).parse()
    }

    fn messages(analysis: &Analysis) -> Vec<&str> {
        analysis.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_object_literal() {
        let analysis = parse("o := {a: 1, b: x}\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.references_to("x").count(), 1);
        assert_eq!(analysis.texts.get("a").map(String::as_str), Some("a"));
        assert!(analysis.texts.contains_key("b"));
    }

    #[test]
    fn test_duplicate_object_key() {
        let analysis = parse("o := {a: 1, A: 2}\n");
        assert_eq!(messages(&analysis), vec!["Duplicate object key \"A\""]);
        assert_eq!(analysis.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_quoted_object_key() {
        let analysis = parse("o := {\"a\": 1}\n");
        assert_eq!(messages(&analysis), vec!["Object keys cannot be quoted strings"]);
    }

    #[test]
    fn test_object_key_without_colon() {
        let analysis = parse("o := {a 1}\n");
        assert_eq!(analysis.diagnostics[0].message, "Expected \":\" after object key, found \"1\"");
    }

    #[test]
    fn test_unclosed_object() {
        let analysis = parse("o := {a: 1");
        assert_eq!(messages(&analysis), vec!["Missing closing \"}\""]);
        assert_eq!(analysis.diagnostics[0].offset, 5);
    }

    #[test]
    fn test_multiline_object_folds() {
        let analysis = parse("o := {\n    a: 1,\n    b: 2,\n    c: 3\n}\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.folding_ranges.len(), 1);
        assert_eq!(analysis.folding_ranges[0].end_line, 3);
    }

    #[test]
    fn test_string_index_recorded() {
        let analysis = parse("v := m[\"Key\"]\n");
        assert_eq!(analysis.texts.get("key").map(String::as_str), Some("Key"));
    }

    #[test]
    fn test_unexpected_operator() {
        let analysis = parse("x := / 2\n");
        assert_eq!(messages(&analysis), vec!["Unexpected operator \"/\""]);
    }

    #[test]
    fn test_bracket_mismatch_inside_parens() {
        let analysis = parse("x := (1])\n");
        assert_eq!(messages(&analysis), vec!["Unexpected \"]\""]);
        assert_eq!(analysis.diagnostics[0].offset, 7);
    }

    #[test]
    fn test_bracket_closes_outer_array() {
        let analysis = parse("x := [a, (b]\n");
        let found: Vec<(usize, &str)> = analysis.diagnostics.iter().map(|d| (d.offset, d.message.as_str())).collect();
        assert_eq!(found, vec![(9, "Missing closing \")\"")]);
    }

    #[test]
    fn test_key_alone_on_its_line() {
        let analysis = parse("o := {\n  a:\n  1\n}\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.texts.get("a").map(String::as_str), Some("a"));

        let dup = parse("o := {\n  a:\n  1,\n  A:\n  y\n}\n");
        assert_eq!(messages(&dup), vec!["Duplicate object key \"A\""]);
        assert_eq!(dup.diagnostics[0].offset, 19);
        assert_eq!(dup.references_to("y").count(), 1);
    }

    #[test]
    fn test_unknown_token() {
        let analysis = parse("x := 1 @ 2\n");
        assert_eq!(messages(&analysis), vec!["Unknown token \"@\""]);
    }

    #[test]
    fn test_anonymous_arrow_drops_own_params() {
        let analysis = parse("f := (a, b) => a + c\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let names: Vec<&str> = analysis.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["f"]);
        assert_eq!(analysis.references_to("c").count(), 1);
        let f = analysis.symbols[0].as_variable().unwrap();
        assert_eq!(f.default.as_ref().unwrap().text, "(a, b) => a + c");
    }

    #[test]
    fn test_single_param_arrow() {
        let analysis = parse("g := x => x * 2\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.symbols.len(), 1);
        assert_eq!(analysis.symbols[0].name, "g");
    }

    #[test]
    fn test_named_arrow_in_expression() {
        let analysis = parse("fn := helper(a) => a\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let helper = analysis.symbols.iter().find(|s| s.name == "helper").unwrap();
        assert_eq!(helper.kind(), SymbolKind::Function);
        assert!(!helper.as_function().unwrap().closure);
    }

    #[test]
    fn test_continuation_line() {
        let analysis = parse("x := 1\n    + 2\ny := 3\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.symbols.len(), 2);
        let x = analysis.symbols[0].as_variable().unwrap();
        assert!(x.default.as_ref().unwrap().text.ends_with("+ 2"));
    }

    #[test]
    fn test_dynamic_reference() {
        let analysis = parse("x := %name%\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let analysis = parse("x := %name");
        assert_eq!(messages(&analysis), vec!["Missing closing \"%\""]);
    }

    #[test]
    fn test_increment_marks_assignment() {
        let analysis = parse("count++\n");
        assert_eq!(analysis.symbols.len(), 1);
        assert!(analysis.symbols[0].as_variable().unwrap().assigned);
    }

    #[test]
    fn test_call_arguments_are_references() {
        let analysis = parse("MsgBox(first, second)\n");
        assert!(analysis.symbols.is_empty());
        assert_eq!(analysis.references_to("first").count(), 1);
        assert_eq!(analysis.references_to("second").count(), 1);
    }
}
