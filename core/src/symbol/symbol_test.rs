#[cfg(test)]
mod tests {
    use crate::parser::{ParseOptions, Parser};
    use crate::symbol::{
        ExprText, ScopeAssumption, Symbol, SymbolItem, SymbolKind, VariableSymbol, format_signature,
    };
    use crate::token::TextRange;

    fn param(name: &str, var: VariableSymbol) -> Symbol {
        Symbol::new(name, TextRange::at(0, name.len()), TextRange::at(0, name.len()), SymbolItem::Variable(var))
    }

    #[test]
    fn test_format_signature() {
        let params = vec![
            param("a", VariableSymbol::default()),
            param(
                "b",
                VariableSymbol {
                    by_ref: true,
                    ..Default::default()
                },
            ),
            param(
                "c",
                VariableSymbol {
                    default: Some(ExprText {
                        text: "2".into(),
                        offset: 0,
                    }),
                    ..Default::default()
                },
            ),
            param(
                "rest",
                VariableSymbol {
                    variadic: true,
                    ..Default::default()
                },
            ),
        ];
        assert_eq!(format_signature("foo", &params), "foo(a, &b, c := 2, rest*)");
        assert_eq!(format_signature("bar", &[]), "bar()");
    }

    #[test]
    fn test_scope_assumption_flags() {
        let both = ScopeAssumption::LOCAL.with(ScopeAssumption::STATIC);
        assert!(both.contains(ScopeAssumption::LOCAL));
        assert!(both.contains(ScopeAssumption::STATIC));
        assert!(!both.contains(ScopeAssumption::GLOBAL));
        assert!(!ScopeAssumption::DEFAULT.contains(ScopeAssumption::DEFAULT));
        assert_eq!(both.bits(), 3);
    }

    #[test]
    fn test_names_compare_lowercased() {
        let symbol = param("MyName", VariableSymbol::default());
        assert!(symbol.is_named("myname"));
        assert!(!symbol.is_named("MyName"));
        assert_eq!(symbol.key(), "myname");
        assert_eq!(symbol.kind(), SymbolKind::Variable);
        assert!(symbol.as_function().is_none());
    }

    #[test]
    fn test_walk_visits_params_and_children() {
        let analysis = Parser::new("f(a) {\n    b := 1\n    g() {\n    }\n}\n", &ParseOptions::default()).parse();
        let mut seen = Vec::new();
        analysis.symbols[0].walk(&mut |s| seen.push(s.name.clone()));
        assert_eq!(seen, vec!["f", "a", "b", "g"]);
    }

    #[test]
    fn test_statement_declares() {
        let analysis = Parser::new("f() {\n    global g\n    local l\n    d := 1\n}\n", &ParseOptions::default()).parse();
        let statement = &analysis.symbols[0].as_function().unwrap().statement;
        assert!(statement.declares("g"));
        assert!(statement.declares("l"));
        assert!(statement.declares("d"));
        assert!(!statement.declares("other"));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let analysis = Parser::new("f() => 1\n", &ParseOptions::default()).parse();
        let json = serde_json::to_value(&analysis.symbols[0]).unwrap();
        assert_eq!(json["kind"], "Function");
        assert_eq!(json["name"], "f");
        assert_eq!(json["data"]["signature"], "f()");
    }
}
