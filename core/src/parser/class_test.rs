#[cfg(test)]
mod tests {
    use crate::analysis::Analysis;
    use crate::parser::{ParseOptions, Parser};
    use crate::symbol::{Symbol, SymbolKind};

    fn parse(src: &str) -> Analysis {
        Parser::new(src, &ParseOptions::default()).parse()
    }

    fn messages(analysis: &Analysis) -> Vec<&str> {
        analysis.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    fn child<'a>(symbol: &'a Symbol, name: &str) -> &'a Symbol {
        symbol.children.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_static_field_and_method() {
        let analysis = parse("class C {\n    static v := 1\n    M() {\n    }\n}\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let class = &analysis.symbols[0];
        assert_eq!(class.kind(), SymbolKind::Class);
        let info = class.as_class().unwrap();

        let v = &class.children[info.static_members["v"]];
        assert_eq!(v.kind(), SymbolKind::Variable);
        assert!(v.as_variable().unwrap().is_static);
        assert_eq!(v.as_variable().unwrap().default.as_ref().unwrap().text, "1");

        let m = &class.children[info.instance_members["m"]];
        assert_eq!(m.kind(), SymbolKind::Method);
        assert!(!info.static_members.contains_key("m"));
    }

    #[test]
    fn test_extends_dotted_name() {
        let analysis = parse("class B extends A.Inner {\n}\n");
        let info = analysis.symbols[0].as_class().unwrap();
        assert_eq!(info.extends.as_deref(), Some("A.Inner"));
    }

    #[test]
    fn test_missing_base_name() {
        let analysis = parse("class B extends {\n}\n");
        assert_eq!(messages(&analysis), vec!["Expected a class name after \"extends\""]);
    }

    #[test]
    fn test_accessor_property() {
        let src = "class P {\n    Value {\n        get => this._v\n        set => this._v := Value\n    }\n    Item[i] => i\n}\n";
        let analysis = parse(src);
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let class = &analysis.symbols[0];

        let value = child(class, "Value");
        assert_eq!(value.kind(), SymbolKind::Property);
        let accessors: Vec<&str> = value.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(accessors, vec!["get", "set"]);
        assert!(value.children.iter().all(|c| c.kind() == SymbolKind::Method));
        let setter = value.children[1].as_function().unwrap();
        assert_eq!(setter.params[0].name, "Value");

        let item = child(class, "Item");
        let getter = item.children[0].as_function().unwrap();
        assert_eq!(getter.params[0].name, "i");

        let info = class.as_class().unwrap();
        assert!(info.instance_members.contains_key("value"));
        assert!(info.instance_members.contains_key("item"));
    }

    #[test]
    fn test_field_requires_initializer() {
        let analysis = parse("class C {\n    x\n}\n");
        assert_eq!(messages(&analysis), vec!["Property declaration must be initialized"]);
    }

    #[test]
    fn test_field_list() {
        let analysis = parse("class C {\n    a := 1, b := 2\n}\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let names: Vec<&str> = analysis.symbols[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_first_field_wins() {
        let analysis = parse("class C {\n    a := 1\n    A := 2\n}\n");
        let class = &analysis.symbols[0];
        assert_eq!(class.children.len(), 1);
        assert_eq!(class.children[0].as_variable().unwrap().default.as_ref().unwrap().text, "1");
    }

    #[test]
    fn test_static_and_instance_field_with_same_name() {
        let analysis = parse("class C {\n    static a := 1\n    a := 2\n}\n");
        let class = &analysis.symbols[0];
        assert_eq!(class.children.len(), 2);
        let info = class.as_class().unwrap();
        assert_ne!(info.static_members["a"], info.instance_members["a"]);
    }

    #[test]
    fn test_static_method() {
        let analysis = parse("class C {\n    static Make() => C()\n}\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let class = &analysis.symbols[0];
        let info = class.as_class().unwrap();
        let make = &class.children[info.static_members["make"]];
        assert!(make.as_function().unwrap().is_static);
        assert_eq!(make.as_function().unwrap().returns[0].text, "C()");
    }

    #[test]
    fn test_nested_class() {
        let analysis = parse("class Outer {\n    class Inner {\n        x := 1\n    }\n}\n");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let outer = &analysis.symbols[0];
        let inner = child(outer, "Inner");
        assert_eq!(inner.kind(), SymbolKind::Class);
        assert!(outer.as_class().unwrap().static_members.contains_key("inner"));
        assert_eq!(inner.children.len(), 1);
    }

    #[test]
    fn test_class_inside_function() {
        let analysis = parse("f() {\n    class X {\n    }\n}\n");
        assert!(messages(&analysis).contains(&"Functions cannot contain classes"));
    }

    #[test]
    fn test_missing_class_body() {
        let analysis = parse("class X\ny := 1\n");
        assert_eq!(messages(&analysis), vec!["Class body expected"]);
        assert_eq!(analysis.symbols.len(), 1);
        assert_eq!(analysis.symbols[0].name, "y");
    }

    #[test]
    fn test_global_in_class_body() {
        let analysis = parse("class C {\n    global x := 1\n}\n");
        assert_eq!(messages(&analysis), vec!["Class property declarations cannot use global or local"]);
    }

    #[test]
    fn test_method_locals_stay_inside() {
        let analysis = parse("class C {\n    M() {\n        tmp := 1\n    }\n}\n");
        let class = &analysis.symbols[0];
        assert_eq!(class.children.len(), 1);
        let m = &class.children[0];
        assert_eq!(m.children.len(), 1);
        assert_eq!(m.children[0].name, "tmp");
    }

    #[test]
    fn test_class_keyword_mid_line_is_not_a_class() {
        let analysis = parse("x := class\n");
        assert_eq!(messages(&analysis), vec!["Reserved words cannot be used as variable names"]);
        assert!(analysis.symbols.iter().all(|s| s.kind() != SymbolKind::Class));
    }
}
