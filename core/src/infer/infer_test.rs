#[cfg(test)]
mod tests {
    use crate::analysis::Analysis;
    use crate::infer::{Shape, Shapes, TypeInference};
    use crate::parser::{ParseOptions, Parser};
    use crate::resolve::Resolver;
    use crate::util::cancel::CancelFlag;

    fn parse(src: &str) -> Analysis {
        Parser::new(src, &ParseOptions::default()).parse()
    }

    /// Infers `expr` at the end of `src`.
    fn infer(src: &str, expr: &str) -> Shapes {
        infer_at(src, expr, src.len())
    }

    fn infer_at(src: &str, expr: &str, offset: usize) -> Shapes {
        let analysis = parse(src);
        let resolver = Resolver::new(&analysis);
        TypeInference::new(&resolver).infer(expr, offset)
    }

    fn shapes(list: &[Shape]) -> Shapes {
        list.iter().cloned().collect()
    }

    #[test]
    fn test_literals() {
        assert_eq!(infer("", "42"), shapes(&[Shape::Number]));
        assert_eq!(infer("", "\"text\""), shapes(&[Shape::String]));
        assert_eq!(infer("", "[1, 2]"), shapes(&[Shape::Array]));
        assert_eq!(infer("", "{a: 1}"), shapes(&[Shape::Object]));
        assert_eq!(infer("", "true"), shapes(&[Shape::Number]));
    }

    #[test]
    fn test_operators() {
        assert_eq!(infer("", "\"a\" . \"b\""), shapes(&[Shape::String]));
        assert_eq!(infer("", "1 + 2"), shapes(&[Shape::Number]));
        assert_eq!(infer("", "a > b"), shapes(&[Shape::Number]));
        assert_eq!(infer("", "-5"), shapes(&[Shape::Number]));
        assert_eq!(infer("", "c ? 1 : \"s\""), shapes(&[Shape::Number, Shape::String]));
        assert_eq!(infer("", "x := \"v\""), shapes(&[Shape::String]));
        assert_eq!(infer("", "x .= 1"), shapes(&[Shape::String]));
        assert_eq!(infer("", "x += 1"), shapes(&[Shape::Number]));
        assert_eq!(infer("", "(1)"), shapes(&[Shape::Number]));
    }

    #[test]
    fn test_variable_initializer() {
        assert_eq!(infer("x := 42\n", "x"), shapes(&[Shape::Number]));
        assert_eq!(infer("s := \"a\" \"b\"\n", "s"), shapes(&[Shape::String]));
    }

    #[test]
    fn test_class_call_gives_instance() {
        let src = "class Foo {\n}\nf := Foo()\n";
        assert_eq!(infer(src, "f"), shapes(&[Shape::Instance("Foo".into())]));
        assert_eq!(infer(src, "Foo"), shapes(&[Shape::ClassObject("Foo".into())]));
        assert_eq!(infer(src, "new Foo()"), shapes(&[Shape::Instance("Foo".into())]));
        assert_eq!(infer(src, "Array()"), shapes(&[Shape::Array]));
    }

    #[test]
    fn test_function_returns_union() {
        let src = "Make(flag) {\n    if flag\n        return [1]\n    return \"none\"\n}\n";
        assert_eq!(infer(src, "Make(1)"), shapes(&[Shape::Array, Shape::String]));
        assert_eq!(infer(src, "Make"), shapes(&[Shape::Function("Make".into())]));
    }

    #[test]
    fn test_method_chain() {
        let src = "class Box {\n    Get() {\n        return \"v\"\n    }\n}\nb := Box()\n";
        assert_eq!(infer(src, "b.Get()"), shapes(&[Shape::String]));
        assert_eq!(infer(src, "b.Missing"), shapes(&[Shape::Unknown]));
    }

    #[test]
    fn test_builtin_members() {
        let src = "arr := [1]\n";
        assert_eq!(infer(src, "arr.Length"), shapes(&[Shape::Number]));
        assert_eq!(infer(src, "arr.Clone()"), shapes(&[Shape::Array]));
        assert_eq!(infer(src, "arr[1]"), shapes(&[Shape::Unknown]));
    }

    #[test]
    fn test_property_getter() {
        let src = "class P {\n    Name => \"n\"\n}\np := P()\n";
        assert_eq!(infer(src, "p.Name"), shapes(&[Shape::String]));
    }

    #[test]
    fn test_static_members_through_class_object() {
        let src = "class C {\n    static Count := 0\n    Inst := \"\"\n}\n";
        assert_eq!(infer(src, "C.Count"), shapes(&[Shape::Number]));
        assert_eq!(infer(src, "C.Inst"), shapes(&[Shape::Unknown]));
    }

    #[test]
    fn test_this_in_methods() {
        let src = "class T {\n    M() {\n        return this\n    }\n    static S() {\n        return this\n    }\n}\n";
        let in_method = src.find("return this").unwrap() + 1;
        assert_eq!(infer_at(src, "this", in_method), shapes(&[Shape::Instance("T".into())]));
        let in_static = src.rfind("return this").unwrap() + 1;
        assert_eq!(infer_at(src, "this", in_static), shapes(&[Shape::ClassObject("T".into())]));
        assert_eq!(infer_at(src, "this", src.len()), shapes(&[Shape::Unknown]));
    }

    #[test]
    fn test_super_uses_base() {
        let src = "class A {\n}\nclass B extends A {\n    M() {\n        return super\n    }\n}\n";
        let offset = src.find("return super").unwrap() + 1;
        assert_eq!(infer_at(src, "super", offset), shapes(&[Shape::Instance("A".into())]));
    }

    #[test]
    fn test_com_object() {
        assert_eq!(
            infer("", "ComObject(\"Scripting.Dictionary\")"),
            shapes(&[Shape::Foreign("Scripting.Dictionary".into())])
        );
    }

    #[test]
    fn test_misses_are_unknown() {
        assert_eq!(infer("", "nothing"), shapes(&[Shape::Unknown]));
        assert_eq!(infer("", "%name%"), shapes(&[Shape::Unknown]));
        assert_eq!(infer("x := 1\n", "x.NoSuch"), shapes(&[Shape::Unknown]));
        assert_eq!(infer("", "(a) => a"), shapes(&[Shape::Unknown]));
    }

    #[test]
    fn test_recursive_definitions_terminate() {
        assert_eq!(infer("a := b\nb := a\n", "a"), shapes(&[Shape::Unknown]));
    }

    #[test]
    fn test_cancelled_request() {
        let analysis = parse("x := 1\n");
        let cancel = CancelFlag::new();
        cancel.cancel();
        let resolver = Resolver::new(&analysis).with_cancel(cancel);
        assert_eq!(TypeInference::new(&resolver).infer("x", 7), shapes(&[Shape::Unknown]));
    }

    #[test]
    fn test_callable_lookup() {
        let analysis = parse("class Box {\n    Get() => 1\n}\n");
        let resolver = Resolver::new(&analysis);
        let mut inference = TypeInference::new(&resolver);
        let found = inference.infer("Box().Get", 0);
        assert_eq!(found, shapes(&[Shape::Function("Box.Get".into())]));
        assert_eq!(inference.callable("Box.Get").unwrap().name, "Get");
    }

    #[test]
    fn test_instance_serves_several_queries() {
        let src = "x := 1\nx := \"s\"\n";
        let analysis = parse(src);
        let resolver = Resolver::new(&analysis);
        let mut inference = TypeInference::new(&resolver);
        let end = src.len();
        let first = inference.infer("x", end);
        assert_eq!(inference.infer("[x]", 0), shapes(&[Shape::Array]));
        assert_eq!(inference.infer("x", end), first);
        assert_eq!(inference.infer("x . 1", end), shapes(&[Shape::String]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::ClassObject("C".into()).to_string(), "class C");
        assert_eq!(Shape::Instance("C".into()).to_string(), "C");
        assert_eq!(Shape::Foreign("X.Y".into()).to_string(), "ComObject(X.Y)");
        assert_eq!(Shape::Unknown.to_string(), "unknown");
    }
}
