#[cfg(test)]
mod tests {
    use crate::token::{Scanner, Token, TokenKind};

    fn scan(src: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(src);
        let mut out = Vec::new();
        loop {
            let tk = scanner.next_token();
            if tk.is_eof() {
                break;
            }
            out.push(tk);
        }
        out
    }

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        scan(src).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_assignment_line() {
        let toks = scan("x := 1 + y");
        let k: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::Word,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Operator,
                TokenKind::Word
            ]
        );
        assert!(toks[0].top_of_line);
        assert!(!toks[1].top_of_line);
        assert_eq!(toks[4].offset, 9);
    }

    #[test]
    fn test_newline_counts() {
        let toks = scan("a\n\n\nb");
        assert_eq!(toks[1].newlines, 3);
        assert!(toks[1].top_of_line);
    }

    #[test]
    fn test_reserved_and_word_operators() {
        let toks = kinds("if a and not b\nobj.class := 1");
        assert_eq!(toks[0], (TokenKind::Reserved, "if".into()));
        assert_eq!(toks[2], (TokenKind::Operator, "and".into()));
        assert_eq!(toks[3], (TokenKind::Operator, "not".into()));
        // member names after a dot are never reserved
        assert_eq!(toks[7], (TokenKind::Word, "class".into()));
    }

    #[test]
    fn test_numbers() {
        let toks = kinds("a := 0x1F + 1.5 + 1e-10 + 2E3 + 10");
        let nums: Vec<_> = toks.iter().filter(|t| t.0 == TokenKind::Number).map(|t| t.1.as_str()).collect();
        assert_eq!(nums, vec!["0x1F", "1.5", "1e-10", "2E3", "10"]);
        // digit-leading identifiers stay words so the parser can flag them
        assert_eq!(kinds("1abc")[0], (TokenKind::Word, "1abc".into()));
    }

    #[test]
    fn test_strings_and_escapes() {
        let toks = kinds(r#"s := "a`"b" . 'c'"#);
        assert_eq!(toks[2], (TokenKind::String, r#""a`"b""#.into()));
        assert_eq!(toks[3], (TokenKind::Operator, ".".into()));
        assert_eq!(toks[4], (TokenKind::String, "'c'".into()));
    }

    #[test]
    fn test_unterminated_string_resumes_next_line() {
        let toks = scan("s := \"abc  \nx := 1");
        assert_eq!(toks[2].kind, TokenKind::Unknown);
        assert_eq!(toks[2].text, "\"abc");
        assert_eq!(toks[3].text, "x");
        assert!(toks[3].top_of_line);
    }

    #[test]
    fn test_continuation_section() {
        let src = "s := \"\n(\nline one\nline \"two\"\n)\"\nnext := 1";
        let toks = scan(src);
        assert_eq!(toks[2].kind, TokenKind::String);
        assert!(toks[2].text.ends_with(")\""));
        assert_eq!(toks[3].text, "next");
    }

    #[test]
    fn test_string_at_eof_is_partial() {
        let toks = scan("s := 'abc");
        assert_eq!(toks[2].kind, TokenKind::String);
        assert_eq!(toks[2].text, "'abc");
    }

    #[test]
    fn test_comments() {
        let toks = scan("; top\nx := 1 ; trailing\n/* block\n still */\ny");
        assert_eq!(toks[0].kind, TokenKind::Comment);
        assert_eq!(toks[4].kind, TokenKind::InlineComment);
        assert_eq!(toks[4].text, "; trailing");
        assert_eq!(toks[5].kind, TokenKind::BlockComment);
        assert!(toks[5].text.ends_with("*/"));
        assert_eq!(toks[6].text, "y");
    }

    #[test]
    fn test_unclosed_block_comment_runs_to_end() {
        let toks = scan("/* never\nclosed");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::BlockComment);
    }

    #[test]
    fn test_label_only_when_alone() {
        assert_eq!(kinds("start:")[0], (TokenKind::Label, "start:".into()));
        assert_eq!(kinds("start: ; note")[0].0, TokenKind::Label);
        assert_eq!(kinds("a: b")[0].0, TokenKind::Word);
        assert_eq!(kinds("x := a ? b : c")[5].0, TokenKind::Operator);
    }

    #[test]
    fn test_directives() {
        let toks = kinds("#Include lib\\util.ahk\n#SingleInstance Force");
        assert_eq!(toks[0], (TokenKind::Directive, "#Include lib\\util.ahk".into()));
        assert_eq!(toks[1], (TokenKind::Directive, "#SingleInstance".into()));
        assert_eq!(toks[2], (TokenKind::Word, "Force".into()));
    }

    #[test]
    fn test_dot_forms() {
        let toks = kinds("a.b .= c . d");
        assert_eq!(toks[1].0, TokenKind::Dot);
        assert_eq!(toks[3], (TokenKind::Assign, ".=".into()));
        assert_eq!(toks[5], (TokenKind::Operator, ".".into()));
    }

    #[test]
    fn test_compound_assignments_and_operators() {
        let toks = kinds("a //= 2\nb >>= 1\nc => d\ne == f");
        assert_eq!(toks[1], (TokenKind::Assign, "//=".into()));
        assert_eq!(toks[4], (TokenKind::Assign, ">>=".into()));
        assert_eq!(toks[7], (TokenKind::Operator, "=>".into()));
        assert_eq!(toks[10], (TokenKind::Operator, "==".into()));
    }

    #[test]
    fn test_hotkeys() {
        let toks = kinds("^!a::\n{\n}\n#c::MsgBox(\"hi\")");
        assert_eq!(toks[0], (TokenKind::Hotkey, "^!a::".into()));
        assert_eq!(toks[1].0, TokenKind::OpenBrace);
        assert_eq!(toks[3], (TokenKind::Hotkey, "#c::".into()));
        assert_eq!(toks[4], (TokenKind::Word, "MsgBox".into()));
    }

    #[test]
    fn test_hotkey_combo_and_remap() {
        let toks = kinds("a & b::\nx::y\nnext");
        assert_eq!(toks[0], (TokenKind::Hotkey, "a & b::".into()));
        assert_eq!(toks[1], (TokenKind::Hotstring, "x::".into()));
        assert_eq!(toks[2], (TokenKind::Word, "next".into()));
    }

    #[test]
    fn test_hotstrings() {
        let toks = kinds("::btw::by the way\n:X:ahk::Run(\"x\")\n:*:ab::\n{\n}");
        assert_eq!(toks[0], (TokenKind::Hotstring, "::btw::".into()));
        assert_eq!(toks[1], (TokenKind::Hotkey, ":X:ahk::".into()));
        assert_eq!(toks[2], (TokenKind::Word, "Run".into()));
        let brace = toks.iter().position(|t| t.1 == ":*:ab::").expect("block hotstring");
        assert_eq!(toks[brace].0, TokenKind::Hotstring);
    }

    #[test]
    fn test_hotkey_only_at_line_start() {
        let toks = kinds("x := 1, a::b");
        assert!(toks.iter().all(|t| t.0 != TokenKind::Hotkey && t.0 != TokenKind::Hotstring));
    }

    #[test]
    fn test_unicode_identifiers() {
        let toks = kinds("变量 := données");
        assert_eq!(toks[0], (TokenKind::Word, "变量".into()));
        assert_eq!(toks[2], (TokenKind::Word, "données".into()));
    }

    #[test]
    fn test_unknown_char_and_checkpoint() {
        let mut scanner = Scanner::new("a @ b");
        scanner.next_token();
        let saved = scanner.checkpoint();
        let unknown = scanner.next_token();
        assert_eq!(unknown.kind, TokenKind::Unknown);
        scanner.restore(saved);
        assert_eq!(scanner.next_token().text, "@");
        assert_eq!(scanner.next_token().text, "b");
        assert!(scanner.next_token().is_eof());
    }
}
