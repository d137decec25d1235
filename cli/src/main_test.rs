#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_sanitize_path_allows_simple_relative() {
        let p = sanitize_path("foo/bar.ahk").expect("relative path should be allowed");
        assert_eq!(p, PathBuf::from("foo/bar.ahk"));
    }

    #[test]
    fn test_sanitize_path_rejects_parent_dir() {
        let err = sanitize_path("foo/../bar.ahk").unwrap_err();
        assert!(err.to_string().contains("Parent directory components"));
    }

    #[cfg(unix)]
    #[test]
    fn test_sanitize_path_allows_absolute_unix() {
        let p = sanitize_path("/etc/passwd").expect("absolute path should be allowed");
        assert_eq!(p, PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("3:5").unwrap(), Position::new(2, 4));
        assert!(parse_position("0:1").is_err());
        assert!(parse_position("7").is_err());
        assert!(parse_position("a:b").is_err());
    }

    #[test]
    fn test_cli_args_check_multiple_files() {
        let args = CliArgs::try_parse_from(["ahk2", "check", "a.ahk", "b.ahk", "--lib", "lib"]).expect("should parse");
        assert_eq!(args.libs, vec![PathBuf::from("lib")]);
        match args.command {
            Commands::Check { files } => assert_eq!(files.len(), 2),
            other => panic!("expected check, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_args_rejects_parent_dir() {
        assert!(CliArgs::try_parse_from(["ahk2", "symbols", "../x.ahk"]).is_err());
        assert!(CliArgs::try_parse_from(["ahk2", "check"]).is_err());
    }

    #[test]
    fn test_cli_args_infer() {
        let args = CliArgs::try_parse_from(["ahk2", "infer", "a.ahk", "2:1", "x.y"]).expect("should parse");
        match args.command {
            Commands::Infer { position, expr, .. } => {
                assert_eq!(position, Position::new(1, 0));
                assert_eq!(expr, "x.y");
            }
            other => panic!("expected infer, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_expr_from() {
        assert_eq!(filter_expr_from("1"), None);
        assert_eq!(filter_expr_from(" on "), None);
        assert_eq!(filter_expr_from("ahk2::parse=trace").as_deref(), Some("ahk2::parse=trace"));
    }

    #[test]
    fn test_load_config_appends_libs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ahk2.json");
        std::fs::write(&path, r#"{"libraryDirs": ["first"]}"#).unwrap();
        let config = load_config(Some(&path), vec![PathBuf::from("second")]).unwrap();
        assert_eq!(config.library_dirs, vec![PathBuf::from("first"), PathBuf::from("second")]);
        assert!(load_config(Some(&dir.path().join("missing.json")), Vec::new()).is_err());
    }
}
