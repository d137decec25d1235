#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use crate::config::{EngineConfig, LegacyEncoding};

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.legacy_encoding, LegacyEncoding::Latin1);
    }

    #[test]
    fn test_camel_case_fields() {
        let config = EngineConfig::from_json_str(
            r#"{
                "libraryDirs": ["lib", "vendor/lib"],
                "legacyEncoding": "strict",
                "maxDiagnostics": 5,
                "builtinVariables": ["MyGlobal"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.library_dirs, vec![PathBuf::from("lib"), PathBuf::from("vendor/lib")]);
        assert_eq!(config.legacy_encoding, LegacyEncoding::Strict);
        assert_eq!(config.max_diagnostics, 5);
        assert_eq!(config.builtin_variables, vec!["MyGlobal".to_string()]);
    }

    #[test]
    fn test_rejects_unknown_encoding() {
        assert!(EngineConfig::from_json_str(r#"{"legacyEncoding": "ebcdic"}"#).is_err());
    }

    #[test]
    fn test_parse_options_use_script_directory() {
        let config = EngineConfig {
            library_dirs: vec![PathBuf::from("/opt/lib")],
            max_diagnostics: 3,
            builtin_variables: vec!["Gui_Main".into()],
            ..Default::default()
        };
        let options = config.parse_options(Some(Path::new("/scripts/main.ahk")));
        assert_eq!(options.script_dir, PathBuf::from("/scripts"));
        assert_eq!(options.file.as_deref(), Some(Path::new("/scripts/main.ahk")));
        assert_eq!(options.lib_dirs, vec![PathBuf::from("/opt/lib")]);
        assert_eq!(options.max_diagnostics, 3);
        assert!(options.extra_builtins.contains("gui_main"));
    }

    #[test]
    fn test_from_path_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ahk2.json");
        std::fs::write(&path, r#"{"maxDiagnostics": 10}"#).unwrap();
        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.max_diagnostics, 10);
        assert!(EngineConfig::from_path(&dir.path().join("missing.json")).is_err());
    }
}
