use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RcConfig {
    pub editor: Option<String>,
    pub write: bool,
    pub database: Option<String>,
}

pub struct RcLoader;

impl RcLoader {
    /// Get the path to the RC file
    /// Looks for .sofarc in:
    /// 1. Current directory
    /// 2. Home directory (~/.sofarc)
    pub fn rc_path() -> Option<PathBuf> {
        let current_rc = Path::new(".sofarc");
        if current_rc.exists() {
            return Some(current_rc.to_path_buf());
        }

        if let Ok(home) = env::var("HOME") {
            let home_rc = Path::new(&home).join(".sofarc");
            if home_rc.exists() {
                return Some(home_rc);
            }
        }

        None
    }

    /// Load and parse the RC file
    pub fn load_config() -> RcConfig {
        let mut config = RcConfig::default();

        if let Some(rc_path) = Self::rc_path() {
            match fs::read_to_string(&rc_path) {
                Ok(content) => {
                    Self::parse_config_content(&content, &mut config);
                }
                Err(_) => {
                    // Silently fail if we can't read the file
                }
            }
        }

        config
    }

    fn parse_config_content(content: &str, config: &mut RcConfig) {
        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            Self::parse_config_line(line, config);
        }
    }

    fn parse_config_line(line: &str, config: &mut RcConfig) {
        let Some((key, value)) = line.split_once(char::is_whitespace) else {
            return;
        };
        let value = value.trim();

        match key {
            "editor" => {
                if !value.is_empty() {
                    config.editor = Some(value.to_string());
                }
            }
            "write" => match value {
                "on" | "true" => config.write = true,
                "off" | "false" => config.write = false,
                _ => {}
            },
            "database" => {
                if !value.is_empty() {
                    config.database = Some(value.to_string());
                }
            }
            _ => {
                // Unknown keys are ignored so old configs keep working
            }
        }
    }
}

/// Pick the editor program: RC file first, then $EDITOR, then vi.
pub fn editor_program(config: &RcConfig) -> String {
    config
        .editor
        .clone()
        .or_else(|| env::var("EDITOR").ok().filter(|value| !value.is_empty()))
        .unwrap_or_else(|| "/usr/bin/vi".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed(content: &str) -> RcConfig {
        let mut config = RcConfig::default();
        RcLoader::parse_config_content(content, &mut config);
        config
    }

    #[test]
    fn test_parse_full_config() {
        let config = parsed(
            "# sofa config\n\
             editor nano\n\
             write on\n\
             database scratch\n",
        );
        assert_eq!(
            config,
            RcConfig {
                editor: Some("nano".to_string()),
                write: true,
                database: Some("scratch".to_string()),
            }
        );
    }

    #[test]
    fn test_comments_and_blanks_ignored() {
        let config = parsed("\n# editor nano\n\n   \n");
        assert_eq!(config, RcConfig::default());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = parsed("colour full\nwrite on\n");
        assert!(config.write);
        assert_eq!(config.editor, None);
    }

    #[test]
    fn test_bad_write_value_keeps_default() {
        let config = parsed("write sometimes\n");
        assert!(!config.write);
    }

    #[test]
    fn test_editor_with_arguments() {
        let config = parsed("editor code --wait\n");
        assert_eq!(config.editor, Some("code --wait".to_string()));
    }
}
