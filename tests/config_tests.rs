//! Config parsing, validation and lookup tests

use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use powertris::config::{GameConfig, CONFIG_ENV_VAR, DEFAULT_BOARD_HEIGHT};
use powertris::error::ConfigError;
use powertris::game::Game;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

mod validation {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GameConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!((config.board_width, config.board_height), (12, 20));
        assert!(config.power_ups_enabled);
    }

    #[test]
    fn board_narrower_than_widest_piece_is_rejected() {
        let config = GameConfig {
            board_width: 3,
            ..GameConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::BoardTooNarrow { width: 3, min: 4 })
        ));
        assert!(Game::new(config).is_err());
    }

    #[test]
    fn board_shorter_than_tallest_piece_is_rejected() {
        let config = GameConfig {
            board_height: 2,
            ..GameConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::BoardTooShort { height: 2, .. })
        ));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let config = GameConfig {
            minimum_drop_interval_ms: 0,
            ..GameConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "minimum_drop_interval_ms"
            })
        ));
    }

    #[test]
    fn floor_above_initial_is_rejected() {
        let config = GameConfig {
            initial_drop_interval_ms: 200,
            minimum_drop_interval_ms: 500,
            ..GameConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::FloorAboveInitial { .. })
        ));
    }
}

mod parsing {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = GameConfig::from_toml_str("board_width = 10\npower_ups_enabled = false\n").unwrap();

        assert_eq!(config.board_width, 10);
        assert_eq!(config.board_height, DEFAULT_BOARD_HEIGHT);
        assert!(!config.power_ups_enabled);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = GameConfig::from_toml_str("board_colour = \"red\"\n");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn parsed_config_is_validated() {
        let result = GameConfig::from_toml_str("lines_per_level = 0\n");

        assert!(matches!(
            result,
            Err(ConfigError::Zero {
                field: "lines_per_level"
            })
        ));
    }

    #[test]
    fn load_reads_file() {
        let file = config_file("board_height = 24\nslow_time_factor = 3\n");

        let config = GameConfig::load(file.path()).unwrap();

        assert_eq!(config.board_height, 24);
        assert_eq!(config.slow_time_factor, 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            GameConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
    }
}

mod lookup {
    use super::*;

    #[test]
    #[serial]
    fn env_var_points_at_config() {
        let file = config_file("board_width = 10\n");
        std::env::set_var(CONFIG_ENV_VAR, file.path());

        let config = GameConfig::resolve(None);
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.unwrap().board_width, 10);
    }

    #[test]
    #[serial]
    fn explicit_path_beats_env_var() {
        let env_file = config_file("board_width = 10\n");
        let explicit = config_file("board_width = 14\n");
        std::env::set_var(CONFIG_ENV_VAR, env_file.path());

        let config = GameConfig::resolve(Some(explicit.path()));
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.unwrap().board_width, 14);
    }

    #[test]
    #[serial]
    fn no_path_means_defaults() {
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(GameConfig::resolve(None).unwrap(), GameConfig::default());
    }
}
