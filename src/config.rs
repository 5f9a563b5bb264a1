//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory, the CWD, or
//! `~/.local/share/deepdig`. Missing files and missing keys fall back to
//! defaults; a file that fails to parse is reported and ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::mining::MiningConfig;
use crate::domain::physics::PhysicsConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub physics: PhysicsConfig,
    pub mining: MiningConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// 0 picks a fresh random seed each run.
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub surface_level: usize,
    /// Column of the shop entrance on the surface.
    pub shop_door_x: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    /// Longest simulated step, in seconds.
    pub max_dt: f32,
    pub frame_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub mine: Vec<String>,
    pub interact: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    world: TomlWorld,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    mining: TomlMining,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default)]
    seed: u64,
    #[serde(default = "default_world_width")]
    width: usize,
    #[serde(default = "default_world_height")]
    height: usize,
    #[serde(default = "default_surface_level")]
    surface_level: usize,
    #[serde(default = "default_shop_door_x")]
    shop_door_x: i32,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlPhysics {
    accel: f32,
    max_speed: f32,
    friction: f32,
    gravity: f32,
    max_fall: f32,
    jump_speed: f32,
    coyote_time: f32,
    fall_damage_speed: f32,
    fall_damage_factor: f32,
}

#[derive(Deserialize, Debug)]
struct TomlMining {
    #[serde(default = "default_range_tiles")]
    range_tiles: i32,
    #[serde(default = "default_skill_point_every")]
    skill_point_every: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_max_dt")]
    max_dt: f32,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_mine")]
    mine: Vec<String>,
    #[serde(default = "default_pad_interact")]
    interact: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    cancel: Vec<String>,
}

// ── Defaults ──

fn default_world_width() -> usize { 100 }
fn default_world_height() -> usize { 100 }
fn default_surface_level() -> usize { 10 }
fn default_shop_door_x() -> i32 { 2 }
fn default_range_tiles() -> i32 { 3 }
fn default_skill_point_every() -> u32 { 15 }
fn default_max_dt() -> f32 { 0.05 }
fn default_frame_ms() -> u64 { 16 }   // ~60 fps

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_mine() -> Vec<String> { vec!["X".into(), "R1".into()] }
fn default_pad_interact() -> Vec<String> { vec!["Y".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["Select".into(), "B".into()] }

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            seed: 0,
            width: default_world_width(),
            height: default_world_height(),
            surface_level: default_surface_level(),
            shop_door_x: default_shop_door_x(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        let p = PhysicsConfig::default();
        TomlPhysics {
            accel: p.accel,
            max_speed: p.max_speed,
            friction: p.friction,
            gravity: p.gravity,
            max_fall: p.max_fall,
            jump_speed: p.jump_speed,
            coyote_time: p.coyote_time,
            fall_damage_speed: p.fall_damage_speed,
            fall_damage_factor: p.fall_damage_factor,
        }
    }
}

impl Default for TomlMining {
    fn default() -> Self {
        TomlMining {
            range_tiles: default_range_tiles(),
            skill_point_every: default_skill_point_every(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            max_dt: default_max_dt(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            mine: default_pad_mine(),
            interact: default_pad_interact(),
            confirm: default_pad_confirm(),
            cancel: default_pad_cancel(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/deepdig`. The first file found wins.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            return match GameConfig::load_file(&path) {
                Ok(cfg) => {
                    log::info!("loaded {}", path.display());
                    cfg
                }
                Err(e) => {
                    log::warn!("{e}; using default settings");
                    GameConfig::default()
                }
            };
        }
        log::info!("no config.toml found; using default settings");
        GameConfig::default()
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let toml_cfg = toml::from_str::<TomlConfig>(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(GameConfig::from_toml(toml_cfg))
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            world: WorldConfig {
                seed: t.world.seed,
                width: t.world.width,
                height: t.world.height,
                surface_level: t.world.surface_level,
                shop_door_x: t.world.shop_door_x,
            },
            physics: PhysicsConfig {
                accel: t.physics.accel,
                max_speed: t.physics.max_speed,
                friction: t.physics.friction,
                gravity: t.physics.gravity,
                max_fall: t.physics.max_fall,
                jump_speed: t.physics.jump_speed,
                coyote_time: t.physics.coyote_time,
                fall_damage_speed: t.physics.fall_damage_speed,
                fall_damage_factor: t.physics.fall_damage_factor,
            }
            .sanitized(),
            mining: MiningConfig {
                range_tiles: t.mining.range_tiles,
                skill_point_every: t.mining.skill_point_every.max(1),
                ..MiningConfig::default()
            },
            timing: TimingConfig {
                max_dt: t.timing.max_dt.clamp(0.001, 0.25),
                frame_ms: t.timing.frame_ms,
            },
            gamepad: GamepadConfig {
                jump: t.gamepad.jump,
                mine: t.gamepad.mine,
                interact: t.gamepad.interact,
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
            },
        }
    }
}

impl WorldConfig {
    /// The configured seed, or a random one when the config says 0.
    pub fn resolved_seed(&self) -> u64 {
        if self.seed == 0 {
            rand::random()
        } else {
            self.seed
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/deepdig");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f
    }

    #[test]
    fn empty_file_gives_defaults() {
        let f = write_config("");
        let cfg = GameConfig::load_file(f.path()).unwrap();
        assert_eq!(cfg.world.width, 100);
        assert_eq!(cfg.world.surface_level, 10);
        assert_eq!(cfg.physics, PhysicsConfig::default());
        assert_eq!(cfg.mining, MiningConfig::default());
        assert_eq!(cfg.timing.max_dt, 0.05);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let f = write_config(
            "[world]\nseed = 1234\nwidth = 40\n\n[physics]\ngravity = 900.0\n\n[mining]\nrange_tiles = 5\n",
        );
        let cfg = GameConfig::load_file(f.path()).unwrap();
        assert_eq!(cfg.world.seed, 1234);
        assert_eq!(cfg.world.width, 40);
        assert_eq!(cfg.world.height, 100);
        assert_eq!(cfg.physics.gravity, 900.0);
        assert_eq!(cfg.physics.jump_speed, 380.0);
        assert_eq!(cfg.mining.range_tiles, 5);
        assert_eq!(cfg.mining.skill_point_every, 15);
    }

    #[test]
    fn invalid_physics_values_fall_back() {
        let f = write_config("[physics]\nmax_speed = -1.0\nfriction = nan\njump_speed = 300.0\n");
        let cfg = GameConfig::load_file(f.path()).unwrap();
        let d = PhysicsConfig::default();
        assert_eq!(cfg.physics.max_speed, d.max_speed);
        assert_eq!(cfg.physics.friction, d.friction);
        assert_eq!(cfg.physics.jump_speed, 300.0);
    }

    #[test]
    fn gamepad_lists_override() {
        let f = write_config("[gamepad]\njump = [\"B\"]\n");
        let cfg = GameConfig::load_file(f.path()).unwrap();
        assert_eq!(cfg.gamepad.jump, vec!["B".to_string()]);
        assert_eq!(cfg.gamepad.confirm, vec!["Start".to_string()]);
    }

    #[test]
    fn parse_error_is_reported() {
        let f = write_config("[world\nwidth = ");
        let err = GameConfig::load_file(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GameConfig::load_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn nonzero_seed_is_kept() {
        let w = WorldConfig { seed: 9, ..GameConfig::default().world };
        assert_eq!(w.resolved_seed(), 9);
    }

    #[test]
    fn skill_point_interval_never_zero() {
        let f = write_config("[mining]\nskill_point_every = 0\n");
        let cfg = GameConfig::load_file(f.path()).unwrap();
        assert_eq!(cfg.mining.skill_point_every, 1);
    }
}
