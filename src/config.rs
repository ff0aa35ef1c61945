/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Track geometry and movement timing default to the shipped tuning; the
/// level document and progress file paths resolve relative to the first
/// writable candidate directory.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub track: TrackConfig,
    pub movement: MovementConfig,
    pub levels_path: PathBuf,
    pub progress_path: PathBuf,
    pub tick_rate_ms: u64,
    /// Invulnerability override: obstacle contacts are ignored while set.
    pub god_mode: bool,
}

#[derive(Clone, Debug)]
pub struct TrackConfig {
    /// Distance between consecutive floor segments.
    pub floor_pitch: f32,
    /// World offset of the first floor segment.
    pub floor_offset: f32,
    /// Distance between consecutive obstacle slots.
    pub obstacle_gap: f32,
    /// World offset of the first obstacle slot.
    pub slot_offset: f32,
    /// World depth of the player's trigger plane.
    pub player_plane: f32,
    /// Track scroll speed at level 0.
    pub base_speed: f32,
    /// Speed added every `levels_per_step` cleared levels.
    pub speed_step: f32,
    pub levels_per_step: u32,
    /// Ticks the scene transition covers before a rebuild starts.
    pub reset_delay_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct MovementConfig {
    /// Lane/row pitch of the movement grid.
    pub grid_size: f32,
    /// World position of grid cell (0, 0).
    pub grid_origin_x: f32,
    pub grid_origin_y: f32,
    /// Ticks a single cell transition takes.
    pub move_ticks: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    track: TomlTrack,
    #[serde(default)]
    movement: TomlMovement,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTrack {
    #[serde(default = "default_floor_pitch")]
    floor_pitch: f32,
    #[serde(default = "default_floor_offset")]
    floor_offset: f32,
    #[serde(default = "default_obstacle_gap")]
    obstacle_gap: f32,
    #[serde(default = "default_slot_offset")]
    slot_offset: f32,
    #[serde(default = "default_player_plane")]
    player_plane: f32,
    #[serde(default = "default_base_speed")]
    base_speed: f32,
    #[serde(default = "default_speed_step")]
    speed_step: f32,
    #[serde(default = "default_levels_per_step")]
    levels_per_step: u32,
    #[serde(default = "default_reset_delay")]
    reset_delay_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlMovement {
    #[serde(default = "default_grid_size")]
    grid_size: f32,
    #[serde(default = "default_grid_origin_x")]
    grid_origin_x: f32,
    #[serde(default = "default_grid_origin_y")]
    grid_origin_y: f32,
    #[serde(default = "default_move_ticks")]
    move_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_path")]
    levels_path: String,
    #[serde(default = "default_progress_path")]
    progress_path: String,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default)]
    god_mode: bool,
}

// ── Defaults ──

fn default_floor_pitch() -> f32 { 12.5 }
fn default_floor_offset() -> f32 { 10.0 }
fn default_obstacle_gap() -> f32 { 18.0 }
fn default_slot_offset() -> f32 { 29.0 }
fn default_player_plane() -> f32 { 11.0 }
fn default_base_speed() -> f32 { 8.5 }
fn default_speed_step() -> f32 { 0.5 }
fn default_levels_per_step() -> u32 { 5 }
fn default_reset_delay() -> u32 { 30 }   // 0.5s at 16ms tick

fn default_grid_size() -> f32 { 1.8 }
fn default_grid_origin_x() -> f32 { -1.8 }
fn default_grid_origin_y() -> f32 { 1.0 }
fn default_move_ticks() -> u32 { 30 }    // 0.5s at 16ms tick

fn default_levels_path() -> String { "levels.json".into() }
fn default_progress_path() -> String { "progress.dat".into() }
fn default_tick_rate() -> u64 { 16 }

impl Default for TomlTrack {
    fn default() -> Self {
        TomlTrack {
            floor_pitch: default_floor_pitch(),
            floor_offset: default_floor_offset(),
            obstacle_gap: default_obstacle_gap(),
            slot_offset: default_slot_offset(),
            player_plane: default_player_plane(),
            base_speed: default_base_speed(),
            speed_step: default_speed_step(),
            levels_per_step: default_levels_per_step(),
            reset_delay_ticks: default_reset_delay(),
        }
    }
}

impl Default for TomlMovement {
    fn default() -> Self {
        TomlMovement {
            grid_size: default_grid_size(),
            grid_origin_x: default_grid_origin_x(),
            grid_origin_y: default_grid_origin_y(),
            move_ticks: default_move_ticks(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_path: default_levels_path(),
            progress_path: default_progress_path(),
            tick_rate_ms: default_tick_rate(),
            god_mode: false,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            track: TrackConfig {
                floor_pitch: toml_cfg.track.floor_pitch,
                floor_offset: toml_cfg.track.floor_offset,
                obstacle_gap: toml_cfg.track.obstacle_gap,
                slot_offset: toml_cfg.track.slot_offset,
                player_plane: toml_cfg.track.player_plane,
                base_speed: toml_cfg.track.base_speed,
                speed_step: toml_cfg.track.speed_step,
                levels_per_step: toml_cfg.track.levels_per_step,
                reset_delay_ticks: toml_cfg.track.reset_delay_ticks,
            },
            movement: MovementConfig {
                grid_size: toml_cfg.movement.grid_size,
                grid_origin_x: toml_cfg.movement.grid_origin_x,
                grid_origin_y: toml_cfg.movement.grid_origin_y,
                move_ticks: toml_cfg.movement.move_ticks,
            },
            levels_path: resolve_path(&toml_cfg.general.levels_path, search_dirs),
            progress_path: resolve_path(&toml_cfg.general.progress_path, search_dirs),
            tick_rate_ms: toml_cfg.general.tick_rate_ms,
            god_mode: toml_cfg.general.god_mode,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), &[PathBuf::from(".")])
    }
}

/// Resolve a config path: absolute paths pass through, relative paths are
/// searched across candidate dirs, preferring an existing file.
fn resolve_path(path_str: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let raw = PathBuf::from(path_str);
    if raw.is_absolute() {
        return raw;
    }
    search_dirs.iter()
        .map(|d| d.join(&raw))
        .find(|p| p.exists())
        .unwrap_or_else(|| {
            search_dirs.first()
                .map(|d| d.join(&raw))
                .unwrap_or(raw)
        })
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/lanerunner → /usr/games/lanerunner
        // still finds data relative to the real binary.
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

    // 3. XDG data home (~/.local/share/lanerunner)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/lanerunner");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
