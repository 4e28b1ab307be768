//! TOML session configuration with defaults for every knob.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glam::{UVec2, Vec2};
use serde::Deserialize;
use skyline_core::TileCoord;
use skyline_system_builder::StagingLayout;
use skyline_system_movement::SwarmTuning;
use skyline_world::{Layout, LoadSettings};

/// City map shipped with the binary; the default window shows its eastern district.
const BUNDLED_MAP: &str = include_str!("../assets/skyline.map");

/// Logical frames per second the tick counts below are expressed in.
pub(crate) const TICKS_PER_SECOND: u32 = 30;

/// Everything a headless session needs, loaded from TOML.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionConfig {
    /// Seed for every random choice made during the session.
    pub(crate) seed: u64,
    /// Skips the intro and the staging shelf, flying the autopilot over the city only.
    pub(crate) demo: bool,
    /// Length of the play phase in seconds.
    pub(crate) time_limit: u32,
    /// Upper bound on simulated ticks, regardless of phase.
    pub(crate) max_ticks: u32,
    /// Viewport the city is centred in.
    pub(crate) viewport: ViewportConfig,
    /// Extra downward shift of the whole city.
    pub(crate) y_offset_base: i32,
    /// Tallest stack the seeding may produce.
    pub(crate) max_height: u32,
    /// Height seeded on every special lot.
    pub(crate) special_height: u32,
    /// Starting building heights, each used at most once.
    pub(crate) building_presets: Vec<u32>,
    /// Search radius for pick-up and drop-off.
    pub(crate) pickup_radius: f32,
    /// Number of slots on the staging shelf.
    pub(crate) staging_slots: usize,
    /// Ticks between two autopilot actions.
    pub(crate) action_interval: u32,
    /// Invader swarm settings.
    pub(crate) invaders: InvaderConfig,
    /// Inline map text; takes precedence over `layout_path`.
    pub(crate) layout: Option<String>,
    /// Map file, resolved relative to the configuration file.
    pub(crate) layout_path: Option<PathBuf>,
    /// Part of the map the city is built from.
    pub(crate) window: WindowConfig,
}

/// Viewport dimensions in screen units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ViewportConfig {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Invader swarm switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct InvaderConfig {
    pub(crate) enabled: bool,
    pub(crate) spawn_per_tick: u32,
}

/// Rectangle of map tiles turned into the city grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowConfig {
    pub(crate) column: i32,
    pub(crate) row: i32,
    pub(crate) columns: u32,
    pub(crate) rows: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let settings = LoadSettings::default();
        Self {
            seed: 0x5eed,
            demo: false,
            time_limit: 120,
            max_ticks: 10_000,
            viewport: ViewportConfig::default(),
            y_offset_base: settings.y_offset_base,
            max_height: settings.max_height,
            special_height: settings.special_height,
            building_presets: settings.building_presets,
            pickup_radius: skyline_system_builder::SEARCH_RADIUS,
            staging_slots: StagingLayout::default().slots,
            action_interval: 45,
            invaders: InvaderConfig::default(),
            layout: None,
            layout_path: None,
            window: WindowConfig::default(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
        }
    }
}

impl Default for InvaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_per_tick: 20,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            column: 16,
            row: 0,
            columns: 16,
            rows: 16,
        }
    }
}

impl SessionConfig {
    /// Reads a configuration file, resolving `layout_path` against its directory.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config at {}", path.display()))?;
        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("invalid session config in {}", path.display()))?;
        if let (Some(layout_path), Some(base)) = (config.layout_path.as_mut(), path.parent()) {
            if layout_path.is_relative() {
                *layout_path = base.join(&*layout_path);
            }
        }
        Ok(config)
    }

    /// Parses configuration text; missing keys fall back to their defaults.
    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse session config toml contents")
    }

    /// Loads the map and cuts the configured window out of it.
    pub(crate) fn city_layout(&self) -> Result<Layout> {
        let text = match (&self.layout, &self.layout_path) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("failed to read city map at {}", path.display()))?,
            (None, None) => BUNDLED_MAP.to_owned(),
        };
        let map = Layout::parse(&text).context("failed to parse city map")?;
        let window = self.window;
        map.window(
            TileCoord::new(window.column, window.row),
            window.columns,
            window.rows,
        )
        .context("city window does not fit the map")
    }

    /// Seeding settings passed to the city loader.
    pub(crate) fn load_settings(&self) -> LoadSettings {
        LoadSettings {
            max_height: self.max_height,
            special_height: self.special_height,
            building_presets: self.building_presets.clone(),
            viewport: self.viewport(),
            y_offset_base: self.y_offset_base,
        }
    }

    /// Staging shelf geometry with the configured slot count.
    pub(crate) fn staging_layout(&self) -> StagingLayout {
        StagingLayout {
            slots: self.staging_slots,
            ..StagingLayout::default()
        }
    }

    /// Swarm tuning with the configured spawn rate.
    pub(crate) fn swarm_tuning(&self) -> SwarmTuning {
        SwarmTuning {
            spawn_per_tick: self.invaders.spawn_per_tick,
            ..SwarmTuning::default()
        }
    }

    /// Viewport as an integer vector.
    pub(crate) fn viewport(&self) -> UVec2 {
        UVec2::new(self.viewport.width, self.viewport.height)
    }

    /// Viewport as a float vector, for flight clamping.
    pub(crate) fn viewport_size(&self) -> Vec2 {
        self.viewport().as_vec2()
    }
}
