// Game configuration: the closed menu of mole durations plus fixed game constants.

use std::fmt;
use std::str::FromStr;

/// How long the mole stays on one cell before the relocation timer moves it.
/// Closed set: the page only ever offers these choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoleDuration {
    Blink,
    Quick,
    #[default]
    Normal,
    Lazy,
    Sleepy,
}

impl MoleDuration {
    pub const ALL: [MoleDuration; 5] = [
        MoleDuration::Blink,
        MoleDuration::Quick,
        MoleDuration::Normal,
        MoleDuration::Lazy,
        MoleDuration::Sleepy,
    ];

    pub fn millis(self) -> u32 {
        match self {
            MoleDuration::Blink => 500,
            MoleDuration::Quick => 750,
            MoleDuration::Normal => 1000,
            MoleDuration::Lazy => 1500,
            MoleDuration::Sleepy => 2000,
        }
    }

    /// Text shown in the duration `<select>`.
    pub fn label(self) -> &'static str {
        match self {
            MoleDuration::Blink => "0.5s (hard)",
            MoleDuration::Quick => "0.75s",
            MoleDuration::Normal => "1s (default)",
            MoleDuration::Lazy => "1.5s",
            MoleDuration::Sleepy => "2s (easy)",
        }
    }

    pub fn from_millis(ms: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.millis() == ms)
    }
}

impl fmt::Display for MoleDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.millis())
    }
}

/// A duration string that is not one of the offered choices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mole duration '{0}'")]
pub struct UnknownDuration(pub String);

impl FromStr for MoleDuration {
    type Err = UnknownDuration;

    /// Parses the option value used by the page: decimal milliseconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(MoleDuration::from_millis)
            .ok_or_else(|| UnknownDuration(s.to_string()))
    }
}

/// Fixed game parameters. Defaults match the shipped page.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Countdown length in whole seconds.
    pub total_secs: u32,
    /// Number of cells in the grid (row-major 3x3 on the page).
    pub cell_count: u8,
    pub tick_period_ms: u32,
    /// Used when the duration source yields nothing usable.
    pub default_duration: MoleDuration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_secs: 30,
            cell_count: 9,
            tick_period_ms: 1000,
            default_duration: MoleDuration::Normal,
        }
    }
}

impl GameConfig {
    /// Same config sized to the grid actually available; the mole must never
    /// be placed on a cell the surface does not have.
    pub fn with_cell_count(self, cells: usize) -> Self {
        let cell_count = u8::try_from(cells).unwrap_or(u8::MAX);
        if cell_count != self.cell_count {
            log::warn!("grid has {} cells, configured for {}", cells, self.cell_count);
        }
        Self { cell_count, ..self }
    }
}

#[cfg(feature = "serde_json")]
impl GameConfig {
    /// Load a config from JSON; missing fields keep their defaults.
    pub fn from_json(src: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(src)
    }
}
