//! Preset selection: named whitelist/blacklist bundles.
//!
//! Each preset focuses a summary on one subsystem of the turn-based game
//! (turn flow, movement, AI, ...). The built-in registry is immutable and
//! built once per process; a JSON preset file can layer extra presets over
//! it at start-up.
//!
//! Classification order for a non-raw preset:
//!
//! 1. Any [`HARD_CRITICAL_KEYWORDS`] hit is `critical`, blacklist or not.
//! 2. Any blacklist hit is `noise`.
//! 3. Any whitelist hit (preset whitelist plus user keywords) is `high` when
//!    the line also mentions `warning`, `custom` otherwise.
//! 4. Everything else is `noise`.
//!
//! The [`RAW_PRESET`] turns all of that off: every line matches.

use super::{Category, Classifier, contains_any};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Substrings that force `critical` under every preset except `raw`.
pub const HARD_CRITICAL_KEYWORDS: [&str; 6] =
    ["fatal", "error", "severe", "exception", "callstack", "ensure"];

/// Name of the no-filter preset.
pub const RAW_PRESET: &str = "raw";

/// A named whitelist/blacklist bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        whitelist: &[&str],
        blacklist: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            whitelist: whitelist.iter().map(|s| (*s).to_string()).collect(),
            blacklist: blacklist.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn is_raw(&self) -> bool {
        self.name == RAW_PRESET
    }
}

// ── Registry ───────────────────────────────────────────────────────

static BUILTIN: LazyLock<PresetRegistry> = LazyLock::new(|| {
    let mut presets = BTreeMap::new();
    for preset in builtin_presets() {
        presets.insert(preset.name.clone(), preset);
    }
    PresetRegistry { presets }
});

fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            RAW_PRESET,
            "No filtering. Every line is kept.",
            &[],
            &[],
        ),
        Preset::new(
            "turn_flow",
            "Turn sequencing: phase changes, barriers, turn advance guards.",
            &[
                "logturnmanager",
                "logturncore",
                "logturnbarrier",
                "logturnphase",
                "logturnadvanceguard",
                "[turnflowcoordinator]",
                "[barrier]",
                "canadvanceturn",
            ],
            &["logmoveverbose", "tick"],
        ),
        Preset::new(
            "movement",
            "Grid movement: reservations, pathfinding, occupancy, move dispatch.",
            &[
                "logplayermove",
                "logmovereservation",
                "loggridpathfinding",
                "logconflictresolver",
                "[gridoccupancy]",
                "[dispatchresolvedmove]",
                "[movecomplete]",
                "[unitmovementcomponent]",
            ],
            &["logmoveverbose", "[distancefield]"],
        ),
        Preset::new(
            "ai",
            "Enemy and ally decisions: observations, intents, thinkers.",
            &[
                "logenemyai",
                "logenemythinker",
                "logenemyturndatasys",
                "logallyturndata",
                "[computeintent]",
                "[decideintent]",
                "[buildobservations]",
                "[collectallenemies]",
            ],
            &["loggridpathfinding", "[getnextstep]"],
        ),
        Preset::new(
            "combat",
            "Attack phase and attack abilities.",
            &["logattackphase", "logattackability", "logunitbase", "damage"],
            &["logmoveverbose"],
        ),
        Preset::new(
            "init",
            "Session start-up: turn init, ability grants, possession.",
            &[
                "logturninit",
                "[grantabilitysets]",
                "[onabilitysysteminitialized]",
                "[possessedby]",
                "[tbslyragamemode]",
            ],
            &[],
        ),
        Preset::new(
            "dungeon",
            "Dungeon generation and floor setup.",
            &[
                "logroguedungeon",
                "[roguesubsystem]",
                "[uroguedungeonsubsystem]",
            ],
            &[],
        ),
    ]
}

/// Immutable mapping from preset name to [`Preset`].
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: BTreeMap<String, Preset>,
}

impl PresetRegistry {
    /// The built-in presets, constructed on first use.
    pub fn builtin() -> &'static PresetRegistry {
        &BUILTIN
    }

    /// Built-ins with `extra` layered on top. Extra presets replace
    /// built-ins of the same name; `raw` cannot be redefined.
    pub fn with_extra(extra: Vec<Preset>) -> Result<PresetRegistry> {
        let mut presets = BUILTIN.presets.clone();
        for preset in extra {
            let name = preset.name.trim().to_lowercase();
            if name.is_empty() {
                return Err(Error::InvalidConfig("preset with an empty name".into()));
            }
            if name == RAW_PRESET {
                return Err(Error::InvalidConfig(format!(
                    "preset name '{RAW_PRESET}' is reserved"
                )));
            }
            presets.insert(name.clone(), Preset { name, ..preset });
        }
        Ok(PresetRegistry { presets })
    }

    /// Built-ins plus the presets in a JSON file (an array of presets).
    pub fn from_json_file(path: &Path) -> Result<PresetRegistry> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let extra: Vec<Preset> = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} preset(s) from {}",
            extra.len(),
            path.display()
        );
        Self::with_extra(extra)
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(&name.trim().to_lowercase())
    }

    /// Look up a preset, failing with the list of known names.
    pub fn resolve(&self, name: &str) -> Result<&Preset> {
        self.get(name).ok_or_else(|| Error::UnknownPreset {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    /// Preset names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

// ── Selector ───────────────────────────────────────────────────────

/// Classifies lines under one resolved preset.
#[derive(Debug, Clone)]
pub struct PresetSelector {
    preset: Preset,
    whitelist: Vec<String>,
    blacklist: Vec<String>,
}

impl PresetSelector {
    pub fn new(preset: Preset) -> Self {
        let whitelist = lowered(&preset.whitelist);
        let blacklist = lowered(&preset.blacklist);
        Self {
            preset,
            whitelist,
            blacklist,
        }
    }

    /// Add user keywords to the whitelist (builder pattern).
    pub fn with_custom_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !self.whitelist.contains(&keyword) {
                self.whitelist.push(keyword);
            }
        }
        self
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn is_raw(&self) -> bool {
        self.preset.is_raw()
    }
}

fn lowered(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

impl Classifier for PresetSelector {
    fn classify(&self, text: &str) -> Category {
        let lower = text.to_lowercase();
        let critical = contains_any(&lower, &HARD_CRITICAL_KEYWORDS);
        if self.is_raw() {
            return if critical {
                Category::Critical
            } else {
                Category::Custom
            };
        }
        if critical {
            Category::Critical
        } else if contains_any(&lower, &self.blacklist) {
            Category::Noise
        } else if contains_any(&lower, &self.whitelist) {
            if lower.contains("warning") {
                Category::High
            } else {
                Category::Custom
            }
        } else {
            Category::Noise
        }
    }
}
