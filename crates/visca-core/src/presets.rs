//! Named VISCA command table served by the admin API.
//!
//! The table maps a stable, human-readable name (`"zoom_tele"`) to the hex
//! string of the command bytes (`"8101040702FF"`).  The admin UI renders one
//! button per name and submits the hex through the command endpoint.
//!
//! The built-in table targets camera address 1 (`0x81`).  Deployments with a
//! different address or vendor extensions can override or add entries from a
//! TOML file:
//!
//! ```toml
//! [presets]
//! zoom_tele = "82 01 04 07 02 FF"
//! tally_on  = "81 01 7E 01 0A 00 02 FF"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::parse_hex_command;
use crate::error::BridgeError;

/// Errors raised while loading a preset override file.
#[derive(Debug, Error)]
pub enum PresetError {
    /// The TOML content could not be parsed.
    #[error("failed to parse preset TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// An entry's value is not a valid hex command.
    #[error("preset '{name}' is not a valid command: {source}")]
    InvalidCommand {
        name: String,
        #[source]
        source: BridgeError,
    },
}

/// Ordered name → hex command table.
///
/// Serialises as a flat JSON object, which is the shape the admin UI expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PresetTable {
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct PresetFile {
    #[serde(default)]
    presets: BTreeMap<String, String>,
}

const BUILTIN_PRESETS: &[(&str, &str)] = &[
    ("power_on", "8101040002FF"),
    ("power_off", "8101040003FF"),
    ("power_query", "81090400FF"),
    ("if_clear", "88010001FF"),
    ("zoom_tele", "8101040702FF"),
    ("zoom_wide", "8101040703FF"),
    ("zoom_stop", "8101040700FF"),
    ("zoom_tele_fast", "8101040727FF"),
    ("zoom_wide_fast", "8101040737FF"),
    ("focus_auto", "8101043802FF"),
    ("focus_manual", "8101043803FF"),
    ("focus_far", "8101040802FF"),
    ("focus_near", "8101040803FF"),
    ("focus_stop", "8101040800FF"),
    ("focus_onepush", "8101041801FF"),
    ("pt_up", "8101060108080301FF"),
    ("pt_down", "8101060108080302FF"),
    ("pt_left", "8101060108080103FF"),
    ("pt_right", "8101060108080203FF"),
    ("pt_stop", "8101060108080303FF"),
    ("pt_home", "81010604FF"),
    ("pt_reset", "81010605FF"),
    ("preset_recall_0", "8101043F0200FF"),
    ("preset_recall_1", "8101043F0201FF"),
    ("preset_recall_2", "8101043F0202FF"),
    ("preset_recall_3", "8101043F0203FF"),
    ("preset_set_0", "8101043F0100FF"),
    ("preset_set_1", "8101043F0101FF"),
    ("preset_set_2", "8101043F0102FF"),
    ("preset_set_3", "8101043F0103FF"),
    ("wb_auto", "8101043500FF"),
    ("wb_indoor", "8101043501FF"),
    ("wb_outdoor", "8101043502FF"),
    ("wb_manual", "8101043505FF"),
    ("backlight_on", "8101043302FF"),
    ("backlight_off", "8101043303FF"),
    ("mirror_on", "8101046102FF"),
    ("mirror_off", "8101046103FF"),
    ("flip_on", "8101046602FF"),
    ("flip_off", "8101046603FF"),
];

impl PresetTable {
    /// Returns the built-in table for camera address 1.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_PRESETS
                .iter()
                .map(|(name, hex)| (name.to_string(), hex.to_string()))
                .collect(),
        }
    }

    /// Applies the `[presets]` table of a TOML document on top of `self`.
    ///
    /// Entries with an existing name replace the built-in value; new names are
    /// added.  Every value is validated as a hex command.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Parse`] for malformed TOML and
    /// [`PresetError::InvalidCommand`] for a value that is not valid hex.
    pub fn with_overrides(mut self, toml_text: &str) -> Result<Self, PresetError> {
        let file: PresetFile = toml::from_str(toml_text)?;
        for (name, hex) in file.presets {
            parse_hex_command(&hex).map_err(|source| PresetError::InvalidCommand {
                name: name.clone(),
                source,
            })?;
            self.entries.insert(name, hex);
        }
        Ok(self)
    }

    /// Looks up the hex string for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PresetTable {
    fn default() -> Self {
        Self::builtin()
    }
}
