//! Map definitions loaded from `data/MapNNN.json`.
use std::{collections::BTreeMap, fs, path::PathBuf};

use bevy::prelude::*;
use serde::Deserialize;

use crate::core::LoadError;
use crate::interpreter::EventCommand;

const DATA_DIR: &str = "data";

/// One map as authored on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapData {
    #[serde(default)]
    pub display_name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub player: StartPosition,
    /// Number of party followers trailing the player.
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub events: Vec<EventData>,
    /// Initial game variable values applied when the map loads.
    #[serde(default)]
    pub variables: BTreeMap<usize, i32>,
    #[serde(default)]
    pub party: Option<PartyData>,
    /// Destination of the map transfer key, if any.
    #[serde(default)]
    pub next_map: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct StartPosition {
    pub x: f32,
    pub y: f32,
}

/// A map event: an NPC or object the player can stand next to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventData {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Free-form note carrying `<tag:value>` annotations.
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub script: Vec<EventCommand>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PartyData {
    /// Actor names keyed by database id.
    #[serde(default)]
    pub actors: BTreeMap<usize, String>,
    /// Actor ids in party order.
    #[serde(default)]
    pub members: Vec<usize>,
    #[serde(default)]
    pub currency_unit: Option<String>,
}

impl MapData {
    pub fn path_for(map_id: u32) -> PathBuf {
        PathBuf::from(DATA_DIR).join(format!("Map{:03}.json", map_id))
    }

    pub fn load(map_id: u32) -> Result<Self, LoadError> {
        let path = Self::path_for(map_id);
        let raw = fs::read_to_string(&path).map_err(|err| LoadError::io(&path, err))?;
        serde_json::from_str(&raw).map_err(|err| LoadError::json(&path, err))
    }

    pub fn load_or_fallback(map_id: u32) -> Self {
        match Self::load(map_id) {
            Ok(data) => data,
            Err(err) => {
                warn!("{}. Using the built-in demo map.", err);
                Self::fallback()
            }
        }
    }

    /// Small built-in map used when no data file is present.
    pub fn fallback() -> Self {
        let mut actors = BTreeMap::new();
        actors.insert(1, "Harold".to_string());
        actors.insert(2, "Therese".to_string());

        Self {
            display_name: "Fallback Meadow".to_string(),
            width: 17,
            height: 13,
            player: StartPosition { x: 8.0, y: 8.0 },
            followers: 1,
            events: vec![
                EventData {
                    id: 1,
                    name: "Signpost".to_string(),
                    x: 6.0,
                    y: 6.0,
                    note: "<bubble:The data folder is empty.\\nThis meadow stands in.>"
                        .to_string(),
                    script: Vec::new(),
                },
                EventData {
                    id: 2,
                    name: "Wanderer".to_string(),
                    x: 10.0,
                    y: 6.0,
                    note: String::new(),
                    script: vec![EventCommand::show_bubble(&[
                        ("text", "Lovely day, \\N[1]."),
                        ("target", "this"),
                        ("wait", "true"),
                    ])],
                },
            ],
            variables: BTreeMap::new(),
            party: Some(PartyData {
                actors,
                members: vec![1, 2],
                currency_unit: None,
            }),
            next_map: None,
        }
    }

    pub fn event(&self, id: u32) -> Option<&EventData> {
        self.events.iter().find(|event| event.id == id)
    }
}

/// One `<name>` or `<name:value>` annotation found in a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTag {
    pub name: String,
    pub value: Option<String>,
}

/// All annotations in `note`, in order of appearance.
pub fn note_tags(note: &str) -> Vec<NoteTag> {
    let mut tags = Vec::new();
    let mut rest = note;

    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(['<', '>']) else {
            break;
        };
        if after[close..].starts_with('<') {
            rest = &after[close..];
            continue;
        }

        let inner = &after[..close];
        let (name, value) = match inner.split_once(':') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (inner, None),
        };
        if !name.is_empty() {
            tags.push(NoteTag {
                name: name.to_string(),
                value,
            });
        }
        rest = &after[close + 1..];
    }

    tags
}

/// Value of the `name` tag. A later tag of the same name replaces an earlier one.
pub fn note_value(note: &str, name: &str) -> Option<String> {
    note_tags(note)
        .into_iter()
        .rev()
        .find(|tag| tag.name == name)
        .and_then(|tag| tag.value)
}
