//! Macro files - versioned JSON documents
//!
//! ```json
//! {
//!   "version": 1,
//!   "events": [
//!     { "type": "mouse_click", "delay_before": 0.0, "x": 10, "y": 20 },
//!     { "type": "key_down", "delay_before": 0.3, "key": "Key.shift" }
//!   ]
//! }
//! ```
//!
//! Loading is lenient per event (missing `type` means `mouse_click`, unknown
//! types are skipped, negative delays clamp to 0) but strict per field: a
//! click without coordinates or a key event without a key aborts the load.

use crate::error::{Error, ErrorCode, Result};
use crate::events::{EventKind, MacroEvent};
use crate::keys::KeySymbol;
use crate::timeline::Timeline;
use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MACRO_FILE_VERSION: u32 = 1;

const FILE_EXTENSION: &str = "json";

#[derive(Serialize)]
struct DocumentOut<'a> {
    version: u32,
    events: Vec<EventRecord<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventRecord<'a> {
    MouseClick { delay_before: f64, x: i32, y: i32 },
    KeyDown { delay_before: f64, key: &'a KeySymbol },
    KeyUp { delay_before: f64, key: &'a KeySymbol },
}

impl<'a> From<&'a MacroEvent> for EventRecord<'a> {
    fn from(ev: &'a MacroEvent) -> Self {
        let delay_before = ev.delay_before();
        match &ev.kind {
            EventKind::PointerClick { x, y } => EventRecord::MouseClick {
                delay_before,
                x: *x,
                y: *y,
            },
            EventKind::KeyDown { key } => EventRecord::KeyDown { delay_before, key },
            EventKind::KeyUp { key } => EventRecord::KeyUp { delay_before, key },
        }
    }
}

/// A decoded macro file
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDocument {
    /// Carried through as written; not used to gate parsing
    pub version: u32,
    pub timeline: Timeline,
    /// Events dropped because their `type` was not recognised
    pub skipped: usize,
}

pub fn to_json(timeline: &Timeline) -> Result<String> {
    let doc = DocumentOut {
        version: MACRO_FILE_VERSION,
        events: timeline.iter().map(EventRecord::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn from_json(text: &str) -> Result<MacroDocument> {
    let value: Value = serde_json::from_str(text)?;
    decode_document(&value)
}

pub fn decode_document(value: &Value) -> Result<MacroDocument> {
    let root = value
        .as_object()
        .ok_or_else(|| Error::serialization("Invalid macro file format (expected an object)"))?;

    let version = match root.get("version") {
        None | Some(Value::Null) => MACRO_FILE_VERSION,
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| Error::serialization("'version' must be a non-negative integer"))?,
    };

    let items = root
        .get("events")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::serialization("Invalid macro file format (missing 'events' list)"))?;

    let mut timeline = Timeline::new();
    let mut skipped = 0;
    for (idx, item) in items.iter().enumerate() {
        match decode_event(item)
            .map_err(|e| Error::serialization(format!("Invalid event at index {}: {}", idx, e.message)))?
        {
            Some(ev) => {
                timeline.push(ev);
            }
            None => skipped += 1,
        }
    }

    debug!(version, events = timeline.len(), skipped, "decoded macro document");
    Ok(MacroDocument {
        version,
        timeline,
        skipped,
    })
}

/// `Ok(None)` means the event type is unknown and the item is skipped.
fn decode_event(item: &Value) -> Result<Option<MacroEvent>> {
    let obj = item
        .as_object()
        .ok_or_else(|| Error::serialization("expected an object"))?;

    let kind = match obj.get("type") {
        None | Some(Value::Null) => "mouse_click",
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err(Error::serialization("'type' must be a string")),
    };

    let kind = match kind {
        "mouse_click" => EventKind::PointerClick {
            x: int_field(obj, "x")?,
            y: int_field(obj, "y")?,
        },
        "key_down" => EventKind::KeyDown {
            key: key_field(obj)?,
        },
        "key_up" => EventKind::KeyUp {
            key: key_field(obj)?,
        },
        other => {
            debug!(kind = other, "skipping event of unknown type");
            return Ok(None);
        }
    };

    let delay = match obj.get("delay_before") {
        None | Some(Value::Null) => 0.0,
        Some(v) => v
            .as_f64()
            .ok_or_else(|| Error::serialization("'delay_before' must be a number"))?,
    };

    Ok(Some(MacroEvent::new(kind, delay)))
}

fn int_field(obj: &Map<String, Value>, name: &str) -> Result<i32> {
    let value = obj
        .get(name)
        .ok_or_else(|| Error::serialization(format!("missing '{}'", name)))?;
    let n = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .ok_or_else(|| Error::serialization(format!("'{}' must be an integer", name)))?;
    i32::try_from(n).map_err(|_| Error::serialization(format!("'{}' is out of range", name)))
}

fn key_field(obj: &Map<String, Value>) -> Result<KeySymbol> {
    obj.get("key")
        .and_then(Value::as_str)
        .map(KeySymbol::decode)
        .ok_or_else(|| Error::serialization("missing 'key' string"))
}

/// Write `timeline` to `path`, replacing any existing file.
pub fn save(path: impl AsRef<Path>, timeline: &Timeline) -> Result<()> {
    let path = path.as_ref();
    let json = to_json(timeline)?;
    let file = File::create(path).map_err(|e| {
        Error::new(ErrorCode::Io, format!("Could not create {}: {}", path.display(), e))
    })?;
    let mut w = BufWriter::new(file);
    w.write_all(json.as_bytes())?;
    writeln!(w)?;
    w.flush()?;
    debug!(path = %path.display(), events = timeline.len(), "saved macro");
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<MacroDocument> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        Error::new(ErrorCode::Io, format!("Could not read {}: {}", path.display(), e))
    })?;
    from_json(&text)
}

/// A directory of saved macros
pub struct MacroStorage {
    dir: PathBuf,
}

impl MacroStorage {
    /// `$HOME/.remacro`
    pub fn new() -> Result<Self> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("HOME not set")?;
        Self::with_dir(PathBuf::from(home).join(".remacro"))
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Save under a timestamped file name derived from `name`
    pub fn save_named(&self, name: &str, timeline: &Timeline) -> Result<PathBuf> {
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}.{}", sanitize(name), ts, FILE_EXTENSION);
        let path = self.dir.join(filename);
        save(&path, timeline)?;
        Ok(path)
    }

    /// Paths that exist as given win over names inside the directory.
    pub fn resolve(&self, file: &str) -> PathBuf {
        let given = PathBuf::from(file);
        if given.is_absolute() || given.exists() {
            given
        } else {
            self.dir.join(file)
        }
    }

    pub fn list(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION) {
                if let Some(s) = entry.file_name().to_str() {
                    files.push(s.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn delete(&self, file: &str) -> Result<()> {
        fs::remove_file(self.resolve(file))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

fn sanitize(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "macro".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SpecialKey;

    #[test]
    fn writes_the_documented_shape() {
        let t = Timeline::from_events(vec![
            MacroEvent::click(10, 20, 0.0),
            MacroEvent::key_down(SpecialKey::ShiftL, 0.5),
            MacroEvent::key_up(KeySymbol::VirtualKey(65), 0.25),
        ]);
        let value: Value = serde_json::from_str(&to_json(&t).unwrap()).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(
            value["events"][0],
            serde_json::json!({"type": "mouse_click", "delay_before": 0.0, "x": 10, "y": 20})
        );
        assert_eq!(
            value["events"][1],
            serde_json::json!({"type": "key_down", "delay_before": 0.5, "key": "Key.shift_l"})
        );
        assert_eq!(value["events"][2]["key"], "KeyCode.vk.65");
    }

    #[test]
    fn clicks_and_named_keys_round_trip() {
        let t = Timeline::from_events(vec![
            MacroEvent::click(-5, 1080, 1.25),
            MacroEvent::key_down('x', 0.1),
            MacroEvent::key_up('x', 0.05),
            MacroEvent::key_down(SpecialKey::F(5), 2.0),
            MacroEvent::key_up(SpecialKey::CtrlR, 0.0),
        ]);
        let doc = from_json(&to_json(&t).unwrap()).unwrap();
        assert_eq!(doc.timeline, t);
        assert_eq!(doc.skipped, 0);
    }

    #[test]
    fn unknown_type_is_skipped_and_the_rest_loads() {
        let doc = from_json(
            r#"{"version": 1, "events": [
                {"type": "mouse_click", "x": 1, "y": 2, "delay_before": 0.5},
                {"type": "scroll", "dy": 3},
                {"type": "key_down", "key": "a"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(doc.skipped, 1);
        assert_eq!(doc.timeline.len(), 2);
        assert_eq!(doc.timeline.get(1), Some(&MacroEvent::key_down('a', 0.0)));
    }

    #[test]
    fn missing_type_means_click_and_negative_delay_clamps() {
        let doc = from_json(r#"{"events": [{"x": 3, "y": 4, "delay_before": -2}]}"#).unwrap();
        assert_eq!(doc.version, MACRO_FILE_VERSION);
        assert_eq!(doc.timeline.get(0), Some(&MacroEvent::click(3, 4, 0.0)));
    }

    #[test]
    fn unknown_key_names_load_as_unresolved() {
        let doc = from_json(r#"{"events": [{"type": "key_up", "key": "Key.warp_drive"}]}"#).unwrap();
        let key = doc.timeline.get(0).unwrap().key().unwrap();
        assert!(!key.is_resolved());
        assert!(to_json(&doc.timeline).unwrap().contains("Key.warp_drive"));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        for bad in [
            "not json",
            "[]",
            r#"{"version": 1}"#,
            r#"{"events": {}}"#,
            r#"{"events": [{"type": "mouse_click", "x": 1}]}"#,
            r#"{"events": [{"type": "key_down"}]}"#,
            r#"{"events": [{"x": 1, "y": 2, "delay_before": "soon"}]}"#,
            r#"{"events": [42]}"#,
        ] {
            let err = from_json(bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::Serialization, "{bad}");
        }
    }

    #[test]
    fn storage_saves_lists_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MacroStorage::with_dir(dir.path()).unwrap();
        let t = Timeline::from_events(vec![MacroEvent::click(1, 1, 0.0)]);

        let path = storage.save_named("my macro!", &t).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("my_macro__"));
        assert_eq!(storage.list().unwrap(), vec![name.clone()]);

        assert_eq!(load(storage.resolve(&name)).unwrap().timeline, t);
        storage.delete(&name).unwrap();
        assert!(storage.list().unwrap().is_empty());
    }
}
