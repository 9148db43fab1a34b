//! `_info.txt` key/value files written alongside waveguide sweeps.

use crate::error::DataError;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Keys whose values are on the line after the key.
const NEXT_LINE_KEYS: [&str; 2] = ["locking scheme", "channels"];

/// A single auto-typed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InfoValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl InfoValue {
    /// Integer, then float, then plain text.
    pub fn parse(s: &str) -> Self {
        if let Ok(i) = s.parse::<i64>() {
            InfoValue::Int(i)
        } else if let Ok(f) = s.parse::<f64>() {
            InfoValue::Float(f)
        } else {
            InfoValue::Text(s.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InfoValue::Int(i) => Some(*i as f64),
            InfoValue::Float(f) => Some(*f),
            InfoValue::Text(_) => None,
        }
    }
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Int(i) => write!(f, "{}", i),
            InfoValue::Float(v) => write!(f, "{}", v),
            InfoValue::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered mapping from lowercased key to its values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Info {
    entries: Vec<(String, Vec<InfoValue>)>,
}

impl Info {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[InfoValue]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<InfoValue>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = values,
            None => self.entries.push((key, values)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[InfoValue])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for Info {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

/// Load an info file.
pub fn load_info(path: &Path) -> Result<Info, DataError> {
    let text = std::fs::read_to_string(path)?;
    parse_info(&text)
}

/// Parse info file contents.
///
/// Each line is split on tabs; `key<TAB>value...` lines map the lowercased
/// key to its values, except for keys in [`NEXT_LINE_KEYS`] which stand
/// alone with the values on the next line.
pub fn parse_info(text: &str) -> Result<Info, DataError> {
    let lines: Vec<Vec<&str>> = text
        .lines()
        .map(|ln| {
            let ln = ln.trim().trim_end_matches(':');
            ln.split('\t')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty())
        .collect();

    let mut info = Info::new();
    let mut n = 0;
    while n < lines.len() {
        let ln = &lines[n];
        let (key, values) = if ln.len() == 1 && NEXT_LINE_KEYS.contains(&ln[0].to_lowercase().as_str()) {
            let next = lines
                .get(n + 1)
                .ok_or_else(|| DataError::MissingValueLine(ln[0].to_string()))?;
            n += 1;
            (ln[0].to_lowercase(), next.iter().map(|v| InfoValue::parse(v)).collect())
        } else if ln.len() >= 2 {
            (ln[0].to_lowercase(), ln[1..].iter().map(|v| InfoValue::parse(v)).collect())
        } else {
            return Err(DataError::MalformedLine(ln.iter().map(|s| s.to_string()).collect()));
        };

        if info.contains_key(&key) {
            return Err(DataError::DuplicateKey(key));
        }
        info.insert(key, values);
        n += 1;
    }
    Ok(info)
}
