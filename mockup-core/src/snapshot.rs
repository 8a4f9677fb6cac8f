//! Automation-registry snapshots and the before/after differ.
//!
//! The host application exposes its preset registry only through positional
//! enumeration, so the bridge never tracks deltas incrementally. The payload
//! captures a full [`RegistrySnapshot`] before and after loading a bundle and
//! writes both into a [`RegistryReport`]; [`diff`] runs on this side.
//!
//! Snapshot order is whatever order the host enumerated in. Nothing here
//! sorts or assumes alphabetical order.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A named container of presets, as enumerated by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetGroup {
    pub name: String,
    #[serde(default)]
    pub presets: Vec<String>,
}

impl PresetGroup {
    pub fn new(name: impl Into<String>, presets: &[&str]) -> Self {
        Self {
            name: name.into(),
            presets: presets.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Complete registry state at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrySnapshot(pub Vec<PresetGroup>);

impl RegistrySnapshot {
    pub fn groups(&self) -> &[PresetGroup] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PresetGroup>> for RegistrySnapshot {
    fn from(groups: Vec<PresetGroup>) -> Self {
        Self(groups)
    }
}

/// The payload's metadata artifact: registry state around a bundle load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryReport {
    pub before: RegistrySnapshot,
    pub after: RegistrySnapshot,
}

impl RegistryReport {
    pub fn diff(&self) -> RegistryDiff {
        diff(&self.before, &self.after)
    }
}

/// A preset that did not exist before, addressed by group and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PresetRef {
    pub group: String,
    pub preset: String,
}

/// Additions between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryDiff {
    /// Groups absent from the earlier snapshot.
    pub new_groups: BTreeSet<String>,
    /// Every added preset, in the later snapshot's order. Presets of wholly
    /// new groups are listed here too.
    pub new_presets: Vec<PresetRef>,
}

impl RegistryDiff {
    pub fn is_empty(&self) -> bool {
        self.new_groups.is_empty() && self.new_presets.is_empty()
    }

    /// Added presets whose group already existed before.
    pub fn presets_in_existing_groups(&self) -> impl Iterator<Item = &PresetRef> {
        self.new_presets
            .iter()
            .filter(|p| !self.new_groups.contains(&p.group))
    }

    /// First added preset in enumeration order; the name an inspect task reports.
    pub fn first_new_preset(&self) -> Option<&PresetRef> {
        self.new_presets.first()
    }
}

/// Compare two snapshots and report only additions.
pub fn diff(before: &RegistrySnapshot, after: &RegistrySnapshot) -> RegistryDiff {
    let previous: HashMap<&str, HashSet<&str>> = before
        .groups()
        .iter()
        .map(|g| {
            (
                g.name.as_str(),
                g.presets.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    let mut result = RegistryDiff::default();
    for group in after.groups() {
        let known = previous.get(group.name.as_str());
        for preset in &group.presets {
            if !known.is_some_and(|k| k.contains(preset.as_str())) {
                result.new_presets.push(PresetRef {
                    group: group.name.clone(),
                    preset: preset.clone(),
                });
            }
        }
    }
    for group in after.groups() {
        if !previous.contains_key(group.name.as_str()) {
            result.new_groups.insert(group.name.clone());
        }
    }
    result
}
