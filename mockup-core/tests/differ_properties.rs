//! Additions-only differ properties over hand-built registry snapshots.

use std::collections::BTreeSet;

use mockup_core::{diff, PresetGroup, RegistrySnapshot};
use rstest::rstest;

fn baseline() -> RegistrySnapshot {
    RegistrySnapshot(vec![
        PresetGroup::new("Default Actions", &["Vignette (selection)", "Frame Channel - 50 pixel"]),
        PresetGroup::new("Shirts", &["Front", "Back"]),
        PresetGroup::new("Cleanup", &[]),
    ])
}

#[rstest]
#[case::empty(RegistrySnapshot::default())]
#[case::baseline(baseline())]
#[case::single(RegistrySnapshot(vec![PresetGroup::new("Only", &["one"])]))]
fn diff_against_self_is_empty(#[case] snapshot: RegistrySnapshot) {
    let d = diff(&snapshot, &snapshot);
    assert!(d.new_groups.is_empty());
    assert!(d.new_presets.is_empty());
}

#[rstest]
#[case::appended_last("G", 3)]
#[case::inserted_first("G", 0)]
#[case::inserted_middle("Zz Later", 1)]
fn one_new_group_is_reported_wherever_it_lands(#[case] name: &str, #[case] position: usize) {
    let before = baseline();
    let mut groups = before.0.clone();
    groups.insert(position, PresetGroup::new(name, &["p1", "p2"]));
    let after = RegistrySnapshot(groups);

    let d = diff(&before, &after);
    assert_eq!(d.new_groups, BTreeSet::from([name.to_string()]));
    assert_eq!(d.presets_in_existing_groups().count(), 0);
    let presets: Vec<_> = d.new_presets.iter().map(|p| p.preset.as_str()).collect();
    assert_eq!(presets, vec!["p1", "p2"]);
}

#[test]
fn existing_group_entries_only_when_it_gained_presets() {
    let before = baseline();
    let mut groups = before.0.clone();
    groups[1].presets.push("Sleeve".to_string());
    groups.push(PresetGroup::new("G", &["p1"]));
    let after = RegistrySnapshot(groups);

    let d = diff(&before, &after);
    let existing: Vec<_> = d
        .presets_in_existing_groups()
        .map(|p| (p.group.as_str(), p.preset.as_str()))
        .collect();
    assert_eq!(existing, vec![("Shirts", "Sleeve")]);
    assert_eq!(d.new_groups.len(), 1);
}
