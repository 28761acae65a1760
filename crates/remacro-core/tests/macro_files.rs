use remacro_core::prelude::*;
use remacro_core::storage;

fn mixed_timeline() -> Timeline {
    Timeline::from_events(vec![
        MacroEvent::click(100, 200, 0.0),
        MacroEvent::key_down(SpecialKey::CmdL, 0.4),
        MacroEvent::key_down('v', 0.05),
        MacroEvent::key_up('v', 0.08),
        MacroEvent::key_up(SpecialKey::CmdL, 0.02),
        MacroEvent::click(5, 5, 3.5),
    ])
}

#[test]
fn saved_file_loads_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("macro.json");
    let timeline = mixed_timeline();

    storage::save(&path, &timeline).unwrap();
    let doc = storage::load(&path).unwrap();

    assert_eq!(doc.version, remacro_core::MACRO_FILE_VERSION);
    assert_eq!(doc.timeline, timeline);
}

#[test]
fn saving_overwrites_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("macro.json");

    storage::save(&path, &mixed_timeline()).unwrap();
    let short = Timeline::from_events(vec![MacroEvent::click(1, 2, 0.5)]);
    storage::save(&path, &short).unwrap();

    assert_eq!(storage::load(&path).unwrap().timeline, short);
}

#[test]
fn loading_a_missing_file_reports_io() {
    let dir = tempfile::tempdir().unwrap();
    let err = storage::load(dir.path().join("nope.json")).unwrap_err();
    assert_eq!(err.code, ErrorCode::Io);
}

#[test]
fn files_written_by_the_mouse_only_format_still_load() {
    // Older files carry only coordinates and a delay, no type tag.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.json");
    std::fs::write(
        &path,
        r#"{"version": 1, "events": [{"x": 10, "y": 20, "delay_before": 0.0},
                                     {"x": 30, "y": 40, "delay_before": 1.5}]}"#,
    )
    .unwrap();

    let doc = storage::load(&path).unwrap();
    assert_eq!(
        doc.timeline.events(),
        &[MacroEvent::click(10, 20, 0.0), MacroEvent::click(30, 40, 1.5)]
    );
}
