use remacro_core::storage;
use remacro_core::{ErrorCode, KeySymbol, MacroEvent, SpecialKey, Timeline};
use remacro_recorder::prelude::*;
use remacro_recorder::{InjectError, InjectedAction, PointerButton};
use std::time::{Duration, Instant};

fn engine() -> (Engine, DryRunInjector) {
    let log = DryRunInjector::new();
    (Engine::new(Box::new(log.clone())), log)
}

fn key(base: Instant, ms: u64, key: impl Into<KeySymbol>, down: bool) -> Notification {
    let key = key.into();
    let input = if down { RawInput::KeyPress(key) } else { RawInput::KeyRelease(key) };
    Notification::new(base + Duration::from_millis(ms), input)
}

fn click(base: Instant, ms: u64, x: i32, y: i32) -> Notification {
    Notification::new(
        base + Duration::from_millis(ms),
        RawInput::ButtonPress { button: PointerButton::Primary, x, y },
    )
}

fn loaded(engine: &Engine, events: Vec<MacroEvent>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.json");
    storage::save(&path, &Timeline::from_events(events)).unwrap();
    engine.load(&path).unwrap();
    dir
}

#[test]
fn hotkey_session_records_and_drops_the_trailing_event() {
    let (engine, _) = engine();
    let base = Instant::now();

    engine.handle(&key(base, 0, SpecialKey::F(9), true)).unwrap();
    engine.handle(&key(base, 10, SpecialKey::F(9), false)).unwrap();
    assert_eq!(engine.state(), EngineState::Recording);

    engine.handle(&click(base, 500, 10, 20)).unwrap();
    engine.handle(&key(base, 700, 'a', true)).unwrap();
    engine.handle(&key(base, 800, 'a', false)).unwrap();
    // The click on the "stop" button
    engine.handle(&click(base, 2000, 999, 999)).unwrap();
    engine.handle(&key(base, 2100, SpecialKey::F(9), true)).unwrap();

    assert_eq!(engine.state(), EngineState::Idle);
    let timeline = engine.timeline();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.events()[0], MacroEvent::click(10, 20, 0.0));
    assert!((timeline.events()[1].delay_before() - 0.2).abs() < 1e-9);
    assert_eq!(timeline.events()[2].key(), Some(&KeySymbol::Char('a')));
}

#[test]
fn escape_while_recording_stops_it() {
    let (engine, _) = engine();
    let base = Instant::now();
    engine.start_recording().unwrap();
    engine.handle(&click(base, 0, 1, 1)).unwrap();
    engine.handle(&click(base, 100, 2, 2)).unwrap();
    engine.handle(&key(base, 200, SpecialKey::Esc, true)).unwrap();

    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.timeline().events(), &[MacroEvent::click(1, 1, 0.0)]);
}

#[test]
fn stopping_an_empty_recording_is_harmless() {
    let (engine, _) = engine();
    assert_eq!(engine.stop_recording().unwrap(), None);
    engine.start_recording().unwrap();
    assert_eq!(engine.stop_recording().unwrap(), None);
    assert!(engine.is_empty());
    assert_eq!(engine.state(), EngineState::Idle);
}

#[test]
fn input_outside_recording_is_not_captured() {
    let (engine, _) = engine();
    engine.handle(&click(Instant::now(), 0, 5, 5)).unwrap();
    assert!(engine.is_empty());
}

#[test]
fn edits_are_refused_while_recording() {
    let (engine, _) = engine();
    let dir = loaded(&engine, vec![MacroEvent::click(1, 1, 1.0)]);
    engine.start_recording().unwrap();
    engine.record(&click(Instant::now(), 0, 3, 3));

    for err in [
        engine.delete(&[0]).unwrap_err(),
        engine.update_delay(0, "2.0").unwrap_err(),
        engine.add_delay(&[0], 1.0).unwrap_err(),
        engine.clear().unwrap_err(),
        engine.save(dir.path().join("x.json")).unwrap_err(),
        engine.play(1.0, 1).unwrap_err(),
    ] {
        assert_eq!(err.code, ErrorCode::Busy, "{err}");
    }
    assert_eq!(engine.len(), 1);
}

#[test]
fn edits_are_refused_while_playing_and_timeline_is_untouched() {
    let (engine, _) = engine();
    let dir = loaded(
        &engine,
        vec![MacroEvent::click(1, 1, 0.0), MacroEvent::click(2, 2, 5.0)],
    );
    let before = engine.timeline();
    engine.play(1.0, 1).unwrap();
    assert_eq!(engine.state(), EngineState::Playing);

    assert_eq!(engine.delete(&[0]).unwrap_err().code, ErrorCode::Busy);
    assert_eq!(engine.update_delay(1, "0").unwrap_err().code, ErrorCode::Busy);
    assert_eq!(engine.add_delay(&[0, 1], 1.0).unwrap_err().code, ErrorCode::Busy);
    assert_eq!(engine.clear().unwrap_err().code, ErrorCode::Busy);
    assert_eq!(engine.load(dir.path().join("m.json")).unwrap_err().code, ErrorCode::Busy);
    assert_eq!(engine.start_recording().unwrap_err().code, ErrorCode::Busy);
    assert_eq!(engine.play(1.0, 1).unwrap_err().code, ErrorCode::Busy);
    // Saving a snapshot during playback is allowed
    engine.save(dir.path().join("copy.json")).unwrap();

    engine.request_cancel().unwrap();
    engine.wait_for_playback().unwrap();
    assert_eq!(engine.timeline(), before);
}

#[test]
fn failed_load_keeps_the_current_timeline() {
    let (engine, _) = engine();
    let dir = loaded(&engine, vec![MacroEvent::key_down('z', 0.0)]);
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"version":1,"events":[{"type":"mouse_click","x":"left"}]}"#).unwrap();

    let err = engine.load(&bad).unwrap_err();
    assert_eq!(err.code, ErrorCode::Serialization);
    assert!(engine.load(dir.path().join("missing.json")).is_err());
    assert_eq!(engine.timeline().events(), &[MacroEvent::key_down('z', 0.0)]);
}

#[test]
fn playing_an_empty_timeline_is_an_error() {
    let (engine, _) = engine();
    assert_eq!(engine.play(1.0, 1).unwrap_err().code, ErrorCode::EmptyTimeline);
    assert_eq!(engine.state(), EngineState::Idle);
}

#[test]
fn playback_runs_every_loop_and_returns_to_idle() {
    let (engine, log) = engine();
    let _dir = loaded(
        &engine,
        vec![
            MacroEvent::click(4, 4, 0.0),
            MacroEvent::key_down(SpecialKey::Enter, 0.01),
            MacroEvent::key_up(SpecialKey::Enter, 0.01),
        ],
    );

    engine.play(2.0, 3).unwrap();
    let report = engine.wait_for_playback().unwrap();

    assert_eq!(report.loops_completed, 3);
    assert_eq!(report.actions, 9);
    assert_eq!(log.actions().len(), 9);
    assert_eq!(log.actions()[3], InjectedAction::Click { x: 4, y: 4 });
    assert_eq!(engine.state(), EngineState::Idle);
}

#[test]
fn cancel_interrupts_a_long_wait_promptly() {
    let (engine, log) = engine();
    let _dir = loaded(
        &engine,
        vec![MacroEvent::click(0, 0, 0.0), MacroEvent::click(1, 1, 30.0)],
    );

    engine.play(1.0, 5).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    let asked = Instant::now();
    engine.handle(&key(asked, 0, SpecialKey::Esc, true)).unwrap();
    let report = engine.wait_for_playback().unwrap();

    assert!(asked.elapsed() < Duration::from_millis(250), "{:?}", asked.elapsed());
    assert!(report.cancelled);
    assert_eq!(log.actions(), vec![InjectedAction::Click { x: 0, y: 0 }]);
    assert_eq!(engine.state(), EngineState::Idle);

    // The engine is usable again
    engine.delete(&[1]).unwrap();
    engine.play(1.0, 1).unwrap();
    assert!(!engine.wait_for_playback().unwrap().cancelled);
}

#[test]
fn observers_see_state_changes_and_captures() {
    let (engine, _) = engine();
    engine.start_recording().unwrap();
    engine.record(&click(Instant::now(), 0, 8, 9));
    engine.stop_recording().unwrap();

    let seen: Vec<EngineEvent> = engine.notifications().try_iter().collect();
    assert_eq!(
        seen,
        vec![
            EngineEvent::StateChanged(EngineState::Recording),
            EngineEvent::EventCaptured { index: 0, event: MacroEvent::click(8, 9, 0.0) },
            EngineEvent::StateChanged(EngineState::Idle),
        ]
    );
}

struct PanickingInjector;

impl InputInjector for PanickingInjector {
    fn click(&mut self, _x: i32, _y: i32) -> std::result::Result<(), InjectError> {
        panic!("injector crashed");
    }

    fn key_down(&mut self, _key: &KeySymbol) -> std::result::Result<(), InjectError> {
        Ok(())
    }

    fn key_up(&mut self, _key: &KeySymbol) -> std::result::Result<(), InjectError> {
        Ok(())
    }
}

#[test]
fn a_crashed_playback_still_returns_to_idle() {
    let engine = Engine::new(Box::new(PanickingInjector));
    let _dir = loaded(&engine, vec![MacroEvent::click(3, 3, 0.0)]);

    engine.play(1.0, 1).unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while engine.state() != EngineState::Idle && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(engine.state(), EngineState::Idle);
    engine.add_delay(&[0], 0.5).unwrap();
    assert!(engine.wait_for_playback().is_none());
}

#[test]
fn tiny_speed_plays_until_cancelled() {
    let (engine, log) = engine();
    let _dir = loaded(&engine, vec![MacroEvent::click(1, 1, 1.0)]);

    engine.play(1e-300, 1).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(engine.state(), EngineState::Playing);

    engine.request_cancel().unwrap();
    let report = engine.wait_for_playback().unwrap();
    assert!(report.cancelled);
    assert!(log.actions().is_empty());
    assert_eq!(engine.state(), EngineState::Idle);
}
