//! CGEventTap listener

use super::keymap;
use crate::capture::{deliver, ListenerHandle, Notification, PointerButton, RawInput};
use crossbeam_channel::{bounded, Sender};
use remacro_core::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

use cidre::{cf, cg};

struct TapState {
    tx: Sender<Notification>,
}

pub fn listen(buffer: usize) -> Result<ListenerHandle> {
    let (tx, rx) = bounded::<Notification>(buffer.max(1));
    let stop = Arc::new(AtomicBool::new(false));

    let stop1 = stop.clone();
    let tap_thread = thread::Builder::new()
        .name("remacro-event-tap".into())
        .spawn(move || run_event_tap(tx, stop1))?;

    Ok(ListenerHandle::new(stop, rx, vec![tap_thread]))
}

fn run_event_tap(tx: Sender<Notification>, stop: Arc<AtomicBool>) {
    let mask = cg::EventType::LEFT_MOUSE_DOWN.mask()
        | cg::EventType::LEFT_MOUSE_UP.mask()
        | cg::EventType::RIGHT_MOUSE_DOWN.mask()
        | cg::EventType::RIGHT_MOUSE_UP.mask()
        | cg::EventType::KEY_DOWN.mask()
        | cg::EventType::KEY_UP.mask()
        | cg::EventType::FLAGS_CHANGED.mask();

    let state = Box::into_raw(Box::new(TapState { tx }));

    let tap = cg::EventTap::new(
        cg::EventTapLocation::Session,
        cg::EventTapPlacement::TailAppend,
        cg::EventTapOpts::LISTEN_ONLY,
        mask,
        tap_callback,
        state,
    );

    let Some(tap) = tap else {
        error!("failed to create event tap (is Input Monitoring granted?)");
        unsafe { drop(Box::from_raw(state)) };
        return;
    };

    let Some(src) = cf::MachPort::run_loop_src(&tap, 0) else {
        error!("failed to create run loop source");
        drop(tap);
        unsafe { drop(Box::from_raw(state)) };
        return;
    };

    let rl = cf::RunLoop::current();
    rl.add_src(&src, cf::RunLoopMode::default());
    debug!("event tap running");

    while !stop.load(Ordering::Relaxed) {
        cf::RunLoop::run_in_mode(cf::RunLoopMode::default(), 0.05, true);
    }

    rl.remove_src(&src, cf::RunLoopMode::default());
    drop(src);
    drop(tap);
    // The tap is gone, so the callback can no longer see this pointer.
    unsafe { drop(Box::from_raw(state)) };
    debug!("event tap stopped");
}

extern "C" fn tap_callback(
    _proxy: *mut cg::EventTapProxy,
    event_type: cg::EventType,
    event: &mut cg::Event,
    user_info: *mut TapState,
) -> Option<&cg::Event> {
    let state = unsafe { &*user_info };
    let loc = event.location();
    let (x, y) = (loc.x as i32, loc.y as i32);
    let flags = event.flags().0;

    let input = match event_type {
        cg::EventType::LEFT_MOUSE_DOWN => Some(RawInput::ButtonPress {
            button: PointerButton::Primary,
            x,
            y,
        }),
        cg::EventType::RIGHT_MOUSE_DOWN => Some(RawInput::ButtonPress {
            button: PointerButton::Secondary,
            x,
            y,
        }),
        cg::EventType::LEFT_MOUSE_UP => Some(RawInput::ButtonRelease {
            button: PointerButton::Primary,
            x,
            y,
        }),
        cg::EventType::RIGHT_MOUSE_UP => Some(RawInput::ButtonRelease {
            button: PointerButton::Secondary,
            x,
            y,
        }),
        cg::EventType::KEY_DOWN | cg::EventType::KEY_UP => {
            let keycode = event.field_i64(cg::EventField::KEYBOARD_EVENT_KEYCODE) as u16;
            let key = keymap::key_for_code(keycode, flags);
            if event_type == cg::EventType::KEY_DOWN {
                Some(RawInput::KeyPress(key))
            } else {
                Some(RawInput::KeyRelease(key))
            }
        }
        cg::EventType::FLAGS_CHANGED => {
            let keycode = event.field_i64(cg::EventField::KEYBOARD_EVENT_KEYCODE) as u16;
            keymap::modifier_for_code(keycode).map(|(key, mask)| {
                if flags & mask != 0 {
                    RawInput::KeyPress(key.into())
                } else {
                    RawInput::KeyRelease(key.into())
                }
            })
        }
        _ => None,
    };

    if let Some(input) = input {
        deliver(&state.tx, input);
    }

    Some(event)
}
