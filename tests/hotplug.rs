//! Argument validation for `register_callback` is checked before any kernel
//! monitor is touched, so it's exercisable here without a live udev/hidraw
//! environment (unlike the success path, which is covered by in-process
//! fixtures in `linux_native::hotplug`'s own unit tests).

use hidraw_rs::{register_callback, HidError, HotplugEvent, HotplugFlag};

#[test]
fn empty_event_mask_is_rejected() {
    let result = register_callback(0, 0, HotplugEvent::empty(), HotplugFlag::empty(), |_, _, _| false);
    assert!(matches!(result, Err(HidError::InvalidArgument)));
}

#[test]
fn event_bits_outside_arrived_left_are_rejected() {
    let bogus = HotplugEvent::from_bits_retain(0b0100);
    let result = register_callback(0, 0, bogus, HotplugFlag::empty(), |_, _, _| false);
    assert!(matches!(result, Err(HidError::InvalidArgument)));
}

#[test]
fn flag_bits_outside_enumerate_are_rejected() {
    let bogus = HotplugFlag::from_bits_retain(0b0100);
    let result = register_callback(0, 0, HotplugEvent::ARRIVED, bogus, |_, _, _| false);
    assert!(matches!(result, Err(HidError::InvalidArgument)));
}

#[test]
fn deregistering_an_unknown_handle_is_not_found() {
    use hidraw_rs::{deregister_callback, HotplugHandle};
    let handle = HotplugHandle::new(u32::MAX - 1).unwrap();
    let result = deregister_callback(handle);
    assert!(matches!(result, Err(HidError::NotFound)));
}
