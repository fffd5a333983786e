//! Enumerating hidraw nodes, with a cheap vid/pid pre-filter so the
//! descriptor parser (4.D step 6) never runs for a node that's going to be
//! rejected anyway.

use crate::linux_native::{device_info, ensure_init, lasterror, sysfs};
use crate::{DeviceInfo, HidError, HidResult};

fn passes_prefilter(dev: &udev::Device, vendor_id: u16, product_id: u16) -> bool {
    if vendor_id == 0 && product_id == 0 {
        return true;
    }
    let Some(uevent_text) = dev.attribute_value("uevent").and_then(|v| v.to_str()) else {
        return false;
    };
    let Some((_, vid, pid)) = sysfs::parse_vid_pid_only(uevent_text) else {
        return false;
    };
    (vendor_id == 0 || vendor_id == vid) && (product_id == 0 || product_id == pid)
}

/// Enumerate every hidraw node matching `vendor_id`/`product_id` (`0` is a
/// wildcard for either). Never fails on a single malformed node; only an
/// entirely empty result registers a last-error.
pub fn enumerate(vendor_id: u16, product_id: u16) -> HidResult<Vec<DeviceInfo>> {
    ensure_init();

    let mut enumerator = udev::Enumerator::new().map_err(|e| HidError::IoError { error: e })?;
    enumerator
        .match_subsystem("hidraw")
        .map_err(|e| HidError::IoError { error: e })?;

    let mut results = Vec::new();

    for raw_device in enumerator.scan_devices().map_err(|e| HidError::IoError { error: e })? {
        // The pre-filter only needs the hidraw node itself's parent uevent
        // when a filter is active; device_info::build re-derives the hid
        // parent independently, the pre-filter here is purely an early-out.
        if vendor_id != 0 || product_id != 0 {
            let Some(hid_parent) = crate::linux_native::topology::hid_parent(&raw_device) else {
                continue;
            };
            if !passes_prefilter(&hid_parent, vendor_id, product_id) {
                continue;
            }
        }

        if let Some(records) = device_info::build(&raw_device) {
            results.extend(records);
        }
    }

    if results.is_empty() {
        let message = if vendor_id != 0 || product_id != 0 {
            "No HID devices with requested VID/PID found in the system."
        } else {
            "No HID devices found in the system."
        };
        lasterror::register_global_error(message);
    }

    Ok(results)
}
