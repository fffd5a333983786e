//! Turning a raw `udev::Device` (already known to be in the `hidraw`
//! subsystem) into zero or more [`DeviceInfo`] records.

use std::ffi::CString;

use crate::descriptor::UsagePairs;
use crate::linux_native::{sysfs, topology};
use crate::{BusType, DeviceInfo, WcharString};

fn attribute_string(dev: &udev::Device, attr: &str) -> WcharString {
    match dev.attribute_value(attr).and_then(|v| v.to_str()) {
        Some(s) if !s.is_empty() => WcharString::String(s.to_string()),
        _ => WcharString::None,
    }
}

fn attribute_hex_u16(dev: &udev::Device, attr: &str) -> u16 {
    dev.attribute_value(attr)
        .and_then(|v| v.to_str())
        .and_then(|s| u16::from_str_radix(s.trim(), 16).ok())
        .unwrap_or(0)
}

fn attribute_hex_i32(dev: &udev::Device, attr: &str) -> i32 {
    dev.attribute_value(attr)
        .and_then(|v| v.to_str())
        .and_then(|s| i32::from_str_radix(s.trim(), 16).ok())
        .unwrap_or(-1)
}

/// Build every [`DeviceInfo`] record for one raw hidraw node, or `None` if
/// the node should be dropped entirely (no hid parent, unparsable uevent, or
/// an unrecognized bus type).
pub fn build(raw_device: &udev::Device) -> Option<Vec<DeviceInfo>> {
    let devnode = raw_device.devnode()?;
    let path = CString::new(devnode.to_string_lossy().as_bytes()).ok()?;

    let hid_parent = topology::hid_parent(raw_device).or_else(|| {
        tracing::trace!(path = %devnode.display(), "hidraw node has no hid parent, dropping");
        None
    })?;

    let uevent_text = hid_parent.attribute_value("uevent").and_then(|v| v.to_str());
    let Some(uevent_text) = uevent_text else {
        tracing::debug!(path = %devnode.display(), "hid parent has no readable uevent, dropping");
        return None;
    };

    let Some(uevent) = sysfs::parse_uevent(uevent_text) else {
        tracing::debug!(path = %devnode.display(), "unparsable uevent, dropping");
        return None;
    };

    let Some(bus_type) = sysfs::bus_type_from_kernel(uevent.bus_type) else {
        tracing::debug!(path = %devnode.display(), bus = uevent.bus_type, "unrecognized bus type, dropping");
        return None;
    };

    let mut seed = DeviceInfo {
        path: path.clone(),
        vendor_id: uevent.vendor_id,
        product_id: uevent.product_id,
        release_number: 0,
        serial_number: if uevent.serial.is_empty() {
            WcharString::None
        } else {
            WcharString::String(uevent.serial.clone())
        },
        manufacturer_string: WcharString::None,
        product_string: WcharString::None,
        usage_page: 0,
        usage: 0,
        interface_number: -1,
        bus_type,
    };

    match bus_type {
        BusType::Usb => {
            if let Some(usb_device) = topology::usb_device_parent(raw_device) {
                seed.manufacturer_string = attribute_string(&usb_device, "manufacturer");
                seed.product_string = attribute_string(&usb_device, "product");
                seed.release_number = attribute_hex_u16(&usb_device, "bcdDevice");
                if let Some(usb_interface) = topology::usb_interface_parent(raw_device) {
                    seed.interface_number = attribute_hex_i32(&usb_interface, "bInterfaceNumber");
                }
            } else {
                seed.manufacturer_string = WcharString::None;
                seed.product_string = WcharString::String(uevent.name.clone());
            }
        }
        BusType::Bluetooth | BusType::I2c | BusType::Spi => {
            seed.manufacturer_string = WcharString::None;
            seed.product_string = WcharString::String(uevent.name.clone());
        }
    }

    let pairs = sysfs::read_descriptor(raw_device.syspath())
        .ok()
        .and_then(|bytes| UsagePairs::new(&bytes).collect::<Result<Vec<_>, _>>().ok())
        .unwrap_or_default();

    if pairs.is_empty() {
        return Some(vec![seed]);
    }

    let mut records = Vec::with_capacity(pairs.len());
    for (usage_page, usage) in pairs {
        let mut record = seed.clone();
        record.usage_page = usage_page;
        record.usage = usage;
        records.push(record);
    }
    Some(records)
}
