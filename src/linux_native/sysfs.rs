//! Reading the raw descriptor and `uevent` text off a hidraw node's sysfs
//! directory, independent of udev's own (already-parsed) property cache --
//! used by the enumerator's cheap vid/pid pre-filter (4.E) so a full device
//! info build never runs for a node that's going to be rejected anyway.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::BusType;
use crate::descriptor::MAX_DESCRIPTOR_SIZE;

/// Longest `uevent` line/value this reader will look at; anything past this
/// is truncated before parsing, matching the scratch-buffer discipline of
/// the upstream C reader.
const MAX_UEVENT_FIELD: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeventInfo {
    pub bus_type: u16,
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: String,
    pub serial: String,
}

/// Read `<sysfs_path>/device/report_descriptor`. Hidraw never exposes more
/// than [`MAX_DESCRIPTOR_SIZE`] bytes, so the result is never truncated here.
pub fn read_descriptor(sysfs_path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(sysfs_path.join("device/report_descriptor"))?;
    let mut buf = Vec::with_capacity(MAX_DESCRIPTOR_SIZE);
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Parse `HID_ID=%x:%hx:%hx`, stopping at the first line whose key matches.
/// Values longer than [`MAX_UEVENT_FIELD`] are truncated before parsing.
fn parse_hid_id(value: &str) -> Option<(u16, u16, u16)> {
    let value = &value[..value.len().min(MAX_UEVENT_FIELD)];
    let mut parts = value.split(':');
    let bus = u16::from_str_radix(parts.next()?, 16).ok()?;
    let vid = u16::from_str_radix(parts.next()?, 16).ok()?;
    let pid = u16::from_str_radix(parts.next()?, 16).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((bus, vid, pid))
}

fn split_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let value = &value[..value.len().min(MAX_UEVENT_FIELD)];
    Some((key, value))
}

/// Full `uevent` parse: requires `HID_ID`, `HID_NAME`, and `HID_UNIQ` all to
/// be present, scanning every line (order in the file is not assumed).
pub fn parse_uevent(text: &str) -> Option<UeventInfo> {
    let mut id = None;
    let mut name = None;
    let mut serial = None;

    for line in text.lines() {
        let Some((key, value)) = split_line(line) else {
            continue;
        };
        match key {
            "HID_ID" => id = parse_hid_id(value),
            "HID_NAME" => name = Some(value.to_string()),
            "HID_UNIQ" => serial = Some(value.to_string()),
            _ => {}
        }
    }

    let (bus_type, vendor_id, product_id) = id?;
    Some(UeventInfo {
        bus_type,
        vendor_id,
        product_id,
        name: name?,
        serial: serial?,
    })
}

/// Cheap variant of [`parse_uevent`] that stops as soon as `HID_ID` is
/// found, without caring about `HID_NAME`/`HID_UNIQ`. Used to pre-filter
/// nodes by vendor/product before doing a full device-info build.
pub fn parse_vid_pid_only(text: &str) -> Option<(u16, u16, u16)> {
    for line in text.lines() {
        let (key, value) = split_line(line)?;
        if key == "HID_ID" {
            return parse_hid_id(value);
        }
    }
    None
}

pub fn bus_type_from_kernel(value: u16) -> Option<BusType> {
    // From linux/input.h
    const BUS_USB: u16 = 0x03;
    const BUS_BLUETOOTH: u16 = 0x05;
    const BUS_I2C: u16 = 0x18;
    const BUS_SPI: u16 = 0x1C;

    match value {
        BUS_USB => Some(BusType::Usb),
        BUS_BLUETOOTH => Some(BusType::Bluetooth),
        BUS_I2C => Some(BusType::I2c),
        BUS_SPI => Some(BusType::Spi),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_full_uevent_parses() {
        let text = "HID_ID=0003:000005AC:00008242\nHID_NAME=Keyboard\nHID_UNIQ=abc\n";
        let info = parse_uevent(text).unwrap();
        assert_eq!(info.bus_type, 0x0003);
        assert_eq!(info.vendor_id, 0x05AC);
        assert_eq!(info.product_id, 0x8242);
        assert_eq!(info.name, "Keyboard");
        assert_eq!(info.serial, "abc");
    }

    #[test]
    fn s5_missing_any_key_fails() {
        let without_id = "HID_NAME=Keyboard\nHID_UNIQ=abc\n";
        assert!(parse_uevent(without_id).is_none());

        let without_name = "HID_ID=0003:000005AC:00008242\nHID_UNIQ=abc\n";
        assert!(parse_uevent(without_name).is_none());

        let without_serial = "HID_ID=0003:000005AC:00008242\nHID_NAME=Keyboard\n";
        assert!(parse_uevent(without_serial).is_none());
    }

    #[test]
    fn vid_pid_only_ignores_other_keys() {
        let text = "HID_NAME=Whatever\nHID_ID=11:0017:00018\nHID_UNIQ=xyz\n";
        assert_eq!(parse_vid_pid_only(text), Some((0x11, 0x17, 0x18)));
    }

    #[test]
    fn malformed_hid_id_fails() {
        assert_eq!(parse_vid_pid_only("HID_ID=not-hex\n"), None);
        assert_eq!(parse_vid_pid_only("HID_ID=1:2\n"), None);
    }

    #[test]
    fn value_containing_equals_splits_on_first_only() {
        let text = "HID_NAME=Model=X1\nHID_ID=3:1:1\nHID_UNIQ=s\n";
        let info = parse_uevent(text).unwrap();
        assert_eq!(info.name, "Model=X1");
    }

    #[test]
    fn bus_type_mapping() {
        assert_eq!(bus_type_from_kernel(0x03), Some(BusType::Usb));
        assert_eq!(bus_type_from_kernel(0x05), Some(BusType::Bluetooth));
        assert_eq!(bus_type_from_kernel(0x18), Some(BusType::I2c));
        assert_eq!(bus_type_from_kernel(0x1C), Some(BusType::Spi));
        assert_eq!(bus_type_from_kernel(0x99), None);
    }

    #[test]
    fn fixture_usb_keyboard_uevent_parses() {
        let text = include_str!("../../tests/fixtures/uevent/keyboard.uevent");
        let info = parse_uevent(text).unwrap();
        assert_eq!(bus_type_from_kernel(info.bus_type), Some(BusType::Usb));
        assert_eq!(info.vendor_id, 0x05AC);
        assert_eq!(info.product_id, 0x0220);
        assert_eq!(info.name, "Apple Inc. Apple Keyboard");
        assert_eq!(info.serial, "");
    }

    #[test]
    fn fixture_bluetooth_mouse_uevent_parses() {
        let text = include_str!("../../tests/fixtures/uevent/bluetooth_mouse.uevent");
        let info = parse_uevent(text).unwrap();
        assert_eq!(bus_type_from_kernel(info.bus_type), Some(BusType::Bluetooth));
        assert_eq!(info.vendor_id, 0x046D);
        assert_eq!(info.product_id, 0xB02A);
        assert_eq!(info.serial, "a1:b2:c3:d4:e5:f6");
    }

    #[test]
    fn fixture_missing_name_uevent_fails() {
        let text = include_str!("../../tests/fixtures/uevent/missing_name.uevent");
        assert!(parse_uevent(text).is_none());
        // The cheap pre-filter variant only needs HID_ID, so it still succeeds.
        assert_eq!(parse_vid_pid_only(text), Some((0x0003, 0x05AC, 0x0220)));
    }
}
