//! Named wrappers over `udev::Device::parent_with_subsystem[_devtype]`, so
//! the device-info builder reads in terms of hid/usb ancestry rather than
//! udev's generic ancestor-walking API.

use udev::Device;

/// Nearest ancestor in the `"hid"` subsystem. Absence means the hidraw node
/// has no hid-core device above it and should be skipped entirely.
pub fn hid_parent(dev: &Device) -> Option<Device> {
    dev.parent_with_subsystem("hid").ok().flatten()
}

/// Nearest ancestor with `(subsystem, devtype) == ("usb", "usb_device")`.
/// Absence isn't fatal: virtual/uhid devices have no USB ancestor at all.
pub fn usb_device_parent(dev: &Device) -> Option<Device> {
    dev.parent_with_subsystem_devtype("usb", "usb_device")
        .ok()
        .flatten()
}

/// Nearest ancestor `("usb", "usb_interface")`, used solely to read
/// `bInterfaceNumber`.
pub fn usb_interface_parent(dev: &Device) -> Option<Device> {
    dev.parent_with_subsystem_devtype("usb", "usb_interface")
        .ok()
        .flatten()
}
