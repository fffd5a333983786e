// **************************************************************************
// Copyright (c) 2018 Roland Ruckerbauer All Rights Reserved.
//
// This file is part of hidapi-rs, based on hidapi-rs by Osspial
// **************************************************************************

//! Enumeration, report-descriptor parsing, blocking IO, and hotplug
//! notification for `hidraw` character devices on Linux, via `udev`.

mod descriptor;
mod error;
mod linux_native;

pub use descriptor::{DescriptorItem, Items, UsagePairs};
pub use error::HidError;
pub use linux_native::{
    deregister_callback, register_callback, HotplugEvent, HotplugFlag, HotplugHandle,
};

use std::ffi::CStr;
use std::fmt;

use linux_native::{HidApiBackend, HidDevice as PlatformDevice};

pub type HidResult<T> = Result<T, HidError>;

/// Text that may not have decoded as UTF-8. On Linux the `Raw` arm is
/// unreachable in practice — udev always hands back UTF-8 — but the type
/// stays shared with the rest of the crate's public surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WcharString {
    None,
    String(String),
    Raw(Vec<u32>),
}

impl WcharString {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WcharString::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<WcharString> for Option<String> {
    fn from(value: WcharString) -> Self {
        match value {
            WcharString::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Kernel bus the device is attached through. Any other kernel bus constant
/// causes the node to be dropped before a [`DeviceInfo`] is ever allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    Usb,
    Bluetooth,
    I2c,
    Spi,
}

/// One logical enumeration record. A node emitting `k >= 1` usage pairs
/// produces `k` records sharing every field but `usage_page`/`usage`; each is
/// an independently owned clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub path: std::ffi::CString,
    pub vendor_id: u16,
    pub product_id: u16,
    pub release_number: u16,
    pub serial_number: WcharString,
    pub manufacturer_string: WcharString,
    pub product_string: WcharString,
    pub usage_page: u16,
    pub usage: u16,
    pub interface_number: i32,
    pub bus_type: BusType,
}

impl DeviceInfo {
    pub fn path(&self) -> &CStr {
        &self.path
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn release_number(&self) -> u16 {
        self.release_number
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_str()
    }

    pub fn manufacturer_string(&self) -> Option<&str> {
        self.manufacturer_string.as_str()
    }

    pub fn product_string(&self) -> Option<&str> {
        self.product_string.as_str()
    }

    pub fn usage_page(&self) -> u16 {
        self.usage_page
    }

    pub fn usage(&self) -> u16 {
        self.usage
    }

    pub fn interface_number(&self) -> i32 {
        self.interface_number
    }

    pub fn bus_type(&self) -> BusType {
        self.bus_type
    }

    /// Open this specific record's path, matching `serial_number` if set.
    pub fn open_device(&self, _api: &HidApi) -> HidResult<HidDevice> {
        HidDevice::open_path(&self.path)
    }
}

/// Operations common to every backend, implemented here by the Linux
/// `hidraw` device handle.
pub trait HidDeviceBackendBase {
    fn write(&self, data: &[u8]) -> HidResult<usize>;
    fn read(&self, buf: &mut [u8]) -> HidResult<usize>;
    fn read_timeout(&self, buf: &mut [u8], timeout: i32) -> HidResult<usize>;
    fn send_feature_report(&self, data: &[u8]) -> HidResult<()>;
    fn get_feature_report(&self, buf: &mut [u8]) -> HidResult<usize>;
    fn get_input_report(&self, buf: &mut [u8]) -> HidResult<usize>;
    fn set_blocking_mode(&self, blocking: bool) -> HidResult<()>;
    fn get_manufacturer_string(&self) -> HidResult<Option<String>>;
    fn get_product_string(&self) -> HidResult<Option<String>>;
    fn get_serial_number_string(&self) -> HidResult<Option<String>>;
    fn get_indexed_string(&self, index: i32) -> HidResult<Option<String>>;
    fn get_device_info(&self) -> HidResult<DeviceInfo>;
    fn get_report_descriptor(&self, buf: &mut [u8]) -> HidResult<usize>;
}

/// An opened HID device. Dropping it closes the underlying fd.
pub struct HidDevice {
    inner: PlatformDevice,
}

impl fmt::Debug for HidDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidDevice").finish_non_exhaustive()
    }
}

impl HidDevice {
    fn open_path(path: &CStr) -> HidResult<Self> {
        Ok(Self {
            inner: PlatformDevice::open_path(path)?,
        })
    }

    /// Returns the text registered by the last fallible operation on this
    /// device, or `"Success"` if none is set — layered alongside the
    /// `Result` return values, not instead of them.
    pub fn last_error(&self) -> String {
        self.inner.last_error()
    }
}

impl HidDeviceBackendBase for HidDevice {
    fn write(&self, data: &[u8]) -> HidResult<usize> {
        self.inner.write(data)
    }

    fn read(&self, buf: &mut [u8]) -> HidResult<usize> {
        self.inner.read(buf)
    }

    fn read_timeout(&self, buf: &mut [u8], timeout: i32) -> HidResult<usize> {
        self.inner.read_timeout(buf, timeout)
    }

    fn send_feature_report(&self, data: &[u8]) -> HidResult<()> {
        self.inner.send_feature_report(data)
    }

    fn get_feature_report(&self, buf: &mut [u8]) -> HidResult<usize> {
        self.inner.get_feature_report(buf)
    }

    fn get_input_report(&self, buf: &mut [u8]) -> HidResult<usize> {
        self.inner.get_input_report(buf)
    }

    fn set_blocking_mode(&self, blocking: bool) -> HidResult<()> {
        self.inner.set_blocking_mode(blocking)
    }

    fn get_manufacturer_string(&self) -> HidResult<Option<String>> {
        self.inner.get_manufacturer_string()
    }

    fn get_product_string(&self) -> HidResult<Option<String>> {
        self.inner.get_product_string()
    }

    fn get_serial_number_string(&self) -> HidResult<Option<String>> {
        self.inner.get_serial_number_string()
    }

    fn get_indexed_string(&self, index: i32) -> HidResult<Option<String>> {
        self.inner.get_indexed_string(index)
    }

    fn get_device_info(&self) -> HidResult<DeviceInfo> {
        self.inner.get_device_info()
    }

    fn get_report_descriptor(&self, buf: &mut [u8]) -> HidResult<usize> {
        self.inner.get_report_descriptor(buf)
    }
}

/// Entry point: enumerate and open HID devices.
pub struct HidApi {
    devices: Vec<DeviceInfo>,
}

impl HidApi {
    /// Initializes the library and performs an initial enumeration.
    pub fn new() -> HidResult<Self> {
        linux_native::ensure_init();
        Ok(Self {
            devices: HidApiBackend::get_hid_device_info_vector(0, 0)?,
        })
    }

    /// Re-enumerates, replacing the cached device list.
    pub fn refresh_devices(&mut self) -> HidResult<()> {
        self.devices = HidApiBackend::get_hid_device_info_vector(0, 0)?;
        Ok(())
    }

    pub fn devices(&self) -> &Vec<DeviceInfo> {
        &self.devices
    }

    pub fn device_list(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.iter()
    }

    pub fn open(&self, vendor_id: u16, product_id: u16) -> HidResult<HidDevice> {
        Ok(HidDevice {
            inner: HidApiBackend::open(vendor_id, product_id)?,
        })
    }

    pub fn open_serial(&self, vendor_id: u16, product_id: u16, sn: &str) -> HidResult<HidDevice> {
        Ok(HidDevice {
            inner: HidApiBackend::open_serial(vendor_id, product_id, sn)?,
        })
    }

    pub fn open_path(&self, device_path: &CStr) -> HidResult<HidDevice> {
        Ok(HidDevice {
            inner: HidApiBackend::open_path(device_path)?,
        })
    }

    /// Last error registered against the process-wide store (not any
    /// particular device's).
    pub fn check_error(&self) -> HidResult<HidError> {
        HidApiBackend::check_error()
    }
}
