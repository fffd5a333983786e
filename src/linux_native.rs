//! Linux backend: hidraw + udev. Enumeration and topology walking live in
//! the `sysfs`/`topology`/`device_info`/`enumerator` submodules; this file
//! owns the open device handle and its blocking IO.

pub mod device_info;
mod hotplug;
mod ioctl;
mod lasterror;
mod sysfs;
mod topology;

pub mod enumerator;

pub use hotplug::{deregister_callback, register_callback, HotplugEvent, HotplugFlag, HotplugHandle};

use std::cell::{Cell, Ref, RefCell};
use std::ffi::CStr;
use std::fs::OpenOptions;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::stat::{fstat, major, minor};
use nix::unistd::{read, write};

use crate::{DeviceInfo, HidError, HidResult, WcharString};
use ioctl::{hidraw_ioc_get_feature, hidraw_ioc_get_input, hidraw_ioc_grdesc, hidraw_ioc_grdescsize, hidraw_ioc_set_feature};

/// Bootstrap run on every call (matching the upstream `hid_init` contract,
/// which `hid_enumerate` invokes at its top on every call): resets the
/// global last-error, and sets the process locale the first time only. UTF-8
/// decoding of sysfs text does not actually depend on the locale, since udev
/// always hands back UTF-8 — the `setlocale` call exists only to match the
/// documented contract.
pub fn ensure_init() {
    use std::sync::Once;
    static LOCALE_INIT: Once = Once::new();

    lasterror::clear_global_error();

    LOCALE_INIT.call_once(|| unsafe {
        let current = libc::setlocale(libc::LC_CTYPE, std::ptr::null());
        if current.is_null() {
            libc::setlocale(libc::LC_CTYPE, c"".as_ptr());
        }
    });
}

pub struct HidApiBackend;

impl HidApiBackend {
    pub fn get_hid_device_info_vector(vid: u16, pid: u16) -> HidResult<Vec<DeviceInfo>> {
        enumerator::enumerate(vid, pid)
    }

    pub fn open(vid: u16, pid: u16) -> HidResult<HidDevice> {
        HidDevice::open(vid, pid, None)
    }

    pub fn open_serial(vid: u16, pid: u16, sn: &str) -> HidResult<HidDevice> {
        HidDevice::open(vid, pid, Some(sn))
    }

    pub fn open_path(device_path: &CStr) -> HidResult<HidDevice> {
        HidDevice::open_path(device_path)
    }

    pub fn check_error() -> HidResult<HidError> {
        Err(HidError::HidApiError {
            message: lasterror::global_last_error(),
        })
    }
}

/// Object for accessing the HID device.
pub struct HidDevice {
    blocking: Cell<bool>,
    fd: OwnedFd,
    info: RefCell<Option<DeviceInfo>>,
    last_error: RefCell<Option<String>>,
}

unsafe impl Send for HidDevice {}

impl HidDevice {
    pub(crate) fn open(vid: u16, pid: u16, sn: Option<&str>) -> HidResult<Self> {
        ensure_init();

        for device in enumerator::enumerate(vid, pid)?.iter() {
            match (sn, &device.serial_number) {
                (None, _) => return Self::open_path(&device.path),
                (Some(sn), WcharString::String(serial_number)) if sn == serial_number => {
                    return Self::open_path(&device.path)
                }
                _ => continue,
            }
        }

        let message = "device not found with requested VID/PID/serial".to_string();
        lasterror::register_global_error(message.clone());
        Err(HidError::HidApiError { message })
    }

    pub(crate) fn open_path(device_path: &CStr) -> HidResult<HidDevice> {
        let path = device_path
            .to_str()
            .map_err(|_| HidError::InvalidArgument)?;

        let fd: OwnedFd = match OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(path)
        {
            Ok(f) => f.into(),
            Err(e) => {
                let message = format!("failed to open device with path {path}: {e}");
                lasterror::register_global_error(message.clone());
                return Err(HidError::HidApiError { message });
            }
        };

        let mut size = 0_i32;
        if let Err(e) = unsafe { hidraw_ioc_grdescsize(fd.as_raw_fd(), &mut size) } {
            let message = format!("ioctl(GRDESCSIZE) error for {path}, not a HIDRAW device?: {e}");
            lasterror::register_global_error(message.clone());
            return Err(HidError::HidApiError { message });
        }

        Ok(Self {
            blocking: Cell::new(true),
            fd,
            info: RefCell::new(None),
            last_error: RefCell::new(None),
        })
    }

    fn register_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.last_error.replace(Some(message.clone()));
        lasterror::register_global_error(message);
    }

    pub fn last_error(&self) -> String {
        self.last_error
            .borrow()
            .clone()
            .unwrap_or_else(|| "Success".to_string())
    }

    fn info(&self) -> HidResult<Ref<DeviceInfo>> {
        if self.info.borrow().is_none() {
            let info = self.get_device_info()?;
            self.info.replace(Some(info));
        }
        let info = self.info.borrow();
        Ok(Ref::map(info, |i| i.as_ref().unwrap()))
    }

    pub fn write(&self, data: &[u8]) -> HidResult<usize> {
        if data.is_empty() {
            return Err(HidError::InvalidZeroSizeData);
        }
        write(self.fd.as_raw_fd(), data).map_err(|e| {
            self.register_error(format!("write failed: {e}"));
            e.into()
        })
    }

    /// `ms < 0` blocks indefinitely; `ms == 0` polls without waiting; a `0`
    /// return from the poll means the timeout elapsed (`Ok(0)`).
    pub fn read_timeout(&self, buf: &mut [u8], ms: i32) -> HidResult<usize> {
        if ms >= 0 {
            let mut fds = [PollFd::new(&self.fd, PollFlags::POLLIN)];
            let ready = poll(&mut fds, ms).map_err(|e| {
                self.register_error(format!("poll failed: {e}"));
                HidError::from(e)
            })?;

            if ready == 0 {
                return Ok(0);
            }

            let disconnected = fds[0]
                .revents()
                .map(|e| e.intersects(PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL))
                .unwrap_or(true);
            if disconnected {
                self.register_error("device disconnected".to_string());
                return Err(HidError::DeviceDisconnected);
            }
        }

        match read(self.fd.as_raw_fd(), buf) {
            Ok(n) => Ok(n),
            Err(Errno::EAGAIN) | Err(Errno::EINPROGRESS) => Ok(0),
            Err(e) => {
                self.register_error(format!("read failed: {e}"));
                Err(e.into())
            }
        }
    }

    pub fn read(&self, buf: &mut [u8]) -> HidResult<usize> {
        let timeout = if self.blocking.get() { -1 } else { 0 };
        self.read_timeout(buf, timeout)
    }

    /// Purely updates the blocking flag consulted by [`Self::read`]; the fd
    /// itself is never put into non-blocking mode, working around a kernel
    /// hidraw quirk where disconnect detection is unreliable otherwise.
    pub fn set_blocking_mode(&self, blocking: bool) -> HidResult<()> {
        self.blocking.set(blocking);
        Ok(())
    }

    pub fn send_feature_report(&self, data: &[u8]) -> HidResult<()> {
        if data.is_empty() {
            return Err(HidError::InvalidZeroSizeData);
        }
        let mut d = data.to_vec();
        let res = match unsafe { hidraw_ioc_set_feature(self.fd.as_raw_fd(), &mut d) } {
            Ok(n) => n as usize,
            Err(e) => {
                self.register_error(format!("ioctl(SFEATURE) failed: {e}"));
                return Err(e.into());
            }
        };
        if res != data.len() {
            return Err(HidError::IncompleteSendError {
                sent: res,
                all: data.len(),
            });
        }
        Ok(())
    }

    pub fn get_feature_report(&self, buf: &mut [u8]) -> HidResult<usize> {
        match unsafe { hidraw_ioc_get_feature(self.fd.as_raw_fd(), buf) } {
            Ok(n) => Ok(n as usize),
            Err(e) => {
                self.register_error(format!("ioctl(GFEATURE) failed: {e}"));
                Err(e.into())
            }
        }
    }

    pub fn get_input_report(&self, buf: &mut [u8]) -> HidResult<usize> {
        match unsafe { hidraw_ioc_get_input(self.fd.as_raw_fd(), buf) } {
            Ok(n) => Ok(n as usize),
            Err(e) => {
                self.register_error(format!("ioctl(GINPUT) failed: {e}"));
                Err(e.into())
            }
        }
    }

    pub fn get_manufacturer_string(&self) -> HidResult<Option<String>> {
        Ok(self.info()?.manufacturer_string().map(str::to_string))
    }

    pub fn get_product_string(&self) -> HidResult<Option<String>> {
        Ok(self.info()?.product_string().map(str::to_string))
    }

    pub fn get_serial_number_string(&self) -> HidResult<Option<String>> {
        Ok(self.info()?.serial_number().map(str::to_string))
    }

    pub fn get_indexed_string(&self, _index: i32) -> HidResult<Option<String>> {
        Err(HidError::NotSupported)
    }

    pub fn get_device_info(&self) -> HidResult<DeviceInfo> {
        let devnum = fstat(self.fd.as_raw_fd())?.st_rdev;
        let syspath: PathBuf = format!("/sys/dev/char/{}:{}", major(devnum), minor(devnum)).into();
        let device = udev::Device::from_syspath(&syspath)?;
        device_info::build(&device).map(|infos| infos[0].clone()).ok_or_else(|| {
            let message = "failed to rebuild device info for open handle".to_string();
            self.register_error(message.clone());
            HidError::HidApiError { message }
        })
    }

    /// Reads through `HIDIOCGRDESC` (a fixed 4096-byte kernel buffer), unlike
    /// the enumeration path which reads sysfs directly — cheaper for a cold
    /// scan over many nodes, and doesn't need an open fd.
    pub fn get_report_descriptor(&self, buf: &mut [u8]) -> HidResult<usize> {
        let mut descriptor = ioctl::HidrawReportDescriptor {
            size: 4096,
            value: [0u8; 4096],
        };
        match unsafe { hidraw_ioc_grdesc(self.fd.as_raw_fd(), &mut descriptor) } {
            Ok(_) => {
                let n = (descriptor.size as usize).min(buf.len()).min(4096);
                buf[..n].copy_from_slice(&descriptor.value[..n]);
                Ok(n)
            }
            Err(e) => {
                self.register_error(format!("ioctl(GRDESC) failed: {e}"));
                Err(e.into())
            }
        }
    }
}

impl AsFd for HidDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}
