//! The IOCTL calls needed to talk to a hidraw character device directly.

use nix::{ioctl_read, ioctl_readwrite_buf};

// From linux/hidraw.h
const HIDRAW_IOC_MAGIC: u8 = b'H';
const HIDRAW_IOC_GRDESCSIZE: u8 = 0x01;
const HIDRAW_IOC_GRDESC: u8 = 0x02;
const HIDRAW_SET_FEATURE: u8 = 0x06;
const HIDRAW_GET_FEATURE: u8 = 0x07;
const HIDRAW_GET_INPUT: u8 = 0x0a;

/// Mirrors `struct hidraw_report_descriptor` from linux/hidraw.h: the caller
/// sets `size`, the kernel fills `value` up to that many bytes.
#[repr(C)]
pub struct HidrawReportDescriptor {
    pub size: u32,
    pub value: [u8; 4096],
}

ioctl_read!(
    hidraw_ioc_grdescsize,
    HIDRAW_IOC_MAGIC,
    HIDRAW_IOC_GRDESCSIZE,
    libc::c_int
);

ioctl_read!(
    hidraw_ioc_grdesc,
    HIDRAW_IOC_MAGIC,
    HIDRAW_IOC_GRDESC,
    HidrawReportDescriptor
);

ioctl_readwrite_buf!(
    hidraw_ioc_set_feature,
    HIDRAW_IOC_MAGIC,
    HIDRAW_SET_FEATURE,
    u8
);
ioctl_readwrite_buf!(
    hidraw_ioc_get_feature,
    HIDRAW_IOC_MAGIC,
    HIDRAW_GET_FEATURE,
    u8
);
ioctl_readwrite_buf!(hidraw_ioc_get_input, HIDRAW_IOC_MAGIC, HIDRAW_GET_INPUT, u8);
