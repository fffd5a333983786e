// **************************************************************************
// Copyright (c) 2018 Roland Ruckerbauer All Rights Reserved.
//
// This file is part of hidapi-rs, based on hidapi-rs by Osspial
// **************************************************************************

use std::error::Error;
use std::fmt::{Display, Formatter, Result};

#[derive(Debug)]
pub enum HidError {
    /// Zero-length write, or an invalid hotplug event/flag bitmask.
    InvalidArgument,
    /// No devices left after filtering, or no device matched a lookup.
    NotFound,
    /// An IO error or a system error that can be represented as such.
    IoError { error: std::io::Error },
    /// `poll()` reported `POLLERR | POLLHUP | POLLNVAL` on the device fd.
    DeviceDisconnected,
    /// The report descriptor parser hit a truncated long item.
    MalformedDescriptor,
    /// Indexed string retrieval isn't supported on this backend.
    NotSupported,
    /// Generic message-carrying error, used by the open/enumerate paths.
    HidApiError { message: String },
    InvalidZeroSizeData,
    IncompleteSendError { sent: usize, all: usize },
    SetBlockingModeError { mode: &'static str },
}

impl Display for HidError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            HidError::InvalidArgument => write!(f, "invalid argument"),
            HidError::NotFound => write!(f, "device not found"),
            HidError::IoError { error } => write!(f, "{error}"),
            HidError::DeviceDisconnected => write!(f, "device disconnected"),
            HidError::MalformedDescriptor => write!(f, "malformed report descriptor"),
            HidError::NotSupported => write!(f, "operation not supported on this backend"),
            HidError::HidApiError { message } => write!(f, "hidapi error: {}", message),
            HidError::InvalidZeroSizeData => write!(f, "Invalid data: size can not be 0"),
            HidError::IncompleteSendError { sent, all } => write!(
                f,
                "Failed to send all data: only sent {} out of {} bytes",
                sent, all
            ),
            HidError::SetBlockingModeError { mode } => {
                write!(f, "Can not set blocking mode to '{}'", mode)
            }
        }
    }
}

impl Error for HidError {}

impl From<std::io::Error> for HidError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError { error: e }
    }
}

impl From<nix::errno::Errno> for HidError {
    fn from(e: nix::errno::Errno) -> Self {
        Self::IoError { error: e.into() }
    }
}
