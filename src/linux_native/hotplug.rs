//! Process-wide hotplug engine: a udev netlink monitor plus a single worker
//! thread that dispatches `Arrived`/`Left` events to registered callbacks.
//!
//! Grounded on the `hid_hotplug_*` state machine of the upstream C
//! implementation, with two behavioral fixes called out explicitly:
//! `register_callback` returns a real `Ok(handle)`/`Err` instead of always
//! `-1`, and the `ENUMERATE` flag actually synthesizes initial events.

use std::num::NonZeroU32;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::sync::{Mutex, OnceLock};
use std::thread::JoinHandle;

use bitflags::bitflags;
use nix::poll::{poll, PollFd, PollFlags};

use crate::linux_native::enumerator;
use crate::{DeviceInfo, HidError, HidResult};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HotplugEvent: u32 {
        const ARRIVED = 0b01;
        const LEFT = 0b10;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HotplugFlag: u32 {
        const ENUMERATE = 0b01;
    }
}

pub type HotplugHandle = NonZeroU32;

type Callback = Box<dyn FnMut(HotplugHandle, &DeviceInfo, HotplugEvent) -> bool + Send>;

struct HotplugCallback {
    handle: HotplugHandle,
    vendor_id: u16,
    product_id: u16,
    events: HotplugEvent,
    callback: Callback,
}

/// Shared vendor/product filter: `0` is a wildcard for either slot. Used both
/// by live dispatch ([`HotplugCallback::matches`]) and by the `ENUMERATE`
/// synthesis loop in [`register_callback`], so both paths agree on what
/// "matches this callback" means.
fn matches_filter(vendor_id: u16, product_id: u16, info: &DeviceInfo) -> bool {
    (vendor_id == 0 || vendor_id == info.vendor_id) && (product_id == 0 || product_id == info.product_id)
}

impl HotplugCallback {
    fn matches(&self, info: &DeviceInfo) -> bool {
        matches_filter(self.vendor_id, self.product_id, info)
    }
}

struct HotplugContext {
    monitor: udev::MonitorSocket,
    worker: Option<JoinHandle<()>>,
    next_handle: u32,
    callbacks: Vec<HotplugCallback>,
    devs: Vec<DeviceInfo>,
}

static CONTEXT: OnceLock<Mutex<Option<HotplugContext>>> = OnceLock::new();

fn context_lock() -> &'static Mutex<Option<HotplugContext>> {
    CONTEXT.get_or_init(|| Mutex::new(None))
}

fn dispatch(callbacks: &mut Vec<HotplugCallback>, info: &DeviceInfo, event: HotplugEvent) {
    let mut i = 0;
    while i < callbacks.len() {
        let matches = callbacks[i].events.contains(event) && callbacks[i].matches(info);
        if matches {
            let handle = callbacks[i].handle;
            let deregister = (callbacks[i].callback)(handle, info, event);
            if deregister {
                callbacks.remove(i);
                continue;
            }
        }
        i += 1;
    }
}

fn worker_loop(monitor_fd: RawFd) {
    loop {
        let still_armed = {
            let guard = context_lock().lock().expect("hotplug context lock");
            guard.is_some()
        };
        if !still_armed {
            return;
        }

        // SAFETY: monitor_fd stays valid for the worker's lifetime; the
        // context (and the fd it owns) is only torn down after this thread
        // has been joined, in deregister_callback.
        let borrowed = unsafe { BorrowedFd::borrow_raw(monitor_fd) };
        let mut fds = [PollFd::new(&borrowed, PollFlags::POLLIN)];
        let ready = match poll(&mut fds, 5i32) {
            Ok(n) => n,
            Err(_) => continue,
        };
        if ready <= 0 {
            continue;
        }

        let mut guard = context_lock().lock().expect("hotplug context lock");
        let Some(ctx) = guard.as_mut() else {
            return;
        };

        let Some(event) = ctx.monitor.iter().next() else {
            continue;
        };

        match event.event_type() {
            udev::EventType::Add => {
                if let Some(records) = crate::linux_native::device_info::build(&event) {
                    for info in &records {
                        dispatch(&mut ctx.callbacks, info, HotplugEvent::ARRIVED);
                    }
                    ctx.devs.extend(records);
                }
            }
            udev::EventType::Remove => {
                let Some(devnode) = event.devnode() else {
                    continue;
                };
                let devnode_bytes = devnode.as_os_str().as_encoded_bytes();
                let mut left = Vec::new();
                ctx.devs.retain(|info| {
                    if info.path.as_bytes() == devnode_bytes {
                        left.push(info.clone());
                        false
                    } else {
                        true
                    }
                });
                for info in &left {
                    dispatch(&mut ctx.callbacks, info, HotplugEvent::LEFT);
                }
            }
            other => {
                tracing::warn!(?other, "ignoring unrecognized hotplug event type");
            }
        }
    }
}

fn allocate_handle(next_handle: &mut u32) -> HotplugHandle {
    let handle = *next_handle;
    *next_handle = next_handle.wrapping_add(1);
    if *next_handle == 0 {
        *next_handle = 1;
    }
    NonZeroU32::new(handle).unwrap_or_else(|| NonZeroU32::new(1).unwrap())
}

/// Register a callback for `events` on devices matching `vendor_id`/
/// `product_id` (`0` is a wildcard). If `HotplugFlag::ENUMERATE` is set,
/// synthesizes `Arrived` for every already-connected matching device,
/// delivered only to this callback.
pub fn register_callback(
    vendor_id: u16,
    product_id: u16,
    events: HotplugEvent,
    flags: HotplugFlag,
    mut callback: impl FnMut(HotplugHandle, &DeviceInfo, HotplugEvent) -> bool + Send + 'static,
) -> HidResult<HotplugHandle> {
    if events.is_empty() || !HotplugEvent::all().contains(events) {
        return Err(HidError::InvalidArgument);
    }
    if !HotplugFlag::all().contains(flags) {
        return Err(HidError::InvalidArgument);
    }

    let mut guard = context_lock().lock().expect("hotplug context lock");

    if guard.is_none() {
        let socket = udev::MonitorBuilder::new()
            .map_err(|e| HidError::IoError { error: e })?
            .match_subsystem("hidraw")
            .map_err(|e| HidError::IoError { error: e })?
            .listen()
            .map_err(|e| HidError::IoError { error: e })?;
        let devs = enumerator::enumerate(0, 0)?;
        *guard = Some(HotplugContext {
            monitor: socket,
            worker: None,
            next_handle: 1,
            callbacks: Vec::new(),
            devs,
        });
    }

    let ctx = guard.as_mut().expect("context just initialized");
    let handle = allocate_handle(&mut ctx.next_handle);

    if flags.contains(HotplugFlag::ENUMERATE) && events.contains(HotplugEvent::ARRIVED) {
        for info in &ctx.devs {
            if matches_filter(vendor_id, product_id, info) {
                callback(handle, info, HotplugEvent::ARRIVED);
            }
        }
    }

    ctx.callbacks.push(HotplugCallback {
        handle,
        vendor_id,
        product_id,
        events,
        callback: Box::new(callback),
    });

    if ctx.worker.is_none() {
        let monitor_fd = ctx.monitor.as_raw_fd();
        ctx.worker = Some(std::thread::spawn(move || worker_loop(monitor_fd)));
    }

    Ok(handle)
}

/// Deregister a previously-registered callback. Tears down the monitor and
/// worker thread if this was the last callback.
pub fn deregister_callback(handle: HotplugHandle) -> HidResult<()> {
    let worker = {
        let mut guard = context_lock().lock().expect("hotplug context lock");
        let Some(ctx) = guard.as_mut() else {
            return Err(HidError::NotFound);
        };

        let before = ctx.callbacks.len();
        ctx.callbacks.retain(|cb| cb.handle != handle);
        if ctx.callbacks.len() == before {
            return Err(HidError::NotFound);
        }

        if ctx.callbacks.is_empty() {
            let mut ctx = guard.take().expect("context present");
            ctx.worker.take()
        } else {
            None
        }
    };

    if let Some(worker) = worker {
        // Context is already cleared, so the worker observes `guard.is_none()`
        // on its next wakeup and exits; joining it here makes Idle observable
        // as "no worker thread" the instant this call returns.
        let _ = worker.join();
    }

    Ok(())
}
