//! HID report-descriptor decoding (HID 1.11, short and long items).
//!
//! This is a pure, allocation-free decoder: no file I/O, no udev. It walks a
//! descriptor byte slice and extracts every `(usage page, usage)` pair
//! attached to a `Collection` item, in descriptor order. [`Items`] exposes
//! the lower-level item stream; [`UsagePairs`] is built on top of it and is
//! what the device-info builder actually drives.

use crate::HidError;

/// Maximum size of a `hidraw` report descriptor blob.
pub const MAX_DESCRIPTOR_SIZE: usize = 4096;

/// One decoded item from a descriptor: `kind` is the top six bits of the
/// first byte for short items, or the whole first byte (`0xFx`) for long
/// items. `data` is bounds-clamped to the buffer; it may be shorter than
/// `data_len` if the descriptor is truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorItem<'a> {
    pub kind: u8,
    pub long: bool,
    pub data_len: usize,
    pub key_size: usize,
    pub data: &'a [u8],
}

/// Item-by-item iterator over a descriptor blob.
///
/// Yields `Err(HidError::MalformedDescriptor)` exactly once, for a long item
/// whose length byte is missing, and nothing after that (fused).
pub struct Items<'a> {
    data: &'a [u8],
    pos: usize,
    errored: bool,
}

impl<'a> Items<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Items {
            data,
            pos: 0,
            errored: false,
        }
    }
}

impl<'a> Iterator for Items<'a> {
    type Item = Result<DescriptorItem<'a>, HidError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored || self.pos >= self.data.len() {
            return None;
        }

        let byte0 = self.data[self.pos];
        let long = (byte0 & 0xF0) == 0xF0;

        let (data_len, key_size) = if long {
            match self.data.get(self.pos + 1) {
                Some(&len) => (len as usize, 3),
                None => {
                    self.errored = true;
                    return Some(Err(HidError::MalformedDescriptor));
                }
            }
        } else {
            let data_len = match byte0 & 0x03 {
                0 => 0,
                1 => 1,
                2 => 2,
                3 => 4,
                _ => unreachable!(),
            };
            (data_len, 1)
        };

        let kind = if long { byte0 } else { byte0 & 0xFC };

        let data_start = (self.pos + key_size).min(self.data.len());
        let data_end = (self.pos + key_size + data_len).min(self.data.len());
        let data = &self.data[data_start..data_end];

        self.pos += data_len + key_size;

        Some(Ok(DescriptorItem {
            kind,
            long,
            data_len,
            key_size,
            data,
        }))
    }
}

/// Decode a little-endian unsigned value of 0/1/2/4 bytes as a `u16`
/// (truncating anything wider, matching the platform convention). Any other
/// width - including data clamped short by a truncated descriptor - decodes
/// to 0.
fn decode_u16(data: &[u8]) -> u16 {
    if !matches!(data.len(), 0 | 1 | 2 | 4) {
        return 0;
    }
    let mut buf = [0u8; 4];
    buf[..data.len()].copy_from_slice(data);
    u32::from_le_bytes(buf) as u16
}

/// Iterator over `(usage page, usage)` pairs, one per `Collection` item that
/// had a pending `Usage`.
pub struct UsagePairs<'a> {
    items: Items<'a>,
    usage_page: u16,
    usage: Option<u16>,
    emitted_any: bool,
    done: bool,
}

impl<'a> UsagePairs<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        UsagePairs {
            items: Items::new(data),
            usage_page: 0,
            usage: None,
            emitted_any: false,
            done: false,
        }
    }
}

impl<'a> Iterator for UsagePairs<'a> {
    type Item = Result<(u16, u16), HidError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for item in self.items.by_ref() {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            match item.kind {
                // Usage Page 6.2.2.7 (Global)
                0x04 => self.usage_page = decode_u16(item.data),
                // Usage 6.2.2.8 (Local)
                0x08 => self.usage = Some(decode_u16(item.data)),
                // Collection 6.2.2.4 (Main)
                0xA0 => {
                    if let Some(usage) = self.usage.take() {
                        self.emitted_any = true;
                        return Some(Ok((self.usage_page, usage)));
                    }
                }
                // Input / Output / Feature / End Collection (Main)
                0x80 | 0x90 | 0xB0 | 0xC0 => {
                    self.usage.take();
                }
                _ => {}
            }
        }

        self.done = true;
        if !self.emitted_any {
            if let Some(usage) = self.usage.take() {
                return Some(Ok((self.usage_page, usage)));
            }
        }
        None
    }
}

/// Collect every usage pair in `data`, stopping at the first malformed item.
pub fn usage_pairs(data: &[u8]) -> Result<Vec<(u16, u16)>, HidError> {
    UsagePairs::new(data).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_single_collection() {
        // Usage Page (Generic Desktop), Usage (Mouse), Collection (Application), End Collection
        let data = [0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0xC0];
        let pairs = usage_pairs(&data).unwrap();
        assert_eq!(pairs, vec![(0x0001, 0x0002)]);
    }

    #[test]
    fn s2_nested_collections() {
        let data = [
            0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, 0x05, 0x0C, 0x09, 0x01, 0xA1, 0x02, 0xC0, 0xC0,
        ];
        let pairs = usage_pairs(&data).unwrap();
        assert_eq!(pairs, vec![(0x0001, 0x0006), (0x000C, 0x0001)]);
    }

    #[test]
    fn s3_empty_descriptor() {
        let pairs = usage_pairs(&[]).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn s4_truncated_long_item() {
        let data = [0xF0];
        let err = usage_pairs(&data).unwrap_err();
        assert!(matches!(err, HidError::MalformedDescriptor));
    }

    #[test]
    fn dangling_usage_without_collection_emits_once() {
        // Usage Page, Usage, but no Collection ever follows.
        let data = [0x05, 0x01, 0x09, 0x02];
        let pairs = usage_pairs(&data).unwrap();
        assert_eq!(pairs, vec![(0x0001, 0x0002)]);
    }

    #[test]
    fn dangling_usage_after_a_real_pair_is_not_re_emitted() {
        let data = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0xC0, // one real pair
            0x09, 0x03, // a trailing usage with nothing to close it
        ];
        let pairs = usage_pairs(&data).unwrap();
        assert_eq!(pairs, vec![(0x0001, 0x0002)]);
    }

    #[test]
    fn long_items_are_skipped_but_still_advance() {
        let mut data = vec![0x05, 0x01, 0x09, 0x02];
        data.extend([0xFE, 0x02, 0x00 /* tag */, 0x00, 0x00]); // long item, 2 bytes of data
        data.extend([0xA1, 0x01, 0xC0]);
        let pairs = usage_pairs(&data).unwrap();
        assert_eq!(pairs, vec![(0x0001, 0x0002)]);
    }

    #[test]
    fn truncated_4_byte_value_clamps_data_without_reading_past_end() {
        // Usage Page (4-byte global, size code 3) but the descriptor ends
        // after only 3 of the 4 data bytes: the item's data slice is
        // clamped rather than reading past the buffer, and decoding a
        // clamped (3-byte) value falls back to 0.
        let data = [0x07, 0x01, 0x02, 0x03];
        let mut items = Items::new(&data);
        let item = items.next().unwrap().unwrap();
        assert_eq!(item.kind, 0x04);
        assert_eq!(item.data_len, 4);
        assert_eq!(item.data, &[0x01, 0x02, 0x03]);
        assert_eq!(decode_u16(item.data), 0);
        assert!(items.next().is_none());
    }
}
