//! Black-box tests against the report-descriptor parser through the crate's
//! public surface only, using realistic multi-collection descriptor blobs
//! (a boot-protocol mouse and a consumer-control device with two top-level
//! collections) rather than the single-item grids in the unit tests.

use hidraw_rs::{HidError, Items, UsagePairs};

/// A typical USB boot-protocol mouse: Generic Desktop / Mouse, with a nested
/// Physical collection for the Pointer usage carrying buttons. Per the
/// platform convention (both top-level and nested collection usages are
/// reported, in order), this yields *two* pairs, not one.
const MOUSE_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x03, //     Usage Maximum (3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x03, //     Report Count (3)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Var, Abs)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x05, //     Report Size (5)
    0x81, 0x03, //     Input (Const, Var, Abs)
    0xC0, //         End Collection (Physical)
    0xC0, // End Collection (Application)
];

/// A device exposing a keyboard collection followed by a sibling consumer
/// control collection -- two usage pairs, in descriptor order.
const KEYBOARD_AND_CONSUMER_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input
    0xC0, // End Collection
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0x3C, 0x02, //   Usage Maximum (0x023C)
    0x81, 0x00, //   Input
    0xC0, // End Collection
];

#[test]
fn mouse_descriptor_yields_both_top_level_and_nested_collection_usages() {
    let pairs: Result<Vec<_>, _> = UsagePairs::new(MOUSE_DESCRIPTOR).collect();
    assert_eq!(pairs.unwrap(), vec![(0x0001, 0x0002), (0x0001, 0x0001)]);
}

#[test]
fn keyboard_and_consumer_descriptor_yields_both_pairs_in_order() {
    let pairs: Result<Vec<_>, _> = UsagePairs::new(KEYBOARD_AND_CONSUMER_DESCRIPTOR).collect();
    assert_eq!(pairs.unwrap(), vec![(0x0001, 0x0006), (0x000C, 0x0001)]);
}

#[test]
fn item_iterator_sees_every_item_the_usage_pair_iterator_consumes() {
    // The low-level item stream sees every item (18), while the usage-pair
    // stream only emits for the two Collection items that had a pending
    // Usage -- strictly fewer pairs than items.
    let item_count = Items::new(MOUSE_DESCRIPTOR).count();
    let pair_count = UsagePairs::new(MOUSE_DESCRIPTOR)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
        .len();
    assert!(item_count > pair_count);
}

#[test]
fn malformed_descriptor_surfaces_as_public_error_variant() {
    let data = [0x05, 0x01, 0x09, 0x02, 0xF0];
    let err = UsagePairs::new(&data).collect::<Result<Vec<_>, _>>().unwrap_err();
    assert!(matches!(err, HidError::MalformedDescriptor));
}
