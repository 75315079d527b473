//! Debug introspection
//!
//! Dumps a device's structure state as text: geometry, size, one line per
//! chain node, and, for the tail node only, its occupied slots with their
//! buffer addresses. Read-only; holds the device guard for the duration of
//! the enumeration.

use std::fmt::Write;

use crate::device::Device;

/// Render one device's chain state
pub fn dump_device(device: &Device) -> String {
    let state = device.lock();
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "Device {}: qset {}, quantum {}, size {}",
        device.index(),
        state.qset,
        state.quantum,
        state.size
    );

    let node_count = state.chain.len();
    for (i, node) in state.chain.iter().enumerate() {
        if node.has_slots() {
            let _ = writeln!(out, "  item {i}: {} slots", node.slot_count());
        } else {
            let _ = writeln!(out, "  item {i}: slots unallocated");
        }

        // Dump only the last item's occupied slots
        if i + 1 == node_count {
            for (slot, quantum) in node.occupied_slots() {
                let _ = writeln!(out, "    {slot:4}: {:p}", quantum.as_ptr());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::geometry::GeometryDefaults;

    #[test]
    fn dump_shows_geometry_and_tail_slots() {
        let config = Config::builder().quantum(8).qset(2).build();
        let device = Device::new(3, GeometryDefaults::new(&config));

        // itemsize = 16; land a quantum in node 1, slot 1
        device.write_at(24, &b"zz".as_slice()).unwrap();

        let dump = dump_device(&device);
        assert!(dump.starts_with("Device 3: qset 2, quantum 8, size 26"));
        assert!(dump.contains("item 0: slots unallocated"));
        assert!(dump.contains("item 1: 2 slots"));
        // Exactly one occupied slot listed, in the tail node
        assert_eq!(dump.matches("   1: 0x").count(), 1);
    }
}
