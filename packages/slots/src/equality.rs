//! Content equality between two records.
//!
//! The slot label is not part of the comparison, and bindings are matched by
//! position so insertion order does not matter. An absent layer order or
//! layer name compares equal to an empty one.

use bytes::Bytes;
use serde::Serialize;

use crate::record::{LayerBindings, SlotRecord};

/// First difference found between two records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Mismatch {
    LayerCount { left: usize, right: usize },
    LayerOrder,
    LayerName { layer: usize },
    BindingCount { layer: usize, left: usize, right: usize },
    Binding { layer: usize, position: u16 },
}

fn blob(value: Option<&Bytes>) -> &[u8] {
    value.map(|b| &b[..]).unwrap_or(&[])
}

fn diff_bindings(layer: usize, left: &LayerBindings, right: &LayerBindings) -> Option<Mismatch> {
    if left.len() != right.len() {
        return Some(Mismatch::BindingCount {
            layer,
            left: left.len(),
            right: right.len(),
        });
    }

    left.iter().find_map(|binding| {
        let same = right
            .get(binding.position)
            .is_some_and(|other| other.payload == binding.payload);
        (!same).then_some(Mismatch::Binding {
            layer,
            position: binding.position,
        })
    })
}

/// Compare layer order, layer names, and bindings.
pub fn diff(left: &SlotRecord, right: &SlotRecord) -> Option<Mismatch> {
    if left.layer_count() != right.layer_count() {
        return Some(Mismatch::LayerCount {
            left: left.layer_count(),
            right: right.layer_count(),
        });
    }

    if blob(left.layer_order()) != blob(right.layer_order()) {
        return Some(Mismatch::LayerOrder);
    }

    for layer in 0..left.layer_count() {
        if blob(left.layer_name(layer)) != blob(right.layer_name(layer)) {
            return Some(Mismatch::LayerName { layer });
        }
    }

    (0..left.layer_count())
        .find_map(|layer| diff_bindings(layer, left.bindings(layer), right.bindings(layer)))
}

pub fn records_equal(left: &SlotRecord, right: &SlotRecord) -> bool {
    diff(left, right).is_none()
}

/// A slot is active when it is occupied and matches the live keymap. Two
/// empty records are never considered a match.
pub fn is_active(candidate: &SlotRecord, system: &SlotRecord) -> bool {
    if candidate.is_free() || system.is_free() {
        return false;
    }
    records_equal(candidate, system)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SlotRecord {
        SlotRecord::new(2)
            .with_layer_order(vec![0u8, 1])
            .with_binding(0, 5, vec![0xAA, 0x01])
            .unwrap()
            .with_binding(0, 6, vec![0x02])
            .unwrap()
    }

    #[test]
    fn name_is_ignored() {
        let a = base().with_name("left");
        let b = base().with_name("right");
        assert!(records_equal(&a, &b));
        assert!(records_equal(&a, &base()));
    }

    #[test]
    fn equality_is_reflexive_and_symmetric() {
        let a = base();
        let b = base().with_binding(1, 1, vec![9]).unwrap();
        assert!(records_equal(&a, &a));
        assert_eq!(records_equal(&a, &b), records_equal(&b, &a));
        assert!(!records_equal(&a, &b));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = SlotRecord::new(1)
            .with_binding(0, 1, vec![1])
            .unwrap()
            .with_binding(0, 2, vec![2])
            .unwrap();
        let backward = SlotRecord::new(1)
            .with_binding(0, 2, vec![2])
            .unwrap()
            .with_binding(0, 1, vec![1])
            .unwrap();
        assert!(records_equal(&forward, &backward));
    }

    #[test]
    fn missing_blob_equals_empty_blob() {
        let absent = SlotRecord::new(1).with_binding(0, 1, vec![1]).unwrap();
        let empty = absent.clone().with_layer_order(Bytes::new());
        assert!(records_equal(&absent, &empty));
    }

    #[test]
    fn reports_first_difference() {
        let a = base();

        let order = base().with_layer_order(vec![1u8, 0]);
        assert_eq!(diff(&a, &order), Some(Mismatch::LayerOrder));

        let named = base().with_layer_name(1, &b"nav"[..]).unwrap();
        assert_eq!(diff(&a, &named), Some(Mismatch::LayerName { layer: 1 }));

        let payload = base().with_binding(0, 6, vec![0x03]).unwrap();
        assert_eq!(
            diff(&a, &payload),
            Some(Mismatch::Binding {
                layer: 0,
                position: 6
            })
        );

        let moved = SlotRecord::new(2)
            .with_layer_order(vec![0u8, 1])
            .with_binding(0, 5, vec![0xAA, 0x01])
            .unwrap()
            .with_binding(0, 7, vec![0x02])
            .unwrap();
        assert_eq!(
            diff(&a, &moved),
            Some(Mismatch::Binding {
                layer: 0,
                position: 6
            })
        );

        assert!(matches!(
            diff(&a, &SlotRecord::new(3)),
            Some(Mismatch::LayerCount { left: 2, right: 3 })
        ));
    }

    #[test]
    fn free_records_are_never_active() {
        let free = SlotRecord::new(2);
        assert!(records_equal(&free, &free));
        assert!(!is_active(&free, &free));
        assert!(!is_active(&base(), &free));
        assert!(!is_active(&free, &base()));
        assert!(is_active(&base().with_name("x"), &base()));
    }
}
