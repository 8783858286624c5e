// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for breakpoint resolution and tick fan-out.

use std::cell::RefCell;
use std::rc::Rc;

use aspect_core::coordinator::{ResizeCoordinator, Tick};
use aspect_core::dataset::BreakpointDataset;
use aspect_core::resolve::{ResolveQuery, resolve};
use aspect_core::trace::Tracer;
use aspect_core::viewport::ViewportMetrics;
use proptest::prelude::*;

fn dataset_strategy() -> impl Strategy<Value = Vec<(u32, u32)>> {
    proptest::collection::vec((0_u32..4000, any::<u32>()), 1..12)
}

fn pixel_ratio_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(1.0), Just(1.5), Just(2.0), Just(3.0), 0.5_f64..4.0]
}

/// Linear scan over the sorted entries, written independently of the
/// resolver's iterator logic.
fn brute_force(entries: &[(u32, u32)], reference: f64, mobile_first: bool) -> u32 {
    let mut sorted: Vec<(u32, u32)> = Vec::new();
    for (k, v) in entries {
        match sorted.iter_mut().find(|(sk, _)| sk == k) {
            Some(slot) => slot.1 = *v,
            None => sorted.push((*k, *v)),
        }
    }
    sorted.sort_by_key(|(k, _)| *k);

    let candidates: Vec<&(u32, u32)> = sorted
        .iter()
        .filter(|(k, _)| {
            if mobile_first {
                f64::from(*k) <= reference
            } else {
                f64::from(*k) >= reference
            }
        })
        .collect();
    let picked = if mobile_first {
        candidates.last()
    } else {
        candidates.first()
    };
    match picked {
        Some((_, v)) => *v,
        None => {
            let (largest_key, largest) = sorted[sorted.len() - 1];
            if reference >= f64::from(largest_key) {
                largest
            } else {
                sorted[0].1
            }
        }
    }
}

proptest! {
    #[test]
    fn non_empty_dataset_always_resolves_to_a_member(
        entries in dataset_strategy(),
        width in 0_u32..8000,
        pixel_ratio in pixel_ratio_strategy(),
        mobile_first in any::<bool>(),
    ) {
        let dataset: BreakpointDataset<u32> = entries.iter().copied().collect();
        let query = ResolveQuery { width, mobile_first, pixel_ratio };
        let got = resolve(&dataset, &query);
        prop_assert!(got.is_some());
        let got = *got.unwrap();
        prop_assert!(dataset.iter().any(|(_, v)| *v == got));
    }

    #[test]
    fn single_entry_is_returned_for_every_viewport(
        key in 0_u32..4000,
        value in any::<u32>(),
        width in 0_u32..8000,
        pixel_ratio in pixel_ratio_strategy(),
        mobile_first in any::<bool>(),
    ) {
        let dataset: BreakpointDataset<u32> = [(key, value)].into_iter().collect();
        let query = ResolveQuery { width, mobile_first, pixel_ratio };
        prop_assert_eq!(resolve(&dataset, &query), Some(&value));
    }

    #[test]
    fn resolver_matches_linear_scan(
        entries in dataset_strategy(),
        width in 0_u32..8000,
        pixel_ratio in pixel_ratio_strategy(),
        mobile_first in any::<bool>(),
    ) {
        let dataset: BreakpointDataset<u32> = entries.iter().copied().collect();
        let query = ResolveQuery { width, mobile_first, pixel_ratio };
        let expected = brute_force(&entries, query.reference_width(), mobile_first);
        prop_assert_eq!(resolve(&dataset, &query), Some(&expected));
    }

    #[test]
    fn every_callback_sees_the_same_snapshot(
        keys in proptest::collection::vec(0_u32..32, 0..20),
        width in 1_u32..5000,
    ) {
        let coord = ResizeCoordinator::new();
        let seen: Rc<RefCell<Vec<(u32, Tick, u32)>>> = Rc::default();
        for key in &keys {
            let seen = Rc::clone(&seen);
            coord.register(
                *key,
                move |key: &u32, metrics: &ViewportMetrics, tick: Tick, _: &mut Tracer<'_>| {
                    seen.borrow_mut().push((*key, tick, metrics.width));
                    Ok(())
                },
            );
        }

        let report = coord
            .dispatch(&ViewportMetrics::new(width, 600, 1.0), &mut Tracer::none())
            .unwrap();

        let mut expected_order: Vec<u32> = Vec::new();
        for key in &keys {
            if !expected_order.contains(key) {
                expected_order.push(*key);
            }
        }

        let seen = seen.borrow();
        prop_assert_eq!(report.invoked, expected_order.len());
        prop_assert_eq!(seen.iter().map(|(k, _, _)| *k).collect::<Vec<_>>(), expected_order);
        prop_assert!(seen.iter().all(|(_, tick, w)| *tick == Tick(1) && *w == width));
    }
}
