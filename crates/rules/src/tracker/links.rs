//! Composite toggle synchronization.
//!
//! A composite toggle mirrors two other items (the ones providing its left
//! and right codes). Changing the composite pushes its bits onto those
//! items; changing one of them pulls the bit back into the composite.
//! Propagation only writes when a value actually differs, so it settles
//! after at most one hop in each direction.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::item::Item;

/// Propagate a change of `items[actor]` through composite links. Returns the
/// indices of the other items that changed, in the order they changed.
pub(super) fn propagate(items: &mut [Item], actor: usize) -> Vec<usize> {
    let mut changed = Vec::new();
    let mut queue = VecDeque::from([actor]);
    let mut budget = items.len() * 4 + 8;

    while let Some(idx) = queue.pop_front() {
        if budget == 0 {
            warn!(item = %items[actor].id(), "composite propagation did not settle");
            break;
        }
        budget -= 1;

        let mut touched = push_bits(items, idx);
        touched.extend(pull_bits(items, idx));
        for t in touched {
            if t != actor && !changed.contains(&t) {
                changed.push(t);
            }
            queue.push_back(t);
        }
    }
    if !changed.is_empty() {
        debug!(item = %items[actor].id(), dependents = changed.len(), "composite links updated");
    }
    changed
}

/// First non-composite item that can provide `code`.
fn part_for(items: &[Item], code: &str, skip: usize) -> Option<usize> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| {
            *i != skip && item.composite_parts().is_none() && item.can_provide_code(code)
        })
        .map(|(i, _)| i)
}

/// Forward: composite bits onto the part items.
fn push_bits(items: &mut [Item], idx: usize) -> Vec<usize> {
    let Some((left, right)) = items[idx]
        .composite_parts()
        .map(|(l, r)| (l.to_string(), r.to_string()))
    else {
        return Vec::new();
    };
    let bits = items[idx].active_stage();

    let mut touched = Vec::new();
    for (mask, code) in [(1, left), (2, right)] {
        let want = bits & mask != 0;
        let Some(part) = part_for(items, &code, idx) else {
            continue;
        };
        if (items[part].provides_code(&code) > 0) != want && items[part].set_active(want).any() {
            touched.push(part);
        }
    }
    touched
}

/// Backward: part items into every composite that mirrors them.
fn pull_bits(items: &mut [Item], idx: usize) -> Vec<usize> {
    if items[idx].composite_parts().is_some() {
        return Vec::new();
    }

    let mut touched = Vec::new();
    for k in 0..items.len() {
        let Some((left, right)) = items[k]
            .composite_parts()
            .map(|(l, r)| (l.to_string(), r.to_string()))
        else {
            continue;
        };
        if !items[idx].can_provide_code(&left) && !items[idx].can_provide_code(&right) {
            continue;
        }

        let on = |code: &str| {
            part_for(items, code, k)
                .map(|p| items[p].provides_code(code) > 0)
                .unwrap_or(false)
        };
        let bits = i32::from(on(&left)) | (i32::from(on(&right)) << 1);
        if items[k].set_composite_bits(bits).any() {
            touched.push(k);
        }
    }
    touched
}
