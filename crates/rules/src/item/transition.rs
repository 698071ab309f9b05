//! Per-variant responses to user actions.
//!
//! Each function returns `true` iff an observable field changed.

use tracklogic_core::Action;

use super::{Item, ItemKind};

pub(super) fn apply(item: &mut Item, action: Action) -> bool {
    match item.kind {
        ItemKind::Toggle => toggle(item, action),
        ItemKind::Progressive if item.allow_disabled => progressive_with_disabled(item, action),
        ItemKind::Progressive => progressive(item, action),
        ItemKind::ProgressiveToggle => progressive_toggle(item, action),
        ItemKind::Consumable => consumable(item, action),
        ItemKind::CompositeToggle { .. } => composite(item, action),
        ItemKind::ToggleBadged { .. } => badged(item, action),
        ItemKind::Static | ItemKind::Custom(_) => false,
    }
}

fn stage_count(item: &Item) -> i32 {
    item.stages.len() as i32
}

/// Primary/Next on, Secondary/Prev off, Toggle flips.
fn toggle(item: &mut Item, action: Action) -> bool {
    match action {
        Action::Primary | Action::Next => {
            if item.stage1 > 0 {
                return false;
            }
            item.stage1 = 1;
        }
        Action::Secondary | Action::Prev => {
            if item.stage1 < 1 || !item.allow_disabled {
                return false;
            }
            item.stage1 = 0;
        }
        Action::Toggle | Action::Single => {
            if !item.allow_disabled {
                return false;
            }
            item.stage1 = i32::from(item.stage1 == 0);
        }
    }
    true
}

/// Stage index only; Single always wraps.
fn progressive(item: &mut Item, action: Action) -> bool {
    let len = stage_count(item);
    let mut n = item.stage2;
    match action {
        Action::Primary | Action::Next => {
            n += 1;
            if n >= len {
                n = if item.looping { 0 } else { n - 1 };
            }
        }
        Action::Secondary | Action::Prev => {
            n -= 1;
            if n < 0 {
                n = if item.looping { len - 1 } else { n + 1 };
            }
        }
        Action::Toggle | Action::Single => {
            n += 1;
            if n >= len {
                n = 0;
            }
        }
    }
    if n == item.stage2 {
        return false;
    }
    item.stage2 = n;
    true
}

/// Disabled acts as a virtual stage in front of stage 0.
fn progressive_with_disabled(item: &mut Item, action: Action) -> bool {
    let len = stage_count(item);
    let mut active = item.stage1 != 0;
    let mut n = item.stage2;
    match action {
        Action::Primary | Action::Next => {
            if !active {
                active = true;
            } else {
                n += 1;
                if n >= len {
                    if item.looping {
                        n = 0;
                        active = false;
                    } else {
                        n -= 1;
                    }
                }
            }
        }
        Action::Secondary | Action::Prev => {
            if active && n == 0 {
                active = false;
            } else {
                n -= 1;
                if n < 0 {
                    if item.looping {
                        n = len - 1;
                        active = true;
                    } else {
                        n += 1;
                    }
                }
            }
        }
        Action::Toggle | Action::Single => {
            if !active {
                active = true;
            } else {
                n += 1;
            }
            if n >= len {
                n = 0;
                active = false;
            }
        }
    }
    let a = i32::from(active);
    if a == item.stage1 && n == item.stage2 {
        return false;
    }
    item.stage1 = a;
    item.stage2 = n;
    true
}

/// Primary/Toggle flip the enabled flag, the stage index moves separately.
fn progressive_toggle(item: &mut Item, action: Action) -> bool {
    let len = stage_count(item);
    match action {
        Action::Primary | Action::Toggle => {
            item.stage1 = i32::from(item.stage1 == 0);
            true
        }
        Action::Secondary | Action::Next => {
            let mut n = item.stage2 + 1;
            if n >= len {
                n = if item.looping || action == Action::Secondary {
                    0
                } else {
                    n - 1
                };
            }
            if n == item.stage2 {
                return false;
            }
            item.stage2 = n;
            true
        }
        Action::Prev => {
            let mut n = item.stage2 - 1;
            if n < 0 {
                n = if item.looping { len - 1 } else { n + 1 };
            }
            if n == item.stage2 {
                return false;
            }
            item.stage2 = n;
            true
        }
        Action::Single => {
            let (before1, before2) = (item.stage1, item.stage2);
            if item.stage1 == 0 {
                item.stage1 = 1;
                item.stage2 = 0;
            } else {
                item.stage2 += 1;
                if item.stage2 >= len {
                    item.stage1 = 0;
                    item.stage2 = 0;
                }
            }
            (before1, before2) != (item.stage1, item.stage2)
        }
    }
}

/// Count steps, clamped to `[min, max]`; Single wraps to min past max.
fn consumable(item: &mut Item, action: Action) -> bool {
    let bounded = item.max_count >= 0;
    let n = match action {
        Action::Primary | Action::Next => item.count + item.increment,
        Action::Secondary | Action::Prev => item.count - item.decrement,
        Action::Toggle | Action::Single => {
            let n = item.count + 1;
            if bounded && n > item.max_count {
                item.min_count
            } else {
                n
            }
        }
    };
    let n = super::clamp_count(n, item.min_count, item.max_count);
    if n == item.count {
        return false;
    }
    item.count = n;
    item.stage1 = i32::from(n > 0);
    true
}

/// Primary flips bit 0 (left), Secondary flips bit 1 (right).
fn composite(item: &mut Item, action: Action) -> bool {
    let mut n = item.stage2;
    match action {
        Action::Primary => n ^= 1,
        Action::Secondary => n ^= 2,
        _ => return false,
    }
    if n >= stage_count(item) || n == item.stage2 {
        return false;
    }
    item.stage1 = 1;
    item.stage2 = n;
    true
}

/// Only Secondary does anything: it flips the badge.
fn badged(item: &mut Item, action: Action) -> bool {
    if action != Action::Secondary || !item.allow_disabled {
        return false;
    }
    item.stage1 = i32::from(item.stage1 == 0);
    true
}
