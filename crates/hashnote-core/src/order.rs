//! Note sort-order preferences
//!
//! Tracks the preferred sort order for the notes of a set of tags.
//! Preference is based on frecency: past choices decay over time, and an
//! explicitly chosen order weighs far more than one that was merely
//! accepted.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::Tag;

/// Decay applied to every stored weight on each access
const PAST_ORDER_WEIGHT: f32 = 0.9;
/// Weight added when a caller explicitly sets an order
const ORDER_SET_BONUS: f32 = 50.0;
/// Weight added when a caller implicitly accepts the returned order
const ORDER_GET_BONUS: f32 = 10.0;

/// A legal way of ordering notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    AlphaAscending,
    AlphaDescending,
    LastModified,
    FirstModified,
    LastCreated,
    FirstCreated,
}

impl SortOrder {
    pub const DEFAULT: SortOrder = SortOrder::AlphaAscending;

    /// The short code used in preferences and over the wire
    pub fn code(&self) -> &'static str {
        match self {
            SortOrder::AlphaAscending => "aa",
            SortOrder::AlphaDescending => "ad",
            SortOrder::LastModified => "lm",
            SortOrder::FirstModified => "fm",
            SortOrder::LastCreated => "lc",
            SortOrder::FirstCreated => "fc",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aa" => Ok(SortOrder::AlphaAscending),
            "ad" => Ok(SortOrder::AlphaDescending),
            "lm" => Ok(SortOrder::LastModified),
            "fm" => Ok(SortOrder::FirstModified),
            "lc" => Ok(SortOrder::LastCreated),
            "fc" => Ok(SortOrder::FirstCreated),
            other => Err(Error::InvalidInput(format!("invalid sort order: {other}"))),
        }
    }
}

/// Frecency-weighted sort-order preferences per tag group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteOrder {
    weights: HashMap<String, OrderWeights>,
    last: SortOrder,
}

impl NoteOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The preferred order for the notes of a set of tags.
    ///
    /// Accepting the returned order reinforces it slightly for next time.
    pub fn get(&mut self, tags: &[Tag]) -> SortOrder {
        let group = group_name(tags);
        let weights = self.weights.entry(group).or_default();
        self.last = weights.get(self.last);
        self.last
    }

    /// Record an explicit order choice for the notes of a set of tags
    pub fn set(&mut self, tags: &[Tag], order: SortOrder) {
        let group = group_name(tags);
        self.weights.entry(group).or_default().set(order);
        self.last = order;
    }

    /// Drop the preferences of every group mentioning any of the given tags
    pub fn cleanup(&mut self, tags: &[Tag]) {
        self.weights.retain(|group, _| {
            !group
                .split('#')
                .any(|name| tags.iter().any(|tag| tag.name == name))
        });
    }
}

/// A unique name for a group of tags: sorted names joined by `#`
fn group_name(tags: &[Tag]) -> String {
    let mut names: Vec<&str> = tags.iter().map(|tag| tag.name.as_str()).collect();
    names.sort_unstable();
    names.join("#")
}

/// Weights of the different orders for one tag group
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrderWeights(HashMap<SortOrder, f32>);

impl Default for OrderWeights {
    fn default() -> Self {
        let mut weights = HashMap::new();
        weights.insert(SortOrder::DEFAULT, ORDER_GET_BONUS);
        Self(weights)
    }
}

impl OrderWeights {
    /// Decay every weight, reinforce the last accepted order, and return
    /// the heaviest one
    fn get(&mut self, last: SortOrder) -> SortOrder {
        self.reweigh();
        *self.0.entry(last).or_insert(0.0) += ORDER_GET_BONUS;
        self.max()
    }

    /// Decay every weight and give the chosen order the explicit bonus
    fn set(&mut self, order: SortOrder) {
        self.reweigh();
        *self.0.entry(order).or_insert(0.0) += ORDER_SET_BONUS;
    }

    fn max(&self) -> SortOrder {
        let mut max = 0.0_f32;
        let mut best = SortOrder::DEFAULT;
        for (&order, &weight) in &self.0 {
            if weight > max {
                max = weight;
                best = order;
            }
        }
        best
    }

    fn reweigh(&mut self) {
        for weight in self.0.values_mut() {
            *weight *= PAST_ORDER_WEIGHT;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Key, Kind};

    fn tag(name: &str) -> Tag {
        Tag::new(
            name,
            Key::named(Kind::Notebook, "tester"),
            Key::fresh(Kind::Note),
        )
    }

    #[test]
    fn test_default_order() {
        let mut order = NoteOrder::new();
        assert_eq!(order.get(&[tag("a")]), SortOrder::AlphaAscending);
    }

    #[test]
    fn test_set_overrides_default() {
        let mut order = NoteOrder::new();
        let tags = [tag("a"), tag("b")];

        order.set(&tags, SortOrder::LastModified);
        assert_eq!(order.get(&tags), SortOrder::LastModified);
    }

    #[test]
    fn test_groups_are_independent() {
        let mut order = NoteOrder::new();
        order.set(&[tag("a")], SortOrder::LastCreated);

        assert_eq!(order.get(&[tag("b")]), SortOrder::AlphaAscending);
        assert_eq!(order.get(&[tag("a")]), SortOrder::LastCreated);
    }

    #[test]
    fn test_group_name_ignores_tag_order() {
        let mut order = NoteOrder::new();
        order.set(&[tag("a"), tag("b")], SortOrder::FirstCreated);

        assert_eq!(order.get(&[tag("b"), tag("a")]), SortOrder::FirstCreated);
    }

    #[test]
    fn test_explicit_choice_outweighs_accepted_defaults() {
        let mut order = NoteOrder::new();
        let tags = [tag("a")];

        // Accept the default a few times, then set explicitly once
        for _ in 0..3 {
            order.get(&tags);
        }
        order.set(&tags, SortOrder::LastModified);
        assert_eq!(order.get(&tags), SortOrder::LastModified);
    }

    #[test]
    fn test_repeated_gets_decay_old_choice() {
        let mut order = NoteOrder::new();
        let tags = [tag("a")];
        order.set(&tags, SortOrder::LastModified);

        // Keep switching back to the default via a different group, then
        // accept it against this group many times
        for _ in 0..40 {
            order.set(&tags, SortOrder::AlphaAscending);
        }
        assert_eq!(order.get(&tags), SortOrder::AlphaAscending);
    }

    #[test]
    fn test_cleanup_drops_groups_with_tag() {
        let mut order = NoteOrder::new();
        order.set(&[tag("a"), tag("b")], SortOrder::LastModified);
        order.set(&[tag("c")], SortOrder::FirstCreated);

        order.cleanup(&[tag("a")]);

        assert_eq!(order.get(&[tag("a"), tag("b")]), SortOrder::AlphaAscending);
        assert_eq!(order.get(&[tag("c")]), SortOrder::FirstCreated);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("aa".parse::<SortOrder>().unwrap(), SortOrder::AlphaAscending);
        assert_eq!("fc".parse::<SortOrder>().unwrap(), SortOrder::FirstCreated);
        assert!("xx".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_sort_order_display_roundtrip() {
        for order in [
            SortOrder::AlphaAscending,
            SortOrder::AlphaDescending,
            SortOrder::LastModified,
            SortOrder::FirstModified,
            SortOrder::LastCreated,
            SortOrder::FirstCreated,
        ] {
            assert_eq!(order.code().parse::<SortOrder>().unwrap(), order);
        }
    }
}
