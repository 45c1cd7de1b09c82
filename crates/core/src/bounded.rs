//! Fixed-capacity column views with an overflow indicator.

use serde::{Deserialize, Serialize};

/// How many items a [`BoundedView`] left out.
///
/// Serialized as `0` for [`Overflow::None`], the count for [`Overflow::Count`]
/// and `true` for [`Overflow::All`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OverflowRepr", into = "OverflowRepr")]
pub enum Overflow {
    /// Nothing was cut.
    #[default]
    None,
    /// This many trailing items were cut.
    Count(usize),
    /// Capacity was negative: the whole column is reported as overflowing.
    All,
}

impl Overflow {
    /// Hidden item count, when one is known.
    pub fn count(&self) -> Option<usize> {
        match self {
            Overflow::None => Some(0),
            Overflow::Count(n) => Some(*n),
            Overflow::All => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OverflowRepr {
    Flag(bool),
    Count(usize),
}

impl From<OverflowRepr> for Overflow {
    fn from(repr: OverflowRepr) -> Self {
        match repr {
            OverflowRepr::Flag(true) => Overflow::All,
            OverflowRepr::Flag(false) | OverflowRepr::Count(0) => Overflow::None,
            OverflowRepr::Count(n) => Overflow::Count(n),
        }
    }
}

impl From<Overflow> for OverflowRepr {
    fn from(overflow: Overflow) -> Self {
        match overflow {
            Overflow::None => OverflowRepr::Count(0),
            Overflow::Count(n) => OverflowRepr::Count(n),
            Overflow::All => OverflowRepr::Flag(true),
        }
    }
}

/// A column capped at a display capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedView<T> {
    pub items: Vec<T>,
    pub overflow: Overflow,
}

impl<T> Default for BoundedView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            overflow: Overflow::None,
        }
    }
}

impl<T> BoundedView<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Keeps the first `max_items` entries of `bucket` in order.
///
/// A negative `max_items` yields no items and [`Overflow::All`], even for an
/// empty bucket. Zero is a valid capacity.
pub fn bound<T>(mut bucket: Vec<T>, max_items: i64) -> BoundedView<T> {
    let Ok(capacity) = usize::try_from(max_items) else {
        return BoundedView {
            items: Vec::new(),
            overflow: Overflow::All,
        };
    };
    if bucket.len() <= capacity {
        return BoundedView {
            items: bucket,
            overflow: Overflow::None,
        };
    }
    let hidden = bucket.len() - capacity;
    bucket.truncate(capacity);
    BoundedView {
        items: bucket,
        overflow: Overflow::Count(hidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bucket_does_not_overflow() {
        let view = bound(Vec::<u32>::new(), 5);
        assert!(view.is_empty());
        assert_eq!(view.overflow, Overflow::None);
        assert_eq!(view.overflow.count(), Some(0));
    }

    #[test]
    fn exactly_full_bucket_does_not_overflow() {
        let view = bound(vec![1, 2, 3, 4, 5], 5);
        assert_eq!(view.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(view.overflow, Overflow::None);
    }

    #[test]
    fn six_into_five_keeps_head_and_counts_one() {
        let view = bound(vec!['A', 'B', 'C', 'D', 'E', 'F'], 5);
        assert_eq!(view.items, vec!['A', 'B', 'C', 'D', 'E']);
        assert_eq!(view.overflow, Overflow::Count(1));
    }

    #[test]
    fn zero_capacity_hides_everything_by_count() {
        let view = bound(vec![1, 2, 3], 0);
        assert!(view.is_empty());
        assert_eq!(view.overflow, Overflow::Count(3));
    }

    #[test]
    fn negative_capacity_reports_flag_and_no_items() {
        let view = bound(vec![1, 2, 3], -1);
        assert!(view.is_empty());
        assert_eq!(view.overflow, Overflow::All);
        assert_eq!(view.overflow.count(), None);

        let view = bound(Vec::<u32>::new(), -1);
        assert!(view.is_empty());
        assert_eq!(view.overflow, Overflow::All);
    }

    #[test]
    fn overflow_wire_format() {
        assert_eq!(serde_json::to_string(&Overflow::None).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Overflow::Count(4)).unwrap(), "4");
        assert_eq!(serde_json::to_string(&Overflow::All).unwrap(), "true");
        assert_eq!(serde_json::from_str::<Overflow>("false").unwrap(), Overflow::None);
        assert_eq!(serde_json::from_str::<Overflow>("true").unwrap(), Overflow::All);
        assert_eq!(serde_json::from_str::<Overflow>("2").unwrap(), Overflow::Count(2));
    }
}
