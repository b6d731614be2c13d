use core::cmp::Ordering;
use core::iter::Peekable;

/// An iterator overlaying a sorted stream of changes (upserts and deletes) on top of a sorted
/// underlying stream of entries. Both inputs must be ordered by key, ascending.
pub struct OverlayingIterator<U, O>
where
    U: Iterator,
    O: Iterator,
{
    underlying: Peekable<U>,
    overlaid: Peekable<O>,
}

impl<K, V, U, O> OverlayingIterator<U, O>
where
    K: Ord,
    U: Iterator<Item = (K, V)>,
    O: Iterator<Item = (K, Option<V>)>,
{
    pub fn new(underlying: U, overlaid: O) -> Self {
        Self {
            underlying: underlying.peekable(),
            overlaid: overlaid.peekable(),
        }
    }
}

impl<K, V, U, O> Iterator for OverlayingIterator<U, O>
where
    K: Ord,
    U: Iterator<Item = (K, V)>,
    O: Iterator<Item = (K, Option<V>)>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ordering = match (self.underlying.peek(), self.overlaid.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((underlying_key, _)), Some((overlaid_key, _))) => {
                    underlying_key.cmp(overlaid_key)
                }
            };
            match ordering {
                Ordering::Less => return self.underlying.next(),
                Ordering::Equal => {
                    // The change shadows the underlying entry.
                    self.underlying.next();
                }
                Ordering::Greater => {}
            }
            if let Some((key, Some(value))) = self.overlaid.next() {
                return Some((key, value));
            }
        }
    }
}
