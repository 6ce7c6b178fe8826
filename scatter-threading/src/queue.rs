use std::fmt;

/// A finite, pre-populated queue of work items shared by all workers of one run.
///
/// The queue is filled once on construction and closed immediately afterwards, so no work can
/// be added while workers drain it. Taking an item is an atomic check-and-take: two workers never
/// receive the same item and no item is dropped.
pub struct WorkQueue<A> {
    rx: flume::Receiver<A>,
    enqueued: usize,
}

impl<A> WorkQueue<A> {
    /// Creates a queue holding all items of the given iterator, in iteration order.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = A>,
    {
        let (tx, rx) = flume::unbounded();

        let mut enqueued = 0;
        for item in items {
            // The receiver is alive for the duration of this loop.
            let _ = tx.send(item);
            enqueued += 1;
        }

        // Dropping the sender closes the queue.
        drop(tx);

        Self { rx, enqueued }
    }

    /// Takes the next item without blocking.
    ///
    /// Returns `None` once the queue is exhausted. Since the queue is closed on construction,
    /// `None` is final and is the only signal a worker needs to stop.
    pub fn try_take(&self) -> Option<A> {
        self.rx.try_recv().ok()
    }

    /// Returns the number of items still waiting in the queue.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns `true` if no items are waiting in the queue.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Returns the total number of items this queue was created with.
    pub fn enqueued(&self) -> usize {
        self.enqueued
    }

    /// Returns the number of items that have been taken from the queue so far.
    pub fn taken(&self) -> usize {
        self.enqueued - self.len()
    }
}

impl<A> FromIterator<A> for WorkQueue<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<A> fmt::Debug for WorkQueue<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("enqueued", &self.enqueued)
            .field("remaining", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_empty_queue() {
        let queue = WorkQueue::<u32>::new([]);
        assert!(queue.is_empty());
        assert_eq!(queue.enqueued(), 0);
        assert_eq!(queue.try_take(), None);
    }

    #[test]
    fn test_take_in_order_until_exhausted() {
        let queue: WorkQueue<_> = ["a", "b", "c"].into_iter().collect();
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.try_take(), Some("a"));
        assert_eq!(queue.taken(), 1);
        assert_eq!(queue.try_take(), Some("b"));
        assert_eq!(queue.try_take(), Some("c"));

        assert_eq!(queue.try_take(), None);
        // Exhaustion is final.
        assert_eq!(queue.try_take(), None);
        assert_eq!(queue.taken(), 3);
        assert_eq!(queue.enqueued(), 3);
    }

    #[test]
    fn test_concurrent_take_hands_out_each_item_once() {
        let queue = Arc::new(WorkQueue::new(0..10_000u32));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    let mut taken = Vec::new();
                    while let Some(item) = queue.try_take() {
                        taken.push(item);
                    }
                    taken
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut total = 0;
        for handle in handles {
            for item in handle.join().unwrap() {
                assert!(seen.insert(item), "item {item} taken twice");
                total += 1;
            }
        }

        assert_eq!(total, 10_000);
        assert_eq!(queue.taken(), queue.enqueued());
    }

    #[test]
    fn test_debug_reports_counts() {
        let queue = WorkQueue::new([1, 2]);
        queue.try_take();
        insta::assert_debug_snapshot!(queue, @r###"
        WorkQueue {
            enqueued: 2,
            remaining: 1,
        }
        "###);
    }
}
