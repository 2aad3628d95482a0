//! Producer/consumer coordination over a zero-capacity hand-off channel.
//!
//! ```text
//! calling thread                 worker pool
//! ──────────────                 ───────────
//! produce(&sender) ──send──┐
//!   (blocks until a        ├──► worker 0: for item in receiver { consume }
//!    worker is ready)      ├──► worker 1: for item in receiver { consume }
//!                          └──► worker N: ...
//! drop(sender)  ──────────────► receivers drain and exit
//! join all workers
//! ```
//!
//! Because the channel has no buffer, at most one item per worker plus the one
//! being sent is in flight at any moment.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::num::NonZeroUsize;
use std::panic;
use std::thread;
use tracing::{debug, warn};

use crate::errors::{DetabError, DetabResult};

/// What the producer and every worker returned
#[derive(Debug)]
pub struct PoolOutput<R> {
    /// Result of the producer
    pub produced: DetabResult<()>,
    /// One value per worker, in spawn order
    pub consumed: Vec<R>,
}

/// Number of workers for this machine: one per logical CPU, minus one for the
/// producer, but never fewer than one.
pub fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get().saturating_sub(1)).unwrap_or(NonZeroUsize::MIN)
}

/// Sends `item` to the pool, blocking until a worker takes it
pub fn send<T>(sender: &Sender<T>, item: T) -> DetabResult<()> {
    sender
        .send(item)
        .map_err(|_| DetabError::worker_pool("all workers have exited"))
}

/// Runs `produce` on the calling thread while `worker_count` threads run
/// `consume` against the other end of the channel.
///
/// The channel is closed as soon as `produce` returns, whether it succeeded or
/// not, and the call only returns once every worker has drained the channel and
/// exited. A panicking worker is re-raised on the calling thread.
pub fn produce_sync_consume_async<T, R, P, C>(
    worker_count: NonZeroUsize,
    produce: P,
    consume: C,
) -> PoolOutput<R>
where
    T: Send,
    R: Send,
    P: FnOnce(&Sender<T>) -> DetabResult<()>,
    C: Fn(&Receiver<T>) -> R + Sync,
{
    let (sender, receiver) = bounded::<T>(0);
    let consume = &consume;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(worker_count.get());
        for id in 0..worker_count.get() {
            let receiver = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("detab-worker-{}", id))
                .spawn_scoped(scope, move || {
                    debug!("Worker {} started", id);
                    let output = consume(&receiver);
                    debug!("Worker {} finished", id);
                    output
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    warn!("Failed to spawn worker {}: {}", id, err);
                    break;
                }
            }
        }
        // Only the workers may keep the receiving side alive, so a send fails
        // instead of blocking forever once they are all gone.
        drop(receiver);

        let produced = if handles.is_empty() {
            Err(DetabError::worker_pool("no worker thread could be started"))
        } else {
            debug!("Started {} workers", handles.len());
            produce(&sender)
        };
        drop(sender);

        let consumed = handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(output) => output,
                Err(payload) => panic::resume_unwind(payload),
            })
            .collect();

        PoolOutput { produced, consumed }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn workers(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_default_worker_count_reserves_producer() {
        let expected = num_cpus::get().saturating_sub(1).max(1);
        assert_eq!(default_worker_count().get(), expected);
    }

    #[test]
    fn test_every_item_consumed_exactly_once() {
        for worker_count in [1, 2, 3, 8] {
            let output = produce_sync_consume_async(
                workers(worker_count),
                |sender| {
                    for i in 0..500 {
                        send(sender, i)?;
                    }
                    Ok(())
                },
                |receiver| receiver.iter().collect::<Vec<i32>>(),
            );

            assert!(output.produced.is_ok());
            assert_eq!(output.consumed.len(), worker_count);

            let all: Vec<i32> = output.consumed.into_iter().flatten().collect();
            assert_eq!(all.len(), 500);
            let unique: HashSet<_> = all.iter().copied().collect();
            assert_eq!(unique.len(), 500);
        }
    }

    #[test]
    fn test_concurrent_consumption_on_single_worker() {
        let observed = Mutex::new(Vec::new());
        let output = produce_sync_consume_async(
            workers(1),
            |sender| {
                for i in 1..=5 {
                    send(sender, i)?;
                }
                Ok(())
            },
            |receiver| {
                for i in receiver.iter() {
                    thread::yield_now();
                    observed.lock().unwrap().push(i);
                }
            },
        );

        assert!(output.produced.is_ok());
        assert_eq!(observed.into_inner().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_producer_error_still_shuts_down_pool() {
        let output = produce_sync_consume_async(
            workers(4),
            |_sender: &Sender<u32>| Err(DetabError::invalid_argument("nothing to do")),
            |receiver| receiver.iter().count(),
        );

        assert!(matches!(output.produced, Err(DetabError::InvalidArgument(_))));
        assert_eq!(output.consumed, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_items_sent_before_error_are_processed() {
        let output = produce_sync_consume_async(
            workers(2),
            |sender| {
                send(sender, 1u32)?;
                send(sender, 2u32)?;
                Err(DetabError::worker_pool("producer gave up"))
            },
            |receiver| receiver.iter().sum::<u32>(),
        );

        assert!(output.produced.is_err());
        assert_eq!(output.consumed.iter().sum::<u32>(), 3);
    }

    #[test]
    fn test_handoff_bounds_items_in_flight() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let worker_count = 3;

        produce_sync_consume_async(
            workers(worker_count),
            |sender| {
                for i in 0..60 {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    send(sender, i)?;
                }
                Ok(())
            },
            |receiver| {
                for _ in receiver.iter() {
                    thread::sleep(Duration::from_millis(1));
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            },
        );

        assert!(peak.load(Ordering::SeqCst) <= worker_count + 1);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "worker blew up")]
    fn test_worker_panic_is_propagated() {
        produce_sync_consume_async(
            workers(2),
            |sender| {
                for i in 0..4u8 {
                    if send(sender, i).is_err() {
                        break;
                    }
                }
                Ok(())
            },
            |receiver| {
                if receiver.recv().is_ok() {
                    panic!("worker blew up");
                }
            },
        );
    }
}
