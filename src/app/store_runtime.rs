//! Executes the engine's store commands against a [`ContentStore`].
//!
//! Each fetch runs as its own task so a slow store never blocks the UI; the
//! result comes back over a channel and is handed to the engine on the
//! main loop. Release and reset hints are cheap and run inline.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::fetch::{BatchId, StoreCommand};
use crate::core::store::{ContentStore, Delivery};

#[derive(Debug)]
pub enum StoreUpdate {
    Delivered { batch: BatchId, delivery: Delivery },
}

pub struct StoreRuntime<C: ContentStore> {
    store: Arc<C>,
    tx: mpsc::UnboundedSender<StoreUpdate>,
}

impl<C: ContentStore> StoreRuntime<C> {
    pub fn new(store: Arc<C>) -> (Self, mpsc::UnboundedReceiver<StoreUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { store, tx }, rx)
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub fn execute(&self, commands: Vec<StoreCommand>) {
        for command in commands {
            match command {
                StoreCommand::Fetch(batch) => {
                    let store = Arc::clone(&self.store);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let delivery = store.get_content(batch.keys()).await;
                        // The receiver is gone only when the app is shutting down.
                        let _ = tx.send(StoreUpdate::Delivered {
                            batch: batch.id,
                            delivery,
                        });
                    });
                }
                StoreCommand::Release(id) => {
                    debug!(%id, "release hint");
                    self.store.release_storage_resource(&id);
                }
                StoreCommand::Reset => {
                    debug!("storage reset");
                    self.store.reset_storage();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coord::Coord;
    use crate::core::fetch::FetchBatch;
    use crate::core::store::{ContentEntry, GeneratorStore};

    fn batch(seq: u64, coords: &[(i64, i64)]) -> StoreCommand {
        StoreCommand::Fetch(FetchBatch {
            id: BatchId { epoch: 0, seq },
            coords: coords.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
        })
    }

    #[tokio::test]
    async fn fetch_comes_back_as_update() {
        let (runtime, mut rx) = StoreRuntime::new(Arc::new(GeneratorStore::labels()));
        runtime.execute(vec![batch(3, &[(1, 1), (2, 1)])]);
        let StoreUpdate::Delivered { batch, delivery } = rx.recv().await.unwrap();
        assert_eq!(batch, BatchId { epoch: 0, seq: 3 });
        assert_eq!(
            delivery.entries,
            vec![ContentEntry::text(1, 1, "(1, 1)"), ContentEntry::text(2, 1, "(2, 1)")]
        );
    }

    #[tokio::test]
    async fn release_and_reset_reach_the_store() {
        let store = GeneratorStore::labels().with_resources(|x, y| Some(format!("{x}:{y}")));
        let (runtime, mut rx) = StoreRuntime::new(Arc::new(store));
        runtime.execute(vec![batch(0, &[(0, 0), (1, 0)])]);
        rx.recv().await.unwrap();
        assert_eq!(runtime.store().live_resources(), vec!["id0_0", "id1_0"]);

        runtime.execute(vec![StoreCommand::Release("id0_0".into())]);
        assert_eq!(runtime.store().live_resources(), vec!["id1_0"]);
        runtime.execute(vec![StoreCommand::Reset]);
        assert!(runtime.store().live_resources().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_run_concurrently() {
        let store = GeneratorStore::labels().with_latency(std::time::Duration::from_millis(500));
        let (runtime, mut rx) = StoreRuntime::new(Arc::new(store));
        let started = tokio::time::Instant::now();
        runtime.execute(vec![batch(0, &[(0, 0)]), batch(1, &[(1, 0)])]);
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        assert!(started.elapsed() < std::time::Duration::from_millis(1000));
    }
}
