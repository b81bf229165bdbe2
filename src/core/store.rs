//! Backing content store interface and a generator-backed implementation.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::warn;

use super::coord::Coord;
use super::dimensions::RenderingMode;
use super::storage::Resource;

/// Content delivered for one coordinate.
///
/// `content: None` means "use the resource parked under `storage_id`", or
/// under the coordinate-derived id when no explicit one is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub x: i64,
    pub y: i64,
    pub content: Option<String>,
    pub storage_id: Option<String>,
}

impl ContentEntry {
    pub fn text(x: i64, y: i64, content: impl Into<String>) -> Self {
        Self {
            x,
            y,
            content: Some(content.into()),
            storage_id: None,
        }
    }

    /// Entry pointing at a parked resource.
    pub fn stored(x: i64, y: i64, storage_id: Option<String>) -> Self {
        Self {
            x,
            y,
            content: None,
            storage_id,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    /// Id of the resource this entry refers to.
    pub fn storage_key(&self) -> String {
        self.storage_id
            .clone()
            .unwrap_or_else(|| self.coord().storage_id())
    }
}

/// One response from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub entries: Vec<ContentEntry>,
    /// Resources to park before the entries are applied.
    pub resources: Vec<Resource>,
}

/// External content provider addressed by `"x_y"` keys.
///
/// Entries of a delivery need not follow request order nor cover every
/// requested key.
pub trait ContentStore: Send + Sync + 'static {
    fn get_content(&self, coordinates: Vec<String>) -> impl Future<Output = Delivery> + Send;

    /// Best-effort hint that a resource is no longer referenced.
    fn release_storage_resource(&self, id: &str);

    /// Drop every cached resource.
    fn reset_storage(&self);
}

// ───────────────────────────────────────── generator store ───

pub type Generator = Arc<dyn Fn(i64, i64) -> Option<String> + Send + Sync>;

/// Store that computes content from closures.
///
/// With a resource generator installed, every entry is delivered as null
/// content plus a parked resource, and the ids handed out are tracked so
/// release hints can be observed.
pub struct GeneratorStore {
    text: Generator,
    resources: Option<Generator>,
    latency: Duration,
    live: Mutex<HashSet<String>>,
}

impl GeneratorStore {
    pub fn new(text: impl Fn(i64, i64) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            text: Arc::new(text),
            resources: None,
            latency: Duration::ZERO,
            live: Mutex::new(HashSet::new()),
        }
    }

    /// `(x, y)` labels for every cell.
    pub fn labels() -> Self {
        Self::new(|x, y| Some(format!("({x}, {y})")))
    }

    /// Content shaped for a rendering mode: labels for plain text, a bold
    /// label for raw markup, the `[[x]], [[y]]` template for binding.
    pub fn for_mode(mode: RenderingMode) -> Self {
        match mode {
            RenderingMode::PlainText => Self::labels(),
            RenderingMode::RawContent => Self::new(|x, y| Some(format!("<b>{x}</b>, {y}"))),
            RenderingMode::StructuredBinding => Self::new(|_, _| Some("[[x]], [[y]]".to_string())),
        }
    }

    pub fn with_resources(
        mut self,
        resources: impl Fn(i64, i64) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.resources = Some(Arc::new(resources));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Resource ids delivered and not yet released, sorted.
    pub fn live_resources(&self) -> Vec<String> {
        let live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = live.iter().cloned().collect();
        ids.sort();
        ids
    }

    fn generate(&self, coordinates: &[String]) -> Delivery {
        let mut delivery = Delivery::default();
        for key in coordinates {
            let coord: Coord = match key.parse() {
                Ok(c) => c,
                Err(e) => {
                    warn!("skipping request key: {e}");
                    continue;
                }
            };
            if let Some(resources) = &self.resources {
                let Some(payload) = resources(coord.x, coord.y) else {
                    continue;
                };
                let id = coord.storage_id();
                delivery.resources.push(Resource {
                    id: id.clone(),
                    payload,
                });
                delivery.entries.push(ContentEntry::stored(coord.x, coord.y, Some(id)));
            } else if let Some(content) = (self.text)(coord.x, coord.y) {
                delivery.entries.push(ContentEntry::text(coord.x, coord.y, content));
            }
        }
        if !delivery.resources.is_empty() {
            let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
            live.extend(delivery.resources.iter().map(|r| r.id.clone()));
        }
        delivery
    }
}

impl ContentStore for GeneratorStore {
    async fn get_content(&self, coordinates: Vec<String>) -> Delivery {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.generate(&coordinates)
    }

    fn release_storage_resource(&self, id: &str) {
        self.live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
    }

    fn reset_storage(&self) {
        self.live.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_defaults_to_coordinate() {
        assert_eq!(ContentEntry::stored(5, 5, None).storage_key(), "id5_5");
        assert_eq!(
            ContentEntry::stored(5, 5, Some("custom".into())).storage_key(),
            "custom"
        );
    }

    #[tokio::test]
    async fn labels_cover_requested_keys() {
        let store = GeneratorStore::labels();
        let delivery = store
            .get_content(vec!["1_2".into(), "bogus".into(), "0_0".into()])
            .await;
        assert_eq!(
            delivery.entries,
            vec![ContentEntry::text(1, 2, "(1, 2)"), ContentEntry::text(0, 0, "(0, 0)")]
        );
        assert!(delivery.resources.is_empty());
    }

    #[tokio::test]
    async fn generator_may_skip_cells() {
        let store = GeneratorStore::new(|x, _| (x % 2 == 0).then(|| x.to_string()));
        let delivery = store.get_content(vec!["1_0".into(), "2_0".into()]).await;
        assert_eq!(delivery.entries, vec![ContentEntry::text(2, 0, "2")]);
    }

    #[tokio::test]
    async fn resources_are_tracked_until_released() {
        let store = GeneratorStore::labels().with_resources(|x, y| Some(format!("btn {x}/{y}")));
        let delivery = store.get_content(vec!["3_4".into(), "5_6".into()]).await;
        assert_eq!(delivery.entries[0].content, None);
        assert_eq!(delivery.resources[0].payload, "btn 3/4");
        assert_eq!(store.live_resources(), vec!["id3_4", "id5_6"]);

        store.release_storage_resource("id3_4");
        assert_eq!(store.live_resources(), vec!["id5_6"]);
        store.reset_storage();
        assert!(store.live_resources().is_empty());
    }

    #[test]
    fn mode_shaped_content() {
        let store = GeneratorStore::for_mode(RenderingMode::StructuredBinding);
        let d = store.generate(&["7_8".to_string()]);
        assert_eq!(d.entries[0].content.as_deref(), Some("[[x]], [[y]]"));
        let store = GeneratorStore::for_mode(RenderingMode::RawContent);
        let d = store.generate(&["7_8".to_string()]);
        assert_eq!(d.entries[0].content.as_deref(), Some("<b>7</b>, 8"));
    }
}
