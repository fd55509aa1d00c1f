use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::types::SyncError;

use super::fetch::{AssetFetcher, CachedAsset};
use super::manifest::CacheManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Page navigations, which may fall back to the offline page.
    Document,
    Asset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Cache(CachedAsset),
    Network(CachedAsset),
    OfflineFallback(CachedAsset),
}

impl AssetSource {
    pub fn asset(&self) -> &CachedAsset {
        match self {
            AssetSource::Cache(asset)
            | AssetSource::Network(asset)
            | AssetSource::OfflineFallback(asset) => asset,
        }
    }
}

struct Generation {
    manifest: CacheManifest,
    entries: HashMap<String, CachedAsset>,
}

/// Generations of cached assets, at most one of them active.
#[derive(Default)]
pub struct OfflineCache {
    generations: HashMap<String, Generation>,
    active: Option<String>,
}

impl OfflineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_generation(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn generation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.generations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Fetch every required entry into a new generation. The generation is
    /// stored only when all fetches succeed; otherwise nothing changes.
    pub async fn install(
        &mut self,
        manifest: CacheManifest,
        fetcher: &dyn AssetFetcher,
    ) -> Result<(), SyncError> {
        manifest.validate()?;
        if self.generations.contains_key(&manifest.generation) {
            debug!(generation = %manifest.generation, "Cache generation already installed");
            return Ok(());
        }

        let mut entries = HashMap::new();
        for path in manifest.unique_paths() {
            let asset = fetcher.fetch(path).await.map_err(|err| {
                warn!(generation = %manifest.generation, %path, error = %err, "Cache install failed");
                err
            })?;
            if !asset.is_cacheable() {
                return Err(SyncError::Cache(format!(
                    "{path} returned status {} during install",
                    asset.status
                )));
            }
            entries.insert(path.to_string(), asset);
        }

        info!(
            generation = %manifest.generation,
            entries = entries.len(),
            "Cache generation installed"
        );
        self.generations.insert(
            manifest.generation.clone(),
            Generation { manifest, entries },
        );
        Ok(())
    }

    /// Make an installed generation active and delete all others.
    /// Returns the names of the deleted generations.
    pub fn activate(&mut self, generation: &str) -> Result<Vec<String>, SyncError> {
        if !self.generations.contains_key(generation) {
            return Err(SyncError::Cache(format!(
                "generation {generation} is not installed"
            )));
        }

        self.active = Some(generation.to_string());
        let mut removed: Vec<String> = self
            .generations
            .keys()
            .filter(|name| name.as_str() != generation)
            .cloned()
            .collect();
        removed.sort();
        for name in &removed {
            info!(generation = %name, "Deleting old cache generation");
            self.generations.remove(name);
        }
        Ok(removed)
    }

    /// Serve from the active generation, else from the network, storing
    /// successful responses. Document requests fall back to the offline
    /// page when the network is unreachable.
    pub async fn respond(
        &mut self,
        path: &str,
        kind: RequestKind,
        fetcher: &dyn AssetFetcher,
    ) -> Result<AssetSource, SyncError> {
        if let Some(asset) = self.active_entry(path) {
            debug!(%path, "Serving from cache");
            return Ok(AssetSource::Cache(asset.clone()));
        }

        match fetcher.fetch(path).await {
            Ok(asset) => {
                if asset.is_cacheable() {
                    if let Some(generation) = self.active_generation_mut() {
                        generation.entries.insert(path.to_string(), asset.clone());
                    }
                }
                Ok(AssetSource::Network(asset))
            }
            Err(err) => {
                warn!(%path, error = %err, "Network fetch failed");
                if kind == RequestKind::Document {
                    if let Some(fallback) = self.offline_fallback() {
                        return Ok(AssetSource::OfflineFallback(fallback.clone()));
                    }
                }
                Err(err)
            }
        }
    }

    fn active_entry(&self, path: &str) -> Option<&CachedAsset> {
        let active = self.active.as_deref()?;
        self.generations.get(active)?.entries.get(path)
    }

    fn active_generation_mut(&mut self) -> Option<&mut Generation> {
        let active = self.active.as_deref()?;
        self.generations.get_mut(active)
    }

    fn offline_fallback(&self) -> Option<&CachedAsset> {
        let generation = self.generations.get(self.active.as_deref()?)?;
        let path = generation.manifest.offline_fallback.as_deref()?;
        generation.entries.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeNetwork {
        offline: Mutex<bool>,
        missing: Mutex<HashSet<String>>,
        fetched: Mutex<Vec<String>>,
        version: Mutex<String>,
    }

    impl FakeNetwork {
        fn new(version: &str) -> Self {
            let network = Self::default();
            *network.version.lock().unwrap() = version.to_string();
            network
        }

        fn go_offline(&self) {
            *self.offline.lock().unwrap() = true;
        }

        fn fetch_count(&self) -> usize {
            self.fetched.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AssetFetcher for FakeNetwork {
        async fn fetch(&self, path: &str) -> Result<CachedAsset, SyncError> {
            self.fetched.lock().unwrap().push(path.to_string());
            if *self.offline.lock().unwrap() {
                return Err(SyncError::Transport("offline".to_string()));
            }
            if self.missing.lock().unwrap().contains(path) {
                return Ok(CachedAsset {
                    status: 404,
                    content_type: None,
                    body: Vec::new(),
                });
            }
            let body = format!("{path}@{}", self.version.lock().unwrap());
            Ok(CachedAsset::ok(Some("text/html"), body))
        }
    }

    fn manifest(generation: &str) -> CacheManifest {
        CacheManifest::new(
            generation,
            vec![
                "/".to_string(),
                "/offline.html".to_string(),
                "/static/mobile-responsive.css".to_string(),
            ],
        )
        .with_offline_fallback("/offline.html")
    }

    #[tokio::test]
    async fn serves_cache_first_after_activation() {
        let network = FakeNetwork::new("v1");
        let mut cache = OfflineCache::new();
        cache.install(manifest("crm-v1"), &network).await.unwrap();
        cache.activate("crm-v1").unwrap();
        let before = network.fetch_count();

        let served = cache.respond("/", RequestKind::Document, &network).await.unwrap();
        assert!(matches!(served, AssetSource::Cache(_)));
        assert_eq!(served.asset().body, b"/@v1".to_vec());
        assert_eq!(network.fetch_count(), before);
    }

    #[tokio::test]
    async fn failed_install_keeps_previous_generation() {
        let network = FakeNetwork::new("v1");
        let mut cache = OfflineCache::new();
        cache.install(manifest("crm-v1"), &network).await.unwrap();
        cache.activate("crm-v1").unwrap();

        network
            .missing
            .lock()
            .unwrap()
            .insert("/static/mobile-responsive.css".to_string());
        *network.version.lock().unwrap() = "v2".to_string();
        let err = cache.install(manifest("crm-v2"), &network).await.unwrap_err();

        assert!(matches!(err, SyncError::Cache(_)));
        assert_eq!(cache.generation_names(), vec!["crm-v1".to_string()]);
        assert_eq!(cache.active_generation(), Some("crm-v1"));
        assert!(cache.activate("crm-v2").is_err());
    }

    #[tokio::test]
    async fn activation_deletes_older_generations() {
        let network = FakeNetwork::new("v1");
        let mut cache = OfflineCache::new();
        cache.install(manifest("crm-v1"), &network).await.unwrap();
        cache.activate("crm-v1").unwrap();

        *network.version.lock().unwrap() = "v2".to_string();
        cache.install(manifest("crm-v2"), &network).await.unwrap();
        // Both coexist until the new one is activated.
        assert_eq!(cache.generation_names().len(), 2);
        assert_eq!(cache.active_generation(), Some("crm-v1"));

        let removed = cache.activate("crm-v2").unwrap();
        assert_eq!(removed, vec!["crm-v1".to_string()]);
        let served = cache.respond("/", RequestKind::Document, &network).await.unwrap();
        assert_eq!(served.asset().body, b"/@v2".to_vec());
    }

    #[tokio::test]
    async fn network_responses_are_stored() {
        let network = FakeNetwork::new("v1");
        let mut cache = OfflineCache::new();
        cache.install(manifest("crm-v1"), &network).await.unwrap();
        cache.activate("crm-v1").unwrap();

        let first = cache.respond("/clients", RequestKind::Document, &network).await.unwrap();
        assert!(matches!(first, AssetSource::Network(_)));
        let second = cache.respond("/clients", RequestKind::Document, &network).await.unwrap();
        assert!(matches!(second, AssetSource::Cache(_)));
    }

    #[tokio::test]
    async fn error_responses_are_not_stored() {
        let network = FakeNetwork::new("v1");
        let mut cache = OfflineCache::new();
        cache.install(manifest("crm-v1"), &network).await.unwrap();
        cache.activate("crm-v1").unwrap();
        network.missing.lock().unwrap().insert("/gone".to_string());

        for _ in 0..2 {
            let served = cache.respond("/gone", RequestKind::Asset, &network).await.unwrap();
            assert!(matches!(served, AssetSource::Network(ref a) if a.status == 404));
        }
    }

    #[tokio::test]
    async fn offline_documents_get_fallback_page() {
        let network = FakeNetwork::new("v1");
        let mut cache = OfflineCache::new();
        cache.install(manifest("crm-v1"), &network).await.unwrap();
        cache.activate("crm-v1").unwrap();
        network.go_offline();

        let served = cache.respond("/payments", RequestKind::Document, &network).await.unwrap();
        assert!(matches!(served, AssetSource::OfflineFallback(_)));
        assert_eq!(served.asset().body, b"/offline.html@v1".to_vec());

        let err = cache.respond("/static/app.js", RequestKind::Asset, &network).await;
        assert!(matches!(err, Err(SyncError::Transport(_))));
    }

    #[tokio::test]
    async fn fallback_must_be_required() {
        let network = FakeNetwork::new("v1");
        let mut cache = OfflineCache::new();
        let bad = CacheManifest::new("crm-v1", vec!["/".to_string()])
            .with_offline_fallback("/offline.html");
        assert!(matches!(
            cache.install(bad, &network).await,
            Err(SyncError::Cache(_))
        ));
        assert_eq!(network.fetch_count(), 0);
    }
}
