//! Advice-source discovery with process-lifetime caching.
//!
//! The registry scans the component inventory once for advice sources and
//! caches what it learns:
//!
//! - Singleton-clause sources backed by a singleton component: the extracted
//!   advisor list itself.
//! - Everything else: the instance factory, so later resolutions re-extract
//!   against a fresh instance instead of pinning a stale one.
//!
//! Discovery is double-checked. The common path takes a read lock on the
//! discovery state and replays the caches. The first caller takes the scan
//! lock, re-checks, scans, and publishes the id list.

mod factory;

pub use factory::InventoryInstanceFactory;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::advice::Advisor;
use crate::error::{AopError, DiscoveryError};
use crate::interfaces::{AdviceMetadataParser, ComponentInventory};

type Eligibility = dyn Fn(&str) -> bool + Send + Sync;

/// Result of the one-time scan.
#[derive(Debug, Clone)]
enum DiscoveryState {
    Pending,
    Ready(Arc<[String]>),
}

/// Discovers advice sources in a component inventory and caches them.
pub struct AdviceSourceRegistry {
    inventory: Arc<dyn ComponentInventory>,
    parser: Arc<dyn AdviceMetadataParser>,
    eligibility: Arc<Eligibility>,
    include: Vec<Regex>,
    state: RwLock<DiscoveryState>,
    scan_lock: Mutex<()>,
    advice_cache: DashMap<String, Vec<Advisor>>,
    factory_cache: DashMap<String, Arc<InventoryInstanceFactory>>,
}

impl AdviceSourceRegistry {
    pub fn new(inventory: Arc<dyn ComponentInventory>, parser: Arc<dyn AdviceMetadataParser>) -> Self {
        Self {
            inventory,
            parser,
            eligibility: Arc::new(|_: &str| true),
            include: Vec::new(),
            state: RwLock::new(DiscoveryState::Pending),
            scan_lock: Mutex::new(()),
            advice_cache: DashMap::new(),
            factory_cache: DashMap::new(),
        }
    }

    /// Restrict discovery to component ids accepted by `predicate`.
    pub fn with_eligibility<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.eligibility = Arc::new(predicate);
        self
    }

    /// Restrict discovery to component ids matching at least one regex.
    ///
    /// An empty list leaves every component eligible.
    pub fn with_include_patterns(mut self, patterns: &[String]) -> Result<Self, AopError> {
        self.include = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| AopError::IncludePattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// All advisors from every discovered source, in discovery order.
    pub fn resolve_advice(&self) -> Result<Vec<Advisor>, DiscoveryError> {
        if let Some(ids) = self.ready_ids() {
            return self.replay(&ids);
        }

        let _scan = self.scan_lock.lock();
        if let Some(ids) = self.ready_ids() {
            return self.replay(&ids);
        }
        self.scan()
    }

    /// Ids of the discovered sources, once discovery has completed.
    pub fn discovered_sources(&self) -> Option<Vec<String>> {
        self.ready_ids().map(|ids| ids.to_vec())
    }

    fn ready_ids(&self) -> Option<Arc<[String]>> {
        match &*self.state.read() {
            DiscoveryState::Ready(ids) => Some(Arc::clone(ids)),
            DiscoveryState::Pending => None,
        }
    }

    fn is_eligible(&self, id: &str) -> bool {
        (self.eligibility)(id)
            && (self.include.is_empty() || self.include.iter().any(|re| re.is_match(id)))
    }

    /// Rebuild the advisor list from the caches.
    fn replay(&self, ids: &[String]) -> Result<Vec<Advisor>, DiscoveryError> {
        let mut advisors = Vec::new();
        for id in ids {
            if let Some(cached) = self.advice_cache.get(id) {
                advisors.extend(cached.iter().cloned());
                continue;
            }
            // Release the map guard before extraction runs user code
            let factory = self.factory_cache.get(id).map(|f| Arc::clone(f.value()));
            if let Some(factory) = factory {
                advisors.extend(self.parser.extract_advice(factory.as_ref())?);
            }
        }
        Ok(advisors)
    }

    /// Walk the inventory. Caller holds the scan lock.
    fn scan(&self) -> Result<Vec<Advisor>, DiscoveryError> {
        let mut ids: Vec<String> = Vec::new();
        let mut advisors = Vec::new();

        for id in self.inventory.list_candidates() {
            if !self.is_eligible(&id) {
                debug!(source = %id, "Skipping ineligible component");
                continue;
            }
            let Some(source_type) = self.inventory.type_of(&id) else {
                debug!(source = %id, "Skipping component with unresolvable type");
                continue;
            };
            if !self.parser.is_advice_source(&source_type) {
                continue;
            }

            let instantiation = self.parser.instantiation(&source_type);
            let singleton = self.inventory.is_singleton(&id);

            if !instantiation.is_per_call() {
                if let Some(cached) = self.advice_cache.get(&id) {
                    advisors.extend(cached.iter().cloned());
                    ids.push(id);
                    continue;
                }

                let factory = Arc::new(InventoryInstanceFactory::new(
                    Arc::clone(&self.inventory),
                    id.clone(),
                    source_type,
                ));
                let extracted = self.parser.extract_advice(factory.as_ref())?;
                debug!(
                    source = %id,
                    advisors = extracted.len(),
                    cached = if singleton { "advice" } else { "factory" },
                    "Discovered advice source"
                );

                if singleton {
                    self.advice_cache
                        .entry(id.clone())
                        .or_insert_with(|| extracted.clone());
                } else {
                    self.factory_cache.entry(id.clone()).or_insert(factory);
                }
                advisors.extend(extracted);
            } else {
                if singleton {
                    warn!(
                        source = %id,
                        instantiation = %instantiation,
                        "Per-call advice source is backed by a singleton"
                    );
                    return Err(DiscoveryError::Configuration {
                        source_id: id,
                        instantiation,
                    });
                }

                let factory = Arc::clone(
                    self.factory_cache
                        .entry(id.clone())
                        .or_insert_with(|| {
                            Arc::new(InventoryInstanceFactory::new(
                                Arc::clone(&self.inventory),
                                id.clone(),
                                source_type,
                            ))
                        })
                        .value(),
                );
                let extracted = self.parser.extract_advice(factory.as_ref())?;
                debug!(
                    source = %id,
                    instantiation = %instantiation,
                    advisors = extracted.len(),
                    "Discovered per-call advice source"
                );
                advisors.extend(extracted);
            }

            ids.push(id);
        }

        info!(
            sources = ids.len(),
            advisors = advisors.len(),
            "Advice source discovery complete"
        );
        *self.state.write() = DiscoveryState::Ready(ids.into());
        Ok(advisors)
    }
}

impl fmt::Debug for AdviceSourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceSourceRegistry")
            .field("state", &*self.state.read())
            .field("include", &self.include)
            .field("cached_advice", &self.advice_cache.len())
            .field("cached_factories", &self.factory_cache.len())
            .finish()
    }
}
