//! Advice discovery interface step definitions.

use std::sync::Arc;

use cucumber::{given, then, when, World};

use interpose::catalog::{AspectCatalog, InMemoryInventory};
use interpose::interfaces::{Instantiation, SourceType};
use interpose::{AdviceSourceRegistry, DiscoveryError};

use crate::common::{TagAspect, Trace};

/// Test context for advice discovery scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct DiscoveryWorld {
    trace: Trace,
    inventory: Arc<InMemoryInventory>,
    catalog: AspectCatalog,
    registry: Option<Arc<AdviceSourceRegistry>>,
    include: Vec<String>,
    resolved: Vec<Vec<String>>,
    last_error: Option<String>,
}

impl DiscoveryWorld {
    fn new() -> Self {
        Self {
            trace: Trace::new(),
            inventory: Arc::new(InMemoryInventory::new()),
            catalog: AspectCatalog::new(),
            registry: None,
            include: Vec::new(),
            resolved: Vec::new(),
            last_error: None,
        }
    }

    fn registry(&mut self) -> Arc<AdviceSourceRegistry> {
        if self.registry.is_none() {
            let registry = AdviceSourceRegistry::new(self.inventory.clone(), Arc::new(self.catalog.clone()))
                .with_include_patterns(&self.include)
                .expect("Invalid include pattern");
            self.registry = Some(Arc::new(registry));
        }
        Arc::clone(self.registry.as_ref().expect("Registry not built"))
    }
}

fn parse_clause(clause: &str) -> Instantiation {
    match clause {
        "singleton" => Instantiation::Singleton,
        "per-this" => Instantiation::PerThis,
        "per-target" => Instantiation::PerTarget,
        other => panic!("Unknown instantiation clause: {other}"),
    }
}

// --- Given steps ---

#[given(expr = "a {word} aspect {string} of type {string} backed by a {word} component")]
async fn given_aspect(world: &mut DiscoveryWorld, clause: String, id: String, type_name: String, lifecycle: String) {
    let trace = world.trace.clone();
    let tag = id.clone();
    let build = move || TagAspect {
        tag: tag.clone(),
        trace: trace.clone(),
    };
    match lifecycle.as_str() {
        "singleton" => world.inventory.register_singleton(id, SourceType::new(&type_name), build),
        "prototype" => world.inventory.register_prototype(id, SourceType::new(&type_name), build),
        other => panic!("Unknown component lifecycle: {other}"),
    }
    world.catalog = std::mem::take(&mut world.catalog).register::<TagAspect>(type_name, parse_clause(&clause));
}

#[given(expr = "a plain component {string} of type {string}")]
async fn given_plain_component(world: &mut DiscoveryWorld, id: String, type_name: String) {
    world.inventory.register_singleton(id, SourceType::new(type_name), || ());
}

#[given(expr = "a component {string} with no resolvable type")]
async fn given_untyped_component(world: &mut DiscoveryWorld, id: String) {
    world.inventory.register_untyped(id, || ());
}

#[given(expr = "discovery is restricted to ids matching {string}")]
async fn given_include_pattern(world: &mut DiscoveryWorld, pattern: String) {
    world.include.push(pattern);
}

// --- When steps ---

#[when(expr = "advice is resolved {int} time(s)")]
async fn when_resolved(world: &mut DiscoveryWorld, times: usize) {
    let registry = world.registry();
    for _ in 0..times {
        match registry.resolve_advice() {
            Ok(advisors) => {
                let sources = advisors
                    .iter()
                    .filter_map(|advisor| advisor.source().map(str::to_string))
                    .collect();
                world.resolved.push(sources);
                world.last_error = None;
            }
            Err(DiscoveryError::Configuration { source_id, .. }) => {
                world.last_error = Some(format!("configuration error for {source_id}"));
            }
            Err(other) => {
                world.last_error = Some(other.to_string());
            }
        }
    }
}

#[when(expr = "advice is resolved from {int} threads at once")]
async fn when_resolved_concurrently(world: &mut DiscoveryWorld, threads: usize) {
    let registry = world.registry();
    let barrier = std::sync::Barrier::new(threads);
    let results: Vec<Vec<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry
                        .resolve_advice()
                        .expect("Discovery failed")
                        .iter()
                        .filter_map(|advisor| advisor.source().map(str::to_string))
                        .collect::<Vec<String>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("Discovery thread panicked"))
            .collect()
    });
    world.resolved.extend(results);
}

// --- Then steps ---

#[then(expr = "the inventory was scanned {int} time(s)")]
async fn then_scanned(world: &mut DiscoveryWorld, expected: usize) {
    assert_eq!(world.inventory.list_candidate_calls(), expected);
}

#[then(expr = "every resolution yields advice from {string}")]
async fn then_every_resolution_yields(world: &mut DiscoveryWorld, expected: String) {
    let expected: Vec<String> = expected.split(',').map(|s| s.trim().to_string()).collect();
    assert!(!world.resolved.is_empty(), "Nothing was resolved: {:?}", world.last_error);
    for sources in &world.resolved {
        assert_eq!(sources, &expected);
    }
}

#[then(expr = "the discovered sources are {string}")]
async fn then_discovered_sources(world: &mut DiscoveryWorld, expected: String) {
    let expected: Vec<String> = if expected.is_empty() {
        Vec::new()
    } else {
        expected.split(',').map(|s| s.trim().to_string()).collect()
    };
    let registry = world.registry();
    assert_eq!(registry.discovered_sources(), Some(expected));
}

#[then("discovery has not completed")]
async fn then_discovery_pending(world: &mut DiscoveryWorld) {
    let registry = world.registry();
    assert_eq!(registry.discovered_sources(), None);
}

#[then(expr = "discovery fails with {string}")]
async fn then_discovery_fails(world: &mut DiscoveryWorld, expected: String) {
    assert_eq!(world.last_error.as_deref(), Some(expected.as_str()));
}
