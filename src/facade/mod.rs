//! Proxy facade for in-process interception.
//!
//! A [`Proxy`] stands in for a target object. Each external call becomes one
//! [`MethodInvocation`] over the chain cached for that method, and the
//! target's outcome is handed back unchanged.
//!
//! # Example
//!
//! ```ignore
//! use interpose::facade::ProxyFactory;
//!
//! let proxy = ProxyFactory::new(Arc::new(Calculator))
//!     .with_advisor(Advisor::new(MethodPattern::parse("Calculate.*")?, logging_advice("LogAspect")))
//!     .with_registry(registry)
//!     .build()?;
//!
//! let sum = proxy.invoke("add", vec![json!(1), json!(1)])?;
//! ```

pub mod context;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::advice::Advisor;
use crate::chain::AdviceChain;
use crate::config::ProxyConfig;
use crate::error::{AopError, InvocationError};
use crate::interfaces::Target;
use crate::invocation::{InvocationResult, Method, MethodInvocation, Value};
use crate::registry::AdviceSourceRegistry;

use context::ExposedProxy;

/// Builder for [`Proxy`].
pub struct ProxyFactory {
    target: Option<Arc<dyn Target>>,
    type_name: String,
    methods: Vec<Method>,
    advisors: Vec<Advisor>,
    registry: Option<Arc<AdviceSourceRegistry>>,
    expose_proxy: bool,
}

impl ProxyFactory {
    /// Proxy an existing target, exposing all of its methods.
    pub fn new(target: Arc<dyn Target>) -> Self {
        Self {
            type_name: target.type_name().to_string(),
            methods: target.methods(),
            target: Some(target),
            advisors: Vec::new(),
            registry: None,
            expose_proxy: false,
        }
    }

    /// Proxy with no target. Calls succeed only if advice supplies a result.
    pub fn for_interface(type_name: impl Into<String>, methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            target: None,
            type_name: type_name.into(),
            methods: methods.into_iter().collect(),
            advisors: Vec::new(),
            registry: None,
            expose_proxy: false,
        }
    }

    pub fn with_advisor(mut self, advisor: Advisor) -> Self {
        self.advisors.push(advisor);
        self
    }

    pub fn with_advisors(mut self, advisors: impl IntoIterator<Item = Advisor>) -> Self {
        self.advisors.extend(advisors);
        self
    }

    /// Pull additional advisors from discovered advice sources at build time.
    pub fn with_registry(mut self, registry: Arc<AdviceSourceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Publish the proxy id to [`context::current_proxy`] during calls.
    pub fn expose_proxy(mut self, expose: bool) -> Self {
        self.expose_proxy = expose;
        self
    }

    pub fn with_config(self, config: &ProxyConfig) -> Self {
        self.expose_proxy(config.expose_proxy)
    }

    pub fn build(self) -> Result<Proxy, AopError> {
        let mut advisors = self.advisors;
        if let Some(registry) = &self.registry {
            advisors.extend(registry.resolve_advice()?);
        }
        let candidates = advisors.len();
        advisors.retain(|advisor| advisor.pointcut().matches_type(&self.type_name));

        let mut methods: HashMap<String, Vec<Arc<Method>>> = HashMap::new();
        for method in self.methods {
            methods
                .entry(method.name().to_string())
                .or_default()
                .push(Arc::new(method));
        }

        let proxy = Proxy {
            id: Uuid::new_v4(),
            target: self.target,
            type_name: self.type_name,
            methods,
            advisors,
            chains: DashMap::new(),
            expose_proxy: self.expose_proxy,
        };

        debug!(
            proxy_id = %proxy.id,
            target_type = %proxy.type_name,
            candidates,
            advisors = proxy.advisors.len(),
            expose_proxy = proxy.expose_proxy,
            "Built proxy"
        );
        Ok(proxy)
    }
}

/// Stand-in for a target that routes every call through its advice chain.
pub struct Proxy {
    id: Uuid,
    target: Option<Arc<dyn Target>>,
    type_name: String,
    methods: HashMap<String, Vec<Arc<Method>>>,
    advisors: Vec<Advisor>,
    chains: DashMap<Method, Arc<AdviceChain>>,
    expose_proxy: bool,
}

impl Proxy {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn target(&self) -> Option<&Arc<dyn Target>> {
        self.target.as_ref()
    }

    /// Advisors whose type filter accepted this proxy.
    pub fn advisors(&self) -> &[Advisor] {
        &self.advisors
    }

    pub fn is_exposed(&self) -> bool {
        self.expose_proxy
    }

    /// Call a method by name.
    ///
    /// Among overloads, the first declared one accepting the argument count
    /// is chosen.
    pub fn invoke(&self, name: &str, arguments: Vec<Value>) -> InvocationResult {
        let overloads = self.methods.get(name).ok_or_else(|| self.no_such_method(name))?;
        let method = overloads
            .iter()
            .find(|method| method.accepts_arity(arguments.len()))
            .ok_or_else(|| InvocationError::ArgumentMismatch {
                method: name.to_string(),
                target_type: self.type_name.clone(),
                count: arguments.len(),
            })?;
        self.dispatch(Arc::clone(method), arguments)
    }

    /// Call an exact method signature.
    pub fn invoke_method(&self, method: &Method, arguments: Vec<Value>) -> InvocationResult {
        let resolved = self
            .methods
            .get(method.name())
            .and_then(|overloads| overloads.iter().find(|m| m.same_signature(method)))
            .ok_or_else(|| self.no_such_method(&method.to_string()))?;
        self.dispatch(Arc::clone(resolved), arguments)
    }

    /// The chain for `method`, built and cached on first use.
    pub fn advice_chain(&self, method: &Method) -> Arc<AdviceChain> {
        if let Some(chain) = self.chains.get(method) {
            return Arc::clone(chain.value());
        }
        let built = Arc::new(AdviceChain::for_method(&self.advisors, method, &self.type_name));
        Arc::clone(self.chains.entry(method.clone()).or_insert(built).value())
    }

    fn dispatch(&self, method: Arc<Method>, arguments: Vec<Value>) -> InvocationResult {
        let chain = self.advice_chain(&method);
        let _exposed = self.expose_proxy.then(|| ExposedProxy::enter(self.id));

        let mut invocation = MethodInvocation::new(
            self.id,
            self.target.clone(),
            method,
            self.target.as_ref().map(|t| t.type_name().to_string()),
            arguments,
            chain,
        );
        trace!(proxy_id = %self.id, invocation = %invocation, "Dispatching call");
        invocation.proceed()
    }

    fn no_such_method(&self, method: &str) -> InvocationError {
        InvocationError::NoSuchMethod {
            method: method.to_string(),
            target_type: self.type_name.clone(),
        }
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("has_target", &self.target.is_some())
            .field("advisors", &self.advisors.len())
            .field("cached_chains", &self.chains.len())
            .field("expose_proxy", &self.expose_proxy)
            .finish()
    }
}
