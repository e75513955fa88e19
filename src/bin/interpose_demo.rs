//! interpose-demo: proxied calculator
//!
//! Builds a calculator proxy whose advice comes from two places: a logging
//! aspect discovered in an in-memory inventory, and a retry advisor declared
//! directly on the factory. Then makes a few calls and logs the results.
//!
//! ## Configuration
//! - `--config <path>` or INTERPOSE_CONFIG: YAML configuration file
//! - INTERPOSE__*: configuration overrides, e.g. INTERPOSE__PROXY__EXPOSE_PROXY=true
//! - INTERPOSE_LOG: log filter (default: info)

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};

use interpose::advice::{logging_advice, RetryAdvice};
use interpose::catalog::{Aspect, AspectCatalog, InMemoryInventory};
use interpose::interfaces::{Instantiation, SourceType, Target};
use interpose::utils::bootstrap::{init_tracing, load_config};
use interpose::{
    AdviceSourceRegistry, Advisor, InvocationResult, MetadataError, Method, MethodPattern, ParamType,
    ProxyFactory, Value,
};

#[derive(Debug, thiserror::Error)]
#[error("division by zero")]
struct DivideByZero;

struct Calculate;

impl Target for Calculate {
    fn type_name(&self) -> &str {
        "Calculate"
    }

    fn methods(&self) -> Vec<Method> {
        vec![
            Method::new("Calculate", "add").with_params([ParamType::Int, ParamType::Int]),
            Method::new("Calculate", "div").with_params([ParamType::Int, ParamType::Int]),
        ]
    }

    fn invoke(&self, method: &Method, arguments: &[Value]) -> InvocationResult {
        let a = arguments.first().and_then(Value::as_i64).unwrap_or_default();
        let b = arguments.get(1).and_then(Value::as_i64).unwrap_or_default();
        match method.name() {
            "add" => Ok(json!(a + b)),
            "div" if b == 0 => Err(Box::new(DivideByZero)),
            "div" => Ok(json!(a / b)),
            other => Err(format!("unsupported method {other}").into()),
        }
    }
}

struct LogAspect;

impl Aspect for LogAspect {
    fn advisors(self: Arc<Self>) -> Result<Vec<Advisor>, MetadataError> {
        Ok(vec![Advisor::new(MethodPattern::parse("Calculate.*")?, logging_advice("LogAspect"))])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();
    let config = load_config(std::env::args())?;

    let inventory = Arc::new(InMemoryInventory::new());
    inventory.register_singleton("logAspect", SourceType::new("LogAspect"), || LogAspect);
    let catalog = AspectCatalog::new().register::<LogAspect>("LogAspect", Instantiation::Singleton);
    let registry = Arc::new(
        AdviceSourceRegistry::new(inventory, Arc::new(catalog))
            .with_include_patterns(&config.aspects.include)?,
    );

    let retry = RetryAdvice::new(config.retry.clone())
        .when(|failure| failure.downcast_ref::<DivideByZero>().is_none())
        .into_advice();

    let proxy = ProxyFactory::new(Arc::new(Calculate))
        .with_config(&config.proxy)
        .with_registry(registry)
        .with_advisor(Advisor::new(MethodPattern::parse("Calculate.*")?, retry).with_order(1))
        .build()?;

    info!(proxy = ?proxy, "interpose-demo started");

    let sum = proxy.invoke("add", vec![json!(1), json!(1)])?;
    info!(result = %sum, "add(1, 1)");

    let quotient = proxy.invoke("div", vec![json!(9), json!(3)])?;
    info!(result = %quotient, "div(9, 3)");

    if let Err(failure) = proxy.invoke("div", vec![json!(1), json!(0)]) {
        error!(error = %failure, "div(1, 0) failed");
    }

    Ok(())
}
