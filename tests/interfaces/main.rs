//! Interface tests for proxy interception using Cucumber.
//!
//! These scenarios describe how a proxied call walks its advice chain and
//! how advice sources are discovered, in terms a reader can check without
//! reading the implementation.
//!
//! ```bash
//! cargo test --test interfaces
//! ```

#[path = "../common/mod.rs"]
mod common;
mod steps;

use cucumber::World;
use steps::advice_chain::AdviceChainWorld;
use steps::discovery::DiscoveryWorld;

#[tokio::main]
async fn main() {
    // Run advice chain tests
    println!("\n=== Running Advice Chain Interface Tests ===\n");
    AdviceChainWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/advice_chain.feature")
        .await;

    // Run discovery tests
    println!("\n=== Running Advice Discovery Interface Tests ===\n");
    DiscoveryWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/advice_discovery.feature")
        .await;
}
