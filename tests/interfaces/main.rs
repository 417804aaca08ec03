//! Interface tests for composite promise actions using Cucumber.
//!
//! ```bash
//! cargo test --test interfaces --features test-utils
//! ```

mod steps;

use cucumber::World;
use steps::promise::PromiseWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Promise Action Interface Tests ===\n");
    PromiseWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("tests/interfaces/features/promise.feature")
        .await;
}
