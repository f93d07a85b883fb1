//! Prints the `ManagedBridge` CustomResourceDefinition as YAML.
//!
//! ```sh
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::CustomResourceExt;
use lifecycle_controller::crd::ManagedBridge;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&ManagedBridge::crd())?);
    Ok(())
}
