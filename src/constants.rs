//! # Constants
//!
//! Defaults for every environment-driven setting, plus the fixed names the
//! operator writes into the cluster.

/// Default port for metrics and health checks
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// How long start-up waits for the health server to bind
pub const DEFAULT_HEALTH_READY_TIMEOUT_SECS: u64 = 10;

/// How often start-up checks whether the health server is bound
pub const DEFAULT_HEALTH_READY_CHECK_MS: u64 = 50;

/// Requeue delay while a bridge waits for its secret or broker
pub const DEFAULT_BRIDGE_POLL_INTERVAL_MS: u64 = 5_000;

/// Interval between dependency worker ticks
pub const DEFAULT_WORKER_SCHEDULE_INTERVAL_SECS: u64 = 5;

/// Requeue delay used when the per-resource backoff state is unavailable
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 30;

/// Error backoff bounds (seconds)
pub const DEFAULT_ERROR_BACKOFF_MIN_SECS: u64 = 1;
pub const DEFAULT_ERROR_BACKOFF_MAX_SECS: u64 = 300;

/// Field manager for server-side apply
pub const DEFAULT_FIELD_MANAGER: &str = "bridge-shard-operator";

/// Finalizer guarding broker teardown
pub const BRIDGE_FINALIZER: &str = "com.redhat.service.bridge/finalizer";

/// Label selecting the bridges (and their secrets) this operator manages
pub const DEFAULT_LABEL_SELECTOR: &str = "app.kubernetes.io/managed-by=bridge-fleet-shard-operator";

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "bridge-fleet-shard-operator";
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";
pub const BRIDGE_ID_LABEL: &str = "com.redhat.service.bridge/bridge-id";
pub const CUSTOMER_ID_LABEL: &str = "com.redhat.service.bridge/customer-id";

/// Annotation selecting the Knative broker implementation
pub const BROKER_CLASS_ANNOTATION: &str = "eventing.knative.dev/broker.class";
pub const KAFKA_BROKER_CLASS: &str = "Kafka";

/// Config map keys read by the Kafka broker class
pub const CONFIG_MAP_BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
pub const CONFIG_MAP_TOPIC_NAME: &str = "default.topic.name";
pub const CONFIG_MAP_PARTITIONS: &str = "default.topic.partitions";
pub const CONFIG_MAP_REPLICATION_FACTOR: &str = "default.topic.replication.factor";
pub const CONFIG_MAP_AUTH_SECRET_NAME: &str = "auth.secret.ref.name";

/// Secret keys the bridge secret must carry
pub const SECRET_BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
pub const SECRET_TOPIC_NAME: &str = "topic.name";

pub const DEFAULT_TOPIC_PARTITIONS: &str = "1";
pub const DEFAULT_TOPIC_REPLICATION_FACTOR: &str = "3";
