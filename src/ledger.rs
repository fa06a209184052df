//! Metrics ledger - append-only result groups plus fire-and-forget telemetry
//!
//! Observations append under `experimentId:variationId:metricName` keys and
//! stay in memory for significance analysis. Every logged record is also
//! offered to a bounded telemetry queue drained by a background worker; a
//! full queue or a failed delivery drops the record with a WARN and nothing
//! else - the in-memory ledger is authoritative, telemetry is best-effort.

use crate::experiment::ResultRecord;
use crate::Result;
use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

#[cfg(feature = "http")]
use crate::Error;

/// Default bound on records waiting for telemetry delivery.
pub const DEFAULT_TELEMETRY_QUEUE_CAPACITY: usize = 1024;

/// Outbound telemetry boundary - one delivery per logged metric.
///
/// Implementations must not assume ordering relative to subsequent ledger
/// calls; delivery is asynchronous and unacknowledged from the caller's
/// point of view.
pub trait TelemetrySink: Send + Sync + 'static {
    /// Deliver one record to the backend.
    fn deliver(&self, record: &ResultRecord) -> impl Future<Output = Result<()>> + Send;
}

/// Sink that discards every record. For tests and metric-less deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    async fn deliver(&self, _record: &ResultRecord) -> Result<()> {
        Ok(())
    }
}

/// HTTP POST sink - one request per record, camelCase JSON body.
#[cfg(feature = "http")]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

#[cfg(feature = "http")]
impl HttpSink {
    /// Create a sink POSTing to the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[cfg(feature = "http")]
impl TelemetrySink for HttpSink {
    async fn deliver(&self, record: &ResultRecord) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::Telemetry(e.to_string()))?;
        Ok(())
    }
}

/// One ledger bucket: every observation logged under a single
/// (experiment, variation, metric) key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGroup {
    experiment_id: String,
    variation_id: String,
    metric_name: String,
    records: Vec<ResultRecord>,
}

impl ResultGroup {
    fn from_records(records: &[ResultRecord]) -> Option<Self> {
        let first = records.first()?;
        Some(Self {
            experiment_id: first.experiment_id().to_string(),
            variation_id: first.variation_id().to_string(),
            metric_name: first.metric_name().to_string(),
            records: records.to_vec(),
        })
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variation ID.
    #[must_use]
    pub fn variation_id(&self) -> &str {
        &self.variation_id
    }

    /// Get the metric name.
    #[must_use]
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Get the appended records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// Observed values, oldest first.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(ResultRecord::value).collect()
    }

    /// Mean of the observed values. Groups are never empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = self.records.len() as f64;
        self.records.iter().map(ResultRecord::value).sum::<f64>() / n
    }
}

fn result_key(experiment_id: &str, variation_id: &str, metric_name: &str) -> String {
    format!("{experiment_id}:{variation_id}:{metric_name}")
}

/// Append-only metrics ledger with a bounded telemetry queue.
pub struct MetricsLedger {
    results: DashMap<String, Vec<ResultRecord>>,
    telemetry: mpsc::Sender<ResultRecord>,
}

impl MetricsLedger {
    /// Create a ledger delivering telemetry through the given sink.
    ///
    /// Spawns the queue worker, so this must be called inside a Tokio
    /// runtime. The worker drains the queue and exits once the ledger is
    /// dropped.
    #[must_use]
    pub fn new<T: TelemetrySink>(sink: Arc<T>, queue_capacity: usize) -> Self {
        let (telemetry, mut receiver) = mpsc::channel::<ResultRecord>(queue_capacity);
        tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                if let Err(error) = sink.deliver(&record).await {
                    warn!(
                        metric = record.metric_name(),
                        %error,
                        "telemetry delivery failed; record dropped"
                    );
                }
            }
        });
        Self {
            results: DashMap::new(),
            telemetry,
        }
    }

    /// Append one observation and enqueue it for telemetry.
    ///
    /// Synchronous and infallible from the caller's point of view: the
    /// ledger write always lands, telemetry is best-effort.
    pub fn log_metric(
        &self,
        experiment_id: &str,
        variation_id: &str,
        metric_name: &str,
        value: f64,
    ) {
        let record = ResultRecord::new(experiment_id, variation_id, metric_name, value);
        self.results
            .entry(result_key(experiment_id, variation_id, metric_name))
            .or_default()
            .push(record.clone());

        if let Err(error) = self.telemetry.try_send(record) {
            warn!(%error, "telemetry queue full; record dropped");
        }
    }

    /// Every result group whose key is prefixed by the experiment id.
    #[must_use]
    pub fn get_results(&self, experiment_id: &str) -> Vec<ResultGroup> {
        let prefix = format!("{experiment_id}:");
        self.results
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .filter_map(|entry| ResultGroup::from_records(entry.value()))
            .collect()
    }

    /// Total number of records appended.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.results.iter().map(|entry| entry.value().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingSink {
        seen: Mutex<Vec<ResultRecord>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl TelemetrySink for RecordingSink {
        async fn deliver(&self, record: &ResultRecord) -> Result<()> {
            self.seen.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl TelemetrySink for FailingSink {
        async fn deliver(&self, _record: &ResultRecord) -> Result<()> {
            Err(crate::Error::Telemetry("backend unreachable".to_string()))
        }
    }

    async fn wait_for_deliveries(sink: &RecordingSink, expected: usize) {
        for _ in 0..200 {
            if sink.count() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {expected} deliveries, saw {}", sink.count());
    }

    #[tokio::test]
    async fn test_log_and_group_results() {
        let ledger = MetricsLedger::new(Arc::new(NoopSink), DEFAULT_TELEMETRY_QUEUE_CAPACITY);

        ledger.log_metric("exp-1", "a", "conversion", 1.0);
        ledger.log_metric("exp-1", "a", "conversion", 0.0);
        ledger.log_metric("exp-1", "b", "conversion", 1.0);
        ledger.log_metric("exp-2", "a", "conversion", 1.0);

        let groups = ledger.get_results("exp-1");
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.experiment_id() == "exp-1"));

        let group_a = groups.iter().find(|g| g.variation_id() == "a").unwrap();
        assert_eq!(group_a.values(), vec![1.0, 0.0]);
        assert!((group_a.mean() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_results_empty_for_unknown_experiment() {
        let ledger = MetricsLedger::new(Arc::new(NoopSink), DEFAULT_TELEMETRY_QUEUE_CAPACITY);
        ledger.log_metric("exp-1", "a", "conversion", 1.0);

        assert!(ledger.get_results("exp-9").is_empty());
    }

    #[tokio::test]
    async fn test_telemetry_delivered_per_record() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = MetricsLedger::new(Arc::clone(&sink), DEFAULT_TELEMETRY_QUEUE_CAPACITY);

        ledger.log_metric("exp-1", "a", "conversion", 1.0);
        ledger.log_metric("exp-1", "b", "conversion", 0.0);

        wait_for_deliveries(&sink, 2).await;
        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].metric_name(), "conversion");
    }

    #[tokio::test]
    async fn test_delivery_failure_leaves_ledger_intact() {
        let ledger = MetricsLedger::new(Arc::new(FailingSink), DEFAULT_TELEMETRY_QUEUE_CAPACITY);

        ledger.log_metric("exp-1", "a", "conversion", 1.0);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(ledger.record_count(), 1);
        assert_eq!(ledger.get_results("exp-1").len(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        // Capacity 1 and a sink that never completes quickly: overflow must
        // drop, not block the caller
        let ledger = MetricsLedger::new(Arc::new(NoopSink), 1);

        for i in 0..50 {
            ledger.log_metric("exp-1", "a", "conversion", f64::from(i));
        }

        assert_eq!(ledger.record_count(), 50);
    }
}
