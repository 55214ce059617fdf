use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::join_all;
use shared::{
    domain::{AlarmKind, EndpointConfiguration, EndpointName},
    protocol::RemoteOperation,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, warn};

pub mod alarm_codec;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod form;
pub mod http_gateway;
pub mod reconcile;
pub mod sinks;

pub use alarm_codec::AlarmTypeCodec;
pub use connectivity::{is_connectable, EnvironmentProbe, StaticProbe};
pub use error::{EditorError, GatewayError};
pub use form::EditorForm;
pub use http_gateway::HttpGateway;
pub use sinks::{BroadcastNotifier, EventLog, LogEntry, LogSink, Notification, NotificationSink};

/// Configuration record shared between the editor and in-flight operations.
pub type SharedConfiguration = Arc<Mutex<EndpointConfiguration>>;

/// Issues subscription and alarm calls against the device. Each call
/// resolves exactly once.
#[async_trait]
pub trait RemoteOperationGateway: Send + Sync {
    async fn subscribe(&self, endpoint: &EndpointName, interval_seconds: u32) -> Result<()>;
    async fn unsubscribe(&self, endpoint: &EndpointName) -> Result<()>;
    async fn create_alarm(
        &self,
        endpoint: &EndpointName,
        kind: AlarmKind,
        retry_count: u32,
        threshold: f64,
    ) -> Result<()>;
    async fn remove_alarm(&self, endpoint: &EndpointName, kind: AlarmKind) -> Result<()>;
}

pub struct MissingGateway;

#[async_trait]
impl RemoteOperationGateway for MissingGateway {
    async fn subscribe(&self, endpoint: &EndpointName, _interval_seconds: u32) -> Result<()> {
        Err(anyhow!("device gateway unavailable for endpoint {endpoint}"))
    }

    async fn unsubscribe(&self, endpoint: &EndpointName) -> Result<()> {
        Err(anyhow!("device gateway unavailable for endpoint {endpoint}"))
    }

    async fn create_alarm(
        &self,
        endpoint: &EndpointName,
        _kind: AlarmKind,
        _retry_count: u32,
        _threshold: f64,
    ) -> Result<()> {
        Err(anyhow!("device gateway unavailable for endpoint {endpoint}"))
    }

    async fn remove_alarm(&self, endpoint: &EndpointName, _kind: AlarmKind) -> Result<()> {
        Err(anyhow!("device gateway unavailable for endpoint {endpoint}"))
    }
}

/// Refuses every call while the environment is not connectable, without
/// reaching the wrapped gateway.
pub struct ConnectivityGatedGateway {
    inner: Arc<dyn RemoteOperationGateway>,
    probe: Arc<dyn EnvironmentProbe>,
}

impl ConnectivityGatedGateway {
    pub fn new(inner: Arc<dyn RemoteOperationGateway>, probe: Arc<dyn EnvironmentProbe>) -> Self {
        Self { inner, probe }
    }

    fn ensure_connectable(&self) -> Result<()> {
        if is_connectable(self.probe.as_ref()) {
            Ok(())
        } else {
            Err(GatewayError::NotConnectable.into())
        }
    }
}

#[async_trait]
impl RemoteOperationGateway for ConnectivityGatedGateway {
    async fn subscribe(&self, endpoint: &EndpointName, interval_seconds: u32) -> Result<()> {
        self.ensure_connectable()?;
        self.inner.subscribe(endpoint, interval_seconds).await
    }

    async fn unsubscribe(&self, endpoint: &EndpointName) -> Result<()> {
        self.ensure_connectable()?;
        self.inner.unsubscribe(endpoint).await
    }

    async fn create_alarm(
        &self,
        endpoint: &EndpointName,
        kind: AlarmKind,
        retry_count: u32,
        threshold: f64,
    ) -> Result<()> {
        self.ensure_connectable()?;
        self.inner
            .create_alarm(endpoint, kind, retry_count, threshold)
            .await
    }

    async fn remove_alarm(&self, endpoint: &EndpointName, kind: AlarmKind) -> Result<()> {
        self.ensure_connectable()?;
        self.inner.remove_alarm(endpoint, kind).await
    }
}

async fn perform(gateway: &dyn RemoteOperationGateway, op: &RemoteOperation) -> Result<()> {
    match op {
        RemoteOperation::Subscribe {
            endpoint,
            interval_seconds,
        } => gateway.subscribe(endpoint, *interval_seconds).await,
        RemoteOperation::Unsubscribe { endpoint } => gateway.unsubscribe(endpoint).await,
        RemoteOperation::CreateAlarm {
            endpoint,
            kind,
            retry_count,
            threshold,
        } => {
            gateway
                .create_alarm(endpoint, *kind, *retry_count, *threshold)
                .await
        }
        RemoteOperation::RemoveAlarm { endpoint, kind } => {
            gateway.remove_alarm(endpoint, *kind).await
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Applied(RemoteOperation),
    Failed {
        operation: RemoteOperation,
        reason: String,
    },
}

impl OperationOutcome {
    pub fn operation(&self) -> &RemoteOperation {
        match self {
            OperationOutcome::Applied(operation) | OperationOutcome::Failed { operation, .. } => {
                operation
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, OperationOutcome::Applied(_))
    }
}

/// Operations issued by one confirm action. Dropping it does not cancel them.
pub struct Submission {
    pub operations: Vec<RemoteOperation>,
    pub alarm_rejection: Option<EditorError>,
    handles: Vec<JoinHandle<OperationOutcome>>,
}

impl Submission {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Waits for every issued operation, in issue order.
    pub async fn outcomes(self) -> Vec<OperationOutcome> {
        join_all(self.handles)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    warn!("editor: operation task did not complete: {err}");
                    None
                }
            })
            .collect()
    }
}

/// Decides which remote calls a confirmed edit needs, issues them, and
/// records each outcome in the shared configuration.
pub struct ReconciliationEngine {
    gateway: Arc<dyn RemoteOperationGateway>,
    notifier: Arc<dyn NotificationSink>,
    log: Arc<dyn LogSink>,
    codec: AlarmTypeCodec,
}

impl ReconciliationEngine {
    pub fn new(
        gateway: Arc<dyn RemoteOperationGateway>,
        notifier: Arc<dyn NotificationSink>,
        log: Arc<dyn LogSink>,
        codec: AlarmTypeCodec,
    ) -> Self {
        Self {
            gateway,
            notifier,
            log,
            codec,
        }
    }

    pub fn codec(&self) -> &AlarmTypeCodec {
        &self.codec
    }

    pub fn open_editor(
        &self,
        config: &EndpointConfiguration,
        default_interval_raw: &str,
    ) -> EditorForm {
        EditorForm::open(config, default_interval_raw, &self.codec)
    }

    /// Plans and issues the operations for `form`. Returns as soon as they
    /// are spawned; an invalid interval rejects the confirm with nothing
    /// issued.
    pub async fn submit(
        &self,
        config: &SharedConfiguration,
        form: &EditorForm,
    ) -> std::result::Result<Submission, EditorError> {
        let snapshot = config.lock().await.clone();
        let plan = match reconcile::plan(&snapshot, form, &self.codec) {
            Ok(plan) => plan,
            Err(err) => {
                self.report_rejection(snapshot.endpoint(), &err);
                return Err(err);
            }
        };

        if let Some(err) = &plan.alarm_rejection {
            self.report_rejection(snapshot.endpoint(), err);
        }

        let handles = plan
            .operations
            .iter()
            .cloned()
            .map(|op| self.dispatch(Arc::clone(config), op))
            .collect();

        Ok(Submission {
            operations: plan.operations,
            alarm_rejection: plan.alarm_rejection,
            handles,
        })
    }

    fn report_rejection(&self, endpoint: &EndpointName, err: &EditorError) {
        if err.is_user_facing() {
            debug!(endpoint = %endpoint, "editor: rejected input: {err:?}");
            self.notifier.notify(Notification::error(err.to_string()));
        } else {
            error!(endpoint = %endpoint, invariant = true, "editor: {err}");
        }
    }

    fn dispatch(
        &self,
        config: SharedConfiguration,
        op: RemoteOperation,
    ) -> JoinHandle<OperationOutcome> {
        let gateway = Arc::clone(&self.gateway);
        let notifier = Arc::clone(&self.notifier);
        let log = Arc::clone(&self.log);

        tokio::spawn(async move {
            let result = perform(gateway.as_ref(), &op).await;
            settle(&config, op, result, notifier.as_ref(), log.as_ref()).await
        })
    }
}

async fn settle(
    config: &SharedConfiguration,
    op: RemoteOperation,
    result: Result<()>,
    notifier: &dyn NotificationSink,
    log: &dyn LogSink,
) -> OperationOutcome {
    match result {
        Ok(()) => {
            op.apply_to(&mut *config.lock().await);
            let message = op.success_message();
            debug!(endpoint = %op.endpoint(), operation = op.name(), "{message}");
            notifier.notify(Notification::info(message.clone()));
            log.append(LogEntry::info(message));
            OperationOutcome::Applied(op)
        }
        Err(err) => {
            let message = op.failure_message();
            error!(endpoint = %op.endpoint(), operation = op.name(), "{message}: {err:#}");
            notifier.notify(Notification::error(format!("{message}: {err:#}")));
            log.append(LogEntry::error(message));
            OperationOutcome::Failed {
                operation: op,
                reason: format!("{err:#}"),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
