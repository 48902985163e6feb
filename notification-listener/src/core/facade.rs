/*!
Query and command surface used by the host
*/

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::{
    context::ListenerContext,
    distributor::{ChannelSink, NotificationStream},
    error::FacadeError,
    pipeline::{IngestionPipeline, PipelineStats},
    record::{NotificationKey, NotificationRecord},
};
use crate::platform::{Host, InstalledApp, apps};

/// A request arriving over the method channel
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// The answer written back for one method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodResponse {
    Ok(Value),
    Error { code: String, message: String },
}

impl From<Result<Value, FacadeError>> for MethodResponse {
    fn from(result: Result<Value, FacadeError>) -> Self {
        match result {
            Ok(value) => MethodResponse::Ok(value),
            Err(e) => MethodResponse::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }
}

#[derive(Clone)]
pub struct NotificationFacade {
    context: ListenerContext,
    host: Host,
    pipeline: Arc<IngestionPipeline>,
}

impl NotificationFacade {
    pub fn new(context: ListenerContext, host: Host, pipeline: Arc<IngestionPipeline>) -> Self {
        Self {
            context,
            host,
            pipeline,
        }
    }

    pub fn is_access_granted(&self) -> bool {
        self.host.access.is_granted()
    }

    /// Ask the platform for access. Always acknowledged; failures are logged.
    pub fn request_access_grant(&self) {
        if let Err(e) = self.host.access.request_grant() {
            warn!("Access grant request failed: {}", e);
        }
    }

    pub async fn list_all(&self) -> Vec<NotificationRecord> {
        self.context.store.snapshot().await
    }

    pub async fn delete_one(&self, id: i32, post_time: i64) {
        let removed = self.context.store.delete_one(NotificationKey::new(id, post_time)).await;
        info!("Delete {}_{} removed {} record(s)", post_time, id, removed);
    }

    pub async fn delete_all(&self) {
        let removed = self.context.store.delete_all().await;
        info!("Cleared {} notification(s)", removed);
    }

    pub async fn set_allow_list(&self, ids: Vec<String>) {
        self.context.filter.set_allow_list(ids).await;
    }

    /// Open the live stream, evicting any previous subscriber
    pub async fn subscribe(&self) -> NotificationStream {
        let (sink, stream) = ChannelSink::new("event-stream");
        self.context.distributor.subscribe(Box::new(sink)).await;
        stream
    }

    pub async fn unsubscribe(&self) {
        self.context.distributor.unsubscribe().await;
    }

    /// Enumerate installed applications on a worker, off the calling task
    pub async fn installed_apps(&self) -> Result<Vec<InstalledApp>, FacadeError> {
        Ok(apps::enumerate(self.host.catalog.clone()).await?)
    }

    pub fn stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    /// Dispatch a method call by its wire name
    pub async fn handle_method_call(&self, call: &MethodCall) -> Result<Value, FacadeError> {
        debug!("Method call {}", call.method);

        match call.method.as_str() {
            "isNotificationServiceEnabled" => Ok(Value::Bool(self.is_access_granted())),
            "openNotificationSettings" => {
                self.request_access_grant();
                Ok(Value::Bool(true))
            }
            "getAllNotifications" => {
                let records = self.list_all().await;
                Ok(Value::String(serde_json::to_string(&records)?))
            }
            "deleteNotification" => {
                let (id, post_time) = delete_arguments(&call.arguments)?;
                self.delete_one(id, post_time).await;
                Ok(Value::Bool(true))
            }
            "deleteAllNotifications" => {
                self.delete_all().await;
                Ok(Value::Bool(true))
            }
            "getInstalledApps" => Ok(serde_json::to_value(self.installed_apps().await?)?),
            "setSelectedApps" => {
                let ids = source_list_argument(&call.arguments)?;
                self.set_allow_list(ids).await;
                Ok(Value::Bool(true))
            }
            "getStats" => Ok(serde_json::to_value(self.stats())?),
            other => Err(FacadeError::NotImplemented(other.to_string())),
        }
    }
}

fn delete_arguments(arguments: &Value) -> Result<(i32, i64), FacadeError> {
    let id = arguments
        .get("id")
        .and_then(Value::as_i64)
        .and_then(|id| i32::try_from(id).ok());
    let post_time = arguments.get("postTime").and_then(Value::as_i64);

    match (id, post_time) {
        (Some(id), Some(post_time)) => Ok((id, post_time)),
        _ => Err(FacadeError::InvalidArgument(
            "deleteNotification requires integer `id` and `postTime`".to_string(),
        )),
    }
}

fn source_list_argument(arguments: &Value) -> Result<Vec<String>, FacadeError> {
    arguments
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| {
            FacadeError::InvalidArgument(
                "setSelectedApps requires a list of source identifiers".to_string(),
            )
        })
}
