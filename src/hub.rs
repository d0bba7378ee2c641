//! Realtime dashboard hub: fan-out of invocation frames to every connected websocket client.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

/// Frame type for a method invocation.
pub const INVOCATION: u8 = 1;

/// Messages buffered per client before the slowest ones start dropping.
pub const DEFAULT_CAPACITY: usize = 256;

pub const DASHBOARD_EVENT: &str = "ReceiveDashboardUpdate";

/// Client-invocable methods and the event each one rebroadcasts as.
const CLIENT_METHODS: &[(&str, &str)] = &[
    ("SendDashboardUpdate", DASHBOARD_EVENT),
    ("SendStudentUpdate", "ReceiveStudentUpdate"),
    ("SendCourseUpdate", "ReceiveCourseUpdate"),
    ("SendDepartmentUpdate", "ReceiveDepartmentUpdate"),
    ("SendFeesUpdate", "ReceiveFeesUpdate"),
    ("SendExamUpdate", "ReceiveExamUpdate"),
    ("SendUserUpdate", "ReceiveUserUpdate"),
];

/// `{"type":1,"target":"ReceiveStudentUpdate","arguments":[...]}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    #[serde(rename = "type")]
    pub kind: u8,
    pub target: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl HubMessage {
    pub fn invocation(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        HubMessage {
            kind: INVOCATION,
            target: target.into(),
            arguments,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum HubError {
    #[error("unknown hub method: {0}")]
    UnknownMethod(String),
    #[error("{method} expects {expected} argument(s), got {got}")]
    Arity {
        method: String,
        expected: usize,
        got: usize,
    },
    #[error("unsupported frame type {0}")]
    FrameType(u8),
}

/// The event a client method rebroadcasts as.
pub fn event_for_method(method: &str) -> Option<&'static str> {
    CLIENT_METHODS.iter().find(|(m, _)| *m == method).map(|(_, e)| *e)
}

/// Cheap to clone; every clone publishes to the same subscribers.
#[derive(Clone)]
pub struct Hub {
    tx: broadcast::Sender<HubMessage>,
}

impl Default for Hub {
    fn default() -> Self {
        Hub::new(DEFAULT_CAPACITY)
    }
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Hub { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HubMessage> {
        self.tx.subscribe()
    }

    /// Fire-and-forget. Returns how many clients were connected.
    pub fn publish(&self, target: &str, arguments: Vec<Value>) -> usize {
        let n = self.tx.send(HubMessage::invocation(target, arguments)).unwrap_or(0);
        tracing::debug!(event = %target, receivers = n, "hub publish");
        n
    }

    /// A client invoked `Send…Update`: rebroadcast it to everyone as the matching `Receive…` event.
    pub fn dispatch(&self, msg: HubMessage) -> Result<usize, HubError> {
        if msg.kind != INVOCATION {
            return Err(HubError::FrameType(msg.kind));
        }
        let event = event_for_method(&msg.target).ok_or_else(|| HubError::UnknownMethod(msg.target.clone()))?;
        let expected = if event == DASHBOARD_EVENT { 2 } else { 1 };
        if msg.arguments.len() != expected {
            return Err(HubError::Arity {
                method: msg.target,
                expected,
                got: msg.arguments.len(),
            });
        }
        Ok(self.publish(event, msg.arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frame_shape() {
        let m = HubMessage::invocation("ReceiveStudentUpdate", vec![json!({ "student_id": 1 })]);
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({ "type": 1, "target": "ReceiveStudentUpdate", "arguments": [{ "student_id": 1 }] })
        );
    }

    #[tokio::test]
    async fn client_send_is_rebroadcast_as_receive() {
        let hub = Hub::default();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        let sent = hub
            .dispatch(HubMessage::invocation("SendCourseUpdate", vec![json!({ "course_id": 3 })]))
            .unwrap();
        assert_eq!(sent, 2);
        assert_eq!(a.recv().await.unwrap().target, "ReceiveCourseUpdate");
        assert_eq!(b.recv().await.unwrap().arguments, vec![json!({ "course_id": 3 })]);
    }

    #[test]
    fn dashboard_update_takes_type_and_data() {
        let hub = Hub::default();
        let ok = HubMessage::invocation("SendDashboardUpdate", vec![json!("created"), json!({})]);
        assert_eq!(hub.dispatch(ok), Ok(0));
        let short = HubMessage::invocation("SendDashboardUpdate", vec![json!("created")]);
        assert!(matches!(hub.dispatch(short), Err(HubError::Arity { expected: 2, .. })));
    }

    #[test]
    fn unknown_methods_are_rejected() {
        let hub = Hub::default();
        let err = hub.dispatch(HubMessage::invocation("DropTables", vec![])).unwrap_err();
        assert_eq!(err, HubError::UnknownMethod("DropTables".into()));
    }

    #[test]
    fn publish_without_clients_is_fine() {
        assert_eq!(Hub::default().publish("ReceiveExamUpdate", vec![]), 0);
    }
}
