use crate::domain::ports::{InitiateAck, PaymentGateway, StatusReport, StkPushRequest};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

enum InitiateBehavior {
    Accept { checkout_request_id: String },
    Decline { message: String },
    Unreachable,
}

/// Scripted in-memory gateway for tests and the demo CLI.
///
/// Initiation behavior is fixed at construction; status checks consume a
/// queue of scripted outcomes and report `pending` once the queue is empty.
/// Every initiation request is recorded for assertions.
pub struct MockGateway {
    behavior: InitiateBehavior,
    statuses: Mutex<VecDeque<Result<StatusReport>>>,
    requests: Mutex<Vec<StkPushRequest>>,
}

impl MockGateway {
    /// A gateway that acknowledges every initiation with the given id.
    pub fn accepting(checkout_request_id: impl Into<String>) -> Self {
        Self::with_behavior(InitiateBehavior::Accept {
            checkout_request_id: checkout_request_id.into(),
        })
    }

    /// A gateway that declines every initiation with the given message.
    pub fn declining(message: impl Into<String>) -> Self {
        Self::with_behavior(InitiateBehavior::Decline {
            message: message.into(),
        })
    }

    /// A gateway whose initiation call fails at the transport level.
    pub fn unreachable() -> Self {
        Self::with_behavior(InitiateBehavior::Unreachable)
    }

    fn with_behavior(behavior: InitiateBehavior) -> Self {
        Self {
            behavior,
            statuses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues status-check outcomes, served in order.
    pub fn with_statuses(
        mut self,
        statuses: impl IntoIterator<Item = Result<StatusReport>>,
    ) -> Self {
        self.statuses.get_mut().extend(statuses);
        self
    }

    /// The initiation requests seen so far.
    pub async fn initiated(&self) -> Vec<StkPushRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initiate(&self, request: &StkPushRequest) -> Result<InitiateAck> {
        self.requests.lock().await.push(request.clone());

        match &self.behavior {
            InitiateBehavior::Accept {
                checkout_request_id,
            } => Ok(InitiateAck {
                success: true,
                checkout_request_id: Some(checkout_request_id.clone()),
                response_description: Some(
                    "Success. Request accepted for processing".to_string(),
                ),
                error: None,
            }),
            InitiateBehavior::Decline { message } => Ok(InitiateAck {
                success: false,
                checkout_request_id: None,
                response_description: Some(message.clone()),
                error: None,
            }),
            InitiateBehavior::Unreachable => Err(CheckoutError::TransportError(
                "connection refused".to_string(),
            )),
        }
    }

    async fn check_status(&self, _checkout_request_id: &str) -> Result<StatusReport> {
        let mut queue = self.statuses.lock().await;
        queue.pop_front().unwrap_or_else(|| Ok(StatusReport::pending()))
    }
}
