use crate::domain::order::Amount;
use crate::domain::phone::PhoneNumber;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Initiation payload sent to the gateway's STK-push endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StkPushRequest {
    pub phone_number: PhoneNumber,
    pub amount: Amount,
    pub account_reference: String,
    pub order_type: String,
    pub order_id: String,
    pub user_id: String,
}

/// Gateway acknowledgement of an initiation request.
///
/// `success` without a `checkout_request_id`, or a populated `error` field,
/// is a business rejection rather than a transport failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateAck {
    #[serde(default)]
    pub success: bool,
    pub checkout_request_id: Option<String>,
    pub response_description: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Failed,
    Pending,
}

/// Result of a status check for an initiated payment.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReport {
    pub status: PaymentStatus,
    pub message: Option<String>,
}

impl StatusReport {
    pub fn completed() -> Self {
        Self {
            status: PaymentStatus::Completed,
            message: None,
        }
    }

    pub fn pending() -> Self {
        Self {
            status: PaymentStatus::Pending,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Failed,
            message: Some(message.into()),
        }
    }
}

/// Thin transport to the payment provider.
///
/// Both operations are single request/response round-trips with no retries;
/// retrying is the payment session's responsibility.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate(&self, request: &StkPushRequest) -> Result<InitiateAck>;
    async fn check_status(&self, checkout_request_id: &str) -> Result<StatusReport>;
}
