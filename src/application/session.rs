use crate::domain::order::OrderContext;
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{PaymentGateway, PaymentStatus, StkPushRequest};
use crate::error::{CheckoutError, Result};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

const GENERIC_INITIATE_FAILURE: &str = "Failed to initiate payment";
const GENERIC_STATUS_FAILURE: &str = "Your payment could not be processed. Please try again.";

/// Why a payment attempt ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The gateway declined the payment; carries its message verbatim.
    Rejected(String),
    /// The initiation request never got a usable response.
    Transport(String),
    /// The polling ceiling was reached with the payment still pending.
    TimedOut,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Rejected(message) => f.write_str(message),
            FailureReason::Transport(_) => {
                f.write_str("Failed to process payment. Please try again.")
            }
            FailureReason::TimedOut => {
                f.write_str("Payment confirmation timed out. Please try again.")
            }
        }
    }
}

impl From<FailureReason> for CheckoutError {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::Rejected(message) => CheckoutError::Rejected(message),
            FailureReason::Transport(detail) => CheckoutError::TransportError(detail),
            FailureReason::TimedOut => CheckoutError::TimedOut,
        }
    }
}

/// Lifecycle state of a payment attempt.
///
/// `Succeeded`, `Failed` and `Cancelled` are absorbing: once entered, no
/// later gateway response changes the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitting,
    AwaitingConfirmation,
    Polling,
    Succeeded,
    Failed(FailureReason),
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded | SessionState::Failed(_) | SessionState::Cancelled
        )
    }
}

/// Timing and retry parameters for confirmation polling.
///
/// Defaults mirror the observed checkout flow: a 10s grace period for the
/// payer to act on the device prompt, then 5s between status checks, capped
/// at 24 checks (two minutes of polling). All are deployment parameters.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub confirmation_grace: Duration,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            confirmation_grace: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 24,
        }
    }
}

/// Handed to the caller when a payment attempt succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt<'a> {
    pub order: &'a OrderContext,
    pub transaction_id: String,
}

/// A single checkout attempt against the payment gateway.
///
/// `PaymentSession` owns the lifecycle of one attempt: it normalizes the
/// payer's phone number, submits the initiation request, stores the returned
/// checkout request id, and polls for completion until a terminal state.
///
/// The session borrows its order context and gateway; it never mutates the
/// order and holds no state beyond the attempt itself. Because every
/// operation takes `&mut self`, no two events can race on one attempt and
/// the next poll is only scheduled after the previous one resolves.
pub struct PaymentSession<'a> {
    gateway: &'a dyn PaymentGateway,
    order: &'a OrderContext,
    payer_id: String,
    policy: PollPolicy,
    state: SessionState,
    checkout_request_id: Option<String>,
    poll_attempts: u32,
}

impl<'a> PaymentSession<'a> {
    /// Creates a session in `Idle` with the default polling policy.
    ///
    /// The payer id is an explicit argument rather than an ambient lookup so
    /// the session has no hidden inputs.
    pub fn new(
        gateway: &'a dyn PaymentGateway,
        order: &'a OrderContext,
        payer_id: impl Into<String>,
    ) -> Self {
        Self::with_policy(gateway, order, payer_id, PollPolicy::default())
    }

    pub fn with_policy(
        gateway: &'a dyn PaymentGateway,
        order: &'a OrderContext,
        payer_id: impl Into<String>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            gateway,
            order,
            payer_id: payer_id.into(),
            policy,
            state: SessionState::Idle,
            checkout_request_id: None,
            poll_attempts: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn checkout_request_id(&self) -> Option<&str> {
        self.checkout_request_id.as_deref()
    }

    pub fn poll_attempts(&self) -> u32 {
        self.poll_attempts
    }

    /// Submits the payer's phone number and initiates the STK push.
    ///
    /// Allowed from `Idle`, or from `Failed` to restart the attempt after
    /// corrected input. An empty phone number is an input error and causes
    /// no state transition. On acknowledgement with a checkout request id
    /// the session moves to `AwaitingConfirmation`; a rejection or transport
    /// failure moves it to `Failed`.
    pub async fn submit(&mut self, raw_phone: &str) -> Result<()> {
        if !matches!(self.state, SessionState::Idle | SessionState::Failed(_)) {
            return Err(CheckoutError::InvalidState(format!(
                "submit is not allowed from {:?}",
                self.state
            )));
        }

        let raw_phone = raw_phone.trim();
        if raw_phone.is_empty() {
            return Err(CheckoutError::MissingPhone);
        }

        let phone = PhoneNumber::normalize(raw_phone);
        let request = StkPushRequest {
            phone_number: phone,
            amount: self.order.amount,
            account_reference: self.order.kind.account_reference(),
            order_type: self.order.kind.label().to_string(),
            order_id: self.order.id.clone(),
            user_id: self.payer_id.clone(),
        };

        self.checkout_request_id = None;
        self.poll_attempts = 0;
        self.state = SessionState::Submitting;
        info!(order_id = %self.order.id, "initiating STK push");

        match self.gateway.initiate(&request).await {
            Ok(ack) => {
                if let Some(error) = ack.error {
                    warn!(order_id = %self.order.id, %error, "initiation rejected");
                    self.state = SessionState::Failed(FailureReason::Rejected(error));
                } else if ack.success && ack.checkout_request_id.is_some() {
                    self.checkout_request_id = ack.checkout_request_id;
                    info!(
                        order_id = %self.order.id,
                        checkout_request_id = self.checkout_request_id.as_deref(),
                        "STK push acknowledged"
                    );
                    self.state = SessionState::AwaitingConfirmation;
                } else {
                    let reason = ack
                        .response_description
                        .unwrap_or_else(|| GENERIC_INITIATE_FAILURE.to_string());
                    warn!(order_id = %self.order.id, %reason, "initiation not acknowledged");
                    self.state = SessionState::Failed(FailureReason::Rejected(reason));
                }
            }
            Err(err) => {
                warn!(order_id = %self.order.id, error = %err, "initiation transport failure");
                self.state = SessionState::Failed(FailureReason::Transport(err.to_string()));
            }
        }

        Ok(())
    }

    /// Runs one status check against the gateway.
    ///
    /// `completed` resolves the attempt, `failed` fails it with the gateway
    /// message, and anything else (including a transport error) is transient:
    /// the attempt stays in `Polling` with the attempt counter incremented,
    /// failing with a timeout once the counter reaches the policy ceiling.
    ///
    /// Calling this on a terminal session is a no-op; a late response can
    /// never overwrite an outcome already reached.
    pub async fn poll_once(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            debug!(state = ?self.state, "ignoring poll on resolved attempt");
            return Ok(());
        }
        let Some(checkout_request_id) = self.checkout_request_id.clone() else {
            return Err(CheckoutError::InvalidState(
                "no acknowledged initiation to poll".to_string(),
            ));
        };

        self.state = SessionState::Polling;
        match self.gateway.check_status(&checkout_request_id).await {
            Ok(report) => match report.status {
                PaymentStatus::Completed => {
                    info!(%checkout_request_id, "payment confirmed");
                    self.state = SessionState::Succeeded;
                }
                PaymentStatus::Failed => {
                    let reason = report
                        .message
                        .unwrap_or_else(|| GENERIC_STATUS_FAILURE.to_string());
                    warn!(%checkout_request_id, %reason, "payment failed");
                    self.state = SessionState::Failed(FailureReason::Rejected(reason));
                }
                PaymentStatus::Pending => {
                    debug!(
                        %checkout_request_id,
                        attempt = self.poll_attempts + 1,
                        "payment still pending"
                    );
                    self.note_still_pending();
                }
            },
            Err(err) => {
                // Transient: a flaky status check must not fail the attempt.
                warn!(%checkout_request_id, error = %err, "status check failed, will retry");
                self.note_still_pending();
            }
        }

        Ok(())
    }

    /// User-triggered status check, available once a checkout request id
    /// exists.
    pub async fn manual_status_check(&mut self) -> Result<()> {
        if self.checkout_request_id.is_none() {
            return Err(CheckoutError::InvalidState(
                "no acknowledged initiation to check".to_string(),
            ));
        }
        self.poll_once().await
    }

    /// Cancels the attempt, returning whether the cancellation took effect.
    ///
    /// Only `Idle` and `AwaitingConfirmation` can be cancelled; a cancel
    /// while a submission or poll is mid-flight is a documented no-op.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            SessionState::Idle | SessionState::AwaitingConfirmation => {
                info!(order_id = %self.order.id, "payment cancelled");
                self.state = SessionState::Cancelled;
                true
            }
            _ => false,
        }
    }

    /// Drives an acknowledged attempt to a terminal outcome.
    ///
    /// Sleeps the confirmation grace period (the payer is entering a PIN on
    /// their device), then polls at the policy interval until the attempt
    /// resolves. Dropping the returned future discards every scheduled poll.
    pub async fn confirm(&mut self) -> Result<Receipt<'a>> {
        if self.state != SessionState::AwaitingConfirmation {
            return Err(CheckoutError::InvalidState(
                "confirm requires an acknowledged initiation".to_string(),
            ));
        }

        tokio::time::sleep(self.policy.confirmation_grace).await;
        while !self.state.is_terminal() {
            self.poll_once().await?;
            if self.state.is_terminal() {
                break;
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }

        self.outcome()
    }

    /// Maps a terminal state to the caller-facing result.
    pub fn outcome(&self) -> Result<Receipt<'a>> {
        match &self.state {
            SessionState::Succeeded => {
                let transaction_id = self.checkout_request_id.clone().ok_or_else(|| {
                    CheckoutError::InvalidState(
                        "succeeded without a checkout request id".to_string(),
                    )
                })?;
                Ok(Receipt {
                    order: self.order,
                    transaction_id,
                })
            }
            SessionState::Failed(reason) => Err(reason.clone().into()),
            SessionState::Cancelled => Err(CheckoutError::Cancelled),
            state => Err(CheckoutError::InvalidState(format!(
                "attempt has not resolved yet: {state:?}"
            ))),
        }
    }

    fn note_still_pending(&mut self) {
        self.poll_attempts += 1;
        if self.poll_attempts >= self.policy.max_poll_attempts {
            warn!(
                order_id = %self.order.id,
                attempts = self.poll_attempts,
                "polling ceiling reached, giving up"
            );
            self.state = SessionState::Failed(FailureReason::TimedOut);
        }
    }
}
