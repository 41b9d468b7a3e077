use gallery_checkout::application::session::{
    FailureReason, PaymentSession, PollPolicy, SessionState,
};
use gallery_checkout::domain::order::{Amount, OrderContext};
use gallery_checkout::domain::ports::StatusReport;
use gallery_checkout::error::CheckoutError;
use gallery_checkout::infrastructure::mock::MockGateway;
use rust_decimal_macros::dec;
use std::time::Duration;

fn exhibition_order() -> OrderContext {
    OrderContext::exhibition("ex1", "Modern Art", Amount::new(dec!(1500)).unwrap(), 2).unwrap()
}

fn fast_policy(max_poll_attempts: u32) -> PollPolicy {
    PollPolicy {
        confirmation_grace: Duration::from_millis(1),
        poll_interval: Duration::from_millis(1),
        max_poll_attempts,
    }
}

#[tokio::test]
async fn test_exhibition_booking_pending_then_completed() {
    let gateway = MockGateway::accepting("ws_CO_123")
        .with_statuses([Ok(StatusReport::pending()), Ok(StatusReport::completed())]);
    let order = exhibition_order();
    let mut session = PaymentSession::with_policy(&gateway, &order, "7", fast_policy(24));

    session.submit("0712345678").await.unwrap();
    assert_eq!(*session.state(), SessionState::AwaitingConfirmation);
    assert_eq!(session.checkout_request_id(), Some("ws_CO_123"));

    // The initiation payload carries the normalized phone and order details.
    let requests = gateway.initiated().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].phone_number.as_str(), "254712345678");
    assert_eq!(requests[0].account_reference, "exhibition Payment");
    assert_eq!(requests[0].order_type, "exhibition");
    assert_eq!(requests[0].order_id, "ex1");
    assert_eq!(requests[0].user_id, "7");

    session.poll_once().await.unwrap();
    assert_eq!(*session.state(), SessionState::Polling);
    assert_eq!(session.poll_attempts(), 1);

    session.poll_once().await.unwrap();
    assert_eq!(*session.state(), SessionState::Succeeded);

    let receipt = session.outcome().unwrap();
    assert_eq!(receipt.transaction_id, "ws_CO_123");
    assert_eq!(receipt.order.title, "Modern Art");
}

#[tokio::test]
async fn test_declined_initiation_never_awaits_confirmation() {
    let gateway = MockGateway::declining("Insufficient funds");
    let order = exhibition_order();
    let mut session = PaymentSession::with_policy(&gateway, &order, "7", fast_policy(24));

    session.submit("0712345678").await.unwrap();
    assert_eq!(
        *session.state(),
        SessionState::Failed(FailureReason::Rejected("Insufficient funds".to_string()))
    );

    match session.outcome() {
        Err(CheckoutError::Rejected(message)) => assert_eq!(message, "Insufficient funds"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_polling_ceiling_resolves_to_timeout() {
    // No scripted statuses: the mock reports pending forever.
    let gateway = MockGateway::accepting("ws_CO_123");
    let order = exhibition_order();
    let mut session = PaymentSession::with_policy(&gateway, &order, "7", fast_policy(3));

    session.submit("0712345678").await.unwrap();
    let outcome = session.confirm().await;

    assert!(matches!(outcome, Err(CheckoutError::TimedOut)));
    assert_eq!(
        *session.state(),
        SessionState::Failed(FailureReason::TimedOut)
    );
    assert_eq!(session.poll_attempts(), 3);
}

#[tokio::test]
async fn test_confirm_drives_to_success() {
    let gateway = MockGateway::accepting("ws_CO_123").with_statuses([
        Ok(StatusReport::pending()),
        Ok(StatusReport::pending()),
        Ok(StatusReport::completed()),
    ]);
    let order = exhibition_order();
    let mut session = PaymentSession::with_policy(&gateway, &order, "7", fast_policy(24));

    session.submit("0712345678").await.unwrap();
    let receipt = session.confirm().await.unwrap();

    assert_eq!(receipt.transaction_id, "ws_CO_123");
    assert_eq!(session.poll_attempts(), 2);
}

#[tokio::test]
async fn test_confirm_surfaces_gateway_failure_message() {
    let gateway = MockGateway::accepting("ws_CO_123")
        .with_statuses([Ok(StatusReport::failed("Request cancelled by user"))]);
    let order = exhibition_order();
    let mut session = PaymentSession::with_policy(&gateway, &order, "7", fast_policy(24));

    session.submit("0712345678").await.unwrap();
    match session.confirm().await {
        Err(CheckoutError::Rejected(message)) => {
            assert_eq!(message, "Request cancelled by user");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_confirm_requires_acknowledged_initiation() {
    let gateway = MockGateway::accepting("ws_CO_123");
    let order = exhibition_order();
    let mut session = PaymentSession::with_policy(&gateway, &order, "7", fast_policy(24));

    let result = session.confirm().await;
    assert!(matches!(result, Err(CheckoutError::InvalidState(_))));
    assert_eq!(*session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_retry_with_fresh_session_after_failure() {
    let order = exhibition_order();

    let declining = MockGateway::declining("Insufficient funds");
    let mut first = PaymentSession::with_policy(&declining, &order, "7", fast_policy(24));
    first.submit("0712345678").await.unwrap();
    assert!(matches!(first.state(), SessionState::Failed(_)));

    // The order context is reusable for a fresh attempt.
    let accepting =
        MockGateway::accepting("ws_CO_456").with_statuses([Ok(StatusReport::completed())]);
    let mut second = PaymentSession::with_policy(&accepting, &order, "7", fast_policy(24));
    second.submit("0712345678").await.unwrap();
    let receipt = second.confirm().await.unwrap();
    assert_eq!(receipt.transaction_id, "ws_CO_456");
}
