use clap::{Parser, ValueEnum};
use gallery_checkout::application::session::{PaymentSession, PollPolicy, SessionState};
use gallery_checkout::domain::order::{Amount, OrderContext, OrderKind};
use gallery_checkout::domain::phone::PhoneNumber;
use gallery_checkout::domain::ports::{PaymentGateway, StatusReport};
use gallery_checkout::infrastructure::http::HttpGateway;
use gallery_checkout::infrastructure::mock::MockGateway;
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum ItemType {
    Artwork,
    Exhibition,
}

/// Runs a single M-PESA checkout attempt for a gallery order.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Id of the artwork or exhibition being paid for
    #[arg(long)]
    item_id: String,

    /// Display title of the item
    #[arg(long)]
    title: String,

    /// Whether this pays for an artwork purchase or an exhibition booking
    #[arg(long, value_enum)]
    item_type: ItemType,

    /// Number of exhibition slots to book (exhibition only)
    #[arg(long)]
    slots: Option<u32>,

    /// Amount in KSh
    #[arg(long)]
    amount: Decimal,

    /// M-PESA phone number (e.g. 07XXXXXXXX or 254XXXXXXXXX)
    #[arg(long)]
    phone: String,

    /// Id of the paying user
    #[arg(long, default_value = "0")]
    payer_id: String,

    /// Base URL of the storefront backend
    #[arg(long, conflicts_with = "mock", required_unless_present = "mock")]
    base_url: Option<String>,

    /// Use a scripted in-process gateway instead of the network
    #[arg(long)]
    mock: bool,

    /// Grace period before the first status check, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    grace_ms: u64,

    /// Delay between status checks, in milliseconds
    #[arg(long, default_value_t = 5_000)]
    poll_ms: u64,

    /// Maximum number of status checks before giving up
    #[arg(long, default_value_t = 24)]
    max_polls: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let amount = Amount::new(cli.amount).into_diagnostic()?;
    let order = match cli.item_type {
        ItemType::Artwork => {
            if cli.slots.is_some() {
                return Err(miette!("slots only apply to exhibition bookings"));
            }
            OrderContext::artwork(cli.item_id, cli.title, amount)
        }
        ItemType::Exhibition => {
            let slots = cli
                .slots
                .ok_or_else(|| miette!("exhibition bookings require --slots"))?;
            OrderContext::exhibition(cli.item_id, cli.title, amount, slots).into_diagnostic()?
        }
    };

    println!("Order: {}", order.title);
    match &order.kind {
        OrderKind::Artwork => println!("Type: Artwork Purchase"),
        OrderKind::Exhibition { slots } => {
            println!("Type: Exhibition Booking");
            println!("Slots: {slots}");
        }
    }
    println!("Total Amount: KSh {}", order.amount);

    let phone = PhoneNumber::normalize(&cli.phone);
    if !phone.is_valid() {
        tracing::warn!(%phone, "phone number does not look like a valid M-PESA number");
    }

    let gateway: Box<dyn PaymentGateway> = if cli.mock {
        // Scripted happy path: one pending check, then confirmation.
        Box::new(
            MockGateway::accepting("ws_CO_DEV")
                .with_statuses([Ok(StatusReport::pending()), Ok(StatusReport::completed())]),
        )
    } else {
        let base_url = cli
            .base_url
            .ok_or_else(|| miette!("--base-url is required without --mock"))?;
        Box::new(HttpGateway::new(base_url).into_diagnostic()?)
    };

    let policy = PollPolicy {
        confirmation_grace: Duration::from_millis(cli.grace_ms),
        poll_interval: Duration::from_millis(cli.poll_ms),
        max_poll_attempts: cli.max_polls,
    };
    let mut session = PaymentSession::with_policy(gateway.as_ref(), &order, cli.payer_id, policy);

    session.submit(&cli.phone).await.into_diagnostic()?;
    let receipt = if *session.state() == SessionState::AwaitingConfirmation {
        println!("STK push sent. Check your phone and enter your M-PESA PIN.");
        session.confirm().await.into_diagnostic()?
    } else {
        session.outcome().into_diagnostic()?
    };

    println!("Payment confirmed: {}", receipt.transaction_id);
    Ok(())
}
