use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    spawn_poller, AdminClient, AvailabilityEvent, AvailabilityReconciler, HttpRsvpBackend,
    MenuCatalog, MenuItem, RegistrationDraft, RegistrationSession,
};
use shared::domain::{DishId, PartyType, RsvpId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

const PIX_KEY: &str = "61983000309";

#[derive(Parser, Debug)]
#[command(name = "rsvp", about = "Event RSVP client")]
struct Cli {
    /// Overrides the API root from rsvp.toml and the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch current counts once and print the menu.
    Menu,
    /// Keep polling and reprint the menu whenever counts change.
    Watch,
    /// Register one visitor.
    Register(RegisterArgs),
    /// Organizer tools.
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    /// Dish id or exact dish name.
    #[arg(long)]
    dish: String,
    #[arg(long, default_value = "individual")]
    party: PartyType,
    /// Receipt link for the PIX payment.
    #[arg(long)]
    payment_proof: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    List,
    Dishes,
    Stats,
    Accept { id: i64 },
    Reject { id: i64 },
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }

    match cli.command {
        Command::Menu => menu(&settings).await,
        Command::Watch => watch(&settings).await,
        Command::Register(args) => register(&settings, args).await,
        Command::Admin(command) => admin(&settings, command).await,
    }
}

fn reconciler(settings: &Settings) -> Result<Arc<AvailabilityReconciler>> {
    let backend = HttpRsvpBackend::new(&settings.api_url, settings.request_timeout())?;
    Ok(AvailabilityReconciler::new(
        &MenuCatalog::default(),
        Arc::new(backend),
        settings.reconciler_config(),
    ))
}

fn print_menu(items: &[MenuItem]) {
    for item in items {
        let status = if item.available() {
            format!("{} left", item.remaining())
        } else {
            "unavailable".to_string()
        };
        let (shown, hidden) = item.recent_selectors_display();
        let mut line = format!(
            "{:>3}  {:<32} {}/{}  {}",
            item.id().0,
            item.name(),
            item.confirmed_count(),
            item.capacity(),
            status
        );
        if !shown.is_empty() {
            line.push_str(&format!("  [{}", shown.join(", ")));
            if hidden > 0 {
                line.push_str(&format!(" +{hidden}"));
            }
            line.push(']');
        }
        println!("{line}");
    }
}

async fn menu(settings: &Settings) -> Result<()> {
    let reconciler = reconciler(settings)?;
    reconciler
        .poll()
        .await
        .with_context(|| format!("could not load counts from {}", settings.api_url))?;
    print_menu(&reconciler.current_state().await);
    Ok(())
}

async fn watch(settings: &Settings) -> Result<()> {
    let reconciler = reconciler(settings)?;
    let mut events = reconciler.subscribe();
    let poller = spawn_poller(reconciler.clone());
    info!(api_url = %settings.api_url, "watching availability; ctrl-c to stop");
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => match event {
                Ok(AvailabilityEvent::ItemsUpdated(items)) => {
                    println!();
                    print_menu(&items);
                }
                Ok(AvailabilityEvent::PollFailed(reason)) => {
                    eprintln!("poll failed, showing last known counts: {reason}");
                }
                Ok(AvailabilityEvent::SubmissionConfirmed(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn resolve_dish(items: &[MenuItem], raw: &str) -> Option<DishId> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return items
            .iter()
            .find(|item| item.id() == DishId(id))
            .map(MenuItem::id);
    }
    items
        .iter()
        .find(|item| item.name().eq_ignore_ascii_case(raw))
        .map(MenuItem::id)
}

async fn register(settings: &Settings, args: RegisterArgs) -> Result<()> {
    let reconciler = reconciler(settings)?;
    reconciler
        .poll()
        .await
        .with_context(|| format!("could not load counts from {}", settings.api_url))?;
    let items = reconciler.current_state().await;
    let dish = resolve_dish(&items, &args.dish)
        .ok_or_else(|| anyhow!("'{}' is not on the menu", args.dish))?;

    let mut draft = RegistrationDraft::new(args.name, args.email)
        .with_dish(dish)
        .with_party_type(args.party);
    if let Some(phone) = args.phone {
        draft = draft.with_phone(phone);
    }
    if let Some(proof) = args.payment_proof {
        draft = draft.with_payment_proof(proof);
    }
    if let Some(notes) = args.notes {
        draft = draft.with_notes(notes);
    }

    let mut session = RegistrationSession::new(draft);
    let confirmation = session
        .submit(&reconciler)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;
    reconciler.shutdown().await;

    println!(
        "Registered for {} ({} guest(s)).",
        confirmation.dish_name, confirmation.guests
    );
    if let Some(id) = confirmation.rsvp_id {
        println!("RSVP id: {id}");
    }
    println!(
        "Amount due: R$ {:.2}. PIX key: {PIX_KEY}",
        confirmation.amount
    );
    Ok(())
}

async fn admin(settings: &Settings, command: AdminCommand) -> Result<()> {
    let client = AdminClient::new(&settings.api_url, settings.request_timeout())?;
    match command {
        AdminCommand::List => {
            let rsvps = client.list_rsvps().await?;
            for rsvp in &rsvps {
                println!(
                    "{:>4}  {:<24} {:<28} {:<28} {:<10} R$ {:>6.2}  {:?}",
                    rsvp.id.0,
                    rsvp.name,
                    rsvp.email,
                    rsvp.selected_dish,
                    rsvp.payment_type.as_str(),
                    rsvp.total_amount,
                    rsvp.payment_status
                );
            }
            println!("{} registration(s)", rsvps.len());
        }
        AdminCommand::Dishes => {
            for dish in client.dish_statuses().await? {
                println!(
                    "{:<32} {}/{} {}",
                    dish.dish_name,
                    dish.current_count,
                    dish.max_count,
                    if dish.available { "" } else { "(full)" }
                );
            }
        }
        AdminCommand::Stats => {
            let stats = client.stats().await?;
            println!(
                "rsvps: {}  guests: {}  confirmed: {}  pending: {}  revenue: R$ {:.2}",
                stats.total_rsvps,
                stats.total_guests,
                stats.confirmed_payments,
                stats.pending_payments,
                stats.total_revenue
            );
            for stat in &stats.dish_stats {
                println!("  {:<32} {}", stat.dish, stat.count);
            }
        }
        AdminCommand::Accept { id } => {
            let record = client.accept(RsvpId(id)).await?;
            println!("RSVP {} accepted", record.id);
        }
        AdminCommand::Reject { id } => {
            let record = client.reject(RsvpId(id)).await?;
            println!("RSVP {} rejected", record.id);
        }
        AdminCommand::Delete { id } => {
            client.delete(RsvpId(id)).await?;
            println!("RSVP {id} removed");
        }
    }
    Ok(())
}
