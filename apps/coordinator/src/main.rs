use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, DashboardEvent, EventApi, EventDashboard, ExpenseDraft, Feature,
    HttpEventApi, SlotDraft, VoteOutcome,
};
use shared::domain::{ChoiceId, EventId, SlotChoice, SlotId, UserId};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Plan campus events: time slots, a meeting-place poll and shared expenses")]
struct Cli {
    /// Overrides the API base address from settings.
    #[arg(long)]
    api_base_url: Option<String>,
    /// Participant id; a fresh one is generated when omitted.
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long, default_value = "guest")]
    name: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateEvent {
        title: String,
    },
    Summary {
        event_id: String,
    },
    Analytics {
        event_id: String,
    },
    Export {
        event_id: String,
    },
    AddSlot {
        event_id: String,
        start: String,
        end: String,
    },
    VoteSlot {
        event_id: String,
        slot_id: String,
        choice: SlotChoice,
    },
    CreatePoll {
        event_id: String,
    },
    VotePoll {
        event_id: String,
        choice_id: String,
    },
    AddExpense {
        event_id: String,
        amount: String,
        notes: String,
        #[arg(long, default_value = "1")]
        weight: String,
    },
    Remind {
        event_id: String,
    },
    /// Prints the summary every time the periodic refresh lands.
    Watch {
        event_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Cli {
        api_base_url,
        user_id,
        name,
        command,
    } = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = api_base_url {
        settings.api_base_url = url;
    }
    let http = HttpEventApi::from_settings(&settings).context("configure event api")?;
    let user_id = user_id.map(UserId::new).unwrap_or_else(UserId::generate);
    info!(api = %http.base_url(), %user_id, "coordinator starting");
    let api: Arc<dyn EventApi> = Arc::new(http);

    let open = |event_id: String, auto_refresh: bool| {
        let mut settings = settings.clone();
        settings.auto_refresh = auto_refresh;
        EventDashboard::join(
            api.clone(),
            settings,
            EventId::new(event_id),
            user_id.clone(),
            &name,
        )
    };

    match command {
        Command::CreateEvent { title } => {
            let dashboard = EventDashboard::create(api.clone(), settings.clone(), &title, &name)
                .await
                .context("create event")?;
            println!(
                "created event_id={} user_id={}",
                dashboard.event_id(),
                dashboard.user_id()
            );
            println!("invite link: {}", dashboard.invite_link());
        }
        Command::Summary { event_id } => {
            let dashboard = open(event_id, false);
            dashboard.refresh().await.context("fetch summary")?;
            print_summary(&dashboard).await;
        }
        Command::Analytics { event_id } => {
            let dashboard = open(event_id, false);
            dashboard.refresh().await.context("fetch summary")?;
            let analytics = dashboard.analytics().await;
            println!("slots: {}", analytics.total_slots);
            println!("poll votes: {}", analytics.total_votes);
            println!("participation: {}%", analytics.participation_rate);
            println!("total expense: {:.2}", analytics.total_expense);
            for share in &analytics.poll_data {
                println!("  {}: {} ({}%)", share.name, share.votes, share.percentage);
            }
            for share in &analytics.slot_data {
                println!(
                    "  slot {}: {} yes / {} no ({}% yes)",
                    share.slot_id, share.yes_votes, share.no_votes, share.yes_percentage
                );
            }
        }
        Command::Export { event_id } => {
            let dashboard = open(event_id, false);
            dashboard.refresh().await.context("fetch summary")?;
            print!("{}", dashboard.export_text().await);
        }
        Command::AddSlot {
            event_id,
            start,
            end,
        } => {
            let dashboard = open(event_id, false);
            let mut draft = SlotDraft::new(start, end);
            let slot_id = dashboard
                .slots()
                .add_slot(&mut draft)
                .await
                .context("add slot")?;
            println!("added slot_id={slot_id}");
        }
        Command::VoteSlot {
            event_id,
            slot_id,
            choice,
        } => {
            let dashboard = open(event_id, false);
            dashboard.refresh().await.context("fetch summary")?;
            let outcome = dashboard
                .slots()
                .vote(&SlotId::new(slot_id), choice)
                .await
                .context("vote on slot")?;
            report_vote(outcome);
        }
        Command::CreatePoll { event_id } => {
            let dashboard = open(event_id, false);
            dashboard.poll().create_poll().await.context("create poll")?;
            println!("poll created");
        }
        Command::VotePoll {
            event_id,
            choice_id,
        } => {
            let dashboard = open(event_id, false);
            dashboard.refresh().await.context("fetch summary")?;
            let outcome = dashboard
                .poll()
                .vote(&ChoiceId::new(choice_id))
                .await
                .context("vote in poll")?;
            report_vote(outcome);
        }
        Command::AddExpense {
            event_id,
            amount,
            notes,
            weight,
        } => {
            let dashboard = open(event_id, false);
            let mut draft = ExpenseDraft::new(amount, notes, weight);
            dashboard
                .expenses()
                .submit(&mut draft)
                .await
                .context("add expense")?;
            println!("expense recorded; total {}", dashboard.expenses().total_text().await);
        }
        Command::Remind { event_id } => {
            let dashboard = open(event_id, false);
            dashboard.send_reminder().await.context("send reminder")?;
            println!("reminder sent");
        }
        Command::Watch { event_id } => {
            let dashboard = open(event_id, true);
            let mut events = dashboard.subscribe_events();
            if let Err(err) = dashboard.refresh().await {
                warn!(error = %err, "initial refresh failed");
            }
            print_summary(&dashboard).await;
            let refresher = dashboard.spawn_auto_refresh();

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(DashboardEvent::SummaryRefreshed { feature: Feature::Dashboard }) => {
                            print_summary(&dashboard).await;
                        }
                        Ok(DashboardEvent::Notice { notice, .. }) => {
                            eprintln!("! {}", notice.message);
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "dashboard events lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            if let Some(refresher) = refresher {
                refresher.abort();
            }
        }
    }

    Ok(())
}

fn report_vote(outcome: VoteOutcome) {
    match outcome {
        VoteOutcome::Submitted => println!("vote recorded"),
        VoteOutcome::Ignored => println!("a vote is already pending; try again shortly"),
    }
}

async fn print_summary(dashboard: &EventDashboard) {
    let title = dashboard.title().await.unwrap_or_else(|| "untitled".into());
    println!("== {title} ({}) ==", dashboard.event_id());

    println!("slots:");
    for view in dashboard.slots().slots().await {
        let start = view
            .slot
            .start_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "?".into());
        let mine = view.my_choice.map(|c| c.to_string()).unwrap_or_default();
        println!(
            "  [{}] {start} yes={} no={} ({}% yes){}{}",
            view.slot.id,
            view.slot.yes_votes,
            view.slot.no_votes,
            view.yes_percentage,
            if view.slot.is_winning { " winner" } else { "" },
            if mine.is_empty() { String::new() } else { format!(" you={mine}") },
        );
    }

    match dashboard.poll().poll().await {
        Some(poll) => {
            println!("poll: {}", poll.question);
            for choice in &poll.choices {
                println!(
                    "  [{}] {} {} votes ({}%){}",
                    choice.id,
                    choice.text,
                    choice.votes,
                    choice.percentage,
                    if choice.is_mine { " <- you" } else { "" },
                );
            }
        }
        None => println!("poll: not created yet"),
    }

    let expenses = dashboard.expenses();
    println!("expenses: total {}", expenses.total_text().await);
    for view in expenses.expenses().await {
        println!("  {} {}", view.amount_text, view.expense.notes);
    }
    for line in expenses.balances().await {
        println!("  {}: {}", line.participant, line.text);
    }
}
