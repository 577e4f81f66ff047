use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, BackendClient, CancelHandle, ListPoller, MutationPhase, PaletteStore,
    PollEvent, PriorityCoordinator, Settings,
};
use list_view::{ListViewState, Predicate, Record, SortKey};
use shared::domain::{DealId, Priority, PriorityId};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Browse dashboard lists and manage deal priorities")]
struct Args {
    /// Settings file; defaults to ./dashboard.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a list endpoint and print one page of it.
    List(ListArgs),
    /// Poll a list endpoint and print it whenever it changes.
    Watch {
        #[arg(long)]
        resource: String,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Print the priority palette.
    Priorities,
    /// Set the priority of a deal, creating the label if needed.
    AssignPriority {
        #[arg(long)]
        deal: i64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        color: String,
        /// Id of an existing priority.
        #[arg(long)]
        id: Option<i64>,
    },
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Endpoint path, e.g. `/api/invoices`.
    #[arg(long)]
    resource: String,
    /// `field=value`, or `field=a|b` for any of several values.
    #[arg(long = "filter")]
    filters: Vec<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long = "search-field")]
    search_fields: Vec<String>,
    /// `field` or `field:desc`.
    #[arg(long)]
    sort: Option<String>,
    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    page: usize,
    #[arg(long)]
    page_size: Option<usize>,
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
    /// Print the rendered page as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref())?;
    let client = BackendClient::from_settings(&settings, settings.token_source());
    info!(api = %settings.api_base_url, "dashboard client ready");

    match args.command {
        Command::List(list) => run_list(&settings, &client, list).await,
        Command::Watch { resource, columns } => {
            run_watch(&settings, client, resource, columns).await
        }
        Command::Priorities => run_priorities(client).await,
        Command::AssignPriority {
            deal,
            name,
            color,
            id,
        } => run_assign(client, DealId(deal), name, color, id.map(PriorityId)).await,
    }
}

async fn run_list(settings: &Settings, client: &BackendClient, args: ListArgs) -> Result<()> {
    let mut state = ListViewState::new(args.page_size.unwrap_or(settings.default_page_size))?;
    for raw in &args.filters {
        let (field, value) = raw
            .split_once('=')
            .with_context(|| format!("filter '{raw}' must look like field=value"))?;
        let predicate = if value.contains('|') {
            Predicate::one_of(field, value.split('|'))
        } else {
            Predicate::equals(field, value)
        };
        state.set_filter(field, predicate);
    }
    if !args.search_fields.is_empty() {
        state.set_search_fields(args.search_fields.iter().cloned());
    }
    if let Some(text) = args.search {
        state.set_search(text);
    }
    if let Some(raw) = args.sort.as_deref() {
        state.set_sort(Some(SortKey::parse(raw)?));
    }
    state.set_page(args.page);

    let list = client.fetch_records(&args.resource).await?;
    let page = state.render(&list.records)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    print_rows(&page.items, &args.columns);
    println!(
        "page {} of {} ({} matching, {} fetched)",
        if page.total_pages == 0 { 0 } else { page.page_index + 1 },
        page.total_pages,
        page.total_items,
        list.len()
    );
    if let Some(server_page) = list.server_page {
        println!("server page: {}", serde_json::to_string(&server_page)?);
    }
    Ok(())
}

async fn run_watch(
    settings: &Settings,
    client: BackendClient,
    path: String,
    columns: Vec<String>,
) -> Result<()> {
    let handle = CancelHandle::new();
    let (poller, mut events) =
        ListPoller::spawn(client, path, settings.poll_interval(), handle.signal());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(PollEvent::Updated(list)) => {
                    let rows: Vec<&Record> = list.records.iter().collect();
                    print_rows(&rows, &columns);
                    println!("-- {} records", list.len());
                }
                Ok(PollEvent::Failed(message)) => eprintln!("poll failed: {message}"),
                Err(_) => break,
            },
        }
    }

    handle.cancel();
    poller.join().await;
    Ok(())
}

async fn run_priorities(client: BackendClient) -> Result<()> {
    let palette = PaletteStore::new();
    for priority in palette.refresh(&client).await? {
        print_priority(&priority);
    }
    Ok(())
}

async fn run_assign(
    client: BackendClient,
    deal_id: DealId,
    name: String,
    color: String,
    id: Option<PriorityId>,
) -> Result<()> {
    let coordinator = PriorityCoordinator::new(Arc::new(client), PaletteStore::new());
    coordinator.refresh_palette().await?;

    let selection = Priority { id, name, color };
    let handle = CancelHandle::new();
    let outcome = coordinator
        .assign_priority(deal_id, selection, &handle.signal())
        .await;

    println!("deal {deal_id}: {}", outcome.phase);
    if let Some(priority) = &outcome.local {
        print_priority(priority);
    }
    match outcome.phase {
        MutationPhase::Reconciled => Ok(()),
        phase => bail!(
            "priority for deal {deal_id} ended {phase}: {}",
            outcome.user_message().unwrap_or_default()
        ),
    }
}

fn print_priority(priority: &Priority) {
    let id = priority
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| list_view::PLACEHOLDER.to_string());
    println!("{id:>6}  {:<20} {}", priority.name, priority.color);
}

fn print_rows(rows: &[&Record], columns: &[String]) {
    for record in rows {
        let line = if columns.is_empty() {
            serde_json::to_string(record.fields()).unwrap_or_default()
        } else {
            columns
                .iter()
                .map(|column| record.display(column))
                .collect::<Vec<_>>()
                .join("\t")
        };
        println!("{line}");
    }
}
