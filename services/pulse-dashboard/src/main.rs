use clap::{Parser, Subcommand};
use pb_session::{FileStorage, NullThemeSink, SessionStore, Theme, ThemeStore};
use pulse_dashboard::{
    filter_by_services, load_config, sorted_for_display, status_transition, ApiConfig, Config,
    Dashboard, Incident, Monitor, MonitorStatus, Notification, PushEvent, StreamConfig,
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn, Level};

#[derive(Parser)]
#[command(name = "pulse-dashboard")]
#[command(about = "Status dashboard client for Pulseboard")]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long, default_value = "http://localhost:8000/api")]
    api_url: String,

    /// Push stream host address
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Push stream port
    #[arg(long, default_value = "8001")]
    port: u16,

    /// Directory for session and preference state
    #[arg(long, default_value = ".pulseboard")]
    data_dir: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info", value_parser = clap::value_parser!(Level))]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the backend and persist the session
    Login {
        email: String,
        password: String,
    },

    /// Clear the persisted session
    Logout,

    /// Show the current session user
    Whoami,

    /// Show or toggle the UI theme
    Theme {
        /// Switch between light and dark
        #[arg(long)]
        toggle: bool,
    },

    /// List services and their status
    Services,

    /// List incidents, newest and unresolved first
    Incidents {
        /// Only incidents affecting these service ids
        #[arg(long = "service")]
        services: Vec<String>,
    },

    /// Go live: snapshot the org, then follow push events
    Watch {
        /// Only show events for these service ids
        #[arg(long = "service")]
        services: Vec<String>,
    },

    /// Delete a service (requires the ADMIN role)
    DeleteService {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    // Build configuration from CLI args or config file
    let config = if let Some(config_path) = &args.config {
        debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        Config {
            api: ApiConfig {
                base_url: args.api_url.clone(),
                ..Default::default()
            },
            stream: StreamConfig {
                host: args.host.clone(),
                port: args.port,
                ..Default::default()
            },
        }
    };

    let storage = Arc::new(FileStorage::new(&args.data_dir)?);
    let session = Arc::new(SessionStore::new(storage.clone())?);
    let dashboard = Dashboard::new(&config, session.clone())?;

    match args.command {
        Commands::Login { email, password } => {
            run_login(&dashboard, &email, &password).await?;
        }
        Commands::Logout => {
            run_logout(&dashboard).await?;
        }
        Commands::Whoami => {
            run_whoami(&session)?;
        }
        Commands::Theme { toggle } => {
            run_theme(storage.clone(), toggle)?;
        }
        Commands::Services => {
            run_services(&dashboard).await?;
        }
        Commands::Incidents { services } => {
            run_incidents(&dashboard, services).await?;
        }
        Commands::Watch { services } => {
            run_watch(&dashboard, services).await?;
        }
        Commands::DeleteService { id } => {
            run_delete_service(&dashboard, &id).await?;
        }
    }

    Ok(())
}

async fn run_login(
    dashboard: &Dashboard,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = dashboard.login(email, password).await?;
    info!(
        "Logged in as {} ({}) in {}",
        user.name, user.role, user.organization_name
    );
    if let Some(target) = dashboard.session().take_redirect()? {
        info!("Resume at: {}", target);
    }
    Ok(())
}

async fn run_logout(dashboard: &Dashboard) -> Result<(), Box<dyn std::error::Error>> {
    dashboard.logout().await?;
    info!("Logged out");
    Ok(())
}

fn run_whoami(session: &SessionStore) -> Result<(), Box<dyn std::error::Error>> {
    match session.user() {
        Some(user) => {
            info!("{} <{}>", user.name, user.email);
            info!("Role: {}", user.role);
            info!("Organization: {} ({})", user.organization_name, user.organization_id);
        }
        None => info!("Not logged in"),
    }
    Ok(())
}

fn run_theme(
    storage: Arc<FileStorage>,
    toggle: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let themes = ThemeStore::new(storage, Arc::new(NullThemeSink), Theme::Light)?;
    if toggle {
        let next = themes.toggle()?;
        info!("Theme set to {}", next);
    } else {
        info!("Theme: {}", themes.theme());
    }
    Ok(())
}

async fn run_services(dashboard: &Dashboard) -> Result<(), Box<dyn std::error::Error>> {
    let organization_id = dashboard
        .session()
        .organization_id()
        .ok_or("Not logged in")?;
    let services = dashboard.api().services(&organization_id).await?;
    info!("{} services:", services.len());
    for service in &services {
        info!("  [{:?}] {} ({})", service.status, service.name, service.id);
    }
    Ok(())
}

async fn run_incidents(
    dashboard: &Dashboard,
    service_filter: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let organization_id = dashboard
        .session()
        .organization_id()
        .ok_or("Not logged in")?;

    let filter: HashSet<String> = service_filter.into_iter().collect();
    let all = dashboard.api().incidents(&organization_id).await?;
    let matched: Vec<Incident> = filter_by_services(&all, &filter)
        .into_iter()
        .cloned()
        .collect();

    let sorted = sorted_for_display(&matched);
    info!("{} incidents:", sorted.len());
    for incident in &sorted {
        print_incident(incident);
    }
    Ok(())
}

fn print_incident(incident: &Incident) {
    info!(
        "  [{:?}/{}] {} ({})",
        incident.status, incident.severity, incident.title, incident.id
    );
    for update in &incident.updates {
        info!("      {} - {}", update.created_at, update.message);
    }
}

async fn run_watch(
    dashboard: &Dashboard,
    service_filter: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter: HashSet<String> = service_filter.into_iter().collect();

    // Subscribe before start so no event published after connect is missed.
    let mut monitor_events = dashboard.subscribe_monitor_updates();
    let mut notifications = dashboard.subscribe_notifications();

    info!("Loading snapshot and opening push streams...");
    dashboard.start().await?;

    // Seed from the snapshot so the live feed only reports actual changes.
    let mut seen: HashMap<String, MonitorStatus> = HashMap::new();
    for monitor in dashboard.monitors().await {
        let _ = status_transition(&mut seen, &monitor);
    }

    info!("Watching for monitor and incident changes (press Ctrl+C to stop)...");

    loop {
        tokio::select! {
            event = monitor_events.recv() => {
                match event {
                    Ok(PushEvent::MonitorUpdate(monitor)) => {
                        print_monitor_update(&monitor, &filter, &mut seen);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Monitor receiver error: {}", e);
                        break;
                    }
                }
            }
            notification = notifications.recv() => {
                match notification {
                    Ok(notification) => print_notification(&notification, &filter),
                    Err(e) => {
                        debug!("Notification receiver error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    dashboard.shutdown().await;
    Ok(())
}

fn print_monitor_update(
    monitor: &Monitor,
    filter: &HashSet<String>,
    seen: &mut HashMap<String, MonitorStatus>,
) {
    if !filter.is_empty() && !filter.contains(&monitor.service_id) {
        return;
    }
    let Some(status) = status_transition(seen, monitor) else {
        return;
    };
    let response = monitor
        .latest_result
        .as_ref()
        .and_then(|r| r.response_time_ms);
    match (status, response) {
        (MonitorStatus::Down, _) => warn!("Monitor {} is DOWN", monitor.name),
        (status, Some(ms)) => info!("Monitor {} is {:?} ({} ms)", monitor.name, status, ms),
        (status, None) => info!("Monitor {} is {:?}", monitor.name, status),
    }
}

fn print_notification(notification: &Notification, filter: &HashSet<String>) {
    let incident = match notification {
        Notification::IncidentCreated(i)
        | Notification::SeverityEscalated(i)
        | Notification::IncidentUpdated(i) => i,
    };
    if !filter.is_empty()
        && !incident
            .affected_service_ids
            .iter()
            .any(|id| filter.contains(id))
    {
        return;
    }

    match notification {
        Notification::IncidentCreated(i) => {
            info!("New incident [{}]: {}", i.severity, i.title);
        }
        Notification::SeverityEscalated(i) => {
            warn!("Incident escalated to {}: {}", i.severity, i.title);
        }
        Notification::IncidentUpdated(i) => {
            info!("Incident updated [{:?}]: {}", i.status, i.title);
        }
    }
}

async fn run_delete_service(
    dashboard: &Dashboard,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    dashboard.session().ensure_admin()?;
    dashboard.api().delete_service(id).await?;
    info!("Deleted service {}", id);
    Ok(())
}
