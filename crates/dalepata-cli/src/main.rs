use anyhow::Context;
use clap::Parser;
use dalepata_api::DalePataClient;
use dalepata_core::{
    format::relative_time, providers::RemoteRequestSource, Config, DeviceReadStateStore, Error,
    NotificationEntry, Notifier, Session,
};
use dalepata_store::DeviceStorage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dalepata")]
#[command(version, about = "Adoption notifications for DalePata", long_about = None)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "DALEPATA_API_BASE_URL", global = true)]
    api_url: Option<String>,

    /// Device storage file (overrides the config file)
    #[arg(long, env = "DALEPATA_DB", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and remember the session on this device
    Login {
        email: String,
        #[arg(long, env = "DALEPATA_PASSWORD")]
        password: String,
    },
    /// Forget the session and all read markers
    Logout,
    /// Show the notification feed
    Notifications {
        /// Only unread entries
        #[arg(long)]
        unread: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the number of unread notifications
    Unread,
    /// Mark the notification of an adoption request as read
    Read {
        /// Adoption request id (solicitudId)
        solicitud_id: i64,
    },
    /// Mark every notification in the feed as read
    ReadAll,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dalepata=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    if let Some(db) = cli.db {
        config.storage.db_path = Some(db);
    }

    let db_path = config.storage.resolved_db_path()?;
    let storage = Arc::new(
        DeviceStorage::open(&db_path)
            .with_context(|| format!("Failed to open device storage at {}", db_path.display()))?,
    );
    let session = Session::new(storage.clone());

    match cli.command {
        Commands::Login { email, password } => {
            let client = DalePataClient::new(config.api.base_url.as_str(), config.api.timeout())?;
            let user = session.login(&client, &email, &password).await?;
            let name = user
                .as_ref()
                .and_then(|u| u.get("nombre").or_else(|| u.get("email")))
                .and_then(|v| v.as_str())
                .unwrap_or(email.as_str())
                .to_string();
            println!("Sesión iniciada como {}", name);
        }
        Commands::Logout => {
            session.logout()?;
            println!("Sesión cerrada");
        }
        command => {
            let token = session.token()?;
            if token.is_none() {
                anyhow::bail!("Not logged in. Run `dalepata login <email>` first.");
            }

            let client = DalePataClient::new(config.api.base_url.as_str(), config.api.timeout())?
                .with_token(token)
                .with_retry_config(config.api.retry_config());
            let notifier = Notifier::new(
                Box::new(RemoteRequestSource::new(client)),
                Arc::new(DeviceReadStateStore::new(storage.clone())),
            )
            .with_window_days(config.notifications.window_days);

            match run(command, &notifier).await {
                Err(Error::SessionExpired) => {
                    // Same as the mobile app: a 401 ends the session
                    tracing::warn!("Backend rejected the token, clearing session");
                    session.logout()?;
                    anyhow::bail!("Session expired. Please log in again.");
                }
                other => other?,
            }
        }
    }

    Ok(())
}

async fn run(command: Commands, notifier: &Notifier) -> dalepata_core::Result<()> {
    match command {
        Commands::Notifications { unread, json } => {
            let mut entries = notifier.derive_notifications().await?;
            if unread {
                entries.retain(|n| !n.read);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_feed(&entries);
            }
        }
        Commands::Unread => {
            println!("{}", notifier.unread_count().await?);
        }
        Commands::Read { solicitud_id } => {
            notifier.mark_as_read(solicitud_id).await?;
            println!("Notificación {} marcada como leída", solicitud_id);
        }
        Commands::ReadAll => {
            let ids: Vec<i64> = notifier
                .derive_notifications()
                .await?
                .iter()
                .filter(|n| !n.read)
                .map(|n| n.request_id)
                .collect();
            notifier.mark_all_as_read(&ids).await?;
            println!("{} notificaciones marcadas como leídas", ids.len());
        }
        Commands::Login { .. } | Commands::Logout => {}
    }

    Ok(())
}

fn print_feed(entries: &[NotificationEntry]) {
    let unread = entries.iter().filter(|n| !n.read).count();
    println!("Notificaciones ({} sin leer)", unread);

    if entries.is_empty() {
        println!();
        println!("No hay notificaciones.");
        println!("Cuando tengas solicitudes de adopción aprobadas o rechazadas, aparecerán aquí.");
        return;
    }

    let now = chrono::Utc::now();
    for entry in entries {
        let marker = if entry.read { " " } else { "●" };
        println!(
            "{} {}  [#{}]  {}",
            marker,
            entry.title(),
            entry.request_id,
            relative_time(entry.date, now)
        );
        if let Some(comment) = &entry.comment {
            println!("    {}", comment);
        }
    }
}
