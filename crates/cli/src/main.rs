use anyhow::Context;
use clap::{Parser, Subcommand};
use his_core::models::{PatientFilter, RegisterRequest};
use his_core::services::CatalogFile;
use his_core::{bootstrap, AppConfig, PageRequest, ServiceContext, Services};
use his_ids::CodeKind;
use his_types::{EmailAddress, NonEmptyText};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "his")]
#[command(about = "Hospital information system admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin login
    CreateAdmin {
        /// Display name
        name: String,
        /// Login email
        email: String,
        /// Password (at least 8 characters)
        password: String,
    },
    /// Create the collections and indexes
    Migrate,
    /// Import services, lab tests, parameters and reference ranges from YAML
    ImportCatalog {
        /// Path to the catalogue file
        path: PathBuf,
    },
    /// List registered patients, newest first
    ListPatients {
        /// Name, UHID or mobile fragment
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Draw the next code of a kind (uhid, visit, accession, opd_bill, ipd, appointment)
    NextCode {
        kind: CodeKind,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("his=info".parse()?)
                .add_directive("his_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'his --help' for commands");
        return Ok(());
    };

    let config = Arc::new(AppConfig::from_env().context("failed to resolve configuration")?);
    let store = bootstrap::open_store(&config)
        .await
        .context("failed to open the store")?;
    let ctx = bootstrap::context(store, config);

    let mut stdout = std::io::stdout().lock();
    run(command, &ctx, &mut stdout).await
}

/// Execute one command against an already migrated store.
async fn run(command: Commands, ctx: &ServiceContext, out: &mut impl Write) -> anyhow::Result<()> {
    let services = Services::new(ctx.clone());
    match command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => {
            let req = RegisterRequest {
                name: NonEmptyText::new(&name).context("name must not be blank")?,
                email: EmailAddress::parse(&email).context("invalid email")?,
                password,
                role: api_shared::Role::Admin,
            };
            let user = services.users.register(req).await?;
            tracing::info!(user_id = %user.id, "admin created from the command line");
            writeln!(out, "Created admin {} <{}> with id {}", user.name, user.email, user.id)?;
        }
        Commands::Migrate => {
            // Idempotent; open_store has already run it once.
            bootstrap::migrate(ctx.store().as_ref()).await?;
            tracing::info!("migrations applied");
            writeln!(out, "Migrations applied")?;
        }
        Commands::ImportCatalog { path } => {
            let file = CatalogFile::from_path(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let summary = services.catalog.import(file).await?;
            tracing::info!(
                path = %path.display(),
                services = summary.services_created,
                tests = summary.tests_created,
                "catalogue imported"
            );
            writeln!(
                out,
                "Services: {} created, {} skipped",
                summary.services_created, summary.services_skipped
            )?;
            writeln!(
                out,
                "Parameters: {} created, {} reused",
                summary.parameters_created, summary.parameters_reused
            )?;
            writeln!(out, "Reference ranges: {} created", summary.references_created)?;
            writeln!(out, "Lab tests: {} created", summary.tests_created)?;
        }
        Commands::ListPatients {
            search,
            page,
            limit,
        } => {
            let filter = PatientFilter { search };
            let patients = services
                .patients
                .list(&filter, &PageRequest::new(page, limit))
                .await?;
            if patients.items.is_empty() {
                writeln!(out, "No patients found.")?;
            } else {
                for patient in &patients.items {
                    writeln!(
                        out,
                        "UHID: {}, Name: {}, Mobile: {}, Registered: {}",
                        patient.uhid, patient.name, patient.mobile, patient.created_at
                    )?;
                }
                writeln!(
                    out,
                    "Page {} of {} ({} patients)",
                    patients.page, patients.total_pages, patients.total
                )?;
            }
        }
        Commands::NextCode { kind } => {
            let code = ctx.codes().next_code(kind).await?;
            writeln!(out, "{code}")?;
        }
    }
    Ok(())
}
