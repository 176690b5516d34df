mod config;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use config::{load_or_create_settings, ConfigError, Settings, DEFAULT_CONFIG_PATH};
use courseplan_core::{redact_database_url, Error as CoreError, PlanId, PlanStatus, SortField, UserId};
use courseplan_rules::{
    plan_patch_json_schema, plan_submission_json_schema, Outcome, PlanService, Rejection,
};
use courseplan_store::{PlanListOptions, PostgresBackend};
use logging::{init_logging, LoggingError};

/// Exit status for requests the rules turned away.
const EXIT_REJECTED: u8 = 2;

#[derive(Debug, Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("{}", .0.public_message())]
    Core(#[from] CoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Parser, Debug)]
#[command(name = "courseplan", version, about = "Academic plan management")]
struct Cli {
    /// Path to the TOML config file; created with defaults when missing.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Database connection string; overrides DATABASE_URL and the config file.
    #[arg(long, global = true, value_name = "URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the plan tables if they do not exist.
    InitDb,
    /// Submit a new plan.
    Submit(SubmitArgs),
    /// Rename a plan and/or replace its courses.
    Update(UpdateArgs),
    /// Delete a plan with its courses, reviews and comments.
    Delete { plan_id: PlanId },
    /// Show a plan with its courses.
    Show(ShowArgs),
    /// List plans, optionally filtered by status or owner.
    List(ListArgs),
    /// Show comments and reviews on a plan, newest first.
    Activity(ShowArgs),
    /// Show a plan's review history, oldest first.
    History(ShowArgs),
    /// Print the JSON Schema of submission and patch records.
    Schema,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::InitDb => "init-db",
            Command::Submit(_) => "submit",
            Command::Update(_) => "update",
            Command::Delete { .. } => "delete",
            Command::Show(_) => "show",
            Command::List(_) => "list",
            Command::Activity(_) => "activity",
            Command::History(_) => "history",
            Command::Schema => "schema",
        }
    }
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Read the submission record from a JSON file instead of flags.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["student", "name", "course"])]
    record: Option<PathBuf>,
    /// Submitting student's user id.
    #[arg(long, required_unless_present = "record")]
    student: Option<String>,
    /// Plan name.
    #[arg(long, required_unless_present = "record")]
    name: Option<String>,
    /// Course code; repeat for each course.
    #[arg(long = "course", value_name = "CODE")]
    course: Vec<String>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    plan_id: PlanId,
    /// New plan name.
    #[arg(long)]
    name: Option<String>,
    /// Replacement course code; repeat for each course.
    #[arg(long = "course", value_name = "CODE")]
    course: Vec<String>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    plan_id: PlanId,
    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Status code (0-4) or name, e.g. awaiting-review.
    #[arg(long, value_parser = parse_status, conflicts_with = "owner")]
    status: Option<PlanStatus>,
    /// List the plans of one student instead.
    #[arg(long, value_name = "USER_ID")]
    owner: Option<UserId>,
    #[arg(long, value_enum, default_value_t = SortArg::LastUpdated)]
    sort: SortArg,
    #[arg(long, default_value_t = false)]
    ascending: bool,
    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Created,
    LastUpdated,
}

impl From<SortArg> for SortField {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Created => SortField::Created,
            SortArg::LastUpdated => SortField::LastUpdated,
        }
    }
}

fn parse_status(raw: &str) -> Result<PlanStatus, String> {
    if let Ok(code) = raw.parse::<i16>() {
        return PlanStatus::from_code(code).ok_or_else(|| format!("unknown status code {code}"));
    }
    let wanted = raw.replace(['-', '_'], " ");
    PlanStatus::ALL
        .into_iter()
        .find(|status| status.label().eq_ignore_ascii_case(&wanted))
        .ok_or_else(|| format!("unknown status '{raw}'"))
}

/// How a command finished when it did not fault.
enum Reply {
    Done,
    Rejected(Rejection),
}

impl<T> From<Outcome<T>> for Reply {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Accepted(_) => Reply::Done,
            Outcome::Rejected(rejection) => Reply::Rejected(rejection),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(Reply::Done) => ExitCode::SUCCESS,
        Ok(Reply::Rejected(rejection)) => {
            eprintln!("{rejection}");
            ExitCode::from(EXIT_REJECTED)
        }
        Err(err) => {
            tracing::error!(event = "command_failed", error = ?err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Reply, CliError> {
    if let Command::Schema = cli.command {
        print_json(&json!({
            "submission": plan_submission_json_schema(),
            "patch": plan_patch_json_schema(),
        }))?;
        return Ok(Reply::Done);
    }

    let settings = load_or_create_settings(&cli.config)?;
    init_logging(&settings)?;

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("command", run_id = %run_id, command = cli.command.name());
    async move {
        let timer = Instant::now();
        let backend = connect(&settings, cli.database_url.as_deref()).await?;
        let reply = dispatch(cli.command, backend).await?;
        tracing::info!(
            event = "command_finished",
            rejected = matches!(reply, Reply::Rejected(_)),
            duration_ms = timer.elapsed().as_millis() as u64,
        );
        Ok::<_, CliError>(reply)
    }
    .instrument(span)
    .await
}

async fn connect(settings: &Settings, flag: Option<&str>) -> Result<Arc<PostgresBackend>, CliError> {
    let url = settings.database_url(flag)?;
    tracing::info!(event = "database_connecting", url = %redact_database_url(&url));
    let backend = PostgresBackend::connect(&url, &settings.postgres_options()).await?;
    Ok(Arc::new(backend))
}

async fn dispatch(command: Command, backend: Arc<PostgresBackend>) -> Result<Reply, CliError> {
    if let Command::InitDb = command {
        let statements = backend.install_schema().await?;
        println!("schema installed ({statements} statements)");
        return Ok(Reply::Done);
    }

    let service = PlanService::with_backend(backend);
    match command {
        Command::Submit(args) => {
            let record = submission_record(args)?;
            let outcome = service.submit(&record).await?;
            if let Outcome::Accepted(plan_id) = &outcome {
                println!("{plan_id}");
            }
            Ok(outcome.into())
        }
        Command::Update(args) => {
            let outcome = service.revise(&patch_record(args)).await?;
            if let Outcome::Accepted(updated) = &outcome {
                println!("{updated} rows updated");
            }
            Ok(outcome.into())
        }
        Command::Delete { plan_id } => Ok(service.remove(plan_id).await?.into()),
        Command::Show(ShowArgs { plan_id, json }) => {
            let outcome = service.plan(plan_id).await?;
            if let Outcome::Accepted(plan) = &outcome {
                if json {
                    print_json(plan)?;
                } else {
                    print!("{}", output::render_plan(plan));
                }
            }
            Ok(outcome.into())
        }
        Command::List(args) => {
            list(&service, args).await?;
            Ok(Reply::Done)
        }
        Command::Activity(ShowArgs { plan_id, json }) => {
            let outcome = service.activity(plan_id).await?;
            if let Outcome::Accepted(entries) = &outcome {
                if json {
                    print_json(entries)?;
                } else {
                    print!("{}", output::render_activity(entries));
                }
            }
            Ok(outcome.into())
        }
        Command::History(ShowArgs { plan_id, json }) => {
            let outcome = service.history(plan_id).await?;
            if let Outcome::Accepted(reviews) = &outcome {
                if json {
                    print_json(reviews)?;
                } else {
                    print!("{}", output::render_history(reviews));
                }
            }
            Ok(outcome.into())
        }
        Command::InitDb | Command::Schema => Ok(Reply::Done),
    }
}

async fn list(service: &PlanService, args: ListArgs) -> Result<(), CliError> {
    if let Some(owner) = args.owner {
        if owner <= 0 {
            return Err(CliError::InvalidArgument(format!("invalid user id {owner}")));
        }
        let plans = service.queries().list_by_owner(owner).await?;
        return if args.json {
            print_json(&plans)
        } else {
            print!("{}", output::render_headers(&plans));
            Ok(())
        };
    }

    let options = PlanListOptions {
        status: args.status,
        sort: args.sort.into(),
        ascending: args.ascending,
    };
    let plans = service.queries().list_by_status(&options).await?;
    if args.json {
        print_json(&plans)
    } else {
        print!("{}", output::render_summaries(&plans));
        Ok(())
    }
}

fn submission_record(args: SubmitArgs) -> Result<Value, CliError> {
    if let Some(path) = args.record {
        let content = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&content)?);
    }
    let mut record = Map::new();
    if let Some(student) = args.student {
        record.insert("studentId".to_string(), Value::String(student));
    }
    if let Some(name) = args.name {
        record.insert("planName".to_string(), Value::String(name));
    }
    record.insert("courses".to_string(), json!(args.course));
    Ok(Value::Object(record))
}

fn patch_record(args: UpdateArgs) -> Value {
    let mut record = Map::new();
    record.insert("planId".to_string(), json!(args.plan_id));
    if let Some(name) = args.name {
        record.insert("planName".to_string(), Value::String(name));
    }
    if !args.course.is_empty() {
        record.insert("courses".to_string(), json!(args.course));
    }
    Value::Object(record)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
