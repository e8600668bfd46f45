//! Geo Attendance - geofenced check-in/out and attendance reconciliation
//! client for Frappe HRMS backends.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use geo_attendance as app;

use app::api::{HrmsClient, SessionContext};
use app::checkin::CheckInFlow;
use app::config::{AppConfig, ConfigLoadResult, LogConfig};
use app::error::AppError;
use app::location::{FixedPosition, LocationProvider, PositionRequest};
use app::models::{AttendanceRecord, CheckAction, DevicePosition, wire_time};
use app::reconcile::{
    BulkOperation, EditMode, ListMode, ReconcileService, RemovalKind, resolve_targets,
};

/// Geofenced check-in/out and attendance reconciliation for Frappe HRMS.
#[derive(Parser)]
#[command(name = "geo-attendance", version)]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long)]
    dev: bool,

    /// Server URL, overriding the config file
    #[arg(long)]
    server: Option<String>,

    /// Frappe session id (sid cookie); falls back to GEO_ATTENDANCE_SID
    #[arg(long)]
    sid: Option<String>,

    /// Employee bound to the session; resolved remotely when omitted
    #[arg(long)]
    employee: Option<String>,

    /// Device latitude (kiosks/terminals without GPS)
    #[arg(long, requires = "lon")]
    lat: Option<f64>,

    /// Device longitude
    #[arg(long, requires = "lat")]
    lon: Option<f64>,

    /// Also write daily-rolling log files
    #[arg(long)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Evaluate the geofence and show today's attendance
    Status,
    /// Record a check-in
    CheckIn {
        /// Work From Home: bypasses the geofence, requires eligibility
        #[arg(long)]
        wfh: bool,
    },
    /// Record a check-out
    CheckOut {
        /// Work From Home: bypasses the geofence, requires eligibility
        #[arg(long)]
        wfh: bool,
    },
    /// List a day's attendance rows with their completion state
    List {
        /// Date to list (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only rows still lacking a checkout
        #[arg(long)]
        pending: bool,
    },
    /// Correct one record's check-in/out times
    Edit {
        /// Attendance record id (e.g. HR-ATT-2025-00042)
        attendance_id: String,
        /// Day the record belongs to (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Which timestamps to touch
        #[arg(long, value_enum)]
        mode: EditModeArg,
        /// Check-in time ('YYYY-MM-DD HH:MM:SS' or 'HH:MM'); 10:00 when omitted
        #[arg(long)]
        check_in: Option<String>,
        /// Check-out time; 19:00 when omitted
        #[arg(long)]
        check_out: Option<String>,
    },
    /// Apply one operation across many records
    Bulk {
        /// Day the records belong to (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Operation to apply to every target
        #[arg(long, value_enum)]
        op: BulkOpArg,
        /// Explicit target ids; every listed row for the day when omitted
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Restrict the implicit all-rows target to pending checkouts
        #[arg(long)]
        pending: bool,
        /// Check-in time to apply; 09:00 when omitted
        #[arg(long)]
        check_in: Option<String>,
        /// Check-out time to apply; 18:00 when omitted
        #[arg(long)]
        check_out: Option<String>,
    },
    /// Apply a fixed checkout hour to one record
    QuickCheckout {
        /// Attendance record id
        attendance_id: String,
        /// Day the record belongs to (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Checkout hour, 0-23
        #[arg(long, default_value_t = 18)]
        hour: u32,
    },
    /// Remove one record: submitted records are cancelled, drafts deleted
    Delete {
        /// Attendance record id
        attendance_id: String,
        /// Day the record belongs to, used to look up its state (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Reason recorded in the backend audit log
        #[arg(long, default_value = "Admin action")]
        reason: String,
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
    /// Day-level attendance statistics
    Stats {
        /// Date to summarize (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// WFH eligibility administration
    Wfh {
        #[command(subcommand)]
        command: WfhCommand,
    },
}

#[derive(Subcommand)]
enum WfhCommand {
    /// List active employees with their WFH eligibility
    List,
    /// Grant or revoke WFH eligibility for one employee
    Set {
        /// Employee id (e.g. HR-EMP-00007)
        employee_id: String,
        #[arg(long, action = ArgAction::Set)]
        eligible: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EditModeArg {
    In,
    Out,
    Both,
}

impl From<EditModeArg> for EditMode {
    fn from(value: EditModeArg) -> Self {
        match value {
            EditModeArg::In => EditMode::In,
            EditModeArg::Out => EditMode::Out,
            EditModeArg::Both => EditMode::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BulkOpArg {
    CheckIn,
    CheckOut,
    Both,
}

impl From<BulkOpArg> for BulkOperation {
    fn from(value: BulkOpArg) -> Self {
        match value {
            BulkOpArg::CheckIn => BulkOperation::CheckIn,
            BulkOpArg::CheckOut => BulkOperation::CheckOut,
            BulkOpArg::Both => BulkOperation::Both,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Determine config path based on mode
    let config_path = if cli.dev {
        PathBuf::from("config.toml")
    } else {
        AppConfig::default_path()
    };

    // Init needs neither a loaded config nor a session
    if let Command::Init { force } = &cli.command {
        return init_config(&config_path, *force);
    }

    let config = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => config,
        ConfigLoadResult::Missing => AppConfig::default(),
        ConfigLoadResult::Invalid(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("invalid config at {}", config_path.display())));
        }
    };

    let _log_guard = init_logging(&config.log, cli.log_file);
    tracing::debug!(config = %config_path.display(), "geo-attendance starting");

    let api = build_client(&cli, &config)?;
    run(&cli, &config, &api).await
}

async fn run(cli: &Cli, config: &AppConfig, api: &HrmsClient) -> anyhow::Result<()> {
    let service = ReconcileService::new(api);

    match &cli.command {
        Command::Init { .. } => unreachable!("handled before client construction"),

        Command::Status => {
            let provider = position_provider(cli, config);
            let mut flow =
                CheckInFlow::open(api, provider.as_ref(), config.location.position_request())
                    .await?;
            let view = flow.refresh().await?;
            let info = flow.wfh_info();
            let mut badges = Vec::new();
            if info.wfh_eligible {
                badges.push("WFH eligible");
            }
            if info.is_admin {
                badges.push("admin");
            }
            println!(
                "Employee: {} ({}){}{}",
                info.employee_name.as_deref().unwrap_or("unknown"),
                flow.employee_id(),
                if badges.is_empty() { "" } else { ", " },
                badges.join(", ")
            );
            println!("Geofence: {}", view.summary());
            match flow.today().await? {
                Some(row) => print_rows(std::slice::from_ref(&row)),
                None => println!("No attendance marked today."),
            }
        }

        Command::CheckIn { wfh } => {
            perform_action(cli, config, api, CheckAction::CheckIn, *wfh).await?;
        }

        Command::CheckOut { wfh } => {
            perform_action(cli, config, api, CheckAction::CheckOut, *wfh).await?;
        }

        Command::List { date, pending } => {
            print_day(&service, effective_date(*date), list_mode(*pending)).await?;
        }

        Command::Edit {
            attendance_id,
            date,
            mode,
            check_in,
            check_out,
        } => {
            let date = effective_date(*date);
            let check_in = parse_opt_time(date, check_in.as_deref())?;
            let check_out = parse_opt_time(date, check_out.as_deref())?;
            let ack = service
                .single_edit(attendance_id, date, (*mode).into(), check_in, check_out)
                .await?;
            println!("{}", ack.message);
            print_day(&service, date, ListMode::All).await?;
        }

        Command::Bulk {
            date,
            op,
            ids,
            pending,
            check_in,
            check_out,
        } => {
            let date = effective_date(*date);
            let targets = if ids.is_empty() {
                let listed = service.list_for_date(date, list_mode(*pending)).await?;
                resolve_targets(&[], &listed)
            } else {
                ids.clone()
            };
            let check_in = parse_opt_time(date, check_in.as_deref())?;
            let check_out = parse_opt_time(date, check_out.as_deref())?;
            let result = service
                .bulk_edit(date, &targets, (*op).into(), check_in, check_out)
                .await?;
            println!("{}", result.summary());
            for failure in &result.failed_updates {
                println!(
                    "  failed {}: {}",
                    failure.attendance_id.as_deref().unwrap_or("?"),
                    failure.error.as_deref().unwrap_or("unknown error")
                );
            }
            print_day(&service, date, ListMode::All).await?;
        }

        Command::QuickCheckout {
            attendance_id,
            date,
            hour,
        } => {
            let date = effective_date(*date);
            let ack = service.quick_checkout(attendance_id, date, *hour).await?;
            println!("{}", ack.message);
            print_day(&service, date, ListMode::All).await?;
        }

        Command::Delete {
            attendance_id,
            date,
            reason,
            yes,
        } => {
            let date = effective_date(*date);
            let listed = service.list_for_date(date, ListMode::All).await?;
            match listed.iter().find(|row| row.id == *attendance_id) {
                Some(row) => {
                    let kind = RemovalKind::for_record(row);
                    println!(
                        "This will {} {} ({}, {}).",
                        kind.verb(),
                        row.id,
                        row.employee_name,
                        if row.is_submitted() {
                            "submitted - cancellation keeps the audit trail"
                        } else {
                            "draft - deletion is permanent"
                        }
                    );
                }
                None => println!(
                    "Record {attendance_id} is not in the {date} listing; \
                     submitted records are cancelled, drafts are deleted."
                ),
            }
            if !*yes {
                anyhow::bail!("refusing to remove {attendance_id} without --yes");
            }
            let ack = service.delete_or_cancel(attendance_id, reason).await?;
            println!("{}", ack.message);
            print_day(&service, date, ListMode::All).await?;
        }

        Command::Stats { date } => {
            let stats = service.statistics(effective_date(*date)).await?;
            let counts = &stats.counts;
            println!("Attendance for {}", stats.date);
            println!(
                "  employees: {} total, {} working, {} on holiday",
                stats.total_employees, stats.working_employees, stats.employees_on_holiday
            );
            println!(
                "  records:   {} total ({} draft, {} submitted)",
                counts.total_records, counts.draft_records, counts.submitted_records
            );
            println!(
                "  times:     {} checked in, {} checked out, {} missing checkout, {} missing check-in",
                counts.has_checkin, counts.has_checkout, counts.missing_checkout, counts.missing_checkin
            );
            println!(
                "  complete:  {} records, {:.1}% attendance rate",
                counts.complete_records, stats.attendance_rate
            );
        }

        Command::Wfh { command } => match command {
            WfhCommand::List => {
                for employee in service.wfh_roster().await? {
                    println!(
                        "{:<18} {:<28} {:<10} {}",
                        employee.id,
                        employee.employee_name,
                        employee.status,
                        if employee.wfh_eligible { "WFH eligible" } else { "-" }
                    );
                }
            }
            WfhCommand::Set {
                employee_id,
                eligible,
            } => {
                let ack = service.set_wfh_eligibility(employee_id, *eligible).await?;
                println!("{}", ack.message);
            }
        },
    }

    Ok(())
}

/// Run the check-in/out flow: evaluate the geofence, perform the
/// action, print the receipt and today's refreshed row.
async fn perform_action(
    cli: &Cli,
    config: &AppConfig,
    api: &HrmsClient,
    action: CheckAction,
    wfh: bool,
) -> anyhow::Result<()> {
    let provider = position_provider(cli, config);
    let mut flow =
        CheckInFlow::open(api, provider.as_ref(), config.location.position_request()).await?;

    if wfh {
        flow.set_wfh(true)?;
    } else {
        let view = flow.refresh().await?;
        println!("Geofence: {}", view.summary());
    }

    let outcome = flow.perform(action).await?;
    println!("{}: {}", outcome.receipt.status, outcome.receipt.message);
    if let Some(row) = outcome.today {
        print_rows(std::slice::from_ref(&row));
    }
    Ok(())
}

fn init_config(path: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config already exists at {}; pass --force to overwrite",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    AppConfig::default().save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Initialize logging: stderr always, plus a daily-rolling file when
/// enabled by flag or config. The guard must stay alive for the file
/// writer to flush.
fn init_logging(
    log: &LogConfig,
    file_flag: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_flag || log.file_enabled {
        let dir = log.dir.clone().unwrap_or_else(AppConfig::default_log_dir);
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
            &dir,
            "geo-attendance.log",
        ));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        None
    }
}

fn build_client(cli: &Cli, config: &AppConfig) -> anyhow::Result<HrmsClient> {
    let sid = cli
        .sid
        .clone()
        .or_else(|| std::env::var("GEO_ATTENDANCE_SID").ok())
        .context("no session id: pass --sid or set GEO_ATTENDANCE_SID")?;
    let mut session = SessionContext::new(sid);
    if let Some(employee) = &cli.employee {
        session = session.with_employee(employee);
    }

    let mut server = config.server.clone();
    if let Some(url) = &cli.server {
        server.base_url = url.clone();
    }
    anyhow::ensure!(
        !server.base_url.is_empty(),
        "no server configured: pass --server or set [server] base_url in the config"
    );

    Ok(HrmsClient::from_config(&server, session)?)
}

/// A terminal has no GPS; positions come from flags or config, in that
/// order. With neither, acquisition fails recoverably and in-office
/// actions stay blocked while WFH still works.
fn position_provider(cli: &Cli, config: &AppConfig) -> Box<dyn LocationProvider> {
    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        Box::new(FixedPosition::new(lat, lon))
    } else if let Some((lat, lon)) = config.location.fixed_coordinates() {
        Box::new(FixedPosition::new(lat, lon))
    } else {
        Box::new(NoPositionSource)
    }
}

struct NoPositionSource;

#[async_trait]
impl LocationProvider for NoPositionSource {
    async fn ensure_permission(&self) -> app::Result<()> {
        Ok(())
    }

    async fn current_position(&self, _request: &PositionRequest) -> app::Result<DevicePosition> {
        Err(AppError::location_unavailable(
            "no position source configured; pass --lat/--lon or set [location] in the config",
        ))
    }
}

fn effective_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn list_mode(pending: bool) -> ListMode {
    if pending {
        ListMode::PendingOnly
    } else {
        ListMode::All
    }
}

/// Accepts the wire `YYYY-MM-DD HH:MM:SS` form or a bare `HH:MM[:SS]`
/// applied to the selected date.
fn parse_time(date: NaiveDate, raw: &str) -> anyhow::Result<NaiveDateTime> {
    if let Some(ts) = wire_time::from_wire(raw) {
        return Ok(ts);
    }
    for format in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(raw, format) {
            return Ok(date.and_time(time));
        }
    }
    anyhow::bail!("invalid time '{raw}': use 'YYYY-MM-DD HH:MM:SS' or 'HH:MM'")
}

fn parse_opt_time(date: NaiveDate, raw: Option<&str>) -> anyhow::Result<Option<NaiveDateTime>> {
    raw.map(|raw| parse_time(date, raw)).transpose()
}

/// Fetch and print a day's rows. Mutations end here so the admin sees
/// the backend's refreshed state rather than the pre-edit rows.
async fn print_day(
    service: &ReconcileService<'_>,
    date: NaiveDate,
    mode: ListMode,
) -> anyhow::Result<()> {
    let rows = service.list_for_date(date, mode).await?;
    if rows.is_empty() {
        println!("No attendance records for {date}.");
    } else {
        print_rows(&rows);
    }
    Ok(())
}

fn print_rows(rows: &[AttendanceRecord]) {
    for row in rows {
        println!(
            "{:<22} {:<24} in {:<20} out {:<20} {:<18} {}",
            row.id,
            row.employee_name,
            fmt_time(row.in_time),
            fmt_time(row.effective_out_time()),
            row.completion_state(),
            if row.is_submitted() { "submitted" } else { "draft" }
        );
    }
}

fn fmt_time(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| wire_time::to_wire(&t))
        .unwrap_or_else(|| "-".to_string())
}
