#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use roulement::{
    io,
    model::{AssignmentId, ManagerResponse, Priority, ScheduleId, SwapId, TargetResponse},
    notification::{prepare_reminder, LogSink, TextReminder},
    storage::{JsonStorage, Storage, Workspace},
    store::NewAssignment,
    swap::NewSwapRequest,
    template::NewTemplate,
    EngineConfig,
};
use std::sync::Arc;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI minimaliste de planification de vacations (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de planning
    #[arg(long, global = true, default_value = "planning.json")]
    planning: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer un template de vacation
    TemplateAdd {
        /// Code unique, majuscules (ex. MAT, NUIT)
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        /// HH:MM (UTC)
        #[arg(long)]
        start: String,
        /// HH:MM (UTC) ; <= start pour une vacation de nuit
        #[arg(long)]
        end: String,
        #[arg(long)]
        break_start: Option<String>,
        #[arg(long)]
        break_end: Option<String>,
        #[arg(long, default_value_t = false)]
        overtime_eligible: bool,
    },

    /// Lister les templates actifs
    TemplateList,

    /// Désactiver un template (les affectations existantes restent valides)
    TemplateDeactivate {
        #[arg(long)]
        code: String,
    },

    /// Importer des employés depuis un CSV
    ImportEmployees {
        #[arg(long)]
        csv: String,
    },

    /// Affecter un employé à un template pour une date
    Assign {
        #[arg(long)]
        handle: String,
        #[arg(long)]
        template: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Affectation automatique par roulement sur une période
    AutoAssign {
        #[arg(long)]
        template: String,
        /// YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// YYYY-MM-DD (inclus)
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = 1)]
        headcount: usize,
    },

    /// Pointer l'arrivée sur une affectation
    CheckIn {
        #[arg(long)]
        assignment: String,
    },

    /// Pointer la sortie d'une affectation
    CheckOut {
        #[arg(long)]
        assignment: String,
    },

    /// Annuler une affectation
    Cancel {
        #[arg(long)]
        assignment: String,
        #[arg(long)]
        reason: String,
    },

    /// Créneaux libres d'un employé pour une journée
    Slots {
        #[arg(long)]
        handle: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Durée requise en minutes : filtre et classe les créneaux
        #[arg(long)]
        required: Option<i64>,
    },

    /// Vérifier les conflits du planning entier
    Check {
        /// Export CSV du rapport (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Demander un échange de vacation
    SwapRequest {
        #[arg(long)]
        requester: String,
        #[arg(long)]
        assignment: String,
        #[arg(long)]
        with: String,
        /// Affectation de la cible ; omise pour une demande ouverte
        #[arg(long)]
        target_assignment: Option<String>,
        /// Échéance RFC3339 UTC
        #[arg(long)]
        expires: String,
        #[arg(long, default_value_t = false)]
        emergency: bool,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Répondre à une demande d'échange (cible)
    SwapRespond {
        #[arg(long)]
        swap: String,
        #[arg(long)]
        responder: String,
        #[arg(long)]
        accept: bool,
        /// Affectation offerte en retour (demande ouverte)
        #[arg(long)]
        assignment: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Trancher une demande d'échange (manager)
    SwapApprove {
        #[arg(long)]
        swap: String,
        #[arg(long)]
        manager: String,
        #[arg(long)]
        approve: bool,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Annuler une demande d'échange (demandeur)
    SwapCancel {
        #[arg(long)]
        swap: String,
        #[arg(long)]
        requester: String,
    },

    /// Expirer les demandes d'échange dont l'échéance est passée
    ExpireSweep,

    /// Créer un planning vide en brouillon
    ScheduleCreate {
        #[arg(long)]
        name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// YYYY-MM-DD (inclus)
        #[arg(long)]
        to: String,
        /// Planning additionnel, superposable au roulement principal
        #[arg(long, default_value_t = false)]
        extra: bool,
        #[arg(long)]
        created_by: String,
    },

    /// Archiver un planning publié
    Archive {
        #[arg(long)]
        schedule: String,
        /// Archiver avant la fin de la période
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Statistiques d'une période (globales ou par employé)
    Stats {
        #[arg(long)]
        handle: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// YYYY-MM-DD (inclus)
        #[arg(long)]
        to: String,
    },

    /// Générer un planning hebdomadaire par roulement
    Generate {
        #[arg(long)]
        name: String,
        /// Lundi de la semaine, YYYY-MM-DD
        #[arg(long)]
        week: String,
        /// liste "handle:TEMPLATE,handle:TEMPLATE,..."
        #[arg(long)]
        rotation: String,
        #[arg(long)]
        created_by: String,
    },

    /// Publier un planning en brouillon
    Publish {
        #[arg(long)]
        schedule: String,
        #[arg(long)]
        by: String,
    },

    /// Lister et optionnellement exporter les affectations
    List {
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Générer un rappel texte pour un employé
    Notify {
        #[arg(long)]
        handle: String,
        #[arg(long, default_value_t = 2)]
        days_before: i64,
        /// Fichier de sortie (texte brut)
        #[arg(long)]
        out: String,
    },
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| anyhow::anyhow!("invalid time (expected HH:MM): {raw}"))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("invalid date (expected YYYY-MM-DD): {raw}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.planning)?;
    let planning = storage.load().unwrap_or_default();
    let workspace = Workspace::from_planning(planning, EngineConfig::default(), Arc::new(LogSink));

    let code = match cli.cmd {
        Commands::TemplateAdd {
            code,
            name,
            start,
            end,
            break_start,
            break_end,
            overtime_eligible,
        } => {
            let spec = NewTemplate {
                code,
                name,
                description: None,
                start: parse_time(&start)?,
                end: parse_time(&end)?,
                break_start: break_start.as_deref().map(parse_time).transpose()?,
                break_end: break_end.as_deref().map(parse_time).transpose()?,
                overtime_eligible,
                sort_order: 0,
            };
            let template = workspace.catalog.create(spec)?;
            println!("template {} created", template.code);
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::TemplateList => {
            for t in workspace.catalog.list_active() {
                println!(
                    "{} | {} | {} → {} | {:.1}h",
                    t.code,
                    t.name,
                    t.start,
                    t.end,
                    t.duration_minutes() as f64 / 60.0
                );
            }
            0
        }
        Commands::TemplateDeactivate { code } => {
            workspace.catalog.deactivate(&code)?;
            println!("template {code} deactivated");
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::ImportEmployees { csv } => {
            let employees = io::import_employees_csv(csv)?;
            let count = employees.len();
            for employee in employees {
                workspace.store.add_employee(employee)?;
            }
            println!("{count} employee(s) imported");
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::Assign {
            handle,
            template,
            date,
        } => {
            let employee = workspace.store.employee_by_handle(&handle)?;
            let assignment = workspace.store.create(
                NewAssignment {
                    employee: employee.id,
                    date: parse_date(&date)?,
                    template: Some(template),
                    start: None,
                    end: None,
                    schedule: None,
                    notes: None,
                },
                Utc::now(),
            )?;
            println!("assignment {} created", assignment.id.as_str());
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::AutoAssign {
            template,
            from,
            to,
            headcount,
        } => {
            let from = parse_date(&from)?;
            let to = parse_date(&to)?;
            if to < from {
                bail!("--to must not precede --from");
            }
            let mut dates = Vec::new();
            let mut date = from;
            while date <= to {
                dates.push(date);
                date = match date.succ_opt() {
                    Some(d) => d,
                    None => break,
                };
            }
            let report = workspace
                .store
                .auto_assign(&template, &dates, headcount, None, Utc::now())?;
            println!(
                "{} assignment(s) created, {} slot(s) skipped",
                report.created.len(),
                report.skipped.len()
            );
            for (date, employee, reason) in &report.skipped {
                eprintln!("skipped {} for {}: {}", date, employee.as_str(), reason);
            }
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::CheckIn { assignment } => {
            let updated = workspace
                .store
                .check_in(&AssignmentId::new(assignment), Utc::now())?;
            println!("checked in ({:?})", updated.attendance);
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::CheckOut { assignment } => {
            let updated = workspace
                .store
                .check_out(&AssignmentId::new(assignment), Utc::now())?;
            println!(
                "checked out: {:.2}h worked, {:.2}h overtime",
                updated.actual_hours().unwrap_or(0.0),
                updated.overtime_hours()
            );
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::Cancel { assignment, reason } => {
            workspace
                .store
                .cancel(&AssignmentId::new(assignment), &reason, Utc::now())?;
            println!("assignment cancelled");
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::Slots {
            handle,
            date,
            required,
        } => {
            let employee = workspace.store.employee_by_handle(&handle)?;
            let date = parse_date(&date)?;
            let own = workspace.store.by_employee(&employee.id);
            let slots = match required {
                Some(minutes) => workspace
                    .store
                    .engine()
                    .alternative_time_slots(&own, date, minutes),
                None => workspace.store.engine().available_time_slots(&own, date),
            };
            if slots.is_empty() {
                println!("no free slot on {date}");
            }
            for slot in slots {
                println!(
                    "{} → {} | {:.1}h{}",
                    slot.start.to_rfc3339(),
                    slot.end.to_rfc3339(),
                    slot.max_minutes as f64 / 60.0,
                    if slot.preferred { " | preferred" } else { "" }
                );
            }
            0
        }
        Commands::Check { report } => {
            let employees = workspace.store.employees();
            let assignments = workspace.store.snapshot();
            let findings = workspace.store.engine().audit(&employees, &assignments);
            if findings.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", findings.len());
                if let Some(path) = report {
                    io::export_conflicts_csv(path, &employees, &findings)?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::SwapRequest {
            requester,
            assignment,
            with,
            target_assignment,
            expires,
            emergency,
            reason,
        } => {
            let requester = workspace.store.employee_by_handle(&requester)?;
            let target = workspace.store.employee_by_handle(&with)?;
            let request = workspace.swaps.create(
                NewSwapRequest {
                    requester: requester.id,
                    requester_assignment: AssignmentId::new(assignment),
                    target_employee: target.id,
                    target_assignment: target_assignment.map(AssignmentId::new),
                    priority: if emergency {
                        Priority::High
                    } else {
                        Priority::Medium
                    },
                    emergency,
                    reason,
                    expires_at: expires.parse()?,
                },
                Utc::now(),
            )?;
            println!("swap request {} created", request.id.as_str());
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::SwapRespond {
            swap,
            responder,
            accept,
            assignment,
            reason,
        } => {
            let responder = workspace.store.employee_by_handle(&responder)?;
            let response = if accept {
                TargetResponse::Accepted
            } else {
                TargetResponse::Rejected
            };
            let updated = workspace.swaps.respond_by_target(
                &SwapId::new(swap),
                &responder.id,
                response,
                reason,
                assignment.map(AssignmentId::new),
                Utc::now(),
            )?;
            println!("swap request is now {:?}", updated.status);
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::SwapApprove {
            swap,
            manager,
            approve,
            reason,
        } => {
            let manager = workspace.store.employee_by_handle(&manager)?;
            let response = if approve {
                ManagerResponse::Approved
            } else {
                ManagerResponse::Rejected
            };
            let updated = workspace.swaps.approve_by_manager(
                &SwapId::new(swap),
                &manager.id,
                response,
                reason,
                Utc::now(),
            )?;
            println!("swap request is now {:?}", updated.status);
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::SwapCancel { swap, requester } => {
            let requester = workspace.store.employee_by_handle(&requester)?;
            let updated = workspace
                .swaps
                .cancel(&SwapId::new(swap), &requester.id, Utc::now())?;
            println!("swap request is now {:?}", updated.status);
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::ExpireSweep => {
            let expired = workspace.swaps.mark_expired_requests(Utc::now());
            println!("{expired} request(s) expired");
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::Generate {
            name,
            week,
            rotation,
            created_by,
        } => {
            let created_by = workspace.store.employee_by_handle(&created_by)?;
            let mut entries = Vec::new();
            for chunk in rotation.split(',').filter(|c| !c.trim().is_empty()) {
                let (handle, template) = chunk
                    .trim()
                    .split_once(':')
                    .ok_or_else(|| anyhow::anyhow!("expected handle:TEMPLATE, got {chunk}"))?;
                let employee = workspace.store.employee_by_handle(handle.trim())?;
                entries.push(roulement::RotationEntry {
                    employee: employee.id,
                    template_code: template.trim().to_string(),
                });
            }
            let report = workspace.schedules.generate_weekly(
                &name,
                parse_date(&week)?,
                &entries,
                created_by.id,
                Utc::now(),
            )?;
            println!(
                "schedule {} generated: {} assignment(s), {} skipped",
                report.schedule.id.as_str(),
                report.created,
                report.skipped.len()
            );
            for slot in &report.skipped {
                eprintln!(
                    "skipped {} for {}: {}",
                    slot.date,
                    slot.employee.as_str(),
                    slot.reason
                );
            }
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::ScheduleCreate {
            name,
            from,
            to,
            extra,
            created_by,
        } => {
            let created_by = workspace.store.employee_by_handle(&created_by)?;
            let kind = if extra {
                roulement::ScheduleKind::Extra
            } else {
                roulement::ScheduleKind::Primary
            };
            let schedule = workspace.schedules.create(
                &name,
                parse_date(&from)?,
                parse_date(&to)?,
                kind,
                created_by.id,
            )?;
            println!("schedule {} created", schedule.id.as_str());
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::Archive { schedule, force } => {
            let archived =
                workspace
                    .schedules
                    .archive(&ScheduleId::new(schedule), Utc::now(), force)?;
            println!("schedule {} archived", archived.name);
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::Stats { handle, from, to } => {
            let from = parse_date(&from)?;
            let to = parse_date(&to)?;
            let assignments = workspace.store.snapshot();
            match handle {
                Some(handle) => {
                    let employee = workspace.store.employee_by_handle(&handle)?;
                    let summary =
                        roulement::stats::working_hours_summary(&assignments, &employee.id, from, to);
                    println!(
                        "{}: {} shift(s), {:.1}h planned, {:.1}h worked, {:.1}h overtime, attendance {:.0}%",
                        handle,
                        summary.total_shifts,
                        summary.planned_hours(),
                        summary.actual_hours(),
                        summary.overtime_hours(),
                        summary.attendance_rate() * 100.0
                    );
                }
                None => {
                    let stats = roulement::stats::assignment_statistics(&assignments, from, to);
                    println!(
                        "{} assignment(s), {} employee(s): {} scheduled, {} completed, {} cancelled, {} no-show",
                        stats.total,
                        stats.distinct_employees,
                        stats.scheduled,
                        stats.completed,
                        stats.cancelled,
                        stats.no_shows
                    );
                    let swaps = roulement::stats::swap_statistics(&workspace.swaps.snapshot());
                    println!(
                        "{} swap request(s): {} live, {} executed, {} rejected, {} expired",
                        swaps.total, swaps.live, swaps.executed, swaps.rejected, swaps.expired
                    );
                }
            }
            0
        }
        Commands::Publish { schedule, by } => {
            let by = workspace.store.employee_by_handle(&by)?;
            let published =
                workspace
                    .schedules
                    .publish(&ScheduleId::new(schedule), by.id, Utc::now())?;
            println!("schedule {} published", published.name);
            storage.save(&workspace.to_planning())?;
            0
        }
        Commands::List { out_json, out_csv } => {
            let employees = workspace.store.employees();
            let assignments = workspace.store.snapshot();
            if let Some(path) = out_json {
                let json = serde_json::to_string_pretty(&workspace.to_planning())?;
                std::fs::write(path, json)?;
            }
            if let Some(path) = out_csv {
                io::export_assignments_csv(path, &employees, &assignments)?;
            }
            // impression compacte
            for a in &assignments {
                let handle = employees
                    .iter()
                    .find(|e| e.id == a.employee)
                    .map(|e| e.handle.as_str())
                    .unwrap_or("-");
                println!(
                    "{} | {} {} → {} | {} | {:?}",
                    a.id.as_str(),
                    a.date,
                    a.start,
                    a.end,
                    handle,
                    a.status
                );
            }
            0
        }
        Commands::Notify {
            handle,
            days_before,
            out,
        } => {
            let renderer = TextReminder;
            let employees = workspace.store.employees();
            let assignments = workspace.store.snapshot();
            let reminder = prepare_reminder(
                &employees,
                &assignments,
                &handle,
                days_before,
                Utc::now(),
                &renderer,
            )?;
            std::fs::write(&out, reminder.content)?;
            println!(
                "Reminder generated for {} (assignment {}) at {}",
                reminder.employee_handle,
                reminder.assignment_id,
                reminder.notice_at.to_rfc3339()
            );
            0
        }
    };

    std::process::exit(code);
}
