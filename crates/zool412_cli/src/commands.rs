//! Command handlers: open storage, call a service, print the outcome.

use crate::cli::{BookArgs, Commands, ListArgs};
use anyhow::{bail, Context};
use log::info;
use std::io::{BufRead, Write};
use zool412_core::db::migrations::latest_version;
use zool412_core::db::Connection;
use zool412_core::model::experiment::ExperimentListQuery;
use zool412_core::model::ledger::LedgerQuery;
use zool412_core::model::order::OrderListQuery;
use zool412_core::repo::{
    CatalogRepository, LedgerRepository, SqliteCatalogRepository, SqliteClockRepository,
    SqliteExperimentRepository, SqliteInventoryRepository, SqliteLedgerRepository,
    SqliteOrderRepository, SqliteUserRepository, UserRepository,
};
use zool412_core::service::{
    AdminService, BookingQuote, ClockService, ExperimentService, HuntingService, OrderService,
};
use zool412_core::station::{
    GeneWeaverDgeRequest, GeneWeaverViralRequest, IntraspectraRtRequest,
    IntraspectraVisualRequest, NeuroCartographerRequest, PanopticamRequest, PolykilnRequest,
    VirgoAnalysisRequest, VirgoSynthesisRequest,
};
use zool412_core::{open_db, reset_db, AppConfig, BookingRequest, StationKind};

const CONFIRM_PROMPT: &str = "Proceed with booking this experiment? [Y/n] ";

pub fn dispatch(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    let db_path = &config.database.path;

    if let Commands::Init { reset } = command {
        let _conn = if reset {
            reset_db(db_path)
        } else {
            open_db(db_path)
        }
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
        println!(
            "database ready at {} (schema version {})",
            db_path.display(),
            latest_version()
        );
        return Ok(());
    }

    let conn = open_db(db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Seed => seed(&conn),
        Commands::Unlock { species, max } => {
            let inventory = admin_service(&conn)?.unlock_species(species, max)?;
            print_json(serde_json::to_value(inventory.animal_stock(species))?)
        }
        Commands::AdvanceWeek => {
            let report = ClockService::new(SqliteClockRepository::try_new(&conn)?)
                .advance_one_week()?;
            println!("week {}", report.week);
            for order in &report.delivered {
                println!("  delivered order {}: {}", order.key, order.article.display_name());
            }
            for experiment in &report.completed {
                println!(
                    "  completed experiment {}: {} ({})",
                    experiment.id, experiment.experiment_type, experiment.autostation
                );
            }
            Ok(())
        }
        Commands::Inventory => {
            print_json(serde_json::to_value(admin_service(&conn)?.inventory()?)?)
        }
        Commands::Users => print_json(serde_json::to_value(
            SqliteUserRepository::try_new(&conn)?.list_users()?,
        )?),
        Commands::Catalog => print_json(serde_json::to_value(
            SqliteCatalogRepository::try_new(&conn)?.list_items()?,
        )?),
        Commands::Orders(ListArgs { user, pending }) => {
            let orders = order_service(&conn)?.list_orders(&OrderListQuery {
                user_id: user,
                pending_only: pending,
            })?;
            print_json(serde_json::to_value(orders)?)
        }
        Commands::Experiments(ListArgs { user, pending }) => {
            let experiments = experiment_service(&conn)?.list(&ExperimentListQuery {
                user_id: user,
                autostation: None,
                pending_only: pending,
            })?;
            print_json(serde_json::to_value(experiments)?)
        }
        Commands::Experiment { id } => {
            print_json(serde_json::to_value(experiment_service(&conn)?.get(id)?)?)
        }
        Commands::Ledger { user, limit } => {
            let ledger = SqliteLedgerRepository::try_new(&conn)?;
            let entries = ledger.list_entries(&LedgerQuery {
                user_id: user,
                action_type: None,
                limit,
            })?;
            print_json(serde_json::to_value(&entries)?)?;
            if let Some(user_id) = user {
                println!("total spent: {:.2} chuan", ledger.total_spent(user_id)?);
            }
            Ok(())
        }
        Commands::Order {
            user,
            article,
            acquisition,
        } => {
            let order = order_service(&conn)?.place_order(user, article, acquisition)?;
            println!(
                "order {} placed: {} for {:.2} chuan, arrives in {} week(s)",
                order.key,
                order.article.display_name(),
                order.value,
                order.wait_weeks
            );
            Ok(())
        }
        Commands::Juice { user, ta } => {
            order_service(&conn)?.administer_juice(user, ta)?;
            let inventory = admin_service(&conn)?.inventory()?;
            println!(
                "{ta} juiced: {} shifts, {} juice left",
                inventory.shifts(ta),
                inventory.juice
            );
            Ok(())
        }
        Commands::Hunt { user, species } => {
            let collection = HuntingService::new(SqliteInventoryRepository::try_new(&conn)?)
                .collect_animals(user, species)?;
            println!(
                "collected {} {} using {} shift(s)",
                collection.collected,
                species,
                collection.shifts.total()
            );
            Ok(())
        }
        Commands::Book(args) => book(&conn, args),
    }
}

fn seed(conn: &Connection) -> anyhow::Result<()> {
    let admin = admin_service(conn)?;
    match admin.initialize_inventory() {
        Ok(_) => println!("inventory initialized"),
        Err(zool412_core::RepoError::InventoryAlreadyInitialized) => {
            println!("inventory already initialized")
        }
        Err(err) => return Err(err.into()),
    }
    let items = admin.initialize_item_catalog()?;
    println!("catalog has {} item(s)", items.len());
    let created = admin.create_test_users()?;
    println!("created {} test user(s)", created.len());
    Ok(())
}

fn book(conn: &Connection, args: BookArgs) -> anyhow::Result<()> {
    let form = read_form(&args.form)?;
    let request = decode_form(args.station, &form)?;
    let service = experiment_service(conn)?;

    let quote = service.quote(&request)?;
    print_quote(&quote);
    if !quote.is_affordable() {
        bail!("booking cancelled: inventory cannot cover this experiment");
    }
    if !args.yes && !confirm(CONFIRM_PROMPT)? {
        info!("event=booking_declined module=cli status=ok station={}", args.station);
        println!("booking cancelled");
        return Ok(());
    }

    let record = service.book(args.user, &request)?;
    println!(
        "booked experiment {} ({}), ready in {} week(s)",
        record.experiment.id, record.experiment.experiment_type, record.experiment.wait_weeks
    );
    Ok(())
}

fn read_form(form: &str) -> anyhow::Result<String> {
    match form.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read form {path}"))
        }
        None => Ok(form.to_string()),
    }
}

/// Decodes a JSON form into the request type of `station`.
pub fn decode_form(station: StationKind, json: &str) -> anyhow::Result<BookingRequest> {
    let context = || format!("invalid {station} form");
    let request = match station {
        StationKind::GeneWeaverDge => BookingRequest::GeneWeaverDge(
            serde_json::from_str::<GeneWeaverDgeRequest>(json).with_context(context)?,
        ),
        StationKind::GeneWeaverViral => BookingRequest::GeneWeaverViral(
            serde_json::from_str::<GeneWeaverViralRequest>(json).with_context(context)?,
        ),
        StationKind::IntraspectraVisual => BookingRequest::IntraspectraVisual(
            serde_json::from_str::<IntraspectraVisualRequest>(json).with_context(context)?,
        ),
        StationKind::IntraspectraRt => BookingRequest::IntraspectraRt(
            serde_json::from_str::<IntraspectraRtRequest>(json).with_context(context)?,
        ),
        StationKind::NeuroCartographer => BookingRequest::NeuroCartographer(
            serde_json::from_str::<NeuroCartographerRequest>(json).with_context(context)?,
        ),
        StationKind::Panopticam => BookingRequest::Panopticam(
            serde_json::from_str::<PanopticamRequest>(json).with_context(context)?,
        ),
        StationKind::Polykiln => BookingRequest::Polykiln(
            serde_json::from_str::<PolykilnRequest>(json).with_context(context)?,
        ),
        StationKind::VirgoAnalysis => BookingRequest::VirgoAnalysis(
            serde_json::from_str::<VirgoAnalysisRequest>(json).with_context(context)?,
        ),
        StationKind::VirgoSynthesis => BookingRequest::VirgoSynthesis(
            serde_json::from_str::<VirgoSynthesisRequest>(json).with_context(context)?,
        ),
    };
    Ok(request)
}

fn print_quote(quote: &BookingQuote) {
    let plan = &quote.plan;
    println!("{} on {}", plan.experiment_type, plan.autostation);
    println!("  credits: {:.2} chuan", plan.draw.credits);
    println!("  TA shifts: {}", plan.draw.shifts);
    if let Some(article) = plan.draw.article {
        println!("  cartridge: {}", article.display_name());
    }
    if let Some(species) = plan.subject_species {
        println!("  species: {species}");
    }
    println!("  ready in: {} week(s)", plan.wait_weeks);
    for shortfall in &quote.shortfalls {
        println!("  missing: {shortfall}");
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

/// Only an empty answer or `y` (any case) confirms.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y")
}

fn print_json(value: serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn admin_service(
    conn: &Connection,
) -> anyhow::Result<
    AdminService<
        SqliteInventoryRepository<'_>,
        SqliteCatalogRepository<'_>,
        SqliteUserRepository<'_>,
    >,
> {
    Ok(AdminService::new(
        SqliteInventoryRepository::try_new(conn)?,
        SqliteCatalogRepository::try_new(conn)?,
        SqliteUserRepository::try_new(conn)?,
    ))
}

fn order_service(
    conn: &Connection,
) -> anyhow::Result<OrderService<SqliteCatalogRepository<'_>, SqliteOrderRepository<'_>>> {
    Ok(OrderService::new(
        SqliteCatalogRepository::try_new(conn)?,
        SqliteOrderRepository::try_new(conn)?,
    ))
}

fn experiment_service(
    conn: &Connection,
) -> anyhow::Result<ExperimentService<SqliteExperimentRepository<'_>, SqliteInventoryRepository<'_>>>
{
    Ok(ExperimentService::new(
        SqliteExperimentRepository::try_new(conn)?,
        SqliteInventoryRepository::try_new(conn)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::{decode_form, is_affirmative};
    use zool412_core::{BookingRequest, StationKind};

    #[test]
    fn only_empty_or_y_confirms() {
        assert!(is_affirmative("\n"));
        assert!(is_affirmative(" Y \n"));
        assert!(!is_affirmative("yes\n"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("nope"));
    }

    #[test]
    fn decode_form_selects_request_type() {
        let request = decode_form(
            StationKind::VirgoAnalysis,
            r#"{"sample_source_description": "pond water", "request_theta_analysis": true}"#,
        )
        .expect("form should decode");
        assert!(matches!(request, BookingRequest::VirgoAnalysis(_)));
        assert_eq!(request.kind(), StationKind::VirgoAnalysis);
    }

    #[test]
    fn decode_form_reports_station_on_error() {
        let err = decode_form(StationKind::Polykiln, "{}").unwrap_err();
        assert!(format!("{err:#}").contains("invalid polykiln form"));
    }
}
