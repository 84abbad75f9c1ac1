//! Command-line surface of the `zool412` binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use zool412_core::model::resources::{AcquisitionType, AnimalSpecies, Article, TechAssistant};
use zool412_core::StationKind;

/// Top-level CLI parser for the `zool412` binary.
#[derive(Debug, Parser)]
#[command(name = "zool412", version, about = "ZOOL412 autostation lab backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file (overrides configuration)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the database and apply migrations
    Init {
        /// Delete the existing database file first
        #[arg(long)]
        reset: bool,
    },
    /// Write the starting inventory, catalog prices and test users
    Seed,
    /// Set a species capacity and fill its stock (negative max locks it)
    Unlock {
        #[arg(long, value_parser = parse_species)]
        species: AnimalSpecies,
        #[arg(long, allow_hyphen_values = true)]
        max: i64,
    },
    /// Advance the game clock by one week
    AdvanceWeek,
    /// Show the inventory
    Inventory,
    /// List users
    Users,
    /// List catalog prices
    Catalog,
    /// List orders
    Orders(ListArgs),
    /// List experiments
    Experiments(ListArgs),
    /// Show one experiment with its detail
    Experiment {
        id: i64,
    },
    /// Show ledger entries, newest first
    Ledger {
        #[arg(long)]
        user: Option<i64>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Purchase an article
    Order {
        #[arg(long)]
        user: i64,
        #[arg(long, value_parser = parse_article)]
        article: Article,
        #[arg(long, value_parser = parse_acquisition, default_value = "standard")]
        acquisition: AcquisitionType,
    },
    /// Give one juice dose to a technical assistant
    Juice {
        #[arg(long)]
        user: i64,
        /// Assistant name (`saltos`) or shift column (`ta_saltos_shifts`)
        #[arg(long, value_parser = parse_ta)]
        ta: TechAssistant,
    },
    /// Refill a species to capacity
    Hunt {
        #[arg(long)]
        user: i64,
        #[arg(long, value_parser = parse_species)]
        species: AnimalSpecies,
    },
    /// Quote and book an experiment
    Book(BookArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub user: Option<i64>,
    /// Only entries still waiting
    #[arg(long)]
    pub pending: bool,
}

#[derive(Debug, Args)]
pub struct BookArgs {
    #[arg(value_parser = parse_station)]
    pub station: StationKind,
    #[arg(long)]
    pub user: i64,
    /// Form as JSON text, or `@path` to read it from a file
    #[arg(long)]
    pub form: String,
    /// Book without asking for confirmation
    #[arg(long)]
    pub yes: bool,
}

fn parse_named<T: Copy>(
    value: &str,
    parse: fn(&str) -> Option<T>,
    all: &[T],
    name: fn(T) -> &'static str,
) -> Result<T, String> {
    parse(value.trim()).ok_or_else(|| {
        let accepted: Vec<&str> = all.iter().map(|item| name(*item)).collect();
        format!("expected one of: {}", accepted.join(", "))
    })
}

fn parse_species(value: &str) -> Result<AnimalSpecies, String> {
    parse_named(value, AnimalSpecies::parse, AnimalSpecies::ALL, AnimalSpecies::as_str)
}

fn parse_article(value: &str) -> Result<Article, String> {
    parse_named(value, Article::parse, Article::ALL, Article::as_str)
}

fn parse_acquisition(value: &str) -> Result<AcquisitionType, String> {
    parse_named(
        value,
        AcquisitionType::parse,
        AcquisitionType::ALL,
        AcquisitionType::as_str,
    )
}

fn parse_ta(value: &str) -> Result<TechAssistant, String> {
    parse_named(
        value,
        TechAssistant::from_name_or_column,
        TechAssistant::ALL,
        TechAssistant::as_str,
    )
}

fn parse_station(value: &str) -> Result<StationKind, String> {
    parse_named(value, StationKind::parse, StationKind::ALL, StationKind::as_str)
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands};
    use zool412_core::model::resources::{AcquisitionType, AnimalSpecies, TechAssistant};
    use zool412_core::StationKind;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["zool412", "inventory", "--db", "/tmp/lab.db"])
            .expect("cli should parse");
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/lab.db")));
        assert!(matches!(cli.command, Commands::Inventory));
    }

    #[test]
    fn order_defaults_to_standard_acquisition() {
        let cli = Cli::try_parse_from([
            "zool412",
            "order",
            "--user",
            "1",
            "--article",
            "xatty_cartridge",
        ])
        .expect("cli should parse");
        match cli.command {
            Commands::Order { acquisition, .. } => {
                assert_eq!(acquisition, AcquisitionType::Standard)
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn juice_accepts_shift_column_name() {
        let cli = Cli::try_parse_from([
            "zool412",
            "juice",
            "--user",
            "1",
            "--ta",
            "ta_saltos_shifts",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Juice {
                ta: TechAssistant::Saltos,
                ..
            }
        ));
    }

    #[test]
    fn unlock_accepts_negative_max() {
        let cli = Cli::try_parse_from([
            "zool412",
            "unlock",
            "--species",
            "animals_c248_s",
            "--max",
            "-1",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Unlock {
                species: AnimalSpecies::C248S,
                max: -1
            }
        ));
    }

    #[test]
    fn book_parses_station_and_form() {
        let cli = Cli::try_parse_from([
            "zool412",
            "book",
            "polykiln",
            "--user",
            "2",
            "--form",
            "@form.json",
            "--yes",
        ])
        .expect("cli should parse");
        match cli.command {
            Commands::Book(args) => {
                assert_eq!(args.station, StationKind::Polykiln);
                assert_eq!(args.user, 2);
                assert_eq!(args.form, "@form.json");
                assert!(args.yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_species_is_rejected() {
        let parsed = Cli::try_parse_from(["zool412", "hunt", "--user", "1", "--species", "cats"]);
        assert!(parsed.is_err());
    }
}
