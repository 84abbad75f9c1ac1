//! Autostation booking planners.
//!
//! # Responsibility
//! - Validate submitted experiment forms.
//! - Price each booking into a `ResourceDraw` and a persistable detail.
//!
//! # Invariants
//! - Planners are pure: they never touch storage or the inventory.
//! - A plan that validates here is only committed if the inventory still
//!   covers its draw at commit time.

use crate::model::experiment::{Autostation, ExperimentDetail};
use crate::model::inventory::ResourceDraw;
use crate::model::resources::AnimalSpecies;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod geneweaver;
pub mod intraspectra;
pub mod neurocartographer;
pub mod panopticam;
pub mod polykiln;
pub mod virgo;

pub use geneweaver::{DgeGroupForm, GeneWeaverDgeRequest, GeneWeaverViralRequest, ViralGroupForm};
pub use intraspectra::{IntraspectraRtRequest, IntraspectraVisualRequest};
pub use neurocartographer::NeuroCartographerRequest;
pub use panopticam::{
    ContingencyForm, EventForm, GroupForm, PanopticamRequest, PhaseForm,
};
pub use polykiln::PolykilnRequest;
pub use virgo::{VirgoAnalysisRequest, VirgoSynthesisRequest};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("valid word regex"));

text_enum! {
    /// Bookable autostation mode.
    pub enum StationKind {
        GeneWeaverDge => "geneweaver-dge",
        GeneWeaverViral => "geneweaver-viral",
        IntraspectraVisual => "intraspectra-visual",
        IntraspectraRt => "intraspectra-rt",
        NeuroCartographer => "neurocartographer",
        Panopticam => "panopticam",
        Polykiln => "polykiln",
        VirgoAnalysis => "virgo-analysis",
        VirgoSynthesis => "virgo-synthesis",
    }
}

/// Validated, priced booking ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingPlan {
    pub autostation: Autostation,
    pub experiment_type: &'static str,
    pub subject_species: Option<AnimalSpecies>,
    /// Weeks until the result is ready.
    pub wait_weeks: u32,
    pub draw: ResourceDraw,
    pub detail: ExperimentDetail,
}

/// Submitted experiment form for one of the autostation modes.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingRequest {
    GeneWeaverDge(GeneWeaverDgeRequest),
    GeneWeaverViral(GeneWeaverViralRequest),
    IntraspectraVisual(IntraspectraVisualRequest),
    IntraspectraRt(IntraspectraRtRequest),
    NeuroCartographer(NeuroCartographerRequest),
    Panopticam(PanopticamRequest),
    Polykiln(PolykilnRequest),
    VirgoAnalysis(VirgoAnalysisRequest),
    VirgoSynthesis(VirgoSynthesisRequest),
}

impl BookingRequest {
    pub fn kind(&self) -> StationKind {
        match self {
            Self::GeneWeaverDge(_) => StationKind::GeneWeaverDge,
            Self::GeneWeaverViral(_) => StationKind::GeneWeaverViral,
            Self::IntraspectraVisual(_) => StationKind::IntraspectraVisual,
            Self::IntraspectraRt(_) => StationKind::IntraspectraRt,
            Self::NeuroCartographer(_) => StationKind::NeuroCartographer,
            Self::Panopticam(_) => StationKind::Panopticam,
            Self::Polykiln(_) => StationKind::Polykiln,
            Self::VirgoAnalysis(_) => StationKind::VirgoAnalysis,
            Self::VirgoSynthesis(_) => StationKind::VirgoSynthesis,
        }
    }

    /// Validates the form and prices it.
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        match self {
            Self::GeneWeaverDge(request) => request.plan(),
            Self::GeneWeaverViral(request) => request.plan(),
            Self::IntraspectraVisual(request) => request.plan(),
            Self::IntraspectraRt(request) => request.plan(),
            Self::NeuroCartographer(request) => request.plan(),
            Self::Panopticam(request) => request.plan(),
            Self::Polykiln(request) => request.plan(),
            Self::VirgoAnalysis(request) => request.plan(),
            Self::VirgoSynthesis(request) => request.plan(),
        }
    }
}

/// Form validation error raised before any resource is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Required text is missing or blank.
    MissingField(&'static str),
    /// Count-like field must be at least one.
    NotPositive { field: &'static str, value: i64 },
    /// Rate-like field must be greater than zero.
    InvalidRate { field: &'static str, value: f64 },
    /// Integer field outside its accepted range.
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    TooManyWords {
        field: &'static str,
        limit: usize,
        actual: usize,
    },
    /// No subject groups were submitted.
    NoGroups,
    DuplicateName { kind: &'static str, name: String },
    /// A name refers to an event/group that was never declared.
    UnknownReference { kind: &'static str, name: String },
    /// Name contains a character that cannot be persisted in a list column.
    InvalidName { kind: &'static str, name: String },
    /// Derived quantity does not fit in an `i64`.
    Overflow { field: &'static str },
}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::NotPositive { field, value } => {
                write!(f, "`{field}` must be at least 1, got {value}")
            }
            Self::InvalidRate { field, value } => {
                write!(f, "`{field}` must be greater than 0, got {value}")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "`{field}` must be within {min}..={max}, got {value}"),
            Self::TooManyWords {
                field,
                limit,
                actual,
            } => write!(f, "`{field}` allows up to {limit} words, got {actual}"),
            Self::NoGroups => write!(f, "at least one subject group is required"),
            Self::DuplicateName { kind, name } => write!(f, "duplicate {kind} name `{name}`"),
            Self::UnknownReference { kind, name } => write!(f, "unknown {kind} `{name}`"),
            Self::InvalidName { kind, name } => {
                write!(f, "{kind} name `{name}` must not contain commas")
            }
            Self::Overflow { field } => write!(f, "`{field}` is too large to book"),
        }
    }
}

impl Error for PlanError {}

/// Counts whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, PlanError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlanError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub(crate) fn check_word_limit(
    field: &'static str,
    text: &str,
    limit: usize,
) -> Result<(), PlanError> {
    let actual = word_count(text);
    if actual > limit {
        return Err(PlanError::TooManyWords {
            field,
            limit,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: i64) -> Result<i64, PlanError> {
    if value < 1 {
        return Err(PlanError::NotPositive { field, value });
    }
    Ok(value)
}

pub(crate) fn require_rate(field: &'static str, value: Option<f64>) -> Result<f64, PlanError> {
    match value {
        None => Err(PlanError::MissingField(field)),
        Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        Some(rate) => Err(PlanError::InvalidRate { field, value: rate }),
    }
}

/// Rounds up without forming `numerator + denominator - 1`.
pub(crate) fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    numerator / denominator + i64::from(numerator % denominator != 0)
}

pub(crate) fn checked_product(field: &'static str, lhs: i64, rhs: i64) -> Result<i64, PlanError> {
    lhs.checked_mul(rhs).ok_or(PlanError::Overflow { field })
}

pub(crate) fn checked_total(
    field: &'static str,
    values: impl IntoIterator<Item = i64>,
) -> Result<i64, PlanError> {
    values
        .into_iter()
        .try_fold(0_i64, |total, value| total.checked_add(value))
        .ok_or(PlanError::Overflow { field })
}

#[cfg(test)]
mod tests {
    use super::{
        ceil_div, check_word_limit, checked_product, checked_total, optional_text, word_count,
        PlanError, StationKind,
    };

    #[test]
    fn word_count_ignores_repeated_whitespace() {
        assert_eq!(word_count("  knock   out\tgene X\n"), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn word_limit_reports_actual_count() {
        let err = check_word_limit("gene_of_interest", "a b c", 2).unwrap_err();
        assert_eq!(
            err,
            PlanError::TooManyWords {
                field: "gene_of_interest",
                limit: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn optional_text_drops_blank_values() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" x ")), Some("x".to_string()));
    }

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(10, 5), 2);
        assert_eq!(ceil_div(11, 5), 3);
        assert_eq!(ceil_div(1, 1000), 1);
        assert_eq!(ceil_div(i64::MAX, 5), i64::MAX / 5 + 1);
    }

    #[test]
    fn checked_helpers_report_overflowing_field() {
        assert_eq!(checked_product("credits", 3, 4), Ok(12));
        assert_eq!(
            checked_product("credits", i64::MAX, 2),
            Err(PlanError::Overflow { field: "credits" })
        );
        assert_eq!(checked_total("total_subjects", [1, 2, 3]), Ok(6));
        assert_eq!(
            checked_total("total_subjects", [i64::MAX, 1]),
            Err(PlanError::Overflow {
                field: "total_subjects"
            })
        );
    }

    #[test]
    fn station_kind_parses_cli_names() {
        assert_eq!(
            StationKind::parse("virgo-synthesis"),
            Some(StationKind::VirgoSynthesis)
        );
        assert_eq!(StationKind::ALL.len(), 9);
    }
}
