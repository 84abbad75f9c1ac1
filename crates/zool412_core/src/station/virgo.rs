//! Virgo Reactor: compound analysis and synthesis.

use crate::model::experiment::{Autostation, ExperimentDetail, VirgoDetail, VirgoMode};
use crate::model::inventory::ResourceDraw;
use crate::model::resources::Article;
use crate::station::{optional_text, BookingPlan, PlanError};
use serde::{Deserialize, Serialize};

const ANALYSIS_SHIFTS: i64 = 2;
const ANALYSIS_COST: i64 = 2000;
const THETA_ANALYSIS_SURCHARGE: i64 = 3000;
const ANALYSIS_WAIT_WEEKS: u32 = 1;
const SYNTHESIS_SHIFTS: i64 = 4;
const SYNTHESIS_COST: i64 = 5000;
const NOVEL_COMPOUND_SURCHARGE: i64 = 5000;
const SYNTHESIS_WAIT_WEEKS: u32 = 3;
const SYNTHESIS_CARTRIDGE: Article = Article::DupontCartridge;

/// Analysis of a new sample or of a known reference compound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirgoAnalysisRequest {
    #[serde(default)]
    pub sample_source_description: Option<String>,
    #[serde(default)]
    pub analysis_reference_name: Option<String>,
    #[serde(default)]
    pub request_theta_analysis: bool,
}

/// Synthesis of a known compound or of one designed for an effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirgoSynthesisRequest {
    #[serde(default)]
    pub target_compound_identifier: Option<String>,
    #[serde(default)]
    pub desired_functional_effect: Option<String>,
}

impl VirgoAnalysisRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let sample_source_description = optional_text(self.sample_source_description.as_deref());
        let analysis_reference_name = optional_text(self.analysis_reference_name.as_deref());
        if sample_source_description.is_none() && analysis_reference_name.is_none() {
            return Err(PlanError::MissingField("sample_source_description"));
        }

        let compute_cost = if self.request_theta_analysis {
            ANALYSIS_COST + THETA_ANALYSIS_SURCHARGE
        } else {
            ANALYSIS_COST
        };

        Ok(BookingPlan {
            autostation: Autostation::Virgo,
            experiment_type: "Compound Analysis",
            subject_species: None,
            wait_weeks: ANALYSIS_WAIT_WEEKS,
            draw: ResourceDraw {
                credits: compute_cost as f64,
                shifts: ANALYSIS_SHIFTS,
                article: None,
            },
            detail: ExperimentDetail::Virgo(VirgoDetail {
                mode: VirgoMode::Analysis,
                sample_source_description,
                analysis_reference_name,
                request_theta_analysis: self.request_theta_analysis,
                target_compound_identifier: None,
                desired_functional_effect: None,
                shifts_used: ANALYSIS_SHIFTS,
                compute_cost,
                cartridge_used: None,
            }),
        })
    }
}

impl VirgoSynthesisRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let target_compound_identifier = optional_text(self.target_compound_identifier.as_deref());
        let desired_functional_effect = optional_text(self.desired_functional_effect.as_deref());

        let is_novel = match (&target_compound_identifier, &desired_functional_effect) {
            (None, None) => return Err(PlanError::MissingField("target_compound_identifier")),
            (None, Some(_)) => true,
            (Some(_), _) => false,
        };
        let compute_cost = if is_novel {
            SYNTHESIS_COST + NOVEL_COMPOUND_SURCHARGE
        } else {
            SYNTHESIS_COST
        };

        Ok(BookingPlan {
            autostation: Autostation::Virgo,
            experiment_type: "Synthesis",
            subject_species: None,
            wait_weeks: SYNTHESIS_WAIT_WEEKS,
            draw: ResourceDraw {
                credits: compute_cost as f64,
                shifts: SYNTHESIS_SHIFTS,
                article: Some(SYNTHESIS_CARTRIDGE),
            },
            detail: ExperimentDetail::Virgo(VirgoDetail {
                mode: VirgoMode::Synthesis,
                sample_source_description: None,
                analysis_reference_name: None,
                request_theta_analysis: false,
                target_compound_identifier,
                desired_functional_effect,
                shifts_used: SYNTHESIS_SHIFTS,
                compute_cost,
                cartridge_used: Some(SYNTHESIS_CARTRIDGE),
            }),
        })
    }
}
