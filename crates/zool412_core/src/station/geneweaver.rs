//! GeneWeaver autostation: DGE analysis and viral vector modification.

use crate::model::experiment::{
    Autostation, CellTypeLevel, ExperimentDetail, GeneWeaverDetail, GeneWeaverGroup,
    GeneWeaverMode,
};
use crate::model::inventory::ResourceDraw;
use crate::model::resources::{AnimalSpecies, Article};
use crate::station::{
    ceil_div, check_word_limit, checked_product, checked_total, optional_text, require_positive,
    require_text, BookingPlan, PlanError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DGE_SAMPLES_PER_SHIFT: i64 = 5;
/// Sequences billed per sample when no cap is given.
const DGE_DEFAULT_SEQUENCES: i64 = 1000;
const DGE_WAIT_WEEKS: u32 = 2;
const VIRAL_WAIT_WEEKS: u32 = 3;
const GENE_OF_INTEREST_WORD_LIMIT: usize = 200;
const PROMOTER_WORD_LIMIT: usize = 100;
const CARTRIDGE: Article = Article::XattyCartridge;

/// Differential gene expression analysis form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneWeaverDgeRequest {
    pub subject_species: AnimalSpecies,
    pub fold_change_threshold: i64,
    /// Sequence cap per sample; `<= 0` bills the default.
    pub max_sequences: i64,
    pub cell_type_level: CellTypeLevel,
    pub cell_type_description: String,
    pub groups: Vec<DgeGroupForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DgeGroupForm {
    pub group_name: String,
    /// Free-form list such as `A01, A02`.
    #[serde(default)]
    pub subject_ids: Option<String>,
    pub subject_count: i64,
    #[serde(default)]
    pub sampling_instructions: Option<String>,
}

/// Viral vector gene modification form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneWeaverViralRequest {
    pub subject_species: AnimalSpecies,
    pub gene_of_interest: String,
    #[serde(default)]
    pub promoter_sequence: Option<String>,
    pub transduction_level: CellTypeLevel,
    pub transduction_description: String,
    pub groups: Vec<ViralGroupForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViralGroupForm {
    pub group_name: String,
    pub subject_count: i64,
    /// e.g. `Knockout`; `None` for control vectors.
    #[serde(default)]
    pub modification_type: Option<String>,
}

impl GeneWeaverDgeRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let fold_change_threshold =
            require_positive("fold_change_threshold", self.fold_change_threshold)?;
        let cell_type_description =
            require_text("cell_type_description", &self.cell_type_description)?;

        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            groups.push(GeneWeaverGroup {
                group_name: require_text("group_name", &group.group_name)?,
                subject_ids: optional_text(group.subject_ids.as_deref()),
                subject_count: require_positive("subject_count", group.subject_count)?,
                sampling_instructions: optional_text(group.sampling_instructions.as_deref()),
                modification_type: None,
            });
        }
        let total_samples = check_groups(&groups)?;

        let sequences_per_sample = if self.max_sequences > 0 {
            self.max_sequences
        } else {
            DGE_DEFAULT_SEQUENCES
        };
        let credits = checked_product("credits", total_samples, sequences_per_sample)?;

        Ok(BookingPlan {
            autostation: Autostation::GeneWeaver,
            experiment_type: "DGE Analysis",
            subject_species: Some(self.subject_species),
            wait_weeks: DGE_WAIT_WEEKS,
            draw: ResourceDraw {
                credits: credits as f64,
                shifts: ceil_div(total_samples, DGE_SAMPLES_PER_SHIFT),
                article: Some(CARTRIDGE),
            },
            detail: ExperimentDetail::GeneWeaver(GeneWeaverDetail {
                mode: GeneWeaverMode::Dge,
                fold_change_threshold: Some(fold_change_threshold),
                max_sequences: Some(self.max_sequences),
                cell_type_level: Some(self.cell_type_level),
                cell_type_description: Some(cell_type_description),
                gene_of_interest: None,
                promoter_sequence: None,
                transduction_level: None,
                transduction_description: None,
                cartridge_used: Some(CARTRIDGE),
                groups,
            }),
        })
    }
}

impl GeneWeaverViralRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let gene_of_interest = require_text("gene_of_interest", &self.gene_of_interest)?;
        check_word_limit(
            "gene_of_interest",
            &gene_of_interest,
            GENE_OF_INTEREST_WORD_LIMIT,
        )?;
        let promoter_sequence = optional_text(self.promoter_sequence.as_deref());
        if let Some(promoter) = promoter_sequence.as_deref() {
            check_word_limit("promoter_sequence", promoter, PROMOTER_WORD_LIMIT)?;
        }
        let transduction_description =
            require_text("transduction_description", &self.transduction_description)?;

        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            groups.push(GeneWeaverGroup {
                group_name: require_text("group_name", &group.group_name)?,
                subject_ids: None,
                subject_count: require_positive("subject_count", group.subject_count)?,
                sampling_instructions: None,
                modification_type: optional_text(group.modification_type.as_deref()),
            });
        }
        let total_animals = check_groups(&groups)?;

        Ok(BookingPlan {
            autostation: Autostation::GeneWeaver,
            experiment_type: "Viral Vector Modification",
            subject_species: Some(self.subject_species),
            wait_weeks: VIRAL_WAIT_WEEKS,
            draw: ResourceDraw {
                credits: 0.0,
                shifts: total_animals,
                article: Some(CARTRIDGE),
            },
            detail: ExperimentDetail::GeneWeaver(GeneWeaverDetail {
                mode: GeneWeaverMode::Viral,
                fold_change_threshold: None,
                max_sequences: None,
                cell_type_level: None,
                cell_type_description: None,
                gene_of_interest: Some(gene_of_interest),
                promoter_sequence,
                transduction_level: Some(self.transduction_level),
                transduction_description: Some(transduction_description),
                cartridge_used: Some(CARTRIDGE),
                groups,
            }),
        })
    }
}

/// Rejects empty or duplicate groups and returns the subject total.
fn check_groups(groups: &[GeneWeaverGroup]) -> Result<i64, PlanError> {
    if groups.is_empty() {
        return Err(PlanError::NoGroups);
    }
    let mut seen = HashSet::new();
    for group in groups {
        if !seen.insert(group.group_name.as_str()) {
            return Err(PlanError::DuplicateName {
                kind: "group",
                name: group.group_name.clone(),
            });
        }
    }
    checked_total("total_subjects", groups.iter().map(|group| group.subject_count))
}
