//! PowerLab NeuroCartographer: directed circuit trace.

use crate::model::experiment::{
    Autostation, ExperimentDetail, NeuroCartographerDetail, TracerTransport,
};
use crate::model::inventory::ResourceDraw;
use crate::model::resources::{AnimalSpecies, Article};
use crate::station::{
    ceil_div, check_word_limit, checked_product, require_positive, require_text, BookingPlan,
    PlanError,
};
use serde::{Deserialize, Serialize};

const SEED_LOCATOR_WORD_LIMIT: usize = 100;
const SEARCH_ALGORITHM_WORD_LIMIT: usize = 200;
/// Mapped neurons covered by one 1000-chuan compute block.
const NEURONS_PER_COMPUTE_BLOCK: i64 = 100;
const COMPUTE_BLOCK_COST: i64 = 1000;
const WAIT_WEEKS: u32 = 2;
const CARTRIDGE: Article = Article::NcPk1Cartridge;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuroCartographerRequest {
    pub subject_species: AnimalSpecies,
    pub subject_count: i64,
    pub seed_neuron_locator: String,
    pub tracer_transport_type: TracerTransport,
    pub max_neurons_to_map: i64,
    pub pathway_search_algorithm: String,
}

impl NeuroCartographerRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let subject_count = require_positive("subject_count", self.subject_count)?;
        let max_neurons_to_map = require_positive("max_neurons_to_map", self.max_neurons_to_map)?;

        let seed_neuron_locator = require_text("seed_neuron_locator", &self.seed_neuron_locator)?;
        check_word_limit(
            "seed_neuron_locator",
            &seed_neuron_locator,
            SEED_LOCATOR_WORD_LIMIT,
        )?;
        let pathway_search_algorithm =
            require_text("pathway_search_algorithm", &self.pathway_search_algorithm)?;
        check_word_limit(
            "pathway_search_algorithm",
            &pathway_search_algorithm,
            SEARCH_ALGORITHM_WORD_LIMIT,
        )?;

        let mapped_neurons = checked_product("mapped_neurons", subject_count, max_neurons_to_map)?;
        let compute_blocks = ceil_div(mapped_neurons, NEURONS_PER_COMPUTE_BLOCK);
        let credits = checked_product("credits", compute_blocks, COMPUTE_BLOCK_COST)?;

        Ok(BookingPlan {
            autostation: Autostation::NeuroCartographer,
            experiment_type: "Directed Circuit Trace",
            subject_species: Some(self.subject_species),
            wait_weeks: WAIT_WEEKS,
            draw: ResourceDraw {
                credits: credits as f64,
                shifts: subject_count,
                article: Some(CARTRIDGE),
            },
            detail: ExperimentDetail::NeuroCartographer(NeuroCartographerDetail {
                subject_count,
                seed_neuron_locator,
                tracer_transport_type: self.tracer_transport_type,
                max_neurons_to_map,
                pathway_search_algorithm,
                cartridge_used: Some(CARTRIDGE),
            }),
        })
    }
}
