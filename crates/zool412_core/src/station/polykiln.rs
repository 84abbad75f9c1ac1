//! Polykiln fabrication.

use crate::model::experiment::{Autostation, ExperimentDetail, PolykilnDetail, SizeTier};
use crate::model::inventory::ResourceDraw;
use crate::model::resources::AnimalSpecies;
use crate::station::{ceil_div, require_text, BookingPlan, PlanError};
use serde::{Deserialize, Serialize};

const MAX_COMPONENT_TIER: i64 = 3;
const SCORE_POINTS_PER_SHIFT: i64 = 2;
const SCORE_POINT_COST: i64 = 1000;
const WAIT_WEEKS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolykilnRequest {
    /// Optional; fabrication never draws subjects.
    #[serde(default)]
    pub subject_species: Option<AnimalSpecies>,
    pub object_name: String,
    pub functional_description: String,
    pub assessed_size_tier: SizeTier,
    pub assessed_mechanical_tier: i64,
    pub assessed_electronic_tier: i64,
}

impl PolykilnRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let object_name = require_text("object_name", &self.object_name)?;
        let functional_description =
            require_text("functional_description", &self.functional_description)?;
        let mechanical_tier =
            component_tier("assessed_mechanical_tier", self.assessed_mechanical_tier)?;
        let electronic_tier =
            component_tier("assessed_electronic_tier", self.assessed_electronic_tier)?;

        let score = self.assessed_size_tier.weight() * 2 + mechanical_tier + electronic_tier;
        let shift_cost = ceil_div(score, SCORE_POINTS_PER_SHIFT);
        let ocs_compute_cost = score * SCORE_POINT_COST;
        let cartridge = self.assessed_size_tier.filament_cartridge();

        Ok(BookingPlan {
            autostation: Autostation::Polykiln,
            experiment_type: "Fabrication",
            subject_species: self.subject_species,
            wait_weeks: WAIT_WEEKS,
            draw: ResourceDraw {
                credits: ocs_compute_cost as f64,
                shifts: shift_cost,
                article: Some(cartridge),
            },
            detail: ExperimentDetail::Polykiln(PolykilnDetail {
                object_name,
                functional_description,
                size_tier: self.assessed_size_tier,
                mechanical_tier,
                electronic_tier,
                score,
                cartridge_used: cartridge,
                shift_cost,
                ocs_compute_cost,
            }),
        })
    }
}

fn component_tier(field: &'static str, value: i64) -> Result<i64, PlanError> {
    if !(0..=MAX_COMPONENT_TIER).contains(&value) {
        return Err(PlanError::OutOfRange {
            field,
            value,
            min: 0,
            max: MAX_COMPONENT_TIER,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::PolykilnRequest;
    use crate::model::experiment::SizeTier;
    use crate::model::resources::Article;
    use crate::station::PlanError;

    fn request(size: SizeTier, mechanical: i64, electronic: i64) -> PolykilnRequest {
        PolykilnRequest {
            subject_species: None,
            object_name: "Thermal Enclosure v2".to_string(),
            functional_description: "Heated housing for a recording rig.".to_string(),
            assessed_size_tier: size,
            assessed_mechanical_tier: mechanical,
            assessed_electronic_tier: electronic,
        }
    }

    #[test]
    fn score_drives_shifts_credits_and_filament() {
        let plan = request(SizeTier::M, 2, 1).plan().unwrap();
        assert_eq!(plan.draw.shifts, 4);
        assert_eq!(plan.draw.credits, 7_000.0);
        assert_eq!(plan.draw.article, Some(Article::SmartFilamentMCartridge));
        assert_eq!(plan.subject_species, None);
        assert_eq!(plan.wait_weeks, 2);
    }

    #[test]
    fn component_tiers_are_bounded() {
        assert_eq!(
            request(SizeTier::S, 4, 0).plan().unwrap_err(),
            PlanError::OutOfRange {
                field: "assessed_mechanical_tier",
                value: 4,
                min: 0,
                max: 3
            }
        );
        assert!(request(SizeTier::L, 0, -1).plan().is_err());
    }
}
