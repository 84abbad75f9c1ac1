//! Inventory domain model.
//!
//! # Responsibility
//! - Hold the single game-state row: money, TA shifts, animals, cartridges.
//! - Decide whether a resource draw fits and how shifts are split across TAs.
//!
//! # Invariants
//! - A species with `max < 0` is locked and cannot be hunted.
//! - Shift draws are taken greedily in `TechAssistant::ALL` order.
//! - `shortfalls()` is empty exactly when the draw can be committed.

use crate::model::resources::{AnimalSpecies, Article, TechAssistant};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Starting credits in chuan.
pub const STARTING_CREDITS: f64 = 2_000_000.0;
/// Starting shifts per technical assistant.
pub const STARTING_SHIFTS_PER_TA: i64 = 120;
const STARTING_JUICE: i64 = 3;
const STARTING_51U6: i64 = 40;
const LOCKED: i64 = -1;
const ANIMALS_PER_HUNTING_SHIFT: i64 = 10;

/// Capacity and on-hand count for one species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalStock {
    pub max: i64,
    pub available: i64,
}

impl AnimalStock {
    pub fn is_locked(&self) -> bool {
        self.max < 0
    }

    /// Animals a hunt would collect to refill this stock.
    pub fn missing(&self) -> i64 {
        self.max.saturating_sub(self.available).max(0)
    }
}

/// Shifts needed to collect `collected` animals: one per ten, rounded up.
pub fn hunting_shift_cost(collected: i64) -> i64 {
    let collected = collected.max(0);
    collected / ANIMALS_PER_HUNTING_SHIFT
        + i64::from(collected % ANIMALS_PER_HUNTING_SHIFT != 0)
}

/// Canonical inventory record (one row per game).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Money in chuan.
    pub credits: f64,
    pub ta_saltos_shifts: i64,
    pub ta_nitro_shifts: i64,
    pub ta_helene_shifts: i64,
    pub ta_carnival_shifts: i64,
    pub juice: i64,
    pub animals_51u6_max: i64,
    pub animals_51u6_m_max: i64,
    pub animals_c248_s_max: i64,
    pub animals_c248_l_max: i64,
    pub animals_51u6_available: i64,
    pub animals_51u6_m_available: i64,
    pub animals_c248_s_available: i64,
    pub animals_c248_l_available: i64,
    pub xatty_cartridge: i64,
    pub zeropoint_cartridge: i64,
    pub nc_pk1_cartridge: i64,
    pub smart_filament_s_cartridge: i64,
    pub smart_filament_m_cartridge: i64,
    pub smart_filament_l_cartridge: i64,
    pub mamr_reel_cartridge: i64,
    pub dupont_cartridge: i64,
    /// Game clock; advanced by one per simulated week.
    pub current_week: u32,
}

impl Inventory {
    /// Builds the state a new game starts with.
    ///
    /// Only 51u6 animals are unlocked; every cartridge starts at one unit.
    pub fn starting() -> Self {
        Self {
            credits: STARTING_CREDITS,
            ta_saltos_shifts: STARTING_SHIFTS_PER_TA,
            ta_nitro_shifts: STARTING_SHIFTS_PER_TA,
            ta_helene_shifts: STARTING_SHIFTS_PER_TA,
            ta_carnival_shifts: STARTING_SHIFTS_PER_TA,
            juice: STARTING_JUICE,
            animals_51u6_max: STARTING_51U6,
            animals_51u6_m_max: LOCKED,
            animals_c248_s_max: LOCKED,
            animals_c248_l_max: LOCKED,
            animals_51u6_available: STARTING_51U6,
            animals_51u6_m_available: LOCKED,
            animals_c248_s_available: LOCKED,
            animals_c248_l_available: LOCKED,
            xatty_cartridge: 1,
            zeropoint_cartridge: 1,
            nc_pk1_cartridge: 1,
            smart_filament_s_cartridge: 1,
            smart_filament_m_cartridge: 1,
            smart_filament_l_cartridge: 1,
            mamr_reel_cartridge: 1,
            dupont_cartridge: 1,
            current_week: 0,
        }
    }

    pub fn shifts(&self, ta: TechAssistant) -> i64 {
        match ta {
            TechAssistant::Saltos => self.ta_saltos_shifts,
            TechAssistant::Nitro => self.ta_nitro_shifts,
            TechAssistant::Helene => self.ta_helene_shifts,
            TechAssistant::Carnival => self.ta_carnival_shifts,
        }
    }

    pub fn total_shifts(&self) -> i64 {
        TechAssistant::ALL
            .iter()
            .map(|ta| self.shifts(*ta).max(0))
            .sum()
    }

    pub fn article_count(&self, article: Article) -> i64 {
        match article {
            Article::XattyCartridge => self.xatty_cartridge,
            Article::ZeropointCartridge => self.zeropoint_cartridge,
            Article::NcPk1Cartridge => self.nc_pk1_cartridge,
            Article::SmartFilamentSCartridge => self.smart_filament_s_cartridge,
            Article::SmartFilamentMCartridge => self.smart_filament_m_cartridge,
            Article::SmartFilamentLCartridge => self.smart_filament_l_cartridge,
            Article::MamrReelCartridge => self.mamr_reel_cartridge,
            Article::DupontCartridge => self.dupont_cartridge,
            Article::Juice => self.juice,
        }
    }

    pub fn animal_stock(&self, species: AnimalSpecies) -> AnimalStock {
        let (max, available) = match species {
            AnimalSpecies::U51 => (self.animals_51u6_max, self.animals_51u6_available),
            AnimalSpecies::U51M => (self.animals_51u6_m_max, self.animals_51u6_m_available),
            AnimalSpecies::C248S => (self.animals_c248_s_max, self.animals_c248_s_available),
            AnimalSpecies::C248L => (self.animals_c248_l_max, self.animals_c248_l_available),
        };
        AnimalStock { max, available }
    }

    /// Splits `required` shifts across TAs, draining each in turn.
    ///
    /// Returns `None` when the combined pool is too small.
    pub fn allocate_shifts(&self, required: i64) -> Option<ShiftAllocation> {
        if required > self.total_shifts() {
            return None;
        }

        let mut remaining = required.max(0);
        let mut draws = Vec::new();
        for ta in TechAssistant::ALL {
            if remaining == 0 {
                break;
            }
            let used = self.shifts(*ta).max(0).min(remaining);
            if used > 0 {
                draws.push((*ta, used));
                remaining -= used;
            }
        }

        Some(ShiftAllocation { draws })
    }

    /// Lists every resource the draw needs but the inventory lacks.
    pub fn shortfalls(&self, draw: &ResourceDraw) -> Vec<Shortfall> {
        let mut missing = Vec::new();

        if draw.credits > self.credits {
            missing.push(Shortfall::Credits {
                required: draw.credits,
                available: self.credits,
            });
        }

        let available_shifts = self.total_shifts();
        if draw.shifts > available_shifts {
            missing.push(Shortfall::Shifts {
                required: draw.shifts,
                available: available_shifts,
            });
        }

        if let Some(article) = draw.article {
            let available = self.article_count(article);
            if available < 1 {
                missing.push(Shortfall::Article {
                    article,
                    required: 1,
                    available,
                });
            }
        }

        missing
    }
}

/// Per-TA split of a shift draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftAllocation {
    pub draws: Vec<(TechAssistant, i64)>,
}

impl ShiftAllocation {
    pub fn total(&self) -> i64 {
        self.draws.iter().map(|(_, used)| used).sum()
    }
}

/// Resources consumed by one user action.
///
/// `article` consumes exactly one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDraw {
    pub credits: f64,
    pub shifts: i64,
    pub article: Option<Article>,
}

/// One unmet requirement of a resource draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Shortfall {
    Credits { required: f64, available: f64 },
    Shifts { required: i64, available: i64 },
    Article {
        article: Article,
        required: i64,
        available: i64,
    },
}

impl Display for Shortfall {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credits {
                required,
                available,
            } => write!(
                f,
                "not enough credits (need {required:.2}, have {available:.2})"
            ),
            Self::Shifts {
                required,
                available,
            } => write!(
                f,
                "not enough TA shifts (need {required}, have {available})"
            ),
            Self::Article {
                article,
                required,
                available,
            } => write!(
                f,
                "not enough {} (need {required}, have {available})",
                article.display_name()
            ),
        }
    }
}

/// Joins shortfalls into one `; `-separated message.
pub fn describe_shortfalls(missing: &[Shortfall]) -> String {
    missing
        .iter()
        .map(Shortfall::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::{
        describe_shortfalls, hunting_shift_cost, AnimalStock, Inventory, ResourceDraw, Shortfall,
    };
    use crate::model::resources::{AnimalSpecies, Article, TechAssistant};

    #[test]
    fn starting_inventory_matches_game_rules() {
        let inventory = Inventory::starting();
        assert_eq!(inventory.credits, 2_000_000.0);
        assert_eq!(inventory.total_shifts(), 480);
        assert_eq!(inventory.juice, 3);
        assert_eq!(inventory.animal_stock(AnimalSpecies::U51).available, 40);
        assert!(inventory.animal_stock(AnimalSpecies::C248S).is_locked());
        for article in Article::ALL.iter().filter(|article| article.is_cartridge()) {
            assert_eq!(inventory.article_count(*article), 1);
        }
    }

    #[test]
    fn shift_allocation_drains_in_order() {
        let mut inventory = Inventory::starting();
        inventory.ta_saltos_shifts = 3;
        inventory.ta_nitro_shifts = 0;

        let allocation = inventory.allocate_shifts(10).unwrap();
        assert_eq!(
            allocation.draws,
            vec![(TechAssistant::Saltos, 3), (TechAssistant::Helene, 7)]
        );
        assert_eq!(allocation.total(), 10);

        assert!(inventory.allocate_shifts(1_000).is_none());
    }

    #[test]
    fn shortfalls_report_every_missing_resource() {
        let mut inventory = Inventory::starting();
        inventory.credits = 10.0;
        inventory.xatty_cartridge = 0;

        let draw = ResourceDraw {
            credits: 50.0,
            shifts: 2,
            article: Some(Article::XattyCartridge),
        };

        let missing = inventory.shortfalls(&draw);
        assert_eq!(missing.len(), 2);
        assert!(matches!(missing[0], Shortfall::Credits { .. }));
        assert!(matches!(
            missing[1],
            Shortfall::Article {
                article: Article::XattyCartridge,
                ..
            }
        ));
    }

    #[test]
    fn shortfall_description_joins_messages() {
        let message = describe_shortfalls(&[
            Shortfall::Shifts {
                required: 5,
                available: 2,
            },
            Shortfall::Article {
                article: Article::DupontCartridge,
                required: 1,
                available: 0,
            },
        ]);
        assert_eq!(
            message,
            "not enough TA shifts (need 5, have 2); not enough DuPont Cartridge (need 1, have 0)"
        );
    }

    #[test]
    fn hunting_cost_rounds_up_per_ten_animals() {
        assert_eq!(hunting_shift_cost(0), 0);
        assert_eq!(hunting_shift_cost(1), 1);
        assert_eq!(hunting_shift_cost(10), 1);
        assert_eq!(hunting_shift_cost(11), 2);
        assert_eq!(hunting_shift_cost(i64::MAX), i64::MAX / 10 + 1);
    }

    #[test]
    fn missing_animals_never_negative() {
        let stock = AnimalStock {
            max: 40,
            available: 15,
        };
        assert_eq!(stock.missing(), 25);
        let overfull = AnimalStock {
            max: 10,
            available: 12,
        };
        assert_eq!(overfull.missing(), 0);
    }

    #[test]
    fn empty_draw_always_fits() {
        let inventory = Inventory::starting();
        assert!(inventory.shortfalls(&ResourceDraw::default()).is_empty());
    }
}
