//! Panopticam behavioral monitoring.
//!
//! # Invariants
//! - Group and event names are unique and comma-free.
//! - Phases may only monitor or react to declared events, and contingencies
//!   may only target declared groups.

use crate::model::experiment::{
    Autostation, ExperimentDetail, PanopticamContingency, PanopticamDetail, PanopticamEvent,
    PanopticamGroup, PanopticamPhase,
};
use crate::model::inventory::ResourceDraw;
use crate::model::resources::{AnimalSpecies, Article};
use crate::station::{
    checked_total, require_positive, require_rate, require_text, BookingPlan, PlanError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const NO_PROBE: &str = "None";
const PROBE_SHIFT_FACTOR: f64 = 1.5;
const SUBJECT_HOUR_COST: f64 = 500.0;
const WAIT_WEEKS: u32 = 1;
const CARTRIDGE: Article = Article::MamrReelCartridge;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanopticamRequest {
    pub subject_species: AnimalSpecies,
    pub experiment_run_id: String,
    /// `None` or absent when no probe is attached.
    #[serde(default)]
    pub probe_type_used: Option<String>,
    pub total_monitoring_hours: f64,
    pub experimental_groups: Vec<GroupForm>,
    #[serde(default)]
    pub event_dictionary: Vec<EventForm>,
    #[serde(default)]
    pub phase_sequence: Vec<PhaseForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupForm {
    pub group_name: String,
    pub subject_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventForm {
    pub event_name: String,
    pub definition_type: String,
    pub quantification_method: String,
    pub operational_definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseForm {
    pub phase_name: String,
    pub phase_duration: String,
    #[serde(default)]
    pub monitor_events_active: Vec<String>,
    #[serde(default)]
    pub contingency_rules: Vec<ContingencyForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyForm {
    pub trigger_event_name: String,
    /// Empty applies the rule to every group.
    #[serde(default)]
    pub applicable_groups: Vec<String>,
    pub action_command: String,
}

impl PanopticamRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let experiment_run_id = require_text("experiment_run_id", &self.experiment_run_id)?;
        let hours = require_rate("total_monitoring_hours", Some(self.total_monitoring_hours))?;
        let probe_type_used = self
            .probe_type_used
            .as_deref()
            .map(str::trim)
            .filter(|probe| !probe.is_empty())
            .unwrap_or(NO_PROBE)
            .to_string();

        if self.experimental_groups.is_empty() {
            return Err(PlanError::NoGroups);
        }
        let mut group_names = HashSet::new();
        let mut groups = Vec::with_capacity(self.experimental_groups.len());
        for group in &self.experimental_groups {
            let group_name = declared_name("group", &group.group_name, &mut group_names)?;
            groups.push(PanopticamGroup {
                group_name,
                subject_count: require_positive("subject_count", group.subject_count)?,
            });
        }

        let mut event_names = HashSet::new();
        let mut events = Vec::with_capacity(self.event_dictionary.len());
        for event in &self.event_dictionary {
            events.push(PanopticamEvent {
                event_name: declared_name("event", &event.event_name, &mut event_names)?,
                definition_type: require_text("definition_type", &event.definition_type)?,
                quantification_method: require_text(
                    "quantification_method",
                    &event.quantification_method,
                )?,
                operational_definition: require_text(
                    "operational_definition",
                    &event.operational_definition,
                )?,
            });
        }

        let mut phases = Vec::with_capacity(self.phase_sequence.len());
        for phase in &self.phase_sequence {
            let monitor_events_active = phase
                .monitor_events_active
                .iter()
                .map(|name| referenced_name("event", name, &event_names))
                .collect::<Result<Vec<_>, _>>()?;

            let mut contingencies = Vec::with_capacity(phase.contingency_rules.len());
            for rule in &phase.contingency_rules {
                contingencies.push(PanopticamContingency {
                    trigger_event_name: referenced_name(
                        "event",
                        &rule.trigger_event_name,
                        &event_names,
                    )?,
                    applicable_groups: rule
                        .applicable_groups
                        .iter()
                        .map(|name| referenced_name("group", name, &group_names))
                        .collect::<Result<Vec<_>, _>>()?,
                    action_command: require_text("action_command", &rule.action_command)?,
                });
            }

            phases.push(PanopticamPhase {
                phase_name: require_text("phase_name", &phase.phase_name)?,
                phase_duration: require_text("phase_duration", &phase.phase_duration)?,
                monitor_events_active,
                contingencies,
            });
        }

        let total_subjects =
            checked_total("total_subjects", groups.iter().map(|group| group.subject_count))?;
        let shift_factor = if probe_type_used == NO_PROBE {
            1.0
        } else {
            PROBE_SHIFT_FACTOR
        };
        let shifts = (hours * shift_factor).ceil();
        if shifts >= i64::MAX as f64 {
            return Err(PlanError::Overflow { field: "shifts" });
        }
        let credits = (total_subjects as f64 * hours).ceil() * SUBJECT_HOUR_COST;
        if !credits.is_finite() {
            return Err(PlanError::Overflow { field: "credits" });
        }

        Ok(BookingPlan {
            autostation: Autostation::Panopticam,
            experiment_type: "Behavioral Monitoring",
            subject_species: Some(self.subject_species),
            wait_weeks: WAIT_WEEKS,
            draw: ResourceDraw {
                credits,
                shifts: shifts as i64,
                article: Some(CARTRIDGE),
            },
            detail: ExperimentDetail::Panopticam(PanopticamDetail {
                experiment_run_id,
                probe_type_used,
                base_shift_cost: hours,
                total_subjects,
                total_monitoring_hours: hours,
                cartridge_used: Some(CARTRIDGE),
                groups,
                events,
                phases,
            }),
        })
    }
}

/// Validates a newly declared name and records it in `seen`.
fn declared_name(
    kind: &'static str,
    raw: &str,
    seen: &mut HashSet<String>,
) -> Result<String, PlanError> {
    let name = require_text(if kind == "group" { "group_name" } else { "event_name" }, raw)?;
    if name.contains(',') {
        return Err(PlanError::InvalidName { kind, name });
    }
    if !seen.insert(name.clone()) {
        return Err(PlanError::DuplicateName { kind, name });
    }
    Ok(name)
}

fn referenced_name(
    kind: &'static str,
    raw: &str,
    declared: &HashSet<String>,
) -> Result<String, PlanError> {
    let name = raw.trim().to_string();
    if !declared.contains(&name) {
        return Err(PlanError::UnknownReference { kind, name });
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::{ContingencyForm, EventForm, GroupForm, PanopticamRequest, PhaseForm};
    use crate::model::experiment::ExperimentDetail;
    use crate::model::resources::{AnimalSpecies, Article};
    use crate::station::PlanError;

    fn request() -> PanopticamRequest {
        PanopticamRequest {
            subject_species: AnimalSpecies::U51,
            experiment_run_id: "FearConditioning_Run_01".to_string(),
            probe_type_used: None,
            total_monitoring_hours: 2.5,
            experimental_groups: vec![
                GroupForm {
                    group_name: "Control".to_string(),
                    subject_count: 3,
                },
                GroupForm {
                    group_name: "Treatment".to_string(),
                    subject_count: 3,
                },
            ],
            event_dictionary: vec![EventForm {
                event_name: "Freezing".to_string(),
                definition_type: "State".to_string(),
                quantification_method: "Duration".to_string(),
                operational_definition: "No movement for 2 seconds.".to_string(),
            }],
            phase_sequence: vec![PhaseForm {
                phase_name: "Conditioning".to_string(),
                phase_duration: "30 minutes".to_string(),
                monitor_events_active: vec!["Freezing".to_string()],
                contingency_rules: vec![ContingencyForm {
                    trigger_event_name: "Freezing".to_string(),
                    applicable_groups: vec!["Treatment".to_string()],
                    action_command: "Play tone for 5 seconds".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn monitoring_without_probe_bills_hours_and_subject_hours() {
        let plan = request().plan().unwrap();
        assert_eq!(plan.draw.shifts, 3);
        assert_eq!(plan.draw.credits, 7_500.0);
        assert_eq!(plan.draw.article, Some(Article::MamrReelCartridge));
        assert_eq!(plan.subject_species, Some(AnimalSpecies::U51));
        match plan.detail {
            ExperimentDetail::Panopticam(detail) => {
                assert_eq!(detail.total_subjects, 6);
                assert_eq!(detail.probe_type_used, "None");
                assert_eq!(detail.phases[0].contingencies.len(), 1);
            }
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn oversized_groups_or_hours_are_rejected() {
        let mut request = request();
        request.experimental_groups[0].subject_count = i64::MAX;
        assert_eq!(
            request.plan().unwrap_err(),
            PlanError::Overflow {
                field: "total_subjects"
            }
        );

        let mut request = self::request();
        request.total_monitoring_hours = 1e300;
        assert_eq!(
            request.plan().unwrap_err(),
            PlanError::Overflow { field: "shifts" }
        );
    }

    #[test]
    fn attached_probe_raises_shift_cost() {
        let mut request = request();
        request.probe_type_used = Some("Optogenetic".to_string());
        assert_eq!(request.plan().unwrap().draw.shifts, 4);
    }

    #[test]
    fn undeclared_references_are_rejected() {
        let mut request = request();
        request.phase_sequence[0].monitor_events_active = vec!["Grooming".to_string()];
        assert_eq!(
            request.plan().unwrap_err(),
            PlanError::UnknownReference {
                kind: "event",
                name: "Grooming".to_string()
            }
        );

        let mut request = self::request();
        request.phase_sequence[0].contingency_rules[0].applicable_groups =
            vec!["Sham".to_string()];
        assert!(matches!(
            request.plan().unwrap_err(),
            PlanError::UnknownReference { kind: "group", .. }
        ));
    }

    #[test]
    fn names_must_be_unique_and_comma_free() {
        let mut request = request();
        request.experimental_groups[1].group_name = "Control".to_string();
        assert!(matches!(
            request.plan().unwrap_err(),
            PlanError::DuplicateName { kind: "group", .. }
        ));

        let mut request = self::request();
        request.event_dictionary[0].event_name = "Freezing, long".to_string();
        assert!(matches!(
            request.plan().unwrap_err(),
            PlanError::InvalidName { kind: "event", .. }
        ));
    }
}
