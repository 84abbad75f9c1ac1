//! Experiment domain model.
//!
//! # Responsibility
//! - Define the shared experiment header used by every autostation.
//! - Define one detail shape per autostation, including its child rows.
//!
//! # Invariants
//! - Every header has exactly one detail of the matching autostation.
//! - An experiment is pending until `wait_weeks` reaches zero.
//! - Panopticam name lists never contain commas (they persist comma-joined).

use crate::model::resources::{AnimalSpecies, Article};
use crate::model::user::UserId;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Primary key of `experiments`.
pub type ExperimentId = i64;

text_enum! {
    /// Lab autostation an experiment is booked on.
    pub enum Autostation {
        GeneWeaver => "GeneWeaver",
        Intraspectra => "Intraspectra",
        NeuroCartographer => "NeuroCartographer",
        Panopticam => "Panopticam",
        Polykiln => "Polykiln",
        Virgo => "Virgo Reactor",
    }
}

text_enum! {
    /// Resolution at which cells are selected.
    pub enum CellTypeLevel {
        Bulk => "bulk",
        Category => "category",
        Subtype => "subtype",
    }
}

text_enum! {
    pub enum GeneWeaverMode {
        /// Differential gene expression analysis.
        Dge => "DGE",
        /// Viral vector gene modification.
        Viral => "Viral",
    }
}

text_enum! {
    pub enum IntraspectraMode {
        Visual => "visual",
        /// Resonance tomography.
        ResonanceTomography => "rt",
    }
}

text_enum! {
    pub enum ImagingTechnique {
        CameraImaging => "Camera_Imaging",
        LidarScan => "LiDAR_Scan",
        Microscopy => "Microscopy",
    }
}

text_enum! {
    pub enum CaptureType {
        SingleFrame => "Single_Frame",
        TimeSeries => "Time_Series",
    }
}

text_enum! {
    pub enum SpectralFilter {
        VisibleLight => "Visible_Light",
        InfraredThermal => "Infrared_Thermal",
        Ultraviolet => "Ultraviolet",
    }
}

text_enum! {
    pub enum MicroscopyTechnique {
        BrightField => "BrightField",
        PhaseContrast => "PhaseContrast",
        Fluorescence => "Fluorescence",
    }
}

text_enum! {
    pub enum Magnification {
        X10 => "10x",
        X40 => "40x",
        X100 => "100x",
    }
}

text_enum! {
    pub enum VolumeCaptureType {
        StaticVolume => "Static_Volume",
        DynamicVolumeSeries => "Dynamic_Volume_Series",
    }
}

text_enum! {
    pub enum TracerTransport {
        Anterograde => "Anterograde",
        Retrograde => "Retrograde",
    }
}

text_enum! {
    /// Printed object size class.
    pub enum SizeTier {
        S => "S",
        M => "M",
        L => "L",
    }
}

impl SizeTier {
    /// Weight used in the fabrication score.
    pub fn weight(self) -> i64 {
        match self {
            Self::S => 1,
            Self::M => 2,
            Self::L => 3,
        }
    }

    /// Filament cartridge consumed when printing at this size.
    pub fn filament_cartridge(self) -> Article {
        match self {
            Self::S => Article::SmartFilamentSCartridge,
            Self::M => Article::SmartFilamentMCartridge,
            Self::L => Article::SmartFilamentLCartridge,
        }
    }
}

text_enum! {
    pub enum VirgoMode {
        Analysis => "analysis",
        Synthesis => "synthesis",
    }
}

/// Shared experiment header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ExperimentId,
    pub user_id: UserId,
    pub autostation: Autostation,
    /// e.g. `DGE Analysis`, `Synthesis`.
    pub experiment_type: String,
    pub subject_species: Option<AnimalSpecies>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub booked_week: u32,
    pub wait_weeks: u32,
    pub is_complete: bool,
    pub is_failed: bool,
    pub result_summary: Option<String>,
}

impl Experiment {
    pub fn is_pending(&self) -> bool {
        !self.is_complete && !self.is_failed
    }
}

/// Header plus autostation-specific detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub experiment: Experiment,
    pub detail: ExperimentDetail,
}

/// Autostation-specific experiment detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "autostation", rename_all = "snake_case")]
pub enum ExperimentDetail {
    GeneWeaver(GeneWeaverDetail),
    Intraspectra(IntraspectraDetail),
    NeuroCartographer(NeuroCartographerDetail),
    Panopticam(PanopticamDetail),
    Polykiln(PolykilnDetail),
    Virgo(VirgoDetail),
}

impl ExperimentDetail {
    pub fn autostation(&self) -> Autostation {
        match self {
            Self::GeneWeaver(_) => Autostation::GeneWeaver,
            Self::Intraspectra(_) => Autostation::Intraspectra,
            Self::NeuroCartographer(_) => Autostation::NeuroCartographer,
            Self::Panopticam(_) => Autostation::Panopticam,
            Self::Polykiln(_) => Autostation::Polykiln,
            Self::Virgo(_) => Autostation::Virgo,
        }
    }

    pub fn cartridge_used(&self) -> Option<Article> {
        match self {
            Self::GeneWeaver(detail) => detail.cartridge_used,
            Self::Intraspectra(detail) => detail.cartridge_used,
            Self::NeuroCartographer(detail) => detail.cartridge_used,
            Self::Panopticam(detail) => detail.cartridge_used,
            Self::Polykiln(detail) => Some(detail.cartridge_used),
            Self::Virgo(detail) => detail.cartridge_used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneWeaverDetail {
    pub mode: GeneWeaverMode,
    pub fold_change_threshold: Option<i64>,
    pub max_sequences: Option<i64>,
    pub cell_type_level: Option<CellTypeLevel>,
    pub cell_type_description: Option<String>,
    pub gene_of_interest: Option<String>,
    pub promoter_sequence: Option<String>,
    pub transduction_level: Option<CellTypeLevel>,
    pub transduction_description: Option<String>,
    pub cartridge_used: Option<Article>,
    pub groups: Vec<GeneWeaverGroup>,
}

/// Subject group of a GeneWeaver run.
///
/// `sampling_instructions` is used by DGE, `modification_type` by Viral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneWeaverGroup {
    pub group_name: String,
    pub subject_ids: Option<String>,
    pub subject_count: i64,
    pub sampling_instructions: Option<String>,
    pub modification_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntraspectraDetail {
    pub mode: IntraspectraMode,
    pub subject_count: i64,
    pub region_of_interest: String,
    pub imaging_technique: Option<ImagingTechnique>,
    pub capture_type: Option<CaptureType>,
    pub spectral_filter: Option<SpectralFilter>,
    /// Hz.
    pub frame_capture_rate: Option<f64>,
    pub microscopy_technique: Option<MicroscopyTechnique>,
    pub magnification_level: Option<Magnification>,
    pub target_substance: Option<String>,
    pub target_is_custom: bool,
    pub volume_capture_type: Option<VolumeCaptureType>,
    pub number_of_volumes: Option<i64>,
    /// Hz.
    pub volume_capture_rate: Option<f64>,
    pub ocs_jobs: i64,
    pub cartridge_used: Option<Article>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuroCartographerDetail {
    pub subject_count: i64,
    pub seed_neuron_locator: String,
    pub tracer_transport_type: TracerTransport,
    pub max_neurons_to_map: i64,
    pub pathway_search_algorithm: String,
    pub cartridge_used: Option<Article>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanopticamDetail {
    pub experiment_run_id: String,
    /// `None` when no probe is attached.
    pub probe_type_used: String,
    pub base_shift_cost: f64,
    pub total_subjects: i64,
    pub total_monitoring_hours: f64,
    pub cartridge_used: Option<Article>,
    pub groups: Vec<PanopticamGroup>,
    pub events: Vec<PanopticamEvent>,
    /// Phases in execution order.
    pub phases: Vec<PanopticamPhase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanopticamGroup {
    pub group_name: String,
    pub subject_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanopticamEvent {
    pub event_name: String,
    pub definition_type: String,
    pub quantification_method: String,
    pub operational_definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanopticamPhase {
    pub phase_name: String,
    /// Free-form, e.g. `60 minutes` or `100 trials`.
    pub phase_duration: String,
    pub monitor_events_active: Vec<String>,
    pub contingencies: Vec<PanopticamContingency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanopticamContingency {
    pub trigger_event_name: String,
    /// Empty means every group.
    pub applicable_groups: Vec<String>,
    pub action_command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolykilnDetail {
    pub object_name: String,
    pub functional_description: String,
    pub size_tier: SizeTier,
    pub mechanical_tier: i64,
    pub electronic_tier: i64,
    pub score: i64,
    pub cartridge_used: Article,
    pub shift_cost: i64,
    pub ocs_compute_cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirgoDetail {
    pub mode: VirgoMode,
    pub sample_source_description: Option<String>,
    pub analysis_reference_name: Option<String>,
    pub request_theta_analysis: bool,
    pub target_compound_identifier: Option<String>,
    pub desired_functional_effect: Option<String>,
    pub shifts_used: i64,
    pub compute_cost: i64,
    pub cartridge_used: Option<Article>,
}

/// Filter options for listing experiments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperimentListQuery {
    pub user_id: Option<UserId>,
    pub autostation: Option<Autostation>,
    pub pending_only: bool,
}

#[cfg(test)]
mod tests {
    use super::{Autostation, SizeTier};
    use crate::model::resources::Article;

    #[test]
    fn autostation_display_names_are_stable() {
        assert_eq!(Autostation::Virgo.as_str(), "Virgo Reactor");
        assert_eq!(
            Autostation::parse("GeneWeaver"),
            Some(Autostation::GeneWeaver)
        );
    }

    #[test]
    fn size_tier_maps_weight_and_filament() {
        assert_eq!(SizeTier::S.weight(), 1);
        assert_eq!(SizeTier::L.weight(), 3);
        assert_eq!(
            SizeTier::M.filament_cartridge(),
            Article::SmartFilamentMCartridge
        );
    }
}
