//! Intraspectra Iris Mark II: visual acquisition and resonance tomography.
//!
//! Both modes bill OCS compute jobs at a flat 1000 chuan per job.

use crate::model::experiment::{
    Autostation, CaptureType, ExperimentDetail, ImagingTechnique, IntraspectraDetail,
    IntraspectraMode, Magnification, MicroscopyTechnique, SpectralFilter, VolumeCaptureType,
};
use crate::model::inventory::ResourceDraw;
use crate::model::resources::{AnimalSpecies, Article};
use crate::station::{
    ceil_div, checked_product, require_positive, require_rate, require_text, BookingPlan,
    PlanError,
};
use serde::{Deserialize, Serialize};

const OCS_JOB_COST: i64 = 1000;
const FRAMES_PER_OCS_JOB: i64 = 1000;
/// Upper bound on frames recorded per time-series subject.
const TIME_SERIES_FRAMES_PER_SUBJECT: i64 = 10_000;
const VOLUMES_PER_OCS_JOB: i64 = 10;
const RT_SUBJECTS_PER_SHIFT: i64 = 5;
const VISUAL_WAIT_WEEKS: u32 = 1;
const RT_WAIT_WEEKS: u32 = 2;
const RT_CARTRIDGE: Article = Article::ZeropointCartridge;

/// Visual data acquisition form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntraspectraVisualRequest {
    pub subject_species: AnimalSpecies,
    pub subject_count: i64,
    pub region_of_interest: String,
    pub imaging_technique: ImagingTechnique,
    pub capture_type: CaptureType,
    #[serde(default)]
    pub frame_capture_rate: Option<f64>,
    #[serde(default)]
    pub spectral_filter: Option<SpectralFilter>,
    #[serde(default)]
    pub microscopy_technique: Option<MicroscopyTechnique>,
    #[serde(default)]
    pub magnification_level: Option<Magnification>,
}

/// Resonance tomography form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntraspectraRtRequest {
    pub subject_species: AnimalSpecies,
    pub subject_count: i64,
    pub region_of_interest: String,
    pub target_substance: String,
    #[serde(default)]
    pub target_is_custom: bool,
    pub volume_capture_type: VolumeCaptureType,
    #[serde(default)]
    pub number_of_volumes: Option<i64>,
    #[serde(default)]
    pub volume_capture_rate: Option<f64>,
}

impl IntraspectraVisualRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let subject_count = require_positive("subject_count", self.subject_count)?;
        let region_of_interest = require_text("region_of_interest", &self.region_of_interest)?;

        let (samples_per_shift, total_frames, frame_capture_rate) = match self.capture_type {
            CaptureType::SingleFrame => (10, subject_count, self.frame_capture_rate),
            CaptureType::TimeSeries => (
                5,
                checked_product(
                    "total_frames",
                    subject_count,
                    TIME_SERIES_FRAMES_PER_SUBJECT,
                )?,
                Some(require_rate("frame_capture_rate", self.frame_capture_rate)?),
            ),
        };

        let microscopy_technique = match self.imaging_technique {
            ImagingTechnique::Microscopy => Some(
                self.microscopy_technique
                    .ok_or(PlanError::MissingField("microscopy_technique"))?,
            ),
            _ => None,
        };
        let magnification_level = microscopy_technique.and(self.magnification_level);

        let ocs_jobs = ceil_div(total_frames, FRAMES_PER_OCS_JOB);
        let credits = checked_product("credits", ocs_jobs, OCS_JOB_COST)?;

        Ok(BookingPlan {
            autostation: Autostation::Intraspectra,
            experiment_type: "Visual Acquisition",
            subject_species: Some(self.subject_species),
            wait_weeks: VISUAL_WAIT_WEEKS,
            draw: ResourceDraw {
                credits: credits as f64,
                shifts: ceil_div(subject_count, samples_per_shift),
                article: None,
            },
            detail: ExperimentDetail::Intraspectra(IntraspectraDetail {
                mode: IntraspectraMode::Visual,
                subject_count,
                region_of_interest,
                imaging_technique: Some(self.imaging_technique),
                capture_type: Some(self.capture_type),
                spectral_filter: self.spectral_filter,
                frame_capture_rate,
                microscopy_technique,
                magnification_level,
                target_substance: None,
                target_is_custom: false,
                volume_capture_type: None,
                number_of_volumes: None,
                volume_capture_rate: None,
                ocs_jobs,
                cartridge_used: None,
            }),
        })
    }
}

impl IntraspectraRtRequest {
    pub fn plan(&self) -> Result<BookingPlan, PlanError> {
        let subject_count = require_positive("subject_count", self.subject_count)?;
        let region_of_interest = require_text("region_of_interest", &self.region_of_interest)?;
        let target_substance = require_text("target_substance", &self.target_substance)?;

        let (volumes_per_subject, volume_capture_rate) = match self.volume_capture_type {
            VolumeCaptureType::StaticVolume => (
                require_positive("number_of_volumes", self.number_of_volumes.unwrap_or(1))?,
                None,
            ),
            VolumeCaptureType::DynamicVolumeSeries => {
                let volumes = self
                    .number_of_volumes
                    .ok_or(PlanError::MissingField("number_of_volumes"))?;
                (
                    require_positive("number_of_volumes", volumes)?,
                    Some(require_rate(
                        "volume_capture_rate",
                        self.volume_capture_rate,
                    )?),
                )
            }
        };

        let total_volumes = checked_product("total_volumes", subject_count, volumes_per_subject)?;
        let ocs_jobs = ceil_div(total_volumes, VOLUMES_PER_OCS_JOB);
        let credits = checked_product("credits", ocs_jobs, OCS_JOB_COST)?;

        Ok(BookingPlan {
            autostation: Autostation::Intraspectra,
            experiment_type: "Resonance Tomography",
            subject_species: Some(self.subject_species),
            wait_weeks: RT_WAIT_WEEKS,
            draw: ResourceDraw {
                credits: credits as f64,
                shifts: ceil_div(subject_count, RT_SUBJECTS_PER_SHIFT),
                article: Some(RT_CARTRIDGE),
            },
            detail: ExperimentDetail::Intraspectra(IntraspectraDetail {
                mode: IntraspectraMode::ResonanceTomography,
                subject_count,
                region_of_interest,
                imaging_technique: None,
                capture_type: None,
                spectral_filter: None,
                frame_capture_rate: None,
                microscopy_technique: None,
                magnification_level: None,
                target_substance: Some(target_substance),
                target_is_custom: self.target_is_custom,
                volume_capture_type: Some(self.volume_capture_type),
                number_of_volumes: Some(volumes_per_subject),
                volume_capture_rate,
                ocs_jobs,
                cartridge_used: Some(RT_CARTRIDGE),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{IntraspectraRtRequest, IntraspectraVisualRequest};
    use crate::model::experiment::{
        CaptureType, ImagingTechnique, Magnification, MicroscopyTechnique, SpectralFilter,
        VolumeCaptureType,
    };
    use crate::model::resources::{AnimalSpecies, Article};
    use crate::station::PlanError;

    fn visual(capture_type: CaptureType, subject_count: i64) -> IntraspectraVisualRequest {
        IntraspectraVisualRequest {
            subject_species: AnimalSpecies::U51,
            subject_count,
            region_of_interest: "Midbrain dorsal view".to_string(),
            imaging_technique: ImagingTechnique::Microscopy,
            capture_type,
            frame_capture_rate: Some(60.0),
            spectral_filter: Some(SpectralFilter::InfraredThermal),
            microscopy_technique: Some(MicroscopyTechnique::Fluorescence),
            magnification_level: Some(Magnification::X40),
        }
    }

    #[test]
    fn time_series_bills_full_frame_budget() {
        let plan = visual(CaptureType::TimeSeries, 4).plan().unwrap();
        assert_eq!(plan.draw.shifts, 1);
        assert_eq!(plan.draw.credits, 40_000.0);
        assert_eq!(plan.draw.article, None);
        assert_eq!(plan.wait_weeks, 1);
    }

    #[test]
    fn single_frame_needs_one_ocs_job_per_thousand_frames() {
        let plan = visual(CaptureType::SingleFrame, 11).plan().unwrap();
        assert_eq!(plan.draw.shifts, 2);
        assert_eq!(plan.draw.credits, 1_000.0);
    }

    #[test]
    fn visual_requires_rate_for_time_series_and_technique_for_microscopy() {
        let mut request = visual(CaptureType::TimeSeries, 2);
        request.frame_capture_rate = None;
        assert_eq!(
            request.plan().unwrap_err(),
            PlanError::MissingField("frame_capture_rate")
        );

        let mut request = visual(CaptureType::SingleFrame, 2);
        request.microscopy_technique = None;
        assert_eq!(
            request.plan().unwrap_err(),
            PlanError::MissingField("microscopy_technique")
        );
    }

    #[test]
    fn visual_rejects_subject_counts_that_overflow_pricing() {
        assert_eq!(
            visual(CaptureType::TimeSeries, i64::MAX).plan().unwrap_err(),
            PlanError::Overflow {
                field: "total_frames"
            }
        );
        assert_eq!(
            visual(CaptureType::SingleFrame, i64::MAX).plan().unwrap_err(),
            PlanError::Overflow { field: "credits" }
        );
    }

    #[test]
    fn resonance_tomography_rejects_overflowing_volume_total() {
        let request = IntraspectraRtRequest {
            subject_species: AnimalSpecies::U51,
            subject_count: i64::MAX,
            region_of_interest: "Thoracic Ganglion Cluster".to_string(),
            target_substance: "BioFluid_Oxygenation".to_string(),
            target_is_custom: false,
            volume_capture_type: VolumeCaptureType::StaticVolume,
            number_of_volumes: Some(2),
            volume_capture_rate: None,
        };
        assert_eq!(
            request.plan().unwrap_err(),
            PlanError::Overflow {
                field: "total_volumes"
            }
        );
    }

    #[test]
    fn resonance_tomography_uses_zeropoint_and_volume_jobs() {
        let request = IntraspectraRtRequest {
            subject_species: AnimalSpecies::U51,
            subject_count: 5,
            region_of_interest: "Thoracic Ganglion Cluster".to_string(),
            target_substance: "BioFluid_Oxygenation".to_string(),
            target_is_custom: false,
            volume_capture_type: VolumeCaptureType::StaticVolume,
            number_of_volumes: Some(20),
            volume_capture_rate: Some(0.5),
        };

        let plan = request.plan().unwrap();
        assert_eq!(plan.experiment_type, "Resonance Tomography");
        assert_eq!(plan.draw.article, Some(Article::ZeropointCartridge));
        assert_eq!(plan.draw.shifts, 1);
        assert_eq!(plan.draw.credits, 10_000.0);

        let mut dynamic = request.clone();
        dynamic.volume_capture_type = VolumeCaptureType::DynamicVolumeSeries;
        dynamic.volume_capture_rate = None;
        assert_eq!(
            dynamic.plan().unwrap_err(),
            PlanError::MissingField("volume_capture_rate")
        );
    }
}
