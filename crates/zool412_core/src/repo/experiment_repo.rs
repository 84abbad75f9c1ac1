//! Experiment repository: bookings across every autostation.
//!
//! # Responsibility
//! - Commit a priced booking: draw resources, write header, detail, child
//!   rows and the ledger entry together.
//! - Rebuild an `ExperimentRecord` from the header and its detail tables.
//!
//! # Invariants
//! - A booking either commits completely or leaves no trace.
//! - Every header has exactly one detail row in its autostation table.
//! - Polykiln object names are unique across all bookings.
//! - Panopticam name lists persist comma-joined.

use crate::model::experiment::{
    Autostation, CaptureType, CellTypeLevel, Experiment, ExperimentDetail, ExperimentId,
    ExperimentListQuery, ExperimentRecord, GeneWeaverDetail, GeneWeaverGroup, GeneWeaverMode,
    ImagingTechnique, IntraspectraDetail, IntraspectraMode, Magnification, MicroscopyTechnique,
    NeuroCartographerDetail, PanopticamContingency, PanopticamDetail, PanopticamEvent,
    PanopticamGroup, PanopticamPhase, PolykilnDetail, SizeTier, SpectralFilter, TracerTransport,
    VirgoDetail, VirgoMode, VolumeCaptureType,
};
use crate::model::ledger::{LedgerActionType, NewLedgerEntry};
use crate::model::resources::{AnimalSpecies, Article};
use crate::model::user::UserId;
use crate::repo::inventory_repo::{commit_draw, load_inventory};
use crate::repo::{
    bool_to_int, ensure_connection_ready, ensure_user_exists, insert_ledger_entry, int_to_week,
    now_stamp, parse_optional_text, parse_text, RepoError, RepoResult, TableRequirements,
};
use crate::station::BookingPlan;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

pub(crate) const EXPERIMENT_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    autostation_name,
    experiment_type,
    subject_species,
    date,
    time,
    booked_week,
    wait_weeks,
    is_complete,
    is_failed,
    result_summary
FROM experiments";

const REQUIRED_TABLES: TableRequirements = &[
    (
        "experiments",
        &[
            "id",
            "user_id",
            "autostation_name",
            "experiment_type",
            "subject_species",
            "booked_week",
            "wait_weeks",
            "is_complete",
            "is_failed",
        ],
    ),
    ("geneweaver_experiments", &["experiment_id", "mode"]),
    ("geneweaver_groups", &["geneweaver_experiment_id", "group_name"]),
    ("intraspectra_experiments", &["experiment_id", "mode", "ocs_jobs"]),
    ("neurocartographer_experiments", &["experiment_id"]),
    ("panopticam_experiments", &["experiment_id", "experiment_run_id"]),
    ("panopticam_groups", &["experiment_id", "group_name"]),
    ("panopticam_events", &["experiment_id", "event_name"]),
    ("panopticam_phases", &["experiment_id", "sequence_index"]),
    ("panopticam_contingencies", &["phase_id", "trigger_event_name"]),
    ("polykiln_experiments", &["experiment_id", "object_name"]),
    ("virgo_experiments", &["experiment_id", "mode"]),
    ("inventory", &["credits", "current_week"]),
    ("user_ledger", &["user_id", "action_type", "cost_chuan"]),
];

pub trait ExperimentRepository {
    /// Re-checks and draws resources, then stores the booking.
    fn book(&self, user_id: UserId, plan: &BookingPlan) -> RepoResult<ExperimentRecord>;
    fn get_experiment(&self, id: ExperimentId) -> RepoResult<Option<ExperimentRecord>>;
    /// Headers only, oldest first.
    fn list_experiments(&self, query: &ExperimentListQuery) -> RepoResult<Vec<Experiment>>;
    fn polykiln_object_exists(&self, object_name: &str) -> RepoResult<bool>;
}

pub struct SqliteExperimentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExperimentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl ExperimentRepository for SqliteExperimentRepository<'_> {
    fn book(&self, user_id: UserId, plan: &BookingPlan) -> RepoResult<ExperimentRecord> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_user_exists(&tx, user_id)?;
        let inventory = load_inventory(&tx)?;

        if let ExperimentDetail::Polykiln(detail) = &plan.detail {
            if object_exists(&tx, &detail.object_name)? {
                return Err(RepoError::DuplicateObjectName(detail.object_name.clone()));
            }
        }

        commit_draw(&tx, &inventory, &plan.draw)?;

        let (date, time) = now_stamp();
        tx.execute(
            "INSERT INTO experiments (
                user_id,
                autostation_name,
                experiment_type,
                subject_species,
                date,
                time,
                booked_week,
                wait_weeks,
                is_complete,
                is_failed,
                result_summary
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 0, NULL);",
            params![
                user_id,
                plan.autostation.as_str(),
                plan.experiment_type,
                plan.subject_species.map(|species| species.as_str()),
                date,
                time,
                inventory.current_week,
                plan.wait_weeks,
            ],
        )?;
        let experiment_id = tx.last_insert_rowid();
        insert_detail(&tx, experiment_id, &plan.detail)?;

        insert_ledger_entry(
            &tx,
            &NewLedgerEntry {
                user_id,
                action_type: LedgerActionType::Experiment,
                action_label: Some(format!("{}: {}", plan.autostation, plan.experiment_type)),
                cost_chuan: plan.draw.credits,
                cartridge_used: plan.detail.cartridge_used(),
            },
            inventory.current_week,
        )?;

        let record = load_record(&tx, experiment_id)?.ok_or(RepoError::NotFound {
            entity: "experiment",
            id: experiment_id,
        })?;
        tx.commit()?;

        info!(
            "event=experiment_booked module=repo status=ok experiment_id={} autostation={} shifts={} credits={}",
            experiment_id, plan.autostation, plan.draw.shifts, plan.draw.credits
        );
        Ok(record)
    }

    fn get_experiment(&self, id: ExperimentId) -> RepoResult<Option<ExperimentRecord>> {
        load_record(self.conn, id)
    }

    fn list_experiments(&self, query: &ExperimentListQuery) -> RepoResult<Vec<Experiment>> {
        let mut sql = format!("{EXPERIMENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(user_id) = query.user_id {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Integer(user_id));
        }
        if let Some(autostation) = query.autostation {
            sql.push_str(" AND autostation_name = ?");
            bind_values.push(Value::Text(autostation.as_str().to_string()));
        }
        if query.pending_only {
            sql.push_str(" AND is_complete = 0 AND is_failed = 0");
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut experiments = Vec::new();
        while let Some(row) = rows.next()? {
            experiments.push(parse_experiment_row(row)?);
        }
        Ok(experiments)
    }

    fn polykiln_object_exists(&self, object_name: &str) -> RepoResult<bool> {
        object_exists(self.conn, object_name)
    }
}

fn object_exists(conn: &Connection, object_name: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM polykiln_experiments WHERE object_name = ?1);",
        [object_name.trim()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn insert_detail(
    conn: &Connection,
    experiment_id: ExperimentId,
    detail: &ExperimentDetail,
) -> RepoResult<()> {
    match detail {
        ExperimentDetail::GeneWeaver(detail) => insert_geneweaver(conn, experiment_id, detail),
        ExperimentDetail::Intraspectra(detail) => {
            conn.execute(
                "INSERT INTO intraspectra_experiments (
                    experiment_id,
                    mode,
                    subject_count,
                    region_of_interest,
                    imaging_technique,
                    capture_type,
                    spectral_filter,
                    frame_capture_rate,
                    microscopy_technique,
                    magnification_level,
                    target_substance,
                    target_is_custom,
                    volume_capture_type,
                    number_of_volumes,
                    volume_capture_rate,
                    ocs_jobs,
                    cartridge_used
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
                params![
                    experiment_id,
                    detail.mode.as_str(),
                    detail.subject_count,
                    detail.region_of_interest.as_str(),
                    detail.imaging_technique.map(|value| value.as_str()),
                    detail.capture_type.map(|value| value.as_str()),
                    detail.spectral_filter.map(|value| value.as_str()),
                    detail.frame_capture_rate,
                    detail.microscopy_technique.map(|value| value.as_str()),
                    detail.magnification_level.map(|value| value.as_str()),
                    detail.target_substance.as_deref(),
                    bool_to_int(detail.target_is_custom),
                    detail.volume_capture_type.map(|value| value.as_str()),
                    detail.number_of_volumes,
                    detail.volume_capture_rate,
                    detail.ocs_jobs,
                    detail.cartridge_used.map(|value| value.as_str()),
                ],
            )?;
            Ok(())
        }
        ExperimentDetail::NeuroCartographer(detail) => {
            conn.execute(
                "INSERT INTO neurocartographer_experiments (
                    experiment_id,
                    subject_count,
                    seed_neuron_locator,
                    tracer_transport_type,
                    max_neurons_to_map,
                    pathway_search_algorithm,
                    cartridge_used
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    experiment_id,
                    detail.subject_count,
                    detail.seed_neuron_locator.as_str(),
                    detail.tracer_transport_type.as_str(),
                    detail.max_neurons_to_map,
                    detail.pathway_search_algorithm.as_str(),
                    detail.cartridge_used.map(|value| value.as_str()),
                ],
            )?;
            Ok(())
        }
        ExperimentDetail::Panopticam(detail) => insert_panopticam(conn, experiment_id, detail),
        ExperimentDetail::Polykiln(detail) => {
            conn.execute(
                "INSERT INTO polykiln_experiments (
                    experiment_id,
                    object_name,
                    functional_description,
                    size_tier,
                    mechanical_tier,
                    electronic_tier,
                    score,
                    cartridge_used,
                    shift_cost,
                    ocs_compute_cost
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    experiment_id,
                    detail.object_name.as_str(),
                    detail.functional_description.as_str(),
                    detail.size_tier.as_str(),
                    detail.mechanical_tier,
                    detail.electronic_tier,
                    detail.score,
                    detail.cartridge_used.as_str(),
                    detail.shift_cost,
                    detail.ocs_compute_cost,
                ],
            )?;
            Ok(())
        }
        ExperimentDetail::Virgo(detail) => {
            conn.execute(
                "INSERT INTO virgo_experiments (
                    experiment_id,
                    mode,
                    sample_source_description,
                    analysis_reference_name,
                    request_theta_analysis,
                    target_compound_identifier,
                    desired_functional_effect,
                    shifts_used,
                    compute_cost,
                    cartridge_used
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    experiment_id,
                    detail.mode.as_str(),
                    detail.sample_source_description.as_deref(),
                    detail.analysis_reference_name.as_deref(),
                    bool_to_int(detail.request_theta_analysis),
                    detail.target_compound_identifier.as_deref(),
                    detail.desired_functional_effect.as_deref(),
                    detail.shifts_used,
                    detail.compute_cost,
                    detail.cartridge_used.map(|value| value.as_str()),
                ],
            )?;
            Ok(())
        }
    }
}

fn insert_geneweaver(
    conn: &Connection,
    experiment_id: ExperimentId,
    detail: &GeneWeaverDetail,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO geneweaver_experiments (
            experiment_id,
            mode,
            fold_change_threshold,
            max_sequences,
            cell_type_level,
            cell_type_description,
            gene_of_interest,
            promoter_sequence,
            transduction_level,
            transduction_description,
            cartridge_used
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params![
            experiment_id,
            detail.mode.as_str(),
            detail.fold_change_threshold,
            detail.max_sequences,
            detail.cell_type_level.map(|value| value.as_str()),
            detail.cell_type_description.as_deref(),
            detail.gene_of_interest.as_deref(),
            detail.promoter_sequence.as_deref(),
            detail.transduction_level.map(|value| value.as_str()),
            detail.transduction_description.as_deref(),
            detail.cartridge_used.map(|value| value.as_str()),
        ],
    )?;
    let geneweaver_id = conn.last_insert_rowid();

    for group in &detail.groups {
        conn.execute(
            "INSERT INTO geneweaver_groups (
                geneweaver_experiment_id,
                group_name,
                subject_ids,
                subject_count,
                sampling_instructions,
                modification_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                geneweaver_id,
                group.group_name.as_str(),
                group.subject_ids.as_deref(),
                group.subject_count,
                group.sampling_instructions.as_deref(),
                group.modification_type.as_deref(),
            ],
        )?;
    }
    Ok(())
}

fn insert_panopticam(
    conn: &Connection,
    experiment_id: ExperimentId,
    detail: &PanopticamDetail,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO panopticam_experiments (
            experiment_id,
            experiment_run_id,
            probe_type_used,
            base_shift_cost,
            total_subjects,
            total_monitoring_hours,
            cartridge_used
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            experiment_id,
            detail.experiment_run_id.as_str(),
            detail.probe_type_used.as_str(),
            detail.base_shift_cost,
            detail.total_subjects,
            detail.total_monitoring_hours,
            detail.cartridge_used.map(|value| value.as_str()),
        ],
    )?;
    let panopticam_id = conn.last_insert_rowid();

    for group in &detail.groups {
        conn.execute(
            "INSERT INTO panopticam_groups (experiment_id, group_name, subject_count)
             VALUES (?1, ?2, ?3);",
            params![panopticam_id, group.group_name.as_str(), group.subject_count],
        )?;
    }
    for event in &detail.events {
        conn.execute(
            "INSERT INTO panopticam_events (
                experiment_id,
                event_name,
                definition_type,
                quantification_method,
                operational_definition
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                panopticam_id,
                event.event_name.as_str(),
                event.definition_type.as_str(),
                event.quantification_method.as_str(),
                event.operational_definition.as_str(),
            ],
        )?;
    }
    for (index, phase) in detail.phases.iter().enumerate() {
        conn.execute(
            "INSERT INTO panopticam_phases (
                experiment_id,
                sequence_index,
                phase_name,
                phase_duration,
                monitor_events_active
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                panopticam_id,
                index as i64,
                phase.phase_name.as_str(),
                phase.phase_duration.as_str(),
                join_names(&phase.monitor_events_active),
            ],
        )?;
        let phase_id = conn.last_insert_rowid();

        for rule in &phase.contingencies {
            conn.execute(
                "INSERT INTO panopticam_contingencies (
                    phase_id,
                    trigger_event_name,
                    applicable_groups,
                    action_command
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    phase_id,
                    rule.trigger_event_name.as_str(),
                    join_names(&rule.applicable_groups),
                    rule.action_command.as_str(),
                ],
            )?;
        }
    }
    Ok(())
}

fn load_record(conn: &Connection, id: ExperimentId) -> RepoResult<Option<ExperimentRecord>> {
    let mut stmt = conn.prepare(&format!("{EXPERIMENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let experiment = parse_experiment_row(row)?;
    let detail = load_detail(conn, experiment.id, experiment.autostation)?;
    Ok(Some(ExperimentRecord { experiment, detail }))
}

pub(crate) fn parse_experiment_row(row: &Row<'_>) -> RepoResult<Experiment> {
    let autostation: String = row.get("autostation_name")?;
    let is_complete: i64 = row.get("is_complete")?;
    let is_failed: i64 = row.get("is_failed")?;
    Ok(Experiment {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        autostation: parse_text(
            "experiments.autostation_name",
            &autostation,
            Autostation::parse,
        )?,
        experiment_type: row.get("experiment_type")?,
        subject_species: parse_optional_text(
            "experiments.subject_species",
            row.get("subject_species")?,
            AnimalSpecies::parse,
        )?,
        date: row.get("date")?,
        time: row.get("time")?,
        booked_week: int_to_week("experiments.booked_week", row.get("booked_week")?)?,
        wait_weeks: int_to_week("experiments.wait_weeks", row.get("wait_weeks")?)?,
        is_complete: is_complete != 0,
        is_failed: is_failed != 0,
        result_summary: row.get("result_summary")?,
    })
}

fn load_detail(
    conn: &Connection,
    experiment_id: ExperimentId,
    autostation: Autostation,
) -> RepoResult<ExperimentDetail> {
    let detail = match autostation {
        Autostation::GeneWeaver => ExperimentDetail::GeneWeaver(load_geneweaver(conn, experiment_id)?),
        Autostation::Intraspectra => {
            ExperimentDetail::Intraspectra(load_intraspectra(conn, experiment_id)?)
        }
        Autostation::NeuroCartographer => {
            ExperimentDetail::NeuroCartographer(load_neurocartographer(conn, experiment_id)?)
        }
        Autostation::Panopticam => ExperimentDetail::Panopticam(load_panopticam(conn, experiment_id)?),
        Autostation::Polykiln => ExperimentDetail::Polykiln(load_polykiln(conn, experiment_id)?),
        Autostation::Virgo => ExperimentDetail::Virgo(load_virgo(conn, experiment_id)?),
    };
    Ok(detail)
}

fn missing_detail(table: &str, experiment_id: ExperimentId) -> RepoError {
    RepoError::InvalidData(format!("experiment {experiment_id} has no {table} row"))
}

fn load_geneweaver(conn: &Connection, experiment_id: ExperimentId) -> RepoResult<GeneWeaverDetail> {
    let mut stmt = conn.prepare(
        "SELECT
            id,
            mode,
            fold_change_threshold,
            max_sequences,
            cell_type_level,
            cell_type_description,
            gene_of_interest,
            promoter_sequence,
            transduction_level,
            transduction_description,
            cartridge_used
         FROM geneweaver_experiments
         WHERE experiment_id = ?1;",
    )?;
    let mut rows = stmt.query([experiment_id])?;
    let row = rows
        .next()?
        .ok_or_else(|| missing_detail("geneweaver_experiments", experiment_id))?;

    let geneweaver_id: i64 = row.get("id")?;
    let mode: String = row.get("mode")?;
    let mut detail = GeneWeaverDetail {
        mode: parse_text("geneweaver_experiments.mode", &mode, GeneWeaverMode::parse)?,
        fold_change_threshold: row.get("fold_change_threshold")?,
        max_sequences: row.get("max_sequences")?,
        cell_type_level: parse_optional_text(
            "geneweaver_experiments.cell_type_level",
            row.get("cell_type_level")?,
            CellTypeLevel::parse,
        )?,
        cell_type_description: row.get("cell_type_description")?,
        gene_of_interest: row.get("gene_of_interest")?,
        promoter_sequence: row.get("promoter_sequence")?,
        transduction_level: parse_optional_text(
            "geneweaver_experiments.transduction_level",
            row.get("transduction_level")?,
            CellTypeLevel::parse,
        )?,
        transduction_description: row.get("transduction_description")?,
        cartridge_used: parse_optional_text(
            "geneweaver_experiments.cartridge_used",
            row.get("cartridge_used")?,
            Article::parse,
        )?,
        groups: Vec::new(),
    };

    let mut group_stmt = conn.prepare(
        "SELECT group_name, subject_ids, subject_count, sampling_instructions, modification_type
         FROM geneweaver_groups
         WHERE geneweaver_experiment_id = ?1
         ORDER BY id ASC;",
    )?;
    detail.groups = group_stmt
        .query_map([geneweaver_id], |row| {
            Ok(GeneWeaverGroup {
                group_name: row.get("group_name")?,
                subject_ids: row.get("subject_ids")?,
                subject_count: row.get("subject_count")?,
                sampling_instructions: row.get("sampling_instructions")?,
                modification_type: row.get("modification_type")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(detail)
}

fn load_intraspectra(
    conn: &Connection,
    experiment_id: ExperimentId,
) -> RepoResult<IntraspectraDetail> {
    let mut stmt = conn.prepare(
        "SELECT
            mode,
            subject_count,
            region_of_interest,
            imaging_technique,
            capture_type,
            spectral_filter,
            frame_capture_rate,
            microscopy_technique,
            magnification_level,
            target_substance,
            target_is_custom,
            volume_capture_type,
            number_of_volumes,
            volume_capture_rate,
            ocs_jobs,
            cartridge_used
         FROM intraspectra_experiments
         WHERE experiment_id = ?1;",
    )?;
    let mut rows = stmt.query([experiment_id])?;
    let row = rows
        .next()?
        .ok_or_else(|| missing_detail("intraspectra_experiments", experiment_id))?;

    let mode: String = row.get("mode")?;
    let target_is_custom: i64 = row.get("target_is_custom")?;
    Ok(IntraspectraDetail {
        mode: parse_text("intraspectra_experiments.mode", &mode, IntraspectraMode::parse)?,
        subject_count: row.get("subject_count")?,
        region_of_interest: row.get("region_of_interest")?,
        imaging_technique: parse_optional_text(
            "intraspectra_experiments.imaging_technique",
            row.get("imaging_technique")?,
            ImagingTechnique::parse,
        )?,
        capture_type: parse_optional_text(
            "intraspectra_experiments.capture_type",
            row.get("capture_type")?,
            CaptureType::parse,
        )?,
        spectral_filter: parse_optional_text(
            "intraspectra_experiments.spectral_filter",
            row.get("spectral_filter")?,
            SpectralFilter::parse,
        )?,
        frame_capture_rate: row.get("frame_capture_rate")?,
        microscopy_technique: parse_optional_text(
            "intraspectra_experiments.microscopy_technique",
            row.get("microscopy_technique")?,
            MicroscopyTechnique::parse,
        )?,
        magnification_level: parse_optional_text(
            "intraspectra_experiments.magnification_level",
            row.get("magnification_level")?,
            Magnification::parse,
        )?,
        target_substance: row.get("target_substance")?,
        target_is_custom: target_is_custom != 0,
        volume_capture_type: parse_optional_text(
            "intraspectra_experiments.volume_capture_type",
            row.get("volume_capture_type")?,
            VolumeCaptureType::parse,
        )?,
        number_of_volumes: row.get("number_of_volumes")?,
        volume_capture_rate: row.get("volume_capture_rate")?,
        ocs_jobs: row.get("ocs_jobs")?,
        cartridge_used: parse_optional_text(
            "intraspectra_experiments.cartridge_used",
            row.get("cartridge_used")?,
            Article::parse,
        )?,
    })
}

fn load_neurocartographer(
    conn: &Connection,
    experiment_id: ExperimentId,
) -> RepoResult<NeuroCartographerDetail> {
    let mut stmt = conn.prepare(
        "SELECT
            subject_count,
            seed_neuron_locator,
            tracer_transport_type,
            max_neurons_to_map,
            pathway_search_algorithm,
            cartridge_used
         FROM neurocartographer_experiments
         WHERE experiment_id = ?1;",
    )?;
    let mut rows = stmt.query([experiment_id])?;
    let row = rows
        .next()?
        .ok_or_else(|| missing_detail("neurocartographer_experiments", experiment_id))?;

    let transport: String = row.get("tracer_transport_type")?;
    Ok(NeuroCartographerDetail {
        subject_count: row.get("subject_count")?,
        seed_neuron_locator: row.get("seed_neuron_locator")?,
        tracer_transport_type: parse_text(
            "neurocartographer_experiments.tracer_transport_type",
            &transport,
            TracerTransport::parse,
        )?,
        max_neurons_to_map: row.get("max_neurons_to_map")?,
        pathway_search_algorithm: row.get("pathway_search_algorithm")?,
        cartridge_used: parse_optional_text(
            "neurocartographer_experiments.cartridge_used",
            row.get("cartridge_used")?,
            Article::parse,
        )?,
    })
}

fn load_panopticam(conn: &Connection, experiment_id: ExperimentId) -> RepoResult<PanopticamDetail> {
    let mut stmt = conn.prepare(
        "SELECT
            id,
            experiment_run_id,
            probe_type_used,
            base_shift_cost,
            total_subjects,
            total_monitoring_hours,
            cartridge_used
         FROM panopticam_experiments
         WHERE experiment_id = ?1;",
    )?;
    let mut rows = stmt.query([experiment_id])?;
    let row = rows
        .next()?
        .ok_or_else(|| missing_detail("panopticam_experiments", experiment_id))?;
    let panopticam_id: i64 = row.get("id")?;

    let mut group_stmt = conn.prepare(
        "SELECT group_name, subject_count
         FROM panopticam_groups
         WHERE experiment_id = ?1
         ORDER BY id ASC;",
    )?;
    let groups = group_stmt
        .query_map([panopticam_id], |row| {
            Ok(PanopticamGroup {
                group_name: row.get("group_name")?,
                subject_count: row.get("subject_count")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut event_stmt = conn.prepare(
        "SELECT event_name, definition_type, quantification_method, operational_definition
         FROM panopticam_events
         WHERE experiment_id = ?1
         ORDER BY id ASC;",
    )?;
    let events = event_stmt
        .query_map([panopticam_id], |row| {
            Ok(PanopticamEvent {
                event_name: row.get("event_name")?,
                definition_type: row.get("definition_type")?,
                quantification_method: row.get("quantification_method")?,
                operational_definition: row.get("operational_definition")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut phase_stmt = conn.prepare(
        "SELECT id, phase_name, phase_duration, monitor_events_active
         FROM panopticam_phases
         WHERE experiment_id = ?1
         ORDER BY sequence_index ASC;",
    )?;
    let phase_rows = phase_stmt
        .query_map([panopticam_id], |row| {
            Ok((
                row.get::<_, i64>("id")?,
                row.get::<_, String>("phase_name")?,
                row.get::<_, String>("phase_duration")?,
                row.get::<_, Option<String>>("monitor_events_active")?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut contingency_stmt = conn.prepare(
        "SELECT trigger_event_name, applicable_groups, action_command
         FROM panopticam_contingencies
         WHERE phase_id = ?1
         ORDER BY id ASC;",
    )?;
    let mut phases = Vec::with_capacity(phase_rows.len());
    for (phase_id, phase_name, phase_duration, monitor_events_active) in phase_rows {
        let contingencies = contingency_stmt
            .query_map([phase_id], |row| {
                Ok(PanopticamContingency {
                    trigger_event_name: row.get("trigger_event_name")?,
                    applicable_groups: split_names(row.get("applicable_groups")?),
                    action_command: row.get("action_command")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        phases.push(PanopticamPhase {
            phase_name,
            phase_duration,
            monitor_events_active: split_names(monitor_events_active),
            contingencies,
        });
    }

    Ok(PanopticamDetail {
        experiment_run_id: row.get("experiment_run_id")?,
        probe_type_used: row.get("probe_type_used")?,
        base_shift_cost: row.get("base_shift_cost")?,
        total_subjects: row.get("total_subjects")?,
        total_monitoring_hours: row.get("total_monitoring_hours")?,
        cartridge_used: parse_optional_text(
            "panopticam_experiments.cartridge_used",
            row.get("cartridge_used")?,
            Article::parse,
        )?,
        groups,
        events,
        phases,
    })
}

fn load_polykiln(conn: &Connection, experiment_id: ExperimentId) -> RepoResult<PolykilnDetail> {
    let mut stmt = conn.prepare(
        "SELECT
            object_name,
            functional_description,
            size_tier,
            mechanical_tier,
            electronic_tier,
            score,
            cartridge_used,
            shift_cost,
            ocs_compute_cost
         FROM polykiln_experiments
         WHERE experiment_id = ?1;",
    )?;
    let mut rows = stmt.query([experiment_id])?;
    let row = rows
        .next()?
        .ok_or_else(|| missing_detail("polykiln_experiments", experiment_id))?;

    let size_tier: String = row.get("size_tier")?;
    let cartridge: String = row.get("cartridge_used")?;
    Ok(PolykilnDetail {
        object_name: row.get("object_name")?,
        functional_description: row.get("functional_description")?,
        size_tier: parse_text("polykiln_experiments.size_tier", &size_tier, SizeTier::parse)?,
        mechanical_tier: row.get("mechanical_tier")?,
        electronic_tier: row.get("electronic_tier")?,
        score: row.get("score")?,
        cartridge_used: parse_text(
            "polykiln_experiments.cartridge_used",
            &cartridge,
            Article::parse,
        )?,
        shift_cost: row.get("shift_cost")?,
        ocs_compute_cost: row.get("ocs_compute_cost")?,
    })
}

fn load_virgo(conn: &Connection, experiment_id: ExperimentId) -> RepoResult<VirgoDetail> {
    let mut stmt = conn.prepare(
        "SELECT
            mode,
            sample_source_description,
            analysis_reference_name,
            request_theta_analysis,
            target_compound_identifier,
            desired_functional_effect,
            shifts_used,
            compute_cost,
            cartridge_used
         FROM virgo_experiments
         WHERE experiment_id = ?1;",
    )?;
    let mut rows = stmt.query([experiment_id])?;
    let row = rows
        .next()?
        .ok_or_else(|| missing_detail("virgo_experiments", experiment_id))?;

    let mode: String = row.get("mode")?;
    let theta: i64 = row.get("request_theta_analysis")?;
    Ok(VirgoDetail {
        mode: parse_text("virgo_experiments.mode", &mode, VirgoMode::parse)?,
        sample_source_description: row.get("sample_source_description")?,
        analysis_reference_name: row.get("analysis_reference_name")?,
        request_theta_analysis: theta != 0,
        target_compound_identifier: row.get("target_compound_identifier")?,
        desired_functional_effect: row.get("desired_functional_effect")?,
        shifts_used: row.get("shifts_used")?,
        compute_cost: row.get("compute_cost")?,
        cartridge_used: parse_optional_text(
            "virgo_experiments.cartridge_used",
            row.get("cartridge_used")?,
            Article::parse,
        )?,
    })
}

fn join_names(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(","))
    }
}

fn split_names(value: Option<String>) -> Vec<String> {
    value
        .map(|joined| {
            joined
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
