mod common;

use common::{admin, experiments, row_count, seeded_db};
use zool412_core::model::experiment::{
    Autostation, CaptureType, CellTypeLevel, ExperimentDetail, ExperimentListQuery,
    ImagingTechnique, SizeTier, TracerTransport, VolumeCaptureType,
};
use zool412_core::model::inventory::Shortfall;
use zool412_core::model::ledger::{LedgerActionType, LedgerQuery};
use zool412_core::model::resources::{AnimalSpecies, Article};
use zool412_core::repo::{
    ExperimentRepository, LedgerRepository, SqliteClockRepository, SqliteExperimentRepository,
    SqliteLedgerRepository,
};
use zool412_core::service::{ClockService, ExperimentServiceError};
use zool412_core::station::{
    ContingencyForm, DgeGroupForm, EventForm, GeneWeaverDgeRequest, GeneWeaverViralRequest,
    GroupForm, IntraspectraRtRequest, IntraspectraVisualRequest, NeuroCartographerRequest,
    PanopticamRequest, PhaseForm, PolykilnRequest, ViralGroupForm, VirgoAnalysisRequest,
    VirgoSynthesisRequest,
};
use zool412_core::{BookingRequest, PlanError};

fn dge_request() -> BookingRequest {
    BookingRequest::GeneWeaverDge(GeneWeaverDgeRequest {
        subject_species: AnimalSpecies::U51,
        fold_change_threshold: 2,
        max_sequences: 5000,
        cell_type_level: CellTypeLevel::Subtype,
        cell_type_description: "Retinal ganglion cells".to_string(),
        groups: vec![
            DgeGroupForm {
                group_name: "Control".to_string(),
                subject_ids: Some("A01, A02, A03, A04, A05".to_string()),
                subject_count: 5,
                sampling_instructions: Some("Collect hippocampus tissue.".to_string()),
            },
            DgeGroupForm {
                group_name: "Treatment".to_string(),
                subject_ids: Some("A06, A07, A08, A09, A10".to_string()),
                subject_count: 5,
                sampling_instructions: None,
            },
        ],
    })
}

fn polykiln_request(object_name: &str) -> BookingRequest {
    BookingRequest::Polykiln(PolykilnRequest {
        subject_species: None,
        object_name: object_name.to_string(),
        functional_description: "Holds a probe steady over the skull.".to_string(),
        assessed_size_tier: SizeTier::M,
        assessed_mechanical_tier: 2,
        assessed_electronic_tier: 1,
    })
}

fn panopticam_request() -> BookingRequest {
    BookingRequest::Panopticam(PanopticamRequest {
        subject_species: AnimalSpecies::U51,
        experiment_run_id: "RUN-7".to_string(),
        probe_type_used: None,
        total_monitoring_hours: 2.5,
        experimental_groups: vec![
            GroupForm {
                group_name: "A".to_string(),
                subject_count: 3,
            },
            GroupForm {
                group_name: "B".to_string(),
                subject_count: 2,
            },
        ],
        event_dictionary: vec![
            EventForm {
                event_name: "Freeze".to_string(),
                definition_type: "posture".to_string(),
                quantification_method: "duration".to_string(),
                operational_definition: "No movement for 2 s.".to_string(),
            },
            EventForm {
                event_name: "Rear".to_string(),
                definition_type: "posture".to_string(),
                quantification_method: "count".to_string(),
                operational_definition: "Both forepaws lifted.".to_string(),
            },
        ],
        phase_sequence: vec![
            PhaseForm {
                phase_name: "Baseline".to_string(),
                phase_duration: "30 minutes".to_string(),
                monitor_events_active: vec!["Freeze".to_string()],
                contingency_rules: Vec::new(),
            },
            PhaseForm {
                phase_name: "Test".to_string(),
                phase_duration: "100 trials".to_string(),
                monitor_events_active: vec!["Freeze".to_string(), "Rear".to_string()],
                contingency_rules: vec![ContingencyForm {
                    trigger_event_name: "Freeze".to_string(),
                    applicable_groups: vec!["A".to_string()],
                    action_command: "play tone".to_string(),
                }],
            },
        ],
    })
}

#[test]
fn dge_booking_draws_resources_and_persists_detail() {
    let (conn, user_id) = seeded_db();
    let service = experiments(&conn);

    let quote = service.quote(&dge_request()).unwrap();
    assert!(quote.is_affordable());
    assert_eq!(quote.plan.draw.credits, 50_000.0);
    assert_eq!(quote.plan.draw.shifts, 2);

    let record = service.book(user_id, &dge_request()).unwrap();
    assert_eq!(record.experiment.autostation, Autostation::GeneWeaver);
    assert_eq!(record.experiment.experiment_type, "DGE Analysis");
    assert_eq!(record.experiment.subject_species, Some(AnimalSpecies::U51));
    assert_eq!(record.experiment.wait_weeks, 2);
    assert!(record.experiment.is_pending());
    assert_eq!(record.detail, quote.plan.detail);

    let inventory = admin(&conn).inventory().unwrap();
    assert_eq!(inventory.credits, 1_950_000.0);
    assert_eq!(inventory.ta_saltos_shifts, 118);
    assert_eq!(inventory.xatty_cartridge, 0);
    assert_eq!(inventory.animal_stock(AnimalSpecies::U51).available, 40);

    let entries = SqliteLedgerRepository::try_new(&conn)
        .unwrap()
        .list_entries(&LedgerQuery::default())
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action_type, LedgerActionType::Experiment);
    assert_eq!(
        entries[0].action_label.as_deref(),
        Some("GeneWeaver: DGE Analysis")
    );
    assert_eq!(entries[0].cartridge_used, Some(Article::XattyCartridge));
}

#[test]
fn booking_that_no_longer_fits_changes_nothing() {
    let (conn, user_id) = seeded_db();
    let service = experiments(&conn);
    service.book(user_id, &dge_request()).unwrap();
    let before = admin(&conn).inventory().unwrap();

    let quote = service.quote(&dge_request()).unwrap();
    assert!(!quote.is_affordable());
    assert!(quote.shortfalls.iter().any(|shortfall| matches!(
        shortfall,
        Shortfall::Article {
            article: Article::XattyCartridge,
            ..
        }
    )));

    let err = service.book(user_id, &dge_request()).unwrap_err();
    assert!(matches!(err, ExperimentServiceError::InsufficientResources(_)));
    assert_eq!(admin(&conn).inventory().unwrap(), before);
    assert_eq!(row_count(&conn, "experiments"), 1);
    assert_eq!(row_count(&conn, "geneweaver_groups"), 2);
    assert_eq!(row_count(&conn, "user_ledger"), 1);
}

#[test]
fn invalid_form_is_rejected_before_any_write() {
    let (conn, user_id) = seeded_db();
    let request = BookingRequest::GeneWeaverViral(GeneWeaverViralRequest {
        subject_species: AnimalSpecies::U51,
        gene_of_interest: "   ".to_string(),
        promoter_sequence: None,
        transduction_level: CellTypeLevel::Bulk,
        transduction_description: "All cells".to_string(),
        groups: vec![ViralGroupForm {
            group_name: "Control_Vector".to_string(),
            subject_count: 3,
            modification_type: None,
        }],
    });

    let err = experiments(&conn).book(user_id, &request).unwrap_err();
    assert!(matches!(
        err,
        ExperimentServiceError::Plan(PlanError::MissingField("gene_of_interest"))
    ));
    assert_eq!(row_count(&conn, "experiments"), 0);
    assert_eq!(admin(&conn).inventory().unwrap().xatty_cartridge, 1);
}

#[test]
fn viral_booking_bills_one_shift_per_animal() {
    let (conn, user_id) = seeded_db();
    let request = BookingRequest::GeneWeaverViral(GeneWeaverViralRequest {
        subject_species: AnimalSpecies::U51,
        gene_of_interest: "Knock out gene X for metabolic inhibition.".to_string(),
        promoter_sequence: Some("Only express under high calcium.".to_string()),
        transduction_level: CellTypeLevel::Subtype,
        transduction_description: "Retinal ganglion cells".to_string(),
        groups: vec![
            ViralGroupForm {
                group_name: "Control_Vector".to_string(),
                subject_count: 3,
                modification_type: None,
            },
            ViralGroupForm {
                group_name: "Knockout_Group".to_string(),
                subject_count: 5,
                modification_type: Some("Knockout".to_string()),
            },
        ],
    });

    let record = experiments(&conn).book(user_id, &request).unwrap();
    assert_eq!(record.experiment.wait_weeks, 3);
    match &record.detail {
        ExperimentDetail::GeneWeaver(detail) => {
            assert_eq!(detail.groups.len(), 2);
            assert_eq!(detail.groups[1].modification_type.as_deref(), Some("Knockout"));
        }
        other => panic!("unexpected detail: {other:?}"),
    }

    let inventory = admin(&conn).inventory().unwrap();
    assert_eq!(inventory.total_shifts(), 480 - 8);
    assert_eq!(inventory.credits, 2_000_000.0);
}

#[test]
fn intraspectra_bookings_roundtrip_both_modes() {
    let (conn, user_id) = seeded_db();
    let service = experiments(&conn);

    let visual = BookingRequest::IntraspectraVisual(IntraspectraVisualRequest {
        subject_species: AnimalSpecies::U51,
        subject_count: 3,
        region_of_interest: "dorsal cortex".to_string(),
        imaging_technique: ImagingTechnique::CameraImaging,
        capture_type: CaptureType::SingleFrame,
        frame_capture_rate: None,
        spectral_filter: None,
        microscopy_technique: None,
        magnification_level: None,
    });
    let quote = service.quote(&visual).unwrap();
    let record = service.book(user_id, &visual).unwrap();
    assert_eq!(record.detail, quote.plan.detail);
    assert_eq!(record.experiment.experiment_type, "Visual Acquisition");

    let rt = BookingRequest::IntraspectraRt(IntraspectraRtRequest {
        subject_species: AnimalSpecies::U51,
        subject_count: 4,
        region_of_interest: "hippocampus".to_string(),
        target_substance: "dopamine".to_string(),
        target_is_custom: false,
        volume_capture_type: VolumeCaptureType::StaticVolume,
        number_of_volumes: None,
        volume_capture_rate: None,
    });
    let quote = service.quote(&rt).unwrap();
    let record = service.book(user_id, &rt).unwrap();
    assert_eq!(record.detail, quote.plan.detail);
    assert_eq!(admin(&conn).inventory().unwrap().zeropoint_cartridge, 0);
}

#[test]
fn booking_records_species_without_touching_animal_stock() {
    let (conn, user_id) = seeded_db();
    let before = admin(&conn).inventory().unwrap();
    assert!(before.animal_stock(AnimalSpecies::U51M).is_locked());
    let visual = BookingRequest::IntraspectraVisual(IntraspectraVisualRequest {
        subject_species: AnimalSpecies::U51M,
        subject_count: 2,
        region_of_interest: "optic lobe".to_string(),
        imaging_technique: ImagingTechnique::CameraImaging,
        capture_type: CaptureType::SingleFrame,
        frame_capture_rate: None,
        spectral_filter: None,
        microscopy_technique: None,
        magnification_level: None,
    });

    let record = experiments(&conn).book(user_id, &visual).unwrap();
    assert_eq!(record.experiment.subject_species, Some(AnimalSpecies::U51M));

    let after = admin(&conn).inventory().unwrap();
    assert_eq!(
        after.animal_stock(AnimalSpecies::U51M),
        before.animal_stock(AnimalSpecies::U51M)
    );
    assert_eq!(
        after.animal_stock(AnimalSpecies::U51),
        before.animal_stock(AnimalSpecies::U51)
    );
    assert_eq!(after.total_shifts(), 480 - 1);
}

#[test]
fn overflowing_subject_count_is_a_form_error() {
    let (conn, user_id) = seeded_db();
    let request = BookingRequest::GeneWeaverDge(GeneWeaverDgeRequest {
        subject_species: AnimalSpecies::U51,
        fold_change_threshold: 2,
        max_sequences: 5000,
        cell_type_level: CellTypeLevel::Bulk,
        cell_type_description: "Whole brain".to_string(),
        groups: vec![DgeGroupForm {
            group_name: "Control".to_string(),
            subject_ids: None,
            subject_count: i64::MAX,
            sampling_instructions: None,
        }],
    });
    let service = experiments(&conn);

    assert!(matches!(
        service.quote(&request).unwrap_err(),
        ExperimentServiceError::Plan(PlanError::Overflow { field: "credits" })
    ));
    assert!(matches!(
        service.book(user_id, &request).unwrap_err(),
        ExperimentServiceError::Plan(PlanError::Overflow { .. })
    ));
    assert_eq!(row_count(&conn, "experiments"), 0);
}

#[test]
fn neurocartographer_booking_roundtrips() {
    let (conn, user_id) = seeded_db();
    let request = BookingRequest::NeuroCartographer(NeuroCartographerRequest {
        subject_species: AnimalSpecies::U51,
        subject_count: 2,
        seed_neuron_locator: "CA1 pyramidal layer".to_string(),
        tracer_transport_type: TracerTransport::Retrograde,
        max_neurons_to_map: 250,
        pathway_search_algorithm: "breadth first".to_string(),
    });

    let record = experiments(&conn).book(user_id, &request).unwrap();
    match &record.detail {
        ExperimentDetail::NeuroCartographer(detail) => {
            assert_eq!(detail.tracer_transport_type, TracerTransport::Retrograde);
            assert_eq!(detail.cartridge_used, Some(Article::NcPk1Cartridge));
        }
        other => panic!("unexpected detail: {other:?}"),
    }
    assert_eq!(admin(&conn).inventory().unwrap().credits, 1_995_000.0);
}

#[test]
fn panopticam_children_roundtrip_in_order() {
    let (conn, user_id) = seeded_db();
    let service = experiments(&conn);

    let quote = service.quote(&panopticam_request()).unwrap();
    assert_eq!(quote.plan.draw.shifts, 3);
    assert_eq!(quote.plan.draw.credits, 6_500.0);

    let record = service.book(user_id, &panopticam_request()).unwrap();
    assert_eq!(record.detail, quote.plan.detail);
    match &record.detail {
        ExperimentDetail::Panopticam(detail) => {
            assert_eq!(detail.probe_type_used, "None");
            assert_eq!(detail.total_subjects, 5);
            assert_eq!(detail.phases[0].phase_name, "Baseline");
            assert_eq!(detail.phases[1].monitor_events_active, vec!["Freeze", "Rear"]);
            assert_eq!(detail.phases[1].contingencies[0].applicable_groups, vec!["A"]);
        }
        other => panic!("unexpected detail: {other:?}"),
    }
    assert_eq!(row_count(&conn, "panopticam_phases"), 2);
    assert_eq!(row_count(&conn, "panopticam_contingencies"), 1);
}

#[test]
fn polykiln_object_names_are_unique() {
    let (conn, user_id) = seeded_db();
    let service = experiments(&conn);

    let record = service
        .book(user_id, &polykiln_request("Skull Clamp"))
        .unwrap();
    assert_eq!(record.experiment.subject_species, None);
    match &record.detail {
        ExperimentDetail::Polykiln(detail) => {
            assert_eq!(detail.score, 7);
            assert_eq!(detail.shift_cost, 4);
            assert_eq!(detail.cartridge_used, Article::SmartFilamentMCartridge);
        }
        other => panic!("unexpected detail: {other:?}"),
    }

    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();
    assert!(repo.polykiln_object_exists("Skull Clamp").unwrap());
    assert!(!repo.polykiln_object_exists("Tail Cuff").unwrap());

    let err = service
        .book(user_id, &polykiln_request("  Skull Clamp "))
        .unwrap_err();
    assert!(matches!(
        err,
        ExperimentServiceError::DuplicateObjectName(name) if name == "Skull Clamp"
    ));
    assert_eq!(row_count(&conn, "polykiln_experiments"), 1);
}

#[test]
fn virgo_modes_price_surcharges() {
    let (conn, user_id) = seeded_db();
    let service = experiments(&conn);

    let analysis = BookingRequest::VirgoAnalysis(VirgoAnalysisRequest {
        sample_source_description: Some("pond water".to_string()),
        analysis_reference_name: None,
        request_theta_analysis: true,
    });
    let record = service.book(user_id, &analysis).unwrap();
    assert_eq!(record.experiment.experiment_type, "Compound Analysis");
    assert_eq!(record.experiment.autostation.as_str(), "Virgo Reactor");

    let synthesis = BookingRequest::VirgoSynthesis(VirgoSynthesisRequest {
        target_compound_identifier: None,
        desired_functional_effect: Some("Slows heart rate".to_string()),
    });
    let record = service.book(user_id, &synthesis).unwrap();
    assert_eq!(record.experiment.wait_weeks, 3);

    let inventory = admin(&conn).inventory().unwrap();
    assert_eq!(inventory.credits, 2_000_000.0 - 5_000.0 - 10_000.0);
    assert_eq!(inventory.dupont_cartridge, 0);
    assert_eq!(inventory.total_shifts(), 480 - 2 - 4);
}

#[test]
fn experiments_complete_after_their_wait() {
    let (conn, user_id) = seeded_db();
    let service = experiments(&conn);
    let dge = service.book(user_id, &dge_request()).unwrap();
    let pano = service.book(user_id, &panopticam_request()).unwrap();
    let clock = ClockService::new(SqliteClockRepository::try_new(&conn).unwrap());

    let week_one = clock.advance_one_week().unwrap();
    assert_eq!(week_one.completed.len(), 1);
    assert_eq!(week_one.completed[0].id, pano.experiment.id);
    assert!(week_one.completed[0].is_complete);

    let pending = service
        .list(&ExperimentListQuery {
            pending_only: true,
            ..ExperimentListQuery::default()
        })
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, dge.experiment.id);
    assert_eq!(pending[0].wait_weeks, 1);

    let week_two = clock.advance_one_week().unwrap();
    assert_eq!(week_two.completed.len(), 1);
    assert_eq!(week_two.completed[0].id, dge.experiment.id);

    let loaded = service.get(dge.experiment.id).unwrap();
    assert!(loaded.experiment.is_complete);
    assert_eq!(loaded.experiment.result_summary, None);
}

#[test]
fn listing_filters_by_autostation_and_user() {
    let (conn, user_id) = seeded_db();
    let service = experiments(&conn);
    service.book(user_id, &dge_request()).unwrap();
    service
        .book(user_id + 1, &polykiln_request("Lever Arm"))
        .unwrap();

    let by_station = service
        .list(&ExperimentListQuery {
            autostation: Some(Autostation::Polykiln),
            ..ExperimentListQuery::default()
        })
        .unwrap();
    assert_eq!(by_station.len(), 1);
    assert_eq!(by_station[0].user_id, user_id + 1);

    let by_user = service
        .list(&ExperimentListQuery {
            user_id: Some(user_id),
            ..ExperimentListQuery::default()
        })
        .unwrap();
    assert_eq!(by_user.len(), 1);
    assert_eq!(by_user[0].autostation, Autostation::GeneWeaver);
}

#[test]
fn missing_experiment_is_reported() {
    let (conn, _) = seeded_db();

    let err = experiments(&conn).get(77).unwrap_err();
    assert!(matches!(err, ExperimentServiceError::ExperimentNotFound(77)));
}

#[test]
fn booking_for_unknown_user_is_rejected() {
    let (conn, _) = seeded_db();

    let err = experiments(&conn)
        .book(500, &polykiln_request("Ghost"))
        .unwrap_err();
    assert!(matches!(err, ExperimentServiceError::UserNotFound(500)));
    assert_eq!(row_count(&conn, "experiments"), 0);
}

#[test]
fn json_form_books_with_defaults_for_optional_lists() {
    let (conn, user_id) = seeded_db();
    let form: PanopticamRequest = serde_json::from_str(
        r#"{
            "subject_species": "animals_51u6",
            "experiment_run_id": "Open_Field_01",
            "total_monitoring_hours": 1.0,
            "experimental_groups": [{ "group_name": "Solo", "subject_count": 1 }]
        }"#,
    )
    .unwrap();
    assert_eq!(form.probe_type_used, None);
    assert!(form.phase_sequence.is_empty());

    let record = experiments(&conn)
        .book(user_id, &BookingRequest::Panopticam(form))
        .unwrap();
    match &record.detail {
        ExperimentDetail::Panopticam(detail) => {
            assert!(detail.events.is_empty());
            assert_eq!(detail.total_subjects, 1);
        }
        other => panic!("unexpected detail: {other:?}"),
    }
    assert_eq!(admin(&conn).inventory().unwrap().credits, 2_000_000.0 - 500.0);
}
