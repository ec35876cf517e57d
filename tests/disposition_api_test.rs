// ==========================================
// 不合格品处置端到端测试
// ==========================================
// 测试目标: 表单解析 → 事务内处置 → 落库
// 重点: 换算正确性、守恒、失败时记录不变、重复处置拦截
// ==========================================


use production_tracking::api::{ApiError, DispositionForm};
use production_tracking::domain::{Actor, DispositionStatus};
use production_tracking::engine::{DispositionAction, NonConformityDispositionEngine};
use test_helpers::{at, create_record, setup_state, supervisor};

fn form(action: &str) -> DispositionForm {
    DispositionForm::new(action)
}

#[test]
fn test_all_conforming_recovers_every_bundle() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 5, 7);
    assert_eq!(rec.disposition_status, DispositionStatus::Pending);

    let out = state
        .production_api
        .dispose_non_conforming(&supervisor(), &rec.record_id, &form("toute_conforme"), at(15, 0))
        .unwrap();
    assert_eq!(out.recovered_bundles, 360);
    assert_eq!(out.status, DispositionStatus::Resolved);

    let stored = state.production_api.get_record(&rec.record_id).unwrap();
    assert_eq!(stored.palettes_non_conforming, 0);
    assert_eq!(stored.recovered_bundles, 360);
    assert_eq!(stored.waste_boxes, 7);
    assert_eq!(stored.disposition_status, DispositionStatus::Resolved);
    assert_eq!(stored.nc_controlled_at, Some(at(15, 0)));
    assert_eq!(stored.updated_at, at(15, 0));
}

#[test]
fn test_partial_quick_converts_unrecovered_to_waste() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 2, 0);

    let f = DispositionForm {
        recovered_bundles: "100".to_string(),
        ..form("partiel")
    };
    let out = state
        .production_api
        .dispose_non_conforming(&supervisor(), &rec.record_id, &f, at(15, 0))
        .unwrap();
    assert_eq!(out.bundles_available, 144);
    assert_eq!(out.waste_boxes_added, 1056);

    let stored = state.production_api.get_record(&rec.record_id).unwrap();
    assert_eq!(stored.waste_boxes, 1056);
    assert_eq!(stored.recovered_bundles, 100);
    assert_eq!(stored.palettes_non_conforming, 0);
    assert_eq!(stored.disposition_status, DispositionStatus::Resolved);
}

#[test]
fn test_partial_quick_overflow_leaves_record_unchanged() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 2, 3);
    let before = state.production_api.get_record(&rec.record_id).unwrap();

    let f = DispositionForm {
        recovered_bundles: "200".to_string(),
        ..form("partial_quick")
    };
    let err = state
        .production_api
        .dispose_non_conforming(&supervisor(), &rec.record_id, &f, at(15, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::ExceedsAvailable {
            requested: 200,
            available: 144
        }
    ));

    let after = state.production_api.get_record(&rec.record_id).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_reject_adds_waste_per_palette() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 3, 0);

    let out = state
        .production_api
        .dispose_non_conforming(&supervisor(), &rec.record_id, &form("non_conforme"), at(15, 0))
        .unwrap();
    assert_eq!(out.waste_boxes_added, 216);

    let stored = state.production_api.get_record(&rec.record_id).unwrap();
    assert_eq!(stored.waste_boxes, 216);
    assert_eq!(stored.palettes_non_conforming, 0);
    assert_eq!(stored.disposition_status, DispositionStatus::Rejected);
}

#[test]
fn test_second_disposition_is_nothing_to_process() {
    for action in ["toute_conforme", "traitement_detaille", "partiel", "non_conforme"] {
        let (_tmp, state) = setup_state();
        let rec = create_record(&state, 10, 1, 0);

        let f = DispositionForm {
            recovered_bundles: "10".to_string(),
            ..form(action)
        };
        state
            .production_api
            .dispose_non_conforming(&supervisor(), &rec.record_id, &f, at(15, 0))
            .unwrap();
        let after_first = state.production_api.get_record(&rec.record_id).unwrap();

        let err = state
            .production_api
            .dispose_non_conforming(&supervisor(), &rec.record_id, &f, at(16, 0))
            .unwrap_err();
        assert!(
            matches!(err, ApiError::NothingToProcess { .. }),
            "action {}",
            action
        );
        assert_eq!(
            state.production_api.get_record(&rec.record_id).unwrap(),
            after_first
        );
    }
}

#[test]
fn test_conforme_record_cannot_be_disposed() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 0, 0);
    assert_eq!(rec.disposition_status, DispositionStatus::Conforme);

    let err = state
        .production_api
        .dispose_non_conforming(&supervisor(), &rec.record_id, &form("toute_conforme"), at(15, 0))
        .unwrap_err();
    assert!(matches!(err, ApiError::NothingToProcess { .. }));
}

#[test]
fn test_detailed_conservation_for_all_inputs() {
    let engine = NonConformityDispositionEngine::new();
    for nc in 1..=3u32 {
        let available = nc * 72;
        for palettes in 0..=nc {
            for partial in (0..=available + 10).step_by(7) {
                let calc = engine
                    .calculate(
                        nc,
                        &DispositionAction::Detailed {
                            recovered_palettes: palettes,
                            recovered_bundles_partial: partial,
                        },
                    )
                    .unwrap();
                assert_eq!(
                    calc.bundles_from_palettes
                        + calc.recovered_bundles_partial
                        + calc.unrecovered_bundles,
                    available,
                    "nc={} palettes={} partial={}",
                    nc,
                    palettes,
                    partial
                );
                assert_eq!(calc.waste_boxes_added, calc.unrecovered_bundles * 24);
            }
        }
    }
}

#[test]
fn test_detailed_clamp_is_reported() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 2, 0);

    let f = DispositionForm {
        recovered_palettes: "1".to_string(),
        recovered_bundles_partial: "500".to_string(),
        ..form("detailed")
    };
    let out = state
        .production_api
        .dispose_non_conforming(&supervisor(), &rec.record_id, &f, at(15, 0))
        .unwrap();

    let clamp = out.clamp_warning.expect("clamp warning expected");
    assert_eq!(clamp.requested, 500);
    assert_eq!(clamp.applied, 72);
    assert_eq!(out.recovered_bundles, 144);
    assert_eq!(out.waste_boxes_added, 0);
}

#[test]
fn test_operator_is_unauthorized() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 2, 0);

    let err = state
        .production_api
        .dispose_non_conforming(&Actor::operator("op1"), &rec.record_id, &form("reject"), at(15, 0))
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(
        state.production_api.get_record(&rec.record_id).unwrap().palettes_non_conforming,
        2
    );
}

#[test]
fn test_invalid_form_input() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 2, 0);
    let before = state.production_api.get_record(&rec.record_id).unwrap();

    let bad_forms = [
        form("recycler"),
        DispositionForm {
            recovered_bundles: "douze".to_string(),
            ..form("partiel")
        },
        DispositionForm {
            recovered_palettes: "-1".to_string(),
            ..form("traitement_detaille")
        },
        // 空串记 0, 快速回收 0 捆无效
        form("partiel"),
        DispositionForm {
            recovered_palettes: "3".to_string(),
            ..form("traitement_detaille")
        },
    ];
    for f in &bad_forms {
        let err = state
            .production_api
            .dispose_non_conforming(&supervisor(), &rec.record_id, f, at(15, 0))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidQuantity(_)), "form {:?}", f);
    }
    assert_eq!(state.production_api.get_record(&rec.record_id).unwrap(), before);
}

#[test]
fn test_missing_record_is_not_found() {
    let (_tmp, state) = setup_state();
    let err = state
        .production_api
        .dispose_non_conforming(&supervisor(), "absent", &form("reject"), at(15, 0))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_audit_note_records_actor_and_comment() {
    let (_tmp, state) = setup_state();
    let rec = create_record(&state, 10, 1, 0);

    let f = DispositionForm {
        comment: "défaut d'étiquetage".to_string(),
        ..form("toute_conforme")
    };
    let out = state
        .production_api
        .dispose_non_conforming(&supervisor(), &rec.record_id, &f, at(15, 0))
        .unwrap();

    let stored = state.production_api.get_record(&rec.record_id).unwrap();
    let note = stored.nc_resolution_comment.expect("audit note expected");
    assert_eq!(note, out.note);
    assert!(note.contains("chef"));
    assert!(note.contains("défaut d'étiquetage"));
    assert!(note.contains("2025-03-10 15:00:00"));
}
