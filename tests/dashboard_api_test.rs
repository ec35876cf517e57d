// ==========================================
// 看板 API 集成测试
// ==========================================
// 测试目标: 时间段 KPI、按班次汇总、待处置清单、健康度
// ==========================================


use chrono::NaiveDate;
use production_tracking::api::{ApiError, DispositionForm};
use production_tracking::config::config_keys;
use production_tracking::domain::{NewProductionReading, ShiftWindow};
use production_tracking::engine::HealthStatus;
use test_helpers::{at, operator_on, reading, setup_state, supervisor};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

#[test]
fn test_kpis_over_range() {
    let (_tmp, state) = setup_state();
    let op = operator_on(&state, "op1", ShiftWindow::Morning);
    let op2 = operator_on(&state, "op2", ShiftWindow::Afternoon);

    // 10 托 (2 不合格, 废品 50 盒, 停机 10 分钟) + 6 托 全合格
    state
        .production_api
        .create_reading(
            &op,
            NewProductionReading {
                waste_boxes: 50,
                stoppage_minutes: 10,
                ..reading(10, 2)
            },
            at(9, 0),
        )
        .unwrap();
    state
        .production_api
        .create_reading(&op2, reading(6, 0), at(15, 0))
        .unwrap();

    let kpis = state.dashboard_api.kpis(at(0, 0), at(23, 59)).unwrap();
    assert_eq!(kpis.record_count, 2);
    assert_eq!(kpis.total_palettes, 16);
    assert_eq!(kpis.total_non_conforming, 2);
    assert_eq!(kpis.total_conforming, 14);
    assert_eq!(kpis.total_waste_boxes, 50);
    assert_eq!(kpis.total_stoppage_minutes, 10);
    assert_eq!(kpis.avg_stoppage_minutes, 5.0);
    assert_eq!(kpis.palettes_per_record, 8.0);
    assert_eq!(kpis.productivity_rate, 100.0);
    assert_eq!(kpis.conformity_rate, 87.5);
    // 50 / (16 * 25)
    assert_eq!(kpis.defect_rate, 12.5);
    assert_eq!(kpis.overall_efficiency, 87.5);

    // 区间外无数据
    let empty = state.dashboard_api.kpis(at(0, 0), at(8, 0)).unwrap();
    assert_eq!(empty.record_count, 0);
    assert_eq!(empty.conformity_rate, 0.0);
}

#[test]
fn test_kpi_target_follows_configuration() {
    let (_tmp, state) = setup_state();
    state
        .config_manager
        .set_global_config_value(config_keys::TARGET_PALETTES_PER_RECORD, "16")
        .unwrap();
    state
        .production_api
        .create_reading(
            &operator_on(&state, "op1", ShiftWindow::Morning),
            reading(8, 0),
            at(9, 0),
        )
        .unwrap();

    let kpis = state.dashboard_api.kpis(at(0, 0), at(23, 0)).unwrap();
    assert_eq!(kpis.productivity_rate, 50.0);
}

#[test]
fn test_invalid_range() {
    let (_tmp, state) = setup_state();
    assert!(matches!(
        state.dashboard_api.kpis(at(10, 0), at(9, 0)),
        Err(ApiError::ValidationError(_))
    ));
}

#[test]
fn test_shift_productivity_sorted_by_palettes() {
    let (_tmp, state) = setup_state();
    let anne = operator_on(&state, "anne", ShiftWindow::Morning);
    let bob = operator_on(&state, "bob", ShiftWindow::Afternoon);
    let carl = operator_on(&state, "carl", ShiftWindow::Afternoon);
    let api = &state.production_api;
    api.create_reading(&anne, reading(4, 0), at(7, 0)).unwrap();
    api.create_reading(&bob, reading(9, 1), at(15, 0)).unwrap();
    api.create_reading(&carl, reading(3, 0), at(16, 0)).unwrap();

    let groups = state
        .dashboard_api
        .shift_productivity(at(0, 0), at(23, 0))
        .unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].shift, ShiftWindow::Afternoon);
    assert_eq!(groups[0].total_palettes, 12);
    assert_eq!(groups[0].operators, vec!["bob", "carl"]);
    assert_eq!(groups[1].shift, ShiftWindow::Morning);
    assert_eq!(groups[1].total_palettes, 4);
}

#[test]
fn test_daily_summary_tracks_awaiting_disposition() {
    let (_tmp, state) = setup_state();
    let op = operator_on(&state, "op1", ShiftWindow::Morning);
    let first = state
        .production_api
        .create_reading(&op, reading(10, 2), at(8, 0))
        .unwrap()
        .record;
    state
        .production_api
        .create_reading(&op, reading(10, 1), at(9, 0))
        .unwrap();

    let summary = state.dashboard_api.daily_summary(day()).unwrap();
    assert_eq!(summary.kpis.record_count, 2);
    assert_eq!(summary.awaiting_disposition, 2);

    state
        .production_api
        .dispose_non_conforming(
            &supervisor(),
            &first.record_id,
            &DispositionForm::new("toute_conforme"),
            at(10, 0),
        )
        .unwrap();

    let awaiting = state.dashboard_api.awaiting_disposition().unwrap();
    assert_eq!(awaiting.len(), 1);
    assert_eq!(
        state.dashboard_api.daily_summary(day()).unwrap().awaiting_disposition,
        1
    );
}

#[test]
fn test_system_health_for_day() {
    let (_tmp, state) = setup_state();
    let empty = state.dashboard_api.system_health(day()).unwrap();
    assert_eq!(empty.health_score, 70);
    assert_eq!(empty.status, HealthStatus::Good);
    assert_eq!(empty.records_today, 0);

    let op = operator_on(&state, "op1", ShiftWindow::Morning);
    let op2 = operator_on(&state, "op2", ShiftWindow::Morning);
    let api = &state.production_api;
    api.create_reading(&op, reading(8, 0), at(8, 0)).unwrap();
    api.create_reading(
        &op2,
        NewProductionReading {
            line_no: 2,
            stoppage_minutes: 40,
            ..reading(8, 0)
        },
        at(9, 0),
    )
    .unwrap();

    let health = state.dashboard_api.system_health(day()).unwrap();
    assert_eq!(health.records_today, 2);
    assert_eq!(health.unresolved_alerts, 1);
    assert_eq!(health.active_users, 2);
    assert_eq!(health.active_lines, 2);
    // 少于 10 条报工扣 15 分
    assert_eq!(health.health_score, 85);
    assert_eq!(health.status, HealthStatus::Good);

    let next_day = day().succ_opt().unwrap();
    assert_eq!(
        state.dashboard_api.system_health(next_day).unwrap().records_today,
        0
    );
}
