use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, TimeZone, Utc};
use kasboek_application::{ActionLogPolicy, Clock, SelectionPolicy};
use kasboek_core::AppError;
use kasboek_infrastructure::InMemoryKeyValueStorage;
use serde_json::json;

use crate::api_config::{ApiConfig, StorageBackendConfig};
use crate::api_services::build_app_state;
use crate::dto::{
    AdvanceOnboardingRequest, LogBulkOperationRequest, PrioritizeClientsRequest,
    SelectFailedClientsRequest, SelectionClientRequest, SelectionClientsRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

use super::{action_log, onboarding, risk, selection};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

async fn test_state() -> AppState {
    let config = ApiConfig {
        frontend_url: "http://localhost:3000".to_owned(),
        api_host: "127.0.0.1".to_owned(),
        api_port: 3001,
        storage_backend: StorageBackendConfig::Memory,
        action_log_policy: ActionLogPolicy::default(),
        selection_policy: SelectionPolicy::default(),
    };
    let mut background_tasks = Vec::new();
    let state = build_app_state(
        Arc::new(InMemoryKeyValueStorage::new()),
        Arc::new(FixedClock(now())),
        &config,
        &mut background_tasks,
    )
    .await;

    for task in background_tasks {
        task.abort();
    }

    state
}

fn bulk_operation_request() -> Option<LogBulkOperationRequest> {
    serde_json::from_value(json!({
        "result": {
            "action_type": "GENERATE_VAT_DRAFT",
            "total_processed": 3,
            "results": [
                { "client_id": "adm-1", "client_name": "Bakkerij Jansen", "status": "SUCCESS" },
                {
                    "client_id": "adm-2",
                    "client_name": "Fietsenmaker De Vries",
                    "status": "FAILED",
                    "error_message": "BTW-nummer ontbreekt"
                },
                { "client_id": "adm-3", "client_name": "Kapsalon Bos", "status": "FAILED" }
            ]
        },
        "vat_period": { "year": 2026, "quarter": 1 }
    }))
    .ok()
}

#[tokio::test]
async fn prioritize_ranks_clients_and_summarizes_levels() {
    let state = test_state().await;
    let request = serde_json::from_value::<PrioritizeClientsRequest>(json!({
        "clients": [
            { "client_id": "adm-quiet" },
            {
                "client_id": "adm-urgent",
                "red_issue_count": 2,
                "documents_needing_review_count": 4,
                "days_to_vat_deadline": 3
            },
            {
                "client_id": "adm-backlog",
                "documents_needing_review_count": 1,
                "backlog_age_max_days": 12,
                "last_activity_at": "2026-01-10T08:00:00Z"
            }
        ]
    }));
    assert!(request.is_ok());
    let Ok(request) = request else { return };

    let response = risk::prioritize_clients_handler(State(state), Json(request)).await;
    assert!(response.is_ok());
    let Ok(Json(response)) = response else { return };

    let ranked: Vec<(&str, u8)> = response
        .clients
        .iter()
        .map(|client| (client.client_id.as_str(), client.risk_score))
        .collect();
    assert_eq!(
        ranked,
        vec![("adm-urgent", 70), ("adm-backlog", 35), ("adm-quiet", 0)]
    );
    assert_eq!(
        serde_json::to_value(response.clients[0].risk_level).ok(),
        Some(json!("rood"))
    );
    assert_eq!(response.summary.rood, 1);
    assert_eq!(response.summary.ok, 2);
    assert_eq!(response.summary.total, 3);
}

#[tokio::test]
async fn prioritize_rejects_invalid_timestamps() {
    let state = test_state().await;
    let request = serde_json::from_value::<PrioritizeClientsRequest>(json!({
        "clients": [{ "client_id": "adm-1", "last_activity_at": "gisteren" }]
    }));
    assert!(request.is_ok());
    let Ok(request) = request else { return };

    let response = risk::prioritize_clients_handler(State(state), Json(request)).await;

    assert!(matches!(response, Err(ApiError(AppError::Validation(_)))));
}

#[tokio::test]
async fn logged_bulk_operation_is_listed_and_retrievable() {
    let state = test_state().await;
    let request = bulk_operation_request();
    assert!(request.is_some());
    let Some(request) = request else { return };

    let created =
        action_log::log_bulk_operation_handler(State(state.clone()), Json(request)).await;
    assert!(created.is_ok());
    let Ok((status, Json(entry))) = created else {
        return;
    };

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry.selected_count, 3);
    assert_eq!(entry.result_counts.success, 1);
    assert_eq!(entry.result_counts.failed, 2);
    assert_eq!(entry.timestamp, now().to_rfc3339());
    assert_eq!(entry.vat_period.map(|period| period.quarter), Some(1));

    let Json(listed) = action_log::list_action_log_handler(State(state.clone())).await;
    assert_eq!(listed.len(), 1);

    let fetched =
        action_log::get_action_log_entry_handler(State(state), Path(entry.id.clone())).await;
    assert_eq!(fetched.ok().map(|Json(found)| found.id), Some(entry.id));
}

#[tokio::test]
async fn missing_entries_are_not_found_and_clear_empties_the_log() {
    let state = test_state().await;
    let request = bulk_operation_request();
    assert!(request.is_some());
    let Some(request) = request else { return };
    let created =
        action_log::log_bulk_operation_handler(State(state.clone()), Json(request)).await;
    assert!(created.is_ok());

    let missing =
        action_log::get_action_log_entry_handler(State(state.clone()), Path("nope".to_owned()))
            .await;
    assert!(matches!(missing, Err(ApiError(AppError::NotFound(_)))));

    let status = action_log::clear_action_log_handler(State(state.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(state.action_log_store.count().await, 0);
}

#[tokio::test]
async fn selection_handlers_mutate_the_shared_selection() {
    let state = test_state().await;

    let replaced = selection::replace_selection_handler(
        State(state.clone()),
        Json(SelectionClientsRequest {
            client_ids: vec!["adm-2".to_owned(), "adm-1".to_owned()],
        }),
    )
    .await;
    assert_eq!(
        replaced.ok().map(|Json(selection)| selection.client_ids),
        Some(vec!["adm-1".to_owned(), "adm-2".to_owned()])
    );

    let toggled = selection::toggle_selection_handler(
        State(state.clone()),
        Json(SelectionClientRequest {
            client_id: "adm-1".to_owned(),
        }),
    )
    .await;
    assert_eq!(toggled.ok().map(|Json(selection)| selection.count), Some(1));

    let added = selection::add_to_selection_handler(
        State(state.clone()),
        Json(SelectionClientsRequest {
            client_ids: vec!["adm-3".to_owned(), "adm-4".to_owned()],
        }),
    )
    .await;
    assert_eq!(added.ok().map(|Json(selection)| selection.count), Some(3));

    let removed = selection::remove_from_selection_handler(
        State(state.clone()),
        Json(SelectionClientRequest {
            client_id: "adm-4".to_owned(),
        }),
    )
    .await;
    assert_eq!(
        removed.ok().map(|Json(selection)| selection.client_ids),
        Some(vec!["adm-2".to_owned(), "adm-3".to_owned()])
    );

    let Json(cleared) = selection::clear_selection_handler(State(state.clone())).await;
    assert_eq!(cleared.count, 0);

    let Json(current) = selection::get_selection_handler(State(state)).await;
    assert!(current.client_ids.is_empty());
}

#[tokio::test]
async fn selection_rejects_blank_client_ids() {
    let state = test_state().await;

    let response = selection::toggle_selection_handler(
        State(state.clone()),
        Json(SelectionClientRequest {
            client_id: "   ".to_owned(),
        }),
    )
    .await;

    assert!(matches!(response, Err(ApiError(AppError::Validation(_)))));
    assert_eq!(state.selection_store.count().await, 0);
}

#[tokio::test]
async fn only_failed_selects_the_failed_clients_of_an_entry() {
    let state = test_state().await;
    let request = bulk_operation_request();
    assert!(request.is_some());
    let Some(request) = request else { return };
    let created =
        action_log::log_bulk_operation_handler(State(state.clone()), Json(request)).await;
    assert!(created.is_ok());
    let Ok((_, Json(entry))) = created else {
        return;
    };
    let _ = selection::replace_selection_handler(
        State(state.clone()),
        Json(SelectionClientsRequest {
            client_ids: vec!["adm-1".to_owned(), "adm-9".to_owned()],
        }),
    )
    .await;

    let selected = selection::select_only_failed_handler(
        State(state.clone()),
        Json(SelectFailedClientsRequest { entry_id: entry.id }),
    )
    .await;
    assert_eq!(
        selected.ok().map(|Json(selection)| selection.client_ids),
        Some(vec!["adm-2".to_owned(), "adm-3".to_owned()])
    );

    let missing = selection::select_only_failed_handler(
        State(state),
        Json(SelectFailedClientsRequest {
            entry_id: "unknown".to_owned(),
        }),
    )
    .await;
    assert!(matches!(missing, Err(ApiError(AppError::NotFound(_)))));
}

#[tokio::test]
async fn onboarding_tour_advances_to_completion_and_resets() {
    let state = test_state().await;
    let user = || Path("user-42".to_owned());

    for _ in 0..2 {
        let advanced = onboarding::advance_onboarding_handler(
            State(state.clone()),
            user(),
            Json(AdvanceOnboardingRequest { total_steps: 2 }),
        )
        .await;
        assert!(advanced.is_ok());
    }

    let current = onboarding::get_onboarding_handler(State(state.clone()), user()).await;
    assert!(current.is_ok());
    let Ok(Json(current)) = current else {
        return;
    };
    assert!(current.completed);
    assert!(!current.active);
    assert_eq!(current.current_step, 2);

    let reset = onboarding::reset_onboarding_handler(State(state.clone()), user()).await;
    assert_eq!(
        reset.ok().map(|Json(tour)| (tour.current_step, tour.active)),
        Some((0, true))
    );

    let dismissed = onboarding::dismiss_onboarding_handler(State(state), user()).await;
    assert_eq!(dismissed.ok().map(|Json(tour)| tour.dismissed), Some(true));
}

#[tokio::test]
async fn onboarding_rejects_invalid_input() {
    let state = test_state().await;

    let bad_user =
        onboarding::complete_onboarding_handler(State(state.clone()), Path("a:b".to_owned()))
            .await;
    assert!(matches!(bad_user, Err(ApiError(AppError::Validation(_)))));

    let no_steps = onboarding::advance_onboarding_handler(
        State(state),
        Path("user-1".to_owned()),
        Json(AdvanceOnboardingRequest { total_steps: 0 }),
    )
    .await;
    assert!(matches!(no_steps, Err(ApiError(AppError::Validation(_)))));
}
