use carenest::{
    models::{
        admin::SetPlanRequest,
        care::{CreateCareEventRequest, CreateChildRequest},
    },
    ApiError,
};
use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use futures::future::join_all;
use uuid::Uuid;

use super::common::TestApp;

fn event_for(child_id: Uuid) -> CreateCareEventRequest {
    CreateCareEventRequest {
        child_id,
        event_type: "sleep".to_string(),
        occurred_at: None,
        notes: None,
    }
}

async fn make_pro(app: &TestApp, user_id: Uuid) {
    app.state
        .admin_service
        .set_plan(
            Uuid::new_v4(),
            user_id,
            SetPlanRequest {
                plan: PlanTier::Pro,
                status: SubscriptionStatus::Active,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_free_user_rejected_at_monthly_ceiling() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let child_id = app.care.add_child(user_id);
    app.care.seed_events(user_id, child_id, 499);

    // 500th event fits
    app.state
        .care_service
        .record_event(user_id, event_for(child_id))
        .await
        .unwrap();

    // 501st does not, and nothing is written
    let err = app
        .state
        .care_service
        .record_event(user_id, event_for(child_id))
        .await
        .unwrap_err();

    match err {
        ApiError::QuotaExceeded { resource, limit } => {
            assert_eq!(resource, "events");
            assert_eq!(limit, 500);
        }
        other => panic!("expected quota error, got {:?}", other),
    }
    assert_eq!(app.care.event_total(user_id), 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_events_at_last_slot_admit_one() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let child_id = app.care.add_child(user_id);
    app.care.seed_events(user_id, child_id, 499);

    let attempts = (0..8).map(|_| {
        let care = app.state.care_service.clone();
        tokio::spawn(async move { care.record_event(user_id, event_for(child_id)).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(ApiError::QuotaExceeded { .. })))
        .count();

    assert_eq!(accepted, 1);
    assert_eq!(rejected, 7);
    assert_eq!(app.care.event_total(user_id), 500);
}

#[tokio::test]
async fn test_pro_user_never_counted() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let child_id = app.care.add_child(user_id);
    app.care.seed_events(user_id, child_id, 2_000);
    make_pro(&app, user_id).await;

    app.state
        .care_service
        .record_event(user_id, event_for(child_id))
        .await
        .unwrap();

    assert_eq!(app.care.count_queries(), 0);
    assert_eq!(app.care.event_total(user_id), 2_001);
}

#[tokio::test]
async fn test_trial_does_not_lift_event_ceiling() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let child_id = app.care.add_child(user_id);
    app.care.seed_events(user_id, child_id, 500);
    app.state.trial_service.start_trial(user_id).await.unwrap();

    let err = app
        .state
        .care_service
        .record_event(user_id, event_for(child_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::QuotaExceeded { .. }));
}

#[tokio::test]
async fn test_event_for_foreign_child_not_found() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();
    let child_id = app.care.add_child(owner);

    let err = app
        .state
        .care_service
        .record_event(Uuid::new_v4(), event_for(child_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_child_capacity() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let request = || CreateChildRequest {
        name: "Mia".to_string(),
        birth_date: None,
    };

    app.state.care_service.create_child(user_id, request()).await.unwrap();
    app.state.care_service.create_child(user_id, request()).await.unwrap();

    let err = app
        .state
        .care_service
        .create_child(user_id, request())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::QuotaExceeded {
            resource: "children",
            limit: 2
        }
    ));

    make_pro(&app, user_id).await;
    app.state.care_service.create_child(user_id, request()).await.unwrap();
}

#[tokio::test]
async fn test_invalid_event_rejected_before_quota() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let child_id = app.care.add_child(user_id);

    let err = app
        .state
        .care_service
        .record_event(
            user_id,
            CreateCareEventRequest {
                event_type: String::new(),
                ..event_for(child_id)
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::BadRequest(_)));
    assert_eq!(app.care.count_queries(), 0);
}
