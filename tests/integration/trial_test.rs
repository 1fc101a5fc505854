use carenest::{
    models::{admin::SetPlanRequest, subscription::Subscription},
    services::Notification,
    ApiError,
};
use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use futures::future::join_all;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::common::TestApp;

#[tokio::test]
async fn test_start_trial_grants_overlay() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let before = OffsetDateTime::now_utc();

    let info = app.state.trial_service.start_trial(user_id).await.unwrap();

    assert_eq!(info.plan, PlanTier::Free);
    assert!(info.trial.active);
    assert!(info.trial.used);
    assert!(info.limits.ai_enabled);
    assert!(info.limits.voice_enabled);
    assert!(!info.limits.avatars_enabled);
    assert_eq!(info.limits.max_events_per_month, Some(500));

    let record = app.subscriptions.get(user_id).unwrap();
    assert!(record.trial_used);
    assert_eq!(record.plan, PlanTier::Free);
    assert_eq!(record.status, SubscriptionStatus::None);
    let started = record.trial_started_at.unwrap();
    assert!(started >= before);
    assert_eq!(record.trial_ends_at, Some(started + Duration::days(14)));
}

#[tokio::test]
async fn test_start_trial_notifies() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();

    let info = app.state.trial_service.start_trial(user_id).await.unwrap();

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, user_id);
    assert_eq!(
        sent[0].1,
        Notification::TrialStarted {
            ends_at: info.trial.ends_at.unwrap()
        }
    );
}

#[tokio::test]
async fn test_second_trial_rejected() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();

    app.state.trial_service.start_trial(user_id).await.unwrap();
    let first = app.subscriptions.get(user_id).unwrap();

    let err = app.state.trial_service.start_trial(user_id).await.unwrap_err();
    assert!(matches!(err, ApiError::TrialAlreadyUsed));

    // The original window is untouched
    let after = app.subscriptions.get(user_id).unwrap();
    assert_eq!(after.trial_ends_at, first.trial_ends_at);
    assert_eq!(app.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_trial_not_available_for_paid_statuses() {
    let app = TestApp::new();

    for status in [
        SubscriptionStatus::Active,
        SubscriptionStatus::Trialing,
        SubscriptionStatus::PastDue,
    ] {
        let user_id = Uuid::new_v4();
        app.state
            .admin_service
            .set_plan(
                Uuid::new_v4(),
                user_id,
                SetPlanRequest {
                    plan: PlanTier::Pro,
                    status,
                },
            )
            .await
            .unwrap();

        let err = app.state.trial_service.start_trial(user_id).await.unwrap_err();
        assert!(matches!(err, ApiError::TrialNotAvailable), "{:?}", status);
        assert!(!app.subscriptions.get(user_id).unwrap().trial_used);
    }
}

#[tokio::test]
async fn test_trial_used_wins_over_paid_status() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    app.state.trial_service.start_trial(user_id).await.unwrap();
    app.subscriptions
        .edit(user_id, |sub| sub.status = SubscriptionStatus::Active);

    let err = app.state.trial_service.start_trial(user_id).await.unwrap_err();
    assert!(matches!(err, ApiError::TrialAlreadyUsed));
}

#[tokio::test]
async fn test_trial_preserves_existing_record() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let mut existing = Subscription::new_default(user_id, OffsetDateTime::now_utc());
    existing.plan = PlanTier::Pro;
    existing.status = SubscriptionStatus::Canceled;
    existing.current_period_end = Some(OffsetDateTime::now_utc() - Duration::days(1));
    existing.provider_customer_id = Some("cus_42".to_string());
    app.subscriptions.put(existing);

    app.state.trial_service.start_trial(user_id).await.unwrap();

    let record = app.subscriptions.get(user_id).unwrap();
    assert_eq!(record.plan, PlanTier::Pro);
    assert_eq!(record.status, SubscriptionStatus::Canceled);
    assert_eq!(record.provider_customer_id.as_deref(), Some("cus_42"));
    assert!(record.trial_used);
}

#[tokio::test]
async fn test_concurrent_start_trial_single_winner() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();

    let attempts = (0..8).map(|_| {
        let service = app.state.trial_service.clone();
        tokio::spawn(async move { service.start_trial(user_id).await })
    });
    let results = join_all(attempts).await;

    let mut won = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => won += 1,
            Err(ApiError::TrialAlreadyUsed) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(app.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_trial_lifecycle_end_to_end() {
    let app = TestApp::new();
    let user_id = Uuid::new_v4();
    let plans = &app.state.plan_service;

    let info = plans.get_user_plan(user_id).await.unwrap();
    assert_eq!(info.plan, PlanTier::Free);
    assert!(!info.trial.used);

    app.state.trial_service.start_trial(user_id).await.unwrap();

    // Served from the entry the trial wrote through
    let info = plans.get_user_plan(user_id).await.unwrap();
    assert!(info.limits.ai_enabled);
    assert!(info.trial.active);

    // Move the window into the past; direct edits bypass the writers' invalidation
    app.subscriptions.edit(user_id, |sub| {
        sub.trial_ends_at = Some(OffsetDateTime::now_utc() - Duration::hours(1));
    });
    plans.invalidate(user_id).await;

    let info = plans.get_user_plan(user_id).await.unwrap();
    assert_eq!(info.plan, PlanTier::Free);
    assert!(!info.limits.ai_enabled);
    assert!(!info.trial.active);
    assert!(info.trial.used);
}
