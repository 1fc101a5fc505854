// Integration tests

mod quota_test;
mod router_test;
mod trial_test;

// Test setup helpers
pub async fn setup_test_environment() {
    // Load test environment variables
    dotenvy::from_filename(".env.test").ok();
}
