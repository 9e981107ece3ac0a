use std::time::Duration;
use tubely_api::auth::JwtValidator;
use uuid::Uuid;

use super::TEST_JWT_SECRET;

/// A caller with a valid access token.
pub struct TestUser {
    pub user_id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub fn test_user() -> TestUser {
    let user_id = Uuid::new_v4();
    let token = JwtValidator::new(TEST_JWT_SECRET)
        .issue(user_id, Duration::from_secs(3600))
        .expect("Failed to issue token");
    TestUser { user_id, token }
}

/// A token signed with a different secret.
pub fn forged_token() -> String {
    JwtValidator::new("some-other-secret-that-the-server-does-not-know")
        .issue(Uuid::new_v4(), Duration::from_secs(3600))
        .expect("Failed to issue token")
}
