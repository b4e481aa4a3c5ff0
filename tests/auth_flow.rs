//! End-to-end exercises of the authentication core: the full account
//! lifecycle, brute force escalation, and abuse-control interplay across
//! components wired the way a deployment would wire them.

use std::sync::Arc;

use chrono::Duration;

use auth_core::{
    AccountStore, AuthError, AuthService, Clock, CodeConfig, CodeService, CoreError,
    InMemoryCodeStore,
    LockoutConfig, LockoutEngine, ManualClock, MockAccountStore, RateLimitConfig, RateLimiter,
    RecordingMailer, SessionTokenConfig, SessionTokenIssuer, Sha256PasswordHasher,
};

const LOCAL: &str = "127.0.0.1";

struct Harness {
    clock: Arc<ManualClock>,
    mailer: Arc<RecordingMailer>,
    accounts: Arc<MockAccountStore>,
    service:
        AuthService<MockAccountStore, InMemoryCodeStore, RecordingMailer, Sha256PasswordHasher>,
}

fn harness() -> Harness {
    let clock: Arc<ManualClock> = Arc::new(ManualClock::start_now());
    let as_clock: Arc<dyn Clock> = clock.clone();
    let mailer = Arc::new(RecordingMailer::new());
    let accounts = Arc::new(MockAccountStore::new());

    let codes = CodeService::new(
        Arc::new(InMemoryCodeStore::new()),
        mailer.clone(),
        CodeConfig::default(),
        as_clock.clone(),
    );
    let service = AuthService::new(
        accounts.clone(),
        codes,
        RateLimiter::new(RateLimitConfig::default(), as_clock.clone()),
        LockoutEngine::new(LockoutConfig::default(), as_clock.clone()),
        SessionTokenIssuer::new(
            SessionTokenConfig::with_secret("integration-secret-32-bytes-long!"),
            as_clock,
        ),
        Sha256PasswordHasher,
    );

    Harness {
        clock,
        mailer,
        accounts,
        service,
    }
}

/// Pulls the value after the "...: " marker out of the latest mail to `to`.
async fn mailed_value(h: &Harness, to: &str) -> String {
    let mail = h.mailer.last_to(to).await.expect("no mail delivered");
    mail.body
        .split(": ")
        .nth(1)
        .expect("unexpected mail body shape")
        .split_whitespace()
        .next()
        .expect("empty value in mail body")
        .to_string()
}

#[tokio::test]
async fn full_account_lifecycle() {
    let h = harness();

    // Register; a verification code goes out by mail
    let account = h
        .service
        .register(LOCAL, "dana@example.com", "correct horse")
        .await
        .unwrap();
    assert!(!account.email_verified);

    // Login before verification is refused
    match h.service.login(LOCAL, "dana@example.com", "correct horse").await {
        Err(CoreError::Auth(AuthError::EmailNotVerified)) => {}
        other => panic!("expected EmailNotVerified, got {:?}", other.err()),
    }

    // Verify with the mailed code, then log in
    let code = mailed_value(&h, "dana@example.com").await;
    h.service.verify_email("dana@example.com", &code).await.unwrap();

    let tokens = h
        .service
        .login(LOCAL, "dana@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(
        h.service.authenticate(&tokens.access_token).unwrap(),
        "dana@example.com"
    );

    let stored = h
        .accounts
        .find_by_email("dana@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.email_verified);

    // Access token expires; the refresh token still mints a new pair
    h.clock.advance(Duration::minutes(20));
    assert!(h.service.authenticate(&tokens.access_token).is_err());

    let refreshed = h
        .service
        .refresh(tokens.refresh_token.as_deref().unwrap())
        .await
        .unwrap();
    let subject = h.service.authenticate(&refreshed.access_token).unwrap();
    assert_eq!(subject, "dana@example.com");
}

#[tokio::test]
async fn brute_force_escalation_and_recovery() {
    let h = harness();

    h.service
        .register(LOCAL, "mark@example.com", "first password")
        .await
        .unwrap();
    let code = mailed_value(&h, "mark@example.com").await;
    h.service.verify_email("mark@example.com", &code).await.unwrap();

    // Five wrong guesses lock the account for 30 minutes
    for _ in 0..5 {
        let _ = h.service.login(LOCAL, "mark@example.com", "guess").await;
    }
    match h.service.login(LOCAL, "mark@example.com", "first password").await {
        Err(CoreError::Auth(AuthError::AccountLocked {
            retry_after_seconds,
        })) => assert_eq!(retry_after_seconds, 1800),
        other => panic!("expected AccountLocked, got {:?}", other.err()),
    }

    // After the lockout lapses, a sixth failure relocks for twice as long
    h.clock.advance(Duration::minutes(30));
    let _ = h.service.login(LOCAL, "mark@example.com", "guess").await;
    match h.service.login(LOCAL, "mark@example.com", "first password").await {
        Err(CoreError::Auth(AuthError::AccountLocked {
            retry_after_seconds,
        })) => assert_eq!(retry_after_seconds, 3600),
        other => panic!("expected AccountLocked, got {:?}", other.err()),
    }

    // The legitimate owner escapes through the reset flow, which also
    // clears the lockout
    h.service
        .request_password_reset(LOCAL, "mark@example.com")
        .await
        .unwrap();
    let token = mailed_value(&h, "mark@example.com").await;
    h.service.reset_password(&token, "second password").await.unwrap();

    let tokens = h
        .service
        .login(LOCAL, "mark@example.com", "second password")
        .await
        .unwrap();
    assert!(tokens.refresh_token.is_some());

    // The old password is dead
    match h.service.login(LOCAL, "mark@example.com", "first password").await {
        Err(CoreError::Auth(AuthError::InvalidCredentials)) => {}
        other => panic!("expected InvalidCredentials, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn rate_limits_gate_before_everything_else() {
    let h = harness();

    h.service
        .register("203.0.113.9", "eve@example.com", "pw")
        .await
        .unwrap();

    // Exhaust the login budget with attempts that never touch lockout state
    for _ in 0..5 {
        let _ = h.service.login("203.0.113.9", "nobody@example.com", "pw").await;
    }
    match h.service.login("203.0.113.9", "nobody@example.com", "pw").await {
        Err(CoreError::Auth(AuthError::RateLimited {
            retry_after_seconds,
        })) => {
            assert!(retry_after_seconds > 0 && retry_after_seconds <= 900);
        }
        other => panic!("expected RateLimited, got {:?}", other.err()),
    }

    // A different source address still gets through to credential checks
    match h.service.login("198.51.100.7", "nobody@example.com", "pw").await {
        Err(CoreError::Auth(AuthError::InvalidCredentials)) => {}
        other => panic!("expected InvalidCredentials, got {:?}", other.err()),
    }

    // Once the window lapses the original address is readmitted
    h.clock.advance(Duration::minutes(15));
    match h.service.login("203.0.113.9", "nobody@example.com", "pw").await {
        Err(CoreError::Auth(AuthError::InvalidCredentials)) => {}
        other => panic!("expected InvalidCredentials, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn otp_budget_covers_registration_and_resends() {
    let h = harness();

    // Registration itself consumes one unit of the OTP budget
    h.service
        .register("203.0.113.5", "amy@example.com", "pw")
        .await
        .unwrap();
    h.service
        .resend_verification("203.0.113.5", "amy@example.com")
        .await
        .unwrap();
    h.service
        .resend_verification("203.0.113.5", "amy@example.com")
        .await
        .unwrap();

    match h
        .service
        .resend_verification("203.0.113.5", "amy@example.com")
        .await
    {
        Err(CoreError::Auth(AuthError::RateLimited { .. })) => {}
        other => panic!("expected RateLimited, got {:?}", other.err()),
    }

    // Every delivery so far carried the same still-valid code
    let sent = h.mailer.sent().await;
    assert_eq!(sent.len(), 3);
    let code = mailed_value(&h, "amy@example.com").await;
    assert!(sent.iter().all(|m| m.body.contains(&code)));
}

#[tokio::test]
async fn sessions_survive_component_state_resets() {
    let h = harness();

    h.service
        .register(LOCAL, "ben@example.com", "pw123456")
        .await
        .unwrap();
    let code = mailed_value(&h, "ben@example.com").await;
    h.service.verify_email("ben@example.com", &code).await.unwrap();

    let tokens = h.service.login(LOCAL, "ben@example.com", "pw123456").await.unwrap();

    // Lockout and rate-limit resets have no bearing on issued tokens
    h.service.unlock_account("ben@example.com");
    h.service.clear_rate_limit(LOCAL);
    assert_eq!(
        h.service.authenticate(&tokens.access_token).unwrap(),
        "ben@example.com"
    );

    // A disabled account keeps its live access token (stateless by design)
    // but can no longer refresh
    let mut account = h
        .accounts
        .find_by_email("ben@example.com")
        .await
        .unwrap()
        .unwrap();
    account.disable();
    h.accounts.save(account).await.unwrap();

    assert!(h.service.authenticate(&tokens.access_token).is_ok());
    match h.service.refresh(tokens.refresh_token.as_deref().unwrap()).await {
        Err(CoreError::Auth(AuthError::AccountDisabled)) => {}
        other => panic!("expected AccountDisabled, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn expired_codes_are_swept_but_consume_already_rejects_them() {
    let h = harness();

    h.service
        .register(LOCAL, "joy@example.com", "pw")
        .await
        .unwrap();
    let code = mailed_value(&h, "joy@example.com").await;

    // Past the 10-minute OTP lifetime, before any sweep runs
    h.clock.advance(Duration::minutes(10));
    match h.service.verify_email("joy@example.com", &code).await {
        Err(CoreError::Auth(AuthError::InvalidOrExpiredCode)) => {}
        other => panic!("expected InvalidOrExpiredCode, got {:?}", other.err()),
    }

    assert_eq!(h.service.sweep_expired_codes().await.unwrap(), 1);
    assert_eq!(h.service.sweep_expired_codes().await.unwrap(), 0);
}

#[tokio::test]
async fn refresh_token_type_is_enforced_across_the_seam() {
    let h = harness();

    h.service
        .register(LOCAL, "kim@example.com", "pw123456")
        .await
        .unwrap();
    let code = mailed_value(&h, "kim@example.com").await;
    h.service.verify_email("kim@example.com", &code).await.unwrap();

    let tokens = h.service.login(LOCAL, "kim@example.com", "pw123456").await.unwrap();

    // An access token presented at the refresh seam is refused even though
    // its signature and expiry are fine
    match h.service.refresh(&tokens.access_token).await {
        Err(CoreError::Token(auth_core::TokenError::WrongTokenType)) => {}
        other => panic!("expected WrongTokenType, got {:?}", other.err()),
    }
}
