use async_trait::async_trait;
use lms_settings::adapters::SwitchSet;
use lms_settings::app::tasks::{EnrollmentSync, SAILTHRU_SWITCH_NAMESPACE};
use lms_settings::config::MarketingConfig;
use lms_settings::domain::model::{EnrollStatusChange, SailthruResponse};
use lms_settings::domain::ports::SailthruApi;
use lms_settings::{Result, SettingsError};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

const TEST_EMAIL: &str = "test@edx.org";
const LMS_ROOT: &str = "http://lms.testserver.fake";
const COURSE_ID: &str = "edX/toy/2012_Fall";
const COURSE_URL: &str = "http://lms.testserver.fake/courses/edX/toy/2012_Fall/info";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Get(String, Value),
    Post(String, Value),
    Purchase(String, Vec<Value>, Map<String, Value>),
}

/// Canned Sailthru responses; records every call.
struct MockSailthru {
    user: SailthruResponse,
    content: SailthruResponse,
    post: SailthruResponse,
    purchase: SailthruResponse,
    calls: Mutex<Vec<Call>>,
}

impl MockSailthru {
    fn new() -> Self {
        Self {
            user: SailthruResponse::ok(json!({"user": {"id": TEST_EMAIL, "fields": {"vars": 1}}})),
            content: SailthruResponse::failed(99, "no content"),
            post: SailthruResponse::ok(json!({"ok": true})),
            purchase: SailthruResponse::ok(json!({"ok": true})),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn purchases(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Purchase(..)))
            .collect()
    }
}

#[async_trait]
impl SailthruApi for MockSailthru {
    async fn api_get(&self, action: &str, data: Value) -> Result<SailthruResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Get(action.to_string(), data));
        Ok(match action {
            "user" => self.user.clone(),
            _ => self.content.clone(),
        })
    }

    async fn api_post(&self, action: &str, data: Value) -> Result<SailthruResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Post(action.to_string(), data));
        Ok(self.post.clone())
    }

    async fn purchase(
        &self,
        email: &str,
        items: Vec<Value>,
        options: Map<String, Value>,
    ) -> Result<SailthruResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Purchase(email.to_string(), items, options));
        Ok(self.purchase.clone())
    }
}

fn marketing(max_retries: u32) -> MarketingConfig {
    MarketingConfig {
        enabled: true,
        sailthru_key: "key".to_string(),
        sailthru_secret: "secret".to_string(),
        sailthru_retry_interval: 0,
        sailthru_max_retries: max_retries,
        ..MarketingConfig::default()
    }
}

#[tokio::test]
async fn test_update_course_enrollment_records_purchase() {
    let sync = EnrollmentSync::new(MockSailthru::new(), marketing(3), LMS_ROOT);

    sync.update_course_enrollment(TEST_EMAIL, COURSE_ID, "audit")
        .await
        .unwrap();

    let expected_item = json!({
        "url": COURSE_URL,
        "price": 0,
        "qty": 1,
        "id": "edX/toy/2012_Fall-audit",
        "title": "Course edX/toy/2012_Fall mode: audit"
    });
    assert_eq!(
        sync.client().purchases(),
        vec![Call::Purchase(
            TEST_EMAIL.to_string(),
            vec![expected_item],
            Map::new()
        )]
    );
}

#[tokio::test]
async fn test_enroll_template_is_sent_as_option() {
    let config = MarketingConfig {
        sailthru_enroll_template: Some("enroll_template".to_string()),
        ..marketing(3)
    };
    let sync = EnrollmentSync::new(MockSailthru::new(), config, LMS_ROOT);

    sync.update_course_enrollment(TEST_EMAIL, COURSE_ID, "audit")
        .await
        .unwrap();

    match &sync.client().purchases()[0] {
        Call::Purchase(_, _, options) => {
            assert_eq!(options.get("send_template"), Some(&json!("enroll_template")));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_enrolling_removes_course_from_unenrolled_list() {
    let mut client = MockSailthru::new();
    client.user = SailthruResponse::ok(json!({
        "vars": {"unenrolled": [COURSE_URL, "http://lms.testserver.fake/courses/other/info"]}
    }));
    let sync = EnrollmentSync::new(client, marketing(3), LMS_ROOT);

    assert!(sync.update_unenrolled_list(TEST_EMAIL, COURSE_URL, false).await);

    let posts: Vec<Call> = sync
        .client()
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Post(..)))
        .collect();
    assert_eq!(
        posts,
        vec![Call::Post(
            "user".to_string(),
            json!({
                "id": TEST_EMAIL,
                "key": "email",
                "vars": {"unenrolled": ["http://lms.testserver.fake/courses/other/info"]}
            })
        )]
    );
}

#[tokio::test]
async fn test_unenrolling_adds_course_once() {
    let mut client = MockSailthru::new();
    client.user = SailthruResponse::ok(json!({"vars": {"unenrolled": [COURSE_URL]}}));
    let sync = EnrollmentSync::new(client, marketing(3), LMS_ROOT);

    // already listed: nothing to write back
    assert!(sync.update_unenrolled_list(TEST_EMAIL, COURSE_URL, true).await);
    assert!(!sync
        .client()
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Post(..))));
}

#[tokio::test]
async fn test_unenrolling_without_vars_creates_list() {
    let mut client = MockSailthru::new();
    client.user = SailthruResponse::ok(json!({"vars": null}));
    let sync = EnrollmentSync::new(client, marketing(3), LMS_ROOT);

    assert!(sync.update_unenrolled_list(TEST_EMAIL, COURSE_URL, true).await);

    assert!(sync.client().calls().contains(&Call::Post(
        "user".to_string(),
        json!({"id": TEST_EMAIL, "key": "email", "vars": {"unenrolled": [COURSE_URL]}})
    )));
}

#[tokio::test]
async fn test_user_read_errors_classified() {
    let mut retryable = MockSailthru::new();
    retryable.user = SailthruResponse::failed(9, "internal error");
    let sync = EnrollmentSync::new(retryable, marketing(3), LMS_ROOT);
    assert!(!sync.update_unenrolled_list(TEST_EMAIL, COURSE_URL, false).await);

    let mut fatal = MockSailthru::new();
    fatal.user = SailthruResponse::failed(99, "user not found");
    let sync = EnrollmentSync::new(fatal, marketing(3), LMS_ROOT);
    assert!(sync.update_unenrolled_list(TEST_EMAIL, COURSE_URL, false).await);
}

#[tokio::test]
async fn test_rate_limited_purchase_is_retried_until_budget_runs_out() {
    let mut client = MockSailthru::new();
    client.purchase = SailthruResponse::failed(43, "Too many requests this minute");
    let sync = EnrollmentSync::new(client, marketing(2), LMS_ROOT);

    let err = sync
        .run_update_course_enrollment(TEST_EMAIL, COURSE_ID, "audit")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SettingsError::MaxRetriesExceeded { attempts: 3, .. }
    ));
    assert_eq!(sync.client().purchases().len(), 3);
}

#[tokio::test]
async fn test_non_retryable_purchase_error_is_not_retried() {
    let mut client = MockSailthru::new();
    client.purchase = SailthruResponse::failed(14, "Unknown template");
    let sync = EnrollmentSync::new(client, marketing(2), LMS_ROOT);

    sync.run_update_course_enrollment(TEST_EMAIL, COURSE_ID, "audit")
        .await
        .unwrap();

    assert_eq!(sync.client().purchases().len(), 1);
}

#[tokio::test]
async fn test_course_content_is_cached() {
    let mut client = MockSailthru::new();
    client.content = SailthruResponse::ok(json!({"title": "Toy Course", "tags": "toy"}));
    let sync = EnrollmentSync::new(client, marketing(3), LMS_ROOT);

    let first = sync.course_content(COURSE_ID, COURSE_URL).await;
    let second = sync.course_content(COURSE_ID, COURSE_URL).await;

    assert_eq!(first, json!({"title": "Toy Course", "tags": "toy"}));
    assert_eq!(first, second);
    let content_calls = sync
        .client()
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Get(action, _) if action == "content"))
        .count();
    assert_eq!(content_calls, 1);
}

#[tokio::test]
async fn test_content_errors_yield_empty_object() {
    let sync = EnrollmentSync::new(MockSailthru::new(), marketing(3), LMS_ROOT);

    assert_eq!(sync.course_content(COURSE_ID, COURSE_URL).await, json!({}));
    assert!(sync.cache().is_empty().await);
}

#[tokio::test]
async fn test_update_sailthru_depends_on_switch_and_mode() {
    let sync = Arc::new(EnrollmentSync::new(MockSailthru::new(), marketing(3), LMS_ROOT));
    let verified = EnrollStatusChange {
        email: TEST_EMAIL.to_string(),
        course_id: COURSE_ID.to_string(),
        mode: "verified".to_string(),
    };
    let audit = EnrollStatusChange {
        mode: "audit".to_string(),
        ..verified.clone()
    };

    let off = SwitchSet::new();
    assert!(sync.update_sailthru(&off, &verified).is_none());
    assert!(sync.update_sailthru(&off, &audit).is_none());

    let on = SwitchSet::from_namespace(SAILTHRU_SWITCH_NAMESPACE, ["audit_purchase_enabled"]);
    assert!(sync.update_sailthru(&on, &verified).is_none());
    assert!(sync.client().purchases().is_empty());

    let handle = sync.update_sailthru(&on, &audit).unwrap();
    handle.await.unwrap().unwrap();
    assert_eq!(sync.client().purchases().len(), 1);
}

#[tokio::test]
async fn test_update_sailthru_returns_before_retries_finish() {
    let mut client = MockSailthru::new();
    client.purchase = SailthruResponse::failed(43, "Too many requests this minute");
    let config = MarketingConfig {
        sailthru_retry_interval: 3600,
        ..marketing(3)
    };
    let sync = Arc::new(EnrollmentSync::new(client, config, LMS_ROOT));
    let on = SwitchSet::from_namespace(SAILTHRU_SWITCH_NAMESPACE, ["audit_purchase_enabled"]);
    let change = EnrollStatusChange {
        email: TEST_EMAIL.to_string(),
        course_id: COURSE_ID.to_string(),
        mode: "audit".to_string(),
    };

    let handle = sync.update_sailthru(&on, &change).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // first attempt done, now waiting out the hour-long countdown
    assert_eq!(sync.client().purchases().len(), 1);
    assert!(!handle.is_finished());

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
}
