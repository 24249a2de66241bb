pub mod activation;
pub mod enrollment;
pub mod retry;

pub use activation::{send_activation_email, ActivationOutcome};
pub use enrollment::{
    build_course_url, build_purchase_item, can_retry_sailthru_request, EnrollmentSync,
    SAILTHRU_AUDIT_PURCHASE_ENABLED, SAILTHRU_SWITCH_NAMESPACE,
};
pub use retry::{run_with_retry, RetryPolicy};
