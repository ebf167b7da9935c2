// SPDX-License-Identifier: MIT

use super::*;
use orc_core::TaskId;

#[test]
fn not_found_errors_are_non_retryable() {
    let action = ActionId::new();
    assert_eq!(ExecutorError::ActionNotFound(action).kind(), Kind::Validation);
    assert!(!ExecutorError::ActionNotFound(action).is_retryable());
}

#[test]
fn not_failed_is_non_retryable() {
    let err = ExecutorError::NotFailed(ActionId::new());
    assert_eq!(err.kind(), Kind::Validation);
}

#[test]
fn store_error_kind_is_delegated() {
    let err: ExecutorError = StoreError::StaleClaim(TaskId::new()).into();
    assert_eq!(err.kind(), Kind::Cancellation);
}
