// SPDX-License-Identifier: MIT

use super::*;
use orc_core::{Kind, TaskId};

#[test]
fn store_cycle_classifies_as_validation() {
    let err: MutationError = StoreError::Cycle(TaskId::new()).into();
    assert_eq!(err.kind(), Kind::Validation);
    assert!(!err.is_retryable());
}

#[test]
fn stale_claim_classifies_as_cancellation() {
    let err: MutationError = StoreError::StaleClaim(TaskId::new()).into();
    assert_eq!(err.kind(), Kind::Cancellation);
}
