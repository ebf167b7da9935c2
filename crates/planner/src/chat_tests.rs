// SPDX-License-Identifier: MIT

use super::*;
use orc_core::ErrorKind;

#[test]
fn transient_provider_error_is_retryable() {
    assert!(ChatError::Transient("503".into()).is_retryable());
}

#[test]
fn permanent_provider_error_is_not_retryable() {
    assert!(!ChatError::Permanent("401".into()).is_retryable());
}

#[test]
fn turn_constructors_set_the_right_role() {
    let t = ChatTurn::user("hi");
    assert_eq!(t.role, ChatRole::User);
    let t = ChatTurn::assistant("hello");
    assert_eq!(t.role, ChatRole::Assistant);
}
