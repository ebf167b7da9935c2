// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn transient_io_is_retryable() {
    assert!(Kind::TransientIo.is_retryable());
}

#[test]
fn permanent_io_is_not_retryable() {
    assert!(!Kind::PermanentIo.is_retryable());
}

#[test]
fn agent_internal_defers_to_its_own_tag() {
    assert!(Kind::AgentInternal { transient: true }.is_retryable());
    assert!(!Kind::AgentInternal { transient: false }.is_retryable());
}

#[test]
fn validation_cancellation_and_fatal_are_never_retried() {
    assert!(!Kind::Validation.is_retryable());
    assert!(!Kind::Cancellation.is_retryable());
    assert!(!Kind::Fatal.is_retryable());
}

struct Dummy(Kind);

impl ErrorKind for Dummy {
    fn kind(&self) -> Kind {
        self.0
    }
}

#[test]
fn error_kind_trait_default_delegates_to_kind() {
    assert!(Dummy(Kind::TransientIo).is_retryable());
    assert!(!Dummy(Kind::Fatal).is_retryable());
}
