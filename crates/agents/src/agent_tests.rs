// SPDX-License-Identifier: MIT

use super::*;
use crate::test_support::RecordingLogSink;
use orc_core::LogLevel;

#[test]
fn log_sink_default_methods_tag_the_right_level() {
    let sink = RecordingLogSink::new();
    sink.info("hello".to_string());
    sink.warn("careful".to_string());
    sink.error("boom".to_string());
    let lines = sink.lines();
    assert_eq!(lines[0].0, LogLevel::Info);
    assert_eq!(lines[1].0, LogLevel::Warn);
    assert_eq!(lines[2].0, LogLevel::Error);
    assert_eq!(lines[0].1, "hello");
}
