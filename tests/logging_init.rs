//! Global subscriber installation, kept in its own test binary.

use metric_tag_select::config::{LogFormat, TagSelectConfig};
use metric_tag_select::logging::init_logging;

#[test]
fn test_init_once_then_rejects_second_install() {
    let config = TagSelectConfig {
        log_format: LogFormat::Json,
        ..TagSelectConfig::default()
    };
    assert!(init_logging(&config).is_ok());
    assert!(init_logging(&config).is_err());
}
