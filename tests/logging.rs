//! Global subscriber installation. Kept in its own test binary so no other test
//! can install a subscriber first.

use testresult::TestResult;

use campus_cart::{
    config::{LogFormat, LoggingConfig},
    logging::init_subscriber,
};

#[test]
fn subscriber_installs_once() -> TestResult {
    let config = LoggingConfig {
        log_level: "warn".to_string(),
        log_format: LogFormat::Json,
    };

    init_subscriber(&config)?;

    assert!(init_subscriber(&config).is_err());

    Ok(())
}
