//! End-to-end tests for exit codes.
//!
//! Each error kind maps to a stable exit code so scripts can branch on
//! the failure class.

mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validation_failure_exits_2() {
    let rules = RulesRepo::new().with_rule("go/testing.md", rules::GO_TESTING);
    let fixture = TestFixture::new();
    fixture.command().arg("init").assert().success();

    fixture
        .command()
        .arg("add")
        .arg("go/testing")
        .arg("--source")
        .arg(rules.url())
        .assert()
        .success();

    // Adding the same rule again is a validation failure.
    fixture
        .command()
        .arg("add")
        .arg("go/testing")
        .arg("--source")
        .arg(rules.url())
        .assert()
        .failure()
        .code(2);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_not_found_exits_3() {
    let rules = RulesRepo::new().with_rule("go/testing.md", rules::GO_TESTING);
    let fixture = TestFixture::new();
    fixture.command().arg("init").assert().success();

    fixture
        .command()
        .arg("add")
        .arg("go/absent")
        .arg("--source")
        .arg(rules.url())
        .assert()
        .failure()
        .code(3);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_unreachable_repository_exits_4() {
    let fixture = TestFixture::new();
    fixture.command().arg("init").assert().success();

    fixture
        .command()
        .arg("add")
        .arg("go/testing")
        .arg("--source")
        .arg("file:///nonexistent/rules-repo")
        .assert()
        .failure()
        .code(4);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_failure_exits_5() {
    let fixture = TestFixture::new().with_manifest("formats: [not, valid, entries]");

    fixture.command().arg("ls").assert().failure().code(5);
}
