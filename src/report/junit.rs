use super::types::TestResults;
use crate::runner::state::{ScenarioReport, ScenarioStatus};
use crate::scenarios::Suite;
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

fn counts(scenarios: &[&ScenarioReport]) -> (usize, usize, u64) {
    let failures = scenarios
        .iter()
        .filter(|s| matches!(s.status, ScenarioStatus::Failed { .. }))
        .count();
    let skipped = scenarios
        .iter()
        .filter(|s| matches!(s.status, ScenarioStatus::Skipped { .. }))
        .count();
    let duration = scenarios.iter().map(|s| s.duration_ms.unwrap_or(0)).sum();
    (failures, skipped, duration)
}

/// Generate JUnit XML report string from TestResults
///
/// One `testsuite` per scenario suite (ui, api), one `testcase` per scenario.
pub fn generate_junit_xml(results: &TestResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let all: Vec<&ScenarioReport> = results.scenarios.iter().collect();
    let (failures, skipped, duration) = counts(&all);

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "flowcheck-run"));
    suites_start.push_attribute(("tests", all.len().to_string().as_str()));
    suites_start.push_attribute(("failures", failures.to_string().as_str()));
    suites_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suites_start.push_attribute(("time", seconds(duration).as_str()));
    writer.write_event(Event::Start(suites_start))?;

    for suite in [Suite::Ui, Suite::Api] {
        let members: Vec<&ScenarioReport> = all
            .iter()
            .copied()
            .filter(|s| s.suite == suite)
            .collect();
        if members.is_empty() {
            continue;
        }
        let (failures, skipped, duration) = counts(&members);

        let mut suite_start = BytesStart::new("testsuite");
        suite_start.push_attribute(("name", suite.as_str()));
        suite_start.push_attribute(("tests", members.len().to_string().as_str()));
        suite_start.push_attribute(("failures", failures.to_string().as_str()));
        suite_start.push_attribute(("skipped", skipped.to_string().as_str()));
        suite_start.push_attribute(("id", results.session_id.as_str()));
        suite_start.push_attribute(("time", seconds(duration).as_str()));
        suite_start.push_attribute(("timestamp", results.generated_at.as_str()));
        writer.write_event(Event::Start(suite_start))?;

        for scenario in members {
            write_test_case(&mut writer, scenario)?;
        }

        writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    scenario: &ScenarioReport,
) -> Result<()> {
    let classname = format!("flowcheck.{}", scenario.suite.as_str());
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", scenario.id.as_str()));
    case_start.push_attribute(("classname", classname.as_str()));
    case_start.push_attribute(("time", seconds(scenario.duration_ms.unwrap_or(0)).as_str()));
    writer.write_event(Event::Start(case_start))?;

    match &scenario.status {
        ScenarioStatus::Failed { error, kind } => {
            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", error.as_str()));
            fail_start.push_attribute(("type", kind.as_str()));
            writer.write_event(Event::Start(fail_start))?;

            let mut body = error.clone();
            if let Some(stage) = &scenario.last_stage {
                body.push_str(&format!("\nlast stage reached: {}", stage));
            }
            if let Some(path) = &scenario.screenshot_path {
                body.push_str(&format!("\nscreenshot: {}", path));
            }
            writer.write_event(Event::Text(BytesText::new(&body)))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
        ScenarioStatus::Skipped { reason } => {
            let mut skip = BytesStart::new("skipped");
            skip.push_attribute(("message", reason.as_str()));
            writer.write_event(Event::Empty(skip))?;
        }
        _ => {}
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write report to file
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::RunSummary;

    fn scenario(id: &str, suite: Suite, status: ScenarioStatus, ms: u64) -> ScenarioReport {
        ScenarioReport {
            id: id.to_string(),
            suite,
            description: String::new(),
            status,
            duration_ms: Some(ms),
            last_stage: None,
            screenshot_path: None,
        }
    }

    #[test]
    fn test_generate_junit_xml() {
        let results = TestResults {
            session_id: "test-session".to_string(),
            scenarios: vec![
                scenario("form-upload", Suite::Ui, ScenarioStatus::Passed, 1500),
                ScenarioReport {
                    last_stage: Some("element 1 configured".into()),
                    ..scenario(
                        "message-box-task",
                        Suite::Ui,
                        ScenarioStatus::Failed {
                            error: "Element 'Save button' not visible after 7000ms".into(),
                            kind: "VisibilityTimeout".into(),
                        },
                        2000,
                    )
                },
                scenario(
                    "learning-instance-schema",
                    Suite::Api,
                    ScenarioStatus::Skipped {
                        reason: "stopped after first failure".into(),
                    },
                    0,
                ),
            ],
            summary: RunSummary {
                session_id: "test-session".to_string(),
                total: 3,
                passed: 1,
                failed: 1,
                skipped: 1,
                total_duration_ms: Some(3500),
            },
            generated_at: "2024-01-01T12:00:00+00:00".to_string(),
        };

        let xml = generate_junit_xml(&results).expect("Failed to generate XML");

        assert!(xml.contains(r#"<testsuites name="flowcheck-run""#));
        assert!(xml.contains(r#"tests="3""#));
        assert!(xml.contains(r#"failures="1""#));
        assert!(xml.contains(r#"<testsuite name="ui""#));
        assert!(xml.contains(r#"<testsuite name="api""#));
        assert!(xml.contains(r#"<testcase name="form-upload""#));
        assert!(xml.contains(r#"type="VisibilityTimeout""#));
        assert!(xml.contains("last stage reached: element 1 configured"));
        assert!(xml.contains(r#"<skipped message="stopped after first failure"/>"#));
    }
}
