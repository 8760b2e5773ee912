//! Model consumed by the process-execution operation.

use serde::{Deserialize, Serialize};

/// Ordered list of process steps to execute against one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessModel {
    #[serde(default)]
    pub steps: Vec<ProcessStep>,
}

/// One logical step of a process model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProcessStep {
    /// Run a process and require a zero exit value.
    #[serde(rename_all = "camelCase")]
    Run {
        executable: String,
        #[serde(default)]
        arguments: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Run a process and assert its standard output contains a value.
    #[serde(rename_all = "camelCase")]
    AssertStdoutContains {
        executable: String,
        #[serde(default)]
        arguments: Vec<String>,
        expected: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_parses_tagged_camel_case_steps() {
        let json = r#"{
            "steps": [
                {"type": "run", "executable": "systemctl", "arguments": ["restart", "app"]},
                {
                    "type": "assert-stdout-contains",
                    "executable": "systemctl",
                    "arguments": ["is-active", "app"],
                    "expected": "active",
                    "timeoutMs": 2000
                }
            ]
        }"#;

        let model: ProcessModel = serde_json::from_str(json).unwrap();

        assert_eq!(model.steps.len(), 2);
        match &model.steps[0] {
            ProcessStep::Run {
                executable,
                arguments,
                timeout_ms,
            } => {
                assert_eq!(executable, "systemctl");
                assert_eq!(arguments, &["restart".to_string(), "app".to_string()]);
                assert_eq!(*timeout_ms, None);
            }
            other => panic!("unexpected step: {:?}", other),
        }
        match &model.steps[1] {
            ProcessStep::AssertStdoutContains {
                expected,
                timeout_ms,
                ..
            } => {
                assert_eq!(expected, "active");
                assert_eq!(*timeout_ms, Some(2000));
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn empty_model_parses_to_no_steps() {
        let model: ProcessModel = serde_json::from_str("{}").unwrap();
        assert!(model.steps.is_empty());
    }

    #[test]
    fn model_serializes_back_to_tagged_form() {
        let model = ProcessModel {
            steps: vec![ProcessStep::Run {
                executable: "true".to_string(),
                arguments: Vec::new(),
                timeout_ms: None,
            }],
        };

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["steps"][0]["type"], "run");
    }
}
