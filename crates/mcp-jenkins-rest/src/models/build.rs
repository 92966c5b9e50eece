use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// A single run of a job.
///
/// `next_build` and `previous_build` are only as deep as the `depth` the
/// build was requested with; Jenkins stops expanding them after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub number: u64,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_build: Option<Box<Build>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_build: Option<Box<Build>>,
}

impl Build {
    /// A build known only by its number and URL
    pub fn new(number: u64, url: impl Into<String>) -> Self {
        Self {
            number,
            url: url.into(),
            timestamp: None,
            duration: None,
            estimated_duration: None,
            building: None,
            result: None,
            next_build: None,
            previous_build: None,
        }
    }
}

/// Pipeline scripts shown on a build's replay page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReplay {
    pub scripts: Vec<String>,
}

/// Which trigger endpoint `build_item` posts to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildType {
    #[default]
    #[serde(rename = "build")]
    Build,
    #[serde(rename = "buildWithParameters")]
    BuildWithParameters,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Build => "build",
            BuildType::BuildWithParameters => "buildWithParameters",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_build_with_previous_build_chain() {
        let build: Build = serde_json::from_value(json!({
            "_class": "org.jenkinsci.plugins.workflow.job.WorkflowRun",
            "number": 2,
            "url": "https://example.com/job/example-job/2/",
            "timestamp": 1767975558000_i64,
            "duration": 120000,
            "estimatedDuration": 130000,
            "building": false,
            "result": "SUCCESS",
            "nextBuild": null,
            "previousBuild": {
                "number": 1,
                "url": "https://example.com/job/example-job/1/"
            }
        }))
        .unwrap();

        assert_eq!(build.number, 2);
        assert_eq!(build.estimated_duration, Some(130000));
        assert_eq!(build.result.as_deref(), Some("SUCCESS"));
        assert_eq!(build.next_build, None);
        assert_eq!(
            build.previous_build.as_deref(),
            Some(&Build::new(1, "https://example.com/job/example-job/1/"))
        );
    }

    #[test]
    fn test_running_build_has_no_result() {
        let build: Build = serde_json::from_value(json!({
            "number": 5,
            "url": "https://example.com/job/a/5/",
            "building": true,
            "result": null
        }))
        .unwrap();

        assert_eq!(build.building, Some(true));
        assert_eq!(build.result, None);
    }

    #[test]
    fn test_build_requires_number_and_url() {
        assert!(serde_json::from_value::<Build>(json!({ "url": "u" })).is_err());
        assert!(serde_json::from_value::<Build>(json!({ "number": 1 })).is_err());
    }

    #[test]
    fn test_serialized_build_omits_absent_fields() {
        let mut build = Build::new(3, "https://example.com/job/a/3/");
        build.timestamp = Some(1767975558000);

        assert_eq!(
            serde_json::to_value(&build).unwrap(),
            json!({
                "number": 3,
                "url": "https://example.com/job/a/3/",
                "timestamp": 1767975558000_i64
            })
        );
    }

    #[test]
    fn test_build_type_wire_names() {
        assert_eq!(
            serde_json::from_value::<BuildType>(json!("buildWithParameters")).unwrap(),
            BuildType::BuildWithParameters
        );
        assert_eq!(BuildType::Build.to_string(), "build");
    }
}
