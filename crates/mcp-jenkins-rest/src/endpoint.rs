//! REST endpoint templates
//!
//! Every path the client requests is built from one of the templates below.
//! A template records its `{placeholder}` names when it is created and
//! refuses to render until all of them are supplied.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{
    JenkinsError,
    JenkinsResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A path pattern with named `{field}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestEndpoint {
    template: String,
    segments: Vec<Segment>,
    fields: BTreeSet<String>,
}

impl RestEndpoint {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = parse_segments(&template);
        let fields = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect();

        Self {
            template,
            segments,
            fields,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names that must be supplied to [`RestEndpoint::call`]
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Renders the template. Extra parameters are ignored; every missing
    /// placeholder is reported in a single [`JenkinsError::MissingParameters`].
    pub fn call(&self, params: &[(&str, &dyn fmt::Display)]) -> JenkinsResult<String> {
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|field| !params.iter().any(|(key, _)| key == field))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(JenkinsError::MissingParameters(missing));
        }

        let mut rendered = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Field(name) => {
                    if let Some((_, value)) = params.iter().find(|(key, _)| key == name) {
                        rendered.push_str(&value.to_string());
                    }
                }
            }
        }

        Ok(rendered)
    }
}

impl fmt::Display for RestEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn parse_segments(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }

                if closed && !name.is_empty() {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name));
                } else {
                    // unterminated or empty braces stay literal text
                    literal.push('{');
                    literal.push_str(&name);
                    if closed {
                        literal.push('}');
                    }
                }
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

macro_rules! endpoint {
    ($name:ident, $template:literal) => {
        pub static $name: LazyLock<RestEndpoint> = LazyLock::new(|| RestEndpoint::new($template));
    };
}

endpoint!(CRUMB, "crumbIssuer/api/json");

endpoint!(ITEM, "{folder}job/{name}/api/json?depth={depth}");
endpoint!(ITEMS, "{folder}/api/json?tree={query}");
endpoint!(ITEM_CONFIG, "{folder}job/{name}/config.xml");
endpoint!(ITEM_BUILD, "{folder}job/{name}/{build_type}");

endpoint!(QUEUE, "queue/api/json?depth={depth}");
endpoint!(QUEUE_ITEM, "queue/item/{id}/api/json?depth={depth}");
endpoint!(QUEUE_CANCEL_ITEM, "queue/cancelItem?id={id}");

endpoint!(NODE, "computer/{name}/api/json?depth={depth}");
endpoint!(NODES, "computer/api/json?depth={depth}");
endpoint!(NODE_CONFIG, "computer/{name}/config.xml");

endpoint!(BUILD, "{folder}job/{name}/{number}/api/json?depth={depth}");
endpoint!(LAST_BUILD, "{folder}job/{name}/lastBuild/api/json?depth={depth}");
endpoint!(BUILD_CONSOLE, "{folder}job/{name}/{number}/consoleText");
endpoint!(BUILD_STOP, "{folder}job/{name}/{number}/stop");
endpoint!(BUILD_REPLAY, "{folder}job/{name}/{number}/replay");
endpoint!(
    BUILD_TEST_REPORT,
    "{folder}job/{name}/{number}/testReport/api/json?depth={depth}"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_recorded_at_construction() {
        let endpoint = RestEndpoint::new("api/json?depth={depth}");
        assert_eq!(
            endpoint.fields(),
            &BTreeSet::from(["depth".to_string()])
        );
        assert!(RestEndpoint::new("api/json").fields().is_empty());
    }

    #[test]
    fn test_call_substitutes_values() {
        let endpoint = RestEndpoint::new("api/json?depth={depth}");
        assert_eq!(endpoint.call(&[("depth", &0)]).unwrap(), "api/json?depth=0");
    }

    #[test]
    fn test_call_missing_names_every_absent_key() {
        let err = BUILD.call(&[("name", &"job")]).unwrap_err();
        match err {
            JenkinsError::MissingParameters(missing) => {
                assert_eq!(missing, vec!["depth", "folder", "number"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_call_accepts_extra_parameters() {
        let path = QUEUE_CANCEL_ITEM
            .call(&[("id", &42), ("depth", &1), ("unused", &"x")])
            .unwrap();
        assert_eq!(path, "queue/cancelItem?id=42");
    }

    #[test]
    fn test_every_registered_template_rejects_empty_call() {
        for endpoint in [
            &*ITEM,
            &*ITEMS,
            &*ITEM_CONFIG,
            &*ITEM_BUILD,
            &*QUEUE,
            &*QUEUE_ITEM,
            &*QUEUE_CANCEL_ITEM,
            &*NODE,
            &*NODES,
            &*NODE_CONFIG,
            &*BUILD,
            &*LAST_BUILD,
            &*BUILD_CONSOLE,
            &*BUILD_STOP,
            &*BUILD_REPLAY,
            &*BUILD_TEST_REPORT,
        ] {
            assert!(
                matches!(endpoint.call(&[]), Err(JenkinsError::MissingParameters(_))),
                "{endpoint} accepted an empty call"
            );
        }
        assert_eq!(CRUMB.call(&[]).unwrap(), "crumbIssuer/api/json");
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let endpoint = RestEndpoint::new("api/json?tree=builds[number]{{0,{limit}}}");
        assert_eq!(
            endpoint.fields(),
            &BTreeSet::from(["limit".to_string()])
        );
        assert_eq!(
            endpoint.call(&[("limit", &5)]).unwrap(),
            "api/json?tree=builds[number]{0,5}"
        );
    }

    #[test]
    fn test_build_path_with_folder() {
        let path = BUILD
            .call(&[
                ("folder", &"job/a/job/b/"),
                ("name", &"c"),
                ("number", &7),
                ("depth", &0),
            ])
            .unwrap();
        assert_eq!(path, "job/a/job/b/job/c/7/api/json?depth=0");
    }
}
