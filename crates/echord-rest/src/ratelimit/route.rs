//! Endpoint identity used to pick a bucket before the server names one.

use reqwest::Method;
use std::fmt;

/// Resources whose ID is a major parameter: same template, different ID,
/// different bucket
const MAJOR_RESOURCES: [&str; 3] = ["channels", "guilds", "webhooks"];

/// An HTTP method plus a concrete path, split into template and major parameter
///
/// `GET /channels/123/messages/456` has template `/channels/:id/messages/:id`
/// and major parameter `123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    method: Method,
    path: String,
    template: String,
    major: String,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let (template, major) = split_path(&path);

        Self {
            method,
            path,
            template,
            major,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Concrete path, including any query string
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn major(&self) -> &str {
        &self.major
    }

    /// `"{METHOD} {template}"`, shared by every call to the same endpoint
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.template)
    }

    /// Bucket key used until the server reports a bucket hash
    pub fn provisional_key(&self) -> String {
        format!("{}:{}", self.endpoint(), self.major)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

fn split_path(path: &str) -> (String, String) {
    let path = path.split('?').next().unwrap_or_default();
    let mut major = String::new();
    let mut template = Vec::new();
    let mut previous = "";
    let mut after_webhook_id = false;

    for segment in path.split('/') {
        let is_id = !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());

        if is_id {
            if major.is_empty() && MAJOR_RESOURCES.contains(&previous) {
                major = segment.to_string();
            }
            after_webhook_id = previous == "webhooks";
            template.push(":id");
        } else if after_webhook_id && !segment.is_empty() {
            // webhook token
            after_webhook_id = false;
            template.push(":token");
        } else {
            after_webhook_id = false;
            template.push(segment);
        }
        previous = segment;
    }

    (template.join("/"), major)
}
