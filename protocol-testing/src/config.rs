use colored::Colorize;
use ethereum_tokenstream_party::{
    identity::to_key,
    query::OrganizationView,
    schema::{Stream, StreamActivity},
};
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// Expected state of one organization after all blocks of a test are indexed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganizationExpectation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub stream_count: usize,
    /// Stream names or keys, oldest first.
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default)]
    pub total_deposited: Option<String>,
    #[serde(default)]
    pub total_withdrawn: Option<String>,
}

impl OrganizationExpectation {
    pub fn compare(
        &self,
        other: &OrganizationView,
        streams: &[Stream],
        colorize_output: bool,
    ) -> Option<String> {
        let mut diffs = Vec::new();
        let mut check = |field: &str, expected: &str, actual: &str| {
            if expected != actual {
                let diff = format_diff(expected, actual, colorize_output);
                diffs.push(format!("Field '{}' mismatch for {}:\n{}", field, self.id, diff));
            }
        };

        check("name", &self.name, &other.organization.name);
        if let Some(owner) = &self.owner {
            check("owner", &owner.to_lowercase(), &to_key(&other.organization.owner));
        }
        check("stream_count", &self.stream_count.to_string(), &other.stream_count.to_string());
        if let Some(total) = &self.total_deposited {
            check("total_deposited", total, &other.total_deposited.to_string());
        }
        if let Some(total) = &self.total_withdrawn {
            check("total_withdrawn", total, &other.total_withdrawn.to_string());
        }
        if !self.streams.is_empty() {
            let actual = streams
                .iter()
                .map(|stream| {
                    stream
                        .name
                        .clone()
                        .unwrap_or_else(|| stream.id.clone())
                })
                .collect::<Vec<_>>()
                .join("\n");
            check("streams", &self.streams.join("\n"), &actual);
        }

        if diffs.is_empty() {
            None
        } else {
            Some(diffs.join("\n"))
        }
    }
}

/// Expected activity in an organization's feed, newest first.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivityExpectation {
    pub event_type: String,
    pub amount: String,
    pub actor: String,
    #[serde(default)]
    pub info: String,
}

impl ActivityExpectation {
    fn render(&self) -> String {
        format!("{} {} {} {:?}", self.event_type, self.amount, self.actor.to_lowercase(), self.info)
    }
}

pub fn render_activity(activity: &StreamActivity) -> String {
    format!(
        "{} {} {} {:?}",
        activity.kind.event_type(),
        activity.amount,
        to_key(&activity.actor),
        activity.info
    )
}

/// Compares an expected feed with the indexed one, line per activity.
pub fn compare_feed(
    organization: &str,
    expected: &[ActivityExpectation],
    actual: &[StreamActivity],
    colorize_output: bool,
) -> Option<String> {
    let expected = expected
        .iter()
        .map(ActivityExpectation::render)
        .collect::<Vec<_>>()
        .join("\n");
    let actual = actual
        .iter()
        .map(render_activity)
        .collect::<Vec<_>>()
        .join("\n");

    if expected == actual {
        None
    } else {
        Some(format!(
            "Activity feed mismatch for {}:\n{}",
            organization,
            format_diff(&expected, &actual, colorize_output)
        ))
    }
}

fn format_diff(left: &str, right: &str, colorize: bool) -> String {
    let diff = TextDiff::from_lines(left, right);

    let mut result = String::new();
    for change in diff.iter_all_changes() {
        let formatted = match change.tag() {
            ChangeTag::Delete => {
                let line = format!("-{}", change.value().trim_end());
                if colorize {
                    line.red().to_string()
                } else {
                    line
                }
            }
            ChangeTag::Insert => {
                let line = format!("+{}", change.value().trim_end());
                if colorize {
                    line.green().to_string()
                } else {
                    line
                }
            }
            ChangeTag::Equal => format!(" {}", change.value().trim_end()),
        };
        result.push_str(&formatted);
        result.push('\n');
    }

    result
}

/// Configuration for an individual test
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntegrationTest {
    pub name: String,
    /// Base64 encoded `sf.ethereum.type.v2.Block` files, relative to the package, in chain order.
    pub blocks: Vec<String>,
    #[serde(default)]
    pub expected_organizations: Vec<OrganizationExpectation>,
    /// Expected feed per organization id.
    #[serde(default)]
    pub expected_activities: Vec<FeedExpectation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedExpectation {
    pub organization: String,
    pub activities: Vec<ActivityExpectation>,
}

/// Main integration test configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntegrationTestsConfig {
    /// Module parameters, in the same query string form as the substreams manifest.
    pub params: String,
    pub tests: Vec<IntegrationTest>,
}
