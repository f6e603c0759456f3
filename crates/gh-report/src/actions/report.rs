//! Assembling per-repository, per-workflow report entries.

use itertools::Itertools as _;
use serde::Serialize;

use super::{
    fetch::RepositorySnapshot,
    parse::ParsedWorkflow,
    permissions::normalize_permissions,
    uses::{ActionUsage, AuthorshipFilter, extract_action_usages},
};
use crate::output::Table;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct WorkflowReportEntry {
    pub(crate) path: String,
    pub(crate) url: String,
    pub(crate) uses: Vec<ActionUsage>,
    pub(crate) permissions: Vec<String>,
}

impl WorkflowReportEntry {
    pub(crate) fn new(
        owner: &str,
        repo: &str,
        path: &str,
        uses: Vec<ActionUsage>,
        permissions: Vec<String>,
    ) -> Self {
        Self {
            path: path.into(),
            url: format!("https://github.com/{owner}/{repo}/blob/HEAD/{path}"),
            uses,
            permissions,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct RepositoryReportEntry {
    pub(crate) owner: String,
    pub(crate) repo: String,
    pub(crate) workflows: Vec<WorkflowReportEntry>,
}

/// Build the report entry for one repository from its workflow files.
///
/// Entries that aren't YAML, or whose contents aren't available as
/// text, are skipped. So are files that neither view can read.
pub(crate) fn assemble_repository(
    snapshot: &RepositorySnapshot,
    filter: AuthorshipFilter,
) -> RepositoryReportEntry {
    let owner = &snapshot.owner.login;
    let repo = &snapshot.name;
    let full_name = snapshot.full_name();

    let workflows = snapshot
        .workflow_entries()
        .iter()
        .filter_map(|entry| {
            if !entry.is_workflow() {
                tracing::debug!("{full_name}: skipping {path}", path = entry.path);
                return None;
            }

            let Some(contents) = entry.text() else {
                tracing::warn!(
                    "{full_name}: skipping {path}: contents are binary, truncated or missing",
                    path = entry.path
                );
                return None;
            };

            let parsed = ParsedWorkflow::parse(&full_name, &entry.path, contents);
            if parsed.is_unreadable() {
                return None;
            }

            let uses = parsed
                .jobs
                .map(|jobs| extract_action_usages(&jobs, filter, owner, repo))
                .unwrap_or_default();
            let permissions = parsed
                .permissions
                .map(|view| normalize_permissions(&view))
                .unwrap_or_default();

            Some(WorkflowReportEntry::new(
                owner,
                repo,
                &entry.path,
                uses,
                permissions,
            ))
        })
        .collect();

    RepositoryReportEntry {
        owner: owner.clone(),
        repo: repo.clone(),
        workflows,
    }
}

/// One row per workflow: `owner, repo, workflow_path, uses, permissions`.
pub(crate) fn table(entries: &[RepositoryReportEntry]) -> Table {
    let mut table = Table::new(["owner", "repo", "workflow_path", "uses", "permissions"]);

    for entry in entries {
        for workflow in &entry.workflows {
            table.push([
                entry.owner.clone(),
                entry.repo.clone(),
                workflow.path.clone(),
                workflow.uses.iter().join(", "),
                workflow.permissions.join(", "),
            ]);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{RepositoryReportEntry, WorkflowReportEntry, assemble_repository, table};
    use crate::actions::{
        fetch::{
            RepositorySnapshot,
            tests::{repository, workflow},
        },
        uses::{ActionUsage, AuthorshipFilter},
    };

    fn snapshot(entries: serde_json::Value) -> RepositorySnapshot {
        serde_json::from_value(repository("hello", entries)).unwrap()
    }

    #[test]
    fn test_workflow_url() {
        let entry = WorkflowReportEntry::new(
            "octo-org",
            "hello",
            ".github/workflows/ci.yml",
            vec![],
            vec![],
        );
        assert_eq!(
            entry.url,
            "https://github.com/octo-org/hello/blob/HEAD/.github/workflows/ci.yml"
        );
    }

    #[test]
    fn test_assemble_skips_ineligible_entries() {
        let repo = snapshot(json!([
            workflow(".github/workflows/notes.txt", "not yaml"),
            workflow(".github/workflows/broken.yml", "jobs: [unclosed\n"),
            workflow(
                ".github/workflows/ok.yaml",
                "jobs:\n  a:\n    steps:\n      - uses: ./tools/lint\n"
            ),
            {
                "path": ".github/workflows/huge.yml",
                "extension": ".yml",
                "object": {"text": null, "isBinary": false, "isTruncated": true},
            },
        ]));

        let entry = assemble_repository(&repo, AuthorshipFilter::default());

        assert_eq!(
            entry,
            RepositoryReportEntry {
                owner: "octo-org".into(),
                repo: "hello".into(),
                workflows: vec![WorkflowReportEntry {
                    path: ".github/workflows/ok.yaml".into(),
                    url: "https://github.com/octo-org/hello/blob/HEAD/.github/workflows/ok.yaml"
                        .into(),
                    uses: vec![ActionUsage {
                        action: "./tools/lint".into(),
                        version: "".into(),
                        source_url: "https://github.com/octo-org/hello/tree/HEAD/tools/lint"
                            .into(),
                    }],
                    permissions: vec![],
                }],
            }
        );
    }

    #[test]
    fn test_assemble_without_eligible_entries() {
        let repo = snapshot(json!([workflow(".github/workflows/README.md", "# hi")]));

        let entry = assemble_repository(&repo, AuthorshipFilter::default());
        assert!(entry.workflows.is_empty());
    }

    #[test]
    fn test_assemble_with_one_unreadable_view() {
        let repo = snapshot(json!([workflow(
            ".github/workflows/ci.yml",
            "permissions: read-all\njobs:\n  a:\n    steps: nope\n"
        )]));

        let entry = assemble_repository(&repo, AuthorshipFilter::default());
        assert_eq!(entry.workflows.len(), 1);
        assert!(entry.workflows[0].uses.is_empty());
        assert_eq!(entry.workflows[0].permissions, ["read-all"]);
    }

    #[test]
    fn test_table() {
        let entries = [RepositoryReportEntry {
            owner: "octo-org".into(),
            repo: "hello".into(),
            workflows: vec![
                WorkflowReportEntry::new(
                    "octo-org",
                    "hello",
                    ".github/workflows/ci.yml",
                    vec![
                        ActionUsage::new("actions/checkout@v4", "octo-org", "hello"),
                        ActionUsage::new("some-org/some-action", "octo-org", "hello"),
                    ],
                    vec!["contents: read".into(), "id-token: write".into()],
                ),
                WorkflowReportEntry::new(
                    "octo-org",
                    "hello",
                    ".github/workflows/empty.yml",
                    vec![],
                    vec![],
                ),
            ],
        }];

        let table = table(&entries);
        assert_eq!(
            table.header,
            ["owner", "repo", "workflow_path", "uses", "permissions"]
        );
        assert_eq!(
            table.rows,
            [
                vec![
                    "octo-org",
                    "hello",
                    ".github/workflows/ci.yml",
                    "actions/checkout (v4), some-org/some-action ()",
                    "contents: read, id-token: write",
                ],
                vec!["octo-org", "hello", ".github/workflows/empty.yml", "", ""],
            ]
        );
    }
}
