use std::path::{Path, PathBuf};

use workflow_views::{ActionRef, JobsView, Permissions, PermissionsView};

fn sample_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/sample-workflows")
}

fn read_sample(name: &str) -> String {
    let workflow_path = sample_dir().join(name);
    std::fs::read_to_string(&workflow_path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", workflow_path.display()))
}

#[test]
fn test_load_all() {
    for sample_workflow in std::fs::read_dir(sample_dir()).unwrap() {
        let sample_path = sample_workflow.unwrap().path();

        if sample_path.extension().and_then(|ext| ext.to_str()) != Some("yml") {
            continue;
        }

        let sample_name = sample_path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("sample file name not valid UTF-8");

        let contents = read_sample(sample_name);
        let jobs = JobsView::from_yaml(&contents);
        let permissions = PermissionsView::from_yaml(&contents);

        if sample_name.contains(".invalid.") {
            assert!(jobs.is_err(), "expected {sample_name} jobs view to fail");
            assert!(
                permissions.is_err(),
                "expected {sample_name} permissions view to fail"
            );
        } else if sample_name.contains(".jobs-invalid.") {
            assert!(jobs.is_err(), "expected {sample_name} jobs view to fail");
            permissions.unwrap();
        } else {
            jobs.unwrap();
            permissions.unwrap();
        }
    }
}

#[test]
fn test_ci_uses() {
    let view = JobsView::from_yaml(&read_sample("ci.yml")).unwrap();

    insta::assert_snapshot!(view.uses().collect::<Vec<_>>().join("\n"), @r"
    actions/checkout@v4
    actions/setup-node@v4
    actions/checkout@v4
    octo-org/release-action@v2
    ./.github/actions/notify
    ");

    let refs = view.uses().map(ActionRef::parse).collect::<Vec<_>>();
    assert_eq!(refs[3].action, "octo-org/release-action");
    assert_eq!(refs[3].version, Some("v2"));
    assert!(refs[4].is_local());
}

#[test]
fn test_ci_permissions() {
    let view = PermissionsView::from_yaml(&read_sample("ci.yml")).unwrap();

    let statements = view
        .declared()
        .flat_map(Permissions::statements)
        .collect::<Vec<_>>();
    insta::assert_snapshot!(statements.join("\n"), @r"
    contents: read
    contents: write
    id-token: write
    ");
}

#[test]
fn test_reusable() {
    let contents = read_sample("reusable.yml");

    let jobs = JobsView::from_yaml(&contents).unwrap();
    assert_eq!(
        jobs.uses().collect::<Vec<_>>(),
        [
            "octo-org/shared/.github/workflows/lint.yml@main",
            "./.github/workflows/local.yml",
        ]
    );

    let permissions = PermissionsView::from_yaml(&contents).unwrap();
    assert_eq!(
        permissions.permissions,
        Some(Permissions::Scalar("read-all".into()))
    );
}

#[test]
fn test_ambiguous_job() {
    let view = JobsView::from_yaml(&read_sample("ambiguous-job.yml")).unwrap();

    assert_eq!(view.uses().collect::<Vec<_>>(), ["docker://alpine:3.19"]);
}

#[test]
fn test_no_jobs() {
    let contents = read_sample("no-jobs.yml");

    assert_eq!(JobsView::from_yaml(&contents).unwrap().uses().count(), 0);
    assert_eq!(
        PermissionsView::from_yaml(&contents)
            .unwrap()
            .declared()
            .count(),
        0
    );
}

#[test]
fn test_views_fail_independently() {
    let contents = read_sample("bad-steps.jobs-invalid.yml");

    assert!(JobsView::from_yaml(&contents).is_err());

    let permissions = PermissionsView::from_yaml(&contents).unwrap();
    assert_eq!(
        permissions
            .declared()
            .flat_map(Permissions::statements)
            .collect::<Vec<_>>(),
        ["pull-requests: write"]
    );
}
