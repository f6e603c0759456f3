//! None of these tests reach the network: every run either fails before
//! a client is built, or never builds one.

use crate::common::gh_report;

#[test]
fn test_version() -> anyhow::Result<()> {
    insta::assert_snapshot!(gh_report().args(["--version"]).run()?, @"gh-report @@VERSION@@");

    Ok(())
}

#[test]
fn test_scope_required() -> anyhow::Result<()> {
    insta::assert_snapshot!(
        gh_report()
            .expects_failure(true)
            .args(["actions"])
            .setenv("GH_TOKEN", "not-a-real-token")
            .run()?,
        @r"
    fatal: no report was generated
    no scope given: use one of --enterprise, --owner or --repo
    "
    );

    Ok(())
}

#[test]
fn test_repository_rejected_before_network() -> anyhow::Result<()> {
    // No token at all: the scope check has to fire first.
    for report in ["actions", "billing", "repo", "verified-emails"] {
        let output = gh_report()
            .expects_failure(true)
            .args([report, "--repo", "octo-org/hello"])
            .run()?;
        insta::allow_duplicates! {
            insta::assert_snapshot!(
                output,
                @r"
            fatal: no report was generated
            repository not supported for this report
            "
            );
        }
    }

    Ok(())
}

#[test]
fn test_malformed_repository() -> anyhow::Result<()> {
    insta::assert_snapshot!(
        gh_report()
            .expects_failure(true)
            .args(["actions", "-r", "hello"])
            .run()?,
        @r#"
    fatal: no report was generated
    invalid repository "hello": expected OWNER/REPO
    "#
    );

    Ok(())
}

#[test]
fn test_license_scope() -> anyhow::Result<()> {
    insta::assert_snapshot!(
        gh_report()
            .expects_failure(true)
            .args(["license"])
            .run()?,
        @r"
    fatal: no report was generated
    --enterprise is required for this report
    "
    );

    insta::assert_snapshot!(
        gh_report()
            .expects_failure(true)
            .args(["license", "--owner", "octo-org"])
            .run()?,
        @r"
    fatal: no report was generated
    owner not supported for this report
    "
    );

    Ok(())
}

#[test]
fn test_enterprise_server_rejected() -> anyhow::Result<()> {
    for report in ["actions", "verified-emails"] {
        let output = gh_report()
            .expects_failure(true)
            .args([report, "--owner", "octo-org"])
            .setenv("GH_HOST", "ghes.example.com")
            .run()?;
        insta::allow_duplicates! {
            insta::assert_snapshot!(
                output,
                @r"
            fatal: no report was generated
            GitHub Enterprise Server is not supported for this report
            "
            );
        }
    }

    Ok(())
}

#[test]
fn test_token_required() -> anyhow::Result<()> {
    insta::assert_snapshot!(
        gh_report()
            .expects_failure(true)
            .args(["actions", "--owner", "octo-org"])
            .run()?,
        @r"
    fatal: no report was generated
    no GitHub token: use --token or set GH_TOKEN
    "
    );

    insta::assert_snapshot!(
        gh_report()
            .expects_failure(true)
            .args(["repo", "--owner", "octo-org"])
            .setenv("GH_TOKEN", "  ")
            .run()?,
        @r"
    fatal: no report was generated
    GitHub token cannot be empty
    "
    );

    Ok(())
}

#[test]
fn test_conflicting_scopes() -> anyhow::Result<()> {
    let output = gh_report()
        .expects_failure(true)
        .args(["actions", "--enterprise", "acme", "--owner", "octo-org"])
        .run()?;

    assert!(output.contains(
        "error: the argument '--enterprise <ENTERPRISE>' cannot be used with '--owner <OWNER>'"
    ));

    let output = gh_report()
        .expects_failure(true)
        .args(["repo", "--public", "--private", "--owner", "octo-org"])
        .run()?;

    assert!(output.contains("cannot be used with"));

    Ok(())
}

#[test]
fn test_hostname_must_not_be_a_url() -> anyhow::Result<()> {
    let output = gh_report()
        .expects_failure(true)
        .args(["actions", "--owner", "octo-org", "--hostname", "https://github.com"])
        .run()?;

    assert!(output.contains("must be a domain name, not a URL"));

    Ok(())
}
