#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

//! Commands that must stop before any provider call

mod common;

use common::TestProject;
use predicates::prelude::*;

/// デプロイ記録が無ければ release は何もせず失敗する
#[test]
fn test_release_without_deployment_record() {
    let project = TestProject::with_site();
    project
        .site()
        .arg("release")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No deployment record"));

    // The lock is released on failure
    assert!(!project.path().join(".siteflow/lock.json").exists());
}

#[test]
fn test_up_without_domain() {
    let project = TestProject::with_site();
    project.write_site_kdl(
        r#"
deploy {
    bucket "my-site"
    project "my-project"
    directory "build"
}
"#,
    );

    project
        .site()
        .arg("up")
        .assert()
        .failure()
        .stderr(predicate::str::contains("domain"));
}

/// ドット入りのバケット名は CDN リソース名に使えない
#[test]
fn test_up_rejects_bucket_name_unusable_for_cdn() {
    let project = TestProject::with_site();
    project.write_site_kdl(
        r#"
deploy {
    bucket "www.example.com"
    project "my-project"
    directory "build"
}
release {
    domain "www.example.com"
}
"#,
    );

    project
        .site()
        .arg("up")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used for the CDN chain"));

    assert!(!project.path().join(".siteflow").exists());
}

#[test]
fn test_destroy_requires_confirmation() {
    let project = TestProject::with_site();
    project
        .site()
        .arg("destroy")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pass --yes to continue"))
        .stdout(predicate::str::contains("my-site"));

    assert!(!project.path().join(".siteflow").exists());
}

#[test]
fn test_destroy_keep_bucket_warning() {
    let project = TestProject::with_site();
    project
        .site()
        .args(["destroy", "--keep-bucket"])
        .assert()
        .success()
        .stdout(predicate::str::contains("and the bucket").not());
}
