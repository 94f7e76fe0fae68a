use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const SITE_KDL: &str = r#"
deploy {
    bucket "my-site"
    project "my-project"
    region "us-east1"
    directory "build"
    not-found "404.html"
}
release {
    domain "www.example.com"
}
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// Project with site.kdl and an empty build directory
    pub fn with_site() -> Self {
        let project = Self::new();
        project.write_site_kdl(SITE_KDL);
        fs::create_dir_all(project.root.path().join("build")).unwrap();
        project
    }

    pub fn write_site_kdl(&self, content: &str) {
        fs::write(self.site_kdl(), content).unwrap();
    }

    pub fn site_kdl(&self) -> PathBuf {
        self.root.path().join("site.kdl")
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// `site` running inside the project, isolated from the user's config
    pub fn site(&self) -> Command {
        let mut cmd = Command::cargo_bin("site").unwrap();
        cmd.current_dir(self.path())
            .env_remove("SITE_CONFIG_PATH")
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"));
        cmd
    }
}
