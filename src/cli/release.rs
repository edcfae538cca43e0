use std::path::Path;

use flavorkit::{GitCli, GitHub, GitLab, Platform, ReleaseOutcome};

pub(crate) fn run_github(dir: &Path, flavor: &str, token_var: Option<String>) {
    run("release github", dir, flavor, token_var, &GitHub::from_env());
}

pub(crate) fn run_gitlab(dir: &Path, flavor: &str, token_var: Option<String>) {
    run("release gitlab", dir, flavor, token_var, &GitLab::new());
}

fn run(command: &str, dir: &Path, flavor: &str, token_var: Option<String>, platform: &dyn Platform) {
    let token_var = token_var.unwrap_or_else(|| platform.default_token_var().to_string());
    match flavorkit::load_and_tag(dir, flavor, &token_var, platform, &GitCli::new(dir)) {
        Ok(ReleaseOutcome::Created) => println!("{} release created", platform.name()),
        Ok(ReleaseOutcome::AlreadyExists) => {
            println!("{} release already exists; nothing to do", platform.name())
        }
        Err(e) => super::fail(command, &e),
    }
}
