use std::path::Path;

use flavorkit::GitCli;

pub(crate) fn run(dir: &Path, flavor: &str, skip_tag_check: bool) {
    let flavor = match flavorkit::load_flavor(dir, flavor) {
        Ok(f) => f,
        Err(e) => super::fail("update-yaml", &e),
    };
    let result = if skip_tag_check {
        flavorkit::update_manifests(dir, &flavor)
    } else {
        flavorkit::mutate_manifests(dir, &flavor, &GitCli::new(dir))
    };
    match result {
        Ok(m) => println!("Updated {} to {}", m.package_name, m.version),
        Err(e) => super::fail("update-yaml", &e),
    }
}
