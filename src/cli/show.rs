use std::path::Path;

pub(crate) fn run(dir: &Path, flavor: &str, version_only: bool) {
    match flavorkit::load_flavor(dir, flavor) {
        Ok(flavor) if version_only => println!("{}", flavor.version),
        Ok(flavor) => println!("{}", flavor.tag_name()),
        Err(e) => super::fail("show", &e),
    }
}
