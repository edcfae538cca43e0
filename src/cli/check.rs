use std::path::Path;

use flavorkit::{GitCli, SourceControl};

pub(crate) fn run(dir: &Path, flavor: &str, boolean: bool) {
    let flavor = match flavorkit::load_flavor(dir, flavor) {
        Ok(f) => f,
        Err(e) => super::fail("check", &e),
    };
    let tag = flavor.tag_name();
    let tagged = match GitCli::new(dir).tag_exists(&tag) {
        Ok(t) => t,
        Err(e) => super::fail("check", &e),
    };

    if boolean {
        println!("{}", !tagged);
    } else if tagged {
        println!("Version {tag} is already tagged");
        std::process::exit(2);
    } else {
        println!("Version {tag} is not tagged");
    }
}
