use serde::{Deserialize, Serialize};

/// A named build variant of a package with its own version and publish targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flavor {
    pub name: String,
    pub version: String,

    #[serde(default)]
    pub publish_bundle: bool,

    #[serde(default)]
    pub publish_package_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub publish_bundle_url: String,
}

impl Flavor {
    /// The git tag identifying this flavor's release: `{version}-{name}`.
    #[must_use]
    pub fn tag_name(&self) -> String {
        format!("{}-{}", self.version, self.name)
    }
}

/// Contents of `releaser.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseConfig {
    #[serde(default)]
    pub flavors: Vec<Flavor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_flavor() -> Flavor {
        Flavor {
            name: "base".to_string(),
            version: "1.0.0-uds.0".to_string(),
            publish_bundle: false,
            publish_package_url: String::new(),
            publish_bundle_url: String::new(),
        }
    }

    #[test]
    fn tag_name_is_version_dash_name() {
        assert_eq!(base_flavor().tag_name(), "1.0.0-uds.0-base");
    }

    #[test]
    fn deserialize_all_fields() {
        let yaml = r#"
flavors:
  - name: upstream
    version: 2.3.1-uds.4
    publishBundle: true
    publishPackageUrl: ghcr.io/org/packages
    publishBundleUrl: ghcr.io/org/bundles
"#;
        let config: ReleaseConfig = serde_yaml_ng::from_str(yaml).unwrap();
        let f = &config.flavors[0];
        assert_eq!(f.name, "upstream");
        assert_eq!(f.version, "2.3.1-uds.4");
        assert!(f.publish_bundle);
        assert_eq!(f.publish_package_url, "ghcr.io/org/packages");
        assert_eq!(f.publish_bundle_url, "ghcr.io/org/bundles");
    }

    #[test]
    fn publish_fields_default_when_absent() {
        let yaml = "flavors:\n  - name: base\n    version: 1.0.0-uds.0\n";
        let config: ReleaseConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.flavors, vec![base_flavor()]);
    }

    #[test]
    fn missing_version_fails() {
        let yaml = "flavors:\n  - name: base\n";
        assert!(serde_yaml_ng::from_str::<ReleaseConfig>(yaml).is_err());
    }

    #[test]
    fn serialize_omits_empty_bundle_url() {
        let v = serde_json::to_value(base_flavor()).unwrap();
        assert_eq!(v["name"], "base");
        assert_eq!(v["publishBundle"], false);
        assert!(v.get("publishBundleUrl").is_none());
    }
}
