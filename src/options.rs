use serde::Deserialize;

/// Where provided routes are discovered at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryOptions {
    /// Directory or URL prefix holding the GPX resources (default: "./preloaded_routes")
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Manifest file under `base_path`: a JSON array of file names (default: "index.json")
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// How many conventional names to probe when there is no manifest (default: 10)
    #[serde(default = "default_probe_count")]
    pub probe_count: usize,

    /// Prefix of the probed names, `{prefix}1.gpx` onward (default: "route")
    #[serde(default = "default_probe_prefix")]
    pub probe_prefix: String,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            manifest: default_manifest(),
            probe_count: default_probe_count(),
            probe_prefix: default_probe_prefix(),
        }
    }
}

impl DiscoveryOptions {
    /// Full path of a resource under `base_path`.
    pub fn resource_path(&self, name: &str) -> String {
        if self.base_path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.base_path.trim_end_matches('/'))
        }
    }

    pub fn manifest_path(&self) -> String {
        self.resource_path(&self.manifest)
    }

    /// `route1.gpx` .. `route{probe_count}.gpx`.
    pub fn probe_names(&self) -> Vec<String> {
        (1..=self.probe_count)
            .map(|i| format!("{}{i}.gpx", self.probe_prefix))
            .collect()
    }
}

fn default_base_path() -> String {
    "./preloaded_routes".to_string()
}

fn default_manifest() -> String {
    "index.json".to_string()
}

fn default_probe_count() -> usize {
    10
}

fn default_probe_prefix() -> String {
    "route".to_string()
}
