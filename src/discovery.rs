//! Startup discovery of provided routes.
//!
//! A manifest (JSON array of file names) lists the resources; without one,
//! conventional names are probed. Every resource stands alone: a failed
//! fetch or parse is logged and skipped, and each successful parse is
//! appended to the provided collection in one step.

use std::path::PathBuf;

use serde::Serialize;

use crate::engine::RouteEngine;
use crate::error::Result;
use crate::options::DiscoveryOptions;
use crate::parser;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch failed: {0}")]
    Other(String),
}

/// Source of resource text, e.g. a directory or an HTTP client.
pub trait ResourceFetcher {
    fn fetch(&self, path: &str) -> std::result::Result<String, FetchError>;
}

impl<F> ResourceFetcher for F
where
    F: Fn(&str) -> std::result::Result<String, FetchError>,
{
    fn fetch(&self, path: &str) -> std::result::Result<String, FetchError> {
        self(path)
    }
}

/// Reads resources from the local filesystem, relative to `root`.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceFetcher for DirectoryFetcher {
    fn fetch(&self, path: &str) -> std::result::Result<String, FetchError> {
        let full = self.root.join(path);
        std::fs::read_to_string(&full).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(full.display().to_string())
            } else {
                FetchError::Io {
                    path: full.display().to_string(),
                    source,
                }
            }
        })
    }
}

/// Outcome of a discovery pass. Skips are normal, not failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<String>,
}

/// Decode a manifest; anything but a JSON array of strings is treated as absent.
pub fn parse_manifest(text: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<Vec<String>>(text) {
        Ok(names) => Some(names),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable manifest");
            None
        }
    }
}

/// Names to load: the manifest entries, or the probe list when the manifest
/// is missing, unreadable or empty.
pub fn resource_names(fetcher: &impl ResourceFetcher, opts: &DiscoveryOptions) -> Vec<String> {
    let manifest = match fetcher.fetch(&opts.manifest_path()) {
        Ok(text) => parse_manifest(&text),
        Err(e) => {
            tracing::debug!(error = %e, "no manifest, probing conventional names");
            None
        }
    };

    match manifest {
        Some(names) if !names.is_empty() => names,
        _ => opts.probe_names(),
    }
}

/// Name used for a resource whose document carries no route name.
pub fn fallback_name(resource_name: &str) -> &str {
    let len = resource_name.len();
    if len >= 4
        && resource_name.is_char_boundary(len - 4)
        && resource_name[len - 4..].eq_ignore_ascii_case(".gpx")
    {
        &resource_name[..len - 4]
    } else {
        resource_name
    }
}

/// Parse one resource and append it to the provided collection.
///
/// Returns the new index, or `None` when the document holds no points.
pub fn ingest_provided(
    engine: &mut RouteEngine,
    resource_name: &str,
    text: &str,
) -> Result<Option<usize>> {
    let mut route = parser::parse_route(text)?;
    if route.is_empty() {
        return Ok(None);
    }
    if route.name.is_empty() {
        route.name = fallback_name(resource_name).to_string();
    }
    Ok(Some(engine.add_provided(route)))
}

/// Discover, fetch and parse every provided route.
pub fn load_provided(
    engine: &mut RouteEngine,
    fetcher: &impl ResourceFetcher,
    opts: &DiscoveryOptions,
) -> LoadReport {
    tracing::debug!(base_path = %opts.base_path, "loading provided routes");
    let mut report = LoadReport::default();

    for name in resource_names(fetcher, opts) {
        let text = match fetcher.fetch(&opts.resource_path(&name)) {
            Ok(text) => text,
            Err(FetchError::NotFound(path)) => {
                tracing::debug!(%path, "resource not present");
                report.skipped.push(name);
                continue;
            }
            Err(e) => {
                tracing::warn!(resource = %name, error = %e, "failed to fetch route");
                report.skipped.push(name);
                continue;
            }
        };

        match ingest_provided(engine, &name, &text) {
            Ok(Some(index)) => {
                tracing::debug!(resource = %name, index, "loaded provided route");
                report.loaded.push(name);
            }
            Ok(None) => {
                tracing::debug!(resource = %name, "skipping route without points");
                report.skipped.push(name);
            }
            Err(e) => {
                tracing::warn!(resource = %name, error = %e, "failed to parse route");
                report.skipped.push(name);
            }
        }
    }

    if report.loaded.is_empty() {
        tracing::debug!("no provided routes discovered");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const ONE_POINT: &str = r#"<gpx><rte><rtept lat="1" lon="2"/></rte></gpx>"#;

    fn serve(files: &[(&str, &str)]) -> impl Fn(&str) -> std::result::Result<String, FetchError> {
        let files: HashMap<String, String> = files
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |path: &str| {
            files
                .get(path)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(path.to_string()))
        }
    }

    fn opts() -> DiscoveryOptions {
        DiscoveryOptions {
            base_path: "r".to_string(),
            ..DiscoveryOptions::default()
        }
    }

    #[test]
    fn manifest_lists_resources() {
        let fetcher = serve(&[
            ("r/index.json", r#"["harbour.gpx", "broken.gpx", "missing.gpx"]"#),
            ("r/harbour.gpx", ONE_POINT),
            ("r/broken.gpx", "<gpx><rte>"),
            ("r/route1.gpx", ONE_POINT),
        ]);
        let mut engine = RouteEngine::new();
        let report = load_provided(&mut engine, &fetcher, &opts());

        assert_eq!(report.loaded, vec!["harbour.gpx"]);
        assert_eq!(report.skipped, vec!["broken.gpx", "missing.gpx"]);
        assert_eq!(engine.provided().len(), 1);
        assert_eq!(engine.provided()[0].route().name, "harbour");
        assert!(!engine.provided()[0].visible);
        assert_eq!(engine.state(), crate::engine::EditState::NoActiveRoute);
    }

    #[test]
    fn probes_without_manifest() {
        let fetcher = serve(&[("r/route2.gpx", ONE_POINT), ("r/route10.gpx", ONE_POINT)]);
        let mut engine = RouteEngine::new();
        let report = load_provided(&mut engine, &fetcher, &opts());
        assert_eq!(report.loaded, vec!["route2.gpx", "route10.gpx"]);
        assert_eq!(report.skipped.len(), 8);
    }

    #[test]
    fn empty_or_bad_manifest_falls_back_to_probe() {
        let names = resource_names(&serve(&[("r/index.json", "[]")]), &opts());
        assert_eq!(names.len(), 10);
        let names = resource_names(&serve(&[("r/index.json", "{oops")]), &opts());
        assert_eq!(names[0], "route1.gpx");
    }

    #[test]
    fn nothing_available_is_fine() {
        let mut engine = RouteEngine::new();
        let report = load_provided(&mut engine, &serve(&[]), &opts());
        assert!(report.loaded.is_empty());
        assert!(engine.provided().is_empty());
    }

    #[test]
    fn empty_documents_are_skipped() {
        let mut engine = RouteEngine::new();
        assert_eq!(ingest_provided(&mut engine, "e.gpx", "<gpx/>").unwrap(), None);
        assert!(engine.provided().is_empty());
    }

    #[test]
    fn document_name_beats_file_name() {
        let mut engine = RouteEngine::new();
        let text = r#"<gpx><trk><name>Sound</name><trkseg><trkpt lat="1" lon="1"/></trkseg></trk></gpx>"#;
        ingest_provided(&mut engine, "x.gpx", text).unwrap();
        assert_eq!(engine.provided()[0].route().name, "Sound");
    }

    #[test]
    fn fallback_name_strips_extension() {
        assert_eq!(fallback_name("route1.gpx"), "route1");
        assert_eq!(fallback_name("Bay.GPX"), "Bay");
        assert_eq!(fallback_name("notes.txt"), "notes.txt");
        assert_eq!(fallback_name("gpx"), "gpx");
    }
}
