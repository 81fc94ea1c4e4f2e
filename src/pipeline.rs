use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::fetcher::Fetcher;
use crate::locator;
use crate::parser;
use crate::settings::Settings;
use crate::store;

/// What a successful run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Script URL, or the local path for offline runs.
    pub source: String,
    pub output: PathBuf,
    pub categories: usize,
    pub topics: usize,
    pub examples: usize,
}

/// Fetch page → locate bundle → fetch bundle → extract → evaluate → build → persist.
///
/// Strictly sequential; the artifact is only written once every earlier step
/// has succeeded.
pub async fn run(settings: &Settings, progress: &ProgressBar) -> Result<RunReport> {
    let fetcher = Fetcher::new();
    let page_url = locator::resolve_reference(&settings.base_url, &settings.page_path)?;

    progress.set_message(format!("fetching {}", page_url));
    let html = fetcher.fetch(&page_url).await?;

    progress.set_message("locating palette script");
    let reference = locator::locate_script_reference(&html)?;
    let script_url = locator::resolve_reference(&settings.base_url, &reference)?;
    info!("Palette script: {} (referenced as {})", script_url, reference);

    progress.set_message(format!("fetching {}", script_url));
    let script = fetcher.fetch(&script_url).await?;

    progress.set_message("extracting palette");
    let palette = parser::extract_palette(&script)?;
    let (categories, topics, examples) = store::totals(&palette);
    info!(categories, topics, examples, "Extracted palette");

    progress.set_message(format!("writing {}", settings.output.display()));
    store::persist(&palette, &settings.output).await?;

    Ok(RunReport {
        source: script_url.to_string(),
        output: settings.output.clone(),
        categories,
        topics,
        examples,
    })
}

/// Offline variant: the bundle was saved to disk beforehand.
pub async fn run_from_script(script_path: &Path, output: PathBuf) -> Result<RunReport> {
    let script = tokio::fs::read_to_string(script_path)
        .await
        .map_err(|source| PipelineError::Io {
            path: script_path.to_path_buf(),
            source,
        })?;
    info!("Read {} bytes from {}", script.len(), script_path.display());

    let palette = parser::extract_palette(&script)?;
    let (categories, topics, examples) = store::totals(&palette);
    store::persist(&palette, &output).await?;
    Ok(RunReport {
        source: script_path.display().to_string(),
        output,
        categories,
        topics,
        examples,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, FetchError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    async fn serve(server: &MockServer, at: &str, status: u16, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn settings(server: &MockServer, output: PathBuf) -> Settings {
        Settings {
            base_url: server.uri(),
            page_path: "/palette.html".into(),
            output,
        }
    }

    #[tokio::test]
    async fn end_to_end_fixture() {
        let server = MockServer::start().await;
        serve(&server, "/palette.html", 200, fixture("palette.html")).await;
        serve(&server, "/legacy/app.abc123.js", 200, fixture("legacy_app.js")).await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("palette.json");
        let report = run(&settings(&server, out.clone()), &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(report.source, format!("{}/legacy/app.abc123.js", server.uri()));
        assert_eq!((report.categories, report.topics, report.examples), (1, 2, 2));

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, fixture("palette.json"));

        let written: serde_json::Value = serde_json::from_str(&written).unwrap();
        let expected: serde_json::Value = serde_json::from_str(
            r#"[{"category":"Grammar","topics":[{"id":1,"title":"Subject-verb agreement","rawTitle":"1. Subject-verb agreement","examples":["He runs."]},{"id":2,"title":"Pronoun case","rawTitle":"2. Pronoun case","examples":["It is I."]}]}]"#,
        )
        .unwrap();
        assert_eq!(written, expected);
    }

    #[tokio::test]
    async fn missing_marker_writes_nothing() {
        let server = MockServer::start().await;
        serve(&server, "/palette.html", 200, fixture("palette.html")).await;
        serve(&server, "/legacy/app.abc123.js", 200, "console.log('no data');".into()).await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("palette.json");
        let err = run(&settings(&server, out.clone()), &ProgressBar::hidden())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Extract(ExtractError::MarkerNotFound)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn dangling_reference_writes_nothing() {
        let server = MockServer::start().await;
        serve(&server, "/palette.html", 200, fixture("palette.html")).await;
        serve(
            &server,
            "/legacy/app.abc123.js",
            200,
            r#"m={sections:[{"Grammar":[1,3]}],intents:[{"1. a":["x"]}]};"#.into(),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("palette.json");
        let err = run(&settings(&server, out.clone()), &ProgressBar::hidden())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Integrity { ref id, .. } if id == "3"));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn page_without_script_reference() {
        let server = MockServer::start().await;
        serve(&server, "/palette.html", 200, "<html><body>maintenance</body></html>".into()).await;

        let dir = tempfile::tempdir().unwrap();
        let err = run(&settings(&server, dir.path().join("p.json")), &ProgressBar::hidden())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[tokio::test]
    async fn script_fetch_failure_is_fetch_error() {
        let server = MockServer::start().await;
        serve(&server, "/palette.html", 200, fixture("palette.html")).await;
        serve(&server, "/legacy/app.abc123.js", 500, String::new()).await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("palette.json");
        let err = run(&settings(&server, out.clone()), &ProgressBar::hidden())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Fetch(FetchError::Status { status: 500, .. })
        ));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn offline_run_from_saved_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("palette.json");
        let report = run_from_script(Path::new("tests/fixtures/legacy_full.js"), out.clone())
            .await
            .unwrap();

        assert_eq!((report.categories, report.topics, report.examples), (4, 7, 9));
        let loaded = store::load(&out).await.unwrap();
        assert_eq!(loaded[0].category, "academic tone");
    }

    #[tokio::test]
    async fn offline_run_with_missing_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("palette.json");
        let err = run_from_script(&dir.path().join("absent.js"), out.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
        assert!(!out.exists());
    }
}
