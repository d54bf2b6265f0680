use crate::error::LogError;
use reqwest::Url;

/// Path appended to the job root to reach Jenkins' progressive text endpoint.
pub const PROGRESSIVE_TEXT_PATH: &str = "logText/progressiveText";

/// Turns a job URL, as copied from the browser, into the progressive text URL.
///
/// A trailing `console` segment is the human viewer page and is stripped, so
/// `https://ci/job/app/42/console` and `https://ci/job/app/42/` both resolve to
/// `https://ci/job/app/42/logText/progressiveText`.
pub fn progressive_text_url(job: &str) -> Result<Url, LogError> {
    let invalid = |reason: String| LogError::InvalidLocator {
        url: job.to_string(),
        reason,
    };

    let mut url = Url::parse(job).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot carry a path".to_string()));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }

    let path = job_root(url.path());
    url.set_path(&format!(
        "{}/{PROGRESSIVE_TEXT_PATH}",
        path.trim_end_matches('/')
    ));
    url.set_fragment(None);
    Ok(url)
}

fn job_root(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, "console")) => dir,
        _ => path,
    }
}
