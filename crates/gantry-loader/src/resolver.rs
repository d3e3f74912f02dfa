use crate::{LoaderError, PROTOCOL_VERSION};
use gantry_schema::{parse_manifest_slice, Manifest};
use std::io::Read;
use tracing::debug;

/// Turns a target URL into a [`Manifest`].
///
/// The HTTP implementation below is the production path; tests substitute
/// their own resolvers.
pub trait ManifestResolver: Send {
    fn resolve(&self, url: &str) -> Result<Manifest, LoaderError>;
}

/// Map launcher URL schemes onto the transport actually used: links handed
/// to the shell use `gantry://` (and `gantrys://` for TLS), which address an
/// HTTP manifest endpoint.
pub fn normalize_manifest_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("gantrys://") {
        format!("https://{rest}")
    } else if let Some(rest) = url.strip_prefix("gantry://") {
        format!("http://{rest}")
    } else {
        url.to_owned()
    }
}

/// HTTP-based manifest resolver.
pub struct HttpManifestResolver {
    agent: ureq::Agent,
}

impl HttpManifestResolver {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for HttpManifestResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestResolver for HttpManifestResolver {
    fn resolve(&self, url: &str) -> Result<Manifest, LoaderError> {
        let url = normalize_manifest_url(url);
        debug!("GET {url}");

        let resp = match self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Gantry-Protocol", &PROTOCOL_VERSION.to_string())
            .call()
        {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(LoaderError::ManifestResolution(format!(
                    "no manifest at {url}"
                )));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(LoaderError::ManifestResolution(format!(
                    "HTTP {code} for {url}"
                )));
            }
            Err(e) => return Err(LoaderError::ManifestResolution(e.to_string())),
        };

        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| LoaderError::ManifestResolution(e.to_string()))?;

        Ok(parse_manifest_slice(&body)?)
    }
}
