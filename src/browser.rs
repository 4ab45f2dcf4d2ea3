//! Opening web pages in the user's browser.

use log::debug;

use crate::error::Error;

pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), Error>;
}

/// Opens URLs with the platform default handler.
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), Error> {
        debug!("Opening {url}");
        open::that_detached(url).map_err(|err| Error::Unknown(format!("Cannot open {url}: {err}")))
    }
}
