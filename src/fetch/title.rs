//! Best-effort project title lookup.

use regex::Regex;
use std::io::Read;

/// Pull the project title out of a project page.
///
/// The page title reads `<name> - <product>, Online LaTeX Editor`.
pub fn extract_title(html: &str, product: &str) -> Option<String> {
    let pattern = format!(
        r"(?i)<title.*?>(.+?) - {}, Online LaTeX Editor</title>",
        regex::escape(product)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            log::debug!("bad title pattern: {}", e);
            return None;
        }
    };

    let title = re.captures(html)?.get(1)?.as_str().trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Fetch `url` and extract the title. Any failure yields `None`.
pub fn discover(agent: &ureq::Agent, url: &str, product: &str) -> Option<String> {
    let page = match agent.get(url).call() {
        Ok(response) => {
            let mut body = String::new();
            match response.into_reader().read_to_string(&mut body) {
                Ok(_) => body,
                Err(e) => {
                    log::warn!("Could not determine project title: {}", e);
                    return None;
                }
            }
        }
        Err(e) => {
            log::warn!("Could not determine project title: {}", e);
            return None;
        }
    };

    let title = extract_title(&page, product);
    if title.is_none() {
        log::warn!("Could not determine project title: no title in {}", url);
    }
    title
}
