//! Bookmaker-specific fetch strategies and their field maps.

mod betika;
mod betpawa;
mod sportybet;

pub use betika::BetikaSource;
pub use betpawa::BetpawaSource;
pub use sportybet::SportybetSource;

/// Extracts `scheme://host` from a URL for throttle keying.
pub(crate) fn origin_of(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_owned();
    };
    let rest = &url[scheme_end + 3..];
    let host_end = rest
        .find(['/', '?', '#'])
        .unwrap_or(rest.len());
    format!("{}{}", &url[..scheme_end + 3], &rest[..host_end])
}
