use crate::params::Params;
use crate::percent;

/// Parses a URL-encoded query string into [`Params`].
///
/// Pairs are separated by `&` or `;`, and split on the first `=`. Keys and
/// values are percent-decoded. A pair without any `=` leaves its key present
/// with no values, which is distinct from `key=` (one empty value).
///
/// # Examples
///
/// ```
/// let params = cgi_params::parse_query("a=1;a=2&b=&flag");
///
/// assert_eq!(params.get("a").len(), 2);
/// assert_eq!(params.text("b"), "");
/// assert_eq!(params.get("b").len(), 1);
/// assert!(params.has_key("flag"));
/// assert!(params.get("flag").is_empty());
/// ```
pub fn parse_query<T: AsRef<str>>(query: T) -> Params {
    let mut params = Params::new();

    for pair in query.as_ref().split(|c| c == '&' || c == ';') {
        if pair.is_empty() {
            continue;
        }

        match pair.split_once('=') {
            Some((key, value)) => params.append(&percent::unescape(key), percent::unescape(value)),
            None => params.set_empty(&percent::unescape(pair)),
        }
    }

    params
}
