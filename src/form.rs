use crate::constants;
use crate::constraints::Constraints;
use crate::field::FilePart;
use crate::multipart::Multipart;
use crate::params::{Params, Value};
use crate::query;
use http::Method;
use std::io::Read;

/// What the surrounding request context declares about a request.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub content_type: Option<String>,
    pub content_length: u64,
    pub query_string: Option<String>,
    /// Parameters used when the method is neither GET, HEAD nor POST, e.g.
    /// when running outside a web server.
    pub offline_query: String,
}

impl RequestMeta {
    pub fn new(method: Method) -> RequestMeta {
        RequestMeta {
            method,
            content_type: None,
            content_length: 0,
            query_string: None,
            offline_query: constants::DEFAULT_OFFLINE_QUERY.to_owned(),
        }
    }

    pub fn content_type<T: Into<String>>(mut self, content_type: T) -> RequestMeta {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_length(mut self, content_length: u64) -> RequestMeta {
        self.content_length = content_length;
        self
    }

    pub fn query_string<T: Into<String>>(mut self, query_string: T) -> RequestMeta {
        self.query_string = Some(query_string.into());
        self
    }

    pub fn offline_query<T: Into<String>>(mut self, offline_query: T) -> RequestMeta {
        self.offline_query = offline_query.into();
        self
    }
}

/// The decoded parameters of one request.
///
/// # Examples
///
/// ```
/// use cgi_params::{Form, RequestMeta};
/// use http::Method;
///
/// let meta = RequestMeta::new(Method::GET).query_string("name=Larry&lang=rust");
/// let form = Form::from_request(&meta, std::io::empty()).unwrap();
///
/// assert!(!form.is_multipart());
/// assert_eq!(form.get("name").as_text(), Some("Larry"));
/// ```
#[derive(Debug)]
pub struct Form {
    params: Params,
    multipart: bool,
}

impl Form {
    /// Decodes the parameters of a request with the default constraints.
    pub fn from_request<R: Read>(meta: &RequestMeta, body: R) -> crate::Result<Form> {
        Form::from_request_with_constraints(meta, body, Constraints::default())
    }

    /// Decodes the parameters of a request.
    ///
    /// A POST with a `multipart/form-data` content type is decoded as
    /// multipart. Otherwise GET and HEAD use the query string, POST reads
    /// `content_length` bytes of URL-encoded body, and any other method uses
    /// the offline query.
    pub fn from_request_with_constraints<R: Read>(
        meta: &RequestMeta,
        body: R,
        constraints: Constraints,
    ) -> crate::Result<Form> {
        if meta.method == Method::POST {
            if let Some(boundary) = meta.content_type.as_deref().and_then(|ct| crate::parse_boundary(ct).ok()) {
                log::debug!("decoding multipart body with boundary {:?}", boundary);

                let params =
                    Multipart::with_constraints(body, boundary, meta.content_length, constraints).decode()?;

                return Ok(Form {
                    params,
                    multipart: true,
                });
            }
        }

        let params = if meta.method == Method::GET || meta.method == Method::HEAD {
            query::parse_query(meta.query_string.as_deref().unwrap_or_default())
        } else if meta.method == Method::POST {
            query::parse_query(read_urlencoded_body(body, meta.content_length)?)
        } else {
            query::parse_query(&meta.offline_query)
        };

        Ok(Form {
            params,
            multipart: false,
        })
    }

    /// Wraps already decoded parameters.
    pub fn from_params(params: Params) -> Form {
        Form {
            params,
            multipart: false,
        }
    }

    /// Whether the request body was `multipart/form-data`.
    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    /// The first value for `name`, or an empty text value.
    pub fn get(&self, name: &str) -> &Value {
        self.params.get_first(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys()
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.params.has_key(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replaces every parameter, bypassing the decoder.
    pub fn set_params<I, K>(&mut self, mapping: I)
    where
        I: IntoIterator<Item = (K, Vec<Value>)>,
        K: Into<String>,
    {
        self.params.replace_all(mapping);
    }

    /// Every uploaded file with its field name.
    pub fn files(&self) -> impl Iterator<Item = (&str, &FilePart)> {
        self.params.files()
    }

    /// The last file uploaded under `name`.
    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.params.file(name)
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

fn read_urlencoded_body<R: Read>(body: R, content_length: u64) -> crate::Result<String> {
    let mut data = Vec::new();
    body.take(content_length)
        .read_to_end(&mut data)
        .map_err(crate::Error::StreamReadFailed)?;

    Ok(String::from_utf8_lossy(&data).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPART_BODY: &str = "--AaB03x\r\nContent-Disposition: form-data; name=\"submit-name\"\r\n\r\nLarry\r\n--AaB03x\r\nContent-Disposition: form-data; name=\"file01\"; filename=\"file1.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n--AaB03x--\r\n";

    #[test]
    fn test_get_uses_query_string() {
        let meta = RequestMeta::new(Method::GET).query_string("a=1&a=2");
        let form = Form::from_request(&meta, &b"ignored=1"[..]).unwrap();

        assert_eq!(form.params().get("a").len(), 2);
        assert!(!form.has_key("ignored"));
        assert!(!form.is_multipart());
    }

    #[test]
    fn test_head_without_query_string() {
        let form = Form::from_request(&RequestMeta::new(Method::HEAD), std::io::empty()).unwrap();
        assert!(form.params().is_empty());
    }

    #[test]
    fn test_post_urlencoded_reads_declared_length() {
        let meta = RequestMeta::new(Method::POST)
            .content_type("application/x-www-form-urlencoded")
            .content_length(7);
        let form = Form::from_request(&meta, &b"a=1&b=2&c=3"[..]).unwrap();

        assert_eq!(form.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_post_multipart() {
        let meta = RequestMeta::new(Method::POST)
            .content_type("multipart/form-data; boundary=AaB03x")
            .content_length(MULTIPART_BODY.len() as u64);
        let form = Form::from_request(&meta, MULTIPART_BODY.as_bytes()).unwrap();

        assert!(form.is_multipart());
        assert_eq!(form.get("submit-name").as_text(), Some("Larry"));
        assert_eq!(form.get("file01").original_filename(), "file1.txt");
        assert_eq!(form.file("file01").unwrap().bytes().unwrap(), b"hello");
        assert_eq!(form.files().count(), 1);
    }

    #[test]
    fn test_post_multipart_quoted_boundary() {
        let meta = RequestMeta::new(Method::POST)
            .content_type("multipart/form-data; boundary=\"AaB03x\"")
            .content_length(MULTIPART_BODY.len() as u64);
        let form = Form::from_request(&meta, MULTIPART_BODY.as_bytes()).unwrap();

        assert!(form.is_multipart());
        assert_eq!(form.get("submit-name").as_text(), Some("Larry"));
    }

    #[test]
    fn test_post_multipart_boundary_with_non_token_chars() {
        for boundary in ["----=_Part_0_123", "abc/def", "a:b", "(x)"] {
            let body = format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhi\r\n--{b}--\r\n",
                b = boundary
            );
            let meta = RequestMeta::new(Method::POST)
                .content_type(format!("multipart/form-data; boundary={}", boundary))
                .content_length(body.len() as u64);
            let form = Form::from_request(&meta, body.as_bytes()).unwrap();

            assert!(form.is_multipart(), "{}", boundary);
            assert_eq!(form.keys().collect::<Vec<_>>(), vec!["note"], "{}", boundary);
            assert_eq!(form.get("note").as_text(), Some("hi"), "{}", boundary);
        }
    }

    #[test]
    fn test_post_multipart_too_large() {
        let meta = RequestMeta::new(Method::POST)
            .content_type("multipart/form-data; boundary=AaB03x")
            .content_length(128 * 1024 * 1024 + 1);

        assert_eq!(
            Form::from_request(&meta, std::io::empty()).unwrap_err(),
            crate::Error::TooLarge {
                content_length: 128 * 1024 * 1024 + 1,
                limit: 128 * 1024 * 1024
            }
        );
    }

    #[test]
    fn test_offline_mode() {
        let form = Form::from_request(&RequestMeta::new(Method::PUT), std::io::empty()).unwrap();
        assert_eq!(form.get("offline").as_text(), Some("true"));

        let meta = RequestMeta::new(Method::OPTIONS).offline_query("x=1");
        let form = Form::from_request(&meta, std::io::empty()).unwrap();
        assert_eq!(form.get("x").as_text(), Some("1"));
    }

    #[test]
    fn test_set_params() {
        let meta = RequestMeta::new(Method::GET).query_string("a=1");
        let mut form = Form::from_request(&meta, std::io::empty()).unwrap();

        form.set_params(vec![("b", vec![Value::from("2")])]);
        assert!(!form.has_key("a"));
        assert_eq!(form.get("b").as_text(), Some("2"));
        assert_eq!(form.get("a").as_text(), Some(""));
    }
}
