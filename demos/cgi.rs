//! Decodes the parameters of a CGI request and prints them.
//!
//! Run it the way a web server would:
//!
//! ```sh
//! REQUEST_METHOD=GET QUERY_STRING='a=1&a=2;b' cargo run --example cgi
//! ```
//!
//! Without `REQUEST_METHOD` it runs in offline mode.

use cgi_params::http::Method;
use cgi_params::{Form, RequestMeta, Value};
use std::env;
use std::io;

fn request_meta_from_env() -> Result<RequestMeta, Box<dyn std::error::Error>> {
    let method = match env::var("REQUEST_METHOD") {
        Ok(method) => Method::from_bytes(method.as_bytes())?,
        Err(_) => Method::from_bytes(b"OFFLINE")?,
    };

    let mut meta = RequestMeta::new(method);

    if let Ok(content_type) = env::var("CONTENT_TYPE") {
        meta = meta.content_type(content_type);
    }
    if let Ok(content_length) = env::var("CONTENT_LENGTH") {
        meta = meta.content_length(content_length.trim().parse()?);
    }
    if let Ok(query_string) = env::var("QUERY_STRING") {
        meta = meta.query_string(query_string);
    }

    Ok(meta)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let meta = request_meta_from_env()?;
    let form = Form::from_request(&meta, io::stdin().lock())?;

    println!("multipart: {}", form.is_multipart());

    for (name, values) in form.params().iter() {
        let rendered: Vec<String> = values
            .iter()
            .map(|value| match value {
                Value::Text(text) => format!("{:?}", text),
                Value::File(file) => format!(
                    "<file {:?}, {} bytes, {:?}>",
                    file.file_name(),
                    file.size(),
                    file.content_type()
                ),
            })
            .collect();

        println!("{} => [{}]", name, rendered.join(", "));
    }

    Ok(())
}
