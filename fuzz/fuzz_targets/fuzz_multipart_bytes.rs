#![no_main]

use cgi_params::{Constraints, Multipart, SinkPolicy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let constraints = Constraints::new().sink_factory(SinkPolicy::Memory);
    let multipart = Multipart::with_constraints(data, "X-BOUNDARY", data.len() as u64, constraints);

    if let Ok(params) = multipart.decode() {
        for (_, file) in params.files() {
            let _ = file.bytes();
        }
    }
});
