use crate::constants;
use crate::helpers;
use crate::percent;
use regex::bytes::Regex;

/// The `name` and `filename` of a part.
///
/// Both default to empty. The file name is percent-decoded.
pub(crate) struct ContentDisposition {
    pub(crate) field_name: String,
    pub(crate) file_name: String,
}

impl ContentDisposition {
    /// Extracts both parameters from a part's raw header block.
    pub fn parse(block: &[u8]) -> ContentDisposition {
        let field_name = param_value(&constants::CONTENT_DISPOSITION_FIELD_NAME_RE, block)
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .unwrap_or_default();

        let file_name = param_value(&constants::CONTENT_DISPOSITION_FILE_NAME_RE, block)
            .map(percent::unescape)
            .unwrap_or_default();

        ContentDisposition { field_name, file_name }
    }
}

fn param_value<'a>(re: &Regex, block: &'a [u8]) -> Option<&'a [u8]> {
    re.captures(block).and_then(|cap| {
        cap.get(1)
            .map(|m| m.as_bytes())
            .or_else(|| cap.get(2).map(|m| helpers::trim_bytes(m.as_bytes())))
    })
}
