use crate::field::FilePart;
use std::borrow::Cow;
use std::collections::HashMap;

static EMPTY_TEXT: Value = Value::Text(String::new());

/// A single decoded parameter value.
#[derive(Debug)]
pub enum Value {
    /// A plain form value.
    Text(String),
    /// An uploaded file.
    File(FilePart),
}

impl Value {
    /// The text of a plain value, `None` for a file.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::File(_) => None,
        }
    }

    /// The uploaded file, `None` for a plain value.
    pub fn as_file(&self) -> Option<&FilePart> {
        match self {
            Value::Text(_) => None,
            Value::File(file) => Some(file),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Value::File(_))
    }

    /// The client-side file name; empty for a plain value.
    pub fn original_filename(&self) -> &str {
        match self {
            Value::Text(_) => "",
            Value::File(file) => file.file_name(),
        }
    }

    /// The part's `Content-Type`; empty for a plain value.
    pub fn content_type(&self) -> &str {
        match self {
            Value::Text(_) => "",
            Value::File(file) => file.content_type(),
        }
    }

    /// The raw content of the value.
    pub fn bytes(&self) -> crate::Result<Cow<'_, [u8]>> {
        match self {
            Value::Text(text) => Ok(Cow::Borrowed(text.as_bytes())),
            Value::File(file) => file.bytes().map(Cow::Owned),
        }
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<FilePart> for Value {
    fn from(file: FilePart) -> Self {
        Value::File(file)
    }
}

/// An ordered, multivalued parameter store.
///
/// Keys iterate in the order they first appeared. Looking up an absent key
/// yields an empty sequence rather than an error.
///
/// # Examples
///
/// ```
/// let params = cgi_params::parse_query("a=1&a=2&b=");
///
/// assert_eq!(params.keys().collect::<Vec<_>>(), vec!["a", "b"]);
/// assert_eq!(params.text("a"), "1");
/// assert_eq!(params.get("a").len(), 2);
/// assert!(params.get("missing").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Params {
    entries: Vec<(String, Vec<Value>)>,
    index: HashMap<String, usize>,
}

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    fn entry_mut(&mut self, name: &str) -> &mut Vec<Value> {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.entries.push((name.to_owned(), Vec::new()));
                let idx = self.entries.len() - 1;
                self.index.insert(name.to_owned(), idx);
                idx
            }
        };

        &mut self.entries[idx].1
    }

    /// Appends a value under `name`, after any values already there.
    pub fn append<V: Into<Value>>(&mut self, name: &str, value: V) {
        self.entry_mut(name).push(value.into());
    }

    /// Makes `name` present with an empty sequence, dropping any values it had.
    pub fn set_empty(&mut self, name: &str) {
        self.entry_mut(name).clear();
    }

    /// All values stored under `name`, empty if the key is absent.
    pub fn get(&self, name: &str) -> &[Value] {
        self.index
            .get(name)
            .map(|&idx| self.entries[idx].1.as_slice())
            .unwrap_or(&[])
    }

    /// The first value under `name`, or an empty text value.
    pub fn get_first(&self, name: &str) -> &Value {
        self.get(name).first().unwrap_or(&EMPTY_TEXT)
    }

    /// The first value under `name` as text; empty if it is absent or a file.
    pub fn text(&self, name: &str) -> &str {
        self.get_first(name).as_text().unwrap_or("")
    }

    /// Parameter names in first-appearance order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over every name with its values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clears the store and loads `mapping` in its place.
    pub fn replace_all<I, K>(&mut self, mapping: I)
    where
        I: IntoIterator<Item = (K, Vec<Value>)>,
        K: Into<String>,
    {
        self.entries.clear();
        self.index.clear();

        for (name, values) in mapping {
            let name = name.into();
            self.entry_mut(&name).extend(values);
        }
    }

    /// Every uploaded file with its field name, in body order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &FilePart)> {
        self.entries.iter().flat_map(|(name, values)| {
            values
                .iter()
                .filter_map(Value::as_file)
                .map(move |file| (name.as_str(), file))
        })
    }

    /// The last file uploaded under `name`.
    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.get(name).iter().rev().find_map(Value::as_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(params: &Params, name: &str) -> Vec<String> {
        params
            .get(name)
            .iter()
            .map(|v| v.as_text().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn test_append_keeps_order() {
        let mut params = Params::new();
        params.append("b", "1");
        params.append("a", "2");
        params.append("b", "3");

        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(texts(&params, "b"), vec!["1", "3"]);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_absent_key_defaults() {
        let params = Params::new();
        assert!(params.get("nope").is_empty());
        assert_eq!(params.get_first("nope").as_text(), Some(""));
        assert_eq!(params.text("nope"), "");
        assert!(!params.has_key("nope"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_set_empty() {
        let mut params = Params::new();
        params.append("flag", "x");
        params.set_empty("flag");

        assert!(params.has_key("flag"));
        assert!(params.get("flag").is_empty());
        assert_eq!(params.text("flag"), "");
    }

    #[test]
    fn test_replace_all() {
        let mut params = Params::new();
        params.append("old", "1");

        params.replace_all(vec![
            ("x", vec![Value::from("1"), Value::from("2")]),
            ("y", Vec::new()),
        ]);

        assert!(!params.has_key("old"));
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(texts(&params, "x"), vec!["1", "2"]);
        assert!(params.has_key("y"));
    }

    #[test]
    fn test_text_value_accessors() {
        let value = Value::from("abc");
        assert_eq!(value.original_filename(), "");
        assert_eq!(value.content_type(), "");
        assert_eq!(value.bytes().unwrap().as_ref(), b"abc");
        assert!(!value.is_file());
        assert!(value.as_file().is_none());
    }
}
