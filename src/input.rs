//! Input source resolution: single flag-driven call, piped plain-text lines, or piped JSON records.
//!
//! Piped sources are lazy, single-pass iterators over standard input. Items are yielded in
//! source order with their record index; decode failures surface as
//! [`RackError::MalformedInput`] carrying that index.

use crate::error::RackError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{self, BufRead};

/// Which invocation mode is active. Exactly one per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Parameters come from flags; one item.
    Single,
    /// One value of `field` per non-blank stdin line.
    Text { field: String },
    /// One JSON object per record on stdin.
    Json,
}

impl InputMode {
    pub const JSON_SELECTOR: &'static str = "json";

    /// Mode selected by the `--stdin` value (absent = single mode).
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector {
            None => InputMode::Single,
            Some(Self::JSON_SELECTOR) => InputMode::Json,
            Some(field) => InputMode::Text {
                field: field.to_string(),
            },
        }
    }

    pub fn is_piped(&self) -> bool {
        !matches!(self, InputMode::Single)
    }
}

/// What to do when a piped JSON record cannot be decoded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Keep and execute records decoded before the fault; stop at the fault.
    #[default]
    Abort,
    /// Report the malformed record in place and keep going where the input allows.
    Skip,
    /// Execute nothing if any record is malformed.
    Discard,
}

/// One piped input item.
#[derive(Debug, Clone, PartialEq)]
pub enum PipeItem {
    /// A single field value read from a plain-text line.
    Text { field: String, value: String },
    /// A full parameter record.
    Record(Map<String, Value>),
}

impl PipeItem {
    /// String value of `name`: the line itself for a matching text item, or the record field.
    pub fn field(&self, name: &str) -> Option<String> {
        match self {
            PipeItem::Text { field, value } => (field == name).then(|| value.clone()),
            PipeItem::Record(_) => match self.value(name)? {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            },
        }
    }

    /// Raw record value of `name`: exact key first, then case-insensitive, so rendered
    /// output (`Name`) feeds back in as input (`name`).
    pub fn value(&self, name: &str) -> Option<&Value> {
        let record = self.record()?;
        record.get(name).or_else(|| {
            record
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    pub fn record(&self) -> Option<&Map<String, Value>> {
        match self {
            PipeItem::Record(record) => Some(record),
            PipeItem::Text { .. } => None,
        }
    }

    /// Identifying text for error reports.
    pub fn label(&self, stdin_field: Option<&str>) -> String {
        match self {
            PipeItem::Text { value, .. } => value.clone(),
            PipeItem::Record(record) => stdin_field
                .and_then(|field| self.field(field))
                .unwrap_or_else(|| Value::Object(record.clone()).to_string()),
        }
    }
}

/// One logical input item.
#[derive(Debug, Clone, PartialEq)]
pub enum InputItem {
    /// The parsed flags themselves (single mode).
    Flags,
    Pipe(PipeItem),
}

pub type InputItems<'a> = Box<dyn Iterator<Item = Result<InputItem, RackError>> + Send + 'a>;

/// Resolve the item sequence for `mode`. `reader` is only consumed in piped modes.
pub fn resolve<'a, R>(mode: &InputMode, reader: R) -> InputItems<'a>
where
    R: BufRead + Send + 'a,
{
    match mode {
        InputMode::Single => Box::new(std::iter::once(Ok(InputItem::Flags))),
        InputMode::Text { field } => Box::new(
            TextLines::new(reader, field.clone()).map(|item| item.map(InputItem::Pipe)),
        ),
        InputMode::Json => {
            Box::new(JsonRecords::new(reader).map(|item| item.map(InputItem::Pipe)))
        }
    }
}

fn malformed(index: usize, message: impl Into<String>) -> RackError {
    RackError::MalformedInput {
        index,
        message: message.into(),
    }
}

/// Non-blank lines of a reader, one text item each.
pub struct TextLines<R> {
    lines: io::Lines<R>,
    field: String,
    index: usize,
    done: bool,
}

impl<R: BufRead> TextLines<R> {
    pub fn new(reader: R, field: String) -> Self {
        Self {
            lines: reader.lines(),
            field,
            index: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for TextLines<R> {
    type Item = Result<PipeItem, RackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(malformed(self.index, e.to_string())));
                }
                Some(Ok(line)) => {
                    let value = line.trim();
                    if value.is_empty() {
                        continue;
                    }
                    self.index += 1;
                    return Some(Ok(PipeItem::Text {
                        field: self.field.clone(),
                        value: value.to_string(),
                    }));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonForm {
    Unknown,
    Array,
    Lines,
    Done,
}

/// JSON records from a reader.
///
/// Two forms are accepted, chosen by the first significant byte:
/// - `[`: a top-level array whose elements are records. A fault ends the stream.
/// - `{`: newline-delimited objects. An object may span several lines (pretty-printed
///   output from a previous invocation); a fault only spoils the record it occurs in.
///   An unfinished record followed by a line opening a new top-level object (`{` in the
///   first column) is reported as malformed, and the new line starts the next record.
pub struct JsonRecords<R> {
    reader: R,
    form: JsonForm,
    index: usize,
    pending: Option<String>,
}

impl<R: BufRead> JsonRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            form: JsonForm::Unknown,
            index: 0,
            pending: None,
        }
    }

    fn fail(&mut self, message: impl Into<String>) -> Option<Result<PipeItem, RackError>> {
        self.form = JsonForm::Done;
        Some(Err(malformed(self.index, message)))
    }

    fn next_array_element(&mut self) -> Option<Result<PipeItem, RackError>> {
        let byte = match peek_significant(&mut self.reader) {
            Ok(Some(b)) => b,
            Ok(None) => return self.fail("unterminated JSON array"),
            Err(e) => return self.fail(e.to_string()),
        };
        let byte = match (byte, self.index) {
            (b']', _) => {
                self.reader.consume(1);
                self.form = JsonForm::Done;
                return None;
            }
            (b',', i) if i > 0 => {
                self.reader.consume(1);
                match peek_significant(&mut self.reader) {
                    Ok(Some(b)) => b,
                    Ok(None) => return self.fail("unterminated JSON array"),
                    Err(e) => return self.fail(e.to_string()),
                }
            }
            (b, 0) => b,
            (_, _) => return self.fail("expected `,` or `]` between array records"),
        };
        if byte != b'{' {
            return self.fail("record is not a JSON object");
        }
        let parsed = {
            let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
            Map::<String, Value>::deserialize(&mut de)
        };
        match parsed {
            Ok(record) => {
                self.index += 1;
                Some(Ok(PipeItem::Record(record)))
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn next_line_record(&mut self) -> Option<Result<PipeItem, RackError>> {
        let mut buffer = String::new();
        loop {
            let mut line = String::new();
            let read = match self.pending.take() {
                Some(pending) => {
                    line = pending;
                    Ok(line.len())
                }
                None => self.reader.read_line(&mut line),
            };
            match read {
                Ok(0) => {
                    self.form = JsonForm::Done;
                    if buffer.trim().is_empty() {
                        return None;
                    }
                    let index = self.index;
                    self.index += 1;
                    return Some(Err(malformed(index, "unexpected end of input")));
                }
                Ok(_) => {}
                Err(e) => return self.fail(e.to_string()),
            }
            if buffer.is_empty() && line.trim().is_empty() {
                continue;
            }
            if !buffer.is_empty() && line.starts_with('{') {
                let index = self.index;
                self.index += 1;
                self.pending = Some(line);
                return Some(Err(malformed(index, "unterminated JSON object")));
            }
            buffer.push_str(&line);
            let index = self.index;
            match serde_json::from_str::<Value>(&buffer) {
                Ok(Value::Object(record)) => {
                    self.index += 1;
                    return Some(Ok(PipeItem::Record(record)));
                }
                Ok(_) => {
                    self.index += 1;
                    return Some(Err(malformed(index, "record is not a JSON object")));
                }
                Err(e) if e.is_eof() => continue,
                Err(e) => {
                    self.index += 1;
                    return Some(Err(malformed(index, e.to_string())));
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for JsonRecords<R> {
    type Item = Result<PipeItem, RackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.form == JsonForm::Unknown {
            match peek_significant(&mut self.reader) {
                Ok(None) => {
                    self.form = JsonForm::Done;
                    return None;
                }
                Ok(Some(b'[')) => {
                    self.reader.consume(1);
                    self.form = JsonForm::Array;
                }
                Ok(Some(_)) => self.form = JsonForm::Lines,
                Err(e) => return self.fail(e.to_string()),
            }
        }
        match self.form {
            JsonForm::Array => self.next_array_element(),
            JsonForm::Lines => self.next_line_record(),
            JsonForm::Unknown | JsonForm::Done => None,
        }
    }
}

/// Skip whitespace and return the next byte without consuming it.
fn peek_significant<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let byte = buf[pos];
                reader.consume(pos);
                return Ok(Some(byte));
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}
