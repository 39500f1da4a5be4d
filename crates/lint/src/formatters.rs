//! Result formatters
//!
//! Each formatter turns the result of one verification into text. A report
//! over several files is `start_format`, then `format_results` per file,
//! then `end_format`.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::Serialize;

use crate::error::LintError;
use crate::reporter::LintResult;

/// Trait for output formats
pub trait Formatter: Send + Sync {
    /// Id used to select the format
    fn id(&self) -> &'static str;

    /// Human readable name
    fn name(&self) -> &'static str;

    /// Text before the first file
    fn start_format(&self) -> String {
        String::new()
    }

    /// Text after the last file
    fn end_format(&self) -> String {
        String::new()
    }

    /// Format the messages of one file
    fn format_results(&self, result: &LintResult, filename: &str) -> Result<String, LintError>;
}

/// Every built-in formatter
pub fn defaults() -> Vec<Box<dyn Formatter>> {
    vec![
        Box::new(Text),
        Box::new(Compact),
        Box::new(LintXml),
        Box::new(CsslintXml),
        Box::new(CheckstyleXml),
        Box::new(Json),
    ]
}

/// Final path component of `filename`
fn short_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human readable report
pub struct Text;

impl Formatter for Text {
    fn id(&self) -> &'static str {
        "text"
    }

    fn name(&self) -> &'static str {
        "Plain Text"
    }

    fn format_results(&self, result: &LintResult, filename: &str) -> Result<String, LintError> {
        let messages = &result.messages;
        if messages.is_empty() {
            return Ok(format!("\n\nnisaba: No errors in {}.", filename));
        }

        let mut output = if messages.len() == 1 {
            format!("\n\nnisaba: There is 1 problem in {}.", filename)
        } else {
            format!("\n\nnisaba: There are {} problems in {}.", messages.len(), filename)
        };
        let short = short_name(filename);

        for (i, message) in messages.iter().enumerate() {
            output.push_str(&format!("\n\n{}", short));
            match message.position {
                Some(position) if !message.rollup => {
                    output.push_str(&format!("\n{}: {} at {}", i + 1, message.severity, position));
                    output.push_str(&format!("\n{}", message.message));
                    output.push_str(&format!("\n{}", message.evidence.as_deref().unwrap_or_default()));
                }
                _ => {
                    output.push_str(&format!("\n{}: {}", i + 1, message.severity));
                    output.push_str(&format!("\n{}", message.message));
                }
            }
        }
        Ok(output)
    }
}

/// One line per message
pub struct Compact;

impl Formatter for Compact {
    fn id(&self) -> &'static str {
        "compact"
    }

    fn name(&self) -> &'static str {
        "Compact, 'porcelain' format"
    }

    fn format_results(&self, result: &LintResult, filename: &str) -> Result<String, LintError> {
        if result.messages.is_empty() {
            return Ok(format!("{}: Lint Free!", filename));
        }

        let mut output = String::new();
        for message in &result.messages {
            let severity = capitalize(message.severity.as_str());
            match message.position {
                Some(position) if !message.rollup => output.push_str(&format!(
                    "{}: {}, {} - {}\n",
                    filename, position, severity, message.message
                )),
                _ => output.push_str(&format!("{}: {} - {}\n", filename, severity, message.message)),
            }
        }
        Ok(output)
    }
}

/// XML written into memory
struct XmlOutput {
    writer: Writer<Vec<u8>>,
}

impl XmlOutput {
    fn new() -> Self {
        Self { writer: Writer::new(Vec::new()) }
    }

    fn declaration(&mut self) -> Result<(), LintError> {
        let decl = BytesDecl::new("1.0", Some("utf-8"), None);
        self.write(Event::Decl(decl))
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), LintError> {
        self.write(Event::Start(element(name, attributes)))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), LintError> {
        self.write(Event::Empty(element(name, attributes)))
    }

    fn close(&mut self, name: &str) -> Result<(), LintError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), LintError> {
        self.writer
            .write_event(event)
            .map_err(|e| LintError::Xml(e.to_string()))
    }

    fn finish(self) -> Result<String, LintError> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| LintError::Xml(e.to_string()))
    }
}

/// Element with attributes in the given order; values are escaped
fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for &attribute in attributes {
        start.push_attribute(attribute);
    }
    start
}

/// XML declaration followed by the opening root tag
fn xml_prologue(root: &str) -> String {
    let mut output = XmlOutput::new();
    let written = output.declaration().and_then(|_| output.open(root, &[]));
    written.and_then(|_| output.finish()).unwrap_or_default()
}

fn xml_epilogue(root: &str) -> String {
    let mut output = XmlOutput::new();
    output.close(root).and_then(|_| output.finish()).unwrap_or_default()
}

/// `<file>` with one `<issue>` per message, shared by the lint and csslint
/// XML formats
fn issue_file(result: &LintResult, filename: &str) -> Result<String, LintError> {
    if result.messages.is_empty() {
        return Ok(String::new());
    }

    let mut output = XmlOutput::new();
    output.open("file", &[("name", filename)])?;
    for message in &result.messages {
        let position = message.position.filter(|_| !message.rollup);
        let line = position.map(|p| p.line.to_string());
        let column = position.map(|p| p.column.to_string());
        let evidence = message.evidence.as_deref().unwrap_or_default();

        let mut attributes = Vec::with_capacity(5);
        if let (Some(line), Some(column)) = (&line, &column) {
            attributes.push(("line", line.as_str()));
            attributes.push(("char", column.as_str()));
        }
        attributes.push(("severity", message.severity.as_str()));
        attributes.push(("reason", message.message.as_str()));
        attributes.push(("evidence", evidence));
        output.empty("issue", &attributes)?;
    }
    output.close("file")?;
    output.finish()
}

/// Lint XML format
pub struct LintXml;

impl Formatter for LintXml {
    fn id(&self) -> &'static str {
        "lint-xml"
    }

    fn name(&self) -> &'static str {
        "Lint XML format"
    }

    fn start_format(&self) -> String {
        xml_prologue("lint")
    }

    fn end_format(&self) -> String {
        xml_epilogue("lint")
    }

    fn format_results(&self, result: &LintResult, filename: &str) -> Result<String, LintError> {
        issue_file(result, filename)
    }
}

/// Same shape as [`LintXml`] under a `<csslint>` root
pub struct CsslintXml;

impl Formatter for CsslintXml {
    fn id(&self) -> &'static str {
        "csslint-xml"
    }

    fn name(&self) -> &'static str {
        "CSSLint XML format"
    }

    fn start_format(&self) -> String {
        xml_prologue("csslint")
    }

    fn end_format(&self) -> String {
        xml_epilogue("csslint")
    }

    fn format_results(&self, result: &LintResult, filename: &str) -> Result<String, LintError> {
        issue_file(result, filename)
    }
}

/// Checkstyle XML format, rollups left out
pub struct CheckstyleXml;

impl Formatter for CheckstyleXml {
    fn id(&self) -> &'static str {
        "checkstyle-xml"
    }

    fn name(&self) -> &'static str {
        "Checkstyle XML format"
    }

    fn start_format(&self) -> String {
        xml_prologue("checkstyle")
    }

    fn end_format(&self) -> String {
        xml_epilogue("checkstyle")
    }

    fn format_results(&self, result: &LintResult, filename: &str) -> Result<String, LintError> {
        if result.messages.is_empty() {
            return Ok(String::new());
        }

        let mut output = XmlOutput::new();
        output.open("file", &[("name", filename)])?;
        for message in result.messages.iter().filter(|m| !m.rollup) {
            let Some(position) = message.position else {
                continue;
            };
            let source = message
                .rule
                .map(|rule| format!("nisaba.{}", rule.name.replace(' ', "")))
                .unwrap_or_default();
            let line = position.line.to_string();
            let column = position.column.to_string();
            output.empty(
                "error",
                &[
                    ("line", line.as_str()),
                    ("column", column.as_str()),
                    ("severity", message.severity.as_str()),
                    ("message", message.message.as_str()),
                    ("source", source.as_str()),
                ],
            )?;
        }
        output.close("file")?;
        output.finish()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    filename: &'a str,
    #[serde(flatten)]
    result: &'a LintResult,
}

/// One JSON object per file
pub struct Json;

impl Formatter for Json {
    fn id(&self) -> &'static str {
        "json"
    }

    fn name(&self) -> &'static str {
        "JSON"
    }

    fn format_results(&self, result: &LintResult, filename: &str) -> Result<String, LintError> {
        let report = JsonReport { filename, result };
        Ok(serde_json::to_string(&report)? + "\n")
    }
}
