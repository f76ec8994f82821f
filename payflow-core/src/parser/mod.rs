use crate::document::WorkflowDocument;
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: WorkflowDocument,
    pub format: DocumentFormat,
}

pub fn parse_document_str(input: &str, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    match format {
        DocumentFormat::Json => Ok(ParsedDocument {
            document: serde_json::from_str(input)?,
            format,
        }),
        DocumentFormat::Yaml => Ok(ParsedDocument {
            document: serde_yaml::from_str(input)?,
            format,
        }),
        DocumentFormat::Auto => parse_document_auto(input),
    }
}

fn parse_document_auto(input: &str) -> Result<ParsedDocument, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::UnknownFormat);
    }

    // JSON always starts with `{` or `[`; try it first there and report its error.
    let trimmed = input.trim_start();
    let looks_like_json = trimmed.starts_with('{') || trimmed.starts_with('[');

    let json = || serde_json::from_str::<WorkflowDocument>(input);
    let yaml = || serde_yaml::from_str::<WorkflowDocument>(input);

    if looks_like_json {
        return match json() {
            Ok(document) => Ok(ParsedDocument {
                document,
                format: DocumentFormat::Json,
            }),
            Err(e) => yaml()
                .map(|document| ParsedDocument {
                    document,
                    format: DocumentFormat::Yaml,
                })
                .map_err(|_| ParseError::Json(e)),
        };
    }

    match yaml() {
        Ok(document) => Ok(ParsedDocument {
            document,
            format: DocumentFormat::Yaml,
        }),
        Err(e) => json()
            .map(|document| ParsedDocument {
                document,
                format: DocumentFormat::Json,
            })
            .map_err(|_| ParseError::Yaml(e)),
    }
}
