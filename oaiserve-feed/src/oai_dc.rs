// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Unqualified Dublin Core (`oai_dc`).

use oaiserve_store_db::{MetadataValue, Record};

use crate::format::MetadataFormat;
use crate::xml::XmlWriter;

const OAI_DC_NS: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";
const OAI_DC_SCHEMA: &str = "http://www.openarchives.org/OAI/2.0/oai_dc.xsd";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The fifteen Dublin Core elements, in schema order. Each is filled from
/// the metadata field of the same name.
const DC_FIELDS: [&str; 15] = [
    "title",
    "creator",
    "subject",
    "description",
    "publisher",
    "contributor",
    "date",
    "type",
    "format",
    "identifier",
    "source",
    "language",
    "relation",
    "coverage",
    "rights",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct OaiDc;

impl MetadataFormat for OaiDc {
    fn prefix(&self) -> &str {
        "oai_dc"
    }

    fn namespace(&self) -> &str {
        OAI_DC_NS
    }

    fn schema_location(&self) -> &str {
        OAI_DC_SCHEMA
    }

    fn write(&self, out: &mut XmlWriter, record: &Record) {
        let schema_location = format!("{OAI_DC_NS} {OAI_DC_SCHEMA}");
        out.start(
            "oai_dc:dc",
            &[
                ("xmlns:oai_dc", OAI_DC_NS),
                ("xmlns:dc", DC_NS),
                ("xmlns:xsi", XSI_NS),
                ("xsi:schemaLocation", &schema_location),
            ],
        );
        for field in DC_FIELDS {
            let name = format!("dc:{field}");
            for value in record.values(field) {
                out.element(&name, &scalar_text(value));
            }
        }
        out.end("oai_dc:dc");
    }
}

fn scalar_text(value: &MetadataValue) -> String {
    match value {
        MetadataValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use oaiserve_store_db::Metadata;
    use serde_json::json;

    #[test]
    fn test_write_fields() {
        let record = Record {
            id: "id:1".into(),
            modified: DateTime::<Utc>::UNIX_EPOCH,
            deleted: false,
            sets: vec![],
            metadata: Metadata::from([
                ("title".to_string(), vec![json!("Spam & Eggs")]),
                ("creator".to_string(), vec![json!("Doe, J."), json!("Roe, R.")]),
                ("date".to_string(), vec![json!(2008)]),
                ("internal_note".to_string(), vec![json!("not dublin core")]),
            ]),
        };

        let mut out = XmlWriter::new();
        OaiDc.write(&mut out, &record);
        let xml = out.into_string();

        assert!(xml.starts_with("<oai_dc:dc xmlns:oai_dc="));
        assert!(xml.contains("<dc:title>Spam &#38; Eggs</dc:title>"));
        assert_eq!(xml.matches("<dc:creator>").count(), 2);
        assert!(xml.contains("<dc:date>2008</dc:date>"));
        assert!(!xml.contains("not dublin core"));
        // Schema order: title before creator before date.
        assert!(xml.find("dc:title").unwrap() < xml.find("dc:creator").unwrap());
        assert!(xml.ends_with("</oai_dc:dc>"));
    }
}
