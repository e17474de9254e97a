// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! OAI-PMH 2.0 response documents.

use chrono::{DateTime, Utc};
use oaiserve_store_db::{OaiSet, Record};

use crate::datestamp::format_datestamp;
use crate::error::OaiError;
use crate::format::MetadataFormat;
use crate::request::OaiRequest;
use crate::server::{FormatInfo, Header, Identify};
use crate::xml::XmlWriter;

const OAI_NS: &str = "http://www.openarchives.org/OAI/2.0/";
const OAI_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/ http://www.openarchives.org/OAI/2.0/OAI-PMH.xsd";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The body of a successful response.
pub enum Payload<'a> {
    Identify(Identify),
    ListMetadataFormats(Vec<FormatInfo>),
    ListSets(Vec<OaiSet>),
    ListIdentifiers(Vec<Header>),
    ListRecords {
        records: Vec<(Header, Record)>,
        format: &'a dyn MetadataFormat,
    },
    GetRecord {
        record: (Header, Record),
        format: &'a dyn MetadataFormat,
    },
}

/// Start the envelope: declaration, root element, `responseDate` and
/// `request`.
///
/// `request` carries the echoed arguments; it is `None` when the request
/// was rejected with `badVerb` or `badArgument`.
fn open(
    xml: &mut XmlWriter,
    now: DateTime<Utc>,
    base_url: &str,
    request: Option<&[(String, String)]>,
) {
    xml.declaration();
    xml.start(
        "OAI-PMH",
        &[
            ("xmlns", OAI_NS),
            ("xmlns:xsi", XSI_NS),
            ("xsi:schemaLocation", OAI_SCHEMA_LOCATION),
        ],
    );
    xml.element("responseDate", &format_datestamp(now));
    let attributes: Vec<(&str, &str)> = request
        .unwrap_or_default()
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    xml.element_with("request", &attributes, base_url);
}

pub fn render_error(
    now: DateTime<Utc>,
    base_url: &str,
    params: &[(String, String)],
    error: &OaiError,
) -> String {
    let code = error.code().unwrap_or("badArgument");
    let echo = !matches!(error, OaiError::BadVerb(_) | OaiError::BadArgument(_));

    let mut xml = XmlWriter::new();
    open(&mut xml, now, base_url, echo.then_some(params));
    xml.element_with("error", &[("code", code)], &error.to_string());
    xml.end("OAI-PMH");
    xml.into_string()
}

pub fn render(
    now: DateTime<Utc>,
    base_url: &str,
    request: &OaiRequest,
    params: &[(String, String)],
    payload: &Payload<'_>,
) -> String {
    let mut xml = XmlWriter::new();
    open(&mut xml, now, base_url, Some(params));

    let verb = request.verb();
    xml.start(verb, &[]);
    match payload {
        Payload::Identify(identify) => write_identify(&mut xml, identify),
        Payload::ListMetadataFormats(formats) => {
            for format in formats {
                xml.start("metadataFormat", &[]);
                xml.element("metadataPrefix", &format.prefix);
                xml.element("schema", &format.schema);
                xml.element("metadataNamespace", &format.namespace);
                xml.end("metadataFormat");
            }
        }
        Payload::ListSets(sets) => {
            for set in sets {
                xml.start("set", &[]);
                xml.element("setSpec", &set.id);
                xml.element("setName", &set.name);
                if let Some(description) = &set.description {
                    xml.start("setDescription", &[]);
                    write_dc_description(&mut xml, description);
                    xml.end("setDescription");
                }
                xml.end("set");
            }
        }
        Payload::ListIdentifiers(headers) => {
            for header in headers {
                write_header(&mut xml, header);
            }
        }
        Payload::ListRecords { records, format } => {
            for (header, record) in records {
                write_record(&mut xml, header, record, *format);
            }
        }
        Payload::GetRecord {
            record: (header, record),
            format,
        } => write_record(&mut xml, header, record, *format),
    }
    xml.end(verb);
    xml.end("OAI-PMH");
    xml.into_string()
}

fn write_identify(xml: &mut XmlWriter, identify: &Identify) {
    xml.element("repositoryName", &identify.repository_name);
    xml.element("baseURL", &identify.base_url);
    xml.element("protocolVersion", identify.protocol_version);
    for email in &identify.admin_emails {
        xml.element("adminEmail", email);
    }
    xml.element(
        "earliestDatestamp",
        &format_datestamp(identify.earliest_datestamp),
    );
    xml.element("deletedRecord", identify.deleted_record);
    xml.element("granularity", identify.granularity);
}

fn write_dc_description(xml: &mut XmlWriter, description: &str) {
    xml.start(
        "oai_dc:dc",
        &[
            ("xmlns:oai_dc", "http://www.openarchives.org/OAI/2.0/oai_dc/"),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ],
    );
    xml.element("dc:description", description);
    xml.end("oai_dc:dc");
}

fn write_header(xml: &mut XmlWriter, header: &Header) {
    if header.deleted {
        xml.start("header", &[("status", "deleted")]);
    } else {
        xml.start("header", &[]);
    }
    xml.element("identifier", &header.identifier);
    xml.element("datestamp", &format_datestamp(header.datestamp));
    for spec in &header.set_specs {
        xml.element("setSpec", spec);
    }
    xml.end("header");
}

/// Deleted records carry a header only.
fn write_record(xml: &mut XmlWriter, header: &Header, record: &Record, format: &dyn MetadataFormat) {
    xml.start("record", &[]);
    write_header(xml, header);
    if !header.deleted {
        xml.start("metadata", &[]);
        format.write(xml, record);
        xml.end("metadata");
    }
    xml.end("record");
}
