// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Decoding of OAI-PMH request arguments.

use std::collections::BTreeMap;

use crate::datestamp::Datestamp;
use crate::error::{OaiError, Result};
use crate::server::ListRequest;

/// A decoded, validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OaiRequest {
    Identify,
    ListMetadataFormats { identifier: Option<String> },
    ListSets,
    ListIdentifiers(ListRequest),
    ListRecords(ListRequest),
    GetRecord {
        metadata_prefix: String,
        identifier: String,
    },
}

impl OaiRequest {
    pub fn verb(&self) -> &'static str {
        match self {
            OaiRequest::Identify => "Identify",
            OaiRequest::ListMetadataFormats { .. } => "ListMetadataFormats",
            OaiRequest::ListSets => "ListSets",
            OaiRequest::ListIdentifiers(_) => "ListIdentifiers",
            OaiRequest::ListRecords(_) => "ListRecords",
            OaiRequest::GetRecord { .. } => "GetRecord",
        }
    }

    /// Decode `verb` and its arguments from query or form pairs.
    pub fn parse(params: &[(String, String)]) -> Result<Self> {
        let mut args = BTreeMap::new();
        let mut verbs = Vec::new();
        for (name, value) in params {
            if name == "verb" {
                verbs.push(value.as_str());
            } else if args.insert(name.as_str(), value.as_str()).is_some() {
                return Err(OaiError::bad_argument(format!(
                    "Argument {name} is repeated"
                )));
            }
        }
        let verb = match verbs.as_slice() {
            [verb] => *verb,
            [] => return Err(OaiError::BadVerb("The verb argument is missing".into())),
            _ => return Err(OaiError::BadVerb("The verb argument is repeated".into())),
        };

        match verb {
            "Identify" => {
                Arguments::new(args, &[], &[])?;
                Ok(OaiRequest::Identify)
            }
            "ListMetadataFormats" => {
                let mut args = Arguments::new(args, &[], &["identifier"])?;
                Ok(OaiRequest::ListMetadataFormats {
                    identifier: args.take("identifier"),
                })
            }
            "ListSets" => {
                Arguments::new(args, &[], &["resumptionToken"])?.reject_resumption_token()?;
                Ok(OaiRequest::ListSets)
            }
            "ListIdentifiers" | "ListRecords" => {
                let list = Arguments::new(
                    args,
                    &["metadataPrefix"],
                    &["from", "until", "set", "resumptionToken"],
                )?
                .reject_resumption_token()?
                .list_request()?;
                Ok(if verb == "ListRecords" {
                    OaiRequest::ListRecords(list)
                } else {
                    OaiRequest::ListIdentifiers(list)
                })
            }
            "GetRecord" => {
                let mut args = Arguments::new(args, &["identifier", "metadataPrefix"], &[])?;
                Ok(OaiRequest::GetRecord {
                    metadata_prefix: args.take("metadataPrefix").unwrap_or_default(),
                    identifier: args.take("identifier").unwrap_or_default(),
                })
            }
            other => Err(OaiError::BadVerb(format!("Illegal verb {other}"))),
        }
    }
}

/// Arguments of one verb, checked against its required and optional names.
struct Arguments<'a> {
    args: BTreeMap<&'a str, &'a str>,
}

impl<'a> Arguments<'a> {
    fn new(
        args: BTreeMap<&'a str, &'a str>,
        required: &[&str],
        optional: &[&str],
    ) -> Result<Self> {
        if let Some(name) = args
            .keys()
            .find(|name| !required.contains(*name) && !optional.contains(*name))
        {
            return Err(OaiError::bad_argument(format!("Illegal argument {name}")));
        }
        // resumptionToken is exclusive, so it stands in for required arguments.
        if !args.contains_key("resumptionToken") {
            if let Some(name) = required.iter().find(|name| !args.contains_key(*name)) {
                return Err(OaiError::bad_argument(format!(
                    "Missing required argument {name}"
                )));
            }
        }
        Ok(Self { args })
    }

    fn take(&mut self, name: &str) -> Option<String> {
        self.args.remove(name).map(str::to_owned)
    }

    /// Tokens are never issued, so any token is invalid.
    fn reject_resumption_token(self) -> Result<Self> {
        match self.args.get("resumptionToken") {
            Some(_) if self.args.len() > 1 => Err(OaiError::bad_argument(
                "resumptionToken is an exclusive argument",
            )),
            Some(token) => Err(OaiError::BadResumptionToken((*token).to_owned())),
            None => Ok(self),
        }
    }

    fn list_request(mut self) -> Result<ListRequest> {
        let from = self.datestamp("from")?;
        let until = self.datestamp("until")?;
        if let (Some(from), Some(until)) = (&from, &until) {
            if from.granularity != until.granularity {
                return Err(OaiError::bad_argument(
                    "from and until have different granularities",
                ));
            }
        }
        Ok(ListRequest {
            metadata_prefix: self.take("metadataPrefix").unwrap_or_default(),
            set: self.take("set"),
            from: from.map(|d| d.as_from()),
            until: until.map(|d| d.as_until()),
            cursor: 0,
            batch_size: None,
        })
    }

    fn datestamp(&self, name: &str) -> Result<Option<Datestamp>> {
        self.args
            .get(name)
            .map(|value| {
                Datestamp::parse(value).ok_or_else(|| {
                    OaiError::bad_argument(format!("Argument {name} is not a valid datestamp: {value}"))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn code(pairs: &[(&str, &str)]) -> Option<&'static str> {
        OaiRequest::parse(&params(pairs)).err().and_then(|e| e.code())
    }

    #[rstest]
    #[case::no_verb(&[], "badVerb")]
    #[case::unknown_verb(&[("verb", "Frobnicate")], "badVerb")]
    #[case::repeated_verb(&[("verb", "Identify"), ("verb", "Identify")], "badVerb")]
    #[case::identify_extra(&[("verb", "Identify"), ("set", "x")], "badArgument")]
    #[case::list_missing_prefix(&[("verb", "ListRecords")], "badArgument")]
    #[case::list_bad_date(&[("verb", "ListRecords"), ("metadataPrefix", "oai_dc"), ("from", "yesterday")], "badArgument")]
    #[case::list_mixed_granularity(&[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc"), ("from", "2004-01-01"), ("until", "2004-01-01T00:00:00Z")], "badArgument")]
    #[case::repeated_argument(&[("verb", "ListRecords"), ("metadataPrefix", "oai_dc"), ("metadataPrefix", "oai_dc")], "badArgument")]
    #[case::get_missing_identifier(&[("verb", "GetRecord"), ("metadataPrefix", "oai_dc")], "badArgument")]
    #[case::token(&[("verb", "ListRecords"), ("resumptionToken", "abc")], "badResumptionToken")]
    #[case::token_sets(&[("verb", "ListSets"), ("resumptionToken", "abc")], "badResumptionToken")]
    #[case::token_not_exclusive(&[("verb", "ListRecords"), ("metadataPrefix", "oai_dc"), ("resumptionToken", "abc")], "badArgument")]
    fn test_rejected(#[case] pairs: &[(&str, &str)], #[case] expected: &str) {
        assert_eq!(code(pairs), Some(expected));
    }

    #[test]
    fn test_list_request() {
        let request = OaiRequest::parse(&params(&[
            ("verb", "ListRecords"),
            ("metadataPrefix", "oai_dc"),
            ("set", "publications"),
            ("from", "2004-01-01"),
            ("until", "2006-01-01"),
        ]))
        .unwrap();
        let OaiRequest::ListRecords(list) = request else {
            panic!("expected ListRecords");
        };
        assert_eq!(list.metadata_prefix, "oai_dc");
        assert_eq!(list.set.as_deref(), Some("publications"));
        assert_eq!(list.from, Some(Utc.with_ymd_and_hms(2004, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(
            list.until,
            Some(Utc.with_ymd_and_hms(2006, 1, 1, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn test_simple_verbs() {
        assert_eq!(
            OaiRequest::parse(&params(&[("verb", "Identify")])).unwrap(),
            OaiRequest::Identify
        );
        assert_eq!(
            OaiRequest::parse(&params(&[("verb", "ListMetadataFormats"), ("identifier", "oai:id:1")]))
                .unwrap(),
            OaiRequest::ListMetadataFormats {
                identifier: Some("oai:id:1".into())
            }
        );
        assert_eq!(
            OaiRequest::parse(&params(&[
                ("verb", "GetRecord"),
                ("identifier", "oai:id:1"),
                ("metadataPrefix", "oai_dc"),
            ]))
            .unwrap(),
            OaiRequest::GetRecord {
                metadata_prefix: "oai_dc".into(),
                identifier: "oai:id:1".into()
            }
        );
    }
}
