//! Translation of the CCSDS Orbit Ephemeris Message (OEM) XML document.
//!
//! This is the only place that knows the origin's document shape. The
//! relevant part looks like:
//!
//! ```text
//! ndm/oem/body/segment
//!     |-- metadata    START_TIME, STOP_TIME, OBJECT_NAME, REF_FRAME, ...
//!     +-- data
//!         |-- COMMENT ...
//!         +-- stateVector *   EPOCH, X, Y, Z, X_DOT, Y_DOT, Z_DOT
//! ```
//!
//! Only the first `segment` is read. Numeric state-vector children carry
//! a `units` attribute; a unit that contradicts km (position) or km/s
//! (velocity) is rejected rather than converted. Children with no typed
//! counterpart are kept verbatim in [`Epoch::extra`].

use std::collections::BTreeMap;

use iss_types::{Dataset, DatasetMetadata, Epoch, POSITION_UNITS, Timestamp, VELOCITY_UNITS, Vector3};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::Value;

use crate::error::StoreError;

const SEGMENT: &str = "segment";
const METADATA: &str = "metadata";
const STATE_VECTOR: &str = "stateVector";

/// Parse an OEM XML document into a [`Dataset`].
///
/// # Errors
///
/// Returns [`StoreError::MalformedDataset`] if the XML is not well formed,
/// the metadata lacks `START_TIME`/`STOP_TIME`, a state vector is missing
/// a field or carries an unparsable value, or the epochs are not strictly
/// ascending by timestamp.
pub fn parse_oem(xml: &str) -> Result<Dataset, StoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut units: Option<String> = None;
    let mut metadata_fields: BTreeMap<String, String> = BTreeMap::new();
    let mut record: Option<RecordBuilder> = None;
    let mut epochs: Vec<Epoch> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            malformed(format!("XML error at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => {
                let name = element_name(&start)?;
                if name == STATE_VECTOR {
                    record = Some(RecordBuilder::default());
                }
                units = units_attribute(&start)?;
                text.clear();
                path.push(name);
            }
            Event::Empty(start) => {
                let name = element_name(&start)?;
                let leaf_units = units_attribute(&start)?;
                if name == STATE_VECTOR {
                    return Err(malformed("stateVector is missing EPOCH".to_owned()));
                }
                if path.last().map(String::as_str) == Some(STATE_VECTOR) {
                    record_mut(&mut record)?.set(&name, leaf_units, "")?;
                }
            }
            Event::Text(content) => {
                let unescaped = content
                    .unescape()
                    .map_err(|e| malformed(format!("bad text content: {e}")))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => {
                let name = path
                    .pop()
                    .ok_or_else(|| malformed("unbalanced closing tag".to_owned()))?;
                let parent = path.last().map(String::as_str);
                let in_state_vector = parent == Some(STATE_VECTOR);
                let in_metadata = parent == Some(METADATA);

                if name == STATE_VECTOR {
                    let builder = record
                        .take()
                        .ok_or_else(|| malformed("stateVector closed twice".to_owned()))?;
                    epochs.push(builder.build()?);
                } else if in_state_vector {
                    record_mut(&mut record)?.set(&name, units.take(), text.trim())?;
                } else if in_metadata {
                    metadata_fields.insert(name, text.trim().to_owned());
                } else if name == SEGMENT {
                    break;
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let start_time = metadata_time(&mut metadata_fields, "START_TIME")?;
    let stop_time = metadata_time(&mut metadata_fields, "STOP_TIME")?;

    let dataset = Dataset {
        metadata: DatasetMetadata {
            start_time,
            stop_time,
            fields: metadata_fields,
        },
        epochs,
    };

    if !dataset.is_strictly_ordered() {
        return Err(malformed(
            "stateVector epochs are not in strictly ascending order".to_owned(),
        ));
    }

    tracing::debug!(
        epochs = dataset.len(),
        start = %dataset.metadata.start_time,
        stop = %dataset.metadata.stop_time,
        "OEM document parsed"
    );

    Ok(dataset)
}

const fn malformed(message: String) -> StoreError {
    StoreError::MalformedDataset(message)
}

fn element_name(start: &BytesStart<'_>) -> Result<String, StoreError> {
    std::str::from_utf8(start.local_name().as_ref())
        .map(str::to_owned)
        .map_err(|e| malformed(format!("element name is not UTF-8: {e}")))
}

fn units_attribute(start: &BytesStart<'_>) -> Result<Option<String>, StoreError> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(format!("bad attribute: {e}")))?;
        if attribute.key.local_name().as_ref() == b"units" {
            let value = attribute
                .unescape_value()
                .map_err(|e| malformed(format!("bad units attribute: {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn record_mut(record: &mut Option<RecordBuilder>) -> Result<&mut RecordBuilder, StoreError> {
    record
        .as_mut()
        .ok_or_else(|| malformed("state vector field outside a stateVector".to_owned()))
}

fn metadata_time(
    fields: &mut BTreeMap<String, String>,
    name: &str,
) -> Result<Timestamp, StoreError> {
    let text = fields
        .remove(name)
        .ok_or_else(|| malformed(format!("segment metadata is missing {name}")))?;
    text.parse()
        .map_err(|e| malformed(format!("metadata {name}: {e}")))
}

/// Fields of one `stateVector` collected while its children stream past.
#[derive(Default)]
struct RecordBuilder {
    epoch: Option<Timestamp>,
    position: [Option<f64>; 3],
    velocity: [Option<f64>; 3],
    extra: BTreeMap<String, Value>,
}

impl RecordBuilder {
    fn set(&mut self, name: &str, units: Option<String>, text: &str) -> Result<(), StoreError> {
        let (slot, expected_units) = match name {
            "EPOCH" => {
                let timestamp = text
                    .parse()
                    .map_err(|e| malformed(format!("stateVector EPOCH: {e}")))?;
                self.epoch = Some(timestamp);
                return Ok(());
            }
            "X" => (&mut self.position[0], POSITION_UNITS),
            "Y" => (&mut self.position[1], POSITION_UNITS),
            "Z" => (&mut self.position[2], POSITION_UNITS),
            "X_DOT" => (&mut self.velocity[0], VELOCITY_UNITS),
            "Y_DOT" => (&mut self.velocity[1], VELOCITY_UNITS),
            "Z_DOT" => (&mut self.velocity[2], VELOCITY_UNITS),
            _ => {
                let value = match units {
                    Some(units) => serde_json::json!({ "value": text, "units": units }),
                    None => Value::String(text.to_owned()),
                };
                self.extra.insert(name.to_owned(), value);
                return Ok(());
            }
        };

        if let Some(units) = units
            && units != expected_units
        {
            return Err(malformed(format!(
                "{name} has units {units:?}, expected {expected_units:?}"
            )));
        }

        let value: f64 = text
            .parse()
            .map_err(|e| malformed(format!("{name} value {text:?}: {e}")))?;
        if !value.is_finite() {
            return Err(malformed(format!("{name} value {text:?} is not finite")));
        }
        *slot = Some(value);
        Ok(())
    }

    fn build(self) -> Result<Epoch, StoreError> {
        let timestamp = self
            .epoch
            .ok_or_else(|| malformed("stateVector is missing EPOCH".to_owned()))?;
        let component = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| malformed(format!("stateVector {timestamp} is missing {name}")))
        };
        let [x, y, z] = self.position;
        let [x_dot, y_dot, z_dot] = self.velocity;

        Ok(Epoch {
            timestamp,
            position: Vector3::new(component(x, "X")?, component(y, "Y")?, component(z, "Z")?),
            velocity: Vector3::new(
                component(x_dot, "X_DOT")?,
                component(y_dot, "Y_DOT")?,
                component(z_dot, "Z_DOT")?,
            ),
            extra: self.extra,
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::lossy_float_literal,
    clippy::excessive_precision
)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../../testdata/iss_oem_sample.xml");

    fn document(metadata: &str, vectors: &str) -> String {
        format!(
            "<ndm><oem><body><segment>\
             <metadata>{metadata}</metadata>\
             <data>{vectors}</data>\
             </segment></body></oem></ndm>"
        )
    }

    const BOUNDS: &str = "<START_TIME>2025-001T00:00:00.000Z</START_TIME>\
                          <STOP_TIME>2025-002T00:00:00.000Z</STOP_TIME>";

    fn vector(epoch: &str, extra: &str) -> String {
        format!(
            "<stateVector><EPOCH>{epoch}</EPOCH>\
             <X units=\"km\">1.0</X><Y units=\"km\">2.0</Y><Z units=\"km\">3.0</Z>\
             <X_DOT units=\"km/s\">-0.5</X_DOT><Y_DOT units=\"km/s\">0.25</Y_DOT>\
             <Z_DOT units=\"km/s\">7.5</Z_DOT>{extra}</stateVector>"
        )
    }

    #[test]
    fn parses_sample_document() {
        let dataset = parse_oem(SAMPLE).unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.metadata.start_time.to_string(), "2025-104T12:00:00.000Z");
        assert_eq!(dataset.metadata.stop_time.to_string(), "2025-119T12:00:00.000Z");
        assert_eq!(dataset.metadata.fields["OBJECT_NAME"], "ISS");
        assert_eq!(dataset.metadata.fields["REF_FRAME"], "EME2000");
        assert!(!dataset.metadata.fields.contains_key("START_TIME"));

        let first = &dataset.epochs[0];
        assert_eq!(first.timestamp.to_string(), "2025-104T12:00:00.000Z");
        assert!((first.position.x - -4215.130_482_659_999_8).abs() < 1e-9);
        assert!((first.velocity.x - -2.308_531_832_528_580_2).abs() < 1e-15);
        assert!((first.velocity.z - 5.734_111_658_501_38).abs() < 1e-15);
        assert!(first.extra.is_empty());
    }

    #[test]
    fn sample_epochs_are_ascending() {
        let dataset = parse_oem(SAMPLE).unwrap();
        for pair in dataset.epochs.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn header_and_comments_are_ignored() {
        let dataset = parse_oem(SAMPLE).unwrap();
        assert!(!dataset.metadata.fields.contains_key("CREATION_DATE"));
        assert!(!dataset.metadata.fields.contains_key("COMMENT"));
    }

    #[test]
    fn unknown_children_pass_through() {
        let xml = document(
            BOUNDS,
            &vector(
                "2025-001T00:00:00.000Z",
                "<MASS units=\"kg\">473413.0</MASS><NOTE>reboost</NOTE>",
            ),
        );
        let dataset = parse_oem(&xml).unwrap();
        let extra = &dataset.epochs[0].extra;
        assert_eq!(extra["MASS"]["units"], "kg");
        assert_eq!(extra["MASS"]["value"], "473413.0");
        assert_eq!(extra["NOTE"], "reboost");
    }

    #[test]
    fn empty_data_section_yields_empty_dataset() {
        let dataset = parse_oem(&document(BOUNDS, "")).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn only_first_segment_is_read() {
        let xml = format!(
            "<ndm><oem><body>\
             <segment><metadata>{BOUNDS}</metadata><data>{}</data></segment>\
             <segment><metadata>{BOUNDS}</metadata><data>{}</data></segment>\
             </body></oem></ndm>",
            vector("2025-001T00:00:00.000Z", ""),
            vector("2025-001T00:04:00.000Z", ""),
        );
        let dataset = parse_oem(&xml).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn missing_bounds_are_rejected() {
        let xml = document(
            "<STOP_TIME>2025-002T00:00:00.000Z</STOP_TIME>",
            &vector("2025-001T00:00:00.000Z", ""),
        );
        let err = parse_oem(&xml).unwrap_err();
        assert!(err.to_string().contains("START_TIME"), "{err}");
    }

    #[test]
    fn missing_component_is_rejected() {
        let xml = document(
            BOUNDS,
            "<stateVector><EPOCH>2025-001T00:00:00.000Z</EPOCH><X units=\"km\">1.0</X></stateVector>",
        );
        let err = parse_oem(&xml).unwrap_err();
        assert!(matches!(err, StoreError::MalformedDataset(_)));
        assert!(err.to_string().contains("missing Y"), "{err}");
    }

    #[test]
    fn self_closed_state_vector_is_rejected() {
        let err = parse_oem(&document(BOUNDS, "<stateVector/>")).unwrap_err();
        assert!(matches!(err, StoreError::MalformedDataset(_)));
        assert!(err.to_string().contains("missing EPOCH"), "{err}");
    }

    #[test]
    fn malformed_epoch_is_rejected() {
        let xml = document(BOUNDS, &vector("2025-01-01T00:00:00Z", ""));
        assert!(matches!(
            parse_oem(&xml).unwrap_err(),
            StoreError::MalformedDataset(_)
        ));
    }

    #[test]
    fn wrong_units_are_rejected() {
        let xml = document(
            BOUNDS,
            &vector("2025-001T00:00:00.000Z", "").replace("units=\"km\">1.0", "units=\"m\">1.0"),
        );
        let err = parse_oem(&xml).unwrap_err();
        assert!(err.to_string().contains("units"), "{err}");
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let xml = document(
            BOUNDS,
            &vector("2025-001T00:00:00.000Z", "").replace(">2.0<", ">two<"),
        );
        assert!(parse_oem(&xml).is_err());

        let xml = document(
            BOUNDS,
            &vector("2025-001T00:00:00.000Z", "").replace(">2.0<", ">NaN<"),
        );
        assert!(parse_oem(&xml).is_err());
    }

    #[test]
    fn out_of_order_epochs_are_rejected() {
        let vectors = format!(
            "{}{}",
            vector("2025-001T00:04:00.000Z", ""),
            vector("2025-001T00:00:00.000Z", "")
        );
        let err = parse_oem(&document(BOUNDS, &vectors)).unwrap_err();
        assert!(err.to_string().contains("ascending"), "{err}");
    }

    #[test]
    fn broken_xml_is_rejected() {
        assert!(parse_oem("<ndm><oem><body></oem>").is_err());
        assert!(parse_oem("").is_err());
    }
}
