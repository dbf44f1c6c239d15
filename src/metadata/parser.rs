use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use log::{debug, trace};

use super::document::MetadataDocument;
use super::record::{CompanionFile, ImageMetadataRecord, StagePosition};
use super::ParseError;

/// Metres to micrometres
const M_TO_UM: f64 = 1e6;
/// Metres to ångström
const M_TO_A: f64 = 1e10;
/// Electrons per m² to electrons per Å²
const PER_M2_TO_PER_A2: f64 = 1e-20;
/// Relative tolerance when comparing x and y pixel sizes
const PIXEL_ISOTROPY_TOLERANCE: f64 = 1e-6;

/// Parse a metadata file and locate its companion movie
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ImageMetadataRecord, ParseError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut record = parse_reader(BufReader::new(file), path)?;
    record.companion = CompanionFile::locate(path);
    if let Some(companion) = &record.companion {
        trace!("  {:<28} {}", "MovieFile", companion.path.display());
    }
    Ok(record)
}

/// Parse a metadata document from a reader.
///
/// `source` is recorded on the returned record; no companion lookup is done.
pub fn parse_reader<R: BufRead>(
    reader: R,
    source: &Path,
) -> Result<ImageMetadataRecord, ParseError> {
    let doc = MetadataDocument::from_reader(reader)?;
    let fields = Fields { doc: &doc };

    let record = ImageMetadataRecord {
        source: source.to_path_buf(),
        timestamp: fields.timestamp()?,
        nominal_magnification: fields.nominal_magnification()?,
        detector: fields.detector()?,
        exposure_time: fields.exposure_time()?,
        stage: fields.stage()?,
        pixel_spacing: fields.pixel_spacing()?,
        voltage: fields.voltage(),
        spot_index: fields.spot_index(),
        apertures: [
            fields.aperture("C1"),
            fields.aperture("C2"),
            fields.aperture("C3"),
        ],
        energy_slit_width: fields.optional_number("energy slit", &["EnergySelectionSlitWidth"], 1.0),
        defocus: fields.optional_custom_number("defocus", Some("AppliedDefocus"), None, M_TO_UM),
        total_dose: fields.optional_custom_number("dose", None, Some("TotalDose"), PER_M2_TO_PER_A2),
        frame_rate: fields.optional_custom_number("frame rate", None, Some("FrameRate"), 1.0),
        software: fields.text("ApplicationSoftware"),
        software_version: fields.text("ApplicationSoftwareVersion"),
        instrument_model: fields.text("InstrumentModel"),
        companion: None,
    };

    Ok(record)
}

/// Named, typed accessors over a flattened document
struct Fields<'a> {
    doc: &'a MetadataDocument,
}

impl Fields<'_> {
    fn timestamp(&self) -> Result<DateTime<FixedOffset>, ParseError> {
        let text = self.required("timestamp", &["acquisitionDateTime"])?;
        let parsed = DateTime::parse_from_rfc3339(text).or_else(|_| {
            // Some EPU versions omit the offset; those timestamps are UTC.
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
        });
        parsed.map_err(|_| ParseError::InvalidValue {
            field: "timestamp",
            value: text.to_string(),
        })
    }

    fn nominal_magnification(&self) -> Result<f64, ParseError> {
        let text = self.required("magnification", &["NominalMagnification"])?;
        positive("magnification", text)
    }

    fn detector(&self) -> Result<String, ParseError> {
        self.doc
            .custom("DetectorCommercialName")
            .or_else(|| self.doc.element(&["camera", "Name"]))
            .map(|name| {
                trace!("  {:<28} {}", "DetectorCommercialName", name);
                name.to_string()
            })
            .ok_or(ParseError::MissingField("detector"))
    }

    fn exposure_time(&self) -> Result<f64, ParseError> {
        let text = self
            .doc
            .element(&["camera", "ExposureTime"])
            .or_else(|| self.doc.detector_custom("ExposureTime"))
            .ok_or(ParseError::MissingField("exposure"))?;
        trace!("  {:<28} {}", "ExposureTime", text);
        let seconds = number("exposure", text)?;
        if seconds < 0.0 {
            return Err(invalid("exposure", text));
        }
        Ok(seconds)
    }

    fn stage(&self) -> Result<StagePosition, ParseError> {
        let axis = |name: &str| -> Result<f64, ParseError> {
            let text = self
                .doc
                .element(&["stage", "Position", name])
                .ok_or(ParseError::MissingField("stage position"))?;
            trace!("  {:<28} {}", format!("Position.{name}"), text);
            Ok(number("stage position", text)? * M_TO_UM)
        };
        Ok(StagePosition {
            x: axis("X")?,
            y: axis("Y")?,
            z: axis("Z")?,
            alpha: self
                .optional_number("stage tilt", &["stage", "Position", "A"], 1.0)
                .map(f64::to_degrees),
        })
    }

    fn pixel_spacing(&self) -> Result<f64, ParseError> {
        let x_text = self.required("pixel spacing", &["pixelSize", "x", "numericValue"])?;
        let x = positive("pixel spacing", x_text)?;
        if let Some(y_text) = self.doc.element(&["pixelSize", "y", "numericValue"]) {
            trace!("  {:<28} {}", "y numericValue", y_text);
            let y = positive("pixel spacing", y_text)?;
            if ((x - y) / x).abs() > PIXEL_ISOTROPY_TOLERANCE {
                return Err(ParseError::AnisotropicPixel { x, y });
            }
        }
        Ok(x * M_TO_A)
    }

    fn voltage(&self) -> Option<f64> {
        self.optional_number("voltage", &["AccelerationVoltage"], 1e-3)
    }

    fn spot_index(&self) -> Option<u32> {
        let text = self.text("SpotIndex")?;
        text.parse().map_err(|_| debug!("Ignoring unreadable spot index '{}'", text)).ok()
    }

    fn aperture(&self, name: &str) -> Option<String> {
        let key = format!("Aperture[{name}].Name");
        let value = self.doc.custom(&key)?;
        trace!("  {:<28} {}", key, value);
        Some(value.to_string())
    }

    fn text(&self, element: &str) -> Option<String> {
        let value = self.doc.element(&[element])?;
        trace!("  {:<28} {}", element, value);
        Some(value.to_string())
    }

    fn required(&self, field: &'static str, path: &[&str]) -> Result<&str, ParseError> {
        let text = self.doc.element(path).ok_or(ParseError::MissingField(field))?;
        trace!("  {:<28} {}", path.join("."), text);
        Ok(text)
    }

    /// Optional plain element scaled by `factor`; unreadable text counts as unknown
    fn optional_number(&self, field: &str, path: &[&str], factor: f64) -> Option<f64> {
        let text = self.doc.element(path)?;
        trace!("  {:<28} {}", path.join("."), text);
        lenient(field, text).map(|v| v * factor)
    }

    /// Optional custom-dictionary value, by exact key or detector-scoped field
    fn optional_custom_number(
        &self,
        field: &str,
        key: Option<&str>,
        detector_field: Option<&str>,
        factor: f64,
    ) -> Option<f64> {
        let text = key
            .and_then(|k| self.doc.custom(k))
            .or_else(|| detector_field.and_then(|f| self.doc.detector_custom(f)))?;
        trace!("  {:<28} {}", key.or(detector_field).unwrap_or(field), text);
        lenient(field, text).map(|v| v * factor)
    }
}

fn invalid(field: &'static str, text: &str) -> ParseError {
    ParseError::InvalidValue {
        field,
        value: text.to_string(),
    }
}

fn number(field: &'static str, text: &str) -> Result<f64, ParseError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(field, text))
}

fn positive(field: &'static str, text: &str) -> Result<f64, ParseError> {
    number(field, text).and_then(|v| if v > 0.0 { Ok(v) } else { Err(invalid(field, text)) })
}

fn lenient(field: &str, text: &str) -> Option<f64> {
    let value = text.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    if value.is_none() {
        debug!("Ignoring unreadable {} value '{}'", field, text);
    }
    value
}
