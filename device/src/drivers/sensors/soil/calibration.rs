use heapless::String;

/// Number of points on the calibration curve.
pub const POINTS: usize = 11;

/// Raw reading of a dry probe, used when no calibration is available.
pub const RAW_MIN: u16 = 1700;
/// Raw reading of a probe in water, used when no calibration is available.
pub const RAW_MAX: u16 = 3000;

pub const REVISION_NO_EEPROM: u16 = 0x0104;
pub const REVISION_WITH_EEPROM: u16 = 0x0104;

/// Usable length of the label; the stored field carries one extra NUL.
pub const LABEL_LEN: usize = 16;

/// Size of the serialized record: product, revision, label, points.
pub const RECORD_LEN: usize = 1 + 2 + (LABEL_LEN + 1) + 2 * POINTS;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Two neighbouring points leave an empty or inverted segment.
    DegenerateSegment { index: usize },
    /// The requested output range is inverted.
    InvalidRange { min: u16, max: u16 },
}

/// Per-probe calibration as stored in the sensor EEPROM.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRecord {
    product: u8,
    revision: u16,
    label: String<LABEL_LEN>,
    points: [u16; POINTS],
}

impl CalibrationRecord {
    pub fn new(product: u8, revision: u16, label: &str, points: [u16; POINTS]) -> Self {
        let mut l = String::new();
        for c in label.chars() {
            if l.push(c).is_err() {
                break;
            }
        }
        Self {
            product,
            revision,
            label: l,
            points,
        }
    }

    /// Evenly spaced curve between [`RAW_MIN`] and [`RAW_MAX`].
    ///
    /// The step divides the span by the number of points rather than the
    /// number of segments, so the last segment is wider than the others.
    pub fn uncalibrated() -> Self {
        let mut points = [0; POINTS];
        points[0] = RAW_MIN;
        points[POINTS - 1] = RAW_MAX;

        let step = (RAW_MAX - RAW_MIN) / POINTS as u16;
        for i in 1..POINTS - 1 {
            points[i] = points[i - 1] + step;
        }

        Self {
            product: 0,
            revision: REVISION_NO_EEPROM,
            label: String::new(),
            points,
        }
    }

    pub fn product(&self) -> u8 {
        self.product
    }

    pub fn revision(&self) -> u16 {
        self.revision
    }

    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    pub fn points(&self) -> &[u16; POINTS] {
        &self.points
    }

    /// Whether every point is strictly above its predecessor.
    pub fn is_monotonic(&self) -> bool {
        self.points.windows(2).all(|w| w[0] < w[1])
    }

    pub fn map(&self, raw: u16, min: u16, max: u16) -> Result<u16, CalibrationError> {
        map_raw_to_range(raw, &self.points, min, max)
    }

    pub fn percent(&self, raw: u16) -> Result<u8, CalibrationError> {
        Ok(self.map(raw, 0, 100)? as u8)
    }
}

impl Default for CalibrationRecord {
    fn default() -> Self {
        Self::uncalibrated()
    }
}

impl From<[u8; RECORD_LEN]> for CalibrationRecord {
    fn from(buf: [u8; RECORD_LEN]) -> Self {
        let product = buf[0];
        let revision = u16::from_le_bytes([buf[1], buf[2]]);

        let raw_label = &buf[3..3 + LABEL_LEN];
        let end = raw_label
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(LABEL_LEN);
        let mut label = String::new();
        if let Ok(text) = core::str::from_utf8(&raw_label[..end]) {
            let _ = label.push_str(text);
        }

        let mut points = [0; POINTS];
        let offset = 3 + LABEL_LEN + 1;
        for (i, point) in points.iter_mut().enumerate() {
            let at = offset + 2 * i;
            *point = u16::from_le_bytes([buf[at], buf[at + 1]]);
        }

        Self {
            product,
            revision,
            label,
            points,
        }
    }
}

/// Map a raw capacitance reading onto `[min, max]` following the
/// piecewise-linear curve described by `points`.
///
/// The output range is split into ten equal integer steps, one per
/// segment. Readings below the first point clamp to `min`, readings at or
/// above the last point clamp to `max`. Interpolation truncates, and the
/// interpolated value counts steps from zero: `min` only applies to clamping.
pub fn map_raw_to_range(
    raw: u16,
    points: &[u16; POINTS],
    min: u16,
    max: u16,
) -> Result<u16, CalibrationError> {
    if max < min {
        return Err(CalibrationError::InvalidRange { min, max });
    }

    let step = u32::from((max - min) / (POINTS as u16 - 1));

    for (i, &point) in points.iter().enumerate() {
        if raw < point {
            if i == 0 {
                return Ok(min);
            }

            let lower = points[i - 1];
            let span = match point.checked_sub(lower) {
                Some(span) if span > 0 => u32::from(span),
                _ => return Err(CalibrationError::DegenerateSegment { index: i }),
            };

            // raw >= lower, otherwise the scan would have stopped earlier
            let offset = u32::from(raw - lower);
            let value = offset * step / span + step * (i as u32 - 1);

            return Ok(value as u16);
        }
    }

    Ok(max)
}
