use crate::coordinate::Coordinate;

/// Decodes an encoded polyline with 5 decimals of precision, as returned in
/// `overview_polyline.points` by the directions web service.
pub fn decode_polyline(encoded: &str) -> Result<Vec<Coordinate>, &'static str> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut latitude: i64 = 0;
    let mut longitude: i64 = 0;
    let mut coordinates = Vec::new();

    while index < bytes.len() {
        latitude = latitude
            .checked_add(next_delta(bytes, &mut index)?)
            .ok_or("Polyline value overflowed")?;
        longitude = longitude
            .checked_add(next_delta(bytes, &mut index)?)
            .ok_or("Polyline value overflowed")?;
        coordinates.push(Coordinate::new(latitude as f64 / 1e5, longitude as f64 / 1e5));
    }

    Ok(coordinates)
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, &'static str> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err("Polyline ended in the middle of a value");
        };
        *index += 1;

        if !(63..127).contains(&byte) {
            return Err("Polyline contained an illegal character");
        }
        if shift > 60 {
            return Err("Polyline value overflowed");
        }

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

#[test]
fn decodes_reference_polyline() {
    let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
    let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];

    assert_eq!(points.len(), expected.len());
    for (point, (lat, lng)) in points.iter().zip(expected) {
        assert!((point.latitude - lat).abs() < 1e-9);
        assert!((point.longitude - lng).abs() < 1e-9);
    }
}

#[test]
fn rejects_truncated_polyline() {
    assert!(decode_polyline("_p~iF~ps|").is_err());
    assert!(decode_polyline("_p~iF").is_err());
    assert_eq!(decode_polyline("").unwrap(), Vec::new());
}

#[test]
fn rejects_overflowing_polyline() {
    // Twelve continuation chunks then a terminator: a delta close to 2^59
    let huge_value = format!("{}?", "~".repeat(12));
    let encoded = huge_value.repeat(40);

    assert_eq!(decode_polyline(&encoded), Err("Polyline value overflowed"));
}
