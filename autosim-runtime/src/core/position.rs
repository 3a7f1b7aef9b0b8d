/// Earth mean radius in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Normalize a heading in degrees into `[0, 360)`.
pub fn normalize_heading(heading: f64) -> f64 {
    let heading = heading.rem_euclid(360.0);
    if heading >= 360.0 {
        0.0
    } else {
        heading
    }
}

/// Normalize a longitude in degrees into `(-180, 180]`.
pub fn normalize_longitude(longitude: f64) -> f64 {
    let longitude = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if longitude <= -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

/// WGS84 position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
}

impl Position {
    /// Construct a new position.
    pub const fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Destination point after travelling a distance along a bearing.
    ///
    /// The destination is the great-circle projection on a sphere with the
    /// Earth mean radius. The distance is in meters and the bearing in degrees
    /// clockwise from north. Altitude is carried over unchanged.
    pub fn destination(&self, distance: f64, bearing: f64) -> Self {
        let bearing = normalize_heading(bearing).to_radians();
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let angular_distance = distance / EARTH_RADIUS;

        let (sin_lat1, cos_lat1) = lat1.sin_cos();
        let (sin_ad, cos_ad) = angular_distance.sin_cos();

        let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing.cos();
        let lat2 = sin_lat2.asin();

        let y = bearing.sin() * sin_ad * cos_lat1;
        let x = cos_ad - sin_lat1 * sin_lat2;
        let lon2 = lon1 + y.atan2(x);

        Self {
            latitude: lat2.to_degrees(),
            longitude: normalize_longitude(lon2.to_degrees()),
            altitude: self.altitude,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Location: ({:.6}, {:.6}); Altitude: {:.1}m",
            self.latitude, self.longitude, self.altitude
        )
    }
}
