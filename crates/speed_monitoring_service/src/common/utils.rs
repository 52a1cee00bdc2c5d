/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use std::f64::consts::PI;

/// Human readable "lat, lon" label shown for live fixes.
pub fn format_coordinates(point: &Point) -> String {
    let Latitude(lat) = point.lat;
    let Longitude(lon) = point.lon;
    format!("{lat:.4}, {lon:.4}")
}

fn deg2rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

pub fn distance_between_in_meters(latlong1: &Point, latlong2: &Point) -> f64 {
    // Calculating using haversine formula
    // Radius of Earth in meters
    let r: f64 = 6371000.0;

    let Latitude(lat1) = latlong1.lat;
    let Longitude(lon1) = latlong1.lon;
    let Latitude(lat2) = latlong2.lat;
    let Longitude(lon2) = latlong2.lon;

    let dlat = deg2rad(lat2 - lat1);
    let dlon = deg2rad(lon2 - lon1);

    let rlat1 = deg2rad(lat1);
    let rlat2 = deg2rad(lat2);

    let sq = |x: f64| x * x;

    let h = sq((dlat / 2.0).sin()) + rlat1.cos() * rlat2.cos() * sq((dlon / 2.0).sin());

    2.0 * r * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Length of the polyline through `points`, in meters.
pub fn path_length_in_meters<'a>(points: impl Iterator<Item = &'a Point>) -> f64 {
    let mut total = 0.0;
    let mut previous: Option<&Point> = None;
    for point in points {
        if let Some(previous) = previous {
            total += distance_between_in_meters(previous, point);
        }
        previous = Some(point);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Point {
        Point {
            lat: Latitude(lat),
            lon: Longitude(lon),
        }
    }

    #[test]
    fn coordinates_are_shown_with_four_decimals() {
        assert_eq!(format_coordinates(&point(18.75432, 73.40761)), "18.7543, 73.4076");
    }

    #[test]
    fn path_length_sums_segments() {
        let points = [point(18.0, 73.0), point(18.01, 73.0), point(18.02, 73.0)];
        let total = path_length_in_meters(points.iter());
        let single = distance_between_in_meters(&points[0], &points[1]);
        assert!((total - 2.0 * single).abs() < 1.0);
        assert!((single - 1112.0).abs() < 5.0);
    }
}
