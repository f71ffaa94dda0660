use thiserror::Error;

use crate::data::model::{Apartment, Coordinates};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CenterError {
    #[error("cannot average coordinates: no listing has coordinates")]
    NoCoordinates,
}

/// Mean latitude and mean longitude of the listings that have coordinates.
///
/// Listings without coordinates count toward neither sum nor denominator.
pub fn average_coordinates<'a, I>(apartments: I) -> Result<Coordinates, CenterError>
where
    I: IntoIterator<Item = &'a Apartment>,
{
    let (n, lat_sum, lng_sum) = apartments
        .into_iter()
        .filter_map(|apt| apt.coordinates)
        .fold((0usize, 0.0, 0.0), |(n, lat, lng), c| (n + 1, lat + c.lat, lng + c.lng));

    if n == 0 {
        return Err(CenterError::NoCoordinates);
    }
    Ok(Coordinates::new(lat_sum / n as f64, lng_sum / n as f64))
}

/// Google Maps public-transport directions between two points.
pub fn directions_url(from: Coordinates, to: Coordinates) -> String {
    format!(
        "https://www.google.com/maps/dir/{},{}/{},{}/data=!4m2!4m1!3e3",
        from.lat, from.lng, to.lat, to.lng
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::apartment;

    fn at(lat: f64, lng: f64) -> Apartment {
        let mut apt = apartment("a");
        apt.coordinates = Some(Coordinates::new(lat, lng));
        apt
    }

    #[test]
    fn skips_listings_without_coordinates() {
        let mut no_geo = apartment("b");
        no_geo.coordinates = None;
        let apts = [at(52.0, 4.9), at(52.2, 5.1), no_geo];

        let center = average_coordinates(&apts).unwrap();
        assert!((center.lat - 52.1).abs() < 1e-9);
        assert!((center.lng - 5.0).abs() < 1e-9);
    }

    #[test]
    fn fails_without_any_coordinates() {
        let mut no_geo = apartment("b");
        no_geo.coordinates = None;
        assert_eq!(average_coordinates(&[no_geo]), Err(CenterError::NoCoordinates));
        assert_eq!(average_coordinates(&[] as &[Apartment]), Err(CenterError::NoCoordinates));
    }

    #[test]
    fn directions_url_is_deterministic() {
        let from = Coordinates::new(52.37, 4.89);
        let to = Coordinates::new(52.3152336, 4.9498692);
        let url = directions_url(from, to);
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/52.37,4.89/52.3152336,4.9498692/data=!4m2!4m1!3e3"
        );
        assert_eq!(url, directions_url(from, to));
    }
}
