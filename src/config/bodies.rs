use crate::constants::G;
use crate::models::body::CentralBody;
use lazy_static::lazy_static;
use std::collections::BTreeMap;

lazy_static! {
    pub static ref SUN: CentralBody = CentralBody {
        name: "Sun".to_string(),
        id: 10,
        mu: 1.989e30 * G,
        radius: 695_510.0,
        j2: None,
        soi: None,
        deorbit_altitude: 1.2 * 695_510.0,
        body_fixed_frame: Some("IAU_SUN".to_string()),
    };
    pub static ref VENUS: CentralBody = CentralBody {
        name: "Venus".to_string(),
        id: 299,
        mu: 324_858.592,
        radius: 6051.8,
        j2: Some(4.458e-6),
        soi: Some(616_000.0),
        deorbit_altitude: 100.0,
        body_fixed_frame: Some("IAU_VENUS".to_string()),
    };
    pub static ref EARTH: CentralBody = CentralBody {
        name: "Earth".to_string(),
        id: 399,
        mu: 5.972e24 * G,
        radius: 6378.0,
        j2: Some(1.081874e-3),
        soi: Some(926_006.6608),
        deorbit_altitude: 100.0,
        body_fixed_frame: Some("ITRF93".to_string()),
    };
    pub static ref MOON: CentralBody = CentralBody {
        name: "Moon".to_string(),
        id: 301,
        mu: 4902.800_066,
        radius: 1737.4,
        j2: Some(2.0330e-4),
        soi: Some(66_100.0),
        deorbit_altitude: 10.0,
        body_fixed_frame: Some("IAU_MOON".to_string()),
    };
    pub static ref MARS: CentralBody = CentralBody {
        name: "Mars".to_string(),
        id: 499,
        mu: 42_828.37,
        radius: 3396.19,
        j2: Some(1.960_45e-3),
        soi: Some(577_000.0),
        deorbit_altitude: 100.0,
        body_fixed_frame: Some("IAU_MARS".to_string()),
    };
    pub static ref JUPITER: CentralBody = CentralBody {
        name: "Jupiter".to_string(),
        id: 5,
        mu: 1.266_86e8,
        radius: 71_490.0,
        j2: None,
        soi: Some(48.2e6),
        deorbit_altitude: 1000.0,
        body_fixed_frame: None,
    };
    pub static ref SATURN: CentralBody = CentralBody {
        name: "Saturn".to_string(),
        id: 6,
        mu: 37.931e6,
        radius: 58_232.0,
        j2: None,
        soi: Some(54_890_347.727),
        deorbit_altitude: 1000.0,
        body_fixed_frame: None,
    };
    static ref CATALOG: BTreeMap<&'static str, &'static CentralBody> = {
        let mut catalog: BTreeMap<&'static str, &'static CentralBody> = BTreeMap::new();
        catalog.insert("sun", &*SUN);
        catalog.insert("venus", &*VENUS);
        catalog.insert("earth", &*EARTH);
        catalog.insert("moon", &*MOON);
        catalog.insert("mars", &*MARS);
        catalog.insert("jupiter", &*JUPITER);
        catalog.insert("saturn", &*SATURN);
        catalog
    };
}

/// Case-insensitive lookup in the built-in body table
pub fn lookup(name: &str) -> Option<CentralBody> {
    CATALOG.get(name.to_lowercase().as_str()).map(|body| (*body).clone())
}

pub fn lookup_by_id(id: i32) -> Option<CentralBody> {
    CATALOG.values().find(|body| body.id == id).map(|body| (*body).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn earth_constants() {
        assert_relative_eq!(EARTH.mu, 398_589.196, max_relative = 1e-9);
        assert_eq!(EARTH.diameter(), 12_756.0);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(lookup("Earth"), Some(EARTH.clone()));
        assert_eq!(lookup("JUPITER").map(|b| b.id), Some(5));
        assert_eq!(lookup("pluto"), None);
    }

    #[test]
    fn lookup_by_naif_id() {
        assert_eq!(lookup_by_id(301).map(|b| b.name), Some("Moon".to_string()));
        assert!(lookup_by_id(-1).is_none());
    }
}
